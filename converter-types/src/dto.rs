//! Data Transfer Objects for the IPC request/reply protocol.
//!
//! Requests are `{"action": "...", "data": {...}}`; replies are either an
//! action-specific payload or `{"error": "..."}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::domain::CurrencyCode;
use crate::error::ServiceError;

// ─────────────────────────────────────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────────────────────────────────────

/// One inbound request.
///
/// Serializes to the wire envelope. Decoding from the wire goes through
/// `TryFrom<Value>` so every malformed shape maps to a [`ServiceError`] with a
/// readable message instead of a raw serde error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", content = "data", rename_all = "snake_case")]
pub enum Request {
    ConvertCurrency(ConvertCurrencyRequest),
    GetExchangeRates(ExchangeRatesQuery),
    GetSupportedCurrencies,
}

impl Request {
    pub fn action(&self) -> &'static str {
        match self {
            Request::ConvertCurrency(_) => "convert_currency",
            Request::GetExchangeRates(_) => "get_exchange_rates",
            Request::GetSupportedCurrencies => "get_supported_currencies",
        }
    }
}

impl TryFrom<Value> for Request {
    type Error = ServiceError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(mut envelope) = value else {
            return Err(ServiceError::Malformed(
                "request must be a JSON object".into(),
            ));
        };

        let action = match envelope.remove("action") {
            Some(Value::String(action)) => action,
            Some(Value::Null) | None => return Err(ServiceError::MissingField("action")),
            Some(_) => return Err(ServiceError::Malformed("action must be a string".into())),
        };
        let data = envelope.remove("data").filter(|d| !d.is_null());

        match action.as_str() {
            "convert_currency" => {
                let data = data.ok_or(ServiceError::MissingField("data"))?;
                Ok(Request::ConvertCurrency(ConvertCurrencyRequest::from_data(
                    data_object(&data)?,
                )?))
            }
            "get_exchange_rates" => {
                let query = match &data {
                    Some(data) => ExchangeRatesQuery::from_data(data_object(data)?)?,
                    None => ExchangeRatesQuery::default(),
                };
                Ok(Request::GetExchangeRates(query))
            }
            "get_supported_currencies" => Ok(Request::GetSupportedCurrencies),
            _ => Err(ServiceError::UnknownAction(action)),
        }
    }
}

impl std::str::FromStr for Request {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: Value = serde_json::from_str(s)?;
        value.try_into()
    }
}

fn data_object(data: &Value) -> Result<&Map<String, Value>, ServiceError> {
    data.as_object()
        .ok_or_else(|| ServiceError::Malformed("data must be a JSON object".into()))
}

/// Reads a currency field as a raw string. Non-string values are reported the
/// same way as unknown codes.
fn currency_field(
    data: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, ServiceError> {
    match data.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(code)) => Ok(Some(code.clone())),
        Some(other) => Err(ServiceError::InvalidCurrency(other.to_string())),
    }
}

/// Request to convert an amount between two currencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertCurrencyRequest {
    pub source_currency: String,
    pub target_currency: String,
    pub amount: f64,
}

impl ConvertCurrencyRequest {
    fn from_data(data: &Map<String, Value>) -> Result<Self, ServiceError> {
        let source_currency = currency_field(data, "source_currency")?
            .ok_or(ServiceError::MissingField("source_currency"))?;
        let target_currency = currency_field(data, "target_currency")?
            .ok_or(ServiceError::MissingField("target_currency"))?;
        let amount = match data.get("amount") {
            None | Some(Value::Null) => return Err(ServiceError::MissingField("amount")),
            Some(value) => value.as_f64().ok_or(ServiceError::AmountNotANumber)?,
        };

        Ok(Self {
            source_currency,
            target_currency,
            amount,
        })
    }
}

/// Request for every rate relative to one currency.
///
/// An omitted `currency_code` means the snapshot's base currency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRatesQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
}

impl ExchangeRatesQuery {
    fn from_data(data: &Map<String, Value>) -> Result<Self, ServiceError> {
        Ok(Self {
            currency_code: currency_field(data, "currency_code")?,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Replies
// ─────────────────────────────────────────────────────────────────────────────

/// Result of a conversion: the validated request echoed back plus the result.
///
/// `converted_amount` is full double precision; rounding is up to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionReply {
    pub source_currency: CurrencyCode,
    pub target_currency: CurrencyCode,
    pub amount: f64,
    pub converted_amount: f64,
}

/// Successful reply payload, serialized without any wrapper.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Conversion(ConversionReply),
    ExchangeRates(BTreeMap<CurrencyCode, f64>),
    SupportedCurrencies(BTreeMap<CurrencyCode, String>),
}

/// Error reply: `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub error: String,
}

impl From<&ServiceError> for ErrorReply {
    fn from(err: &ServiceError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}
