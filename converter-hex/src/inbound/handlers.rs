//! IPC request handlers.
//!
//! Turns one request line into one reply line. Every failure, from bad JSON
//! to an unknown currency, becomes an `{"error": ...}` reply here; nothing in
//! this module can close the connection.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use converter_types::{ErrorReply, Reply, Request, ServiceError};

use crate::ConverterService;

/// Wire rendering of a handler result.
pub struct IpcReply(pub Result<Reply, ServiceError>);

impl IpcReply {
    pub fn is_error(&self) -> bool {
        self.0.is_err()
    }

    /// Serializes the reply as a single JSON line (no trailing newline).
    pub fn to_json(&self) -> String {
        match &self.0 {
            Ok(reply) => encode(reply),
            Err(err) => encode(&ErrorReply::from(err)),
        }
    }
}

fn encode<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        serde_json::json!({ "error": format!("Failed to encode reply: {e}") }).to_string()
    })
}

/// Decodes and answers one request line.
#[tracing::instrument(skip(service, line), fields(action))]
pub fn handle_line(service: &ConverterService, line: &str) -> IpcReply {
    let result = serde_json::from_str::<Value>(line)
        .map_err(ServiceError::from)
        .and_then(Request::try_from)
        .and_then(|request| {
            tracing::Span::current().record("action", request.action());
            service.handle(&request)
        });

    match &result {
        Ok(_) => debug!("Request handled"),
        Err(ServiceError::InvalidCurrency(code)) => {
            debug!(code = %code, "Rejected unknown currency")
        }
        Err(e) => warn!(error = %e, "Rejected request"),
    }

    IpcReply(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use chrono::Utc;
    use converter_types::{CurrencyCode, RateSnapshot};
    use serde_json::json;

    use crate::RateStore;

    fn service() -> ConverterService {
        let code = |s: &str| s.parse::<CurrencyCode>().unwrap();
        let snapshot = RateSnapshot::new(
            code("USD"),
            BTreeMap::from([(code("EUR"), 0.9260101824)]),
            BTreeMap::from([
                (code("USD"), "United States Dollar".to_string()),
                (code("EUR"), "Euro".to_string()),
            ]),
            Utc::now(),
        )
        .unwrap();
        ConverterService::new(Arc::new(RateStore::new(snapshot)))
    }

    fn reply(line: &str) -> Value {
        serde_json::from_str(&handle_line(&service(), line).to_json()).unwrap()
    }

    #[test]
    fn test_supported_currencies_reply() {
        assert_eq!(
            reply(r#"{"action": "get_supported_currencies"}"#),
            json!({"EUR": "Euro", "USD": "United States Dollar"})
        );
    }

    #[test]
    fn test_convert_reply_shape() {
        let value = reply(
            r#"{"action": "convert_currency", "data": {"source_currency": "USD", "target_currency": "EUR", "amount": 100.0}}"#,
        );
        assert_eq!(value["source_currency"], "USD");
        assert_eq!(value["target_currency"], "EUR");
        assert_eq!(value["amount"], 100.0);
        let converted = value["converted_amount"].as_f64().unwrap();
        assert!((converted - 92.60101824).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_currency_reply() {
        assert_eq!(
            reply(
                r#"{"action": "convert_currency", "data": {"source_currency": "USD", "target_currency": "XXX", "amount": 100.0}}"#
            ),
            json!({"error": "Invalid currency code"})
        );
    }

    #[test]
    fn test_unknown_action_reply() {
        assert_eq!(
            reply(r#"{"action": "launch_rockets"}"#),
            json!({"error": "Unknown action"})
        );
    }

    #[test]
    fn test_malformed_json_reply() {
        let value = reply("{\"action\": ");
        let message = value["error"].as_str().unwrap();
        assert!(message.starts_with("Malformed request"), "{message}");
    }

    #[test]
    fn test_is_error() {
        let svc = service();
        assert!(handle_line(&svc, "null").is_error());
        assert!(!handle_line(&svc, r#"{"action": "get_exchange_rates"}"#).is_error());
    }
}
