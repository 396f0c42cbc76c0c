//! # Currency Converter Client SDK
//!
//! A typed Rust client for the converter's IPC protocol.
//!
//! One client holds one connection. Requests on it are answered in order, so
//! calls are serialized through an internal lock.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;

use converter_types::{
    ConversionReply, ConvertCurrencyRequest, ExchangeRatesQuery, IpcEndpoint, Request,
};

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server answered with `{"error": ...}`.
    #[error("Service error: {0}")]
    Service(String),

    #[error("Server closed the connection")]
    Disconnected,
}

struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

/// Currency converter client.
pub struct ConverterClient {
    conn: Mutex<Connection>,
}

impl ConverterClient {
    /// Connects to the server listening on `endpoint`.
    pub async fn connect(endpoint: &IpcEndpoint) -> Result<Self, ClientError> {
        let stream = UnixStream::connect(endpoint.path()).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            conn: Mutex::new(Connection {
                reader: BufReader::new(reader),
                writer,
            }),
        })
    }

    /// Converts `amount` from `source` to `target`.
    pub async fn convert_currency(
        &self,
        source: &str,
        target: &str,
        amount: f64,
    ) -> Result<ConversionReply, ClientError> {
        let req = Request::ConvertCurrency(ConvertCurrencyRequest {
            source_currency: source.to_string(),
            target_currency: target.to_string(),
            amount,
        });
        self.call(&req).await
    }

    /// Gets every rate relative to `currency_code`, or to the server's base
    /// currency when `None`.
    pub async fn get_exchange_rates(
        &self,
        currency_code: Option<&str>,
    ) -> Result<BTreeMap<String, f64>, ClientError> {
        let req = Request::GetExchangeRates(ExchangeRatesQuery {
            currency_code: currency_code.map(String::from),
        });
        self.call(&req).await
    }

    /// Lists the supported currencies as code to display name.
    pub async fn get_supported_currencies(&self) -> Result<BTreeMap<String, String>, ClientError> {
        self.call(&Request::GetSupportedCurrencies).await
    }

    /// Sends a typed request and returns the raw reply, error replies included.
    pub async fn send(&self, request: &Request) -> Result<Value, ClientError> {
        self.send_raw(&serde_json::to_string(request)?).await
    }

    /// Sends one line exactly as given and returns the parsed reply.
    pub async fn send_raw(&self, line: &str) -> Result<Value, ClientError> {
        let mut conn = self.conn.lock().await;

        let mut out = line.trim_end_matches('\n').to_string();
        out.push('\n');
        conn.writer.write_all(out.as_bytes()).await?;

        let mut reply = String::new();
        if conn.reader.read_line(&mut reply).await? == 0 {
            return Err(ClientError::Disconnected);
        }
        Ok(serde_json::from_str(&reply)?)
    }

    async fn call<T: DeserializeOwned>(&self, request: &Request) -> Result<T, ClientError> {
        let value = self.send(request).await?;
        if let Some(message) = error_message(&value) {
            return Err(ClientError::Service(message));
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Extracts the message of an `{"error": ...}` reply.
fn error_message(value: &Value) -> Option<String> {
    let error = value.as_object()?.get("error")?;
    Some(
        error
            .as_str()
            .map(String::from)
            .unwrap_or_else(|| error.to_string()),
    )
}
