//! Error types for the currency converter.

use crate::domain::CurrencyCode;

/// Domain-level errors (malformed domain values).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("Invalid currency code: {0:?}")]
    InvalidCurrencyCode(String),

    #[error("Invalid currency entry {0:?}, expected CODE:Name")]
    InvalidCurrencyEntry(String),

    #[error("Currency table must not be empty")]
    EmptyCurrencyTable,

    #[error("Invalid IPC endpoint {0:?}, expected ipc://<path>")]
    InvalidEndpoint(String),
}

/// Rate data that cannot form a consistent snapshot.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SnapshotError {
    #[error("Base currency {0} has no display name")]
    MissingBaseName(CurrencyCode),

    #[error("No usable rates against base {0}")]
    Empty(CurrencyCode),
}

/// Request-level errors.
///
/// The `Display` text is exactly what goes into the `error` field of the reply,
/// so these messages are part of the wire contract.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    /// Unknown or unparsable code. The offending code is kept for logs only;
    /// the reply does not say whether source or target was wrong.
    #[error("Invalid currency code")]
    InvalidCurrency(String),

    #[error("Amount must be a number")]
    AmountNotANumber,

    #[error("Amount must be a non-negative number")]
    InvalidAmount(f64),

    /// The result does not fit in a finite, positive double.
    #[error("Converted amount is out of range")]
    OutOfRange,

    #[error("Unknown action")]
    UnknownAction(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Malformed request: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Malformed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_messages() {
        assert_eq!(
            ServiceError::InvalidCurrency("XXX".into()).to_string(),
            "Invalid currency code"
        );
        assert_eq!(
            ServiceError::UnknownAction("explode".into()).to_string(),
            "Unknown action"
        );
        assert_eq!(
            ServiceError::MissingField("amount").to_string(),
            "Missing required field: amount"
        );
        assert_eq!(
            ServiceError::InvalidAmount(-1.0).to_string(),
            "Amount must be a non-negative number"
        );
        assert_eq!(
            ServiceError::OutOfRange.to_string(),
            "Converted amount is out of range"
        );
    }
}
