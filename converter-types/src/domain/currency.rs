//! Currency codes and the table of currencies the service supports.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// ISO-4217 style currency code: exactly three ASCII uppercase letters.
///
/// Parsing is case-insensitive and trims surrounding whitespace, so `" eur"`
/// and `"EUR"` name the same currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CurrencyCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(DomainError::InvalidCurrencyCode(s.to_string()));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl Borrow<str> for CurrencyCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The set of currencies the service asks its provider for, with display names.
///
/// Rate providers such as FXRatesAPI only return codes, so the names shown by
/// `get_supported_currencies` come from this table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyTable(BTreeMap<CurrencyCode, String>);

impl CurrencyTable {
    pub fn new(entries: BTreeMap<CurrencyCode, String>) -> Result<Self, DomainError> {
        if entries.is_empty() {
            return Err(DomainError::EmptyCurrencyTable);
        }
        Ok(Self(entries))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.0.contains_key(code)
    }

    pub fn name(&self, code: &str) -> Option<&str> {
        self.0.get(code).map(String::as_str)
    }

    pub fn codes(&self) -> impl Iterator<Item = &CurrencyCode> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CurrencyCode, &String)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for CurrencyTable {
    fn default() -> Self {
        let entries = [
            ("USD", "United States Dollar"),
            ("EUR", "Euro"),
            ("JPY", "Japanese Yen"),
            ("GBP", "British Pound"),
        ]
        .into_iter()
        .map(|(code, name)| (CurrencyCode(code.to_string()), name.to_string()))
        .collect();
        Self(entries)
    }
}

/// Parses `CODE:Name,CODE:Name,...`.
impl FromStr for CurrencyTable {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut entries = BTreeMap::new();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (code, name) = entry
                .split_once(':')
                .ok_or_else(|| DomainError::InvalidCurrencyEntry(entry.to_string()))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(DomainError::InvalidCurrencyEntry(entry.to_string()));
            }
            entries.insert(code.parse()?, name.to_string());
        }
        Self::new(entries)
    }
}
