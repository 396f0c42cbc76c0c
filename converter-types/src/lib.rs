//! # Converter Types
//!
//! Domain types and port traits for the currency converter service.
//! This crate has ZERO external IO dependencies - only data structures,
//! invariants, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (CurrencyCode, CurrencyTable, IpcEndpoint, RateSnapshot)
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Wire requests and replies for the IPC protocol
//! - `error/` - Domain and request-level error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{CurrencyCode, CurrencyTable, DEFAULT_ENDPOINT, IpcEndpoint, RateSnapshot};
pub use dto::*;
pub use error::{DomainError, ServiceError, SnapshotError};
pub use ports::{ProviderError, RateData, RateProvider};
