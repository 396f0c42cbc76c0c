//! # Converter Hex
//!
//! Rate cache, refresh loop, application service and IPC adapter for the
//! currency converter.
//!
//! ## Architecture
//!
//! - `store` - `RateStore`, the atomically swapped current snapshot
//! - `refresher` - periodic fetch-and-swap against a `RateProvider`
//! - `service` - application service (validates requests, computes replies)
//! - `inbound/` - IPC adapter (Unix socket, newline-delimited JSON)
//!
//! Data flows one way: the refresher writes the store, the service only reads it.

pub mod inbound;
pub mod refresher;
pub mod service;
pub mod store;


pub use refresher::{RefreshConfig, RefreshError, Refresher};
pub use service::ConverterService;
pub use store::{RateStore, ReplaceOutcome};
