//! Domain models for the currency converter.

pub mod currency;
pub mod endpoint;
pub mod snapshot;

pub use currency::{CurrencyCode, CurrencyTable};
pub use endpoint::{DEFAULT_ENDPOINT, IpcEndpoint};
pub use snapshot::RateSnapshot;
