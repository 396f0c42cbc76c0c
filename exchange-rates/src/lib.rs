//! Exchange rate provider adapters.
//!
//! Both types implement [`converter_types::RateProvider`]:
//!
//! - [`FxRatesApiProvider`] - fetches live rates from FXRatesAPI over HTTPS.
//! - [`StaticRateProvider`] - serves a hardcoded table; useful offline and in tests.
//!
//! # Example
//! ```
//! use converter_types::{CurrencyCode, RateProvider};
//! use exchange_rates::StaticRateProvider;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let provider = StaticRateProvider::default();
//! let eur: CurrencyCode = "EUR".parse().unwrap();
//! let data = provider.fetch(&eur).await.unwrap();
//! assert_eq!(data.rates[&eur], 1.0);
//! # });
//! ```

mod fixed;
mod fxratesapi;

pub use fixed::StaticRateProvider;
pub use fxratesapi::{DEFAULT_API_URL, FxRatesApiProvider};
