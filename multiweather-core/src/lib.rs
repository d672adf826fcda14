//! Core library for the `multiweather` service.
//!
//! This crate defines:
//! - Abstraction over weather providers and the two upstream adapters
//! - The concurrent aggregator that averages provider readings
//! - Configuration & credentials handling
//! - Shared domain models (temperatures, reports)
//!
//! It is used by `multiweather-server`, but can also be reused by other binaries.

pub mod aggregator;
pub mod config;
pub mod model;
pub mod provider;

pub use aggregator::{AggregatorError, MultiWeatherProvider};
pub use config::{Config, ProviderConfig};
pub use model::{Kelvin, TemperatureReport};
pub use provider::{ProviderId, WeatherProvider};
