//! Weather lookups for Skylook
//!
//! Fetches current conditions for a city from a weatherapi.com compatible
//! endpoint and exposes them as a `WeatherReading`.

pub mod error;
pub mod provider;
pub mod types;

pub use error::LookupError;
pub use provider::WeatherProvider;
pub use types::*;
