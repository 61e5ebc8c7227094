//! Forecast retrieval for rainwatch.
//!
//! Fetches hourly precipitation and weather codes from Open-Meteo and reduces
//! them to a [`WeatherSnapshot`] covering the next three hours.

pub mod provider;
pub mod types;
pub mod window;

pub use provider::{AucklandProvider, ForecastProvider, OpenMeteoProvider};
pub use types::*;
pub use window::extract;
