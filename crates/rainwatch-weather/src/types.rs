use serde::Deserialize;
use std::time::Duration;

/// Lowest WMO code reported for thunderstorms.
pub const THUNDERSTORM_CODE_MIN: i32 = 95;
/// Highest WMO code reported for thunderstorms.
pub const THUNDERSTORM_CODE_MAX: i32 = 99;

/// Returns true when a WMO weather code denotes a thunderstorm.
pub fn is_thunderstorm_code(code: i32) -> bool {
    (THUNDERSTORM_CODE_MIN..=THUNDERSTORM_CODE_MAX).contains(&code)
}

/// Geographic point being watched
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Aggregated outlook for the next forecast window.
///
/// Built fresh every cycle and dropped once the alert decision is made.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WeatherSnapshot {
    pub precipitation_sum_mm: f64,
    pub has_thunderstorm: bool,
}

/// Hourly forecast columns as returned by Open-Meteo.
///
/// The columns are index-aligned. `precipitation` and `weathercode` may be
/// shorter than `time` or contain nulls; those hours simply carry no value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HourlySeries {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub precipitation: Vec<Option<f64>>,
    #[serde(default)]
    pub weathercode: Vec<Option<i32>>,
}

impl HourlySeries {
    pub fn precipitation_at(&self, index: usize) -> Option<f64> {
        self.precipitation.get(index).copied().flatten()
    }

    pub fn weathercode_at(&self, index: usize) -> Option<i32> {
        self.weathercode.get(index).copied().flatten()
    }
}

/// Forecast API response body
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    pub hourly: HourlySeries,
}

/// Forecast provider errors
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to build forecast request: {0}")]
    Request(String),
    #[error("Network error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("Forecast request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Forecast API returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("Failed to read forecast body: {0}")]
    Decode(String),
    #[error("Malformed forecast payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("{provider} provider is not implemented yet")]
    NotImplemented { provider: &'static str },
}
