//! Alert decision for a forecast snapshot.

use rainwatch_weather::WeatherSnapshot;

/// Precipitation over the forecast window that triggers an alert.
pub const HEAVY_RAIN_THRESHOLD_MM: f64 = 50.0;

/// Text pushed to the notification endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage(String);

impl AlertMessage {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AlertMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns an alert when the window holds heavy rain or any thunderstorm hour.
///
/// Stateless: the same snapshot always yields the same answer, so consecutive
/// stormy cycles each produce an alert.
pub fn decide(snapshot: &WeatherSnapshot) -> Option<AlertMessage> {
    if snapshot.precipitation_sum_mm >= HEAVY_RAIN_THRESHOLD_MM || snapshot.has_thunderstorm {
        Some(AlertMessage(format!(
            "Heavy rain or thunderstorm expected in next 3h. Precipitation: {:.1}mm",
            snapshot.precipitation_sum_mm
        )))
    } else {
        None
    }
}
