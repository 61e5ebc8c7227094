use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;

/// Poll interval used when `CHECK_INTERVAL` is unset or unusable.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Open-Meteo forecast endpoint.
pub const DEFAULT_FORECAST_API_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a summary of all errors joined into one line
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Which forecast backend the scheduler polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForecastSource {
    #[default]
    OpenMeteo,
    /// NIWA/MetService placeholder. Must be asked for by name.
    Auckland,
}

impl ForecastSource {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open-meteo" | "openmeteo" | "open_meteo" => Some(Self::OpenMeteo),
            "auckland" => Some(Self::Auckland),
            _ => None,
        }
    }
}

/// Environment variables rainwatch reads. Everything else in the process
/// environment is ignored.
const ENV_KEYS: &[&str] = &[
    "LATITUDE",
    "LONGITUDE",
    "NTFY_URL",
    "NFTY_URL",
    "CHECK_INTERVAL",
    "FORECAST_PROVIDER",
    "FORECAST_API_URL",
];

/// Raw environment values, before any parsing. Keys arrive lowercased.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    latitude: Option<String>,
    longitude: Option<String>,
    ntfy_url: Option<String>,
    /// Spelling used by earlier deployments.
    nfty_url: Option<String>,
    check_interval: Option<String>,
    forecast_provider: Option<String>,
    forecast_api_url: Option<String>,
}

/// Process configuration, loaded once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct AlertConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub poll_interval: Duration,
    pub notify_endpoint: Url,
    pub forecast_source: ForecastSource,
    pub forecast_api_url: Url,
}

impl AlertConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<(Self, ValidationResult), ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of variables.
    ///
    /// Variable names are matched case-insensitively. Returns the config along
    /// with the validation warnings; any validation error is returned as
    /// [`ConfigError::Invalid`].
    pub fn from_vars<I>(vars: I) -> Result<(Self, ValidationResult), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let source: ::config::Map<String, String> = vars
            .into_iter()
            .filter(|(k, v)| {
                !v.trim().is_empty() && ENV_KEYS.iter().any(|known| known.eq_ignore_ascii_case(k))
            })
            .collect();

        let raw: RawSettings = ::config::Config::builder()
            .add_source(::config::Environment::default().source(Some(source)))
            .build()?
            .try_deserialize()?;

        Self::from_raw(raw)
    }

    /// Load from the process environment and log warnings.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let (config, validation) = Self::from_env()?;

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok(config)
    }

    fn from_raw(raw: RawSettings) -> Result<(Self, ValidationResult), ConfigError> {
        let lat_str = raw.latitude.ok_or_else(|| missing("LATITUDE"))?;
        let lon_str = raw.longitude.ok_or_else(|| missing("LONGITUDE"))?;
        let endpoint_str = raw
            .ntfy_url
            .or(raw.nfty_url)
            .ok_or_else(|| missing("NTFY_URL"))?;

        let mut result = ValidationResult::default();

        let latitude = parse_coordinate(&lat_str, "LATITUDE", -90.0, 90.0, &mut result);
        let longitude = parse_coordinate(&lon_str, "LONGITUDE", -180.0, 180.0, &mut result);
        let notify_endpoint = validate_url(&endpoint_str, "NTFY_URL", &mut result);

        let forecast_api_url = match raw.forecast_api_url.as_deref() {
            Some(s) => validate_url(s, "FORECAST_API_URL", &mut result),
            None => Url::parse(DEFAULT_FORECAST_API_URL).ok(),
        };

        let forecast_source = match raw.forecast_provider.as_deref() {
            None => ForecastSource::default(),
            Some(s) => ForecastSource::parse(s).unwrap_or_else(|| {
                result.add_error(
                    "FORECAST_PROVIDER",
                    format!("Unknown provider '{}', expected open-meteo or auckland", s),
                );
                ForecastSource::default()
            }),
        };

        let poll_interval = match raw.check_interval.as_deref() {
            None => DEFAULT_POLL_INTERVAL,
            Some(s) => match parse_go_duration(s) {
                Some(d) if !d.is_zero() => {
                    if d < Duration::from_secs(60) {
                        result.add_warning(
                            "CHECK_INTERVAL",
                            format!("Interval {:?} is shorter than one minute", d),
                        );
                    }
                    d
                }
                _ => {
                    result.add_warning(
                        "CHECK_INTERVAL",
                        format!("Ignoring unusable interval '{}', using 1h", s),
                    );
                    DEFAULT_POLL_INTERVAL
                }
            },
        };

        match (latitude, longitude, notify_endpoint, forecast_api_url) {
            (Some(latitude), Some(longitude), Some(notify_endpoint), Some(forecast_api_url))
                if result.is_valid() =>
            {
                Ok((
                    Self {
                        latitude,
                        longitude,
                        poll_interval,
                        notify_endpoint,
                        forecast_source,
                        forecast_api_url,
                    },
                    result,
                ))
            }
            _ => Err(ConfigError::Invalid(result.error_summary())),
        }
    }
}

fn missing(name: &str) -> ConfigError {
    ConfigError::MissingSetting(name.to_string())
}

fn parse_coordinate(
    value: &str,
    field: &str,
    min: f64,
    max: f64,
    result: &mut ValidationResult,
) -> Option<f64> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && (min..=max).contains(&v) => Some(v),
        Ok(v) => {
            result.add_error(field, format!("{} is outside [{}, {}]", v, min, max));
            None
        }
        Err(e) => {
            result.add_error(field, format!("Not a number: {}", e));
            None
        }
    }
}

/// Validate a URL field
fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) -> Option<Url> {
    match Url::parse(url_str.trim()) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
                return None;
            }

            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
                return None;
            }

            Some(url)
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
            None
        }
    }
}

/// Parse a Go-style duration string such as `90s`, `30m`, `1h30m` or `1.5h`.
///
/// Returns `None` for empty, negative or otherwise malformed input. A bare `0`
/// parses to zero.
pub fn parse_go_duration(input: &str) -> Option<Duration> {
    let s = input.trim();
    let s = s.strip_prefix('+').unwrap_or(s);
    if s.is_empty() || s.starts_with('-') {
        return None;
    }
    if s == "0" {
        return Some(Duration::ZERO);
    }

    let is_number = |c: char| c.is_ascii_digit() || c == '.';
    let mut seconds = 0f64;
    let mut rest = s;

    while !rest.is_empty() {
        let num_len = rest.find(|c: char| !is_number(c)).unwrap_or(rest.len());
        if num_len == 0 {
            return None;
        }
        let value: f64 = rest[..num_len].parse().ok()?;
        rest = &rest[num_len..];

        let unit_len = rest.find(is_number).unwrap_or(rest.len());
        let scale = match &rest[..unit_len] {
            "ns" => 1e-9,
            "us" | "µs" | "μs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return None,
        };
        seconds += value * scale;
        rest = &rest[unit_len..];
    }

    Duration::try_from_secs_f64(seconds).ok()
}
