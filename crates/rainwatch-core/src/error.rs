//! Startup error types for rainwatch.
//!
//! Only configuration problems are fatal. Everything that can go wrong during a
//! polling cycle is typed in the crate that owns the operation and is logged by
//! the scheduler instead of being raised here.

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    MissingSetting(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    /// Returns an operator-facing hint for the failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::MissingSetting(_) => {
                "A required environment variable is missing. Set LATITUDE, LONGITUDE and NTFY_URL."
            }
            ConfigError::Invalid(_) => "Invalid configuration. Check your environment variables.",
            ConfigError::ParseError(_) => "The environment could not be read as configuration.",
        }
    }
}

impl From<::config::ConfigError> for ConfigError {
    fn from(e: ::config::ConfigError) -> Self {
        ConfigError::ParseError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_non_empty() {
        let errors = [
            ConfigError::MissingSetting("LATITUDE".into()),
            ConfigError::Invalid("latitude: out of range".into()),
            ConfigError::ParseError("bad".into()),
        ];

        for e in &errors {
            assert!(!e.user_message().is_empty());
        }
    }

    #[test]
    fn test_display_includes_detail() {
        let err = ConfigError::MissingSetting("NTFY_URL".into());
        assert_eq!(err.to_string(), "Missing required setting: NTFY_URL");
    }

    #[test]
    fn test_missing_setting_hint_names_variables() {
        let err = ConfigError::MissingSetting("LATITUDE".into());
        assert!(err.user_message().contains("LATITUDE"));
    }
}
