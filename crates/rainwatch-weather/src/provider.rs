//! Forecast providers.
//!
//! [`OpenMeteoProvider`] is the only working backend. [`AucklandProvider`]
//! reserves a slot for a NIWA/MetService integration and always errors.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::time::Duration;
use tracing::instrument;

use crate::types::{Coordinates, FetchError, ForecastResponse, WeatherSnapshot};
use crate::window;

const USER_AGENT: &str = concat!("rainwatch/", env!("CARGO_PKG_VERSION"));

/// Source of forecast snapshots for a single point.
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Fetch the outlook for the next forecast window.
    ///
    /// The whole request, including reading the body, must finish within
    /// `time_budget`.
    async fn fetch(
        &self,
        coordinates: Coordinates,
        time_budget: Duration,
    ) -> Result<WeatherSnapshot, FetchError>;
}

#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    client: Client,
    base_url: String,
}

impl OpenMeteoProvider {
    /// Build a provider for the given forecast endpoint.
    pub fn with_base_url(base_url: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Fetch and reduce the forecast relative to a fixed instant.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_at(
        &self,
        coordinates: Coordinates,
        time_budget: Duration,
        now: DateTime<Utc>,
    ) -> Result<WeatherSnapshot, FetchError> {
        let response = self.fetch_hourly(coordinates, time_budget).await?;
        let snapshot = window::extract(&response.hourly, now);

        tracing::debug!(
            "Forecast window: {:.1}mm, thunderstorm={}",
            snapshot.precipitation_sum_mm,
            snapshot.has_thunderstorm
        );
        Ok(snapshot)
    }

    async fn fetch_hourly(
        &self,
        coordinates: Coordinates,
        time_budget: Duration,
    ) -> Result<ForecastResponse, FetchError> {
        let request = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", format!("{:.4}", coordinates.latitude)),
                ("longitude", format!("{:.4}", coordinates.longitude)),
                ("hourly", "precipitation,weathercode".to_string()),
                ("forecast_days", "1".to_string()),
                ("timezone", "UTC".to_string()),
            ])
            .timeout(time_budget)
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| classify(e, time_budget))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(time_budget)
            } else {
                FetchError::Decode(e.to_string())
            }
        })?;

        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl ForecastProvider for OpenMeteoProvider {
    fn name(&self) -> &'static str {
        "open-meteo"
    }

    async fn fetch(
        &self,
        coordinates: Coordinates,
        time_budget: Duration,
    ) -> Result<WeatherSnapshot, FetchError> {
        self.fetch_at(coordinates, time_budget, Utc::now()).await
    }
}

fn classify(error: reqwest::Error, time_budget: Duration) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout(time_budget)
    } else if error.is_builder() {
        FetchError::Request(error.to_string())
    } else {
        FetchError::Transport(error)
    }
}

/// Placeholder for NIWA/MetService data covering Auckland.
#[derive(Debug, Clone, Default)]
pub struct AucklandProvider;

#[async_trait]
impl ForecastProvider for AucklandProvider {
    fn name(&self) -> &'static str {
        "auckland"
    }

    async fn fetch(
        &self,
        _coordinates: Coordinates,
        _time_budget: Duration,
    ) -> Result<WeatherSnapshot, FetchError> {
        Err(FetchError::NotImplemented {
            provider: self.name(),
        })
    }
}
