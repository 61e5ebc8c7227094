//! Fixed-interval poll, decide and notify loop.
//!
//! The first cycle runs one full `poll_interval` after [`Scheduler::run`] is
//! called, never at startup. Cycles do not overlap and a failing cycle only
//! produces a log line.

use std::time::Duration;

use rainwatch_core::{AlertConfig, ForecastSource};
use rainwatch_weather::{
    AucklandProvider, Coordinates, FetchError, ForecastProvider, OpenMeteoProvider,
    WeatherSnapshot,
};
use thiserror::Error;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::alert::{self, AlertMessage};
use crate::notifier::{Notifier, SendError};

/// Time allowed for fetch plus notify in a single cycle.
pub const DEFAULT_CYCLE_BUDGET: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("Forecast error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Alert error: {0}")]
    Send(#[from] SendError),

    #[error("Cycle did not finish within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlertStatus {
    Clear,
    Sent(AlertMessage),
}

/// What a successful cycle saw and did.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    pub snapshot: WeatherSnapshot,
    pub alert: AlertStatus,
}

/// Build the provider named by the configuration.
pub fn provider_for(config: &AlertConfig) -> Result<Box<dyn ForecastProvider>, FetchError> {
    match config.forecast_source {
        ForecastSource::OpenMeteo => Ok(Box::new(OpenMeteoProvider::with_base_url(
            config.forecast_api_url.as_str(),
        )?)),
        ForecastSource::Auckland => {
            tracing::warn!("Auckland provider selected; every forecast fetch will fail");
            Ok(Box::new(AucklandProvider))
        }
    }
}

pub struct Scheduler {
    provider: Box<dyn ForecastProvider>,
    notifier: Notifier,
    coordinates: Coordinates,
    poll_interval: Duration,
    cycle_budget: Duration,
}

impl Scheduler {
    pub fn new(config: &AlertConfig, provider: Box<dyn ForecastProvider>, notifier: Notifier) -> Self {
        Self {
            provider,
            notifier,
            coordinates: Coordinates::new(config.latitude, config.longitude),
            poll_interval: config.poll_interval,
            cycle_budget: DEFAULT_CYCLE_BUDGET,
        }
    }

    pub fn with_cycle_budget(mut self, cycle_budget: Duration) -> Self {
        self.cycle_budget = cycle_budget;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Tick forever until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) {
        tracing::info!(
            "Watching {:.4},{:.4} via {} every {:?}",
            self.coordinates.latitude,
            self.coordinates.longitude,
            self.provider.name(),
            self.poll_interval
        );

        let mut ticker =
            tokio::time::interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.run_cycle() => match result {
                    Ok(outcome) => tracing::debug!("Cycle finished: {:?}", outcome.alert),
                    Err(e) => tracing::error!("{}", e),
                },
            }
        }

        tracing::info!("Scheduler stopped");
    }

    /// Run one fetch, decide and notify pass within the cycle budget.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, CycleError> {
        let budget = self.cycle_budget;
        let deadline = Instant::now() + budget;

        match tokio::time::timeout(budget, self.check_and_alert(deadline)).await {
            Ok(result) => result,
            Err(_) => Err(CycleError::Timeout(budget)),
        }
    }

    async fn check_and_alert(&self, deadline: Instant) -> Result<CycleOutcome, CycleError> {
        let snapshot = self
            .provider
            .fetch(self.coordinates, remaining(deadline))
            .await?;

        let Some(message) = alert::decide(&snapshot) else {
            tracing::debug!(
                "No alert: {:.1}mm, thunderstorm={}",
                snapshot.precipitation_sum_mm,
                snapshot.has_thunderstorm
            );
            return Ok(CycleOutcome {
                snapshot,
                alert: AlertStatus::Clear,
            });
        };

        self.notifier
            .send(message.as_str(), remaining(deadline))
            .await?;
        tracing::info!("Alert sent: {}", message);

        Ok(CycleOutcome {
            snapshot,
            alert: AlertStatus::Sent(message),
        })
    }
}

fn remaining(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingProvider {
        snapshot: WeatherSnapshot,
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl ForecastProvider for CountingProvider {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn fetch(
            &self,
            _coordinates: Coordinates,
            _time_budget: Duration,
        ) -> Result<WeatherSnapshot, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(FetchError::Decode("mock error".into()))
            } else {
                Ok(self.snapshot)
            }
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl ForecastProvider for SlowProvider {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn fetch(
            &self,
            _coordinates: Coordinates,
            _time_budget: Duration,
        ) -> Result<WeatherSnapshot, FetchError> {
            tokio::time::sleep(Duration::from_secs(120)).await;
            Ok(WeatherSnapshot::default())
        }
    }

    fn config(extra: &[(&str, &str)]) -> AlertConfig {
        let mut vars = vec![
            ("LATITUDE".to_string(), "-36.8485".to_string()),
            ("LONGITUDE".to_string(), "174.7633".to_string()),
            ("NTFY_URL".to_string(), "http://127.0.0.1:9/unused".to_string()),
            ("CHECK_INTERVAL".to_string(), "1m".to_string()),
        ];
        vars.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        AlertConfig::from_vars(vars).unwrap().0
    }

    fn scheduler(provider: Box<dyn ForecastProvider>) -> Scheduler {
        let config = config(&[]);
        let notifier = Notifier::new(config.notify_endpoint.clone()).unwrap();
        Scheduler::new(&config, provider, notifier)
    }

    fn counting(fail: bool) -> (Box<dyn ForecastProvider>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider {
            snapshot: WeatherSnapshot {
                precipitation_sum_mm: 1.0,
                has_thunderstorm: false,
            },
            calls: calls.clone(),
            fail,
        };
        (Box::new(provider), calls)
    }

    #[tokio::test]
    async fn test_calm_cycle_sends_nothing() {
        let (provider, calls) = counting(false);
        let outcome = scheduler(provider).run_cycle().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.alert, AlertStatus::Clear);
        assert!((outcome.snapshot.precipitation_sum_mm - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_fetch_error_is_reported() {
        let (provider, _) = counting(true);
        let result = scheduler(provider).run_cycle().await;

        assert!(matches!(result, Err(CycleError::Fetch(FetchError::Decode(_)))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetch_times_out() {
        let scheduler = scheduler(Box::new(SlowProvider));
        let result = scheduler.run_cycle().await;

        assert!(matches!(result, Err(CycleError::Timeout(d)) if d == DEFAULT_CYCLE_BUDGET));
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_cycle_budget() {
        let scheduler =
            scheduler(Box::new(SlowProvider)).with_cycle_budget(Duration::from_secs(5));
        let result = scheduler.run_cycle().await;

        assert!(matches!(result, Err(CycleError::Timeout(d)) if d == Duration::from_secs(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_cycle_waits_one_interval() {
        let (provider, calls) = counting(false);
        let scheduler = scheduler(provider);
        assert_eq!(scheduler.poll_interval(), Duration::from_secs(60));

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn({
            let shutdown = shutdown.clone();
            async move { scheduler.run(shutdown).await }
        });

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0, "no cycle at startup");

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_cycles_do_not_stop_loop() {
        let (provider, calls) = counting(true);
        let scheduler = scheduler(provider);

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn({
            let shutdown = shutdown.clone();
            async move { scheduler.run(shutdown).await }
        });

        tokio::time::sleep(Duration::from_secs(3 * 60 + 1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_placeholder_provider_must_be_selected() {
        let default = provider_for(&config(&[])).unwrap();
        assert_eq!(default.name(), "open-meteo");

        let chosen = provider_for(&config(&[("FORECAST_PROVIDER", "auckland")])).unwrap();
        assert_eq!(chosen.name(), "auckland");

        let result = scheduler(chosen).run_cycle().await;
        assert!(matches!(
            result,
            Err(CycleError::Fetch(FetchError::NotImplemented { .. }))
        ));
    }
}
