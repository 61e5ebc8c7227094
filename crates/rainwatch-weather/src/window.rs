//! Reduces an hourly forecast to the next three hours.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

use crate::types::{is_thunderstorm_code, HourlySeries, WeatherSnapshot};

/// Timestamp layout used by Open-Meteo with `timezone=UTC`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Look-ahead covered by a snapshot.
pub const FORECAST_WINDOW: TimeDelta = TimeDelta::hours(3);

/// Parse an hourly timestamp (`YYYY-MM-DDTHH:MM`, implicitly UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// True when `ts` lies in `(now, now + 3h]`.
pub fn in_window(ts: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    ts > now && ts <= now + FORECAST_WINDOW
}

/// Sum precipitation and look for thunder over the hours in `(now, now + 3h]`.
///
/// Entries with unparseable timestamps are skipped. Hours without a
/// precipitation value or weather code contribute nothing for that column.
pub fn extract(series: &HourlySeries, now: DateTime<Utc>) -> WeatherSnapshot {
    let mut snapshot = WeatherSnapshot::default();

    for (i, raw) in series.time.iter().enumerate() {
        let Some(ts) = parse_timestamp(raw) else {
            tracing::debug!("Skipping unparseable forecast timestamp {:?}", raw);
            continue;
        };

        if !in_window(ts, now) {
            continue;
        }

        if let Some(mm) = series.precipitation_at(i) {
            snapshot.precipitation_sum_mm += mm;
        }

        if series.weathercode_at(i).is_some_and(is_thunderstorm_code) {
            snapshot.has_thunderstorm = true;
        }
    }

    snapshot
}
