//! Reshaping of the 3-hourly forecast feed into daily and hourly lists.

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::model::{ForecastEntry, HourlyEntry, round_temperature};

/// Feed entries per 24 hours at 3-hour granularity.
pub const SAMPLES_PER_DAY: usize = 8;

/// One entry of the 3-hourly feed, already decoded from the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSample {
    pub timestamp: DateTime<Utc>,
    pub temp: f64,
    pub temp_max: f64,
    pub temp_min: f64,
    pub icon: String,
    pub description: String,
}

/// Every 8th sample starting with the first, one per day.
pub fn daily(samples: &[ForecastSample]) -> Vec<ForecastEntry> {
    samples
        .iter()
        .step_by(SAMPLES_PER_DAY)
        .map(|s| ForecastEntry {
            timestamp: s.timestamp,
            temp_max: s.temp_max,
            temp_min: s.temp_min,
            icon: s.icon.clone(),
            description: s.description.clone(),
        })
        .collect()
}

/// The next 24 hours: first eight samples with rounded temperatures.
pub fn hourly(samples: &[ForecastSample], offset: FixedOffset) -> Vec<HourlyEntry> {
    samples
        .iter()
        .take(SAMPLES_PER_DAY)
        .map(|s| HourlyEntry {
            time: s.timestamp.with_timezone(&offset).format("%H:%M").to_string(),
            temperature: round_temperature(s.temp),
            icon: s.icon.clone(),
        })
        .collect()
}

/// Offset for a `timezone` value in seconds; out-of-range values fall back to UTC.
pub fn utc_offset(seconds: i32) -> FixedOffset {
    FixedOffset::east_opt(seconds).unwrap_or_else(|| Utc.fix())
}

pub fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}
