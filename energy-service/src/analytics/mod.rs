//! Read-side metrics built on snapshots and deltas.
//!
//! None of these computations fail: a sub-fetch that cannot complete degrades
//! to zero (or an empty list) and lowers the reported [`DataQuality`].

pub mod classify;
pub mod compare;
pub mod kpi;
pub mod realtime;
pub mod trend;

use std::{fmt, str::FromStr};

use energy_client::{Snapshot, StationConfig};
use serde::Serialize;
use time::{Date, Duration, OffsetDateTime, Time};

use crate::{aggregate::aggregate_delta, snapshot::FetchError};

pub use classify::{classify_consumption, classify_meter, compute_classification, CategoryShare, Classification};
pub use compare::{compute_compare, Comparison};
pub use kpi::{compute_kpi, Kpi};
pub use realtime::{compute_realtime, PowerPoint, RealtimeSeries};
pub use trend::{compute_trend, TrendPoint, TrendSeries};

/// How much of the data behind a metric could actually be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataQuality {
    Full,
    Partial,
    Unavailable,
}

impl DataQuality {
    pub fn from_counts(succeeded: usize, attempted: usize) -> Self {
        if attempted > 0 && succeeded == attempted {
            Self::Full
        } else if succeeded == 0 {
            Self::Unavailable
        } else {
            Self::Partial
        }
    }
}

/// Reporting period for trend, comparison and classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Period {
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "24h",
            Self::Week => "7d",
            Self::Month => "30d",
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            Self::Day => Duration::hours(24),
            Self::Week => Duration::days(7),
            Self::Month => Duration::days(30),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown period '{0}', expected one of 24h, 7d, 30d")]
pub struct ParsePeriodError(pub String);

impl FromStr for Period {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "24h" | "day" => Ok(Self::Day),
            "7d" | "week" => Ok(Self::Week),
            "30d" | "month" => Ok(Self::Month),
            _ => Err(ParsePeriodError(s.to_string())),
        }
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `(current - baseline) / baseline * 100`, or 0 when there is no positive baseline.
pub(crate) fn percent_change(current: f64, baseline: f64) -> f64 {
    if baseline <= 0.0 {
        return 0.0;
    }
    round2((current - baseline) / baseline * 100.0)
}

pub(crate) fn start_of_day(t: OffsetDateTime) -> OffsetDateTime {
    t.replace_time(Time::MIDNIGHT)
}

pub(crate) fn start_of_hour(t: OffsetDateTime) -> OffsetDateTime {
    start_of_day(t) + Duration::hours(i64::from(t.hour()))
}

/// The same wall-clock instant one calendar year earlier; Feb 29 becomes Feb 28.
pub(crate) fn one_year_earlier(t: OffsetDateTime) -> OffsetDateTime {
    let year = t.year() - 1;
    let date = Date::from_calendar_date(year, t.month(), t.day())
        .or_else(|_| Date::from_calendar_date(year, t.month(), t.day() - 1))
        .unwrap_or_else(|_| t.date() - Duration::days(365));
    t.replace_date(date)
}

/// Total consumption of each consecutive snapshot pair; `None` where either side is missing.
pub(crate) fn pairwise_totals(
    station: &StationConfig,
    snapshots: &[Result<Snapshot, FetchError>],
) -> Vec<Option<f64>> {
    snapshots
        .windows(2)
        .map(|pair| match (&pair[0], &pair[1]) {
            (Ok(start), Ok(end)) => Some(aggregate_delta(station, start, end).total),
            _ => None,
        })
        .collect()
}

/// Log and count a sub-computation that fell back to a degraded value.
pub(crate) fn note_degraded(metric: &'static str, station: &StationConfig, part: &str, err: &FetchError) {
    metrics::counter!("metric_degraded_total", "metric" => metric).increment(1);
    tracing::warn!(station = %station.id, metric, part, error = %err, "sub-computation degraded");
}
