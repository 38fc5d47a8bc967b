use energy_client::{HistorySource, StationConfig, WindowProfile};
use serde::Serialize;
use time::{macros::format_description, Duration, OffsetDateTime};

use super::{pairwise_totals, round2, start_of_day, start_of_hour, DataQuality, Period};
use crate::snapshot::fetch_snapshots;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// Start of the bucket.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub label: String,
    pub kwh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub station_id: String,
    pub period: Period,
    pub points: Vec<TrendPoint>,
    pub total_kwh: f64,
    pub quality: DataQuality,
}

/// Bucket start times for `period`, oldest first, followed by `now`.
///
/// 24h uses hour buckets aligned to the clock hour; 7d and 30d use day buckets
/// aligned to local midnight. The newest bucket is the one still in progress
/// and ends at `now`.
pub fn trend_boundaries(period: Period, now: OffsetDateTime) -> Vec<OffsetDateTime> {
    let (anchor, step, count) = match period {
        Period::Day => (start_of_hour(now), Duration::hours(1), 24),
        Period::Week => (start_of_day(now), Duration::days(1), 7),
        Period::Month => (start_of_day(now), Duration::days(1), 30),
    };
    // exactly on a boundary: the in-progress bucket would be empty
    let anchor = if anchor == now { anchor - step } else { anchor };

    let mut boundaries: Vec<OffsetDateTime> = (0..count).rev().map(|back: u32| anchor - step * back).collect();
    boundaries.push(now);
    boundaries
}

/// Consumption per bucket over `period`.
pub async fn compute_trend<S>(
    source: &S,
    station: &StationConfig,
    period: Period,
    now: OffsetDateTime,
    profile: &WindowProfile,
) -> TrendSeries
where
    S: HistorySource + ?Sized,
{
    let boundaries = trend_boundaries(period, now);
    let snapshots = fetch_snapshots(source, station, &boundaries, profile).await;
    let totals = pairwise_totals(station, &snapshots);
    let resolved = totals.iter().filter(|t| t.is_some()).count();

    let hour_label = format_description!("[hour]:00");
    let day_label = format_description!("[month]-[day]");

    let points: Vec<TrendPoint> = boundaries
        .iter()
        .zip(totals)
        .map(|(&start, kwh)| {
            let label = match period {
                Period::Day => start.format(&hour_label),
                Period::Week | Period::Month => start.format(&day_label),
            };
            TrendPoint {
                timestamp: start,
                label: label.unwrap_or_default(),
                kwh: round2(kwh.unwrap_or(0.0)),
            }
        })
        .collect();

    TrendSeries {
        station_id: station.id.clone(),
        period,
        total_kwh: round2(points.iter().map(|p| p.kwh).sum()),
        quality: DataQuality::from_counts(resolved, points.len()),
        points,
    }
}
