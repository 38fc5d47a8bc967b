use energy_client::{HistorySource, StationConfig, WindowProfile};
use serde::Serialize;
use time::{macros::format_description, Duration, OffsetDateTime};

use super::{pairwise_totals, round2, DataQuality};
use crate::snapshot::fetch_snapshots;

pub const DEFAULT_POINTS: usize = 12;
pub const DEFAULT_INTERVAL_MINUTES: u32 = 5;
pub const MAX_POINTS: usize = 288;
pub const MAX_INTERVAL_MINUTES: u32 = 60;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerPoint {
    /// End of the bucket.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub label: String,
    pub kw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealtimeSeries {
    pub station_id: String,
    pub interval_minutes: u32,
    pub points: Vec<PowerPoint>,
    pub quality: DataQuality,
}

/// Average power over `points` equal buckets of `interval_minutes`, ending at `now`.
///
/// A bucket whose boundary snapshot is missing reports 0 kW.
pub async fn compute_realtime<S>(
    source: &S,
    station: &StationConfig,
    now: OffsetDateTime,
    points: usize,
    interval_minutes: u32,
    profile: &WindowProfile,
) -> RealtimeSeries
where
    S: HistorySource + ?Sized,
{
    let points = points.clamp(1, MAX_POINTS);
    let interval_minutes = interval_minutes.clamp(1, MAX_INTERVAL_MINUTES);
    let step = Duration::minutes(i64::from(interval_minutes));

    let boundaries: Vec<OffsetDateTime> = (0..=points)
        .rev()
        .map(|back| now - step * back as u32)
        .collect();

    let snapshots = fetch_snapshots(source, station, &boundaries, profile).await;
    let totals = pairwise_totals(station, &snapshots);
    let resolved = totals.iter().filter(|t| t.is_some()).count();

    let label_format = format_description!("[hour]:[minute]");
    let per_hour = 60.0 / f64::from(interval_minutes);
    let points = boundaries[1..]
        .iter()
        .zip(totals)
        .map(|(&end, kwh)| PowerPoint {
            timestamp: end,
            label: end.format(&label_format).unwrap_or_default(),
            kw: round2(kwh.unwrap_or(0.0) * per_hour),
        })
        .collect::<Vec<_>>();

    if resolved < points.len() {
        tracing::debug!(
            station = %station.id,
            missing = points.len() - resolved,
            "realtime buckets without boundary data reported as 0 kW"
        );
    }

    RealtimeSeries {
        station_id: station.id.clone(),
        interval_minutes,
        quality: DataQuality::from_counts(resolved, points.len()),
        points,
    }
}
