use energy_client::{HistorySource, StationConfig, WindowProfile};
use serde::Serialize;
use time::OffsetDateTime;

use super::{note_degraded, one_year_earlier, percent_change, round2, DataQuality, Period};
use crate::aggregate::compute_total_consumption;

/// Period-over-period comparison.
///
/// `mom_*` compares against the immediately preceding period of equal length,
/// `yoy_*` against the same period one calendar year earlier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub station_id: String,
    pub period: Period,
    pub current_kwh: f64,
    pub mom_baseline_kwh: f64,
    pub mom_percent: f64,
    pub yoy_baseline_kwh: f64,
    pub yoy_percent: f64,
    pub quality: DataQuality,
}

pub async fn compute_compare<S>(
    source: &S,
    station: &StationConfig,
    period: Period,
    now: OffsetDateTime,
    profile: &WindowProfile,
) -> Comparison
where
    S: HistorySource + ?Sized,
{
    let length = period.duration();
    let start = now - length;

    let ranges = [
        ("current", start, now),
        ("previous_period", start - length, start),
        ("previous_year", one_year_earlier(start), one_year_earlier(now)),
    ];

    let mut totals = [0.0; 3];
    let mut succeeded = 0;
    for (slot, (part, from, to)) in totals.iter_mut().zip(ranges) {
        match compute_total_consumption(source, station, from, to, profile).await {
            Ok(consumption) => {
                *slot = consumption.total;
                succeeded += 1;
            }
            Err(e) => note_degraded("compare", station, part, &e),
        }
    }
    let [current, previous, year_ago] = totals;

    Comparison {
        station_id: station.id.clone(),
        period,
        current_kwh: round2(current),
        mom_baseline_kwh: round2(previous),
        mom_percent: percent_change(current, previous),
        yoy_baseline_kwh: round2(year_ago),
        yoy_percent: percent_change(current, year_ago),
        quality: DataQuality::from_counts(succeeded, ranges.len()),
    }
}
