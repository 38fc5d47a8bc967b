use energy_client::{HistorySource, MeterDelta, Snapshot, StationConfig, WindowProfile};
use serde::Serialize;
use time::OffsetDateTime;

use crate::snapshot::{fetch_snapshot, FetchError};

/// Drops up to this many kWh are measurement noise; larger drops mean the
/// counter was reset or rolled over.
pub const RESET_TOLERANCE_KWH: f64 = 1.0;

/// Consumption of a station between two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Consumption {
    pub total: f64,
    pub meters: Vec<MeterDelta>,
}

/// Non-negative consumption between two cumulative readings.
///
/// A drop beyond [`RESET_TOLERANCE_KWH`] is a counter reset and counts as 0;
/// smaller drops are noise and also count as 0.
pub fn clamp_delta(start: f64, end: f64) -> f64 {
    let raw = end - start;
    if raw < -RESET_TOLERANCE_KWH {
        0.0
    } else {
        raw.max(0.0)
    }
}

/// Per-meter and total consumption between `start` and `end`.
///
/// Meters missing from either snapshot are listed with no delta and add
/// nothing to the total.
pub fn aggregate_delta(station: &StationConfig, start: &Snapshot, end: &Snapshot) -> Consumption {
    let mut total = 0.0;
    let meters = station
        .meters()
        .iter()
        .map(|meter| {
            let from = start.get(&meter.tag);
            let to = end.get(&meter.tag);
            let delta = match (from, to) {
                (Some(a), Some(b)) => {
                    if b - a < -RESET_TOLERANCE_KWH {
                        metrics::counter!("meter_counter_resets_total").increment(1);
                        tracing::warn!(
                            station = %station.id,
                            meter = %meter.name,
                            start = a,
                            end = b,
                            "meter reading dropped, treating as counter reset"
                        );
                    }
                    let d = clamp_delta(a, b);
                    total += d;
                    Some(d)
                }
                _ => None,
            };
            MeterDelta::new(meter, from, to, delta)
        })
        .collect();

    Consumption { total, meters }
}

/// Fetch the start and end snapshots one after the other and aggregate them.
pub async fn compute_total_consumption<S>(
    source: &S,
    station: &StationConfig,
    start: OffsetDateTime,
    end: OffsetDateTime,
    profile: &WindowProfile,
) -> Result<Consumption, FetchError>
where
    S: HistorySource + ?Sized,
{
    let start_snapshot = fetch_snapshot(source, station, start, profile).await?;
    let end_snapshot = fetch_snapshot(source, station, end, profile).await?;
    Ok(aggregate_delta(station, &start_snapshot, &end_snapshot))
}
