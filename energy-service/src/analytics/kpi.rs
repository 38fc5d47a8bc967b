use energy_client::{HistorySource, Snapshot, StationConfig, WindowProfile};
use serde::Serialize;
use time::{Duration, OffsetDateTime};

use super::{note_degraded, round2, start_of_day, DataQuality};
use crate::{
    aggregate::aggregate_delta,
    snapshot::{fetch_snapshots, FetchError},
};

/// Headline figures for a station dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpi {
    pub station_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
    pub today_kwh: f64,
    pub current_kw: f64,
    pub peak_kw: f64,
    pub quality: DataQuality,
}

/// Today's consumption since local midnight plus a power estimate.
///
/// Current power comes from the last 15 minutes scaled to an hour; when that
/// window shows no consumption the raw last-hour delta is used instead. Peak is
/// the larger of current power and the last-hour delta.
pub async fn compute_kpi<S>(source: &S, station: &StationConfig, now: OffsetDateTime, profile: &WindowProfile) -> Kpi
where
    S: HistorySource + ?Sized,
{
    let midnight = start_of_day(now);
    let hour_ago = now - Duration::hours(1);
    let quarter_ago = now - Duration::minutes(15);

    let snapshots = fetch_snapshots(source, station, &[midnight, hour_ago, quarter_ago, now], profile).await;
    let succeeded = snapshots.iter().filter(|s| s.is_ok()).count();
    let quality = DataQuality::from_counts(succeeded, snapshots.len());

    let now_snap = &snapshots[3];
    let since = |from: &Result<Snapshot, FetchError>, part: &str| -> f64 {
        match (from, now_snap) {
            (Ok(start), Ok(end)) => aggregate_delta(station, start, end).total,
            (Err(e), _) | (_, Err(e)) => {
                note_degraded("kpi", station, part, e);
                0.0
            }
        }
    };

    let today = since(&snapshots[0], "today");
    let hour_delta = since(&snapshots[1], "last_hour");
    let quarter_delta = since(&snapshots[2], "last_15min");

    let current_kw = if quarter_delta > 0.0 { quarter_delta * 4.0 } else { hour_delta };
    let peak_kw = current_kw.max(hour_delta);

    Kpi {
        station_id: station.id.clone(),
        generated_at: now,
        today_kwh: round2(today),
        current_kw: round2(current_kw),
        peak_kw: round2(peak_kw),
        quality,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{series, station, FakeStation, ScriptedSource};
    use energy_client::{MeterTag, QueryOutcome};
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2024-03-01 14:00:00 +08:00);

    /// 10 kWh per hour until 13:45, then 30 kWh per hour.
    fn steady_then_busy(t: OffsetDateTime) -> f64 {
        let midnight = datetime!(2024-03-01 00:00:00 +08:00);
        let switch = datetime!(2024-03-01 13:45:00 +08:00);
        let hours = |d: Duration| d.whole_seconds() as f64 / 3600.0;
        if t <= switch {
            5000.0 + 10.0 * hours(t - midnight)
        } else {
            5000.0 + 10.0 * hours(switch - midnight) + 30.0 * hours(t - switch)
        }
    }

    #[tokio::test]
    async fn kpi_prefers_scaled_quarter_hour_delta() {
        let source = FakeStation::new(|_, t| Some(steady_then_busy(t)));

        let kpi = compute_kpi(&source, &station(), NOW, &WindowProfile::default()).await;

        // 137.5 until 13:45 plus 7.5 in the last quarter hour
        assert_eq!(kpi.today_kwh, 145.0);
        assert_eq!(kpi.current_kw, 30.0);
        // last hour: 7.5 at 10/h + 7.5 at 30/h
        assert_eq!(kpi.peak_kw, 30.0);
        assert_eq!(kpi.quality, DataQuality::Full);
        assert_eq!(source.queries(), 4);
    }

    #[tokio::test]
    async fn kpi_falls_back_to_hour_delta_when_quarter_is_flat() {
        // consumption stopped at 13:30
        let stop = datetime!(2024-03-01 13:30:00 +08:00);
        let source = FakeStation::new(move |_, t| {
            let t = if t > stop { stop } else { t };
            Some(1000.0 + 12.0 * (t - datetime!(2024-03-01 00:00:00 +08:00)).whole_minutes() as f64 / 60.0)
        });

        let kpi = compute_kpi(&source, &station(), NOW, &WindowProfile::default()).await;

        assert_eq!(kpi.current_kw, 6.0);
        assert_eq!(kpi.peak_kw, 6.0);
        assert_eq!(kpi.today_kwh, 162.0);
    }

    #[tokio::test]
    async fn kpi_degrades_failed_sub_fetches_to_zero() {
        // no data at all before noon: the midnight snapshot is unavailable
        let noon = datetime!(2024-03-01 12:00:00 +08:00);
        let source = FakeStation::new(move |_, t| (t >= noon).then(|| steady_then_busy(t)));

        let kpi = compute_kpi(&source, &station(), NOW, &WindowProfile::default()).await;

        assert_eq!(kpi.today_kwh, 0.0);
        assert_eq!(kpi.current_kw, 30.0);
        assert_eq!(kpi.quality, DataQuality::Partial);
    }

    #[tokio::test]
    async fn kpi_for_silent_station_is_all_zero() {
        let source = FakeStation::new(|_, _| None);

        let kpi = compute_kpi(&source, &station(), NOW, &WindowProfile::default()).await;

        assert_eq!(kpi.today_kwh, 0.0);
        assert_eq!(kpi.current_kw, 0.0);
        assert_eq!(kpi.peak_kw, 0.0);
        assert_eq!(kpi.quality, DataQuality::Unavailable);
    }

    #[tokio::test]
    async fn unreachable_midnight_only_zeroes_today() {
        let tag = MeterTag::new("OBJ001", "LSA1_28");
        let found = |at: OffsetDateTime, value: f64| QueryOutcome::Found(vec![series(&tag, &[(at, Some(value))])]);
        let source = ScriptedSource::new(vec![
            QueryOutcome::TransportError("timed out".to_string()),
            found(datetime!(2024-03-01 13:00:00 +08:00), 100.0),
            found(datetime!(2024-03-01 13:45:00 +08:00), 105.0),
            found(NOW, 110.0),
        ]);

        let kpi = compute_kpi(&source, &station(), NOW, &WindowProfile::default()).await;

        assert_eq!(kpi.today_kwh, 0.0);
        assert_eq!(kpi.current_kw, 20.0);
        assert_eq!(kpi.peak_kw, 20.0);
        assert_eq!(kpi.quality, DataQuality::Partial);
        assert_eq!(source.calls().len(), 4);
    }
}
