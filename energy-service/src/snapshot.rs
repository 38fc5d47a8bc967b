//! Point-in-time meter snapshots resolved from station history queries.

use energy_client::{HistorySource, QueryOutcome, Snapshot, StationConfig, WindowProfile};
use time::OffsetDateTime;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Every window was tried and none produced a usable value.
    #[error("no usable data for station {station} around {at}: {reason}")]
    Unavailable {
        station: String,
        at: OffsetDateTime,
        reason: String,
    },
    /// The station could not be reached or answered with an HTTP error.
    #[error("request to station {station} failed: {reason}")]
    Request { station: String, reason: String },
}

impl FetchError {
    pub fn is_request(&self) -> bool {
        matches!(self, Self::Request { .. })
    }
}

/// Resolve the snapshot nearest to `at`, widening the query window profile by profile.
///
/// An empty or unparseable answer moves on to the next window. A transport
/// failure aborts at once.
pub async fn fetch_snapshot<S>(
    source: &S,
    station: &StationConfig,
    at: OffsetDateTime,
    profile: &WindowProfile,
) -> Result<Snapshot, FetchError>
where
    S: HistorySource + ?Sized,
{
    let tags = station.tags();
    let windows = profile.windows();
    let mut reason = "no query windows configured".to_string();

    for (attempt, window) in windows.iter().enumerate() {
        let (start, end) = window.around(at);
        metrics::counter!("station_queries_total").increment(1);

        match source.query(&tags, start, end).await {
            QueryOutcome::Found(series) => {
                let snapshot = Snapshot::nearest(at, &series);
                if !snapshot.is_empty() {
                    tracing::debug!(
                        station = %station.id,
                        attempt,
                        values = snapshot.len(),
                        "snapshot resolved"
                    );
                    return Ok(snapshot);
                }
                reason = "no usable values in window".to_string();
            }
            QueryOutcome::Empty(why) => reason = why,
            QueryOutcome::TransportError(why) => {
                metrics::counter!("station_query_transport_errors_total").increment(1);
                tracing::warn!(station = %station.id, attempt, error = %why, "station query failed");
                return Err(FetchError::Request {
                    station: station.id.clone(),
                    reason: why,
                });
            }
        }

        if attempt + 1 < windows.len() {
            metrics::counter!("snapshot_window_fallbacks_total").increment(1);
            tracing::debug!(
                station = %station.id,
                attempt,
                before_min = window.before_minutes,
                after_min = window.after_minutes,
                reason = %reason,
                "no data in window, widening"
            );
        }
    }

    metrics::counter!("snapshot_unavailable_total").increment(1);
    tracing::debug!(station = %station.id, at = %at, reason = %reason, "snapshot unavailable");
    Err(FetchError::Unavailable {
        station: station.id.clone(),
        at,
        reason,
    })
}

/// Resolve snapshots for several timestamps of one station, strictly one after another.
///
/// Results line up with `timestamps`; each timestamp succeeds or fails on its own.
pub async fn fetch_snapshots<S>(
    source: &S,
    station: &StationConfig,
    timestamps: &[OffsetDateTime],
    profile: &WindowProfile,
) -> Vec<Result<Snapshot, FetchError>>
where
    S: HistorySource + ?Sized,
{
    let mut out = Vec::with_capacity(timestamps.len());
    for &at in timestamps {
        out.push(fetch_snapshot(source, station, at, profile).await);
    }
    out
}
