//! Station telemetry queries.
//!
//! Each attempt against a station yields a [`QueryOutcome`]; callers branch on
//! the tag to decide between widening the window and giving up.

mod his_data;
mod station_client;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::domain::{MeterTag, TagSeries};

pub use his_data::{parse_sample_time, HisDataRequest, HisDataResponse, HisSeries, HisTags, HisValue};
pub use station_client::{StationClient, StationClientSettings};

/// Outcome of a single historical-data query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The station answered with at least one series.
    Found(Vec<TagSeries>),
    /// The station answered, but with nothing usable. A wider window may help.
    Empty(String),
    /// Connection, timeout or non-2xx status. Retrying wider will not help.
    TransportError(String),
}

/// Anything that can answer a historical-data query for one station.
#[async_trait]
pub trait HistorySource: Send + Sync {
    async fn query(&self, tags: &[MeterTag], start: OffsetDateTime, end: OffsetDateTime) -> QueryOutcome;
}
