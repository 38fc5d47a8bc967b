pub mod domain;
pub mod telemetry;

pub use domain::{Meter, MeterDelta, MeterInfo, MeterTag, Sample, Snapshot, StationConfig, TagSeries, Window, WindowProfile};
pub use telemetry::{HistorySource, QueryOutcome, StationClient, StationClientSettings};
