pub mod aggregate;
pub mod analytics;
pub mod api;
pub mod config;
pub mod metrics_server;
pub mod observability;
pub mod registry;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregate::{aggregate_delta, compute_total_consumption, Consumption};
pub use registry::{StationHandle, StationRegistry};
pub use snapshot::{fetch_snapshot, fetch_snapshots, FetchError};
