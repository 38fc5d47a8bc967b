mod delta;
mod snapshot;
mod station;
mod window;

pub use delta::MeterDelta;
pub use snapshot::{Sample, Snapshot, TagSeries};
pub use station::{Meter, MeterInfo, MeterTag, StationConfig};
pub use window::{Window, WindowProfile};
