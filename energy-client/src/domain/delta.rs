use serde::Serialize;

use super::Meter;

/// Consumption of one meter between two snapshots.
///
/// `delta` is `None` when either endpoint could not be resolved; otherwise it is
/// never negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeterDelta {
    pub name: String,
    pub data_code: String,
    pub object_code: String,
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub delta: Option<f64>,
}

impl MeterDelta {
    pub fn new(meter: &Meter, start: Option<f64>, end: Option<f64>, delta: Option<f64>) -> Self {
        Self {
            name: meter.name.clone(),
            data_code: meter.tag.data_code.clone(),
            object_code: meter.tag.object_code.clone(),
            start,
            end,
            delta,
        }
    }
}
