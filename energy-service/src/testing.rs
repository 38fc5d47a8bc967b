//! In-memory stations for exercising the fetcher and the analytics.

use std::{collections::VecDeque, sync::Mutex};

use async_trait::async_trait;
use energy_client::{HistorySource, MeterInfo, MeterTag, QueryOutcome, Sample, StationConfig, TagSeries};
use time::{Duration, OffsetDateTime};

pub(crate) fn station_with(meters: &[(&str, &str, &str)]) -> StationConfig {
    StationConfig {
        id: "test-station".to_string(),
        name: None,
        address: "127.0.0.1".to_string(),
        object_codes: meters.iter().map(|(o, _, _)| o.to_string()).collect(),
        data_codes: meters.iter().map(|(_, d, _)| d.to_string()).collect(),
        data_list: meters
            .iter()
            .map(|(_, _, name)| MeterInfo {
                name: name.to_string(),
                extra: Default::default(),
            })
            .collect(),
    }
}

pub(crate) fn station() -> StationConfig {
    station_with(&[("OBJ001", "LSA1_28", "总进线")])
}

pub(crate) fn series(tag: &MeterTag, samples: &[(OffsetDateTime, Option<f64>)]) -> TagSeries {
    TagSeries {
        tag: tag.clone(),
        samples: samples
            .iter()
            .map(|&(time, value)| Sample { time, value })
            .collect(),
    }
}

/// Replays a fixed list of outcomes, one per query, and records each query window.
pub(crate) struct ScriptedSource {
    script: Mutex<VecDeque<QueryOutcome>>,
    calls: Mutex<Vec<(OffsetDateTime, OffsetDateTime)>>,
}

impl ScriptedSource {
    pub(crate) fn new(script: Vec<QueryOutcome>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(OffsetDateTime, OffsetDateTime)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HistorySource for ScriptedSource {
    async fn query(&self, _tags: &[MeterTag], start: OffsetDateTime, end: OffsetDateTime) -> QueryOutcome {
        self.calls.lock().unwrap().push((start, end));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| QueryOutcome::Empty("script exhausted".to_string()))
    }
}

type Reading = dyn Fn(&MeterTag, OffsetDateTime) -> Option<f64> + Send + Sync;

/// A station that reports one sample per whole minute inside every query window,
/// with values taken from a reading function.
pub(crate) struct FakeStation {
    reading: Box<Reading>,
    queries: Mutex<usize>,
}

impl FakeStation {
    pub(crate) fn new(reading: impl Fn(&MeterTag, OffsetDateTime) -> Option<f64> + Send + Sync + 'static) -> Self {
        Self {
            reading: Box::new(reading),
            queries: Mutex::new(0),
        }
    }

    pub(crate) fn queries(&self) -> usize {
        *self.queries.lock().unwrap()
    }
}

#[async_trait]
impl HistorySource for FakeStation {
    async fn query(&self, tags: &[MeterTag], start: OffsetDateTime, end: OffsetDateTime) -> QueryOutcome {
        *self.queries.lock().unwrap() += 1;

        let series = tags
            .iter()
            .map(|tag| {
                let mut samples = Vec::new();
                let mut t = start;
                while t <= end {
                    samples.push(Sample {
                        time: t,
                        value: (self.reading)(tag, t),
                    });
                    t += Duration::minutes(1);
                }
                TagSeries {
                    tag: tag.clone(),
                    samples,
                }
            })
            .collect();

        QueryOutcome::Found(series)
    }
}
