use std::collections::HashMap;

use time::{Duration, OffsetDateTime};

use super::MeterTag;

/// One polled `(time, value)` pair. `value` is `None` when the station reported null.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub time: OffsetDateTime,
    pub value: Option<f64>,
}

/// All samples returned for one meter tag in one query window.
#[derive(Debug, Clone, PartialEq)]
pub struct TagSeries {
    pub tag: MeterTag,
    pub samples: Vec<Sample>,
}

/// Meter values resolved for one target timestamp.
///
/// Every entry is a literal polled value; a tag without a usable sample is
/// simply absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    at: OffsetDateTime,
    values: HashMap<MeterTag, f64>,
}

impl Snapshot {
    /// Resolve, per tag, the sample closest to `target`.
    ///
    /// Null and non-finite values are skipped. On equal distance the sample seen
    /// first (series order, then sample order) wins.
    pub fn nearest(target: OffsetDateTime, series: &[TagSeries]) -> Self {
        let mut best: HashMap<MeterTag, (Duration, f64)> = HashMap::new();

        for s in series {
            for sample in &s.samples {
                let Some(value) = sample.value.filter(|v| v.is_finite()) else {
                    continue;
                };
                let distance = (sample.time - target).abs();

                best.entry(s.tag.clone())
                    .and_modify(|current| {
                        if distance < current.0 {
                            *current = (distance, value);
                        }
                    })
                    .or_insert((distance, value));
            }
        }

        Self {
            at: target,
            values: best.into_iter().map(|(tag, (_, v))| (tag, v)).collect(),
        }
    }

    /// A snapshot from already-resolved values, e.g. replayed from a recording.
    pub fn from_values(at: OffsetDateTime, values: impl IntoIterator<Item = (MeterTag, f64)>) -> Self {
        Self {
            at,
            values: values.into_iter().collect(),
        }
    }

    pub fn at(&self) -> OffsetDateTime {
        self.at
    }

    pub fn get(&self, tag: &MeterTag) -> Option<f64> {
        self.values.get(tag).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample(time: OffsetDateTime, value: Option<f64>) -> Sample {
        Sample { time, value }
    }

    #[test]
    fn picks_the_sample_closest_to_target() {
        let tag = MeterTag::new("OBJ001", "LSA1_28");
        let series = vec![TagSeries {
            tag: tag.clone(),
            samples: vec![
                sample(datetime!(2024-03-01 07:56:00 +08:00), Some(990.0)),
                sample(datetime!(2024-03-01 08:01:00 +08:00), Some(1000.0)),
                sample(datetime!(2024-03-01 08:03:30 +08:00), Some(1003.0)),
            ],
        }];

        let snap = Snapshot::nearest(datetime!(2024-03-01 08:00:00 +08:00), &series);
        assert_eq!(snap.get(&tag), Some(1000.0));
        assert_eq!(snap.len(), 1);
    }

    #[test]
    fn equal_distance_resolves_to_first_sample() {
        let tag = MeterTag::new("OBJ001", "LSA1_28");
        let series = vec![TagSeries {
            tag: tag.clone(),
            samples: vec![
                sample(datetime!(2024-03-01 08:02:00 +08:00), Some(1002.0)),
                sample(datetime!(2024-03-01 07:58:00 +08:00), Some(998.0)),
            ],
        }];
        let target = datetime!(2024-03-01 08:00:00 +08:00);

        let first = Snapshot::nearest(target, &series);
        let second = Snapshot::nearest(target, &series);
        assert_eq!(first.get(&tag), Some(1002.0));
        assert_eq!(first, second);
    }

    #[test]
    fn null_values_are_never_selected() {
        let tag = MeterTag::new("OBJ001", "LSA1_28");
        let other = MeterTag::new("OBJ002", "LSA1_29");
        let series = vec![
            TagSeries {
                tag: tag.clone(),
                samples: vec![
                    sample(datetime!(2024-03-01 08:00:00 +08:00), None),
                    sample(datetime!(2024-03-01 08:04:00 +08:00), Some(1004.0)),
                ],
            },
            TagSeries {
                tag: other.clone(),
                samples: vec![sample(datetime!(2024-03-01 08:00:00 +08:00), None)],
            },
        ];

        let snap = Snapshot::nearest(datetime!(2024-03-01 08:00:00 +08:00), &series);
        assert_eq!(snap.get(&tag), Some(1004.0));
        assert_eq!(snap.get(&other), None);
    }

    #[test]
    fn duplicate_series_for_a_tag_are_merged() {
        let tag = MeterTag::new("OBJ001", "LSA1_28");
        let series = vec![
            TagSeries {
                tag: tag.clone(),
                samples: vec![sample(datetime!(2024-03-01 08:05:00 +08:00), Some(1.0))],
            },
            TagSeries {
                tag: tag.clone(),
                samples: vec![sample(datetime!(2024-03-01 08:01:00 +08:00), Some(2.0))],
            },
        ];

        let snap = Snapshot::nearest(datetime!(2024-03-01 08:00:00 +08:00), &series);
        assert_eq!(snap.get(&tag), Some(2.0));
    }

    #[test]
    fn from_values_keeps_the_given_timestamp() {
        let at = datetime!(2024-03-01 08:00:00 +08:00);
        let snap = Snapshot::from_values(at, [(MeterTag::new("OBJ001", "LSA1_28"), 12.5)]);
        assert_eq!(snap.at(), at);
        assert_eq!(snap.get(&MeterTag::new("OBJ001", "LSA1_28")), Some(12.5));
    }
}
