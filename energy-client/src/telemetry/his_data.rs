use serde::{Deserialize, Serialize};
use time::{macros::format_description, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::domain::{MeterTag, Sample, TagSeries};

/// Body of `POST /data/selectHisData`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HisDataRequest<'a> {
    pub data_codes: Vec<&'a str>,
    pub object_codes: Vec<&'a str>,
    pub measurement: &'static str,
    pub start_time: i64,
    pub end_time: i64,
    pub fill: &'static str,
    pub func_name: &'a str,
    pub func_time: &'a str,
}

impl<'a> HisDataRequest<'a> {
    pub fn new(
        tags: &'a [MeterTag],
        start: OffsetDateTime,
        end: OffsetDateTime,
        func_name: &'a str,
        func_time: &'a str,
    ) -> Self {
        Self {
            data_codes: tags.iter().map(|t| t.data_code.as_str()).collect(),
            object_codes: tags.iter().map(|t| t.object_code.as_str()).collect(),
            measurement: "realData",
            start_time: epoch_millis(start),
            end_time: epoch_millis(end),
            fill: "0",
            func_name,
            func_time,
        }
    }
}

fn epoch_millis(ts: OffsetDateTime) -> i64 {
    (ts.unix_timestamp_nanos() / 1_000_000) as i64
}

#[derive(Debug, Clone, Deserialize)]
pub struct HisDataResponse {
    #[serde(default)]
    pub data: Option<Vec<HisSeries>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HisSeries {
    pub tags: HisTags,
    #[serde(default)]
    pub values: Option<Vec<HisValue>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HisTags {
    pub object_code: String,
    pub data_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HisValue {
    pub time: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

impl HisValue {
    /// Numbers are taken as-is and numeric strings are parsed. Anything else
    /// (null, bool, garbage) is treated as a missing reading.
    fn reading(&self) -> Option<f64> {
        match self.value.as_ref()? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl HisDataResponse {
    /// Convert the wire shape into typed series.
    ///
    /// Sample times are station-local wall-clock strings and are pinned to
    /// `offset`. Samples whose time cannot be parsed are dropped.
    pub fn into_series(self, offset: UtcOffset) -> Vec<TagSeries> {
        self.data
            .unwrap_or_default()
            .into_iter()
            .map(|s| {
                let samples = s
                    .values
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|v| {
                        let time = parse_sample_time(&v.time, offset)?;
                        Some(Sample {
                            time,
                            value: v.reading(),
                        })
                    })
                    .collect();
                TagSeries {
                    tag: MeterTag::new(s.tags.object_code, s.tags.data_code),
                    samples,
                }
            })
            .collect()
    }
}

/// Parse `YYYY-MM-DD HH:MM:SS[.ffffff]` as a wall-clock time at `offset`.
pub fn parse_sample_time(raw: &str, offset: UtcOffset) -> Option<OffsetDateTime> {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]");
    PrimitiveDateTime::parse(raw.trim(), &format)
        .ok()
        .map(|t| t.assume_offset(offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    #[test]
    fn parses_sample_times_with_and_without_fraction() {
        let plain = parse_sample_time("2024-03-01 08:00:00", offset!(+8)).unwrap();
        assert_eq!(plain, datetime!(2024-03-01 08:00:00 +08:00));

        let frac = parse_sample_time("2024-03-01 08:00:00.250000", offset!(+8)).unwrap();
        assert_eq!(frac, datetime!(2024-03-01 08:00:00.25 +08:00));

        assert!(parse_sample_time("01/03/2024 08:00", offset!(+8)).is_none());
    }

    #[test]
    fn request_serializes_with_wire_field_names() {
        let tags = vec![MeterTag::new("OBJ001", "LSA1_28"), MeterTag::new("OBJ002", "LSA1_29")];
        let req = HisDataRequest::new(
            &tags,
            datetime!(2024-03-01 00:00:00 UTC),
            datetime!(2024-03-01 00:08:00 UTC),
            "last",
            "1m",
        );

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["dataCodes"], serde_json::json!(["LSA1_28", "LSA1_29"]));
        assert_eq!(json["objectCodes"], serde_json::json!(["OBJ001", "OBJ002"]));
        assert_eq!(json["measurement"], "realData");
        assert_eq!(json["fill"], "0");
        assert_eq!(json["startTime"], 1_709_251_200_000_i64);
        assert_eq!(json["endTime"], 1_709_251_680_000_i64);
        assert_eq!(json["funcName"], "last");
        assert_eq!(json["funcTime"], "1m");
    }

    #[test]
    fn response_keeps_nulls_and_drops_bad_times() {
        let raw = r#"{"data":[{"tags":{"objectCode":"OBJ001","dataCode":"LSA1_28"},
            "values":[
                {"time":"2024-03-01 08:00:00","value":1000.5},
                {"time":"2024-03-01 08:01:00","value":null},
                {"time":"2024-03-01 08:02:00","value":"1001.25"},
                {"time":"not a time","value":3.0}
            ]}]}"#;

        let parsed: HisDataResponse = serde_json::from_str(raw).unwrap();
        let series = parsed.into_series(offset!(+8));
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].tag, MeterTag::new("OBJ001", "LSA1_28"));
        let values: Vec<Option<f64>> = series[0].samples.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![Some(1000.5), None, Some(1001.25)]);
    }

    #[test]
    fn missing_data_is_no_series() {
        let parsed: HisDataResponse = serde_json::from_str(r#"{"data":null}"#).unwrap();
        assert!(parsed.into_series(offset!(+8)).is_empty());
    }
}
