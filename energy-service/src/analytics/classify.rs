use energy_client::{HistorySource, MeterDelta, StationConfig, WindowProfile};
use serde::Serialize;
use time::OffsetDateTime;

use super::{note_degraded, round2, Period};
use crate::aggregate::compute_total_consumption;

pub const OTHER_CATEGORY: &str = "Other";

/// End-use keywords, checked in order against the meter name; first match wins.
/// Longer, more specific keywords sit above the generic ones they contain.
pub const CATEGORY_KEYWORDS: &[(&str, &str)] = &[
    ("冷却水泵", "水泵系统"),
    ("冷冻水泵", "水泵系统"),
    ("热水泵", "水泵系统"),
    ("水泵", "水泵系统"),
    ("冷机", "冷机系统"),
    ("冷水机组", "冷机系统"),
    ("主机", "冷机系统"),
    ("冷却塔", "冷却塔系统"),
    ("新风", "通风系统"),
    ("排风", "通风系统"),
    ("送风", "通风系统"),
    ("风机", "通风系统"),
    ("空调", "空调末端"),
    ("风柜", "空调末端"),
    ("盘管", "空调末端"),
    ("照明", "照明系统"),
    ("灯", "照明系统"),
    ("电梯", "电梯系统"),
    ("扶梯", "电梯系统"),
    ("插座", "插座用电"),
];

pub fn classify_meter(name: &str) -> &'static str {
    CATEGORY_KEYWORDS
        .iter()
        .find(|(keyword, _)| name.contains(keyword))
        .map(|(_, category)| *category)
        .unwrap_or(OTHER_CATEGORY)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub kwh: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub station_id: String,
    pub period: Period,
    pub total_kwh: f64,
    pub items: Vec<CategoryShare>,
}

/// Group positive meter deltas by category, largest first.
///
/// Returns the total and the shares; with no consumption the share list is empty.
pub fn classify_consumption(meters: &[MeterDelta]) -> (f64, Vec<CategoryShare>) {
    let mut buckets: Vec<(&'static str, f64)> = Vec::new();
    for m in meters {
        let Some(delta) = m.delta.filter(|d| *d > 0.0) else {
            continue;
        };
        let category = classify_meter(&m.name);
        match buckets.iter().position(|(c, _)| *c == category) {
            Some(idx) => buckets[idx].1 += delta,
            None => buckets.push((category, delta)),
        }
    }

    let total: f64 = buckets.iter().map(|(_, kwh)| kwh).sum();
    if total <= 0.0 {
        return (0.0, Vec::new());
    }

    buckets.sort_by(|a, b| b.1.total_cmp(&a.1));
    let items = buckets
        .into_iter()
        .map(|(category, kwh)| CategoryShare {
            category: category.to_string(),
            kwh: round2(kwh),
            percentage: round2(kwh / total * 100.0),
        })
        .collect();

    (total, items)
}

pub async fn compute_classification<S>(
    source: &S,
    station: &StationConfig,
    period: Period,
    now: OffsetDateTime,
    profile: &WindowProfile,
) -> Classification
where
    S: HistorySource + ?Sized,
{
    let (total, items) = match compute_total_consumption(source, station, now - period.duration(), now, profile).await {
        Ok(consumption) => classify_consumption(&consumption.meters),
        Err(e) => {
            note_degraded("classification", station, "period_total", &e);
            (0.0, Vec::new())
        }
    };

    Classification {
        station_id: station.id.clone(),
        period,
        total_kwh: round2(total),
        items,
    }
}
