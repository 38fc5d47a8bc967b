use serde::{Deserialize, Serialize};

/// The `(object_code, data_code)` pair identifying one telemetry channel on a station.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeterTag {
    pub object_code: String,
    pub data_code: String,
}

impl MeterTag {
    pub fn new(object_code: impl Into<String>, data_code: impl Into<String>) -> Self {
        Self {
            object_code: object_code.into(),
            data_code: data_code.into(),
        }
    }
}

/// Display metadata for one meter. Keys other than `name` are kept verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeterInfo {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One station as produced by the external configuration loader.
///
/// `data_codes[i]` and `object_codes[i]` form the tag of meter `i`, and
/// `data_list[i]` carries its display metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationConfig {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub address: String,
    pub data_codes: Vec<String>,
    pub object_codes: Vec<String>,
    #[serde(default)]
    pub data_list: Vec<MeterInfo>,
}

/// A configured meter: its tag plus the name used for display and classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meter {
    pub tag: MeterTag,
    pub name: String,
}

impl StationConfig {
    /// Meters in configuration order.
    ///
    /// Pairs are formed positionally; surplus entries in the longer code list are
    /// ignored. A meter without a `data_list` entry (or with an empty name) is
    /// named by its data code.
    pub fn meters(&self) -> Vec<Meter> {
        self.object_codes
            .iter()
            .zip(self.data_codes.iter())
            .enumerate()
            .map(|(idx, (object_code, data_code))| {
                let name = self
                    .data_list
                    .get(idx)
                    .map(|info| info.name.trim())
                    .filter(|name| !name.is_empty())
                    .unwrap_or(data_code.as_str())
                    .to_string();
                Meter {
                    tag: MeterTag::new(object_code.clone(), data_code.clone()),
                    name,
                }
            })
            .collect()
    }

    pub fn tags(&self) -> Vec<MeterTag> {
        self.meters().into_iter().map(|m| m.tag).collect()
    }

    pub fn has_mismatched_codes(&self) -> bool {
        self.object_codes.len() != self.data_codes.len()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}
