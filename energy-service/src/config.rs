use std::{collections::HashSet, fs, time::Duration};

use anyhow::{bail, Context};
use energy_client::{StationClientSettings, StationConfig, WindowProfile};
use serde::Deserialize;
use time::UtcOffset;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

/// How stations are queried.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub port: u16,
    pub total_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub func_name: String,
    pub func_time: String,
    /// Offset of the wall-clock timestamps stations report, in whole hours.
    pub utc_offset_hours: i8,
    pub profiles: WindowProfile,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            port: 9898,
            total_timeout_ms: 1500,
            connect_timeout_ms: 500,
            read_timeout_ms: 1000,
            func_name: "last".to_string(),
            func_time: "1m".to_string(),
            utc_offset_hours: 8,
            profiles: WindowProfile::default(),
        }
    }
}

impl TelemetryConfig {
    pub fn utc_offset(&self) -> anyhow::Result<UtcOffset> {
        UtcOffset::from_hms(self.utc_offset_hours, 0, 0)
            .with_context(|| format!("invalid telemetry.utc_offset_hours {}", self.utc_offset_hours))
    }

    pub fn client_settings(&self) -> anyhow::Result<StationClientSettings> {
        Ok(StationClientSettings {
            port: self.port,
            total_timeout: Duration::from_millis(self.total_timeout_ms),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            func_name: self.func_name.clone(),
            func_time: self.func_time.clone(),
            utc_offset: self.utc_offset()?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub metrics: Option<MetricsConfig>,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub stations: Vec<StationConfig>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("ENERGY_CONFIG").unwrap_or_else(|_| "energy-config.toml".to_string());
        let contents = fs::read_to_string(&path).with_context(|| format!("failed to read config file '{path}'"))?;
        Self::from_toml_str(&contents).with_context(|| format!("invalid config file '{path}'"))
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.telemetry.profiles.is_empty() {
            bail!("telemetry.profiles must contain at least one window");
        }
        self.telemetry.utc_offset()?;

        let mut seen = HashSet::new();
        for station in &self.stations {
            if !seen.insert(station.id.as_str()) {
                bail!("duplicate station id '{}'", station.id);
            }
            if station.has_mismatched_codes() {
                tracing::warn!(
                    station = %station.id,
                    data_codes = station.data_codes.len(),
                    object_codes = station.object_codes.len(),
                    "data_codes and object_codes differ in length; surplus codes are ignored"
                );
            }
        }

        Ok(())
    }
}
