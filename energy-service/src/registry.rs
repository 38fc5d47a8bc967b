use anyhow::Context;
use energy_client::{StationClient, StationConfig, WindowProfile};
use time::{OffsetDateTime, UtcOffset};

use crate::config::AppConfig;

/// A configured station together with the client that queries it.
pub struct StationHandle {
    pub config: StationConfig,
    pub client: StationClient,
}

/// Immutable set of stations built once from configuration.
pub struct StationRegistry {
    stations: Vec<StationHandle>,
    profile: WindowProfile,
    utc_offset: UtcOffset,
}

impl StationRegistry {
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let settings = cfg.telemetry.client_settings()?;
        let http = settings.http_client().context("failed to build station HTTP client")?;

        let stations = cfg
            .stations
            .iter()
            .map(|station| StationHandle {
                client: StationClient::new(http.clone(), &station.address, settings.clone()),
                config: station.clone(),
            })
            .collect();

        Ok(Self {
            stations,
            profile: cfg.telemetry.profiles.clone(),
            utc_offset: settings.utc_offset,
        })
    }

    pub fn get(&self, id: &str) -> Option<&StationHandle> {
        self.stations.iter().find(|s| s.config.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StationHandle> {
        self.stations.iter()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn profile(&self) -> &WindowProfile {
        &self.profile
    }

    /// Current time in the stations' local offset.
    pub fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.utc_offset)
    }
}
