use std::time::Duration;

use async_trait::async_trait;
use time::{OffsetDateTime, UtcOffset};
use tokio::sync::Semaphore;

use super::{HisDataRequest, HisDataResponse, HistorySource, QueryOutcome};
use crate::domain::MeterTag;

const SELECT_HIS_DATA_PATH: &str = "/data/selectHisData";

/// Transport and request parameters shared by every station.
#[derive(Debug, Clone)]
pub struct StationClientSettings {
    pub port: u16,
    pub total_timeout: Duration,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub func_name: String,
    pub func_time: String,
    /// Offset of the wall-clock times the station reports.
    pub utc_offset: UtcOffset,
}

impl Default for StationClientSettings {
    fn default() -> Self {
        Self {
            port: 9898,
            total_timeout: Duration::from_millis(1500),
            connect_timeout: Duration::from_millis(500),
            read_timeout: Duration::from_millis(1000),
            func_name: "last".to_string(),
            func_time: "1m".to_string(),
            utc_offset: UtcOffset::UTC,
        }
    }
}

impl StationClientSettings {
    /// Build the HTTP client used for station queries.
    ///
    /// Idle connections are not pooled: each query opens and releases its own
    /// connection.
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.total_timeout)
            .connect_timeout(self.connect_timeout)
            .read_timeout(self.read_timeout)
            .pool_max_idle_per_host(0)
            .build()
    }
}

/// Queries one station's `selectHisData` endpoint.
///
/// A station controller is a small embedded HTTP server, so the client lets at
/// most one query per station be in flight, regardless of how many callers share it.
pub struct StationClient {
    http: reqwest::Client,
    url: String,
    settings: StationClientSettings,
    in_flight: Semaphore,
}

impl StationClient {
    pub fn new(http: reqwest::Client, address: &str, settings: StationClientSettings) -> Self {
        let base_url = format!("http://{}:{}", address.trim(), settings.port);
        Self::with_base_url(http, &base_url, settings)
    }

    /// Point the client at an explicit `scheme://host:port` base.
    pub fn with_base_url(http: reqwest::Client, base_url: &str, settings: StationClientSettings) -> Self {
        Self {
            http,
            url: format!("{}{}", base_url.trim_end_matches('/'), SELECT_HIS_DATA_PATH),
            settings,
            in_flight: Semaphore::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl HistorySource for StationClient {
    async fn query(&self, tags: &[MeterTag], start: OffsetDateTime, end: OffsetDateTime) -> QueryOutcome {
        let _permit = match self.in_flight.acquire().await {
            Ok(permit) => permit,
            Err(e) => return QueryOutcome::TransportError(format!("station gate closed: {e}")),
        };

        let body = HisDataRequest::new(tags, start, end, &self.settings.func_name, &self.settings.func_time);

        let resp = match self.http.post(&self.url).json(&body).send().await {
            Ok(resp) => resp,
            Err(e) => return QueryOutcome::TransportError(format!("POST {} failed: {e}", self.url)),
        };

        let status = resp.status();
        if !status.is_success() {
            return QueryOutcome::TransportError(format!("POST {} returned HTTP {status}", self.url));
        }

        let text = match resp.text().await {
            Ok(text) => text,
            Err(e) => return QueryOutcome::TransportError(format!("reading response from {} failed: {e}", self.url)),
        };

        let parsed: HisDataResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) => return QueryOutcome::Empty(format!("unparseable response: {e}")),
        };

        let series = parsed.into_series(self.settings.utc_offset);
        if series.iter().all(|s| s.samples.is_empty()) {
            return QueryOutcome::Empty("no samples in window".to_string());
        }

        tracing::debug!(url = %self.url, series = series.len(), "station query returned data");
        QueryOutcome::Found(series)
    }
}
