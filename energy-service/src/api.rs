//! JSON HTTP surface over the analytics.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    analytics::{
        compute_classification, compute_compare, compute_kpi, compute_realtime, compute_trend,
        realtime::{DEFAULT_INTERVAL_MINUTES, DEFAULT_POINTS},
        Classification, Comparison, Kpi, Period, RealtimeSeries, TrendSeries,
    },
    registry::{StationHandle, StationRegistry},
};

type ApiError = (StatusCode, String);

#[derive(Debug, Serialize)]
struct StationSummary {
    id: String,
    name: String,
    meters: usize,
}

#[derive(Debug, Default, Deserialize)]
struct PeriodParams {
    period: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RealtimeParams {
    points: Option<usize>,
    interval: Option<u32>,
}

pub fn router(registry: Arc<StationRegistry>) -> Router {
    Router::new()
        .route("/stations", get(list_stations))
        .route("/stations/:id/kpi", get(station_kpi))
        .route("/stations/:id/realtime", get(station_realtime))
        .route("/stations/:id/trend", get(station_trend))
        .route("/stations/:id/compare", get(station_compare))
        .route("/stations/:id/classification", get(station_classification))
        .route("/kpi", get(all_kpis))
        .with_state(registry)
}

pub async fn serve(bind_addr: &str, registry: Arc<StationRegistry>) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_addr
        .parse()
        .with_context(|| format!("invalid api bind address '{bind_addr}'"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind api listener on {addr}"))?;

    tracing::info!(%addr, "api listening");
    axum::serve(listener, router(registry).into_make_service()).await?;
    Ok(())
}

fn lookup<'a>(registry: &'a StationRegistry, id: &str) -> Result<&'a StationHandle, ApiError> {
    registry
        .get(id)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("unknown station '{id}'")))
}

fn parse_period(raw: Option<&str>) -> Result<Period, ApiError> {
    match raw {
        None => Ok(Period::Day),
        Some(raw) => raw.parse().map_err(|e| (StatusCode::BAD_REQUEST, format!("{e}"))),
    }
}

async fn list_stations(State(registry): State<Arc<StationRegistry>>) -> Json<Vec<StationSummary>> {
    Json(
        registry
            .iter()
            .map(|s| StationSummary {
                id: s.config.id.clone(),
                name: s.config.display_name().to_string(),
                meters: s.config.meters().len(),
            })
            .collect(),
    )
}

async fn station_kpi(
    State(registry): State<Arc<StationRegistry>>,
    Path(id): Path<String>,
) -> Result<Json<Kpi>, ApiError> {
    metrics::counter!("api_requests_total", "route" => "kpi").increment(1);
    let station = lookup(&registry, &id)?;
    let kpi = compute_kpi(&station.client, &station.config, registry.now(), registry.profile()).await;
    Ok(Json(kpi))
}

/// KPIs for every station. Stations are computed concurrently; each one still
/// sees its own queries one at a time.
async fn all_kpis(State(registry): State<Arc<StationRegistry>>) -> Json<Vec<Kpi>> {
    metrics::counter!("api_requests_total", "route" => "all_kpis").increment(1);
    let now = registry.now();
    let kpis = futures::future::join_all(
        registry
            .iter()
            .map(|s| compute_kpi(&s.client, &s.config, now, registry.profile())),
    )
    .await;
    Json(kpis)
}

async fn station_realtime(
    State(registry): State<Arc<StationRegistry>>,
    Path(id): Path<String>,
    Query(params): Query<RealtimeParams>,
) -> Result<Json<RealtimeSeries>, ApiError> {
    metrics::counter!("api_requests_total", "route" => "realtime").increment(1);
    let station = lookup(&registry, &id)?;
    let series = compute_realtime(
        &station.client,
        &station.config,
        registry.now(),
        params.points.unwrap_or(DEFAULT_POINTS),
        params.interval.unwrap_or(DEFAULT_INTERVAL_MINUTES),
        registry.profile(),
    )
    .await;
    Ok(Json(series))
}

async fn station_trend(
    State(registry): State<Arc<StationRegistry>>,
    Path(id): Path<String>,
    Query(params): Query<PeriodParams>,
) -> Result<Json<TrendSeries>, ApiError> {
    metrics::counter!("api_requests_total", "route" => "trend").increment(1);
    let station = lookup(&registry, &id)?;
    let period = parse_period(params.period.as_deref())?;
    let trend = compute_trend(&station.client, &station.config, period, registry.now(), registry.profile()).await;
    Ok(Json(trend))
}

async fn station_compare(
    State(registry): State<Arc<StationRegistry>>,
    Path(id): Path<String>,
    Query(params): Query<PeriodParams>,
) -> Result<Json<Comparison>, ApiError> {
    metrics::counter!("api_requests_total", "route" => "compare").increment(1);
    let station = lookup(&registry, &id)?;
    let period = parse_period(params.period.as_deref())?;
    let cmp = compute_compare(&station.client, &station.config, period, registry.now(), registry.profile()).await;
    Ok(Json(cmp))
}

async fn station_classification(
    State(registry): State<Arc<StationRegistry>>,
    Path(id): Path<String>,
    Query(params): Query<PeriodParams>,
) -> Result<Json<Classification>, ApiError> {
    metrics::counter!("api_requests_total", "route" => "classification").increment(1);
    let station = lookup(&registry, &id)?;
    let period = parse_period(params.period.as_deref())?;
    let result =
        compute_classification(&station.client, &station.config, period, registry.now(), registry.profile()).await;
    Ok(Json(result))
}
