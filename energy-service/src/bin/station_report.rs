use anyhow::{anyhow, bail, Result};
use energy_service::{
    analytics::{
        self,
        realtime::{DEFAULT_INTERVAL_MINUTES, DEFAULT_POINTS},
        Period,
    },
    config::AppConfig,
    observability,
    registry::StationRegistry,
};
use std::env;

const USAGE: &str = "usage: station_report <station_id> <kpi|realtime|trend|compare|classification> [period | points interval]";

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        bail!(USAGE);
    }
    let (station_id, metric) = (&args[1], args[2].as_str());

    // Same configuration as the service (ENERGY_CONFIG).
    let cfg = AppConfig::load()?;
    let registry = StationRegistry::from_config(&cfg)?;
    let station = registry
        .get(station_id)
        .ok_or_else(|| anyhow!("unknown station '{station_id}'"))?;
    let (source, config, now, profile) = (&station.client, &station.config, registry.now(), registry.profile());

    let period = || -> Result<Period> {
        Ok(args.get(3).map(|p| p.parse()).transpose()?.unwrap_or(Period::Day))
    };

    let report = match metric {
        "kpi" => serde_json::to_value(analytics::compute_kpi(source, config, now, profile).await)?,
        "realtime" => {
            let points = args.get(3).map(|p| p.parse()).transpose()?.unwrap_or(DEFAULT_POINTS);
            let interval = args.get(4).map(|p| p.parse()).transpose()?.unwrap_or(DEFAULT_INTERVAL_MINUTES);
            serde_json::to_value(analytics::compute_realtime(source, config, now, points, interval, profile).await)?
        }
        "trend" => serde_json::to_value(analytics::compute_trend(source, config, period()?, now, profile).await)?,
        "compare" => serde_json::to_value(analytics::compute_compare(source, config, period()?, now, profile).await)?,
        "classification" => {
            serde_json::to_value(analytics::compute_classification(source, config, period()?, now, profile).await)?
        }
        other => bail!("unknown metric '{other}'\n{USAGE}"),
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
