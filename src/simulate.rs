mod adapters;
mod config;
mod domain;
mod engine;

use eyre::Result;
use tracing::{info, warn};

use crate::adapters::store::Store;
use crate::config::Config;
use crate::domain::StrategyKind;
use crate::engine::simulator;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "watt_arb=info".into()),
        )
        .init();

    let config = Config::load()?;
    let store = Store::new(&config.db_path).await?;

    let catalog = store.load_catalog().await?;
    let history = store.price_history(config.sim_hours).await?;
    if history.is_empty() {
        warn!(
            "No price history in the last {}h — nothing to simulate",
            config.sim_hours
        );
        return Ok(());
    }

    info!(
        "Replaying {} snapshots against {} device subtypes",
        history.len(),
        catalog.len()
    );
    info!("=== {}h Strategy Comparison ===", config.sim_hours);

    let mut series = Vec::new();
    for strategy in StrategyKind::ALL {
        let records = simulator::simulate(&catalog, &history, config.site_power_limit, strategy)?;
        let total_profit: f64 = records.iter().map(|r| r.profit).sum();
        let avg_roi = records.iter().map(|r| r.roi).sum::<f64>() / records.len() as f64;
        info!(
            "  {}: {} snapshots, total profit ${:.2}, avg ROI {:.2}%",
            strategy,
            records.len(),
            total_profit,
            avg_roi
        );
        series.push((strategy, records));
    }

    // Machine-readable series for downstream consumers.
    if std::env::var("SIM_JSON").is_ok() {
        println!("{}", serde_json::to_string_pretty(&series)?);
    }

    Ok(())
}
