mod adapters;
mod config;
mod domain;
mod engine;

use eyre::{eyre, Result};
use tracing::info;

use crate::adapters::store::Store;
use crate::config::Config;
use crate::engine::optimizer;

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
    info!("Catalog loaded: {} device subtypes", catalog.len());

    let prices = store.latest_prices().await?.ok_or_else(|| {
        eyre!(
            "no pricing data in {} — run the collector first",
            config.db_path
        )
    })?;
    info!(
        "Prices at {}: energy={:.4} hash={:.4} token={:.4}",
        prices.timestamp, prices.energy_price, prices.hash_price, prices.token_price
    );

    let plan = optimizer::optimize(&catalog, &prices, config.site_power_limit)?;

    info!("=== Optimal Allocation ===");
    for entry in &plan.entries {
        info!(
            "  {}/{}: {} units, {} W, ${:.2} profit ({:.1}% ROI)",
            entry.category,
            entry.subtype,
            entry.units,
            entry.power_used,
            entry.profit,
            entry.roi_percentage()
        );
    }
    info!(
        "Total Power Used: {} W of {}",
        plan.total_power_used, config.site_power_limit
    );
    info!("Total Revenue: ${:.2}", plan.total_revenue);
    info!("Total Cost: ${:.2}", plan.total_cost);
    info!("Total Profit: ${:.2}", plan.total_profit);
    info!("ROI: {:.2}%", plan.roi_percentage);

    // Machine-readable plan for downstream consumers.
    if std::env::var("ALLOC_JSON").is_ok() {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    }

    Ok(())
}
