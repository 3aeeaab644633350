use super::{optimizer, AllocationError};
use crate::domain::{Category, DeviceCatalog, PriceSnapshot, StrategyKind, StrategyRunRecord};

/// Replay one strategy over an ordered price history, producing one record
/// per snapshot in the same order.
///
/// Snapshots are independent: each is a fresh stateless allocation
/// decision, never a multi-period optimization. The first snapshot that
/// fails aborts the whole run; there are no partial results.
pub fn simulate(
    catalog: &DeviceCatalog,
    history: &[PriceSnapshot],
    power_budget: i64,
    strategy: StrategyKind,
) -> Result<Vec<StrategyRunRecord>, AllocationError> {
    let mut records = Vec::with_capacity(history.len());

    for prices in history {
        let plan = match strategy {
            StrategyKind::Optimal => optimizer::optimize(catalog, prices, power_budget)?,
            StrategyKind::MiningOnly => {
                optimizer::optimize_single_category(catalog, prices, power_budget, Category::Miner)?
            }
            StrategyKind::InferenceOnly => optimizer::optimize_single_category(
                catalog,
                prices,
                power_budget,
                Category::Inference,
            )?,
        };
        records.push(StrategyRunRecord::from(&plan));
    }

    Ok(records)
}
