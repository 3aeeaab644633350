use tracing::debug;

use super::AllocationError;
use crate::domain::{AllocationPlan, Category, DeviceCatalog, DeviceSpec, PriceSnapshot};

/// Compute the profit-maximizing integer allocation of devices under a
/// power budget.
///
/// Devices are ranked by profit per watt and filled greedily: each ranked
/// device takes as many whole units as the remaining budget allows, then
/// the walk moves on. A device that no longer fits is skipped without
/// consuming budget; there is no backtracking, so integer division can
/// leave a fraction of the budget stranded.
///
/// Ties on profit per watt are broken by (category, subtype) ascending so
/// the result never depends on catalog insertion order.
pub fn optimize(
    catalog: &DeviceCatalog,
    prices: &PriceSnapshot,
    power_budget: i64,
) -> Result<AllocationPlan, AllocationError> {
    validate(catalog, power_budget)?;

    let mut entries = Vec::new();
    let mut remaining = power_budget;

    for device in rank_by_profitability(catalog.devices(), prices) {
        if remaining == 0 {
            break;
        }
        let units = remaining / device.power_watts;
        if units == 0 {
            continue;
        }
        let entry = device.project(units, prices);
        remaining -= entry.power_used;
        debug!(
            category = %entry.category,
            subtype = %entry.subtype,
            units,
            power_used = entry.power_used,
            remaining,
            "allocated"
        );
        entries.push(entry);
    }

    Ok(AllocationPlan::from_entries(entries, prices.clone()))
}

/// Baseline allocator restricted to one device family: the whole budget
/// goes to units of the category's most profitable subtype. An empty or
/// unprofitable category yields the zero plan.
pub fn optimize_single_category(
    catalog: &DeviceCatalog,
    prices: &PriceSnapshot,
    power_budget: i64,
    category: Category,
) -> Result<AllocationPlan, AllocationError> {
    validate(catalog, power_budget)?;

    let Some(device) = rank_by_profitability(catalog.in_category(category), prices)
        .into_iter()
        .next()
    else {
        return Ok(AllocationPlan::empty(prices.clone()));
    };

    let units = power_budget / device.power_watts;
    let entries = if units > 0 {
        vec![device.project(units, prices)]
    } else {
        Vec::new()
    };

    Ok(AllocationPlan::from_entries(entries, prices.clone()))
}

/// Profitable devices only, best rate first. Ties resolved by
/// (category, subtype) ascending.
fn rank_by_profitability<'a>(
    devices: impl Iterator<Item = &'a DeviceSpec>,
    prices: &PriceSnapshot,
) -> Vec<&'a DeviceSpec> {
    let mut ranked: Vec<(f64, &DeviceSpec)> = devices
        .map(|d| (d.efficiency(prices).profit_per_watt, d))
        .filter(|(profit_per_watt, _)| *profit_per_watt > 0.0)
        .collect();

    ranked.sort_by(|(a_rate, a), (b_rate, b)| {
        b_rate
            .total_cmp(a_rate)
            .then_with(|| (a.category, &a.subtype).cmp(&(b.category, &b.subtype)))
    });

    ranked.into_iter().map(|(_, d)| d).collect()
}

// Validation runs once per call, before any allocation logic.
fn validate(catalog: &DeviceCatalog, power_budget: i64) -> Result<(), AllocationError> {
    if power_budget < 0 {
        return Err(AllocationError::InvalidBudget {
            watts: power_budget,
        });
    }
    for device in catalog.devices() {
        if device.power_watts <= 0 {
            return Err(AllocationError::InvalidCatalog {
                category: device.category,
                subtype: device.subtype.clone(),
                power_watts: device.power_watts,
            });
        }
    }
    Ok(())
}
