use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Miner,
    Inference,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Miner => write!(f, "miner"),
            Category::Inference => write!(f, "inference"),
        }
    }
}

/// One purchasable device subtype: fixed power draw, fixed output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceSpec {
    pub category: Category,
    pub subtype: String,
    pub power_watts: i64,
    /// Hashrate for miners, tokens per interval for inference.
    pub capability: f64,
}

impl DeviceSpec {
    pub fn new(
        category: Category,
        subtype: impl Into<String>,
        power_watts: i64,
        capability: f64,
    ) -> Self {
        Self {
            category,
            subtype: subtype.into(),
            power_watts,
            capability,
        }
    }

    /// Per-watt rates for this device at the given prices.
    pub fn efficiency(&self, prices: &PriceSnapshot) -> EfficiencyRecord {
        let revenue_per_watt =
            self.capability * prices.price_for(self.category) / self.power_watts as f64;
        EfficiencyRecord {
            revenue_per_watt,
            profit_per_watt: revenue_per_watt - prices.energy_price,
        }
    }

    /// Quote revenue, cost and profit for `units` of this device at the
    /// given prices, independent of any budget fill.
    pub fn project(&self, units: i64, prices: &PriceSnapshot) -> AllocationEntry {
        let power_used = units * self.power_watts;
        let revenue = units as f64 * self.capability * prices.price_for(self.category);
        let cost = power_used as f64 * prices.energy_price;
        AllocationEntry {
            category: self.category,
            subtype: self.subtype.clone(),
            units,
            power_used,
            revenue,
            cost,
            profit: revenue - cost,
        }
    }
}

/// Site inventory, keyed by (category, subtype). Inserting an existing key
/// replaces it; iteration order is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceCatalog {
    devices: BTreeMap<(Category, String), DeviceSpec>,
}

impl DeviceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, spec: DeviceSpec) -> Option<DeviceSpec> {
        self.devices.insert((spec.category, spec.subtype.clone()), spec)
    }

    pub fn get(&self, category: Category, subtype: &str) -> Option<&DeviceSpec> {
        self.devices.get(&(category, subtype.to_string()))
    }

    pub fn devices(&self) -> impl Iterator<Item = &DeviceSpec> {
        self.devices.values()
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &DeviceSpec> + '_ {
        self.devices.values().filter(move |d| d.category == category)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl FromIterator<DeviceSpec> for DeviceCatalog {
    fn from_iter<I: IntoIterator<Item = DeviceSpec>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for spec in iter {
            catalog.insert(spec);
        }
        catalog
    }
}

/// One point-in-time observation of the three market prices.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceSnapshot {
    pub energy_price: f64,
    pub hash_price: f64,
    pub token_price: f64,
    pub timestamp: DateTime<Utc>,
}

impl PriceSnapshot {
    /// Capability price for a category: hash price for miners, token
    /// price for inference.
    pub fn price_for(&self, category: Category) -> f64 {
        match category {
            Category::Miner => self.hash_price,
            Category::Inference => self.token_price,
        }
    }
}

/// Per-watt rates derived fresh for every allocation call, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EfficiencyRecord {
    pub revenue_per_watt: f64,
    pub profit_per_watt: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AllocationEntry {
    pub category: Category,
    pub subtype: String,
    pub units: i64,
    pub power_used: i64,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
}

impl AllocationEntry {
    /// Profit relative to energy cost, as a percentage. Zero when the
    /// entry has no cost.
    pub fn roi_percentage(&self) -> f64 {
        if self.cost > 0.0 {
            self.profit / self.cost * 100.0
        } else {
            0.0
        }
    }
}

/// The complete, budget-respecting assignment of device unit counts for
/// one price snapshot. Stamped with the snapshot's timestamp so identical
/// inputs produce identical plans.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AllocationPlan {
    pub entries: Vec<AllocationEntry>,
    pub total_power_used: i64,
    pub total_revenue: f64,
    pub total_cost: f64,
    pub total_profit: f64,
    pub roi_percentage: f64,
    pub prices: PriceSnapshot,
    pub timestamp: DateTime<Utc>,
}

impl AllocationPlan {
    /// Build a plan from its entries, computing the aggregate totals.
    pub fn from_entries(entries: Vec<AllocationEntry>, prices: PriceSnapshot) -> Self {
        let total_power_used = entries.iter().map(|e| e.power_used).sum();
        let total_revenue: f64 = entries.iter().map(|e| e.revenue).sum();
        let total_cost: f64 = entries.iter().map(|e| e.cost).sum();
        let total_profit = total_revenue - total_cost;
        let roi_percentage = if total_cost > 0.0 {
            total_profit / total_cost * 100.0
        } else {
            0.0
        };
        Self {
            entries,
            total_power_used,
            total_revenue,
            total_cost,
            total_profit,
            roi_percentage,
            timestamp: prices.timestamp,
            prices,
        }
    }

    /// Plan with nothing allocated.
    pub fn empty(prices: PriceSnapshot) -> Self {
        Self::from_entries(Vec::new(), prices)
    }
}

/// One row of simulator output: a strategy's totals at one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyRunRecord {
    pub timestamp: DateTime<Utc>,
    pub profit: f64,
    pub revenue: f64,
    pub cost: f64,
    pub roi: f64,
}

impl From<&AllocationPlan> for StrategyRunRecord {
    fn from(plan: &AllocationPlan) -> Self {
        Self {
            timestamp: plan.timestamp,
            profit: plan.total_profit,
            revenue: plan.total_revenue,
            cost: plan.total_cost,
            roi: plan.roi_percentage,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Optimal,
    MiningOnly,
    InferenceOnly,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::Optimal,
        StrategyKind::MiningOnly,
        StrategyKind::InferenceOnly,
    ];
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyKind::Optimal => write!(f, "optimal"),
            StrategyKind::MiningOnly => write!(f, "mining_only"),
            StrategyKind::InferenceOnly => write!(f, "inference_only"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot(energy: f64, hash: f64, token: f64) -> PriceSnapshot {
        PriceSnapshot {
            energy_price: energy,
            hash_price: hash,
            token_price: token,
            timestamp: Utc.with_ymd_and_hms(2025, 6, 21, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn price_for_selects_category_price() {
        let prices = snapshot(0.65, 8.5, 3.0);
        assert_eq!(prices.price_for(Category::Miner), 8.5);
        assert_eq!(prices.price_for(Category::Inference), 3.0);
    }

    #[test]
    fn efficiency_rates_per_watt() {
        let prices = snapshot(0.65, 8.5, 3.0);
        let hydro = DeviceSpec::new(Category::Miner, "hydro", 5000, 5000.0);
        let eff = hydro.efficiency(&prices);
        assert!((eff.revenue_per_watt - 8.5).abs() < 1e-12);
        assert!((eff.profit_per_watt - 7.85).abs() < 1e-12);
    }

    #[test]
    fn project_quotes_revenue_cost_and_profit() {
        let prices = snapshot(0.65, 8.5, 3.0);
        let asic = DeviceSpec::new(Category::Inference, "asic", 15000, 50000.0);
        let entry = asic.project(10, &prices);
        assert_eq!(entry.units, 10);
        assert_eq!(entry.power_used, 150_000);
        assert!((entry.revenue - 1_500_000.0).abs() < 1e-6);
        assert!((entry.cost - 97_500.0).abs() < 1e-6);
        assert!((entry.profit - 1_402_500.0).abs() < 1e-6);
        assert!((entry.roi_percentage() - entry.profit / entry.cost * 100.0).abs() < 1e-9);
    }

    #[test]
    fn roi_is_zero_when_cost_is_zero() {
        let prices = snapshot(0.0, 8.5, 3.0);
        let hydro = DeviceSpec::new(Category::Miner, "hydro", 5000, 5000.0);
        let entry = hydro.project(3, &prices);
        assert_eq!(entry.cost, 0.0);
        assert_eq!(entry.roi_percentage(), 0.0);

        let plan = AllocationPlan::from_entries(vec![entry], prices);
        assert_eq!(plan.roi_percentage, 0.0);
        assert!(plan.roi_percentage.is_finite());
    }

    #[test]
    fn plan_totals_match_entry_sums() {
        let prices = snapshot(0.65, 8.5, 3.0);
        let hydro = DeviceSpec::new(Category::Miner, "hydro", 5000, 5000.0);
        let asic = DeviceSpec::new(Category::Inference, "asic", 15000, 50000.0);
        let entries = vec![asic.project(66, &prices), hydro.project(2, &prices)];
        let plan = AllocationPlan::from_entries(entries.clone(), prices);

        assert_eq!(
            plan.total_power_used,
            entries.iter().map(|e| e.power_used).sum::<i64>()
        );
        let revenue: f64 = entries.iter().map(|e| e.revenue).sum();
        assert!((plan.total_revenue - revenue).abs() < 1e-9);
        assert!((plan.total_profit - (plan.total_revenue - plan.total_cost)).abs() < 1e-9);
        assert_eq!(plan.timestamp, plan.prices.timestamp);
    }

    #[test]
    fn catalog_insert_replaces_existing_key() {
        let mut catalog = DeviceCatalog::new();
        catalog.insert(DeviceSpec::new(Category::Miner, "air", 3500, 1000.0));
        let old = catalog.insert(DeviceSpec::new(Category::Miner, "air", 4000, 1200.0));
        assert!(old.is_some());
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(Category::Miner, "air").unwrap().power_watts, 4000);
    }

    #[test]
    fn strategy_kind_display_matches_wire_names() {
        assert_eq!(StrategyKind::Optimal.to_string(), "optimal");
        assert_eq!(StrategyKind::MiningOnly.to_string(), "mining_only");
        assert_eq!(StrategyKind::InferenceOnly.to_string(), "inference_only");
    }
}
