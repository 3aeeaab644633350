pub mod optimizer;
pub mod simulator;

use crate::domain::Category;

/// Failures surfaced by the allocation engine. Anything else — an empty
/// catalog, a zero budget, universally unprofitable prices — is a valid
/// empty result, not an error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AllocationError {
    #[error("invalid catalog entry {category}/{subtype}: power_watts must be positive, got {power_watts}")]
    InvalidCatalog {
        category: Category,
        subtype: String,
        power_watts: i64,
    },

    #[error("invalid power budget: {watts} W")]
    InvalidBudget { watts: i64 },
}
