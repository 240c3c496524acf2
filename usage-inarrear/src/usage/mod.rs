//! Usage in arrear computation.

mod capacity;
mod consumable;
mod details;
mod interval;
mod optimizer;
mod schedule;
mod subscription;
mod tiers;

pub use details::{ITEM_DETAILS_VERSION, UsageItemDetails, UsageTierUnitDetail};
pub use interval::{
    ContiguousUsageInterval, IntervalUsageResult, UsageIntervalBuilder, compute_billed_usage,
};
pub use optimizer::{RawUsageOptimizer, RawUsageOptimizerResult};
pub use schedule::BillCycleSchedule;
pub use subscription::{SubscriptionUsageInArrear, SubscriptionUsageResult};
pub use tiers::{
    capacity_tier_for_units, consumable_to_be_billed_details, consumable_to_be_billed_usage,
    tiered_blocks_for_unit,
};
