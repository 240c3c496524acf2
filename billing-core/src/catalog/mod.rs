//! Catalog model for usage sections.

mod billing_period;
mod usage;

pub use billing_period::BillingPeriod;
pub use usage::{
    CapacityTier, ConsumableTier, Limit, TierBlockPolicy, TieredBlock, Usage, UsageTiers, UsageType,
};
