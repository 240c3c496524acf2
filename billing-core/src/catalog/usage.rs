//! Usage section catalog model.

use super::BillingPeriod;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a usage section aggregates consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageType {
    /// Every consumed unit is priced through tiered blocks.
    Consumable,
    /// Peak consumption selects a flat-priced tier.
    Capacity,
}

/// Tier evaluation policy for consumable sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierBlockPolicy {
    /// Fill each tier up to its cap, spill the remainder into the next one.
    AllTiers,
    /// Charge the whole quantity at the first tier large enough to hold it.
    TopTier,
}

/// Priced block of consumption for one unit within a consumable tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieredBlock {
    pub unit_type: String,
    /// Units per block; partially filled blocks are charged in full.
    pub size: Decimal,
    /// Cap on the number of blocks this tier absorbs, `None` for unlimited.
    pub max: Option<Decimal>,
    /// Price per block.
    pub price: Decimal,
}

/// One consumable tier: the blocks filled before spilling into the next tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumableTier {
    pub blocks: Vec<TieredBlock>,
}

/// Bound on one unit's rolled up amount for capacity tier qualification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Limit {
    pub unit_type: String,
    /// Lower bound, `None` for unbounded.
    pub min: Option<Decimal>,
    /// Upper bound, `None` for unbounded.
    pub max: Option<Decimal>,
}

impl Limit {
    pub fn complies_with(&self, amount: Decimal) -> bool {
        if let Some(max) = self.max {
            if amount > max {
                return false;
            }
        }
        if let Some(min) = self.min {
            if amount < min {
                return false;
            }
        }
        true
    }
}

/// One capacity tier: all limits must hold for the flat price to apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityTier {
    pub limits: Vec<Limit>,
    pub recurring_price: Decimal,
}

/// Ordered tiers of a usage section, tagged by usage type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "usage_type", content = "tiers", rename_all = "snake_case")]
pub enum UsageTiers {
    Consumable(Vec<ConsumableTier>),
    Capacity(Vec<CapacityTier>),
}

/// Catalog definition of a usage section. Immutable while an invoice run is
/// in flight; a new catalog version shows up as a new section instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub name: String,
    pub billing_period: BillingPeriod,
    pub tier_block_policy: TierBlockPolicy,
    pub tiers: UsageTiers,
}

impl Usage {
    pub fn consumable(
        name: &str,
        billing_period: BillingPeriod,
        tier_block_policy: TierBlockPolicy,
        tiers: Vec<ConsumableTier>,
    ) -> Self {
        Self {
            name: name.to_string(),
            billing_period,
            tier_block_policy,
            tiers: UsageTiers::Consumable(tiers),
        }
    }

    pub fn capacity(name: &str, billing_period: BillingPeriod, tiers: Vec<CapacityTier>) -> Self {
        Self {
            name: name.to_string(),
            billing_period,
            tier_block_policy: TierBlockPolicy::AllTiers,
            tiers: UsageTiers::Capacity(tiers),
        }
    }

    pub fn usage_type(&self) -> UsageType {
        match &self.tiers {
            UsageTiers::Consumable(_) => UsageType::Consumable,
            UsageTiers::Capacity(_) => UsageType::Capacity,
        }
    }

    /// Distinct unit types priced or limited by this section, in catalog order.
    pub fn unit_types(&self) -> Vec<&str> {
        let mut units: Vec<&str> = Vec::new();
        match &self.tiers {
            UsageTiers::Consumable(tiers) => {
                for tier in tiers {
                    for block in &tier.blocks {
                        if !units.contains(&block.unit_type.as_str()) {
                            units.push(&block.unit_type);
                        }
                    }
                }
            }
            UsageTiers::Capacity(tiers) => {
                for tier in tiers {
                    for limit in &tier.limits {
                        if !units.contains(&limit.unit_type.as_str()) {
                            units.push(&limit.unit_type);
                        }
                    }
                }
            }
        }
        units
    }
}
