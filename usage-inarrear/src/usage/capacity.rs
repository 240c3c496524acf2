//! Capacity usage aggregation.

use crate::models::RolledUpUnit;
use crate::usage::details::{UsageItemDetails, UsageTierUnitDetail};
use crate::usage::tiers;
use billing_core::catalog::{CapacityTier, Usage};
use billing_core::error::Result;
use rust_decimal::Decimal;
use tracing::warn;

/// Match one sub-interval's rolled up units against the capacity tiers and
/// bill the matched tier's flat price.
///
/// The detail rows record the rolled up quantity per unit at the matched
/// tier; only the envelope amount carries the charge.
pub(crate) fn to_be_billed_details(
    usage: &Usage,
    capacity_tiers: &[CapacityTier],
    rolled_up_units: &[RolledUpUnit],
) -> Result<UsageItemDetails> {
    let known_units = usage.unit_types();
    let mut known = Vec::with_capacity(rolled_up_units.len());
    for unit in rolled_up_units {
        if known_units.contains(&unit.unit_type.as_str()) {
            known.push(unit.clone());
        } else {
            warn!(
                usage_name = %usage.name,
                unit_type = %unit.unit_type,
                "Skipping rolled up unit not limited by this usage section"
            );
        }
    }

    let (tier, matched) = tiers::capacity_tier_for_units(&usage.name, capacity_tiers, &known)?;
    let rows = known
        .iter()
        .map(|unit| UsageTierUnitDetail {
            tier,
            unit_type: unit.unit_type.clone(),
            tier_price: matched.recurring_price,
            tier_block_size: None,
            quantity: unit.amount,
            amount: Decimal::ZERO,
        })
        .collect();
    Ok(UsageItemDetails::capacity(rows, matched.recurring_price))
}
