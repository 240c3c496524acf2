//! Tier and block resolution for usage pricing.

use crate::models::RolledUpUnit;
use crate::usage::details::UsageTierUnitDetail;
use billing_core::catalog::{CapacityTier, ConsumableTier, TierBlockPolicy, TieredBlock};
use billing_core::error::{BillingError, Result};
use rust_decimal::Decimal;
use tracing::warn;

/// Blocks pricing `unit_type`, one per tier in tier order.
///
/// A unit priced by no tier at all and a unit missing from one tier but
/// present in others are both catalog defects and fail fast.
pub fn tiered_blocks_for_unit<'a>(
    usage_name: &str,
    tiers: &'a [ConsumableTier],
    unit_type: &str,
) -> Result<Vec<&'a TieredBlock>> {
    let priced_somewhere = tiers
        .iter()
        .any(|tier| tier.blocks.iter().any(|block| block.unit_type == unit_type));
    if !priced_somewhere {
        return Err(BillingError::UnitNotFound {
            usage_name: usage_name.to_string(),
            unit_type: unit_type.to_string(),
        });
    }

    let mut blocks = Vec::with_capacity(tiers.len());
    for (index, tier) in tiers.iter().enumerate() {
        let block = tier
            .blocks
            .iter()
            .find(|block| block.unit_type == unit_type)
            .ok_or_else(|| BillingError::MissingTierBlock {
                usage_name: usage_name.to_string(),
                unit_type: unit_type.to_string(),
                tier: index as u32 + 1,
            })?;
        blocks.push(block);
    }
    Ok(blocks)
}

/// Per-tier detail rows for a cumulative quantity of one unit.
///
/// `previous` holds the tier rows reconstructed from already billed items;
/// their quantities are subtracted per tier so detail mode only re-bills
/// the delta. Pass an empty slice to price the full quantity.
pub fn consumable_to_be_billed_details(
    usage_name: &str,
    policy: TierBlockPolicy,
    blocks: &[&TieredBlock],
    previous: &[UsageTierUnitDetail],
    quantity: Decimal,
) -> Result<Vec<UsageTierUnitDetail>> {
    if blocks.is_empty() {
        return Ok(Vec::new());
    }
    match policy {
        TierBlockPolicy::AllTiers => all_tiers_details(usage_name, blocks, previous, quantity),
        TierBlockPolicy::TopTier => top_tier_details(usage_name, blocks, previous, quantity),
    }
}

/// Charge for a cumulative quantity of one unit, previous usage ignored.
pub fn consumable_to_be_billed_usage(
    usage_name: &str,
    policy: TierBlockPolicy,
    tiers: &[ConsumableTier],
    unit_type: &str,
    quantity: Decimal,
) -> Result<Decimal> {
    let blocks = tiered_blocks_for_unit(usage_name, tiers, unit_type)?;
    let details = consumable_to_be_billed_details(usage_name, policy, &blocks, &[], quantity)?;
    Ok(details.iter().map(|d| d.amount).sum())
}

/// Lowest capacity tier whose limits admit every rolled up unit.
///
/// A tier without a limit for one of the units does not admit it. Returns
/// the 1-based tier number together with the tier.
pub fn capacity_tier_for_units<'a>(
    usage_name: &str,
    tiers: &'a [CapacityTier],
    rolled_up_units: &[RolledUpUnit],
) -> Result<(u32, &'a CapacityTier)> {
    for (index, tier) in tiers.iter().enumerate() {
        let admits_all = rolled_up_units.iter().all(|unit| {
            tier.limits
                .iter()
                .find(|limit| limit.unit_type == unit.unit_type)
                .map(|limit| limit.complies_with(unit.amount))
                .unwrap_or(false)
        });
        if admits_all {
            return Ok((index as u32 + 1, tier));
        }
    }
    Err(BillingError::NoMatchingCapacityTier {
        usage_name: usage_name.to_string(),
        tiers: tiers.len(),
    })
}

/// Fill tiers in order up to their caps, spilling the remainder onward.
/// Partially filled blocks are charged in full.
fn all_tiers_details(
    usage_name: &str,
    blocks: &[&TieredBlock],
    previous: &[UsageTierUnitDetail],
    quantity: Decimal,
) -> Result<Vec<UsageTierUnitDetail>> {
    let mut details = Vec::new();
    let mut remaining = quantity;
    for (index, block) in blocks.iter().enumerate() {
        let tier = index as u32 + 1;
        let mut nb_blocks = ceil_blocks(usage_name, block, tier, remaining)?;
        match block.max {
            Some(max) if nb_blocks > max => {
                nb_blocks = max;
                remaining -= max * block.size;
            }
            _ => remaining = Decimal::ZERO,
        }
        let billable = nb_blocks - previously_billed_quantity(previous, tier);
        if billable > Decimal::ZERO {
            details.push(UsageTierUnitDetail::priced(
                tier,
                &block.unit_type,
                block.price,
                block.size,
                billable,
            ));
        } else if billable < Decimal::ZERO {
            warn!(
                usage_name = %usage_name,
                unit_type = %block.unit_type,
                tier = tier,
                "Tier already billed for more blocks than the current usage needs, emitting nothing"
            );
        }
        if remaining <= Decimal::ZERO {
            break;
        }
    }
    Ok(details)
}

/// Charge the whole quantity at the first tier whose cap can hold it; the
/// last tier takes whatever overflows everything else.
fn top_tier_details(
    usage_name: &str,
    blocks: &[&TieredBlock],
    previous: &[UsageTierUnitDetail],
    quantity: Decimal,
) -> Result<Vec<UsageTierUnitDetail>> {
    let mut remaining = quantity;
    let mut target_index = blocks.len() - 1;
    for (index, block) in blocks.iter().enumerate() {
        let tier = index as u32 + 1;
        let nb_blocks = ceil_blocks(usage_name, block, tier, remaining)?;
        match block.max {
            Some(max) if nb_blocks > max => remaining -= max * block.size,
            _ => {
                target_index = index;
                break;
            }
        }
    }

    let target = blocks[target_index];
    let tier = target_index as u32 + 1;
    let nb_blocks = ceil_blocks(usage_name, target, tier, quantity)?;
    let billable = nb_blocks - previously_billed_quantity(previous, tier);
    if billable > Decimal::ZERO {
        Ok(vec![UsageTierUnitDetail::priced(
            tier,
            &target.unit_type,
            target.price,
            target.size,
            billable,
        )])
    } else {
        if billable < Decimal::ZERO {
            warn!(
                usage_name = %usage_name,
                unit_type = %target.unit_type,
                tier = tier,
                "Tier already billed for more blocks than the current usage needs, emitting nothing"
            );
        }
        Ok(Vec::new())
    }
}

fn previously_billed_quantity(previous: &[UsageTierUnitDetail], tier: u32) -> Decimal {
    previous
        .iter()
        .filter(|d| d.tier == tier)
        .map(|d| d.quantity)
        .sum()
}

/// Blocks needed for `quantity` units of `block`, rounded up.
fn ceil_blocks(
    usage_name: &str,
    block: &TieredBlock,
    tier: u32,
    quantity: Decimal,
) -> Result<Decimal> {
    if block.size <= Decimal::ZERO {
        return Err(BillingError::InvalidBlockSize {
            usage_name: usage_name.to_string(),
            unit_type: block.unit_type.clone(),
            tier,
        });
    }
    Ok((quantity / block.size).ceil())
}
