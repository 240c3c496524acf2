//! Consumable usage aggregation.

use crate::models::{InvoiceItem, RolledUpUnit};
use crate::usage::details::{UsageItemDetails, UsageTierUnitDetail};
use crate::usage::tiers;
use billing_core::catalog::{ConsumableTier, Usage};
use billing_core::error::Result;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Price one sub-interval's rolled up units through the section's tiers.
///
/// Units the section does not price are logged and skipped; they belong to
/// another section or to nothing at all, and must not fail the run.
pub(crate) fn to_be_billed_details(
    usage: &Usage,
    consumable_tiers: &[ConsumableTier],
    rolled_up_units: &[RolledUpUnit],
    previous_by_unit: &HashMap<String, Vec<UsageTierUnitDetail>>,
) -> Result<UsageItemDetails> {
    let known_units = usage.unit_types();
    let mut rows = Vec::new();
    for unit in rolled_up_units {
        if !known_units.contains(&unit.unit_type.as_str()) {
            warn!(
                usage_name = %usage.name,
                unit_type = %unit.unit_type,
                "Skipping rolled up unit not priced by this usage section"
            );
            continue;
        }
        let blocks = tiers::tiered_blocks_for_unit(&usage.name, consumable_tiers, &unit.unit_type)?;
        let previous = previous_by_unit
            .get(&unit.unit_type)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let details = tiers::consumable_to_be_billed_details(
            &usage.name,
            usage.tier_block_policy,
            &blocks,
            previous,
            unit.amount,
        )?;
        rows.extend(details);
    }
    Ok(UsageItemDetails::consumable(rows))
}

/// Reconstruct the per-tier quantities already billed for a sub-interval
/// from the detail payloads of its existing items, merged per unit and tier.
///
/// Items without a detail payload contribute nothing here; their amounts are
/// still counted by the billed-amount reconciliation.
pub(crate) fn previous_tier_details_by_unit(
    billed_items: &[&InvoiceItem],
) -> Result<HashMap<String, Vec<UsageTierUnitDetail>>> {
    let mut merged: HashMap<String, BTreeMap<u32, UsageTierUnitDetail>> = HashMap::new();
    for item in billed_items {
        let Some(raw) = item.item_details.as_deref() else {
            continue;
        };
        let details = UsageItemDetails::from_json(raw)?;
        for row in details.tier_details {
            let per_tier = merged.entry(row.unit_type.clone()).or_default();
            per_tier
                .entry(row.tier)
                .and_modify(|existing| {
                    existing.quantity += row.quantity;
                    existing.amount += row.amount;
                })
                .or_insert(row);
        }
    }
    Ok(merged
        .into_iter()
        .map(|(unit, per_tier)| (unit, per_tier.into_values().collect()))
        .collect())
}
