//! Versioned per-tier breakdown serialized onto usage invoice items.

use billing_core::error::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Schema version written into every payload. Readers reject nothing yet;
/// the field exists so a future schema change can coexist with old rows.
pub const ITEM_DETAILS_VERSION: u32 = 1;

/// Consumption of one unit at one tier, backing part of an item's amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageTierUnitDetail {
    /// 1-based tier number.
    pub tier: u32,
    pub unit_type: String,
    pub tier_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tier_block_size: Option<Decimal>,
    pub quantity: Decimal,
    pub amount: Decimal,
}

impl UsageTierUnitDetail {
    /// Detail row priced as blocks, `amount = tier_price * quantity`.
    pub fn priced(
        tier: u32,
        unit_type: &str,
        tier_price: Decimal,
        tier_block_size: Decimal,
        quantity: Decimal,
    ) -> Self {
        Self {
            tier,
            unit_type: unit_type.to_string(),
            tier_price,
            tier_block_size: Some(tier_block_size),
            quantity,
            amount: tier_price * quantity,
        }
    }
}

/// Full per-tier breakdown of one sub-interval's usage charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageItemDetails {
    pub version: u32,
    pub tier_details: Vec<UsageTierUnitDetail>,
    /// Charge for the whole sub-interval before subtracting what previous
    /// invoices already billed.
    pub amount: Decimal,
}

impl UsageItemDetails {
    /// Consumable breakdown: the charge is the sum of the row amounts.
    pub fn consumable(tier_details: Vec<UsageTierUnitDetail>) -> Self {
        let amount = tier_details.iter().map(|d| d.amount).sum();
        Self {
            version: ITEM_DETAILS_VERSION,
            tier_details,
            amount,
        }
    }

    /// Capacity breakdown: the charge is the matched tier's flat price and
    /// the rows carry the rolled up quantities with a zero amount.
    pub fn capacity(tier_details: Vec<UsageTierUnitDetail>, recurring_price: Decimal) -> Self {
        Self {
            version: ITEM_DETAILS_VERSION,
            tier_details,
            amount: recurring_price,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}
