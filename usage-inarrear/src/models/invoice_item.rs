//! Invoice item model.

use billing_core::money::Currency;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Invoice item kind. The usage engine emits `Usage` items and only reads
/// `Usage` items back when reconciling already billed amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceItemType {
    Usage,
    Recurring,
    FixedPrice,
    ItemAdjustment,
}

/// One line on an invoice.
///
/// `[start_date, end_date)` is the service period in account-local dates.
/// For usage items `item_details` carries the versioned per-tier breakdown
/// JSON produced by the aggregators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub item_id: Uuid,
    pub invoice_id: Uuid,
    pub account_id: Uuid,
    pub subscription_id: Uuid,
    pub item_type: InvoiceItemType,
    pub usage_name: Option<String>,
    pub product_name: String,
    pub plan_name: String,
    pub phase_name: String,
    pub catalog_effective_date: Option<DateTime<Utc>>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Unit rate for detail mode items, absent on aggregated items.
    pub rate: Option<Decimal>,
    pub quantity: Option<Decimal>,
    pub amount: Decimal,
    pub currency: Currency,
    pub item_details: Option<String>,
}
