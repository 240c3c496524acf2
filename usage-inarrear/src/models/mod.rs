//! Domain models for usage-in-arrear invoicing.

mod billing_event;
mod invoice_item;
mod tracking;
mod usage_record;

pub use billing_event::{BillingEvent, SubscriptionTransitionType};
pub use invoice_item::{InvoiceItem, InvoiceItemType};
pub use tracking::TrackingRecordId;
pub use usage_record::{RawUsageRecord, RolledUpUnit, RolledUpUsage};
