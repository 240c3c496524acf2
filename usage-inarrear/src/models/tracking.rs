//! Tracking id ledger model.

use crate::models::RawUsageRecord;
use billing_core::clock::AccountTimeContext;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ledger entry recording that a raw usage record was consumed by an
/// invoice run. Persisted by the caller alongside the invoice; the set of
/// all entries for an account is fed back into the next run to keep every
/// raw record billed at most once.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackingRecordId {
    pub tracking_id: String,
    pub invoice_id: Uuid,
    pub subscription_id: Uuid,
    pub unit_type: String,
    pub record_date: NaiveDate,
}

impl TrackingRecordId {
    pub fn from_record(
        record: &RawUsageRecord,
        invoice_id: Uuid,
        time_ctx: &AccountTimeContext,
    ) -> Self {
        Self {
            tracking_id: record.tracking_id.clone(),
            invoice_id,
            subscription_id: record.subscription_id,
            unit_type: record.unit_type.clone(),
            record_date: time_ctx.local_date(record.record_date),
        }
    }

    /// Same source record, regardless of which invoice consumed it.
    pub fn is_similar_record(&self, other: &TrackingRecordId) -> bool {
        self.tracking_id == other.tracking_id
            && self.subscription_id == other.subscription_id
            && self.unit_type == other.unit_type
            && self.record_date == other.record_date
    }
}
