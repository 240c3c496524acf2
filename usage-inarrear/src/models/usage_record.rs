//! Raw and rolled up usage models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metered usage record as stored by the usage collection side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawUsageRecord {
    pub subscription_id: Uuid,
    /// Caller-supplied idempotency key, unique per billable event at the
    /// source. Several records may share one tracking id (same batch) and
    /// are then consumed together.
    pub tracking_id: String,
    pub unit_type: String,
    pub record_date: DateTime<Utc>,
    pub amount: Decimal,
}

/// Aggregated quantity of one unit within a sub-interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolledUpUnit {
    pub unit_type: String,
    pub amount: Decimal,
}

/// Per sub-interval aggregation of raw usage for one subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolledUpUsage {
    pub subscription_id: Uuid,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub rolled_up_units: Vec<RolledUpUnit>,
}
