//! Subscription billing event model.

use billing_core::catalog::{BillingPeriod, Usage};
use billing_core::money::Currency;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of subscription transition that produced a billing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTransitionType {
    Create,
    Phase,
    Change,
    Cancel,
}

/// Point-in-time billing state transition of a subscription.
///
/// Events are supplied by the entitlement side already ordered by effective
/// date; the usage engine never re-sorts them. `usages` carries the in-arrear
/// usage sections of the plan phase active from this event on, and an empty
/// list (as on a cancel) closes whatever sections were active before.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingEvent {
    pub subscription_id: Uuid,
    pub transition_type: SubscriptionTransitionType,
    pub effective_date: DateTime<Utc>,
    pub billing_period: BillingPeriod,
    pub bill_cycle_day_local: u32,
    pub product_name: String,
    pub plan_name: String,
    pub phase_name: String,
    pub currency: Currency,
    /// Version of the catalog the plan was priced from. A different version
    /// for the same section name starts a new contiguous interval.
    pub catalog_effective_date: DateTime<Utc>,
    pub usages: Vec<Usage>,
}
