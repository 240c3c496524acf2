//! Test helper module for usage-inarrear integration tests.
//!
//! Provides catalog sections, billing events and raw records shared by the
//! scenario tests.

#![allow(dead_code)]

use billing_core::catalog::{
    BillingPeriod, CapacityTier, ConsumableTier, Limit, TierBlockPolicy, TieredBlock, Usage,
};
use billing_core::clock::AccountTimeContext;
use billing_core::config::UsageDetailMode;
use billing_core::money::Currency;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashSet;
use usage_inarrear::models::{
    BillingEvent, InvoiceItem, InvoiceItemType, RawUsageRecord, SubscriptionTransitionType,
    TrackingRecordId,
};
use usage_inarrear::usage::SubscriptionUsageInArrear;
use uuid::Uuid;

pub const TEST_ACCOUNT_ID: &str = "11111111-1111-1111-1111-111111111111";
pub const TEST_SUBSCRIPTION_ID: &str = "22222222-2222-2222-2222-222222222222";
pub const TEST_INVOICE_ID: &str = "33333333-3333-3333-3333-333333333333";

pub fn account_id() -> Uuid {
    Uuid::parse_str(TEST_ACCOUNT_ID).unwrap()
}

pub fn subscription_id() -> Uuid {
    Uuid::parse_str(TEST_SUBSCRIPTION_ID).unwrap()
}

pub fn invoice_id() -> Uuid {
    Uuid::parse_str(TEST_INVOICE_ID).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn instant(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

/// First catalog version used by the test events.
pub fn catalog_v1() -> DateTime<Utc> {
    instant(2013, 1, 1)
}

/// Consumable section billed monthly: blocks of 100 gigabytes at 1.00, the
/// single tier capped at 1000 blocks.
pub fn gigabyte_usage() -> Usage {
    Usage::consumable(
        "data-transfer",
        BillingPeriod::Monthly,
        TierBlockPolicy::AllTiers,
        vec![ConsumableTier {
            blocks: vec![TieredBlock {
                unit_type: "gigabytes".to_string(),
                size: dec!(100),
                max: Some(dec!(1000)),
                price: dec!(1),
            }],
        }],
    )
}

/// Capacity section billed monthly: up to 100 megabits for 50.00 flat,
/// anything above for 200.00 flat.
pub fn bandwidth_usage() -> Usage {
    Usage::capacity(
        "bandwidth",
        BillingPeriod::Monthly,
        vec![
            CapacityTier {
                limits: vec![Limit {
                    unit_type: "megabits".to_string(),
                    min: None,
                    max: Some(dec!(100)),
                }],
                recurring_price: dec!(50),
            },
            CapacityTier {
                limits: vec![Limit {
                    unit_type: "megabits".to_string(),
                    min: None,
                    max: None,
                }],
                recurring_price: dec!(200),
            },
        ],
    )
}

pub fn billing_event(
    usages: Vec<Usage>,
    transition_type: SubscriptionTransitionType,
    effective_date: DateTime<Utc>,
    bcd: u32,
) -> BillingEvent {
    let billing_period = usages
        .first()
        .map(|usage| usage.billing_period)
        .unwrap_or(BillingPeriod::Monthly);
    BillingEvent {
        subscription_id: subscription_id(),
        transition_type,
        effective_date,
        billing_period,
        bill_cycle_day_local: bcd,
        product_name: "Gold".to_string(),
        plan_name: "gold-monthly".to_string(),
        phase_name: "gold-monthly-evergreen".to_string(),
        currency: Currency::Usd,
        catalog_effective_date: catalog_v1(),
        usages,
    }
}

pub fn create_event(usage: &Usage, effective_date: DateTime<Utc>, bcd: u32) -> BillingEvent {
    billing_event(
        vec![usage.clone()],
        SubscriptionTransitionType::Create,
        effective_date,
        bcd,
    )
}

pub fn cancel_event(effective_date: DateTime<Utc>, bcd: u32) -> BillingEvent {
    billing_event(
        Vec::new(),
        SubscriptionTransitionType::Cancel,
        effective_date,
        bcd,
    )
}

pub fn usage_record(
    tracking_id: &str,
    record_date: DateTime<Utc>,
    unit_type: &str,
    amount: Decimal,
) -> RawUsageRecord {
    RawUsageRecord {
        subscription_id: subscription_id(),
        tracking_id: tracking_id.to_string(),
        unit_type: unit_type.to_string(),
        record_date,
        amount,
    }
}

/// Existing usage item for one sub-interval, without a detail payload.
pub fn billed_item(
    usage_name: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    amount: Decimal,
) -> InvoiceItem {
    InvoiceItem {
        item_id: Uuid::new_v4(),
        invoice_id: Uuid::new_v4(),
        account_id: account_id(),
        subscription_id: subscription_id(),
        item_type: InvoiceItemType::Usage,
        usage_name: Some(usage_name.to_string()),
        product_name: "Gold".to_string(),
        plan_name: "gold-monthly".to_string(),
        phase_name: "gold-monthly-evergreen".to_string(),
        catalog_effective_date: Some(catalog_v1()),
        start_date,
        end_date,
        rate: None,
        quantity: None,
        amount,
        currency: Currency::Usd,
        item_details: None,
    }
}

/// Orchestrator over the given events and records, aggregate mode, raw
/// usage window open since well before any test date.
pub fn in_arrear(
    billing_events: Vec<BillingEvent>,
    raw_usage: Vec<RawUsageRecord>,
    existing_tracking_ids: HashSet<TrackingRecordId>,
    target_date: NaiveDate,
) -> SubscriptionUsageInArrear {
    in_arrear_with_mode(
        billing_events,
        raw_usage,
        existing_tracking_ids,
        target_date,
        UsageDetailMode::Aggregate,
    )
}

pub fn in_arrear_with_mode(
    billing_events: Vec<BillingEvent>,
    raw_usage: Vec<RawUsageRecord>,
    existing_tracking_ids: HashSet<TrackingRecordId>,
    target_date: NaiveDate,
    detail_mode: UsageDetailMode,
) -> SubscriptionUsageInArrear {
    SubscriptionUsageInArrear::new(
        account_id(),
        invoice_id(),
        billing_events,
        raw_usage,
        existing_tracking_ids,
        target_date,
        date(2012, 1, 1),
        detail_mode,
        AccountTimeContext::utc(),
    )
}
