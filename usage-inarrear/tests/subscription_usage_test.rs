//! Subscription level orchestration tests.

mod common;

use billing_core::catalog::{BillingPeriod, ConsumableTier, TierBlockPolicy, TieredBlock, Usage};
use common::*;
use rust_decimal_macros::dec;
use std::collections::HashSet;
use usage_inarrear::models::SubscriptionTransitionType;

#[test]
fn sections_are_billed_in_discovery_order() {
    let events = vec![billing_event(
        vec![gigabyte_usage(), bandwidth_usage()],
        SubscriptionTransitionType::Create,
        instant(2014, 3, 20),
        15,
    )];
    let records = vec![
        usage_record("t1", instant(2014, 4, 1), "gigabytes", dec!(250)),
        usage_record("t2", instant(2014, 4, 2), "megabits", dec!(80)),
    ];

    let result = in_arrear(events, records, HashSet::new(), date(2014, 4, 15))
        .compute_missing_usage_invoice_items(&[], false)
        .unwrap();

    assert_eq!(result.items.len(), 2);
    assert_eq!(result.items[0].usage_name.as_deref(), Some("data-transfer"));
    assert_eq!(result.items[0].amount, dec!(3));
    assert_eq!(result.items[1].usage_name.as_deref(), Some("bandwidth"));
    assert_eq!(result.items[1].amount, dec!(50));
    assert_eq!(result.tracking_ids.len(), 2);
    assert_eq!(result.next_notification_date, Some(date(2014, 5, 15)));
}

#[test]
fn a_section_dropped_by_an_event_closes_its_interval() {
    let events = vec![
        billing_event(
            vec![gigabyte_usage(), bandwidth_usage()],
            SubscriptionTransitionType::Create,
            instant(2014, 3, 20),
            15,
        ),
        billing_event(
            vec![gigabyte_usage()],
            SubscriptionTransitionType::Change,
            instant(2014, 4, 20),
            15,
        ),
    ];
    let records = vec![
        usage_record("g1", instant(2014, 4, 25), "gigabytes", dec!(150)),
        usage_record("b1", instant(2014, 4, 18), "megabits", dec!(80)),
        // Arrives after the bandwidth section went away; nothing may bill
        // or consume it.
        usage_record("b2", instant(2014, 4, 25), "megabits", dec!(99)),
    ];

    let result = in_arrear(events, records, HashSet::new(), date(2014, 5, 15))
        .compute_missing_usage_invoice_items(&[], false)
        .unwrap();

    assert_eq!(result.items.len(), 2);
    assert_eq!(result.items[0].usage_name.as_deref(), Some("data-transfer"));
    assert_eq!(result.items[0].start_date, date(2014, 4, 20));
    assert_eq!(result.items[0].end_date, date(2014, 5, 15));
    assert_eq!(result.items[0].amount, dec!(2));
    assert_eq!(result.items[1].usage_name.as_deref(), Some("bandwidth"));
    assert_eq!(result.items[1].start_date, date(2014, 4, 15));
    assert_eq!(result.items[1].end_date, date(2014, 4, 20));
    assert_eq!(result.items[1].amount, dec!(50));
    assert_eq!(result.tracking_ids.len(), 2);
    assert_eq!(result.next_notification_date, Some(date(2014, 6, 15)));
}

#[test]
fn a_new_catalog_version_splits_the_interval() {
    let usage = gigabyte_usage();
    let catalog_v2 = instant(2014, 4, 1);
    let mut change = billing_event(
        vec![usage.clone()],
        SubscriptionTransitionType::Change,
        instant(2014, 4, 20),
        15,
    );
    change.catalog_effective_date = catalog_v2;
    let events = vec![create_event(&usage, instant(2014, 3, 20), 15), change];
    let records = vec![
        usage_record("t1", instant(2014, 4, 18), "gigabytes", dec!(250)),
        usage_record("t2", instant(2014, 4, 25), "gigabytes", dec!(199)),
    ];

    let result = in_arrear(events, records, HashSet::new(), date(2014, 5, 15))
        .compute_missing_usage_invoice_items(&[], false)
        .unwrap();

    assert_eq!(result.items.len(), 2);
    assert_eq!(result.items[0].start_date, date(2014, 4, 15));
    assert_eq!(result.items[0].end_date, date(2014, 4, 20));
    assert_eq!(result.items[0].amount, dec!(3));
    assert_eq!(result.items[0].catalog_effective_date, Some(catalog_v1()));
    assert_eq!(result.items[1].start_date, date(2014, 4, 20));
    assert_eq!(result.items[1].end_date, date(2014, 5, 15));
    assert_eq!(result.items[1].amount, dec!(2));
    assert_eq!(result.items[1].catalog_effective_date, Some(catalog_v2));
    assert_eq!(result.tracking_ids.len(), 2);
    assert_eq!(result.next_notification_date, Some(date(2014, 6, 15)));
}

#[test]
fn cancelled_subscriptions_schedule_no_further_runs() {
    let usage = gigabyte_usage();
    let events = vec![
        create_event(&usage, instant(2014, 3, 20), 15),
        cancel_event(instant(2014, 4, 20), 15),
    ];
    let records = vec![usage_record("t1", instant(2014, 4, 1), "gigabytes", dec!(130))];

    let result = in_arrear(events, records, HashSet::new(), date(2014, 5, 15))
        .compute_missing_usage_invoice_items(&[], false)
        .unwrap();

    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0].start_date, date(2014, 3, 20));
    assert_eq!(result.items[0].end_date, date(2014, 4, 15));
    assert_eq!(result.items[0].amount, dec!(2));
    assert_eq!(result.next_notification_date, None);
}

#[test]
fn the_earliest_section_notification_wins() {
    let weekly = Usage::consumable(
        "api-requests",
        BillingPeriod::Weekly,
        TierBlockPolicy::AllTiers,
        vec![ConsumableTier {
            blocks: vec![TieredBlock {
                unit_type: "requests".to_string(),
                size: dec!(1000),
                max: None,
                price: dec!(0.01),
            }],
        }],
    );
    let events = vec![billing_event(
        vec![gigabyte_usage(), weekly],
        SubscriptionTransitionType::Create,
        instant(2014, 3, 20),
        15,
    )];

    let result = in_arrear(events, Vec::new(), HashSet::new(), date(2014, 5, 15))
        .compute_missing_usage_invoice_items(&[], false)
        .unwrap();

    // Monthly would fire 2014-06-15; the weekly cadence anchored on
    // 2014-03-20 fires 2014-05-22 first.
    assert!(result.items.is_empty());
    assert_eq!(result.next_notification_date, Some(date(2014, 5, 22)));
}

#[test]
fn feeding_results_back_produces_nothing_new() {
    let usage = gigabyte_usage();
    let events = vec![create_event(&usage, instant(2014, 3, 20), 15)];
    let records = vec![
        usage_record("t1", instant(2014, 4, 1), "gigabytes", dec!(130)),
        usage_record("t2", instant(2014, 4, 20), "gigabytes", dec!(199)),
    ];

    let first = in_arrear(events.clone(), records.clone(), HashSet::new(), date(2014, 5, 15))
        .compute_missing_usage_invoice_items(&[], false)
        .unwrap();
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.tracking_ids.len(), 2);

    let second = in_arrear(
        events,
        records,
        first.tracking_ids.clone(),
        date(2014, 5, 15),
    )
    .compute_missing_usage_invoice_items(&first.items, false)
    .unwrap();

    assert!(second.items.is_empty());
    assert!(second.tracking_ids.is_empty());
    assert_eq!(second.next_notification_date, Some(date(2014, 6, 15)));
}

#[test]
fn sections_share_records_but_bill_only_their_units() {
    let events = vec![billing_event(
        vec![gigabyte_usage(), bandwidth_usage()],
        SubscriptionTransitionType::Create,
        instant(2014, 3, 20),
        15,
    )];
    let records = vec![
        usage_record("g1", instant(2014, 4, 1), "gigabytes", dec!(250)),
        usage_record("m1", instant(2014, 4, 2), "megabits", dec!(150)),
    ];

    let result = in_arrear(events, records, HashSet::new(), date(2014, 4, 15))
        .compute_missing_usage_invoice_items(&[], false)
        .unwrap();

    assert_eq!(result.items.len(), 2);
    assert_eq!(result.items[0].usage_name.as_deref(), Some("data-transfer"));
    assert_eq!(result.items[0].amount, dec!(3));
    assert_eq!(result.items[1].usage_name.as_deref(), Some("bandwidth"));
    assert_eq!(result.items[1].amount, dec!(200));

    let units: HashSet<&str> = result
        .tracking_ids
        .iter()
        .map(|tracking| tracking.unit_type.as_str())
        .collect();
    assert_eq!(result.tracking_ids.len(), 2);
    assert!(units.contains("gigabytes"));
    assert!(units.contains("megabits"));
}
