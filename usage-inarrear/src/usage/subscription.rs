//! Subscription level orchestration of usage in arrear billing.

use crate::models::{BillingEvent, InvoiceItem, RawUsageRecord, TrackingRecordId};
use crate::usage::interval::{ContiguousUsageInterval, UsageIntervalBuilder};
use billing_core::clock::AccountTimeContext;
use billing_core::config::UsageDetailMode;
use billing_core::error::Result;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;
use tracing::{info, instrument};
use uuid::Uuid;

/// Identity of a contiguous interval: a section name under one catalog
/// version. The same name under a new catalog version is a new interval.
#[derive(Debug, Clone, PartialEq, Eq)]
struct UsageKey {
    usage_name: String,
    catalog_effective_date: DateTime<Utc>,
}

/// Everything one invoice run produces for one subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionUsageResult {
    pub items: Vec<InvoiceItem>,
    pub tracking_ids: HashSet<TrackingRecordId>,
    /// Earliest date any open section needs its next run, `None` when every
    /// section is closed.
    pub next_notification_date: Option<NaiveDate>,
}

/// Walks one subscription's ordered billing events, splits them into
/// contiguous usage intervals and aggregates what each interval bills.
pub struct SubscriptionUsageInArrear {
    account_id: Uuid,
    invoice_id: Uuid,
    billing_events: Vec<BillingEvent>,
    raw_usage: Vec<RawUsageRecord>,
    existing_tracking_ids: HashSet<TrackingRecordId>,
    target_date: NaiveDate,
    raw_usage_start_date: NaiveDate,
    detail_mode: UsageDetailMode,
    time_ctx: AccountTimeContext,
}

impl SubscriptionUsageInArrear {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        account_id: Uuid,
        invoice_id: Uuid,
        billing_events: Vec<BillingEvent>,
        raw_usage: Vec<RawUsageRecord>,
        existing_tracking_ids: HashSet<TrackingRecordId>,
        target_date: NaiveDate,
        raw_usage_start_date: NaiveDate,
        detail_mode: UsageDetailMode,
        time_ctx: AccountTimeContext,
    ) -> Self {
        Self {
            account_id,
            invoice_id,
            billing_events,
            raw_usage,
            existing_tracking_ids,
            target_date,
            raw_usage_start_date,
            detail_mode,
            time_ctx,
        }
    }

    /// Compute every missing usage item for this subscription up to the
    /// target date, with the consumed tracking ids and the earliest date a
    /// next run is due.
    #[instrument(skip_all, fields(invoice_id = %self.invoice_id, target_date = %self.target_date, dry_run))]
    pub fn compute_missing_usage_invoice_items(
        &self,
        existing_items: &[InvoiceItem],
        dry_run: bool,
    ) -> Result<SubscriptionUsageResult> {
        let mut result = SubscriptionUsageResult {
            items: Vec::new(),
            tracking_ids: HashSet::new(),
            next_notification_date: None,
        };
        for interval in self.compute_in_arrear_usage_intervals()? {
            let interval_result = interval.compute_missing_items_and_next_notification_date(
                &self.raw_usage,
                &self.existing_tracking_ids,
                existing_items,
                dry_run,
            )?;
            result.items.extend(interval_result.items);
            result.tracking_ids.extend(interval_result.tracking_ids);
            result.next_notification_date = match (
                result.next_notification_date,
                interval_result.next_notification_date,
            ) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
        }
        info!(
            items = result.items.len(),
            tracking_ids = result.tracking_ids.len(),
            "Computed missing usage invoice items"
        );
        Ok(result)
    }

    /// Split the billing events into contiguous intervals, one per usage
    /// section and catalog version, ordered by when each section was first
    /// seen.
    ///
    /// An event that no longer carries a section closes that section's
    /// interval, with the event itself marking the closing edge. Sections
    /// still active after the last event stay open and run to the target
    /// date.
    pub fn compute_in_arrear_usage_intervals(
        &self,
    ) -> Result<Vec<ContiguousUsageInterval>> {
        let mut next_sequence = 0usize;
        let mut in_flight: Vec<(UsageKey, usize, UsageIntervalBuilder)> = Vec::new();
        let mut built: Vec<(usize, ContiguousUsageInterval)> = Vec::new();

        for event in &self.billing_events {
            let event_keys: Vec<UsageKey> = event
                .usages
                .iter()
                .map(|usage| UsageKey {
                    usage_name: usage.name.clone(),
                    catalog_effective_date: event.catalog_effective_date,
                })
                .collect();

            let mut index = 0;
            while index < in_flight.len() {
                if event_keys.contains(&in_flight[index].0) {
                    index += 1;
                } else {
                    let (_, sequence, mut builder) = in_flight.remove(index);
                    builder.add_billing_event(event.clone());
                    built.push((sequence, builder.build(true)?));
                }
            }

            for usage in &event.usages {
                let key = UsageKey {
                    usage_name: usage.name.clone(),
                    catalog_effective_date: event.catalog_effective_date,
                };
                match in_flight.iter_mut().find(|(existing, _, _)| *existing == key) {
                    Some((_, _, builder)) => builder.add_billing_event(event.clone()),
                    None => {
                        let mut builder = UsageIntervalBuilder::new(
                            usage.clone(),
                            self.account_id,
                            self.invoice_id,
                            self.target_date,
                            self.raw_usage_start_date,
                            self.detail_mode,
                            self.time_ctx,
                        );
                        builder.add_billing_event(event.clone());
                        in_flight.push((key, next_sequence, builder));
                        next_sequence += 1;
                    }
                }
            }
        }

        for (_, sequence, builder) in in_flight {
            built.push((sequence, builder.build(false)?));
        }
        built.sort_by_key(|(sequence, _)| *sequence);
        Ok(built.into_iter().map(|(_, interval)| interval).collect())
    }
}
