//! Contiguous usage interval: builder and per sub-interval computation.

use crate::models::{
    BillingEvent, InvoiceItem, InvoiceItemType, RawUsageRecord, RolledUpUnit, RolledUpUsage,
    TrackingRecordId,
};
use crate::usage::details::UsageItemDetails;
use crate::usage::schedule::BillCycleSchedule;
use crate::usage::{capacity, consumable};
use billing_core::catalog::{Usage, UsageTiers, UsageType};
use billing_core::clock::AccountTimeContext;
use billing_core::config::UsageDetailMode;
use billing_core::error::{BillingError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Accumulates the billing events of one usage section under one catalog
/// version, then builds the interval once the section's span is known.
#[derive(Debug, Clone)]
pub struct UsageIntervalBuilder {
    usage: Usage,
    account_id: Uuid,
    invoice_id: Uuid,
    target_date: NaiveDate,
    raw_usage_start_date: NaiveDate,
    detail_mode: UsageDetailMode,
    time_ctx: AccountTimeContext,
    billing_events: Vec<BillingEvent>,
}

impl UsageIntervalBuilder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        usage: Usage,
        account_id: Uuid,
        invoice_id: Uuid,
        target_date: NaiveDate,
        raw_usage_start_date: NaiveDate,
        detail_mode: UsageDetailMode,
        time_ctx: AccountTimeContext,
    ) -> Self {
        Self {
            usage,
            account_id,
            invoice_id,
            target_date,
            raw_usage_start_date,
            detail_mode,
            time_ctx,
            billing_events: Vec::new(),
        }
    }

    /// Append the next billing event. Events must arrive in ascending
    /// effective date order, as produced by the entitlement side.
    pub fn add_billing_event(&mut self, event: BillingEvent) {
        debug_assert!(
            self.billing_events
                .last()
                .map_or(true, |prev| prev.effective_date <= event.effective_date),
            "billing events must be appended in ascending effective date order"
        );
        self.billing_events.push(event);
    }

    /// Freeze the interval. A closed interval ends at its last event (the
    /// one that deactivated the section); an open one runs to the target
    /// date. Closed intervals need at least two events, open ones at least
    /// one.
    pub fn build(self, closed_interval: bool) -> Result<ContiguousUsageInterval> {
        let required: usize = if closed_interval { 2 } else { 1 };
        if self.billing_events.len() < required {
            return Err(BillingError::MissingBillingEvents {
                usage_name: self.usage.name.clone(),
                required,
                actual: self.billing_events.len(),
            });
        }

        let start = self
            .time_ctx
            .local_date(self.billing_events[0].effective_date);
        let end = if closed_interval {
            self.time_ctx
                .local_date(self.billing_events[self.billing_events.len() - 1].effective_date)
        } else {
            self.target_date
        };

        let mut boundaries: BTreeSet<NaiveDate> = BTreeSet::new();
        if self.target_date >= start && end > start {
            for (index, event) in self.billing_events.iter().enumerate() {
                let segment_start = self.time_ctx.local_date(event.effective_date);
                if segment_start >= end {
                    break;
                }
                let segment_end = self
                    .billing_events
                    .get(index + 1)
                    .map(|next| self.time_ctx.local_date(next.effective_date).min(end))
                    .unwrap_or(end);

                if segment_start >= self.raw_usage_start_date {
                    boundaries.insert(segment_start);
                }
                let schedule = BillCycleSchedule::new(
                    segment_start,
                    event.bill_cycle_day_local,
                    self.usage.billing_period,
                );
                let mut n = 0;
                loop {
                    let boundary = schedule.boundary(n);
                    if boundary > segment_end {
                        break;
                    }
                    if boundary > segment_start && boundary >= self.raw_usage_start_date {
                        boundaries.insert(boundary);
                    }
                    n += 1;
                }
            }
            if end >= self.raw_usage_start_date {
                boundaries.insert(end);
            }
        }

        Ok(ContiguousUsageInterval {
            usage: self.usage,
            account_id: self.account_id,
            invoice_id: self.invoice_id,
            target_date: self.target_date,
            detail_mode: self.detail_mode,
            time_ctx: self.time_ctx,
            billing_events: self.billing_events,
            transition_times: boundaries.into_iter().collect(),
            closed: closed_interval,
        })
    }
}

/// Missing items plus the ledger entries produced by one interval run.
#[derive(Debug, Clone)]
pub struct IntervalUsageResult {
    pub items: Vec<InvoiceItem>,
    pub tracking_ids: HashSet<TrackingRecordId>,
    /// When the next invoicing run should fire for this section, `None` for
    /// closed intervals.
    pub next_notification_date: Option<NaiveDate>,
}

/// One usage section of one subscription over a span where the section was
/// continuously active under a single catalog version.
#[derive(Debug, Clone)]
pub struct ContiguousUsageInterval {
    usage: Usage,
    account_id: Uuid,
    invoice_id: Uuid,
    target_date: NaiveDate,
    detail_mode: UsageDetailMode,
    time_ctx: AccountTimeContext,
    billing_events: Vec<BillingEvent>,
    /// Billing period boundaries in ascending order; consecutive pairs are
    /// the half-open sub-intervals to bill.
    transition_times: Vec<NaiveDate>,
    closed: bool,
}

impl ContiguousUsageInterval {
    pub fn usage_name(&self) -> &str {
        &self.usage.name
    }

    pub fn subscription_id(&self) -> Uuid {
        self.billing_events[0].subscription_id
    }

    pub fn transition_times(&self) -> &[NaiveDate] {
        &self.transition_times
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Compute the usage items not yet billed for this interval, the
    /// tracking ids of every raw record consumed doing so, and the date the
    /// next run should fire.
    ///
    /// A dry run computes the same items but consumes nothing.
    #[instrument(skip_all, fields(usage_name = %self.usage.name, target_date = %self.target_date))]
    pub fn compute_missing_items_and_next_notification_date(
        &self,
        raw_usage: &[RawUsageRecord],
        existing_tracking_ids: &HashSet<TrackingRecordId>,
        existing_items: &[InvoiceItem],
        dry_run: bool,
    ) -> Result<IntervalUsageResult> {
        let mut result = IntervalUsageResult {
            items: Vec::new(),
            tracking_ids: HashSet::new(),
            next_notification_date: self.next_notification_date(),
        };
        if self.transition_times.len() < 2 {
            return Ok(result);
        }

        let (rolled, consumed) = self.rolled_up_usage(raw_usage, existing_tracking_ids);
        for rolled_usage in &rolled {
            let billed = self.billed_items(rolled_usage.start, rolled_usage.end, existing_items);
            let billed_amount = compute_billed_usage(&billed);
            let details = self.to_be_billed_details(&rolled_usage.rolled_up_units, &billed)?;
            self.populate_results(
                rolled_usage.start,
                rolled_usage.end,
                billed_amount,
                &details,
                &mut result.items,
            )?;
        }
        if !dry_run {
            result.tracking_ids = consumed;
        }
        Ok(result)
    }

    /// Aggregate this subscription's raw records per sub-interval and unit,
    /// excluding records whose tracking id was consumed by a previous
    /// invoice. Records outside every sub-interval, and records for units
    /// this section does not know, are left untouched so another section or
    /// a later run can still bill them.
    fn rolled_up_usage(
        &self,
        raw_usage: &[RawUsageRecord],
        existing_tracking_ids: &HashSet<TrackingRecordId>,
    ) -> (Vec<RolledUpUsage>, HashSet<TrackingRecordId>) {
        let subscription_id = self.subscription_id();
        let unit_types = self.usage.unit_types();
        let mut rolled = Vec::new();
        let mut consumed = HashSet::new();
        for window in self.transition_times.windows(2) {
            let (start, end) = (window[0], window[1]);
            let mut per_unit: BTreeMap<String, Decimal> = BTreeMap::new();
            for record in raw_usage {
                if record.subscription_id != subscription_id
                    || !unit_types.contains(&record.unit_type.as_str())
                {
                    continue;
                }
                let record_date = self.time_ctx.local_date(record.record_date);
                if record_date < start || record_date >= end {
                    continue;
                }
                let tracking =
                    TrackingRecordId::from_record(record, self.invoice_id, &self.time_ctx);
                if existing_tracking_ids
                    .iter()
                    .any(|existing| existing.is_similar_record(&tracking))
                {
                    debug!(
                        tracking_id = %tracking.tracking_id,
                        record_date = %tracking.record_date,
                        "Raw usage record already billed, skipping"
                    );
                    continue;
                }
                *per_unit
                    .entry(record.unit_type.clone())
                    .or_insert(Decimal::ZERO) += record.amount;
                consumed.insert(tracking);
            }
            if !per_unit.is_empty() {
                rolled.push(RolledUpUsage {
                    subscription_id,
                    start,
                    end,
                    rolled_up_units: per_unit
                        .into_iter()
                        .map(|(unit_type, amount)| RolledUpUnit { unit_type, amount })
                        .collect(),
                });
            }
        }
        (rolled, consumed)
    }

    /// Existing usage items of this subscription and section that belong to
    /// the sub-interval: same start date, end date within it.
    pub fn billed_items<'a>(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        existing_items: &'a [InvoiceItem],
    ) -> Vec<&'a InvoiceItem> {
        existing_items
            .iter()
            .filter(|item| {
                item.item_type == InvoiceItemType::Usage
                    && item.subscription_id == self.subscription_id()
                    && item.usage_name.as_deref() == Some(self.usage.name.as_str())
                    && item.start_date == start
                    && item.end_date <= end
            })
            .collect()
    }

    fn to_be_billed_details(
        &self,
        rolled_up_units: &[RolledUpUnit],
        billed_items: &[&InvoiceItem],
    ) -> Result<UsageItemDetails> {
        match &self.usage.tiers {
            UsageTiers::Consumable(tiers) => {
                let previous = if self.detail_mode == UsageDetailMode::Detail {
                    consumable::previous_tier_details_by_unit(billed_items)?
                } else {
                    HashMap::new()
                };
                consumable::to_be_billed_details(&self.usage, tiers, rolled_up_units, &previous)
            }
            UsageTiers::Capacity(tiers) => {
                capacity::to_be_billed_details(&self.usage, tiers, rolled_up_units)
            }
        }
    }

    /// Turn one sub-interval's computed charge into invoice items, netting
    /// out what previous invoices already billed.
    fn populate_results(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        billed_amount: Decimal,
        details: &UsageItemDetails,
        items: &mut Vec<InvoiceItem>,
    ) -> Result<()> {
        let event = self.active_event_at(start);
        let currency = event.currency;
        let to_be_billed = currency.round(details.amount);

        let emit_aggregate = |items: &mut Vec<InvoiceItem>| -> Result<()> {
            let amount = to_be_billed - billed_amount;
            if amount < Decimal::ZERO {
                warn!(
                    usage_name = %self.usage.name,
                    start = %start,
                    end = %end,
                    billed = %billed_amount,
                    computed = %to_be_billed,
                    "Sub-interval already billed beyond the computed charge, emitting nothing"
                );
                return Ok(());
            }
            if amount > Decimal::ZERO {
                items.push(self.usage_item(
                    event,
                    start,
                    end,
                    amount,
                    None,
                    None,
                    Some(details.to_json()?),
                ));
            }
            Ok(())
        };

        match self.detail_mode {
            UsageDetailMode::Aggregate => emit_aggregate(items)?,
            UsageDetailMode::Detail => match self.usage.usage_type() {
                // Consumable detail rows are already per-tier deltas; each
                // one becomes its own item carrying a single-row payload so
                // later runs can parse it back.
                UsageType::Consumable => {
                    for row in &details.tier_details {
                        let payload = UsageItemDetails::consumable(vec![row.clone()]);
                        items.push(self.usage_item(
                            event,
                            start,
                            end,
                            currency.round(row.amount),
                            Some(row.tier_price),
                            Some(row.quantity),
                            Some(payload.to_json()?),
                        ));
                    }
                }
                UsageType::Capacity => emit_aggregate(items)?,
            },
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn usage_item(
        &self,
        event: &BillingEvent,
        start: NaiveDate,
        end: NaiveDate,
        amount: Decimal,
        rate: Option<Decimal>,
        quantity: Option<Decimal>,
        item_details: Option<String>,
    ) -> InvoiceItem {
        InvoiceItem {
            item_id: Uuid::new_v4(),
            invoice_id: self.invoice_id,
            account_id: self.account_id,
            subscription_id: event.subscription_id,
            item_type: InvoiceItemType::Usage,
            usage_name: Some(self.usage.name.clone()),
            product_name: event.product_name.clone(),
            plan_name: event.plan_name.clone(),
            phase_name: event.phase_name.clone(),
            catalog_effective_date: Some(event.catalog_effective_date),
            start_date: start,
            end_date: end,
            rate,
            quantity,
            amount,
            currency: event.currency,
            item_details,
        }
    }

    /// Latest event effective on or before `date`.
    fn active_event_at(&self, date: NaiveDate) -> &BillingEvent {
        let mut active = &self.billing_events[0];
        for event in &self.billing_events {
            if self.time_ctx.local_date(event.effective_date) <= date {
                active = event;
            } else {
                break;
            }
        }
        active
    }

    /// First boundary of the section's cadence strictly after the target
    /// date, anchored at the last event. Closed intervals never fire again.
    fn next_notification_date(&self) -> Option<NaiveDate> {
        if self.closed {
            return None;
        }
        let last = self.billing_events.last()?;
        let segment_start = self.time_ctx.local_date(last.effective_date);
        let schedule = BillCycleSchedule::new(
            segment_start,
            last.bill_cycle_day_local,
            self.usage.billing_period,
        );
        Some(schedule.next_boundary_after(self.target_date))
    }
}

/// Amount already invoiced by a set of existing usage items.
pub fn compute_billed_usage(billed_items: &[&InvoiceItem]) -> Decimal {
    billed_items.iter().map(|item| item.amount).sum()
}
