//! Raw usage read window optimization.

use crate::models::{InvoiceItem, InvoiceItemType, RawUsageRecord};
use billing_core::catalog::{BillingPeriod, Usage};
use billing_core::clock::AccountTimeContext;
use billing_core::config::InvoiceConfig;
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Narrows how far back raw usage records need to be read for an account.
///
/// Records older than the window are already protected by the tracking id
/// ledger; the window only has to reach back far enough to catch
/// late-arriving records that can still be billed.
pub struct RawUsageOptimizer {
    config: InvoiceConfig,
}

#[derive(Debug, Clone)]
pub struct RawUsageOptimizerResult {
    pub raw_usage_start_date: NaiveDate,
    pub raw_usage: Vec<RawUsageRecord>,
}

impl RawUsageOptimizer {
    pub fn new(config: InvoiceConfig) -> Self {
        Self { config }
    }

    /// Earliest date raw usage must be read from: the latest billed end
    /// date per billing period, stepped back the configured number of
    /// periods, never earlier than the first event start date.
    ///
    /// Items for sections the catalog no longer knows cannot anchor a
    /// period and are ignored.
    #[instrument(
        skip(self, existing_items, known_usage),
        fields(first_event_start_date = %first_event_start_date, target_date = %target_date)
    )]
    pub fn optimized_raw_usage_start_date(
        &self,
        first_event_start_date: NaiveDate,
        target_date: NaiveDate,
        existing_items: &[InvoiceItem],
        known_usage: &HashMap<String, Usage>,
    ) -> NaiveDate {
        let mut latest_end_per_period: HashMap<BillingPeriod, NaiveDate> = HashMap::new();
        for item in existing_items {
            if item.item_type != InvoiceItemType::Usage {
                continue;
            }
            let Some(usage_name) = item.usage_name.as_deref() else {
                continue;
            };
            let Some(usage) = known_usage.get(usage_name) else {
                continue;
            };
            latest_end_per_period
                .entry(usage.billing_period)
                .and_modify(|end| *end = (*end).max(item.end_date))
                .or_insert(item.end_date);
        }

        let optimized = latest_end_per_period
            .iter()
            .map(|(period, end)| period.retreat(*end, self.config.max_raw_usage_previous_period))
            .min()
            .map_or(first_event_start_date, |candidate| {
                candidate.max(first_event_start_date)
            });
        debug!(optimized_start = %optimized, "Optimized raw usage start date");
        optimized
    }

    /// Compute the window start and drop the raw records before it.
    pub fn optimize(
        &self,
        first_event_start_date: NaiveDate,
        target_date: NaiveDate,
        existing_items: &[InvoiceItem],
        known_usage: &HashMap<String, Usage>,
        raw_usage: Vec<RawUsageRecord>,
        time_ctx: &AccountTimeContext,
    ) -> RawUsageOptimizerResult {
        let raw_usage_start_date = self.optimized_raw_usage_start_date(
            first_event_start_date,
            target_date,
            existing_items,
            known_usage,
        );
        let raw_usage = raw_usage
            .into_iter()
            .filter(|record| time_ctx.local_date(record.record_date) >= raw_usage_start_date)
            .collect();
        RawUsageOptimizerResult {
            raw_usage_start_date,
            raw_usage,
        }
    }
}
