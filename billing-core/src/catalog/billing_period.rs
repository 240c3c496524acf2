//! Billing period cadence and period arithmetic.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Billing period of a usage section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingPeriod {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Annually,
}

impl BillingPeriod {
    /// Months per period for month-based cadences, `None` for day-based ones.
    pub fn months(&self) -> Option<u32> {
        match self {
            BillingPeriod::Monthly => Some(1),
            BillingPeriod::Quarterly => Some(3),
            BillingPeriod::Annually => Some(12),
            _ => None,
        }
    }

    /// Step a date back by `count` periods.
    pub fn retreat(&self, date: NaiveDate, count: u32) -> NaiveDate {
        match self {
            BillingPeriod::Daily => date - chrono::Duration::days(count as i64),
            BillingPeriod::Weekly => date - chrono::Duration::weeks(count as i64),
            BillingPeriod::Monthly => date - Months::new(count),
            BillingPeriod::Quarterly => date - Months::new(count * 3),
            BillingPeriod::Annually => date - Months::new(count * 12),
        }
    }
}
