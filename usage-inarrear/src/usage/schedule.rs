//! Bill cycle day schedule arithmetic.

use billing_core::catalog::BillingPeriod;
use chrono::{Datelike, NaiveDate};

/// Billing period boundaries anchored at a segment start, walking the bill
/// cycle day forward at the period cadence.
///
/// Month-based cadences re-clamp the anchor day every boundary, so a bill
/// cycle day of 31 yields Jan 31, Feb 28, Mar 31 without drifting to the
/// 28th for good. Day-based cadences step in fixed durations and ignore the
/// bill cycle day.
#[derive(Debug, Clone, Copy)]
pub struct BillCycleSchedule {
    start: NaiveDate,
    bcd: u32,
    period: BillingPeriod,
}

impl BillCycleSchedule {
    pub fn new(start: NaiveDate, bcd: u32, period: BillingPeriod) -> Self {
        Self {
            start,
            bcd: bcd.clamp(1, 31),
            period,
        }
    }

    /// First boundary on or after the segment start.
    pub fn first_boundary(&self) -> NaiveDate {
        self.boundary(0)
    }

    /// The n-th boundary; boundary 0 is [`first_boundary`](Self::first_boundary).
    pub fn boundary(&self, n: u32) -> NaiveDate {
        match self.period.months() {
            Some(months) => {
                let mut first_index = months_index(self.start);
                if clamp_day(self.start.year(), self.start.month(), self.bcd) < self.start {
                    first_index += 1;
                }
                date_from_months_index(first_index + (n * months) as i64, self.bcd)
            }
            None => {
                let step = match self.period {
                    BillingPeriod::Weekly => 7,
                    _ => 1,
                };
                self.start + chrono::Duration::days(n as i64 * step)
            }
        }
    }

    /// First boundary strictly after `date`.
    pub fn next_boundary_after(&self, date: NaiveDate) -> NaiveDate {
        let mut n = 0;
        loop {
            let boundary = self.boundary(n);
            if boundary > date {
                return boundary;
            }
            n += 1;
        }
    }
}

fn months_index(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

fn date_from_months_index(index: i64, day: u32) -> NaiveDate {
    let year = index.div_euclid(12) as i32;
    let month = index.rem_euclid(12) as u32 + 1;
    clamp_day(year, month, day)
}

/// Date at `day` of the given month, clamped to the month's last day.
fn clamp_day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_else(|| last_day_of_month(year, month))
}

fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}
