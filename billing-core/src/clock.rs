//! Account-local time handling
//!
//! Raw usage records and billing transitions are stored as UTC instants, but
//! billing boundaries are calendar dates in the account's fixed UTC offset.
//! Every instant-to-date conversion in the workspace goes through
//! [`AccountTimeContext`] so a record never slips into a neighboring period.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountTimeContext {
    offset: FixedOffset,
}

impl AccountTimeContext {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// Calendar date of an instant in the account's offset.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }
}

impl Default for AccountTimeContext {
    fn default() -> Self {
        Self::utc()
    }
}
