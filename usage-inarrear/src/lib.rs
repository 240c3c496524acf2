//! Usage In Arrear - invoice item computation for usage-based billing
//!
//! Turns raw metered usage, subscription billing events and previously
//! invoiced state into the missing usage invoice items for a target date,
//! together with the tracking ids that guarantee each raw record is billed
//! at most once and the date the next invoicing run should fire.

pub mod models;
pub mod usage;

pub use billing_core;
