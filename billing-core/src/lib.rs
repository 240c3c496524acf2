//! Billing Core - shared building blocks for the usage invoicing engine
//!
//! Provides the catalog model (usage sections, tiers, billing periods),
//! invoice configuration, account-local time handling, currency rounding,
//! typed errors and tracing setup shared by the billing crates.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod money;
pub mod observability;

// Re-export commonly used types
pub use clock::AccountTimeContext;
pub use config::{InvoiceConfig, UsageDetailMode};
pub use error::{BillingError, Result};
pub use money::Currency;

// Re-export crates used across the workspace
pub use chrono;
pub use rust_decimal;
pub use serde;
pub use serde_json;
pub use tracing;
