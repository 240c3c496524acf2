//! Invoice configuration loaded from the environment

use crate::error::Result;
use config::Config;
use serde::{Deserialize, Serialize};

/// How usage charges are rendered on the invoice: one aggregated item per
/// sub-interval, or one item per consumed tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageDetailMode {
    Aggregate,
    Detail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceConfig {
    /// How many billing periods before the latest billed usage the raw usage
    /// read window may start.
    #[serde(default = "default_max_raw_usage_previous_period")]
    pub max_raw_usage_previous_period: u32,
    #[serde(default = "default_usage_detail_mode")]
    pub usage_detail_mode: UsageDetailMode,
}

fn default_max_raw_usage_previous_period() -> u32 {
    2
}

fn default_usage_detail_mode() -> UsageDetailMode {
    UsageDetailMode::Aggregate
}

impl Default for InvoiceConfig {
    fn default() -> Self {
        Self {
            max_raw_usage_previous_period: default_max_raw_usage_previous_period(),
            usage_detail_mode: default_usage_detail_mode(),
        }
    }
}

impl InvoiceConfig {
    /// Load from `INVOICE_`-prefixed environment variables; anything unset
    /// keeps its default, anything set but unparsable is a hard error.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(config::Environment::with_prefix("INVOICE"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
