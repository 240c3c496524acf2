//! Error types for the billing workspace

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Unit '{unit_type}' not priced by any tier of usage section '{usage_name}'")]
    UnitNotFound {
        usage_name: String,
        unit_type: String,
    },

    #[error("Tier {tier} of usage section '{usage_name}' has no block for unit '{unit_type}'")]
    MissingTierBlock {
        usage_name: String,
        unit_type: String,
        tier: u32,
    },

    #[error("Tier {tier} of usage section '{usage_name}' has a non-positive block size for unit '{unit_type}'")]
    InvalidBlockSize {
        usage_name: String,
        unit_type: String,
        tier: u32,
    },

    #[error("No capacity tier of usage section '{usage_name}' admits the rolled up usage (checked {tiers} tiers)")]
    NoMatchingCapacityTier { usage_name: String, tiers: usize },

    #[error(
        "Usage section '{usage_name}' requires at least {required} billing event(s), got {actual}"
    )]
    MissingBillingEvents {
        usage_name: String,
        required: usize,
        actual: usize,
    },

    #[error("Invalid usage item detail payload: {0}")]
    ItemDetail(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(anyhow::Error),
}

impl From<config::ConfigError> for BillingError {
    fn from(err: config::ConfigError) -> Self {
        BillingError::Config(anyhow::Error::new(err))
    }
}

pub type Result<T> = std::result::Result<T, BillingError>;
