//! Environment-driven settings for the send flow.

use dropcode_object_store::StorageConfig;
use dropcode_registry::DbConfig;

use crate::error::AppError;

pub struct AppConfig {
    pub storage: StorageConfig,
    pub db: DbConfig,
    /// Base URL for shareable links, typically the web client.
    pub link_base: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, AppError> {
        Ok(Self {
            storage: StorageConfig::from_env()?,
            db: DbConfig::from_env()?,
            link_base: std::env::var("DROPCODE_LINK_BASE")
                .ok()
                .map(|s| s.trim_end_matches('/').to_string()),
        })
    }
}
