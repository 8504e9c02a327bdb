//! Storage ports for the transfer and user tables.
//!
//! Lookups return `Ok(None)` for a missing row; only transport or
//! service problems are `Err`. A unique-key violation surfaces as
//! `StoreError::Conflict` so callers can react to code collisions.

use dropcode_protocol::{NewTransfer, TransferRecord};

/// Errors from a store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("duplicate key")]
    Conflict,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid API key")]
    InvalidKey,
}

/// Backend for the transfers table.
#[allow(async_fn_in_trait)]
pub trait TransferStore {
    /// Inserts one transfer row. `Conflict` when the transfer code is
    /// already taken.
    async fn insert_transfer(&self, new: &NewTransfer) -> Result<(), StoreError>;

    /// Fetches at most one row by exact code match.
    async fn fetch_transfer(&self, code: &str) -> Result<Option<TransferRecord>, StoreError>;

    /// Sets the download counter of the row with id `id`.
    async fn set_download_count(&self, id: &str, count: i64) -> Result<(), StoreError>;
}

/// Backend for the users table.
#[allow(async_fn_in_trait)]
pub trait UserStore {
    async fn insert_user(&self, user_code: &str) -> Result<(), StoreError>;

    /// Database id for a user code, if the row exists.
    async fn fetch_user_id(&self, user_code: &str) -> Result<Option<String>, StoreError>;

    /// Bumps the row's `last_active` to now.
    async fn touch_last_active(&self, user_code: &str) -> Result<(), StoreError>;
}
