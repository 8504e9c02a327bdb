use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One uploaded object belonging to a transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFile {
    pub name: String,
    /// Public download URL.
    pub url: String,
    /// Size in bytes.
    pub size: u64,
    /// Object key within the bucket.
    pub path: String,
}

/// A row of the transfers table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub transfer_code: String,
    pub file_urls: Vec<StoredFile>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub is_expired: bool,
    #[serde(default)]
    pub download_count: i64,
}

impl TransferRecord {
    /// A transfer is retrievable iff `now` has not passed the deadline
    /// and the row has not been flagged expired.
    pub fn is_retrievable(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at && !self.is_expired
    }
}

/// Insert payload for a new transfer row.
///
/// `download_count` starts at 0 and `is_expired` at false on the
/// database side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransfer {
    pub user_id: Option<String>,
    pub transfer_code: String,
    pub file_urls: Vec<StoredFile>,
    pub expires_at: DateTime<Utc>,
}

/// A row of the users table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub user_code: String,
    #[serde(default)]
    pub last_active: Option<DateTime<Utc>>,
}

/// Progress information for an active upload.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferProgress {
    /// Bytes handed to the transport so far.
    pub loaded: u64,
    /// Total payload size in bytes.
    pub total: u64,
    /// Rounded 0-100.
    pub percentage: u8,
    /// Bytes per second over a sliding window.
    pub speed: f64,
}
