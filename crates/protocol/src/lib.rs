//! Shared types for the dropcode workspace.
//!
//! Row shapes for the transfers and users tables, the progress payload
//! emitted during uploads, and human-readable size formatting.

pub mod format;
pub mod types;

pub use format::{format_bytes, format_speed};
pub use types::{NewTransfer, StoredFile, TransferProgress, TransferRecord, UserRecord};
