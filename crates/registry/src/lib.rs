//! Transfer and user registries.
//!
//! The registries own the transfer-code lifecycle: allocation with
//! collision avoidance, expiry enforcement on lookup, and the
//! download counter. They sit on pluggable store ports so the REST
//! backend can be swapped for an in-memory fake in tests.

pub mod cache;
pub mod rest;
pub mod store;
pub mod transfers;
pub mod users;

pub use cache::{CacheError, CodeCache, DiskCache};
pub use rest::{DbConfig, DbConfigError, RestStore};
pub use store::{StoreError, TransferStore, UserStore};
pub use transfers::{CreateError, DEFAULT_TTL_MINUTES, ResolveError, TransferRegistry};
pub use users::{UserError, UserRegistry};
