//! Transfer registry: code allocation, record creation, resolution.

use chrono::{Duration, Utc};
use dropcode_protocol::{NewTransfer, StoredFile, TransferRecord};
use tracing::{info, warn};

use crate::store::{StoreError, TransferStore};

/// Minutes a transfer stays retrievable.
pub const DEFAULT_TTL_MINUTES: i64 = 10;

/// Attempts at finding a free code before giving up.
const MAX_CODE_ATTEMPTS: u32 = 5;

/// Errors from recording a new transfer.
#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error("no free transfer code after {0} attempts")]
    CodeSpaceBusy(u32),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from resolving a code on the receive side.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("no session found for that code")]
    NotFound,

    #[error("this code has expired")]
    Expired,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The transfer-code lifecycle over a store backend.
pub struct TransferRegistry<S: TransferStore> {
    store: S,
}

impl<S: TransferStore> TransferRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Picks a transfer code no live row currently uses.
    ///
    /// The reservation is advisory; `create` still reacts to a
    /// conflicting insert from a concurrent sender racing for the
    /// same code.
    pub async fn reserve_code(&self) -> Result<String, CreateError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = dropcode_codes::generate_transfer_code();
            if self.store.fetch_transfer(&code).await?.is_none() {
                return Ok(code);
            }
            warn!(code = %code, "transfer code taken, regenerating");
        }
        Err(CreateError::CodeSpaceBusy(MAX_CODE_ATTEMPTS))
    }

    /// Inserts one transfer record and returns the code it is filed
    /// under.
    ///
    /// `expires_at` is fixed here to now + `ttl_minutes`; the counter
    /// starts at zero. Uniqueness rests on the store's key over
    /// `transfer_code`: a conflicting insert retries with a fresh
    /// code, so the returned code can differ from `code` when two
    /// senders collide. Any other store failure propagates and the
    /// send flow must abort with no code shown to the user.
    pub async fn create(
        &self,
        user_id: Option<String>,
        code: String,
        files: Vec<StoredFile>,
        ttl_minutes: i64,
    ) -> Result<String, CreateError> {
        let mut code = code;
        for attempt in 0..MAX_CODE_ATTEMPTS {
            let new = NewTransfer {
                user_id: user_id.clone(),
                transfer_code: code.clone(),
                file_urls: files.clone(),
                expires_at: Utc::now() + Duration::minutes(ttl_minutes),
            };
            match self.store.insert_transfer(&new).await {
                Ok(()) => {
                    info!(code = %code, files = new.file_urls.len(), "transfer recorded");
                    return Ok(code);
                }
                Err(StoreError::Conflict) => {
                    warn!(code = %code, attempt, "transfer code collision on insert");
                    code = dropcode_codes::generate_transfer_code();
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(CreateError::CodeSpaceBusy(MAX_CODE_ATTEMPTS))
    }

    /// Fetches a record without touching it.
    pub async fn lookup(&self, code: &str) -> Result<Option<TransferRecord>, StoreError> {
        self.store.fetch_transfer(code).await
    }

    /// Resolves a code to its file list.
    ///
    /// A missing row is `NotFound`; a row past its deadline or
    /// flagged expired is `Expired` and nothing is mutated. A live
    /// row gets its download counter bumped by exactly one — the bump
    /// is best-effort and never withholds the files.
    pub async fn resolve(&self, code: &str) -> Result<Vec<StoredFile>, ResolveError> {
        let record = self.lookup(code).await?.ok_or(ResolveError::NotFound)?;

        if !record.is_retrievable(Utc::now()) {
            return Err(ResolveError::Expired);
        }

        if let Err(e) = self
            .store
            .set_download_count(&record.id, record.download_count + 1)
            .await
        {
            warn!(code = %code, error = %e, "failed to bump download count");
        }

        Ok(record.file_urls)
    }
}
