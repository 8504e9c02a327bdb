//! User registry: anonymous per-client identity.
//!
//! A client is identified by an 8-character user code generated once,
//! registered in the users table and cached locally. The code only
//! attributes transfers; there is no account or authentication.

use tracing::{info, warn};

use crate::cache::CodeCache;
use crate::store::{StoreError, UserStore};

/// Errors from establishing the client identity.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] crate::cache::CacheError),
}

pub struct UserRegistry<S: UserStore, C: CodeCache> {
    store: S,
    cache: C,
}

impl<S: UserStore, C: CodeCache> UserRegistry<S, C> {
    pub fn new(store: S, cache: C) -> Self {
        Self { store, cache }
    }

    /// Returns the client's user code, creating and registering one on
    /// first use.
    ///
    /// A cached code means a repeat visit: `last_active` is touched
    /// best-effort and the code returned as-is. Otherwise a fresh code
    /// is inserted into the users table — insert failure propagates
    /// and nothing is cached — then persisted locally.
    pub async fn ensure_user(&self) -> Result<String, UserError> {
        let cached = match self.cache.load() {
            Ok(code) => code,
            Err(e) => {
                warn!(error = %e, "user code cache unreadable, treating as first visit");
                None
            }
        };

        if let Some(code) = cached {
            if let Err(e) = self.store.touch_last_active(&code).await {
                warn!(user_code = %code, error = %e, "failed to update last_active");
            }
            return Ok(code);
        }

        let code = dropcode_codes::generate_user_code();
        self.store.insert_user(&code).await?;
        self.cache.store(&code)?;
        info!(user_code = %code, "registered new user");
        Ok(code)
    }

    /// Database id for a user code.
    ///
    /// `None` covers both a missing row and a failed lookup; the
    /// caller cannot tell them apart and records the transfer without
    /// attribution either way.
    pub async fn user_id_for(&self, user_code: &str) -> Option<String> {
        match self.store.fetch_user_id(user_code).await {
            Ok(id) => id,
            Err(e) => {
                warn!(user_code = %user_code, error = %e, "user lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeUsers {
        rows: Mutex<HashMap<String, String>>,
        touches: Mutex<Vec<String>>,
        fail_inserts: bool,
        fail_touches: bool,
        fail_lookups: bool,
    }

    impl UserStore for &FakeUsers {
        async fn insert_user(&self, user_code: &str) -> Result<(), StoreError> {
            if self.fail_inserts {
                return Err(StoreError::Api {
                    status: 503,
                    body: "unavailable".into(),
                });
            }
            let mut rows = self.rows.lock().unwrap();
            let id = format!("user-{}", rows.len() + 1);
            rows.insert(user_code.to_string(), id);
            Ok(())
        }

        async fn fetch_user_id(&self, user_code: &str) -> Result<Option<String>, StoreError> {
            if self.fail_lookups {
                return Err(StoreError::Api {
                    status: 500,
                    body: "boom".into(),
                });
            }
            Ok(self.rows.lock().unwrap().get(user_code).cloned())
        }

        async fn touch_last_active(&self, user_code: &str) -> Result<(), StoreError> {
            if self.fail_touches {
                return Err(StoreError::Api {
                    status: 500,
                    body: "boom".into(),
                });
            }
            self.touches.lock().unwrap().push(user_code.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemCache {
        code: Mutex<Option<String>>,
        unreadable: bool,
    }

    impl MemCache {
        fn seeded(code: &str) -> Self {
            Self {
                code: Mutex::new(Some(code.to_string())),
                unreadable: false,
            }
        }
    }

    impl CodeCache for &MemCache {
        fn load(&self) -> Result<Option<String>, CacheError> {
            if self.unreadable {
                return Err(CacheError::Io(std::io::Error::other("corrupt")));
            }
            Ok(self.code.lock().unwrap().clone())
        }

        fn store(&self, code: &str) -> Result<(), CacheError> {
            *self.code.lock().unwrap() = Some(code.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn first_visit_registers_and_caches() {
        let store = FakeUsers::default();
        let cache = MemCache::default();
        let registry = UserRegistry::new(&store, &cache);

        let code = registry.ensure_user().await.unwrap();
        assert_eq!(code.len(), 8);
        assert!(store.rows.lock().unwrap().contains_key(&code));
        assert_eq!(cache.code.lock().unwrap().as_deref(), Some(code.as_str()));
        // A fresh registration is not also touched.
        assert!(store.touches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn repeat_visit_touches_last_active() {
        let store = FakeUsers::default();
        let cache = MemCache::seeded("ABCD2345");
        let registry = UserRegistry::new(&store, &cache);

        let code = registry.ensure_user().await.unwrap();
        assert_eq!(code, "ABCD2345");
        assert_eq!(*store.touches.lock().unwrap(), vec!["ABCD2345".to_string()]);
    }

    #[tokio::test]
    async fn failed_touch_is_not_fatal() {
        let store = FakeUsers {
            fail_touches: true,
            ..Default::default()
        };
        let cache = MemCache::seeded("ABCD2345");
        let registry = UserRegistry::new(&store, &cache);

        assert_eq!(registry.ensure_user().await.unwrap(), "ABCD2345");
    }

    #[tokio::test]
    async fn failed_insert_propagates_and_caches_nothing() {
        let store = FakeUsers {
            fail_inserts: true,
            ..Default::default()
        };
        let cache = MemCache::default();
        let registry = UserRegistry::new(&store, &cache);

        assert!(matches!(
            registry.ensure_user().await,
            Err(UserError::Store(_))
        ));
        assert!(cache.code.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn unreadable_cache_counts_as_first_visit() {
        let store = FakeUsers::default();
        let cache = MemCache {
            unreadable: true,
            ..Default::default()
        };
        let registry = UserRegistry::new(&store, &cache);

        let code = registry.ensure_user().await.unwrap();
        assert!(store.rows.lock().unwrap().contains_key(&code));
    }

    #[tokio::test]
    async fn user_id_for_known_code() {
        let store = FakeUsers::default();
        let cache = MemCache::default();
        let registry = UserRegistry::new(&store, &cache);
        let code = registry.ensure_user().await.unwrap();

        assert_eq!(registry.user_id_for(&code).await.as_deref(), Some("user-1"));
    }

    #[tokio::test]
    async fn user_id_for_swallows_failures() {
        let store = FakeUsers {
            fail_lookups: true,
            ..Default::default()
        };
        let cache = MemCache::default();
        let registry = UserRegistry::new(&store, &cache);

        assert_eq!(registry.user_id_for("ABCD2345").await, None);
    }

    #[tokio::test]
    async fn user_id_for_unknown_code() {
        let store = FakeUsers::default();
        let cache = MemCache::default();
        let registry = UserRegistry::new(&store, &cache);

        assert_eq!(registry.user_id_for("ZZZZ9999").await, None);
    }
}
