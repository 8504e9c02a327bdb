//! End-to-end send/receive flow over an in-memory store: bundle two
//! files, record the transfer, resolve the code, watch it expire.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{Duration, Utc};
use dropcode_bundle::InputFile;
use dropcode_protocol::{NewTransfer, StoredFile, TransferRecord};
use dropcode_registry::{
    DEFAULT_TTL_MINUTES, ResolveError, StoreError, TransferRegistry, TransferStore,
};

#[derive(Default)]
struct MemStore {
    rows: Mutex<HashMap<String, TransferRecord>>,
    fetches: AtomicUsize,
}

impl MemStore {
    fn expire(&self, code: &str) {
        let mut rows = self.rows.lock().unwrap();
        let row = rows.get_mut(code).unwrap();
        row.expires_at = Utc::now() - Duration::seconds(1);
    }

    fn row(&self, code: &str) -> Option<TransferRecord> {
        self.rows.lock().unwrap().get(code).cloned()
    }
}

impl TransferStore for &MemStore {
    async fn insert_transfer(&self, new: &NewTransfer) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&new.transfer_code) {
            return Err(StoreError::Conflict);
        }
        let id = format!("row-{}", rows.len() + 1);
        rows.insert(
            new.transfer_code.clone(),
            TransferRecord {
                id,
                user_id: new.user_id.clone(),
                transfer_code: new.transfer_code.clone(),
                file_urls: new.file_urls.clone(),
                expires_at: new.expires_at,
                is_expired: false,
                download_count: 0,
            },
        );
        Ok(())
    }

    async fn fetch_transfer(&self, code: &str) -> Result<Option<TransferRecord>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.row(code))
    }

    async fn set_download_count(&self, id: &str, count: i64) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        for record in rows.values_mut() {
            if record.id == id {
                record.download_count = count;
                return Ok(());
            }
        }
        Err(StoreError::Api {
            status: 404,
            body: "no such row".into(),
        })
    }
}

#[tokio::test]
async fn send_then_receive_then_expire() {
    let store = MemStore::default();
    let registry = TransferRegistry::new(&store);

    // Sender side: two files collapse into one zip bundle.
    let bundled = dropcode_bundle::bundle(vec![
        InputFile {
            name: "notes.txt".into(),
            bytes: b"meeting notes".to_vec(),
            content_type: "text/plain".into(),
        },
        InputFile {
            name: "report.pdf".into(),
            bytes: vec![0u8; 512],
            content_type: "application/pdf".into(),
        },
    ])
    .unwrap();
    assert!(bundled.name.ends_with(".zip"));

    let key = format!("uploads/123456/1_{}", bundled.name);
    let stored = StoredFile {
        name: bundled.name.clone(),
        url: format!("https://gw.example.com/drops/{key}"),
        size: bundled.bytes.len() as u64,
        path: key,
    };

    let code = registry
        .create(None, "123456".into(), vec![stored.clone()], DEFAULT_TTL_MINUTES)
        .await
        .unwrap();
    assert_eq!(code, "123456");
    assert_eq!(store.row(&code).unwrap().download_count, 0);

    // Receiver side: the code resolves once while live and counts the
    // download.
    let files = registry.resolve(&code).await.unwrap();
    assert_eq!(files, vec![stored]);
    assert_eq!(store.row(&code).unwrap().download_count, 1);

    // Past the deadline the same code is refused and the counter holds.
    store.expire(&code);
    assert!(matches!(
        registry.resolve(&code).await,
        Err(ResolveError::Expired)
    ));
    assert_eq!(store.row(&code).unwrap().download_count, 1);
}

#[tokio::test]
async fn malformed_code_never_reaches_the_store() {
    let store = MemStore::default();

    // Receiver input is sanitized before any lookup: "12-34" leaves
    // five digits, which is not a valid transfer code.
    assert!(dropcode_codes::parse_transfer_code("12-34 5").is_err());
    assert_eq!(store.fetches.load(Ordering::SeqCst), 0);
}
