//! S3-compatible object storage client.
//!
//! One concern: PUT a blob under a key and hand back the public URL.
//! Requests use path-style addressing against a configured endpoint
//! and are signed with AWS Signature V4. The body streams in fixed
//! chunks so progress callbacks report real transferred bytes rather
//! than an estimate.

mod progress;
mod sigv4;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use chrono::Utc;
use futures_util::TryStreamExt;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use tracing::{debug, info};

use dropcode_protocol::TransferProgress;

pub use progress::SpeedCalculator;

/// Callback invoked with upload progress.
pub type ProgressCallback = Box<dyn Fn(TransferProgress) + Send + Sync>;

/// Stream chunk size for upload bodies (64 KiB).
const CHUNK_SIZE: usize = 64 * 1024;

const DEFAULT_REGION: &str = "us-east-1";

/// Errors from reading storage settings out of the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
}

/// Errors from an upload attempt.
///
/// Any variant means the object must be treated as not stored and no
/// transfer record may be created for it.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("object store error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid storage endpoint URL")]
    InvalidEndpoint,
}

/// Connection settings for the object store.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Scheme + host of the S3-compatible gateway, no trailing slash.
    pub endpoint: String,
    pub bucket: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
}

impl StorageConfig {
    /// Reads the storage settings from the environment.
    ///
    /// `DROPCODE_S3_ENDPOINT`, `DROPCODE_S3_BUCKET`,
    /// `DROPCODE_S3_ACCESS_KEY` and `DROPCODE_S3_SECRET_KEY` are
    /// required; `DROPCODE_S3_REGION` defaults to `us-east-1`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: require("DROPCODE_S3_ENDPOINT")?
                .trim_end_matches('/')
                .to_string(),
            bucket: require("DROPCODE_S3_BUCKET")?,
            region: std::env::var("DROPCODE_S3_REGION")
                .unwrap_or_else(|_| DEFAULT_REGION.to_string()),
            access_key: require("DROPCODE_S3_ACCESS_KEY")?,
            secret_key: require("DROPCODE_S3_SECRET_KEY")?,
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

/// Upload client for one bucket.
pub struct Client {
    http: reqwest::Client,
    config: StorageConfig,
}

impl Client {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Deterministic public URL of an object: `<endpoint>/<bucket>/<key>`.
    ///
    /// No signed or expiring URLs are issued.
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.endpoint,
            self.config.bucket,
            sigv4::uri_encode_path(key)
        )
    }

    /// Stores `data` at `key` and returns its public URL.
    ///
    /// `on_progress` fires per streamed chunk with byte counters and a
    /// sliding-window speed estimate; the final invocation reports
    /// 100%. Any transport or service error aborts the upload.
    pub async fn upload(
        &self,
        data: Vec<u8>,
        key: &str,
        content_type: &str,
        on_progress: Option<ProgressCallback>,
    ) -> Result<String, UploadError> {
        let total = data.len() as u64;
        let url = self.public_url(key);
        let parsed: reqwest::Url = url.parse().map_err(|_| UploadError::InvalidEndpoint)?;

        let host = match (parsed.host_str(), parsed.port()) {
            (Some(h), Some(p)) => format!("{h}:{p}"),
            (Some(h), None) => h.to_string(),
            (None, _) => return Err(UploadError::InvalidEndpoint),
        };
        let canonical_uri = format!(
            "/{}/{}",
            self.config.bucket,
            sigv4::uri_encode_path(key)
        );

        let now = Utc::now();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let datestamp = now.format("%Y%m%d").to_string();

        let authorization = sigv4::authorization_header(&sigv4::SignRequest {
            method: "PUT",
            canonical_uri: &canonical_uri,
            canonical_query: "",
            headers: &[
                ("content-type", content_type),
                ("host", host.as_str()),
                ("x-amz-content-sha256", sigv4::UNSIGNED_PAYLOAD),
                ("x-amz-date", amz_date.as_str()),
            ],
            payload_hash: sigv4::UNSIGNED_PAYLOAD,
            amz_date: &amz_date,
            datestamp: &datestamp,
            region: &self.config.region,
            access_key: &self.config.access_key,
            secret_key: &self.config.secret_key,
        });

        let speed = Arc::new(SpeedCalculator::new());
        let loaded = Arc::new(AtomicU64::new(0));
        let on_progress = on_progress.map(Arc::new);

        let chunks: Vec<Bytes> = data
            .chunks(CHUNK_SIZE)
            .map(Bytes::copy_from_slice)
            .collect();
        let body = {
            let speed = Arc::clone(&speed);
            let loaded = Arc::clone(&loaded);
            let on_progress = on_progress.clone();
            let stream = futures_util::stream::iter(
                chunks.into_iter().map(Ok::<_, std::io::Error>),
            )
            .inspect_ok(move |chunk: &Bytes| {
                let len = chunk.len() as u64;
                let so_far = loaded.fetch_add(len, Ordering::Relaxed) + len;
                speed.add_sample(len);
                if let Some(cb) = on_progress.as_deref() {
                    cb(progress::snapshot(so_far, total, speed.bytes_per_second()));
                }
            });
            reqwest::Body::wrap_stream(stream)
        };

        debug!(key, total, "uploading object");
        let resp = self
            .http
            .put(parsed)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, total)
            .header("x-amz-content-sha256", sigv4::UNSIGNED_PAYLOAD)
            .header("x-amz-date", &amz_date)
            .header(AUTHORIZATION, authorization)
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UploadError::Api {
                status: status.as_u16(),
                body,
            });
        }

        // Chunk callbacks land on 100 for a non-empty payload; this
        // covers the empty one and guarantees a final full report.
        if let Some(cb) = on_progress.as_deref() {
            cb(progress::snapshot(total, total, speed.bytes_per_second()));
        }

        info!(key, total, "upload complete");
        Ok(url)
    }
}
