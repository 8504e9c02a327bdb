//! PostgREST-style store backend.
//!
//! Talks to a managed Postgres REST gateway: equality filters in the
//! query string, JSON bodies, `Prefer: return=minimal` on writes.
//! HTTP 409 from a unique-key violation maps to
//! [`StoreError::Conflict`].

use chrono::Utc;
use dropcode_protocol::{NewTransfer, TransferRecord};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;

use crate::store::{StoreError, TransferStore, UserStore};

const TRANSFERS_TABLE: &str = "transfers";
const USERS_TABLE: &str = "users";

/// Connection settings for the managed database.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Project base URL, no trailing slash.
    pub base_url: String,
    pub api_key: String,
}

/// Errors from reading database settings out of the environment.
#[derive(Debug, thiserror::Error)]
pub enum DbConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
}

impl DbConfig {
    /// Reads `DROPCODE_DB_URL` and `DROPCODE_DB_KEY`; both required.
    pub fn from_env() -> Result<Self, DbConfigError> {
        Ok(Self {
            base_url: require("DROPCODE_DB_URL")?
                .trim_end_matches('/')
                .to_string(),
            api_key: require("DROPCODE_DB_KEY")?,
        })
    }
}

fn require(name: &'static str) -> Result<String, DbConfigError> {
    std::env::var(name).map_err(|_| DbConfigError::MissingVar(name))
}

/// REST client for the transfer and user tables.
pub struct RestStore {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct IdRow {
    id: String,
}

impl RestStore {
    pub fn new(config: DbConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(&config.api_key).map_err(|_| StoreError::InvalidKey)?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|_| StoreError::InvalidKey)?,
        );

        let http = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn check(resp: reqwest::Response) -> Result<(), StoreError> {
        let status = resp.status();
        if status == StatusCode::CONFLICT {
            return Err(StoreError::Conflict);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn read<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, StoreError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl TransferStore for RestStore {
    async fn insert_transfer(&self, new: &NewTransfer) -> Result<(), StoreError> {
        let resp = self
            .http
            .post(self.table_url(TRANSFERS_TABLE))
            .header("Prefer", "return=minimal")
            .json(std::slice::from_ref(new))
            .send()
            .await?;
        Self::check(resp).await
    }

    async fn fetch_transfer(&self, code: &str) -> Result<Option<TransferRecord>, StoreError> {
        let filter = format!("eq.{code}");
        let resp = self
            .http
            .get(self.table_url(TRANSFERS_TABLE))
            .query(&[
                ("select", "*"),
                ("transfer_code", filter.as_str()),
                ("limit", "1"),
            ])
            .send()
            .await?;
        let rows: Vec<TransferRecord> = Self::read(resp).await?;
        Ok(rows.into_iter().next())
    }

    async fn set_download_count(&self, id: &str, count: i64) -> Result<(), StoreError> {
        let resp = self
            .http
            .patch(self.table_url(TRANSFERS_TABLE))
            .header("Prefer", "return=minimal")
            .query(&[("id", format!("eq.{id}").as_str())])
            .json(&serde_json::json!({ "download_count": count }))
            .send()
            .await?;
        Self::check(resp).await
    }
}

impl UserStore for RestStore {
    async fn insert_user(&self, user_code: &str) -> Result<(), StoreError> {
        let resp = self
            .http
            .post(self.table_url(USERS_TABLE))
            .header("Prefer", "return=minimal")
            .json(&[serde_json::json!({ "user_code": user_code })])
            .send()
            .await?;
        Self::check(resp).await
    }

    async fn fetch_user_id(&self, user_code: &str) -> Result<Option<String>, StoreError> {
        let resp = self
            .http
            .get(self.table_url(USERS_TABLE))
            .query(&[
                ("select", "id"),
                ("user_code", format!("eq.{user_code}").as_str()),
                ("limit", "1"),
            ])
            .send()
            .await?;
        let rows: Vec<IdRow> = Self::read(resp).await?;
        Ok(rows.into_iter().next().map(|row| row.id))
    }

    async fn touch_last_active(&self, user_code: &str) -> Result<(), StoreError> {
        let resp = self
            .http
            .patch(self.table_url(USERS_TABLE))
            .header("Prefer", "return=minimal")
            .query(&[("user_code", format!("eq.{user_code}").as_str())])
            .json(&serde_json::json!({ "last_active": Utc::now().to_rfc3339() }))
            .send()
            .await?;
        Self::check(resp).await
    }
}
