//! HTTP client for the Living Apps record API
//!
//! Endpoints, relative to the configured base URL:
//! - `GET    /apps/{app_id}/records`       map of record id -> body
//! - `GET    /apps/{app_id}/records/{id}`  single body, id named `id`
//! - `POST   /apps/{app_id}/records`       `{fields}`
//! - `PATCH  /apps/{app_id}/records/{id}`  `{fields}` (partial)
//! - `DELETE /apps/{app_id}/records/{id}`  success by status alone
//!
//! Authentication is the session cookie. There are no retries and no request
//! timeout; only connecting is bounded.

use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder, Response};
use serde_json::{json, Value};
use std::time::Duration;
use zana_common::record::flatten_record_map;
use zana_common::{Collection, Fields, Record};

use super::RecordStore;
use crate::error::{StoreError, StoreResult};

const USER_AGENT: &str = concat!("zana-dash/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Record store backed by the Living Apps REST API
pub struct LivingAppsClient {
    http_client: reqwest::Client,
    base_url: String,
    session_cookie: Option<String>,
}

impl LivingAppsClient {
    pub fn new(base_url: &str, session_cookie: Option<String>) -> StoreResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session_cookie,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn records_url(&self, collection: Collection) -> String {
        format!("{}/apps/{}/records", self.base_url, collection.app_id())
    }

    fn record_url(&self, collection: Collection, record_id: &str) -> String {
        format!("{}/{}", self.records_url(collection), record_id)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.http_client.request(method, url);
        match &self.session_cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        }
    }

    /// Send and turn non-2xx responses into errors
    async fn send(&self, builder: RequestBuilder, record_id: Option<&str>) -> StoreResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            if let Some(id) = record_id {
                return Err(StoreError::NotFound(id.to_string()));
            }
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %error_text, "Record store request failed");
            return Err(StoreError::Api(status.as_u16(), error_text));
        }
        Ok(response)
    }

    async fn json_body(response: Response) -> StoreResult<Value> {
        response
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))
    }
}

#[async_trait]
impl RecordStore for LivingAppsClient {
    async fn list(&self, collection: Collection) -> StoreResult<Vec<Record>> {
        let url = self.records_url(collection);
        tracing::debug!(collection = %collection, url = %url, "Fetching records");

        let response = self.send(self.request(Method::GET, &url), None).await?;
        let body = Self::json_body(response).await?;
        let records = flatten_record_map(body).map_err(|e| StoreError::Parse(e.to_string()))?;

        tracing::debug!(collection = %collection, count = records.len(), "Fetched records");
        Ok(records)
    }

    async fn get(&self, collection: Collection, record_id: &str) -> StoreResult<Record> {
        let url = self.record_url(collection, record_id);
        let response = self
            .send(self.request(Method::GET, &url), Some(record_id))
            .await?;
        let body = Self::json_body(response).await?;
        Record::from_single(body).map_err(|e| StoreError::Parse(e.to_string()))
    }

    async fn create(&self, collection: Collection, fields: Fields) -> StoreResult<Value> {
        let url = self.records_url(collection);
        let response = self
            .send(
                self.request(Method::POST, &url).json(&json!({ "fields": fields })),
                None,
            )
            .await?;
        tracing::info!(collection = %collection, "Created record");
        Self::json_body(response).await
    }

    async fn update(&self, collection: Collection, record_id: &str, fields: Fields) -> StoreResult<Value> {
        let url = self.record_url(collection, record_id);
        let response = self
            .send(
                self.request(Method::PATCH, &url).json(&json!({ "fields": fields })),
                Some(record_id),
            )
            .await?;
        tracing::info!(collection = %collection, record_id = %record_id, "Updated record");
        Self::json_body(response).await
    }

    async fn delete(&self, collection: Collection, record_id: &str) -> StoreResult<()> {
        let url = self.record_url(collection, record_id);
        self.send(self.request(Method::DELETE, &url), Some(record_id))
            .await?;
        tracing::info!(collection = %collection, record_id = %record_id, "Deleted record");
        Ok(())
    }
}
