//! In-memory record store
//!
//! Keeps records per collection in creation order. Concurrent writes are
//! last-write-wins, like the remote store.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;
use zana_common::reference::RECORD_ID_LEN;
use zana_common::{Collection, Fields, Record};

use super::RecordStore;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with records
    pub fn with_records(records: impl IntoIterator<Item = (Collection, Record)>) -> Self {
        let mut collections: HashMap<Collection, Vec<Record>> = HashMap::new();
        for (collection, record) in records {
            collections.entry(collection).or_default().push(record);
        }
        Self {
            collections: RwLock::new(collections),
        }
    }

    /// Fresh 24-hex record id
    pub fn new_record_id() -> String {
        Uuid::new_v4().simple().to_string()[..RECORD_ID_LEN].to_string()
    }

    /// Single-record body, shaped like the remote API's
    fn single_body(record: &Record) -> Value {
        json!({
            "id": record.record_id,
            "createdat": record.created_at,
            "updatedat": record.updated_at,
            "fields": record.fields,
        })
    }
}

fn now() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self, collection: Collection) -> StoreResult<Vec<Record>> {
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).cloned().unwrap_or_default())
    }

    async fn get(&self, collection: Collection, record_id: &str) -> StoreResult<Record> {
        let collections = self.collections.read().await;
        collections
            .get(&collection)
            .and_then(|records| records.iter().find(|r| r.record_id == record_id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(record_id.to_string()))
    }

    async fn create(&self, collection: Collection, fields: Fields) -> StoreResult<Value> {
        let mut record = Record::new(Self::new_record_id(), fields);
        record.created_at = Some(now());

        let body = Self::single_body(&record);
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .push(record);
        Ok(body)
    }

    async fn update(&self, collection: Collection, record_id: &str, fields: Fields) -> StoreResult<Value> {
        let mut collections = self.collections.write().await;
        let record = collections
            .get_mut(&collection)
            .and_then(|records| records.iter_mut().find(|r| r.record_id == record_id))
            .ok_or_else(|| StoreError::NotFound(record_id.to_string()))?;

        for (key, value) in fields {
            record.fields.insert(key, value);
        }
        record.updated_at = Some(now());
        Ok(Self::single_body(record))
    }

    async fn delete(&self, collection: Collection, record_id: &str) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let records = collections
            .get_mut(&collection)
            .ok_or_else(|| StoreError::NotFound(record_id.to_string()))?;
        let before = records.len();
        records.retain(|r| r.record_id != record_id);
        if records.len() == before {
            return Err(StoreError::NotFound(record_id.to_string()));
        }
        Ok(())
    }
}
