//! Record store access
//!
//! [`RecordStore`] is the CRUD contract of the remote record API, one call
//! per endpoint. [`LivingAppsClient`] talks to the real service;
//! [`MemoryStore`] keeps everything in process for tests and demo mode.

use async_trait::async_trait;
use serde_json::Value;
use zana_common::{Collection, Fields, Record};

use crate::error::StoreResult;

pub mod living_apps;
pub mod memory;

pub use living_apps::LivingAppsClient;
pub use memory::MemoryStore;

/// CRUD operations against the record store
///
/// Create and update return the store's response body untouched; callers
/// reload the collection afterwards rather than trusting its shape.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records of a collection, in store order
    async fn list(&self, collection: Collection) -> StoreResult<Vec<Record>>;

    async fn get(&self, collection: Collection, record_id: &str) -> StoreResult<Record>;

    async fn create(&self, collection: Collection, fields: Fields) -> StoreResult<Value>;

    /// Partial update: only the given fields change
    async fn update(&self, collection: Collection, record_id: &str, fields: Fields) -> StoreResult<Value>;

    async fn delete(&self, collection: Collection, record_id: &str) -> StoreResult<()>;
}
