//! zana-dash library: ingredient-analysis dashboard service
//!
//! JSON API over the four record collections, backed by a [`RecordStore`]
//! and an optional [`PhotoExtractor`].

pub mod api;
pub mod error;
pub mod extract;
pub mod pages;
pub mod store;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use zana_common::config::TomlConfig;
use zana_common::Collection;

use crate::extract::PhotoExtractor;
use crate::pages::CollectionPage;
use crate::store::RecordStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    /// Photo extraction service, absent when not configured
    pub extractor: Option<Arc<dyn PhotoExtractor>>,
    /// One page per collection, each behind its own lock
    pub pages: Arc<HashMap<Collection, RwLock<CollectionPage>>>,
    pub config: Arc<TomlConfig>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RecordStore>,
        extractor: Option<Arc<dyn PhotoExtractor>>,
        config: TomlConfig,
    ) -> Self {
        let pages = Collection::all()
            .into_iter()
            .map(|c| (c, RwLock::new(CollectionPage::new(c))))
            .collect();
        Self {
            store,
            extractor,
            pages: Arc::new(pages),
            config: Arc::new(config),
        }
    }

    /// Page of `collection`
    pub fn page(&self, collection: Collection) -> Result<&RwLock<CollectionPage>, ApiError> {
        self.pages
            .get(&collection)
            .ok_or_else(|| ApiError::Internal(format!("No page for {}", collection)))
    }

    /// Mark stale every page that references `written`
    ///
    /// Their related copies of `written` are out of date after a create,
    /// update or delete there.
    pub async fn invalidate_dependents(&self, written: Collection) {
        for (collection, lock) in self.pages.iter() {
            if !collection.referenced_collections().contains(&written) {
                continue;
            }
            lock.write().await.mark_stale();
            tracing::debug!(page = %collection, written = %written, "Page marked stale");
        }
    }

    /// Extractor for `collection` if photo scan is enabled there
    pub fn extractor_for(&self, collection: Collection) -> Option<Arc<dyn PhotoExtractor>> {
        if !self.config.photo_scan_enabled(collection) {
            return None;
        }
        self.extractor.clone()
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::record_routes())
        .merge(api::overview_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
