//! Collection page endpoints
//!
//! Reads are served from the page's in-memory copy, loaded on first access
//! or on `refresh=true`. Create and update reload the page before
//! answering; delete only drops the record locally. Every mutation marks
//! the pages that reference the collection stale.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLockReadGuard;
use zana_common::enrich::EnrichedRecord;
use zana_common::schema::normalize_fields;
use zana_common::{Collection, Fields};

use super::{collection_from_slug, scan};
use crate::pages::{CollectionPage, PageStatus, ReferenceOption};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Free-text search
    #[serde(default)]
    pub q: String,
    /// Refetch from the record store first
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub collection: Collection,
    pub label: &'static str,
    pub status: PageStatus,
    /// Records on the page before filtering
    pub total: usize,
    pub records: Vec<EnrichedRecord>,
}

/// Create/update payload
#[derive(Debug, Deserialize)]
pub struct FieldsBody {
    pub fields: Fields,
}

/// Page of `collection`, loaded if it is not yet
pub(crate) async fn loaded_page(
    state: &AppState,
    collection: Collection,
) -> ApiResult<RwLockReadGuard<'_, CollectionPage>> {
    let lock = state.page(collection)?;
    {
        let page = lock.read().await;
        if page.is_ready() {
            return Ok(page);
        }
    }
    let mut page = lock.write().await;
    page.ensure_loaded(state.store.as_ref()).await?;
    Ok(page.downgrade())
}

fn list_response(page: &CollectionPage, query: &str) -> ListResponse {
    ListResponse {
        collection: page.collection(),
        label: page.collection().label(),
        status: page.status().clone(),
        total: page.records().len(),
        records: page.view(query),
    }
}

/// GET /api/records/:slug?q=&refresh=
pub async fn list_records(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListResponse>> {
    let collection = collection_from_slug(&slug)?;

    if !query.refresh {
        let page = loaded_page(&state, collection).await?;
        return Ok(Json(list_response(&page, &query.q)));
    }

    let mut page = state.page(collection)?.write().await;
    page.load(state.store.as_ref()).await?;
    Ok(Json(list_response(&page, &query.q)))
}

/// GET /api/records/:slug/:id
///
/// Fetches the record itself fresh; references resolve against the page.
pub async fn get_record(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, String)>,
) -> ApiResult<Json<EnrichedRecord>> {
    let collection = collection_from_slug(&slug)?;
    let record = state.store.get(collection, &id).await?;
    let page = loaded_page(&state, collection).await?;

    page.enrich(std::slice::from_ref(&record))
        .pop()
        .map(Json)
        .ok_or_else(|| ApiError::Internal("Enrichment dropped the record".to_string()))
}

/// POST /api/records/:slug
pub async fn create_record(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(body): Json<FieldsBody>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let collection = collection_from_slug(&slug)?;
    let fields = normalize_fields(collection, body.fields)?;

    let created = {
        let mut page = state.page(collection)?.write().await;
        page.create(state.store.as_ref(), fields).await?
    };
    state.invalidate_dependents(collection).await;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/records/:slug/:id
pub async fn update_record(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, String)>,
    Json(body): Json<FieldsBody>,
) -> ApiResult<Json<Value>> {
    let collection = collection_from_slug(&slug)?;
    let fields = normalize_fields(collection, body.fields)?;

    let updated = {
        let mut page = state.page(collection)?.write().await;
        page.update(state.store.as_ref(), &id, fields).await?
    };
    state.invalidate_dependents(collection).await;
    Ok(Json(updated))
}

/// DELETE /api/records/:slug/:id
pub async fn delete_record(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let collection = collection_from_slug(&slug)?;

    {
        let mut page = state.page(collection)?.write().await;
        page.delete(state.store.as_ref(), &id).await?;
    }
    state.invalidate_dependents(collection).await;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/records/:slug/options/:reference_key
pub async fn reference_options(
    State(state): State<AppState>,
    Path((slug, reference_key)): Path<(String, String)>,
) -> ApiResult<Json<Vec<ReferenceOption>>> {
    let collection = collection_from_slug(&slug)?;
    let page = loaded_page(&state, collection).await?;

    page.options(&reference_key).map(Json).ok_or_else(|| {
        ApiError::NotFound(format!(
            "{} has no reference field '{}'",
            collection.label(),
            reference_key
        ))
    })
}

pub fn record_routes() -> Router<AppState> {
    Router::new()
        .route("/api/records/:slug", get(list_records).post(create_record))
        .route("/api/records/:slug/scan", post(scan::scan_photo))
        .route(
            "/api/records/:slug/options/:reference_key",
            get(reference_options),
        )
        .route(
            "/api/records/:slug/:id",
            get(get_record).patch(update_record).delete(delete_record),
        )
}
