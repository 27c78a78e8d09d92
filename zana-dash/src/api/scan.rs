//! Photo scan endpoint

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use zana_common::Fields;

use super::collection_from_slug;
use super::records::loaded_page;
use crate::error::ExtractError;
use crate::pages::ScanOutcome;
use crate::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    /// Image or PDF as a base64 data URI
    pub data_uri: String,
    /// Current form values
    #[serde(default)]
    pub fields: Fields,
}

/// POST /api/records/:slug/scan
///
/// Extraction failures are not HTTP errors: the response carries the
/// unchanged form with `scanned: false`.
pub async fn scan_photo(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(request): Json<ScanRequest>,
) -> ApiResult<Json<ScanOutcome>> {
    let collection = collection_from_slug(&slug)?;
    let extractor = state
        .extractor_for(collection)
        .ok_or_else(|| ExtractError::Disabled(collection.label().to_string()))?;

    // Work on a snapshot so the page is not locked during extraction
    let page = loaded_page(&state, collection).await?.clone();
    let outcome = page
        .scan(extractor.as_ref(), &request.fields, &request.data_uri)
        .await;
    Ok(Json(outcome))
}
