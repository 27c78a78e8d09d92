//! Dashboard overview endpoint

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use zana_common::overview::Overview;

use crate::pages::DashboardData;
use crate::{ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct OverviewQuery {
    /// Analysis title filter
    #[serde(default)]
    pub q: String,
}

/// GET /api/overview?q=
///
/// Always fetches all four collections fresh.
pub async fn get_overview(
    State(state): State<AppState>,
    Query(query): Query<OverviewQuery>,
) -> ApiResult<Json<Overview>> {
    let data = DashboardData::load(state.store.as_ref()).await?;
    Ok(Json(data.overview(&query.q)))
}

pub fn overview_routes() -> Router<AppState> {
    Router::new().route("/api/overview", get(get_overview))
}
