//! HTTP API handlers for zana-dash

pub mod health;
pub mod overview;
pub mod records;
pub mod scan;

pub use health::health_routes;
pub use overview::overview_routes;
pub use records::record_routes;

use zana_common::Collection;

use crate::ApiError;

/// Collection named by a URL slug
pub(crate) fn collection_from_slug(slug: &str) -> Result<Collection, ApiError> {
    slug.parse::<Collection>()
        .map_err(|_| ApiError::NotFound(format!("Unknown collection: {}", slug)))
}
