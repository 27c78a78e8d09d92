//! # zana common library
//!
//! Shared code for the ingredient-analysis dashboard:
//! - Collections and their field schema
//! - Record model and the record reference codec
//! - Lookup/enrichment engine resolving references to display text
//! - Merge policy for photo-extraction results
//! - Record search and dashboard overview aggregation
//! - Configuration loading

pub mod collection;
pub mod config;
pub mod enrich;
pub mod error;
pub mod merge;
pub mod overview;
pub mod record;
pub mod reference;
pub mod schema;
pub mod search;

pub use collection::{Collection, ReferenceField};
pub use enrich::{enrich, EnrichedRecord, LookupMaps, RecordIndex};
pub use error::{Error, Result};
pub use record::{Fields, Record};
pub use reference::{create_record_url, extract_record_id, RecordRef};
