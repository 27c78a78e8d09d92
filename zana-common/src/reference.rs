//! Record reference codec
//!
//! A reference field stores a URL of the form
//! `https://my.living-apps.de/rest/apps/{app_id}/records/{record_id}`.
//! Encoding is fully qualified; [`extract_record_id`] only recovers the
//! record id. [`resolve_for`] additionally rejects URLs that name a
//! different known collection than the one the caller expects.
//!
//! Decoding never fails: absent or malformed references are a normal state
//! of user-entered and extracted data and simply yield `None`.

use std::fmt;

use crate::collection::Collection;

/// Base of every encoded reference URL
pub const REFERENCE_BASE_URL: &str = "https://my.living-apps.de/rest";

/// Length of a record id (lowercase hex)
pub const RECORD_ID_LEN: usize = 24;

/// Encode a reference to `record_id` in `collection`
pub fn create_record_url(collection: Collection, record_id: &str) -> String {
    format!(
        "{}/apps/{}/records/{}",
        REFERENCE_BASE_URL,
        collection.app_id(),
        record_id
    )
}

/// Trailing 24-hex-character record id of a reference, if any
pub fn extract_record_id(value: Option<&str>) -> Option<&str> {
    let value = value?;
    if value.len() < RECORD_ID_LEN {
        return None;
    }
    let start = value.len() - RECORD_ID_LEN;
    if !value.is_char_boundary(start) {
        return None;
    }
    let tail = &value[start..];
    if tail.bytes().all(|b| b.is_ascii_hexdigit()) {
        Some(tail)
    } else {
        None
    }
}

/// True when `value` is a bare record id
pub fn is_record_id(value: &str) -> bool {
    value.len() == RECORD_ID_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Record id of a reference that is expected to point into `target`
///
/// Same as [`extract_record_id`], except that a URL naming another known
/// collection resolves to `None` instead of being looked up in the wrong map.
pub fn resolve_for(target: Collection, value: Option<&str>) -> Option<&str> {
    let id = extract_record_id(value)?;
    if let Some(named) = value.and_then(RecordRef::parse) {
        if named.collection != target {
            tracing::debug!(
                expected = %target,
                found = %named.collection,
                "Reference points into a different collection"
            );
            return None;
        }
    }
    Some(id)
}

/// App id segment following `/apps/` in a reference URL
fn app_id_segment(value: &str) -> Option<&str> {
    let mut parts = value.split('/');
    while let Some(part) = parts.next() {
        if part == "apps" {
            return parts.next().filter(|p| !p.is_empty());
        }
    }
    None
}

/// Fully qualified reference to a record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordRef {
    pub collection: Collection,
    pub record_id: String,
}

impl RecordRef {
    pub fn new(collection: Collection, record_id: impl Into<String>) -> Self {
        Self {
            collection,
            record_id: record_id.into(),
        }
    }

    /// Parse a reference URL that names a known collection
    pub fn parse(value: &str) -> Option<RecordRef> {
        let record_id = extract_record_id(Some(value))?;
        let collection = app_id_segment(value).and_then(Collection::from_app_id)?;
        Some(RecordRef::new(collection, record_id))
    }

    pub fn to_url(&self) -> String {
        create_record_url(self.collection, &self.record_id)
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_url())
    }
}
