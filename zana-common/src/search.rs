//! Free-text record search used by the collection pages

use serde_json::Value;

use crate::enrich::EnrichedRecord;
use crate::record::display_text;

/// True if any field value or resolved reference text contains `query`
///
/// Case-insensitive; an empty (or blank) query matches everything. Arrays
/// are searched element-wise and lookup objects by their label.
pub fn matches_search(entry: &EnrichedRecord, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    entry
        .record
        .fields
        .values()
        .any(|value| value_matches(value, &needle))
        || entry
            .display
            .values()
            .any(|text| text.to_lowercase().contains(&needle))
}

fn value_matches(value: &Value, needle: &str) -> bool {
    match value {
        Value::Null => false,
        Value::Array(items) => items.iter().any(|item| value_matches(item, needle)),
        other => display_text(other).to_lowercase().contains(needle),
    }
}

/// Keep the entries matching `query`, preserving order
pub fn filter_records(entries: Vec<EnrichedRecord>, query: &str) -> Vec<EnrichedRecord> {
    entries
        .into_iter()
        .filter(|entry| matches_search(entry, query))
        .collect()
}
