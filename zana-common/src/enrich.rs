//! Lookup/enrichment engine
//!
//! Resolves the reference fields of a record list to display text using
//! hash-map indexes of the referenced collections. Pure: inputs are only
//! borrowed, so the result can be recomputed on every render.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::collection::{Collection, ReferenceField};
use crate::record::Record;
use crate::reference;

/// Records of one collection indexed by record id
#[derive(Debug, Default, Clone)]
pub struct RecordIndex<'a> {
    by_id: HashMap<&'a str, &'a Record>,
}

impl<'a> RecordIndex<'a> {
    pub fn build(records: &'a [Record]) -> Self {
        Self {
            by_id: records.iter().map(|r| (r.record_id.as_str(), r)).collect(),
        }
    }

    pub fn get(&self, record_id: &str) -> Option<&'a Record> {
        self.by_id.get(record_id).copied()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// One [`RecordIndex`] per referenced collection
#[derive(Debug, Default, Clone)]
pub struct LookupMaps<'a> {
    indexes: HashMap<Collection, RecordIndex<'a>>,
}

impl<'a> LookupMaps<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the index of `collection`
    pub fn with(mut self, collection: Collection, records: &'a [Record]) -> Self {
        self.insert(collection, records);
        self
    }

    pub fn insert(&mut self, collection: Collection, records: &'a [Record]) {
        self.indexes.insert(collection, RecordIndex::build(records));
    }

    pub fn index(&self, collection: Collection) -> Option<&RecordIndex<'a>> {
        self.indexes.get(&collection)
    }
}

/// A record together with the resolved text of its reference fields
///
/// Serialises as the record itself plus one `<key>Name` string per
/// reference field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: Record,
    #[serde(flatten)]
    pub display: BTreeMap<String, String>,
}

impl EnrichedRecord {
    /// Resolved text for a display key such as `erkannte_zutatName`
    pub fn display_name(&self, display_key: &str) -> &str {
        self.display.get(display_key).map(String::as_str).unwrap_or("")
    }
}

/// Resolve every reference field of `records`
///
/// Output has the same length and order as the input. A reference that
/// does not decode, or whose target is missing, resolves to "".
pub fn enrich(collection: Collection, records: &[Record], maps: &LookupMaps<'_>) -> Vec<EnrichedRecord> {
    let fields = collection.reference_fields();
    for field in fields {
        if maps.index(field.target).is_none() {
            tracing::warn!(
                collection = %collection,
                target = %field.target,
                "No lookup map for referenced collection; references resolve to empty text"
            );
        }
    }

    records
        .iter()
        .map(|record| EnrichedRecord {
            record: record.clone(),
            display: fields
                .iter()
                .map(|field| {
                    let text = resolve_display(record.field(field.key), field, maps.index(field.target));
                    (field.display_key(), text)
                })
                .collect(),
        })
        .collect()
}

/// Display text of one reference value
pub fn resolve_display(value: Option<&Value>, field: &ReferenceField, index: Option<&RecordIndex<'_>>) -> String {
    let url = value.and_then(Value::as_str);
    let Some(record_id) = reference::resolve_for(field.target, url) else {
        return String::new();
    };
    match index.and_then(|idx| idx.get(record_id)) {
        Some(target) => target.display(field.display_fields),
        None => String::new(),
    }
}

/// Enrich analysis results with their analysis title and ingredient name
pub fn enrich_analysis_results(
    results: &[Record],
    analyses: &[Record],
    ingredients: &[Record],
) -> Vec<EnrichedRecord> {
    let maps = LookupMaps::new()
        .with(Collection::Analysis, analyses)
        .with(Collection::IngredientDatabase, ingredients);
    enrich(Collection::AnalysisResult, results, &maps)
}

/// Enrich quick analyses with their ingredient name
pub fn enrich_quick_analyses(quick: &[Record], ingredients: &[Record]) -> Vec<EnrichedRecord> {
    let maps = LookupMaps::new().with(Collection::IngredientDatabase, ingredients);
    enrich(Collection::QuickAnalysis, quick, &maps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Fields;
    use crate::reference::create_record_url;
    use serde_json::json;

    const ANALYSE_ID: &str = "a1a1a1a1a1a1a1a1a1a1a1a1";
    const ZUTAT_ID: &str = "0f0f0f0f0f0f0f0f0f0f0f0f";

    fn record(id: &str, fields: Value) -> Record {
        let fields: Fields = fields.as_object().cloned().unwrap_or_default();
        Record::new(id, fields)
    }

    fn fixtures() -> (Vec<Record>, Vec<Record>) {
        let analyses = vec![record(ANALYSE_ID, json!({"analyse_titel": "Joghurt"}))];
        let ingredients = vec![record(ZUTAT_ID, json!({"zutat_name": " Zucker "}))];
        (analyses, ingredients)
    }

    #[test]
    fn test_parent_resolved_and_unset_reference_empty() {
        let (analyses, ingredients) = fixtures();
        let results = vec![record(
            "111111111111111111111111",
            json!({"zugehoerende_analyse": create_record_url(Collection::Analysis, ANALYSE_ID)}),
        )];

        let enriched = enrich_analysis_results(&results, &analyses, &ingredients);
        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].display_name("zugehoerende_analyseName"), "Joghurt");
        assert_eq!(enriched[0].display_name("erkannte_zutatName"), "");
    }

    #[test]
    fn test_display_text_is_trimmed() {
        let (_, ingredients) = fixtures();
        let quick = vec![record(
            "222222222222222222222222",
            json!({"erkannte_zutaten": create_record_url(Collection::IngredientDatabase, ZUTAT_ID)}),
        )];
        let enriched = enrich_quick_analyses(&quick, &ingredients);
        assert_eq!(enriched[0].display_name("erkannte_zutatenName"), "Zucker");
    }

    #[test]
    fn test_undecodable_and_dangling_references_are_empty() {
        let (analyses, ingredients) = fixtures();
        let results = vec![
            record("1", json!({"zugehoerende_analyse": "kaputt"})),
            record("2", json!({"zugehoerende_analyse": null})),
            record(
                "3",
                json!({"zugehoerende_analyse": create_record_url(Collection::Analysis, "ffffffffffffffffffffffff")}),
            ),
            record("4", json!({"zugehoerende_analyse": 42})),
        ];
        let enriched = enrich_analysis_results(&results, &analyses, &ingredients);
        assert!(enriched.iter().all(|e| e.display_name("zugehoerende_analyseName").is_empty()));
    }

    #[test]
    fn test_reference_into_wrong_collection_is_not_resolved() {
        let (analyses, ingredients) = fixtures();
        // analysis id placed under the ingredient field, encoded for the analysis collection
        let results = vec![record(
            "1",
            json!({"erkannte_zutat": create_record_url(Collection::Analysis, ANALYSE_ID)}),
        )];
        let both: Vec<Record> = ingredients.iter().chain(analyses.iter()).cloned().collect();
        let enriched = enrich_analysis_results(&results, &analyses, &both);
        assert_eq!(enriched[0].display_name("erkannte_zutatName"), "");
    }

    #[test]
    fn test_order_preserved_and_inputs_untouched() {
        let (analyses, ingredients) = fixtures();
        let url = create_record_url(Collection::Analysis, ANALYSE_ID);
        let results: Vec<Record> = (0..5)
            .map(|i| record(&format!("{:024x}", i), json!({"zugehoerende_analyse": url, "menge_anteil": i.to_string()})))
            .collect();
        let before = results.clone();

        let first = enrich_analysis_results(&results, &analyses, &ingredients);
        let second = enrich_analysis_results(&results, &analyses, &ingredients);

        assert_eq!(first, second);
        assert_eq!(results, before);
        let ids: Vec<&str> = first.iter().map(|e| e.record.record_id.as_str()).collect();
        let expected: Vec<&str> = before.iter().map(|r| r.record_id.as_str()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_missing_map_resolves_empty() {
        let quick = vec![record(
            "1",
            json!({"erkannte_zutaten": create_record_url(Collection::IngredientDatabase, ZUTAT_ID)}),
        )];
        let enriched = enrich(Collection::QuickAnalysis, &quick, &LookupMaps::new());
        assert_eq!(enriched[0].display_name("erkannte_zutatenName"), "");
    }

    #[test]
    fn test_collections_without_references_pass_through() {
        let (analyses, _) = fixtures();
        let enriched = enrich(Collection::Analysis, &analyses, &LookupMaps::new());
        assert_eq!(enriched[0].record, analyses[0]);
        assert!(enriched[0].display.is_empty());
    }

    #[test]
    fn test_serialises_flat() {
        let (analyses, ingredients) = fixtures();
        let results = vec![record(
            "1",
            json!({"zugehoerende_analyse": create_record_url(Collection::Analysis, ANALYSE_ID)}),
        )];
        let enriched = enrich_analysis_results(&results, &analyses, &ingredients);
        let value = serde_json::to_value(&enriched[0]).unwrap();
        assert_eq!(value["record_id"], "1");
        assert_eq!(value["zugehoerende_analyseName"], "Joghurt");
        assert_eq!(value["erkannte_zutatName"], "");
        assert!(value["fields"].is_object());
    }
}
