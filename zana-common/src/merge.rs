//! Photo-extraction merge policy
//!
//! Folds a best-effort extraction payload into an in-progress form:
//! - a value is adopted only if it is non-null, has the right shape for the
//!   field, and the form value is unset or "";
//! - keys outside the collection schema are ignored;
//! - reference fields carry a *name*; it is resolved to the first candidate
//!   (in list order) whose match field contains the name or is contained in
//!   it, case-insensitive. This is a loose first-match heuristic, not a
//!   best-match search.
//!
//! Nothing here fails: malformed payloads merge nothing.

use serde_json::Value;
use std::collections::HashMap;

use crate::collection::{Collection, ReferenceField};
use crate::record::{display_text, is_unset, Fields, Record};
use crate::reference::create_record_url;
use crate::schema::{FieldSpec, FieldValue};

/// Candidate records for one reference field
#[derive(Debug, Clone, Copy)]
pub struct ReferenceCandidates<'a> {
    pub target: Collection,
    pub records: &'a [Record],
    /// Fields compared against the extracted name
    pub match_fields: &'a [&'a str],
}

impl<'a> ReferenceCandidates<'a> {
    /// Candidates matched on the field's display fields
    pub fn for_field(field: &ReferenceField, records: &'a [Record]) -> Self {
        Self {
            target: field.target,
            records,
            match_fields: field.display_fields,
        }
    }

    /// First record whose match fields loosely match `name`
    pub fn find(&self, name: &str) -> Option<&'a Record> {
        self.records.iter().find(|record| {
            let names: Vec<String> = self
                .match_fields
                .iter()
                .map(|f| record.field(f).map(display_text).unwrap_or_default())
                .collect();
            match_name(name, &names)
        })
    }
}

/// Bidirectional, case-insensitive substring match
///
/// Empty names (after trimming) never match, on either side. Plain
/// containment would let an empty candidate match every extracted name and
/// bind the field to the first record with a blank display name; such
/// candidates are skipped instead.
pub fn match_name(name: &str, candidates: &[String]) -> bool {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }
    candidates.iter().any(|candidate| {
        let candidate = candidate.trim().to_lowercase();
        !candidate.is_empty() && (candidate.contains(&needle) || needle.contains(&candidate))
    })
}

/// What a merge did, for logging and for the scan response
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// Plain fields taken over from the extraction
    pub adopted: Vec<String>,
    /// Reference fields resolved to a record
    pub resolved: Vec<String>,
    /// Keys present in the payload but ignored (unknown, malformed, no match)
    pub skipped: Vec<String>,
}

/// Merged form plus report
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub fields: Fields,
    pub report: MergeReport,
}

/// Merge an extraction payload into the form of `collection`
pub fn merge_extraction(
    collection: Collection,
    form: &Fields,
    raw: &Value,
    candidates: &HashMap<&str, ReferenceCandidates<'_>>,
) -> MergeOutcome {
    merge_with_schema(collection.schema(), form, raw, candidates)
}

/// Merge against an explicit schema
pub fn merge_with_schema(
    schema: &[FieldSpec],
    form: &Fields,
    raw: &Value,
    candidates: &HashMap<&str, ReferenceCandidates<'_>>,
) -> MergeOutcome {
    let mut merged = form.clone();
    let mut report = MergeReport::default();

    let Some(payload) = raw.as_object() else {
        tracing::debug!("Extraction payload is not an object; nothing merged");
        return MergeOutcome { fields: merged, report };
    };

    for (key, value) in payload {
        let Some(spec) = schema.iter().find(|s| s.key == key.as_str()) else {
            report.skipped.push(key.clone());
            continue;
        };
        if spec.is_reference() || value.is_null() {
            continue;
        }
        if !is_unset(merged.get(key)) {
            continue;
        }
        match FieldValue::from_json(spec.kind, value) {
            Some(coerced) => {
                merged.insert(key.clone(), coerced.to_json());
                report.adopted.push(key.clone());
            }
            None => report.skipped.push(key.clone()),
        }
    }

    for spec in schema.iter().filter(|s| s.is_reference()) {
        let Some(name) = payload.get(spec.key).and_then(Value::as_str) else {
            continue;
        };
        if name.trim().is_empty() || !is_unset(merged.get(spec.key)) {
            continue;
        }
        let Some(pool) = candidates.get(spec.key) else {
            report.skipped.push(spec.key.to_string());
            continue;
        };
        match pool.find(name) {
            Some(record) => {
                merged.insert(
                    spec.key.to_string(),
                    Value::String(create_record_url(pool.target, &record.record_id)),
                );
                report.resolved.push(spec.key.to_string());
            }
            None => {
                tracing::debug!(field = spec.key, name = %name, "No candidate matches extracted name");
                report.skipped.push(spec.key.to_string());
            }
        }
    }

    MergeOutcome { fields: merged, report }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::extract_record_id;
    use serde_json::json;

    fn obj(value: Value) -> Fields {
        value.as_object().cloned().unwrap_or_default()
    }

    fn analyses() -> Vec<Record> {
        vec![
            Record::new("aaaaaaaaaaaaaaaaaaaaaaaa", obj(json!({"analyse_titel": "Müsli"}))),
            Record::new("bbbbbbbbbbbbbbbbbbbbbbbb", obj(json!({"analyse_titel": "Jonas Schmidt"}))),
            Record::new("cccccccccccccccccccccccc", obj(json!({"analyse_titel": "Jonas Schmidt II"}))),
        ]
    }

    fn candidates_for<'a>(records: &'a [Record]) -> HashMap<&'static str, ReferenceCandidates<'a>> {
        let field = Collection::AnalysisResult
            .reference_field("zugehoerende_analyse")
            .unwrap();
        HashMap::from([(field.key, ReferenceCandidates::for_field(field, records))])
    }

    #[test]
    fn test_null_values_never_adopted() {
        let outcome = merge_extraction(
            Collection::IngredientDatabase,
            &Fields::new(),
            &json!({"zutat_name": "Zucker", "ist_allergen": null}),
            &HashMap::new(),
        );
        assert_eq!(outcome.fields, obj(json!({"zutat_name": "Zucker"})));
        assert_eq!(outcome.report.adopted, vec!["zutat_name".to_string()]);
    }

    #[test]
    fn test_existing_values_are_kept() {
        let form = obj(json!({"zutat_name": "Salz", "bemerkungen": "", "ist_allergen": false}));
        let outcome = merge_extraction(
            Collection::IngredientDatabase,
            &form,
            &json!({"zutat_name": "Zucker", "bemerkungen": "fein", "ist_allergen": true}),
            &HashMap::new(),
        );
        assert_eq!(outcome.fields["zutat_name"], "Salz");
        assert_eq!(outcome.fields["bemerkungen"], "fein");
        assert_eq!(outcome.fields["ist_allergen"], false);
    }

    #[test]
    fn test_unknown_and_malformed_keys_skipped() {
        let outcome = merge_extraction(
            Collection::IngredientDatabase,
            &Fields::new(),
            &json!({
                "farbe": "weiß",
                "ist_allergen": {"ja": 1},
                "kategorie": "Zucker & Süßungsmittel",
                "allergen_typ": ["gluten", 7]
            }),
            &HashMap::new(),
        );
        assert!(!outcome.fields.contains_key("farbe"));
        assert!(!outcome.fields.contains_key("ist_allergen"));
        assert_eq!(outcome.fields["kategorie"], "zucker_suessungsmittel");
        assert_eq!(outcome.fields["allergen_typ"], json!(["gluten"]));
        assert!(outcome.report.skipped.contains(&"farbe".to_string()));
        assert!(outcome.report.skipped.contains(&"ist_allergen".to_string()));
    }

    #[test]
    fn test_non_object_payload_merges_nothing() {
        let form = obj(json!({"menge_anteil": "5 %"}));
        for raw in [json!(null), json!("text"), json!([1, 2])] {
            let outcome = merge_extraction(Collection::AnalysisResult, &form, &raw, &HashMap::new());
            assert_eq!(outcome.fields, form);
        }
    }

    #[test]
    fn test_reference_resolved_by_substring() {
        let records = analyses();
        let outcome = merge_extraction(
            Collection::AnalysisResult,
            &Fields::new(),
            &json!({"zugehoerende_analyse": "jonas"}),
            &candidates_for(&records),
        );
        let url = outcome.fields["zugehoerende_analyse"].as_str().unwrap();
        // first match in list order wins
        assert_eq!(extract_record_id(Some(url)), Some("bbbbbbbbbbbbbbbbbbbbbbbb"));
        assert!(url.contains(Collection::Analysis.app_id()));
        assert_eq!(outcome.report.resolved, vec!["zugehoerende_analyse".to_string()]);
    }

    #[test]
    fn test_reference_contained_in_extracted_name() {
        let records = analyses();
        let outcome = merge_extraction(
            Collection::AnalysisResult,
            &Fields::new(),
            &json!({"zugehoerende_analyse": "Bio-Müsli mit Nüssen"}),
            &candidates_for(&records),
        );
        let url = outcome.fields["zugehoerende_analyse"].as_str().unwrap();
        assert_eq!(extract_record_id(Some(url)), Some("aaaaaaaaaaaaaaaaaaaaaaaa"));
    }

    #[test]
    fn test_reference_without_match_stays_unset() {
        let records = analyses();
        let outcome = merge_extraction(
            Collection::AnalysisResult,
            &Fields::new(),
            &json!({"zugehoerende_analyse": "Zzz", "erkannte_zutat": "Zucker"}),
            &candidates_for(&records),
        );
        assert!(!outcome.fields.contains_key("zugehoerende_analyse"));
        // no candidate list for erkannte_zutat
        assert!(!outcome.fields.contains_key("erkannte_zutat"));
    }

    #[test]
    fn test_reference_not_applied_when_already_set() {
        let records = analyses();
        let existing = create_record_url(Collection::Analysis, "aaaaaaaaaaaaaaaaaaaaaaaa");
        let form = obj(json!({"zugehoerende_analyse": existing}));
        let outcome = merge_extraction(
            Collection::AnalysisResult,
            &form,
            &json!({"zugehoerende_analyse": "Jonas"}),
            &candidates_for(&records),
        );
        assert_eq!(outcome.fields["zugehoerende_analyse"], json!(existing));
    }

    #[test]
    fn test_match_name_ignores_empty_strings() {
        assert!(!match_name("   ", &["Zucker".to_string()]));
        assert!(!match_name("Zucker", &["".to_string()]));
        assert!(match_name(" ZUCKER ", &["Rohrzucker".to_string()]));
    }
}
