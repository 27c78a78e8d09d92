//! Field schema of the four collections
//!
//! Records travel as untyped JSON objects. The schema gives every known key
//! a [`FieldKind`] so that payloads coming from users or from the photo
//! extraction service can be checked and coerced into a [`FieldValue`].

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

use crate::collection::Collection;
use crate::reference;
use crate::{Error, Result};

/// One option of a choice (lookup) field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceOption {
    pub key: &'static str,
    pub label: &'static str,
}

/// Shape of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single line text
    Text,
    /// Multi line text
    LongText,
    /// URL of an uploaded file
    FileUrl,
    /// Date or date-time (`YYYY-MM-DD`, `YYYY-MM-DDTHH:MM`, RFC 3339)
    Date,
    Bool,
    /// One key out of a closed set
    Choice(&'static [ChoiceOption]),
    /// Any number of keys out of a closed set
    MultiChoice(&'static [ChoiceOption]),
    /// Reference URL into another collection
    Reference(Collection),
}

/// Definition of one field of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn is_reference(&self) -> bool {
        matches!(self.kind, FieldKind::Reference(_))
    }
}

/// A field value checked against its [`FieldKind`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
    Choice(String),
    Choices(Vec<String>),
    Reference(String),
}

impl FieldValue {
    /// Coerce an untrusted JSON value into a value of the given kind
    ///
    /// Returns `None` for null and for values of the wrong shape. Choice
    /// values may be given as key, as `{key, label}` lookup object or as the
    /// label itself; they are normalised to the key.
    pub fn from_json(kind: FieldKind, value: &Value) -> Option<FieldValue> {
        match kind {
            FieldKind::Text | FieldKind::LongText | FieldKind::FileUrl => match value {
                Value::String(s) => Some(FieldValue::Text(s.clone())),
                Value::Number(n) => Some(FieldValue::Text(n.to_string())),
                _ => None,
            },
            FieldKind::Date => match value {
                Value::String(s) if parse_date(s).is_some() => {
                    Some(FieldValue::Text(s.trim().to_string()))
                }
                _ => None,
            },
            FieldKind::Bool => match value {
                Value::Bool(b) => Some(FieldValue::Bool(*b)),
                Value::String(s) if s.trim().eq_ignore_ascii_case("true") => {
                    Some(FieldValue::Bool(true))
                }
                Value::String(s) if s.trim().eq_ignore_ascii_case("false") => {
                    Some(FieldValue::Bool(false))
                }
                _ => None,
            },
            FieldKind::Choice(options) => {
                resolve_choice(options, value).map(|key| FieldValue::Choice(key.to_string()))
            }
            FieldKind::MultiChoice(options) => {
                let mut keys: Vec<String> = Vec::new();
                let mut push = |v: &Value| {
                    if let Some(key) = resolve_choice(options, v) {
                        if !keys.iter().any(|k| k == key) {
                            keys.push(key.to_string());
                        }
                    }
                };
                match value {
                    Value::Array(items) => items.iter().for_each(&mut push),
                    Value::String(_) | Value::Object(_) => push(value),
                    _ => {}
                }
                if keys.is_empty() {
                    None
                } else {
                    Some(FieldValue::Choices(keys))
                }
            }
            FieldKind::Reference(_) => match value {
                Value::String(s) if reference::extract_record_id(Some(s)).is_some() => {
                    Some(FieldValue::Reference(s.clone()))
                }
                _ => None,
            },
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) | FieldValue::Choice(s) | FieldValue::Reference(s) => {
                Value::String(s.clone())
            }
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Choices(keys) => {
                Value::Array(keys.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

/// Key of the choice option matching `value`, if any
fn resolve_choice(options: &'static [ChoiceOption], value: &Value) -> Option<&'static str> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            options
                .iter()
                .find(|o| o.key.eq_ignore_ascii_case(s) || o.label.to_lowercase() == s.to_lowercase())
                .map(|o| o.key)
        }
        Value::Object(obj) => obj.get("key").and_then(|k| resolve_choice(options, k)),
        _ => None,
    }
}

/// Parse the date formats accepted by date fields
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Schema entry of a field
pub fn field_spec(collection: Collection, key: &str) -> Option<&'static FieldSpec> {
    fields_of(collection).iter().find(|f| f.key == key)
}

/// Check a create/update payload against the collection schema and coerce
/// every value into its canonical shape
///
/// Null and empty-string values are kept as they are for every field (they
/// clear it). Choice labels become keys, boolean strings become booleans.
pub fn normalize_fields(collection: Collection, fields: Map<String, Value>) -> Result<Map<String, Value>> {
    let mut normalized = Map::with_capacity(fields.len());
    for (key, value) in fields {
        let spec = field_spec(collection, &key).ok_or_else(|| {
            Error::InvalidInput(format!("Unknown field '{}' for {}", key, collection.label()))
        })?;
        let is_unset = value.is_null() || value.as_str() == Some("");
        let value = if is_unset {
            value
        } else {
            FieldValue::from_json(spec.kind, &value)
                .ok_or_else(|| {
                    Error::InvalidInput(format!("Invalid value for field '{}': {}", key, value))
                })?
                .to_json()
        };
        normalized.insert(key, value);
    }
    Ok(normalized)
}

/// Schema description handed to the photo extraction service
///
/// Reference fields ask for the *name* of the target record, which the merge
/// policy later resolves to a record.
pub fn extraction_schema(collection: Collection) -> String {
    let mut lines = Vec::new();
    for spec in fields_of(collection) {
        let ty = match spec.kind {
            FieldKind::Text | FieldKind::LongText | FieldKind::FileUrl => "string".to_string(),
            FieldKind::Date => "string // YYYY-MM-DDTHH:MM".to_string(),
            FieldKind::Bool => "boolean".to_string(),
            FieldKind::Choice(options) => options
                .iter()
                .map(|o| format!("\"{}\"", o.key))
                .collect::<Vec<_>>()
                .join(" | "),
            FieldKind::MultiChoice(options) => format!(
                "Array<{}>",
                options
                    .iter()
                    .map(|o| format!("\"{}\"", o.key))
                    .collect::<Vec<_>>()
                    .join(" | ")
            ),
            FieldKind::Reference(target) => {
                format!("string // Name des {}-Eintrags", target.label())
            }
        };
        let line = match ty.split_once(" // ") {
            Some((ty, hint)) => format!("  \"{}\": {} | null, // {} // {}", spec.key, ty, hint, spec.label),
            None => format!("  \"{}\": {} | null, // {}", spec.key, ty, spec.label),
        };
        lines.push(line);
    }
    format!("{{\n{}\n}}", lines.join("\n"))
}

/// Field definitions of a collection
pub(crate) fn fields_of(collection: Collection) -> &'static [FieldSpec] {
    match collection {
        Collection::IngredientDatabase => INGREDIENT_FIELDS,
        Collection::Analysis => ANALYSIS_FIELDS,
        Collection::AnalysisResult => ANALYSIS_RESULT_FIELDS,
        Collection::QuickAnalysis => QUICK_ANALYSIS_FIELDS,
    }
}

const fn opt(key: &'static str, label: &'static str) -> ChoiceOption {
    ChoiceOption { key, label }
}

pub const KATEGORIE: &[ChoiceOption] = &[
    opt("fleisch_fisch", "Fleisch & Fisch"),
    opt("sonstiges", "Sonstiges"),
    opt("nuesse_samen", "Nüsse & Samen"),
    opt("konservierungsstoffe", "Konservierungsstoffe"),
    opt("farbstoffe", "Farbstoffe"),
    opt("aromen", "Aromen"),
    opt("gewuerze_kraeuter", "Gewürze & Kräuter"),
    opt("getreide_mehl", "Getreide & Mehl"),
    opt("zucker_suessungsmittel", "Zucker & Süßungsmittel"),
    opt("fette_oele", "Fette & Öle"),
    opt("milchprodukte", "Milchprodukte"),
    opt("fruechte_gemuese", "Früchte & Gemüse"),
    opt("eier", "Eier"),
    opt("zusatzstoffe", "Zusatzstoffe"),
];

pub const ALLERGEN_TYP: &[ChoiceOption] = &[
    opt("gluten", "Gluten"),
    opt("krebstiere", "Krebstiere"),
    opt("eier", "Eier"),
    opt("fisch", "Fisch"),
    opt("erdnuesse", "Erdnüsse"),
    opt("soja", "Soja"),
    opt("milch_laktose", "Milch/Laktose"),
    opt("schalenfruechte", "Schalenfrüchte"),
    opt("sellerie", "Sellerie"),
    opt("senf", "Senf"),
    opt("sesam", "Sesam"),
    opt("lupinen", "Lupinen"),
    opt("weichtiere", "Weichtiere"),
    opt("schwefeldioxid_sulfite", "Schwefeldioxid/Sulfite"),
];

pub const GESUNDHEITSBEWERTUNG: &[ChoiceOption] = &[
    opt("sehr_gut", "Sehr gut"),
    opt("gut", "Gut"),
    opt("neutral", "Neutral"),
    opt("bedenklich", "Bedenklich"),
    opt("schaedlich", "Schädlich"),
];

pub const GESAMTBEWERTUNG: &[ChoiceOption] = &[
    opt("sehr_empfehlenswert", "Sehr empfehlenswert"),
    opt("empfehlenswert", "Empfehlenswert"),
    opt("akzeptabel", "Akzeptabel"),
    opt("nicht_empfehlenswert", "Nicht empfehlenswert"),
    opt("bedenklich", "Bedenklich"),
];

pub const EINZELBEWERTUNG: &[ChoiceOption] = &[
    opt("allergen_vorhanden", "Allergen vorhanden"),
    opt("positiv", "Positiv"),
    opt("neutral", "Neutral"),
    opt("negativ", "Negativ"),
];

const fn field(key: &'static str, label: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { key, label, kind }
}

const INGREDIENT_FIELDS: &[FieldSpec] = &[
    field("zutat_name", "Name der Zutat", FieldKind::Text),
    field("kategorie", "Kategorie", FieldKind::Choice(KATEGORIE)),
    field("ist_allergen", "Ist Allergen", FieldKind::Bool),
    field("allergen_typ", "Allergen-Typ", FieldKind::MultiChoice(ALLERGEN_TYP)),
    field("gesundheitsbewertung", "Gesundheitsbewertung", FieldKind::Choice(GESUNDHEITSBEWERTUNG)),
    field("naehrwert_hinweise", "Nährwert-Hinweise", FieldKind::LongText),
    field("bemerkungen", "Weitere Bemerkungen", FieldKind::LongText),
];

const ANALYSIS_FIELDS: &[FieldSpec] = &[
    field("analyse_titel", "Titel der Analyse", FieldKind::Text),
    field("produktbild", "Produktbild", FieldKind::FileUrl),
    field("analysedatum", "Analysedatum und -zeit", FieldKind::Date),
    field("gesamtbewertung", "Gesamtbewertung", FieldKind::Choice(GESAMTBEWERTUNG)),
    field("allgemeine_notizen", "Allgemeine Notizen", FieldKind::LongText),
];

const ANALYSIS_RESULT_FIELDS: &[FieldSpec] = &[
    field(
        "zugehoerende_analyse",
        "Zugehörige Analyse",
        FieldKind::Reference(Collection::Analysis),
    ),
    field(
        "erkannte_zutat",
        "Erkannte Zutat",
        FieldKind::Reference(Collection::IngredientDatabase),
    ),
    field("menge_anteil", "Menge/Anteil", FieldKind::Text),
    field("einzelbewertung", "Bewertung dieser Zutat", FieldKind::Choice(EINZELBEWERTUNG)),
    field("bemerkung_zutat", "Bemerkung zu dieser Zutat", FieldKind::LongText),
];

const QUICK_ANALYSIS_FIELDS: &[FieldSpec] = &[
    field("schnell_titel", "Titel der Analyse", FieldKind::Text),
    field("schnell_bild", "Produktbild", FieldKind::FileUrl),
    field("schnell_datum", "Analysedatum und -zeit", FieldKind::Date),
    field(
        "erkannte_zutaten",
        "Erkannte Zutaten",
        FieldKind::Reference(Collection::IngredientDatabase),
    ),
    field("schnell_menge", "Menge/Anteil", FieldKind::Text),
    field(
        "schnell_gesamtbewertung",
        "Gesamtbewertung des Produkts",
        FieldKind::Choice(GESAMTBEWERTUNG),
    ),
    field("schnell_notizen", "Notizen", FieldKind::LongText),
];

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reference_fields_match_schema() {
        for collection in Collection::all() {
            for reference in collection.reference_fields() {
                let spec = field_spec(collection, reference.key).unwrap();
                assert_eq!(spec.kind, FieldKind::Reference(reference.target));
            }
        }
    }

    #[test]
    fn test_choice_accepts_key_label_and_lookup_object() {
        let kind = FieldKind::Choice(EINZELBEWERTUNG);
        let expected = Some(FieldValue::Choice("allergen_vorhanden".to_string()));
        assert_eq!(FieldValue::from_json(kind, &json!("allergen_vorhanden")), expected);
        assert_eq!(FieldValue::from_json(kind, &json!("Allergen Vorhanden")), expected);
        assert_eq!(
            FieldValue::from_json(kind, &json!({"key": "allergen_vorhanden", "label": "x"})),
            expected
        );
        assert_eq!(FieldValue::from_json(kind, &json!("lecker")), None);
        assert_eq!(FieldValue::from_json(kind, &json!(3)), None);
    }

    #[test]
    fn test_multi_choice_filters_unknown_keys() {
        let kind = FieldKind::MultiChoice(ALLERGEN_TYP);
        assert_eq!(
            FieldValue::from_json(kind, &json!(["gluten", "bogus", "Soja", "gluten"])),
            Some(FieldValue::Choices(vec!["gluten".to_string(), "soja".to_string()]))
        );
        assert_eq!(
            FieldValue::from_json(kind, &json!("sesam")),
            Some(FieldValue::Choices(vec!["sesam".to_string()]))
        );
        assert_eq!(FieldValue::from_json(kind, &json!(["bogus"])), None);
    }

    #[test]
    fn test_bool_and_null() {
        assert_eq!(
            FieldValue::from_json(FieldKind::Bool, &json!(true)),
            Some(FieldValue::Bool(true))
        );
        assert_eq!(
            FieldValue::from_json(FieldKind::Bool, &json!("False")),
            Some(FieldValue::Bool(false))
        );
        assert_eq!(FieldValue::from_json(FieldKind::Bool, &json!("ja")), None);
        assert_eq!(FieldValue::from_json(FieldKind::Text, &Value::Null), None);
    }

    #[test]
    fn test_date_formats() {
        assert!(parse_date("2025-03-01").is_some());
        assert!(parse_date("2025-03-01T12:30").is_some());
        assert!(parse_date("2025-03-01T12:30:15").is_some());
        assert!(parse_date("2025-03-01T12:30:15+01:00").is_some());
        assert!(parse_date("gestern").is_none());
        assert_eq!(FieldValue::from_json(FieldKind::Date, &json!("irgendwann")), None);
    }

    #[test]
    fn test_normalize_fields_rejects_unknown_and_malformed() {
        let ok = json!({"zutat_name": "Zucker", "ist_allergen": false, "kategorie": ""});
        let normalized = normalize_fields(Collection::IngredientDatabase, ok.as_object().cloned().unwrap()).unwrap();
        assert_eq!(Value::Object(normalized), ok);

        let unknown = json!({"farbe": "rot"});
        assert!(matches!(
            normalize_fields(Collection::IngredientDatabase, unknown.as_object().cloned().unwrap()),
            Err(Error::InvalidInput(_))
        ));

        let wrong_shape = json!({"ist_allergen": [1, 2]});
        assert!(normalize_fields(Collection::IngredientDatabase, wrong_shape.as_object().cloned().unwrap()).is_err());
    }

    #[test]
    fn test_normalize_fields_stores_canonical_values() {
        let raw = json!({
            "ist_allergen": "true",
            "kategorie": "Nüsse & Samen",
            "allergen_typ": ["Soja", "soja", "bogus"],
            "bemerkungen": null
        });
        let normalized = normalize_fields(Collection::IngredientDatabase, raw.as_object().cloned().unwrap()).unwrap();
        assert_eq!(
            Value::Object(normalized),
            json!({
                "ist_allergen": true,
                "kategorie": "nuesse_samen",
                "allergen_typ": ["soja"],
                "bemerkungen": null
            })
        );
    }

    #[test]
    fn test_extraction_schema_lists_every_field() {
        let schema = extraction_schema(Collection::AnalysisResult);
        assert!(schema.starts_with('{'));
        assert!(schema.ends_with('}'));
        for spec in Collection::AnalysisResult.schema() {
            assert!(schema.contains(&format!("\"{}\":", spec.key)));
        }
        assert!(schema.contains("Name des Analysen-Eintrags"));
        assert!(schema.contains("\"allergen_vorhanden\" | \"positiv\""));
    }
}
