//! Records as returned by the remote record store

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Untyped field map of a record or form
pub type Fields = Map<String, Value>;

/// One record of a collection
///
/// Immutable once fetched; pages replace their copies wholesale on refetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub record_id: String,
    /// Creation timestamp as sent by the store, `None` when absent or null
    #[serde(rename = "createdat", default)]
    pub created_at: Option<String>,
    #[serde(rename = "updatedat", default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub fields: Fields,
}

/// Record body without its id, as found in the list response
#[derive(Debug, Deserialize)]
struct RecordBody {
    #[serde(rename = "createdat", default)]
    created_at: Option<String>,
    #[serde(rename = "updatedat", default)]
    updated_at: Option<String>,
    #[serde(default)]
    fields: Option<Fields>,
}

impl Record {
    pub fn new(record_id: impl Into<String>, fields: Fields) -> Self {
        Self {
            record_id: record_id.into(),
            created_at: None,
            updated_at: None,
            fields,
        }
    }

    /// Parse a single-record response; the store names the id `id`
    pub fn from_single(body: Value) -> Result<Self> {
        let id = body
            .get("id")
            .or_else(|| body.get("record_id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::InvalidInput("Record response without id".to_string()))?;
        let parsed: RecordBody = serde_json::from_value(body)?;
        Ok(parsed.into_record(id))
    }

    /// Raw value of a field, `None` when unset
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    /// String value of a field, `None` when unset or not a string
    pub fn text(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(Value::as_str)
    }

    /// Key of a choice field, accepting both plain keys and lookup objects
    pub fn choice_key(&self, key: &str) -> Option<&str> {
        match self.field(key)? {
            Value::String(s) => Some(s.as_str()),
            Value::Object(obj) => obj.get("key").and_then(Value::as_str),
            _ => None,
        }
    }

    /// Joined, trimmed display text of the given fields
    pub fn display(&self, fields: &[&str]) -> String {
        fields
            .iter()
            .map(|f| self.field(f).map(display_text).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }
}

impl RecordBody {
    fn into_record(self, record_id: String) -> Record {
        Record {
            record_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            fields: self.fields.unwrap_or_default(),
        }
    }
}

/// Flatten the store's `record_id -> body` map into a list
///
/// Order of the response is preserved (serde_json keeps insertion order).
pub fn flatten_record_map(map: Value) -> Result<Vec<Record>> {
    let map = match map {
        Value::Object(map) => map,
        Value::Null => return Ok(Vec::new()),
        other => {
            return Err(Error::InvalidInput(format!(
                "Expected record map, got {}",
                json_type(&other)
            )))
        }
    };
    map.into_iter()
        .map(|(id, body)| {
            let body: RecordBody = serde_json::from_value(body)?;
            Ok(body.into_record(id))
        })
        .collect()
}

/// Display form of an untyped value; unset coerces to ""
pub fn display_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(display_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(obj) => obj
            .get("label")
            .or_else(|| obj.get("key"))
            .map(display_text)
            .unwrap_or_default(),
    }
}

/// True for null, missing and empty-string values
pub fn is_unset(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
