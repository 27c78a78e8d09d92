//! The four record collections of the ingredient-analysis app
//!
//! Every collection lives in the remote record store under a fixed app id.
//! Reference fields (lookups into another collection) are declared here, one
//! match arm per collection, so adding a collection forces a decision about
//! its enrichment rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::schema::{self, FieldSpec};
use crate::Error;

/// A record collection in the remote store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Collection {
    /// Ingredient database (Zutatendatenbank)
    #[serde(rename = "zutatendatenbank")]
    IngredientDatabase,
    /// Product analyses (Analysen)
    #[serde(rename = "analysen")]
    Analysis,
    /// Per-analysis ingredient results (Analyseergebnisse)
    #[serde(rename = "analyseergebnisse")]
    AnalysisResult,
    /// Quick analyses (Schnellanalyse)
    #[serde(rename = "schnellanalyse")]
    QuickAnalysis,
}

/// A field holding a reference into another collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceField {
    /// Field key on the referencing record
    pub key: &'static str,
    /// Collection the reference points into
    pub target: Collection,
    /// Fields of the target record joined (space separated) for display
    pub display_fields: &'static [&'static str],
}

impl ReferenceField {
    /// Name of the resolved display property, e.g. `erkannte_zutatName`
    pub fn display_key(&self) -> String {
        format!("{}Name", self.key)
    }
}

const ANALYSIS_RESULT_REFERENCES: &[ReferenceField] = &[
    ReferenceField {
        key: "zugehoerende_analyse",
        target: Collection::Analysis,
        display_fields: &["analyse_titel"],
    },
    ReferenceField {
        key: "erkannte_zutat",
        target: Collection::IngredientDatabase,
        display_fields: &["zutat_name"],
    },
];

const QUICK_ANALYSIS_REFERENCES: &[ReferenceField] = &[ReferenceField {
    key: "erkannte_zutaten",
    target: Collection::IngredientDatabase,
    display_fields: &["zutat_name"],
}];

impl Collection {
    /// All collections in dashboard order
    pub fn all() -> [Collection; 4] {
        [
            Collection::IngredientDatabase,
            Collection::Analysis,
            Collection::AnalysisResult,
            Collection::QuickAnalysis,
        ]
    }

    /// Fixed app id of this collection in the record store
    pub fn app_id(self) -> &'static str {
        match self {
            Collection::IngredientDatabase => "699c35017ca9d5e746867983",
            Collection::Analysis => "699c3506b5c37b2fe49da856",
            Collection::AnalysisResult => "699c350783673810f82e34c4",
            Collection::QuickAnalysis => "699c35083159889d7927b682",
        }
    }

    /// URL slug used by the dashboard API
    pub fn slug(self) -> &'static str {
        match self {
            Collection::IngredientDatabase => "zutatendatenbank",
            Collection::Analysis => "analysen",
            Collection::AnalysisResult => "analyseergebnisse",
            Collection::QuickAnalysis => "schnellanalyse",
        }
    }

    /// Human readable (German) label
    pub fn label(self) -> &'static str {
        match self {
            Collection::IngredientDatabase => "Zutatendatenbank",
            Collection::Analysis => "Analysen",
            Collection::AnalysisResult => "Analyseergebnisse",
            Collection::QuickAnalysis => "Schnellanalyse",
        }
    }

    pub fn from_app_id(app_id: &str) -> Option<Collection> {
        Collection::all()
            .into_iter()
            .find(|c| c.app_id().eq_ignore_ascii_case(app_id))
    }

    /// Field definitions of this collection
    pub fn schema(self) -> &'static [FieldSpec] {
        schema::fields_of(self)
    }

    /// Reference fields resolved by the enrichment engine
    pub fn reference_fields(self) -> &'static [ReferenceField] {
        match self {
            Collection::IngredientDatabase => &[],
            Collection::Analysis => &[],
            Collection::AnalysisResult => ANALYSIS_RESULT_REFERENCES,
            Collection::QuickAnalysis => QUICK_ANALYSIS_REFERENCES,
        }
    }

    /// Reference field with the given key, if this collection has one
    pub fn reference_field(self, key: &str) -> Option<&'static ReferenceField> {
        self.reference_fields().iter().find(|r| r.key == key)
    }

    /// Collections whose records this collection's references point at
    ///
    /// Deduplicated, in declaration order.
    pub fn referenced_collections(self) -> Vec<Collection> {
        let mut targets = Vec::new();
        for field in self.reference_fields() {
            if !targets.contains(&field.target) {
                targets.push(field.target);
            }
        }
        targets
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Collection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::all()
            .into_iter()
            .find(|c| c.slug() == s)
            .ok_or_else(|| Error::NotFound(format!("Unknown collection: {}", s)))
    }
}
