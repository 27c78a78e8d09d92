//! Dashboard overview aggregation
//!
//! Key figures over all four collections, analyses filtered by title and
//! their enriched results grouped under them.

use serde::Serialize;
use std::collections::HashMap;

use crate::enrich::{enrich_analysis_results, enrich_quick_analyses, EnrichedRecord};
use crate::record::Record;
use crate::reference;
use crate::Collection;

/// Overall ratings that mark an analysis as critical
const CRITICAL_RATINGS: &[&str] = &["bedenklich", "nicht_empfehlenswert"];

/// Key figures shown at the top of the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverviewStats {
    pub analyses: usize,
    pub ingredients: usize,
    pub allergenic_ingredients: usize,
    pub critical_analyses: usize,
    pub allergen_results: usize,
    pub quick_analyses: usize,
}

/// One analysis with the results that belong to it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisGroup {
    pub analysis: Record,
    pub results: Vec<EnrichedRecord>,
}

/// Everything the overview page renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub stats: OverviewStats,
    pub analyses: Vec<AnalysisGroup>,
    pub quick_analyses: Vec<EnrichedRecord>,
}

/// Compute the key figures
pub fn stats(
    ingredients: &[Record],
    analyses: &[Record],
    results: &[Record],
    quick: &[Record],
) -> OverviewStats {
    OverviewStats {
        analyses: analyses.len(),
        ingredients: ingredients.len(),
        allergenic_ingredients: ingredients
            .iter()
            .filter(|r| r.field("ist_allergen").and_then(|v| v.as_bool()) == Some(true))
            .count(),
        critical_analyses: analyses
            .iter()
            .filter(|r| {
                r.choice_key("gesamtbewertung")
                    .is_some_and(|k| CRITICAL_RATINGS.contains(&k))
            })
            .count(),
        allergen_results: results
            .iter()
            .filter(|r| r.choice_key("einzelbewertung") == Some("allergen_vorhanden"))
            .count(),
        quick_analyses: quick.len(),
    }
}

/// Enriched results grouped by the id of their parent analysis
///
/// Results without a resolvable parent reference are left out.
pub fn results_by_analysis(results: Vec<EnrichedRecord>) -> HashMap<String, Vec<EnrichedRecord>> {
    let mut groups: HashMap<String, Vec<EnrichedRecord>> = HashMap::new();
    for result in results {
        let parent = reference::resolve_for(
            Collection::Analysis,
            result.record.text("zugehoerende_analyse"),
        )
        .map(str::to_string);
        if let Some(parent) = parent {
            groups.entry(parent).or_default().push(result);
        }
    }
    groups
}

/// Analyses whose title contains `query` (case-insensitive)
pub fn filter_analyses_by_title<'a>(analyses: &'a [Record], query: &str) -> Vec<&'a Record> {
    let needle = query.trim().to_lowercase();
    analyses
        .iter()
        .filter(|a| {
            needle.is_empty()
                || a.text("analyse_titel")
                    .unwrap_or("")
                    .to_lowercase()
                    .contains(&needle)
        })
        .collect()
}

/// Build the full overview
pub fn build_overview(
    ingredients: &[Record],
    analyses: &[Record],
    results: &[Record],
    quick: &[Record],
    title_query: &str,
) -> Overview {
    let mut grouped = results_by_analysis(enrich_analysis_results(results, analyses, ingredients));
    let groups = filter_analyses_by_title(analyses, title_query)
        .into_iter()
        .map(|analysis| AnalysisGroup {
            analysis: analysis.clone(),
            results: grouped.remove(&analysis.record_id).unwrap_or_default(),
        })
        .collect();

    Overview {
        stats: stats(ingredients, analyses, results, quick),
        analyses: groups,
        quick_analyses: enrich_quick_analyses(quick, ingredients),
    }
}
