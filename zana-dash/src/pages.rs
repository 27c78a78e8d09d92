//! Page controllers
//!
//! A [`CollectionPage`] owns the in-memory copy of one collection plus the
//! related collections its reference fields point into. Copies are replaced
//! wholesale on every load. After create and update the whole page is
//! reloaded; delete is the one exception and is applied to the local list
//! right away. Pages that reference a written collection are marked stale
//! and reload on their next access.

use futures::future::try_join_all;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use zana_common::enrich::{enrich, EnrichedRecord, LookupMaps};
use zana_common::merge::{merge_extraction, MergeReport, ReferenceCandidates};
use zana_common::overview::{build_overview, Overview};
use zana_common::reference::create_record_url;
use zana_common::schema::extraction_schema;
use zana_common::search::filter_records;
use zana_common::{Collection, Fields, Record};

use crate::error::{StoreError, StoreResult};
use crate::extract::{normalize_data_uri, PhotoExtractor};
use crate::store::RecordStore;

/// Load state of a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum PageStatus {
    Loading,
    Ready,
    Failed(String),
}

/// One entry of a reference select
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceOption {
    pub record_id: String,
    /// Encoded reference to store in the field
    pub reference: String,
    pub name: String,
}

/// Result of a photo scan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanOutcome {
    pub fields: Fields,
    /// False when extraction failed; `fields` is then the unchanged form
    pub scanned: bool,
    pub adopted: Vec<String>,
    pub resolved: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScanOutcome {
    fn unchanged(form: &Fields, error: String) -> Self {
        Self {
            fields: form.clone(),
            scanned: false,
            adopted: Vec::new(),
            resolved: Vec::new(),
            error: Some(error),
        }
    }

    fn merged(fields: Fields, report: MergeReport) -> Self {
        Self {
            fields,
            scanned: true,
            adopted: report.adopted,
            resolved: report.resolved,
            error: None,
        }
    }
}

/// Records of one collection and everything needed to render them
#[derive(Debug, Clone)]
pub struct CollectionPage {
    collection: Collection,
    records: Vec<Record>,
    related: HashMap<Collection, Vec<Record>>,
    status: PageStatus,
}

impl CollectionPage {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            records: Vec::new(),
            related: HashMap::new(),
            status: PageStatus::Loading,
        }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn status(&self) -> &PageStatus {
        &self.status
    }

    pub fn is_ready(&self) -> bool {
        self.status == PageStatus::Ready
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Records of a referenced collection, empty if not referenced
    pub fn related(&self, collection: Collection) -> &[Record] {
        self.related.get(&collection).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Fetch the collection and its referenced collections concurrently
    ///
    /// All or nothing: on failure no data is kept and the status carries the
    /// error.
    pub async fn load(&mut self, store: &dyn RecordStore) -> StoreResult<()> {
        self.status = PageStatus::Loading;
        let targets = self.collection.referenced_collections();

        let main = store.list(self.collection);
        let related = try_join_all(targets.iter().map(|target| store.list(*target)));
        let fetched = futures::try_join!(main, related);

        match fetched {
            Ok((records, related)) => {
                self.records = records;
                self.related = targets.into_iter().zip(related).collect();
                self.status = PageStatus::Ready;
                tracing::debug!(
                    collection = %self.collection,
                    count = self.records.len(),
                    "Page loaded"
                );
                Ok(())
            }
            Err(e) => {
                self.records.clear();
                self.related.clear();
                self.status = PageStatus::Failed(e.to_string());
                tracing::warn!(collection = %self.collection, error = %e, "Page load failed");
                Err(e)
            }
        }
    }

    /// Load unless already loaded
    pub async fn ensure_loaded(&mut self, store: &dyn RecordStore) -> StoreResult<()> {
        if self.is_ready() {
            return Ok(());
        }
        self.load(store).await
    }

    /// Keep the current copy but force a reload on next access
    ///
    /// Used when a collection this page references was written to.
    pub fn mark_stale(&mut self) {
        if self.is_ready() {
            self.status = PageStatus::Loading;
        }
    }

    /// Create a record, then reload the page
    pub async fn create(&mut self, store: &dyn RecordStore, fields: Fields) -> StoreResult<Value> {
        let created = store.create(self.collection, fields).await?;
        self.load(store).await?;
        Ok(created)
    }

    /// Update a record, then reload the page
    pub async fn update(
        &mut self,
        store: &dyn RecordStore,
        record_id: &str,
        fields: Fields,
    ) -> StoreResult<Value> {
        let updated = store.update(self.collection, record_id, fields).await?;
        self.load(store).await?;
        Ok(updated)
    }

    /// Delete a record and drop it from the local list without reloading
    pub async fn delete(&mut self, store: &dyn RecordStore, record_id: &str) -> StoreResult<()> {
        store.delete(self.collection, record_id).await?;
        self.records.retain(|r| r.record_id != record_id);
        Ok(())
    }

    fn lookup_maps(&self) -> LookupMaps<'_> {
        let mut maps = LookupMaps::new();
        for (collection, records) in &self.related {
            maps.insert(*collection, records);
        }
        maps
    }

    /// Enrich records with the related lists held by this page
    pub fn enrich(&self, records: &[Record]) -> Vec<EnrichedRecord> {
        enrich(self.collection, records, &self.lookup_maps())
    }

    /// Enriched rows matching `query`, in store order
    pub fn view(&self, query: &str) -> Vec<EnrichedRecord> {
        filter_records(self.enrich(&self.records), query)
    }

    /// Select options for a reference field, `None` for unknown fields
    pub fn options(&self, reference_key: &str) -> Option<Vec<ReferenceOption>> {
        let field = self.collection.reference_field(reference_key)?;
        let options = self
            .related(field.target)
            .iter()
            .map(|record| ReferenceOption {
                record_id: record.record_id.clone(),
                reference: create_record_url(field.target, &record.record_id),
                name: record.display(field.display_fields),
            })
            .collect();
        Some(options)
    }

    fn candidates(&self) -> HashMap<&'static str, ReferenceCandidates<'_>> {
        self.collection
            .reference_fields()
            .iter()
            .map(|field| {
                (
                    field.key,
                    ReferenceCandidates::for_field(field, self.related(field.target)),
                )
            })
            .collect()
    }

    /// Run a photo scan and merge the result into `form`
    ///
    /// Never fails: on any extraction error the form comes back unchanged.
    pub async fn scan(&self, extractor: &dyn PhotoExtractor, form: &Fields, data_uri: &str) -> ScanOutcome {
        let extracted = match normalize_data_uri(data_uri) {
            Ok(uri) => extractor.extract(&uri, &extraction_schema(self.collection)).await,
            Err(e) => Err(e),
        };

        match extracted {
            Ok(raw) => {
                let outcome = merge_extraction(self.collection, form, &raw, &self.candidates());
                tracing::info!(
                    collection = %self.collection,
                    adopted = ?outcome.report.adopted,
                    resolved = ?outcome.report.resolved,
                    skipped = ?outcome.report.skipped,
                    "Photo scan merged"
                );
                ScanOutcome::merged(outcome.fields, outcome.report)
            }
            Err(e) => {
                tracing::warn!(collection = %self.collection, error = %e, "Photo scan failed; form left unchanged");
                ScanOutcome::unchanged(form, e.to_string())
            }
        }
    }
}

/// All four collections, for the overview page
#[derive(Debug, Clone, Default)]
pub struct DashboardData {
    pub ingredients: Vec<Record>,
    pub analyses: Vec<Record>,
    pub results: Vec<Record>,
    pub quick_analyses: Vec<Record>,
}

impl DashboardData {
    /// Fetch every collection concurrently; fails as a whole
    pub async fn load(store: &dyn RecordStore) -> Result<Self, StoreError> {
        let (ingredients, analyses, results, quick_analyses) = futures::try_join!(
            store.list(Collection::IngredientDatabase),
            store.list(Collection::Analysis),
            store.list(Collection::AnalysisResult),
            store.list(Collection::QuickAnalysis),
        )?;
        Ok(Self {
            ingredients,
            analyses,
            results,
            quick_analyses,
        })
    }

    pub fn overview(&self, title_query: &str) -> Overview {
        build_overview(
            &self.ingredients,
            &self.analyses,
            &self.results,
            &self.quick_analyses,
            title_query,
        )
    }
}
