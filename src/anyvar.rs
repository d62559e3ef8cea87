//! `AnyVar`: the façade that wires `Translator`, `Storage`, and
//! `DataProxy` together into the operations spec.md §4 exposes as a
//! single cohesive API, independent of whatever transport (HTTP, CLI,
//! the VCF pipeline) drives it.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::search::OverlapQuery;
use crate::storage::batch::{BatchConfig, BatchContext};
use crate::storage::{Storage, WriteMode};
use crate::translator::Translator;
use crate::vrs::annotation::Annotation;
use crate::vrs::mapping::VariationMapping;
use crate::vrs::VrsObject;

/// The registration/retrieval/search engine (spec.md §4.3).
pub struct AnyVar {
    translator: Arc<dyn Translator>,
    storage: Arc<dyn Storage>,
}

impl AnyVar {
    pub fn new(translator: Arc<dyn Translator>, storage: Arc<dyn Storage>) -> Self {
        Self { translator, storage }
    }

    /// Translate `definition` and register the resulting object,
    /// returning its VRS id.
    pub fn put_variation(&self, definition: &str, mode: WriteMode) -> Result<String> {
        let allele = self.translator.translate(definition)?;
        let object = VrsObject::Allele(allele);
        let id = object.id();
        self.storage.put_vrs(&object, mode)?;
        Ok(id)
    }

    /// Register an already-constructed object (e.g. a CopyNumberChange a
    /// caller built directly, bypassing translation).
    pub fn put_object(&self, object: &VrsObject, mode: WriteMode) -> Result<String> {
        self.storage.put_vrs(object, mode)?;
        Ok(object.id())
    }

    /// Like `put_variation`, but queues the resulting `Allele` through an
    /// already-open `BatchContext` instead of writing to storage inline.
    /// Translation still happens synchronously, so a malformed definition
    /// is reported to the caller before anything reaches the writer queue.
    pub fn put_variation_via_batch(
        &self,
        definition: &str,
        batch: &dyn BatchContext,
        mode: WriteMode,
    ) -> Result<String> {
        let allele = self.translator.translate(definition)?;
        let object = VrsObject::Allele(allele);
        let id = object.id();
        batch.put(&object, mode)?;
        Ok(id)
    }

    pub fn get_object(&self, id: &str) -> Result<VrsObject> {
        self.storage.get_vrs(id)
    }

    pub fn put_mapping(&self, source_id: &str, dest_id: &str, mapping_type: &str) -> Result<()> {
        self.storage
            .put_mapping(&VariationMapping::new(source_id, dest_id, mapping_type))
    }

    pub fn get_object_mappings(
        &self,
        object_id: &str,
        mapping_type: Option<&str>,
    ) -> Result<Vec<VariationMapping>> {
        self.storage.get_mappings(object_id, mapping_type)
    }

    pub fn put_annotation(
        &self,
        object_id: &str,
        annotation_type: &str,
        value: serde_json::Value,
    ) -> Result<()> {
        self.storage
            .put_annotation(&Annotation::new(object_id, annotation_type, value))
    }

    pub fn get_object_annotations(
        &self,
        object_id: &str,
        annotation_type: Option<&str>,
    ) -> Result<Vec<Annotation>> {
        self.storage.get_annotations(object_id, annotation_type)
    }

    /// Allele ids overlapping `query` (spec.md §4.7). `end` must be
    /// strictly greater than `start`, per spec.md §6.1's `400 bad range`.
    pub fn search_variation_ids(&self, query: &OverlapQuery) -> Result<Vec<String>> {
        if query.end <= query.start {
            return Err(Error::BadRange(format!(
                "end ({}) must be greater than start ({})",
                query.end, query.start
            )));
        }
        self.storage.search(query)
    }

    /// Like `search_variation_ids`, but dereferences each hit into its
    /// full VRS object, matching spec.md §6.1's `GET /search` response
    /// shape (`{variations: [...]}`).
    pub fn search_variations(&self, query: &OverlapQuery) -> Result<Vec<VrsObject>> {
        self.search_variation_ids(query)?
            .into_iter()
            .map(|id| self.get_object(&id))
            .collect()
    }

    /// Open a scoped batch writer for bulk registration (spec.md §4.5),
    /// used by the VCF ingest pipeline.
    pub fn batch_context(&self, config: BatchConfig) -> Result<Box<dyn BatchContext>> {
        self.storage.begin_batch(config)
    }

    pub fn close(&self) -> Result<()> {
        self.storage.close()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dataproxy::LocalDataProxy;
    use crate::storage::NoObjectStore;
    use crate::translator::CompositeTranslator;

    fn anyvar() -> AnyVar {
        let proxy = LocalDataProxy::new()
            .with_alias("NC_000007.14", "SQ.chr7")
            .with_sequence("SQ.chr7", "ACGTACGTAAGGTT");
        AnyVar::new(
            Arc::new(CompositeTranslator::new(proxy)),
            Arc::new(NoObjectStore),
        )
    }

    #[test]
    fn put_variation_returns_a_vrs_id() {
        let av = anyvar();
        let id = av
            .put_variation("NC_000007.14:1:A:T", WriteMode::Merge)
            .unwrap();
        assert!(id.starts_with("ga4gh:VA."));
    }

    #[test]
    fn get_object_on_discarding_store_is_not_found() {
        let av = anyvar();
        let id = av
            .put_variation("NC_000007.14:1:A:T", WriteMode::Merge)
            .unwrap();
        assert!(av.get_object(&id).is_err());
    }

    #[test]
    fn put_variation_via_batch_queues_through_the_batch_context() {
        let av = anyvar();
        let batch = av.batch_context(BatchConfig::default()).unwrap();
        let id = av
            .put_variation_via_batch("NC_000007.14:1:A:T", batch.as_ref(), WriteMode::Merge)
            .unwrap();
        assert!(id.starts_with("ga4gh:VA."));
        batch.finish().unwrap();
    }
}
