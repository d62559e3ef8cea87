//! Storage: the persistence collaborator (spec.md §4.4). `Storage` is the
//! trait AnyVar programs against; `rocksdb_store` is the concrete
//! KV-engine-backed implementation; `NoObjectStore` is a stateless
//! implementation for deployments that only need translation, not
//! registration (spec.md §4.4's "a storage backend that discards objects
//! entirely is a valid, if degenerate, implementation").

pub mod batch;
pub mod rocksdb_store;

use crate::error::{Error, Result};
use crate::search::OverlapQuery;
use crate::vrs::annotation::Annotation;
use crate::vrs::mapping::VariationMapping;
use crate::vrs::VrsObject;

/// How a write should behave when an id already has a stored value.
///
/// Mirrors `common::cli::MergeStrategy`; kept as a distinct type here
/// because storage call sites reason about it independent of the CLI
/// surface that happens to expose it as a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Overwrite unconditionally.
    Merge,
    /// Write only if the id is not already present; otherwise a no-op.
    InsertIfAbsent,
    /// Write only if the id is not already present; otherwise an error.
    InsertStrict,
}

/// Persistence and lookup for VRS objects, mappings, and annotations, plus
/// the overlap search materialized view (spec.md §4.4, §8).
///
/// Implementations must be safe to call from multiple threads
/// concurrently; `BatchContext` methods additionally assume the
/// implementation serializes writes through its batch worker rather than
/// contending directly on the underlying engine handle.
pub trait Storage: Send + Sync {
    /// Store every decomposed part of `object`, applying `mode` to the
    /// leaf object itself (embedded sub-objects such as
    /// `SequenceReference`/`SequenceLocation` are always written with
    /// `WriteMode::InsertIfAbsent` semantics, since they are
    /// content-addressed and idempotent by construction).
    fn put_vrs(&self, object: &VrsObject, mode: WriteMode) -> Result<()>;

    /// Fetch a single object by its VRS identifier.
    fn get_vrs(&self, id: &str) -> Result<VrsObject>;

    fn put_mapping(&self, mapping: &VariationMapping) -> Result<()>;

    /// All mappings recorded for `object_id` of the given `mapping_type`,
    /// or all mappings regardless of type if `mapping_type` is `None`.
    fn get_mappings(&self, object_id: &str, mapping_type: Option<&str>)
        -> Result<Vec<VariationMapping>>;

    fn put_annotation(&self, annotation: &Annotation) -> Result<()>;

    fn get_annotations(
        &self,
        object_id: &str,
        annotation_type: Option<&str>,
    ) -> Result<Vec<Annotation>>;

    /// Allele ids whose location overlaps `query` (spec.md §8). Only
    /// `Allele` objects participate; see spec.md §9 Open Question (a).
    fn search(&self, query: &OverlapQuery) -> Result<Vec<String>>;

    /// Open a batch writer scoped to this call (spec.md §4.5). The
    /// default implementation has no batching and simply performs each
    /// `put_vrs` inline; `rocksdb_store::RocksDbStorage` overrides this
    /// with a real `BatchManager`.
    fn begin_batch(&self, config: batch::BatchConfig) -> Result<Box<dyn batch::BatchContext>>;

    /// Flush and release any resources held open by the backend.
    fn close(&self) -> Result<()>;
}

/// A `Storage` implementation that discards every write and answers every
/// read with `NotFound`; useful where only translation is needed, or in
/// tests that don't exercise persistence.
#[derive(Debug, Default)]
pub struct NoObjectStore;

impl Storage for NoObjectStore {
    fn put_vrs(&self, _object: &VrsObject, _mode: WriteMode) -> Result<()> {
        Ok(())
    }

    fn get_vrs(&self, id: &str) -> Result<VrsObject> {
        Err(Error::NotFound(id.to_string()))
    }

    fn put_mapping(&self, _mapping: &VariationMapping) -> Result<()> {
        Ok(())
    }

    fn get_mappings(
        &self,
        _object_id: &str,
        _mapping_type: Option<&str>,
    ) -> Result<Vec<VariationMapping>> {
        Ok(Vec::new())
    }

    fn put_annotation(&self, _annotation: &Annotation) -> Result<()> {
        Ok(())
    }

    fn get_annotations(
        &self,
        _object_id: &str,
        _annotation_type: Option<&str>,
    ) -> Result<Vec<Annotation>> {
        Ok(Vec::new())
    }

    fn search(&self, _query: &OverlapQuery) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn begin_batch(&self, _config: batch::BatchConfig) -> Result<Box<dyn batch::BatchContext>> {
        Ok(Box::new(batch::NullBatchContext))
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vrs::{Allele, AlleleState, SequenceLocation, SequenceReference};

    fn sample() -> VrsObject {
        VrsObject::Allele(Allele {
            location: SequenceLocation {
                sequence_reference: SequenceReference {
                    refget_accession: "SQ.abc".to_string(),
                },
                start: 1,
                end: 2,
            },
            state: AlleleState::LiteralSequenceExpression {
                sequence: "T".to_string(),
            },
        })
    }

    #[test]
    fn no_object_store_discards_writes() {
        let store = NoObjectStore;
        let obj = sample();
        store.put_vrs(&obj, WriteMode::Merge).unwrap();
        let err = store.get_vrs(&obj.id()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn no_object_store_search_is_empty() {
        let store = NoObjectStore;
        let hits = store
            .search(&OverlapQuery {
                accession: "SQ.abc".to_string(),
                start: 0,
                end: 10,
            })
            .unwrap();
        assert!(hits.is_empty());
    }
}
