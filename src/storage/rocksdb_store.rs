//! `RocksDbStorage`: the concrete `Storage` implementation backing a
//! single-node AnyVar deployment (spec.md §4.4, modeling the abstract
//! "SQL storage" collaborator as a KV-engine-backed implementation, per
//! SPEC_FULL.md §2.8).
//!
//! Four column families:
//!
//! - `vrs_objects`: VRS id -> canonical JSON (`VrsObject`).
//! - `variation_mappings`: `<source_id>\0<mapping_type>\0<dest_id>` -> JSON.
//! - `annotations`: `<object_id>\0<annotation_type>\0<uuid>` -> JSON.
//! - `locations`: `<accession>\0<be(start)>\0<be(end)>\0<allele_id>` -> empty
//!   value, a composite secondary index enabling a byte-ordered range scan
//!   for overlap search, following the big-endian-encoded composite key
//!   convention the source's variant-call column families use throughout.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{ColumnFamilyDescriptor, DBWithThreadMode, MultiThreaded, Options};

use crate::common::rocks_utils::tune_options;
use crate::error::{Error, Result};
use crate::search::OverlapQuery;
use crate::vrs::annotation::Annotation;
use crate::vrs::mapping::VariationMapping;
use crate::vrs::VrsObject;

use super::batch::{BatchConfig, BatchContext, ChannelBatchContext};
use super::{Storage, WriteMode};

pub const CF_VRS_OBJECTS: &str = "vrs_objects";
pub const CF_VARIATION_MAPPINGS: &str = "variation_mappings";
pub const CF_ANNOTATIONS: &str = "annotations";
pub const CF_LOCATIONS: &str = "locations";

/// Column family (table) names, overridable per spec.md §6.3's "table
/// names (configurable per entity)" option. Defaults match the names
/// spec.md §4.5/§6.4 uses in prose.
#[derive(Debug, Clone)]
pub struct TableNames {
    pub vrs_objects: String,
    pub variation_mappings: String,
    pub annotations: String,
    pub locations: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            vrs_objects: CF_VRS_OBJECTS.to_string(),
            variation_mappings: CF_VARIATION_MAPPINGS.to_string(),
            annotations: CF_ANNOTATIONS.to_string(),
            locations: CF_LOCATIONS.to_string(),
        }
    }
}

impl TableNames {
    fn as_slice(&self) -> [&str; 4] {
        [
            self.vrs_objects.as_str(),
            self.variation_mappings.as_str(),
            self.annotations.as_str(),
            self.locations.as_str(),
        ]
    }
}

type Db = DBWithThreadMode<MultiThreaded>;

fn cf_handle<'a>(db: &'a Db, name: &str) -> &'a rocksdb::ColumnFamily {
    db.cf_handle(name)
        .unwrap_or_else(|| panic!("unknown column family: {name}"))
}

fn be_u64(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

/// Strip an optional `ga4gh:` prefix so a bare refget accession and its
/// `ga4gh:`-prefixed form key to the same row; the stored locations index
/// and every search query are normalized through this before use.
fn normalize_accession(accession: &str) -> &str {
    accession.strip_prefix("ga4gh:").unwrap_or(accession)
}

fn location_key(accession: &str, start: u64, end: u64, allele_id: &str) -> Vec<u8> {
    let accession = normalize_accession(accession);
    let mut key = Vec::with_capacity(accession.len() + 1 + 16 + 1 + allele_id.len());
    key.extend_from_slice(accession.as_bytes());
    key.push(0);
    key.extend_from_slice(&be_u64(start));
    key.extend_from_slice(&be_u64(end));
    key.push(0);
    key.extend_from_slice(allele_id.as_bytes());
    key
}

fn location_prefix(accession: &str) -> Vec<u8> {
    let accession = normalize_accession(accession);
    let mut key = accession.as_bytes().to_vec();
    key.push(0);
    key
}

fn mapping_key(source_id: &str, mapping_type: &str, dest_id: &str) -> Vec<u8> {
    format!("{source_id}\0{mapping_type}\0{dest_id}").into_bytes()
}

fn mapping_prefix(source_id: &str, mapping_type: Option<&str>) -> Vec<u8> {
    match mapping_type {
        Some(t) => format!("{source_id}\0{t}\0").into_bytes(),
        None => format!("{source_id}\0").into_bytes(),
    }
}

fn annotation_key(object_id: &str, annotation_type: &str, nonce: &str) -> Vec<u8> {
    format!("{object_id}\0{annotation_type}\0{nonce}").into_bytes()
}

fn annotation_prefix(object_id: &str, annotation_type: Option<&str>) -> Vec<u8> {
    match annotation_type {
        Some(t) => format!("{object_id}\0{t}\0").into_bytes(),
        None => format!("{object_id}\0").into_bytes(),
    }
}

/// RocksDB-backed `Storage`. Cheap to clone: internally an `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDbStorage {
    db: Arc<Db>,
    names: TableNames,
}

impl RocksDbStorage {
    /// Open (creating if absent) the database at `path`, with all column
    /// families present, using the default table names.
    pub fn open<P: AsRef<Path>>(path: P, wal_dir: Option<&str>) -> Result<Self> {
        Self::open_with_names(path, wal_dir, TableNames::default())
    }

    /// Open (creating if absent) the database at `path`, with column
    /// families named per `names` (spec.md §6.3 "table names configurable
    /// per entity").
    pub fn open_with_names<P: AsRef<Path>>(
        path: P,
        wal_dir: Option<&str>,
        names: TableNames,
    ) -> Result<Self> {
        let options = tune_options(Options::default(), wal_dir);
        let cf_descriptors: Vec<ColumnFamilyDescriptor> = names
            .as_slice()
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, options.clone()))
            .collect();
        let db = Db::open_cf_descriptors(&options, path, cf_descriptors)?;
        Ok(Self {
            db: Arc::new(db),
            names,
        })
    }

    fn put_vrs_single(&self, object: &VrsObject, mode: WriteMode) -> Result<()> {
        let cf = cf_handle(&self.db, &self.names.vrs_objects);
        let id = object.id();
        if mode != WriteMode::Merge && self.db.get_cf(cf, id.as_bytes())?.is_some() {
            return match mode {
                WriteMode::InsertIfAbsent => Ok(()),
                WriteMode::InsertStrict => Err(Error::StorageConflict(id)),
                WriteMode::Merge => unreachable!(),
            };
        }
        let bytes = serde_json::to_vec(object)?;
        self.db.put_cf(cf, id.as_bytes(), &bytes)?;

        if let VrsObject::Allele(allele) = object {
            let loc_cf = cf_handle(&self.db, &self.names.locations);
            let key = location_key(
                &allele.location.sequence_reference.refget_accession,
                allele.location.start,
                allele.location.end,
                &id,
            );
            self.db.put_cf(loc_cf, key, [])?;
        }
        Ok(())
    }
}

impl Storage for RocksDbStorage {
    fn put_vrs(&self, object: &VrsObject, mode: WriteMode) -> Result<()> {
        for part in object.decompose() {
            let is_leaf = part.id() == object.id();
            let effective_mode = if is_leaf {
                mode
            } else {
                // Embedded sub-objects are content-addressed and therefore
                // idempotent; writing them unconditionally is always safe,
                // so treat them as insert-if-absent regardless of the
                // caller's requested mode for the leaf.
                WriteMode::InsertIfAbsent
            };
            self.put_vrs_single(&part, effective_mode)?;
        }
        Ok(())
    }

    fn get_vrs(&self, id: &str) -> Result<VrsObject> {
        let cf = cf_handle(&self.db, &self.names.vrs_objects);
        let bytes = self
            .db
            .get_cf(cf, id.as_bytes())?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn put_mapping(&self, mapping: &VariationMapping) -> Result<()> {
        let cf = cf_handle(&self.db, &self.names.variation_mappings);
        let key = mapping_key(&mapping.source_id, &mapping.mapping_type, &mapping.dest_id);
        let bytes = serde_json::to_vec(mapping)?;
        self.db.put_cf(cf, key, bytes)?;
        Ok(())
    }

    fn get_mappings(
        &self,
        object_id: &str,
        mapping_type: Option<&str>,
    ) -> Result<Vec<VariationMapping>> {
        let cf = cf_handle(&self.db, &self.names.variation_mappings);
        let prefix = mapping_prefix(object_id, mapping_type);
        let mut out = Vec::new();
        let iter = self
            .db
            .prefix_iterator_cf(cf, &prefix)
            .take_while(|item| matches!(item, Ok((k, _)) if k.starts_with(&prefix)));
        for item in iter {
            let (_, value) = item?;
            out.push(serde_json::from_slice(&value)?);
        }
        Ok(out)
    }

    fn put_annotation(&self, annotation: &Annotation) -> Result<()> {
        let cf = cf_handle(&self.db, &self.names.annotations);
        let nonce = uuid::Uuid::new_v4().to_string();
        let key = annotation_key(&annotation.object_id, &annotation.annotation_type, &nonce);
        let bytes = serde_json::to_vec(annotation)?;
        self.db.put_cf(cf, key, bytes)?;
        Ok(())
    }

    fn get_annotations(
        &self,
        object_id: &str,
        annotation_type: Option<&str>,
    ) -> Result<Vec<Annotation>> {
        let cf = cf_handle(&self.db, &self.names.annotations);
        let prefix = annotation_prefix(object_id, annotation_type);
        let mut out = Vec::new();
        let iter = self
            .db
            .prefix_iterator_cf(cf, &prefix)
            .take_while(|item| matches!(item, Ok((k, _)) if k.starts_with(&prefix)));
        for item in iter {
            let (_, value) = item?;
            out.push(serde_json::from_slice(&value)?);
        }
        Ok(out)
    }

    fn search(&self, query: &OverlapQuery) -> Result<Vec<String>> {
        let accession = normalize_accession(&query.accession);
        let cf = cf_handle(&self.db, &self.names.locations);
        let prefix = location_prefix(accession);
        let mut hits = Vec::new();
        let iter = self
            .db
            .prefix_iterator_cf(cf, &prefix)
            .take_while(|item| matches!(item, Ok((k, _)) if k.starts_with(&prefix)));
        for item in iter {
            let (key, _) = item?;
            let (start, end, allele_id) = decode_location_key(&key, accession)?;
            if start < query.end && end > query.start {
                hits.push(allele_id);
            }
        }
        Ok(hits)
    }

    fn begin_batch(&self, config: BatchConfig) -> Result<Box<dyn BatchContext>> {
        let store = self.clone();
        Ok(Box::new(ChannelBatchContext::spawn(config, move |chunk| {
            for (object, mode) in chunk {
                store.put_vrs(object, *mode)?;
            }
            Ok(())
        })))
    }

    fn close(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

fn decode_location_key(key: &[u8], accession: &str) -> Result<(u64, u64, String)> {
    let rest = &key[accession.len() + 1..];
    if rest.len() < 17 {
        return Err(Error::Other(anyhow::anyhow!(
            "malformed location index key"
        )));
    }
    let start = u64::from_be_bytes(rest[0..8].try_into().unwrap());
    let end = u64::from_be_bytes(rest[8..16].try_into().unwrap());
    let allele_id = String::from_utf8_lossy(&rest[17..]).to_string();
    Ok((start, end, allele_id))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vrs::{Allele, AlleleState, SequenceLocation, SequenceReference};
    use crate::storage::WriteMode;

    fn sample_allele(start: u64, end: u64) -> VrsObject {
        VrsObject::Allele(Allele {
            location: SequenceLocation {
                sequence_reference: SequenceReference {
                    refget_accession: "SQ.abc".to_string(),
                },
                start,
                end,
            },
            state: AlleleState::LiteralSequenceExpression {
                sequence: "T".to_string(),
            },
        })
    }

    fn open_tmp() -> (RocksDbStorage, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = RocksDbStorage::open(dir.path(), None).unwrap();
        (store, dir)
    }

    #[test]
    fn put_then_get_round_trips() {
        let (store, _dir) = open_tmp();
        let obj = sample_allele(10, 11);
        store.put_vrs(&obj, WriteMode::Merge).unwrap();
        let fetched = store.get_vrs(&obj.id()).unwrap();
        assert_eq!(fetched.id(), obj.id());
    }

    #[test]
    fn insert_strict_rejects_duplicate_leaf() {
        let (store, _dir) = open_tmp();
        let obj = sample_allele(10, 11);
        store.put_vrs(&obj, WriteMode::InsertStrict).unwrap();
        let err = store.put_vrs(&obj, WriteMode::InsertStrict).unwrap_err();
        assert!(matches!(err, Error::StorageConflict(_)));
    }

    #[test]
    fn insert_if_absent_is_idempotent() {
        let (store, _dir) = open_tmp();
        let obj = sample_allele(10, 11);
        store.put_vrs(&obj, WriteMode::InsertIfAbsent).unwrap();
        store.put_vrs(&obj, WriteMode::InsertIfAbsent).unwrap();
    }

    #[test]
    fn search_finds_overlapping_allele_only() {
        let (store, _dir) = open_tmp();
        let inside = sample_allele(100, 200);
        let outside = sample_allele(500, 600);
        store.put_vrs(&inside, WriteMode::Merge).unwrap();
        store.put_vrs(&outside, WriteMode::Merge).unwrap();

        let hits = store
            .search(&OverlapQuery {
                accession: "SQ.abc".to_string(),
                start: 150,
                end: 160,
            })
            .unwrap();
        assert_eq!(hits, vec![inside.id()]);
    }

    #[test]
    fn search_accepts_a_ga4gh_prefixed_accession() {
        let (store, _dir) = open_tmp();
        let allele = sample_allele(100, 200);
        store.put_vrs(&allele, WriteMode::Merge).unwrap();

        let hits = store
            .search(&OverlapQuery {
                accession: "ga4gh:SQ.abc".to_string(),
                start: 150,
                end: 160,
            })
            .unwrap();
        assert_eq!(hits, vec![allele.id()]);
    }

    #[test]
    fn mappings_and_annotations_round_trip() {
        let (store, _dir) = open_tmp();
        let mapping = VariationMapping::new("ga4gh:VA.a", "ga4gh:VA.b", "splits_to");
        store.put_mapping(&mapping).unwrap();
        let fetched = store.get_mappings("ga4gh:VA.a", None).unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].dest_id, "ga4gh:VA.b");

        let annotation = Annotation::new("ga4gh:VA.a", "clinical_significance", serde_json::json!("pathogenic"));
        store.put_annotation(&annotation).unwrap();
        let annotations = store.get_annotations("ga4gh:VA.a", Some("clinical_significance")).unwrap();
        assert_eq!(annotations.len(), 1);
    }
}
