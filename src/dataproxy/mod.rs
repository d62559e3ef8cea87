//! `DataProxy`: the reference-sequence data proxy collaborator
//! (spec.md §4.1). Out of scope as a *concrete* service (a SeqRepo-like
//! HTTP backend is a deployment detail); in scope as the trait contract
//! AnyVar and the VCF pipeline program against, plus a small local
//! implementation suitable for tests and single-node deployments.

use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Mutex;

use crate::error::{Error, Result};

/// Fetch sequence bytes and alias-to-accession mappings from a
/// reference-sequence service.
pub trait DataProxy: Send + Sync {
    /// Map a GenBank/RefSeq/assembly-chromosome alias to its refget accession.
    fn translate_sequence_identifier(&self, alias: &str) -> Result<String>;

    /// Return the substring `[start, end)` of the named accession's sequence.
    fn get_sequence(&self, accession: &str, start: u64, end: u64) -> Result<String>;
}

/// A local, in-memory `DataProxy` backed by an alias table and a sequence
/// store, with an LRU cache over alias resolution (spec.md §2.8
/// enrichment: DataProxy calls sit on the hot path of every translation
/// and every VCF row, so repeated alias lookups are cached).
pub struct LocalDataProxy {
    aliases: HashMap<String, String>,
    sequences: HashMap<String, String>,
    alias_cache: Mutex<LruCache<String, String>>,
}

impl LocalDataProxy {
    /// Create an empty proxy; aliases and sequences are registered via
    /// `with_alias`/`with_sequence` (tests) or `from_maps` (deployments
    /// seeding a fixed table).
    pub fn new() -> Self {
        Self {
            aliases: HashMap::new(),
            sequences: HashMap::new(),
            alias_cache: Mutex::new(LruCache::new(NonZeroUsize::new(4096).unwrap())),
        }
    }

    pub fn from_maps(
        aliases: HashMap<String, String>,
        sequences: HashMap<String, String>,
    ) -> Self {
        Self {
            aliases,
            sequences,
            alias_cache: Mutex::new(LruCache::new(NonZeroUsize::new(4096).unwrap())),
        }
    }

    /// Register an alias -> refget accession mapping, builder-style.
    pub fn with_alias(mut self, alias: impl Into<String>, accession: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), accession.into());
        self
    }

    /// Register a refget accession's sequence bytes, builder-style.
    pub fn with_sequence(mut self, accession: impl Into<String>, sequence: impl Into<String>) -> Self {
        self.sequences.insert(accession.into(), sequence.into());
        self
    }

    /// Load an `alias<TAB>refget_accession`, header-less TSV table into the
    /// alias map, builder-style. A deployment's chromosome/assembly alias
    /// table is naturally this shape (the same two-column convention
    /// `tsv::coding` uses for its own lookups).
    pub fn with_aliases_tsv<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_path(path)?;
        for record in reader.records() {
            let record = record?;
            let alias = record
                .get(0)
                .ok_or_else(|| Error::Translation("alias TSV row missing alias column".into()))?;
            let accession = record.get(1).ok_or_else(|| {
                Error::Translation("alias TSV row missing accession column".into())
            })?;
            self.aliases.insert(alias.to_string(), accession.to_string());
        }
        Ok(self)
    }

    /// Load a `refget_accession<TAB>sequence`, header-less TSV table into
    /// the sequence store, builder-style.
    pub fn with_sequences_tsv<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_path(path)?;
        for record in reader.records() {
            let record = record?;
            let accession = record.get(0).ok_or_else(|| {
                Error::Translation("sequence TSV row missing accession column".into())
            })?;
            let sequence = record.get(1).ok_or_else(|| {
                Error::Translation("sequence TSV row missing sequence column".into())
            })?;
            self.sequences
                .insert(accession.to_string(), sequence.to_string());
        }
        Ok(self)
    }
}

impl Default for LocalDataProxy {
    fn default() -> Self {
        Self::new()
    }
}

impl DataProxy for LocalDataProxy {
    fn translate_sequence_identifier(&self, alias: &str) -> Result<String> {
        if let Some(hit) = self.alias_cache.lock().unwrap().get(alias) {
            return Ok(hit.clone());
        }
        // An accession is already canonical if it's self-mapped.
        let resolved = self
            .aliases
            .get(alias)
            .cloned()
            .ok_or_else(|| Error::UnresolvedAlias(alias.to_string()))?;
        self.alias_cache
            .lock()
            .unwrap()
            .put(alias.to_string(), resolved.clone());
        Ok(resolved)
    }

    fn get_sequence(&self, accession: &str, start: u64, end: u64) -> Result<String> {
        let seq = self
            .sequences
            .get(accession)
            .ok_or_else(|| Error::UnknownAccession(accession.to_string()))?;
        let len = seq.len() as u64;
        if start > end || end > len {
            return Err(Error::RangeOutOfBounds(accession.to_string(), start, end));
        }
        Ok(seq[start as usize..end as usize].to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn proxy() -> LocalDataProxy {
        LocalDataProxy::new()
            .with_alias("chr1", "SQ.abc123")
            .with_alias("NC_000001.11", "SQ.abc123")
            .with_sequence("SQ.abc123", "ACGTACGTAA")
    }

    #[test]
    fn resolves_known_alias() {
        assert_eq!(
            proxy().translate_sequence_identifier("chr1").unwrap(),
            "SQ.abc123"
        );
    }

    #[test]
    fn unknown_alias_errors() {
        let err = proxy().translate_sequence_identifier("chrZZZ").unwrap_err();
        assert!(matches!(err, Error::UnresolvedAlias(_)));
    }

    #[test]
    fn sequence_range_is_half_open() {
        assert_eq!(proxy().get_sequence("SQ.abc123", 0, 4).unwrap(), "ACGT");
    }

    #[test]
    fn out_of_bounds_range_errors() {
        let err = proxy().get_sequence("SQ.abc123", 0, 100).unwrap_err();
        assert!(matches!(err, Error::RangeOutOfBounds(..)));
    }

    #[test]
    fn unknown_accession_errors() {
        let err = proxy().get_sequence("SQ.nope", 0, 1).unwrap_err();
        assert!(matches!(err, Error::UnknownAccession(_)));
    }
}
