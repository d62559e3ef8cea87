//! Overlap search: "which stored Alleles overlap this genomic interval"
//! (spec.md §8), answered against the composite range index
//! `storage::rocksdb_store` maintains, optionally backed by an in-memory
//! interval-tree cache refreshed on a lag budget — the in-process analogue
//! of the source system's "eventually consistent materialized view with
//! TARGET_LAG" (spec.md §8, grounded on annonars's `clinvar_sv`/`gnomad_sv`
//! query modules, which hold an `ArrayBackedIntervalTree` per chromosome
//! over data periodically rebuilt from RocksDB).

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use bio::data_structures::interval_tree::ArrayBackedIntervalTree;

/// A half-open genomic interval to search for overlapping Alleles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapQuery {
    pub accession: String,
    pub start: u64,
    pub end: u64,
}

/// One row of the materialized overlap index: an Allele id at a location.
#[derive(Debug, Clone)]
pub struct IndexedAllele {
    pub accession: String,
    pub start: u64,
    pub end: u64,
    pub allele_id: String,
}

/// An in-memory overlap cache, one interval tree per accession, rebuilt
/// wholesale no more often than `target_lag` dictates. Queries made before
/// the first refresh see an empty tree rather than blocking; callers that
/// need read-your-writes consistency should query `Storage::search`
/// directly instead of this cache.
pub struct OverlapCache {
    target_lag: Duration,
    trees: RwLock<HashMap<String, ArrayBackedIntervalTree<u64, String>>>,
    last_refresh: RwLock<Option<Instant>>,
}

impl OverlapCache {
    pub fn new(target_lag: Duration) -> Self {
        Self {
            target_lag,
            trees: RwLock::new(HashMap::new()),
            last_refresh: RwLock::new(None),
        }
    }

    /// Whether a caller should trigger `refresh` before querying, based on
    /// elapsed time since the last refresh vs. `target_lag`.
    pub fn is_stale(&self) -> bool {
        match *self.last_refresh.read().unwrap() {
            None => true,
            Some(t) => t.elapsed() >= self.target_lag,
        }
    }

    /// Replace the cache's contents wholesale from a fresh row set, e.g.
    /// the output of a full `Storage::search`-backing index scan.
    pub fn refresh(&self, rows: impl IntoIterator<Item = IndexedAllele>) {
        let mut trees: HashMap<String, ArrayBackedIntervalTree<u64, String>> = HashMap::new();
        for row in rows {
            let tree = trees
                .entry(row.accession)
                .or_insert_with(ArrayBackedIntervalTree::new);
            tree.insert(row.start..row.end, row.allele_id);
        }
        for tree in trees.values_mut() {
            tree.index();
        }
        *self.trees.write().unwrap() = trees;
        *self.last_refresh.write().unwrap() = Some(Instant::now());
    }

    pub fn query(&self, q: &OverlapQuery) -> Vec<String> {
        let trees = self.trees.read().unwrap();
        match trees.get(&q.accession) {
            Some(tree) => tree
                .find(q.start..q.end)
                .map(|entry| entry.data().clone())
                .collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cache_starts_stale() {
        let cache = OverlapCache::new(Duration::from_secs(30));
        assert!(cache.is_stale());
    }

    #[test]
    fn refresh_populates_queryable_index() {
        let cache = OverlapCache::new(Duration::from_secs(30));
        cache.refresh(vec![
            IndexedAllele {
                accession: "SQ.abc".to_string(),
                start: 100,
                end: 200,
                allele_id: "ga4gh:VA.one".to_string(),
            },
            IndexedAllele {
                accession: "SQ.abc".to_string(),
                start: 500,
                end: 600,
                allele_id: "ga4gh:VA.two".to_string(),
            },
        ]);
        assert!(!cache.is_stale());
        let hits = cache.query(&OverlapQuery {
            accession: "SQ.abc".to_string(),
            start: 150,
            end: 160,
        });
        assert_eq!(hits, vec!["ga4gh:VA.one".to_string()]);
    }

    #[test]
    fn unknown_accession_yields_no_hits() {
        let cache = OverlapCache::new(Duration::from_secs(30));
        cache.refresh(Vec::new());
        let hits = cache.query(&OverlapQuery {
            accession: "SQ.nope".to_string(),
            start: 0,
            end: 10,
        });
        assert!(hits.is_empty());
    }
}
