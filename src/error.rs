//! Error type definition.

use thiserror::Error;

/// Error type for `anyvar`.
#[derive(Error, Debug)]
pub enum Error {
    /// A variant definition could not be parsed or was ambiguous.
    #[error("translation error: {0}")]
    Translation(String),
    /// The nomenclature of a definition string could not be determined.
    #[error("unknown nomenclature for definition: {0}")]
    UnknownNomenclature(String),
    /// `DataProxy` could not resolve an accession alias.
    #[error("unknown accession: {0}")]
    UnknownAccession(String),
    /// `DataProxy` could not resolve an alias to an accession.
    #[error("unresolved alias: {0}")]
    UnresolvedAlias(String),
    /// A requested sequence range lies outside of the sequence.
    #[error("range out of bounds: {0}:{1}-{2}")]
    RangeOutOfBounds(String, u64, u64),
    /// `DataProxy` is transiently unavailable; caller may retry.
    #[error("data proxy unavailable: {0}")]
    Unavailable(String),
    /// Write conflicted with an existing row under a uniqueness constraint.
    ///
    /// Logically a no-op for idempotent puts; storage swallows this rather
    /// than surfacing it to callers that only ever `put` the same object.
    #[error("storage conflict for id {0}")]
    StorageConflict(String),
    /// Storage backend is transiently unavailable.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    /// A `put_vrs` call blocked on the pending-batches queue past the deadline.
    #[error("backpressure timeout after {0:?}")]
    BackpressureTimeout(std::time::Duration),
    /// A prior batch in this `BatchContext` failed; the context is poisoned.
    #[error("batch aborted: {0}")]
    BatchAborted(String),
    /// Submitting an async run with an already-active `run_id`.
    #[error("run id already in use: {0}")]
    RunIdConflict(String),
    /// Polling for a run that is unknown or has expired.
    #[error("unknown or expired run: {0}")]
    RunUnknown(String),
    /// An async run completed with an error.
    #[error("run failed: {0}")]
    RunFailed(String),
    /// Dereferencing an id that is not present in storage.
    #[error("not found: {0}")]
    NotFound(String),
    /// An overlap search query's range was malformed (`end` must be `> start`).
    #[error("bad search range: {0}")]
    BadRange(String),
    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),
    /// Problem opening or accessing RocksDB.
    #[error("RocksDB error: {0}")]
    RocksDb(#[source] rocksdb::Error),
    /// Problem (de)serializing JSON.
    #[error("JSON error: {0}")]
    Json(#[source] serde_json::Error),
    /// Problem reading or writing a VCF file.
    #[error("VCF error: {0}")]
    Vcf(String),
    /// Problem reading a CSV/TSV table (e.g. a `DataProxy` alias table).
    #[error("CSV error: {0}")]
    Csv(#[source] csv::Error),
    /// Other, unclassified error.
    #[error("{0}")]
    Other(#[source] anyhow::Error),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<rocksdb::Error> for Error {
    fn from(e: rocksdb::Error) -> Self {
        Error::RocksDb(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Other(e)
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Csv(e)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
