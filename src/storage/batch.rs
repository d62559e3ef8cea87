//! Bulk-write batching (spec.md §4.5): a scoped writer thread draining a
//! bounded queue, so a VCF ingest pipeline pushing thousands of puts per
//! second backs off instead of outrunning RocksDB's write path.
//!
//! Grounded on the source system's bulk-import writer pattern (a dedicated
//! writer thread fed through a bounded channel, committing in batches, the
//! caller blocking once the channel fills) as implemented throughout
//! annonars's `*::cli::import` modules.

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::error::{Error, Result};
use crate::vrs::VrsObject;

use super::WriteMode;

/// Tuning knobs for a `BatchContext`.
#[derive(Debug, Clone, Copy)]
pub struct BatchConfig {
    /// Number of pending writes queued before `put` blocks the caller.
    pub max_pending: usize,
    /// Number of writes accumulated before the writer thread commits.
    pub batch_limit: usize,
    /// How long `put` may block on a full queue before returning
    /// `Error::BackpressureTimeout`.
    pub backpressure_timeout: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_pending: 4096,
            batch_limit: 256,
            backpressure_timeout: Duration::from_secs(60),
        }
    }
}

/// The writer thread's lifecycle, observable for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Idle,
    Draining,
    Failed,
}

enum Job {
    Put(VrsObject, WriteMode),
    Flush,
}

/// A scoped batch write session over a `Storage` backend.
///
/// Dropping a `BatchContext` without calling `finish` still flushes and
/// joins the writer thread (best-effort; errors encountered during that
/// implicit flush are swallowed, matching the source's "batches are
/// fire-and-forget unless explicitly awaited" contract) — callers that
/// need to observe a late write failure must call `finish` explicitly.
pub trait BatchContext: Send {
    /// Queue a write; blocks if the backlog exceeds `max_pending`.
    fn put(&self, object: &VrsObject, mode: WriteMode) -> Result<()>;

    /// Current writer-thread state.
    fn state(&self) -> WriterState;

    /// Block until every queued write has been committed (or the writer
    /// has failed), then report the outcome.
    fn finish(self: Box<Self>) -> Result<()>;
}

/// A `BatchContext` that performs no I/O; used by `storage::NoObjectStore`.
pub struct NullBatchContext;

impl BatchContext for NullBatchContext {
    fn put(&self, _object: &VrsObject, _mode: WriteMode) -> Result<()> {
        Ok(())
    }

    fn state(&self) -> WriterState {
        WriterState::Idle
    }

    fn finish(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

/// A real batch writer: a bounded `crossbeam_channel` queue drained by a
/// dedicated writer thread that applies `commit` in chunks of up to
/// `batch_limit`.
pub struct ChannelBatchContext {
    sender: Sender<Job>,
    state: Arc<Mutex<WriterState>>,
    handle: Option<JoinHandle<Result<()>>>,
    backpressure_timeout: Duration,
}

impl ChannelBatchContext {
    /// Spawn the writer thread. `commit` is called from that thread with
    /// each accumulated chunk of `(object, mode)` pairs; it should apply
    /// them to the backend and return an error to mark the writer Failed
    /// and abort subsequent draining.
    pub fn spawn<F>(config: BatchConfig, commit: F) -> Self
    where
        F: Fn(&[(VrsObject, WriteMode)]) -> Result<()> + Send + 'static,
    {
        let (sender, receiver): (Sender<Job>, Receiver<Job>) = bounded(config.max_pending);
        let state = Arc::new(Mutex::new(WriterState::Idle));
        let writer_state = Arc::clone(&state);
        let batch_limit = config.batch_limit;

        let handle = std::thread::spawn(move || -> Result<()> {
            let mut pending: Vec<(VrsObject, WriteMode)> = Vec::with_capacity(batch_limit);
            *writer_state.lock().unwrap() = WriterState::Draining;
            for job in receiver.iter() {
                match job {
                    Job::Put(object, mode) => {
                        pending.push((object, mode));
                        if pending.len() >= batch_limit {
                            if let Err(e) = commit(&pending) {
                                *writer_state.lock().unwrap() = WriterState::Failed;
                                return Err(e);
                            }
                            pending.clear();
                        }
                    }
                    Job::Flush => {
                        if !pending.is_empty() {
                            if let Err(e) = commit(&pending) {
                                *writer_state.lock().unwrap() = WriterState::Failed;
                                return Err(e);
                            }
                            pending.clear();
                        }
                    }
                }
            }
            if !pending.is_empty() {
                if let Err(e) = commit(&pending) {
                    *writer_state.lock().unwrap() = WriterState::Failed;
                    return Err(e);
                }
            }
            *writer_state.lock().unwrap() = WriterState::Idle;
            Ok(())
        });

        Self {
            sender,
            state,
            handle: Some(handle),
            backpressure_timeout: config.backpressure_timeout,
        }
    }
}

impl Drop for ChannelBatchContext {
    fn drop(&mut self) {
        let _ = self.sender.send(Job::Flush);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl BatchContext for ChannelBatchContext {
    fn put(&self, object: &VrsObject, mode: WriteMode) -> Result<()> {
        if *self.state.lock().unwrap() == WriterState::Failed {
            return Err(Error::BatchAborted(
                "writer thread has already failed".to_string(),
            ));
        }
        self.sender
            .send_timeout(Job::Put(object.clone(), mode), self.backpressure_timeout)
            .map_err(|_| Error::BackpressureTimeout(self.backpressure_timeout))
    }

    fn state(&self) -> WriterState {
        *self.state.lock().unwrap()
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        let _ = self.sender.send(Job::Flush);
        // Dropping the sender closes the channel so the writer thread's
        // `for job in receiver.iter()` terminates once it has drained
        // everything queued ahead of this flush.
        let handle = self.handle.take();
        drop(self);
        match handle {
            Some(handle) => handle
                .join()
                .map_err(|_| Error::BatchAborted("writer thread panicked".to_string()))?,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vrs::{Allele, AlleleState, SequenceLocation, SequenceReference};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_object() -> VrsObject {
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
    fn null_batch_context_is_idle() {
        let ctx: Box<dyn BatchContext> = Box::new(NullBatchContext);
        assert_eq!(ctx.state(), WriterState::Idle);
        ctx.put(&sample_object(), WriteMode::Merge).unwrap();
    }

    #[test]
    fn channel_batch_context_commits_all_writes() {
        let committed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&committed);
        let ctx = ChannelBatchContext::spawn(
            BatchConfig {
                max_pending: 8,
                batch_limit: 3,
                backpressure_timeout: Duration::from_secs(5),
            },
            move |chunk| {
                counter.fetch_add(chunk.len(), Ordering::SeqCst);
                Ok(())
            },
        );
        for _ in 0..10 {
            ctx.put(&sample_object(), WriteMode::Merge).unwrap();
        }
        Box::new(ctx).finish().unwrap();
        assert_eq!(committed.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn channel_batch_context_surfaces_commit_failure() {
        let ctx = ChannelBatchContext::spawn(
            BatchConfig {
                max_pending: 4,
                batch_limit: 1,
                backpressure_timeout: Duration::from_secs(5),
            },
            |_chunk| Err(Error::StorageConflict("boom".to_string())),
        );
        ctx.put(&sample_object(), WriteMode::Merge).unwrap();
        let result = Box::new(ctx).finish();
        assert!(result.is_err());
    }
}
