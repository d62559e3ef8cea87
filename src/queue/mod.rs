//! Async job queue (spec.md §4.9): `run_id`-addressed bulk-VCF work,
//! dispatched through a `Broker` to a worker pool and polled through a
//! `ResultBackend`.
//!
//! A production deployment's broker/result-backend pair (Redis, SQS, a
//! database table) is a swappable external collaborator; this module
//! defines the trait seam plus an in-memory implementation — a bounded
//! `crossbeam_channel` as the broker and a `dashmap` as the result
//! backend — adequate for a single-process deployment and for tests,
//! grounded on the same bounded-channel-plus-worker-thread shape as
//! `storage::batch`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender};
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{Error, Result};

/// A Run's lifecycle state (spec.md §3, §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Expired,
}

/// An async VCF ingestion job.
#[derive(Debug, Clone)]
pub struct Run {
    pub run_id: String,
    pub status: RunStatus,
    pub input_path: String,
    pub output_path: String,
    pub error_message: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub ttl_expires_at: DateTime<Utc>,
}

impl Run {
    pub fn new(run_id: String, input_path: String, output_path: String, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            status: RunStatus::Pending,
            input_path,
            output_path,
            error_message: None,
            submitted_at: now,
            completed_at: None,
            ttl_expires_at: now + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::hours(24)),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.ttl_expires_at
    }
}

/// A queued unit of work: translate a (run_id, input_path, output_path)
/// triple into a completed or failed Run.
#[derive(Debug, Clone)]
pub struct Task {
    pub run_id: String,
    pub input_path: String,
    pub output_path: String,
}

/// Enqueues tasks for worker consumption. Acknowledgement is late — a
/// `Broker` does not know a task succeeded until `ResultBackend` records
/// it — so a crashed worker's un-acked task should be redelivered by a
/// production broker; the in-memory implementation here has no
/// redelivery (a lost in-process worker loses the queue entirely, which
/// is an acceptable degenerate behavior for a single-process deployment).
pub trait Broker: Send + Sync {
    fn submit(&self, task: Task) -> Result<()>;
}

/// Records and answers queries about Run state.
pub trait ResultBackend: Send + Sync {
    fn create(&self, run: Run) -> Result<()>;
    fn get(&self, run_id: &str) -> Option<Run>;
    fn mark_running(&self, run_id: &str) -> Result<()>;
    fn mark_completed(&self, run_id: &str) -> Result<()>;
    fn mark_failed(&self, run_id: &str, error_message: String) -> Result<()>;
}

/// A `dashmap`-backed in-memory `ResultBackend`. Lazily marks entries
/// `Expired` on read once past `ttl_expires_at`, matching spec.md §4.9's
/// state machine note ("any terminal state plus `t > ttl_expires_at` ->
/// EXPIRED"); does not purge the row, since purging is a cleanup sweep
/// concern, not a read-path one.
#[derive(Clone, Default)]
pub struct InMemoryResultBackend {
    runs: Arc<DashMap<String, Run>>,
}

impl InMemoryResultBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultBackend for InMemoryResultBackend {
    fn create(&self, run: Run) -> Result<()> {
        if self.runs.contains_key(&run.run_id) {
            return Err(Error::RunIdConflict(run.run_id));
        }
        self.runs.insert(run.run_id.clone(), run);
        Ok(())
    }

    fn get(&self, run_id: &str) -> Option<Run> {
        let mut entry = self.runs.get_mut(run_id)?;
        if matches!(
            entry.status,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Pending | RunStatus::Running
        ) && entry.is_expired_at(Utc::now())
        {
            entry.status = RunStatus::Expired;
        }
        Some(entry.clone())
    }

    fn mark_running(&self, run_id: &str) -> Result<()> {
        let mut entry = self
            .runs
            .get_mut(run_id)
            .ok_or_else(|| Error::RunUnknown(run_id.to_string()))?;
        entry.status = RunStatus::Running;
        Ok(())
    }

    fn mark_completed(&self, run_id: &str) -> Result<()> {
        let mut entry = self
            .runs
            .get_mut(run_id)
            .ok_or_else(|| Error::RunUnknown(run_id.to_string()))?;
        entry.status = RunStatus::Completed;
        entry.completed_at = Some(Utc::now());
        Ok(())
    }

    fn mark_failed(&self, run_id: &str, error_message: String) -> Result<()> {
        let mut entry = self
            .runs
            .get_mut(run_id)
            .ok_or_else(|| Error::RunUnknown(run_id.to_string()))?;
        entry.status = RunStatus::Failed;
        entry.error_message = Some(error_message);
        entry.completed_at = Some(Utc::now());
        Ok(())
    }
}

/// A bounded in-process channel `Broker`, paired with a single worker
/// thread consuming one task at a time (prefetch multiplier 1, spec.md
/// §4.9's concurrency contract).
pub struct ChannelBroker {
    sender: Sender<Task>,
}

impl ChannelBroker {
    /// Spawn the worker thread. `process` runs the §4.8 ingest pipeline
    /// for one task; the worker marks the Run `Running` before calling it
    /// and `Completed`/`Failed` after, per the state machine.
    pub fn spawn<F>(capacity: usize, results: InMemoryResultBackend, process: F) -> Self
    where
        F: Fn(&Task) -> Result<()> + Send + 'static,
    {
        let (sender, receiver): (Sender<Task>, Receiver<Task>) = bounded(capacity);
        std::thread::spawn(move || {
            for task in receiver.iter() {
                if results.mark_running(&task.run_id).is_err() {
                    continue;
                }
                match process(&task) {
                    Ok(()) => {
                        let _ = results.mark_completed(&task.run_id);
                    }
                    Err(e) => {
                        let _ = results.mark_failed(&task.run_id, e.to_string());
                    }
                }
            }
        });
        Self { sender }
    }
}

impl Broker for ChannelBroker {
    fn submit(&self, task: Task) -> Result<()> {
        self.sender
            .send(task)
            .map_err(|_| Error::Other(anyhow::anyhow!("broker worker has shut down")))
    }
}

/// Default TTL for a submitted Run (spec.md §5 Open Question b: the
/// source leaves TTL deployment-configurable with no stated default; we
/// pick 24 hours, generous enough for a client to retry fetching a large
/// completed file without expiring mid-investigation).
pub const DEFAULT_RUN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Generate a fresh run id when the client did not supply one.
pub fn generate_run_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn duplicate_run_id_is_rejected() {
        let backend = InMemoryResultBackend::new();
        let run = Run::new(
            "fixed-id".to_string(),
            "in.vcf".to_string(),
            "out.vcf".to_string(),
            DEFAULT_RUN_TTL,
        );
        backend.create(run.clone()).unwrap();
        let err = backend.create(run).unwrap_err();
        assert!(matches!(err, Error::RunIdConflict(_)));
    }

    #[test]
    fn unknown_run_is_none() {
        let backend = InMemoryResultBackend::new();
        assert!(backend.get("nope").is_none());
    }

    #[test]
    fn run_transitions_through_lifecycle() {
        let backend = InMemoryResultBackend::new();
        let run = Run::new(
            "r1".to_string(),
            "in.vcf".to_string(),
            "out.vcf".to_string(),
            DEFAULT_RUN_TTL,
        );
        backend.create(run).unwrap();
        assert_eq!(backend.get("r1").unwrap().status, RunStatus::Pending);
        backend.mark_running("r1").unwrap();
        assert_eq!(backend.get("r1").unwrap().status, RunStatus::Running);
        backend.mark_completed("r1").unwrap();
        assert_eq!(backend.get("r1").unwrap().status, RunStatus::Completed);
    }

    #[test]
    fn failed_run_carries_error_message() {
        let backend = InMemoryResultBackend::new();
        let run = Run::new(
            "r2".to_string(),
            "in.vcf".to_string(),
            "out.vcf".to_string(),
            DEFAULT_RUN_TTL,
        );
        backend.create(run).unwrap();
        backend.mark_running("r2").unwrap();
        backend.mark_failed("r2", "boom".to_string()).unwrap();
        let fetched = backend.get("r2").unwrap();
        assert_eq!(fetched.status, RunStatus::Failed);
        assert_eq!(fetched.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn expired_run_reports_expired_on_read() {
        let backend = InMemoryResultBackend::new();
        let run = Run::new(
            "r3".to_string(),
            "in.vcf".to_string(),
            "out.vcf".to_string(),
            Duration::from_secs(0),
        );
        backend.create(run).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(backend.get("r3").unwrap().status, RunStatus::Expired);
    }

    #[test]
    fn channel_broker_runs_tasks_to_completion() {
        let backend = InMemoryResultBackend::new();
        let run = Run::new(
            "r4".to_string(),
            "in.vcf".to_string(),
            "out.vcf".to_string(),
            DEFAULT_RUN_TTL,
        );
        backend.create(run).unwrap();
        let broker = ChannelBroker::spawn(4, backend.clone(), |_task| Ok(()));
        broker
            .submit(Task {
                run_id: "r4".to_string(),
                input_path: "in.vcf".to_string(),
                output_path: "out.vcf".to_string(),
            })
            .unwrap();
        // Give the worker thread a moment to drain the single task.
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(backend.get("r4").unwrap().status, RunStatus::Completed);
    }
}
