//! End-to-end async bulk-VCF ingestion through the job queue (spec.md
//! §4.9): submit a `Task` to a `ChannelBroker`, poll the
//! `InMemoryResultBackend` until the run reaches a terminal state.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyvar::anyvar::AnyVar;
use anyvar::dataproxy::LocalDataProxy;
use anyvar::queue::{Broker, ChannelBroker, InMemoryResultBackend, Run, RunStatus, Task, DEFAULT_RUN_TTL};
use anyvar::storage::NoObjectStore;
use anyvar::storage::WriteMode;
use anyvar::translator::CompositeTranslator;
use anyvar::vcf;

fn sample_vcf(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "##fileformat=VCFv4.3").unwrap();
    writeln!(file, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO").unwrap();
    writeln!(file, "1\t2\t.\tC\tT\t.\t.\t.").unwrap();
    path
}

fn poll_until_terminal(backend: &InMemoryResultBackend, run_id: &str) -> RunStatus {
    for _ in 0..200 {
        let run = backend.get(run_id).expect("run must still be tracked");
        if matches!(
            run.status,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Expired
        ) {
            return run.status;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("run {run_id} did not reach a terminal state in time");
}

#[test]
fn submitted_run_completes_and_annotates_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = sample_vcf(&dir, "in.vcf");
    let output = dir.path().join("out.vcf");

    let proxy = LocalDataProxy::new()
        .with_alias("1", "SQ.chr1")
        .with_sequence("SQ.chr1", "ACGTACGTAAGGTT");
    let anyvar = Arc::new(AnyVar::new(
        Arc::new(CompositeTranslator::new(proxy)),
        Arc::new(NoObjectStore),
    ));

    let results = InMemoryResultBackend::new();
    let worker_anyvar = Arc::clone(&anyvar);
    let broker = ChannelBroker::spawn(4, results.clone(), move |task: &Task| {
        vcf::ingest(
            &worker_anyvar,
            &task.input_path,
            &task.output_path,
            WriteMode::Merge,
        )
        .map(|_stats| ())
    });

    let run_id = "test-run-1".to_string();
    let run = Run::new(
        run_id.clone(),
        input.to_string_lossy().to_string(),
        output.to_string_lossy().to_string(),
        DEFAULT_RUN_TTL,
    );
    results.create(run).unwrap();
    broker
        .submit(Task {
            run_id: run_id.clone(),
            input_path: input.to_string_lossy().to_string(),
            output_path: output.to_string_lossy().to_string(),
        })
        .unwrap();

    let status = poll_until_terminal(&results, &run_id);
    assert_eq!(status, RunStatus::Completed);
    assert!(output.exists());
    let contents = std::fs::read_to_string(&output).unwrap();
    assert!(contents.contains("VRS_Allele_IDs"));
}

#[test]
fn a_failing_task_marks_the_run_failed_with_message() {
    let results = InMemoryResultBackend::new();
    let broker = ChannelBroker::spawn(4, results.clone(), |_task: &Task| {
        Err(anyvar::Error::Vcf("boom".to_string()))
    });

    let run_id = "test-run-2".to_string();
    let run = Run::new(
        run_id.clone(),
        "in.vcf".to_string(),
        "out.vcf".to_string(),
        DEFAULT_RUN_TTL,
    );
    results.create(run).unwrap();
    broker
        .submit(Task {
            run_id: run_id.clone(),
            input_path: "in.vcf".to_string(),
            output_path: "out.vcf".to_string(),
        })
        .unwrap();

    let status = poll_until_terminal(&results, &run_id);
    assert_eq!(status, RunStatus::Failed);
    let run = results.get(&run_id).unwrap();
    assert!(run.error_message.unwrap().contains("boom"));
}
