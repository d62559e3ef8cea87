//! Run the REST API serving AnyVar registration, retrieval, search, and
//! bulk-VCF ingestion (spec.md §6.1).

pub mod actix_server;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use crate::anyvar::AnyVar;
use crate::common;
use crate::dataproxy::LocalDataProxy;
use crate::queue::{ChannelBroker, InMemoryResultBackend};
use crate::storage::rocksdb_store::{RocksDbStorage, TableNames};
use crate::storage::{NoObjectStore, Storage};
use crate::translator::CompositeTranslator;
use crate::vcf;

/// Command line arguments for the `run-server` sub command (spec.md §6.3).
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Run the AnyVar REST API", long_about = None)]
pub struct Args {
    /// Storage URI: a RocksDB directory path, or the empty string to select
    /// the stateless `NoObjectStore` backend.
    #[arg(long, default_value = "")]
    pub storage_uri: String,
    /// Optional RocksDB write-ahead-log directory, separate from `storage_uri`.
    #[arg(long)]
    pub wal_dir: Option<String>,

    /// Header-less `alias<TAB>refget_accession` TSV seeding `DataProxy`'s
    /// alias table.
    #[arg(long)]
    pub data_proxy_aliases: Option<String>,
    /// Header-less `refget_accession<TAB>sequence` TSV seeding `DataProxy`'s
    /// sequence store.
    #[arg(long)]
    pub data_proxy_sequences: Option<String>,

    /// Rows buffered by a `BatchContext` before the writer thread commits.
    #[arg(long, default_value_t = 100_000)]
    pub batch_limit: usize,
    /// Number of pending batches queued before `put` blocks (backpressure).
    #[arg(long, default_value_t = 50)]
    pub max_pending_batches: usize,

    /// Column family name for the VRS object table (spec.md §6.4).
    #[arg(long)]
    pub table_vrs_objects: Option<String>,
    /// Column family name for variation mappings.
    #[arg(long)]
    pub table_variation_mappings: Option<String>,
    /// Column family name for annotations.
    #[arg(long)]
    pub table_annotations: Option<String>,
    /// Column family name for the overlap-search locations index.
    #[arg(long)]
    pub table_locations: Option<String>,

    /// Working directory for uploaded/annotated VCF files in async mode
    /// (required to accept `enable_async=true`, spec.md §4.9).
    #[arg(long)]
    pub async_work_dir: Option<String>,
    /// In-memory broker queue depth.
    #[arg(long, default_value_t = 64)]
    pub broker_capacity: usize,
    /// Status code returned by `GET /vcf/{run_id}` for a `FAILED` run.
    #[arg(long, default_value_t = 500)]
    pub run_failure_status_code: u16,
    /// Advisory `Retry-After` seconds on a `PENDING`/`RUNNING` poll.
    #[arg(long, default_value_t = 2)]
    pub retry_after_secs: u64,

    /// IP to listen on.
    #[arg(long, default_value = "127.0.0.1")]
    pub listen_host: String,
    /// Port to listen on.
    #[arg(long, default_value_t = 8000)]
    pub listen_port: u16,
}

fn build_data_proxy(args: &Args) -> anyhow::Result<LocalDataProxy> {
    let mut proxy = LocalDataProxy::new();
    if let Some(path) = &args.data_proxy_aliases {
        proxy = proxy.with_aliases_tsv(path)?;
    }
    if let Some(path) = &args.data_proxy_sequences {
        proxy = proxy.with_sequences_tsv(path)?;
    }
    Ok(proxy)
}

fn build_storage(args: &Args) -> anyhow::Result<Arc<dyn Storage>> {
    if args.storage_uri.is_empty() {
        tracing::info!("storage_uri is empty; running with stateless NoObjectStore");
        return Ok(Arc::new(NoObjectStore));
    }
    let names = TableNames {
        vrs_objects: args
            .table_vrs_objects
            .clone()
            .unwrap_or_else(|| TableNames::default().vrs_objects),
        variation_mappings: args
            .table_variation_mappings
            .clone()
            .unwrap_or_else(|| TableNames::default().variation_mappings),
        annotations: args
            .table_annotations
            .clone()
            .unwrap_or_else(|| TableNames::default().annotations),
        locations: args
            .table_locations
            .clone()
            .unwrap_or_else(|| TableNames::default().locations),
    };
    tracing::info!("opening RocksDB storage at {}", &args.storage_uri);
    let storage =
        RocksDbStorage::open_with_names(&args.storage_uri, args.wal_dir.as_deref(), names)?;
    Ok(Arc::new(storage))
}

/// Main entry point for the `run-server` sub command.
pub fn run(args_common: &common::cli::Args, args: &Args) -> anyhow::Result<()> {
    common::cli::init_tracing(&args_common.verbose);
    tracing::info!("args = {:?}", args);

    let data_proxy = build_data_proxy(args)?;
    let translator = Arc::new(CompositeTranslator::new(data_proxy));
    let storage = build_storage(args)?;
    let anyvar = Arc::new(AnyVar::new(translator, storage));

    let results = InMemoryResultBackend::new();
    let async_work_dir = args.async_work_dir.as_ref().map(PathBuf::from);

    let broker = async_work_dir.as_ref().map(|_| {
        let worker_anyvar = Arc::clone(&anyvar);
        let batch_config = crate::storage::batch::BatchConfig {
            batch_limit: args.batch_limit,
            max_pending: args.max_pending_batches,
            ..Default::default()
        };
        Arc::new(ChannelBroker::spawn(
            args.broker_capacity,
            results.clone(),
            move |task| run_ingest_task(&worker_anyvar, task, batch_config),
        ))
    });

    let state = actix_server::AppState {
        anyvar,
        broker,
        results,
        async_work_dir,
        run_failure_status_code: args.run_failure_status_code,
        retry_after_secs: args.retry_after_secs,
    };

    tracing::info!(
        "launching server on http://{}:{} ...",
        args.listen_host,
        args.listen_port
    );
    actix_server::main(args, actix_web::web::Data::new(state))?;

    tracing::info!("All done. Have a nice day!");
    Ok(())
}

fn run_ingest_task(
    anyvar: &AnyVar,
    task: &crate::queue::Task,
    batch_config: crate::storage::batch::BatchConfig,
) -> crate::error::Result<()> {
    vcf::ingest_with_batch_config(
        anyvar,
        &task.input_path,
        &task.output_path,
        crate::storage::WriteMode::Merge,
        batch_config,
    )
    .map(|_stats| ())
}
