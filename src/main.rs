use std::sync::Arc;

use anyhow::Error;
use anyvar::common;
use anyvar::dataproxy::LocalDataProxy;
use anyvar::storage::rocksdb_store::RocksDbStorage;
use anyvar::storage::{NoObjectStore, Storage, WriteMode};
use anyvar::translator::CompositeTranslator;
use anyvar::vcf;
use clap::{command, Parser, Subcommand};

/// CLI parser based on clap.
#[derive(Debug, Clone, Parser)]
#[command(
    author,
    version,
    about = "GA4GH VRS variation registration, retrieval, and bulk-VCF annotation",
    long_about = "Translate, register, retrieve, search, and bulk-annotate GA4GH VRS variation."
)]
struct Cli {
    /// Commonly used arguments
    #[command(flatten)]
    common: common::cli::Args,

    /// The sub command to run
    #[command(subcommand)]
    command: Commands,
}

/// Enum supporting the parsing of top-level commands.
#[derive(Debug, Subcommand, Clone)]
enum Commands {
    /// "run-server" command: serve the AnyVar REST API.
    #[cfg(feature = "server")]
    RunServer(anyvar::server::Args),
    /// "vcf" command: ingest one VCF file without starting the server.
    Vcf(VcfArgs),
}

/// Arguments for the `vcf` sub command: inline bulk ingestion, mirroring
/// `PUT /vcf`'s synchronous path (spec.md §4.8) but driven from the
/// command line for one-off or scripted ingestion.
#[derive(Debug, Clone, clap::Args)]
struct VcfArgs {
    /// Path to the input VCF file.
    input_path: String,
    /// Path the annotated output VCF will be written to.
    output_path: String,

    /// Storage URI: a RocksDB directory path, or empty for the stateless
    /// `NoObjectStore` backend.
    #[arg(long, default_value = "")]
    storage_uri: String,
    /// Header-less `alias<TAB>refget_accession` TSV seeding `DataProxy`'s
    /// alias table.
    #[arg(long)]
    data_proxy_aliases: Option<String>,
    /// Header-less `refget_accession<TAB>sequence` TSV seeding
    /// `DataProxy`'s sequence store.
    #[arg(long)]
    data_proxy_sequences: Option<String>,
    /// Write-conflict behavior for registered alleles.
    #[arg(long, value_enum, default_value_t = common::cli::MergeStrategy::Merge)]
    merge_strategy: common::cli::MergeStrategy,
}

fn run_vcf(_common_args: &common::cli::Args, args: &VcfArgs) -> anyhow::Result<()> {
    let mut proxy = LocalDataProxy::new();
    if let Some(path) = &args.data_proxy_aliases {
        proxy = proxy.with_aliases_tsv(path)?;
    }
    if let Some(path) = &args.data_proxy_sequences {
        proxy = proxy.with_sequences_tsv(path)?;
    }
    let translator = Arc::new(CompositeTranslator::new(proxy));

    let storage: Arc<dyn Storage> = if args.storage_uri.is_empty() {
        Arc::new(NoObjectStore)
    } else {
        Arc::new(RocksDbStorage::open(&args.storage_uri, None)?)
    };

    let mode = match args.merge_strategy {
        common::cli::MergeStrategy::Merge => WriteMode::Merge,
        common::cli::MergeStrategy::InsertNotin => WriteMode::InsertIfAbsent,
        common::cli::MergeStrategy::Insert => WriteMode::InsertStrict,
    };

    let anyvar = anyvar::anyvar::AnyVar::new(translator, storage);
    let stats = vcf::ingest(&anyvar, &args.input_path, &args.output_path, mode)?;
    tracing::info!(
        "ingested {} records, {} alleles translated, {} translation failures",
        stats.records_read,
        stats.alleles_translated,
        stats.translation_failures
    );
    anyvar.close()?;
    Ok(())
}

pub fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    let collector = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(match cli.common.verbose.log_level() {
            Some(level) => match level {
                log::Level::Error => tracing::Level::ERROR,
                log::Level::Warn => tracing::Level::WARN,
                log::Level::Info => tracing::Level::INFO,
                log::Level::Debug => tracing::Level::DEBUG,
                log::Level::Trace => tracing::Level::TRACE,
            },
            None => tracing::Level::INFO,
        })
        .compact()
        .finish();

    tracing::subscriber::with_default(collector, || {
        match &cli.command {
            #[cfg(feature = "server")]
            Commands::RunServer(args) => anyvar::server::run(&cli.common, args)?,
            Commands::Vcf(args) => run_vcf(&cli.common, args)?,
        }

        Ok::<(), Error>(())
    })?;

    tracing::info!("All done! Have a nice day.");

    Ok(())
}
