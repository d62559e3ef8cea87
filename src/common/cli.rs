//! Common CLI code.

/// Commonly used command line arguments.
#[derive(clap::Parser, Debug, Clone, Default)]
pub struct Args {
    /// Verbosity of the program.
    #[clap(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity<clap_verbosity_flag::InfoLevel>,
}

/// Merge strategy for warehouse-style backends without native unique-key
/// enforcement (spec.md §4.5).
///
/// Our RocksDB backend has a single writer thread per `BatchContext` and a
/// unique key per row, so `merge`/`insert_notin` both collapse to a
/// check-then-write; `insert` skips the check entirely for maximum
/// throughput when the caller has already deduplicated upstream.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    clap::ValueEnum,
    strum::Display,
    strum::EnumString,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// MERGE on identifier key: strongest duplicate prevention.
    #[default]
    Merge,
    /// `INSERT ... WHERE id NOT IN (target)`: tolerates concurrent writers.
    InsertNotin,
    /// Unconditional insert: maximum throughput, no duplicate prevention.
    Insert,
}

/// Initialize logging from the parsed verbosity, the way
/// `annonars::server::run` does before starting the REST server.
pub fn init_tracing(verbose: &clap_verbosity_flag::Verbosity<clap_verbosity_flag::InfoLevel>) {
    let filter = match verbose.log_level() {
        Some(log::Level::Trace | log::Level::Debug) => "debug",
        Some(_) => "info",
        None => "warn",
    };
    std::env::set_var("RUST_LOG", filter);
    let _ = tracing_subscriber::fmt::try_init();
}

/// Construct the `indicatif` style for progress bars (VCF ingest row counts).
pub fn progress_bar(len: usize) -> indicatif::ProgressBar {
    let tpl = "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] \
    {human_pos}/{human_len} ({eta})";
    let style = indicatif::ProgressStyle::with_template(tpl)
        .unwrap()
        .with_key(
            "eta",
            |state: &indicatif::ProgressState, w: &mut dyn std::fmt::Write| {
                write!(w, "{:.1}s", state.eta().as_secs_f64()).unwrap()
            },
        )
        .progress_chars("#>-");
    indicatif::ProgressBar::new(len as u64).with_style(style)
}

/// Canonical chromosome names, used by the VCF pipeline to sanity-check
/// `CHROM` values before resolving them through `DataProxy`.
///
/// Note that the mitochondrial genome runs under two names.
pub const CANONICAL: &[&str] = &[
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15", "16", "17",
    "18", "19", "20", "21", "22", "X", "Y", "M", "MT",
];

/// Return whether the given chromosome name is a canonical one.
///
/// The prefix `"chr"` is stripped from the name before checking.
pub fn is_canonical(chrom: &str) -> bool {
    let chrom = chrom.strip_prefix("chr").unwrap_or(chrom);
    CANONICAL.contains(&chrom)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn merge_strategy_default_is_merge() {
        assert_eq!(MergeStrategy::default(), MergeStrategy::Merge);
    }

    #[test]
    fn merge_strategy_kebab_case() {
        assert_eq!(MergeStrategy::InsertNotin.to_string(), "insert-notin");
    }

    #[test]
    fn canonical_chromosome_names() {
        assert!(is_canonical("chr1"));
        assert!(is_canonical("X"));
        assert!(is_canonical("chrM"));
        assert!(!is_canonical("GL000008.1"));
    }
}
