use std::path::PathBuf;

use clap::Parser;

/// Forensic evidence collector: walks a volume for files matching a set
/// of search terms, streams matches through a hashing/strings pipeline,
/// and archives the results under configurable byte/count limits.
#[derive(Parser, Debug)]
#[command(name = "orc-collect")]
#[command(about = "Collect matching files from a volume into a limited, indexed archive")]
pub struct Args {
    /// Output path: an archive file, or a directory when it ends in `/`.
    #[arg(long = "out", value_name = "PATH")]
    pub out: PathBuf,

    /// Adds a SampleSpec with a single SearchTerm. A leading `\` makes it
    /// a path match, otherwise a name match. Repeatable.
    #[arg(long = "sample", value_name = "NAME-OR-PATH")]
    pub sample: Vec<String>,

    /// Per-sample byte cap, applied to every spec unless it sets its own.
    #[arg(long = "max-per-sample-bytes", value_name = "N")]
    pub max_per_sample_bytes: Option<u64>,

    /// Run-wide byte cap across every collected sample.
    #[arg(long = "max-total-bytes", value_name = "N")]
    pub max_total_bytes: Option<u64>,

    /// Run-wide cap on the number of collected samples.
    #[arg(long = "max-sample-count", value_name = "N")]
    pub max_sample_count: Option<u64>,

    /// Disables every limit; every match is collected in full.
    #[arg(long = "no-limits")]
    pub no_limits: bool,

    /// `data`, `strings`, or `raw`, optionally followed by
    /// `,min=N` / `,max=N` for the strings filter's run-length bounds.
    #[arg(long = "content", value_name = "KIND[,min=N][,max=N]")]
    pub content: Option<String>,

    /// Comma-separated crypto digests: `md5,sha1,sha256`.
    #[arg(long = "hash", value_name = "CSV")]
    pub hash: Option<String>,

    /// Comma-separated fuzzy-hash algorithms: `ssdeep,tlsh`.
    #[arg(long = "fuzzy-hash", value_name = "CSV")]
    pub fuzzy_hash: Option<String>,

    /// Volume-shadow-copy inclusion policy, passed through to the walker.
    #[arg(long = "shadows", value_name = "POLICY")]
    pub shadows: Option<String>,

    /// Glob pattern excluded from matching. Repeatable.
    #[arg(long = "exclude", value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Computes digests for off-limits samples too, without archiving
    /// their bytes.
    #[arg(long = "report-all")]
    pub report_all: bool,

    /// Record-resurrection mode passed through to the walker.
    #[arg(long = "resurrect-records", value_name = "MODE")]
    pub resurrect_records: Option<String>,

    /// Rolling log file path.
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Enables debug-level console logging.
    #[arg(long = "verbose")]
    pub verbose: bool,

    /// Suppresses the console log layer (file logging, if configured, is
    /// unaffected).
    #[arg(long = "no-console")]
    pub no_console: bool,

    /// Lists the configured sets and their keywords without walking.
    #[arg(long = "keywords")]
    pub keywords: bool,
}
