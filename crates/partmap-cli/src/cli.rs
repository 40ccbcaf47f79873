//! CLI argument definitions for `partmap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "partmap",
    version,
    about = "Map source EDA component records to target library references",
    long_about = "Map component records exported from a source EDA library to target \
                  symbol, footprint and category references.\n\n\
                  Every record is resolved through cached results, wildcard rules, \
                  fuzzy catalog matching and keyword matching, with a universal \
                  fallback, and each result carries a confidence in [0, 1]."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow raw record values in trace-level logs.
    ///
    /// Part numbers and descriptions can be proprietary, so they are
    /// redacted unless this flag is set.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Map every record of a CSV or JSON export.
    Map(MapArgs),

    /// Validate a rule file and list its rules in evaluation order.
    Rules(RulesArgs),

    /// Show the similarity catalog in effect.
    Catalog(CatalogArgs),
}

#[derive(Parser)]
pub struct MapArgs {
    /// Source records (`.json` array of objects, anything else is read as CSV).
    #[arg(long = "records", value_name = "FILE")]
    pub records: PathBuf,

    /// Rule file (JSON).
    #[arg(long = "rules", value_name = "FILE")]
    pub rules: PathBuf,

    /// Settings file with optional `engine`, `catalog` and `field_names` sections.
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write mapped components here instead of stdout.
    #[arg(long = "output", short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Worker threads (default: available parallelism).
    #[arg(long = "workers", value_name = "N", value_parser = clap::value_parser!(usize))]
    pub workers: Option<usize>,

    /// Cache snapshot to seed the run from and save back afterwards.
    #[arg(long = "cache", value_name = "FILE")]
    pub cache: Option<PathBuf>,

    /// Evaluate every strategy and keep the best result instead of stopping
    /// at the first accepted one.
    #[arg(long = "speculative")]
    pub speculative: bool,

    /// Minimum confidence an intermediate strategy must reach.
    #[arg(long = "min-acceptance", value_name = "X")]
    pub min_acceptance: Option<f32>,
}

#[derive(Parser)]
pub struct RulesArgs {
    /// Rule file (JSON).
    #[arg(long = "rules", value_name = "FILE")]
    pub rules: PathBuf,
}

#[derive(Parser)]
pub struct CatalogArgs {
    /// Settings file whose `catalog` section replaces the built-in names.
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
