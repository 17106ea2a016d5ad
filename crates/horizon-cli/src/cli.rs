use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Multi-horizon energy network compiler", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a case into a linear program, solve it and report the outcome
    Solve {
        /// JSON case file
        #[arg(value_hint = ValueHint::FilePath)]
        case: PathBuf,

        /// TOML file with solve options
        #[arg(long, value_hint = ValueHint::FilePath)]
        options: Option<PathBuf>,

        /// Gate assets by lifecycle and weight costs by period
        #[arg(long)]
        multi_period: bool,

        /// Solver time limit in seconds
        #[arg(long)]
        time_limit: Option<f64>,

        /// Solver tolerance
        #[arg(long)]
        tolerance: Option<f64>,

        /// Backend id (see `horizon schema --backends`)
        #[arg(long)]
        backend: Option<String>,

        /// Build rows on a single thread
        #[arg(long)]
        sequential: bool,

        /// Write realized results as JSON
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,

        /// Print the effective options as TOML and exit
        #[arg(long)]
        print_options: bool,
    },
    /// Check a case for structural problems without solving
    Validate {
        /// JSON case file
        #[arg(value_hint = ValueHint::FilePath)]
        case: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,
    },
    /// Show the entity attribute registry
    Schema {
        /// Only this entity kind (e.g. "link", "storage_unit")
        #[arg(long)]
        kind: Option<String>,

        /// Register link outputs up to this index first
        #[arg(long, default_value_t = 1)]
        link_outputs: usize,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,

        /// List solver backends instead
        #[arg(long)]
        backends: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}
