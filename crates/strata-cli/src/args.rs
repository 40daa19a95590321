use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the strata binary.
#[derive(Parser, Debug)]
#[command(
    name = "strata",
    version,
    about = "Resolve a strata type graph and report its faults"
)]
pub struct CliArgs {
    /// JSON graph description to resolve.
    pub input: PathBuf,

    /// Output format for diagnostics.
    #[arg(long, value_enum, ignore_case = true, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Report unsatisfied contract conditions as warnings.
    #[arg(long = "report-contracts")]
    pub report_contracts: bool,

    /// Maximum depth for on-demand construction of successor nodes.
    #[arg(long = "max-depth")]
    pub max_depth: Option<u32>,

    /// Include the resolved graph snapshot in JSON output.
    #[arg(long)]
    pub snapshot: bool,

    /// Disable colored output.
    #[arg(long = "no-color")]
    pub no_color: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
