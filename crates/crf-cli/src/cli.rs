//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "crf-visibility",
    version,
    about = "Check case report forms and replay visibility criteria",
    long_about = "Check the visibility criteria of a case report form model and replay\n\
                  renderer events against it to see which cells and layouts end up\n\
                  shown or hidden."
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

    /// Include field values (patient data) in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Report configuration problems in a form model's visibility criteria.
    Check(CheckArgs),

    /// Replay a script of renderer events and print the final visibility.
    Replay(ReplayArgs),
}

#[derive(Parser)]
pub struct CheckArgs {
    /// Form model file (.json or .toml).
    #[arg(value_name = "FORM")]
    pub form: PathBuf,
}

#[derive(Parser)]
pub struct ReplayArgs {
    /// Form model file (.json or .toml).
    #[arg(value_name = "FORM")]
    pub form: PathBuf,

    /// JSON array of the user's datasets.
    #[arg(long = "datasets", value_name = "JSON")]
    pub datasets: PathBuf,

    /// JSON array of script steps.
    #[arg(long = "script", value_name = "JSON")]
    pub script: PathBuf,

    /// Engine configuration (TOML).
    #[arg(long = "config", value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Render every field as disabled.
    #[arg(long = "disabled")]
    pub disabled: bool,

    /// Output format for the final state.
    #[arg(long = "output", value_enum, default_value = "table")]
    pub output: OutputArg,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputArg {
    Table,
    Json,
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
