//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "shot", version, about = "Espresso shot analysis CLI")]
pub struct Cli {
    /// Path to config TOML (typed); a missing file means defaults
    #[arg(long, value_name = "FILE", default_value = "etc/shot_config.toml")]
    pub config: PathBuf,

    /// Emit reports, estimates and errors as JSON instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG takes precedence
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare a recorded shot against the profile that drove it
    Analyze {
        /// Profile JSON
        #[arg(long, value_name = "FILE")]
        profile: PathBuf,
        /// Telemetry CSV (strict header) or JSON array of rows
        #[arg(long, value_name = "FILE")]
        shot: PathBuf,
    },
    /// Preview a profile's target curves without telemetry
    Estimate {
        /// Profile JSON
        #[arg(long, value_name = "FILE")]
        profile: PathBuf,
    },
    /// Analyze several shots of one profile in parallel
    Batch {
        /// Profile JSON
        #[arg(long, value_name = "FILE")]
        profile: PathBuf,
        /// Telemetry files, one per shot
        #[arg(value_name = "SHOT", required = true)]
        shots: Vec<PathBuf>,
        /// Worker threads (0 = one per available CPU)
        #[arg(long, value_name = "N", default_value_t = 0)]
        workers: usize,
    },
}
