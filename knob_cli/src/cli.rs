//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "knob_cli", version, about = "Rotary-encoder ESC speed controller")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/knob_config.toml")]
    pub config: PathBuf,

    /// Log and report as JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the control loop until Ctrl-C (or the run cap)
    Run {
        /// Stop cleanly after this many milliseconds
        #[arg(long, value_name = "MS")]
        max_run_ms: Option<u64>,
        /// Drive the simulated panel from a script, e.g. "cw:3,wait:10,hold:1200".
        /// The run ends once the script has played out.
        #[arg(long, value_name = "SCRIPT")]
        sim_script: Option<String>,
        /// Print control loop timing stats
        #[arg(long, action = ArgAction::SetTrue)]
        stats: bool,
    },
    /// Run one ramp to full speed and back, then stop
    Ramp,
    /// Validate config and open the I/O backend
    SelfCheck,
    /// Print the effective config (defaults filled in)
    PrintConfig,
}

/// Context attached to every config load failure; drives exit code 3.
#[derive(Debug, Clone)]
pub struct ConfigContext {
    pub path: PathBuf,
}

impl fmt::Display for ConfigContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid configuration in {}", self.path.display())
    }
}
