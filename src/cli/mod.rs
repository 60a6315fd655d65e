//! Command-line interface definitions for Skitter.
//!
//! Uses `clap` derive macros for declarative argument parsing. Every option
//! is optional at the clap level so unset flags can fall back to the
//! settings file.

mod scan;

pub use scan::{build_config, execute, output_format, parse_ports};

use crate::error::ScanError;
use crate::scanner::Protocol;
use clap::Parser;
use std::path::PathBuf;

/// Skitter - a concurrent TCP/UDP reachability scanner.
///
/// Probes every requested port on every host in TARGET and reports which
/// ports are open.
#[derive(Parser, Debug)]
#[command(name = "skitter")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A concurrent TCP/UDP reachability scanner", long_about = None)]
pub struct Cli {
    /// Target to scan (IP, hostname, comma list, or CIDR block)
    ///
    /// Examples:
    ///   192.168.1.1              Single IP address
    ///   example.com              Hostname (every resolved address is scanned)
    ///   10.0.0.1,10.0.0.9        Comma-separated list
    ///   192.168.1.0/24           CIDR block (network/broadcast excluded)
    #[arg(value_name = "TARGET", verbatim_doc_comment)]
    pub target: String,

    /// Ports to scan: "80", "1-100" or "22,80,8000-8010" [default: 80]
    #[arg(short, long, value_name = "SPEC")]
    pub ports: Option<String>,

    /// Protocol to probe with [default: tcp]
    #[arg(long, value_enum)]
    pub protocol: Option<Protocol>,

    /// Per-probe timeout in milliseconds [default: 250]
    #[arg(short = 't', long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Maximum number of hosts scanned at once, 0 for unbounded [default: 0]
    #[arg(short = 'c', long, value_name = "N")]
    pub cap: Option<usize>,

    /// Maximum concurrent probes per host, 0 for unbounded [default: 0]
    #[arg(long, value_name = "N")]
    pub port_cap: Option<usize>,

    /// Also report closed and filtered ports
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format for results [default: plain]
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Show a progress bar on stderr
    #[arg(long)]
    pub progress: bool,

    /// Enable debug logging with phase timings
    #[arg(short, long)]
    pub debug: bool,

    /// Path to a settings file
    #[arg(long, value_name = "PATH", env = "SKITTER_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
    /// CSV format for data analysis
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// Process exit code for a failed run: 2 for bad input, 1 otherwise.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ScanError>() {
        Some(e) if e.is_argument_error() => 2,
        _ => 1,
    }
}
