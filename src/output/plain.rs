//! Plain text output formatting.
//!
//! The report lines are plain so they stay grep-friendly; only
//! diagnostics carry `console` styling.

use crate::scanner::HostResult;
use console::style;
use std::io::{self, Write};
use std::time::Duration;

/// Report lines for a finished scan, in host order then port order.
///
/// Open ports are always reported; closed and filtered ports only when
/// `verbose` is set.
pub fn summary_lines(results: &[HostResult], verbose: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for host in results {
        for port in host.open_ports() {
            lines.push(format!("Discovered open port {} on {}", port, host.target()));
        }
        if verbose {
            for result in host.non_open() {
                lines.push(format!(
                    "Port {} on {} is {}",
                    result.port,
                    host.target(),
                    result.state
                ));
            }
        }
    }
    lines
}

/// Final line of a plain report.
pub fn completion_line(elapsed: Duration) -> String {
    format!("scan done in {:.2}s", elapsed.as_secs_f64())
}

/// Write the plain report.
pub fn write_plain<W: Write>(
    mut out: W,
    results: &[HostResult],
    verbose: bool,
    elapsed: Duration,
) -> io::Result<()> {
    for line in summary_lines(results, verbose) {
        writeln!(out, "{}", line)?;
    }
    writeln!(out)?;
    writeln!(out, "{}", completion_line(elapsed))
}

/// Print results in human-readable plain text format.
pub fn print_plain(results: &[HostResult], verbose: bool, elapsed: Duration) -> io::Result<()> {
    write_plain(io::stdout().lock(), results, verbose, elapsed)
}

/// Print a scan header before scanning begins.
pub fn print_scan_header(argument: &str) {
    println!("Initializing scan for {}", argument);
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}
