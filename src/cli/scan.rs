//! Scan command implementation.
//!
//! Merges flags over the settings file into a [`ScanConfig`], resolves the
//! target, runs the engine and prints the report.

use crate::cli::{Cli, OutputFormat};
use crate::config::{AppSettings, ScanConfig};
use crate::error::{ScanError, ScanResult};
use crate::output;
use crate::scanner::ScanEngine;
use crate::types::{self, Port, PortSpec, Target};
use anyhow::Context;
use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};
use tracing::debug;

/// Execute a scan for the parsed command line.
pub async fn execute(cli: &Cli) -> anyhow::Result<()> {
    let settings = AppSettings::load(cli.config.as_deref()).context("failed to load settings")?;

    // All argument validation happens before any probe is sent.
    let phase = Instant::now();
    let ports = parse_ports(cli, &settings)?;
    let format = output_format(cli, &settings)?;
    debug!(ports = ports.len(), elapsed = ?phase.elapsed(), "parsed ports");

    let phase = Instant::now();
    let targets = types::resolve(&cli.target).await?;
    debug!(hosts = targets.len(), elapsed = ?phase.elapsed(), "resolved targets");

    let config = build_config(cli, &settings, targets, ports)?;

    if format == OutputFormat::Plain {
        output::print_scan_header(&cli.target);
    }

    let mut engine = ScanEngine::new();
    let progress = if cli.progress {
        let pb = ProgressBar::new(config.targets().len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} hosts ({percent}%)")?
                .progress_chars("=>-"),
        );
        engine = engine.with_progress(pb.clone());
        Some(pb)
    } else {
        None
    };

    let started = Instant::now();
    let results = engine.scan(&config).await?;
    let elapsed = started.elapsed();

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    output::print_results(&results, format, config.verbose(), elapsed)
        .context("failed to write results")?;
    Ok(())
}

/// Ports from `--ports`, falling back to the settings file.
pub fn parse_ports(cli: &Cli, settings: &AppSettings) -> ScanResult<Vec<Port>> {
    let raw = cli.ports.as_deref().unwrap_or(&settings.ports);
    let spec: PortSpec = raw.parse()?;
    Ok(spec.to_ports())
}

/// Output format from `--output`, falling back to the settings file.
pub fn output_format(cli: &Cli, settings: &AppSettings) -> ScanResult<OutputFormat> {
    match cli.output {
        Some(format) => Ok(format),
        None => OutputFormat::from_str(&settings.output_format, true).map_err(|_| {
            ScanError::InvalidArgument(format!(
                "unknown output format in settings: '{}'",
                settings.output_format
            ))
        }),
    }
}

/// Build the scan configuration; explicit flags win over settings.
pub fn build_config(
    cli: &Cli,
    settings: &AppSettings,
    targets: Vec<Target>,
    ports: Vec<Port>,
) -> ScanResult<ScanConfig> {
    let timeout_ms = cli.timeout.unwrap_or(settings.timeout_ms);
    if timeout_ms == 0 {
        return Err(ScanError::InvalidArgument(
            "timeout must be greater than zero".to_string(),
        ));
    }

    Ok(ScanConfig::new(targets, ports)?
        .with_protocol(cli.protocol.unwrap_or(settings.protocol))
        .with_timeout(Duration::from_millis(timeout_ms))
        .with_concurrency_cap(cli.cap.unwrap_or(settings.cap))
        .with_port_concurrency_cap(cli.port_cap.unwrap_or(settings.port_cap))
        .with_verbose(cli.verbose || settings.verbose))
}
