//! # Skitter - A Concurrent TCP/UDP Reachability Scanner
//!
//! Skitter expands a target specification into hosts, probes every requested
//! port on each host with a bounded connect (or datagram) attempt, and
//! reports per-port state in a deterministic order.
//!
//! ## Features
//!
//! - **Flexible Targeting**: single IPs, hostnames, comma lists and CIDR blocks
//! - **Bounded Concurrency**: one worker pool abstraction for hosts and ports
//! - **Three-State Results**: open, closed (refused) and filtered (timed out)
//! - **Deterministic Output**: hosts in resolution order, ports ascending
//! - **Multiple Output Formats**: plain text, JSON, and CSV
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use skitter::config::ScanConfig;
//! use skitter::scanner::ScanEngine;
//! use skitter::types::{self, PortSpec};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let targets = types::resolve("10.0.0.0/30").await?;
//!     let ports = "22-23".parse::<PortSpec>()?.to_ports();
//!     let config = ScanConfig::new(targets, ports)?.with_concurrency_cap(2);
//!
//!     for host in ScanEngine::new().scan(&config).await? {
//!         for port in host.open_ports() {
//!             println!("Discovered open port {} on {}", port, host.target());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Ports, port specs, targets and target resolution
//! - [`scanner`] - Probes, the worker pool, the engine and result aggregation
//! - [`config`] - The typed scan configuration and the settings file
//! - [`error`] - Error types
//! - [`output`] - Output formatting utilities
//! - [`cli`] - Command-line parsing for the `skitter` binary

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod scanner;
pub mod types;

// Re-export commonly used types
pub use config::ScanConfig;
pub use error::{ScanError, ScanResult};
pub use scanner::{HostResult, PortResult, PortState, Protocol, ScanEngine};
pub use types::{Port, PortSpec, Target, TargetSpec};
