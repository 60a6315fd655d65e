//! Probe trait abstraction and the values it produces.
//!
//! The engine is generic over [`Prober`] so tests can swap the network for
//! an instrumented stand-in.

use crate::error::ScanResult;
use crate::types::{Port, Target};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Transport protocol used for probing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// TCP connect handshake.
    #[default]
    Tcp,
    /// Single UDP datagram exchange.
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Udp => write!(f, "udp"),
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            _ => Err(format!("unknown protocol: {}", s)),
        }
    }
}

/// Status of a probed port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    /// Handshake (or datagram exchange) succeeded.
    Open,
    /// The peer actively rejected the attempt.
    Closed,
    /// No response before the timeout elapsed.
    Filtered,
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Filtered => write!(f, "filtered"),
        }
    }
}

/// Outcome of probing a single (target, port) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortResult {
    /// The host that was probed.
    pub target: Target,
    /// The port that was probed.
    pub port: Port,
    /// Transport used.
    pub protocol: Protocol,
    /// State determined by the probe.
    pub state: PortState,
}

impl PortResult {
    /// Create a new port result.
    pub fn new(target: Target, port: Port, protocol: Protocol, state: PortState) -> Self {
        Self {
            target,
            port,
            protocol,
            state,
        }
    }

    /// Check if the port is open.
    pub fn is_open(&self) -> bool {
        self.state == PortState::Open
    }
}

/// A single bounded-duration liveness check.
///
/// Implementations must return within `timeout` (plus scheduling overhead)
/// and release any socket they opened before returning.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe one port on one target.
    ///
    /// An error means the probe could not run on this machine; it aborts the
    /// scan instead of being reported as a port state.
    async fn probe(
        &self,
        target: &Target,
        port: Port,
        protocol: Protocol,
        timeout: Duration,
    ) -> ScanResult<PortState>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_port_state_display() {
        assert_eq!(PortState::Open.to_string(), "open");
        assert_eq!(PortState::Closed.to_string(), "closed");
        assert_eq!(PortState::Filtered.to_string(), "filtered");
    }

    #[test]
    fn test_protocol_from_str() {
        assert_eq!("tcp".parse::<Protocol>().unwrap(), Protocol::Tcp);
        assert_eq!("UDP".parse::<Protocol>().unwrap(), Protocol::Udp);
        assert!("sctp".parse::<Protocol>().is_err());
        assert_eq!(Protocol::default(), Protocol::Tcp);
    }

    #[test]
    fn test_port_result() {
        let target = Target::Ip(IpAddr::V4(Ipv4Addr::LOCALHOST));
        let result = PortResult::new(
            target,
            Port::new(80).unwrap(),
            Protocol::Tcp,
            PortState::Open,
        );
        assert!(result.is_open());
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            serde_json::json!({
                "target": "127.0.0.1",
                "port": 80,
                "protocol": "tcp",
                "state": "open",
            })
        );
    }
}
