//! The typed, validated configuration for one scan.

use crate::error::{ScanError, ScanResult};
use crate::scanner::Protocol;
use crate::types::{Port, Target};
use std::time::Duration;

/// Everything the engine needs to run a scan.
///
/// Built once from validated input and never modified while a scan runs;
/// the `with_*` methods consume and return the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    targets: Vec<Target>,
    ports: Vec<Port>,
    protocol: Protocol,
    timeout: Duration,
    concurrency_cap: usize,
    port_concurrency_cap: usize,
    verbose: bool,
}

impl ScanConfig {
    /// Default per-probe timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(250);

    /// Create a configuration with default protocol, timeout and caps.
    ///
    /// Ports are sorted and deduplicated so each is probed once per host.
    pub fn new(targets: Vec<Target>, mut ports: Vec<Port>) -> ScanResult<Self> {
        if targets.is_empty() {
            return Err(ScanError::InvalidArgument("no targets to scan".to_string()));
        }
        if ports.is_empty() {
            return Err(ScanError::InvalidArgument("no ports to scan".to_string()));
        }
        ports.sort_unstable();
        ports.dedup();

        Ok(Self {
            targets,
            ports,
            protocol: Protocol::default(),
            timeout: Self::DEFAULT_TIMEOUT,
            concurrency_cap: 0,
            port_concurrency_cap: 0,
            verbose: false,
        })
    }

    /// Set the transport protocol.
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Set the per-probe timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Limit concurrently scanned hosts; 0 is unbounded.
    pub fn with_concurrency_cap(mut self, cap: usize) -> Self {
        self.concurrency_cap = cap;
        self
    }

    /// Limit concurrent probes within one host; 0 is unbounded.
    pub fn with_port_concurrency_cap(mut self, cap: usize) -> Self {
        self.port_concurrency_cap = cap;
        self
    }

    /// Report closed and filtered ports as well as open ones.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn concurrency_cap(&self) -> usize {
        self.concurrency_cap
    }

    pub fn port_concurrency_cap(&self) -> usize {
        self.port_concurrency_cap
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn localhost() -> Target {
        Target::Ip(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }

    #[test]
    fn test_defaults() {
        let config = ScanConfig::new(vec![localhost()], vec![Port::new(80).unwrap()]).unwrap();
        assert_eq!(config.protocol(), Protocol::Tcp);
        assert_eq!(config.timeout(), Duration::from_millis(250));
        assert_eq!(config.concurrency_cap(), 0);
        assert_eq!(config.port_concurrency_cap(), 0);
        assert!(!config.verbose());
    }

    #[test]
    fn test_ports_are_sorted_and_unique() {
        let ports = [443, 22, 80, 22].into_iter().filter_map(Port::new).collect();
        let config = ScanConfig::new(vec![localhost()], ports).unwrap();
        let raw: Vec<u16> = config.ports().iter().map(|p| p.as_u16()).collect();
        assert_eq!(raw, vec![22, 80, 443]);
    }

    #[test]
    fn test_rejects_empty_inputs() {
        assert!(matches!(
            ScanConfig::new(Vec::new(), vec![Port::new(80).unwrap()]),
            Err(ScanError::InvalidArgument(_))
        ));
        assert!(matches!(
            ScanConfig::new(vec![localhost()], Vec::new()),
            Err(ScanError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_builder() {
        let config = ScanConfig::new(vec![localhost()], vec![Port::new(53).unwrap()])
            .unwrap()
            .with_protocol(Protocol::Udp)
            .with_timeout(Duration::from_secs(1))
            .with_concurrency_cap(8)
            .with_port_concurrency_cap(64)
            .with_verbose(true);
        assert_eq!(config.protocol(), Protocol::Udp);
        assert_eq!(config.timeout(), Duration::from_secs(1));
        assert_eq!(config.concurrency_cap(), 8);
        assert_eq!(config.port_concurrency_cap(), 64);
        assert!(config.verbose());
    }
}
