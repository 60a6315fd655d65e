//! Per-host aggregation of probe outcomes.

use crate::scanner::{PortResult, PortState};
use crate::types::{Port, Target};
use serde::Serialize;
use std::time::Duration;

/// All probe outcomes for one host, ordered by port.
///
/// Built once by [`HostResult::aggregate`] and read-only afterwards. The
/// open, closed and filtered lists partition the probed port set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostResult {
    target: Target,
    ports: Vec<PortResult>,
    open_ports: Vec<Port>,
    closed_ports: Vec<Port>,
    filtered_ports: Vec<Port>,
}

impl HostResult {
    /// Build a host result from port results arriving in any order.
    pub fn aggregate(target: Target, mut results: Vec<PortResult>) -> Self {
        results.sort_by_key(|r| r.port);

        let mut open_ports = Vec::new();
        let mut closed_ports = Vec::new();
        let mut filtered_ports = Vec::new();
        for result in &results {
            match result.state {
                PortState::Open => open_ports.push(result.port),
                PortState::Closed => closed_ports.push(result.port),
                PortState::Filtered => filtered_ports.push(result.port),
            }
        }

        Self {
            target,
            ports: results,
            open_ports,
            closed_ports,
            filtered_ports,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Port results in ascending port order.
    pub fn ports(&self) -> &[PortResult] {
        &self.ports
    }

    pub fn open_ports(&self) -> &[Port] {
        &self.open_ports
    }

    pub fn closed_ports(&self) -> &[Port] {
        &self.closed_ports
    }

    pub fn filtered_ports(&self) -> &[Port] {
        &self.filtered_ports
    }

    /// State recorded for `port`, if it was probed.
    pub fn state_of(&self, port: Port) -> Option<PortState> {
        self.ports
            .binary_search_by_key(&port, |r| r.port)
            .ok()
            .map(|i| self.ports[i].state)
    }

    /// Non-open results, ascending by port.
    pub fn non_open(&self) -> impl Iterator<Item = &PortResult> {
        self.ports.iter().filter(|r| !r.is_open())
    }
}

/// Totals across a finished scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub hosts: usize,
    pub ports_scanned: usize,
    pub open_ports: usize,
    pub closed_ports: usize,
    pub filtered_ports: usize,
    pub duration_ms: u64,
}

impl ScanSummary {
    /// Count outcomes over every host.
    pub fn from_results(results: &[HostResult], elapsed: Duration) -> Self {
        let mut summary = Self {
            hosts: results.len(),
            ports_scanned: 0,
            open_ports: 0,
            closed_ports: 0,
            filtered_ports: 0,
            duration_ms: elapsed.as_millis() as u64,
        };
        for host in results {
            summary.ports_scanned += host.ports().len();
            summary.open_ports += host.open_ports().len();
            summary.closed_ports += host.closed_ports().len();
            summary.filtered_ports += host.filtered_ports().len();
        }
        summary
    }
}
