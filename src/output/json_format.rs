//! JSON output formatting.

use crate::scanner::{HostResult, ScanSummary};
use serde::Serialize;
use std::io::{self, Write};

/// The document emitted by `--output json`.
#[derive(Debug, Serialize)]
pub struct ScanReport<'a> {
    pub summary: ScanSummary,
    pub hosts: &'a [HostResult],
}

/// Write the report as pretty-printed JSON.
pub fn write_json<W: Write>(mut out: W, report: &ScanReport<'_>) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut out, report)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    writeln!(out)
}

/// Print results in JSON format.
pub fn print_json(report: &ScanReport<'_>) -> io::Result<()> {
    write_json(io::stdout().lock(), report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{PortResult, PortState, Protocol};
    use crate::types::{Port, Target};
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    #[test]
    fn test_report_shape() {
        let target = Target::Ip(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));
        let hosts = vec![HostResult::aggregate(
            target.clone(),
            vec![
                PortResult::new(target.clone(), Port::new(443).unwrap(), Protocol::Tcp, PortState::Closed),
                PortResult::new(target, Port::new(80).unwrap(), Protocol::Tcp, PortState::Open),
            ],
        )];
        let report = ScanReport {
            summary: ScanSummary::from_results(&hosts, Duration::from_millis(42)),
            hosts: &hosts,
        };

        let mut buf = Vec::new();
        write_json(&mut buf, &report).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["summary"]["open_ports"], 1);
        assert_eq!(value["summary"]["duration_ms"], 42);
        assert_eq!(value["hosts"][0]["target"], "10.0.0.1");
        assert_eq!(value["hosts"][0]["open_ports"], serde_json::json!([80]));
        assert_eq!(value["hosts"][0]["closed_ports"], serde_json::json!([443]));
        assert_eq!(value["hosts"][0]["ports"][0]["port"], 80);
    }
}
