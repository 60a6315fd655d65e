//! CSV output formatting.

use crate::scanner::HostResult;
use std::io::{self, Write};

/// Write one row per probed port.
pub fn write_csv<W: Write>(out: W, results: &[HostResult]) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);

    wtr.write_record(["host", "port", "protocol", "state"])?;

    for host in results {
        for result in host.ports() {
            wtr.write_record([
                &result.target.to_string(),
                &result.port.to_string(),
                &result.protocol.to_string(),
                &result.state.to_string(),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Print results in CSV format.
pub fn print_csv(results: &[HostResult]) -> io::Result<()> {
    write_csv(io::stdout().lock(), results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{PortResult, PortState, Protocol};
    use crate::types::{Port, Target};

    #[test]
    fn test_rows_in_port_order() {
        let target = Target::Name("gateway.lan".into());
        let host = HostResult::aggregate(
            target.clone(),
            vec![
                PortResult::new(target.clone(), Port::new(53).unwrap(), Protocol::Udp, PortState::Filtered),
                PortResult::new(target, Port::new(22).unwrap(), Protocol::Udp, PortState::Open),
            ],
        );

        let mut buf = Vec::new();
        write_csv(&mut buf, &[host]).unwrap();

        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "host,port,protocol,state\n\
             gateway.lan,22,udp,open\n\
             gateway.lan,53,udp,filtered\n"
        );
    }
}
