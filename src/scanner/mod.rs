//! Scanner module - probing, fan-out and aggregation.
//!
//! [`ScanEngine`] drives a [`WorkerPool`] per level, [`NetworkProber`]
//! dispatches each probe to the TCP or UDP implementation, and
//! [`HostResult`] collects the outcomes for one host.

pub mod engine;
pub mod limits;
pub mod pool;
pub mod results;
pub mod tcp;
pub mod traits;
pub mod udp;

use crate::error::ScanResult;
use crate::types::{Port, Target};
use async_trait::async_trait;
use std::time::Duration;

pub use engine::ScanEngine;
pub use pool::WorkerPool;
pub use results::{HostResult, ScanSummary};
pub use traits::{PortResult, PortState, Prober, Protocol};

/// Probes real sockets over TCP or UDP.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkProber;

#[async_trait]
impl Prober for NetworkProber {
    async fn probe(
        &self,
        target: &Target,
        port: Port,
        protocol: Protocol,
        timeout: Duration,
    ) -> ScanResult<PortState> {
        match protocol {
            Protocol::Tcp => tcp::probe(target, port, timeout).await,
            Protocol::Udp => udp::probe(target, port, timeout).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use tokio::net::{TcpListener, UdpSocket};

    #[tokio::test]
    async fn test_network_prober_dispatches_by_protocol() {
        let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = Port::new(tcp.local_addr().unwrap().port()).unwrap();
        let target = Target::Ip(IpAddr::V4(Ipv4Addr::LOCALHOST));
        let limit = Duration::from_millis(300);

        assert_eq!(
            NetworkProber
                .probe(&target, port, Protocol::Tcp, limit)
                .await
                .unwrap(),
            PortState::Open
        );

        // A bound UDP socket that never answers on the same number.
        let _udp = UdpSocket::bind(("127.0.0.1", port.as_u16())).await.unwrap();
        assert_ne!(
            NetworkProber
                .probe(&target, port, Protocol::Udp, limit)
                .await
                .unwrap(),
            PortState::Open
        );
    }
}
