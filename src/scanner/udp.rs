//! UDP probe.
//!
//! UDP has no handshake, so the probe sends one datagram on a connected
//! socket and classifies whatever comes back:
//!
//! 1. **Any reply datagram**: the port is open
//! 2. **ICMP port unreachable** (surfaced as `ECONNREFUSED`): the port is closed
//! 3. **Silence until the timeout**: the port is filtered
//!
//! Exactly one datagram is sent; there are no retransmissions.

use crate::error::ScanResult;
use crate::scanner::limits::{exhausted, is_local_exhaustion};
use crate::scanner::PortState;
use crate::types::{Port, Target};
use std::future::Future;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::trace;

/// Known UDP service payloads that are likely to elicit a reply.
struct ServicePayload {
    port: u16,
    payload: &'static [u8],
}

const SERVICE_PAYLOADS: &[ServicePayload] = &[
    // DNS query header
    ServicePayload {
        port: 53,
        payload: b"\x00\x00\x10\x00\x00\x00\x00\x00\x00\x00\x00\x00",
    },
    // TFTP read request
    ServicePayload {
        port: 69,
        payload: b"\x00\x01test\x00netascii\x00",
    },
    // NTP version request
    ServicePayload {
        port: 123,
        payload: b"\xe3\x00\x04\xfa\x00\x01\x00\x00\x00\x01\x00\x00",
    },
    // NetBIOS name query
    ServicePayload {
        port: 137,
        payload: b"\x80\xf0\x00\x10\x00\x01\x00\x00\x00\x00\x00\x00\x20CKAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA\x00\x00\x21\x00\x01",
    },
    // SNMP get-request
    ServicePayload {
        port: 161,
        payload: b"\x30\x26\x02\x01\x01\x04\x06public\xa0\x19\x02\x04",
    },
];

const DEFAULT_PAYLOAD: &[u8] = b"\x00";

/// Probe a UDP port with a single datagram exchange bounded by `limit`.
///
/// # Errors
///
/// Returns [`ScanError::ResourceExhausted`](crate::ScanError::ResourceExhausted)
/// when the socket cannot be opened or used on this machine.
pub async fn probe(target: &Target, port: Port, limit: Duration) -> ScanResult<PortState> {
    settle(limit, exchange(target, port))
        .await
        .map_err(|e| exhausted(target, port, &e))
        .inspect(|state| trace!(%target, %port, %state, "udp probe settled"))
}

async fn settle<F>(limit: Duration, attempt: F) -> io::Result<PortState>
where
    F: Future<Output = io::Result<()>>,
{
    match timeout(limit, attempt).await {
        Ok(Ok(())) => Ok(PortState::Open),
        Ok(Err(e)) if e.kind() == io::ErrorKind::ConnectionRefused => Ok(PortState::Closed),
        Ok(Err(e)) if is_local_exhaustion(&e) => Err(e),
        Ok(Err(e)) => {
            trace!(error = %e, "udp exchange failed");
            Ok(PortState::Filtered)
        }
        Err(_) => Ok(PortState::Filtered),
    }
}

async fn exchange(target: &Target, port: Port) -> io::Result<()> {
    let addr = target
        .socket_addrs(port)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no addresses for target"))?;

    let socket = UdpSocket::bind(unspecified_for(&addr)).await?;
    socket.connect(addr).await?;
    socket.send(payload_for(port.as_u16())).await?;

    let mut buf = [0u8; 1024];
    socket.recv(&mut buf).await?;
    Ok(())
}

/// Wildcard local address matching the family of `addr`.
fn unspecified_for(addr: &SocketAddr) -> SocketAddr {
    let ip = match addr {
        SocketAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        SocketAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
    };
    SocketAddr::new(ip, 0)
}

/// Get the appropriate payload for a port.
fn payload_for(port: u16) -> &'static [u8] {
    SERVICE_PAYLOADS
        .iter()
        .find(|p| p.port == port)
        .map(|p| p.payload)
        .unwrap_or(DEFAULT_PAYLOAD)
}
