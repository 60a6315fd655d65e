//! TCP connect probe.
//!
//! Completes (or fails) a full handshake using the operating system's
//! socket API. No elevated privileges are required.

use crate::error::ScanResult;
use crate::scanner::limits::{exhausted, is_local_exhaustion};
use crate::scanner::PortState;
use crate::types::{Port, Target};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

/// Probe a TCP port with a single connect attempt bounded by `limit`.
///
/// Name lookup for [`Target::Name`] is charged against the same budget.
///
/// # Errors
///
/// Returns [`ScanError::ResourceExhausted`](crate::ScanError::ResourceExhausted)
/// when the attempt fails on this machine (out of descriptors or local
/// ports), since no port state can be inferred from that.
pub async fn probe(target: &Target, port: Port, limit: Duration) -> ScanResult<PortState> {
    settle(limit, connect(target, port))
        .await
        .map_err(|e| exhausted(target, port, &e))
        .inspect(|state| trace!(%target, %port, %state, "tcp probe settled"))
}

/// Run one connect attempt under `limit` and classify the outcome.
///
/// A local resource failure is passed back as the error.
async fn settle<F>(limit: Duration, attempt: F) -> io::Result<PortState>
where
    F: Future<Output = io::Result<TcpStream>>,
{
    match timeout(limit, attempt).await {
        Ok(Ok(stream)) => {
            // Only the handshake matters; close right away.
            drop(stream);
            Ok(PortState::Open)
        }
        Ok(Err(e)) if is_local_exhaustion(&e) => Err(e),
        Ok(Err(e)) => {
            trace!(error = %e, "connect failed");
            Ok(classify(&e))
        }
        Err(_) => Ok(PortState::Filtered),
    }
}

async fn connect(target: &Target, port: Port) -> io::Result<TcpStream> {
    let addrs = target
        .socket_addrs(port)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::NotFound, e))?;
    let addr: SocketAddr = addrs
        .into_iter()
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no addresses for target"))?;
    TcpStream::connect(addr).await
}

/// Map a remote connect error to a port state.
///
/// Only an active rejection counts as closed; anything else left the port
/// unanswered.
pub(crate) fn classify(err: &io::Error) -> PortState {
    match err.kind() {
        io::ErrorKind::ConnectionRefused | io::ErrorKind::ConnectionReset => PortState::Closed,
        _ => PortState::Filtered,
    }
}
