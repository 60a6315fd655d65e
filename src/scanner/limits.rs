//! Socket descriptor budgeting.
//!
//! A scan holds at most one socket per in-flight probe, so the worst case is
//! (hosts in flight) x (probes in flight per host). With both caps at 0 that
//! is every host times every port; deployments scanning wide ranges need a
//! matching `RLIMIT_NOFILE` or a host cap.

use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::types::{Port, Target};
use std::io;
use tracing::{debug, warn};

/// Upper bound on sockets open at once for this configuration.
pub fn descriptor_ceiling(config: &ScanConfig) -> u64 {
    let bounded = |total: usize, cap: usize| -> u64 {
        match cap {
            0 => total as u64,
            cap => total.min(cap) as u64,
        }
    };
    bounded(config.targets().len(), config.concurrency_cap())
        .saturating_mul(bounded(config.ports().len(), config.port_concurrency_cap()))
}

/// The process's soft limit on open files, where the platform exposes one.
pub fn open_file_limit() -> Option<u64> {
    #[cfg(unix)]
    {
        let mut limit = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        // SAFETY: getrlimit only writes into the struct we pass.
        let rc = unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut limit) };
        (rc == 0).then_some(limit.rlim_cur as u64)
    }
    #[cfg(not(unix))]
    {
        None
    }
}

/// Log the ceiling and warn when it exceeds the open-file limit.
pub fn check_descriptor_budget(config: &ScanConfig) {
    let ceiling = descriptor_ceiling(config);
    match open_file_limit() {
        Some(limit) if ceiling > limit => warn!(
            ceiling,
            limit,
            "scan may open more sockets than RLIMIT_NOFILE allows; \
             lower --cap/--port-cap or raise the limit"
        ),
        limit => debug!(ceiling, ?limit, "socket descriptor budget"),
    }
}

/// Whether a socket error was raised by this machine running out of
/// descriptors, buffers or local ports rather than by the remote peer.
pub fn is_local_exhaustion(err: &io::Error) -> bool {
    if matches!(
        err.kind(),
        io::ErrorKind::AddrNotAvailable | io::ErrorKind::OutOfMemory
    ) {
        return true;
    }
    #[cfg(unix)]
    {
        matches!(
            err.raw_os_error(),
            Some(libc::EMFILE | libc::ENFILE | libc::ENOBUFS | libc::ENOMEM)
        )
    }
    #[cfg(not(unix))]
    {
        false
    }
}

/// Abort error for a probe that failed on the local side.
pub fn exhausted(target: &Target, port: Port, err: &io::Error) -> ScanError {
    ScanError::ResourceExhausted(format!(
        "local socket error probing {}:{}: {}",
        target, port, err
    ))
}
