//! Scan orchestration.
//!
//! Two-level fan-out over the same [`WorkerPool`]: one task per host (bounded
//! by the host cap), and inside each host task one probe per port. A host
//! task finishes only after every one of its probes has returned, so a host
//! slot is held for the host's whole scan.

use crate::config::ScanConfig;
use crate::error::{ScanError, ScanResult};
use crate::scanner::limits::check_descriptor_budget;
use crate::scanner::pool::WorkerPool;
use crate::scanner::{HostResult, NetworkProber, PortResult, Prober};
use crate::types::Target;
use indicatif::ProgressBar;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace};

/// Runs scans against the network (or any other [`Prober`]).
pub struct ScanEngine<P = NetworkProber> {
    prober: Arc<P>,
    progress: Option<ProgressBar>,
}

impl ScanEngine<NetworkProber> {
    /// Create an engine that probes real sockets.
    pub fn new() -> Self {
        Self::with_prober(NetworkProber)
    }
}

impl Default for ScanEngine<NetworkProber> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Prober + 'static> ScanEngine<P> {
    /// Create an engine around a custom prober.
    pub fn with_prober(prober: P) -> Self {
        Self {
            prober: Arc::new(prober),
            progress: None,
        }
    }

    /// Advance `progress` once per completed host.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Probe every configured port on every target.
    ///
    /// Returns one [`HostResult`] per target, in target order. Refused or
    /// silent ports are results, not errors.
    ///
    /// # Errors
    ///
    /// Only [`ScanError::ResourceExhausted`], including a probe that failed
    /// on this machine, in which case nothing from the partial scan is
    /// returned.
    pub async fn scan(&self, config: &ScanConfig) -> ScanResult<Vec<HostResult>> {
        check_descriptor_budget(config);
        info!(
            hosts = config.targets().len(),
            ports = config.ports().len(),
            protocol = %config.protocol(),
            cap = config.concurrency_cap(),
            "starting scan"
        );
        let started = Instant::now();

        let config = Arc::new(config.clone());
        let hosts = WorkerPool::new(config.concurrency_cap());
        let results = hosts
            .run(config.targets().to_vec(), |target| {
                let prober = Arc::clone(&self.prober);
                let config = Arc::clone(&config);
                let progress = self.progress.clone();
                async move {
                    let result = scan_host(prober, config, target).await;
                    if let Some(pb) = progress {
                        pb.inc(1);
                    }
                    result
                }
            })
            .await?
            .into_iter()
            .collect::<ScanResult<Vec<HostResult>>>()?;

        debug!(elapsed = ?started.elapsed(), "scan finished");
        Ok(results)
    }
}

/// Probe all ports of one host and aggregate the outcomes.
async fn scan_host<P: Prober + 'static>(
    prober: Arc<P>,
    config: Arc<ScanConfig>,
    target: Target,
) -> ScanResult<HostResult> {
    debug!(%target, "initializing host scan");
    let started = Instant::now();
    let protocol = config.protocol();
    let limit = config.timeout();
    let shared_target = Arc::new(target.clone());

    let ports = WorkerPool::new(config.port_concurrency_cap());
    let outcomes = ports
        .run(config.ports().to_vec(), |port| {
            let prober = Arc::clone(&prober);
            let target = Arc::clone(&shared_target);
            async move {
                let state = prober.probe(&target, port, protocol, limit).await?;
                trace!(%target, %port, %state, "probe finished");
                Ok::<_, ScanError>((port, state))
            }
        })
        .await?;

    let results = outcomes
        .into_iter()
        .map(|outcome| {
            outcome.map(|(port, state)| PortResult::new(target.clone(), port, protocol, state))
        })
        .collect::<ScanResult<Vec<PortResult>>>()?;
    let host = HostResult::aggregate(target, results);

    for port in host.open_ports() {
        info!(target = %host.target(), %port, "discovered open port");
    }
    debug!(
        target = %host.target(),
        open = host.open_ports().len(),
        closed = host.closed_ports().len(),
        filtered = host.filtered_ports().len(),
        elapsed = ?started.elapsed(),
        "host scan complete"
    );
    Ok(host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{PortState, Protocol};
    use crate::types::Port;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::net::TcpListener;

    fn host(n: u8) -> Target {
        Target::Ip(IpAddr::V4(Ipv4Addr::new(10, 0, 0, n)))
    }

    fn ports(raw: impl IntoIterator<Item = u16>) -> Vec<Port> {
        raw.into_iter().filter_map(Port::new).collect()
    }

    /// Deterministic prober: state derived from the port, with a delay that
    /// makes later hosts finish first.
    struct ScriptedProber {
        calls: Mutex<HashMap<(Target, Port), usize>>,
    }

    impl ScriptedProber {
        fn new() -> Self {
            Self {
                calls: Mutex::new(HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl Prober for ScriptedProber {
        async fn probe(
            &self,
            target: &Target,
            port: Port,
            _protocol: Protocol,
            _timeout: Duration,
        ) -> ScanResult<PortState> {
            *self
                .calls
                .lock()
                .unwrap()
                .entry((target.clone(), port))
                .or_default() += 1;

            let last_octet = match target {
                Target::Ip(IpAddr::V4(v4)) => v4.octets()[3],
                _ => 0,
            };
            tokio::time::sleep(Duration::from_millis(u64::from(20 - last_octet.min(20)))).await;

            Ok(match port.as_u16() % 3 {
                0 => PortState::Open,
                1 => PortState::Closed,
                _ => PortState::Filtered,
            })
        }
    }

    /// Counts hosts with at least one probe in flight.
    struct GaugedProber {
        in_flight: Mutex<HashMap<Target, usize>>,
        peak_hosts: AtomicUsize,
    }

    #[async_trait]
    impl Prober for GaugedProber {
        async fn probe(
            &self,
            target: &Target,
            _port: Port,
            _protocol: Protocol,
            _timeout: Duration,
        ) -> ScanResult<PortState> {
            {
                let mut in_flight = self.in_flight.lock().unwrap();
                *in_flight.entry(target.clone()).or_default() += 1;
                self.peak_hosts.fetch_max(in_flight.len(), Ordering::SeqCst);
            }
            tokio::time::sleep(Duration::from_millis(15)).await;
            {
                let mut in_flight = self.in_flight.lock().unwrap();
                if let Some(count) = in_flight.get_mut(target) {
                    *count -= 1;
                    if *count == 0 {
                        in_flight.remove(target);
                    }
                }
            }
            Ok(PortState::Closed)
        }
    }

    /// Fails locally on one port, the way a socket call does once the
    /// process runs out of descriptors.
    struct ExhaustedProber {
        failing: Port,
    }

    #[async_trait]
    impl Prober for ExhaustedProber {
        async fn probe(
            &self,
            target: &Target,
            port: Port,
            _protocol: Protocol,
            _timeout: Duration,
        ) -> ScanResult<PortState> {
            if port == self.failing {
                Err(ScanError::ResourceExhausted(format!(
                    "too many open files probing {}:{}",
                    target, port
                )))
            } else {
                Ok(PortState::Open)
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_every_pair_probed_exactly_once() {
        let targets: Vec<Target> = (1..=5).map(host).collect();
        let config = ScanConfig::new(targets.clone(), ports(1..=30)).unwrap();
        let engine = ScanEngine::with_prober(ScriptedProber::new());

        let results = engine.scan(&config).await.unwrap();

        assert_eq!(results.len(), 5);
        for host in &results {
            assert_eq!(host.ports().len(), 30);
            let mut seen: Vec<Port> = host.ports().iter().map(|r| r.port).collect();
            seen.dedup();
            assert_eq!(seen, ports(1..=30));
        }

        let calls = engine.prober.calls.lock().unwrap();
        assert_eq!(calls.len(), 5 * 30);
        assert!(calls.values().all(|&n| n == 1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_results_follow_target_order() {
        // Later hosts sleep less and finish first.
        let targets: Vec<Target> = vec![host(2), host(19), host(7), host(13)];
        let config = ScanConfig::new(targets.clone(), ports([21, 22, 23])).unwrap();

        let results = ScanEngine::with_prober(ScriptedProber::new())
            .scan(&config)
            .await
            .unwrap();

        let order: Vec<&Target> = results.iter().map(|r| r.target()).collect();
        assert_eq!(order, targets.iter().collect::<Vec<_>>());
        for host in &results {
            assert_eq!(host.open_ports(), ports([21]).as_slice());
            assert_eq!(host.closed_ports(), ports([22]).as_slice());
            assert_eq!(host.filtered_ports(), ports([23]).as_slice());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cap_limits_active_hosts() {
        let targets: Vec<Target> = (1..=9).map(host).collect();
        let config = ScanConfig::new(targets, ports(1..=4))
            .unwrap()
            .with_concurrency_cap(2);
        let engine = ScanEngine::with_prober(GaugedProber {
            in_flight: Mutex::new(HashMap::new()),
            peak_hosts: AtomicUsize::new(0),
        });

        let results = engine.scan(&config).await.unwrap();

        assert_eq!(results.len(), 9);
        let peak = engine.prober.peak_hosts.load(Ordering::SeqCst);
        assert!(peak <= 2, "peak {} hosts exceeded cap", peak);
    }

    #[tokio::test]
    async fn test_local_failure_aborts_scan() {
        let targets: Vec<Target> = (1..=3).map(host).collect();
        let config = ScanConfig::new(targets, ports(1..=20)).unwrap();
        let engine = ScanEngine::with_prober(ExhaustedProber {
            failing: Port::new(7).unwrap(),
        });

        let err = engine.scan(&config).await.unwrap_err();
        assert!(matches!(err, ScanError::ResourceExhausted(_)));
    }

    #[tokio::test]
    async fn test_local_listener_open_and_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open = listener.local_addr().unwrap().port();
        let spare = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let closed = spare.local_addr().unwrap().port();
        drop(spare);

        let target = Target::Ip(IpAddr::V4(Ipv4Addr::LOCALHOST));
        let config = ScanConfig::new(vec![target], ports([open, closed]))
            .unwrap()
            .with_protocol(Protocol::Tcp)
            .with_timeout(Duration::from_millis(500));

        let results = ScanEngine::new().scan(&config).await.unwrap();

        assert_eq!(results.len(), 1);
        let host = &results[0];
        assert_eq!(host.state_of(Port::new(open).unwrap()), Some(PortState::Open));
        assert_eq!(host.state_of(Port::new(closed).unwrap()), Some(PortState::Closed));
    }

    #[tokio::test]
    async fn test_progress_advances_per_host() {
        let targets: Vec<Target> = (1..=3).map(host).collect();
        let config = ScanConfig::new(targets, ports([1])).unwrap();
        let progress = ProgressBar::hidden();

        ScanEngine::with_prober(ScriptedProber::new())
            .with_progress(progress.clone())
            .scan(&config)
            .await
            .unwrap();

        assert_eq!(progress.position(), 3);
    }
}
