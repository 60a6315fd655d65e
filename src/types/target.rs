//! Target specification types and resolution.
//!
//! A raw target argument is recognized in this order:
//! - Comma-separated list of literal targets ("10.0.0.1,example.com")
//! - Dashed per-octet IP ranges ("10.0.0-1.5"), rejected as unsupported
//! - CIDR notation ("192.168.1.0/24")
//! - Single IP addresses (IPv4 and IPv6)
//! - Hostnames ("example.com"), resolved through DNS

use ipnetwork::IpNetwork;
use serde::{Serialize, Serializer};
use std::fmt;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;
use tracing::debug;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

use crate::error::ScanResult;
use crate::types::Port;

/// A single host to scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// An IP address, probed directly.
    Ip(IpAddr),
    /// A hostname taken literally from a target list; looked up at probe time.
    Name(String),
}

impl Target {
    /// Parse one literal list element: an IP address or a valid hostname.
    ///
    /// Dashed ranges are rejected here too, so a list cannot smuggle one in
    /// as a hostname.
    pub fn parse_literal(s: &str) -> Result<Self, TargetError> {
        let s = s.trim();
        if is_dashed_range(s) {
            return Err(TargetError::RangeNotSupported(s.to_string()));
        }
        if let Ok(ip) = s.parse::<IpAddr>() {
            return Ok(Self::Ip(ip));
        }
        if is_valid_hostname(s) {
            return Ok(Self::Name(s.to_string()));
        }
        Err(TargetError::InvalidFormat(s.to_string()))
    }

    /// The IP address, if this target is an address literal.
    pub fn ip(&self) -> Option<IpAddr> {
        match self {
            Self::Ip(ip) => Some(*ip),
            Self::Name(_) => None,
        }
    }

    /// Socket addresses for `port` on this target.
    ///
    /// Names go through the system resolver; callers bound this with their
    /// own timeout.
    pub async fn socket_addrs(&self, port: Port) -> io::Result<Vec<SocketAddr>> {
        match self {
            Self::Ip(ip) => Ok(vec![SocketAddr::new(*ip, port.as_u16())]),
            Self::Name(name) => {
                Ok(tokio::net::lookup_host((name.as_str(), port.as_u16()))
                    .await?
                    .collect())
            }
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip(ip) => write!(f, "{}", ip),
            Self::Name(name) => write!(f, "{}", name),
        }
    }
}

impl Serialize for Target {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Error type for target parsing and resolution.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TargetError {
    #[error("invalid target format: '{0}'")]
    InvalidFormat(String),
    #[error("empty target in list '{0}'")]
    EmptyListElement(String),
    #[error("IP range definitions are not yet supported: {0}")]
    RangeNotSupported(String),
    #[error("invalid CIDR notation: {0}")]
    InvalidCidr(String),
    #[error("CIDR range too large: {0} addresses (max: {1})")]
    CidrTooLarge(u128, u128),
    #[error("failed to resolve hostname '{0}': {1}")]
    DnsResolutionFailed(String, String),
    #[error("no IP addresses found for hostname '{0}'")]
    NoAddressesFound(String),
}

/// A parsed target argument that may expand to many targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// Comma-separated literal targets, in the order written.
    List(Vec<Target>),
    /// A CIDR network block.
    Cidr(IpNetwork),
    /// A single IP address.
    Single(IpAddr),
    /// A hostname to be resolved.
    Hostname(String),
}

impl TargetSpec {
    /// Maximum number of hosts allowed in a CIDR range.
    pub const MAX_CIDR_HOSTS: u128 = 65536;

    /// Parse a target specification from a string.
    pub fn parse(s: &str) -> Result<Self, TargetError> {
        let s = s.trim();

        if s.contains(',') {
            let targets = s
                .split(',')
                .map(|part| {
                    if part.trim().is_empty() {
                        Err(TargetError::EmptyListElement(s.to_string()))
                    } else {
                        Target::parse_literal(part)
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Self::List(targets));
        }

        if is_dashed_range(s) {
            return Err(TargetError::RangeNotSupported(s.to_string()));
        }

        if s.contains('/') {
            let network: IpNetwork = s
                .parse()
                .map_err(|_| TargetError::InvalidCidr(s.to_string()))?;
            let host_count = block_size(&network);
            if host_count > Self::MAX_CIDR_HOSTS {
                return Err(TargetError::CidrTooLarge(host_count, Self::MAX_CIDR_HOSTS));
            }
            return Ok(Self::Cidr(network));
        }

        if let Ok(ip) = s.parse::<IpAddr>() {
            return Ok(Self::Single(ip));
        }

        if is_valid_hostname(s) {
            return Ok(Self::Hostname(s.to_string()));
        }

        Err(TargetError::InvalidFormat(s.to_string()))
    }

    /// Expand this specification into concrete targets.
    ///
    /// Only the `Hostname` form touches the network (a DNS query).
    pub async fn resolve(&self) -> Result<Vec<Target>, TargetError> {
        match self {
            Self::List(targets) => Ok(targets.clone()),
            Self::Cidr(network) => Ok(expand_network(network)),
            Self::Single(ip) => Ok(vec![Target::Ip(*ip)]),
            Self::Hostname(hostname) => lookup(hostname).await,
        }
    }
}

impl FromStr for TargetSpec {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(targets) => {
                let parts: Vec<String> = targets.iter().map(|t| t.to_string()).collect();
                write!(f, "{}", parts.join(","))
            }
            Self::Cidr(network) => write!(f, "{}", network),
            Self::Single(ip) => write!(f, "{}", ip),
            Self::Hostname(hostname) => write!(f, "{}", hostname),
        }
    }
}

/// Resolve a raw target argument into an ordered list of targets.
pub async fn resolve(argument: &str) -> ScanResult<Vec<Target>> {
    let spec = TargetSpec::parse(argument)?;
    let targets = spec.resolve().await?;
    debug!(argument, count = targets.len(), "resolved targets");
    Ok(targets)
}

/// Total number of addresses in a block.
fn block_size(network: &IpNetwork) -> u128 {
    let host_bits = match network {
        IpNetwork::V4(net) => 32 - u32::from(net.prefix()),
        IpNetwork::V6(net) => 128 - u32::from(net.prefix()),
    };
    1u128.checked_shl(host_bits).unwrap_or(u128::MAX)
}

/// Every address in the block, ascending.
///
/// IPv4 blocks up to /30 drop the network and broadcast addresses; /31 and
/// /32 have neither and are emitted whole.
fn expand_network(network: &IpNetwork) -> Vec<Target> {
    match network {
        IpNetwork::V4(net) => {
            let first = u32::from(net.network());
            let last = u32::from(net.broadcast());
            let (first, last) = if net.prefix() < 31 {
                (first + 1, last - 1)
            } else {
                (first, last)
            };
            (first..=last)
                .map(|n| Target::Ip(IpAddr::V4(Ipv4Addr::from(n))))
                .collect()
        }
        IpNetwork::V6(net) => {
            let first = u128::from(net.network());
            let last = first + (block_size(network) - 1);
            (first..=last)
                .map(|n| Target::Ip(IpAddr::V6(Ipv6Addr::from(n))))
                .collect()
        }
    }
}

async fn lookup(hostname: &str) -> Result<Vec<Target>, TargetError> {
    let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
        debug!(error = %e, "system resolver config unavailable, using defaults");
        TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
    });

    let response = resolver
        .lookup_ip(hostname)
        .await
        .map_err(|e| TargetError::DnsResolutionFailed(hostname.to_string(), e.to_string()))?;

    let targets: Vec<Target> = response.iter().map(Target::Ip).collect();
    if targets.is_empty() {
        return Err(TargetError::NoAddressesFound(hostname.to_string()));
    }
    Ok(targets)
}

/// Dotted numeric notation where at least one octet is written as `a-b`.
fn is_dashed_range(s: &str) -> bool {
    let is_octet = |p: &str| !p.is_empty() && p.len() <= 3 && p.bytes().all(|b| b.is_ascii_digit());

    let mut saw_dash = false;
    let mut parts = 0;
    for part in s.split('.') {
        parts += 1;
        match part.split_once('-') {
            Some((lo, hi)) => {
                if !is_octet(lo) || !is_octet(hi) {
                    return false;
                }
                saw_dash = true;
            }
            None if is_octet(part) => {}
            None => return false,
        }
    }
    saw_dash && parts > 1
}

/// Check if a string is a valid hostname.
fn is_valid_hostname(s: &str) -> bool {
    if s.is_empty() || s.len() > 253 {
        return false;
    }

    let mut all_numeric = true;
    for label in s.split('.') {
        if label.is_empty() || label.len() > 63 {
            return false;
        }
        if !label.starts_with(|c: char| c.is_ascii_alphanumeric())
            || !label.ends_with(|c: char| c.is_ascii_alphanumeric())
        {
            return false;
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return false;
        }
        all_numeric &= label.bytes().all(|b| b.is_ascii_digit());
    }

    // "999.1.1.1" is a bad address, not a name.
    !all_numeric
}
