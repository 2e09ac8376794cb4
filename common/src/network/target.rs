//! # Sweep Target Model
//!
//! Parses a CIDR block (e.g., `192.168.1.0/24`) and enumerates the host
//! addresses a sweep will probe.
//!
//! Host bits set in the address are masked off, so `192.168.1.77/24` names the
//! same block as `192.168.1.0/24`. Only IPv4 is supported.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::network::range::{self, Ipv4Range};

/// A validated IPv4 block plus its usable host range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CidrBlock {
    network: Ipv4Addr,
    prefix: u8,
    hosts: Option<Ipv4Range>,
}

impl FromStr for CidrBlock {
    type Err = ValidationError;

    /// Parses CIDR notation like "192.168.1.0/24".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some((ip_str, prefix_str)) = s.split_once('/') else {
            return Err(ValidationError::cidr(format!(
                "'{s}' is missing a prefix length"
            )));
        };

        let ipv4_addr = ip_str
            .parse::<Ipv4Addr>()
            .map_err(|e| ValidationError::cidr(format!("invalid address '{ip_str}': {e}")))?;

        if prefix_str.is_empty() || !prefix_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::cidr(format!("invalid prefix '{prefix_str}'")));
        }
        if prefix_str.len() > 1 && prefix_str.starts_with('0') {
            return Err(ValidationError::cidr(format!("leading zero in prefix '{prefix_str}'")));
        }

        let prefix = prefix_str
            .parse::<u8>()
            .map_err(|e| ValidationError::cidr(format!("invalid prefix '{prefix_str}': {e}")))?;

        if prefix > 32 {
            return Err(ValidationError::cidr(format!(
                "prefix length {prefix} exceeds 32 in '{s}'"
            )));
        }

        let network = range::cidr_range(ipv4_addr, prefix)?.start_addr;
        let hosts = range::usable_range(ipv4_addr, prefix)?;

        Ok(Self {
            network,
            prefix,
            hosts,
        })
    }
}

impl CidrBlock {
    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Number of addresses [`Self::hosts`] will yield.
    pub fn total_hosts(&self) -> u64 {
        self.hosts.map_or(0, |range| range.len())
    }

    pub fn contains_host(&self, addr: Ipv4Addr) -> bool {
        self.hosts.is_some_and(|range| range.contains(addr))
    }

    /// Usable hosts in ascending order, produced on demand.
    pub fn hosts(&self) -> impl Iterator<Item = Ipv4Addr> + Send + use<> {
        self.hosts.into_iter().flat_map(Ipv4Range::to_iter)
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
