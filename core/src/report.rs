//! Final, serialisable results of a scan or a sweep.
//!
//! Reports are plain values handed to the caller once a run ends. Failed runs
//! still produce a report, carrying `success: false` and the reason in `error`.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use netdiag_common::config::SweepOptions;
use serde::{Serialize, Serializer};

use crate::scheduler::Scheduler;

/// Port scan of one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// The host as the user wrote it.
    pub host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<IpAddr>,
    /// Port to open/closed, ascending. Absent when the scan never started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<BTreeMap<u16, bool>>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScanReport {
    pub(crate) fn completed(host: &str, ip: IpAddr, ports: BTreeMap<u16, bool>) -> Self {
        Self {
            host: host.to_string(),
            ip: Some(ip),
            ports: Some(ports),
            success: true,
            error: None,
        }
    }

    pub(crate) fn failed(host: &str, ip: Option<IpAddr>, error: impl Display) -> Self {
        Self {
            host: host.to_string(),
            ip,
            ports: None,
            success: false,
            error: Some(error.to_string()),
        }
    }

    /// The port mapping, or the reason the scan did not run.
    pub fn outcome(&self) -> Result<&BTreeMap<u16, bool>, &str> {
        match (&self.ports, &self.error) {
            (Some(ports), None) => Ok(ports),
            (_, Some(error)) => Err(error.as_str()),
            (None, None) => Err("scan did not run"),
        }
    }

    pub fn open_ports(&self) -> Vec<u16> {
        self.ports
            .iter()
            .flatten()
            .filter(|(_, open)| **open)
            .map(|(port, _)| *port)
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Liveness sweep of a CIDR block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub cidr: String,
    /// Per-probe timeout, in seconds.
    #[serde(serialize_with = "as_seconds")]
    pub timeout: Duration,
    /// Concurrency ceiling the scheduler actually enforced.
    #[serde(rename = "workers")]
    pub worker_limit: usize,
    pub total_hosts: u64,
    pub scanned: u64,
    pub alive_count: u64,
    /// Alive addresses in the order their replies arrived.
    pub alive_hosts: Vec<Ipv4Addr>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SweepReport {
    pub(crate) fn completed(
        cidr: String,
        options: &SweepOptions,
        total_hosts: u64,
        scanned: u64,
        alive_hosts: Vec<Ipv4Addr>,
    ) -> Self {
        Self {
            cidr,
            timeout: options.timeout,
            worker_limit: Scheduler::new(options.workers).limit(),
            total_hosts,
            scanned,
            alive_count: alive_hosts.len() as u64,
            alive_hosts,
            success: true,
            error: None,
        }
    }

    pub(crate) fn failed(cidr: &str, options: &SweepOptions, error: impl Display) -> Self {
        Self {
            cidr: cidr.to_string(),
            timeout: options.timeout,
            worker_limit: Scheduler::new(options.workers).limit(),
            total_hosts: 0,
            scanned: 0,
            alive_count: 0,
            alive_hosts: Vec::new(),
            success: false,
            error: Some(error.to_string()),
        }
    }

    /// The alive hosts, or the reason the sweep did not run.
    pub fn outcome(&self) -> Result<&[Ipv4Addr], &str> {
        match &self.error {
            Some(error) => Err(error.as_str()),
            None => Ok(&self.alive_hosts),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Whole seconds as an integer, anything finer as a float.
fn as_seconds<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    if duration.subsec_nanos() == 0 {
        serializer.serialize_u64(duration.as_secs())
    } else {
        serializer.serialize_f64(duration.as_secs_f64())
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
