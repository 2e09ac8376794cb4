//! Folds probe outcomes, arriving in any order, into report data.
//!
//! Each outcome is one mutation: a map insert for ports, a counter bump and an
//! optional append for hosts. Outcomes for targets outside the enumerated set,
//! and repeated outcomes for the same target, are dropped so the report
//! invariants hold no matter what the probes do.

use std::collections::{BTreeMap, HashSet};
use std::net::Ipv4Addr;

use netdiag_common::network::ports::PortSet;
use netdiag_common::network::target::CidrBlock;
use tracing::warn;

use crate::probe::ProbeOutcome;
use crate::scheduler::OutcomeStream;

/// Snapshot taken after each recorded outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub scanned: u64,
    pub total: u64,
    pub reachable: u64,
}

pub type ProgressFn = Box<dyn Fn(Progress) + Send + Sync>;

pub trait Aggregate<T> {
    fn record(&mut self, outcome: ProbeOutcome<T>) -> Progress;
}

/// Consumes `stream` to the end, reporting progress after every outcome.
pub async fn drain<T, A>(mut stream: OutcomeStream<T>, mut aggregator: A, on_progress: Option<&ProgressFn>) -> A
where
    A: Aggregate<T>,
{
    while let Some(outcome) = stream.next().await {
        let progress = aggregator.record(outcome);
        if let Some(callback) = on_progress {
            callback(progress);
        }
    }
    aggregator
}

pub struct PortAggregator {
    expected: PortSet,
    ports: BTreeMap<u16, bool>,
    open: u64,
}

impl PortAggregator {
    pub fn new(expected: PortSet) -> Self {
        Self {
            expected,
            ports: BTreeMap::new(),
            open: 0,
        }
    }

    pub fn finish(self) -> BTreeMap<u16, bool> {
        self.ports
    }

    fn progress(&self) -> Progress {
        Progress {
            scanned: self.ports.len() as u64,
            total: self.expected.len() as u64,
            reachable: self.open,
        }
    }
}

impl Aggregate<u16> for PortAggregator {
    fn record(&mut self, outcome: ProbeOutcome<u16>) -> Progress {
        let port = outcome.target;

        if !self.expected.contains(port) {
            warn!("Discarding outcome for unexpected port {port}");
        } else if self.ports.contains_key(&port) {
            warn!("Discarding repeated outcome for port {port}");
        } else {
            self.ports.insert(port, outcome.reachable);
            if outcome.reachable {
                self.open += 1;
            }
        }

        self.progress()
    }
}

/// Sweep state is a counter plus the alive hosts, so memory follows
/// `alive_count` and never the size of the block. Repeats are caught for alive
/// hosts and once the count reaches the block size; the scheduler reports each
/// admitted host once.
pub struct SweepAggregator {
    block: CidrBlock,
    scanned: u64,
    alive: HashSet<Ipv4Addr>,
    alive_hosts: Vec<Ipv4Addr>,
}

impl SweepAggregator {
    pub fn new(block: CidrBlock) -> Self {
        Self {
            block,
            scanned: 0,
            alive: HashSet::new(),
            alive_hosts: Vec::new(),
        }
    }

    pub fn scanned(&self) -> u64 {
        self.scanned
    }

    /// Alive hosts in arrival order.
    pub fn finish(self) -> Vec<Ipv4Addr> {
        self.alive_hosts
    }

    fn progress(&self) -> Progress {
        Progress {
            scanned: self.scanned(),
            total: self.block.total_hosts(),
            reachable: self.alive_hosts.len() as u64,
        }
    }
}

impl Aggregate<Ipv4Addr> for SweepAggregator {
    fn record(&mut self, outcome: ProbeOutcome<Ipv4Addr>) -> Progress {
        let addr = outcome.target;

        if !self.block.contains_host(addr) {
            warn!("Discarding outcome for {addr}, not a host of {}", self.block);
        } else if self.alive.contains(&addr) || self.scanned >= self.block.total_hosts() {
            warn!("Discarding repeated outcome for {addr}");
        } else {
            self.scanned += 1;
            if outcome.reachable {
                netdiag_common::success!("{addr} is alive");
                self.alive.insert(addr);
                self.alive_hosts.push(addr);
            }
        }

        self.progress()
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
