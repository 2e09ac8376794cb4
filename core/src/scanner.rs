//! Entry points for the two kinds of run: a port scan of one host and a sweep of
//! a CIDR block.
//!
//! Every run walks the same phases:
//! `Idle -> Enumerating -> Scanning -> Aggregating -> Done`.
//! Only problems found before the first probe is admitted (bad input, an
//! unresolvable host) end a run in `Failed`. Once scanning starts, individual
//! probe failures are just outcomes and the run always completes.

use std::collections::BTreeMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use netdiag_common::config::{ScanOptions, SweepMethod, SweepOptions};
use netdiag_common::error::ValidationError;
use netdiag_common::network::ports::PortSet;
use netdiag_common::network::target::CidrBlock;
use thiserror::Error;
use tracing::debug;

use crate::aggregator::{self, PortAggregator, ProgressFn, SweepAggregator};
use crate::probe::{HandshakeProber, PingProber, Prober, TcpConnectProber};
use crate::report::{ScanReport, SweepReport};
use crate::scheduler::Scheduler;

/// Reasons a run ends before any probe is sent.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("could not resolve host '{host}': {reason}")]
    Resolve { host: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Enumerating,
    Scanning,
    Aggregating,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Enumerating => "enumerating",
            Phase::Scanning => "scanning",
            Phase::Aggregating => "aggregating",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Phase bookkeeping for a single run.
struct Run {
    kind: &'static str,
    phase: Phase,
}

impl Run {
    fn start(kind: &'static str) -> Self {
        Self {
            kind,
            phase: Phase::Idle,
        }
    }

    fn advance(&mut self, next: Phase) {
        debug!(run = self.kind, from = %self.phase, to = %next, "Phase change");
        self.phase = next;
    }

    fn fail(&mut self, error: &dyn fmt::Display) {
        debug!(run = self.kind, phase = %self.phase, "Run failed: {error}");
        self.phase = Phase::Failed;
    }
}

/// Scans the ports named by `spec` (e.g. `"22,80,8000-8100"`) on `host`.
pub async fn scan_ports(
    host: &str,
    spec: &str,
    options: ScanOptions,
    on_progress: Option<ProgressFn>,
) -> ScanReport {
    let mut run = Run::start("scan");
    run.advance(Phase::Enumerating);

    match spec.parse::<PortSet>() {
        Ok(ports) => scan_enumerated(run, host, ports, options, on_progress).await,
        Err(e) => {
            run.fail(&e);
            ScanReport::failed(host, None, e)
        }
    }
}

/// Scans an already built port set, e.g. [`PortSet::top_ports`].
pub async fn scan_port_set(
    host: &str,
    ports: PortSet,
    options: ScanOptions,
    on_progress: Option<ProgressFn>,
) -> ScanReport {
    let mut run = Run::start("scan");
    run.advance(Phase::Enumerating);
    scan_enumerated(run, host, ports, options, on_progress).await
}

async fn scan_enumerated(
    mut run: Run,
    host: &str,
    ports: PortSet,
    options: ScanOptions,
    on_progress: Option<ProgressFn>,
) -> ScanReport {
    let ip = match resolve_host(host).await {
        Ok(ip) => ip,
        Err(e) => {
            run.fail(&e);
            return ScanReport::failed(host, None, e);
        }
    };

    debug!("Scanning {} ports on {host} ({ip})", ports.len());
    let prober = Arc::new(TcpConnectProber::new(ip));
    let map = scan_with(&mut run, prober, ports, options, on_progress.as_ref()).await;

    run.advance(Phase::Done);
    ScanReport::completed(host, ip, map)
}

/// Scans `ports` with any port prober; the returned map has exactly those keys.
pub async fn scan_ports_with<P>(
    prober: Arc<P>,
    ports: PortSet,
    options: ScanOptions,
    on_progress: Option<&ProgressFn>,
) -> BTreeMap<u16, bool>
where
    P: Prober<Target = u16>,
{
    let mut run = Run::start("scan");
    run.advance(Phase::Enumerating);
    let map = scan_with(&mut run, prober, ports, options, on_progress).await;
    run.advance(Phase::Done);
    map
}

async fn scan_with<P>(
    run: &mut Run,
    prober: Arc<P>,
    ports: PortSet,
    options: ScanOptions,
    on_progress: Option<&ProgressFn>,
) -> BTreeMap<u16, bool>
where
    P: Prober<Target = u16>,
{
    run.advance(Phase::Scanning);
    let scheduler = Scheduler::new(options.workers);
    let stream = scheduler.run(prober, ports.clone(), options.timeout);

    run.advance(Phase::Aggregating);
    let aggregator = aggregator::drain(stream, PortAggregator::new(ports), on_progress).await;
    aggregator.finish()
}

/// Sweeps every usable host of `cidr` with the method selected in `options`.
pub async fn sweep(cidr: &str, options: SweepOptions, on_progress: Option<ProgressFn>) -> SweepReport {
    let mut run = Run::start("sweep");
    run.advance(Phase::Enumerating);

    let block = match cidr.parse::<CidrBlock>() {
        Ok(block) => block,
        Err(e) => {
            run.fail(&e);
            return SweepReport::failed(cidr, &options, e);
        }
    };

    let on_progress = on_progress.as_ref();
    match options.method {
        SweepMethod::Ping => sweep_block(run, block, Arc::new(PingProber::new()), options, on_progress).await,
        SweepMethod::Handshake => {
            sweep_block(run, block, Arc::new(HandshakeProber::default()), options, on_progress).await
        }
    }
}

/// Sweeps an already parsed block with any liveness prober.
pub async fn sweep_with<P>(
    block: CidrBlock,
    prober: Arc<P>,
    options: SweepOptions,
    on_progress: Option<&ProgressFn>,
) -> SweepReport
where
    P: Prober<Target = Ipv4Addr>,
{
    let mut run = Run::start("sweep");
    run.advance(Phase::Enumerating);
    sweep_block(run, block, prober, options, on_progress).await
}

async fn sweep_block<P>(
    mut run: Run,
    block: CidrBlock,
    prober: Arc<P>,
    options: SweepOptions,
    on_progress: Option<&ProgressFn>,
) -> SweepReport
where
    P: Prober<Target = Ipv4Addr>,
{
    let total_hosts = block.total_hosts();
    netdiag_common::info!("Starting network sweep on {block} ({total_hosts} hosts)");

    run.advance(Phase::Scanning);
    let scheduler = Scheduler::new(options.workers);
    let stream = scheduler.run(prober, block.hosts(), options.timeout);

    run.advance(Phase::Aggregating);
    let cidr = block.to_string();
    let aggregator = aggregator::drain(stream, SweepAggregator::new(block), on_progress).await;
    let scanned = aggregator.scanned();
    let alive_hosts = aggregator.finish();

    run.advance(Phase::Done);
    netdiag_common::info!("Sweep complete: {}/{total_hosts} hosts alive", alive_hosts.len());
    SweepReport::completed(cidr, &options, total_hosts, scanned, alive_hosts)
}

/// Resolves `host` once, preferring an IPv4 address.
pub async fn resolve_host(host: &str) -> Result<IpAddr, ScanError> {
    let host = host.trim();
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }

    let resolve_error = |reason: String| ScanError::Resolve {
        host: host.to_string(),
        reason,
    };

    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, 0))
        .await
        .map_err(|e| resolve_error(e.to_string()))?
        .collect();

    addrs
        .iter()
        .map(SocketAddr::ip)
        .find(IpAddr::is_ipv4)
        .or_else(|| addrs.first().map(SocketAddr::ip))
        .ok_or_else(|| resolve_error("no addresses found".to_string()))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
