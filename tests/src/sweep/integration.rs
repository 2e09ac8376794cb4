#![cfg(test)]
use async_trait::async_trait;
use netdiag_common::config::{SweepMethod, SweepOptions};
use netdiag_common::network::target::CidrBlock;
use netdiag_core::aggregator::{Progress, ProgressFn};
use netdiag_core::probe::{HandshakeProber, ProbeOutcome, Prober};
use netdiag_core::scanner;
use serde_json::json;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// Answers for the listed addresses only, after a short delay.
#[derive(Default)]
struct FakeNetwork {
    alive: Vec<Ipv4Addr>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl Prober for FakeNetwork {
    type Target = Ipv4Addr;

    async fn probe(&self, addr: Ipv4Addr, _timeout: Duration) -> ProbeOutcome<Ipv4Addr> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(1)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.alive.contains(&addr) {
            ProbeOutcome::reachable(addr)
        } else {
            ProbeOutcome::silent(addr)
        }
    }
}

fn options(workers: usize) -> SweepOptions {
    SweepOptions {
        timeout: Duration::from_secs(1),
        workers,
        method: SweepMethod::Ping,
    }
}

fn block(cidr: &str) -> CidrBlock {
    cidr.parse().unwrap()
}

#[tokio::test]
async fn dead_block_is_a_successful_empty_sweep() {
    let report = scanner::sweep_with(block("192.0.2.0/30"), Arc::new(FakeNetwork::default()), options(50), None).await;

    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        json!({
            "cidr": "192.0.2.0/30",
            "timeout": 1,
            "workers": 50,
            "total_hosts": 2,
            "scanned": 2,
            "alive_count": 0,
            "alive_hosts": [],
            "success": true
        })
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn full_class_c_respects_the_worker_ceiling() {
    let alive = vec![Ipv4Addr::new(10, 1, 2, 1), Ipv4Addr::new(10, 1, 2, 77), Ipv4Addr::new(10, 1, 2, 254)];
    let network = Arc::new(FakeNetwork {
        alive: alive.clone(),
        ..FakeNetwork::default()
    });

    let report = scanner::sweep_with(block("10.1.2.99/24"), network.clone(), options(5), None).await;

    assert!(network.peak.load(Ordering::SeqCst) <= 5);
    assert_eq!(report.cidr, "10.1.2.0/24");
    assert_eq!(report.total_hosts, 254);
    assert_eq!(report.scanned, 254);
    assert_eq!(report.alive_count as usize, report.alive_hosts.len());

    let mut found = report.alive_hosts.clone();
    found.sort();
    assert_eq!(found, alive);
}

#[tokio::test]
async fn point_to_point_block_has_no_hosts() {
    let network = Arc::new(FakeNetwork::default());
    let report = scanner::sweep_with(block("10.0.0.0/31"), network.clone(), options(4), None).await;

    assert!(report.success);
    assert_eq!(report.total_hosts, 0);
    assert_eq!(report.scanned, 0);
    assert_eq!(network.peak.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn progress_reaches_the_total() {
    let seen: Arc<Mutex<Vec<Progress>>> = Arc::default();
    let sink = seen.clone();
    let on_progress: ProgressFn = Box::new(move |progress: Progress| sink.lock().unwrap().push(progress));

    let network = Arc::new(FakeNetwork {
        alive: vec![Ipv4Addr::new(172, 16, 0, 3)],
        ..FakeNetwork::default()
    });
    scanner::sweep_with(block("172.16.0.0/28"), network, options(3), Some(&on_progress)).await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 14);
    assert!(seen.windows(2).all(|pair| pair[0].scanned < pair[1].scanned));
    assert_eq!(seen.last(), Some(&Progress { scanned: 14, total: 14, reachable: 1 }));
}

#[tokio::test]
async fn invalid_cidr_reports_the_input() {
    let report = scanner::sweep("10.0.0.0/40", options(4), None).await;

    assert!(!report.success);
    assert_eq!(report.cidr, "10.0.0.0/40");
    assert!(report.error.unwrap().starts_with("Invalid CIDR notation: "));
    assert_eq!(report.alive_count, 0);
}

#[tokio::test]
async fn handshake_sweep_finds_loopback_listener() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();

    let report = scanner::sweep_with(block("127.0.0.1/32"), Arc::new(HandshakeProber::new(port)), options(1), None).await;

    assert_eq!(report.outcome().map_err(|e| anyhow::anyhow!("{e}"))?, [Ipv4Addr::LOCALHOST]);
    Ok(())
}
