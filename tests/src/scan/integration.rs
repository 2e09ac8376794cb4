#![cfg(test)]
use async_trait::async_trait;
use netdiag_common::config::ScanOptions;
use netdiag_common::network::ports::PortSet;
use netdiag_core::probe::{ProbeOutcome, Prober};
use netdiag_core::scanner;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;

/// Pretends that only the given ports are open and tracks how many probes overlap.
struct FakeHost {
    open: Vec<u16>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeHost {
    fn with_open(open: &[u16]) -> Self {
        Self {
            open: open.to_vec(),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Prober for FakeHost {
    type Target = u16;

    async fn probe(&self, port: u16, _timeout: Duration) -> ProbeOutcome<u16> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(2)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.open.contains(&port) {
            ProbeOutcome::reachable(port)
        } else {
            ProbeOutcome::unreachable(port, "connection refused")
        }
    }
}

/// A loopback port with nothing listening on it.
async fn closed_port() -> anyhow::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    Ok(listener.local_addr()?.port())
}

fn options(workers: usize) -> ScanOptions {
    ScanOptions {
        timeout: Duration::from_millis(500),
        workers,
    }
}

#[tokio::test]
async fn only_the_open_port_is_reported_open() {
    let host = Arc::new(FakeHost::with_open(&[80]));
    let ports: PortSet = "22,80,443".parse().unwrap();

    let map = scanner::scan_ports_with(host, ports, options(200), None).await;

    assert_eq!(map, BTreeMap::from([(22, false), (80, true), (443, false)]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn wide_range_respects_the_worker_ceiling() {
    let host = Arc::new(FakeHost::with_open(&[8080, 8443]));
    let ports: PortSet = "8000-8999,22,22,8080".parse().unwrap();
    assert_eq!(ports.len(), 1001);

    let map = scanner::scan_ports_with(host.clone(), ports.clone(), options(16), None).await;

    assert!(host.peak.load(Ordering::SeqCst) <= 16);
    assert_eq!(map.keys().copied().collect::<Vec<u16>>(), ports.as_slice());
    assert_eq!(map.values().filter(|open| **open).count(), 2);
}

#[tokio::test]
async fn loopback_listener_is_found_among_closed_ports() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let open = listener.local_addr()?.port();
    let closed_a = closed_port().await?;
    let closed_b = closed_port().await?;

    let spec = format!("{closed_a},{open},{closed_b}");
    let report = scanner::scan_ports("127.0.0.1", &spec, options(8), None).await;

    assert!(report.success, "{:?}", report.error);
    assert_eq!(report.ip, Some(IpAddr::V4(Ipv4Addr::LOCALHOST)));
    let ports = report.outcome().map_err(|e| anyhow::anyhow!("{e}"))?;
    assert_eq!(ports.len(), 3);
    assert_eq!(ports.get(&open), Some(&true));
    assert_eq!(report.open_ports(), vec![open]);
    Ok(())
}

#[tokio::test]
async fn host_names_are_resolved_once() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let open = listener.local_addr()?.port();

    let report = scanner::scan_ports("localhost", &open.to_string(), options(4), None).await;

    assert!(report.success, "{:?}", report.error);
    assert_eq!(report.host, "localhost");
    assert!(report.ip.is_some());
    Ok(())
}

#[tokio::test]
async fn malformed_specs_never_scan() {
    for spec in ["22,,80", "80-22", "", "65536", "22,abc"] {
        let report = scanner::scan_ports("127.0.0.1", spec, options(4), None).await;

        let value: Value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["success"], json!(false), "{spec:?}");
        assert!(value["error"].as_str().is_some_and(|e| !e.is_empty()), "{spec:?}");
        assert!(value.get("ports").is_none(), "{spec:?}");
    }
}
