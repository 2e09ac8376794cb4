use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;

use super::{ProbeOutcome, Prober};

/// Connect-scan of one host: a port is open when the handshake completes.
#[derive(Debug, Clone, Copy)]
pub struct TcpConnectProber {
    host: IpAddr,
}

impl TcpConnectProber {
    pub fn new(host: IpAddr) -> Self {
        Self { host }
    }

    pub fn host(&self) -> IpAddr {
        self.host
    }
}

#[async_trait]
impl Prober for TcpConnectProber {
    type Target = u16;

    async fn probe(&self, port: u16, probe_timeout: Duration) -> ProbeOutcome<u16> {
        let socket_addr: SocketAddr = SocketAddr::new(self.host, port);

        match timeout(probe_timeout, TcpStream::connect(socket_addr)).await {
            // Dropping the stream closes it; nothing is written.
            Ok(Ok(_stream)) => ProbeOutcome::reachable(port),
            Ok(Err(e)) => ProbeOutcome::unreachable(port, e.to_string()),
            Err(_elapsed) => ProbeOutcome::unreachable(port, "connection timed out"),
        }
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
