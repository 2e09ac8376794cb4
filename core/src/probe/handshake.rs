use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;

use super::{ProbeOutcome, Prober};

pub const DEFAULT_HANDSHAKE_PORT: u16 = 443;

/// Liveness check that needs no external binary.
///
/// A host that completes the handshake, or actively refuses it, is up. Only a
/// timeout or a routing error counts as down.
#[derive(Debug, Clone, Copy)]
pub struct HandshakeProber {
    port: u16,
}

impl HandshakeProber {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

impl Default for HandshakeProber {
    fn default() -> Self {
        Self::new(DEFAULT_HANDSHAKE_PORT)
    }
}

#[async_trait]
impl Prober for HandshakeProber {
    type Target = Ipv4Addr;

    async fn probe(&self, addr: Ipv4Addr, probe_timeout: Duration) -> ProbeOutcome<Ipv4Addr> {
        let socket_addr: SocketAddr = SocketAddr::new(IpAddr::V4(addr), self.port);

        match timeout(probe_timeout, TcpStream::connect(socket_addr)).await {
            Ok(Ok(_stream)) => ProbeOutcome::reachable(addr),
            Ok(Err(e)) if answered(e.kind()) => ProbeOutcome::reachable(addr),
            Ok(Err(e)) => ProbeOutcome::unreachable(addr, e.to_string()),
            Err(_elapsed) => ProbeOutcome::silent(addr),
        }
    }
}

/// Errors that can only happen when the remote stack sent something back.
fn answered(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::ConnectionRefused | ErrorKind::ConnectionReset)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
