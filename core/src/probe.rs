//! The **unit of work** every scan is built from.
//!
//! A probe tests a single target once, bounded by a timeout, and reports a
//! binary outcome. Failures of any kind are folded into that outcome: a probe
//! never returns an error to the scheduler and never retries.
//!
//! Implementations:
//! * [`TcpConnectProber`] opens and immediately drops a TCP connection to one port.
//! * [`PingProber`] runs the system `ping` once against one address.
//! * [`HandshakeProber`] infers liveness from how an address answers a TCP handshake.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

mod handshake;
mod ping;
mod tcp;

pub use handshake::HandshakeProber;
pub use ping::{EchoReply, LivenessPredicate, PingProber, ReplyReceived};
pub use tcp::TcpConnectProber;

/// Result of one probe. Built once by the probe and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome<T> {
    pub target: T,
    /// Port open, or host alive.
    pub reachable: bool,
    /// Why the target was judged unreachable, when there is something to say.
    pub error: Option<String>,
}

impl<T> ProbeOutcome<T> {
    pub fn reachable(target: T) -> Self {
        Self {
            target,
            reachable: true,
            error: None,
        }
    }

    pub fn unreachable(target: T, reason: impl Into<String>) -> Self {
        Self {
            target,
            reachable: false,
            error: Some(reason.into()),
        }
    }

    /// Unreachable without a failure worth reporting (e.g., no echo reply).
    pub fn silent(target: T) -> Self {
        Self {
            target,
            reachable: false,
            error: None,
        }
    }
}

/// Executes one bounded reachability test.
#[async_trait]
pub trait Prober: Send + Sync + 'static {
    type Target: Copy + Debug + Send + Sync + 'static;

    /// Probes `target` once. Must resolve within roughly `timeout`.
    async fn probe(&self, target: Self::Target, timeout: Duration) -> ProbeOutcome<Self::Target>;
}
