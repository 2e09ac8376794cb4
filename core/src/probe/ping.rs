//! Liveness through the operating system's `ping` binary.
//!
//! The binary is treated as an opaque unit of work: it is spawned once per
//! address, killed if it outlives its deadline, and its output is reduced to an
//! [`EchoReply`]. Whether that reply means "alive" is decided by a
//! [`LivenessPredicate`], so the matching rules can be swapped without touching
//! the process handling.

use std::net::Ipv4Addr;
use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;

use super::{ProbeOutcome, Prober};

/// Extra time the child gets on top of its own `-W` deadline before it is killed.
const COMMAND_GRACE: Duration = Duration::from_secs(2);
const PING_PROGRAM: &str = "ping";

/// What a single echo request produced, stripped of formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EchoReply {
    pub exit_success: bool,
    /// Replies counted in the summary line, if one was printed.
    pub received: Option<u32>,
    /// TTL of the first reply line, only present for genuine echo replies.
    pub ttl: Option<u8>,
}

impl EchoReply {
    pub fn parse(exit_success: bool, output: &str) -> Self {
        let lower = output.to_ascii_lowercase();
        Self {
            exit_success,
            received: lower.lines().find_map(parse_received),
            ttl: lower.lines().find_map(parse_ttl),
        }
    }
}

/// Decides whether an [`EchoReply`] proves the host is alive.
pub trait LivenessPredicate: Send + Sync + 'static {
    fn is_alive(&self, reply: &EchoReply) -> bool;
}

impl<F> LivenessPredicate for F
where
    F: Fn(&EchoReply) -> bool + Send + Sync + 'static,
{
    fn is_alive(&self, reply: &EchoReply) -> bool {
        self(reply)
    }
}

/// Default predicate: a clean exit plus a reply carrying a TTL.
///
/// Some platforms exit successfully and count an ICMP "unreachable" as a
/// received packet, so the exit code alone is not enough.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplyReceived;

impl LivenessPredicate for ReplyReceived {
    fn is_alive(&self, reply: &EchoReply) -> bool {
        reply.exit_success && reply.ttl.is_some() && reply.received != Some(0)
    }
}

/// Sends one echo request per address through the system `ping`.
#[derive(Debug, Clone)]
pub struct PingProber<P = ReplyReceived> {
    program: String,
    predicate: P,
}

impl PingProber<ReplyReceived> {
    pub fn new() -> Self {
        Self::with_predicate(ReplyReceived)
    }
}

impl Default for PingProber<ReplyReceived> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: LivenessPredicate> PingProber<P> {
    pub fn with_predicate(predicate: P) -> Self {
        Self {
            program: PING_PROGRAM.to_string(),
            predicate,
        }
    }

    /// Overrides the executable, e.g. an absolute path to `ping`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    async fn echo(&self, addr: Ipv4Addr, wait: Duration) -> Result<EchoReply, String> {
        let mut command = Command::new(&self.program);
        command
            .args(echo_args(addr, wait))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        match timeout(wait + COMMAND_GRACE, command.output()).await {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                Ok(EchoReply::parse(output.status.success(), &stdout))
            }
            Ok(Err(e)) => Err(format!("failed to run '{}': {e}", self.program)),
            Err(_elapsed) => Err(format!("'{}' did not exit in time", self.program)),
        }
    }
}

#[async_trait]
impl<P: LivenessPredicate> Prober for PingProber<P> {
    type Target = Ipv4Addr;

    async fn probe(&self, addr: Ipv4Addr, wait: Duration) -> ProbeOutcome<Ipv4Addr> {
        match self.echo(addr, wait).await {
            Ok(reply) if self.predicate.is_alive(&reply) => ProbeOutcome::reachable(addr),
            Ok(_) => ProbeOutcome::silent(addr),
            Err(reason) => ProbeOutcome::unreachable(addr, reason),
        }
    }
}

#[cfg(target_os = "windows")]
fn echo_args(addr: Ipv4Addr, wait: Duration) -> Vec<String> {
    let millis = wait.as_millis().max(1);
    vec!["-n".into(), "1".into(), "-w".into(), millis.to_string(), addr.to_string()]
}

#[cfg(target_os = "macos")]
fn echo_args(addr: Ipv4Addr, wait: Duration) -> Vec<String> {
    vec!["-c".into(), "1".into(), "-t".into(), whole_seconds(wait).to_string(), addr.to_string()]
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn echo_args(addr: Ipv4Addr, wait: Duration) -> Vec<String> {
    vec!["-c".into(), "1".into(), "-W".into(), whole_seconds(wait).to_string(), addr.to_string()]
}

/// `ping` only takes whole seconds; never round down to zero.
#[cfg_attr(target_os = "windows", allow(dead_code))]
fn whole_seconds(wait: Duration) -> u128 {
    wait.as_millis().div_ceil(1000).max(1)
}

fn parse_ttl(line: &str) -> Option<u8> {
    let (_, rest) = line.split_once("ttl=")?;
    leading_number(rest)
}

/// Handles both "1 packets transmitted, 1 received" and "Received = 1".
fn parse_received(line: &str) -> Option<u32> {
    if let Some((_, rest)) = line.split_once("received =") {
        return leading_number(rest.trim_start());
    }

    let (before, _) = line.split_once("received")?;
    before
        .split([',', ' '])
        .filter(|word| !word.is_empty())
        .rev()
        .find_map(|word| word.parse().ok())
}

fn leading_number<T: FromStr>(s: &str) -> Option<T> {
    let digits: String = s.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
