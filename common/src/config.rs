use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT_TIMEOUT: Duration = Duration::from_millis(800);
pub const DEFAULT_PORT_WORKERS: usize = 200;
pub const DEFAULT_SWEEP_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_SWEEP_WORKERS: usize = 50;

/// Output settings shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub no_banner: bool,
    /// 0 prints everything, 1 drops decorations, 2 prints only the summary.
    pub quiet: u8,
    /// Print the JSON document instead of formatted text.
    pub json: bool,
    /// Where to persist the JSON document, if anywhere.
    pub report: Option<PathBuf>,
}

/// Tuning for a port scan against a single host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub timeout: Duration,
    pub workers: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_PORT_TIMEOUT,
            workers: DEFAULT_PORT_WORKERS,
        }
    }
}

/// How a sweep decides that a host is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepMethod {
    /// One echo request through the system `ping` binary.
    #[default]
    Ping,
    /// A TCP handshake attempt; an answer of any kind counts as alive.
    Handshake,
}

/// Tuning for a sweep of a CIDR block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepOptions {
    pub timeout: Duration,
    pub workers: usize,
    pub method: SweepMethod,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_SWEEP_TIMEOUT,
            workers: DEFAULT_SWEEP_WORKERS,
            method: SweepMethod::default(),
        }
    }
}
