pub mod scan;
pub mod sweep;

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, ArgGroup, Parser, ValueEnum};
use netdiag_common::config::{
    Config, DEFAULT_PORT_TIMEOUT, DEFAULT_PORT_WORKERS, DEFAULT_SWEEP_TIMEOUT,
    DEFAULT_SWEEP_WORKERS, ScanOptions, SweepMethod, SweepOptions,
};

#[derive(Parser, Debug)]
#[command(name = "netdiag", version)]
#[command(about = "Concurrent port scanner and network sweeper.")]
#[command(group(ArgGroup::new("target").required(true).args(["host", "sweep"])))]
#[command(group(ArgGroup::new("port_selection").args(["ports", "top_ports"])))]
pub struct CommandLine {
    /// Host to port scan (address or name)
    #[arg(long, requires = "port_selection")]
    pub host: Option<String>,

    /// Ports to scan, e.g. 22,80,443,8000-8100
    #[arg(long, value_name = "SPEC", requires = "host")]
    pub ports: Option<String>,

    /// Scan a built-in list of commonly exposed TCP ports
    #[arg(long, requires = "host")]
    pub top_ports: bool,

    /// Connect timeout per port
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_PORT_TIMEOUT.as_millis() as u64)]
    pub port_timeout: u64,

    /// Maximum number of ports probed at once
    #[arg(long, value_name = "N", default_value_t = DEFAULT_PORT_WORKERS, value_parser = worker_count)]
    pub port_workers: usize,

    /// Discover alive hosts in a CIDR block, e.g. 192.168.1.0/24
    #[arg(long, value_name = "CIDR", conflicts_with_all = ["host", "ports", "top_ports"])]
    pub sweep: Option<String>,

    /// Timeout per host during a sweep
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_SWEEP_TIMEOUT.as_secs(),
          value_parser = clap::value_parser!(u64).range(1..))]
    pub sweep_timeout: u64,

    /// Maximum number of hosts probed at once during a sweep
    #[arg(long, value_name = "N", default_value_t = DEFAULT_SWEEP_WORKERS, value_parser = worker_count)]
    pub sweep_workers: usize,

    /// How a sweep decides a host is alive
    #[arg(long, value_enum, default_value_t = MethodArg::Ping)]
    pub sweep_method: MethodArg,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Save the JSON report to a file
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Reduce output (-q drops decorations, -qq prints only the summary)
    #[arg(short, long, action = ArgAction::Count)]
    pub quiet: u8,

    /// Do not print the banner
    #[arg(long)]
    pub no_banner: bool,

    /// Show debug logs (-vv for trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    /// One echo request through the system ping
    Ping,
    /// TCP handshake on port 443, any answer counts
    Handshake,
}

impl From<MethodArg> for SweepMethod {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::Ping => SweepMethod::Ping,
            MethodArg::Handshake => SweepMethod::Handshake,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortSelection {
    Spec(String),
    Top,
}

/// What this invocation should do, after clap has enforced the exclusions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Sweep {
        cidr: String,
        options: SweepOptions,
    },
    Scan {
        host: String,
        ports: PortSelection,
        options: ScanOptions,
    },
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn config(&self) -> Config {
        Config {
            no_banner: self.no_banner,
            quiet: self.quiet,
            json: self.json,
            report: self.report.clone(),
        }
    }

    pub fn mode(&self) -> Mode {
        if let Some(cidr) = &self.sweep {
            return Mode::Sweep {
                cidr: cidr.clone(),
                options: SweepOptions {
                    timeout: Duration::from_secs(self.sweep_timeout),
                    workers: self.sweep_workers,
                    method: self.sweep_method.into(),
                },
            };
        }

        let ports = match &self.ports {
            Some(spec) => PortSelection::Spec(spec.clone()),
            None => PortSelection::Top,
        };

        Mode::Scan {
            host: self.host.clone().unwrap_or_default(),
            ports,
            options: ScanOptions {
                timeout: Duration::from_millis(self.port_timeout),
                workers: self.port_workers,
            },
        }
    }
}

fn worker_count(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
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
