use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use colored::*;
use netdiag_common::config::{Config, ScanOptions};
use netdiag_common::network::ports::PortSet;
use netdiag_core::report::ScanReport;
use netdiag_core::scanner;
use tracing::{Instrument, info_span};

use crate::commands::PortSelection;
use crate::mprint;
use crate::output;
use crate::terminal::{format, print, spinner};

/// Open ports listed individually before the rest are summarised.
const MAX_LISTED_PORTS: usize = 20;

pub async fn scan(host: &str, ports: PortSelection, options: ScanOptions, cfg: &Config) -> anyhow::Result<()> {
    print::header("port scan", cfg.quiet);

    let span = info_span!("scan", indicatif.pb_show = true);
    let on_progress = spinner::progress_reporter(&span, "open");

    let start_time: Instant = Instant::now();
    let report: ScanReport = match ports {
        PortSelection::Spec(spec) => {
            scanner::scan_ports(host, &spec, options, Some(on_progress))
                .instrument(span)
                .await
        }
        PortSelection::Top => {
            scanner::scan_port_set(host, PortSet::top_ports(), options, Some(on_progress))
                .instrument(span)
                .await
        }
    };
    let total_time: Duration = start_time.elapsed();

    if output::emit(&report, cfg)? {
        return Ok(());
    }

    scan_ends(&report, total_time, cfg);
    Ok(())
}

fn scan_ends(report: &ScanReport, total_time: Duration, cfg: &Config) {
    let ports = match report.outcome() {
        Ok(ports) => ports,
        Err(error) => {
            netdiag_common::error!("Scan of {} failed: {error}", report.host);
            return;
        }
    };
    let open_ports: Vec<u16> = report.open_ports();

    if cfg.quiet < 2 {
        print::header("scan results", cfg.quiet);
        print_details(report, ports, open_ports.len());
        mprint!();
        print_open_ports(&open_ports);
    }

    print_summary(report, open_ports.len(), total_time, cfg);
}

fn print_details(report: &ScanReport, ports: &BTreeMap<u16, bool>, open: usize) {
    print::set_key_width(&["Host", "IP", "Total", "Open", "Closed"]);
    print::aligned_line("Host", report.host.as_str());
    if let Some(ip) = &report.ip {
        print::aligned_line("IP", format::ip(ip));
    }
    print::aligned_line("Total", format::count(ports.len()));
    print::aligned_line("Open", format::count(open));
    print::aligned_line("Closed", format::count(ports.len() - open));
}

fn print_open_ports(open_ports: &[u16]) {
    if open_ports.is_empty() {
        print::centerln(&format!("{}", "No open ports found".red().bold()));
        return;
    }

    print::tree_head(open_ports.len(), "Open ports");
    let details: Vec<(String, ColoredString)> = open_ports
        .iter()
        .take(MAX_LISTED_PORTS)
        .map(|port| (format::port_label(*port), format::open_marker()))
        .collect();
    print::as_tree_one_level(details);

    if let Some(rest) = open_ports.len().checked_sub(MAX_LISTED_PORTS).filter(|rest| *rest > 0) {
        print::print(&format!("   ... and {rest} more").dimmed().to_string());
    }
}

fn print_summary(report: &ScanReport, open: usize, total_time: Duration, cfg: &Config) {
    let open: ColoredString = format!("{open} open ports").bold().green();
    let total_time: ColoredString = format::elapsed(total_time).bold().yellow();
    let output: String = format!("Scan Complete: {open} on {} in {total_time}", report.host);

    match cfg.quiet {
        0 => {
            print::fat_separator();
            print::centerln(&output);
        }
        _ => netdiag_common::success!("{}", output),
    }
}
