use std::time::{Duration, Instant};

use colored::*;
use netdiag_common::config::{Config, SweepOptions};
use netdiag_core::report::SweepReport;
use netdiag_core::scanner;
use tracing::{Instrument, info_span};

use crate::mprint;
use crate::output;
use crate::terminal::{colors, format, print, spinner};

pub async fn sweep(cidr: &str, options: SweepOptions, cfg: &Config) -> anyhow::Result<()> {
    print::header("network sweep", cfg.quiet);

    let span = info_span!("sweep", indicatif.pb_show = true);
    let on_progress = spinner::progress_reporter(&span, "alive");

    let start_time: Instant = Instant::now();
    let report: SweepReport = scanner::sweep(cidr, options, Some(on_progress))
        .instrument(span)
        .await;
    let total_time: Duration = start_time.elapsed();

    if output::emit(&report, cfg)? {
        return Ok(());
    }

    sweep_ends(&report, total_time, cfg);
    Ok(())
}

fn sweep_ends(report: &SweepReport, total_time: Duration, cfg: &Config) {
    let alive_hosts = match report.outcome() {
        Ok(alive_hosts) => alive_hosts,
        Err(error) => {
            netdiag_common::error!("Sweep of {} failed: {error}", report.cidr);
            return;
        }
    };

    if cfg.quiet < 2 {
        print::header("sweep results", cfg.quiet);
        print_details(report);
        mprint!();

        if alive_hosts.is_empty() {
            print::centerln(&format!("{}", "No alive hosts found".red().bold()));
        } else {
            print_alive_hosts(alive_hosts);
        }
    }

    print_summary(report, total_time, cfg);
}

fn print_details(report: &SweepReport) {
    print::set_key_width(&["Target", "Hosts", "Alive", "Timeout", "Workers"]);
    print::aligned_line("Target", format::cidr(&report.cidr));
    print::aligned_line("Hosts", format::count(report.total_hosts));
    print::aligned_line("Alive", format::count(report.alive_count));
    print::aligned_line("Timeout", format!("{:?}", report.timeout));
    print::aligned_line("Workers", report.worker_limit.to_string());
}

fn print_alive_hosts(alive_hosts: &[std::net::Ipv4Addr]) {
    print::tree_head(alive_hosts.len(), "Alive hosts");
    let details: Vec<(String, ColoredString)> = alive_hosts
        .iter()
        .map(|host| ("IPv4".to_string(), host.to_string().color(colors::IPV4_ADDR)))
        .collect();
    print::as_tree_one_level(details);
}

fn print_summary(report: &SweepReport, total_time: Duration, cfg: &Config) {
    let alive: ColoredString = format!("{}/{} hosts alive", report.alive_count, report.total_hosts)
        .bold()
        .green();
    let total_time: ColoredString = format::elapsed(total_time).bold().yellow();
    let output: String = format!("Sweep Complete: {alive} in {total_time}");

    match cfg.quiet {
        0 => {
            print::fat_separator();
            print::centerln(&output);
        }
        _ => netdiag_common::success!("{}", output),
    }
}
