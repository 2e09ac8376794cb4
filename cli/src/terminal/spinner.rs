use colored::*;
use indicatif::ProgressStyle;
use netdiag_core::aggregator::{Progress, ProgressFn};
use tracing::Span;
use tracing_indicatif::IndicatifLayer;
use tracing_indicatif::filter::IndicatifFilter;
use tracing_indicatif::span_ext::IndicatifSpanExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::terminal::logging::NetdiagFormatter;

const TICK_STRINGS: &[&str] = &[
    "▁▁▁▁▁",
    "▁▂▂▂▁",
    "▁▄▂▄▁",
    "▂▄▆▄▂",
    "▄▆█▆▄",
    "▂▄▆▄▂",
    "▁▄▂▄▁",
    "▁▂▂▂▁",
];

const PROGRESS_TEMPLATE: &str = "{spinner:.blue} {msg} [{bar:30.green/bright_black}] {pos}/{len} ({elapsed})";

/// Installs the global subscriber. Log lines are routed through the progress
/// layer's writer so they are printed above any live spinner.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,netdiag={level},netdiag_core={level},netdiag_common={level}")));

    let indicatif_layer = IndicatifLayer::new().with_progress_style(spinner_style());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .event_format(NetdiagFormatter)
        .with_writer(indicatif_layer.get_stderr_writer())
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(indicatif_layer.with_filter(IndicatifFilter::new(false)))
        .init();
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(TICK_STRINGS)
}

fn progress_style() -> ProgressStyle {
    ProgressStyle::with_template(PROGRESS_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .tick_strings(TICK_STRINGS)
        .progress_chars("█▆▁")
}

/// Turns `span` into a progress bar and returns a callback that keeps it
/// current. `label` names what `reachable` counts, e.g. "open".
pub fn progress_reporter(span: &Span, label: &'static str) -> ProgressFn {
    span.pb_set_style(&progress_style());
    span.pb_set_message(&progress_message(0, label));

    let span = span.clone();
    Box::new(move |progress: Progress| {
        span.pb_set_length(progress.total);
        span.pb_set_position(progress.scanned);
        span.pb_set_message(&progress_message(progress.reachable, label));
    })
}

fn progress_message(reachable: u64, label: &str) -> String {
    format!("{} {}", reachable.to_string().green().bold(), label)
}
