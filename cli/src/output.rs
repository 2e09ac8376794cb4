use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use netdiag_common::config::Config;
use serde::Serialize;

/// Delivers `report` as JSON when asked to. A `--report` path takes precedence
/// over `--json`. Returns `true` when the report was emitted here and the
/// text rendering should be skipped.
pub fn emit<T: Serialize>(report: &T, cfg: &Config) -> anyhow::Result<bool> {
    if let Some(path) = &cfg.report {
        write_json_file(report, path)?;
        netdiag_common::success!("Report saved to {}", path.display());
        return Ok(true);
    }

    if cfg.json {
        let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
        println!("{json}");
        return Ok(true);
    }

    Ok(false)
}

pub fn write_json_file<T: Serialize>(report: &T, path: &Path) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create report file {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, report)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    Ok(())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
