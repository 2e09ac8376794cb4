//! Line-oriented terminal output.
//!
//! Every line goes through [`print`], which emits a `raw_msg` event so the
//! formatter writes it verbatim above any live progress bar.

use std::cell::Cell;

use crate::terminal::{banner, colors};
use colored::*;
use tracing::info;
use unicode_width::UnicodeWidthStr;

pub const TOTAL_WIDTH: usize = 64;

thread_local! {
    static KEY_WIDTH: Cell<usize> = const { Cell::new(0) }
}

#[macro_export]
macro_rules! mprint {
    () => {
        $crate::terminal::print::print("");
    };
    ($msg:expr) => {
        $crate::terminal::print::print($msg);
    };
}

pub fn print(msg: &str) {
    info!(target: "netdiag::print", raw_msg = msg);
}

pub fn banner(no_banner: bool, q_level: u8) {
    if no_banner || q_level > 0 {
        return;
    }

    let title: String = format!("⟦ NETDIAG v{} ⟧ ", env!("CARGO_PKG_VERSION"));
    let side: ColoredString = "═"
        .repeat(TOTAL_WIDTH.saturating_sub(UnicodeWidthStr::width(title.as_str())) / 2)
        .bright_black();

    print(&format!("{side}{}{side}", title.bright_green().bold()));
    banner::print();
}

/// Section title centred in a rule, e.g. `───⟦ SCAN RESULTS ⟧───`.
pub fn header(msg: &str, q_level: u8) {
    if q_level > 0 {
        return;
    }

    let title: String = format!("⟦ {} ⟧", msg.to_uppercase());
    let rule: usize = TOTAL_WIDTH.saturating_sub(title.chars().count());
    let left: String = "─".repeat(rule / 2);
    let right: String = "─".repeat(rule - rule / 2);

    print(&format!("{}{}{}", left.bright_black(), title.bright_green(), right.bright_black()));
}

pub fn fat_separator() {
    print(&"═".repeat(TOTAL_WIDTH).bright_black().to_string());
}

/// Pads every following `aligned_line` key to the longest of `keys`.
pub fn set_key_width(keys: &[&str]) {
    KEY_WIDTH.set(keys.iter().map(|key| key.len()).max().unwrap_or(0));
}

/// `> Key.....: value`, with dots up to the width set by [`set_key_width`].
pub fn aligned_line(key: &str, value: impl Into<ColoredString>) {
    let leader: String = format!("{}:", dot_leader(key, KEY_WIDTH.get()));
    let line: String = format!(
        "{}{} {}",
        key.color(colors::PRIMARY),
        leader.color(colors::SEPARATOR),
        value.into()
    );
    print(&format!("{} {}", ">".color(colors::SEPARATOR), line.color(colors::TEXT_DEFAULT)));
}

/// `[n] name`, the head of a tree printed by [`as_tree_one_level`].
pub fn tree_head(count: usize, name: &str) {
    let count: String = format!("[{}]", count.to_string().color(colors::ACCENT));
    print(&format!("{} {}", count.color(colors::SEPARATOR), name.color(colors::PRIMARY)));
}

pub fn as_tree_one_level(entries: Vec<(String, ColoredString)>) {
    let width: usize = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let last: usize = entries.len().saturating_sub(1);

    for (i, (key, value)) in entries.into_iter().enumerate() {
        let branch: ColoredString = (if i == last { "└─" } else { "├─" }).bright_black();
        let leader: String = format!("{}:", dot_leader(&key, width));
        print(&format!(
            " {} {}{} {}",
            branch,
            key.color(colors::TEXT_DEFAULT),
            leader.color(colors::SEPARATOR),
            value
        ));
    }
}

/// Left-pads `msg` so its visible width sits in the middle of the line.
pub fn centerln(msg: &str) {
    let pad: String = " ".repeat(TOTAL_WIDTH.saturating_sub(console::measure_text_width(msg)) / 2);
    print(&format!("{pad}{msg}"));
}

/// Dots that carry `key` out to `width` plus one, so keys never touch the colon.
fn dot_leader(key: &str, width: usize) -> String {
    ".".repeat((width + 1).saturating_sub(key.len()))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
