use std::fmt;

use colored::*;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{self, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent};
use tracing_subscriber::registry::LookupSpan;

/// Field carrying pre-rendered terminal output, written without a prefix.
pub const RAW_FIELD: &str = "raw_msg";

pub struct NetdiagFormatter;

impl<S, N> FormatEvent<S, N> for NetdiagFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> format::FormatFields<'a> + 'static,
{
    fn format_event(&self, _ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        let mut fields = EventFields::default();
        event.record(&mut fields);

        writeln!(writer, "{}", render(event.metadata().level(), &fields))
    }
}

#[derive(Debug, Default)]
struct EventFields {
    message: Option<String>,
    raw: Option<String>,
    success: bool,
    extra: Vec<(&'static str, String)>,
}

impl Visit for EventFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            RAW_FIELD => self.raw = Some(value.to_string()),
            "status" => self.success = value == "success",
            "message" => self.message = Some(value.to_string()),
            name => self.extra.push((name, value.to_string())),
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = Some(format!("{value:?}")),
            name => self.extra.push((name, format!("{value:?}"))),
        }
    }
}

fn render(level: &Level, fields: &EventFields) -> String {
    if let Some(raw) = &fields.raw {
        return raw.clone();
    }

    let symbol: ColoredString = match *level {
        Level::TRACE => "[ ]".dimmed(),
        Level::DEBUG => "[?]".blue(),
        Level::INFO if fields.success => "[+]".green().bold(),
        Level::INFO => "[*]".cyan().bold(),
        Level::WARN => "[!]".yellow().bold(),
        Level::ERROR => "[-]".red().bold(),
    };

    let mut line = format!("{symbol} {}", fields.message.as_deref().unwrap_or_default());
    for (name, value) in &fields.extra {
        line.push_str(&format!(" {}", format!("{name}={value}").dimmed()));
    }
    line
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(message: &str) -> EventFields {
        EventFields {
            message: Some(message.to_string()),
            ..EventFields::default()
        }
    }

    #[test]
    fn raw_output_is_untouched() {
        let raw = EventFields {
            raw: Some("> Host.....: example".to_string()),
            ..fields("ignored")
        };
        assert_eq!(render(&Level::INFO, &raw), "> Host.....: example");
    }

    #[test]
    fn symbols_follow_level_and_status() {
        colored::control::set_override(false);

        assert_eq!(render(&Level::INFO, &fields("started")), "[*] started");
        assert_eq!(render(&Level::ERROR, &fields("boom")), "[-] boom");

        let success = EventFields {
            success: true,
            ..fields("10.0.0.1 is alive")
        };
        assert_eq!(render(&Level::INFO, &success), "[+] 10.0.0.1 is alive");
    }

    #[test]
    fn extra_fields_are_appended() {
        colored::control::set_override(false);

        let event = EventFields {
            extra: vec![("run", "sweep".to_string())],
            ..fields("Phase change")
        };
        assert_eq!(render(&Level::DEBUG, &event), "[?] Phase change run=sweep");
    }
}
