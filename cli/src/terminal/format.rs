use std::net::IpAddr;
use std::time::Duration;

use crate::terminal::colors;
use colored::*;
use netdiag_common::network::ports::service_name;

/// `"443/tcp (HTTPS)"`, or `Unknown` for ports without a well-known service.
pub fn port_label(port: u16) -> String {
    format!("{port}/tcp ({})", service_name(port).unwrap_or("Unknown"))
}

/// Marker shown next to each listed open port.
pub fn open_marker() -> ColoredString {
    "open".color(colors::PORT_OPEN).bold()
}

pub fn ip(ip: &IpAddr) -> ColoredString {
    match ip {
        IpAddr::V4(addr) => addr.to_string().color(colors::IPV4_ADDR),
        IpAddr::V6(addr) => addr.to_string().color(colors::IPV6_ADDR),
    }
}

/// Colours the address and prefix of `"10.0.0.0/24"` separately.
pub fn cidr(cidr: &str) -> ColoredString {
    match cidr.split_once('/') {
        Some((address, prefix)) => format!(
            "{}{}{}",
            address.color(colors::IPV4_ADDR),
            "/".color(colors::SEPARATOR),
            prefix.color(colors::IPV4_PREFIX)
        )
        .normal(),
        None => cidr.color(colors::TEXT_DEFAULT),
    }
}

pub fn count(value: impl ToString) -> ColoredString {
    value.to_string().color(colors::ACCENT).bold()
}

/// Milliseconds below one second, seconds with two decimals above.
pub fn elapsed(duration: Duration) -> String {
    if duration < Duration::from_secs(1) {
        format!("{}ms", duration.as_millis())
    } else {
        format!("{:.2}s", duration.as_secs_f64())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_known_and_unknown_ports() {
        assert_eq!(port_label(22), format!("22/tcp ({})", service_name(22).unwrap()));
        assert_eq!(port_label(65000), "65000/tcp (Unknown)");
    }

    #[test]
    fn open_marker_reads_open() {
        colored::control::set_override(false);
        assert_eq!(open_marker().to_string(), "open");
    }

    #[test]
    fn elapsed_switches_units_at_one_second() {
        assert_eq!(elapsed(Duration::from_millis(850)), "850ms");
        assert_eq!(elapsed(Duration::from_millis(1234)), "1.23s");
        assert_eq!(elapsed(Duration::from_secs(12)), "12.00s");
    }

    #[test]
    fn cidr_without_prefix_is_left_as_is() {
        colored::control::set_override(false);
        assert_eq!(cidr("not a cidr").to_string(), "not a cidr");
        assert_eq!(cidr("10.0.0.0/8").to_string(), "10.0.0.0/8");
    }
}
