//! # Port Specification
//!
//! Parses the `--ports` argument into the ordered set of ports a scan will probe.
//!
//! Accepted entries, separated by commas:
//! * A single port (e.g., `443`).
//! * An inclusive range (e.g., `8000-8100`).

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Frequently exposed TCP ports, used by `--top-ports`.
pub const TOP_PORTS: &[u16] = &[
    20, 21, 22, 23, 25, 53, 67, 68, 69, 80, 110, 111, 123, 135, 137, 138, 139, 143, 161, 389,
    443, 445, 514, 587, 631, 636, 873, 902, 989, 990, 993, 995, 1025, 1026, 1027, 1028, 1433,
    1434, 1723, 2049, 2082, 2083, 2181, 2375, 2376, 2484, 2487, 3050, 3128, 3306, 3389, 3690,
    4369, 5000, 5432, 5555, 5672, 5900, 5985, 5986, 6379, 6443, 6667, 6881, 7001, 7002, 7077,
    8000, 8008, 8080, 8081, 8123, 8443, 8888, 9000, 9001, 9042, 9092, 9200, 9300, 9418, 11211,
    27017, 27018, 27019, 28017,
];

/// A deduplicated, ascending set of TCP ports.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PortSet {
    ports: Vec<u16>,
}

impl PortSet {
    pub fn top_ports() -> Self {
        Self::from_iter(TOP_PORTS.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn contains(&self, port: u16) -> bool {
        self.ports.binary_search(&port).is_ok()
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.ports
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.ports.iter().copied()
    }
}

impl FromIterator<u16> for PortSet {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        let unique: BTreeSet<u16> = iter.into_iter().filter(|port| *port != 0).collect();
        Self {
            ports: unique.into_iter().collect(),
        }
    }
}

impl IntoIterator for PortSet {
    type Item = u16;
    type IntoIter = std::vec::IntoIter<u16>;

    fn into_iter(self) -> Self::IntoIter {
        self.ports.into_iter()
    }
}

impl FromStr for PortSet {
    type Err = ValidationError;

    /// Parses a specification like `"22,80,443,8000-8100"`.
    ///
    /// The whole input is rejected on the first bad entry, so a scan never
    /// starts with a partially parsed set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ValidationError::EmptyPortSpec);
        }

        let mut ports: BTreeSet<u16> = BTreeSet::new();

        for (position, token) in s.split(',').enumerate() {
            let token = token.trim();
            if token.is_empty() {
                return Err(ValidationError::EmptyPortToken { position });
            }

            match token.split_once('-') {
                Some((start_str, end_str)) => {
                    let start = parse_port(start_str, token)?;
                    let end = parse_port(end_str, token)?;
                    if start > end {
                        return Err(ValidationError::InvertedRange { start, end });
                    }
                    ports.extend(start..=end);
                }
                None => {
                    ports.insert(parse_port(token, token)?);
                }
            }
        }

        Ok(Self {
            ports: ports.into_iter().collect(),
        })
    }
}

impl fmt::Display for PortSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.ports.iter().map(u16::to_string).collect();
        write!(f, "{}", joined.join(","))
    }
}

/// Parses one bound. `token` is the whole entry, kept for the error message.
fn parse_port(s: &str, token: &str) -> Result<u16, ValidationError> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidPort {
            token: token.to_string(),
        });
    }

    // Digits only, so the only way this fails is overflow.
    let value: u64 = s.parse().unwrap_or(u64::MAX);

    match u16::try_from(value) {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ValidationError::PortOutOfRange { value }),
    }
}

/// Well-known service usually listening on `port`.
pub fn service_name(port: u16) -> Option<&'static str> {
    let name = match port {
        21 => "FTP",
        22 => "SSH",
        23 => "Telnet",
        25 => "SMTP",
        53 => "DNS",
        80 => "HTTP",
        110 => "POP3",
        143 => "IMAP",
        443 => "HTTPS",
        445 => "SMB",
        3306 => "MySQL",
        3389 => "RDP",
        5432 => "PostgreSQL",
        5900 => "VNC",
        8080 => "HTTP-Alt",
        8443 => "HTTPS-Alt",
        27017 => "MongoDB",
        _ => return None,
    };
    Some(name)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
