use std::net::Ipv4Addr;

use pnet::ipnetwork::Ipv4Network;

use crate::error::ValidationError;

/// An inclusive, non-empty run of IPv4 addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Range {
    pub start_addr: Ipv4Addr,
    pub end_addr: Ipv4Addr,
}

impl Ipv4Range {
    /// Builds a range, swapping the bounds if they arrive reversed.
    pub fn new(start_addr: Ipv4Addr, end_addr: Ipv4Addr) -> Self {
        if start_addr <= end_addr {
            Self { start_addr, end_addr }
        } else {
            Self {
                start_addr: end_addr,
                end_addr: start_addr,
            }
        }
    }

    pub fn len(&self) -> u64 {
        let start: u32 = self.start_addr.into();
        let end: u32 = self.end_addr.into();
        u64::from(end - start) + 1
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.start_addr <= addr && addr <= self.end_addr
    }

    /// Lazily walks the range in ascending order.
    pub fn to_iter(self) -> impl Iterator<Item = Ipv4Addr> + Send + 'static {
        let start: u32 = self.start_addr.into();
        let end: u32 = self.end_addr.into();
        (start..=end).map(Ipv4Addr::from)
    }
}

/// Network and broadcast bounds of the block containing `ip`.
pub fn cidr_range(ip: Ipv4Addr, prefix: u8) -> Result<Ipv4Range, ValidationError> {
    let network = Ipv4Network::new(ip, prefix).map_err(|e| ValidationError::cidr(e.to_string()))?;
    Ok(Ipv4Range::new(network.network(), network.broadcast()))
}

/// Addresses of the block that can be assigned to a host.
///
/// Network and broadcast are stripped when the block is /30 or larger.
/// A /31 has no usable host under that rule and yields `None`; a /32 is the host itself.
pub fn usable_range(ip: Ipv4Addr, prefix: u8) -> Result<Option<Ipv4Range>, ValidationError> {
    let full = cidr_range(ip, prefix)?;

    let range = match prefix {
        32 => Some(full),
        31 => None,
        _ => {
            let start = u32::from(full.start_addr).saturating_add(1);
            let end = u32::from(full.end_addr).saturating_sub(1);
            Some(Ipv4Range::new(Ipv4Addr::from(start), Ipv4Addr::from(end)))
        }
    };

    Ok(range)
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
    fn cidr_range_basic_24() {
        let range = cidr_range(Ipv4Addr::new(192, 168, 1, 42), 24).unwrap();
        assert_eq!(range.start_addr, Ipv4Addr::new(192, 168, 1, 0));
        assert_eq!(range.end_addr, Ipv4Addr::new(192, 168, 1, 255));
        assert_eq!(range.len(), 256);
    }

    #[test]
    fn cidr_range_prefix_0() {
        let range = cidr_range(Ipv4Addr::new(10, 20, 30, 40), 0).unwrap();
        assert_eq!(range.start_addr, Ipv4Addr::new(0, 0, 0, 0));
        assert_eq!(range.end_addr, Ipv4Addr::new(255, 255, 255, 255));
        assert_eq!(range.len(), 1 << 32);
    }

    #[test]
    fn cidr_range_rejects_prefix_over_32() {
        assert!(cidr_range(Ipv4Addr::new(10, 0, 0, 0), 33).is_err());
    }

    #[test]
    fn usable_range_strips_network_and_broadcast() {
        let range = usable_range(Ipv4Addr::new(172, 16, 5, 10), 20).unwrap().unwrap();
        assert_eq!(range.start_addr, Ipv4Addr::new(172, 16, 0, 1));
        assert_eq!(range.end_addr, Ipv4Addr::new(172, 16, 15, 254));
    }

    #[test]
    fn usable_range_edge_prefixes() {
        let slash30 = usable_range(Ipv4Addr::new(192, 0, 2, 0), 30).unwrap().unwrap();
        assert_eq!(slash30.len(), 2);

        assert_eq!(usable_range(Ipv4Addr::new(192, 0, 2, 0), 31).unwrap(), None);

        let host = Ipv4Addr::new(203, 0, 113, 7);
        let slash32 = usable_range(host, 32).unwrap().unwrap();
        assert_eq!(slash32.to_iter().collect::<Vec<_>>(), vec![host]);
    }

    #[test]
    fn usable_range_count_matches_formula() {
        for prefix in 8..=30u8 {
            let range = usable_range(Ipv4Addr::new(10, 0, 0, 0), prefix).unwrap().unwrap();
            assert_eq!(range.len(), (1u64 << (32 - prefix)) - 2, "prefix /{prefix}");
        }
    }

    #[test]
    fn new_orders_reversed_bounds() {
        let a = Ipv4Addr::new(10, 0, 0, 9);
        let b = Ipv4Addr::new(10, 0, 0, 1);
        let range = Ipv4Range::new(a, b);
        assert_eq!(range.start_addr, b);
        assert!(range.contains(Ipv4Addr::new(10, 0, 0, 5)));
        assert!(!range.contains(Ipv4Addr::new(10, 0, 0, 10)));
    }
}
