//! Ordered CIDR range sets.

use std::net::IpAddr;

use ipnetwork::{IpNetwork, IpNetworkError};

/// Immutable, ordered set of CIDR blocks loaded at startup.
#[derive(Debug, Clone, Default)]
pub struct IpRangeSet {
    ranges: Vec<IpNetwork>,
}

impl IpRangeSet {
    pub fn parse<S: AsRef<str>>(ranges: &[S]) -> Result<Self, IpNetworkError> {
        let ranges = ranges
            .iter()
            .map(|r| r.as_ref().trim().parse::<IpNetwork>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { ranges })
    }

    /// First range containing `ip`, in configuration order.
    ///
    /// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) are checked as IPv4.
    pub fn first_match(&self, ip: IpAddr) -> Option<&IpNetwork> {
        let ip = canonical(ip);
        self.ranges.iter().find(|range| range.contains(ip))
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        self.first_match(ip).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }
}

fn canonical(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
        v4 => v4,
    }
}
