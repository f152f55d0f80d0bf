//! Address predicates for selecting remote endpoints of interest.
//!
//! A matcher decides whether an observed remote address belongs to a
//! configured host or subnet. Matchers are parsed once from textual
//! descriptors (`10.0.0.5` for an exact host, `10.0.0.0/24` for a CIDR
//! range), hold no mutable state, and are safe to share across threads.
//!
//! IPv4 only - the capture layer reports IPv4 endpoints.

use std::fmt;
use std::net::Ipv4Addr;

use crate::domain::errors::AddressParseError;

/// Predicate over an observed remote address.
pub trait AddressMatcher: Send + Sync {
    /// Whether `addr` falls inside this matcher's range.
    fn matches(&self, addr: Ipv4Addr) -> bool;
}

/// An exact host or CIDR subnet, matched by containment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetMatcher {
    network: Ipv4Addr,
    prefix_len: u8,
}

impl SubnetMatcher {
    /// Parse a textual descriptor: `a.b.c.d` (exact host, equivalent to
    /// `/32`) or `a.b.c.d/len`.
    ///
    /// # Errors
    ///
    /// [`AddressParseError`] naming the offending descriptor when the
    /// address part is not a valid IPv4 address or the prefix length is not
    /// in `0..=32`.
    pub fn parse(descriptor: &str) -> Result<Self, AddressParseError> {
        let descriptor = descriptor.trim();
        if descriptor.is_empty() {
            return Err(AddressParseError::Empty);
        }

        let (addr_part, len_part) = match descriptor.split_once('/') {
            Some((addr, len)) => (addr, Some(len)),
            None => (descriptor, None),
        };

        let addr: Ipv4Addr = addr_part.parse().map_err(|_| AddressParseError::InvalidAddress {
            descriptor: descriptor.to_string(),
        })?;

        let prefix_len = match len_part {
            Some(len) => len
                .parse::<u8>()
                .ok()
                .filter(|l| *l <= 32)
                .ok_or_else(|| AddressParseError::InvalidPrefix {
                    descriptor: descriptor.to_string(),
                })?,
            None => 32,
        };

        Ok(Self { network: mask(addr, prefix_len), prefix_len })
    }

    /// Match an endpoint given in string form, tolerating a `:port` suffix.
    ///
    /// Unparseable endpoints never match; the capture layer occasionally
    /// reports endpoints (unix sockets, file paths) this matcher does not
    /// cover.
    #[must_use]
    pub fn matches_endpoint(&self, endpoint: &str) -> bool {
        let host = endpoint.split(':').next().unwrap_or(endpoint);
        host.parse::<Ipv4Addr>().is_ok_and(|addr| self.matches(addr))
    }
}

impl AddressMatcher for SubnetMatcher {
    fn matches(&self, addr: Ipv4Addr) -> bool {
        mask(addr, self.prefix_len) == self.network
    }
}

impl fmt::Display for SubnetMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

/// Zero out the host bits of `addr` for a given prefix length.
fn mask(addr: Ipv4Addr, prefix_len: u8) -> Ipv4Addr {
    let mask = if prefix_len == 0 { 0 } else { u32::MAX << (32 - u32::from(prefix_len)) };
    Ipv4Addr::from(u32::from(addr) & mask)
}

/// Parse a comma-separated list of descriptors into an ordered matcher
/// list. Each element is trimmed before parsing; blank or absent input
/// yields an empty list.
///
/// # Errors
///
/// The first [`AddressParseError`] hit while parsing an element.
pub fn parse_matcher_list(csv: &str) -> Result<Vec<SubnetMatcher>, AddressParseError> {
    if csv.trim().is_empty() {
        return Ok(Vec::new());
    }
    csv.split(',').map(SubnetMatcher::parse).collect()
}
