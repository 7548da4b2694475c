//! Validated IP addresses and address families
//!
//! Record comparison is an exact string comparison, so an [`Address`] keeps
//! the text it was parsed from alongside the parsed value.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// IP version (v4 or v6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    /// DNS record type holding addresses of this family
    pub fn record_type(self) -> &'static str {
        match self {
            AddressFamily::V4 => "A",
            AddressFamily::V6 => "AAAA",
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => f.write_str("IPv4"),
            AddressFamily::V6 => f.write_str("IPv6"),
        }
    }
}

/// Whether `text` is a dotted-quad IPv4 address with every octet in 0..=255
///
/// A two-digit octet may carry a leading zero (`192.168.01.1`); a
/// three-digit one may not (`192.168.001.1`).
pub fn is_ipv4(text: &str) -> bool {
    parse_ipv4(text).is_some()
}

fn parse_ipv4(text: &str) -> Option<Ipv4Addr> {
    let mut octets = [0u8; 4];
    let mut parts = text.split('.');
    for octet in octets.iter_mut() {
        *octet = parse_octet(parts.next()?)?;
    }
    match parts.next() {
        Some(_) => None,
        None => Some(Ipv4Addr::from(octets)),
    }
}

fn parse_octet(part: &str) -> Option<u8> {
    let digits = part.as_bytes();
    if !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let valid = match digits.len() {
        1 | 2 => true,
        3 => digits[0] == b'1' || (digits[0] == b'2' && part <= "255"),
        _ => false,
    };
    if valid { part.parse().ok() } else { None }
}

/// Whether `text` is an IPv6 literal that is not an IPv4-mapped address
pub fn is_ipv6(text: &str) -> bool {
    match text.parse::<Ipv6Addr>() {
        Ok(ip) => ip.to_ipv4_mapped().is_none(),
        Err(_) => false,
    }
}

/// A validated IPv4 or IPv6 address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    text: String,
    ip: IpAddr,
}

impl Address {
    /// Parse an address of either family
    ///
    /// The text is kept verbatim: callers reading network input trim it
    /// first. The parsed value is normalized (`192.168.01.1` holds
    /// 192.168.1.1).
    pub fn parse(text: &str) -> Result<Self> {
        let ip = match parse_ipv4(text) {
            Some(v4) => IpAddr::V4(v4),
            None if is_ipv6(text) => text
                .parse()
                .map_err(|_| Error::invalid_address(text.to_string()))?,
            None => return Err(Error::invalid_address(text.to_string())),
        };
        Ok(Self {
            text: text.to_string(),
            ip,
        })
    }

    /// Parse an address that must belong to `family`
    pub fn parse_as(text: &str, family: AddressFamily) -> Result<Self> {
        let address = Self::parse(text)?;
        if address.family() != family {
            return Err(Error::invalid_address(format!(
                "expected {}, got {}",
                family, text
            )));
        }
        Ok(address)
    }

    pub fn family(&self) -> AddressFamily {
        match self.ip {
            IpAddr::V4(_) => AddressFamily::V4,
            IpAddr::V6(_) => AddressFamily::V6,
        }
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    /// The address exactly as it was supplied
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl From<Ipv6Addr> for Address {
    fn from(ip: Ipv6Addr) -> Self {
        Self {
            text: ip.to_string(),
            ip: IpAddr::V6(ip),
        }
    }
}

impl From<Ipv4Addr> for Address {
    fn from(ip: Ipv4Addr) -> Self {
        Self {
            text: ip.to_string(),
            ip: IpAddr::V4(ip),
        }
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
