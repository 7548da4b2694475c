// # Local Interface IP Source
//
// This crate provides the last-resort IPv6 source: the host's own network
// interfaces.
//
// ## Purpose
//
// When every IPv6 echo service fails, a host with a global IPv6 address on
// one of its interfaces can still publish it. There is no NAT in front of
// such an address, so the interface address is the public one.
//
// ## Selection
//
// Interfaces that are down or loopback are skipped, as are addresses that
// are IPv4, IPv4-mapped, unspecified, loopback, multicast or link-local.
// The first remaining address wins. Enumeration order is whatever the
// platform reports and is not stable across boots.
//
// ## Platform Support
//
// Enumeration uses `getifaddrs` through nix and is available on unix.
// Elsewhere the source always fails, so detection simply moves on.

#![forbid(unsafe_code)]

use ddns_core::{Address, AddressFamily, Error, IpSource, Result};
use std::net::{IpAddr, Ipv6Addr};
use tracing::debug;

/// One address as reported by interface enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddress {
    /// Interface name (e.g., "eth0")
    pub name: String,
    /// Interface is administratively up
    pub up: bool,
    /// Interface is a loopback device
    pub loopback: bool,
    /// Address assigned to the interface
    pub ip: IpAddr,
}

/// Whether `ip` is usable as a public IPv6 address
pub fn is_global_unicast(ip: &Ipv6Addr) -> bool {
    let link_local = (ip.segments()[0] & 0xffc0) == 0xfe80;
    !(ip.is_unspecified()
        || ip.is_loopback()
        || ip.is_multicast()
        || link_local
        || ip.to_ipv4_mapped().is_some())
}

/// First global unicast IPv6 address on an up, non-loopback interface
pub fn select_global_ipv6(addresses: &[InterfaceAddress]) -> Option<(&str, Ipv6Addr)> {
    addresses
        .iter()
        .filter(|entry| entry.up && !entry.loopback)
        .find_map(|entry| match entry.ip {
            IpAddr::V6(ip) if is_global_unicast(&ip) => Some((entry.name.as_str(), ip)),
            _ => None,
        })
}

/// IPv6 source reading the host's interface addresses
#[derive(Debug, Default, Clone)]
pub struct InterfaceIpSource;

impl InterfaceIpSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl IpSource for InterfaceIpSource {
    async fn current(&self, family: AddressFamily) -> Result<Address> {
        if family != AddressFamily::V6 {
            return Err(Error::ip_source("local interfaces are only consulted for IPv6"));
        }

        let addresses = tokio::task::spawn_blocking(interface_addresses)
            .await
            .map_err(|e| Error::other(format!("interface enumeration aborted: {}", e)))??;
        debug!("Found {} interface addresses", addresses.len());

        match select_global_ipv6(&addresses) {
            Some((name, ip)) => {
                debug!("Using {} from interface {}", ip, name);
                Ok(Address::from(ip))
            }
            None => Err(Error::ip_source("no global IPv6 address on any interface")),
        }
    }

    fn name(&self) -> &str {
        "local-interfaces"
    }
}

/// Enumerate every address on every interface
#[cfg(unix)]
pub fn interface_addresses() -> Result<Vec<InterfaceAddress>> {
    use nix::net::if_::InterfaceFlags;
    use std::net::{SocketAddrV4, SocketAddrV6};

    let interfaces = nix::ifaddrs::getifaddrs()
        .map_err(|errno| Error::Network(std::io::Error::from(errno)))?;

    let addresses = interfaces
        .filter_map(|entry| {
            let address = entry.address?;
            let ip = if let Some(sin6) = address.as_sockaddr_in6() {
                IpAddr::V6(*SocketAddrV6::from(*sin6).ip())
            } else if let Some(sin) = address.as_sockaddr_in() {
                IpAddr::V4(*SocketAddrV4::from(*sin).ip())
            } else {
                return None;
            };

            Some(InterfaceAddress {
                name: entry.interface_name,
                up: entry.flags.contains(InterfaceFlags::IFF_UP),
                loopback: entry.flags.contains(InterfaceFlags::IFF_LOOPBACK),
                ip,
            })
        })
        .collect();

    Ok(addresses)
}

/// Enumerate every address on every interface
#[cfg(not(unix))]
pub fn interface_addresses() -> Result<Vec<InterfaceAddress>> {
    Err(Error::ip_source(
        "interface enumeration is not supported on this platform",
    ))
}
