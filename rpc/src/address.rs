//! QuarkChain node addresses and the p2p/RPC port relationship.

use std::fmt;
use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::str::FromStr;

/// A node endpoint on the network.
///
/// The same type is used for both the peer-to-peer endpoint a node advertises
/// and the JSON-RPC endpoint it is queried on; which one an `Address` refers to
/// is decided by the caller, see [`PortOffset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    /// The node's network address.
    pub host: IpAddr,
    /// The port number of the endpoint.
    pub port: u16,
}

impl Address {
    /// Create a new address.
    pub fn new(host: IpAddr, port: u16) -> Self {
        Address { host, port }
    }

    /// Returns the same host with a different port.
    pub fn with_port(&self, port: u16) -> Self {
        Address {
            host: self.host,
            port,
        }
    }

    /// Returns the same port on a different host.
    pub fn with_host(&self, host: IpAddr) -> Self {
        Address {
            host,
            port: self.port,
        }
    }

    /// Maps a peer-to-peer endpoint to its JSON-RPC endpoint.
    ///
    /// # Returns
    ///
    /// `None` if the shifted port falls outside of `0..=65535`.
    pub fn to_rpc(&self, offset: PortOffset) -> Option<Self> {
        shift_port(self.port, offset.0).map(|port| self.with_port(port))
    }

    /// Maps a JSON-RPC endpoint back to its peer-to-peer endpoint.
    ///
    /// # Returns
    ///
    /// `None` if the shifted port falls outside of `0..=65535`.
    pub fn to_p2p(&self, offset: PortOffset) -> Option<Self> {
        shift_port(self.port, -offset.0).map(|port| self.with_port(port))
    }

    /// The address as a socket address.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn shift_port(port: u16, delta: i32) -> Option<u16> {
    u16::try_from(i32::from(port) + delta).ok()
}

impl From<SocketAddr> for Address {
    fn from(addr: SocketAddr) -> Self {
        Address::new(addr.ip(), addr.port())
    }
}

impl FromStr for Address {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<SocketAddr>().map(Address::from)
    }
}

/// IPv4 hosts render dotted-decimal, IPv6 hosts in brackets (`[::1]:38291`).
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.socket_addr())
    }
}

/// Distance from a node's peer-to-peer port to its JSON-RPC port.
///
/// A crawl assumes `rpc_port - p2p_port` is the same for every node in the
/// network. Nodes configured otherwise are queried on the wrong port and show
/// up as unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortOffset(i32);

impl PortOffset {
    /// The offset observed on a node listening on `p2p_port` and serving RPC on `rpc_port`.
    pub fn between(p2p_port: u16, rpc_port: u16) -> Self {
        PortOffset(i32::from(rpc_port) - i32::from(p2p_port))
    }

    /// The raw offset.
    pub fn value(self) -> i32 {
        self.0
    }
}

impl fmt::Display for PortOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_display_is_canonical() {
        let v4 = Address::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 3000);
        assert_eq!(v4.to_string(), "10.0.0.1:3000");

        let v6 = Address::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 3000);
        assert_eq!(v6.to_string(), "[::1]:3000");
    }

    #[test]
    fn test_parse() {
        let addr: Address = "54.186.3.84:48291".parse().unwrap();
        assert_eq!(addr.host, IpAddr::V4(Ipv4Addr::new(54, 186, 3, 84)));
        assert_eq!(addr.port, 48291);

        assert!("54.186.3.84".parse::<Address>().is_err());
        assert!("not-an-ip:80".parse::<Address>().is_err());
    }

    #[test]
    fn test_port_offset() {
        let offset = PortOffset::between(48291, 48491);
        assert_eq!(offset.value(), 200);
        assert_eq!(offset.to_string(), "+200");

        let p2p: Address = "10.0.0.1:3000".parse().unwrap();
        let rpc = p2p.to_rpc(offset).unwrap();
        assert_eq!(rpc.port, 3200);
        assert_eq!(rpc.to_p2p(offset), Some(p2p));
    }

    #[test]
    fn test_port_offset_out_of_range() {
        let offset = PortOffset::between(3000, 5000);
        let high: Address = "10.0.0.1:65000".parse().unwrap();
        assert_eq!(high.to_rpc(offset), None);

        let low: Address = "10.0.0.1:1000".parse().unwrap();
        assert_eq!(low.to_p2p(offset), None);
    }
}
