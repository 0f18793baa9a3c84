//! Peer records as returned by a node's `getPeers` method.

use crate::address::Address;
use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Errors decoding a JSON-RPC response payload.
#[derive(Debug)]
pub enum DecodeError {
    /// The body is not the expected JSON document.
    Json(serde_json::Error),
    /// The response has neither a result nor an error.
    MissingResult,
    /// A field is not a hexadecimal integer.
    InvalidHex {
        field: &'static str,
        value: String,
    },
    /// A field decoded to an integer too large for its type.
    OutOfRange { field: &'static str, value: u128 },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Json(err) => write!(f, "Invalid JSON-RPC payload: {err}"),
            DecodeError::MissingResult => write!(f, "JSON-RPC response has no result"),
            DecodeError::InvalidHex { field, value } => {
                write!(f, "Field {field} is not a hex integer: {value:?}")
            }
            DecodeError::OutOfRange { field, value } => {
                write!(f, "Field {field} is out of range: {value}")
            }
        }
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DecodeError::Json(err) => Some(err),
            DecodeError::MissingResult => None,
            DecodeError::InvalidHex { .. } => None,
            DecodeError::OutOfRange { .. } => None,
        }
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::Json(err)
    }
}

/// One entry of a node's peer list, still in wire encoding.
///
/// Nodes report the IP as a hex encoded integer and the port as a hex
/// encoded integer, e.g. `{"ip": "0xac1f0fc4", "port": "0xbca3"}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PeerRecord {
    /// Cluster peer id. Not used for addressing.
    #[serde(default)]
    pub id: Option<String>,
    pub ip: String,
    pub port: String,
}

impl PeerRecord {
    /// Decode the record into the peer's p2p endpoint.
    ///
    /// Integers up to `u32::MAX` are IPv4 addresses, anything larger is IPv6.
    pub fn decode(&self) -> Result<Address, DecodeError> {
        let ip = parse_hex("ip", &self.ip)?;
        let host = match u32::try_from(ip) {
            Ok(v4) => IpAddr::V4(Ipv4Addr::from(v4)),
            Err(_) => IpAddr::V6(Ipv6Addr::from(ip)),
        };

        let port = parse_hex("port", &self.port)?;
        let port = u16::try_from(port).map_err(|_| DecodeError::OutOfRange {
            field: "port",
            value: port,
        })?;

        Ok(Address::new(host, port))
    }
}

/// Result object of `getPeers`.
#[derive(Debug, Deserialize)]
pub(crate) struct PeerList {
    pub peers: Vec<PeerRecord>,
}

impl PeerList {
    pub fn decode(&self) -> Result<Vec<Address>, DecodeError> {
        self.peers.iter().map(PeerRecord::decode).collect()
    }
}

/// Parse a hex integer with an optional `0x` prefix.
pub(crate) fn parse_hex(field: &'static str, value: &str) -> Result<u128, DecodeError> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);

    u128::from_str_radix(digits, 16).map_err(|_| DecodeError::InvalidHex {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ip: &str, port: &str) -> PeerRecord {
        PeerRecord {
            id: None,
            ip: ip.to_string(),
            port: port.to_string(),
        }
    }

    #[test]
    fn test_decode_ipv4() {
        // 172.31.15.196:48291
        let addr = record("0xac1f0fc4", "0xbca3").decode().unwrap();
        assert_eq!(addr.to_string(), "172.31.15.196:48291");

        // Prefix is optional.
        let addr = record("ac1f0fc4", "bca3").decode().unwrap();
        assert_eq!(addr.to_string(), "172.31.15.196:48291");
    }

    #[test]
    fn test_decode_ipv6() {
        let addr = record("0x100000000", "0x50").decode().unwrap();
        assert_eq!(addr.host, IpAddr::V6(Ipv6Addr::from(0x1_0000_0000u128)));
        assert_eq!(addr.port, 80);
    }

    #[test]
    fn test_decode_invalid_hex() {
        let err = record("0xnothex", "0x50").decode().unwrap_err();
        assert!(matches!(err, DecodeError::InvalidHex { field: "ip", .. }));

        let err = record("0x01", "").decode().unwrap_err();
        assert!(matches!(err, DecodeError::InvalidHex { field: "port", .. }));
    }

    #[test]
    fn test_decode_port_out_of_range() {
        let err = record("0x0a000001", "0x10000").decode().unwrap_err();
        assert!(matches!(
            err,
            DecodeError::OutOfRange {
                field: "port",
                value: 0x10000
            }
        ));
    }

    #[test]
    fn test_peer_list_from_json() {
        let list: PeerList = serde_json::from_str(
            r#"{"peers": [
                {"id": "0x01", "ip": "0x0a000001", "port": "0xbb8"},
                {"ip": "0x0a000002", "port": "0xbb8"}
            ]}"#,
        )
        .unwrap();

        let peers = list.decode().unwrap();
        assert_eq!(peers.len(), 2);
        assert_eq!(peers[0].to_string(), "10.0.0.1:3000");
        assert_eq!(peers[1].to_string(), "10.0.0.2:3000");
    }
}
