//! Internal to external host translation.
//!
//! Nodes inside a private network advertise each other by their internal
//! addresses. When crawling from outside, those hosts have to be swapped for
//! their public equivalents, both to reach the node and to recognize it as
//! the same node under its public key.

use quarkchain_peers_rpc::Address;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::net::{AddrParseError, IpAddr};
use std::str::FromStr;

/// Errors building a [`TranslationTable`].
#[derive(Debug)]
pub enum TranslationTableError {
    /// The table is not a JSON object of strings.
    Json(serde_json::Error),
    /// A key or value is not an IP address.
    InvalidHost {
        host: String,
        source: AddrParseError,
    },
    /// A host is translated to a host that is itself translated again.
    Chained { host: IpAddr, via: IpAddr },
}

impl fmt::Display for TranslationTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationTableError::Json(err) => write!(f, "Invalid translation table: {err}"),
            TranslationTableError::InvalidHost { host, source } => {
                write!(f, "Invalid host {host:?} in translation table: {source}")
            }
            TranslationTableError::Chained { host, via } => {
                write!(f, "Host {host} translates to {via}, which is translated again")
            }
        }
    }
}

impl Error for TranslationTableError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TranslationTableError::Json(err) => Some(err),
            TranslationTableError::InvalidHost { source, .. } => Some(source),
            TranslationTableError::Chained { .. } => None,
        }
    }
}

impl From<serde_json::Error> for TranslationTableError {
    fn from(err: serde_json::Error) -> Self {
        TranslationTableError::Json(err)
    }
}

/// Static map from internal hosts to externally reachable hosts.
///
/// Translation is idempotent: no translated host is itself a key mapping
/// somewhere else, which is checked when the table is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationTable {
    hosts: HashMap<IpAddr, IpAddr>,
}

impl TranslationTable {
    /// An empty table, translating nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(internal, external)` pairs.
    ///
    /// # Returns
    ///
    /// * `Ok(TranslationTable)` - If no external host is translated again.
    /// * `Err(TranslationTableError::Chained)` - Otherwise.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, TranslationTableError>
    where
        I: IntoIterator<Item = (IpAddr, IpAddr)>,
    {
        let hosts: HashMap<IpAddr, IpAddr> = pairs.into_iter().collect();

        for (host, via) in &hosts {
            if let Some(next) = hosts.get(via) {
                if next != via {
                    return Err(TranslationTableError::Chained {
                        host: *host,
                        via: *via,
                    });
                }
            }
        }

        Ok(TranslationTable { hosts })
    }

    /// Translate a host, returning it unchanged if it has no entry.
    pub fn translate_host(&self, host: IpAddr) -> IpAddr {
        self.hosts.get(&host).copied().unwrap_or(host)
    }

    /// Translate the host of an address. The port is kept.
    pub fn translate(&self, address: &Address) -> Address {
        address.with_host(self.translate_host(address.host))
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

/// Parses the JSON object form, e.g. `{"172.31.15.196": "54.186.3.84"}`.
impl FromStr for TranslationTable {
    type Err = TranslationTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: HashMap<String, String> = serde_json::from_str(s)?;

        let parse = |host: &str| {
            host.trim()
                .parse::<IpAddr>()
                .map_err(|source| TranslationTableError::InvalidHost {
                    host: host.to_string(),
                    source,
                })
        };

        let pairs = raw
            .iter()
            .map(|(internal, external)| {
                Ok::<_, TranslationTableError>((
                    parse(internal.as_str())?,
                    parse(external.as_str())?,
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_pairs(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn ip(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(a, b, c, d))
    }

    #[test]
    fn test_translate() {
        let table: TranslationTable = r#"{"10.0.0.1": "1.2.3.4"}"#.parse().unwrap();
        assert_eq!(table.len(), 1);

        let internal: Address = "10.0.0.1:3000".parse().unwrap();
        assert_eq!(table.translate(&internal).to_string(), "1.2.3.4:3000");

        let other: Address = "10.0.0.2:3000".parse().unwrap();
        assert_eq!(table.translate(&other), other);
    }

    #[test]
    fn test_translate_is_idempotent() {
        let table = TranslationTable::from_pairs([
            (ip(172, 31, 15, 196), ip(54, 186, 3, 84)),
            (ip(172, 31, 15, 197), ip(54, 186, 3, 85)),
            (ip(54, 186, 3, 86), ip(54, 186, 3, 86)),
        ])
        .unwrap();

        for host in [
            ip(172, 31, 15, 196),
            ip(172, 31, 15, 197),
            ip(54, 186, 3, 84),
            ip(54, 186, 3, 86),
            ip(8, 8, 8, 8),
        ] {
            let once = table.translate_host(host);
            assert_eq!(table.translate_host(once), once);
        }
    }

    #[test]
    fn test_chained_table_rejected() {
        let err = TranslationTable::from_pairs([
            (ip(10, 0, 0, 1), ip(10, 0, 0, 2)),
            (ip(10, 0, 0, 2), ip(1, 2, 3, 4)),
        ])
        .unwrap_err();
        assert!(matches!(err, TranslationTableError::Chained { .. }));

        // A swap is a chain in both directions.
        let swap = r#"{"10.0.0.1": "10.0.0.2", "10.0.0.2": "10.0.0.1"}"#;
        assert!(swap.parse::<TranslationTable>().is_err());
    }

    #[test]
    fn test_parse_errors() {
        let err = r#"{"10.0.0.1": "public-host"}"#
            .parse::<TranslationTable>()
            .unwrap_err();
        assert!(matches!(err, TranslationTableError::InvalidHost { .. }));

        let err = r#"["10.0.0.1"]"#.parse::<TranslationTable>().unwrap_err();
        assert!(matches!(err, TranslationTableError::Json(_)));

        let empty: TranslationTable = "{}".parse().unwrap();
        assert!(empty.is_empty());
    }
}
