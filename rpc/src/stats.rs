//! Node statistics as returned by a node's `getStats` method.

use crate::record::parse_hex;
use serde::{Deserialize, Deserializer, Serialize};

/// Live statistics of one node.
///
/// Only the pending transaction count is interpreted, every other field of
/// the result object is kept as-is in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStats {
    #[serde(rename = "pendingTxCount", deserialize_with = "quantity")]
    pub pending_tx_count: u64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl NodeStats {
    pub fn new(pending_tx_count: u64) -> Self {
        NodeStats {
            pending_tx_count,
            extra: serde_json::Map::new(),
        }
    }
}

/// Counters are plain JSON numbers on some node versions and hex strings on others.
fn quantity<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Quantity {
        Number(u64),
        Hex(String),
    }

    match Quantity::deserialize(deserializer)? {
        Quantity::Number(n) => Ok(n),
        Quantity::Hex(s) => {
            let value = parse_hex("pendingTxCount", &s).map_err(serde::de::Error::custom)?;
            u64::try_from(value).map_err(serde::de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_count() {
        let stats: NodeStats =
            serde_json::from_str(r#"{"pendingTxCount": 12, "shardServerCount": 8}"#).unwrap();
        assert_eq!(stats.pending_tx_count, 12);
        assert_eq!(stats.extra["shardServerCount"], 8);
    }

    #[test]
    fn test_hex_count() {
        let stats: NodeStats = serde_json::from_str(r#"{"pendingTxCount": "0x1f"}"#).unwrap();
        assert_eq!(stats, NodeStats::new(31));
    }

    #[test]
    fn test_missing_count() {
        assert!(serde_json::from_str::<NodeStats>(r#"{"txCount60s": 3}"#).is_err());
        assert!(serde_json::from_str::<NodeStats>(r#"{"pendingTxCount": "lots"}"#).is_err());
    }
}
