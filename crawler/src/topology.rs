//! Node/link graph of a crawled network.
//!
//! The graph serializes to the document d3 force layouts expect:
//!
//! ```json
//! {"nodes": [{"name": "54.186.3.84:48291", "label": "", "id": 1}],
//!  "links": [{"source": 1, "target": 2, "type": "PEER"}]}
//! ```

use crate::crawler::CrawlCache;
use crate::translate::TranslationTable;
use log::warn;
use quarkchain_peers_rpc::Address;
use serde::Serialize;
use std::collections::HashMap;

/// A crawled node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopologyNode {
    /// The node's p2p address.
    pub name: String,
    pub label: String,
    /// Unique within one topology, starting at 1.
    pub id: usize,
}

/// Kind of relationship a link represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LinkKind {
    #[serde(rename = "PEER")]
    Peer,
}

/// A directed link from a node to one of its reported peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TopologyLink {
    pub source: usize,
    pub target: usize,
    #[serde(rename = "type")]
    pub kind: LinkKind,
}

/// Nodes and links of a crawled network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Topology {
    pub nodes: Vec<TopologyNode>,
    pub links: Vec<TopologyLink>,
}

impl Topology {
    /// Build the graph of a crawl cache.
    ///
    /// Every cache key becomes a node, numbered in key order. Peers are
    /// translated with `table` before lookup, so an internal address reported
    /// by a remote node links to the node crawled under its external address.
    /// Links to peers that were never crawled are dropped, there are no
    /// dangling targets.
    pub fn from_cache(cache: &CrawlCache, table: &TranslationTable) -> Self {
        let mut ids: HashMap<Address, usize> = HashMap::with_capacity(cache.len());
        let nodes = cache
            .keys()
            .zip(1..)
            .map(|(address, id)| {
                ids.insert(*address, id);
                TopologyNode {
                    name: address.to_string(),
                    label: String::new(),
                    id,
                }
            })
            .collect();

        let mut links = Vec::new();
        for (address, peers) in cache {
            let source = ids[address];
            for peer in peers {
                let peer = table.translate(peer);
                match ids.get(&peer) {
                    Some(&target) => links.push(TopologyLink {
                        source,
                        target,
                        kind: LinkKind::Peer,
                    }),
                    None => warn!("Dropping link {address} -> {peer}, peer was not crawled"),
                }
            }
        }

        Topology { nodes, links }
    }
}
