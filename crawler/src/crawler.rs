use crate::connection::NodeRpc;
use crate::error::CrawlError;
use crate::session::{CrawlSession, SessionConfig};
use crate::translate::TranslationTable;
use futures::stream::{self, StreamExt};
use log::{info, warn};
use quarkchain_peers_rpc::{Address, PortOffset};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Peer lists by node, keyed by the node's p2p address.
///
/// Keys and peers are translated addresses. Each value is exactly what that
/// node reported, so the cache is the same whatever order nodes were visited in.
pub type CrawlCache = BTreeMap<Address, Vec<Address>>;

/// Outcome of one crawl.
#[derive(Debug)]
pub struct CrawlResult {
    /// Peer lists of every node that answered.
    pub cache: CrawlCache,
    /// Nodes that were discovered but could not be queried.
    pub unqueryable: BTreeMap<Address, CrawlError>,
    offset: PortOffset,
}

impl CrawlResult {
    pub(crate) fn new(offset: PortOffset) -> Self {
        CrawlResult {
            cache: CrawlCache::new(),
            unqueryable: BTreeMap::new(),
            offset,
        }
    }

    /// The port offset the crawl ran with.
    pub fn offset(&self) -> PortOffset {
        self.offset
    }

    /// RPC endpoints of every node that answered, in key order.
    ///
    /// Unqueryable nodes are left out.
    pub fn clusters(&self) -> Vec<Address> {
        self.cache
            .keys()
            .filter_map(|address| address.to_rpc(self.offset))
            .collect()
    }
}

/// A crawler for the QuarkChain peer-to-peer network.
///
/// This crawler asks a seed node for its peers, then asks each of those peers
/// for theirs, until no new nodes show up.
#[derive(Debug, Clone)]
pub struct Crawler<C> {
    /// Client used to call nodes.
    client: C,
    /// Shared with every session the crawler starts.
    config: Arc<SessionConfig>,
}

impl<C: NodeRpc> Crawler<C> {
    pub(crate) fn new(client: C, config: SessionConfig) -> Self {
        Crawler {
            client,
            config: Arc::new(config),
        }
    }

    /// The client nodes are queried with.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The p2p to RPC port offset.
    pub fn offset(&self) -> PortOffset {
        self.config.offset
    }

    /// The host translation applied to seeds and reported peers.
    pub fn translation_table(&self) -> &TranslationTable {
        &self.config.translation_table
    }

    /// Crawl the network starting from a seed node.
    ///
    /// Every crawl starts from an empty cache, nothing is carried over from
    /// previous calls.
    ///
    /// # Failures
    ///
    /// Nodes that can't be queried are recorded in [`CrawlResult::unqueryable`]
    /// and the crawl continues through other paths.
    ///
    /// # Arguments
    ///
    /// * `seed` - The p2p address of the node to start crawling from.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlResult)` - Once every reachable node has been queried.
    /// * `Err(CrawlError::CrawlAborted)` - If more nodes were found than the configured cap.
    pub async fn crawl(&self, seed: Address) -> Result<CrawlResult, CrawlError> {
        info!(
            "Crawling from {seed}, RPC offset {}, {} translated hosts",
            self.config.offset,
            self.config.translation_table.len()
        );

        let session = CrawlSession::new(self.config.clone(), self.client.clone());
        let result = session.coordinate(seed).await?;

        info!(
            "Crawl found {} nodes, {} unqueryable",
            result.cache.len(),
            result.unqueryable.len()
        );
        Ok(result)
    }

    /// Query a run of co-located nodes on consecutive p2p ports, without following peers.
    ///
    /// Useful for clusters that run several nodes on one host.
    ///
    /// # Arguments
    ///
    /// * `start` - The p2p address of the first node.
    /// * `count` - Number of nodes, on ports `start.port..start.port + count`.
    pub async fn fetch_range(&self, start: Address, count: u16) -> CrawlResult {
        let start = self.config.translation_table.translate(&start);
        let session = CrawlSession::new(self.config.clone(), self.client.clone());
        let mut result = CrawlResult::new(self.config.offset);

        let addresses =
            (0..count).map_while(|i| start.port.checked_add(i).map(|port| start.with_port(port)));
        let mut outcomes = stream::iter(addresses)
            .map(|address| {
                let session = &session;
                async move { (address, session.process(address).await) }
            })
            .buffer_unordered(self.config.max_concurrent_tasks);

        while let Some((address, peers)) = outcomes.next().await {
            match peers {
                Ok(peers) => {
                    result.cache.insert(address, peers);
                }
                Err(e) => {
                    warn!("{e}");
                    result.unqueryable.insert(address, e);
                }
            }
        }

        result
    }
}
