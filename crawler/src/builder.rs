//! Builder pattern for configuring and creating crawler instances.

use crate::connection::NodeRpc;
use crate::crawler::Crawler;
use crate::session::SessionConfig;
use crate::translate::TranslationTable;
use quarkchain_peers_rpc::PortOffset;
use std::time::Duration;

/// Default maximum number of concurrent `getPeers` calls.
pub const DEFAULT_MAX_CONCURRENT_TASKS: usize = 8;
/// Default cap on distinct nodes before a crawl is aborted.
pub const DEFAULT_MAX_NODES: usize = 10_000;
/// Default timeout for a single `getPeers` call.
const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(10);

/// Builder for creating a customized [`Crawler`] instance.
///
/// # Example
///
/// ```
/// # fn main() -> Result<(), quarkchain_peers_crawler::TranslationTableError> {
/// use quarkchain_peers_crawler::{CrawlerBuilder, JsonRpcClient, PortOffset};
///
/// // Nodes serve JSON-RPC 200 ports above their p2p port.
/// let offset = PortOffset::between(48291, 48491);
///
/// // Create a basic crawler.
/// let basic_crawler = CrawlerBuilder::new(JsonRpcClient::new(), offset).build();
///
/// // Create a crawler that can be run from outside the cluster's private network.
/// let custom_crawler = CrawlerBuilder::new(JsonRpcClient::new(), offset)
///     .with_translation_table(r#"{"172.31.15.196": "54.186.3.84"}"#.parse()?)
///     .with_max_concurrent_tasks(16)
///     .with_max_nodes(500)
///     .build();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CrawlerBuilder<C> {
    /// Client used to call nodes.
    client: C,
    /// Distance from a node's p2p port to its RPC port.
    offset: PortOffset,
    /// Internal to external host translation.
    translation_table: TranslationTable,
    /// Maximum number of concurrent RPC tasks.
    max_concurrent_tasks: usize,
    /// Cap on distinct nodes.
    max_nodes: usize,
    /// Timeout for peer operations.
    peer_timeout: Duration,
}

impl<C: NodeRpc> CrawlerBuilder<C> {
    /// Create a new crawler builder.
    ///
    /// # Arguments
    ///
    /// * `client` - The RPC client nodes are queried with.
    /// * `offset` - The p2p to RPC port offset shared by every node of the network.
    ///
    /// # Returns
    ///
    /// A new `CrawlerBuilder` instance.
    pub fn new(client: C, offset: PortOffset) -> Self {
        CrawlerBuilder {
            client,
            offset,
            translation_table: TranslationTable::new(),
            max_concurrent_tasks: DEFAULT_MAX_CONCURRENT_TASKS,
            max_nodes: DEFAULT_MAX_NODES,
            peer_timeout: DEFAULT_PEER_TIMEOUT,
        }
    }

    /// Set the table of internal hosts to translate before querying them.
    ///
    /// Translation is applied to the seed and to every reported peer, so a
    /// node known by both its internal and external host is crawled once.
    ///
    /// # Returns
    ///
    /// Self for method chaining.
    pub fn with_translation_table(mut self, table: TranslationTable) -> Self {
        self.translation_table = table;
        self
    }

    /// Set the maximum number of concurrent RPC tasks.
    ///
    /// # Arguments
    ///
    /// * `max_tasks` - Maximum concurrent tasks (defaults to 8, at least 1).
    ///
    /// # Returns
    ///
    /// Self for method chaining.
    pub fn with_max_concurrent_tasks(mut self, max_tasks: usize) -> Self {
        self.max_concurrent_tasks = max_tasks.max(1);
        self
    }

    /// Set the cap on distinct nodes.
    ///
    /// A crawl that discovers more nodes than this fails with
    /// [`CrawlError::CrawlAborted`](crate::CrawlError::CrawlAborted), which
    /// bounds memory when a node reports a bogus or hostile peer list.
    ///
    /// # Returns
    ///
    /// Self for method chaining.
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// Set the timeout for a single `getPeers` call.
    ///
    /// A node that does not answer in time is recorded as unreachable.
    ///
    /// # Returns
    ///
    /// Self for method chaining.
    pub fn with_peer_timeout(mut self, timeout: Duration) -> Self {
        self.peer_timeout = timeout;
        self
    }

    /// Build the crawler with the configured options.
    ///
    /// # Returns
    ///
    /// A configured `Crawler` instance.
    pub fn build(self) -> Crawler<C> {
        Crawler::new(
            self.client,
            SessionConfig {
                offset: self.offset,
                translation_table: self.translation_table,
                max_concurrent_tasks: self.max_concurrent_tasks,
                max_nodes: self.max_nodes,
                peer_timeout: self.peer_timeout,
            },
        )
    }
}
