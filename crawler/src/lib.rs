mod builder;
mod connection;
mod crawler;
mod error;
mod monitor;
mod session;
mod topology;
mod translate;

pub use builder::{CrawlerBuilder, DEFAULT_MAX_CONCURRENT_TASKS, DEFAULT_MAX_NODES};
pub use connection::NodeRpc;
pub use crawler::{CrawlCache, CrawlResult, Crawler};
pub use error::CrawlError;
pub use monitor::{NodeSample, StatsMonitor, StatsSnapshot, DEFAULT_POLL_INTERVAL};
pub use topology::{LinkKind, Topology, TopologyLink, TopologyNode};
pub use translate::{TranslationTable, TranslationTableError};

// Re-exports.
pub use quarkchain_peers_rpc::{
    Address, DecodeError, JsonRpcClient, NodeStats, PeerRecord, PortOffset, RpcError,
};
