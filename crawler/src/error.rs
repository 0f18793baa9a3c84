//! Error types for crawling.

use quarkchain_peers_rpc::{Address, PortOffset, RpcError};
use std::error::Error;
use std::fmt;

/// Errors that can occur while crawling.
///
/// Only [`CrawlError::CrawlAborted`] ends a crawl. The other variants are
/// recorded against the node they happened on while the crawl carries on.
#[derive(Debug)]
pub enum CrawlError {
    /// The node's peer list could not be fetched.
    UnreachableNode { address: Address, source: RpcError },
    /// The node answered with a peer list that could not be decoded.
    MalformedResponse { address: Address, source: RpcError },
    /// The node's RPC port is outside the valid port range once the offset is applied.
    PortOutOfRange { address: Address, offset: PortOffset },
    /// More distinct nodes were discovered than the configured limit.
    CrawlAborted { limit: usize },
}

impl CrawlError {
    /// Classify a failed `getPeers` call against the node with p2p `address`.
    pub(crate) fn from_rpc(address: Address, source: RpcError) -> Self {
        if source.is_unreachable() {
            CrawlError::UnreachableNode { address, source }
        } else {
            CrawlError::MalformedResponse { address, source }
        }
    }

    /// The node the error happened on, if it is about a single node.
    pub fn address(&self) -> Option<&Address> {
        match self {
            CrawlError::UnreachableNode { address, .. }
            | CrawlError::MalformedResponse { address, .. }
            | CrawlError::PortOutOfRange { address, .. } => Some(address),
            CrawlError::CrawlAborted { .. } => None,
        }
    }
}

impl fmt::Display for CrawlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlError::UnreachableNode { address, source } => {
                write!(f, "Unable to list peers of {address}: {source}")
            }
            CrawlError::MalformedResponse { address, source } => {
                write!(f, "Peer list of {address} is malformed: {source}")
            }
            CrawlError::PortOutOfRange { address, offset } => {
                write!(f, "RPC port of {address} is out of range with offset {offset}")
            }
            CrawlError::CrawlAborted { limit } => {
                write!(f, "Crawl aborted, frontier too large: more than {limit} nodes")
            }
        }
    }
}

impl Error for CrawlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CrawlError::UnreachableNode { source, .. } => Some(source),
            CrawlError::MalformedResponse { source, .. } => Some(source),
            CrawlError::PortOutOfRange { .. } => None,
            CrawlError::CrawlAborted { .. } => None,
        }
    }
}
