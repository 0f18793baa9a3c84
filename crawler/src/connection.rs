//! Node RPC abstraction for testing and mocking.
//!
//! This module provides the [`NodeRpc`] trait that abstracts the two remote
//! calls the crawler and the stats monitor make, enabling dependency
//! injection for testing without modifying the core crawler logic.

use quarkchain_peers_rpc::{Address, JsonRpcClient, NodeStats, RpcError};
use std::future::Future;

/// Remote calls against a node's JSON-RPC endpoint.
///
/// Implementations report failures, they never decide policy. Whether a
/// failed call aborts anything is up to the caller.
pub trait NodeRpc: Clone + Send + Sync + 'static {
    /// Lists the peers of the node serving RPC at `endpoint`.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Address>)` - The peer-to-peer endpoints of the node's peers.
    /// * `Err(RpcError)` - If the node is unreachable or the answer can't be decoded.
    fn list_peers(
        &self,
        endpoint: &Address,
    ) -> impl Future<Output = Result<Vec<Address>, RpcError>> + Send;

    /// Fetches live statistics of the node serving RPC at `endpoint`.
    fn get_stats(&self, endpoint: &Address)
        -> impl Future<Output = Result<NodeStats, RpcError>> + Send;
}

impl NodeRpc for JsonRpcClient {
    fn list_peers(
        &self,
        endpoint: &Address,
    ) -> impl Future<Output = Result<Vec<Address>, RpcError>> + Send {
        self.get_peers(endpoint)
    }

    fn get_stats(
        &self,
        endpoint: &Address,
    ) -> impl Future<Output = Result<NodeStats, RpcError>> + Send {
        JsonRpcClient::get_stats(self, endpoint)
    }
}

#[cfg(test)]
pub mod test_utils {
    //! A scripted in-memory network implementing [`NodeRpc`].

    use super::*;
    use quarkchain_peers_rpc::DecodeError;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Mock network keyed by RPC endpoint.
    ///
    /// Endpoints without a scripted answer behave like nodes that never answer.
    #[derive(Debug, Clone, Default)]
    pub struct MockNetwork {
        peers: HashMap<Address, Vec<Address>>,
        stats: HashMap<Address, u64>,
        malformed: HashSet<Address>,
        hanging: HashSet<Address>,
        latency: Duration,
        peer_calls: Arc<Mutex<HashMap<Address, usize>>>,
        stats_calls: Arc<AtomicUsize>,
    }

    impl MockNetwork {
        pub fn new() -> Self {
            Self::default()
        }

        /// Script the peer list returned by the node at `endpoint`.
        pub fn with_node(mut self, endpoint: &str, peers: &[&str]) -> Self {
            self.peers.insert(
                addr(endpoint),
                peers.iter().map(|peer| addr(peer)).collect(),
            );
            self
        }

        /// Script the pending transaction count reported by the node at `endpoint`.
        pub fn with_stats(mut self, endpoint: &str, pending_tx_count: u64) -> Self {
            self.stats.insert(addr(endpoint), pending_tx_count);
            self
        }

        /// The node at `endpoint` answers with an undecodable payload.
        pub fn with_malformed(mut self, endpoint: &str) -> Self {
            self.malformed.insert(addr(endpoint));
            self
        }

        /// The node at `endpoint` accepts calls but never answers.
        pub fn with_hanging(mut self, endpoint: &str) -> Self {
            self.hanging.insert(addr(endpoint));
            self
        }

        /// Delay every answer, to let concurrent calls overlap.
        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = latency;
            self
        }

        /// Number of `list_peers` calls made against `endpoint`.
        pub fn peer_calls(&self, endpoint: &str) -> usize {
            self.peer_calls
                .lock()
                .unwrap()
                .get(&addr(endpoint))
                .copied()
                .unwrap_or(0)
        }

        /// Number of `list_peers` calls made against any endpoint.
        pub fn total_peer_calls(&self) -> usize {
            self.peer_calls.lock().unwrap().values().sum()
        }

        /// Number of `get_stats` calls made against any endpoint.
        pub fn stats_calls(&self) -> usize {
            self.stats_calls.load(Ordering::SeqCst)
        }

        async fn answer<T>(
            &self,
            endpoint: Address,
            scripted: Option<T>,
        ) -> Result<T, RpcError> {
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            if self.hanging.contains(&endpoint) {
                std::future::pending::<()>().await;
            }
            if self.malformed.contains(&endpoint) {
                return Err(RpcError::MalformedResponse(DecodeError::InvalidHex {
                    field: "ip",
                    value: "0xzz".to_string(),
                }));
            }
            scripted.ok_or(RpcError::TimedOut(Duration::from_secs(10)))
        }
    }

    impl NodeRpc for MockNetwork {
        fn list_peers(
            &self,
            endpoint: &Address,
        ) -> impl Future<Output = Result<Vec<Address>, RpcError>> + Send {
            let endpoint = *endpoint;
            *self
                .peer_calls
                .lock()
                .unwrap()
                .entry(endpoint)
                .or_insert(0) += 1;
            let scripted = self.peers.get(&endpoint).cloned();
            async move { self.answer(endpoint, scripted).await }
        }

        fn get_stats(
            &self,
            endpoint: &Address,
        ) -> impl Future<Output = Result<NodeStats, RpcError>> + Send {
            let endpoint = *endpoint;
            self.stats_calls.fetch_add(1, Ordering::SeqCst);
            let scripted = self.stats.get(&endpoint).copied().map(NodeStats::new);
            async move { self.answer(endpoint, scripted).await }
        }
    }

    /// Parse a `host:port` literal.
    pub fn addr(s: &str) -> Address {
        s.parse().expect("Invalid test address")
    }
}
