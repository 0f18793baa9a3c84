//! JSON-RPC over HTTP to QuarkChain nodes.
//!
//! Every node serves JSON-RPC 2.0 on a plain HTTP endpoint. The crawler only
//! needs two parameterless methods, `getPeers` and `getStats`.
//!
//! # Examples
//!
//! ```no_run
//! use quarkchain_peers_rpc::{Address, JsonRpcClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = JsonRpcClient::new();
//! let node: Address = "54.186.3.84:48491".parse()?;
//!
//! for peer in client.get_peers(&node).await? {
//!     println!("{peer}");
//! }
//! println!("pending: {}", client.get_stats(&node).await?.pending_tx_count);
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::RpcError;

use crate::address::Address;
use crate::record::{DecodeError, PeerList};
use crate::stats::NodeStats;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default timeout for a single JSON-RPC call, connect through body.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct Request<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: [(); 0],
    id: u64,
}

#[derive(Debug, Deserialize)]
struct Response<T> {
    result: Option<T>,
    error: Option<ErrorObject>,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    code: i64,
    message: String,
}

/// Client for the JSON-RPC endpoints of QuarkChain nodes.
///
/// The client is not bound to a node, the endpoint is passed per call. Clones
/// share the underlying connection pool and request id counter.
#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    http: reqwest::Client,
    timeout: Duration,
    request_id: Arc<AtomicU64>,
}

impl Default for JsonRpcClient {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonRpcClient {
    /// Create a client with [`DEFAULT_REQUEST_TIMEOUT`].
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a client with a custom per-call timeout.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Upper bound for one call, from connecting until the body is read.
    pub fn with_timeout(timeout: Duration) -> Self {
        JsonRpcClient {
            http: reqwest::Client::new(),
            timeout,
            request_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// The per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Call a parameterless method on the node at `endpoint`.
    ///
    /// # Returns
    ///
    /// * `Ok(R)` - The decoded `result` member of the response.
    /// * `Err(RpcError)` - Transport failure, timeout, remote error object or undecodable body.
    pub async fn call<R: DeserializeOwned>(
        &self,
        endpoint: &Address,
        method: &str,
    ) -> Result<R, RpcError> {
        let request = Request {
            jsonrpc: "2.0",
            method,
            params: [],
            id: self.request_id.fetch_add(1, Ordering::Relaxed),
        };

        debug!("Calling {method} on http://{endpoint}");

        let body = self
            .http
            .post(format!("http://{endpoint}"))
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| self.transport_error(e))?
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        let response: Response<R> = serde_json::from_slice(&body).map_err(DecodeError::from)?;

        if let Some(error) = response.error {
            return Err(RpcError::Remote {
                code: error.code,
                message: error.message,
            });
        }

        response
            .result
            .ok_or(RpcError::MalformedResponse(DecodeError::MissingResult))
    }

    /// Ask the node at `endpoint` for its peers.
    ///
    /// # Returns
    ///
    /// The peer-to-peer endpoints of the node's peers, in the order reported.
    pub async fn get_peers(&self, endpoint: &Address) -> Result<Vec<Address>, RpcError> {
        let list: PeerList = self.call(endpoint, "getPeers").await?;
        let peers = list.decode()?;
        debug!("Node {endpoint} reported {} peers", peers.len());
        Ok(peers)
    }

    /// Ask the node at `endpoint` for its live statistics.
    pub async fn get_stats(&self, endpoint: &Address) -> Result<NodeStats, RpcError> {
        self.call(endpoint, "getStats").await
    }

    fn transport_error(&self, err: reqwest::Error) -> RpcError {
        if err.is_timeout() {
            RpcError::TimedOut(self.timeout)
        } else {
            RpcError::Transport(err)
        }
    }
}
