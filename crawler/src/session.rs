//! Internal session coordination for crawling operations.
//!
//! This module contains the [`CrawlSession`] which orchestrates the crawling process
//! by managing the work queue and coordinating concurrent peer listing tasks.

use crate::connection::NodeRpc;
use crate::crawler::CrawlResult;
use crate::error::CrawlError;
use crate::translate::TranslationTable;
use log::{debug, info, warn};
use quarkchain_peers_rpc::{Address, PortOffset, RpcError};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Configuration for a crawl session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub offset: PortOffset,
    pub translation_table: TranslationTable,
    pub max_concurrent_tasks: usize,
    pub max_nodes: usize,
    pub peer_timeout: Duration,
}

/// Result of listing the peers of a single node.
#[derive(Debug)]
struct TaskResult {
    /// The p2p address of the node, as keyed in the cache.
    address: Address,
    /// The node's translated peers, or why they couldn't be fetched.
    peers: Result<Vec<Address>, CrawlError>,
}

/// Internal coordinator for a crawling session.
///
/// `CrawlSession` orchestrates the crawling process by managing the work queue
/// and coordinating concurrent peer listing tasks. It acts as the execution
/// engine for a [`Crawler`](crate::Crawler) instance.
///
/// # Architecture
///
/// The session follows a producer-consumer pattern with lockless communication.
///
/// * **Coordinator** (`coordinate()`) - Owns the frontier, the claimed set and
///   the cache, and spawns processing tasks.
/// * **Processors** (`process()`) - Query a single node and report back over a channel.
///
/// A node is claimed before its task is spawned, so each distinct node is
/// queried at most once no matter how many peers report it.
#[derive(Clone)]
pub struct CrawlSession<C> {
    /// Crawler configuration.
    config: Arc<SessionConfig>,
    /// Client used to call nodes.
    client: C,
}

impl<C: NodeRpc> CrawlSession<C> {
    /// Create a new crawl session.
    pub fn new(config: Arc<SessionConfig>, client: C) -> Self {
        Self { config, client }
    }

    /// Lists the peers of the node with p2p `address`.
    ///
    /// The node is called on its RPC port, derived with the session's port offset.
    /// Returned peers are translated so they match cache keys.
    pub async fn process(&self, address: Address) -> Result<Vec<Address>, CrawlError> {
        let endpoint = address
            .to_rpc(self.config.offset)
            .ok_or(CrawlError::PortOutOfRange {
                address,
                offset: self.config.offset,
            })?;

        debug!("Listing peers of {address} via {endpoint}");

        let call = self.client.list_peers(&endpoint);
        let peers = match timeout(self.config.peer_timeout, call).await {
            Ok(Ok(peers)) => peers,
            Ok(Err(e)) => return Err(CrawlError::from_rpc(address, e)),
            Err(_) => {
                return Err(CrawlError::UnreachableNode {
                    address,
                    source: RpcError::TimedOut(self.config.peer_timeout),
                })
            }
        };

        Ok(peers
            .iter()
            .map(|peer| self.config.translation_table.translate(peer))
            .collect())
    }

    /// Coordinates the crawling process by managing the work queue and task scheduling.
    ///
    /// This is the main control loop that orchestrates the entire crawling session.
    /// It claims addresses from the frontier, spawns processing tasks up to the
    /// concurrency limit, and folds their results into the cache.
    ///
    /// # Termination Conditions
    ///
    /// 1. **Natural Completion** - Frontier empty and all tasks finished.
    /// 2. **Node Cap** - More distinct nodes than `max_nodes`, fails with [`CrawlError::CrawlAborted`].
    pub async fn coordinate(&self, seed: Address) -> Result<CrawlResult, CrawlError> {
        let mut result = CrawlResult::new(self.config.offset);
        let mut frontier = VecDeque::from([self.config.translation_table.translate(&seed)]);
        let mut claimed: HashSet<Address> = HashSet::new();

        // Channel to track task completion.
        let (task_done_tx, mut task_done_rx) =
            mpsc::channel::<TaskResult>(self.config.max_concurrent_tasks);

        // Number of in-flight tasks.
        let mut active_tasks = 0;

        let mut last_log_time = Instant::now();
        let log_interval = Duration::from_secs(60);

        loop {
            // Periodic status logging.
            if last_log_time.elapsed() >= log_interval {
                info!(
                    "{} active tasks (max: {}), {} nodes claimed, {} queued",
                    active_tasks,
                    self.config.max_concurrent_tasks,
                    claimed.len(),
                    frontier.len()
                );
                last_log_time = Instant::now();
            }

            // Fill up to capacity.
            while active_tasks < self.config.max_concurrent_tasks {
                let Some(address) = frontier.pop_front() else {
                    break;
                };

                // Already processed or in flight.
                if claimed.contains(&address) {
                    continue;
                }

                if claimed.len() >= self.config.max_nodes {
                    warn!(
                        "Discovered more than {} nodes, aborting crawl",
                        self.config.max_nodes
                    );
                    return Err(CrawlError::CrawlAborted {
                        limit: self.config.max_nodes,
                    });
                }
                claimed.insert(address);

                let session = self.clone();
                let done_tx = task_done_tx.clone();

                active_tasks += 1;
                tokio::spawn(async move {
                    let peers = session.process(address).await;
                    // Coordinator is gone if the crawl was aborted.
                    let _ = done_tx.send(TaskResult { address, peers }).await;
                });
            }

            if active_tasks == 0 {
                info!("Crawler exhausted - {} nodes processed", claimed.len());
                break;
            }

            // `task_done_tx` is still alive, so this never yields None.
            let Some(task) = task_done_rx.recv().await else {
                break;
            };
            active_tasks -= 1;

            match task.peers {
                Ok(peers) => {
                    debug!("Node {} reported {} peers", task.address, peers.len());
                    frontier.extend(peers.iter().filter(|peer| !claimed.contains(*peer)));
                    result.cache.insert(task.address, peers);
                }
                Err(e) => {
                    warn!("{e}");
                    result.unqueryable.insert(task.address, e);
                }
            }
        }

        Ok(result)
    }
}
