//! Periodic stats polling over a set of nodes.
//!
//! The monitor asks every node for its stats at once, waits for all of them
//! to answer or fail, emits one snapshot and sleeps before the next round.
//! A slow node only delays a round up to the request timeout, a failing node
//! only shows up as an error in its own sample.

use crate::connection::NodeRpc;
use chrono::{DateTime, Local};
use futures::future::join_all;
use log::{debug, info, warn};
use quarkchain_peers_rpc::{Address, NodeStats, RpcError};
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

/// Default pause between two polling rounds.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Default timeout for a single `getStats` call.
const DEFAULT_STATS_TIMEOUT: Duration = Duration::from_secs(10);

/// Stats of one node in one round.
#[derive(Debug)]
pub struct NodeSample {
    /// Position of the node in the monitored list.
    pub index: usize,
    /// RPC endpoint of the node.
    pub address: Address,
    pub outcome: Result<NodeStats, RpcError>,
}

/// Stats of every monitored node in one round.
#[derive(Debug)]
pub struct StatsSnapshot {
    /// One sample per node, in monitored order.
    pub samples: Vec<NodeSample>,
    /// When the last answer of the round came in.
    pub taken_at: DateTime<Local>,
}

impl StatsSnapshot {
    /// Number of nodes that answered this round.
    pub fn responded(&self) -> usize {
        self.samples
            .iter()
            .filter(|sample| sample.outcome.is_ok())
            .count()
    }
}

/// One `idx=N;...` line per node, then the time of the round.
impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for sample in &self.samples {
            match &sample.outcome {
                Ok(stats) => writeln!(
                    f,
                    "idx={};pendingTxCount={}",
                    sample.index, stats.pending_tx_count
                )?,
                Err(e) => writeln!(f, "idx={};error={}", sample.index, e)?,
            }
        }
        write!(f, "... as of {}", self.taken_at.format("%Y-%m-%d %H:%M:%S%.6f"))
    }
}

/// Polls live stats of a fixed set of nodes.
///
/// A `StatsMonitor` is idle until [`StatsMonitor::watch`] starts the polling
/// loop, which then runs until the returned receiver is dropped.
#[derive(Debug, Clone)]
pub struct StatsMonitor<C> {
    client: C,
    /// RPC endpoints, indexed by position.
    clusters: Vec<Address>,
    interval: Duration,
    request_timeout: Duration,
}

impl<C: NodeRpc> StatsMonitor<C> {
    /// Create a monitor for the nodes serving RPC at `clusters`.
    pub fn new(client: C, clusters: Vec<Address>) -> Self {
        StatsMonitor {
            client,
            clusters,
            interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_STATS_TIMEOUT,
        }
    }

    /// Set the pause between two rounds (defaults to 1 second).
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the timeout of a single `getStats` call (defaults to 10 seconds).
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// The monitored RPC endpoints, in index order.
    pub fn clusters(&self) -> &[Address] {
        &self.clusters
    }

    async fn sample(&self, index: usize, address: Address) -> NodeSample {
        let outcome = match timeout(self.request_timeout, self.client.get_stats(&address)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(RpcError::TimedOut(self.request_timeout)),
        };

        if let Err(e) = &outcome {
            warn!("Failed to get stats of node {index} ({address}): {e}");
        }

        NodeSample {
            index,
            address,
            outcome,
        }
    }

    /// Run one polling round.
    ///
    /// All nodes are queried concurrently and the round completes when every
    /// call has either answered, failed or timed out.
    pub async fn poll_once(&self) -> StatsSnapshot {
        let samples = join_all(
            self.clusters
                .iter()
                .enumerate()
                .map(|(index, address)| self.sample(index, *address)),
        )
        .await;

        StatsSnapshot {
            samples,
            taken_at: Local::now(),
        }
    }

    /// Start polling in a background task.
    ///
    /// # Termination
    ///
    /// The loop has no end of its own. It stops once the returned receiver is
    /// dropped, at the latest after the in-flight round times out.
    ///
    /// # Returns
    ///
    /// A channel receiving one snapshot per round.
    pub fn watch(self) -> mpsc::Receiver<StatsSnapshot> {
        let (snapshot_tx, snapshot_rx) = mpsc::channel(1);

        tokio::spawn(async move {
            info!(
                "Monitoring {} nodes every {:?}",
                self.clusters.len(),
                self.interval
            );

            loop {
                let snapshot = tokio::select! {
                    snapshot = self.poll_once() => snapshot,
                    _ = snapshot_tx.closed() => break,
                };

                if snapshot_tx.send(snapshot).await.is_err() {
                    break;
                }

                tokio::select! {
                    _ = sleep(self.interval) => {}
                    _ = snapshot_tx.closed() => break,
                }
            }

            debug!("Receiver disconnected, stopping stats monitor");
        });

        snapshot_rx
    }
}
