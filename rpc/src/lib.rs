mod address;
mod client;
mod record;
mod stats;

pub use address::{Address, PortOffset};
pub use client::{JsonRpcClient, RpcError, DEFAULT_REQUEST_TIMEOUT};
pub use record::{DecodeError, PeerRecord};
pub use stats::NodeStats;
