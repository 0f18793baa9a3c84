//! Error types for JSON-RPC calls.

use crate::record::DecodeError;
use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Errors that can occur while calling a node's JSON-RPC endpoint.
#[derive(Debug)]
pub enum RpcError {
    /// The HTTP exchange failed: connection refused, reset, or a non-success status.
    Transport(reqwest::Error),
    /// The node did not answer within the request timeout.
    TimedOut(Duration),
    /// The node answered with a JSON-RPC error object.
    Remote { code: i64, message: String },
    /// The node answered, but the payload could not be decoded.
    MalformedResponse(DecodeError),
}

impl RpcError {
    /// Whether the call failed before a usable answer came back.
    ///
    /// Everything except [`RpcError::MalformedResponse`] counts as an unreachable node.
    pub fn is_unreachable(&self) -> bool {
        !matches!(self, RpcError::MalformedResponse(_))
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcError::Transport(err) => write!(f, "RPC transport failed: {err}"),
            RpcError::TimedOut(after) => write!(f, "RPC call timed out after {after:?}"),
            RpcError::Remote { code, message } => write!(f, "RPC error {code}: {message}"),
            RpcError::MalformedResponse(err) => write!(f, "Malformed RPC response: {err}"),
        }
    }
}

impl Error for RpcError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RpcError::Transport(err) => Some(err),
            RpcError::TimedOut(_) => None,
            RpcError::Remote { .. } => None,
            RpcError::MalformedResponse(err) => Some(err),
        }
    }
}

impl From<DecodeError> for RpcError {
    fn from(err: DecodeError) -> Self {
        RpcError::MalformedResponse(err)
    }
}
