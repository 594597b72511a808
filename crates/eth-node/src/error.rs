//! Error types for `EthNode` operations.
//!
//! This module provides the error hierarchy for node operations:
//!
//! - [`NodeError`] - the primary error type for all node operations
//! - classification helpers ([`NodeError::is_retryable`], [`NodeError::is_protocol_error`])
//!   that the log scanner (C2) switches its retry/backoff policy on
//!
//! # Error Philosophy
//!
//! These errors distinguish transient transport failures (worth
//! retrying after shrinking the batch size) from node-side protocol
//! errors (worth retrying after a fixed backoff at the minimum batch
//! size) from everything else (fatal, propagated to the caller).

use thiserror::Error;

/// Result type alias using [`NodeError`].
pub type Result<T> = std::result::Result<T, NodeError>;

/// Errors that can occur when querying an Ethereum node.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NodeError {
    /// Failed to establish or maintain a connection to the RPC endpoint.
    ///
    /// Covers connection refused, DNS failure, and request timeout —
    /// all are retried by the log scanner with a shrunk batch size.
    #[error("connection failed: {0}")]
    Connection(String),

    /// JSON-RPC error returned by the node itself.
    ///
    /// `-32000` and similar "too many results" / "not found" codes are
    /// treated as node-protocol errors by the log scanner and retried
    /// after a fixed backoff at the minimum batch size; other codes are
    /// fatal.
    #[error("RPC error ({code}): {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Human-readable error message from the node.
        message: String,
    },

    /// Response was valid JSON but had unexpected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Failed to encode a call's arguments or decode its result.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Invalid configuration supplied when constructing the node client.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Catch-all for errors that don't fit the categories above.
    #[error("node error: {0}")]
    Other(String),
}

impl NodeError {
    /// Build an RPC error from a code and message.
    #[must_use]
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
        }
    }

    /// True for transient transport errors the log scanner should retry
    /// in place after shrinking its batch size (§4.2 "transient network
    /// error").
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// True for node-side protocol errors (`-32000` and equivalents:
    /// "too many results", block range too wide) the log scanner should
    /// retry after a fixed backoff at the minimum batch size (§4.2
    /// "node-side protocol error").
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        match self {
            Self::Rpc { code, message } => {
                *code == -32000
                    || message.to_lowercase().contains("too many results")
                    || message.to_lowercase().contains("query returned more than")
                    || message.to_lowercase().contains("block range")
            }
            _ => false,
        }
    }
}

impl From<alloy::transports::TransportError> for NodeError {
    fn from(err: alloy::transports::TransportError) -> Self {
        let msg = err.to_string();
        let lower = msg.to_lowercase();

        if let Some(rpc_err) = err.as_error_resp() {
            return Self::Rpc {
                code: rpc_err.code,
                message: rpc_err.message.to_string(),
            };
        }

        if lower.contains("timeout") || lower.contains("timed out") {
            Self::Connection(format!("request timed out: {msg}"))
        } else if lower.contains("connection") || lower.contains("connect") || lower.contains("refused") {
            Self::Connection(msg)
        } else {
            Self::Other(msg)
        }
    }
}

impl From<alloy::contract::Error> for NodeError {
    fn from(err: alloy::contract::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}

impl From<alloy::sol_types::Error> for NodeError {
    fn from(err: alloy::sol_types::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}
