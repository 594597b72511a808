//! Layered error types for the asset validator.
//!
//! This module provides a two-layer error system:
//!
//! - [`InfraError`] - infrastructure errors (node RPC, Kafka, HTTP cross-check)
//! - [`AppError`] - application-level errors wrapping infra errors plus a
//!   few run-level conditions of their own
//!
//! # Error Philosophy
//!
//! - A single descriptor's findings are [`crate::descriptor::ValidationIssue`]s,
//!   not errors: they are data the caller collects and classifies (§7
//!   "Descriptor-fatal"/"Descriptor-ignorable"), never something this crate
//!   propagates via `Result`.
//! - Infrastructure errors mean validation could not even be attempted and
//!   are logged with full detail before being reported up.
//! - The `Result` type alias uses [`AppError`] for application code.

use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// INFRASTRUCTURE ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Infrastructure-level errors from external systems.
///
/// These mean a validation run could not complete, independent of whether
/// the asset itself is valid.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InfraError {
    /// Ethereum node error (RPC, transport, decoding).
    #[error("node error: {0}")]
    Node(#[from] eth_node::NodeError),

    /// Kafka producer or consumer error.
    #[error("kafka error: {0}")]
    Kafka(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// CoinMarketCap-style cross-check HTTP client error.
    #[error("cross-check client error: {0}")]
    CrossCheckClient(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Descriptor file could not be read or parsed.
    #[error("descriptor file error: {0}")]
    DescriptorFile(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Timeout waiting for an operation.
    #[error("operation timed out: {0}")]
    Timeout(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// APPLICATION ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Application-level errors.
///
/// This is the primary error type used throughout the application.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    /// Infrastructure error.
    #[error(transparent)]
    Infra(#[from] InfraError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Initialization error.
    #[error("initialization error: {0}")]
    Initialization(String),

    /// Graceful shutdown requested.
    #[error("shutdown requested")]
    ShutdownRequested,
}

/// Type alias for application Results.
pub type Result<T> = std::result::Result<T, AppError>;
