//! Common types for `EthNode` operations.
//!
//! This module defines transport-agnostic data structures for reading
//! Ethereum chain state:
//!
//! - [`LogFilter`] - parameters for an `eth_getLogs` call
//! - [`LogRecord`] - a single log entry returned by `eth_getLogs`
//! - [`TransactionReceipt`] - a confirmed transaction's receipt
//! - [`TransactionInfo`] - the subset of a transaction body the validator needs
//! - [`BlockHeader`] - the subset of a block header the validator needs

use alloy::primitives::{Address, BlockNumber, Bytes, TxHash, B256};

// ═══════════════════════════════════════════════════════════════════════════════
// LOG FILTER / LOG RECORD
// ═══════════════════════════════════════════════════════════════════════════════

/// Filter parameters for an `eth_getLogs` call.
#[derive(Debug, Clone)]
pub struct LogFilter {
    /// Starting block (inclusive).
    pub from_block: BlockNumber,

    /// Ending block (inclusive).
    pub to_block: BlockNumber,

    /// Contract addresses to filter on.
    pub addresses: Vec<Address>,

    /// Topics to filter on. Position 0 is the event signature hash;
    /// positions 1-3 are indexed parameters. `None` means wildcard.
    pub topics: Vec<Option<B256>>,
}

impl LogFilter {
    /// Create a new filter for a block range, with no address or topic
    /// restriction yet.
    #[must_use]
    pub const fn new(from_block: BlockNumber, to_block: BlockNumber) -> Self {
        Self {
            from_block,
            to_block,
            addresses: Vec::new(),
            topics: Vec::new(),
        }
    }

    /// Restrict the filter to a single contract address.
    #[must_use]
    pub fn with_address(mut self, address: Address) -> Self {
        self.addresses = vec![address];
        self
    }

    /// Set the event signature (topic 0).
    #[must_use]
    pub fn with_event_signature(mut self, signature: B256) -> Self {
        if self.topics.is_empty() {
            self.topics.push(Some(signature));
        } else {
            self.topics[0] = Some(signature);
        }
        self
    }
}

/// A single log entry as returned by `eth_getLogs`.
///
/// Forward-only semantics: a `LogRecord` has no identity beyond its
/// `transaction_hash`, and the scanner never revisits one once emitted.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Block the log was emitted in.
    pub block_number: BlockNumber,

    /// Hash of the transaction that emitted the log.
    pub transaction_hash: TxHash,

    /// Contract address that emitted the log.
    pub address: Address,

    /// Indexed event topics, topic 0 is the event signature hash.
    pub topics: Vec<B256>,

    /// Non-indexed event data.
    pub data: Bytes,
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSACTION TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Receipt of a confirmed transaction, as returned by
/// `eth_getTransactionReceipt`.
#[derive(Debug, Clone)]
pub struct TransactionReceipt {
    /// Transaction hash.
    pub transaction_hash: TxHash,

    /// Sender of the transaction.
    pub from: Address,

    /// Block the transaction was included in.
    pub block_number: BlockNumber,

    /// Gas actually used by the transaction.
    pub gas_used: u64,

    /// Logs emitted by the transaction.
    pub logs: Vec<LogRecord>,
}

/// The subset of a transaction body the validator needs, as returned by
/// `eth_getTransaction`.
#[derive(Debug, Clone)]
pub struct TransactionInfo {
    /// Transaction hash.
    pub hash: TxHash,

    /// Sender of the transaction.
    pub from: Address,

    /// Recipient, `None` for contract creation.
    pub to: Option<Address>,
}

/// The subset of a block header the validator needs, as returned by
/// `eth_getBlockByNumber`. Used by the date→block search utility.
#[derive(Debug, Clone)]
pub struct BlockHeader {
    /// Block number.
    pub number: BlockNumber,

    /// Unix timestamp, seconds.
    pub timestamp: u64,
}
