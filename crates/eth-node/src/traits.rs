//! Core trait for reading Ethereum chain state.
//!
//! This module defines [`EthNode`], the single abstraction the asset
//! validator depends on for all on-chain reads: the log scanner (C2),
//! receipt fetcher (C3), gas-profile validator (C5), and contract-shape
//! validator (C6) only ever see this trait, never a concrete transport.

use alloy::primitives::{Address, BlockNumber, Bytes, TxHash};
use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::types::{BlockHeader, LogFilter, LogRecord, TransactionInfo, TransactionReceipt};

/// Read-only Ethereum node access.
///
/// Implementations must be safe to share across concurrent callers: the
/// receipt fetcher (C3) calls [`EthNode::get_transaction_receipt`] and
/// [`EthNode::get_transaction`] from a bounded pool of concurrent tasks
/// against the same node handle.
#[async_trait]
pub trait EthNode: Send + Sync {
    /// Current chain tip (`eth_blockNumber`).
    async fn chain_tip(&self) -> Result<BlockNumber>;

    /// Deployed bytecode at `address` at the `"latest"` block
    /// (`eth_getCode`). Empty bytes means no contract is deployed there.
    async fn get_code(&self, address: Address) -> Result<Bytes>;

    /// Read-only contract call against the `"latest"` block
    /// (`eth_call`). `data` is the already-encoded calldata (selector
    /// plus arguments).
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    /// Fetch logs matching `filter` (`eth_getLogs`). Logs are returned
    /// in node order; the caller does not need to sort them.
    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<LogRecord>>;

    /// Fetch a transaction's receipt, `None` if not yet mined
    /// (`eth_getTransactionReceipt`).
    async fn get_transaction_receipt(&self, hash: TxHash) -> Result<Option<TransactionReceipt>>;

    /// Fetch a transaction's body, `None` if unknown
    /// (`eth_getTransaction`).
    async fn get_transaction(&self, hash: TxHash) -> Result<Option<TransactionInfo>>;

    /// Fetch a block header by number, `None` if not yet mined
    /// (`eth_getBlockByNumber`). Used by the date→block search utility.
    async fn get_block_by_number(&self, number: BlockNumber) -> Result<Option<BlockHeader>>;
}

#[async_trait]
impl<T: EthNode + ?Sized> EthNode for Arc<T> {
    async fn chain_tip(&self) -> Result<BlockNumber> {
        (**self).chain_tip().await
    }

    async fn get_code(&self, address: Address) -> Result<Bytes> {
        (**self).get_code(address).await
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        (**self).call(to, data).await
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<LogRecord>> {
        (**self).get_logs(filter).await
    }

    async fn get_transaction_receipt(&self, hash: TxHash) -> Result<Option<TransactionReceipt>> {
        (**self).get_transaction_receipt(hash).await
    }

    async fn get_transaction(&self, hash: TxHash) -> Result<Option<TransactionInfo>> {
        (**self).get_transaction(hash).await
    }

    async fn get_block_by_number(&self, number: BlockNumber) -> Result<Option<BlockHeader>> {
        (**self).get_block_by_number(number).await
    }
}
