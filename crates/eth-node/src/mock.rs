//! In-memory test double for [`EthNode`].
//!
//! This module provides [`MockEthNode`], used throughout the log
//! scanner, receipt fetcher, and validator test suites to simulate
//! chain state (and, via [`MockEthNode::fail_logs_times`] and
//! [`MockEthNode::set_logs_delay`], transient/protocol failures and
//! latency) without a real node.
//!
//! # Panics
//!
//! Methods panic if an internal lock is poisoned, which only happens if
//! a test panics while holding the lock.

#![allow(clippy::expect_used)]
#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use alloy::primitives::{Address, BlockNumber, Bytes, TxHash};
use async_trait::async_trait;

use crate::error::{NodeError, Result};
use crate::traits::EthNode;
use crate::types::{BlockHeader, LogFilter, LogRecord, TransactionInfo, TransactionReceipt};

/// Failure to inject on the next `N` calls to [`EthNode::get_logs`].
#[derive(Debug, Clone, Copy)]
enum InjectedFailure {
    Transient,
    Protocol,
}

/// An in-memory [`EthNode`] for tests.
#[derive(Debug)]
pub struct MockEthNode {
    chain_tip: AtomicU64,
    code: RwLock<HashMap<Address, Bytes>>,
    call_responses: RwLock<HashMap<(Address, Vec<u8>), Bytes>>,
    logs_by_range: RwLock<Vec<(BlockNumber, BlockNumber, Vec<LogRecord>)>>,
    receipts: RwLock<HashMap<TxHash, TransactionReceipt>>,
    transactions: RwLock<HashMap<TxHash, TransactionInfo>>,
    blocks: RwLock<HashMap<BlockNumber, BlockHeader>>,
    pending_failures: RwLock<Vec<InjectedFailure>>,
    logs_delay: RwLock<Duration>,
    get_logs_calls: AtomicU64,
}

impl Default for MockEthNode {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEthNode {
    /// Create an empty mock node with chain tip `0`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chain_tip: AtomicU64::new(0),
            code: RwLock::new(HashMap::new()),
            call_responses: RwLock::new(HashMap::new()),
            logs_by_range: RwLock::new(Vec::new()),
            receipts: RwLock::new(HashMap::new()),
            transactions: RwLock::new(HashMap::new()),
            blocks: RwLock::new(HashMap::new()),
            pending_failures: RwLock::new(Vec::new()),
            logs_delay: RwLock::new(Duration::ZERO),
            get_logs_calls: AtomicU64::new(0),
        }
    }

    /// Set the value `chain_tip()` returns.
    pub fn set_chain_tip(&self, tip: BlockNumber) {
        self.chain_tip.store(tip, Ordering::SeqCst);
    }

    /// Set the bytecode returned for `address`.
    pub fn set_code(&self, address: Address, code: Bytes) {
        self.code.write().expect("lock poisoned").insert(address, code);
    }

    /// Set the `eth_call` response for a given `(to, calldata)` pair.
    pub fn set_call_response(&self, to: Address, data: Bytes, response: Bytes) {
        self.call_responses
            .write()
            .expect("lock poisoned")
            .insert((to, data.to_vec()), response);
    }

    /// Register the logs that `get_logs` should return for a request
    /// whose range is fully contained within `[from, to]`.
    pub fn set_logs(&self, from: BlockNumber, to: BlockNumber, logs: Vec<LogRecord>) {
        self.logs_by_range.write().expect("lock poisoned").push((from, to, logs));
    }

    /// Register a receipt to be returned for `hash`.
    pub fn set_receipt(&self, hash: TxHash, receipt: TransactionReceipt) {
        self.receipts.write().expect("lock poisoned").insert(hash, receipt);
    }

    /// Register a transaction body to be returned for `hash`.
    pub fn set_transaction(&self, hash: TxHash, tx: TransactionInfo) {
        self.transactions.write().expect("lock poisoned").insert(hash, tx);
    }

    /// Register a block header to be returned for `number`.
    pub fn set_block(&self, number: BlockNumber, header: BlockHeader) {
        self.blocks.write().expect("lock poisoned").insert(number, header);
    }

    /// Make the next call to `get_logs` fail with a transient transport
    /// error (simulating the §4.2 "transient network error" path).
    pub fn fail_logs_transient_once(&self) {
        self.pending_failures
            .write()
            .expect("lock poisoned")
            .push(InjectedFailure::Transient);
    }

    /// Make the next call to `get_logs` fail with a node-protocol error
    /// (simulating the §4.2 "node-side protocol error" path).
    pub fn fail_logs_protocol_once(&self) {
        self.pending_failures
            .write()
            .expect("lock poisoned")
            .push(InjectedFailure::Protocol);
    }

    /// Artificially delay every `get_logs` call, for latency-adaptation
    /// tests.
    pub fn set_logs_delay(&self, delay: Duration) {
        *self.logs_delay.write().expect("lock poisoned") = delay;
    }

    /// Number of times `get_logs` has been called so far.
    #[must_use]
    pub fn get_logs_call_count(&self) -> u64 {
        self.get_logs_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EthNode for MockEthNode {
    async fn chain_tip(&self) -> Result<BlockNumber> {
        Ok(self.chain_tip.load(Ordering::SeqCst))
    }

    async fn get_code(&self, address: Address) -> Result<Bytes> {
        Ok(self
            .code
            .read()
            .expect("lock poisoned")
            .get(&address)
            .cloned()
            .unwrap_or_default())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.call_responses
            .read()
            .expect("lock poisoned")
            .get(&(to, data.to_vec()))
            .cloned()
            .ok_or_else(|| NodeError::Rpc {
                code: -32000,
                message: "execution reverted".into(),
            })
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<LogRecord>> {
        self.get_logs_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.logs_delay.read().expect("lock poisoned");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(failure) = self.pending_failures.write().expect("lock poisoned").pop() {
            return Err(match failure {
                InjectedFailure::Transient => NodeError::Connection("simulated transient failure".into()),
                InjectedFailure::Protocol => {
                    NodeError::rpc(-32000, "query returned more than 10000 results")
                }
            });
        }

        let matches: Vec<LogRecord> = self
            .logs_by_range
            .read()
            .expect("lock poisoned")
            .iter()
            .filter(|(from, to, _)| *from <= filter.from_block && filter.to_block <= *to)
            .flat_map(|(_, _, logs)| logs.iter().cloned())
            .filter(|log| log.block_number >= filter.from_block && log.block_number <= filter.to_block)
            .collect();

        Ok(matches)
    }

    async fn get_transaction_receipt(&self, hash: TxHash) -> Result<Option<TransactionReceipt>> {
        Ok(self.receipts.read().expect("lock poisoned").get(&hash).cloned())
    }

    async fn get_transaction(&self, hash: TxHash) -> Result<Option<TransactionInfo>> {
        Ok(self.transactions.read().expect("lock poisoned").get(&hash).cloned())
    }

    async fn get_block_by_number(&self, number: BlockNumber) -> Result<Option<BlockHeader>> {
        Ok(self.blocks.read().expect("lock poisoned").get(&number).cloned())
    }
}
