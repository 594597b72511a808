//! HTTP implementation of [`EthNode`] using alloy.
//!
//! This module provides [`HttpEthNode`], the production adapter backed
//! by alloy's HTTP transport. It works against any standard
//! Ethereum-JSON-RPC-speaking node.

use std::sync::Arc;
use std::time::Duration;

use alloy::consensus::Transaction as _;
use alloy::eips::BlockNumberOrTag;
use alloy::network::Ethereum;
use alloy::primitives::{Address, BlockNumber, Bytes, TxHash};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::{Filter, TransactionRequest as AlloyTxRequest};
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::error::{NodeError, Result};
use crate::traits::EthNode;
use crate::types::{BlockHeader, LogFilter, LogRecord, TransactionInfo, TransactionReceipt};

/// Ethereum node client backed by alloy's HTTP transport.
///
/// Holds no mutable state beyond the cached chain ID; safe to share via
/// `Arc` across the bounded receipt-fetcher pool.
#[derive(Debug, Clone)]
pub struct HttpEthNode {
    provider: Arc<RootProvider<Ethereum>>,
    chain_id: u64,
}

impl HttpEthNode {
    /// Connect to `rpc_url` with the default 5-second request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the HTTP client cannot be
    /// built, or the initial `eth_chainId` probe fails.
    pub async fn new(rpc_url: &str) -> Result<Self> {
        Self::with_timeout(rpc_url, Duration::from_secs(5)).await
    }

    /// Connect to `rpc_url` with a custom per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the HTTP client cannot be
    /// built, or the initial `eth_chainId` probe fails.
    pub async fn with_timeout(rpc_url: &str, timeout: Duration) -> Result<Self> {
        let url: reqwest::Url = rpc_url
            .parse()
            .map_err(|e| NodeError::InvalidConfig(format!("invalid RPC URL: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NodeError::Connection(format!("failed to build HTTP client: {e}")))?;

        let provider = ProviderBuilder::default().connect_reqwest(client, url);

        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| NodeError::Connection(format!("failed to get chain ID: {e}")))?;

        debug!(chain_id, rpc_url, "connected to Ethereum node");

        Ok(Self {
            provider: Arc::new(provider),
            chain_id,
        })
    }

    /// Chain ID reported by the node at connect time.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn to_alloy_filter(filter: &LogFilter) -> Filter {
        let mut f = Filter::new()
            .from_block(filter.from_block)
            .to_block(filter.to_block);

        if !filter.addresses.is_empty() {
            f = f.address(filter.addresses.clone());
        }

        for (position, topic) in filter.topics.iter().enumerate() {
            if let Some(topic) = topic {
                f = match position {
                    0 => f.event_signature(*topic),
                    1 => f.topic1(*topic),
                    2 => f.topic2(*topic),
                    3 => f.topic3(*topic),
                    _ => f,
                };
            }
        }

        f
    }

    fn from_alloy_log(log: &alloy::rpc::types::Log) -> Result<LogRecord> {
        Ok(LogRecord {
            block_number: log
                .block_number
                .ok_or_else(|| NodeError::InvalidResponse("log missing block_number".into()))?,
            transaction_hash: log
                .transaction_hash
                .ok_or_else(|| NodeError::InvalidResponse("log missing transaction_hash".into()))?,
            address: log.address(),
            topics: log.topics().to_vec(),
            data: log.data().data.clone(),
        })
    }

    fn from_alloy_receipt(receipt: &alloy::rpc::types::TransactionReceipt) -> Result<TransactionReceipt> {
        let logs = receipt
            .inner
            .logs()
            .iter()
            .map(Self::from_alloy_log)
            .collect::<Result<Vec<_>>>()?;

        Ok(TransactionReceipt {
            transaction_hash: receipt.transaction_hash,
            from: receipt.from,
            block_number: receipt
                .block_number
                .ok_or_else(|| NodeError::InvalidResponse("receipt missing block_number".into()))?,
            gas_used: receipt.gas_used,
            logs,
        })
    }
}

#[async_trait]
impl EthNode for HttpEthNode {
    #[instrument(skip(self), fields(chain_id = self.chain_id))]
    async fn chain_tip(&self) -> Result<BlockNumber> {
        self.provider.get_block_number().await.map_err(NodeError::from)
    }

    #[instrument(skip(self), fields(chain_id = self.chain_id))]
    async fn get_code(&self, address: Address) -> Result<Bytes> {
        self.provider.get_code_at(address).await.map_err(NodeError::from)
    }

    #[instrument(skip(self, data), fields(chain_id = self.chain_id))]
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let tx = AlloyTxRequest::default().to(to).input(data.into());
        self.provider.call(tx).await.map_err(NodeError::from)
    }

    #[instrument(skip(self), fields(chain_id = self.chain_id, from = filter.from_block, to = filter.to_block))]
    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<LogRecord>> {
        let alloy_filter = Self::to_alloy_filter(filter);
        let logs = self.provider.get_logs(&alloy_filter).await.map_err(NodeError::from)?;
        logs.iter().map(Self::from_alloy_log).collect()
    }

    #[instrument(skip(self), fields(chain_id = self.chain_id))]
    async fn get_transaction_receipt(&self, hash: TxHash) -> Result<Option<TransactionReceipt>> {
        match self.provider.get_transaction_receipt(hash).await.map_err(NodeError::from)? {
            Some(receipt) => Ok(Some(Self::from_alloy_receipt(&receipt)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(chain_id = self.chain_id))]
    async fn get_transaction(&self, hash: TxHash) -> Result<Option<TransactionInfo>> {
        match self.provider.get_transaction_by_hash(hash).await.map_err(NodeError::from)? {
            Some(tx) => Ok(Some(TransactionInfo {
                hash,
                from: tx.from,
                to: tx.to(),
            })),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(chain_id = self.chain_id))]
    async fn get_block_by_number(&self, number: BlockNumber) -> Result<Option<BlockHeader>> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(number))
            .await
            .map_err(NodeError::from)?;

        Ok(block.map(|b| BlockHeader {
            number: b.header.number,
            timestamp: b.header.timestamp,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_url_fails() {
        let result = HttpEthNode::new("not-a-valid-url").await;
        assert!(result.is_err());
    }

    #[test]
    fn log_filter_translates_address_and_signature() {
        let addr: Address = "0x1234567890123456789012345678901234567890"
            .parse()
            .expect("valid address");
        let sig = alloy::primitives::B256::repeat_byte(0x11);

        let filter = LogFilter::new(10, 20).with_address(addr).with_event_signature(sig);
        let alloy_filter = HttpEthNode::to_alloy_filter(&filter);

        assert_eq!(alloy_filter.get_from_block(), Some(10));
        assert_eq!(alloy_filter.get_to_block(), Some(20));
    }
}
