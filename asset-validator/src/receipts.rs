//! Receipt fetcher (C3): bounded concurrent resolution of transaction
//! receipts and bodies.

use std::sync::Arc;

use alloy::primitives::TxHash;
use eth_node::{EthNode, TransactionInfo, TransactionReceipt};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinError;

use crate::error::{AppError, InfraError};

/// Resolves a `(receipt, transaction)` pair per transaction hash with a
/// hard cap on in-flight requests.
///
/// Generalizes the node-client's one-shot `join_all` fan-out into a
/// persistent bounded worker set: a [`FuturesUnordered`] never holds
/// more than `concurrency` futures at once, draining into the returned
/// channel as each resolves.
pub struct ReceiptFetcher<N: EthNode> {
    node: Arc<N>,
    concurrency: usize,
}

impl<N: EthNode + Send + Sync + 'static> ReceiptFetcher<N> {
    /// Build a fetcher bounded to `concurrency` in-flight requests
    /// (clamped to at least 1).
    #[must_use]
    pub fn new(node: Arc<N>, concurrency: usize) -> Self {
        Self {
            node,
            concurrency: concurrency.max(1),
        }
    }

    /// Resolve every hash in `hashes`. Results arrive in completion
    /// order, not submission order. Each `fetch_one` call is its own
    /// spawned task, independent of the `FuturesUnordered` draining them:
    /// if the consumer stops polling the channel, the drain loop exits
    /// and submits no further work, but any task already in flight keeps
    /// running to completion rather than being cancelled mid-RPC (§4.3,
    /// §5 "tokio task JoinHandles are not aborted, only no longer
    /// awaited beyond the channel close").
    pub fn fetch(
        &self,
        hashes: Vec<TxHash>,
    ) -> mpsc::Receiver<Result<(TransactionReceipt, TransactionInfo), AppError>> {
        let (tx, rx) = mpsc::channel(self.concurrency);
        let node = Arc::clone(&self.node);
        let concurrency = self.concurrency;

        tokio::spawn(async move {
            let mut remaining = hashes.into_iter();
            let mut in_flight = FuturesUnordered::new();

            for hash in remaining.by_ref().take(concurrency) {
                in_flight.push(tokio::spawn(fetch_one(Arc::clone(&node), hash)));
            }

            while let Some(joined) = in_flight.next().await {
                let result = flatten_join(joined);
                if tx.send(result).await.is_err() {
                    return;
                }
                if let Some(hash) = remaining.next() {
                    in_flight.push(tokio::spawn(fetch_one(Arc::clone(&node), hash)));
                }
            }
        });

        rx
    }
}

/// Collapse a spawned task's `JoinHandle` outcome into the fetcher's
/// own result type, turning a panicked task into an infra error instead
/// of propagating the panic to the drain loop.
fn flatten_join(
    joined: Result<Result<(TransactionReceipt, TransactionInfo), AppError>, JoinError>,
) -> Result<(TransactionReceipt, TransactionInfo), AppError> {
    match joined {
        Ok(result) => result,
        Err(err) => Err(AppError::Infra(InfraError::Timeout(format!("receipt fetch task failed: {err}")))),
    }
}

async fn fetch_one<N: EthNode + Send + Sync + 'static>(
    node: Arc<N>,
    hash: TxHash,
) -> Result<(TransactionReceipt, TransactionInfo), AppError> {
    let receipt = node
        .get_transaction_receipt(hash)
        .await
        .map_err(InfraError::Node)?
        .ok_or_else(|| AppError::Infra(InfraError::Timeout(format!("receipt not found for {hash}"))))?;

    let transaction = node
        .get_transaction(hash)
        .await
        .map_err(InfraError::Node)?
        .ok_or_else(|| {
            AppError::Infra(InfraError::Timeout(format!("transaction not found for {hash}")))
        })?;

    Ok((receipt, transaction))
}
