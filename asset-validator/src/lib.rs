//! Asset Validator
//!
//! Validates entries in a curated registry of ERC-20 token descriptors
//! against the on-chain reality of the Ethereum network: contract
//! existence, method surface, decimals, and observed gas usage per
//! token-transfer transaction, plus a cross-check against an external
//! asset registry.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                       AssetValidator (C8 entry)                   │
//! │  ┌────────────────┐ ┌────────────────────┐ ┌───────────────────┐ │
//! │  │ ContractShape  │ │ ExternalCrossCheck  │ │  GasProfile        │ │
//! │  │ (C6)           │ │ (C7)                │ │  (C5)              │ │
//! │  └────────────────┘ └────────────────────┘ └─────────┬──────────┘ │
//! │                                                        │            │
//! │                                             ┌──────────▼─────────┐ │
//! │                                             │ ReceiptFetcher (C3) │ │
//! │                                             └──────────┬─────────┘ │
//! │                                             ┌──────────▼─────────┐ │
//! │                                             │  LogScanner (C2)    │ │
//! │                                             └──────────┬─────────┘ │
//! │                                             ┌──────────▼─────────┐ │
//! │                                             │ AdaptiveBlockRange  │ │
//! │                                             │  (C1)               │ │
//! │                                             └──────────┬─────────┘ │
//! └────────────────────────────────────────────────────────┼──────────┘
//!                                                            ▼
//!                                                  eth-node (JSON-RPC)
//! ```
//!
//! # Modules
//!
//! - [`abi`] - ERC-20 ABI bindings and selector utilities
//! - [`block_range`] - C1, the adaptive block-range cursor
//! - [`scanner`] - C2, the adaptive log scanner
//! - [`receipts`] - C3, the bounded-concurrency receipt fetcher
//! - [`digest`] - C4, the ranged quantile digest
//! - [`validators`] - C5/C6/C7 plus the `isValidContract` orchestrator
//! - [`descriptor`] - the asset descriptor, issues, and ignore classifier
//! - [`cmc`] - the CoinMarketCap-style external registry client
//! - [`kafka`] - the Kafka request/response service shell
//! - [`config`] - layered settings
//! - [`error`] - the layered error hierarchy
//!
//! # Getting started
//!
//! ```bash
//! # Validate a descriptor file against a node
//! asset-validator validate assets.json --node https://eth.example.com
//!
//! # Run the Kafka request/response loop (processes one message, then exits)
//! asset-validator request
//! ```

pub mod abi;
pub mod block_range;
pub mod cmc;
pub mod config;
pub mod descriptor;
pub mod digest;
pub mod error;
pub mod kafka;
pub mod receipts;
pub mod scanner;
pub mod validators;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the library version string.
#[must_use]
pub const fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
        assert!(version().starts_with("0."));
    }
}
