//! Read-only abstraction over the Ethereum JSON-RPC surface the asset
//! validator needs: chain tip, contract code, `eth_call`, log scanning,
//! and transaction / receipt / block lookups.
//!
//! # Architecture
//!
//! This crate follows the ports-and-adapters (hexagonal) split used
//! throughout this codebase:
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │              Validators (C5/C6/C7)                │
//! └─────────────────────────────────────────────────┘
//!                        │ uses
//!                        ▼
//! ┌─────────────────────────────────────────────────┐
//! │              EthNode trait (Port)                │
//! │  - chain_tip()   - get_code()    - call()         │
//! │  - get_logs()    - get_transaction_receipt()      │
//! │  - get_transaction()  - get_block_by_number()     │
//! └─────────────────────────────────────────────────┘
//!                        │
//!          ┌─────────────┴─────────────┐
//!          ▼                           ▼
//! ┌─────────────────┐       ┌─────────────────────┐
//! │ HttpEthNode      │       │ MockEthNode         │
//! │ (Adapter)        │       │ (Adapter)           │
//! │ uses: alloy      │       │ in-memory, tests     │
//! └─────────────────┘       └─────────────────────┘
//! ```
//!
//! Callers depend only on `Arc<dyn EthNode>` (or generic `T: EthNode`),
//! never on the concrete adapter, so the log scanner, receipt fetcher,
//! and validators can run against either without conditional
//! compilation.

#![doc(html_root_url = "https://docs.rs/eth-node")]

// ═══════════════════════════════════════════════════════════════════════════════
// MODULES
// ═══════════════════════════════════════════════════════════════════════════════

pub mod error;
pub mod mock;
pub mod standard;
pub mod traits;
pub mod types;

// ═══════════════════════════════════════════════════════════════════════════════
// RE-EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

pub use error::{NodeError, Result};
pub use mock::MockEthNode;
pub use standard::HttpEthNode;
pub use traits::EthNode;
pub use types::{BlockHeader, LogFilter, LogRecord, TransactionInfo, TransactionReceipt};

/// Convenience re-exports for common use.
pub mod prelude {
    pub use crate::error::{NodeError, Result};
    pub use crate::traits::EthNode;
    pub use crate::types::{BlockHeader, LogFilter, LogRecord, TransactionInfo, TransactionReceipt};
}

// ═══════════════════════════════════════════════════════════════════════════════
// CRATE INFO
// ═══════════════════════════════════════════════════════════════════════════════

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version string.
#[must_use]
pub const fn version() -> &'static str {
    VERSION
}
