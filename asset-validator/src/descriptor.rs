//! Asset descriptor, validation issues, and the ignore-list classifier.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// A single curated registry entry describing one tradable asset.
///
/// Only descriptors with `blockchain_params.kind == "erc-20"` are
/// processed by the validators; all others are skipped silently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetDescriptor {
    /// Display name of the asset.
    pub name: String,
    /// Trading symbol.
    pub symbol: String,
    /// On-chain parameters, present for every asset type.
    #[serde(rename = "blockchainParams")]
    pub blockchain_params: BlockchainParams,
}

impl AssetDescriptor {
    /// Whether this descriptor is one the validators process.
    #[must_use]
    pub fn is_erc20(&self) -> bool {
        self.blockchain_params.kind == "erc-20"
    }

    /// Parse the descriptor's address into an [`Address`], normalized to
    /// EIP-55 checksum case.
    ///
    /// # Errors
    /// Returns an error message if the address is missing or malformed.
    pub fn checksummed_address(&self) -> Result<Address, String> {
        self.blockchain_params
            .address
            .parse::<Address>()
            .map_err(|e| format!("invalid address {:?}: {e}", self.blockchain_params.address))
    }
}

/// On-chain parameters of an [`AssetDescriptor`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockchainParams {
    /// Asset type; only `"erc-20"` is validated here.
    #[serde(rename = "type")]
    pub kind: String,
    /// Contract address, mixed case accepted.
    pub address: String,
    /// Declared decimals.
    pub decimals: u8,
    /// Declared maximum gas used by a single transfer transaction.
    #[serde(rename = "staticGasAmount")]
    pub static_gas_amount: u64,
    /// Block at which the contract was deployed; scan lower bound.
    #[serde(rename = "deploymentBlockNumber")]
    pub deployment_block_number: u64,
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// The descriptor field this issue concerns, e.g. `"address"`,
    /// `"decimals"`, a method name, or `"staticGasAmount"`.
    pub field: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl ValidationIssue {
    /// Construct a new issue.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Classifies whether an issue on a given symbol/field pair should be
/// suppressed per the configured ignore list.
///
/// Supported glob forms, matched in order, any hit suffices:
/// `method`, `SYMBOL.method`, `SYMBOL.*`, `*.method`.
#[derive(Debug, Clone, Default)]
pub struct IgnoreClassifier {
    globs: Vec<String>,
}

impl IgnoreClassifier {
    /// Build a classifier from the configured glob list.
    #[must_use]
    pub fn new(globs: Vec<String>) -> Self {
        Self { globs }
    }

    /// Whether `field` on `symbol` matches any configured ignore glob.
    #[must_use]
    pub fn is_ignored(&self, symbol: &str, field: &str) -> bool {
        let qualified = format!("{symbol}.{field}");
        self.globs.iter().any(|pattern| {
            glob_match::glob_match(pattern, field) || glob_match::glob_match(pattern, &qualified)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(kind: &str) -> AssetDescriptor {
        AssetDescriptor {
            name: "Example Token".into(),
            symbol: "EXT".into(),
            blockchain_params: BlockchainParams {
                kind: kind.into(),
                address: "0x1234567890123456789012345678901234567890".into(),
                decimals: 18,
                static_gas_amount: 50_000,
                deployment_block_number: 1_000_000,
            },
        }
    }

    #[test]
    fn non_erc20_descriptor_is_skipped() {
        assert!(!descriptor("erc-721").is_erc20());
        assert!(descriptor("erc-20").is_erc20());
    }

    #[test]
    fn invalid_address_is_rejected() {
        let mut d = descriptor("erc-20");
        d.blockchain_params.address = "invalid".into();
        assert!(d.checksummed_address().is_err());
    }

    #[test]
    fn valid_address_parses() {
        let d = descriptor("erc-20");
        assert!(d.checksummed_address().is_ok());
    }

    #[test]
    fn bare_method_glob_matches_any_symbol() {
        let classifier = IgnoreClassifier::new(vec!["approve".into()]);
        assert!(classifier.is_ignored("ANY", "approve"));
        assert!(classifier.is_ignored("OTHER", "approve"));
    }

    #[test]
    fn symbol_star_glob_matches_every_field_on_symbol() {
        let classifier = IgnoreClassifier::new(vec!["SYMBOL.*".into()]);
        assert!(classifier.is_ignored("SYMBOL", "name"));
        assert!(classifier.is_ignored("SYMBOL", "approve"));
        assert!(!classifier.is_ignored("OTHER", "name"));
    }

    #[test]
    fn star_method_glob_matches_method_on_every_symbol() {
        let classifier = IgnoreClassifier::new(vec!["*.approve".into()]);
        assert!(classifier.is_ignored("SYMBOL", "approve"));
        assert!(classifier.is_ignored("OTHER", "approve"));
        assert!(!classifier.is_ignored("SYMBOL", "name"));
    }

    #[test]
    fn symbol_method_glob_matches_exact_pair_only() {
        let classifier = IgnoreClassifier::new(vec!["SYMBOL.name".into()]);
        assert!(classifier.is_ignored("SYMBOL", "name"));
        assert!(!classifier.is_ignored("OTHER", "name"));
    }

    #[test]
    fn mixed_ignore_list_suppresses_each_form_independently() {
        let classifier = IgnoreClassifier::new(vec!["*.approve".into(), "SYMBOL.name".into()]);
        assert!(classifier.is_ignored("ANY", "approve"));
        assert!(classifier.is_ignored("SYMBOL", "name"));
        assert!(!classifier.is_ignored("OTHER", "name"));
    }
}
