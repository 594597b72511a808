//! External cross-check validator (C7): compares a descriptor's
//! address against a CoinMarketCap-style symbol→asset registry.

use std::collections::HashMap;

use alloy::primitives::Address;
use serde::Deserialize;

use crate::descriptor::{AssetDescriptor, ValidationIssue};

/// One entry of the external asset registry, as returned by the
/// CoinMarketCap-style HTTP client (C8).
#[derive(Debug, Clone, Deserialize)]
pub struct CmcAssetRecord {
    /// The asset's own symbol, e.g. `"EXT"`. Used by the client (C8) to
    /// key the [`CmcAssetMap`] built from the registry's `data` list.
    pub symbol: String,
    /// On-chain platform this symbol is deployed on, if any.
    pub platform: Option<CmcPlatform>,
}

/// Platform metadata for one [`CmcAssetRecord`].
#[derive(Debug, Clone, Deserialize)]
pub struct CmcPlatform {
    /// Platform symbol, e.g. `"ETH"`.
    pub symbol: String,
    /// Contract address on that platform.
    pub token_address: String,
}

/// Symbol→asset map, fetched once at startup by the CMC client and
/// shared across every descriptor validated in a run.
pub type CmcAssetMap = HashMap<String, CmcAssetRecord>;

/// Cross-checks a descriptor's address against an external registry.
/// Every finding is ignorable (§4.7): none of them abort validation on
/// their own.
pub struct ExternalCrossCheck {
    asset_map: CmcAssetMap,
}

impl ExternalCrossCheck {
    /// Build a cross-checker over an already-fetched asset map.
    #[must_use]
    pub fn new(asset_map: CmcAssetMap) -> Self {
        Self { asset_map }
    }

    /// Compare `descriptor` against the external registry.
    #[must_use]
    pub fn validate(&self, descriptor: &AssetDescriptor) -> Vec<ValidationIssue> {
        let Some(record) = self.asset_map.get(&descriptor.symbol) else {
            return vec![ValidationIssue::new(
                "symbol",
                format!("symbol {} not found in external asset registry", descriptor.symbol),
            )];
        };

        let Some(platform) = &record.platform else {
            return vec![ValidationIssue::new(
                "platform",
                format!("no platform entry for symbol {}", descriptor.symbol),
            )];
        };

        if platform.symbol != "ETH" {
            return vec![ValidationIssue::new(
                "platform",
                format!("platform symbol {} is not ETH", platform.symbol),
            )];
        }

        let Ok(registry_address) = platform.token_address.parse::<Address>() else {
            return vec![ValidationIssue::new(
                "address",
                format!("registry token_address {:?} is not a valid address", platform.token_address),
            )];
        };

        match descriptor.checksummed_address() {
            Ok(descriptor_address) if descriptor_address == registry_address => Vec::new(),
            Ok(_) => vec![ValidationIssue::new(
                "address",
                "registry token_address does not match descriptor address".to_string(),
            )],
            Err(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::BlockchainParams;

    const ADDRESS: &str = "0x1234567890123456789012345678901234567890";

    fn descriptor() -> AssetDescriptor {
        AssetDescriptor {
            name: "Example Token".into(),
            symbol: "EXT".into(),
            blockchain_params: BlockchainParams {
                kind: "erc-20".into(),
                address: ADDRESS.into(),
                decimals: 18,
                static_gas_amount: 50_000,
                deployment_block_number: 1_000_000,
            },
        }
    }

    #[test]
    fn missing_symbol_is_ignorable_issue() {
        let checker = ExternalCrossCheck::new(CmcAssetMap::new());
        let issues = checker.validate(&descriptor());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "symbol");
    }

    #[test]
    fn missing_platform_is_ignorable_issue() {
        let mut map = CmcAssetMap::new();
        map.insert("EXT".into(), CmcAssetRecord { symbol: "EXT".into(), platform: None });
        let checker = ExternalCrossCheck::new(map);
        let issues = checker.validate(&descriptor());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "platform");
    }

    #[test]
    fn non_eth_platform_is_ignorable_issue() {
        let mut map = CmcAssetMap::new();
        map.insert(
            "EXT".into(),
            CmcAssetRecord {
                symbol: "EXT".into(),
                platform: Some(CmcPlatform {
                    symbol: "BSC".into(),
                    token_address: ADDRESS.into(),
                }),
            },
        );
        let checker = ExternalCrossCheck::new(map);
        let issues = checker.validate(&descriptor());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "platform");
    }

    #[test]
    fn address_mismatch_is_ignorable_issue() {
        let mut map = CmcAssetMap::new();
        map.insert(
            "EXT".into(),
            CmcAssetRecord {
                symbol: "EXT".into(),
                platform: Some(CmcPlatform {
                    symbol: "ETH".into(),
                    token_address: "0x0000000000000000000000000000000000dEaD".into(),
                }),
            },
        );
        let checker = ExternalCrossCheck::new(map);
        let issues = checker.validate(&descriptor());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "address");
    }

    #[test]
    fn matching_record_yields_no_issues() {
        let mut map = CmcAssetMap::new();
        map.insert(
            "EXT".into(),
            CmcAssetRecord {
                symbol: "EXT".into(),
                platform: Some(CmcPlatform {
                    symbol: "ETH".into(),
                    token_address: ADDRESS.into(),
                }),
            },
        );
        let checker = ExternalCrossCheck::new(map);
        assert!(checker.validate(&descriptor()).is_empty());
    }
}
