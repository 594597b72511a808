//! Validator composition: the single `isValidContract` delegation
//! boundary (C8's schema dispatcher interface) and the orchestrator
//! that runs C5/C6/C7 against one descriptor and classifies the
//! resulting issues as fatal or ignorable.

pub mod contract_shape;
pub mod external_cross_check;
pub mod gas_profile;

use std::sync::Arc;

use async_trait::async_trait;
use eth_node::EthNode;
use tracing::{debug, instrument, warn};

use crate::descriptor::{AssetDescriptor, IgnoreClassifier, ValidationIssue};
use crate::error::AppError;
use contract_shape::ContractShapeValidator;
use external_cross_check::ExternalCrossCheck;
use gas_profile::GasProfileValidator;

/// Fields whose issues are descriptor-fatal and never subject to the
/// ignore glob list (§7 "Descriptor-fatal").
const NEVER_IGNORABLE_FIELDS: &[&str] = &["address", "code", "decimals"];

/// Models the single `isValidContract` keyword the outer JSON-schema
/// registry dispatches to. The general multi-keyword schema engine is
/// out of scope; this trait is the one delegation boundary it would
/// call through.
#[async_trait]
pub trait ContractValidation {
    /// Validate one descriptor, returning the fatal issues (ignorable
    /// ones already filtered and logged at debug level).
    ///
    /// # Errors
    /// Returns `Err` only for run-fatal conditions (§7 kind 5): node or
    /// worker-task failures, not descriptor problems.
    async fn validate(&self, descriptor: &AssetDescriptor) -> Result<Vec<ValidationIssue>, AppError>;
}

/// Composes the contract-shape (C6), external cross-check (C7), and
/// gas-profile (C5) validators against a single `EthNode`, applying the
/// ignore-list classifier (§7) to every issue before it is reported.
pub struct AssetValidator<N: EthNode> {
    contract_shape: ContractShapeValidator<N>,
    external_cross_check: ExternalCrossCheck,
    gas_profile: GasProfileValidator<N>,
    ignore: IgnoreClassifier,
}

impl<N: EthNode + Send + Sync + 'static> AssetValidator<N> {
    /// Build an orchestrator from its three composed validators and the
    /// configured ignore list.
    #[must_use]
    pub fn new(
        contract_shape: ContractShapeValidator<N>,
        external_cross_check: ExternalCrossCheck,
        gas_profile: GasProfileValidator<N>,
        ignore: IgnoreClassifier,
    ) -> Self {
        Self {
            contract_shape,
            external_cross_check,
            gas_profile,
            ignore,
        }
    }

    /// Build a node-backed orchestrator in one call, sharing `node`
    /// across all three composed validators.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn from_node(
        node: Arc<N>,
        cmc_asset_map: external_cross_check::CmcAssetMap,
        scan_constants: crate::scanner::ScanConstants,
        receipt_concurrency: usize,
        hard_fork_block: u64,
        digest_delta: f64,
        fast: bool,
        report_progress: bool,
        ignore_globs: Vec<String>,
    ) -> Self {
        Self::new(
            ContractShapeValidator::new(Arc::clone(&node), fast),
            ExternalCrossCheck::new(cmc_asset_map),
            GasProfileValidator::new(
                Arc::clone(&node),
                scan_constants,
                receipt_concurrency,
                hard_fork_block,
                digest_delta,
            )
            .with_progress(report_progress),
            IgnoreClassifier::new(ignore_globs),
        )
    }

    fn classify(&self, symbol: &str, issues: Vec<ValidationIssue>, fatal: &mut Vec<ValidationIssue>) {
        for issue in issues {
            if NEVER_IGNORABLE_FIELDS.contains(&issue.field.as_str()) {
                fatal.push(issue);
            } else if self.ignore.is_ignored(symbol, &issue.field) {
                debug!(symbol, field = %issue.field, message = %issue.message, "ignorable issue suppressed");
            } else {
                fatal.push(issue);
            }
        }
    }
}

#[async_trait]
impl<N: EthNode + Send + Sync + 'static> ContractValidation for AssetValidator<N> {
    #[instrument(skip(self, descriptor), fields(symbol = %descriptor.symbol))]
    async fn validate(&self, descriptor: &AssetDescriptor) -> Result<Vec<ValidationIssue>, AppError> {
        if !descriptor.is_erc20() {
            return Ok(Vec::new());
        }

        let mut fatal = Vec::new();

        let shape_issues = self.contract_shape.validate(descriptor).await?;
        let shape_has_code_issue = shape_issues.iter().any(|issue| issue.field == "code");
        self.classify(&descriptor.symbol, shape_issues, &mut fatal);

        // No contract deployed: the ERC-20 method surface and gas
        // profile cannot be meaningfully checked either.
        if shape_has_code_issue {
            return Ok(fatal);
        }

        let cross_check_issues = self.external_cross_check.validate(descriptor);
        self.classify(&descriptor.symbol, cross_check_issues, &mut fatal);

        let Ok(address) = descriptor.checksummed_address() else {
            // Already reported as a fatal "address" issue by the shape
            // validator; the gas check has nothing valid to scan.
            return Ok(fatal);
        };

        match self
            .gas_profile
            .validate(
                address,
                descriptor.blockchain_params.static_gas_amount,
                descriptor.blockchain_params.deployment_block_number,
            )
            .await
        {
            Ok(gas_issues) => self.classify(&descriptor.symbol, gas_issues, &mut fatal),
            Err(err) => {
                warn!(symbol = %descriptor.symbol, error = %err, "gas profile check aborted");
                return Err(err);
            }
        }

        Ok(fatal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::BlockchainParams;
    use crate::scanner::ScanConstants;
    use eth_node::MockEthNode;
    use std::time::Duration;

    fn descriptor(kind: &str, decimals: u8) -> AssetDescriptor {
        AssetDescriptor {
            name: "Example Token".into(),
            symbol: "EXT".into(),
            blockchain_params: BlockchainParams {
                kind: kind.into(),
                address: "0x1234567890123456789012345678901234567890".into(),
                decimals,
                static_gas_amount: 1_000_000,
                deployment_block_number: 1,
            },
        }
    }

    fn constants() -> ScanConstants {
        ScanConstants {
            target_time: Duration::from_secs(2),
            min_batch_size: 1_000_000,
            max_batch_size: 1_000_000,
            speed_change_factor: 1.0,
            exception_speed_factor: 0.1,
            max_change_ratio: 2.0,
            protocol_error_backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn non_erc20_descriptor_is_skipped_entirely() {
        let node = Arc::new(MockEthNode::new());
        let validator = AssetValidator::from_node(
            node,
            external_cross_check::CmcAssetMap::new(),
            constants(),
            10,
            0,
            0.01,
            true,
            false,
            vec![],
        );

        let issues = validator.validate(&descriptor("erc-721", 18)).await.expect("ok");
        assert!(issues.is_empty());
    }

    #[tokio::test]
    async fn missing_contract_is_fatal_and_short_circuits() {
        let node = Arc::new(MockEthNode::new());
        node.set_chain_tip(10);
        let validator = AssetValidator::from_node(
            node,
            external_cross_check::CmcAssetMap::new(),
            constants(),
            10,
            0,
            0.01,
            true,
            false,
            vec![],
        );

        let issues = validator.validate(&descriptor("erc-20", 18)).await.expect("ok");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "code");
    }

    #[tokio::test]
    async fn ignored_method_is_suppressed_while_decimals_stays_fatal() {
        use crate::abi;
        use alloy::primitives::Bytes;

        let node = Arc::new(MockEthNode::new());
        node.set_chain_tip(10);
        let d = descriptor("erc-20", 6);
        let address = d.checksummed_address().expect("valid");

        // Bytecode missing `approve`'s selector, decimals() answers 18 (mismatch).
        let mut code = Vec::new();
        for method in abi::METHODS {
            if method.name != "approve" {
                code.extend_from_slice(&abi::selector(method.signature));
            }
        }
        node.set_code(address, Bytes::from(code));
        node.set_call_response(
            address,
            abi::encode_decimals_call().into(),
            Bytes::from(vec![0u8; 31].into_iter().chain(std::iter::once(18u8)).collect::<Vec<_>>()),
        );

        let validator = AssetValidator::from_node(
            node,
            external_cross_check::CmcAssetMap::new(),
            constants(),
            10,
            0,
            0.01,
            true,
            false,
            vec!["*.approve".into()],
        );

        let issues = validator.validate(&d).await.expect("ok");

        assert!(!issues.iter().any(|issue| issue.field == "approve"));
        assert!(issues.iter().any(|issue| issue.field == "decimals"));
    }

    #[tokio::test]
    async fn decimals_call_failure_is_ignorable_unlike_a_true_mismatch() {
        use crate::abi;
        use alloy::primitives::Bytes;

        let node = Arc::new(MockEthNode::new());
        node.set_chain_tip(10);
        let d = descriptor("erc-20", 18);
        let address = d.checksummed_address().expect("valid");

        let mut code = Vec::new();
        for method in abi::METHODS {
            code.extend_from_slice(&abi::selector(method.signature));
        }
        node.set_code(address, Bytes::from(code));
        // No call response registered: decimals() fails rather than mismatches.

        let validator = AssetValidator::from_node(
            node,
            external_cross_check::CmcAssetMap::new(),
            constants(),
            10,
            0,
            0.01,
            true,
            false,
            vec!["*.decimalsCall".into()],
        );

        let issues = validator.validate(&d).await.expect("ok");

        assert!(!issues.iter().any(|issue| issue.field == "decimalsCall"));
    }
}
