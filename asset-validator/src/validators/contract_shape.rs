//! Contract-shape validator (C6): method-selector presence, optional
//! invocation probes, and a mandatory `decimals()` check.

use std::sync::Arc;

use alloy::primitives::Address;
use eth_node::EthNode;
use tracing::instrument;

use crate::abi;
use crate::descriptor::{AssetDescriptor, ValidationIssue};
use crate::error::{AppError, InfraError};

/// Checks that a descriptor's contract exists, exposes the ERC-20
/// method surface in its bytecode, and (outside `fast` mode) that each
/// niladic method actually answers a call without reverting.
pub struct ContractShapeValidator<N: EthNode> {
    node: Arc<N>,
    fast: bool,
}

impl<N: EthNode> ContractShapeValidator<N> {
    /// Build a validator. In `fast` mode, only `decimals()` is invoked;
    /// every other method is checked for selector presence only.
    #[must_use]
    pub fn new(node: Arc<N>, fast: bool) -> Self {
        Self { node, fast }
    }

    /// Validate `descriptor` against the deployed bytecode at its
    /// address.
    ///
    /// # Errors
    /// Propagates fatal node errors (anything other than a missing
    /// contract or a failed method call, both of which become issues).
    #[instrument(skip(self, descriptor), fields(symbol = %descriptor.symbol))]
    pub async fn validate(&self, descriptor: &AssetDescriptor) -> Result<Vec<ValidationIssue>, AppError> {
        let address = match descriptor.checksummed_address() {
            Ok(address) => address,
            Err(message) => return Ok(vec![ValidationIssue::new("address", message)]),
        };

        let code = self.node.get_code(address).await.map_err(InfraError::Node)?;
        if code.is_empty() {
            return Ok(vec![ValidationIssue::new(
                "code",
                format!("no contract deployed at {address}"),
            )]);
        }

        let mut issues = Vec::new();
        for method in abi::METHODS {
            let selector = abi::selector(method.signature);
            if !abi::selector_present(&code, selector) {
                issues.push(ValidationIssue::new(
                    method.name,
                    format!("selector for {} not found in bytecode", method.signature),
                ));
                continue;
            }

            if method.name == "decimals" {
                issues.extend(self.check_decimals(address, descriptor).await?);
                continue;
            }

            if !self.fast && method.niladic {
                if let Some(calldata) = abi::encode_probe_call(method.signature) {
                    if let Err(err) = self.node.call(address, calldata.into()).await {
                        issues.push(ValidationIssue::new(
                            method.name,
                            format!("{} call failed: {err}", method.signature),
                        ));
                    }
                }
            }
        }

        Ok(issues)
    }

    /// Invoke and check `decimals()`. A value mismatch is reported on the
    /// `"decimals"` field, which the orchestrator's never-ignorable field
    /// list keeps fatal regardless of the ignore list (§4.6, §7
    /// "Descriptor-fatal").
    /// A failed call or an undecodable response is a different kind of
    /// problem — the method may simply not exist the way the ABI expects —
    /// and is reported on `"decimalsCall"` instead, so it is routed through
    /// the ordinary ignore-glob logic like every other method probe (§7
    /// "Descriptor-ignorable", contrast with the fatal mismatch case).
    async fn check_decimals(
        &self,
        address: Address,
        descriptor: &AssetDescriptor,
    ) -> Result<Vec<ValidationIssue>, AppError> {
        let calldata = abi::encode_decimals_call();
        let response = match self.node.call(address, calldata.into()).await {
            Ok(response) => response,
            Err(err) => {
                return Ok(vec![ValidationIssue::new(
                    "decimalsCall",
                    format!("decimals() call failed: {err}"),
                )]);
            }
        };

        match abi::decode_decimals(&response) {
            Ok(onchain) if onchain == descriptor.blockchain_params.decimals => Ok(Vec::new()),
            Ok(onchain) => Ok(vec![ValidationIssue::new(
                "decimals",
                format!(
                    "decimals mismatch: descriptor says {}, chain says {onchain}",
                    descriptor.blockchain_params.decimals
                ),
            )]),
            Err(err) => Ok(vec![ValidationIssue::new(
                "decimalsCall",
                format!("failed to decode decimals() response: {err}"),
            )]),
        }
    }
}
