//! ERC-20 ABI bindings and method-selector utilities.
//!
//! [`Erc20`] is used only for its generated selectors and call/return
//! encoding; every call still goes through [`eth_node::EthNode::call`]
//! so the contract-shape validator can control retries and mocking.

use alloy::primitives::{keccak256, Address};
use alloy::sol;
use alloy::sol_types::SolCall;

sol! {
    #[derive(Debug)]
    interface Erc20 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address owner) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);

        event Transfer(address indexed from, address indexed to, uint256 value);
        event Approval(address indexed owner, address indexed spender, uint256 value);
    }
}

/// One ERC-20 method this crate probes for presence and, outside `fast`
/// mode, invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSpec {
    /// Method name as it appears in [`crate::descriptor::ValidationIssue::field`].
    pub name: &'static str,
    /// Full Solidity signature, e.g. `"decimals()"`.
    pub signature: &'static str,
    /// Whether the method takes no arguments (eligible for a zero-arg probe call).
    pub niladic: bool,
}

/// The ERC-20 method surface this crate checks, in probe order.
pub const METHODS: &[MethodSpec] = &[
    MethodSpec { name: "name", signature: "name()", niladic: true },
    MethodSpec { name: "symbol", signature: "symbol()", niladic: true },
    MethodSpec { name: "decimals", signature: "decimals()", niladic: true },
    MethodSpec { name: "totalSupply", signature: "totalSupply()", niladic: true },
    MethodSpec { name: "balanceOf", signature: "balanceOf(address)", niladic: false },
    MethodSpec { name: "transfer", signature: "transfer(address,uint256)", niladic: false },
    MethodSpec { name: "approve", signature: "approve(address,uint256)", niladic: false },
    MethodSpec { name: "transferFrom", signature: "transferFrom(address,address,uint256)", niladic: false },
    MethodSpec { name: "allowance", signature: "allowance(address,address)", niladic: false },
];

/// The 4-byte selector for a Solidity method signature, e.g.
/// `selector("decimals()")`.
#[must_use]
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Whether `selector` appears as a contiguous byte sequence anywhere in
/// `code`. This is a coarse but effective heuristic: compilers emit the
/// selector as a literal constant in the dispatcher, so presence in the
/// runtime bytecode is a reliable proxy for "this method is wired up".
#[must_use]
pub fn selector_present(code: &[u8], selector: [u8; 4]) -> bool {
    code.windows(4).any(|window| window == selector)
}

/// Encode a `decimals()` call.
#[must_use]
pub fn encode_decimals_call() -> Vec<u8> {
    Erc20::decimalsCall {}.abi_encode()
}

/// Encode a zero-argument probe call for `balanceOf`/`transfer`/etc. by
/// signature, filling address/uint arguments with zero values. Used by
/// the `fast`-mode-excluded invocation probe (§4.6): the goal is only to
/// confirm the call does not revert, not to exercise real state.
#[must_use]
pub fn encode_probe_call(signature: &str) -> Option<Vec<u8>> {
    match signature {
        "name()" => Some(Erc20::nameCall {}.abi_encode()),
        "symbol()" => Some(Erc20::symbolCall {}.abi_encode()),
        "totalSupply()" => Some(Erc20::totalSupplyCall {}.abi_encode()),
        "balanceOf(address)" => Some(Erc20::balanceOfCall { owner: Address::ZERO }.abi_encode()),
        "allowance(address,address)" => Some(
            Erc20::allowanceCall {
                owner: Address::ZERO,
                spender: Address::ZERO,
            }
            .abi_encode(),
        ),
        _ => None,
    }
}

/// Decode a `decimals()` return value.
///
/// # Errors
/// Returns an error if the bytes do not decode as a `uint8`.
pub fn decode_decimals(data: &[u8]) -> alloy::sol_types::Result<u8> {
    Erc20::decimalsCall::abi_decode_returns(data)
}

/// Event signature hash for `Transfer(address,address,uint256)`.
#[must_use]
pub fn transfer_event_signature() -> alloy::primitives::B256 {
    Erc20::Transfer::SIGNATURE_HASH
}
