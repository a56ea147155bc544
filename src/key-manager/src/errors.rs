//! Error taxonomy of the key manager.
//!
//! Every error is terminal for the request that raised it. Variants carry enough context
//! (controller, key, selector, nonce) for a program caller to react, and `revert_data` renders
//! them as the Solidity custom errors integrators already match on.

use core::fmt;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{Revert, SolError};
use key_manager_types::Permission;

pub type Result<T, E = KeyManagerError> = core::result::Result<T, E>;

/// Errors while splitting a compact bytes array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("length prefix runs past the end of the value")]
    Truncated,
    #[error("zero-length element")]
    ZeroLengthElement,
    #[error("element of {0} bytes")]
    InvalidElementLength(usize),
}

/// Which allow-list a malformed value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowListKind {
    Calls,
    DataKeys,
}

impl fmt::Display for AllowListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllowListKind::Calls => f.write_str("calls"),
            AllowListKind::DataKeys => f.write_str("data keys"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyManagerError {
    #[error("malformed allowed {kind} list ({reason}): 0x{}", hex::encode(value))]
    MalformedAllowList {
        kind: AllowListKind,
        value: Bytes,
        reason: DecodeError,
    },
    #[error("allowed calls of {controller} contain an entry with every field wildcarded")]
    InvalidWhitelistedCall { controller: Address },
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("unknown ERC725 function selector 0x{}", hex::encode(.0))]
    InvalidErc725Function([u8; 4]),

    #[error("no permissions set for {controller}")]
    NoPermissionsSet { controller: Address },
    #[error("{controller} is not authorised: missing {permission}")]
    NotAuthorised {
        controller: Address,
        permission: Permission,
    },
    #[error("{controller} has no allowed calls")]
    NoCallsAllowed { controller: Address },
    #[error("{controller} is not allowed to call {target} with selector 0x{}", hex::encode(selector))]
    NotAllowedCall {
        controller: Address,
        target: Address,
        selector: [u8; 4],
    },
    #[error("{controller} is not allowed to set data key {key}")]
    NotAllowedDataKey { controller: Address, key: B256 },
    #[error("unrecognised permission data key {key}")]
    NotRecognisedPermissionKey { key: B256 },
    #[error("invalid value for permission array key {key}: 0x{}", hex::encode(value))]
    InvalidPermissionArrayValue { key: B256, value: Bytes },

    #[error("invalid relay call signature")]
    InvalidSignature { recovered: Option<Address> },
    #[error("relay call expired at {end} (now {now})")]
    RelayCallExpired { end: u128, now: u64 },
    #[error("relay call not valid before {start} (now {now})")]
    RelayCallNotYetValid { start: u128, now: u64 },
    #[error("invalid nonce {supplied} for {signer}, expected {expected}")]
    NonceMismatch {
        signer: Address,
        expected: U256,
        supplied: U256,
    },

    #[error("delegate calls are disallowed through the key manager")]
    DelegateCallDisallowed,
    #[error("static calls cannot transfer value")]
    ValueNotAllowedInStaticCall,

    #[error("call verification by {verifier} failed{}: {reason}", if *post_call { " after execution" } else { "" })]
    CallVerificationFailed {
        verifier: Address,
        post_call: bool,
        reason: String,
        source: Option<Box<KeyManagerError>>,
    },
    #[error("key manager is linked to {expected}, not {actual}")]
    InvalidVerificationTarget { expected: Address, actual: Address },

    #[error("batch parameters have different lengths")]
    BatchParamsLengthMismatch,
    #[error("batch values total {total} but {msg_value} was sent")]
    BatchInsufficientValueSent { total: U256, msg_value: U256 },
    #[error("batch values total {total} but {msg_value} was sent")]
    BatchExcessiveValueSent { total: U256, msg_value: U256 },

    #[error("request cost {required} exceeds limit {limit}")]
    BudgetExceeded { limit: u64, required: u64 },
    #[error("nested call depth {depth} exceeds {max}")]
    CallDepthExceeded { depth: u32, max: u32 },
    #[error("no extension registered for selector 0x{}", hex::encode(.0))]
    NoExtensionForSelector([u8; 4]),
    #[error("call to {target} failed: {reason}")]
    ExecutionFailed { target: Address, reason: String },
}

impl KeyManagerError {
    pub(crate) fn not_authorised(controller: Address, permission: Permission) -> Self {
        Self::NotAuthorised {
            controller,
            permission,
        }
    }

    pub(crate) fn malformed_allow_list(kind: AllowListKind, value: &[u8], reason: DecodeError) -> Self {
        Self::MalformedAllowList {
            kind,
            value: Bytes::copy_from_slice(value),
            reason,
        }
    }

    /// The innermost error, looking through verifier failures that carry one.
    pub fn root_cause(&self) -> &KeyManagerError {
        match self {
            Self::CallVerificationFailed {
                source: Some(inner),
                ..
            } => inner.root_cause(),
            other => other,
        }
    }

    /// ABI-encoded Solidity custom error for this failure.
    pub fn revert_data(&self) -> Bytes {
        use abi::*;

        let encoded = match self {
            Self::MalformedAllowList {
                kind: AllowListKind::Calls,
                value,
                ..
            } => InvalidEncodedAllowedCalls {
                allowedCallsValue: value.clone(),
            }
            .abi_encode(),
            Self::MalformedAllowList {
                kind: AllowListKind::DataKeys,
                value,
                reason,
            } => InvalidEncodedAllowedERC725YDataKeys {
                value: value.clone(),
                context: reason.to_string(),
            }
            .abi_encode(),
            Self::InvalidWhitelistedCall { controller } => {
                InvalidWhitelistedCall { from: *controller }.abi_encode()
            }
            Self::InvalidErc725Function(selector) => InvalidERC725Function {
                invalidFunction: (*selector).into(),
            }
            .abi_encode(),
            Self::NoPermissionsSet { controller } => {
                NoPermissionsSet { from: *controller }.abi_encode()
            }
            Self::NotAuthorised {
                controller,
                permission,
            } => NotAuthorised {
                from: *controller,
                permission: permission.name().into(),
            }
            .abi_encode(),
            Self::NoCallsAllowed { controller } => NoCallsAllowed { from: *controller }.abi_encode(),
            Self::NotAllowedCall {
                controller,
                target,
                selector,
            } => NotAllowedCall {
                from: *controller,
                to: *target,
                selector: (*selector).into(),
            }
            .abi_encode(),
            Self::NotAllowedDataKey { controller, key } => NotAllowedERC725YDataKey {
                from: *controller,
                dataKey: *key,
            }
            .abi_encode(),
            Self::NotRecognisedPermissionKey { key } => {
                NotRecognisedPermissionKey { dataKey: *key }.abi_encode()
            }
            Self::InvalidPermissionArrayValue { key, value } => {
                AddressPermissionArrayIndexValueNotAnAddress {
                    dataKey: *key,
                    invalidValue: value.clone(),
                }
                .abi_encode()
            }
            Self::InvalidSignature { .. } => ECDSAInvalidSignature {}.abi_encode(),
            Self::RelayCallExpired { .. } => RelayCallExpired {}.abi_encode(),
            Self::RelayCallNotYetValid { .. } => RelayCallBeforeStartTime {}.abi_encode(),
            Self::NonceMismatch {
                signer, supplied, ..
            } => InvalidRelayNonce {
                signer: *signer,
                invalidNonce: *supplied,
                signature: Bytes::new(),
            }
            .abi_encode(),
            Self::DelegateCallDisallowed => DelegateCallDisallowedViaKeyManager {}.abi_encode(),
            Self::ValueNotAllowedInStaticCall => {
                ERC725X_MsgValueDisallowedInStaticCall {}.abi_encode()
            }
            // Verifier failures bubble the verifier's own error when there is one.
            Self::CallVerificationFailed {
                source: Some(inner),
                ..
            } => return inner.revert_data(),
            Self::CallVerificationFailed { post_call, .. } => LSP20CallVerificationFailed {
                postCall: *post_call,
                returnedData: Bytes::new(),
            }
            .abi_encode(),
            Self::BatchParamsLengthMismatch => BatchExecuteParamsLengthMismatch {}.abi_encode(),
            Self::BatchInsufficientValueSent { total, msg_value } => {
                LSP6BatchInsufficientValueSent {
                    totalValues: *total,
                    msgValue: *msg_value,
                }
                .abi_encode()
            }
            Self::BatchExcessiveValueSent { total, msg_value } => LSP6BatchExcessiveValueSent {
                totalValues: *total,
                msgValue: *msg_value,
            }
            .abi_encode(),
            Self::NoExtensionForSelector(selector) => LSP17FunctionSelectorNotRecognized {
                functionSelector: (*selector).into(),
            }
            .abi_encode(),
            other => Revert {
                reason: other.to_string(),
            }
            .abi_encode(),
        };
        encoded.into()
    }
}

#[allow(non_camel_case_types, non_snake_case)]
mod abi {
    use alloy_sol_types::sol;

    sol! {
        error NoPermissionsSet(address from);
        error NotAuthorised(address from, string permission);
        error NotAllowedCall(address from, address to, bytes4 selector);
        error NoCallsAllowed(address from);
        error NotAllowedERC725YDataKey(address from, bytes32 dataKey);
        error NotRecognisedPermissionKey(bytes32 dataKey);
        error InvalidEncodedAllowedCalls(bytes allowedCallsValue);
        error InvalidEncodedAllowedERC725YDataKeys(bytes value, string context);
        error InvalidWhitelistedCall(address from);
        error InvalidERC725Function(bytes4 invalidFunction);
        error AddressPermissionArrayIndexValueNotAnAddress(bytes32 dataKey, bytes invalidValue);
        error InvalidRelayNonce(address signer, uint256 invalidNonce, bytes signature);
        error ECDSAInvalidSignature();
        error RelayCallBeforeStartTime();
        error RelayCallExpired();
        error DelegateCallDisallowedViaKeyManager();
        error ERC725X_MsgValueDisallowedInStaticCall();
        error BatchExecuteParamsLengthMismatch();
        error LSP6BatchInsufficientValueSent(uint256 totalValues, uint256 msgValue);
        error LSP6BatchExcessiveValueSent(uint256 totalValues, uint256 msgValue);
        error LSP20CallVerificationFailed(bool postCall, bytes returnedData);
        error LSP17FunctionSelectorNotRecognized(bytes4 functionSelector);
    }
}
