//! Two-phase call verification between a controlled account and its verifier.
//!
//! Purpose: let an account delegate "may this caller do this?" to the program that owns it.
//! Notes:
//! - The account sends the operation descriptor before the effect and the raw result after it.
//! - Anything other than an approval, including a verifier error, aborts the request with
//!   `CallVerificationFailed`; the account discards the effect.
//! - `ApprovedWithData` carries opaque data from the pre-call to the post-call.

use alloy_primitives::{keccak256, Address, Bytes, FixedBytes, B256, U256};
use alloy_sol_types::{SolCall, SolValue};
use tracing::{debug, warn};

use crate::{
    context::RequestContext,
    errors::{KeyManagerError, Result},
    lsp20::{
        constants::{post_call_magic, post_call_required},
        interfaces::ILSP20,
    },
    operation::Operation,
    store::AccountView,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationResult {
    Approved,
    ApprovedWithData(Bytes),
    Rejected(String),
}

impl VerificationResult {
    pub fn is_approved(&self) -> bool {
        !matches!(self, VerificationResult::Rejected(_))
    }

    pub fn data(&self) -> Option<&Bytes> {
        match self {
            VerificationResult::ApprovedWithData(data) => Some(data),
            _ => None,
        }
    }
}

/// What the account asks its verifier about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallDescriptor {
    pub account: Address,
    pub caller: Address,
    pub value: U256,
    pub calldata: Bytes,
    pub operation: Operation,
    pub depth: u32,
}

impl CallDescriptor {
    /// `keccak256(abi.encode(account, caller, value, calldata))`.
    pub fn call_hash(&self) -> B256 {
        keccak256((self.account, self.caller, self.value, self.calldata.clone()).abi_encode_params())
    }
}

pub trait CallVerifier {
    fn address(&self) -> Address;

    fn verify_pre_call(
        &mut self,
        account: &AccountView<'_>,
        ctx: &mut RequestContext,
        call: &CallDescriptor,
    ) -> Result<VerificationResult>;

    fn verify_post_call(
        &mut self,
        _account: &AccountView<'_>,
        _ctx: &mut RequestContext,
        _call: &CallDescriptor,
        _pre: &VerificationResult,
        _result: &[u8],
    ) -> Result<VerificationResult> {
        Ok(VerificationResult::Approved)
    }
}

/// Run the pre-call phase, turning rejections into `CallVerificationFailed`.
pub fn pre_call(
    verifier: &mut (dyn CallVerifier + '_),
    account: &AccountView<'_>,
    ctx: &mut RequestContext,
    call: &CallDescriptor,
) -> Result<VerificationResult> {
    let address = verifier.address();
    settle(address, false, verifier.verify_pre_call(account, ctx, call))
}

/// Run the post-call phase, turning rejections into `CallVerificationFailed`.
pub fn post_call(
    verifier: &mut (dyn CallVerifier + '_),
    account: &AccountView<'_>,
    ctx: &mut RequestContext,
    call: &CallDescriptor,
    pre: &VerificationResult,
    result: &[u8],
) -> Result<VerificationResult> {
    let address = verifier.address();
    settle(address, true, verifier.verify_post_call(account, ctx, call, pre, result))
}

fn settle(verifier: Address, post_call: bool, outcome: Result<VerificationResult>) -> Result<VerificationResult> {
    match outcome {
        Ok(VerificationResult::Rejected(reason)) => {
            warn!(%verifier, post_call, %reason, "call verification rejected");
            Err(KeyManagerError::CallVerificationFailed {
                verifier,
                post_call,
                reason,
                source: None,
            })
        },
        Ok(approved) => Ok(approved),
        Err(err) => {
            warn!(%verifier, post_call, error = %err, "call verification failed");
            Err(KeyManagerError::CallVerificationFailed {
                verifier,
                post_call,
                reason: err.to_string(),
                source: Some(Box::new(err)),
            })
        },
    }
}

/// Delivers LSP20 calldata to a verifier program and returns its raw response.
pub trait VerifierTransport {
    fn call(&mut self, verifier: Address, calldata: &[u8]) -> core::result::Result<Bytes, String>;
}

impl<F> VerifierTransport for F
where
    F: FnMut(Address, &[u8]) -> core::result::Result<Bytes, String>,
{
    fn call(&mut self, verifier: Address, calldata: &[u8]) -> core::result::Result<Bytes, String> {
        self(verifier, calldata)
    }
}

/// Verifier program reached over the LSP20 wire format.
pub struct RemoteVerifier<T> {
    address: Address,
    transport: T,
}

impl<T: VerifierTransport> RemoteVerifier<T> {
    pub fn new(address: Address, transport: T) -> Self {
        Self { address, transport }
    }

    pub fn into_transport(self) -> T {
        self.transport
    }
}

impl<T: VerifierTransport> CallVerifier for RemoteVerifier<T> {
    fn address(&self) -> Address {
        self.address
    }

    fn verify_pre_call(
        &mut self,
        _account: &AccountView<'_>,
        _ctx: &mut RequestContext,
        call: &CallDescriptor,
    ) -> Result<VerificationResult> {
        let calldata = ILSP20::lsp20VerifyCallCall {
            requestor: call.caller,
            target: call.account,
            caller: call.caller,
            value: call.value,
            callData: call.calldata.clone(),
        }
        .abi_encode();
        let response = match self.transport.call(self.address, &calldata) {
            Ok(response) => response,
            Err(reason) => return Ok(VerificationResult::Rejected(format!("verifier reverted: {reason}"))),
        };
        let Some(magic) = decode_magic(&response) else {
            return Ok(VerificationResult::Rejected("malformed verifier response".into()));
        };
        match post_call_required(magic) {
            Some(true) => Ok(VerificationResult::ApprovedWithData(Bytes::copy_from_slice(&magic))),
            Some(false) => Ok(VerificationResult::Approved),
            None => Ok(VerificationResult::Rejected(format!(
                "invalid magic value 0x{}",
                hex::encode(magic)
            ))),
        }
    }

    fn verify_post_call(
        &mut self,
        _account: &AccountView<'_>,
        _ctx: &mut RequestContext,
        call: &CallDescriptor,
        pre: &VerificationResult,
        result: &[u8],
    ) -> Result<VerificationResult> {
        if pre.data().is_none() {
            return Ok(VerificationResult::Approved);
        }
        let calldata = ILSP20::lsp20VerifyCallResultCall {
            callHash: call.call_hash(),
            callResult: Bytes::copy_from_slice(result),
        }
        .abi_encode();
        let response = match self.transport.call(self.address, &calldata) {
            Ok(response) => response,
            Err(reason) => return Ok(VerificationResult::Rejected(format!("verifier reverted: {reason}"))),
        };
        match decode_magic(&response) {
            Some(magic) if magic == post_call_magic() => {
                debug!(verifier = %self.address, "post-call approved");
                Ok(VerificationResult::Approved)
            },
            _ => Ok(VerificationResult::Rejected("invalid post-call response".into())),
        }
    }
}

/// The `bytes4` a verifier function returned, if the response is well formed.
fn decode_magic(response: &[u8]) -> Option<[u8; 4]> {
    FixedBytes::<4>::abi_decode(response, true).ok().map(|magic| magic.0)
}
