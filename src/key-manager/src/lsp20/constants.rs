//! Magic values of the LSP20 and ERC1271 protocols.

use alloy_sol_types::SolCall;

use super::interfaces::ILSP20;

/// `isValidSignature` return value on success.
pub const ERC1271_SUCCESS: [u8; 4] = [0x16, 0x26, 0xba, 0x7e];
pub const ERC1271_FAILURE: [u8; 4] = [0xff; 4];

/// Value a verifier returns from `lsp20VerifyCall`: the first three bytes of the selector, then
/// `0x01` when it wants to be called again after execution.
pub fn pre_call_magic(post_call: bool) -> [u8; 4] {
    let selector = ILSP20::lsp20VerifyCallCall::SELECTOR;
    [selector[0], selector[1], selector[2], u8::from(post_call)]
}

/// `Some(post_call)` when `magic` is an approval, `None` otherwise. Only a last byte of `0x01`
/// asks for the post-call.
pub fn post_call_required(magic: [u8; 4]) -> Option<bool> {
    let selector = ILSP20::lsp20VerifyCallCall::SELECTOR;
    if magic[..3] != selector[..3] {
        return None;
    }
    Some(magic[3] == 0x01)
}

/// Value a verifier returns from `lsp20VerifyCallResult` on success.
pub fn post_call_magic() -> [u8; 4] {
    ILSP20::lsp20VerifyCallResultCall::SELECTOR
}
