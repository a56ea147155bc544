//! LSP20 call verification wire format.
//!
//! Accounts whose owner is a program ask that program to approve calls by sending it
//! `lsp20VerifyCall` before the effect and `lsp20VerifyCallResult` after it. This module keeps the
//! ABI expectations and magic values in one place.

pub mod constants;
pub mod interfaces;

pub use constants::{post_call_required, pre_call_magic, ERC1271_FAILURE, ERC1271_SUCCESS};
