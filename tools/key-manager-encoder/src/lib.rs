//! Off-chain helpers for key manager controllers: allow-list and permission encoding, account
//! calldata builders and relay call signing.

pub mod encoder;
pub mod types;

#[cfg(test)]
mod tests;

pub use encoder::{
    encode_allowed_calls, encode_allowed_data_keys, encode_array_length, encode_compact_bytes_array,
    encode_permissions, execute_batch_calldata, execute_calldata, relay_call_digest, set_data_batch_calldata,
    set_data_calldata, sign_digest, sign_relay_call, signer_address, transfer_ownership_calldata,
};
pub use types::{AllowedCallEntry, ControllerGrant};
