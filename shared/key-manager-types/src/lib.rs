//! Shared types for the key manager: the permission bit table, allowed-call type bits,
//! well-known ERC725Y data keys and the relay-call (LSP25) envelope.
//!
//! This crate is `no_std` so the same definitions can be used by the engine and by off-chain
//! encoders without pulling in the engine's dependencies.

#![no_std]

extern crate alloc;

pub mod call_types;
pub mod envelope;
pub mod keys;
pub mod permissions;

pub use call_types::{CallTypes, OperationType};
pub use envelope::{pack_nonce, unpack_nonce, RelayCallEnvelope, ValidityWindow, LSP25_VERSION};
pub use permissions::{Permission, Permissions, ALL_PERMISSIONS, PERMISSION_TABLE_VERSION};
