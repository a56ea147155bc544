//! Shared utilities for the key manager.

pub mod bytes;
pub mod crypto;
