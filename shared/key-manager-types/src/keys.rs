//! Well-known ERC725Y data keys read and classified by the key manager.
//!
//! Mapping keys are `bytes10 prefix || bytes2(0) || bytes20 address`.

use alloy_primitives::{b256, fixed_bytes, Address, FixedBytes, B256};

/// `keccak256('AddressPermissions[]')`: length of the controllers array.
pub const ADDRESS_PERMISSIONS_ARRAY: B256 =
    b256!("df30dba06db6a30e65354d9a64c609861f089545ca58c6b4dbe31a5f338cb0e3");

/// First 16 bytes of [`ADDRESS_PERMISSIONS_ARRAY`]; index keys append a `uint128` index.
pub const ADDRESS_PERMISSIONS_ARRAY_PREFIX: FixedBytes<16> =
    fixed_bytes!("df30dba06db6a30e65354d9a64c60986");

/// Any key beginning with these 6 bytes belongs to the `AddressPermissions` namespace.
pub const ADDRESS_PERMISSIONS_PREFIX: FixedBytes<6> = fixed_bytes!("4b80742de2bf");

pub const PERMISSIONS_PREFIX: FixedBytes<12> = fixed_bytes!("4b80742de2bf82acb3630000");
pub const ALLOWED_DATA_KEYS_PREFIX: FixedBytes<12> = fixed_bytes!("4b80742de2bf866c29110000");
pub const ALLOWED_CALLS_PREFIX: FixedBytes<12> = fixed_bytes!("4b80742de2bf393a64c70000");

/// `LSP17Extension:<bytes4 selector>`; value is the 20-byte handler address.
pub const EXTENSION_PREFIX: FixedBytes<12> = fixed_bytes!("cee78b4094da860110960000");

pub const UNIVERSAL_RECEIVER_DELEGATE: B256 =
    b256!("0cfc51aec37c55a4d0b1a65c6255c4bf2fbdf6277f3cc0730c45b828b6db8b47");
pub const UNIVERSAL_RECEIVER_DELEGATE_PREFIX: FixedBytes<12> =
    fixed_bytes!("0cfc51aec37c55a4d0b10000");

pub fn permissions_key(controller: Address) -> B256 {
    mapping_key(PERMISSIONS_PREFIX, controller)
}

pub fn allowed_calls_key(controller: Address) -> B256 {
    mapping_key(ALLOWED_CALLS_PREFIX, controller)
}

pub fn allowed_data_keys_key(controller: Address) -> B256 {
    mapping_key(ALLOWED_DATA_KEYS_PREFIX, controller)
}

/// `AddressPermissions[index]`.
pub fn permissions_array_index_key(index: u128) -> B256 {
    let mut buf = [0u8; 32];
    buf[..16].copy_from_slice(ADDRESS_PERMISSIONS_ARRAY_PREFIX.as_slice());
    buf[16..].copy_from_slice(&index.to_be_bytes());
    B256::from(buf)
}

pub fn extension_key(selector: [u8; 4]) -> B256 {
    let mut buf = [0u8; 32];
    buf[..12].copy_from_slice(EXTENSION_PREFIX.as_slice());
    buf[12..16].copy_from_slice(&selector);
    B256::from(buf)
}

pub fn mapping_key(prefix: FixedBytes<12>, address: Address) -> B256 {
    let mut buf = [0u8; 32];
    buf[..12].copy_from_slice(prefix.as_slice());
    buf[12..].copy_from_slice(address.as_slice());
    B256::from(buf)
}

/// The address in the low 20 bytes of a mapping key.
pub fn mapped_address(key: &B256) -> Address {
    Address::from_slice(&key[12..])
}

pub fn has_prefix<const N: usize>(key: &B256, prefix: &FixedBytes<N>) -> bool {
    key.as_slice().starts_with(prefix.as_slice())
}
