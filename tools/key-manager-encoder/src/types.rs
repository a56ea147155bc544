use alloy_primitives::{Address, B256};
use key_manager_types::{keys, CallTypes, Permissions};

use crate::encoder::{encode_allowed_calls, encode_allowed_data_keys, encode_array_length, encode_permissions};

/// All-ones wildcard for the address field.
pub const ANY_ADDRESS: Address = Address::new([0xff; 20]);
/// All-ones wildcard for the standard and selector fields.
pub const ANY_BYTES4: [u8; 4] = [0xff; 4];

/// One allowed call as written to `AddressPermissions:AllowedCalls:<controller>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllowedCallEntry {
    pub call_types: CallTypes,
    pub target: Address,
    /// ERC165 interface id the target must support.
    pub standard: [u8; 4],
    pub selector: [u8; 4],
}

impl AllowedCallEntry {
    /// Any standard; a specific target and selector.
    pub fn call(call_types: CallTypes, target: Address, selector: [u8; 4]) -> Self {
        Self {
            call_types,
            target,
            standard: ANY_BYTES4,
            selector,
        }
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[..4].copy_from_slice(&self.call_types.to_be_bytes());
        out[4..24].copy_from_slice(self.target.as_slice());
        out[24..28].copy_from_slice(&self.standard);
        out[28..].copy_from_slice(&self.selector);
        out
    }
}

/// Everything needed to register a controller on an account.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ControllerGrant {
    pub controller: Address,
    pub permissions: Permissions,
    pub allowed_calls: Vec<AllowedCallEntry>,
    /// Data key prefixes, 1 to 32 bytes each.
    pub allowed_data_keys: Vec<Vec<u8>>,
}

impl ControllerGrant {
    pub fn new(controller: Address, permissions: Permissions) -> Self {
        Self {
            controller,
            permissions,
            ..Self::default()
        }
    }

    pub fn with_allowed_calls(mut self, entries: impl IntoIterator<Item = AllowedCallEntry>) -> Self {
        self.allowed_calls.extend(entries);
        self
    }

    pub fn with_allowed_data_keys<'a>(mut self, prefixes: impl IntoIterator<Item = &'a [u8]>) -> Self {
        self.allowed_data_keys.extend(prefixes.into_iter().map(<[u8]>::to_vec));
        self
    }

    /// Key/value pairs registering the controller at `index` of `AddressPermissions[]`, including
    /// the new array length `index + 1`.
    pub fn data_entries(&self, index: u128) -> Vec<(B256, Vec<u8>)> {
        let mut entries = vec![
            (keys::ADDRESS_PERMISSIONS_ARRAY, encode_array_length(index + 1).to_vec()),
            (keys::permissions_array_index_key(index), self.controller.to_vec()),
            (keys::permissions_key(self.controller), encode_permissions(self.permissions).to_vec()),
        ];
        if !self.allowed_calls.is_empty() {
            entries.push((keys::allowed_calls_key(self.controller), encode_allowed_calls(&self.allowed_calls)));
        }
        if !self.allowed_data_keys.is_empty() {
            let prefixes: Vec<&[u8]> = self.allowed_data_keys.iter().map(Vec::as_slice).collect();
            entries.push((
                keys::allowed_data_keys_key(self.controller),
                encode_allowed_data_keys(&prefixes),
            ));
        }
        entries
    }
}
