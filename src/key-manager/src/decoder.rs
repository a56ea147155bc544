//! Decoding of allow-list data values.
//!
//! Both lists are stored as LSP2 compact bytes arrays: every element is a 2-byte big-endian
//! length followed by that many bytes. Decoding happens once per request, at the point the
//! authorizer needs the list, into fixed-size entries.

use alloy_primitives::{Address, B256};
use key_manager_types::CallTypes;

use crate::{
    errors::DecodeError,
    utils::bytes::{read_address, read_array, read_slice, read_u16_be},
};

/// Encoded size of one allowed call entry.
pub const ALLOWED_CALL_LEN: usize = 32;
pub const WILDCARD_ADDRESS: Address = Address::new([0xff; 20]);
pub const WILDCARD_BYTES4: [u8; 4] = [0xff; 4];

/// `callTypes(4) || address(20) || interfaceId(4) || selector(4)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllowedCall {
    pub call_types: CallTypes,
    pub target: Address,
    pub standard: [u8; 4],
    pub selector: [u8; 4],
}

impl AllowedCall {
    pub fn decode(element: &[u8]) -> Result<Self, DecodeError> {
        if element.len() != ALLOWED_CALL_LEN {
            return Err(DecodeError::InvalidElementLength(element.len()));
        }
        let mut i = 0usize;
        let call_types = CallTypes::from_be_bytes(read_array(element, &mut i)?);
        let target = read_address(element, &mut i)?;
        let standard = read_array(element, &mut i)?;
        let selector = read_array(element, &mut i)?;
        Ok(Self {
            call_types,
            target,
            standard,
            selector,
        })
    }

    pub fn encode(&self) -> [u8; ALLOWED_CALL_LEN] {
        let mut out = [0u8; ALLOWED_CALL_LEN];
        out[..4].copy_from_slice(&self.call_types.to_be_bytes());
        out[4..24].copy_from_slice(self.target.as_slice());
        out[24..28].copy_from_slice(&self.standard);
        out[28..].copy_from_slice(&self.selector);
        out
    }

    pub fn any_target(&self) -> bool {
        self.target == WILDCARD_ADDRESS
    }

    pub fn any_standard(&self) -> bool {
        self.standard == WILDCARD_BYTES4
    }

    pub fn any_selector(&self) -> bool {
        self.selector == WILDCARD_BYTES4
    }

    /// Address, standard and selector all wildcarded. Such an entry is rejected rather than
    /// treated as a grant.
    pub fn is_unrestricted(&self) -> bool {
        self.any_target() && self.any_standard() && self.any_selector()
    }
}

/// A data key prefix of 1 to 32 bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllowedDataKey {
    bytes: [u8; 32],
    len: u8,
}

impl AllowedDataKey {
    pub fn new(prefix: &[u8]) -> Result<Self, DecodeError> {
        if prefix.is_empty() || prefix.len() > 32 {
            return Err(DecodeError::InvalidElementLength(prefix.len()));
        }
        let mut bytes = [0u8; 32];
        bytes[..prefix.len()].copy_from_slice(prefix);
        Ok(Self {
            bytes,
            len: prefix.len() as u8,
        })
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// A full 32-byte entry matches exactly; shorter entries match any key they prefix.
    pub fn matches(&self, key: &B256) -> bool {
        key.as_slice().starts_with(self.as_slice())
    }
}

/// Split an LSP2 compact bytes array into its elements.
pub fn decode_compact_bytes_array(bytes: &[u8]) -> Result<Vec<&[u8]>, DecodeError> {
    let mut elements = Vec::new();
    let mut i = 0usize;
    while i < bytes.len() {
        let len = read_u16_be(bytes, &mut i)? as usize;
        if len == 0 {
            return Err(DecodeError::ZeroLengthElement);
        }
        elements.push(read_slice(bytes, &mut i, len)?);
    }
    Ok(elements)
}

pub fn decode_allowed_calls(bytes: &[u8]) -> Result<Vec<AllowedCall>, DecodeError> {
    decode_compact_bytes_array(bytes)?
        .into_iter()
        .map(AllowedCall::decode)
        .collect()
}

pub fn decode_allowed_data_keys(bytes: &[u8]) -> Result<Vec<AllowedDataKey>, DecodeError> {
    decode_compact_bytes_array(bytes)?
        .into_iter()
        .map(AllowedDataKey::new)
        .collect()
}
