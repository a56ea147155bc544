//! Minimal big-endian parsing helpers.
//!
//! Used when splitting stored data values into their elements.

use alloy_primitives::{Address, U256};

use crate::errors::DecodeError;

pub fn read_slice<'a>(bytes: &'a [u8], i: &mut usize, len: usize) -> Result<&'a [u8], DecodeError> {
    let end = i.checked_add(len).ok_or(DecodeError::Truncated)?;
    if bytes.len() < end {
        return Err(DecodeError::Truncated);
    }
    let out = &bytes[*i..end];
    *i = end;
    Ok(out)
}

pub fn read_u16_be(bytes: &[u8], i: &mut usize) -> Result<u16, DecodeError> {
    let mut buf = [0u8; 2];
    buf.copy_from_slice(read_slice(bytes, i, 2)?);
    Ok(u16::from_be_bytes(buf))
}

pub fn read_array<const N: usize>(bytes: &[u8], i: &mut usize) -> Result<[u8; N], DecodeError> {
    let mut buf = [0u8; N];
    buf.copy_from_slice(read_slice(bytes, i, N)?);
    Ok(buf)
}

pub fn read_address(bytes: &[u8], i: &mut usize) -> Result<Address, DecodeError> {
    Ok(Address::from_slice(read_slice(bytes, i, 20)?))
}

/// Interpret a stored value of at most 32 bytes as a big-endian integer. Empty reads as zero.
pub fn be_value_to_u256(value: &[u8]) -> Option<U256> {
    U256::try_from_be_slice(value)
}

/// First four bytes of a payload, zero padded when shorter.
pub fn selector_of(data: &[u8]) -> [u8; 4] {
    let mut out = [0u8; 4];
    let n = data.len().min(4);
    out[..n].copy_from_slice(&data[..n]);
    out
}
