//! Relay-call (LSP25) envelope and its canonical signed message.

use alloc::vec::Vec;

use alloy_primitives::{keccak256, Address, B256, U256};

/// Protocol version bound into every relay-call signature.
pub const LSP25_VERSION: u64 = 25;

/// A relayed call as submitted by a third party on the signer's behalf.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayCallEnvelope {
    pub version: u64,
    pub chain_id: u64,
    /// `channelId (high 128 bits) || sequence (low 128 bits)`.
    pub nonce: U256,
    /// `start (high 128 bits) || end (low 128 bits)`; zero means always valid.
    pub validity: U256,
    /// Native value forwarded with the payload.
    pub value: U256,
    pub payload: Vec<u8>,
    /// `r || s || v`.
    pub signature: Vec<u8>,
}

impl RelayCallEnvelope {
    pub fn channel(&self) -> u128 {
        unpack_nonce(self.nonce).0
    }

    pub fn sequence(&self) -> u128 {
        unpack_nonce(self.nonce).1
    }

    pub fn validity_window(&self) -> ValidityWindow {
        ValidityWindow::from_packed(self.validity)
    }

    /// `abi.encodePacked(uint256 version, uint256 chainId, uint256 nonce, uint256 validity,
    /// uint256 value, bytes payload)`.
    pub fn message(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(32 * 5 + self.payload.len());
        buf.extend_from_slice(&U256::from(self.version).to_be_bytes::<32>());
        buf.extend_from_slice(&U256::from(self.chain_id).to_be_bytes::<32>());
        buf.extend_from_slice(&self.nonce.to_be_bytes::<32>());
        buf.extend_from_slice(&self.validity.to_be_bytes::<32>());
        buf.extend_from_slice(&self.value.to_be_bytes::<32>());
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// EIP-191 version 0 digest: `keccak256(0x19 || 0x00 || verifier || message)`.
    pub fn digest(&self, verifier: Address) -> B256 {
        let message = self.message();
        let mut buf = Vec::with_capacity(2 + 20 + message.len());
        buf.extend_from_slice(&[0x19, 0x00]);
        buf.extend_from_slice(verifier.as_slice());
        buf.extend_from_slice(&message);
        keccak256(buf)
    }
}

/// Packed `(start, end)` validity window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValidityWindow {
    pub start: u128,
    pub end: u128,
}

impl ValidityWindow {
    pub const ALWAYS: ValidityWindow = ValidityWindow { start: 0, end: 0 };

    pub fn from_packed(packed: U256) -> Self {
        let (start, end) = split_u256(packed);
        Self { start, end }
    }

    pub fn to_packed(self) -> U256 {
        join_u256(self.start, self.end)
    }

    pub fn is_always_valid(self) -> bool {
        self.start == 0 && self.end == 0
    }
}

pub fn pack_nonce(channel: u128, sequence: u128) -> U256 {
    join_u256(channel, sequence)
}

/// `(channel, sequence)`.
pub fn unpack_nonce(nonce: U256) -> (u128, u128) {
    split_u256(nonce)
}

fn split_u256(word: U256) -> (u128, u128) {
    let limbs = word.as_limbs();
    let low = (limbs[0] as u128) | ((limbs[1] as u128) << 64);
    let high = (limbs[2] as u128) | ((limbs[3] as u128) << 64);
    (high, low)
}

fn join_u256(high: u128, low: u128) -> U256 {
    U256::from_limbs([
        low as u64,
        (low >> 64) as u64,
        high as u64,
        (high >> 64) as u64,
    ])
}
