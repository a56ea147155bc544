//! Per-signer, per-channel relay call nonces.
//!
//! A nonce is `channel (high 128 bits) || sequence (low 128 bits)`. Channels are independent:
//! consuming on one never affects another, so a signer can keep several streams of relay calls
//! in flight without ordering them against each other.

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};
use key_manager_types::{pack_nonce, unpack_nonce};
use tracing::debug;

use crate::{
    errors::{KeyManagerError, Result},
    store::Journaled,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NonceChannelManager {
    sequences: BTreeMap<(Address, u128), u128>,
    /// Sequence each consumed channel had before, for rollback.
    journal: Vec<((Address, u128), u128)>,
}

impl NonceChannelManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next sequence expected on `channel`. Untouched channels start at zero.
    pub fn current_sequence(&self, signer: Address, channel: u128) -> u128 {
        self.sequences.get(&(signer, channel)).copied().unwrap_or(0)
    }

    /// Packed nonce a signer must use next on `channel`.
    pub fn get_nonce(&self, signer: Address, channel: u128) -> U256 {
        pack_nonce(channel, self.current_sequence(signer, channel))
    }

    pub fn is_valid(&self, signer: Address, nonce: U256) -> bool {
        let (channel, sequence) = unpack_nonce(nonce);
        self.current_sequence(signer, channel) == sequence
    }

    /// Consume `nonce` for `signer`, advancing its channel by one.
    pub fn consume(&mut self, signer: Address, nonce: U256) -> Result<()> {
        let (channel, sequence) = unpack_nonce(nonce);
        let current = self.current_sequence(signer, channel);
        let mismatch = || KeyManagerError::NonceMismatch {
            signer,
            expected: pack_nonce(channel, current),
            supplied: nonce,
        };
        if current != sequence {
            return Err(mismatch());
        }
        let next = current.checked_add(1).ok_or_else(mismatch)?;
        self.sequences.insert((signer, channel), next);
        self.journal.push(((signer, channel), current));
        debug!(%signer, channel, sequence = next, "nonce consumed");
        Ok(())
    }
}

impl Journaled for NonceChannelManager {
    type Checkpoint = usize;

    fn checkpoint(&self) -> Self::Checkpoint {
        self.journal.len()
    }

    fn rollback(&mut self, checkpoint: Self::Checkpoint) {
        while self.journal.len() > checkpoint {
            let Some((slot, previous)) = self.journal.pop() else {
                break;
            };
            self.sequences.insert(slot, previous);
        }
    }

    fn commit(&mut self, checkpoint: Self::Checkpoint) {
        self.journal.truncate(checkpoint);
    }
}
