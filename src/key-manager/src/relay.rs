//! Relay call (LSP25) signature verification.
//!
//! Purpose: decide who signed a relayed payload and whether the signature is still usable.
//! Notes:
//! - The validity window is checked before any signature work.
//! - The digest binds the verifier address and this deployment's chain id, so signatures do not
//!   carry over to another key manager or chain.
//! - A recovered address that is not a permitted signer is reported as an invalid signature.

use alloy_primitives::{Address, B256, U256};
use key_manager_types::{RelayCallEnvelope, ValidityWindow, LSP25_VERSION};
use tracing::{trace, warn};

use crate::{
    context::{cost, CostMeter},
    errors::{KeyManagerError, Result},
    utils::crypto::ecrecover_address,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelaySignatureVerifier {
    verifier: Address,
    chain_id: u64,
}

impl RelaySignatureVerifier {
    pub fn new(verifier: Address, chain_id: u64) -> Self {
        Self { verifier, chain_id }
    }

    /// Envelope for a payload submitted to this verifier.
    pub fn envelope(
        &self,
        nonce: U256,
        validity: U256,
        value: U256,
        payload: &[u8],
        signature: &[u8],
    ) -> RelayCallEnvelope {
        RelayCallEnvelope {
            version: LSP25_VERSION,
            chain_id: self.chain_id,
            nonce,
            validity,
            value,
            payload: payload.to_vec(),
            signature: signature.to_vec(),
        }
    }

    pub fn check_validity(&self, window: ValidityWindow, now: u64) -> Result<()> {
        if window.is_always_valid() {
            return Ok(());
        }
        let now_wide = u128::from(now);
        if now_wide < window.start {
            return Err(KeyManagerError::RelayCallNotYetValid {
                start: window.start,
                now,
            });
        }
        if window.end != 0 && now_wide > window.end {
            return Err(KeyManagerError::RelayCallExpired { end: window.end, now });
        }
        Ok(())
    }

    pub fn digest(&self, envelope: &RelayCallEnvelope) -> B256 {
        envelope.digest(self.verifier)
    }

    /// Recover the envelope's signer and check it with `is_permitted`.
    pub fn verify(
        &self,
        envelope: &RelayCallEnvelope,
        now: u64,
        meter: &mut CostMeter,
        is_permitted: impl FnOnce(Address, &mut CostMeter) -> Result<bool>,
    ) -> Result<Address> {
        self.check_validity(envelope.validity_window(), now)?;

        if envelope.version != LSP25_VERSION || envelope.chain_id != self.chain_id {
            warn!(version = envelope.version, chain_id = envelope.chain_id, "relay call for another domain");
            return Err(KeyManagerError::InvalidSignature { recovered: None });
        }

        meter.charge(cost::SIGNATURE_RECOVERY)?;
        let digest = self.digest(envelope);
        let signer = ecrecover_address(digest, &envelope.signature)
            .map_err(|_| KeyManagerError::InvalidSignature { recovered: None })?;
        trace!(%signer, %digest, "relay call signer recovered");

        if !is_permitted(signer, meter)? {
            warn!(%signer, "relay call signed by a non-controller");
            return Err(KeyManagerError::InvalidSignature {
                recovered: Some(signer),
            });
        }
        Ok(signer)
    }
}
