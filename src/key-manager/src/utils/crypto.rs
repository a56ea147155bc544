//! Cryptographic helpers.
//!
//! Purpose: recover the address that produced a relay call or ERC1271 signature.

use alloy_primitives::{keccak256, Address, B256};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

/// Recover an EOA address from a 32-byte digest and a 65-byte `r || s || v` signature.
///
/// Notes:
/// - We accept v in {0,1,27,28}; anything else is rejected.
/// - High-s signatures are rejected, matching the EVM's malleability rules for ECDSA helpers.
pub fn ecrecover_address(digest: B256, sig: &[u8]) -> Result<Address, ()> {
    if sig.len() != 65 {
        return Err(());
    }
    let signature = Signature::from_slice(&sig[..64]).map_err(|_| ())?;
    if signature.normalize_s().is_some() {
        return Err(());
    }

    let v_raw = sig[64];
    let mut candidates: Vec<u8> = Vec::new();
    match v_raw {
        27 | 28 => candidates.push(v_raw - 27),
        0 | 1 => candidates.push(v_raw),
        _ => {}
    }

    for v in candidates {
        let Some(recovery_id) = RecoveryId::from_byte(v) else {
            continue;
        };
        if let Ok(key) = VerifyingKey::recover_from_prehash(digest.as_slice(), &signature, recovery_id) {
            return Ok(public_key_to_address(&key));
        }
    }

    Err(())
}

/// Ethereum address of a secp256k1 public key.
pub fn public_key_to_address(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}
