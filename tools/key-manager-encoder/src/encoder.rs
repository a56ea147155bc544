use alloy_primitives::{Address, FixedBytes, B256, U256};
use alloy_sol_types::{sol, SolCall};
use k256::ecdsa::SigningKey;
use key_manager_types::{OperationType, Permissions, RelayCallEnvelope};
use sha3::{Digest, Keccak256};

use crate::types::AllowedCallEntry;

sol! {
    interface IERC725 {
        function setData(bytes32 dataKey, bytes dataValue) external payable;
        function setDataBatch(bytes32[] dataKeys, bytes[] dataValues) external payable;
        function execute(uint256 operationType, address target, uint256 value, bytes data)
            external
            payable
            returns (bytes);
        function executeBatch(uint256[] operationsType, address[] targets, uint256[] values, bytes[] datas)
            external
            payable
            returns (bytes[]);
        function transferOwnership(address newOwner) external;
    }
}

/// Encode elements as an LSP2 compact bytes array (`u16` length prefix per element).
///
/// Elements must be shorter than 65536 bytes.
pub fn encode_compact_bytes_array(elements: &[&[u8]]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(elements.iter().map(|e| e.len() + 2).sum());
    for element in elements {
        buf.extend_from_slice(&(element.len() as u16).to_be_bytes());
        buf.extend_from_slice(element);
    }
    buf
}

pub fn encode_allowed_calls(entries: &[AllowedCallEntry]) -> Vec<u8> {
    let encoded: Vec<[u8; 32]> = entries.iter().map(AllowedCallEntry::to_bytes).collect();
    let elements: Vec<&[u8]> = encoded.iter().map(|e| e.as_slice()).collect();
    encode_compact_bytes_array(&elements)
}

pub fn encode_allowed_data_keys(prefixes: &[&[u8]]) -> Vec<u8> {
    encode_compact_bytes_array(prefixes)
}

pub fn encode_permissions(permissions: Permissions) -> [u8; 32] {
    permissions.to_word()
}

/// `AddressPermissions[]` length value (`uint128`).
pub fn encode_array_length(len: u128) -> [u8; 16] {
    len.to_be_bytes()
}

pub fn set_data_calldata(key: B256, value: &[u8]) -> Vec<u8> {
    IERC725::setDataCall {
        dataKey: key,
        dataValue: value.to_vec().into(),
    }
    .abi_encode()
}

pub fn set_data_batch_calldata(entries: &[(B256, Vec<u8>)]) -> Vec<u8> {
    IERC725::setDataBatchCall {
        dataKeys: entries.iter().map(|(key, _)| *key).collect(),
        dataValues: entries.iter().map(|(_, value)| value.clone().into()).collect(),
    }
    .abi_encode()
}

pub fn execute_calldata(operation: OperationType, target: Address, value: U256, data: &[u8]) -> Vec<u8> {
    IERC725::executeCall {
        operationType: U256::from(operation as u8),
        target,
        value,
        data: data.to_vec().into(),
    }
    .abi_encode()
}

pub fn execute_batch_calldata(calls: &[(OperationType, Address, U256, Vec<u8>)]) -> Vec<u8> {
    IERC725::executeBatchCall {
        operationsType: calls.iter().map(|(op, ..)| U256::from(*op as u8)).collect(),
        targets: calls.iter().map(|(_, target, ..)| *target).collect(),
        values: calls.iter().map(|(_, _, value, _)| *value).collect(),
        datas: calls.iter().map(|(.., data)| data.clone().into()).collect(),
    }
    .abi_encode()
}

pub fn transfer_ownership_calldata(new_owner: Address) -> Vec<u8> {
    IERC725::transferOwnershipCall { newOwner: new_owner }.abi_encode()
}

fn keccak256_bytes(bytes: &[u8]) -> FixedBytes<32> {
    let mut h = Keccak256::new();
    h.update(bytes);
    let out = h.finalize();
    let mut b = [0u8; 32];
    b.copy_from_slice(out.as_slice());
    FixedBytes(b)
}

/// EIP-191 v0 digest of a relay call for `verifier` (must match the key manager's digest).
pub fn relay_call_digest(envelope: &RelayCallEnvelope, verifier: Address) -> FixedBytes<32> {
    let mut buf = Vec::with_capacity(2 + 20 + 32 * 5 + envelope.payload.len());
    buf.extend_from_slice(&[0x19, 0x00]);
    buf.extend_from_slice(verifier.as_slice());
    buf.extend_from_slice(&U256::from(envelope.version).to_be_bytes::<32>());
    buf.extend_from_slice(&U256::from(envelope.chain_id).to_be_bytes::<32>());
    buf.extend_from_slice(&envelope.nonce.to_be_bytes::<32>());
    buf.extend_from_slice(&envelope.validity.to_be_bytes::<32>());
    buf.extend_from_slice(&envelope.value.to_be_bytes::<32>());
    buf.extend_from_slice(&envelope.payload);
    keccak256_bytes(&buf)
}

/// Sign a prehashed digest, returning `r || s || v` with v in {27, 28}.
pub fn sign_digest(digest: FixedBytes<32>, signing_key: &SigningKey) -> Result<[u8; 65], k256::ecdsa::Error> {
    let (signature, recovery_id) = signing_key.sign_prehash_recoverable(digest.as_slice())?;
    let mut out = [0u8; 65];
    out[..64].copy_from_slice(&signature.to_bytes());
    out[64] = 27 + recovery_id.to_byte();
    Ok(out)
}

/// Sign the relay call digest and write the 65-byte signature into `envelope.signature`.
pub fn sign_relay_call(
    envelope: &mut RelayCallEnvelope,
    verifier: Address,
    signing_key: &SigningKey,
) -> Result<(), k256::ecdsa::Error> {
    let digest = relay_call_digest(envelope, verifier);
    envelope.signature = sign_digest(digest, signing_key)?.to_vec();
    Ok(())
}

/// Address controlled by `signing_key`.
pub fn signer_address(signing_key: &SigningKey) -> Address {
    let point = signing_key.verifying_key().to_encoded_point(false);
    let hash = keccak256_bytes(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}
