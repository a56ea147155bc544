#[cfg(test)]
mod tests {
    use alloy_primitives::{address, Address, U256};
    use alloy_sol_types::SolCall;
    use k256::ecdsa::SigningKey;
    use key_manager_types::{keys, pack_nonce, CallTypes, Permission, Permissions, RelayCallEnvelope, LSP25_VERSION};

    use crate::encoder::{
        encode_allowed_calls, encode_compact_bytes_array, execute_calldata, relay_call_digest, set_data_calldata,
        sign_relay_call, signer_address, IERC725,
    };
    use crate::types::{AllowedCallEntry, ControllerGrant, ANY_BYTES4};

    fn key() -> SigningKey {
        let mut secret = [0u8; 32];
        secret[31] = 1;
        SigningKey::from_slice(&secret).unwrap()
    }

    #[test]
    fn test_compact_bytes_array() {
        let encoded = encode_compact_bytes_array(&[&[0xca, 0xfe], &[0x01]]);
        assert_eq!(encoded, vec![0x00, 0x02, 0xca, 0xfe, 0x00, 0x01, 0x01]);
    }

    #[test]
    fn test_encode_allowed_calls() {
        let target = Address::repeat_byte(0xaa);
        let entry = AllowedCallEntry::call(CallTypes::CALL | CallTypes::VALUE, target, [0xa9, 0x05, 0x9c, 0xbb]);
        let encoded = encode_allowed_calls(&[entry]);
        assert_eq!(encoded.len(), 34);
        assert_eq!(&encoded[..2], &[0x00, 0x20]);
        assert_eq!(&encoded[2..6], &[0, 0, 0, 3]);
        assert_eq!(&encoded[6..26], target.as_slice());
        assert_eq!(&encoded[26..30], &ANY_BYTES4);
    }

    #[test]
    fn test_relay_digest_matches_shared_envelope() {
        let envelope = RelayCallEnvelope {
            version: LSP25_VERSION,
            chain_id: 4201,
            nonce: pack_nonce(3, 9),
            validity: U256::ZERO,
            value: U256::from(10u8),
            payload: set_data_calldata(keys::ADDRESS_PERMISSIONS_ARRAY, &[1]),
            signature: Vec::new(),
        };
        let verifier = Address::repeat_byte(0x4b);
        assert_eq!(relay_call_digest(&envelope, verifier), envelope.digest(verifier));
    }

    #[test]
    fn test_sign_relay_call() {
        let mut envelope = RelayCallEnvelope {
            version: LSP25_VERSION,
            chain_id: 1,
            nonce: U256::ZERO,
            validity: U256::ZERO,
            value: U256::ZERO,
            payload: vec![1, 2, 3, 4],
            signature: Vec::new(),
        };
        sign_relay_call(&mut envelope, Address::ZERO, &key()).unwrap();
        assert_eq!(envelope.signature.len(), 65);
        assert!(envelope.signature[64] == 27 || envelope.signature[64] == 28);
        assert_eq!(signer_address(&key()), address!("7E5F4552091A69125d5DfCb7b8C2659029395Bdf"));
    }

    #[test]
    fn test_calldata_selectors() {
        let calldata = execute_calldata(
            key_manager_types::OperationType::Call,
            Address::ZERO,
            U256::ZERO,
            &[],
        );
        assert_eq!(calldata[..4], IERC725::executeCall::SELECTOR);
        assert_eq!(IERC725::setDataCall::SELECTOR, [0x7f, 0x23, 0x69, 0x0c]);
        assert_eq!(IERC725::executeCall::SELECTOR, [0x44, 0xc0, 0x28, 0xfe]);
    }

    #[test]
    fn test_controller_grant_entries() {
        let controller = Address::repeat_byte(0xc0);
        let grant = ControllerGrant::new(controller, Permissions::from(Permission::SetData))
            .with_allowed_data_keys([&[0xca, 0xfe][..]]);
        let entries = grant.data_entries(0);

        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0], (keys::ADDRESS_PERMISSIONS_ARRAY, 1u128.to_be_bytes().to_vec()));
        assert_eq!(entries[1].1, controller.to_vec());
        assert_eq!(entries[3].0, keys::allowed_data_keys_key(controller));
        assert_eq!(entries[3].1, vec![0x00, 0x02, 0xca, 0xfe]);
    }
}
