use alloy_primitives::{Address, Bytes, B256, U256};
use k256::ecdsa::SigningKey;
use key_manager::{
    keys, AccountView, CallDescriptor, CallVerifier, ControlledAccount, DataStore, ExecutionOutcome, KeyManager,
    KeyManagerConfig, KeyManagerError, MemoryStore, OperationType, Permission, Permissions, ReentrantCall,
    RecordingExecutor, RelayCall, RelayCallEnvelope, RequestContext, ValidityWindow, VerificationResult,
    ALL_PERMISSIONS,
};
use key_manager_encoder::{
    encode_permissions, execute_calldata, set_data_batch_calldata, set_data_calldata, sign_digest, sign_relay_call,
    signer_address, AllowedCallEntry, ControllerGrant,
};
use key_manager_types::{pack_nonce, CallTypes, LSP25_VERSION};

const KM: Address = Address::new([0x4b; 20]);
const ACCOUNT: Address = Address::new([0xac; 20]);
const CONTROLLER: Address = Address::new([0xc0; 20]);
const TARGET: Address = Address::new([0xaa; 20]);
const TRANSFER: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];
const APPROVE: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];
const NOW: u64 = 1_000;

type Account = ControlledAccount<MemoryStore, RecordingExecutor>;

fn signing_key(byte: u8) -> SigningKey {
    let mut secret = [0u8; 32];
    secret[31] = byte;
    SigningKey::from_slice(&secret).unwrap()
}

fn data_key(prefix: &[u8]) -> B256 {
    let mut key = [0x11u8; 32];
    key[..prefix.len()].copy_from_slice(prefix);
    B256::new(key)
}

fn setup(grants: &[ControllerGrant]) -> (KeyManager, Account) {
    let entries = grants
        .iter()
        .enumerate()
        .flat_map(|(index, grant)| grant.data_entries(index as u128))
        .map(|(key, value)| (key, Bytes::from(value)));
    let store = MemoryStore::with_entries(entries);
    let executor = RecordingExecutor::new().with_program(KM);
    let account = ControlledAccount::new(ACCOUNT, KM, store, executor);
    (KeyManager::new(KM, ACCOUNT, KeyManagerConfig::default()), account)
}

fn grant(controller: Address, permissions: &[Permission]) -> ControllerGrant {
    ControllerGrant::new(controller, permissions.iter().copied().collect::<Permissions>())
}

fn signed(key: &SigningKey, nonce: U256, validity: ValidityWindow, payload: Vec<u8>) -> RelayCallEnvelope {
    let mut envelope = RelayCallEnvelope {
        version: LSP25_VERSION,
        chain_id: 1,
        nonce,
        validity: validity.to_packed(),
        value: U256::ZERO,
        payload,
        signature: Vec::new(),
    };
    sign_relay_call(&mut envelope, KM, key).unwrap();
    envelope
}

fn relay(km: &mut KeyManager, account: &mut Account, envelope: &RelayCallEnvelope) -> key_manager::Result<Bytes> {
    let mut ctx = km.context(NOW);
    km.execute_relay_call(
        account,
        &mut ctx,
        &envelope.signature,
        envelope.nonce,
        envelope.validity,
        envelope.value,
        &envelope.payload,
    )
}

#[test]
fn set_data_respects_allowed_key_prefix() {
    let (mut km, mut account) = setup(&[
        grant(CONTROLLER, &[Permission::SetData]).with_allowed_data_keys([&[0xca, 0xfe][..]])
    ]);
    let mut ctx = km.context(NOW);

    let allowed = data_key(&[0xca, 0xfe]);
    km.execute(&mut account, &mut ctx, CONTROLLER, U256::ZERO, &set_data_calldata(allowed, b"hi"))
        .unwrap();
    assert_eq!(account.store().get(&allowed), Bytes::from_static(b"hi"));

    let denied = data_key(&[0xbe, 0xef]);
    let err = km
        .execute(&mut account, &mut ctx, CONTROLLER, U256::ZERO, &set_data_calldata(denied, b"hi"))
        .unwrap_err();
    assert!(matches!(err, KeyManagerError::NotAllowedDataKey { controller, key } if controller == CONTROLLER && key == denied));
    assert!(account.store().get(&denied).is_empty());
}

#[test]
fn call_with_unlisted_selector_is_rejected() {
    let entry = AllowedCallEntry::call(CallTypes::CALL, TARGET, TRANSFER);
    let (mut km, mut account) = setup(&[grant(CONTROLLER, &[Permission::Call]).with_allowed_calls([entry])]);
    let mut ctx = km.context(NOW);

    let transfer = execute_calldata(OperationType::Call, TARGET, U256::ZERO, &TRANSFER);
    km.execute(&mut account, &mut ctx, CONTROLLER, U256::ZERO, &transfer)
        .unwrap();
    assert_eq!(account.executor().calls().len(), 1);

    let approve = execute_calldata(OperationType::Call, TARGET, U256::ZERO, &APPROVE);
    let err = km
        .execute(&mut account, &mut ctx, CONTROLLER, U256::ZERO, &approve)
        .unwrap_err();
    assert!(matches!(
        err,
        KeyManagerError::NotAllowedCall { target, selector, .. } if target == TARGET && selector == APPROVE
    ));
    assert_eq!(account.executor().calls().len(), 1);
}

#[test]
fn relay_call_consumes_nonce_and_rejects_replay() {
    let key = signing_key(7);
    let signer = signer_address(&key);
    let (mut km, mut account) = setup(&[grant(
        signer,
        &[Permission::ExecuteRelayCall, Permission::SuperSetData, Permission::SetData],
    )]);

    let payload = set_data_calldata(data_key(&[0x01]), b"v");
    let envelope = signed(&key, km.get_nonce(signer, 0), ValidityWindow::ALWAYS, payload);
    relay(&mut km, &mut account, &envelope).unwrap();
    assert_eq!(km.get_nonce(signer, 0), U256::from(1u8));
    assert_eq!(account.store().get(&data_key(&[0x01])), Bytes::from_static(b"v"));

    let err = relay(&mut km, &mut account, &envelope).unwrap_err();
    assert!(matches!(
        err,
        KeyManagerError::NonceMismatch { expected, supplied, .. } if expected == U256::from(1u8) && supplied == U256::ZERO
    ));
    assert_eq!(km.get_nonce(signer, 0), U256::from(1u8));
}

#[test]
fn nonce_channels_are_independent() {
    let key = signing_key(7);
    let signer = signer_address(&key);
    let (mut km, mut account) = setup(&[grant(
        signer,
        &[Permission::ExecuteRelayCall, Permission::SuperSetData],
    )]);

    let payload = set_data_calldata(data_key(&[0x02]), b"v");
    let envelope = signed(&key, pack_nonce(5, 0), ValidityWindow::ALWAYS, payload);
    relay(&mut km, &mut account, &envelope).unwrap();

    assert_eq!(km.get_nonce(signer, 5), pack_nonce(5, 1));
    assert_eq!(km.get_nonce(signer, 0), U256::ZERO);
}

#[test]
fn relay_requires_execute_relay_call_permission() {
    let key = signing_key(9);
    let signer = signer_address(&key);
    let (mut km, mut account) = setup(&[grant(signer, &[Permission::SuperSetData])]);

    let envelope = signed(&key, U256::ZERO, ValidityWindow::ALWAYS, set_data_calldata(data_key(&[3]), b"v"));
    let err = relay(&mut km, &mut account, &envelope).unwrap_err();
    assert_eq!(
        err,
        KeyManagerError::NotAuthorised {
            controller: signer,
            permission: Permission::ExecuteRelayCall
        }
    );
    assert_eq!(km.get_nonce(signer, 0), U256::ZERO);

    let stranger = signing_key(10);
    let envelope = signed(&stranger, U256::ZERO, ValidityWindow::ALWAYS, set_data_calldata(data_key(&[3]), b"v"));
    let err = relay(&mut km, &mut account, &envelope).unwrap_err();
    assert_eq!(
        err,
        KeyManagerError::InvalidSignature {
            recovered: Some(signer_address(&stranger))
        }
    );
}

#[test]
fn relay_validity_window_is_enforced() {
    let key = signing_key(7);
    let signer = signer_address(&key);
    let (mut km, mut account) = setup(&[grant(
        signer,
        &[Permission::ExecuteRelayCall, Permission::SuperSetData],
    )]);
    let payload = set_data_calldata(data_key(&[0x04]), b"v");

    let expired = signed(&key, U256::ZERO, ValidityWindow { start: 0, end: 100 }, payload.clone());
    let err = relay(&mut km, &mut account, &expired).unwrap_err();
    assert!(matches!(err, KeyManagerError::RelayCallExpired { end: 100, now: NOW }));

    let early = signed(&key, U256::ZERO, ValidityWindow { start: 5_000, end: 0 }, payload.clone());
    let err = relay(&mut km, &mut account, &early).unwrap_err();
    assert!(matches!(err, KeyManagerError::RelayCallNotYetValid { start: 5_000, now: NOW }));

    let open = signed(&key, U256::ZERO, ValidityWindow { start: 500, end: 2_000 }, payload);
    relay(&mut km, &mut account, &open).unwrap();
    assert_eq!(km.get_nonce(signer, 0), U256::from(1u8));
}

#[test]
fn relay_batch_failure_restores_nonces_and_state() {
    let key = signing_key(7);
    let signer = signer_address(&key);
    let (mut km, mut account) = setup(&[grant(
        signer,
        &[Permission::ExecuteRelayCall, Permission::SuperSetData],
    )]);

    let first = signed(&key, U256::ZERO, ValidityWindow::ALWAYS, set_data_calldata(data_key(&[5]), b"a"));
    // Reuses nonce 0, so the second item fails after the first was applied.
    let second = signed(&key, U256::ZERO, ValidityWindow::ALWAYS, set_data_calldata(data_key(&[6]), b"b"));
    let calls: Vec<RelayCall> = [&first, &second]
        .iter()
        .map(|envelope| RelayCall {
            signature: envelope.signature.clone().into(),
            nonce: envelope.nonce,
            validity: ValidityWindow::ALWAYS,
            value: U256::ZERO,
            payload: envelope.payload.clone().into(),
        })
        .collect();

    let mut ctx = km.context(NOW);
    let err = km
        .execute_relay_call_batch(&mut account, &mut ctx, U256::ZERO, &calls)
        .unwrap_err();
    assert!(matches!(err, KeyManagerError::NonceMismatch { .. }));
    assert_eq!(km.get_nonce(signer, 0), U256::ZERO);
    assert!(account.store().get(&data_key(&[5])).is_empty());

    let mut ctx = km.context(NOW);
    let outputs = km
        .execute_relay_call_batch(&mut account, &mut ctx, U256::ZERO, &calls[..1])
        .unwrap();
    assert_eq!(outputs.len(), 1);
    assert_eq!(km.get_nonce(signer, 0), U256::from(1u8));
}

#[test]
fn batch_values_must_match_msg_value() {
    let (mut km, mut account) = setup(&[grant(
        CONTROLLER,
        &[Permission::SuperTransferValue, Permission::TransferValue],
    )]);
    let payload: Bytes = execute_calldata(OperationType::Call, TARGET, U256::from(1u8), &[]).into();
    let payloads = vec![payload.clone(), payload];
    let values = [U256::from(1u8), U256::from(1u8)];
    let mut ctx = km.context(NOW);

    let err = km
        .execute_batch(&mut account, &mut ctx, CONTROLLER, U256::from(3u8), &values, &payloads)
        .unwrap_err();
    assert!(matches!(err, KeyManagerError::BatchExcessiveValueSent { .. }));

    let err = km
        .execute_batch(&mut account, &mut ctx, CONTROLLER, U256::from(1u8), &values, &payloads)
        .unwrap_err();
    assert!(matches!(err, KeyManagerError::BatchInsufficientValueSent { .. }));

    let err = km
        .execute_batch(&mut account, &mut ctx, CONTROLLER, U256::from(2u8), &values[..1], &payloads)
        .unwrap_err();
    assert!(matches!(err, KeyManagerError::BatchParamsLengthMismatch));

    let outputs = km
        .execute_batch(&mut account, &mut ctx, CONTROLLER, U256::from(2u8), &values, &payloads)
        .unwrap();
    assert_eq!(outputs.len(), 2);
    assert_eq!(account.executor().calls().len(), 2);
}

#[test]
fn wrong_target_is_rejected() {
    let (_, mut account) = setup(&[grant(CONTROLLER, &[Permission::SuperSetData])]);
    let mut km = KeyManager::new(KM, Address::repeat_byte(0x99), KeyManagerConfig::default());
    let mut ctx = km.context(NOW);
    let err = km
        .execute(&mut account, &mut ctx, CONTROLLER, U256::ZERO, &set_data_calldata(data_key(&[1]), b"x"))
        .unwrap_err();
    assert!(matches!(err, KeyManagerError::InvalidVerificationTarget { actual, .. } if actual == ACCOUNT));
}

#[test]
fn cost_limit_is_enforced() {
    let (mut km, mut account) = setup(&[grant(CONTROLLER, &[Permission::SuperSetData])]);
    let mut ctx = RequestContext::new(NOW, 50);
    let err = km
        .execute(&mut account, &mut ctx, CONTROLLER, U256::ZERO, &set_data_calldata(data_key(&[1]), b"x"))
        .unwrap_err();
    assert!(matches!(err, KeyManagerError::BudgetExceeded { limit: 50, .. }));
    assert!(account.store().get(&data_key(&[1])).is_empty());
}

#[test]
fn is_valid_signature_requires_sign_permission() {
    let signer_key = signing_key(3);
    let other_key = signing_key(4);
    let (km, account) = setup(&[
        grant(signer_address(&signer_key), &[Permission::Sign]),
        grant(signer_address(&other_key), &[Permission::SuperCall]),
    ]);
    let hash = B256::repeat_byte(0x42);

    let signature = sign_digest(hash, &signer_key).unwrap();
    assert_eq!(km.is_valid_signature(&account.view(), hash, &signature), [0x16, 0x26, 0xba, 0x7e]);

    let signature = sign_digest(hash, &other_key).unwrap();
    assert_eq!(km.is_valid_signature(&account.view(), hash, &signature), [0xff; 4]);

    assert_eq!(km.is_valid_signature(&account.view(), hash, &[0u8; 10]), [0xff; 4]);
}

#[test]
fn reentrant_call_needs_reentrancy_permission() {
    let reenter = set_data_calldata(data_key(&[0x07]), b"r");
    let outcome = ExecutionOutcome {
        output: Bytes::new(),
        reentrant_calls: vec![ReentrantCall {
            caller: TARGET,
            value: U256::ZERO,
            calldata: reenter.into(),
        }],
    };
    let call = execute_calldata(OperationType::Call, TARGET, U256::ZERO, &TRANSFER);

    let (mut km, mut account) = setup(&[
        grant(CONTROLLER, &[Permission::SuperCall]),
        grant(TARGET, &[Permission::SuperSetData]),
    ]);
    account.executor_mut().respond(TARGET, outcome.clone());
    let mut ctx = km.context(NOW);
    let err = km
        .execute(&mut account, &mut ctx, CONTROLLER, U256::ZERO, &call)
        .unwrap_err();
    assert!(matches!(
        err.root_cause(),
        KeyManagerError::NotAuthorised { controller, permission: Permission::Reentrancy } if *controller == TARGET
    ));
    assert!(account.executor().calls().is_empty());

    let (mut km, mut account) = setup(&[
        grant(CONTROLLER, &[Permission::SuperCall]),
        grant(TARGET, &[Permission::SuperSetData, Permission::Reentrancy]),
    ]);
    account.executor_mut().respond(TARGET, outcome);
    let mut ctx = km.context(NOW);
    km.execute(&mut account, &mut ctx, CONTROLLER, U256::ZERO, &call)
        .unwrap();
    assert_eq!(account.store().get(&data_key(&[0x07])), Bytes::from_static(b"r"));
}

#[test]
fn nested_call_from_owner_address_is_still_verified() {
    let intruder = Address::repeat_byte(0xee);
    let escalate = set_data_calldata(
        keys::permissions_key(intruder),
        &encode_permissions(ALL_PERMISSIONS),
    );
    let (mut km, mut account) = setup(&[grant(CONTROLLER, &[Permission::SuperCall])]);
    account.executor_mut().respond(
        TARGET,
        ExecutionOutcome {
            output: Bytes::new(),
            reentrant_calls: vec![ReentrantCall {
                caller: KM,
                value: U256::ZERO,
                calldata: escalate.into(),
            }],
        },
    );

    let call = execute_calldata(OperationType::Call, TARGET, U256::ZERO, &TRANSFER);
    let mut ctx = km.context(NOW);
    let err = km
        .execute(&mut account, &mut ctx, CONTROLLER, U256::ZERO, &call)
        .unwrap_err();
    assert!(matches!(
        err.root_cause(),
        KeyManagerError::NoPermissionsSet { controller } if *controller == KM
    ));
    assert!(account.store().get(&keys::permissions_key(intruder)).is_empty());
    assert!(account.executor().calls().is_empty());
}

#[test]
fn nested_calls_beyond_max_depth_fail() {
    let call = execute_calldata(OperationType::Call, TARGET, U256::ZERO, &TRANSFER);
    let (mut km, mut account) = setup(&[
        grant(CONTROLLER, &[Permission::SuperCall]),
        grant(TARGET, &[Permission::SuperCall, Permission::Reentrancy]),
    ]);
    // The target calls back into itself through the account on every call.
    account.executor_mut().respond(
        TARGET,
        ExecutionOutcome {
            output: Bytes::new(),
            reentrant_calls: vec![ReentrantCall {
                caller: TARGET,
                value: U256::ZERO,
                calldata: call.clone().into(),
            }],
        },
    );

    let mut ctx = km.context(NOW);
    let err = km
        .execute(&mut account, &mut ctx, CONTROLLER, U256::ZERO, &call)
        .unwrap_err();
    assert!(matches!(err.root_cause(), KeyManagerError::CallDepthExceeded { depth: 2, max: 1 }));
    assert!(account.executor().calls().is_empty());
}

#[test]
fn direct_account_call_is_verified_by_key_manager() {
    let (mut km, mut account) = setup(&[
        grant(CONTROLLER, &[Permission::SetData]).with_allowed_data_keys([&[0xca, 0xfe][..]])
    ]);
    let mut ctx = km.context(NOW);

    let allowed = data_key(&[0xca, 0xfe]);
    account
        .call(Some(&mut km), &mut ctx, CONTROLLER, U256::ZERO, &set_data_calldata(allowed, b"ok"))
        .unwrap();
    assert_eq!(account.store().get(&allowed), Bytes::from_static(b"ok"));

    let denied = data_key(&[0xbe, 0xef]);
    let err = account
        .call(Some(&mut km), &mut ctx, CONTROLLER, U256::ZERO, &set_data_calldata(denied, b"no"))
        .unwrap_err();
    assert!(matches!(err, KeyManagerError::CallVerificationFailed { verifier, post_call: false, .. } if verifier == KM));
    assert!(matches!(err.root_cause(), KeyManagerError::NotAllowedDataKey { .. }));

    let err = account
        .call(None, &mut ctx, CONTROLLER, U256::ZERO, &set_data_calldata(allowed, b"no"))
        .unwrap_err();
    assert!(matches!(err, KeyManagerError::CallVerificationFailed { source: None, .. }));
    assert_eq!(account.store().get(&allowed), Bytes::from_static(b"ok"));
}

struct RejectAfter(Address);

impl CallVerifier for RejectAfter {
    fn address(&self) -> Address {
        self.0
    }

    fn verify_pre_call(
        &mut self,
        _account: &AccountView<'_>,
        _ctx: &mut RequestContext,
        _call: &CallDescriptor,
    ) -> key_manager::Result<VerificationResult> {
        Ok(VerificationResult::ApprovedWithData(Bytes::from_static(&[1])))
    }

    fn verify_post_call(
        &mut self,
        account: &AccountView<'_>,
        _ctx: &mut RequestContext,
        _call: &CallDescriptor,
        _pre: &VerificationResult,
        _result: &[u8],
    ) -> key_manager::Result<VerificationResult> {
        assert!(!account.store.get(&data_key(&[0x08])).is_empty());
        Ok(VerificationResult::Rejected("post-call check failed".into()))
    }
}

#[test]
fn post_call_rejection_rolls_back_effects() {
    let verifier_address = Address::repeat_byte(0x5e);
    let executor = RecordingExecutor::new().with_program(verifier_address);
    let mut account = ControlledAccount::new(ACCOUNT, verifier_address, MemoryStore::new(), executor);
    let mut verifier = RejectAfter(verifier_address);
    let mut ctx = RequestContext::unmetered(NOW);

    let err = account
        .call(
            Some(&mut verifier),
            &mut ctx,
            CONTROLLER,
            U256::ZERO,
            &set_data_calldata(data_key(&[0x08]), b"x"),
        )
        .unwrap_err();
    assert!(matches!(err, KeyManagerError::CallVerificationFailed { post_call: true, .. }));
    assert!(account.store().get(&data_key(&[0x08])).is_empty());
    assert!(account.store().events().is_empty());
}

#[test]
fn extension_call_is_forwarded_with_caller_and_value() {
    let handler = Address::repeat_byte(0xe7);
    let selector = [0x12, 0x34, 0x56, 0x78];
    let (mut km, mut account) = setup(&[grant(CONTROLLER, &[Permission::SuperCall, Permission::Call])]);
    account
        .store_mut()
        .set(keys::extension_key(selector), Bytes::copy_from_slice(handler.as_slice()));
    let mut ctx = km.context(NOW);

    let mut calldata = selector.to_vec();
    calldata.extend_from_slice(&[0xab; 8]);
    account
        .call(Some(&mut km), &mut ctx, CONTROLLER, U256::ZERO, &calldata)
        .unwrap();

    let (from, call) = &account.executor().calls()[0];
    assert_eq!(*from, ACCOUNT);
    assert_eq!(call.target, handler);
    assert_eq!(call.value, U256::ZERO);
    assert_eq!(&call.data[..12], calldata.as_slice());
    assert_eq!(&call.data[12..32], CONTROLLER.as_slice());
    assert_eq!(call.data.len(), 12 + 20 + 32);

    let err = account
        .call(Some(&mut km), &mut ctx, CONTROLLER, U256::ZERO, &[0xde, 0xad, 0xbe, 0xef])
        .unwrap_err();
    assert!(matches!(err, KeyManagerError::NoExtensionForSelector(s) if s == [0xde, 0xad, 0xbe, 0xef]));
}

#[test]
fn owner_transfer_needs_change_owner() {
    let new_owner = Address::repeat_byte(0x0e);
    let (mut km, mut account) = setup(&[
        grant(CONTROLLER, &[Permission::SuperSetData]),
        grant(Address::repeat_byte(0xc1), &[Permission::ChangeOwner]),
    ]);
    let payload = key_manager_encoder::transfer_ownership_calldata(new_owner);
    let mut ctx = km.context(NOW);

    let err = km
        .execute(&mut account, &mut ctx, CONTROLLER, U256::ZERO, &payload)
        .unwrap_err();
    assert!(matches!(err, KeyManagerError::NotAuthorised { permission: Permission::ChangeOwner, .. }));

    km.execute(&mut account, &mut ctx, Address::repeat_byte(0xc1), U256::ZERO, &payload)
        .unwrap();
    assert_eq!(account.owner().address(), new_owner);
}

#[test]
fn set_data_batch_keeps_last_value_for_repeated_key() {
    let (mut km, mut account) = setup(&[grant(CONTROLLER, &[Permission::SuperSetData])]);
    let key = data_key(&[0x09]);
    let payload = set_data_batch_calldata(&[(key, b"first".to_vec()), (key, b"second".to_vec())]);
    let mut ctx = km.context(NOW);

    km.execute(&mut account, &mut ctx, CONTROLLER, U256::ZERO, &payload)
        .unwrap();
    assert_eq!(account.store().get(&key), Bytes::from_static(b"second"));
    assert_eq!(account.store().events().len(), 2);
}

#[test]
fn undo_journal_is_released_after_each_request() {
    let (mut km, mut account) = setup(&[
        grant(CONTROLLER, &[Permission::SetData]).with_allowed_data_keys([&[0xca, 0xfe][..]])
    ]);
    let mut ctx = km.context(NOW);

    for value in [&b"a"[..], b"b"] {
        km.execute(&mut account, &mut ctx, CONTROLLER, U256::ZERO, &set_data_calldata(data_key(&[0xca, 0xfe]), value))
            .unwrap();
        assert_eq!(account.store().journal_len(), 0);
    }

    let denied = set_data_calldata(data_key(&[0xbe, 0xef]), b"x");
    km.execute(&mut account, &mut ctx, CONTROLLER, U256::ZERO, &denied)
        .unwrap_err();
    assert_eq!(account.store().journal_len(), 0);

    account
        .call(Some(&mut km), &mut ctx, CONTROLLER, U256::ZERO, &set_data_calldata(data_key(&[0xca, 0xfe]), b"c"))
        .unwrap();
    assert_eq!(account.store().journal_len(), 0);
    assert_eq!(account.store().get(&data_key(&[0xca, 0xfe])), Bytes::from_static(b"c"));
}
