//! The key manager: an account owner that grants controllers fine-grained permissions.
//!
//! Design notes:
//! - Controllers reach the account either directly (`execute`) or through a relayer that submits
//!   a payload they signed (`execute_relay_call`).
//! - The key manager also acts as the account's call verifier, so controllers calling the account
//!   itself are authorized by the same procedure.
//! - Each entry point is atomic: on failure the account, its executor journal and the nonce
//!   channels are restored to their state before the request.

use alloy_primitives::{Address, Bytes, B256, U256};
use key_manager_types::{Permission, ValidityWindow};
use tracing::{debug, instrument};

use crate::{
    account::ControlledAccount,
    authorizer::{AuthorizationRequest, Channel, PermissionAuthorizer},
    config::KeyManagerConfig,
    context::{cost, CostMeter, RequestContext},
    errors::{KeyManagerError, Result},
    lsp20::{ERC1271_FAILURE, ERC1271_SUCCESS},
    nonce::NonceChannelManager,
    operation::Operation,
    relay::RelaySignatureVerifier,
    store::{AccountView, DataStore, Executor, Journaled},
    utils::crypto::ecrecover_address,
    verification::{CallDescriptor, CallVerifier, VerificationResult},
};

/// One signed call in a relay batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayCall {
    pub signature: Bytes,
    pub nonce: U256,
    pub validity: ValidityWindow,
    pub value: U256,
    pub payload: Bytes,
}

#[derive(Clone, Debug)]
pub struct KeyManager {
    address: Address,
    target: Address,
    config: KeyManagerConfig,
    nonces: NonceChannelManager,
}

impl KeyManager {
    pub fn new(address: Address, target: Address, config: KeyManagerConfig) -> Self {
        Self {
            address,
            target,
            config,
            nonces: NonceChannelManager::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// The account this key manager controls.
    pub fn target(&self) -> Address {
        self.target
    }

    pub fn config(&self) -> &KeyManagerConfig {
        &self.config
    }

    pub fn authorizer(&self) -> PermissionAuthorizer {
        PermissionAuthorizer::new(&self.config)
    }

    /// Request context with the configured cost limit.
    pub fn context(&self, timestamp: u64) -> RequestContext {
        RequestContext::new(timestamp, self.config.default_cost_limit)
    }

    pub fn get_nonce(&self, signer: Address, channel: u128) -> U256 {
        self.nonces.get_nonce(signer, channel)
    }

    /// Run `payload` on the account on behalf of `caller`.
    #[instrument(skip_all, fields(key_manager = %self.address, %caller, %msg_value))]
    pub fn execute<S, X>(
        &mut self,
        account: &mut ControlledAccount<S, X>,
        ctx: &mut RequestContext,
        caller: Address,
        msg_value: U256,
        payload: &[u8],
    ) -> Result<Bytes>
    where
        S: DataStore + Journaled,
        X: Executor + Journaled,
    {
        self.check_target(account.address())?;
        self.atomically(account, |km, account| {
            km.execute_as(account, ctx, caller, msg_value, payload, Channel::Direct)
        })
    }

    /// Several payloads in one request. `values` must add up to `msg_value`.
    #[instrument(skip_all, fields(key_manager = %self.address, %caller, len = payloads.len()))]
    pub fn execute_batch<S, X>(
        &mut self,
        account: &mut ControlledAccount<S, X>,
        ctx: &mut RequestContext,
        caller: Address,
        msg_value: U256,
        values: &[U256],
        payloads: &[Bytes],
    ) -> Result<Vec<Bytes>>
    where
        S: DataStore + Journaled,
        X: Executor + Journaled,
    {
        self.check_target(account.address())?;
        if values.len() != payloads.len() {
            return Err(KeyManagerError::BatchParamsLengthMismatch);
        }
        check_batch_value(values, msg_value)?;
        self.atomically(account, |km, account| {
            values
                .iter()
                .zip(payloads)
                .map(|(value, payload)| km.execute_as(account, ctx, caller, *value, payload, Channel::Direct))
                .collect()
        })
    }

    /// Run a payload signed by a controller and submitted by anyone.
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip_all, fields(key_manager = %self.address, %nonce))]
    pub fn execute_relay_call<S, X>(
        &mut self,
        account: &mut ControlledAccount<S, X>,
        ctx: &mut RequestContext,
        signature: &[u8],
        nonce: U256,
        validity: U256,
        msg_value: U256,
        payload: &[u8],
    ) -> Result<Bytes>
    where
        S: DataStore + Journaled,
        X: Executor + Journaled,
    {
        self.check_target(account.address())?;
        self.atomically(account, |km, account| {
            km.relay_one(account, ctx, signature, nonce, validity, msg_value, payload)
        })
    }

    /// Several relay calls in one request. Item values must add up to `msg_value`; any failure
    /// reverts the whole batch, including nonces consumed by earlier items.
    #[instrument(skip_all, fields(key_manager = %self.address, len = calls.len()))]
    pub fn execute_relay_call_batch<S, X>(
        &mut self,
        account: &mut ControlledAccount<S, X>,
        ctx: &mut RequestContext,
        msg_value: U256,
        calls: &[RelayCall],
    ) -> Result<Vec<Bytes>>
    where
        S: DataStore + Journaled,
        X: Executor + Journaled,
    {
        self.check_target(account.address())?;
        let values: Vec<U256> = calls.iter().map(|call| call.value).collect();
        check_batch_value(&values, msg_value)?;
        self.atomically(account, |km, account| {
            calls
                .iter()
                .map(|call| {
                    km.relay_one(
                        account,
                        ctx,
                        &call.signature,
                        call.nonce,
                        call.validity.to_packed(),
                        call.value,
                        &call.payload,
                    )
                })
                .collect()
        })
    }

    /// ERC1271: whether `signature` over `hash` comes from a controller holding SIGN.
    pub fn is_valid_signature(&self, account: &AccountView<'_>, hash: B256, signature: &[u8]) -> [u8; 4] {
        let Ok(signer) = ecrecover_address(hash, signature) else {
            return ERC1271_FAILURE;
        };
        let mut meter = CostMeter::unlimited();
        match self.authorizer().resolve_permissions(account, &mut meter, signer) {
            Ok(permissions) if permissions.has(Permission::Sign) => ERC1271_SUCCESS,
            _ => ERC1271_FAILURE,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn relay_one<S, X>(
        &mut self,
        account: &mut ControlledAccount<S, X>,
        ctx: &mut RequestContext,
        signature: &[u8],
        nonce: U256,
        validity: U256,
        msg_value: U256,
        payload: &[u8],
    ) -> Result<Bytes>
    where
        S: DataStore + Journaled,
        X: Executor + Journaled,
    {
        let verifier = RelaySignatureVerifier::new(self.address, self.config.chain_id);
        let envelope = verifier.envelope(nonce, validity, msg_value, payload, signature);
        let authorizer = self.authorizer();
        let signer = {
            let view = account.view();
            verifier.verify(&envelope, ctx.timestamp, &mut ctx.meter, |candidate, meter| {
                authorizer.is_permitted_signer(&view, meter, candidate)
            })?
        };

        ctx.meter.charge(cost::NONCE_UPDATE)?;
        self.nonces.consume(signer, nonce)?;
        self.execute_as(account, ctx, signer, msg_value, payload, Channel::Relay)
    }

    fn execute_as<S, X>(
        &mut self,
        account: &mut ControlledAccount<S, X>,
        ctx: &mut RequestContext,
        controller: Address,
        msg_value: U256,
        payload: &[u8],
        channel: Channel,
    ) -> Result<Bytes>
    where
        S: DataStore + Journaled,
        X: Executor + Journaled,
    {
        let operation = Operation::decode(payload)?;
        let request = AuthorizationRequest {
            controller,
            operation: &operation,
            channel,
            depth: 0,
        };
        self.authorizer().authorize(&account.view(), &mut ctx.meter, &request)?;

        let address = self.address;
        account.call(Some(self), ctx, address, msg_value, payload)
    }

    fn atomically<S, X, T>(
        &mut self,
        account: &mut ControlledAccount<S, X>,
        f: impl FnOnce(&mut Self, &mut ControlledAccount<S, X>) -> Result<T>,
    ) -> Result<T>
    where
        S: DataStore + Journaled,
        X: Executor + Journaled,
    {
        let nonces = self.nonces.checkpoint();
        let checkpoint = account.checkpoint();
        let result = f(self, account);
        if result.is_ok() {
            self.nonces.commit(nonces);
            account.commit(checkpoint);
        } else {
            self.nonces.rollback(nonces);
            account.rollback(checkpoint);
        }
        result
    }

    fn check_target(&self, account: Address) -> Result<()> {
        if account == self.target {
            Ok(())
        } else {
            Err(KeyManagerError::InvalidVerificationTarget {
                expected: self.target,
                actual: account,
            })
        }
    }
}

impl CallVerifier for KeyManager {
    fn address(&self) -> Address {
        self.address
    }

    fn verify_pre_call(
        &mut self,
        account: &AccountView<'_>,
        ctx: &mut RequestContext,
        call: &CallDescriptor,
    ) -> Result<VerificationResult> {
        self.check_target(account.address)?;
        if call.depth > self.config.max_call_depth {
            return Err(KeyManagerError::CallDepthExceeded {
                depth: call.depth,
                max: self.config.max_call_depth,
            });
        }
        let request = AuthorizationRequest {
            controller: call.caller,
            operation: &call.operation,
            channel: Channel::Direct,
            depth: call.depth,
        };
        self.authorizer().authorize(account, &mut ctx.meter, &request)
    }

    fn verify_post_call(
        &mut self,
        _account: &AccountView<'_>,
        _ctx: &mut RequestContext,
        call: &CallDescriptor,
        _pre: &VerificationResult,
        result: &[u8],
    ) -> Result<VerificationResult> {
        debug!(caller = %call.caller, result_len = result.len(), "post-call");
        Ok(VerificationResult::Approved)
    }
}

fn check_batch_value(values: &[U256], msg_value: U256) -> Result<()> {
    let total = values
        .iter()
        .try_fold(U256::ZERO, |sum, value| sum.checked_add(*value))
        .unwrap_or(U256::MAX);
    if total > msg_value {
        return Err(KeyManagerError::BatchInsufficientValueSent { total, msg_value });
    }
    if total < msg_value {
        return Err(KeyManagerError::BatchExcessiveValueSent { total, msg_value });
    }
    Ok(())
}
