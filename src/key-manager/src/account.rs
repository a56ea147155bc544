//! Controlled account: the state and call machinery a key manager protects.
//!
//! Every call from someone other than the owner goes through the owner's verifier: pre-call,
//! effect, re-entrant calls, post-call. A failure anywhere rolls back the store, the executor
//! journal and any ownership change made by the request.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolValue;
use key_manager_types::OperationType;
use tracing::{debug, info, instrument, trace, warn};

use crate::{
    config::MAX_SUPPORTED_CALL_DEPTH,
    context::{cost, RequestContext},
    errors::{KeyManagerError, Result},
    operation::{ExecuteCall, Operation},
    store::{AccountView, DataStore, Executor, ExtensionResolver, Journaled},
    utils::bytes::selector_of,
    verification::{self, CallDescriptor, CallVerifier},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Owner {
    /// A plain signing key; it can only act directly.
    Key(Address),
    /// A program that verifies calls made by others.
    Program(Address),
}

impl Owner {
    pub fn address(&self) -> Address {
        match self {
            Owner::Key(address) | Owner::Program(address) => *address,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AccountCheckpoint<A, B> {
    store: A,
    executor: B,
    owner: Owner,
}

pub struct ControlledAccount<S, X> {
    address: Address,
    owner: Owner,
    store: S,
    executor: X,
    max_call_depth: u32,
    /// Checkpoints taken and not yet committed or rolled back.
    open_checkpoints: u32,
}

impl<S, X> ControlledAccount<S, X>
where
    S: DataStore + Journaled,
    X: Executor + Journaled,
{
    /// The owner is a program when the executor reports code at its address.
    pub fn new(address: Address, owner: Address, store: S, executor: X) -> Self {
        let owner = classify_owner(&executor, owner);
        Self {
            address,
            owner,
            store,
            executor,
            max_call_depth: MAX_SUPPORTED_CALL_DEPTH,
            open_checkpoints: 0,
        }
    }

    pub fn with_max_call_depth(mut self, max_call_depth: u32) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Owner {
        self.owner
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Direct store access for hosts seeding state outside any request.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn executor(&self) -> &X {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut X {
        &mut self.executor
    }

    pub fn view(&self) -> AccountView<'_> {
        AccountView::new(self.address, &self.store, &self.executor)
    }

    /// Open a checkpoint. Each one must be closed by `commit` or `rollback`, innermost first.
    pub fn checkpoint(&mut self) -> AccountCheckpoint<S::Checkpoint, X::Checkpoint> {
        self.open_checkpoints += 1;
        AccountCheckpoint {
            store: self.store.checkpoint(),
            executor: self.executor.checkpoint(),
            owner: self.owner,
        }
    }

    pub fn rollback(&mut self, checkpoint: AccountCheckpoint<S::Checkpoint, X::Checkpoint>) {
        self.store.rollback(checkpoint.store);
        self.executor.rollback(checkpoint.executor);
        self.owner = checkpoint.owner;
        self.open_checkpoints = self.open_checkpoints.saturating_sub(1);
    }

    /// Keep the changes made since `checkpoint`. Undo data is released once the outermost
    /// checkpoint commits.
    pub fn commit(&mut self, checkpoint: AccountCheckpoint<S::Checkpoint, X::Checkpoint>) {
        self.open_checkpoints = self.open_checkpoints.saturating_sub(1);
        if self.open_checkpoints == 0 {
            self.store.commit(checkpoint.store);
            self.executor.commit(checkpoint.executor);
        }
    }

    /// Handle a call made to the account by `caller`.
    #[instrument(skip_all, fields(account = %self.address, %caller, %value))]
    pub fn call(
        &mut self,
        verifier: Option<&mut (dyn CallVerifier + '_)>,
        ctx: &mut RequestContext,
        caller: Address,
        value: U256,
        calldata: &[u8],
    ) -> Result<Bytes> {
        let checkpoint = self.checkpoint();
        let result = self.call_at_depth(verifier, ctx, caller, value, calldata, 0);
        match &result {
            Ok(_) => self.commit(checkpoint),
            Err(err) => {
                warn!(error = %err, "account call reverted");
                self.rollback(checkpoint);
            },
        }
        result
    }

    fn call_at_depth(
        &mut self,
        mut verifier: Option<&mut (dyn CallVerifier + '_)>,
        ctx: &mut RequestContext,
        caller: Address,
        value: U256,
        calldata: &[u8],
        depth: u32,
    ) -> Result<Bytes> {
        if depth > self.max_call_depth {
            return Err(KeyManagerError::CallDepthExceeded {
                depth,
                max: self.max_call_depth,
            });
        }
        let Some(operation) = self.resolve_operation(caller, value, calldata)? else {
            trace!(len = calldata.len(), "value received");
            return Ok(Bytes::new());
        };

        // Nested calls are verified even when routed through the owner.
        if depth == 0 && caller == self.owner.address() {
            trace!(operation = operation.name(), "owner call");
            return self.apply(verifier, ctx, &operation, depth);
        }

        let owner = match self.owner {
            Owner::Program(owner) => owner,
            Owner::Key(owner) => return Err(verification_unavailable(owner, "owner cannot verify calls")),
        };
        let call = CallDescriptor {
            account: self.address,
            caller,
            value,
            calldata: Bytes::copy_from_slice(calldata),
            operation,
            depth,
        };

        let pre = {
            let Some(v) = verifier.as_deref_mut() else {
                return Err(verification_unavailable(owner, "no verifier supplied"));
            };
            if v.address() != owner {
                return Err(verification_unavailable(owner, "verifier is not the account owner"));
            }
            verification::pre_call(v, &self.view(), ctx, &call)?
        };

        let output = self.apply(verifier.as_deref_mut(), ctx, &call.operation, depth)?;

        if let Some(v) = verifier.as_deref_mut() {
            verification::post_call(v, &self.view(), ctx, &call, &pre, &output)?;
        }
        debug!(operation = call.operation.name(), depth, "verified call applied");
        Ok(output)
    }

    /// Native operation, LSP17 extension call, or `None` for a plain value transfer.
    fn resolve_operation(&self, caller: Address, value: U256, calldata: &[u8]) -> Result<Option<Operation>> {
        if let Some(operation) = Operation::try_decode(calldata)? {
            return Ok(Some(operation));
        }
        if calldata.len() < 4 {
            return Ok(None);
        }
        let selector = selector_of(calldata);
        let handler = self
            .store
            .resolve_extension(selector)
            .ok_or(KeyManagerError::NoExtensionForSelector(selector))?;

        let mut data = Vec::with_capacity(calldata.len() + 52);
        data.extend_from_slice(calldata);
        data.extend_from_slice(caller.as_slice());
        data.extend_from_slice(&value.to_be_bytes::<32>());
        Ok(Some(Operation::Execute(ExecuteCall::call(handler, U256::ZERO, data))))
    }

    fn apply(
        &mut self,
        mut verifier: Option<&mut (dyn CallVerifier + '_)>,
        ctx: &mut RequestContext,
        operation: &Operation,
        depth: u32,
    ) -> Result<Bytes> {
        match operation {
            Operation::SetData { key, value } => {
                ctx.meter.charge(cost::STORAGE_WRITE)?;
                self.store.set(*key, value.clone());
                Ok(Bytes::new())
            },
            Operation::SetDataBatch { keys, values } => {
                for _ in keys {
                    ctx.meter.charge(cost::STORAGE_WRITE)?;
                }
                self.store.set_batch(keys, values);
                Ok(Bytes::new())
            },
            Operation::Execute(call) => self.execute(verifier, ctx, call, depth),
            Operation::ExecuteBatch(calls) => {
                let mut outputs = Vec::with_capacity(calls.len());
                for call in calls {
                    outputs.push(self.execute(verifier.as_deref_mut(), ctx, call, depth)?);
                }
                Ok(outputs.abi_encode().into())
            },
            Operation::TransferOwnership { new_owner } => {
                self.owner = classify_owner(&self.executor, *new_owner);
                info!(account = %self.address, owner = %new_owner, "ownership transferred");
                Ok(Bytes::new())
            },
        }
    }

    fn execute(
        &mut self,
        mut verifier: Option<&mut (dyn CallVerifier + '_)>,
        ctx: &mut RequestContext,
        call: &ExecuteCall,
        depth: u32,
    ) -> Result<Bytes> {
        if call.operation == OperationType::StaticCall && !call.value.is_zero() {
            return Err(KeyManagerError::ValueNotAllowedInStaticCall);
        }
        let outcome = self.executor.perform(self.address, call)?;
        for reentrant in &outcome.reentrant_calls {
            self.call_at_depth(
                verifier.as_deref_mut(),
                ctx,
                reentrant.caller,
                reentrant.value,
                &reentrant.calldata,
                depth + 1,
            )?;
        }
        Ok(outcome.output)
    }
}

fn classify_owner(executor: &impl Executor, owner: Address) -> Owner {
    if executor.has_code(owner) {
        Owner::Program(owner)
    } else {
        Owner::Key(owner)
    }
}

fn verification_unavailable(owner: Address, reason: &str) -> KeyManagerError {
    KeyManagerError::CallVerificationFailed {
        verifier: owner,
        post_call: false,
        reason: reason.into(),
        source: None,
    }
}
