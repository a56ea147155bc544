//! Abstractions over the account's key-value store and its outbound call machinery.
//!
//! The engine never owns account state. It reads permissions and allow-lists through
//! [`DataStore`], asks [`InterfaceSupport`] whether a target implements a standard, and performs
//! effects through [`Executor`]. Both stores used by an account are [`Journaled`] so a failed
//! request can be undone.

pub mod memory;

use alloy_primitives::{Address, Bytes, B256, U256};
use key_manager_types::keys;

use crate::{errors::Result, operation::ExecuteCall};

pub use memory::{DataChanged, MemoryStore, RecordingExecutor};

/// Account data store: `bytes32` keys to variable-length values. An empty value means unset.
pub trait DataStore {
    fn get(&self, key: &B256) -> Bytes;

    fn get_batch(&self, keys: &[B256]) -> Vec<Bytes> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    /// Write a value. Implementations emit a change notification per key.
    fn set(&mut self, key: B256, value: Bytes);

    fn set_batch(&mut self, keys: &[B256], values: &[Bytes]) {
        for (key, value) in keys.iter().zip(values) {
            self.set(*key, value.clone());
        }
    }
}

/// Undo support for state touched by a request.
pub trait Journaled {
    type Checkpoint: Copy;

    fn checkpoint(&self) -> Self::Checkpoint;
    fn rollback(&mut self, checkpoint: Self::Checkpoint);

    /// Drop undo data recorded since `checkpoint`. Only called for the outermost checkpoint of a
    /// request, once it has succeeded.
    fn commit(&mut self, checkpoint: Self::Checkpoint);
}

/// ERC165-style capability query on a call target.
pub trait InterfaceSupport {
    fn supports_interface(&self, target: Address, interface_id: [u8; 4]) -> bool;
}

/// A call the target made back into the account while it was being executed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReentrantCall {
    pub caller: Address,
    pub value: U256,
    pub calldata: Bytes,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub output: Bytes,
    pub reentrant_calls: Vec<ReentrantCall>,
}

impl ExecutionOutcome {
    pub fn returning(output: impl Into<Bytes>) -> Self {
        Self {
            output: output.into(),
            reentrant_calls: Vec::new(),
        }
    }
}

/// Performs the external effect of an ERC725X call on behalf of `account`.
pub trait Executor: InterfaceSupport {
    fn perform(&mut self, account: Address, call: &ExecuteCall) -> Result<ExecutionOutcome>;

    /// Whether `address` is a program rather than a plain key.
    fn has_code(&self, address: Address) -> bool;
}

/// LSP17 extension lookup for selectors the account does not implement natively.
pub trait ExtensionResolver {
    fn resolve_extension(&self, selector: [u8; 4]) -> Option<Address>;
}

impl<S: DataStore + ?Sized> ExtensionResolver for S {
    fn resolve_extension(&self, selector: [u8; 4]) -> Option<Address> {
        let value = self.get(&keys::extension_key(selector));
        if value.len() < 20 {
            return None;
        }
        let handler = Address::from_slice(&value[..20]);
        (handler != Address::ZERO).then_some(handler)
    }
}

/// Read-only view of an account handed to verifiers.
#[derive(Clone, Copy)]
pub struct AccountView<'a> {
    pub address: Address,
    pub store: &'a dyn DataStore,
    pub interfaces: &'a dyn InterfaceSupport,
}

impl<'a> AccountView<'a> {
    pub fn new(address: Address, store: &'a dyn DataStore, interfaces: &'a dyn InterfaceSupport) -> Self {
        Self {
            address,
            store,
            interfaces,
        }
    }
}
