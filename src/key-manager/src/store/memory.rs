//! In-memory store and executor.
//!
//! Used by hosts that keep account state in process, and by tests.

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::{Address, Bytes, B256};
use tracing::trace;

use super::{DataStore, ExecutionOutcome, Executor, InterfaceSupport, Journaled};
use crate::{
    errors::{KeyManagerError, Result},
    operation::ExecuteCall,
};

/// Change notification emitted for every key written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataChanged {
    pub key: B256,
    pub value: Bytes,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<B256, Bytes>,
    journal: Vec<(B256, Option<Bytes>)>,
    events: Vec<DataChanged>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: impl IntoIterator<Item = (B256, Bytes)>) -> Self {
        let mut store = Self::new();
        for (key, value) in entries {
            store.set(key, value);
        }
        store.journal.clear();
        store.events.clear();
        store
    }

    pub fn events(&self) -> &[DataChanged] {
        &self.events
    }

    /// Writes that can still be rolled back.
    pub fn journal_len(&self) -> usize {
        self.journal.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DataStore for MemoryStore {
    fn get(&self, key: &B256) -> Bytes {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    fn set(&mut self, key: B256, value: Bytes) {
        trace!(%key, len = value.len(), "data changed");
        let previous = if value.is_empty() {
            self.entries.remove(&key)
        } else {
            self.entries.insert(key, value.clone())
        };
        self.journal.push((key, previous));
        self.events.push(DataChanged { key, value });
    }
}

impl Journaled for MemoryStore {
    type Checkpoint = (usize, usize);

    fn checkpoint(&self) -> Self::Checkpoint {
        (self.journal.len(), self.events.len())
    }

    fn rollback(&mut self, (journal_len, events_len): Self::Checkpoint) {
        while self.journal.len() > journal_len {
            let Some((key, previous)) = self.journal.pop() else {
                break;
            };
            match previous {
                Some(value) => self.entries.insert(key, value),
                None => self.entries.remove(&key),
            };
        }
        self.events.truncate(events_len);
    }

    fn commit(&mut self, (journal_len, _): Self::Checkpoint) {
        self.journal.truncate(journal_len);
    }
}

/// Executor that records calls and replays scripted outcomes.
#[derive(Clone, Debug, Default)]
pub struct RecordingExecutor {
    calls: Vec<(Address, ExecuteCall)>,
    interfaces: BTreeSet<(Address, [u8; 4])>,
    programs: BTreeSet<Address>,
    outcomes: BTreeMap<Address, ExecutionOutcome>,
    failing: BTreeSet<Address>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `target` as implementing `interface_id`.
    pub fn with_interface(mut self, target: Address, interface_id: [u8; 4]) -> Self {
        self.interfaces.insert((target, interface_id));
        self.programs.insert(target);
        self
    }

    pub fn with_program(mut self, address: Address) -> Self {
        self.programs.insert(address);
        self
    }

    /// Every call to `target` returns `outcome`.
    pub fn respond(&mut self, target: Address, outcome: ExecutionOutcome) {
        self.programs.insert(target);
        self.outcomes.insert(target, outcome);
    }

    /// Every call to `target` reverts.
    pub fn fail_on(&mut self, target: Address) {
        self.failing.insert(target);
    }

    pub fn calls(&self) -> &[(Address, ExecuteCall)] {
        &self.calls
    }
}

impl InterfaceSupport for RecordingExecutor {
    fn supports_interface(&self, target: Address, interface_id: [u8; 4]) -> bool {
        self.interfaces.contains(&(target, interface_id))
    }
}

impl Executor for RecordingExecutor {
    fn perform(&mut self, account: Address, call: &ExecuteCall) -> Result<ExecutionOutcome> {
        if self.failing.contains(&call.target) {
            return Err(KeyManagerError::ExecutionFailed {
                target: call.target,
                reason: "reverted".into(),
            });
        }
        self.calls.push((account, call.clone()));
        Ok(self.outcomes.get(&call.target).cloned().unwrap_or_default())
    }

    fn has_code(&self, address: Address) -> bool {
        self.programs.contains(&address)
    }
}

impl Journaled for RecordingExecutor {
    type Checkpoint = usize;

    fn checkpoint(&self) -> Self::Checkpoint {
        self.calls.len()
    }

    fn rollback(&mut self, checkpoint: Self::Checkpoint) {
        self.calls.truncate(checkpoint);
    }

    // Recorded calls are the executor's output, not undo data.
    fn commit(&mut self, _checkpoint: Self::Checkpoint) {}
}
