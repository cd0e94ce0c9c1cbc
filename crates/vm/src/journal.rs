use ethereum_types::{H256, U256};
use rollvm_common::{Address, Gas};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::environment::Environment;
use crate::errors::{CallResult, InternalError, VMError};

/// Trace entry for one attempted nested call. This is the exact shape a
/// downstream proof generator consumes: allocation, remaining gas, callee
/// environment, code identity and the call's result.
#[derive(Debug, Clone, Serialize)]
pub struct CallRecord {
    pub start_gas: Gas,
    pub end_gas: Gas,
    pub environment: Environment,
    pub bytecode_id: H256,
    pub result: CallResult,
}

type StorageSlots = FxHashMap<(Address, U256), U256>;

/// Side effects and the call trace of one top-level execution.
///
/// World-state effects accumulate under the scope opened for each nested
/// call and are merged into the parent scope or dropped with the callee's
/// outcome. The trace is append-only and shared by the whole call tree:
/// reverted calls keep their entry, only their effects are rolled back.
#[derive(Debug, Default)]
pub struct Journal {
    storage: StorageSlots,
    checkpoints: Vec<StorageSlots>,
    trace: Vec<CallRecord>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a scope for a nested call's effects.
    pub fn checkpoint(&mut self) {
        self.checkpoints.push(self.storage.clone());
    }

    /// Merges the current scope into its parent. The staged writes are
    /// already live; dropping the backup makes them permanent there.
    pub fn commit(&mut self) -> Result<(), VMError> {
        self.checkpoints
            .pop()
            .ok_or(InternalError::NoOpenCheckpoint)?;
        Ok(())
    }

    /// Drops the current scope, restoring the state at its checkpoint.
    pub fn rollback(&mut self) -> Result<(), VMError> {
        self.storage = self
            .checkpoints
            .pop()
            .ok_or(InternalError::NoOpenCheckpoint)?;
        Ok(())
    }

    /// Current value of a public storage slot. Unwritten slots read zero.
    pub fn storage_read(&self, address: Address, slot: U256) -> U256 {
        self.storage
            .get(&(address, slot))
            .copied()
            .unwrap_or_default()
    }

    /// Stages a write to the executing contract's public storage. Static
    /// contexts cannot alter state, at any depth.
    pub fn storage_write(
        &mut self,
        env: &Environment,
        slot: U256,
        value: U256,
    ) -> Result<(), VMError> {
        if env.is_static_call {
            return Err(VMError::StaticStateAlteration);
        }
        self.storage.insert((env.address, slot), value);
        Ok(())
    }

    /// Appends the record of an attempted nested call. Records survive
    /// rollback of the call's effects.
    pub fn record_call(&mut self, record: CallRecord) {
        self.trace.push(record);
    }

    /// The nested-call trace, in completion order: siblings in program
    /// order, each callee before its caller.
    pub fn trace(&self) -> &[CallRecord] {
        &self.trace
    }

    /// Open nested scopes. Zero once a top-level execution has unwound.
    pub fn open_checkpoints(&self) -> usize {
        self.checkpoints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{CallOutcome, RevertReason};
    use rollvm_common::FunctionSelector;

    fn env(address: u64, is_static_call: bool) -> Environment {
        Environment::new(
            Address::from_u64(address),
            Address::from_u64(0),
            FunctionSelector::new(0),
            is_static_call,
        )
    }

    fn record(address: u64, result: CallResult) -> CallRecord {
        CallRecord {
            start_gas: Gas::new(100, 100),
            end_gas: result.gas_left,
            environment: env(address, false),
            bytecode_id: H256::repeat_byte(address as u8),
            result,
        }
    }

    #[test]
    fn committed_writes_survive_the_scope() {
        let mut journal = Journal::new();
        journal.checkpoint();
        journal
            .storage_write(&env(1, false), U256::from(5), U256::from(9))
            .unwrap();
        journal.commit().unwrap();
        assert_eq!(
            journal.storage_read(Address::from_u64(1), U256::from(5)),
            U256::from(9)
        );
        assert_eq!(journal.open_checkpoints(), 0);
    }

    #[test]
    fn rolled_back_writes_disappear() {
        let mut journal = Journal::new();
        journal
            .storage_write(&env(1, false), U256::from(5), U256::from(9))
            .unwrap();
        journal.checkpoint();
        journal
            .storage_write(&env(1, false), U256::from(5), U256::from(10))
            .unwrap();
        journal
            .storage_write(&env(1, false), U256::from(6), U256::from(11))
            .unwrap();
        journal.rollback().unwrap();
        assert_eq!(
            journal.storage_read(Address::from_u64(1), U256::from(5)),
            U256::from(9)
        );
        assert_eq!(
            journal.storage_read(Address::from_u64(1), U256::from(6)),
            U256::zero()
        );
    }

    #[test]
    fn static_contexts_cannot_write() {
        let mut journal = Journal::new();
        let err = journal
            .storage_write(&env(1, true), U256::from(5), U256::from(9))
            .unwrap_err();
        assert_eq!(err, VMError::StaticStateAlteration);
    }

    #[test]
    fn unwritten_slots_read_zero() {
        let journal = Journal::new();
        assert_eq!(
            journal.storage_read(Address::from_u64(1), U256::from(5)),
            U256::zero()
        );
    }

    #[test]
    fn trace_entries_survive_rollback() {
        let mut journal = Journal::new();
        journal.checkpoint();
        journal.record_call(record(
            2,
            CallResult::reverted(vec![], Gas::ZERO, RevertReason::new("assertion failed")),
        ));
        journal.rollback().unwrap();
        assert_eq!(journal.trace().len(), 1);
        assert_eq!(journal.trace()[0].result.outcome, CallOutcome::Revert);
    }

    #[test]
    fn closing_a_scope_that_was_never_opened_is_a_defect() {
        let mut journal = Journal::new();
        assert!(matches!(
            journal.commit(),
            Err(VMError::Internal(InternalError::NoOpenCheckpoint))
        ));
        assert!(matches!(
            journal.rollback(),
            Err(VMError::Internal(InternalError::NoOpenCheckpoint))
        ));
    }
}
