use std::sync::Arc;

use ethereum_types::U256;
use rollvm_common::Gas;

use crate::db::Bytecode;
use crate::environment::Environment;
use crate::errors::{InternalError, VMError};
use crate::memory::TaggedMemory;

/// One activation record of the call tree: the memory, gas balance, program
/// counter and output buffers of a single executing context.
///
/// A frame is exclusively borrowed by the instruction executing in it;
/// parent frames sit untouched on the Rust call stack while a child runs,
/// so no two contexts ever step at once.
#[derive(Debug)]
pub struct CallFrame {
    pub env: Environment,
    pub memory: TaggedMemory,
    pub gas_left: Gas,
    pub pc: u32,
    pub depth: u32,
    pub bytecode: Arc<Bytecode>,
    /// Filled by RETURN or REVERT, read back by the driver when the context
    /// halts.
    pub output: Vec<U256>,
    /// Full output of the most recent nested call, kept for instructions
    /// that copy returndata.
    pub nested_return_data: Vec<U256>,
}

impl CallFrame {
    /// Creates a context with its memory populated from the calldata slice,
    /// one `Field`-tagged word per slot starting at offset zero.
    pub fn new(
        env: Environment,
        gas_limit: Gas,
        calldata: &[U256],
        bytecode: Arc<Bytecode>,
        depth: u32,
    ) -> Self {
        CallFrame {
            env,
            memory: TaggedMemory::with_calldata(calldata),
            gas_left: gas_limit,
            pc: 0,
            depth,
            bytecode,
            output: Vec::new(),
            nested_return_data: Vec::new(),
        }
    }

    /// Debits both gas dimensions. Fails without touching either balance if
    /// one would go negative; the fault names the exhausted dimension.
    pub fn consume_gas(&mut self, cost: Gas) -> Result<(), VMError> {
        self.gas_left = self
            .gas_left
            .checked_sub(cost)
            .map_err(|dimension| VMError::OutOfGas { dimension })?;
        Ok(())
    }

    /// Credits unused gas handed back by a completed nested call. Callers
    /// must only refund what was previously debited for that call.
    pub fn refund_gas(&mut self, amount: Gas) -> Result<(), VMError> {
        self.gas_left = self
            .gas_left
            .checked_add(amount)
            .ok_or(InternalError::RefundOverflow)?;
        Ok(())
    }

    /// Burns the remaining balance. Applied when the context faults.
    pub fn exhaust_gas(&mut self) {
        self.gas_left = Gas::ZERO;
    }
}
