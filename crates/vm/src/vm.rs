use std::mem;

use ethereum_types::U256;
use rollvm_common::Gas;
use tracing::debug;

use crate::{
    call_frame::CallFrame,
    db::BytecodeProvider,
    environment::Environment,
    errors::{CallResult, InternalError, OpcodeResult, RevertReason, VMError},
    journal::Journal,
    opcodes::{CallKind, Instruction},
};

/// The simulator driver: a fetch/decode/execute loop over one execution
/// context at a time.
///
/// Nested calls recurse through [`VM::run`]; the journal is the only state
/// shared across the call tree, and only the currently stepping context
/// touches it. A context runs until a terminal instruction or a fault;
/// faults burn the context's remaining gas and are never retried.
pub struct VM<'a> {
    pub db: &'a dyn BytecodeProvider,
    pub journal: Journal,
}

impl<'a> VM<'a> {
    pub fn new(db: &'a dyn BytecodeProvider) -> Self {
        VM {
            db,
            journal: Journal::new(),
        }
    }

    /// Runs a top-level call against `env.address`.
    ///
    /// Faults surface as a faulted result, distinct from a contract-level
    /// revert; only engine and store defects become `Err`.
    pub fn execute(
        &mut self,
        env: Environment,
        gas_limit: Gas,
        calldata: &[U256],
    ) -> Result<CallResult, VMError> {
        let address = env.address;
        match self.db.bytecode(address)? {
            Some(bytecode) => {
                let mut frame = CallFrame::new(env, gas_limit, calldata, bytecode, 0);
                self.run(&mut frame)
            }
            None => Ok(CallResult::reverted(
                Vec::new(),
                Gas::ZERO,
                RevertReason::new(format!("no bytecode at {address}")),
            )),
        }
    }

    /// Executes one context until a terminal instruction or a fault.
    pub fn run(&mut self, frame: &mut CallFrame) -> Result<CallResult, VMError> {
        debug!(
            address = %frame.env.address,
            depth = frame.depth,
            static_call = frame.env.is_static_call,
            gas = %frame.gas_left,
            "context start"
        );
        loop {
            let Some(instruction) = frame
                .bytecode
                .instructions
                .get(frame.pc as usize)
                .copied()
            else {
                let pc = frame.pc;
                return Self::fault(frame, VMError::InvalidProgramCounter { pc });
            };

            match self.step(frame, instruction) {
                Ok(OpcodeResult::Continue) => {
                    frame.pc = frame
                        .pc
                        .checked_add(1)
                        .ok_or(InternalError::PcOverflow)?;
                }
                Ok(OpcodeResult::Return) => {
                    let output = mem::take(&mut frame.output);
                    debug!(address = %frame.env.address, words = output.len(), "context returned");
                    return Ok(CallResult::returned(output, frame.gas_left));
                }
                Ok(OpcodeResult::Revert) => {
                    let output = mem::take(&mut frame.output);
                    let reason = revert_reason_from_output(&output);
                    debug!(address = %frame.env.address, %reason, "context reverted");
                    return Ok(CallResult::reverted(output, frame.gas_left, reason));
                }
                Err(error) if error.should_propagate() => return Err(error),
                Err(error) => return Self::fault(frame, error),
            }
        }
    }

    fn step(
        &mut self,
        frame: &mut CallFrame,
        instruction: Instruction,
    ) -> Result<OpcodeResult, VMError> {
        match instruction {
            Instruction::Set {
                indirect,
                tag,
                value,
                dst_offset,
            } => self.op_set(frame, indirect, tag, value, dst_offset),
            Instruction::Call {
                indirect,
                gas_offset,
                addr_offset,
                args_offset,
                args_size_offset,
                success_offset,
            } => self.op_external_call(
                frame,
                CallKind::Call,
                indirect,
                gas_offset,
                addr_offset,
                args_offset,
                args_size_offset,
                success_offset,
            ),
            Instruction::StaticCall {
                indirect,
                gas_offset,
                addr_offset,
                args_offset,
                args_size_offset,
                success_offset,
            } => self.op_external_call(
                frame,
                CallKind::StaticCall,
                indirect,
                gas_offset,
                addr_offset,
                args_offset,
                args_size_offset,
                success_offset,
            ),
            Instruction::Return {
                indirect,
                return_offset,
                copy_size,
            } => self.op_return(frame, indirect, return_offset, copy_size),
            Instruction::Revert {
                indirect,
                return_offset,
                ret_size_offset,
            } => self.op_revert(frame, indirect, return_offset, ret_size_offset),
        }
    }

    /// Terminal fault handling: the context's remaining gas is burned and
    /// its pending mutations die with the frame.
    fn fault(frame: &mut CallFrame, error: VMError) -> Result<CallResult, VMError> {
        frame.exhaust_gas();
        debug!(address = %frame.env.address, %error, "context faulted");
        Ok(CallResult::faulted(&error))
    }
}

/// Builds the mandatory revert reason from a revert's output.
///
/// Contract revert data encodes a message one character per field word;
/// output that does not decode that way falls back to a generic message, so
/// a reverted result always carries a non-empty reason.
pub fn revert_reason_from_output(output: &[U256]) -> RevertReason {
    if output.is_empty() {
        return RevertReason::new("reverted without reason data");
    }
    let mut message = String::with_capacity(output.len());
    for word in output {
        match printable_char(word) {
            Some(ch) => message.push(ch),
            None => {
                return RevertReason::new(format!(
                    "reverted with {} output words",
                    output.len()
                ));
            }
        }
    }
    RevertReason::new(message)
}

fn printable_char(word: &U256) -> Option<char> {
    if *word < U256::from(0x20u64) || *word > U256::from(0x7eu64) {
        return None;
    }
    Some(char::from(word.byte(0)))
}
