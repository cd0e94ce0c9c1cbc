//! # System operations
//!
//! Includes the following opcodes:
//!   - `CALL`
//!   - `STATICCALL`
//!   - `RETURN`
//!   - `REVERT`

use ethereum_types::{H256, U256};
use rollvm_common::{Address, Gas};
use tracing::debug;

use crate::{
    addressing::Addressing,
    call_frame::CallFrame,
    environment::Environment,
    errors::{CallResult, InternalError, OpcodeResult, RevertReason, VMError},
    gas_cost,
    journal::CallRecord,
    memory::{MemoryAccesses, MemoryTag, MemoryValue},
    opcodes::CallKind,
    vm::VM,
};

impl<'a> VM<'a> {
    /// Common behavior of CALL and STATICCALL. The kind only selects the
    /// child's static flag; everything else is shared.
    ///
    /// The caller pays the instruction's own cost first, then the full
    /// allocation for the callee. The allocation request is capped per
    /// dimension at the caller's remaining balance instead of faulting, and
    /// whatever the callee does not consume comes back as a refund after a
    /// successful return.
    #[expect(clippy::too_many_arguments, reason = "one parameter per wire operand")]
    pub fn op_external_call(
        &mut self,
        frame: &mut CallFrame,
        kind: CallKind,
        indirect: u8,
        gas_offset: u16,
        addr_offset: u16,
        args_offset: u16,
        args_size_offset: u16,
        success_offset: u16,
    ) -> Result<OpcodeResult, VMError> {
        let addressing = Addressing::from_wire(indirect, 5);
        let [gas_offset, addr_offset, args_offset, args_size_offset, success_offset] = addressing
            .resolve(
                [
                    gas_offset.into(),
                    addr_offset.into(),
                    args_offset.into(),
                    args_size_offset.into(),
                    success_offset.into(),
                ],
                &mut frame.memory,
            )?;

        frame.memory.check_tags_range(MemoryTag::Field, gas_offset, 2)?;
        frame.memory.check_tag(MemoryTag::Field, addr_offset)?;
        frame.memory.check_tag(MemoryTag::Uint32, args_size_offset)?;

        let calldata_size = frame.memory.get(args_size_offset)?.value.low_u32();
        frame
            .memory
            .check_tags_range(MemoryTag::Field, args_offset, calldata_size)?;

        let callee = Address::from_field(frame.memory.get(addr_offset)?.value);
        let calldata: Vec<U256> = frame
            .memory
            .get_slice(args_offset, calldata_size)?
            .iter()
            .map(|word| word.value)
            .collect();

        // A call issued inside a static context stays static whatever the
        // instruction says; staticness only propagates downward.
        let kind = if frame.env.is_static_call {
            CallKind::StaticCall
        } else {
            kind
        };

        // The instruction's own cost comes out of the caller first.
        frame.consume_gas(match kind {
            CallKind::Call => gas_cost::call(calldata_size),
            CallKind::StaticCall => gas_cost::staticcall(calldata_size),
        })?;

        // The allocation request is a pair of field words; the balance is
        // 64-bit. Cap each dimension at what the caller has left, then debit
        // the whole allocation up front.
        let gas_words = frame.memory.get_slice(gas_offset, 2)?;
        let (requested_l2, requested_da) = match gas_words.as_slice() {
            [l2, da] => (l2.value, da.value),
            _ => return Err(InternalError::UnexpectedSliceLength.into()),
        };
        let allocated = Gas::new(
            cap_to_balance(requested_l2, frame.gas_left.l2),
            cap_to_balance(requested_da, frame.gas_left.da),
        );
        frame.consume_gas(allocated)?;

        let child_env = frame.env.nested(callee, kind);
        debug!(
            kind = %kind.opcode(),
            callee = %callee,
            depth = frame.depth,
            allocated = %allocated,
            "nested call"
        );

        self.journal.checkpoint();
        let (bytecode_id, result) = self.run_nested(
            child_env.clone(),
            allocated,
            &calldata,
            frame.depth.saturating_add(1),
        )?;

        // The callee's full output is observable by the caller whatever the
        // outcome.
        frame.nested_return_data = result.output.clone();

        let success = result.is_success();
        if success {
            self.journal.commit()?;
        } else {
            self.journal.rollback()?;
        }
        self.journal.record_call(CallRecord {
            start_gas: allocated,
            end_gas: result.gas_left,
            environment: child_env,
            bytecode_id,
            result: result.clone(),
        });

        if !success {
            // A failed callee is not recoverable from here yet: the failure
            // travels up with this call site attached to the reason chain.
            // TODO: revisit once recoverable nested calls are designed.
            let reason = result
                .revert_reason
                .ok_or(InternalError::MissingRevertReason)?;
            return Err(VMError::NestedCallFailed { callee, reason });
        }

        frame.memory.set(success_offset, MemoryValue::u1(true));
        frame.refund_gas(result.gas_left)?;

        frame.memory.assert_accesses(MemoryAccesses {
            reads: u64::from(calldata_size) + 4,
            writes: 1,
            indirect: addressing.indirect_count(),
        });
        Ok(OpcodeResult::Continue)
    }

    /// RETURN. Charges for the copy size up front, then hands the slice at
    /// `return_offset` to the context as its success output.
    pub fn op_return(
        &mut self,
        frame: &mut CallFrame,
        indirect: u8,
        return_offset: u8,
        copy_size: u16,
    ) -> Result<OpcodeResult, VMError> {
        frame.consume_gas(gas_cost::ret(copy_size.into()))?;

        let addressing = Addressing::from_wire(indirect, 1);
        let [return_offset] = addressing.resolve([return_offset.into()], &mut frame.memory)?;

        let output = frame.memory.get_slice(return_offset, copy_size.into())?;
        frame.output = output.iter().map(|word| word.value).collect();

        frame.memory.assert_accesses(MemoryAccesses {
            reads: u64::from(copy_size),
            writes: 0,
            indirect: addressing.indirect_count(),
        });
        Ok(OpcodeResult::Return)
    }

    /// REVERT. The output size lives in memory and must tag-check as
    /// `Uint32` before use; the slice at `return_offset` becomes the revert
    /// output.
    pub fn op_revert(
        &mut self,
        frame: &mut CallFrame,
        indirect: u8,
        return_offset: u16,
        ret_size_offset: u16,
    ) -> Result<OpcodeResult, VMError> {
        let addressing = Addressing::from_wire(indirect, 2);
        let [return_offset, ret_size_offset] = addressing.resolve(
            [return_offset.into(), ret_size_offset.into()],
            &mut frame.memory,
        )?;

        frame.memory.check_tag(MemoryTag::Uint32, ret_size_offset)?;
        let ret_size = frame.memory.get(ret_size_offset)?.value.low_u32();
        frame.consume_gas(gas_cost::revert(ret_size))?;

        let output = frame.memory.get_slice(return_offset, ret_size)?;
        frame.output = output.iter().map(|word| word.value).collect();

        frame.memory.assert_accesses(MemoryAccesses {
            reads: u64::from(ret_size) + 1,
            writes: 0,
            indirect: addressing.indirect_count(),
        });
        Ok(OpcodeResult::Revert)
    }

    /// Fetches the callee's bytecode and runs the child context to
    /// completion. A callee with no bytecode yields a reverted result that
    /// consumes the whole allocation; the attempt still gets its trace
    /// entry.
    fn run_nested(
        &mut self,
        env: Environment,
        allocated: Gas,
        calldata: &[U256],
        depth: u32,
    ) -> Result<(H256, CallResult), VMError> {
        let callee = env.address;
        match self.db.bytecode(callee)? {
            Some(bytecode) => {
                let id = bytecode.id;
                let mut child = CallFrame::new(env, allocated, calldata, bytecode, depth);
                let result = self.run(&mut child)?;
                Ok((id, result))
            }
            None => Ok((
                H256::zero(),
                CallResult::reverted(
                    Vec::new(),
                    Gas::ZERO,
                    RevertReason::new(format!("no bytecode at {callee}")),
                ),
            )),
        }
    }
}

/// Caps a requested gas field at the caller's remaining balance for that
/// dimension. Requesting more than is available truncates, it does not
/// fault.
fn cap_to_balance(requested: U256, balance: u64) -> u64 {
    if requested > U256::from(balance) {
        balance
    } else {
        requested.low_u64()
    }
}
