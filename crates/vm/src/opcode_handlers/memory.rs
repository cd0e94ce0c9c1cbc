//! # Memory operations
//!
//! Includes the following opcodes:
//!   - `SET`

use ethereum_types::U256;

use crate::{
    addressing::Addressing,
    call_frame::CallFrame,
    errors::{OpcodeResult, VMError},
    gas_cost,
    memory::{MemoryAccesses, MemoryTag, MemoryValue},
    vm::VM,
};

impl<'a> VM<'a> {
    /// SET. Writes an immediate into memory under the given tag, truncating
    /// the value to the tag's width.
    pub fn op_set(
        &mut self,
        frame: &mut CallFrame,
        indirect: u8,
        tag: MemoryTag,
        value: U256,
        dst_offset: u16,
    ) -> Result<OpcodeResult, VMError> {
        frame.consume_gas(gas_cost::set())?;

        let addressing = Addressing::from_wire(indirect, 1);
        let [dst_offset] = addressing.resolve([dst_offset.into()], &mut frame.memory)?;

        frame
            .memory
            .set(dst_offset, MemoryValue::truncating(tag, value));

        frame.memory.assert_accesses(MemoryAccesses {
            reads: 0,
            writes: 1,
            indirect: addressing.indirect_count(),
        });
        Ok(OpcodeResult::Continue)
    }
}
