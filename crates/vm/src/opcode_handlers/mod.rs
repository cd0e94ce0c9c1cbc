//! Instruction execution logic.
//!
//! Only the control-transfer subset of the instruction set is implemented:
//! the two call instructions, the two terminal instructions and SET to seed
//! memory. Further opcodes follow the same pattern: resolve addressing,
//! check tags, meter gas, touch memory, declare the access footprint.

pub mod memory;
pub mod system;
