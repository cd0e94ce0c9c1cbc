use crate::memory::MemoryTag;
use ethereum_types::U256;
use strum::EnumString;

/// Instruction-set opcodes, one per wire encoding. Values are part of the
/// versioned wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, strum::Display)]
pub enum Opcode {
    SET = 0x33,
    CALL = 0x34,
    STATICCALL = 0x35,
    RETURN = 0x36,
    REVERT8 = 0x37,
    REVERT16 = 0x38,
}

/// Distinguishes the two call instructions. The kind only selects the
/// child's static flag; everything else about a call is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Call,
    StaticCall,
}

impl CallKind {
    pub fn opcode(self) -> Opcode {
        match self {
            CallKind::Call => Opcode::CALL,
            CallKind::StaticCall => Opcode::STATICCALL,
        }
    }
}

/// Width of one wire operand field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandWidth {
    U8,
    U16,
    /// A full field-element immediate.
    Field,
}

impl OperandWidth {
    pub const fn size_in_bytes(self) -> usize {
        match self {
            OperandWidth::U8 => 1,
            OperandWidth::U16 => 2,
            OperandWidth::Field => 32,
        }
    }
}

// Decoding descriptors: the typed operand fields that follow each opcode
// byte on the wire. Kept in one arena so decoders look descriptors up by
// opcode instead of carrying per-instruction metadata.
const SET_FORMAT: &[OperandWidth] = &[
    OperandWidth::U8,
    OperandWidth::U8,
    OperandWidth::Field,
    OperandWidth::U16,
];
const EXTERNAL_CALL_FORMAT: &[OperandWidth] = &[
    OperandWidth::U8,
    OperandWidth::U16,
    OperandWidth::U16,
    OperandWidth::U16,
    OperandWidth::U16,
    OperandWidth::U16,
];
const RETURN_FORMAT: &[OperandWidth] = &[OperandWidth::U8, OperandWidth::U8, OperandWidth::U16];
const REVERT8_FORMAT: &[OperandWidth] = &[OperandWidth::U8, OperandWidth::U8, OperandWidth::U8];
const REVERT16_FORMAT: &[OperandWidth] = &[OperandWidth::U8, OperandWidth::U16, OperandWidth::U16];

static WIRE_FORMATS: [&[OperandWidth]; 6] = [
    SET_FORMAT,
    EXTERNAL_CALL_FORMAT,
    EXTERNAL_CALL_FORMAT,
    RETURN_FORMAT,
    REVERT8_FORMAT,
    REVERT16_FORMAT,
];

impl Opcode {
    const fn descriptor_index(self) -> usize {
        match self {
            Opcode::SET => 0,
            Opcode::CALL => 1,
            Opcode::STATICCALL => 2,
            Opcode::RETURN => 3,
            Opcode::REVERT8 => 4,
            Opcode::REVERT16 => 5,
        }
    }

    /// Operand fields following the opcode byte, for external decoders.
    pub fn wire_format(self) -> &'static [OperandWidth] {
        WIRE_FORMATS[self.descriptor_index()]
    }

    /// Encoded instruction size: the opcode byte plus its operand fields.
    pub fn encoded_size(self) -> usize {
        1 + self
            .wire_format()
            .iter()
            .map(|width| width.size_in_bytes())
            .sum::<usize>()
    }
}

/// A decoded instruction with typed operands at wire widths.
///
/// Offsets address memory directly unless flagged in the instruction's
/// indirect bitmask, in which case the slot holds a pointer to the real
/// offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Writes an immediate into memory under the given tag.
    Set {
        indirect: u8,
        tag: MemoryTag,
        value: U256,
        dst_offset: u16,
    },
    Call {
        indirect: u8,
        gas_offset: u16,
        addr_offset: u16,
        args_offset: u16,
        args_size_offset: u16,
        success_offset: u16,
    },
    StaticCall {
        indirect: u8,
        gas_offset: u16,
        addr_offset: u16,
        args_offset: u16,
        args_size_offset: u16,
        success_offset: u16,
    },
    Return {
        indirect: u8,
        return_offset: u8,
        copy_size: u16,
    },
    /// Decoded form of both revert encodings; the narrow encoding widens on
    /// decode.
    Revert {
        indirect: u8,
        return_offset: u16,
        ret_size_offset: u16,
    },
}

impl Instruction {
    /// Canonical opcode. `Revert` reports the wide encoding.
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Set { .. } => Opcode::SET,
            Instruction::Call { .. } => Opcode::CALL,
            Instruction::StaticCall { .. } => Opcode::STATICCALL,
            Instruction::Return { .. } => Opcode::RETURN,
            Instruction::Revert { .. } => Opcode::REVERT16,
        }
    }
}
