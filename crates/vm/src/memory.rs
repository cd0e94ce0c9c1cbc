use crate::constants::MEMORY_SLOTS;
use crate::errors::VMError;
use ethereum_types::U256;
use rustc_hash::FxHashMap;
use std::fmt;

/// Runtime type tag carried by every memory word.
///
/// `Uint32` doubles as the pointer type: indirect operands must dereference
/// through a `Uint32`-tagged slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryTag {
    Field,
    Uint1,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uint128,
}

impl MemoryTag {
    /// Width of the tag's value range. `Field` words span the full word.
    pub fn bit_width(self) -> Option<u32> {
        match self {
            MemoryTag::Field => None,
            MemoryTag::Uint1 => Some(1),
            MemoryTag::Uint8 => Some(8),
            MemoryTag::Uint16 => Some(16),
            MemoryTag::Uint32 => Some(32),
            MemoryTag::Uint64 => Some(64),
            MemoryTag::Uint128 => Some(128),
        }
    }
}

impl fmt::Display for MemoryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MemoryTag::Field => "FIELD",
            MemoryTag::Uint1 => "UINT1",
            MemoryTag::Uint8 => "UINT8",
            MemoryTag::Uint16 => "UINT16",
            MemoryTag::Uint32 => "UINT32",
            MemoryTag::Uint64 => "UINT64",
            MemoryTag::Uint128 => "UINT128",
        };
        write!(f, "{name}")
    }
}

/// A memory word: a value plus its tag.
///
/// Invariant: the value always fits the tag's width. Constructors truncate,
/// so a `Uint32`-tagged word can be read back with `low_u32` losslessly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryValue {
    pub value: U256,
    pub tag: MemoryTag,
}

impl MemoryValue {
    /// Tags `value` with `tag`, truncating it to the tag's width.
    pub fn truncating(tag: MemoryTag, value: U256) -> Self {
        let value = match tag.bit_width() {
            None => value,
            Some(bits) => value & ((U256::one() << bits) - 1),
        };
        MemoryValue { value, tag }
    }

    pub fn field(value: U256) -> Self {
        MemoryValue {
            value,
            tag: MemoryTag::Field,
        }
    }

    pub fn u1(value: bool) -> Self {
        MemoryValue {
            value: if value { U256::one() } else { U256::zero() },
            tag: MemoryTag::Uint1,
        }
    }

    pub fn u8(value: u8) -> Self {
        MemoryValue {
            value: U256::from(value),
            tag: MemoryTag::Uint8,
        }
    }

    pub fn u16(value: u16) -> Self {
        MemoryValue {
            value: U256::from(value),
            tag: MemoryTag::Uint16,
        }
    }

    pub fn u32(value: u32) -> Self {
        MemoryValue {
            value: U256::from(value),
            tag: MemoryTag::Uint32,
        }
    }

    pub fn u64(value: u64) -> Self {
        MemoryValue {
            value: U256::from(value),
            tag: MemoryTag::Uint64,
        }
    }

    pub fn u128(value: u128) -> Self {
        MemoryValue {
            value: U256::from(value),
            tag: MemoryTag::Uint128,
        }
    }
}

/// Access footprint an instruction declares at the end of its execution,
/// checked against the counts the memory actually saw. Dynamic gas is
/// charged from these declared counts, so a mismatch means the charge was
/// wrong too.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryAccesses {
    pub reads: u64,
    pub writes: u64,
    /// Indirect-pointer dereferences performed by addressing resolution.
    pub indirect: u64,
}

/// Word memory of one execution context.
///
/// Slots are sparse: reading an offset that was never written is an error,
/// not a zero. Reads, writes and pointer dereferences are counted per
/// instruction so each instruction can declare its exact footprint.
#[derive(Debug, Default)]
pub struct TaggedMemory {
    slots: FxHashMap<u32, MemoryValue>,
    accesses: MemoryAccesses,
}

impl TaggedMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Memory of a fresh context: the calldata slice laid out as
    /// `Field`-tagged words from offset zero. Population is part of context
    /// creation and does not count toward any instruction's footprint.
    pub fn with_calldata(calldata: &[U256]) -> Self {
        let mut slots = FxHashMap::default();
        for (offset, value) in calldata.iter().enumerate() {
            slots.insert(offset as u32, MemoryValue::field(*value));
        }
        TaggedMemory {
            slots,
            accesses: MemoryAccesses::default(),
        }
    }

    /// Reads one word. Fails if the slot was never set.
    pub fn get(&mut self, offset: u32) -> Result<MemoryValue, VMError> {
        self.accesses.reads += 1;
        self.slots
            .get(&offset)
            .copied()
            .ok_or(VMError::UnsetMemory { offset })
    }

    /// Writes one word, overwriting unconditionally.
    pub fn set(&mut self, offset: u32, value: MemoryValue) {
        self.accesses.writes += 1;
        self.slots.insert(offset, value);
    }

    /// Reads `len` consecutive words. Fails if the range leaves the address
    /// space or any slot in it is unset.
    pub fn get_slice(&mut self, offset: u32, len: u32) -> Result<Vec<MemoryValue>, VMError> {
        self.check_bounds(offset, len)?;
        self.accesses.reads += u64::from(len);
        let mut words = Vec::with_capacity(len as usize);
        for i in 0..len {
            let slot = offset + i;
            words.push(
                self.slots
                    .get(&slot)
                    .copied()
                    .ok_or(VMError::UnsetMemory { offset: slot })?,
            );
        }
        Ok(words)
    }

    /// Fails with a tag mismatch unless the slot holds `tag`.
    pub fn check_tag(&self, tag: MemoryTag, offset: u32) -> Result<(), VMError> {
        let found = self
            .slots
            .get(&offset)
            .map(|word| word.tag)
            .ok_or(VMError::UnsetMemory { offset })?;
        if found == tag {
            Ok(())
        } else {
            Err(VMError::TagMismatch {
                offset,
                expected: tag,
                found,
            })
        }
    }

    /// Checks `len` consecutive slots against `tag`.
    pub fn check_tags_range(&self, tag: MemoryTag, offset: u32, len: u32) -> Result<(), VMError> {
        self.check_bounds(offset, len)?;
        for i in 0..len {
            self.check_tag(tag, offset + i)?;
        }
        Ok(())
    }

    /// Dereferences an indirect operand: the slot must hold a `Uint32`
    /// pointer whose value is the resolved offset.
    pub fn load_pointer(&mut self, offset: u32) -> Result<u32, VMError> {
        self.check_tag(MemoryTag::Uint32, offset)?;
        self.accesses.indirect += 1;
        let word = self
            .slots
            .get(&offset)
            .copied()
            .ok_or(VMError::UnsetMemory { offset })?;
        Ok(word.value.low_u32())
    }

    /// Declares the instruction's access footprint and resets the counters.
    ///
    /// A mismatch between the declared and observed counts is a defect in
    /// the instruction's implementation, not a runtime condition, and aborts
    /// execution.
    pub fn assert_accesses(&mut self, declared: MemoryAccesses) {
        let observed = std::mem::take(&mut self.accesses);
        assert_eq!(
            observed, declared,
            "instruction declared a wrong memory access footprint"
        );
    }

    /// Observed counts since the last footprint declaration.
    pub fn accesses(&self) -> MemoryAccesses {
        self.accesses
    }

    fn check_bounds(&self, offset: u32, len: u32) -> Result<(), VMError> {
        if u64::from(offset) + u64::from(len) > MEMORY_SLOTS {
            return Err(VMError::MemoryOutOfBounds { offset, len });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_of_unset_slot_fails() {
        let mut memory = TaggedMemory::new();
        assert_eq!(memory.get(3), Err(VMError::UnsetMemory { offset: 3 }));
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut memory = TaggedMemory::new();
        memory.set(7, MemoryValue::u32(11));
        assert_eq!(memory.get(7), Ok(MemoryValue::u32(11)));
    }

    #[test]
    fn set_overwrites_tag_and_value() {
        let mut memory = TaggedMemory::new();
        memory.set(0, MemoryValue::field(U256::from(1)));
        memory.set(0, MemoryValue::u1(true));
        assert_eq!(memory.get(0), Ok(MemoryValue::u1(true)));
    }

    #[test]
    fn get_slice_fails_on_any_unset_slot() {
        let mut memory = TaggedMemory::new();
        memory.set(0, MemoryValue::field(U256::from(1)));
        memory.set(2, MemoryValue::field(U256::from(3)));
        assert_eq!(
            memory.get_slice(0, 3),
            Err(VMError::UnsetMemory { offset: 1 })
        );
    }

    #[test]
    fn get_slice_fails_past_the_address_space() {
        let mut memory = TaggedMemory::new();
        assert_eq!(
            memory.get_slice(u32::MAX, 2),
            Err(VMError::MemoryOutOfBounds {
                offset: u32::MAX,
                len: 2
            })
        );
    }

    #[test]
    fn check_tag_reports_expected_and_found() {
        let mut memory = TaggedMemory::new();
        memory.set(5, MemoryValue::field(U256::from(9)));
        assert_eq!(
            memory.check_tag(MemoryTag::Uint32, 5),
            Err(VMError::TagMismatch {
                offset: 5,
                expected: MemoryTag::Uint32,
                found: MemoryTag::Field,
            })
        );
        assert_eq!(memory.check_tag(MemoryTag::Field, 5), Ok(()));
    }

    #[test]
    fn check_tags_range_covers_every_slot() {
        let mut memory = TaggedMemory::new();
        memory.set(0, MemoryValue::field(U256::from(1)));
        memory.set(1, MemoryValue::u32(2));
        assert!(memory.check_tags_range(MemoryTag::Field, 0, 2).is_err());
        assert!(memory.check_tags_range(MemoryTag::Field, 0, 1).is_ok());
    }

    #[test]
    fn zero_length_range_checks_nothing() {
        let memory = TaggedMemory::new();
        assert_eq!(memory.check_tags_range(MemoryTag::Field, 1000, 0), Ok(()));
    }

    #[test]
    fn load_pointer_requires_uint32() {
        let mut memory = TaggedMemory::new();
        memory.set(0, MemoryValue::field(U256::from(4)));
        assert!(matches!(
            memory.load_pointer(0),
            Err(VMError::TagMismatch { .. })
        ));
        memory.set(1, MemoryValue::u32(4));
        assert_eq!(memory.load_pointer(1), Ok(4));
    }

    #[test]
    fn truncating_narrows_to_the_tag_width() {
        let wide = U256::from(0x1ff);
        assert_eq!(
            MemoryValue::truncating(MemoryTag::Uint8, wide).value,
            U256::from(0xff)
        );
        assert_eq!(
            MemoryValue::truncating(MemoryTag::Field, wide).value,
            wide
        );
        assert_eq!(
            MemoryValue::truncating(MemoryTag::Uint1, wide).value,
            U256::one()
        );
    }

    #[test]
    fn calldata_population_is_field_tagged_and_unmetered() {
        let mut memory = TaggedMemory::with_calldata(&[U256::from(5), U256::from(6)]);
        assert_eq!(memory.accesses(), MemoryAccesses::default());
        assert_eq!(memory.check_tag(MemoryTag::Field, 1), Ok(()));
        assert_eq!(memory.get(0), Ok(MemoryValue::field(U256::from(5))));
    }

    #[test]
    fn accesses_are_counted_per_kind() {
        let mut memory = TaggedMemory::new();
        memory.set(0, MemoryValue::u32(9));
        memory.set(9, MemoryValue::field(U256::from(1)));
        let _ = memory.load_pointer(0);
        let _ = memory.get(9);
        assert_eq!(
            memory.accesses(),
            MemoryAccesses {
                reads: 1,
                writes: 2,
                indirect: 1
            }
        );
    }

    #[test]
    fn matching_footprint_declaration_resets_counters() {
        let mut memory = TaggedMemory::new();
        memory.set(0, MemoryValue::field(U256::from(1)));
        memory.assert_accesses(MemoryAccesses {
            reads: 0,
            writes: 1,
            indirect: 0,
        });
        assert_eq!(memory.accesses(), MemoryAccesses::default());
    }

    #[test]
    #[should_panic(expected = "memory access footprint")]
    fn wrong_footprint_declaration_is_a_defect() {
        let mut memory = TaggedMemory::new();
        memory.set(0, MemoryValue::field(U256::from(1)));
        memory.assert_accesses(MemoryAccesses {
            reads: 1,
            writes: 1,
            indirect: 0,
        });
    }
}
