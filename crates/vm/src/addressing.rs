use crate::errors::VMError;
use crate::memory::TaggedMemory;

/// Decoded indirect-addressing bitmask of one instruction.
///
/// Bit `i` set means operand `i` holds a pointer to the real offset rather
/// than the offset itself. The wire field is one byte, so an instruction can
/// flag at most eight operands.
#[derive(Debug, Clone, Copy)]
pub struct Addressing {
    bits: u8,
    operand_count: usize,
}

impl Addressing {
    pub fn from_wire(bits: u8, operand_count: usize) -> Self {
        debug_assert!(
            operand_count <= 8,
            "indirect bitmask only covers eight operands"
        );
        Addressing {
            bits,
            operand_count,
        }
    }

    /// Number of operands flagged indirect, for footprint accounting.
    pub fn indirect_count(&self) -> u64 {
        let mask = if self.operand_count >= 8 {
            u8::MAX
        } else {
            (1u8 << self.operand_count) - 1
        };
        u64::from((self.bits & mask).count_ones())
    }

    /// Resolves every operand to its final memory offset, in order.
    ///
    /// Direct operands pass through unchanged. A flagged operand's slot must
    /// hold a `Uint32` pointer; its value becomes the resolved offset.
    pub fn resolve<const N: usize>(
        &self,
        operands: [u32; N],
        memory: &mut TaggedMemory,
    ) -> Result<[u32; N], VMError> {
        debug_assert_eq!(N, self.operand_count, "operand count mismatch");
        let mut resolved = operands;
        for (i, offset) in resolved.iter_mut().enumerate() {
            if self.bits & (1u8 << i) != 0 {
                *offset = memory.load_pointer(*offset)?;
            }
        }
        Ok(resolved)
    }
}
