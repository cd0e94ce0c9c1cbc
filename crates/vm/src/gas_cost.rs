//! Gas costs of the instruction set.
//!
//! Execution (l2) gas is a fixed base per instruction plus a linear term in
//! the number of words the instruction declares it touched; the per-word
//! term must match the declared access footprint, not the nominal operand
//! count. None of these instructions publish data, so their da dimension is
//! zero; it is still debited through the same two-dimensional path.

use rollvm_common::Gas;

// Base execution cost per instruction.
pub const SET_BASE: u64 = 10;
pub const CALL_BASE: u64 = 45;
pub const STATICCALL_BASE: u64 = 45;
pub const RETURN_BASE: u64 = 10;
pub const REVERT_BASE: u64 = 10;

/// Execution cost per word read or written by a dynamic-size instruction.
pub const WORD_COST: u64 = 3;

pub fn set() -> Gas {
    Gas::new(SET_BASE, 0)
}

pub fn call(calldata_words: u32) -> Gas {
    dynamic(CALL_BASE, calldata_words)
}

pub fn staticcall(calldata_words: u32) -> Gas {
    dynamic(STATICCALL_BASE, calldata_words)
}

pub fn ret(copy_words: u32) -> Gas {
    dynamic(RETURN_BASE, copy_words)
}

pub fn revert(ret_words: u32) -> Gas {
    dynamic(REVERT_BASE, ret_words)
}

fn dynamic(base: u64, words: u32) -> Gas {
    Gas::new(
        base.saturating_add(WORD_COST.saturating_mul(u64::from(words))),
        0,
    )
}
