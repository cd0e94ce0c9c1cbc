use rollvm_common::FunctionSelector;

/// Memory offsets are 32 bits wide, giving each context this many slots.
pub const MEMORY_SLOTS: u64 = 1 << 32;

/// Every nested call enters the callee through its public dispatch entry
/// point, which routes on calldata rather than on the selector itself.
pub const PUBLIC_DISPATCH_SELECTOR: FunctionSelector = FunctionSelector::new(0xd5441b0d);
