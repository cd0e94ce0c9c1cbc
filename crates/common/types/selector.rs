use serde::{Deserialize, Serialize};
use std::fmt;

/// A function selector as carried in the execution environment.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FunctionSelector(pub u32);

impl FunctionSelector {
    pub const fn new(value: u32) -> Self {
        FunctionSelector(value)
    }
}

impl fmt::Display for FunctionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
