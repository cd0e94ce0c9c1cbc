use ethereum_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A contract address.
///
/// Addresses on this rollup are field elements, not 20-byte hashes, so the
/// full word width is kept. Instructions move addresses through memory as
/// `Field`-tagged words.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Address(pub U256);

impl Address {
    pub fn from_field(value: U256) -> Self {
        Address(value)
    }

    pub fn from_u64(value: u64) -> Self {
        Address(U256::from(value))
    }

    pub fn as_field(&self) -> U256 {
        self.0
    }
}

impl From<U256> for Address {
    fn from(value: U256) -> Self {
        Address(value)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
