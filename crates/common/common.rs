//! Shared domain types of the rollup VM: contract addresses, function
//! selectors and the two-dimensional gas amount used for costs, balances,
//! allocations and refunds alike.

pub mod types;

pub use types::address::Address;
pub use types::gas::{Gas, GasDimension};
pub use types::selector::FunctionSelector;
