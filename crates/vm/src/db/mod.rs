use std::sync::Arc;

use ethereum_types::H256;
use rollvm_common::Address;
use rustc_hash::FxHashMap;

use crate::errors::DatabaseError;
use crate::opcodes::Instruction;

/// A contract's decoded program plus the identity the call trace reports
/// for it.
///
/// The identity is supplied by the store; committing to bytecode
/// cryptographically is the trace consumer's concern, not the engine's.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bytecode {
    pub id: H256,
    pub instructions: Vec<Instruction>,
}

impl Bytecode {
    pub fn new(id: H256, instructions: Vec<Instruction>) -> Self {
        Bytecode { id, instructions }
    }
}

/// The bytecode fetch boundary. How programs are stored, decoded or cached
/// is not the engine's concern; it only asks for the code behind an
/// address when a context for that address is created.
pub trait BytecodeProvider {
    fn bytecode(&self, address: Address) -> Result<Option<Arc<Bytecode>>, DatabaseError>;
}

/// Address-keyed store backed by a map. The standard provider for tests and
/// single-process embedding.
#[derive(Debug, Default)]
pub struct InMemoryBytecodes {
    contracts: FxHashMap<Address, Arc<Bytecode>>,
}

impl InMemoryBytecodes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: Address, bytecode: Bytecode) {
        self.contracts.insert(address, Arc::new(bytecode));
    }
}

impl BytecodeProvider for InMemoryBytecodes {
    fn bytecode(&self, address: Address) -> Result<Option<Arc<Bytecode>>, DatabaseError> {
        Ok(self.contracts.get(&address).cloned())
    }
}
