use rollvm_common::{Address, FunctionSelector};
use serde::Serialize;

use crate::constants::PUBLIC_DISPATCH_SELECTOR;
use crate::opcodes::CallKind;

/// Immutable facts of one execution context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Environment {
    /// Contract whose bytecode is executing.
    pub address: Address,
    /// Address that created this context.
    pub sender: Address,
    /// Selector the context was dispatched with.
    pub function_selector: FunctionSelector,
    /// Read-only context. Sticky: every descendant of a static context is
    /// static, whatever instruction created it.
    pub is_static_call: bool,
}

impl Environment {
    pub fn new(
        address: Address,
        sender: Address,
        function_selector: FunctionSelector,
        is_static_call: bool,
    ) -> Self {
        Environment {
            address,
            sender,
            function_selector,
            is_static_call,
        }
    }

    /// Environment of a nested call spawned by `kind`: the callee becomes
    /// the executing address, the current address becomes the sender, and
    /// nested calls always enter through the public dispatch selector.
    pub fn nested(&self, callee: Address, kind: CallKind) -> Environment {
        Environment {
            address: callee,
            sender: self.address,
            function_selector: PUBLIC_DISPATCH_SELECTOR,
            is_static_call: self.is_static_call || kind == CallKind::StaticCall,
        }
    }
}
