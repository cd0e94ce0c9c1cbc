use crate::memory::MemoryTag;
use ethereum_types::U256;
use rollvm_common::{Address, Gas, GasDimension};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Faults that terminate the current execution context.
///
/// A fault is fatal to its context, never retried: the driver burns the
/// remaining gas and reports a faulted result to the caller, whose merge
/// step discards the context's pending effects. The `Database` and
/// `Internal` variants are different: they indicate infrastructure or engine
/// defects and propagate out of the simulation instead of faulting a
/// context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VMError {
    #[error("tag mismatch at memory offset {offset}: expected {expected}, found {found}")]
    TagMismatch {
        offset: u32,
        expected: MemoryTag,
        found: MemoryTag,
    },
    #[error("read of unset memory at offset {offset}")]
    UnsetMemory { offset: u32 },
    #[error("memory range [{offset}, {offset}+{len}) is out of bounds")]
    MemoryOutOfBounds { offset: u32, len: u32 },
    #[error("out of {dimension} gas")]
    OutOfGas { dimension: GasDimension },
    #[error("invalid program counter {pc}")]
    InvalidProgramCounter { pc: u32 },
    #[error("state alteration attempted in a static context")]
    StaticStateAlteration,
    #[error("nested call to {callee} failed: {reason}")]
    NestedCallFailed { callee: Address, reason: RevertReason },
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl VMError {
    /// True for errors that abort the whole simulation rather than fault the
    /// current context.
    pub fn should_propagate(&self) -> bool {
        matches!(self, VMError::Database(_) | VMError::Internal(_))
    }

    /// Renders this fault as a revert-reason chain for result and trace
    /// reporting. A rethrown nested failure keeps the callee's chain intact
    /// underneath the call-site attribution.
    pub fn to_revert_reason(&self) -> RevertReason {
        match self {
            VMError::NestedCallFailed { callee, reason } => RevertReason::with_cause(
                format!("nested call to {callee} failed"),
                reason.clone(),
            ),
            other => RevertReason::new(other.to_string()),
        }
    }
}

/// Failure at the bytecode store boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("bytecode store failure: {0}")]
pub struct DatabaseError(pub String);

/// Defects in the engine itself. Never expected during correct operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalError {
    #[error("a reverted nested call carried no revert reason")]
    MissingRevertReason,
    #[error("gas counter overflow on refund")]
    RefundOverflow,
    #[error("program counter overflow")]
    PcOverflow,
    #[error("journal scope closed with no open checkpoint")]
    NoOpenCheckpoint,
    #[error("memory slice has unexpected length")]
    UnexpectedSliceLength,
}

/// One cause in a leaf-to-root failure chain.
///
/// Each nested call that rethrows a failure wraps the callee's reason with
/// its own attribution, so `Display` renders the whole chain down to the
/// original cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevertReason {
    pub message: String,
    pub cause: Option<Box<RevertReason>>,
}

impl RevertReason {
    pub fn new(message: impl Into<String>) -> Self {
        RevertReason {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(message: impl Into<String>, cause: RevertReason) -> Self {
        RevertReason {
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// The leaf-most message of the chain.
    pub fn root_cause(&self) -> &str {
        let mut reason = self;
        while let Some(cause) = &reason.cause {
            reason = cause;
        }
        &reason.message
    }
}

impl fmt::Display for RevertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RevertReason {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

/// Control-flow outcome of a single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeResult {
    /// Advance the program counter and keep running.
    Continue,
    /// Halt the context; the frame's output buffer is the success output.
    Return,
    /// Halt the context; the frame's output buffer is the revert output.
    Revert,
}

/// Terminal state of a completed execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CallOutcome {
    /// Halted through RETURN.
    Return,
    /// Halted through a deliberate REVERT.
    Revert,
    /// Terminated by a fault: out of gas, tag mismatch, bad program counter.
    Fault,
}

/// Result of running one execution context to completion.
#[derive(Debug, Clone, Serialize)]
pub struct CallResult {
    pub outcome: CallOutcome,
    pub output: Vec<U256>,
    pub gas_left: Gas,
    /// Present whenever `outcome` is not `Return`.
    pub revert_reason: Option<RevertReason>,
}

impl CallResult {
    pub fn returned(output: Vec<U256>, gas_left: Gas) -> Self {
        CallResult {
            outcome: CallOutcome::Return,
            output,
            gas_left,
            revert_reason: None,
        }
    }

    pub fn reverted(output: Vec<U256>, gas_left: Gas, reason: RevertReason) -> Self {
        CallResult {
            outcome: CallOutcome::Revert,
            output,
            gas_left,
            revert_reason: Some(reason),
        }
    }

    /// A fault consumes whatever gas the context had left.
    pub fn faulted(error: &VMError) -> Self {
        CallResult {
            outcome: CallOutcome::Fault,
            output: Vec::new(),
            gas_left: Gas::ZERO,
            revert_reason: Some(error.to_revert_reason()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, CallOutcome::Return)
    }
}
