//! # rollvm-vm
//!
//! Execution engine for public contract bytecode on a rollup.
//!
//! The VM interprets decoded instructions over a word-addressed memory in
//! which every slot carries a runtime type tag, meters execution gas and
//! data-availability gas as two independent dimensions, and supports
//! synchronous nested contract calls whose side effects are committed or
//! discarded atomically with the callee's outcome. Every attempted nested
//! call is recorded, in program order, in a journal consumed by downstream
//! proof generation.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                          VM                              │
//! │  ┌─────────────┐  ┌──────────────┐  ┌────────────────┐  │
//! │  │  CallFrame  │  │ TaggedMemory │  │  Environment   │  │
//! │  └─────────────┘  └──────────────┘  └────────────────┘  │
//! │                                                          │
//! │  ┌─────────────┐  ┌──────────────┐                      │
//! │  │   Journal   │  │  Addressing  │                      │
//! │  └─────────────┘  └──────────────┘                      │
//! └──────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                    BytecodeProvider                      │
//! │              (decoded programs, per address)             │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Core types
//!
//! - [`vm::VM`]: the fetch/decode/execute driver
//! - [`call_frame::CallFrame`]: one execution context (memory, gas, pc)
//! - [`memory::TaggedMemory`]: tag-checked, bounds-checked word memory
//! - [`journal::Journal`]: staged side effects plus the nested-call trace
//! - [`db::BytecodeProvider`]: the bytecode fetch boundary
//!
//! Execution is single threaded and strictly call-stack structured: one
//! context steps at a time, a nested call runs to completion before its
//! caller resumes, and the journal is only ever appended to by the context
//! currently executing.

pub mod addressing;
pub mod call_frame;
pub mod constants;
pub mod db;
pub mod environment;
pub mod errors;
pub mod gas_cost;
pub mod journal;
pub mod memory;
pub mod opcode_handlers;
pub mod opcodes;
pub mod vm;

pub use environment::*;
