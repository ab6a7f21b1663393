//! Bytecode representation: the opcode set, a builder for emitting
//! instructions with patchable jump targets, and a disassembler.
//!
//! # Module structure
//!
//! - `op` — the `Opcode` enum and its one-byte encoding
//! - `builder` — `CodeBuilder`, the typed instruction serializer
//! - `disasm` — a read-only pretty-printer over an instruction stream

pub mod builder;
pub mod disasm;
mod op;

pub use builder::CodeBuilder;
pub use op::Opcode;
