#![doc = include_str!("../../../README.md")]

mod buffer;
mod bytecode;
mod compiler;
mod error;
mod expr;
mod intern;
mod lexer;
mod pool;
mod preprocessor;
mod runtime;
mod script;
mod stmt;
mod token;
mod types;
mod vm;

pub use crate::{
    bytecode::disasm::{Instruction, disassemble, format_listing},
    compiler::Compiler,
    error::{CompileError, HostError, RuntimeError},
    runtime::{GlobalValue, Runtime},
    script::{Context, GlobalDescriptor, Script, WriteMode},
    types::ValueType,
};
