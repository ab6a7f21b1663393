//! Error types for every pipeline stage, kept distinct rather than flattened
//! into one string so callers can handle parse/compile/runtime/host failures
//! accurately without matching on message text.

use std::fmt;

/// A failure raised while lexing, preprocessing, building the expression
/// tree, or emitting bytecode. Always carries the source line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub message: String,
    pub line: u32,
}

impl CompileError {
    pub fn new(message: impl Into<String>, line: u32) -> Self {
        Self { message: message.into(), line }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for CompileError {}

/// A failure raised by the virtual machine while executing bytecode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeError {
    /// `code[ip]` did not decode to a known opcode.
    BadOpcode { ip: usize, byte: u8 },
    /// A typed access fell outside `[0, size)` of the stack buffer.
    StackOutOfBounds { offset: usize, len: usize, size: usize },
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadOpcode { ip, byte } => write!(f, "bad opcode 0x{byte:02x} at ip {ip}"),
            Self::StackOutOfBounds { offset, len, size } => {
                write!(f, "stack access [{offset}, {}) out of bounds for stack of size {size}", offset + len)
            }
        }
    }
}

impl std::error::Error for RuntimeError {}

/// A failure at the host-interface boundary: reading a file, loading a
/// script, or reading/writing a named global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    FileNotFound(String),
    UnknownScript(usize),
    /// `SetGlobal`/`GetGlobal`/`Run` called before any `LoadScript`. `spec.md`
    /// §5 states `LoadScript` must precede these as a precondition; this
    /// implementation enforces it with an error rather than leaving it UB.
    NoScriptLoaded,
    UnknownGlobal(String),
    /// The host called `set_global`/`get_global` with a Rust type that does
    /// not match the global's declared `ValueType`. The spec leaves this
    /// undefined behavior; this implementation rejects it as an error
    /// instead, which is the idiomatic Rust choice.
    GlobalTypeMismatch { name: String },
    Compile(CompileError),
    Runtime(RuntimeError),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileNotFound(path) => write!(f, "file not found: {path}"),
            Self::UnknownScript(index) => write!(f, "no script at index {index}"),
            Self::NoScriptLoaded => write!(f, "no script is currently loaded"),
            Self::UnknownGlobal(name) => write!(f, "no global named '{name}'"),
            Self::GlobalTypeMismatch { name } => write!(f, "type mismatch accessing global '{name}'"),
            Self::Compile(error) => write!(f, "{error}"),
            Self::Runtime(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for HostError {}

impl From<CompileError> for HostError {
    fn from(error: CompileError) -> Self {
        Self::Compile(error)
    }
}

impl From<RuntimeError> for HostError {
    fn from(error: RuntimeError) -> Self {
        Self::Runtime(error)
    }
}
