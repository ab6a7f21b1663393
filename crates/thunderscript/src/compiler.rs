//! The host-facing compiler entry point: reads a source file and appends a
//! compiled `Script` to a `Context`.

use std::path::Path;

use crate::bytecode::CodeBuilder;
use crate::error::HostError;
use crate::intern::intern_constants;
use crate::lexer::tokenize;
use crate::pool::VariablePool;
use crate::preprocessor::preprocess;
use crate::script::{Context, Script};
use crate::stmt::compile_statements;

/// Stateless entry point: `compile` reads, tokenizes, preprocesses, interns,
/// and compiles one file, appending the result to `ctx`.
///
/// `spec.md`'s host API describes `compile(path, context) -> bool`; this
/// returns the appended script's index instead of a bare success flag,
/// carrying both the richer error (via `Result`) and the handle `LoadScript`
/// needs without a separate lookup.
#[derive(Debug, Default, Clone, Copy)]
pub struct Compiler;

impl Compiler {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    pub fn compile(self, path: impl AsRef<Path>, ctx: &mut Context) -> Result<usize, HostError> {
        let path = path.as_ref();
        let source =
            std::fs::read_to_string(path).map_err(|_| HostError::FileNotFound(path.display().to_string()))?;

        let tokens = tokenize(&source);

        let mut pool = VariablePool::new();
        pool.enter_scope();

        let preprocessed = preprocess(tokens, &mut pool)?;

        let mut builder = CodeBuilder::new();
        let body_tokens = intern_constants(preprocessed.tokens, &mut pool, &mut builder);
        builder.emit_end(); // marks the end of the initialization prologue

        compile_statements(&body_tokens, &mut pool, &mut builder)?;

        let script =
            Script { code: builder.finish(), globals: preprocessed.globals, stack_size: pool.total_bytes() };
        Ok(ctx.push(script))
    }
}
