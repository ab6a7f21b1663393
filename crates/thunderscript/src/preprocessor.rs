//! The global-declaration pass: scans `#in`/`#ref` directives out of the
//! token stream before the statement compiler ever sees it.

use crate::error::CompileError;
use crate::pool::VariablePool;
use crate::script::{GlobalDescriptor, WriteMode};
use crate::token::{Token, TokenKind};
use crate::types::ValueType;

/// `preprocess`'s output: the directive-stripped token stream plus the
/// globals it registered, in declaration order.
pub struct Preprocessed {
    pub tokens: Vec<Token>,
    pub globals: Vec<GlobalDescriptor>,
}

/// Scans `tokens` for `# (in|ref) type IDENT` runs, registering each as a
/// pool-allocated global and removing the four tokens from the stream.
/// Any other `#...` sequence is a compile error.
pub fn preprocess(tokens: Vec<Token>, pool: &mut VariablePool) -> Result<Preprocessed, CompileError> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut globals = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        if !tokens[i].is_operator("#") {
            out.push(tokens[i].clone());
            i += 1;
            continue;
        }

        let line = tokens[i].line;
        let mode = match tokens.get(i + 1) {
            Some(t) if t.is_reserved("in") => WriteMode::In,
            Some(t) if t.is_reserved("ref") => WriteMode::Ref,
            _ => return Err(CompileError::new("UnknownPreprocessor: expected 'in' or 'ref' after '#'", line)),
        };

        let ty = match tokens.get(i + 2) {
            Some(t) if t.is_reserved("int") => ValueType::Int,
            Some(t) if t.is_reserved("float") => ValueType::Float,
            Some(t) if t.is_reserved("bool") => ValueType::Bool,
            _ => return Err(CompileError::new("UnknownPreprocessor: expected a type after 'in'/'ref'", line)),
        };

        let name = match tokens.get(i + 3) {
            Some(t) if t.kind == TokenKind::Identifier => t.lexeme.clone(),
            _ => return Err(CompileError::new("UnknownPreprocessor: expected an identifier", line)),
        };

        let constant = matches!(mode, WriteMode::In);
        let id = pool.request_var(ty, name.clone(), constant, false);
        globals.push(GlobalDescriptor { name, offset: pool.get(id).offset, ty, mode });

        i += 4;
    }

    Ok(Preprocessed { tokens: out, globals })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    #[test]
    fn registers_in_and_ref_globals_and_strips_directives() {
        let tokens = tokenize("#in int n #ref int r  r = n ;");
        let mut pool = VariablePool::new();
        pool.enter_scope();
        let result = preprocess(tokens, &mut pool).unwrap();

        assert_eq!(result.globals.len(), 2);
        assert_eq!(result.globals[0].name, "n");
        assert!(matches!(result.globals[0].mode, WriteMode::In));
        assert_eq!(result.globals[1].name, "r");
        assert!(matches!(result.globals[1].mode, WriteMode::Ref));

        let lexemes: Vec<&str> = result.tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["r", "=", "n", ";"]);
    }

    #[test]
    fn malformed_directive_is_an_error() {
        let tokens = tokenize("#foo int n ;");
        let mut pool = VariablePool::new();
        pool.enter_scope();
        assert!(preprocess(tokens, &mut pool).is_err());
    }

    #[test]
    fn in_global_is_constant() {
        let tokens = tokenize("#in int n ;");
        let mut pool = VariablePool::new();
        pool.enter_scope();
        let result = preprocess(tokens, &mut pool).unwrap();
        let id = pool.lookup("n").unwrap();
        assert!(pool.get(id).constant);
    }
}
