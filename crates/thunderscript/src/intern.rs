//! Constant interning: literal tokens become `LOAD`-initialized pool
//! constants before statement compilation ever runs, so the expression
//! builder can treat `1`, `2.5`, and `true` exactly like any other
//! identifier it looks up in the pool.

use indexmap::IndexMap;

use crate::bytecode::CodeBuilder;
use crate::pool::{VarId, VariablePool};
use crate::token::{Token, TokenKind};
use crate::types::ValueType;

enum Literal {
    Int(i32),
    Float(f32),
    Bool(bool),
}

impl Literal {
    fn parse_numeric(lexeme: &str) -> Option<Self> {
        if lexeme.contains('.') {
            lexeme.parse::<f32>().ok().map(Literal::Float)
        } else {
            lexeme.parse::<i32>().ok().map(Literal::Int)
        }
    }

    fn ty(&self) -> ValueType {
        match self {
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::Bool(_) => ValueType::Bool,
        }
    }

    /// The deduplication key, which doubles as the rewritten token lexeme
    /// the rest of the compiler looks the constant up by.
    fn intern_key(&self) -> String {
        match self {
            Self::Int(v) => format!("const int {v}"),
            Self::Float(v) => format!("const float {v}"),
            Self::Bool(true) => "const true".to_string(),
            Self::Bool(false) => "const false".to_string(),
        }
    }

    fn emit_load(&self, builder: &mut CodeBuilder, dst: u32) {
        match *self {
            Self::Int(v) => builder.emit_load_i32(dst, v),
            Self::Float(v) => builder.emit_load_f32(dst, v),
            Self::Bool(v) => builder.emit_load_bool(dst, v),
        }
    }
}

/// Rewrites every integer/float/`true`/`false` token in `tokens` into an
/// identifier naming its interned constant, allocating and `LOAD`-ing each
/// distinct constant exactly once.
pub fn intern_constants(tokens: Vec<Token>, pool: &mut VariablePool, builder: &mut CodeBuilder) -> Vec<Token> {
    let mut interned: IndexMap<String, VarId> = IndexMap::new();
    let mut out = Vec::with_capacity(tokens.len());

    for token in tokens {
        let literal = match token.kind {
            TokenKind::Identifier => Literal::parse_numeric(&token.lexeme),
            TokenKind::ReservedWord if token.lexeme == "true" => Some(Literal::Bool(true)),
            TokenKind::ReservedWord if token.lexeme == "false" => Some(Literal::Bool(false)),
            _ => None,
        };

        let Some(literal) = literal else {
            out.push(token);
            continue;
        };

        let key = literal.intern_key();
        if !interned.contains_key(&key) {
            let id = pool.request_var(literal.ty(), key.clone(), true, false);
            literal.emit_load(builder, pool.get(id).offset);
            pool.initialize(id);
            interned.insert(key.clone(), id);
        }
        out.push(Token::new(TokenKind::Identifier, key, token.line));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    #[test]
    fn dedupes_repeated_integer_literals() {
        let tokens = tokenize("1 + 1");
        let mut pool = VariablePool::new();
        pool.enter_scope();
        let mut builder = CodeBuilder::new();
        let rewritten = intern_constants(tokens, &mut pool, &mut builder);

        assert_eq!(rewritten[0].lexeme, "const int 1");
        assert_eq!(rewritten[2].lexeme, "const int 1");
        assert_eq!(pool.total_bytes(), ValueType::Int.size_in_bytes());
    }

    #[test]
    fn distinguishes_int_and_float_literals() {
        let tokens = tokenize("1 1.0");
        let mut pool = VariablePool::new();
        pool.enter_scope();
        let mut builder = CodeBuilder::new();
        let rewritten = intern_constants(tokens, &mut pool, &mut builder);

        assert_eq!(rewritten[0].lexeme, "const int 1");
        assert_eq!(rewritten[1].lexeme, "const float 1");
        assert_eq!(pool.total_bytes(), ValueType::Int.size_in_bytes() + ValueType::Float.size_in_bytes());
    }

    #[test]
    fn interns_true_and_false_separately() {
        let tokens = tokenize("true false true");
        let mut pool = VariablePool::new();
        pool.enter_scope();
        let mut builder = CodeBuilder::new();
        let rewritten = intern_constants(tokens, &mut pool, &mut builder);

        assert_eq!(rewritten[0].lexeme, "const true");
        assert_eq!(rewritten[1].lexeme, "const false");
        assert_eq!(rewritten[2].lexeme, "const true");
        assert_eq!(pool.total_bytes(), ValueType::Bool.size_in_bytes() * 2);
    }

    #[test]
    fn leaves_non_literal_identifiers_untouched() {
        let tokens = tokenize("foo");
        let mut pool = VariablePool::new();
        pool.enter_scope();
        let mut builder = CodeBuilder::new();
        let rewritten = intern_constants(tokens, &mut pool, &mut builder);
        assert_eq!(rewritten[0].lexeme, "foo");
    }
}
