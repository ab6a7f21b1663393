//! The statement compiler: turns a token stream (post-preprocessing,
//! post-interning) into bytecode, one statement at a time.

use crate::bytecode::CodeBuilder;
use crate::error::CompileError;
use crate::expr;
use crate::pool::VariablePool;
use crate::token::{Token, TokenKind};
use crate::types::ValueType;

/// A read-only cursor over a statement's token slice, advanced one token
/// (or one balanced-paren group) at a time.
struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn line(&self) -> u32 {
        self.peek().or_else(|| self.tokens.last()).map_or(0, |t| t.line)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek_is_operator(&self, op: &str) -> bool {
        self.peek().is_some_and(|t| t.is_operator(op))
    }

    fn peek_is_reserved(&self, word: &str) -> bool {
        self.peek().is_some_and(|t| t.is_reserved(word))
    }

    fn expect_operator(&mut self, op: &str) -> Result<u32, CompileError> {
        let line = self.line();
        match self.advance() {
            Some(t) if t.is_operator(op) => Ok(t.line),
            _ => Err(CompileError::new(format!("UnexpectedToken: expected '{op}'"), line)),
        }
    }

    fn expect_reserved(&mut self, word: &str) -> Result<u32, CompileError> {
        let line = self.line();
        match self.advance() {
            Some(t) if t.is_reserved(word) => Ok(t.line),
            _ => Err(CompileError::new(format!("UnexpectedToken: expected '{word}'"), line)),
        }
    }

    fn expect_identifier(&mut self) -> Result<Token, CompileError> {
        let line = self.line();
        match self.advance() {
            Some(t) if t.kind == TokenKind::Identifier => Ok(t.clone()),
            _ => Err(CompileError::new("UnexpectedToken: expected an identifier", line)),
        }
    }

    /// Consumes tokens up to (not including) the next depth-0 occurrence of
    /// `op`, returning the consumed slice. Tracks `(`/`)` nesting so a `;`
    /// or operator inside a parenthesized sub-expression is not mistaken
    /// for the terminator.
    fn take_until(&mut self, op: &str) -> Result<&'a [Token], CompileError> {
        let start = self.pos;
        let mut depth = 0i32;
        while let Some(t) = self.tokens.get(self.pos) {
            if depth == 0 && t.is_operator(op) {
                return Ok(&self.tokens[start..self.pos]);
            }
            if t.is_operator("(") {
                depth += 1;
            } else if t.is_operator(")") {
                depth -= 1;
            }
            self.pos += 1;
        }
        Err(CompileError::new(format!("UnexpectedToken: expected '{op}'"), self.line()))
    }

    /// Consumes tokens up to the `)` matching a `(` already consumed by the
    /// caller, returning the consumed slice (not including the `)`) and
    /// leaving the cursor positioned just past it.
    fn take_until_matching_paren(&mut self) -> Result<&'a [Token], CompileError> {
        let start = self.pos;
        let mut depth = 1i32;
        while let Some(t) = self.tokens.get(self.pos) {
            if t.is_operator("(") {
                depth += 1;
            } else if t.is_operator(")") {
                depth -= 1;
                if depth == 0 {
                    let slice = &self.tokens[start..self.pos];
                    self.pos += 1;
                    return Ok(slice);
                }
            }
            self.pos += 1;
        }
        Err(CompileError::new("UnexpectedToken: unmatched '('", self.line()))
    }
}

/// Compiles every statement in `tokens` (already preprocessed and
/// constant-interned) into `builder`, using `pool` for storage allocation.
pub fn compile_statements(tokens: &[Token], pool: &mut VariablePool, builder: &mut CodeBuilder) -> Result<(), CompileError> {
    let mut cursor = Cursor::new(tokens);
    while !cursor.at_end() {
        compile_statement(&mut cursor, pool, builder)?;
    }
    Ok(())
}

fn compile_statement(cursor: &mut Cursor<'_>, pool: &mut VariablePool, builder: &mut CodeBuilder) -> Result<(), CompileError> {
    if cursor.peek_is_operator(";") {
        cursor.advance();
        return Ok(());
    }

    if cursor.peek_is_operator("{") {
        cursor.advance();
        pool.enter_scope();
        while !cursor.peek_is_operator("}") {
            if cursor.at_end() {
                return Err(CompileError::new("UnexpectedToken: unterminated block", cursor.line()));
            }
            compile_statement(cursor, pool, builder)?;
        }
        cursor.advance();
        pool.exit_scope();
        return Ok(());
    }

    if cursor.peek_is_reserved("end") {
        cursor.advance();
        cursor.expect_operator(";")?;
        builder.emit_end();
        return Ok(());
    }

    if cursor.peek_is_reserved("int") || cursor.peek_is_reserved("float") || cursor.peek_is_reserved("bool") {
        return compile_declaration(cursor, pool, builder);
    }

    if cursor.peek_is_reserved("if") {
        return compile_if(cursor, pool, builder);
    }

    if cursor.peek_is_reserved("while") {
        return compile_while(cursor, pool, builder);
    }

    compile_expression_statement(cursor, pool, builder)
}

fn compile_declaration(cursor: &mut Cursor<'_>, pool: &mut VariablePool, builder: &mut CodeBuilder) -> Result<(), CompileError> {
    let line = cursor.line();
    let ty = match cursor.advance() {
        Some(t) if t.is_reserved("int") => ValueType::Int,
        Some(t) if t.is_reserved("float") => ValueType::Float,
        Some(t) if t.is_reserved("bool") => ValueType::Bool,
        _ => return Err(CompileError::new("UnexpectedToken: expected a type", line)),
    };
    let name_tok = cursor.expect_identifier()?;
    pool.request_var(ty, name_tok.lexeme.clone(), false, false);

    if cursor.peek_is_operator("=") {
        let eq = cursor.advance().expect("peeked '='").clone();
        let rhs = cursor.take_until(";")?;
        let mut expr_tokens = Vec::with_capacity(rhs.len() + 2);
        expr_tokens.push(name_tok);
        expr_tokens.push(eq);
        expr_tokens.extend_from_slice(rhs);
        let node = expr::build(&expr_tokens, pool, line)?;
        node.emit(pool, builder, line)?;
    }

    cursor.expect_operator(";")?;
    Ok(())
}

fn compile_if(cursor: &mut Cursor<'_>, pool: &mut VariablePool, builder: &mut CodeBuilder) -> Result<(), CompileError> {
    let line = cursor.expect_reserved("if")?;
    cursor.expect_operator("(")?;
    let cond_tokens = cursor.take_until_matching_paren()?;
    let cond = expr::build(cond_tokens, pool, line)?;
    let cond_id = cond.emit(pool, builder, line)?;
    if pool.get(cond_id).ty != ValueType::Bool {
        return Err(CompileError::new("TypeMismatch: 'if' condition must be bool", line));
    }

    let patch = builder.emit_jumpf(pool.get(cond_id).offset);
    compile_statement(cursor, pool, builder)?;
    let target = builder.current_index();
    builder.patch_jump(patch, target);
    Ok(())
}

fn compile_while(cursor: &mut Cursor<'_>, pool: &mut VariablePool, builder: &mut CodeBuilder) -> Result<(), CompileError> {
    let line = cursor.expect_reserved("while")?;
    let loop_top = builder.current_index();
    cursor.expect_operator("(")?;
    let cond_tokens = cursor.take_until_matching_paren()?;
    let cond = expr::build(cond_tokens, pool, line)?;
    let cond_id = cond.emit(pool, builder, line)?;
    if pool.get(cond_id).ty != ValueType::Bool {
        return Err(CompileError::new("TypeMismatch: 'while' condition must be bool", line));
    }

    let patch = builder.emit_jumpf(pool.get(cond_id).offset);
    compile_statement(cursor, pool, builder)?;
    builder.emit_jump(loop_top);
    let target = builder.current_index();
    builder.patch_jump(patch, target);
    Ok(())
}

fn compile_expression_statement(cursor: &mut Cursor<'_>, pool: &mut VariablePool, builder: &mut CodeBuilder) -> Result<(), CompileError> {
    let line = cursor.line();
    let tokens = cursor.take_until(";")?;
    let node = expr::build(tokens, pool, line)?;
    node.emit(pool, builder, line)?;
    cursor.expect_operator(";")?;
    Ok(())
}
