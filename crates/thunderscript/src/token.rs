//! Tokens and the fixed operator/reserved-word tables the lexer matches
//! against.

/// What kind of lexical item a token represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Operator,
    ReservedWord,
    Identifier,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: u32,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: u32) -> Self {
        Self { kind, lexeme: lexeme.into(), line }
    }

    #[must_use]
    pub fn is_operator(&self, lexeme: &str) -> bool {
        self.kind == TokenKind::Operator && self.lexeme == lexeme
    }

    #[must_use]
    pub fn is_reserved(&self, word: &str) -> bool {
        self.kind == TokenKind::ReservedWord && self.lexeme == word
    }
}

/// Reserved words, fixed set per the language grammar. `def` and `for` are
/// recognized here even though no statement form in this implementation
/// consumes them (functions and `for` loops are sketched but not built) —
/// the lexer's vocabulary is unconditional, so e.g. a variable literally
/// named `for` must still be rejected as a reserved word, not accepted as
/// an identifier.
pub const RESERVED_WORDS: &[&str] =
    &["end", "def", "int", "float", "bool", "if", "in", "ref", "true", "false", "while", "for"];

/// Operators in longest-first matching order: two-character operators
/// before the single-character operator they'd otherwise be split into
/// (`++`/`--`/`+=`/`-=` before `+`/`-`/`=`, `>=`/`<=` before `>`/`<`,
/// `||`/`&&` before... there is no single `|` or `&` in this table, `==`
/// before `=`). `[`/`]` are recognized but no grammar rule in this
/// implementation consumes them (arrays are out of scope). The table is
/// ordered so a naive left-to-right longest-match scan is correct without
/// extra bookkeeping.
pub const OPERATORS: &[&str] = &[
    "++", "--", "+=", "-=", ">=", "<=", "||", "&&", "==", "(", ")", "{", "}", "[", "]", ";", "+", "-", "=", "*", "/",
    "#", ">", "<", "!",
];

#[must_use]
pub fn is_identifier_boundary(c: char) -> bool {
    c.is_whitespace() || OPERATORS.iter().any(|op| op.starts_with(c))
}
