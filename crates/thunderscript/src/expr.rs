//! The expression tree: a tagged-variant operation node (replacing the
//! inheritance hierarchy of operator classes the source uses) built from a
//! flat token run by linearizing then folding by operator priority.

use crate::bytecode::CodeBuilder;
use crate::error::CompileError;
use crate::pool::{VarId, VariablePool};
use crate::token::{Token, TokenKind};
use crate::types::ValueType;

/// How many operands an operator absorbs from its neighbors during folding.
#[derive(Clone, Copy, PartialEq, Eq)]
enum DepSide {
    /// Prefix unary: absorbs only the node immediately to its right.
    Right,
    /// Infix binary: absorbs the nodes on both sides.
    Both,
}

/// An as-yet-unresolved operator encountered during linearization. Carries
/// no operands of its own; `priority`/`dep_side` are pure functions of the
/// tag, matching the source's virtual-dispatch `Operation` hierarchy
/// collapsed into data.
#[derive(Clone, Copy, PartialEq, Eq)]
enum OpKind {
    Neg,
    Not,
    Mul,
    Div,
    And,
    Or,
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
    Add,
    Sub,
    Assign,
}

impl OpKind {
    fn priority(self) -> u8 {
        match self {
            Self::Neg | Self::Not => 4,
            Self::Mul | Self::Div | Self::And | Self::Or | Self::Eq | Self::Lt | Self::Gt | Self::Le | Self::Ge => 3,
            Self::Add | Self::Sub => 2,
            Self::Assign => 0,
        }
    }

    fn dep_side(self) -> DepSide {
        match self {
            Self::Neg | Self::Not => DepSide::Right,
            _ => DepSide::Both,
        }
    }
}

/// The resolved expression tree. `Scope` is the pass-through wrapper a
/// parenthesized sub-expression folds into (priority 5 in the fold table:
/// it never competes with an operator, it is simply an operand).
#[derive(Clone)]
pub(crate) enum Node {
    Leaf(VarId),
    Scope(Box<Node>),
    Neg(Box<Node>),
    Not(Box<Node>),
    Add(Box<Node>, Box<Node>),
    Sub(Box<Node>, Box<Node>),
    Mul(Box<Node>, Box<Node>),
    Div(Box<Node>, Box<Node>),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Equals(Box<Node>, Box<Node>),
    Less(Box<Node>, Box<Node>),
    More(Box<Node>, Box<Node>),
    LessEqual(Box<Node>, Box<Node>),
    MoreEqual(Box<Node>, Box<Node>),
    Assign(Box<Node>, Box<Node>),
}

/// One element of the working list during folding: either a resolved
/// operand or a pending operator waiting to absorb its neighbors.
#[derive(Clone)]
enum Elem {
    Operand(Node),
    Op(OpKind),
}

/// Builds the root operation node for one expression's token run (already
/// delimited by the caller — e.g. up to a `;`).
pub(crate) fn build(tokens: &[Token], pool: &mut VariablePool, line: u32) -> Result<Node, CompileError> {
    let elems = linearize(tokens, pool, line)?;
    let elems = fold(elems, 4, Direction::RightToLeft, line)?;
    let elems = fold(elems, 3, Direction::LeftToRight, line)?;
    let elems = fold(elems, 2, Direction::LeftToRight, line)?;
    let elems = fold(elems, 0, Direction::LeftToRight, line)?;

    let mut iter = elems.into_iter();
    let Some(first) = iter.next() else {
        return Err(CompileError::new("UnexpectedToken: empty expression", line));
    };
    if iter.next().is_some() {
        return Err(CompileError::new("UnexpectedToken: expression did not reduce to one value", line));
    }
    match first {
        Elem::Operand(node) => Ok(node),
        Elem::Op(_) => Err(CompileError::new("UnexpectedToken: dangling operator", line)),
    }
}

fn linearize(tokens: &[Token], pool: &mut VariablePool, line: u32) -> Result<Vec<Elem>, CompileError> {
    let mut elems = Vec::with_capacity(tokens.len());
    let mut prev_is_operand = false;
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        match token.kind {
            TokenKind::Identifier => {
                let Some(id) = pool.lookup(&token.lexeme) else {
                    return Err(CompileError::new(format!("UnknownIdentifier: '{}'", token.lexeme), token.line));
                };
                elems.push(Elem::Operand(Node::Leaf(id)));
                prev_is_operand = true;
                i += 1;
            }
            TokenKind::Operator if token.lexeme == "(" => {
                let close = find_matching_paren(tokens, i)?;
                let inner = build(&tokens[i + 1..close], pool, token.line)?;
                elems.push(Elem::Operand(Node::Scope(Box::new(inner))));
                prev_is_operand = true;
                i = close + 1;
            }
            TokenKind::Operator => {
                let op = match token.lexeme.as_str() {
                    "-" if !prev_is_operand => OpKind::Neg,
                    "-" => OpKind::Sub,
                    "!" => OpKind::Not,
                    "+" => OpKind::Add,
                    "*" => OpKind::Mul,
                    "/" => OpKind::Div,
                    "&&" => OpKind::And,
                    "||" => OpKind::Or,
                    "==" => OpKind::Eq,
                    "<" => OpKind::Lt,
                    ">" => OpKind::Gt,
                    "<=" => OpKind::Le,
                    ">=" => OpKind::Ge,
                    "=" => OpKind::Assign,
                    other => return Err(CompileError::new(format!("UnknownOperator: '{other}'"), token.line)),
                };
                elems.push(Elem::Op(op));
                prev_is_operand = false;
                i += 1;
            }
            TokenKind::ReservedWord => {
                return Err(CompileError::new(format!("UnexpectedToken: '{}'", token.lexeme), token.line));
            }
        }
    }

    if elems.is_empty() {
        return Err(CompileError::new("UnexpectedToken: empty expression", line));
    }
    Ok(elems)
}

fn find_matching_paren(tokens: &[Token], open: usize) -> Result<usize, CompileError> {
    let mut depth = 0i32;
    for (offset, token) in tokens.iter().enumerate().skip(open) {
        if token.is_operator("(") {
            depth += 1;
        } else if token.is_operator(")") {
            depth -= 1;
            if depth == 0 {
                return Ok(offset);
            }
        }
    }
    Err(CompileError::new("UnexpectedToken: unmatched '('", tokens[open].line))
}

#[derive(Clone, Copy)]
enum Direction {
    LeftToRight,
    RightToLeft,
}

/// Repeatedly absorbs the neighbor(s) of the next (leftmost or rightmost,
/// per `direction`) operator at `priority`, until none remain at that
/// priority. Leftmost-first gives binary operators left-associativity;
/// rightmost-first gives chained unary operators correct innermost-first
/// nesting (`!!a` folds as `!(!a)`, not the reverse).
fn fold(mut elems: Vec<Elem>, priority: u8, direction: Direction, line: u32) -> Result<Vec<Elem>, CompileError> {
    loop {
        let found = match direction {
            Direction::LeftToRight => {
                elems.iter().position(|e| matches!(e, Elem::Op(op) if op.priority() == priority))
            }
            Direction::RightToLeft => {
                elems.iter().rposition(|e| matches!(e, Elem::Op(op) if op.priority() == priority))
            }
        };
        let Some(idx) = found else { break };
        let Elem::Op(op) = elems[idx] else { unreachable!() };

        match op.dep_side() {
            DepSide::Right => {
                let Some(Elem::Operand(rhs)) = elems.get(idx + 1).cloned() else {
                    return Err(CompileError::new("UnexpectedToken: operator missing right operand", line));
                };
                let node = build_unary(op, rhs);
                elems.splice(idx..=idx + 1, [Elem::Operand(node)]);
            }
            DepSide::Both => {
                if idx == 0 {
                    return Err(CompileError::new("UnexpectedToken: operator missing left operand", line));
                }
                let (Some(Elem::Operand(lhs)), Some(Elem::Operand(rhs))) =
                    (elems.get(idx - 1).cloned(), elems.get(idx + 1).cloned())
                else {
                    return Err(CompileError::new("UnexpectedToken: operator missing an operand", line));
                };
                let node = build_binary(op, lhs, rhs);
                elems.splice(idx - 1..=idx + 1, [Elem::Operand(node)]);
            }
        }
    }
    Ok(elems)
}

fn build_unary(op: OpKind, operand: Node) -> Node {
    match op {
        OpKind::Neg => Node::Neg(Box::new(operand)),
        OpKind::Not => Node::Not(Box::new(operand)),
        _ => unreachable!("build_unary called with a binary OpKind"),
    }
}

fn build_binary(op: OpKind, lhs: Node, rhs: Node) -> Node {
    let (l, r) = (Box::new(lhs), Box::new(rhs));
    match op {
        OpKind::Add => Node::Add(l, r),
        OpKind::Sub => Node::Sub(l, r),
        OpKind::Mul => Node::Mul(l, r),
        OpKind::Div => Node::Div(l, r),
        OpKind::And => Node::And(l, r),
        OpKind::Or => Node::Or(l, r),
        OpKind::Eq => Node::Equals(l, r),
        OpKind::Lt => Node::Less(l, r),
        OpKind::Gt => Node::More(l, r),
        OpKind::Le => Node::LessEqual(l, r),
        OpKind::Ge => Node::MoreEqual(l, r),
        OpKind::Assign => Node::Assign(l, r),
        OpKind::Neg | OpKind::Not => unreachable!("build_binary called with a unary OpKind"),
    }
}

/// The common type two arithmetic/comparison operands cast to before the
/// opcode is chosen: `Float` if either is `Float`, else `Int` if both are
/// `Int`, else — when `allow_bool` (equality only) — `Bool` if both are
/// `Bool`.
fn common_type(a: ValueType, b: ValueType, allow_bool: bool, line: u32) -> Result<ValueType, CompileError> {
    match (a, b) {
        (ValueType::Float, _) | (_, ValueType::Float) => Ok(ValueType::Float),
        (ValueType::Int, ValueType::Int) => Ok(ValueType::Int),
        (ValueType::Bool, ValueType::Bool) if allow_bool => Ok(ValueType::Bool),
        _ => Err(CompileError::new(format!("TypeMismatch: no common type for {a} and {b}"), line)),
    }
}

/// Unwraps `Scope` wrappers to find the variable an assignment's left side
/// names, without running the generic (initialized-checking) `emit` path.
fn assign_target(node: &Node) -> Option<VarId> {
    match node {
        Node::Leaf(id) => Some(*id),
        Node::Scope(inner) => assign_target(inner),
        _ => None,
    }
}

impl Node {
    /// Emits this node's instructions and returns the descriptor holding
    /// its result.
    pub(crate) fn emit(&self, pool: &mut VariablePool, builder: &mut CodeBuilder, line: u32) -> Result<VarId, CompileError> {
        match self {
            Self::Leaf(id) => {
                if !pool.get(*id).initialized {
                    return Err(CompileError::new(
                        format!("UninitializedUse: '{}' used before initialization", pool.get(*id).name),
                        line,
                    ));
                }
                Ok(*id)
            }
            Self::Scope(inner) => inner.emit(pool, builder, line),
            Self::Neg(a) => {
                let av = a.emit(pool, builder, line)?;
                let ty = pool.get(av).ty;
                if !ty.is_numeric() {
                    return Err(CompileError::new(format!("TypeMismatch: cannot negate {ty}"), line));
                }
                let temp = pool.request_temp(ty);
                builder.emit_flip(ty, pool.get(av).offset, pool.get(temp).offset);
                pool.initialize(temp);
                Ok(temp)
            }
            Self::Not(a) => {
                let av = a.emit(pool, builder, line)?;
                if pool.get(av).ty != ValueType::Bool {
                    return Err(CompileError::new(format!("TypeMismatch: cannot negate {}", pool.get(av).ty), line));
                }
                let temp = pool.request_temp(ValueType::Bool);
                builder.emit_not(pool.get(av).offset, pool.get(temp).offset);
                pool.initialize(temp);
                Ok(temp)
            }
            Self::Add(a, b) => emit_arith(a, b, pool, builder, line, CodeBuilder::emit_add),
            Self::Mul(a, b) => emit_arith(a, b, pool, builder, line, CodeBuilder::emit_mul),
            Self::Div(a, b) => emit_arith(a, b, pool, builder, line, CodeBuilder::emit_div),
            Self::Sub(a, b) => {
                let av = a.emit(pool, builder, line)?;
                let bv = b.emit(pool, builder, line)?;
                let ty = common_type(pool.get(av).ty, pool.get(bv).ty, false, line)?;
                let ac = pool.cast(ty, av, builder, line)?;
                let bc = pool.cast(ty, bv, builder, line)?;
                // Always flip into a fresh temporary, never the operand's own
                // storage — the source's negate-for-subtract mutates `b` in
                // place, which this avoids by construction.
                let negated = pool.request_temp(ty);
                builder.emit_flip(ty, pool.get(bc).offset, pool.get(negated).offset);
                pool.initialize(negated);
                let result = pool.request_temp(ty);
                builder.emit_add(ty, pool.get(ac).offset, pool.get(negated).offset, pool.get(result).offset);
                pool.initialize(result);
                Ok(result)
            }
            Self::And(a, b) => emit_bool_binary(a, b, pool, builder, line, CodeBuilder::emit_and),
            Self::Or(a, b) => emit_bool_binary(a, b, pool, builder, line, CodeBuilder::emit_or),
            Self::Equals(a, b) => {
                let av = a.emit(pool, builder, line)?;
                let bv = b.emit(pool, builder, line)?;
                let ty = common_type(pool.get(av).ty, pool.get(bv).ty, true, line)?;
                let ac = pool.cast(ty, av, builder, line)?;
                let bc = pool.cast(ty, bv, builder, line)?;
                let result = pool.request_temp(ValueType::Bool);
                builder.emit_equal(ty, pool.get(ac).offset, pool.get(bc).offset, pool.get(result).offset);
                pool.initialize(result);
                Ok(result)
            }
            Self::Less(a, b) => emit_compare(a, b, pool, builder, line, CodeBuilder::emit_less),
            Self::LessEqual(a, b) => emit_compare(a, b, pool, builder, line, CodeBuilder::emit_less_equal),
            // `>`/`>=` swap operand order into the "less" opcode.
            Self::More(a, b) => emit_compare(b, a, pool, builder, line, CodeBuilder::emit_less),
            Self::MoreEqual(a, b) => emit_compare(b, a, pool, builder, line, CodeBuilder::emit_less_equal),
            Self::Assign(left, right) => {
                let Some(target) = assign_target(left) else {
                    return Err(CompileError::new("UnexpectedToken: left side of '=' must be a variable", line));
                };
                let desc = pool.get(target).clone();
                if desc.constant {
                    return Err(CompileError::new(format!("ConstAssign: '{}' is constant", desc.name), line));
                }
                let rv = right.emit(pool, builder, line)?;
                let right_ty = pool.get(rv).ty;
                if desc.ty == ValueType::Bool && right_ty != ValueType::Bool {
                    return Err(CompileError::new(format!("TypeMismatch: cannot assign {right_ty} to bool"), line));
                }
                let casted = pool.cast(desc.ty, rv, builder, line)?;
                builder.emit_move(pool.get(casted).offset, desc.offset, desc.ty.size_in_bytes());
                pool.initialize(target);
                Ok(target)
            }
        }
    }
}

fn emit_arith(
    a: &Node,
    b: &Node,
    pool: &mut VariablePool,
    builder: &mut CodeBuilder,
    line: u32,
    emit_op: fn(&mut CodeBuilder, ValueType, u32, u32, u32),
) -> Result<VarId, CompileError> {
    let av = a.emit(pool, builder, line)?;
    let bv = b.emit(pool, builder, line)?;
    let ty = common_type(pool.get(av).ty, pool.get(bv).ty, false, line)?;
    let ac = pool.cast(ty, av, builder, line)?;
    let bc = pool.cast(ty, bv, builder, line)?;
    let result = pool.request_temp(ty);
    emit_op(builder, ty, pool.get(ac).offset, pool.get(bc).offset, pool.get(result).offset);
    pool.initialize(result);
    Ok(result)
}

fn emit_compare(
    a: &Node,
    b: &Node,
    pool: &mut VariablePool,
    builder: &mut CodeBuilder,
    line: u32,
    emit_op: fn(&mut CodeBuilder, ValueType, u32, u32, u32),
) -> Result<VarId, CompileError> {
    let av = a.emit(pool, builder, line)?;
    let bv = b.emit(pool, builder, line)?;
    let ty = common_type(pool.get(av).ty, pool.get(bv).ty, false, line)?;
    let ac = pool.cast(ty, av, builder, line)?;
    let bc = pool.cast(ty, bv, builder, line)?;
    let result = pool.request_temp(ValueType::Bool);
    emit_op(builder, ty, pool.get(ac).offset, pool.get(bc).offset, pool.get(result).offset);
    pool.initialize(result);
    Ok(result)
}

fn emit_bool_binary(
    a: &Node,
    b: &Node,
    pool: &mut VariablePool,
    builder: &mut CodeBuilder,
    line: u32,
    emit_op: fn(&mut CodeBuilder, u32, u32, u32),
) -> Result<VarId, CompileError> {
    let av = a.emit(pool, builder, line)?;
    let bv = b.emit(pool, builder, line)?;
    for v in [av, bv] {
        if pool.get(v).ty != ValueType::Bool {
            return Err(CompileError::new(format!("TypeMismatch: '&&'/'||' require bool, found {}", pool.get(v).ty), line));
        }
    }
    let result = pool.request_temp(ValueType::Bool);
    emit_op(builder, pool.get(av).offset, pool.get(bv).offset, pool.get(result).offset);
    pool.initialize(result);
    Ok(result)
}
