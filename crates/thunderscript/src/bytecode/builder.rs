//! Emits bytecode during compilation: encodes opcodes and typed operands,
//! and hands out patchable jump targets.
//!
//! Jump targets are absolute byte offsets into the code stream (`ip = target`
//! per the VM's dispatch loop), not relative displacements, so patching is a
//! single `set::<u64>` once the target is known — no arithmetic relative to
//! the patch site is needed.

use super::op::Opcode;
use crate::buffer::ByteBuffer;
use crate::types::ValueType;

/// Builder for a single script's bytecode stream.
///
/// # Usage
///
/// ```ignore
/// let mut builder = CodeBuilder::new();
/// let patch = builder.emit_jumpf(cond_offset);
/// // ... emit the guarded statement ...
/// builder.patch_jump(patch, builder.current_index());
/// ```
#[derive(Debug, Default)]
pub struct CodeBuilder {
    code: ByteBuffer,
}

impl CodeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The byte offset the next emitted instruction will start at — used as
    /// both a jump target and, once compilation finishes, as the VM's
    /// instruction pointer domain.
    #[must_use]
    pub fn current_index(&self) -> u64 {
        self.code.size() as u64
    }

    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.code.as_slice().to_vec()
    }

    pub fn emit_end(&mut self) {
        self.code.push(Opcode::End as u8);
    }

    pub fn emit_jump(&mut self, target: u64) {
        self.code.push(Opcode::Jump as u8);
        self.code.push::<u64>(target);
    }

    /// Emits `JUMPF cond, target` with a zero placeholder target, returning
    /// the byte offset the target field was written at so the caller can
    /// `patch_jump` it once the branch's end is known.
    #[must_use]
    pub fn emit_jumpf(&mut self, cond_offset: u32) -> usize {
        self.code.push(Opcode::Jumpf as u8);
        self.code.push::<u32>(cond_offset);
        self.code.push::<u64>(0)
    }

    /// Overwrites a previously emitted jump target's placeholder.
    pub fn patch_jump(&mut self, patch_offset: usize, target: u64) {
        self.code.set::<u64>(patch_offset, target).expect("patch site was written by emit_jumpf on this builder");
    }

    pub fn emit_itof(&mut self, src: u32, dst: u32) {
        self.code.push(Opcode::ItoF as u8);
        self.code.push::<u32>(src);
        self.code.push::<u32>(dst);
    }

    pub fn emit_ftoi(&mut self, src: u32, dst: u32) {
        self.code.push(Opcode::FtoI as u8);
        self.code.push::<u32>(src);
        self.code.push::<u32>(dst);
    }

    pub fn emit_load_i32(&mut self, dst: u32, value: i32) {
        self.code.push(Opcode::Load as u8);
        self.code.push::<u32>(4);
        self.code.push::<u32>(dst);
        self.code.push::<i32>(value);
    }

    pub fn emit_load_f32(&mut self, dst: u32, value: f32) {
        self.code.push(Opcode::Load as u8);
        self.code.push::<u32>(4);
        self.code.push::<u32>(dst);
        self.code.push::<f32>(value);
    }

    pub fn emit_load_bool(&mut self, dst: u32, value: bool) {
        self.code.push(Opcode::Load as u8);
        self.code.push::<u32>(1);
        self.code.push::<u32>(dst);
        self.code.push::<bool>(value);
    }

    pub fn emit_move(&mut self, src: u32, dst: u32, size: u32) {
        self.code.push(Opcode::Move as u8);
        self.code.push::<u32>(size);
        self.code.push::<u32>(src);
        self.code.push::<u32>(dst);
    }

    /// Emits `dst = -src` in `ty`'s representation. `ty` must be `Int` or
    /// `Float`; callers type-check before calling.
    pub fn emit_flip(&mut self, ty: ValueType, src: u32, dst: u32) {
        let op = match ty {
            ValueType::Int => Opcode::FlipI,
            ValueType::Float => Opcode::FlipF,
            ValueType::Bool | ValueType::Unknown => panic!("emit_flip called with non-numeric type {ty}"),
        };
        self.code.push(op as u8);
        self.code.push::<u32>(src);
        self.code.push::<u32>(dst);
    }

    pub fn emit_add(&mut self, ty: ValueType, a: u32, b: u32, r: u32) {
        self.emit_binary(
            match ty {
                ValueType::Int => Opcode::AddI,
                ValueType::Float => Opcode::AddF,
                ValueType::Bool | ValueType::Unknown => panic!("emit_add called with non-numeric type {ty}"),
            },
            a,
            b,
            r,
        );
    }

    pub fn emit_mul(&mut self, ty: ValueType, a: u32, b: u32, r: u32) {
        self.emit_binary(
            match ty {
                ValueType::Int => Opcode::MulI,
                ValueType::Float => Opcode::MulF,
                ValueType::Bool | ValueType::Unknown => panic!("emit_mul called with non-numeric type {ty}"),
            },
            a,
            b,
            r,
        );
    }

    pub fn emit_div(&mut self, ty: ValueType, a: u32, b: u32, r: u32) {
        self.emit_binary(
            match ty {
                ValueType::Int => Opcode::DivI,
                ValueType::Float => Opcode::DivF,
                ValueType::Bool | ValueType::Unknown => panic!("emit_div called with non-numeric type {ty}"),
            },
            a,
            b,
            r,
        );
    }

    pub fn emit_not(&mut self, a: u32, r: u32) {
        self.code.push(Opcode::Not as u8);
        self.code.push::<u32>(a);
        self.code.push::<u32>(r);
    }

    pub fn emit_and(&mut self, a: u32, b: u32, r: u32) {
        self.emit_binary(Opcode::And, a, b, r);
    }

    pub fn emit_or(&mut self, a: u32, b: u32, r: u32) {
        self.emit_binary(Opcode::Or, a, b, r);
    }

    /// Emits `r = (a < b)`. Callers implement `>`/`>=` by swapping `a`/`b`
    /// before calling this and `emit_less_equal`.
    pub fn emit_less(&mut self, ty: ValueType, a: u32, b: u32, r: u32) {
        self.emit_binary(
            match ty {
                ValueType::Int => Opcode::LessI,
                ValueType::Float => Opcode::LessF,
                ValueType::Bool | ValueType::Unknown => panic!("emit_less called with non-numeric type {ty}"),
            },
            a,
            b,
            r,
        );
    }

    pub fn emit_less_equal(&mut self, ty: ValueType, a: u32, b: u32, r: u32) {
        self.emit_binary(
            match ty {
                ValueType::Int => Opcode::LessEqualI,
                ValueType::Float => Opcode::LessEqualF,
                ValueType::Bool | ValueType::Unknown => panic!("emit_less_equal called with non-numeric type {ty}"),
            },
            a,
            b,
            r,
        );
    }

    pub fn emit_equal(&mut self, ty: ValueType, a: u32, b: u32, r: u32) {
        self.emit_binary(
            match ty {
                ValueType::Int => Opcode::EqualI,
                ValueType::Float => Opcode::EqualF,
                ValueType::Bool => Opcode::EqualB,
                ValueType::Unknown => panic!("emit_equal called with Unknown type"),
            },
            a,
            b,
            r,
        );
    }

    fn emit_binary(&mut self, op: Opcode, a: u32, b: u32, r: u32) {
        self.code.push(op as u8);
        self.code.push::<u32>(a);
        self.code.push::<u32>(b);
        self.code.push::<u32>(r);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jump_target_patches_to_absolute_offset() {
        let mut builder = CodeBuilder::new();
        let patch = builder.emit_jumpf(0);
        builder.emit_end();
        let target = builder.current_index();
        builder.patch_jump(patch, target);
        let code = builder.finish();
        // JUMPF opcode (1) + cond u32 (4) + target u64 (8) = 13 bytes before END.
        assert_eq!(code.len(), 13 + 1);
        let patched_target = u64::from_le_bytes(code[5..13].try_into().unwrap());
        assert_eq!(patched_target, target);
    }

    #[test]
    fn load_emits_size_dst_then_payload() {
        let mut builder = CodeBuilder::new();
        builder.emit_load_i32(7, -42);
        let code = builder.finish();
        assert_eq!(code[0], Opcode::Load as u8);
        assert_eq!(u32::from_le_bytes(code[1..5].try_into().unwrap()), 4);
        assert_eq!(u32::from_le_bytes(code[5..9].try_into().unwrap()), 7);
        assert_eq!(i32::from_le_bytes(code[9..13].try_into().unwrap()), -42);
    }
}
