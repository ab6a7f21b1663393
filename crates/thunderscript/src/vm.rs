//! The fetch-decode-execute loop over compiled bytecode.

use crate::bytecode::Opcode;
use crate::buffer::ByteBuffer;
use crate::error::RuntimeError;

/// A loaded script's running state: the code it executes, its
/// byte-addressed stack, and the instruction pointer `Run` resumes from.
///
/// Non-reentrant, single-threaded, cooperative: there are no suspension
/// points, so `execute` only ever returns at `END` or on error.
pub struct VirtualMachine {
    code: ByteBuffer,
    stack: ByteBuffer,
    run_start: u64,
}

impl VirtualMachine {
    #[must_use]
    pub fn new() -> Self {
        Self { code: ByteBuffer::new(), stack: ByteBuffer::new(), run_start: 0 }
    }

    /// Resets `ip`, zero-fills a stack of `stack_size` bytes, loads `code`,
    /// and runs the constant-initialization prologue once (through the
    /// first `END`), recording where `Run` should resume from.
    pub fn load(&mut self, code: &[u8], stack_size: u32) -> Result<(), RuntimeError> {
        self.code = ByteBuffer::from(code);
        self.stack = ByteBuffer::new();
        self.stack.resize(stack_size as usize);
        self.run_start = self.execute(0)?;
        Ok(())
    }

    /// Executes from the recorded prologue end to the next `END` (or end of
    /// code). Does not mutate `run_start`, so repeated calls are idempotent
    /// with respect to where execution resumes from.
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        self.execute(self.run_start)?;
        Ok(())
    }

    pub fn read_stack<T: crate::buffer::Packed>(&self, offset: u32) -> Result<T, RuntimeError> {
        self.stack.read(offset as usize)
    }

    pub fn write_stack<T: crate::buffer::Packed>(&mut self, offset: u32, value: T) -> Result<(), RuntimeError> {
        self.stack.set(offset as usize, value)
    }

    /// Runs from byte offset `start` until `END`, returning the instruction
    /// pointer just past the `END` opcode (or, if the code runs off the end
    /// without one, the final `ip`).
    fn execute(&mut self, start: u64) -> Result<u64, RuntimeError> {
        let mut ip = start as usize;

        loop {
            if ip >= self.code.size() {
                return Ok(ip as u64);
            }
            let byte: u8 = self.code.read(ip)?;
            let Some(op) = Opcode::from_repr(byte) else {
                return Err(RuntimeError::BadOpcode { ip, byte });
            };
            ip += 1;

            match op {
                Opcode::End => return Ok(ip as u64),

                Opcode::Jump => {
                    let target: u64 = self.code.read(ip)?;
                    ip = target as usize;
                }

                Opcode::Jumpf => {
                    let cond: u32 = self.code.read(ip)?;
                    ip += 4;
                    let target: u64 = self.code.read(ip)?;
                    ip += 8;
                    let cond_value: bool = self.stack.read(cond as usize)?;
                    if !cond_value {
                        ip = target as usize;
                    }
                }

                Opcode::ItoF => {
                    let (src, dst) = self.read_pair(&mut ip)?;
                    let value: i32 = self.stack.read(src as usize)?;
                    self.stack.set(dst as usize, value as f32)?;
                }

                Opcode::FtoI => {
                    let (src, dst) = self.read_pair(&mut ip)?;
                    let value: f32 = self.stack.read(src as usize)?;
                    #[expect(clippy::cast_possible_truncation, reason = "FtoI truncates the fractional part by design")]
                    self.stack.set(dst as usize, value as i32)?;
                }

                Opcode::Load => {
                    let size: u32 = self.code.read(ip)?;
                    ip += 4;
                    let dst: u32 = self.code.read(ip)?;
                    ip += 4;
                    let payload = self.code.read_bytes(ip, size as usize)?.to_vec();
                    ip += size as usize;
                    self.stack.write_bytes(dst as usize, &payload)?;
                }

                Opcode::Move => {
                    let size: u32 = self.code.read(ip)?;
                    ip += 4;
                    let src: u32 = self.code.read(ip)?;
                    ip += 4;
                    let dst: u32 = self.code.read(ip)?;
                    ip += 4;
                    self.stack.copy(dst as usize, src as usize, size as usize)?;
                }

                Opcode::FlipI => {
                    let (src, dst) = self.read_pair(&mut ip)?;
                    let value: i32 = self.stack.read(src as usize)?;
                    self.stack.set(dst as usize, value.wrapping_neg())?;
                }

                Opcode::FlipF => {
                    let (src, dst) = self.read_pair(&mut ip)?;
                    let value: f32 = self.stack.read(src as usize)?;
                    self.stack.set(dst as usize, -value)?;
                }

                Opcode::AddI | Opcode::MulI | Opcode::DivI => {
                    let (a, b, r) = self.read_triple(&mut ip)?;
                    let av: i32 = self.stack.read(a as usize)?;
                    let bv: i32 = self.stack.read(b as usize)?;
                    let result = match op {
                        Opcode::AddI => av.wrapping_add(bv),
                        Opcode::MulI => av.wrapping_mul(bv),
                        Opcode::DivI => av / bv,
                        _ => unreachable!(),
                    };
                    self.stack.set(r as usize, result)?;
                }

                Opcode::AddF | Opcode::MulF | Opcode::DivF => {
                    let (a, b, r) = self.read_triple(&mut ip)?;
                    let av: f32 = self.stack.read(a as usize)?;
                    let bv: f32 = self.stack.read(b as usize)?;
                    let result = match op {
                        Opcode::AddF => av + bv,
                        Opcode::MulF => av * bv,
                        Opcode::DivF => av / bv,
                        _ => unreachable!(),
                    };
                    self.stack.set(r as usize, result)?;
                }

                Opcode::Not => {
                    let (a, r) = self.read_pair(&mut ip)?;
                    let value: bool = self.stack.read(a as usize)?;
                    self.stack.set(r as usize, !value)?;
                }

                Opcode::And | Opcode::Or => {
                    let (a, b, r) = self.read_triple(&mut ip)?;
                    let av: bool = self.stack.read(a as usize)?;
                    let bv: bool = self.stack.read(b as usize)?;
                    let result = if op == Opcode::And { av && bv } else { av || bv };
                    self.stack.set(r as usize, result)?;
                }

                Opcode::LessI | Opcode::LessEqualI => {
                    let (a, b, r) = self.read_triple(&mut ip)?;
                    let av: i32 = self.stack.read(a as usize)?;
                    let bv: i32 = self.stack.read(b as usize)?;
                    let result = if op == Opcode::LessI { av < bv } else { av <= bv };
                    self.stack.set(r as usize, result)?;
                }

                Opcode::LessF | Opcode::LessEqualF => {
                    let (a, b, r) = self.read_triple(&mut ip)?;
                    let av: f32 = self.stack.read(a as usize)?;
                    let bv: f32 = self.stack.read(b as usize)?;
                    let result = if op == Opcode::LessF { av < bv } else { av <= bv };
                    self.stack.set(r as usize, result)?;
                }

                Opcode::EqualI => {
                    let (a, b, r) = self.read_triple(&mut ip)?;
                    let av: i32 = self.stack.read(a as usize)?;
                    let bv: i32 = self.stack.read(b as usize)?;
                    self.stack.set(r as usize, av == bv)?;
                }

                Opcode::EqualF => {
                    let (a, b, r) = self.read_triple(&mut ip)?;
                    let av: f32 = self.stack.read(a as usize)?;
                    let bv: f32 = self.stack.read(b as usize)?;
                    self.stack.set(r as usize, av == bv)?;
                }

                Opcode::EqualB => {
                    let (a, b, r) = self.read_triple(&mut ip)?;
                    let av: bool = self.stack.read(a as usize)?;
                    let bv: bool = self.stack.read(b as usize)?;
                    self.stack.set(r as usize, av == bv)?;
                }
            }
        }
    }

    fn read_pair(&self, ip: &mut usize) -> Result<(u32, u32), RuntimeError> {
        let a: u32 = self.code.read(*ip)?;
        *ip += 4;
        let b: u32 = self.code.read(*ip)?;
        *ip += 4;
        Ok((a, b))
    }

    fn read_triple(&self, ip: &mut usize) -> Result<(u32, u32, u32), RuntimeError> {
        let a: u32 = self.code.read(*ip)?;
        *ip += 4;
        let b: u32 = self.code.read(*ip)?;
        *ip += 4;
        let c: u32 = self.code.read(*ip)?;
        *ip += 4;
        Ok((a, b, c))
    }
}

impl Default for VirtualMachine {
    fn default() -> Self {
        Self::new()
    }
}
