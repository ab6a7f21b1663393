//! A read-only pretty-printer over a compiled instruction stream, used by
//! the CLI to show the user what a script compiled to before running it.

use super::op::Opcode;
use crate::buffer::ByteBuffer;

/// One decoded instruction and the byte offset it started at.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub offset: u64,
    pub text: String,
}

/// Decodes `code` into a flat list of instructions. Stops at the first
/// unrecognized opcode byte rather than erroring, since disassembly is a
/// best-effort diagnostic, not part of the compile/run pipeline.
#[must_use]
pub fn disassemble(code: &[u8]) -> Vec<Instruction> {
    let buffer = ByteBuffer::from(code);
    let mut out = Vec::new();
    let mut ip = 0usize;

    while ip < code.len() {
        let offset = ip as u64;
        let Ok(byte) = buffer.read::<u8>(ip) else { break };
        let Some(op) = Opcode::from_repr(byte) else { break };
        ip += 1;

        let text = match op {
            Opcode::End => {
                format!("{}", op.mnemonic())
            }
            Opcode::Jump => {
                let target = buffer.read::<u64>(ip).unwrap_or_default();
                ip += 8;
                format!("{} {target}", op.mnemonic())
            }
            Opcode::Jumpf => {
                let cond = buffer.read::<u32>(ip).unwrap_or_default();
                ip += 4;
                let target = buffer.read::<u64>(ip).unwrap_or_default();
                ip += 8;
                format!("{} {cond}, {target}", op.mnemonic())
            }
            Opcode::ItoF | Opcode::FtoI => {
                let src = buffer.read::<u32>(ip).unwrap_or_default();
                ip += 4;
                let dst = buffer.read::<u32>(ip).unwrap_or_default();
                ip += 4;
                format!("{} {src} -> {dst}", op.mnemonic())
            }
            Opcode::Load => {
                let size = buffer.read::<u32>(ip).unwrap_or_default();
                ip += 4;
                let dst = buffer.read::<u32>(ip).unwrap_or_default();
                ip += 4;
                let payload = match size {
                    1 => buffer.read::<bool>(ip).map(|b| b.to_string()).unwrap_or_default(),
                    4 => buffer.read::<i32>(ip).map(|v| v.to_string()).unwrap_or_default(),
                    _ => "?".to_string(),
                };
                ip += size as usize;
                format!("{} {dst}, {payload} ({size}B)", op.mnemonic())
            }
            Opcode::Move => {
                let size = buffer.read::<u32>(ip).unwrap_or_default();
                ip += 4;
                let src = buffer.read::<u32>(ip).unwrap_or_default();
                ip += 4;
                let dst = buffer.read::<u32>(ip).unwrap_or_default();
                ip += 4;
                format!("{} {src} -> {dst} ({size}B)", op.mnemonic())
            }
            Opcode::FlipI | Opcode::FlipF | Opcode::Not => {
                let a = buffer.read::<u32>(ip).unwrap_or_default();
                ip += 4;
                let r = buffer.read::<u32>(ip).unwrap_or_default();
                ip += 4;
                format!("{} {a} -> {r}", op.mnemonic())
            }
            Opcode::AddI
            | Opcode::MulI
            | Opcode::DivI
            | Opcode::AddF
            | Opcode::MulF
            | Opcode::DivF
            | Opcode::And
            | Opcode::Or
            | Opcode::LessI
            | Opcode::LessF
            | Opcode::LessEqualI
            | Opcode::LessEqualF
            | Opcode::EqualI
            | Opcode::EqualF
            | Opcode::EqualB => {
                let a = buffer.read::<u32>(ip).unwrap_or_default();
                ip += 4;
                let b = buffer.read::<u32>(ip).unwrap_or_default();
                ip += 4;
                let r = buffer.read::<u32>(ip).unwrap_or_default();
                ip += 4;
                format!("{} {a}, {b} -> {r}", op.mnemonic())
            }
        };

        out.push(Instruction { offset, text });
    }

    out
}

/// Renders `disassemble`'s output as `offset: text` lines, one per
/// instruction, for direct display.
#[must_use]
pub fn format_listing(code: &[u8]) -> String {
    disassemble(code).into_iter().map(|ins| format!("{:>6}: {}", ins.offset, ins.text)).collect::<Vec<_>>().join("\n")
}
