//! One-byte opcode encoding.

/// Every bytecode instruction's opcode byte. Operand widths are fixed per
/// opcode (see `CodeBuilder` and the VM dispatch loop): variable offsets are
/// `u32`, jump targets are `u64`, `LOAD` payload sizes are `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::FromRepr)]
#[repr(u8)]
pub enum Opcode {
    End = 0,
    Jump = 1,
    Jumpf = 2,
    ItoF = 3,
    FtoI = 4,
    Load = 5,
    Move = 6,
    FlipI = 7,
    FlipF = 8,
    AddI = 9,
    MulI = 10,
    DivI = 11,
    AddF = 12,
    MulF = 13,
    DivF = 14,
    Not = 15,
    And = 16,
    Or = 17,
    LessI = 18,
    LessF = 19,
    LessEqualI = 20,
    LessEqualF = 21,
    EqualI = 22,
    EqualF = 23,
    EqualB = 24,
}

impl Opcode {
    /// Human-readable mnemonic used by the disassembler.
    #[must_use]
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::End => "END",
            Self::Jump => "JUMP",
            Self::Jumpf => "JUMPF",
            Self::ItoF => "ITOF",
            Self::FtoI => "FTOI",
            Self::Load => "LOAD",
            Self::Move => "MOVE",
            Self::FlipI => "FLIPI",
            Self::FlipF => "FLIPF",
            Self::AddI => "ADDI",
            Self::MulI => "MULI",
            Self::DivI => "DIVI",
            Self::AddF => "ADDF",
            Self::MulF => "MULF",
            Self::DivF => "DIVF",
            Self::Not => "NOT",
            Self::And => "AND",
            Self::Or => "OR",
            Self::LessI => "LESSI",
            Self::LessF => "LESSF",
            Self::LessEqualI => "LESSEQUALI",
            Self::LessEqualF => "LESSEQUALF",
            Self::EqualI => "EQUALI",
            Self::EqualF => "EQUALF",
            Self::EqualB => "EQUALB",
        }
    }
}
