use core::fmt;

/// Opcode tag carried by every memory cell.
///
/// `Data` marks a cell holding a plain integer and `Empty` a cell nothing was
/// ever written to; neither is executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Data,
    Empty,
    Jmp,
    Jmpi,
    Jmpig,
    Jmpil,
    Jmpie,
    Jmpim,
    Jmpigm,
    Jmpilm,
    Jmpiem,
    Jmpigk,
    Jmpilk,
    Jmpiek,
    Jmpigt,
    Addi,
    Subi,
    Add,
    Sub,
    Mult,
    Ldi,
    Ldd,
    Std,
    Ldx,
    Stx,
    Move,
    Syscall,
    Stop,
}

impl Opcode {
    /// Mnemonic as printed in dumps and traces.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Data => "DATA",
            Opcode::Empty => "___",
            Opcode::Jmp => "JMP",
            Opcode::Jmpi => "JMPI",
            Opcode::Jmpig => "JMPIG",
            Opcode::Jmpil => "JMPIL",
            Opcode::Jmpie => "JMPIE",
            Opcode::Jmpim => "JMPIM",
            Opcode::Jmpigm => "JMPIGM",
            Opcode::Jmpilm => "JMPILM",
            Opcode::Jmpiem => "JMPIEM",
            Opcode::Jmpigk => "JMPIGK",
            Opcode::Jmpilk => "JMPILK",
            Opcode::Jmpiek => "JMPIEK",
            Opcode::Jmpigt => "JMPIGT",
            Opcode::Addi => "ADDI",
            Opcode::Subi => "SUBI",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mult => "MULT",
            Opcode::Ldi => "LDI",
            Opcode::Ldd => "LDD",
            Opcode::Std => "STD",
            Opcode::Ldx => "LDX",
            Opcode::Stx => "STX",
            Opcode::Move => "MOVE",
            Opcode::Syscall => "SYSCALL",
            Opcode::Stop => "STOP",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// One memory cell: an opcode tag, two register indices and a parameter.
///
/// For `Data` cells `p` is the stored value. Unused register fields hold -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Word {
    pub opcode: Opcode,
    pub r1: i32,
    pub r2: i32,
    pub p: i32,
}

impl Word {
    /// An uninitialized cell.
    pub const EMPTY: Word = Word::new(Opcode::Empty, -1, -1, -1);

    pub const fn new(opcode: Opcode, r1: i32, r2: i32, p: i32) -> Self {
        Self { opcode, r1, r2, p }
    }

    /// A data cell holding `value`.
    pub const fn data(value: i32) -> Self {
        Self::new(Opcode::Data, -1, -1, value)
    }
}

impl Default for Word {
    fn default() -> Self {
        Word::EMPTY
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ {}, {}, {}, {} ]", self.opcode, self.r1, self.r2, self.p)
    }
}
