/// A decoded instruction with its register fields already validated.
///
/// Naming follows the hardware table: `rd`/`rs` are destination/source
/// registers, `rc` is the register a conditional jump tests, `k` an
/// immediate and `a` a logical address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// PC <- a
    Jmp { a: i32 },
    /// PC <- rs
    Jmpi { rs: usize },
    /// if rc > 0 then PC <- rs else PC++
    Jmpig { rs: usize, rc: usize },
    /// if rc < 0 then PC <- rs else PC++
    Jmpil { rs: usize, rc: usize },
    /// if rc == 0 then PC <- rs else PC++
    Jmpie { rs: usize, rc: usize },
    /// PC <- [a]
    Jmpim { a: i32 },
    /// if rc > 0 then PC <- [a] else PC++
    Jmpigm { a: i32, rc: usize },
    /// if rc < 0 then PC <- [a] else PC++
    Jmpilm { a: i32, rc: usize },
    /// if rc == 0 then PC <- [a] else PC++
    Jmpiem { a: i32, rc: usize },
    /// if rc > 0 then PC <- k else PC++
    Jmpigk { k: i32, rc: usize },
    /// if rc < 0 then PC <- k else PC++
    Jmpilk { k: i32, rc: usize },
    /// if rc == 0 then PC <- k else PC++
    Jmpiek { k: i32, rc: usize },
    /// rd <- rd + k
    Addi { rd: usize, k: i32 },
    /// rd <- rd - k
    Subi { rd: usize, k: i32 },
    /// rd <- rd + rs
    Add { rd: usize, rs: usize },
    /// rd <- rd - rs
    Sub { rd: usize, rs: usize },
    /// rd <- rd * rs
    Mult { rd: usize, rs: usize },
    /// rd <- k
    Ldi { rd: usize, k: i32 },
    /// rd <- [a]
    Ldd { rd: usize, a: i32 },
    /// [a] <- rs
    Std { rs: usize, a: i32 },
    /// rd <- [ra]
    Ldx { rd: usize, ra: usize },
    /// [ra] <- rs
    Stx { ra: usize, rs: usize },
    /// rd <- rs
    Move { rd: usize, rs: usize },
    /// Operation in r8, logical address in r9.
    Syscall,
    Stop,
}

impl Instruction {
    pub fn pretty_print(&self) -> String {
        match *self {
            Instruction::Jmp { a } => format!("JMP {}", a),
            Instruction::Jmpi { rs } => format!("JMPI r{}", rs),
            Instruction::Jmpig { rs, rc } => format!("JMPIG r{}, r{}", rs, rc),
            Instruction::Jmpil { rs, rc } => format!("JMPIL r{}, r{}", rs, rc),
            Instruction::Jmpie { rs, rc } => format!("JMPIE r{}, r{}", rs, rc),
            Instruction::Jmpim { a } => format!("JMPIM [{}]", a),
            Instruction::Jmpigm { a, rc } => format!("JMPIGM [{}], r{}", a, rc),
            Instruction::Jmpilm { a, rc } => format!("JMPILM [{}], r{}", a, rc),
            Instruction::Jmpiem { a, rc } => format!("JMPIEM [{}], r{}", a, rc),
            Instruction::Jmpigk { k, rc } => format!("JMPIGK {}, r{}", k, rc),
            Instruction::Jmpilk { k, rc } => format!("JMPILK {}, r{}", k, rc),
            Instruction::Jmpiek { k, rc } => format!("JMPIEK {}, r{}", k, rc),
            Instruction::Addi { rd, k } => format!("ADDI r{}, {}", rd, k),
            Instruction::Subi { rd, k } => format!("SUBI r{}, {}", rd, k),
            Instruction::Add { rd, rs } => format!("ADD r{}, r{}", rd, rs),
            Instruction::Sub { rd, rs } => format!("SUB r{}, r{}", rd, rs),
            Instruction::Mult { rd, rs } => format!("MULT r{}, r{}", rd, rs),
            Instruction::Ldi { rd, k } => format!("LDI r{}, {}", rd, k),
            Instruction::Ldd { rd, a } => format!("LDD r{}, [{}]", rd, a),
            Instruction::Std { rs, a } => format!("STD [{}], r{}", a, rs),
            Instruction::Ldx { rd, ra } => format!("LDX r{}, [r{}]", rd, ra),
            Instruction::Stx { ra, rs } => format!("STX [r{}], r{}", ra, rs),
            Instruction::Move { rd, rs } => format!("MOVE r{}, r{}", rd, rs),
            Instruction::Syscall => "SYSCALL".to_string(),
            Instruction::Stop => "STOP".to_string(),
        }
    }
}
