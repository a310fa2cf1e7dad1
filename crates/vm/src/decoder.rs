use types::{Opcode, Word};

use crate::instruction::Instruction;
use crate::registers::index;

/// Decodes a memory cell into an executable instruction.
///
/// Returns None for cells that are not instructions (`DATA`, empty), for
/// `JMPIGT` (listed by the hardware but never implemented) and for words
/// whose register fields fall outside the register file.
pub fn decode(word: &Word) -> Option<Instruction> {
    let r1 = || index(word.r1);
    let r2 = || index(word.r2);
    let p = word.p;

    let instr = match word.opcode {
        Opcode::Data | Opcode::Empty | Opcode::Jmpigt => return None,
        Opcode::Jmp => Instruction::Jmp { a: p },
        Opcode::Jmpi => Instruction::Jmpi { rs: r1()? },
        Opcode::Jmpig => Instruction::Jmpig { rs: r1()?, rc: r2()? },
        Opcode::Jmpil => Instruction::Jmpil { rs: r1()?, rc: r2()? },
        Opcode::Jmpie => Instruction::Jmpie { rs: r1()?, rc: r2()? },
        Opcode::Jmpim => Instruction::Jmpim { a: p },
        Opcode::Jmpigm => Instruction::Jmpigm { a: p, rc: r2()? },
        Opcode::Jmpilm => Instruction::Jmpilm { a: p, rc: r2()? },
        Opcode::Jmpiem => Instruction::Jmpiem { a: p, rc: r2()? },
        Opcode::Jmpigk => Instruction::Jmpigk { k: p, rc: r2()? },
        Opcode::Jmpilk => Instruction::Jmpilk { k: p, rc: r2()? },
        Opcode::Jmpiek => Instruction::Jmpiek { k: p, rc: r2()? },
        Opcode::Addi => Instruction::Addi { rd: r1()?, k: p },
        Opcode::Subi => Instruction::Subi { rd: r1()?, k: p },
        Opcode::Add => Instruction::Add { rd: r1()?, rs: r2()? },
        Opcode::Sub => Instruction::Sub { rd: r1()?, rs: r2()? },
        Opcode::Mult => Instruction::Mult { rd: r1()?, rs: r2()? },
        Opcode::Ldi => Instruction::Ldi { rd: r1()?, k: p },
        Opcode::Ldd => Instruction::Ldd { rd: r1()?, a: p },
        Opcode::Std => Instruction::Std { rs: r1()?, a: p },
        Opcode::Ldx => Instruction::Ldx { rd: r1()?, ra: r2()? },
        Opcode::Stx => Instruction::Stx { ra: r1()?, rs: r2()? },
        Opcode::Move => Instruction::Move { rd: r1()?, rs: r2()? },
        Opcode::Syscall => Instruction::Syscall,
        Opcode::Stop => Instruction::Stop,
    };
    Some(instr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_and_empty_cells_are_not_instructions() {
        assert_eq!(decode(&Word::data(5)), None);
        assert_eq!(decode(&Word::EMPTY), None);
        assert_eq!(decode(&Word::new(Opcode::Jmpigt, 0, 1, 3)), None);
    }

    #[test]
    fn register_fields_are_validated() {
        assert_eq!(decode(&Word::new(Opcode::Ldi, 10, -1, 1)), None);
        assert_eq!(decode(&Word::new(Opcode::Add, 0, -1, -1)), None);
        assert_eq!(
            decode(&Word::new(Opcode::Stx, 2, 3, -1)),
            Some(Instruction::Stx { ra: 2, rs: 3 })
        );
        // JMPIGK only tests r2; r1 is ignored.
        assert_eq!(
            decode(&Word::new(Opcode::Jmpigk, -1, 5, 6)),
            Some(Instruction::Jmpigk { k: 6, rc: 5 })
        );
    }
}
