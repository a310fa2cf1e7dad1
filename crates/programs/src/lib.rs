//! Built-in program images.

use once_cell::sync::Lazy;
use types::{Opcode, Word};

#[derive(Debug, Clone)]
pub struct Program {
    pub name: &'static str,
    pub image: Vec<Word>,
}

const fn w(opcode: Opcode, r1: i32, r2: i32, p: i32) -> Word {
    Word::new(opcode, r1, r2, p)
}

const fn data(value: i32) -> Word {
    Word::data(value)
}

const NONE: i32 = -1;

pub static PROGRAMS: Lazy<Vec<Program>> = Lazy::new(|| {
    vec![
        Program {
            // 7! stored at [10].
            name: "fatorial",
            image: vec![
                w(Opcode::Ldi, 0, NONE, 7),
                w(Opcode::Ldi, 1, NONE, 1),
                w(Opcode::Ldi, 6, NONE, 1),
                w(Opcode::Ldi, 7, NONE, 8),
                w(Opcode::Jmpie, 7, 0, NONE),
                w(Opcode::Mult, 1, 0, NONE),
                w(Opcode::Sub, 0, 6, NONE),
                w(Opcode::Jmp, NONE, NONE, 4),
                w(Opcode::Std, 1, NONE, 10),
                w(Opcode::Stop, NONE, NONE, NONE),
                data(NONE),
            ],
        },
        Program {
            // 5! stored at [16], on the second page, then printed.
            name: "fatorial5",
            image: vec![
                w(Opcode::Ldi, 0, NONE, 5),
                w(Opcode::Ldi, 1, NONE, 1),
                w(Opcode::Ldi, 6, NONE, 1),
                w(Opcode::Ldi, 7, NONE, 8),
                w(Opcode::Jmpie, 7, 0, NONE),
                w(Opcode::Mult, 1, 0, NONE),
                w(Opcode::Sub, 0, 6, NONE),
                w(Opcode::Jmp, NONE, NONE, 4),
                w(Opcode::Std, 1, NONE, 16),
                w(Opcode::Ldi, 8, NONE, 2),
                w(Opcode::Ldi, 9, NONE, 16),
                w(Opcode::Syscall, NONE, NONE, NONE),
                w(Opcode::Stop, NONE, NONE, NONE),
                Word::EMPTY,
                Word::EMPTY,
                Word::EMPTY,
                data(NONE),
            ],
        },
        Program {
            // 6!, printed through the console; -1 is printed for a negative input.
            name: "fatorialV2",
            image: vec![
                w(Opcode::Ldi, 0, NONE, 6),
                w(Opcode::Std, 0, NONE, 19),
                w(Opcode::Ldd, 0, NONE, 19),
                w(Opcode::Ldi, 1, NONE, NONE),
                w(Opcode::Ldi, 2, NONE, 13),
                w(Opcode::Jmpil, 2, 0, NONE),
                w(Opcode::Ldi, 1, NONE, 1),
                w(Opcode::Ldi, 6, NONE, 1),
                w(Opcode::Ldi, 7, NONE, 13),
                w(Opcode::Jmpie, 7, 0, NONE),
                w(Opcode::Mult, 1, 0, NONE),
                w(Opcode::Sub, 0, 6, NONE),
                w(Opcode::Jmp, NONE, NONE, 9),
                w(Opcode::Std, 1, NONE, 18),
                w(Opcode::Ldi, 8, NONE, 2),
                w(Opcode::Ldi, 9, NONE, 18),
                w(Opcode::Syscall, NONE, NONE, NONE),
                w(Opcode::Stop, NONE, NONE, NONE),
                data(NONE),
                data(NONE),
            ],
        },
        Program {
            // First ten Fibonacci numbers at [20..30).
            name: "fibonacci10",
            image: {
                let mut image = vec![
                    w(Opcode::Ldi, 1, NONE, 0),
                    w(Opcode::Std, 1, NONE, 20),
                    w(Opcode::Ldi, 2, NONE, 1),
                    w(Opcode::Std, 2, NONE, 21),
                    w(Opcode::Ldi, 0, NONE, 22),
                    w(Opcode::Ldi, 6, NONE, 30),
                    w(Opcode::Move, 3, 1, NONE),
                    w(Opcode::Add, 3, 2, NONE),
                    w(Opcode::Stx, 0, 3, NONE),
                    w(Opcode::Move, 1, 2, NONE),
                    w(Opcode::Move, 2, 3, NONE),
                    w(Opcode::Addi, 0, NONE, 1),
                    w(Opcode::Move, 5, 6, NONE),
                    w(Opcode::Sub, 5, 0, NONE),
                    w(Opcode::Jmpigk, NONE, 5, 6),
                    w(Opcode::Stop, NONE, NONE, NONE),
                ];
                image.resize(30, data(NONE));
                image
            },
        },
        Program {
            // Stores and reloads a value on page 3, then prints it.
            name: "pagefault",
            image: {
                let mut image = vec![
                    w(Opcode::Ldi, 0, NONE, 99),
                    w(Opcode::Std, 0, NONE, 50),
                    w(Opcode::Ldd, 1, NONE, 50),
                    w(Opcode::Ldi, 8, NONE, 2),
                    w(Opcode::Ldi, 9, NONE, 50),
                    w(Opcode::Syscall, NONE, NONE, NONE),
                    w(Opcode::Stop, NONE, NONE, NONE),
                ];
                image.resize(51, Word::EMPTY);
                image[50] = data(0);
                image
            },
        },
        Program {
            name: "overflow",
            image: vec![
                w(Opcode::Ldi, 0, NONE, 32767),
                w(Opcode::Addi, 0, NONE, 1),
                w(Opcode::Stop, NONE, NONE, NONE),
            ],
        },
        Program {
            // Jumps onto a data cell.
            name: "invalid",
            image: vec![w(Opcode::Jmp, NONE, NONE, 2), w(Opcode::Stop, NONE, NONE, NONE), data(7)],
        },
        Program {
            // Loads from an address past its last page.
            name: "invalidAddress",
            image: vec![w(Opcode::Ldd, 0, NONE, 400), w(Opcode::Stop, NONE, NONE, NONE)],
        },
        Program {
            // Reads a number into [10] and prints it back.
            name: "input",
            image: vec![
                w(Opcode::Ldi, 8, NONE, 1),
                w(Opcode::Ldi, 9, NONE, 10),
                w(Opcode::Syscall, NONE, NONE, NONE),
                w(Opcode::Ldi, 8, NONE, 2),
                w(Opcode::Syscall, NONE, NONE, NONE),
                w(Opcode::Stop, NONE, NONE, NONE),
                Word::EMPTY,
                Word::EMPTY,
                Word::EMPTY,
                Word::EMPTY,
                data(0),
            ],
        },
        Program {
            name: "loop",
            image: vec![w(Opcode::Jmp, NONE, NONE, 0)],
        },
    ]
});

pub fn find(name: &str) -> Option<&'static Program> {
    PROGRAMS.iter().find(|p| p.name == name)
}

pub fn names() -> impl Iterator<Item = &'static str> {
    PROGRAMS.iter().map(|p| p.name)
}
