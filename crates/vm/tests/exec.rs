mod common;

use common::{run, running_cpu, TestHost, PAGE_SIZE};
use types::{Interrupt, Opcode, Word, MAX_INT, MIN_INT};

fn w(op: Opcode, r1: i32, r2: i32, p: i32) -> Word {
    Word::new(op, r1, r2, p)
}

#[test]
fn test_factorial_program() {
    let program = vec![
        w(Opcode::Ldi, 0, -1, 5),
        w(Opcode::Ldi, 1, -1, 1),
        w(Opcode::Ldi, 6, -1, 1),
        w(Opcode::Ldi, 7, -1, 8),
        w(Opcode::Jmpie, 7, 0, -1),
        w(Opcode::Mult, 1, 0, -1),
        w(Opcode::Sub, 0, 6, -1),
        w(Opcode::Jmp, -1, -1, 4),
        w(Opcode::Std, 1, -1, 10),
        w(Opcode::Stop, -1, -1, -1),
        Word::data(0),
    ];
    let mut host = TestHost::with_program(&program, 2);
    let mut cpu = running_cpu();
    run(&mut cpu, &mut host, 200);

    assert_eq!(host.stops, 1);
    assert_eq!(cpu.regs[1], 120);
    assert_eq!(host.read(10), Word::data(120));
    assert!(host.interrupts.is_empty());
}

#[test]
fn test_store_marks_page_dirty_and_retags_cell() {
    let program = vec![
        w(Opcode::Ldi, 2, -1, 12),
        w(Opcode::Ldi, 3, -1, 42),
        w(Opcode::Stx, 2, 3, -1),
        w(Opcode::Stop, -1, -1, -1),
        Word::EMPTY,
        Word::EMPTY,
        Word::EMPTY,
        Word::EMPTY,
        Word::EMPTY,
        Word::EMPTY,
        Word::EMPTY,
        Word::EMPTY,
        w(Opcode::Ldi, 0, -1, 0),
    ];
    let mut host = TestHost::with_program(&program, 2);
    let mut cpu = running_cpu();
    run(&mut cpu, &mut host, 10);

    assert_eq!(host.read(12), Word::data(42));
    assert!(!host.table[0].dirty);
    assert!(host.table[1].dirty);
}

#[test]
fn test_arithmetic_bounds() {
    // Exactly at the bound is fine.
    let program = vec![
        w(Opcode::Ldi, 0, -1, MAX_INT - 1),
        w(Opcode::Addi, 0, -1, 1),
        w(Opcode::Ldi, 1, -1, MIN_INT + 1),
        w(Opcode::Subi, 1, -1, 1),
        w(Opcode::Stop, -1, -1, -1),
    ];
    let mut host = TestHost::with_program(&program, 1);
    let mut cpu = running_cpu();
    run(&mut cpu, &mut host, 10);
    assert!(host.interrupts.is_empty());
    assert_eq!(cpu.regs[0], MAX_INT);
    assert_eq!(cpu.regs[1], MIN_INT);

    // One past either bound overflows.
    for program in [
        vec![w(Opcode::Ldi, 0, -1, MAX_INT), w(Opcode::Addi, 0, -1, 1)],
        vec![w(Opcode::Ldi, 0, -1, MIN_INT), w(Opcode::Subi, 0, -1, 1)],
        vec![
            w(Opcode::Ldi, 0, -1, 200),
            w(Opcode::Ldi, 1, -1, 200),
            w(Opcode::Mult, 0, 1, -1),
        ],
    ] {
        let mut host = TestHost::with_program(&program, 1);
        let mut cpu = running_cpu();
        run(&mut cpu, &mut host, 10);
        assert_eq!(host.interrupts, vec![Interrupt::Overflow]);
        assert!(!cpu.is_running());
    }
}

#[test]
fn test_data_cell_is_invalid_instruction() {
    let program = vec![w(Opcode::Ldi, 0, -1, 1), Word::data(7)];
    let mut host = TestHost::with_program(&program, 1);
    let mut cpu = running_cpu();
    run(&mut cpu, &mut host, 10);
    assert_eq!(host.interrupts, vec![Interrupt::InvalidInstruction]);
}

#[test]
fn test_out_of_table_address_is_invalid() {
    let program = vec![w(Opcode::Ldd, 0, -1, 100), w(Opcode::Stop, -1, -1, -1)];
    let mut host = TestHost::with_program(&program, 4);
    let mut cpu = running_cpu();
    run(&mut cpu, &mut host, 10);
    assert_eq!(host.interrupts, vec![Interrupt::InvalidAddress]);
    assert_eq!(cpu.pc, 0);
}

#[test]
fn test_conditional_jumps() {
    let program = vec![
        w(Opcode::Ldi, 0, -1, -3),
        w(Opcode::Jmpilk, -1, 0, 4),
        w(Opcode::Ldi, 5, -1, 111),
        w(Opcode::Stop, -1, -1, -1),
        w(Opcode::Ldi, 1, -1, 7),
        w(Opcode::Jmpigk, -1, 0, 2),
        w(Opcode::Jmpim, -1, -1, 8),
        w(Opcode::Stop, -1, -1, -1),
        Word::data(3),
    ];
    let mut host = TestHost::with_program(&program, 2);
    let mut cpu = running_cpu();
    run(&mut cpu, &mut host, 20);

    // -3 < 0 jumps to 4, -3 > 0 falls through, JMPIM lands on 3 which stops.
    assert_eq!(cpu.regs[1], 7);
    assert_eq!(cpu.regs[5], 0);
    assert_eq!(cpu.pc, 3);
    assert_eq!(host.stops, 1);
}

#[test]
fn test_quantum_end_raised_after_quantum_instructions() {
    let program = vec![
        w(Opcode::Ldi, 0, -1, 1),
        w(Opcode::Ldi, 1, -1, 2),
        w(Opcode::Ldi, 2, -1, 3),
        w(Opcode::Ldi, 3, -1, 4),
        w(Opcode::Stop, -1, -1, -1),
    ];
    let mut host = TestHost::with_program(&program, 1);
    let mut cpu = running_cpu();
    for _ in 0..3 {
        cpu.step(3, &mut host);
    }
    assert_eq!(cpu.pending_interrupt(), Some(&Interrupt::QuantumEnd));
    assert_eq!(cpu.pc, 3);

    // The next step dispatches it before fetching.
    cpu.step(3, &mut host);
    assert_eq!(host.interrupts, vec![Interrupt::QuantumEnd]);
}

#[test]
fn test_syscall_is_handed_to_host() {
    let program = vec![
        w(Opcode::Ldi, 8, -1, 2),
        w(Opcode::Ldi, 9, -1, 4),
        w(Opcode::Syscall, -1, -1, -1),
        w(Opcode::Stop, -1, -1, -1),
        Word::data(9),
    ];
    let mut host = TestHost::with_program(&program, 1);
    let mut cpu = running_cpu();
    run(&mut cpu, &mut host, 10);
    assert_eq!(host.syscalls, 1);
    assert_eq!(host.stops, 1);
    assert_eq!(cpu.pc, 3);
}

#[test]
fn test_page_size_is_reported() {
    assert_eq!(running_cpu().page_size(), PAGE_SIZE);
}
