#![allow(dead_code)]

use types::{Interrupt, PageTableEntry, Word};
use vm::{Dispatch, HostInterface, Memory, CPU};

pub const PAGE_SIZE: usize = 8;

/// Minimal host: records what the CPU hands it and resolves nothing on its own.
#[derive(Debug)]
pub struct TestHost {
    pub memory: Memory,
    pub table: Vec<PageTableEntry>,
    pub interrupts: Vec<Interrupt>,
    pub syscalls: usize,
    pub stops: usize,
}

impl TestHost {
    /// Loads `program` with page i in frame i, every page resident.
    pub fn with_program(program: &[Word], frames: usize) -> Self {
        let mut memory = Memory::new(frames * PAGE_SIZE);
        let pages = (program.len() + PAGE_SIZE - 1) / PAGE_SIZE;
        let mut table = vec![PageTableEntry::new(); pages.max(1)];
        for (page, entry) in table.iter_mut().enumerate() {
            entry.frame = page;
            entry.valid = true;
            let start = page * PAGE_SIZE;
            let end = (start + PAGE_SIZE).min(program.len());
            memory.load_frame(page, PAGE_SIZE, &program[start..end]);
        }
        Self {
            memory,
            table,
            interrupts: Vec::new(),
            syscalls: 0,
            stops: 0,
        }
    }

    pub fn read(&self, physical: usize) -> Word {
        self.memory.read(physical).unwrap_or(Word::EMPTY)
    }
}

impl HostInterface for TestHost {
    fn memory(&mut self) -> &mut Memory {
        &mut self.memory
    }

    fn page_table(&mut self) -> &mut [PageTableEntry] {
        &mut self.table
    }

    fn handle_interrupt(&mut self, cpu: &mut CPU, irpt: Interrupt) -> Dispatch {
        let fatal = irpt.is_fatal();
        self.interrupts.push(irpt);
        if fatal {
            cpu.stop();
            return Dispatch::Switched;
        }
        Dispatch::Resume
    }

    fn handle_syscall(&mut self, cpu: &mut CPU) -> Dispatch {
        self.syscalls += 1;
        cpu.pc += 1;
        Dispatch::Resume
    }

    fn handle_stop(&mut self, cpu: &mut CPU) -> Dispatch {
        self.stops += 1;
        cpu.stop();
        Dispatch::Switched
    }
}

pub fn running_cpu() -> CPU {
    let mut cpu = CPU::new(PAGE_SIZE);
    cpu.start();
    cpu
}

pub fn run(cpu: &mut CPU, host: &mut TestHost, max_steps: usize) {
    for _ in 0..max_steps {
        if !cpu.is_running() {
            break;
        }
        cpu.step(1000, host);
    }
}
