use types::{in_range, Interrupt, Word, REGISTER_COUNT};

use crate::decoder::decode;
use crate::host_interface::{Dispatch, HostInterface};
use crate::instruction::Instruction;
use crate::mmu::{self, Translation};
use crate::registers::{self, Registers};

/// The emulated processor.
///
/// Executes one instruction per `step`. Conditions detected while executing
/// are parked in a single pending slot and dispatched to the host at the start
/// of the next step, so a faulting instruction is abandoned whole and retried
/// once the handler has resolved the fault.
#[derive(Debug)]
pub struct CPU {
    /// Logical program counter of the installed process.
    pub pc: i32,
    pub regs: Registers,
    /// Print every instruction before executing it.
    pub verbose: bool,
    page_size: usize,
    irpt: Option<Interrupt>,
    instruction_counter: usize,
    stopped: bool,
}

enum Flow {
    Next,
    Switched,
}

impl CPU {
    /// A stopped CPU with cleared registers.
    pub fn new(page_size: usize) -> Self {
        Self {
            pc: 0,
            regs: [0; REGISTER_COUNT],
            verbose: false,
            page_size,
            irpt: None,
            instruction_counter: 0,
            stopped: true,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn start(&mut self) {
        self.stopped = false;
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_running(&self) -> bool {
        !self.stopped
    }

    /// Installs a saved context. Any pending condition belonged to the
    /// previous process and is discarded.
    pub fn set_context(&mut self, pc: i32, regs: Registers) {
        self.pc = pc;
        self.regs = regs;
        self.irpt = None;
    }

    pub fn context(&self) -> (i32, Registers) {
        (self.pc, self.regs)
    }

    pub fn reset_instruction_counter(&mut self) {
        self.instruction_counter = 0;
    }

    pub fn instruction_counter(&self) -> usize {
        self.instruction_counter
    }

    pub fn pending_interrupt(&self) -> Option<&Interrupt> {
        self.irpt.as_ref()
    }

    /// Runs one cycle: pending interrupt, fetch, decode, execute, quantum check.
    pub fn step(&mut self, quantum: usize, host: &mut dyn HostInterface) {
        if self.stopped {
            return;
        }

        if let Some(irpt) = self.irpt.take() {
            let dispatch = host.handle_interrupt(self, irpt);
            if self.stopped || dispatch == Dispatch::Switched {
                return;
            }
        }

        // Fetch. A fault here leaves the PC untouched; it fires next step.
        let fetched = match self.translate(self.pc, host) {
            Ok(t) => t,
            Err(irpt) => {
                self.irpt = Some(irpt);
                return;
            }
        };
        let word = host.memory().read(fetched.physical).unwrap_or(Word::EMPTY);

        let decoded = decode(&word);
        if self.verbose {
            let text = decoded.map(|i| i.pretty_print()).unwrap_or_else(|| word.to_string());
            println!("regs: {}", registers::render(&self.regs));
            println!("pc(log) {} -> pc(phys) {}       exec: {}", self.pc, fetched.physical, text);
        }

        let Some(instr) = decoded else {
            self.irpt = Some(Interrupt::InvalidInstruction);
            return;
        };

        let old_pc = self.pc;
        match self.execute(instr, host) {
            Ok(Flow::Switched) => return,
            Ok(Flow::Next) => {}
            Err(irpt) => {
                if matches!(irpt, Interrupt::PageFault { .. }) {
                    self.pc = old_pc;
                }
                self.irpt = Some(irpt);
            }
        }

        if self.irpt.is_none() {
            self.instruction_counter += 1;
            if self.instruction_counter >= quantum {
                self.irpt = Some(Interrupt::QuantumEnd);
            }
        }
    }

    fn translate(&self, logical: i32, host: &mut dyn HostInterface) -> Result<Translation, Interrupt> {
        let memory_size = host.memory().size();
        mmu::translate(logical, host.page_table(), self.page_size, memory_size).map_err(Interrupt::from)
    }

    fn load(&self, logical: i32, host: &mut dyn HostInterface) -> Result<i32, Interrupt> {
        let t = self.translate(logical, host)?;
        host.memory()
            .read(t.physical)
            .map(|w| w.p)
            .ok_or(Interrupt::InvalidAddress)
    }

    fn store(&self, logical: i32, value: i32, host: &mut dyn HostInterface) -> Result<(), Interrupt> {
        let t = self.translate(logical, host)?;
        if !host.memory().write(t.physical, Word::data(value)) {
            return Err(Interrupt::InvalidAddress);
        }
        if let Some(entry) = host.page_table().get_mut(t.page) {
            entry.dirty = true;
        }
        Ok(())
    }

    fn arith(&mut self, rd: usize, result: i64) -> Result<(), Interrupt> {
        if !in_range(result) {
            return Err(Interrupt::Overflow);
        }
        self.regs[rd] = result as i32;
        self.pc += 1;
        Ok(())
    }

    fn branch(&mut self, taken: bool, target: i32) {
        self.pc = if taken { target } else { self.pc + 1 };
    }

    fn execute(&mut self, instr: Instruction, host: &mut dyn HostInterface) -> Result<Flow, Interrupt> {
        let r = self.regs;
        match instr {
            Instruction::Ldi { rd, k } => {
                self.regs[rd] = k;
                self.pc += 1;
            }
            Instruction::Ldd { rd, a } => {
                self.regs[rd] = self.load(a, host)?;
                self.pc += 1;
            }
            Instruction::Ldx { rd, ra } => {
                self.regs[rd] = self.load(r[ra], host)?;
                self.pc += 1;
            }
            Instruction::Std { rs, a } => {
                self.store(a, r[rs], host)?;
                self.pc += 1;
            }
            Instruction::Stx { ra, rs } => {
                self.store(r[ra], r[rs], host)?;
                self.pc += 1;
            }
            Instruction::Move { rd, rs } => {
                self.regs[rd] = r[rs];
                self.pc += 1;
            }

            Instruction::Add { rd, rs } => self.arith(rd, r[rd] as i64 + r[rs] as i64)?,
            Instruction::Addi { rd, k } => self.arith(rd, r[rd] as i64 + k as i64)?,
            Instruction::Sub { rd, rs } => self.arith(rd, r[rd] as i64 - r[rs] as i64)?,
            Instruction::Subi { rd, k } => self.arith(rd, r[rd] as i64 - k as i64)?,
            Instruction::Mult { rd, rs } => self.arith(rd, r[rd] as i64 * r[rs] as i64)?,

            Instruction::Jmp { a } => self.pc = a,
            Instruction::Jmpi { rs } => self.pc = r[rs],
            Instruction::Jmpig { rs, rc } => self.branch(r[rc] > 0, r[rs]),
            Instruction::Jmpil { rs, rc } => self.branch(r[rc] < 0, r[rs]),
            Instruction::Jmpie { rs, rc } => self.branch(r[rc] == 0, r[rs]),
            Instruction::Jmpigk { k, rc } => self.branch(r[rc] > 0, k),
            Instruction::Jmpilk { k, rc } => self.branch(r[rc] < 0, k),
            Instruction::Jmpiek { k, rc } => self.branch(r[rc] == 0, k),
            Instruction::Jmpim { a } => self.pc = self.load(a, host)?,
            Instruction::Jmpigm { a, rc } => {
                let target = self.load(a, host)?;
                self.branch(r[rc] > 0, target);
            }
            Instruction::Jmpilm { a, rc } => {
                let target = self.load(a, host)?;
                self.branch(r[rc] < 0, target);
            }
            Instruction::Jmpiem { a, rc } => {
                let target = self.load(a, host)?;
                self.branch(r[rc] == 0, target);
            }

            Instruction::Syscall => return Ok(Self::flow(host.handle_syscall(self))),
            Instruction::Stop => return Ok(Self::flow(host.handle_stop(self))),
        }
        Ok(Flow::Next)
    }

    fn flow(dispatch: Dispatch) -> Flow {
        match dispatch {
            Dispatch::Resume => Flow::Next,
            Dispatch::Switched => Flow::Switched,
        }
    }
}
