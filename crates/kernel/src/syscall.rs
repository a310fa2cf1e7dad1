//! Console syscalls: r8 selects the operation, r9 holds the logical address.

use types::Interrupt;
use vm::mmu;
use vm::registers::{syscall_addr, syscall_op};
use vm::{Dispatch, CPU};

use crate::device::{IoOp, IoRequest};
use crate::os::Os;
use crate::task::BlockReason;

impl Os {
    pub(crate) fn syscall(&mut self, cpu: &mut CPU) -> Dispatch {
        let Some(pid) = self.running else {
            return Dispatch::Resume;
        };
        let code = syscall_op(&cpu.regs);
        let logical = syscall_addr(&cpu.regs);

        let Some(op) = IoOp::from_code(code) else {
            self.journal
                .note(format_args!("P{}: invalid syscall parameter {}", pid, code));
            cpu.pc += 1;
            return Dispatch::Resume;
        };

        let ps = self.page_size();
        let memory_size = self.memory.size();
        let Some(table) = self.pcbs.get(&pid).map(|p| p.page_table.as_slice()) else {
            return Dispatch::Resume;
        };

        // The transfer targets physical memory, so the page must be resident
        // before anything is queued. A miss goes through the fault path with
        // the PC still on SYSCALL.
        if let Err(fault) = mmu::resident_page(logical, table, ps) {
            return self.interrupt(cpu, Interrupt::from(fault));
        }
        let physical = match mmu::translate(logical, table, ps, memory_size) {
            Ok(t) => t.physical,
            Err(fault) => return self.interrupt(cpu, Interrupt::from(fault)),
        };

        cpu.pc += 1;
        let value = match op {
            IoOp::Read => None,
            IoOp::Write => Some(self.memory.read(physical).map(|w| w.p).unwrap_or(0)),
        };
        // Pin the frame until the transfer completes.
        self.frames.set_busy(physical / ps, true);
        self.device_queue.push(IoRequest {
            pid,
            op,
            address: physical,
            value,
        });
        self.block_running(cpu, BlockReason::Io);
        Dispatch::Switched
    }
}
