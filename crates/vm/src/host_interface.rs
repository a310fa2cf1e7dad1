use types::{Interrupt, PageTableEntry};

use crate::cpu::CPU;
use crate::memory::Memory;

/// What the CPU should do after handing control to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Same process, keep going.
    Resume,
    /// The running process changed (or none is left); end the step.
    Switched,
}

/// The operating system side of the CPU.
///
/// The CPU owns registers, PC and the pending-interrupt slot; everything else
/// (physical memory, the installed page table, interrupt and syscall
/// handling) is reached through this trait.
pub trait HostInterface {
    fn memory(&mut self) -> &mut Memory;

    /// Page table of the process currently installed in the CPU.
    /// Empty when nothing is installed.
    fn page_table(&mut self) -> &mut [PageTableEntry];

    fn handle_interrupt(&mut self, cpu: &mut CPU, irpt: Interrupt) -> Dispatch;

    fn handle_syscall(&mut self, cpu: &mut CPU) -> Dispatch;

    fn handle_stop(&mut self, cpu: &mut CPU) -> Dispatch;
}
