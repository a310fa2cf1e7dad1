use alloc::vec::Vec;

use crate::{Pid, Word};

/// Every condition the interrupt handler dispatches on.
///
/// The first five are raised by the CPU while executing the running process;
/// the completion variants are raised by the disk and device workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interrupt {
    /// The running process used up its quantum.
    QuantumEnd,
    /// A logical address was negative, past the page table or outside memory.
    InvalidAddress,
    /// The fetched cell does not decode to an executable instruction.
    InvalidInstruction,
    /// An arithmetic result left [MIN_INT, MAX_INT].
    Overflow,
    /// The referenced page is not resident.
    PageFault { page: usize },
    /// A console transfer finished. `value` is set for reads.
    IoComplete {
        pid: Pid,
        address: usize,
        value: Option<i32>,
    },
    /// A page was read from the image or swap and is ready for `frame`.
    PageInComplete {
        pid: Pid,
        page: usize,
        frame: usize,
        words: Vec<Word>,
    },
    /// The contents of `frame` reached swap.
    PageOutComplete { frame: usize },
}

impl Interrupt {
    /// Fatal conditions terminate the running process.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Interrupt::InvalidAddress | Interrupt::InvalidInstruction | Interrupt::Overflow
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Interrupt::QuantumEnd => "quantum-end",
            Interrupt::InvalidAddress => "invalid-address",
            Interrupt::InvalidInstruction => "invalid-instruction",
            Interrupt::Overflow => "overflow",
            Interrupt::PageFault { .. } => "page-fault",
            Interrupt::IoComplete { .. } => "io-complete",
            Interrupt::PageInComplete { .. } => "page-in-complete",
            Interrupt::PageOutComplete { .. } => "page-out-complete",
        }
    }
}
