use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use types::{PageTableEntry, Pid, Word};
use vm::registers::Registers;
use vm::CPU;

/// Saved user context of a process that is not on the CPU.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct TrapFrame {
    pub pc: i32,
    pub regs: Registers,
}

impl TrapFrame {
    pub fn capture(cpu: &CPU) -> Self {
        let (pc, regs) = cpu.context();
        Self { pc, regs }
    }
}

impl fmt::Debug for TrapFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrapFrame")
            .field("pc", &self.pc)
            .field("regs", &self.regs)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessState {
    Ready,
    Running,
    Blocked,
    Terminated,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessState::Ready => "READY",
            ProcessState::Running => "RUNNING",
            ProcessState::Blocked => "BLOCKED",
            ProcessState::Terminated => "TERMINATED",
        };
        f.write_str(name)
    }
}

/// Which blocked queue a process waits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// Console transfer.
    Io,
    /// Page transfer.
    Vm,
}

/// Process control block.
#[derive(Debug)]
pub struct Pcb {
    pub id: Pid,
    pub name: String,
    pub tf: TrapFrame,
    pub page_table: Vec<PageTableEntry>,
    pub state: ProcessState,
    /// Program image pages are loaded from until they are written to swap.
    pub image: Arc<[Word]>,
    /// Swap slot reserved for each page that has been written back.
    pub swap_slots: BTreeMap<usize, usize>,
}

impl Pcb {
    pub fn new(id: Pid, name: &str, image: Arc<[Word]>, pages: usize) -> Self {
        Self {
            id,
            name: name.to_string(),
            tf: TrapFrame::default(),
            page_table: vec![PageTableEntry::new(); pages],
            state: ProcessState::Ready,
            image,
            swap_slots: BTreeMap::new(),
        }
    }

    /// Words of `page` as stored in the image. Shorter than a page for the
    /// last page, empty past the end.
    pub fn image_page(&self, page: usize, page_size: usize) -> &[Word] {
        let start = (page * page_size).min(self.image.len());
        let end = (start + page_size).min(self.image.len());
        &self.image[start..end]
    }
}
