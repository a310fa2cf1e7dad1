use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use types::{Interrupt, PageTableEntry, Pid};
use vm::{Dispatch, HostInterface, Memory, CPU};

use crate::config::KernelConfig;
use crate::device::IoRequest;
use crate::disk::DiskRequest;
use crate::error::KernelError;
use crate::journal::Journal;
use crate::mmu::{FrameTable, SwapSlots};
use crate::queue::RequestQueue;
use crate::task::{Pcb, ProcessState};

/// Process listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub id: Pid,
    pub name: String,
    pub state: ProcessState,
    pub pc: i32,
}

/// Scheduler queues and process list at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub running: Option<Pid>,
    pub ready: Vec<Pid>,
    pub blocked_io: Vec<Pid>,
    pub blocked_vm: Vec<Pid>,
    pub processes: Vec<ProcessInfo>,
}

/// All kernel state that lives under the scheduler lock.
///
/// The scheduler, interrupt handler and syscall handler are implemented as
/// methods on this type in their own modules.
#[derive(Debug)]
pub struct Os {
    pub(crate) config: KernelConfig,
    pub(crate) memory: Memory,
    pub(crate) frames: FrameTable,
    pub(crate) swap: SwapSlots,
    pub(crate) pcbs: BTreeMap<Pid, Pcb>,
    pub(crate) ready: VecDeque<Pid>,
    pub(crate) blocked_io: VecDeque<Pid>,
    pub(crate) blocked_vm: VecDeque<Pid>,
    pub(crate) running: Option<Pid>,
    pub(crate) next_pid: Pid,
    /// Faults that found neither a free frame nor a victim.
    pub(crate) deferred: VecDeque<(Pid, usize)>,
    pub(crate) disk_queue: Arc<RequestQueue<DiskRequest>>,
    pub(crate) device_queue: Arc<RequestQueue<IoRequest>>,
    pub(crate) journal: Journal,
}

impl Os {
    pub fn new(
        config: KernelConfig,
        disk_queue: Arc<RequestQueue<DiskRequest>>,
        device_queue: Arc<RequestQueue<IoRequest>>,
    ) -> Self {
        Self {
            memory: Memory::new(config.memory_size),
            frames: FrameTable::new(config.frame_count()),
            swap: SwapSlots::default(),
            pcbs: BTreeMap::new(),
            ready: VecDeque::new(),
            blocked_io: VecDeque::new(),
            blocked_vm: VecDeque::new(),
            running: None,
            next_pid: 1,
            deferred: VecDeque::new(),
            disk_queue,
            device_queue,
            journal: Journal::new(config.trace),
            config,
        }
    }

    pub(crate) fn page_size(&self) -> usize {
        self.config.page_size
    }

    pub fn has_ready(&self) -> bool {
        !self.ready.is_empty()
    }

    pub fn frames(&self) -> &FrameTable {
        &self.frames
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn journal_mut(&mut self) -> &mut Journal {
        &mut self.journal
    }

    pub fn page_table_of(&self, pid: Pid) -> Option<&[PageTableEntry]> {
        self.pcbs.get(&pid).map(|p| p.page_table.as_slice())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            running: self.running,
            ready: self.ready.iter().copied().collect(),
            blocked_io: self.blocked_io.iter().copied().collect(),
            blocked_vm: self.blocked_vm.iter().copied().collect(),
            processes: self
                .pcbs
                .values()
                .map(|p| ProcessInfo {
                    id: p.id,
                    name: p.name.clone(),
                    state: p.state,
                    pc: p.tf.pc,
                })
                .collect(),
        }
    }

    /// PCB fields, page table and resident frames of one process.
    pub fn dump_process(&self, pid: Pid) -> Result<String, KernelError> {
        let pcb = self.pcbs.get(&pid).ok_or(KernelError::UnknownProcess(pid))?;
        let ps = self.page_size();
        let mut out = format!("--- process {} ({}) ---\n", pcb.id, pcb.name);
        out.push_str(&format!(
            "  state: {}, pc: {}, regs: {}\n",
            pcb.state,
            pcb.tf.pc,
            vm::registers::render(&pcb.tf.regs)
        ));
        out.push_str(&format!("  page table ({} entries):\n", pcb.page_table.len()));
        for (page, entry) in pcb.page_table.iter().enumerate() {
            match (entry.resident_frame(), entry.swap_slot()) {
                (Some(frame), _) => out.push_str(&format!(
                    "    page {:>2} -> frame {:>2} (dirty: {})\n",
                    page, frame, entry.dirty
                )),
                (None, Some(slot)) => {
                    out.push_str(&format!("    page {:>2} -> swap slot {}\n", page, slot))
                }
                (None, None) => out.push_str(&format!("    page {:>2} -> image\n", page)),
            }
        }
        for entry in pcb.page_table.iter().filter(|e| e.valid) {
            let start = entry.frame * ps;
            out.push_str(&format!("  frame {} [{}, {}):\n", entry.frame, start, start + ps));
            out.push_str(&self.memory.dump(start, start + ps));
        }
        Ok(out)
    }

    pub fn dump_memory(&self, start: usize, end: usize) -> String {
        self.memory.dump(start, end)
    }

    pub fn physical_memory(&self) -> &Memory {
        &self.memory
    }
}

impl HostInterface for Os {
    fn memory(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Page table of the running process; empty when nothing runs.
    fn page_table(&mut self) -> &mut [PageTableEntry] {
        match self.running.and_then(|pid| self.pcbs.get_mut(&pid)) {
            Some(pcb) => &mut pcb.page_table,
            None => Default::default(),
        }
    }

    fn handle_interrupt(&mut self, cpu: &mut CPU, irpt: Interrupt) -> Dispatch {
        self.interrupt(cpu, irpt)
    }

    fn handle_syscall(&mut self, cpu: &mut CPU) -> Dispatch {
        self.syscall(cpu)
    }

    fn handle_stop(&mut self, cpu: &mut CPU) -> Dispatch {
        self.terminate_running(cpu, crate::journal::Reason::Stopped);
        Dispatch::Switched
    }
}
