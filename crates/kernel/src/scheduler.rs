//! Process manager: PCB lifecycle and the dispatch loop.

use std::sync::Arc;

use types::{pages_for, Pid, Word};
use vm::CPU;

use crate::error::KernelError;
use crate::journal::{Reason, TransitionRecord};
use crate::os::Os;
use crate::task::{BlockReason, Pcb, ProcessState, TrapFrame};

impl Os {
    /// Creates a READY process with page 0 resident. The rest of the image
    /// is paged in on demand.
    pub fn create_process(&mut self, name: &str, image: Arc<[Word]>) -> Result<Pid, KernelError> {
        if image.is_empty() {
            return Err(KernelError::EmptyProgram);
        }
        let ps = self.page_size();
        let frame = self.frames.find_free_frame().ok_or(KernelError::OutOfFrames)?;

        let pid = self.next_pid;
        self.next_pid += 1;

        let pages = pages_for(image.len(), ps);
        let mut pcb = Pcb::new(pid, name, image, pages);
        self.memory.load_frame(frame, ps, pcb.image_page(0, ps));
        pcb.page_table[0].frame = frame;
        pcb.page_table[0].valid = true;
        self.frames.occupy(frame, pid, 0);

        self.journal.record(TransitionRecord::new(&pcb, Reason::Created, None));
        self.pcbs.insert(pid, pcb);
        self.ready.push_back(pid);
        Ok(pid)
    }

    /// Preempts the running process, if any, and runs the head of the ready queue.
    pub fn dispatch(&mut self, cpu: &mut CPU) {
        if let Some(pid) = self.running.take() {
            self.save_context(pid, cpu);
            self.transition(pid, ProcessState::Ready, Reason::QuantumEnd);
            self.ready.push_back(pid);
        }
        self.run_next(cpu);
    }

    /// Installs the head of the ready queue on the CPU, or stops the CPU if
    /// nothing is ready. The running slot must already be empty.
    pub(crate) fn run_next(&mut self, cpu: &mut CPU) {
        let Some(pid) = self.ready.pop_front() else {
            self.running = None;
            cpu.stop();
            self.journal.note("ready queue empty, cpu idle");
            return;
        };
        let Some(pcb) = self.pcbs.get(&pid) else {
            return self.run_next(cpu);
        };
        cpu.set_context(pcb.tf.pc, pcb.tf.regs);
        cpu.reset_instruction_counter();
        cpu.start();
        self.running = Some(pid);
        self.transition(pid, ProcessState::Running, Reason::Dispatched);
    }

    /// Moves the running process to the blocked queue for `reason` and
    /// dispatches the next one.
    pub(crate) fn block_running(&mut self, cpu: &mut CPU, reason: BlockReason) {
        let Some(pid) = self.running.take() else {
            return;
        };
        self.save_context(pid, cpu);
        match reason {
            BlockReason::Io => {
                self.blocked_io.push_back(pid);
                self.transition(pid, ProcessState::Blocked, Reason::BlockedIo);
            }
            BlockReason::Vm => {
                self.blocked_vm.push_back(pid);
                self.transition(pid, ProcessState::Blocked, Reason::BlockedVm);
            }
        }
        self.run_next(cpu);
    }

    /// Moves `pid` from the blocked queue for `reason` to the tail of the
    /// ready queue. Returns false if it was not waiting there.
    pub(crate) fn unblock(&mut self, pid: Pid, reason: BlockReason) -> bool {
        let (queue, record) = match reason {
            BlockReason::Io => (&mut self.blocked_io, Reason::UnblockedIo),
            BlockReason::Vm => (&mut self.blocked_vm, Reason::UnblockedVm),
        };
        let Some(pos) = queue.iter().position(|&p| p == pid) else {
            self.journal.note(format!("P{} is not blocked on {:?}", pid, reason));
            return false;
        };
        queue.remove(pos);
        self.ready.push_back(pid);
        self.transition(pid, ProcessState::Ready, record);
        true
    }

    /// Ends the running process and dispatches the next one.
    pub(crate) fn terminate_running(&mut self, cpu: &mut CPU, reason: Reason) {
        if let Some(pid) = self.running.take() {
            self.save_context(pid, cpu);
            self.destroy(pid, reason);
        }
        self.run_next(cpu);
    }

    /// Removes a process from wherever it is. If it was running, the next
    /// process is dispatched.
    pub fn remove_process(&mut self, cpu: &mut CPU, pid: Pid) -> Result<(), KernelError> {
        if !self.pcbs.contains_key(&pid) {
            return Err(KernelError::UnknownProcess(pid));
        }
        if self.running == Some(pid) {
            self.terminate_running(cpu, Reason::Removed);
            return Ok(());
        }
        self.ready.retain(|&p| p != pid);
        self.blocked_io.retain(|&p| p != pid);
        self.blocked_vm.retain(|&p| p != pid);
        self.destroy(pid, Reason::Removed);
        Ok(())
    }

    /// Drops the PCB and returns its frames and swap slots. Frames with a
    /// transfer in flight stay reserved until the completion arrives.
    fn destroy(&mut self, pid: Pid, reason: Reason) {
        let Some(mut pcb) = self.pcbs.remove(&pid) else {
            return;
        };
        self.frames.release_process(pid);
        for slot in pcb.swap_slots.values() {
            self.swap.release(*slot);
        }
        self.deferred.retain(|&(p, _)| p != pid);

        let from = pcb.state;
        pcb.state = ProcessState::Terminated;
        self.journal.record(TransitionRecord::new(&pcb, reason, Some(from)));
        self.retry_deferred();
    }

    fn save_context(&mut self, pid: Pid, cpu: &CPU) {
        if let Some(pcb) = self.pcbs.get_mut(&pid) {
            pcb.tf = TrapFrame::capture(cpu);
        }
    }

    fn transition(&mut self, pid: Pid, to: ProcessState, reason: Reason) {
        let Some(pcb) = self.pcbs.get_mut(&pid) else {
            return;
        };
        let from = pcb.state;
        pcb.state = to;
        self.journal.record(TransitionRecord::new(pcb, reason, Some(from)));
    }
}
