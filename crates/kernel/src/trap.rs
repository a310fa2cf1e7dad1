//! Interrupt handler and page-fault resolution.

use types::{Interrupt, Pid, Word};
use vm::{Dispatch, CPU};

use crate::disk::{DiskRequest, PageSource};
use crate::journal::Reason;
use crate::os::Os;
use crate::task::BlockReason;

impl Os {
    /// Single entry point for CPU conditions and worker completions.
    ///
    /// Returns `Switched` whenever the running process left the CPU.
    pub(crate) fn interrupt(&mut self, cpu: &mut CPU, irpt: Interrupt) -> Dispatch {
        self.journal.note(format_args!("interrupt: {}", irpt.name()));
        match irpt {
            Interrupt::QuantumEnd => {
                self.dispatch(cpu);
                Dispatch::Switched
            }
            Interrupt::InvalidAddress => self.fatal(cpu, Reason::InvalidAddress),
            Interrupt::InvalidInstruction => self.fatal(cpu, Reason::InvalidInstruction),
            Interrupt::Overflow => self.fatal(cpu, Reason::Overflow),
            Interrupt::PageFault { page } => {
                let Some(pid) = self.running else {
                    return Dispatch::Resume;
                };
                self.resolve_fault(pid, page);
                self.block_running(cpu, BlockReason::Vm);
                Dispatch::Switched
            }
            Interrupt::PageInComplete {
                pid,
                page,
                frame,
                words,
            } => {
                self.page_in_complete(pid, page, frame, &words);
                Dispatch::Resume
            }
            Interrupt::PageOutComplete { frame } => {
                self.page_out_complete(frame);
                Dispatch::Resume
            }
            Interrupt::IoComplete {
                pid,
                address,
                value,
            } => {
                self.io_complete(pid, address, value);
                Dispatch::Resume
            }
        }
    }

    fn fatal(&mut self, cpu: &mut CPU, reason: Reason) -> Dispatch {
        self.terminate_running(cpu, reason);
        Dispatch::Switched
    }

    /// Starts bringing (pid, page) in, or parks the fault until a frame is released.
    fn resolve_fault(&mut self, pid: Pid, page: usize) {
        if !self.try_resolve(pid, page) {
            self.journal
                .note(format_args!("P{} page {}: no frame available, deferred", pid, page));
            self.deferred.push_back((pid, page));
        }
    }

    fn try_resolve(&mut self, pid: Pid, page: usize) -> bool {
        if let Some(frame) = self.frames.find_free_frame() {
            self.frames.occupy(frame, pid, page);
            self.request_page_in(pid, page, frame);
            return true;
        }
        match self.frames.select_victim_frame() {
            Some(frame) => {
                self.evict(frame, pid, page);
                true
            }
            None => false,
        }
    }

    /// Takes `frame` from its owner for (pid, page).
    ///
    /// The victim loses the page immediately. A dirty victim is written back
    /// first and the load waits for that write; a clean one is overwritten
    /// directly.
    fn evict(&mut self, frame: usize, pid: Pid, page: usize) {
        let ps = self.page_size();
        let Some((victim_pid, victim_page)) = self.frames.get(frame).and_then(|f| f.owner) else {
            return;
        };
        let Some(victim) = self.pcbs.get_mut(&victim_pid) else {
            return;
        };
        let Some(entry) = victim.page_table.get_mut(victim_page) else {
            return;
        };
        entry.valid = false;
        self.journal.note(format_args!(
            "victim: P{} page {} in frame {} (dirty: {})",
            victim_pid, victim_page, frame, entry.dirty
        ));

        if !entry.dirty {
            self.frames.occupy(frame, pid, page);
            self.request_page_in(pid, page, frame);
            return;
        }

        let slot = match victim.swap_slots.get(&victim_page) {
            Some(&slot) => slot,
            None => {
                let slot = self.swap.allocate();
                victim.swap_slots.insert(victim_page, slot);
                slot
            }
        };
        let entry = &mut victim.page_table[victim_page];
        entry.dirty = false;
        entry.on_disk = true;
        entry.disk_address = slot;

        let words = self.memory.frame(frame, ps).to_vec();
        self.frames.set_waiter(frame, pid, page);
        self.frames.set_busy(frame, true);
        self.disk_queue.push(DiskRequest::PageOut {
            pid: victim_pid,
            page: victim_page,
            frame,
            disk_address: slot,
            words,
        });
    }

    /// Queues the load of (pid, page) into `frame`, which must already be
    /// owned by it.
    fn request_page_in(&mut self, pid: Pid, page: usize, frame: usize) {
        let Some(pcb) = self.pcbs.get(&pid) else {
            return;
        };
        let source = match pcb.page_table.get(page).and_then(|e| e.swap_slot()) {
            Some(slot) => PageSource::Swap(slot),
            None => PageSource::Image(pcb.image.clone()),
        };
        self.frames.set_busy(frame, true);
        self.disk_queue.push(DiskRequest::PageIn {
            pid,
            page,
            frame,
            source,
        });
    }

    fn page_in_complete(&mut self, pid: Pid, page: usize, frame: usize, words: &[Word]) {
        let ps = self.page_size();
        self.frames.set_busy(frame, false);

        let owned = self.frames.get(frame).and_then(|f| f.owner) == Some((pid, page));
        let entry = self
            .pcbs
            .get_mut(&pid)
            .and_then(|pcb| pcb.page_table.get_mut(page));
        match entry {
            Some(entry) if owned => {
                self.memory.load_frame(frame, ps, words);
                // A page read back from swap no longer matches swap once resident
                // again; it is written back on its next eviction.
                entry.dirty = entry.on_disk;
                entry.on_disk = false;
                entry.frame = frame;
                entry.valid = true;
                self.unblock(pid, BlockReason::Vm);
            }
            _ => {
                self.journal
                    .note(format_args!("page-in for dead P{} dropped, frame {} released", pid, frame));
            }
        }
        // The frame is a victim candidate again.
        self.retry_deferred();
    }

    fn page_out_complete(&mut self, frame: usize) {
        self.frames.set_busy(frame, false);
        let waiter = self.frames.take_waiter(frame);
        self.frames.free(frame);
        match waiter {
            Some((pid, page)) if self.pcbs.contains_key(&pid) => {
                self.frames.occupy(frame, pid, page);
                self.request_page_in(pid, page, frame);
            }
            _ => self.retry_deferred(),
        }
    }

    fn io_complete(&mut self, pid: Pid, address: usize, value: Option<i32>) {
        let ps = self.page_size();
        let frame = address / ps;
        self.frames.set_busy(frame, false);

        let Some(pcb) = self.pcbs.get_mut(&pid) else {
            self.journal
                .note(format_args!("console completion for dead P{} dropped", pid));
            self.retry_deferred();
            return;
        };
        if let Some(value) = value {
            self.memory.write(address, Word::data(value));
            if let Some(entry) = pcb
                .page_table
                .iter_mut()
                .find(|e| e.valid && e.frame == frame)
            {
                entry.dirty = true;
            }
        }
        self.unblock(pid, BlockReason::Io);
        self.retry_deferred();
    }

    /// Retries parked faults in order until one still cannot be served.
    pub(crate) fn retry_deferred(&mut self) {
        while let Some((pid, page)) = self.deferred.pop_front() {
            if !self.pcbs.contains_key(&pid) {
                continue;
            }
            if !self.try_resolve(pid, page) {
                self.deferred.push_front((pid, page));
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use types::{Opcode, Word};
    use vm::CPU;

    use crate::config::KernelConfig;
    use crate::device::{DeviceManager, IoRequest, ScriptedConsole};
    use crate::disk::{DiskManager, DiskRequest};
    use crate::os::Os;
    use crate::queue::RequestQueue;

    const PS: usize = 16;

    fn w(op: Opcode, r1: i32, r2: i32, p: i32) -> Word {
        Word::new(op, r1, r2, p)
    }

    struct Machine {
        os: Os,
        cpu: CPU,
        disk_queue: Arc<RequestQueue<DiskRequest>>,
        device_queue: Arc<RequestQueue<IoRequest>>,
        a: usize,
        b: usize,
        c: usize,
    }

    impl Machine {
        fn step_until(&mut self, done: impl Fn(&Os) -> bool) {
            for _ in 0..50 {
                if done(&self.os) {
                    return;
                }
                self.cpu.step(4, &mut self.os);
            }
            panic!("condition not reached: {:?}", self.os.snapshot());
        }

        fn deferred(&self) -> Vec<(usize, usize)> {
            self.os.deferred.iter().copied().collect()
        }
    }

    /// Two frames. `a` waits on a console read pinning frame 0, `b` waits on a
    /// page-in into frame 1, and `c` has no resident page, so its fault is
    /// parked.
    fn all_frames_busy() -> Machine {
        let config = KernelConfig::default()
            .with_memory_size(2 * PS)
            .with_page_size(PS)
            .with_quantum(4);
        let disk_queue = Arc::new(RequestQueue::new());
        let device_queue = Arc::new(RequestQueue::new());
        let mut os = Os::new(config, Arc::clone(&disk_queue), Arc::clone(&device_queue));
        let mut cpu = CPU::new(PS);

        let c = os
            .create_process("c", Arc::from(vec![w(Opcode::Ldi, 0, -1, 1), w(Opcode::Stop, -1, -1, -1)]))
            .expect("create c");
        os.frames.free(0);
        if let Some(pcb) = os.pcbs.get_mut(&c) {
            pcb.page_table[0].valid = false;
        }

        let reader = vec![
            w(Opcode::Ldi, 8, -1, 1),
            w(Opcode::Ldi, 9, -1, 14),
            w(Opcode::Syscall, -1, -1, -1),
            w(Opcode::Stop, -1, -1, -1),
        ];
        let a = os.create_process("a", Arc::from(reader)).expect("create a");

        let mut far = vec![w(Opcode::Ldd, 1, -1, 50), w(Opcode::Stop, -1, -1, -1)];
        far.resize(51, Word::EMPTY);
        far[50] = Word::data(99);
        let b = os.create_process("b", Arc::from(far)).expect("create b");

        os.ready.retain(|&p| p != c);
        os.ready.push_back(c);
        os.dispatch(&mut cpu);

        let mut machine = Machine {
            os,
            cpu,
            disk_queue,
            device_queue,
            a,
            b,
            c,
        };
        machine.step_until(|os| os.blocked_vm.contains(&c));

        assert_eq!(machine.deferred(), vec![(c, 0)]);
        assert!(machine.os.frames.frames().iter().all(|f| f.busy));
        assert!(!machine.cpu.is_running());
        machine
    }

    #[test]
    fn deferred_fault_resumes_after_page_in() {
        let mut m = all_frames_busy();
        let disk = DiskManager::new(PS, Duration::ZERO);

        let request = m.disk_queue.try_pop().expect("page-in for b");
        let irpt = disk.perform(request);
        m.os.interrupt(&mut m.cpu, irpt);

        assert!(m.deferred().is_empty());
        assert!(m.os.ready.contains(&m.b));
        // Frame 1 was clean, so c's load replaces b's page directly.
        let pending = m.disk_queue.snapshot();
        assert_eq!(pending.len(), 1);
        assert!(matches!(
            &pending[0],
            DiskRequest::PageIn { pid, page: 0, frame: 1, .. } if *pid == m.c
        ));
        assert_eq!(m.os.frames.get(1).and_then(|f| f.owner), Some((m.c, 0)));
        assert!(!m.os.pcbs[&m.b].page_table[3].valid);
    }

    #[test]
    fn deferred_fault_resumes_after_console_transfer() {
        let mut m = all_frames_busy();
        let devices = DeviceManager::new(Box::new(ScriptedConsole::new([7])), Duration::ZERO);

        let request = m.device_queue.try_pop().expect("read for a");
        let irpt = devices.perform(request);
        m.os.interrupt(&mut m.cpu, irpt);

        assert!(m.deferred().is_empty());
        assert!(m.os.ready.contains(&m.a));
        // The read dirtied frame 0, so it is written back before c's load.
        let frame = m.os.frames.get(0).copied().expect("frame 0");
        assert_eq!(frame.waiter, Some((m.c, 0)));
        assert!(frame.busy);
        let out = m
            .disk_queue
            .snapshot()
            .into_iter()
            .find_map(|r| match r {
                DiskRequest::PageOut { pid, frame: 0, words, .. } => Some((pid, words)),
                _ => None,
            })
            .expect("write-back of frame 0");
        assert_eq!(out.0, m.a);
        assert_eq!(out.1[14], Word::data(7));
    }
}
