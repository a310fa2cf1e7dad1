//! The machine: CPU, kernel state and the workers around them.
//!
//! All process and frame state sits behind one mutex. In blocking mode the
//! caller drives everything from [`Kernel::step`]; in continuous mode a
//! scheduler thread steps the CPU while disk and console workers drain their
//! queues and feed completions back through the interrupt handler.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use types::{Interrupt, PageTableEntry, Pid, Word};
use vm::{HostInterface, CPU};

use crate::config::KernelConfig;
use crate::device::{ConsoleDevice, DeviceManager, IoRequest};
use crate::disk::{DiskManager, DiskRequest};
use crate::error::KernelError;
use crate::journal::TransitionRecord;
use crate::mmu::Frame;
use crate::os::{Os, Snapshot};
use crate::queue::{lock, RequestQueue};

struct System {
    cpu: CPU,
    os: Os,
    ticks: usize,
}

struct Shared {
    config: KernelConfig,
    system: Mutex<System>,
    /// Signalled whenever a process may have become ready.
    wake: Condvar,
    disk_queue: Arc<RequestQueue<DiskRequest>>,
    device_queue: Arc<RequestQueue<IoRequest>>,
    disk: DiskManager,
    devices: DeviceManager,
    continuous: AtomicBool,
    shutdown: AtomicBool,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, System> {
        lock(&self.system)
    }

    /// Hands a worker completion to the interrupt handler.
    fn complete(&self, irpt: Interrupt) {
        let mut guard = self.lock();
        let sys = &mut *guard;
        sys.os.handle_interrupt(&mut sys.cpu, irpt);
        drop(guard);
        self.wake.notify_all();
    }

    fn scheduler_loop(&self) {
        let quantum = self.config.quantum;
        loop {
            let mut guard = self.lock();
            while !self.shutdown.load(Ordering::SeqCst) && !guard.cpu.is_running() && !guard.os.has_ready() {
                guard = self.wake.wait(guard).unwrap_or_else(PoisonError::into_inner);
            }
            if self.shutdown.load(Ordering::SeqCst) {
                return;
            }
            let sys = &mut *guard;
            if !sys.cpu.is_running() {
                sys.os.dispatch(&mut sys.cpu);
            }
            sys.cpu.step(quantum, &mut sys.os);
            sys.ticks += 1;
            drop(guard);
            thread::yield_now();
        }
    }

    fn disk_loop(&self) {
        while let Some(request) = self.disk_queue.pop_blocking() {
            thread::sleep(self.disk.latency());
            let irpt = self.disk.perform(request);
            self.complete(irpt);
        }
    }

    fn device_loop(&self) {
        while let Some(request) = self.device_queue.pop_blocking() {
            thread::sleep(self.devices.latency());
            let irpt = self.devices.perform(request);
            self.complete(irpt);
        }
    }
}

pub struct Kernel {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Kernel {
    pub fn new(config: KernelConfig, console: Box<dyn ConsoleDevice>) -> Self {
        let disk_queue = Arc::new(RequestQueue::new());
        let device_queue = Arc::new(RequestQueue::new());
        let mut cpu = CPU::new(config.page_size);
        cpu.verbose = config.trace;
        let os = Os::new(config.clone(), Arc::clone(&disk_queue), Arc::clone(&device_queue));

        let shared = Shared {
            disk: DiskManager::new(config.page_size, config.disk_latency),
            devices: DeviceManager::new(console, config.device_latency),
            system: Mutex::new(System { cpu, os, ticks: 0 }),
            wake: Condvar::new(),
            disk_queue,
            device_queue,
            continuous: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            config,
        };
        Self {
            shared: Arc::new(shared),
            workers: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &KernelConfig {
        &self.shared.config
    }

    /// Sends every transition record to `sink` as a JSON line.
    pub fn set_journal_sink(&self, sink: Box<dyn Write + Send>) {
        self.shared.lock().os.journal_mut().set_sink(sink);
    }

    pub fn create_process(&self, name: &str, image: &[Word]) -> Result<Pid, KernelError> {
        let pid = self.shared.lock().os.create_process(name, Arc::from(image))?;
        self.shared.wake.notify_all();
        Ok(pid)
    }

    /// Creates a process from the built-in program table.
    pub fn spawn(&self, program: &str) -> Result<Pid, KernelError> {
        let found = programs::find(program).ok_or_else(|| KernelError::UnknownProgram(program.to_string()))?;
        self.create_process(found.name, &found.image)
    }

    pub fn remove_process(&self, pid: Pid) -> Result<(), KernelError> {
        let mut guard = self.shared.lock();
        let sys = &mut *guard;
        sys.os.remove_process(&mut sys.cpu, pid)?;
        drop(guard);
        self.shared.wake.notify_all();
        Ok(())
    }

    pub fn is_continuous(&self) -> bool {
        self.shared.continuous.load(Ordering::SeqCst)
    }

    /// One iteration of blocking mode: a CPU step if a process is running,
    /// otherwise one pending transfer, otherwise a dispatch. Returns false
    /// once there is nothing left to do.
    pub fn step(&self) -> Result<bool, KernelError> {
        if self.is_continuous() {
            return Err(KernelError::WrongMode);
        }
        let mut guard = self.shared.lock();
        let sys = &mut *guard;
        if sys.cpu.is_running() {
            sys.cpu.step(self.shared.config.quantum, &mut sys.os);
            sys.ticks += 1;
            if sys.ticks % self.shared.config.blocking_io_interval == 0 {
                self.service_one(sys);
            }
            return Ok(true);
        }
        if self.service_one(sys) {
            return Ok(true);
        }
        if sys.os.has_ready() {
            sys.os.dispatch(&mut sys.cpu);
            return Ok(true);
        }
        Ok(false)
    }

    /// Runs until no process is ready, running or waiting on a transfer.
    /// Returns the number of iterations taken.
    pub fn run_blocking(&self) -> Result<usize, KernelError> {
        let mut steps = 0;
        while self.step()? {
            steps += 1;
        }
        Ok(steps)
    }

    /// Completes the oldest disk request, else the oldest console request.
    fn service_one(&self, sys: &mut System) -> bool {
        let irpt = if let Some(request) = self.shared.disk_queue.try_pop() {
            self.shared.disk.perform(request)
        } else if let Some(request) = self.shared.device_queue.try_pop() {
            self.shared.devices.perform(request)
        } else {
            return false;
        };
        sys.os.handle_interrupt(&mut sys.cpu, irpt);
        true
    }

    /// Switches to continuous mode: starts the scheduler thread, the disk
    /// worker and the console workers.
    pub fn start_continuous(&self) -> Result<(), KernelError> {
        if self.shared.continuous.swap(true, Ordering::SeqCst) {
            return Err(KernelError::AlreadyContinuous);
        }
        let mut workers = lock(&self.workers);

        let shared = Arc::clone(&self.shared);
        workers.push(thread::spawn(move || shared.scheduler_loop()));

        let shared = Arc::clone(&self.shared);
        workers.push(thread::spawn(move || shared.disk_loop()));

        for _ in 0..self.shared.config.device_workers {
            let shared = Arc::clone(&self.shared);
            workers.push(thread::spawn(move || shared.device_loop()));
        }
        drop(workers);
        self.shared.wake.notify_all();
        Ok(())
    }

    /// Stops every worker thread. Requests still queued are abandoned.
    pub fn shutdown(&self) {
        self.shared.shutdown.store(true, Ordering::SeqCst);
        self.shared.disk_queue.close();
        self.shared.device_queue.close();
        {
            let _guard = self.shared.lock();
            self.shared.wake.notify_all();
        }
        let handles: Vec<_> = lock(&self.workers).drain(..).collect();
        for handle in handles {
            if handle.join().is_err() {
                eprintln!("kernel: worker thread panicked");
            }
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.shared.lock().os.snapshot()
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.shared.lock().os.frames().frames().to_vec()
    }

    pub fn page_table(&self, pid: Pid) -> Option<Vec<PageTableEntry>> {
        self.shared.lock().os.page_table_of(pid).map(<[_]>::to_vec)
    }

    pub fn pending_disk_requests(&self) -> Vec<DiskRequest> {
        self.shared.disk_queue.snapshot()
    }

    pub fn pending_io_requests(&self) -> Vec<IoRequest> {
        self.shared.device_queue.snapshot()
    }

    pub fn read_physical(&self, address: usize) -> Option<Word> {
        self.shared.lock().os.physical_memory().read(address)
    }

    pub fn dump_process(&self, pid: Pid) -> Result<String, KernelError> {
        self.shared.lock().os.dump_process(pid)
    }

    pub fn dump_memory(&self, start: usize, end: usize) -> String {
        self.shared.lock().os.dump_memory(start, end)
    }

    /// Turns instruction and transition tracing on or off.
    pub fn set_trace(&self, on: bool) {
        let mut guard = self.shared.lock();
        guard.cpu.verbose = on;
        guard.os.journal_mut().verbose = on;
    }

    pub fn records(&self) -> Vec<TransitionRecord> {
        self.shared.lock().os.journal().records()
    }

    /// CPU steps taken so far.
    pub fn ticks(&self) -> usize {
        self.shared.lock().ticks
    }
}

impl Drop for Kernel {
    fn drop(&mut self) {
        self.shutdown();
    }
}
