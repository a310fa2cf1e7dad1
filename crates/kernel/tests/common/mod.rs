#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use kernel::{Kernel, KernelConfig, ProcessState, ScriptedConsole};
use types::{Opcode, Pid, Word};

pub type Outputs = Arc<Mutex<Vec<(Pid, i32)>>>;

pub fn w(op: Opcode, r1: i32, r2: i32, p: i32) -> Word {
    Word::new(op, r1, r2, p)
}

/// Memory of `frames` frames of 16 words, quantum 4, completions serviced
/// only when the CPU is idle.
pub fn small_config(frames: usize) -> KernelConfig {
    KernelConfig::default()
        .with_memory_size(frames * 16)
        .with_page_size(16)
        .with_quantum(4)
        .with_blocking_io_interval(1_000_000)
        .with_disk_latency(Duration::from_millis(1))
        .with_device_latency(Duration::from_millis(1))
}

pub fn kernel_with_inputs(config: KernelConfig, inputs: Vec<i32>) -> (Kernel, Outputs) {
    let console = ScriptedConsole::new(inputs);
    let outputs = console.outputs();
    (Kernel::new(config, Box::new(console)), outputs)
}

pub fn outputs_of(outputs: &Outputs) -> Vec<(Pid, i32)> {
    outputs.lock().map(|o| o.clone()).unwrap_or_default()
}

/// At most one RUNNING process, and every live process in exactly one place.
pub fn assert_run_state(kernel: &Kernel) {
    let snap = kernel.snapshot();
    let running: Vec<_> = snap
        .processes
        .iter()
        .filter(|p| p.state == ProcessState::Running)
        .map(|p| p.id)
        .collect();
    assert!(running.len() <= 1, "several running: {:?}", running);
    assert_eq!(running.first().copied(), snap.running);

    let mut seen = HashSet::new();
    for pid in snap
        .ready
        .iter()
        .chain(&snap.blocked_io)
        .chain(&snap.blocked_vm)
        .chain(snap.running.iter())
    {
        assert!(seen.insert(*pid), "P{} queued twice: {:?}", pid, snap);
    }
    assert_eq!(seen.len(), snap.processes.len(), "{:?}", snap);
}

/// With no transfer in flight, occupied frames match valid PTEs.
pub fn assert_frame_accounting(kernel: &Kernel) {
    let frames = kernel.frames();
    if frames.iter().any(|f| f.busy) {
        return;
    }
    let occupied = frames.iter().filter(|f| f.owner.is_some()).count();
    let valid: usize = kernel
        .snapshot()
        .processes
        .iter()
        .filter_map(|p| kernel.page_table(p.id))
        .map(|table| table.iter().filter(|e| e.valid).count())
        .sum();
    assert_eq!(occupied, valid);
}

/// Steps in blocking mode until `done` holds. Panics after `max` steps.
pub fn step_until(kernel: &Kernel, max: usize, mut done: impl FnMut(&Kernel) -> bool) {
    for _ in 0..max {
        if done(kernel) {
            return;
        }
        assert!(kernel.step().expect("blocking mode"), "kernel went idle first");
    }
    panic!("condition not reached in {} steps", max);
}

/// Polls until every process is gone (continuous mode).
pub fn wait_until_empty(kernel: &Kernel, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if kernel.snapshot().processes.is_empty() {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("processes still alive: {:?}", kernel.snapshot());
}

/// `count` LDIs followed by STOP.
pub fn straight_line(count: usize) -> Vec<Word> {
    let mut image: Vec<Word> = (0..count).map(|i| w(Opcode::Ldi, 0, -1, i as i32)).collect();
    image.push(w(Opcode::Stop, -1, -1, -1));
    image
}
