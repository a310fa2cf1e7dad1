use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use types::{Interrupt, Pid};

use crate::queue::lock;

/// Console operation selected by r8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    Read = 1,
    Write = 2,
}

impl IoOp {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(IoOp::Read),
            2 => Some(IoOp::Write),
            _ => None,
        }
    }
}

/// One console transfer against a physical address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoRequest {
    pub pid: Pid,
    pub op: IoOp,
    pub address: usize,
    /// Value to print, for writes.
    pub value: Option<i32>,
}

/// Source of input values and sink of output values for processes.
///
/// Several console workers call into the device at once. A read may block,
/// so implementations lock only the state each operation touches.
pub trait ConsoleDevice: Send + Sync {
    fn read(&self, pid: Pid) -> i32;
    fn write(&self, pid: Pid, value: i32);
}

/// Console fed from a fixed list of inputs, recording every output.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    inputs: Mutex<VecDeque<i32>>,
    outputs: Arc<Mutex<Vec<(Pid, i32)>>>,
}

impl ScriptedConsole {
    pub fn new(inputs: impl IntoIterator<Item = i32>) -> Self {
        Self {
            inputs: Mutex::new(inputs.into_iter().collect()),
            outputs: Arc::default(),
        }
    }

    /// Handle to the outputs, still readable after the console is moved into a kernel.
    pub fn outputs(&self) -> Arc<Mutex<Vec<(Pid, i32)>>> {
        Arc::clone(&self.outputs)
    }
}

impl ConsoleDevice for ScriptedConsole {
    /// Reads 0 once the script runs out.
    fn read(&self, _pid: Pid) -> i32 {
        lock(&self.inputs).pop_front().unwrap_or(0)
    }

    fn write(&self, pid: Pid, value: i32) {
        lock(&self.outputs).push((pid, value));
    }
}

pub struct DeviceManager {
    console: Box<dyn ConsoleDevice>,
    latency: Duration,
}

impl DeviceManager {
    pub fn new(console: Box<dyn ConsoleDevice>, latency: Duration) -> Self {
        Self {
            console,
            latency,
        }
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub fn perform(&self, request: IoRequest) -> Interrupt {
        let value = match request.op {
            IoOp::Read => Some(self.console.read(request.pid)),
            IoOp::Write => {
                self.console.write(request.pid, request.value.unwrap_or(0));
                None
            }
        };
        Interrupt::IoComplete {
            pid: request.pid,
            address: request.address,
            value,
        }
    }
}
