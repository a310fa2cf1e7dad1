use std::fmt;

use types::Pid;

/// Errors returned to the operator by kernel operations.
///
/// Hardware conditions raised while a process executes are not errors; they
/// travel as interrupts and never leave the kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// No free frame for page 0 of a new process.
    OutOfFrames,
    UnknownProcess(Pid),
    UnknownProgram(String),
    /// A program image with no words.
    EmptyProgram,
    /// The operation is only available in blocking mode.
    WrongMode,
    AlreadyContinuous,
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::OutOfFrames => write!(f, "no free frame to load the process"),
            KernelError::UnknownProcess(pid) => write!(f, "process {} not found", pid),
            KernelError::UnknownProgram(name) => write!(f, "program '{}' not found", name),
            KernelError::EmptyProgram => write!(f, "program image is empty"),
            KernelError::WrongMode => write!(f, "not available in continuous mode"),
            KernelError::AlreadyContinuous => write!(f, "already running in continuous mode"),
        }
    }
}

impl std::error::Error for KernelError {}
