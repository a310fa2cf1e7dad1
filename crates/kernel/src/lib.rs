pub mod config;
pub mod device;
pub mod disk;
pub mod error;
pub mod journal;
pub mod kernel;
pub mod mmu;
pub mod os;
pub mod queue;
mod scheduler;
mod syscall;
pub mod task;
mod trap;

pub use config::KernelConfig;
pub use device::{ConsoleDevice, IoOp, IoRequest, ScriptedConsole};
pub use disk::{DiskRequest, PageSource};
pub use error::KernelError;
pub use journal::{Reason, TransitionRecord};
pub use kernel::Kernel;
pub use mmu::Frame;
pub use os::{ProcessInfo, Snapshot};
pub use task::ProcessState;
