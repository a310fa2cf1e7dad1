pub mod cpu;
pub mod decoder;
pub mod host_interface;
pub mod instruction;
pub mod memory;
pub mod mmu;
pub mod registers;

pub use cpu::CPU;
pub use host_interface::{Dispatch, HostInterface};
pub use memory::Memory;
