#![no_std]

extern crate alloc;

pub mod primitives;
pub use primitives::*;

pub mod word;
pub use word::{Opcode, Word};

pub mod mmu;
pub use mmu::{pages_for, PageTableEntry};

pub mod interrupt;
pub use interrupt::Interrupt;
