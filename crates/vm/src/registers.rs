use types::{REGISTER_COUNT, SYSCALL_ADDR_REG, SYSCALL_OP_REG};

/// Register file of the CPU.
pub type Registers = [i32; REGISTER_COUNT];

/// Names used by traces and dumps.
pub const REGISTER_NAMES: [&str; REGISTER_COUNT] = ["r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9"];

/// Validates a register field of a word.
pub fn index(field: i32) -> Option<usize> {
    if field >= 0 && (field as usize) < REGISTER_COUNT {
        Some(field as usize)
    } else {
        None
    }
}

/// Syscall operation code (r8).
pub fn syscall_op(regs: &Registers) -> i32 {
    regs[SYSCALL_OP_REG]
}

/// Syscall target logical address (r9).
pub fn syscall_addr(regs: &Registers) -> i32 {
    regs[SYSCALL_ADDR_REG]
}

pub fn render(regs: &Registers) -> String {
    regs.iter()
        .zip(REGISTER_NAMES.iter())
        .map(|(value, name)| format!("{}:{}", name, value))
        .collect::<Vec<_>>()
        .join(" ")
}
