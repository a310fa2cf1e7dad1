/// Process identifier handed out by the process manager.
pub type Pid = usize;

/// Largest value a register or memory cell may hold after arithmetic.
pub const MAX_INT: i32 = 32767;
/// Smallest value a register or memory cell may hold after arithmetic.
/// The range is symmetric: the hardware has no representation for -32768.
pub const MIN_INT: i32 = -32767;

/// Number of general-purpose registers (r0..r9).
pub const REGISTER_COUNT: usize = 10;

/// Register holding the syscall operation code (1 = read, 2 = write).
pub const SYSCALL_OP_REG: usize = 8;
/// Register holding the logical address a syscall operates on.
pub const SYSCALL_ADDR_REG: usize = 9;

/// Returns true if `value` fits the CPU's integer range.
pub const fn in_range(value: i64) -> bool {
    value >= MIN_INT as i64 && value <= MAX_INT as i64
}
