//! Compile-time tunables for the process table and scheduler.
//!
//! Kept as plain `pub const` items rather than a runtime config format:
//! there is nothing to read a config file *from* before the page
//! allocator and console exist, so every real xv6-style kernel in the
//! pack (and this one) centralizes its tunables here instead.

/// Maximum number of live processes the table can hold at once.
pub const MAX_PROCS: usize = 16;

/// Bytes in a single physical page. The only unit the page allocator
/// collaborator hands out or takes back.
pub const PAGE_SIZE: usize = 4096;

/// Architectural width of the RISC-V integer register file, including
/// `x0`. `Context` itself stores the 31 non-zero registers plus `pc`;
/// this constant documents the register file size that motivates it.
pub const N_REGS: usize = 32;

/// Ticks per wall-clock second, as reported by the time-source
/// collaborator.
pub const ONE_SECOND: u64 = 10_000_000;

/// How many ticks the scheduler asks the timer to wait before the next
/// tick while idling with nothing runnable.
pub const KERNEL_SCHEDULER_TICK_TIME: u64 = ONE_SECOND / 50;
