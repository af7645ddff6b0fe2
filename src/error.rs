//! Error types for the process-lifecycle operations.
//!
//! `proc/process.rs` expresses fallibility as a small `Copy +
//! PartialEq` enum (`ProcessError`) returned from `Result`. This keeps
//! that shape and layers `thiserror`'s `Display`/`Error` derive on
//! top, the way the other xv6-style kernels in the pack do in
//! `no_std` (`default-features = false`).

use thiserror::Error;

/// Failure kinds recognized by fork/exec/exit/wait/sleep, per the
/// three failure kinds the design calls out: resource exhaustion,
/// invalid argument, and the "unreachable" kernel-invariant violation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum KernelError {
    /// No free process slot was available for `alloc_process`.
    #[error("no free process slot")]
    NoFreeSlot,
    /// The page allocator had no page to hand out.
    #[error("out of physical pages")]
    OutOfMemory,
    /// `exec` was given a null or unknown program name.
    #[error("unknown or missing program name")]
    UnknownProgram,
    /// `current_proc()` returned `None` where the caller is only
    /// reachable from a running process. Indicates a kernel-invariant
    /// violation; the design reserves this for a panic hook, but the
    /// core itself stays infallible-at-the-type-level and surfaces it
    /// as an error instead of aborting so callers in test harnesses
    /// can observe it.
    #[error("current_proc() returned None outside a running process")]
    NoCurrentProcess,
}

pub type KernelResult<T> = Result<T, KernelError>;

/// Converts a `KernelResult` to the `-1`-on-error convention the
/// syscall ABI surface uses (spec §6/§7): `Ok(pid)` becomes the pid,
/// `Err(_)` becomes `-1`, mirroring how `sysproc.rs` turns
/// `Result<i32, ProcessError>` into raw ABI integers.
pub fn as_syscall_return(result: KernelResult<i64>) -> i64 {
    result.unwrap_or(-1)
}
