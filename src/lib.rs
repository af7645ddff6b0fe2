//! Process table, round-robin scheduler, and fork/exec/exit/sleep/wait
//! lifecycle for a single-hart RISC-V-class kernel.
//!
//! `#[cfg(test)]` builds pull in `std` (via `alloc`) so the core can be
//! exercised with plain `#[test]` functions against mock
//! `hal`/collaborator implementations; real `riscv64` builds stay
//! `no_std` and link against the thin bindings under each `hal::*::riscv`
//! module, selected by the `qemu-riscv64`/`milk-v` Cargo features.

#![cfg_attr(not(test), no_std)]
#![allow(clippy::missing_safety_doc)]
#![allow(dead_code)]

extern crate alloc;

pub mod error;
pub mod hal;
pub mod logging;
pub mod param;
pub mod proc;
pub mod sync;
pub mod syscall;
pub mod trap;

pub use error::{KernelError, KernelResult};
pub use proc::ProcessTable;
pub use trap::TRAP_FRAME;

/// The kernel's single process table (spec.md §3). `proc::init_process_table`
/// must run exactly once at boot, before interrupts are enabled, per
/// spec.md §4.2.
pub static PROC_TABLE: ProcessTable = ProcessTable::new();

/// The kernel's log sink, installed via `logging::KernelLogger::init`
/// once a concrete `hal::uart::Uart` binding exists, then registered
/// with `log::set_logger` exactly once at boot.
pub static LOGGER: logging::KernelLogger = logging::KernelLogger::new();

#[cfg(not(test))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {
        core::hint::spin_loop();
    }
}
