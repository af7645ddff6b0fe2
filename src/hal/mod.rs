//! Hardware abstraction layer: the boundary spec.md §1 draws around
//! "external collaborators whose interfaces we cite but do not
//! design" — the page allocator, the timer, host-CPU primitives, the
//! UART, and the bundled-program table.
//!
//! Each collaborator is a small trait the process/scheduler core
//! depends on, plus a thin riscv64 binding (compiled only for that
//! target, selected by the `qemu-riscv64`/`milk-v` Cargo features) and,
//! under `#[cfg(test)]`, a host-backed mock so the core is testable
//! without hardware.

pub mod cpu;
pub mod page;
pub mod programs;
pub mod timer;
pub mod uart;

pub use cpu::HostCpu;
pub use page::PageAllocator;
pub use programs::{find_user_program, UserProgram};
pub use timer::TimeSource;
pub use uart::Uart;
