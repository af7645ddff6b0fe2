//! A single process-table slot (spec.md §3 "Process slot").

use crate::sync::Spinlock;
use crate::trap::Context;
use core::ptr::null_mut;

use super::state::ProcessState;

/// One entry in the fixed-capacity process table. Carries its own
/// lock, protecting every field below it per the locking discipline
/// in spec.md §5 (table lock first, then slot lock).
pub struct Process {
    pub lock: Spinlock,
    pub state: ProcessState,
    /// Monotonically assigned, stable for the slot's current
    /// occupancy.
    pub pid: u32,
    /// Index of the slot that forked this one, or `None` for root.
    /// A non-owning, potentially-stale back-reference — see the
    /// design notes on why this crate does not resolve it via a
    /// generation counter.
    pub parent: Option<usize>,
    /// Borrowed from the bundled-programs table; `'static` lifetime.
    pub name: &'static str,
    /// Saved trap-frame contents when not RUNNING; stale while
    /// RUNNING (invariant 4).
    pub context: Context,
    /// Exclusively-owned pointer to one page serving as the user
    /// stack. Null when the slot is AVAILABLE.
    pub stack_page: *mut u8,
    /// Deadline in time-source ticks; meaningful only while SLEEPING.
    pub wakeup_time: u64,
}

impl Process {
    pub const fn new() -> Process {
        Process {
            lock: Spinlock::new(),
            state: ProcessState::Available,
            pid: 0,
            parent: None,
            name: "",
            context: Context::new(),
            stack_page: null_mut(),
            wakeup_time: 0,
        }
    }

    pub fn is_available(&self) -> bool {
        self.state == ProcessState::Available
    }
}

impl Default for Process {
    fn default() -> Self {
        Self::new()
    }
}
