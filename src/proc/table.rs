//! The process table (spec.md §3, §4.2): a fixed array of slots plus
//! global bookkeeping shared between interrupt context and the normal
//! kernel path.

use core::cell::{Cell, UnsafeCell};

use crate::error::{KernelError, KernelResult};
use crate::param::MAX_PROCS;
use crate::sync::{Spinlock, SpinlockGuard};

use super::slot::Process;
use super::state::ProcessState;

const EMPTY_SLOT: UnsafeCell<Process> = UnsafeCell::new(Process::new());

/// Fixed-capacity process table plus the global bookkeeping spec.md
/// §3 names: `curr_proc`, `pid_counter`, `num_procs`, `is_idle`, and
/// the table-wide lock guarding all four.
pub struct ProcessTable {
    pub lock: Spinlock,
    slots: [UnsafeCell<Process>; MAX_PROCS],
    /// `-1` means "never scheduled yet" (invariant 6: `curr_proc in
    /// [-1, MAX_PROCS)`).
    curr_proc: Cell<i32>,
    pid_counter: Cell<u32>,
    num_procs: Cell<usize>,
    is_idle: Cell<bool>,
}

unsafe impl Sync for ProcessTable {}

impl ProcessTable {
    pub const fn new() -> ProcessTable {
        ProcessTable {
            lock: Spinlock::new(),
            slots: [EMPTY_SLOT; MAX_PROCS],
            curr_proc: Cell::new(-1),
            pid_counter: Cell::new(0),
            num_procs: Cell::new(0),
            is_idle: Cell::new(true),
        }
    }

    /// Resets every slot to AVAILABLE and the bookkeeping to its boot
    /// state — the bookkeeping half of spec.md §4.2's
    /// `init_process_table`. The other half, seeding statically-bundled
    /// initial processes, needs the page-allocator collaborator this
    /// type never touches, so it lives in
    /// `proc::lifecycle::init_process_table`, which calls this method
    /// first and then seeds. Must be called exactly once at boot,
    /// before interrupts are enabled.
    pub fn init(&self) {
        let _guard = self.lock.lock();
        self.curr_proc.set(-1);
        self.pid_counter.set(0);
        self.is_idle.set(true);
        self.num_procs.set(0);
        for i in 0..MAX_PROCS {
            unsafe {
                *self.slots[i].get() = Process::new();
            }
        }
    }

    /// # Safety
    /// The caller must hold (directly or transitively) either the
    /// table lock or the slot's own lock, per spec.md §5's locking
    /// discipline, before mutating the returned reference.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn slot_mut(&self, index: usize) -> &mut Process {
        &mut *self.slots[index].get()
    }

    pub fn curr_proc(&self) -> i32 {
        self.curr_proc.get()
    }

    pub fn set_curr_proc(&self, index: i32) {
        self.curr_proc.set(index);
    }

    pub fn num_procs(&self) -> usize {
        self.num_procs.get()
    }

    pub fn is_idle(&self) -> bool {
        self.is_idle.get()
    }

    pub fn set_is_idle(&self, idle: bool) {
        self.is_idle.set(idle);
    }

    /// Returns `pid_counter` then increments it, under the table lock
    /// (spec.md §4.2 `alloc_pid`). No recycling; a 32-bit counter wrap
    /// is a known, accepted limitation.
    pub fn alloc_pid(&self) -> u32 {
        let _guard = self.lock.lock();
        let pid = self.pid_counter.get();
        self.pid_counter.set(pid.wrapping_add(1));
        pid
    }

    /// Linearly searches for an AVAILABLE slot other than `curr_proc`,
    /// transitions it to READY, increments `num_procs`, and returns
    /// its index with its slot lock held (spec.md §4.2
    /// `alloc_process`). Excludes `curr_proc` so a fork can't reuse
    /// the currently-running slot as its own child.
    pub fn alloc_process(&self) -> KernelResult<SlotHandle<'_>> {
        let guard = self.lock.lock();
        let exclude = self.curr_proc.get();
        for i in 0..MAX_PROCS {
            if i as i32 == exclude {
                continue;
            }
            let proc = unsafe { self.slot_mut(i) };
            if proc.is_available() {
                let slot_guard = proc.lock.lock();
                proc.state = ProcessState::Ready;
                self.num_procs.set(self.num_procs.get() + 1);
                drop(guard);
                return Ok(SlotHandle {
                    table: self,
                    index: i,
                    _guard: slot_guard,
                });
            }
        }
        Err(KernelError::NoFreeSlot)
    }

    /// Resets `index` to AVAILABLE and decrements `num_procs` (spec.md
    /// §4.6 `exit`). The caller is responsible for reading whatever
    /// slot fields it still needs (parent, stack page) before calling
    /// this, since they are wiped.
    pub fn free_slot(&self, index: usize) {
        let _table_guard = self.lock.lock();
        let proc = unsafe { self.slot_mut(index) };
        let _slot_guard = proc.lock.lock();
        *proc = Process::new();
        self.num_procs.set(self.num_procs.get() - 1);
    }

    /// Returns the slot at `curr_proc`, or `None` if no process has
    /// ever been scheduled (spec.md §4.2 `current_proc`).
    pub fn current_proc(&self) -> Option<usize> {
        if self.num_procs.get() == 0 {
            return None;
        }
        let curr = self.curr_proc.get();
        if curr < 0 {
            None
        } else {
            Some(curr as usize)
        }
    }

    /// Count of slots whose state is not AVAILABLE. Exposed for
    /// invariant checks (spec.md §8 property 2); production code
    /// should prefer `num_procs()`, which is the authoritative,
    /// lock-protected counter.
    pub fn count_non_available(&self) -> usize {
        (0..MAX_PROCS)
            .filter(|&i| unsafe { !self.slot_mut(i).is_available() })
            .count()
    }

    pub const fn capacity() -> usize {
        MAX_PROCS
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

/// A process slot whose lock is held, returned by `alloc_process`.
pub struct SlotHandle<'t> {
    table: &'t ProcessTable,
    pub index: usize,
    _guard: SpinlockGuard<'t>,
}

impl<'t> SlotHandle<'t> {
    #[allow(clippy::mut_from_ref)]
    pub fn process(&self) -> &mut Process {
        unsafe { self.table.slot_mut(self.index) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_resets_bookkeeping() {
        let table = ProcessTable::new();
        table.init();
        assert_eq!(table.curr_proc(), -1);
        assert_eq!(table.num_procs(), 0);
        assert!(table.is_idle());
        assert_eq!(table.count_non_available(), 0);
    }

    #[test]
    fn alloc_process_excludes_curr_proc() {
        let table = ProcessTable::new();
        table.init();
        table.set_curr_proc(0);
        let handle = table.alloc_process().expect("a free slot should exist");
        assert_ne!(handle.index, 0);
        assert_eq!(handle.process().state, ProcessState::Ready);
        assert_eq!(table.num_procs(), 1);
    }

    #[test]
    fn alloc_process_fails_when_full() {
        let table = ProcessTable::new();
        table.init();
        let mut handles = alloc::vec::Vec::new();
        for _ in 0..MAX_PROCS {
            match table.alloc_process() {
                Ok(handle) => handles.push(handle),
                Err(_) => break,
            }
        }
        assert!(table.alloc_process().is_err());
    }

    #[test]
    fn current_proc_is_none_before_any_scheduling() {
        let table = ProcessTable::new();
        table.init();
        assert_eq!(table.current_proc(), None);
    }

    #[test]
    fn alloc_pid_is_monotonic() {
        let table = ProcessTable::new();
        table.init();
        let a = table.alloc_pid();
        let b = table.alloc_pid();
        assert!(b > a);
    }
}
