//! A minimal test-and-set spinlock, in `sync::spinlock`'s style: a
//! bare `AtomicBool` guarding nothing by itself — the data it protects
//! sits beside it, and a `SpinlockGuard` releases on drop.
//!
//! `lock()` does not touch interrupt state here, unlike a
//! multi-hart-capable version: this core has exactly one hart and
//! kernel code already runs with interrupts disabled from trap entry
//! to trap exit (§5), so there is no nested push/pop-off bookkeeping
//! to do here. That bookkeeping belongs to the trap-entry stub, out
//! of scope for this crate.

use core::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
pub struct Spinlock {
    locked: AtomicBool,
}

impl Spinlock {
    pub const fn new() -> Spinlock {
        Spinlock {
            locked: AtomicBool::new(false),
        }
    }

    /// Acquires the lock without returning a guard. Prefer `lock()`;
    /// this exists for call sites that must hold the lock across a
    /// borrow the guard's lifetime can't express (mirrors
    /// `lock_unguarded`).
    pub fn acquire(&self) {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            core::hint::spin_loop();
        }
    }

    pub fn release(&self) {
        self.locked.store(false, Ordering::Release);
    }

    pub fn lock(&self) -> SpinlockGuard<'_> {
        self.acquire();
        SpinlockGuard { lock: self }
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

pub struct SpinlockGuard<'l> {
    lock: &'l Spinlock,
}

impl<'l> Drop for SpinlockGuard<'l> {
    fn drop(&mut self) {
        self.lock.release();
    }
}
