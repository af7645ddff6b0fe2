//! The round-robin scheduler (spec.md §4.3): picks the next runnable
//! slot, swaps trap-frame contents with it, and maintains idle
//! behavior when nothing is runnable.

use log::{debug, trace};

use crate::hal::{HostCpu, TimeSource};
use crate::param::{KERNEL_SCHEDULER_TICK_TIME, MAX_PROCS};
use crate::trap::{Context, TrapFrameCell};

use super::state::ProcessState;
use super::table::ProcessTable;

/// Entry point invoked from the timer-tick handler (after registers
/// have been parked in the global trap frame) and from lifecycle
/// calls that give up the CPU (exit, wait, sleep).
pub fn schedule_user_process(
    table: &ProcessTable,
    trap_frame: &TrapFrameCell,
    cpu: &impl HostCpu,
    timer: &impl TimeSource,
) {
    let now = timer.now();
    let table_guard = table.lock.lock();

    let curr_proc = table.curr_proc();

    // A null last_proc means the outgoing context in the trap frame
    // belongs to nobody and must be discarded: the first-tick case
    // (curr_proc < 0), the post-exit case (slot already AVAILABLE),
    // and the post-idle case (is_idle).
    let last_proc = if curr_proc >= 0 {
        let proc = unsafe { table.slot_mut(curr_proc as usize) };
        if proc.state == ProcessState::Available || table.is_idle() {
            None
        } else {
            Some(curr_proc as usize)
        }
    } else {
        None
    };

    if table.num_procs() == 0 {
        drop(table_guard);
        return;
    }

    // The sentinel start for the very first tick (curr_proc == -1)
    // scans from slot 0, same as the original's "compensate for
    // curr_proc being initialized to -1" adjustment.
    let scan_start = if curr_proc < 0 { 0 } else { curr_proc };
    let chosen = find_ready_proc(table, timer, scan_start, now);

    let Some(chosen) = chosen else {
        table.set_is_idle(true);
        drop(table_guard);
        trace!("scheduler: nothing runnable, idling");
        timer.set_timer_after(KERNEL_SCHEDULER_TICK_TIME);
        cpu.enable_interrupts();
        cpu.park_hart();
        return;
    };

    let chosen_proc = unsafe { table.slot_mut(chosen) };
    let chosen_guard = chosen_proc.lock.lock();
    chosen_proc.state = ProcessState::Running;

    match last_proc {
        None => unsafe {
            Context::copy(trap_frame.get(), &chosen_proc.context);
        },
        Some(last) if unsafe { table.slot_mut(last).pid } != chosen_proc.pid => {
            let last_proc_ref = unsafe { table.slot_mut(last) };
            let last_guard = last_proc_ref.lock.lock();
            unsafe {
                Context::copy(&mut last_proc_ref.context, trap_frame.get());
            }
            last_proc_ref.state = ProcessState::Ready;
            drop(last_guard);
            unsafe {
                Context::copy(trap_frame.get(), &chosen_proc.context);
            }
        }
        Some(_) => {
            // last_proc.pid == chosen.pid: the same process was
            // re-picked; no context copy needed.
        }
    }

    debug!("scheduler: dispatching pid {}", chosen_proc.pid);
    drop(chosen_guard);
    table.set_is_idle(false);
    drop(table_guard);
    cpu.set_user_mode();
}

/// Advances a round-robin cursor starting at `(start + 1) mod
/// MAX_PROCS`, visiting every slot at most once. A slot is acceptable
/// if it is READY, or SLEEPING with an elapsed deadline (in which case
/// it is atomically retransitioned to READY). Updates `curr_proc` to
/// the final cursor position regardless of outcome.
fn find_ready_proc(
    table: &ProcessTable,
    _timer: &impl TimeSource,
    start: i32,
    now: u64,
) -> Option<usize> {
    let orig = start;
    let mut cursor = start;
    loop {
        cursor += 1;
        if cursor as usize >= MAX_PROCS {
            cursor = 0;
        }
        let proc = unsafe { table.slot_mut(cursor as usize) };
        if proc.state == ProcessState::Ready {
            table.set_curr_proc(cursor);
            return Some(cursor as usize);
        }
        if proc.state == ProcessState::Sleeping && proc.wakeup_time <= now {
            proc.state = ProcessState::Ready;
            table.set_curr_proc(cursor);
            return Some(cursor as usize);
        }
        if cursor == orig {
            table.set_curr_proc(cursor);
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::cpu::mock::MockCpu;
    use crate::hal::timer::mock::MockTimer;
    use crate::proc::state::ProcessState;

    fn seed_ready(table: &ProcessTable) -> usize {
        let handle = table.alloc_process().unwrap();
        handle.process().pid = table.alloc_pid();
        handle.index
    }

    #[test]
    fn boot_plus_single_idle_dispatches_nothing() {
        let table = ProcessTable::new();
        table.init();
        let trap_frame = TrapFrameCell::new();
        let cpu = MockCpu::new();
        let timer = MockTimer::new(0);

        schedule_user_process(&table, &trap_frame, &cpu, &timer);

        // num_procs == 0: the scheduler bails out before touching the
        // idle flag, the timer, or the hart (spec scenario "Boot +
        // single idle"). No process has been seeded to go idle over.
        assert!(table.is_idle());
        assert_eq!(cpu.parks.get(), 0);
        assert_eq!(timer.armed_after.get(), None);
    }

    #[test]
    fn idles_and_arms_timer_when_nothing_is_ready() {
        let table = ProcessTable::new();
        table.init();
        let trap_frame = TrapFrameCell::new();
        let cpu = MockCpu::new();
        let timer = MockTimer::new(0);

        // A process exists but is asleep far in the future, so the
        // table is non-empty yet nothing is runnable right now.
        let sleeper = seed_ready(&table);
        unsafe {
            let proc = table.slot_mut(sleeper);
            proc.state = ProcessState::Sleeping;
            proc.wakeup_time = 1_000_000;
        }

        schedule_user_process(&table, &trap_frame, &cpu, &timer);

        assert!(table.is_idle());
        assert_eq!(cpu.parks.get(), 1);
        assert_eq!(timer.armed_after.get(), Some(KERNEL_SCHEDULER_TICK_TIME));
    }

    #[test]
    fn round_robin_visits_each_ready_process_once_per_pass() {
        let table = ProcessTable::new();
        table.init();
        let trap_frame = TrapFrameCell::new();
        let cpu = MockCpu::new();
        let timer = MockTimer::new(0);

        let p1 = seed_ready(&table);
        let p2 = seed_ready(&table);
        let p3 = seed_ready(&table);

        let mut dispatched = alloc::vec::Vec::new();
        for _ in 0..6 {
            schedule_user_process(&table, &trap_frame, &cpu, &timer);
            let curr = table.curr_proc();
            dispatched.push(curr as usize);
            // Simulate giving up the CPU back to READY for the next tick.
            let proc = unsafe { table.slot_mut(curr as usize) };
            proc.state = ProcessState::Ready;
        }

        assert_eq!(dispatched, alloc::vec![p1, p2, p3, p1, p2, p3]);
    }

    #[test]
    fn sleeping_process_is_skipped_until_deadline() {
        let table = ProcessTable::new();
        table.init();
        let trap_frame = TrapFrameCell::new();
        let cpu = MockCpu::new();
        let timer = MockTimer::new(0);

        let sleeper = seed_ready(&table);
        let runner = seed_ready(&table);

        unsafe {
            let proc = table.slot_mut(sleeper);
            proc.state = ProcessState::Sleeping;
            proc.wakeup_time = 100;
        }

        schedule_user_process(&table, &trap_frame, &cpu, &timer);
        assert_eq!(table.curr_proc() as usize, runner);

        timer.advance(150);
        unsafe {
            table.slot_mut(runner).state = ProcessState::Ready;
        }
        schedule_user_process(&table, &trap_frame, &cpu, &timer);
        assert_eq!(table.curr_proc() as usize, sleeper);
        assert_eq!(unsafe { table.slot_mut(sleeper).state }, ProcessState::Running);
    }

    #[test]
    fn dispatch_discards_trap_frame_after_exit() {
        let table = ProcessTable::new();
        table.init();
        let trap_frame = TrapFrameCell::new();
        let cpu = MockCpu::new();
        let timer = MockTimer::new(0);

        let exited_slot = seed_ready(&table);
        let survivor = seed_ready(&table);
        unsafe {
            table.slot_mut(exited_slot).state = ProcessState::Available;
        }
        table.set_curr_proc(exited_slot as i32);

        schedule_user_process(&table, &trap_frame, &cpu, &timer);

        assert_eq!(table.curr_proc() as usize, survivor);
        assert!(!table.is_idle());
    }
}
