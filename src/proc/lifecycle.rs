//! fork / exec / exit / wait / sleep (spec.md §4.4-4.6): the
//! operations that create, mutate, and retire process-table slots.

use log::{debug, trace, warn};

use crate::error::{KernelError, KernelResult};
use crate::hal::programs::bundled_programs;
use crate::hal::{find_user_program, HostCpu, PageAllocator, TimeSource, UserProgram};
use crate::param::{ONE_SECOND, PAGE_SIZE};
use crate::trap::{Context, TrapFrameCell};

use super::scheduler::schedule_user_process;
use super::slot::Process;
use super::state::ProcessState;
use super::table::ProcessTable;

/// Writes `program`'s entry point and a fresh stack into `proc`'s
/// context: `pc`/`ra` at the entry point, `sp`/`fp` at the top of
/// `stack_page`, `a0`/`a1` as the argument count/vector (spec.md §4.5
/// steps 5-6). Shared by `exec` (replacing a running process's image)
/// and `init_process_table` (seeding a brand-new slot at boot), since
/// both construct the same initial register layout for a bundled
/// program.
fn load_program(proc: &mut Process, program: UserProgram, stack_page: *mut u8, argv: &[&str]) {
    let stack_top = stack_page as u64 + PAGE_SIZE as u64;
    proc.name = program.name;
    proc.stack_page = stack_page;
    proc.context.pc = program.entry_point;
    proc.context.ra = program.entry_point;
    proc.context.sp = stack_top;
    proc.context.fp = stack_top;
    proc.context.a0 = argv.len() as u64;
    proc.context.a1 = argv.as_ptr() as u64;
}

/// Boot-time initialization (spec.md §4.2 `init_process_table`): resets
/// the table's bookkeeping via `ProcessTable::init`, then seeds one
/// READY slot per statically-bundled initial process
/// (`hal::programs::bundled_programs`), each with its own stack page
/// and an entry-point context laid out exactly as `exec` would set one
/// up — these are the processes the scheduler finds runnable on its
/// very first pass. Grounded on `original_source/src/proc.c`'s
/// `init_process_table`, whose last line calls `init_test_processes()`
/// after the bookkeeping reset (that helper's own body is not part of
/// the retained source slice, so this follows `exec`'s known context
/// layout for "start a bundled program" rather than guessing at its
/// internals).
///
/// Must run exactly once, before interrupts are enabled. Runs as a
/// free function rather than a `ProcessTable` method because seeding
/// needs the page-allocator collaborator, which `ProcessTable`'s own
/// methods never touch.
pub fn init_process_table(table: &ProcessTable, pages: &impl PageAllocator) {
    table.init();
    for program in bundled_programs() {
        let Some(stack_page) = pages.allocate_page() else {
            warn!("init_process_table: out of pages seeding {}", program.name);
            break;
        };
        let handle = match table.alloc_process() {
            Ok(handle) => handle,
            Err(_) => {
                unsafe { pages.release_page(stack_page) };
                warn!("init_process_table: no free slot seeding {}", program.name);
                break;
            }
        };
        let pid = table.alloc_pid();
        let proc = handle.process();
        proc.pid = pid;
        proc.parent = None;
        load_program(proc, program, stack_page, &[]);
        debug!("init_process_table: seeded {} as pid {}", program.name, pid);
    }
}

/// Duplicates the calling process. Returns the child's pid to the
/// parent; the child instead observes `A0 == 0` the next time it
/// runs, set directly into its saved context rather than into this
/// function's return value (spec.md §4.4 step 7).
pub fn fork(
    table: &ProcessTable,
    trap_frame: &TrapFrameCell,
    pages: &impl PageAllocator,
) -> KernelResult<u32> {
    let parent_index = table.current_proc().ok_or(KernelError::NoCurrentProcess)?;

    let child_page = pages.allocate_page().ok_or(KernelError::OutOfMemory)?;

    // Save the live trap frame into the parent's own context first, so
    // the child inherits the caller's exact register state.
    {
        let parent = unsafe { table.slot_mut(parent_index) };
        let _guard = parent.lock.lock();
        unsafe {
            Context::copy(&mut parent.context, trap_frame.get());
        }
    }

    // Drop the parent lock before calling alloc_process, which takes
    // the table lock internally — the fork path cannot reorder to
    // table-lock-first without a reserve/alloc split alloc_process
    // doesn't offer, and the parent is the sole caller so it cannot
    // race against itself here (design notes, option b).
    let handle = match table.alloc_process() {
        Ok(handle) => handle,
        Err(err) => {
            unsafe { pages.release_page(child_page) };
            return Err(err);
        }
    };

    let child_pid = table.alloc_pid();

    let (parent_stack_page, parent_name, parent_context) = {
        let parent = unsafe { table.slot_mut(parent_index) };
        let _guard = parent.lock.lock();
        (parent.stack_page, parent.name, parent.context)
    };

    unsafe {
        pages.copy_page(child_page, parent_stack_page as *const u8);
    }

    let child = handle.process();
    child.pid = child_pid;
    child.parent = Some(parent_index);
    child.name = parent_name;
    child.context = parent_context;
    child.stack_page = child_page;

    // Rebase stack-relative registers onto the child's own page: same
    // offset into the page, different page base.
    let sp_offset = parent_context.sp.wrapping_sub(parent_stack_page as u64);
    let fp_offset = parent_context.fp.wrapping_sub(parent_stack_page as u64);
    child.context.sp = (child_page as u64).wrapping_add(sp_offset);
    child.context.fp = (child_page as u64).wrapping_add(fp_offset);
    child.context.a0 = 0;

    drop(handle);

    unsafe {
        trap_frame.get().a0 = child_pid as u64;
    }

    debug!("fork: pid {} from parent slot {}", child_pid, parent_index);
    Ok(child_pid)
}

/// Replaces the caller's program image with a bundled program,
/// reusing the slot and pid (spec.md §4.5).
pub fn exec(
    table: &ProcessTable,
    trap_frame: &TrapFrameCell,
    pages: &impl PageAllocator,
    filename: &str,
    argv: &[&str],
) -> KernelResult<()> {
    let program = find_user_program(filename).ok_or(KernelError::UnknownProgram)?;
    let index = table.current_proc().ok_or(KernelError::NoCurrentProcess)?;
    let new_page = pages.allocate_page().ok_or(KernelError::OutOfMemory)?;

    let proc = unsafe { table.slot_mut(index) };
    let _guard = proc.lock.lock();

    let old_page = proc.stack_page;
    unsafe {
        pages.release_page(old_page);
    }

    load_program(proc, program, new_page, argv);

    unsafe {
        Context::copy(trap_frame.get(), &proc.context);
    }

    debug!("exec: slot {} now running {:?}", index, program.name);
    Ok(())
}

/// Retires the caller: releases its stack page, frees its slot,
/// wakes its parent if one is still live, and invokes the scheduler.
/// Conceptually never returns to the caller (spec.md §4.6) — there is
/// no live register state left to resume once the slot is AVAILABLE.
pub fn exit(
    table: &ProcessTable,
    trap_frame: &TrapFrameCell,
    pages: &impl PageAllocator,
    cpu: &impl HostCpu,
    timer: &impl TimeSource,
) {
    let Some(index) = table.current_proc() else {
        return;
    };

    let (parent, stack_page) = {
        let proc = unsafe { table.slot_mut(index) };
        let _guard = proc.lock.lock();
        (proc.parent, proc.stack_page)
    };

    unsafe {
        pages.release_page(stack_page);
    }
    table.free_slot(index);

    if let Some(parent_index) = parent {
        let parent_proc = unsafe { table.slot_mut(parent_index) };
        let _guard = parent_proc.lock.lock();
        // The back-reference can be stale if the parent already exited
        // and its slot was reused; only wake a slot that is still
        // occupied (design notes, parent back-reference).
        if !parent_proc.is_available() {
            parent_proc.state = ProcessState::Ready;
        }
    }

    trace!("exit: slot {} retired", index);
    schedule_user_process(table, trap_frame, cpu, timer);
}

/// Parks the caller with an absolute wake-up deadline, saving the live
/// trap frame into its context first, then yields to the scheduler.
fn sleep_until(
    table: &ProcessTable,
    trap_frame: &TrapFrameCell,
    cpu: &impl HostCpu,
    timer: &impl TimeSource,
    wakeup_time: u64,
) {
    if let Some(index) = table.current_proc() {
        let proc = unsafe { table.slot_mut(index) };
        let _guard = proc.lock.lock();
        unsafe {
            Context::copy(&mut proc.context, trap_frame.get());
        }
        proc.state = ProcessState::Sleeping;
        proc.wakeup_time = wakeup_time;
    }
    schedule_user_process(table, trap_frame, cpu, timer);
}

/// Parks the caller for at least `ms` milliseconds (spec.md §4.6
/// `sleep`).
pub fn sleep(
    table: &ProcessTable,
    trap_frame: &TrapFrameCell,
    cpu: &impl HostCpu,
    timer: &impl TimeSource,
    ms: u64,
) {
    let wakeup_time = timer.now() + ms.saturating_mul(ONE_SECOND / 1000);
    sleep_until(table, trap_frame, cpu, timer, wakeup_time);
}

/// Parks the caller with an already-elapsed deadline, woken only by a
/// child's `exit` marking it READY directly (spec.md §4.6 `wait`).
///
/// Kept exactly as the design describes: a deadline of 0 is
/// indistinguishable, to the scheduler's generic `wakeup_time <= now`
/// check, from "already due", so a caller with no live children can
/// be rescheduled on the very next pass regardless of whether any
/// child ever exits. This is a known limitation inherited unchanged
/// from the source design (see the "wait without children" open
/// question) rather than a bug introduced here.
pub fn wait(table: &ProcessTable, trap_frame: &TrapFrameCell, cpu: &impl HostCpu, timer: &impl TimeSource) {
    sleep_until(table, trap_frame, cpu, timer, 0);
}
