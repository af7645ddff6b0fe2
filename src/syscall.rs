//! The system-call surface (spec.md §6): identifiers and return
//! conventions for `fork`/`execv`/`exit`/`wait`/`sleep`/`getpid`/
//! `sysinfo`. The trap-based calling convention that marshals
//! arguments out of user registers is out of scope (spec.md §6); this
//! module's functions take already-decoded arguments, the same way
//! `sys_*` functions sit one layer above `argint`/`argaddr` decoding.

use log::debug;

use crate::error::as_syscall_return;
use crate::hal::{HostCpu, PageAllocator, TimeSource};
use crate::proc::{self, ProcessTable};
use crate::trap::TrapFrameCell;

/// Identifies a system call, mirroring the `Syscall` enum used to
/// dispatch from the trap handler's `a7` register value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Syscall {
    Fork,
    Execv,
    Exit,
    Wait,
    Sleep,
    Getpid,
    Sysinfo,
}

/// Snapshot returned by the `sysinfo` call (spec.md §6): the fields
/// `original_source/include/syscalls.h`'s `sysinfo_s` actually
/// populates; uptime/load-average/swap fields it leaves commented out
/// as not-yet-implemented stay out of scope here too.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct SysInfo {
    pub totalram: u64,
    pub freeram: u64,
    pub procs: usize,
}

/// `fork`: child pid in the parent, 0 in the child (set directly into
/// the child's saved context, not returned here), `-1` on error.
pub fn sys_fork(table: &ProcessTable, trap_frame: &TrapFrameCell, pages: &impl PageAllocator) -> i64 {
    let result = proc::fork(table, trap_frame, pages).map(|pid| pid as i64);
    as_syscall_return(result)
}

/// `execv`: 0 on success, `-1` on error (unknown program or no free
/// page). A null `filename` at the real ABI boundary is the caller's
/// job to reject before reaching here, since `&str` cannot be null.
pub fn sys_execv(
    table: &ProcessTable,
    trap_frame: &TrapFrameCell,
    pages: &impl PageAllocator,
    filename: &str,
    argv: &[&str],
) -> i64 {
    let result = proc::exec(table, trap_frame, pages, filename, argv).map(|()| 0i64);
    as_syscall_return(result)
}

/// `exit`: never returns a value to a live caller; exposed as `()`
/// rather than `-> !` since the scheduler call inside it is an
/// ordinary function in this design (spec.md §4.6, §9).
pub fn sys_exit(
    table: &ProcessTable,
    trap_frame: &TrapFrameCell,
    pages: &impl PageAllocator,
    cpu: &impl HostCpu,
    timer: &impl TimeSource,
) {
    debug!("syscall: exit");
    proc::exit(table, trap_frame, pages, cpu, timer);
}

/// `wait`: returns 0 once re-awoken.
pub fn sys_wait(table: &ProcessTable, trap_frame: &TrapFrameCell, cpu: &impl HostCpu, timer: &impl TimeSource) -> i64 {
    proc::wait(table, trap_frame, cpu, timer);
    0
}

/// `sleep`: returns 0 once the deadline elapses.
pub fn sys_sleep(
    table: &ProcessTable,
    trap_frame: &TrapFrameCell,
    cpu: &impl HostCpu,
    timer: &impl TimeSource,
    ms: u64,
) -> i64 {
    proc::sleep(table, trap_frame, cpu, timer, ms);
    0
}

/// `getpid`: the calling process's pid, or `-1` if called outside a
/// running process (an unreachable condition in a correct kernel).
pub fn sys_getpid(table: &ProcessTable) -> i64 {
    match table.current_proc() {
        Some(index) => unsafe { table.slot_mut(index).pid as i64 },
        None => -1,
    }
}

/// `sysinfo`: memory and process-count snapshot. `totalram`/`freeram`
/// are supplied by the caller since the page allocator collaborator
/// (out of scope, spec.md §1) is the only source of that accounting;
/// this function only fills in `procs` from the table it owns.
pub fn sys_sysinfo(table: &ProcessTable, totalram: u64, freeram: u64) -> SysInfo {
    SysInfo {
        totalram,
        freeram,
        procs: table.count_non_available(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::cpu::mock::MockCpu;
    use crate::hal::page::mock::MockPageAllocator;
    use crate::hal::timer::mock::MockTimer;
    use crate::proc::ProcessState;

    #[test]
    fn getpid_reflects_current_proc() {
        let table = ProcessTable::new();
        table.init();
        let handle = table.alloc_process().unwrap();
        let pid = table.alloc_pid();
        handle.process().pid = pid;
        let index = handle.index;
        drop(handle);
        table.set_curr_proc(index as i32);

        assert_eq!(sys_getpid(&table), pid as i64);
    }

    #[test]
    fn getpid_is_negative_one_with_no_current_proc() {
        let table = ProcessTable::new();
        table.init();
        assert_eq!(sys_getpid(&table), -1);
    }

    #[test]
    fn sysinfo_reports_live_process_count() {
        let table = ProcessTable::new();
        table.init();
        let _a = table.alloc_process().unwrap();
        let _b = table.alloc_process().unwrap();

        let info = sys_sysinfo(&table, 1 << 20, 1 << 18);
        assert_eq!(info.procs, 2);
        assert_eq!(info.totalram, 1 << 20);
        assert_eq!(info.freeram, 1 << 18);
    }

    #[test]
    fn execv_on_unknown_program_returns_negative_one() {
        let table = ProcessTable::new();
        table.init();
        let trap_frame = TrapFrameCell::new();
        let pages = MockPageAllocator::new(4);

        let handle = table.alloc_process().unwrap();
        handle.process().pid = table.alloc_pid();
        handle.process().stack_page = pages.allocate_page().unwrap();
        handle.process().state = ProcessState::Running;
        let index = handle.index;
        drop(handle);
        table.set_curr_proc(index as i32);

        assert_eq!(sys_execv(&table, &trap_frame, &pages, "nope", &[]), -1);
    }

    #[test]
    fn fork_sysinfo_and_wait_round_trip_through_mocks() {
        let table = ProcessTable::new();
        table.init();
        let trap_frame = TrapFrameCell::new();
        let pages = MockPageAllocator::new(4);
        let cpu = MockCpu::new();
        let timer = MockTimer::new(0);

        let handle = table.alloc_process().unwrap();
        handle.process().pid = table.alloc_pid();
        handle.process().stack_page = pages.allocate_page().unwrap();
        handle.process().state = ProcessState::Running;
        let index = handle.index;
        drop(handle);
        table.set_curr_proc(index as i32);
        table.set_is_idle(false);

        let child_pid = sys_fork(&table, &trap_frame, &pages);
        assert!(child_pid > 0);
        assert_eq!(sys_sysinfo(&table, 0, 0).procs, 2);

        // wait() should not panic even though this process has no
        // children tracked in the other direction.
        sys_wait(&table, &trap_frame, &cpu, &timer);
    }
}
