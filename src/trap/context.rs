//! The register snapshot spec.md calls "Context (trap frame)": one
//! record type used two ways — as the live, process-wide `trap_frame`
//! the trap-entry stub writes into, and as the value saved into a
//! process slot's `context` field when that process is not running.
//!
//! This mirrors `proc::context::Context` (callee-saved regs for
//! `swtch()`) and `proc::trapframe::Trapframe` (full user register
//! file) collapsed into one type, because spec.md's design
//! has no kernel-call-stack switch distinct from the user trap path —
//! only one snapshot ever needs saving or restoring.

use crate::param::N_REGS;

/// Saved RISC-V integer registers plus the program counter.
///
/// Stores the 31 non-zero general registers (`x1`..`x31` in RISC-V
/// ABI naming; `x0` is hardwired to zero and never saved) plus `pc`.
/// `N_REGS` (32) documents the architectural register file size this
/// is sized against, per `original_source`'s `trap_frame_t.regs[32]`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Context {
    pub ra: u64,
    pub sp: u64,
    pub gp: u64,
    pub tp: u64,
    pub t0: u64,
    pub t1: u64,
    pub t2: u64,
    /// Frame pointer (`s0`).
    pub fp: u64,
    pub s1: u64,
    pub a0: u64,
    pub a1: u64,
    pub a2: u64,
    pub a3: u64,
    pub a4: u64,
    pub a5: u64,
    pub a6: u64,
    pub a7: u64,
    pub s2: u64,
    pub s3: u64,
    pub s4: u64,
    pub s5: u64,
    pub s6: u64,
    pub s7: u64,
    pub s8: u64,
    pub s9: u64,
    pub s10: u64,
    pub s11: u64,
    pub t3: u64,
    pub t4: u64,
    pub t5: u64,
    pub t6: u64,
    pub pc: u64,
}

const _: () = assert!(N_REGS == 32);

impl Context {
    pub const fn new() -> Context {
        Context {
            ra: 0,
            sp: 0,
            gp: 0,
            tp: 0,
            t0: 0,
            t1: 0,
            t2: 0,
            fp: 0,
            s1: 0,
            a0: 0,
            a1: 0,
            a2: 0,
            a3: 0,
            a4: 0,
            a5: 0,
            a6: 0,
            a7: 0,
            s2: 0,
            s3: 0,
            s4: 0,
            s5: 0,
            s6: 0,
            s7: 0,
            s8: 0,
            s9: 0,
            s10: 0,
            s11: 0,
            t3: 0,
            t4: 0,
            t5: 0,
            t6: 0,
            pc: 0,
        }
    }

    /// Bulk-copies every register position from `src` into `dst`. No
    /// allocation, no failure mode — this relies on traps being
    /// disabled around the scheduler's use of it for atomicity with
    /// respect to a concurrent trap (§4.1, §5).
    pub fn copy(dst: &mut Context, src: &Context) {
        *dst = *src;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_is_a_full_bulk_copy() {
        let mut src = Context::new();
        src.sp = 0x1000;
        src.fp = 0x1000;
        src.a0 = 42;
        src.pc = 0xdead_beef;

        let mut dst = Context::new();
        Context::copy(&mut dst, &src);

        assert_eq!(dst, src);
    }

    #[test]
    fn copy_overwrites_stale_destination_fields() {
        let src = Context::new();
        let mut dst = Context::new();
        dst.a0 = 99;
        dst.pc = 0xffff;

        Context::copy(&mut dst, &src);

        assert_eq!(dst.a0, 0);
        assert_eq!(dst.pc, 0);
    }
}
