//! The bundled-user-programs table (spec.md §1, `find_user_program`):
//! out of scope to design — programs are linked in at build time, not
//! loaded from a filesystem or ELF image (Non-goals). This module
//! states the lookup interface `exec` needs and a small static table
//! so `exec` is exercisable without a real linked-in program image.

use arrayvec::ArrayVec;

/// One bundled program: its name (as passed to `execv`) and entry
/// point. `name`'s `'static` lifetime matches a process slot's
/// `name` field, which borrows directly from this table (spec.md §3).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UserProgram {
    pub name: &'static str,
    pub entry_point: u64,
}

const MAX_BUNDLED_PROGRAMS: usize = 8;

/// The statically linked-in program table. Real kernels populate this
/// from linker-provided symbols for each bundled binary; this default
/// is a placeholder set standing in for that build-time step.
pub fn bundled_programs() -> ArrayVec<UserProgram, MAX_BUNDLED_PROGRAMS> {
    let mut programs = ArrayVec::new();
    programs.push(UserProgram {
        name: "init",
        entry_point: 0x8000_0000,
    });
    programs.push(UserProgram {
        name: "hello",
        entry_point: 0x8001_0000,
    });
    programs.push(UserProgram {
        name: "sh",
        entry_point: 0x8002_0000,
    });
    programs
}

/// Looks up a bundled program by name (spec.md §4.5 step 2).
pub fn find_user_program(filename: &str) -> Option<UserProgram> {
    bundled_programs().into_iter().find(|p| p.name == filename)
}
