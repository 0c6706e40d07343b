//! The saved context: 31 general-purpose registers, the two pieces of
//! privileged state a resumed flow needs that don't live in a GPR (the
//! program counter and the status word), and the top of this task's own
//! trap/kernel stack.
//!
//! Field order mirrors the offsets the trap-entry assembly indexes by; do
//! not reorder without updating `trap::vector`. This is also the per-task
//! saved context the scheduler switches between: `sscratch` always points
//! at the *current* task's `Context`, so the trap stub's register
//! save/restore doubles as the task switch's register save/restore. There
//! is no separate "trap frame" distinct from "task context".

use static_assertions::const_assert_eq;

#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct Context {
    pub ra: usize,
    pub sp: usize,
    pub gp: usize,
    pub tp: usize,
    pub t0: usize,
    pub t1: usize,
    pub t2: usize,
    pub s0: usize,
    pub s1: usize,
    pub a0: usize,
    pub a1: usize,
    pub a2: usize,
    pub a3: usize,
    pub a4: usize,
    pub a5: usize,
    pub a6: usize,
    pub a7: usize,
    pub s2: usize,
    pub s3: usize,
    pub s4: usize,
    pub s5: usize,
    pub s6: usize,
    pub s7: usize,
    pub s8: usize,
    pub s9: usize,
    pub s10: usize,
    pub s11: usize,
    pub t3: usize,
    pub t4: usize,
    pub t5: usize,
    pub t6: usize,
    /// Resume address: `sepc` at trap entry, written back to `sepc` by the
    /// epilogue. A syscall handler that doesn't switch tasks must advance
    /// this past the `ecall` itself; see `syscall::dispatch`.
    pub pc: usize,
    /// `sstatus` at trap entry, written back to `sstatus` by the epilogue.
    /// A freshly created task gets one with `SPP` clear (resume in user
    /// mode) and `SPIE` set (resume with interrupts enabled).
    pub sstatus: usize,
    /// Top of this task's dedicated trap/kernel stack. The trap stub loads
    /// this into `sp` before calling into Rust, so `trap_dispatch_entry`
    /// and everything it calls (`schedule`, `timer::handle_tick`,
    /// `syscall::dispatch`) run on a real stack instead of on top of this
    /// `Context` itself. Set once by `task_create` and never touched by the
    /// switch path, since every task keeps the same trap stack for its
    /// whole life.
    pub kernel_sp: usize,
}

/// Saved general-purpose registers, excluding `pc`/`sstatus`/`kernel_sp`.
pub const REGISTER_COUNT: usize = 31;
/// Total `usize` words in `Context`, including `pc`, `sstatus` and
/// `kernel_sp`.
pub const FRAME_WORDS: usize = REGISTER_COUNT + 3;

const_assert_eq!(core::mem::size_of::<Context>(), FRAME_WORDS * core::mem::size_of::<usize>());

impl Context {
    pub const fn zeroed() -> Self {
        Context {
            ra: 0, sp: 0, gp: 0, tp: 0,
            t0: 0, t1: 0, t2: 0,
            s0: 0, s1: 0,
            a0: 0, a1: 0, a2: 0, a3: 0, a4: 0, a5: 0, a6: 0, a7: 0,
            s2: 0, s3: 0, s4: 0, s5: 0, s6: 0, s7: 0, s8: 0, s9: 0, s10: 0, s11: 0,
            t3: 0, t4: 0, t5: 0, t6: 0,
            pc: 0, sstatus: 0, kernel_sp: 0,
        }
    }

    /// Syscall argument registers a0..a5, per the syscall calling convention.
    pub fn syscall_args(&self) -> [usize; 6] {
        [self.a0, self.a1, self.a2, self.a3, self.a4, self.a5]
    }

    /// Syscall number, carried in a7.
    pub fn syscall_number(&self) -> usize {
        self.a7
    }

    pub fn set_return_value(&mut self, value: usize) {
        self.a0 = value;
    }
}

impl core::fmt::Debug for Context {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Context")
            .field("pc", &format_args!("{:#x}", self.pc))
            .field("ra", &format_args!("{:#x}", self.ra))
            .field("sp", &format_args!("{:#x}", self.sp))
            .field("a0", &format_args!("{:#x}", self.a0))
            .field("a7", &format_args!("{:#x}", self.a7))
            .finish_non_exhaustive()
    }
}
