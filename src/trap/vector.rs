//! The trap entry stub.
//!
//! `sscratch` always holds a pointer to the *currently running task's*
//! `Context` — there is no separate scratch frame and no copying between a
//! "trap frame" and a "task context"; they are the same struct. Entry swaps
//! `sp` for that pointer and spills every general-purpose register plus
//! `sepc`/`sstatus` at their offsets. `sp` is then loaded from the
//! `Context`'s own `kernel_sp` field before calling
//! [`super::trap_dispatch_entry`] with `(scause, &mut Context)` — the
//! dispatcher and everything it calls (`schedule`, `timer::handle_tick`,
//! `syscall::dispatch`) run on that dedicated trap/kernel stack, never on
//! top of the `Context` struct itself.
//!
//! The dispatcher may switch tasks before returning: if it does, it writes
//! a new pointer into `sscratch`. The epilogue re-reads `sscratch` right
//! before restoring state, so it resumes into whichever task is now
//! current — `sepc` and `sstatus` are restored from that task's own saved
//! fields, not threaded through the Rust call's return value.

#[cfg(target_arch = "riscv64")]
core::arch::global_asm!(
    r#"
    .section .text
    .align 4
    .global trap_vector
trap_vector:
    csrrw sp, sscratch, sp

    sd ra,   0*8(sp)
    sd gp,   2*8(sp)
    sd tp,   3*8(sp)
    sd t0,   4*8(sp)
    sd t1,   5*8(sp)
    sd t2,   6*8(sp)
    sd s0,   7*8(sp)
    sd s1,   8*8(sp)
    sd a0,   9*8(sp)
    sd a1,  10*8(sp)
    sd a2,  11*8(sp)
    sd a3,  12*8(sp)
    sd a4,  13*8(sp)
    sd a5,  14*8(sp)
    sd a6,  15*8(sp)
    sd a7,  16*8(sp)
    sd s2,  17*8(sp)
    sd s3,  18*8(sp)
    sd s4,  19*8(sp)
    sd s5,  20*8(sp)
    sd s6,  21*8(sp)
    sd s7,  22*8(sp)
    sd s8,  23*8(sp)
    sd s9,  24*8(sp)
    sd s10, 25*8(sp)
    sd s11, 26*8(sp)
    sd t3,  27*8(sp)
    sd t4,  28*8(sp)
    sd t5,  29*8(sp)
    sd t6,  30*8(sp)

    csrr t0, sepc
    sd t0,  31*8(sp)
    csrr t1, sstatus
    sd t1,  32*8(sp)

    csrrw t0, sscratch, sp
    sd t0,   1*8(sp)

    mv   t2, sp
    ld   sp, 33*8(sp)

    csrr a0, scause
    mv   a1, t2
    call trap_dispatch_entry

    csrr sp, sscratch

    ld t0,  31*8(sp)
    csrw sepc, t0
    ld t1,  32*8(sp)
    csrw sstatus, t1

    ld ra,   0*8(sp)
    ld gp,   2*8(sp)
    ld tp,   3*8(sp)
    ld t0,   4*8(sp)
    ld t1,   5*8(sp)
    ld t2,   6*8(sp)
    ld s0,   7*8(sp)
    ld s1,   8*8(sp)
    ld a0,   9*8(sp)
    ld a1,  10*8(sp)
    ld a2,  11*8(sp)
    ld a3,  12*8(sp)
    ld a4,  13*8(sp)
    ld a5,  14*8(sp)
    ld a6,  15*8(sp)
    ld a7,  16*8(sp)
    ld s2,  17*8(sp)
    ld s3,  18*8(sp)
    ld s4,  19*8(sp)
    ld s5,  20*8(sp)
    ld s6,  21*8(sp)
    ld s7,  22*8(sp)
    ld s8,  23*8(sp)
    ld s9,  24*8(sp)
    ld s10, 25*8(sp)
    ld s11, 26*8(sp)
    ld t3,  27*8(sp)
    ld t4,  28*8(sp)
    ld t5,  29*8(sp)
    ld t6,  30*8(sp)

    ld sp,   1*8(sp)
    sret
    "#
);

/// The trap epilogue with no matching entry: used once, at boot, to drop
/// into the first task `schedule()` selected. `sscratch` already points at
/// that task's `Context` (written by `schedule`'s switch path the same way
/// it would for any other switch); this just does the restore-and-`sret`
/// half of `trap_vector` without ever having taken a trap. It never calls
/// into Rust, so unlike `trap_vector` it has no need to switch onto
/// `kernel_sp` first.
#[cfg(target_arch = "riscv64")]
core::arch::global_asm!(
    r#"
    .section .text
    .align 4
    .global enter_first_task
enter_first_task:
    csrr sp, sscratch

    ld t0,  31*8(sp)
    csrw sepc, t0
    ld t1,  32*8(sp)
    csrw sstatus, t1

    ld ra,   0*8(sp)
    ld gp,   2*8(sp)
    ld tp,   3*8(sp)
    ld t0,   4*8(sp)
    ld t1,   5*8(sp)
    ld t2,   6*8(sp)
    ld s0,   7*8(sp)
    ld s1,   8*8(sp)
    ld a0,   9*8(sp)
    ld a1,  10*8(sp)
    ld a2,  11*8(sp)
    ld a3,  12*8(sp)
    ld a4,  13*8(sp)
    ld a5,  14*8(sp)
    ld a6,  15*8(sp)
    ld a7,  16*8(sp)
    ld s2,  17*8(sp)
    ld s3,  18*8(sp)
    ld s4,  19*8(sp)
    ld s5,  20*8(sp)
    ld s6,  21*8(sp)
    ld s7,  22*8(sp)
    ld s8,  23*8(sp)
    ld s9,  24*8(sp)
    ld s10, 25*8(sp)
    ld s11, 26*8(sp)
    ld t3,  27*8(sp)
    ld t4,  28*8(sp)
    ld t5,  29*8(sp)
    ld t6,  30*8(sp)

    ld sp,   1*8(sp)
    sret
    "#
);
