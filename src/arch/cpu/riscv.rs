//! CPU registers operations and data definitions of the RISC-V platform.


use core::arch::asm;

#[repr(usize)]
pub enum Register {
    Zero = 0,
    Ra,
    Sp,
    Gp,
    Tp,
    T0,
    T1,
    T2,
    S0,
    S1,
    A0, /* 10 */
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
    A7,
    S2,
    S3,
    S4, /* 20 */
    S5,
    S6,
    S7,
    S8,
    S9,
    S10,
    S11,
    T3,
    T4,
    T5, /* 30 */
    T6
}

pub const fn reg(r: Register) -> usize {
    r as usize
}

////////////////// Supervisor CSRs R/W ////////////////////

pub fn sstatus_read() -> usize {
    unsafe {
        let rval;
        asm!("csrr {}, sstatus", out(reg) rval);
        rval
    }
}

pub fn sstatus_write(val: usize) {
    unsafe {
        asm!("csrw sstatus, {}", in(reg) val);
    }
}

/// Supervisor interrupt-enable bit in `sstatus`.
pub const SSTATUS_SIE: usize = 1 << 1;
/// Supervisor previous privilege bit in `sstatus`: set means the trap came
/// from S-mode, clear means U-mode. A task descriptor clears this so its
/// `sret` drops to user mode.
pub const SSTATUS_SPP: usize = 1 << 8;
/// Supervisor previous interrupt-enable bit in `sstatus`: restored into
/// `SIE` by `sret`. Tasks are created with this set so interrupts stay on
/// once they're running.
pub const SSTATUS_SPIE: usize = 1 << 5;
/// Supervisor timer interrupt-enable bit in `sie`.
pub const SIE_STIE: usize = 1 << 5;
/// Supervisor software interrupt-enable bit in `sie`.
pub const SIE_SSIE: usize = 1 << 1;

/// Enable supervisor interrupts on this hart.
pub fn sstatus_sti() {
    sstatus_write(sstatus_read() | SSTATUS_SIE);
}

/// Disable supervisor interrupts on this hart.
pub fn sstatus_cli() {
    sstatus_write(sstatus_read() & !SSTATUS_SIE);
}

/// Disable supervisor interrupts, returning the pre-existing `sstatus`
/// value so the caller can restore it later.
pub fn sstatus_cli_save() -> usize {
    let flags = sstatus_read();
    sstatus_write(flags & !SSTATUS_SIE);
    flags
}

/// Test whether `SSTATUS_SIE` is clear in a previously-saved `sstatus` value.
pub fn check_irq_disabled_flags(flags: usize) -> bool {
    flags & SSTATUS_SIE == 0
}

pub fn sie_read() -> usize {
    unsafe {
        let rval;
        asm!("csrr {}, sie", out(reg) rval);
        rval
    }
}

pub fn sie_write(val: usize) {
    unsafe {
        asm!("csrw sie, {}", in(reg) val);
    }
}

pub fn sip_read() -> usize {
    unsafe {
        let rval;
        asm!("csrr {}, sip", out(reg) rval);
        rval
    }
}

pub fn sip_write(val: usize) {
    unsafe {
        asm!("csrw sip, {}", in(reg) val);
    }
}

pub fn sscratch_read() -> usize {
    unsafe {
        let rval;
        asm!("csrr {}, sscratch", out(reg) rval);
        rval
    }
}

pub fn sscratch_write(val: usize) {
    unsafe {
        asm!("csrw sscratch, {}", in(reg) val);
    }
}

/// Write `to` to the `sscratch` register and return the old value of the register.
pub fn sscratch_swap(to: usize) -> usize {
    unsafe {
        let from;
        asm!("csrrw {}, sscratch, {}", lateout(reg) from, in(reg) to);
        from
    }
}

pub fn sepc_read() -> usize {
    unsafe {
        let rval;
        asm!("csrr {}, sepc", out(reg) rval);
        rval
    }
}

pub fn sepc_write(val: usize) {
    unsafe {
        asm!("csrw sepc, {}", in(reg) val);
    }
}

pub fn scause_read() -> usize {
    unsafe {
        let rval;
        asm!("csrr {}, scause", out(reg) rval);
        rval
    }
}

pub fn stval_read() -> usize {
    unsafe {
        let rval;
        asm!("csrr {}, stval", out(reg) rval);
        rval
    }
}

pub fn stvec_write(val: usize) {
    unsafe {
        asm!("csrw stvec, {}", in(reg) val);
    }
}

pub fn stvec_read() -> usize {
    unsafe {
        let rval;
        asm!("csrr {}, stvec", out(reg) rval);
        rval
    }
}

/// Read the 64-bit `time` CSR, the free-running counter SBI's `set_timer`
/// schedules against.
pub fn time_read() -> u64 {
    unsafe {
        let rval: usize;
        asm!("csrr {}, time", out(reg) rval);
        rval as u64
    }
}
