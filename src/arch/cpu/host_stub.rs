//! Host stand-ins for the CSR accessors in `riscv.rs`.
//!
//! The real accessors are inline asm and only make sense on `riscv64`
//! hardware. Code that references them (trap dispatch, the IRQ-masking
//! lock) still needs to type-check and run under `cargo test` on the host,
//! so this module fakes the registers with thread-local cells. Nothing here
//! is meant to model real CSR semantics beyond "reads see the last write".

use core::cell::Cell;

pub const SSTATUS_SIE: usize = 1 << 1;
pub const SSTATUS_SPP: usize = 1 << 8;
pub const SSTATUS_SPIE: usize = 1 << 5;
pub const SIE_STIE: usize = 1 << 5;
pub const SIE_SSIE: usize = 1 << 1;

thread_local! {
    static SSTATUS: Cell<usize> = const { Cell::new(SSTATUS_SIE) };
    static SIE: Cell<usize> = const { Cell::new(0) };
    static SIP: Cell<usize> = const { Cell::new(0) };
    static SSCRATCH: Cell<usize> = const { Cell::new(0) };
    static SEPC: Cell<usize> = const { Cell::new(0) };
    static STVEC: Cell<usize> = const { Cell::new(0) };
}

pub fn sstatus_read() -> usize {
    SSTATUS.with(|c| c.get())
}

pub fn sstatus_write(val: usize) {
    SSTATUS.with(|c| c.set(val));
}

pub fn sstatus_sti() {
    sstatus_write(sstatus_read() | SSTATUS_SIE);
}

pub fn sstatus_cli() {
    sstatus_write(sstatus_read() & !SSTATUS_SIE);
}

pub fn sstatus_cli_save() -> usize {
    let flags = sstatus_read();
    sstatus_write(flags & !SSTATUS_SIE);
    flags
}

pub fn check_irq_disabled_flags(flags: usize) -> bool {
    flags & SSTATUS_SIE == 0
}

pub fn sie_read() -> usize {
    SIE.with(|c| c.get())
}

pub fn sie_write(val: usize) {
    SIE.with(|c| c.set(val));
}

pub fn sip_read() -> usize {
    SIP.with(|c| c.get())
}

pub fn sip_write(val: usize) {
    SIP.with(|c| c.set(val));
}

pub fn sscratch_read() -> usize {
    SSCRATCH.with(|c| c.get())
}

pub fn sscratch_write(val: usize) {
    SSCRATCH.with(|c| c.set(val));
}

pub fn sscratch_swap(to: usize) -> usize {
    SSCRATCH.with(|c| c.replace(to))
}

pub fn sepc_read() -> usize {
    SEPC.with(|c| c.get())
}

pub fn sepc_write(val: usize) {
    SEPC.with(|c| c.set(val));
}

pub fn scause_read() -> usize {
    0
}

pub fn stval_read() -> usize {
    0
}

pub fn stvec_write(val: usize) {
    STVEC.with(|c| c.set(val));
}

pub fn stvec_read() -> usize {
    STVEC.with(|c| c.get())
}

pub fn time_read() -> u64 {
    0
}
