#[cfg(target_arch = "riscv64")]
mod riscv;
#[cfg(target_arch = "riscv64")]
pub use riscv::*;

#[cfg(not(target_arch = "riscv64"))]
mod host_stub;
#[cfg(not(target_arch = "riscv64"))]
pub use host_stub::*;

/// If the IRQ is disabled, return `true`, otherwise return `false`.
#[inline(always)]
pub fn is_irq_disabled() -> bool {
    (sstatus_read() & SSTATUS_SIE) == 0
}
