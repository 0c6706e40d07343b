//! IPI extension (EID 0x735049): send and clear software interrupts.

use super::{call, SbiResult};

pub const EID: u32 = 0x0073_5049;

/// Send a software interrupt to every hart named in `hart_mask`, a bitmap
/// relative to `hart_mask_base` (`usize::MAX` selects "all harts").
pub fn send_ipi(hart_mask: usize, hart_mask_base: usize) -> SbiResult<()> {
    let res = unsafe { call(EID, 0x0, hart_mask, hart_mask_base, 0, 0, 0, 0) };
    res.map(|_| ())
}

/// Bit position of the supervisor software interrupt pending flag in `sip`.
const SSIP_BIT: usize = 1;

/// Clear the pending software interrupt (SSIP) on the calling hart. This is
/// a local CSR write in spec terms but kept here for symmetry with
/// `send_ipi` and to centralize all cross-hart signaling in one module.
pub fn clear_ipi() {
    let sip = crate::arch::cpu::sip_read();
    crate::arch::cpu::sip_write(sip & !(1 << SSIP_BIT));
}

/// Raise a software interrupt on the calling hart without going through
/// SBI: `sip`'s SSIP bit is writable locally. Used to route a voluntary
/// `task_yield()` through the same trap path as a timer-driven preemption,
/// so both get identical register save/restore.
pub fn raise_self_ipi() {
    let sip = crate::arch::cpu::sip_read();
    crate::arch::cpu::sip_write(sip | (1 << SSIP_BIT));
}
