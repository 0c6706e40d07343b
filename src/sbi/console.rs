//! Legacy console extensions (EIDs 0x01/0x02): byte-at-a-time I/O.
//!
//! These predate the multi-function extension convention but are still
//! invoked through the same `(eid, fid, a0..a5) -> (error, value)` shape,
//! with `fid` always zero.

use super::call;

pub const PUTCHAR_EID: u32 = 0x01;
pub const GETCHAR_EID: u32 = 0x02;

/// Write one byte to the debug console. Never fails from the kernel's
/// point of view; a firmware-level failure has no recovery here.
pub fn putchar(b: u8) {
    let _ = unsafe { call(PUTCHAR_EID, 0x0, b as usize, 0, 0, 0, 0, 0) };
}

/// Read one byte from the debug console, or `None` if nothing is waiting.
pub fn getchar() -> Option<u8> {
    match unsafe { call(GETCHAR_EID, 0x0, 0, 0, 0, 0, 0, 0) } {
        Ok(c) if (c as isize) >= 0 => Some(c as u8),
        _ => None,
    }
}
