//! TIME extension (EID 0x54494D45): programs the per-hart timer comparator.

use super::{call, SbiResult};

pub const EID: u32 = 0x5449_4D45;

/// Program the hart's timer comparator to fire when `time` CSR reaches
/// `stime_value`, clearing any pending timer interrupt as a side effect.
pub fn set_timer(stime_value: u64) -> SbiResult<()> {
    let res = unsafe { call(EID, 0x0, stime_value as usize, 0, 0, 0, 0, 0) };
    res.map(|_| ())
}
