//! SRST extension (EID 0x53525354): system reset/shutdown.

use super::{call, SbiError, SbiResult};

pub const EID: u32 = 0x5352_5354;

#[repr(usize)]
pub enum ResetType {
    Shutdown = 0,
    ColdReboot = 1,
    WarmReboot = 2,
}

#[repr(usize)]
pub enum ResetReason {
    None = 0,
    SystemFailure = 1,
}

/// Ask the firmware to reset the system. Never returns on success; returns
/// an error only if the firmware refuses the request.
pub fn reset_system(ty: ResetType, reason: ResetReason) -> SbiResult<core::convert::Infallible> {
    let res = unsafe { call(EID, 0x0, ty as usize, reason as usize, 0, 0, 0, 0) };
    match res {
        Ok(_) => Err(SbiError::Failed),
        Err(e) => Err(e),
    }
}
