//! HSM extension (EID 0x48534D): hart lifecycle management.
//!
//! Exposed for the supplemented hart-lifecycle feature (see `crate::hart`):
//! secondary harts may be started and stopped, but never join hart 0's run
//! queue.

use super::{call, SbiResult};

pub const EID: u32 = 0x0048_534D;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum HartState {
    Started,
    Stopped,
    StartPending,
    StopPending,
    Suspended,
    SuspendPending,
    ResumePending,
}

impl HartState {
    fn from_code(code: usize) -> Option<Self> {
        match code {
            0 => Some(Self::Started),
            1 => Some(Self::Stopped),
            2 => Some(Self::StartPending),
            3 => Some(Self::StopPending),
            4 => Some(Self::Suspended),
            5 => Some(Self::SuspendPending),
            6 => Some(Self::ResumePending),
            _ => None,
        }
    }
}

/// Start `hartid` executing at `start_addr` with `opaque` left in `a1`.
pub fn hart_start(hartid: usize, start_addr: usize, opaque: usize) -> SbiResult<()> {
    let res = unsafe { call(EID, 0x0, hartid, start_addr, opaque, 0, 0, 0) };
    res.map(|_| ())
}

/// Stop the calling hart. Does not return on success.
pub fn hart_stop() -> SbiResult<()> {
    let res = unsafe { call(EID, 0x1, 0, 0, 0, 0, 0, 0) };
    res.map(|_| ())
}

/// Query the lifecycle state of `hartid`.
pub fn hart_status(hartid: usize) -> SbiResult<HartState> {
    let res = unsafe { call(EID, 0x2, hartid, 0, 0, 0, 0, 0) }?;
    Ok(HartState::from_code(res).unwrap_or(HartState::Stopped))
}
