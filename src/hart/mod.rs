//! Hart lifecycle: starting/stopping secondary harts and reporting status,
//! wrapping the SBI HSM extension in [`crate::sbi::hsm`]. Secondary harts
//! may be brought up for testing but never join hart 0's run queue — there
//! is exactly one [`crate::sched`] instance, owned by the boot hart.

use core::sync::atomic::{AtomicUsize, Ordering};

use crate::sbi::hsm::{self, HartState};

/// Harts this platform is expected to have. QEMU `virt` with `-smp 8` is
/// the largest configuration exercised; raise if a bigger topology shows up.
pub const MAX_HARTS: usize = 8;

/// Spin-wait bound for [`start`] while polling for the target hart to
/// report STARTED. Not a tick count — each iteration is a handful of SBI
/// calls, so this is deliberately generous rather than time-calibrated.
const START_TIMEOUT_ITERS: usize = 1_000_000;

static BOOT_HART_ID: AtomicUsize = AtomicUsize::new(0);

/// Record the id of the hart that booted the kernel. Call once, before
/// anything asks [`current_id`].
pub fn init(boot_hart_id: usize) {
    BOOT_HART_ID.store(boot_hart_id, Ordering::Relaxed);
}

/// The id of the hart that booted the kernel. With no SMP scheduling this
/// also doubles as "the hart any task happens to run on".
pub fn current_id() -> usize {
    BOOT_HART_ID.load(Ordering::Relaxed)
}

/// Start `hartid` executing at `start_addr` with `opaque` left for it to
/// pick up (typically in `a1`), and poll until it reports STARTED or the
/// timeout elapses. Refuses to start a hart that isn't STOPPED.
pub fn start(hartid: usize, start_addr: usize, opaque: usize) -> Result<(), &'static str> {
    if hartid >= MAX_HARTS {
        return Err("hart id out of range");
    }

    match hsm::hart_status(hartid) {
        Ok(HartState::Started) => return Ok(()),
        Ok(HartState::Stopped) => {}
        Ok(_) => return Err("hart is mid-transition, cannot start"),
        Err(_) => return Err("failed to query hart status"),
    }

    hsm::hart_start(hartid, start_addr, opaque).map_err(|_| "sbi hart_start failed")?;

    for _ in 0..START_TIMEOUT_ITERS {
        if let Ok(HartState::Started) = hsm::hart_status(hartid) {
            return Ok(());
        }
        core::hint::spin_loop();
    }
    Err("timed out waiting for hart to start")
}

/// Stop the calling hart. Does not return on success; on failure (no HSM,
/// or the call itself errors) falls back to spinning in `wfi`.
pub fn stop_self() -> ! {
    let _ = hsm::hart_stop();
    loop {
        #[cfg(target_arch = "riscv64")]
        unsafe {
            core::arch::asm!("wfi");
        }
        #[cfg(not(target_arch = "riscv64"))]
        core::hint::spin_loop();
    }
}

/// Log every hart's lifecycle state, for diagnostics.
pub fn print_status_all() {
    log::debug!("=== Hart Status ===");
    for id in 0..MAX_HARTS {
        match hsm::hart_status(id) {
            Ok(state) => log::debug!("  hart {}: {:?}", id, state),
            Err(e) => log::debug!("  hart {}: query failed ({:?})", id, e),
        }
    }
}
