//! Trap vector installation and dispatch.

mod cause;
mod context;
mod vector;

pub use cause::{classify, Trap};
pub use context::{Context, FRAME_WORDS, REGISTER_COUNT};

use crate::arch::cpu;

/// `sscratch` target before the first task is scheduled. A trap with no
/// task running (boot, or a kernel-fatal fault) saves into this and is
/// never resumed from it — `dispatch` treats faults with no current task
/// as fatal.
static mut BOOT_CONTEXT: Context = Context::zeroed();

/// Install the trap vector and point `sscratch` at the boot context. Must
/// run once per hart before supervisor interrupts are enabled.
pub fn init() {
    #[cfg(target_arch = "riscv64")]
    unsafe {
        extern "C" {
            fn trap_vector();
        }
        cpu::stvec_write(trap_vector as usize);
        let frame_addr = core::ptr::addr_of_mut!(BOOT_CONTEXT) as usize;
        cpu::sscratch_write(frame_addr);
    }
}

/// Entry point called from the assembly trap stub with the raw `scause`
/// and a pointer to the current task's saved `Context`. `sepc`/`sstatus`
/// are fields of that same `Context` (saved by the stub before the call,
/// restored by it after) — this function never returns a resume address;
/// it mutates `ctx.pc` directly when a syscall needs to skip the `ecall`.
#[no_mangle]
extern "C" fn trap_dispatch_entry(scause: usize, ctx: *mut Context) {
    let ctx = unsafe { &mut *ctx };
    dispatch(scause, ctx);
}

fn dispatch(scause: usize, ctx: &mut Context) {
    match classify(scause) {
        Trap::SoftwareInterrupt => {
            crate::sbi::ipi::clear_ipi();
            crate::sched::schedule();
        }
        Trap::TimerInterrupt => {
            crate::timer::handle_tick();
        }
        Trap::ExternalInterrupt => {}
        Trap::UnknownInterrupt(code) => {
            log::warn!("unhandled interrupt cause {:#x}", code);
        }
        Trap::EnvironmentCall => {
            crate::syscall::dispatch(ctx);
        }
        Trap::IllegalInstruction => fault("illegal instruction", ctx),
        Trap::LoadFault => fault("load fault", ctx),
        Trap::StoreFault => fault("store fault", ctx),
        Trap::UnknownException(code) => {
            panic!("unhandled exception {:#x} at {:#x}", code, ctx.pc);
        }
    }
}

/// Drop into the task `sched::schedule()` most recently selected, without
/// ever having taken a trap. Call once, from the boot path, after the
/// first `schedule()` call has pointed `sscratch` at a task's `Context`.
/// Diverges: control never returns to the caller, only into the task (and
/// from there, back through `trap_vector` on its next trap).
#[cfg(target_arch = "riscv64")]
pub unsafe fn enter_first_task() -> ! {
    extern "C" {
        fn enter_first_task() -> !;
    }
    unsafe { enter_first_task() }
}

/// A synchronous hardware fault. If a task was running, it is the one at
/// fault: exit it and reschedule. Otherwise the kernel itself faulted,
/// which is unrecoverable.
fn fault(what: &str, ctx: &mut Context) {
    match crate::sched::current_task_id() {
        Some(id) => {
            log::warn!("{} at {:#x} (task {}), stval={:#x}", what, ctx.pc, id, cpu::stval_read());
            crate::sched::task_exit(-1);
        }
        None => panic!("{} at {:#x}, stval={:#x}", what, ctx.pc, cpu::stval_read()),
    }
}
