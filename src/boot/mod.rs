//! Ordered subsystem bring-up, reached once from `_start` (see the binary
//! crate's `main.rs`) with the hart id and device-tree pointer the firmware
//! left in `a0`/`a1`. Only the boot hart ever runs this; secondary harts,
//! if started, are parked in [`secondary_park`] and never reach it.

use core::ptr::addr_of;

use crate::sched::DEFAULT_TIMESLICE;
use crate::syscall::{SYS_EXIT, SYS_SLEEP, SYS_WRITE};

extern "C" {
    static _memory_start: u8;
    static _memory_end: u8;
    static BSS_END: u8;
}

fn memory_start() -> usize {
    unsafe { addr_of!(_memory_start) as usize }
}

fn memory_end() -> usize {
    unsafe { addr_of!(_memory_end) as usize }
}

fn bss_end() -> usize {
    unsafe { addr_of!(BSS_END) as usize }
}

/// Parking loop for a secondary hart started via [`crate::hart::start`].
/// Never touches kernel state and never joins the run queue, matching the
/// "secondary harts may be started but share no runnable queue" Non-goal.
core::arch::global_asm!(
    r#"
    .section .text
    .align 4
    .global secondary_park
secondary_park:
    csrci sstatus, 2
1:
    wfi
    j 1b
    "#
);

fn start_secondary_harts() {
    extern "C" {
        fn secondary_park();
    }
    let target = secondary_park as usize;
    for id in 1..crate::hart::MAX_HARTS {
        match crate::hart::start(id, target, 0) {
            Ok(()) => log::info!("hart {} parked", id),
            Err(e) => log::debug!("hart {} not started: {}", id, e),
        }
    }
}

/// Subsystem init, initial task creation, and the handoff into the
/// scheduler. Never returns.
pub fn run(hart_id: usize, dtb: usize) -> ! {
    crate::logk::init();
    crate::hart::init(hart_id);
    crate::trap::init();

    unsafe {
        crate::mm::init(memory_start(), memory_end(), bss_end());
    }

    crate::sched::init();
    crate::timer::init();

    log::info!("Hello from rvkernel");
    log::info!("booted on hart {}, dtb={:#x}", hart_id, dtb);

    start_secondary_harts();

    crate::sched::task_create(task_high_priority, 0, 3, DEFAULT_TIMESLICE);
    crate::sched::task_create(task_high_priority, 1, 3, DEFAULT_TIMESLICE);
    crate::sched::task_create(task_low_priority_spinner, 0, 129, DEFAULT_TIMESLICE);

    crate::timer::start();
    crate::sched::schedule();

    unsafe { crate::trap::enter_first_task() }
}

/// Issues a syscall from user mode. Tasks run with `SSTATUS_SPP` cleared
/// (see `sched::task_create`), so this is the only way they reach kernel
/// services — a direct SBI `ecall` from U-mode traps here first, not into
/// firmware, and `a7` is read as a syscall number, not an SBI extension id.
unsafe fn syscall3(number: usize, a0: usize, a1: usize, a2: usize) -> isize {
    let ret: isize;
    unsafe {
        core::arch::asm!(
            "ecall",
            inout("a0") a0 => ret,
            in("a1") a1,
            in("a2") a2,
            in("a7") number,
        );
    }
    ret
}

fn demo_write(s: &str) {
    unsafe {
        syscall3(SYS_WRITE, 1, s.as_ptr() as usize, s.len());
    }
}

fn demo_sleep(seconds: usize) {
    unsafe {
        syscall3(SYS_SLEEP, seconds, 0, 0);
    }
}

fn demo_exit(status: usize) -> ! {
    unsafe {
        syscall3(SYS_EXIT, status, 0, 0);
    }
    loop {
        core::hint::spin_loop();
    }
}

/// One of the two priority-3 demo tasks from the worked "two high, one low"
/// scenario: prints its label three times, then exits.
fn task_high_priority(id: usize) {
    let label = if id == 0 { "A\n" } else { "B\n" };
    for _ in 0..3 {
        demo_write(label);
    }
    demo_exit(0);
}

/// The always-READY low-priority task from the same scenario: runs
/// indefinitely once both priority-3 tasks have exited.
fn task_low_priority_spinner(_arg: usize) {
    loop {
        demo_write(".\n");
        demo_sleep(1);
    }
}
