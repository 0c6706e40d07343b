//! Core kernel logic, split out from the `riscv64gc-unknown-none-elf` binary
//! so that architecture-independent algorithms (the page allocator, the
//! heap, the scheduler, the timer wheel) can be exercised under `cargo test`
//! on the host. Modules that touch CSRs, SBI, or inline asm are gated on
//! `target_arch = "riscv64"` and are opaque to the host test build.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[macro_use]
pub mod macros;

pub mod arch;
#[cfg(target_arch = "riscv64")]
pub mod boot;
pub mod console;
pub mod hart;
pub mod logk;
pub mod mm;
pub mod sbi;
pub mod sched;
pub mod sync;
pub mod syscall;
pub mod timer;
pub mod trap;
pub mod util;
