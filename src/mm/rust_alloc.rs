//! Wires the heap allocator into the Rust `alloc` crate so the kernel can
//! use `Box`, `Vec`, and friends.
//!
//! Only registered for the actual kernel build: the host `cargo test`
//! build links `std`, which already owns the global allocator.

use core::alloc::{GlobalAlloc, Layout};

use super::heap;

struct KernelGlobalAlloc;

unsafe impl GlobalAlloc for KernelGlobalAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        // The heap allocator's units are `Header`-sized and naturally
        // aligned; callers requesting an alignment coarser than that are
        // not supported, since nothing in this kernel does.
        heap::alloc(layout.size())
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        heap::free(ptr);
    }
}

#[cfg(not(test))]
#[global_allocator]
static GA: KernelGlobalAlloc = KernelGlobalAlloc {};
