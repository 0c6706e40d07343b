//! Page-based physical memory allocation.
//!
//! The principal algorithm is a flat, flags-per-page bitmap allocator: a
//! `Page` descriptor array covers every 4KiB frame in the manageable range,
//! each descriptor carrying only `TAKEN`/`LAST` flags, and allocation is a
//! linear scan for the first run of free descriptors long enough to satisfy
//! the request. This trades the O(log n) of a buddy allocator for a much
//! smaller, auditable implementation; see [`mm::heap`] for the layer that
//! actually serves variable-size allocations out of pages obtained here.
//!
//! ## Allocation API
//!
//! | Allocation API | Return | Description |
//! | -------------- | ------ | ----------- |
//! | [`alloc`] | `Option<usize>` | Allocate `n` contiguous pages, return the base address |
//! | [`free`] | `()` | Free the page run starting at `addr` |
//!
//! ## Calling Convention
//! [`init`] must run exactly once, before any other function in this module,
//! and after the linker-provided memory bounds are known.
//!
//! [`mm::heap`]: super::heap

use core::sync::atomic::{AtomicUsize, Ordering};

use crate::util::align::align_up;

pub const PAGE_ORDER: usize = 12;
pub const PAGE_SIZE: usize = 1 << PAGE_ORDER;

const TAKEN: u8 = 1 << 0;
const LAST: u8 = 1 << 1;

/// Per-frame metadata. One of these exists for every manageable physical
/// page; the array itself lives in the pages immediately following the
/// kernel image.
#[derive(Clone, Copy)]
struct Page {
    flags: u8,
}

impl Page {
    const fn empty() -> Self {
        Page { flags: 0 }
    }

    fn is_free(&self) -> bool {
        self.flags & TAKEN == 0
    }

    fn is_last(&self) -> bool {
        self.flags & LAST != 0
    }

    fn clear(&mut self) {
        self.flags = 0;
    }

    fn set(&mut self, flag: u8) {
        self.flags |= flag;
    }
}

struct Allocator {
    descriptors: *mut Page,
    num_pages: usize,
    alloc_start: usize,
    alloc_end: usize,
    memory_start: usize,
}

unsafe impl Send for Allocator {}
unsafe impl Sync for Allocator {}

static READY: AtomicUsize = AtomicUsize::new(0);
static mut ALLOCATOR: Option<Allocator> = None;

/// Initialize the page allocator over `[memory_start, memory_end)`. The
/// descriptor array is carved out starting at `descriptors_base` (the
/// linker-reported end of BSS, page-aligned by the caller), and the pages
/// it and the kernel image itself occupy are pre-marked `TAKEN`.
///
/// # Safety
/// `memory_start..memory_end` must be a region of RAM not otherwise in use
/// by anything except the kernel image that precedes `descriptors_base`.
pub unsafe fn init(memory_start: usize, memory_end: usize, descriptors_base: usize) {
    let num_pages = (memory_end - memory_start) / PAGE_SIZE;
    let descriptors = descriptors_base as *mut Page;

    for i in 0..num_pages {
        unsafe {
            descriptors.add(i).write(Page::empty());
        }
    }

    let alloc_start = align_up(
        descriptors_base + num_pages * core::mem::size_of::<Page>(),
        PAGE_ORDER,
    );
    let alloc_end = memory_end;

    let reserved_pages = (alloc_start - memory_start) / PAGE_SIZE;
    for i in 0..reserved_pages {
        unsafe {
            (*descriptors.add(i)).set(TAKEN);
        }
    }

    log::info!(
        "page allocator: {} pages total, {} reserved, heap [{:#x}, {:#x})",
        num_pages,
        reserved_pages,
        alloc_start,
        alloc_end
    );

    unsafe {
        ALLOCATOR = Some(Allocator {
            descriptors,
            num_pages,
            alloc_start,
            alloc_end,
            memory_start,
        });
    }
    READY.store(1, Ordering::Release);
}

fn allocator() -> &'static Allocator {
    assert_eq!(READY.load(Ordering::Acquire), 1, "page allocator not initialized");
    unsafe { ALLOCATOR.as_ref().unwrap() }
}

/// Allocate `npages` contiguous physical pages. Returns `None` if `npages`
/// is zero, exceeds the manageable range, or no long-enough free run exists.
pub fn alloc(npages: usize) -> Option<usize> {
    let a = allocator();
    if npages == 0 || npages > a.num_pages {
        return None;
    }

    let descriptors = unsafe { core::slice::from_raw_parts_mut(a.descriptors, a.num_pages) };

    let mut i = 0;
    while i + npages <= a.num_pages {
        if descriptors[i].is_free() {
            let mut run_ok = true;
            for j in 1..npages {
                if !descriptors[i + j].is_free() {
                    run_ok = false;
                    i += j;
                    break;
                }
            }
            if run_ok {
                for k in 0..npages {
                    descriptors[i + k].set(TAKEN);
                }
                descriptors[i + npages - 1].set(LAST);
                return Some(a.memory_start + i * PAGE_SIZE);
            }
        } else {
            i += 1;
        }
    }
    None
}

/// Free the contiguous page run that starts at `addr`, which must be a
/// value previously returned by [`alloc`]. Walks forward from the first
/// descriptor clearing flags until the descriptor marked `LAST` is cleared.
pub fn free(addr: usize) {
    let a = allocator();
    if addr < a.alloc_start || addr >= a.alloc_end {
        log::warn!("page::free: address {:#x} outside managed range", addr);
        return;
    }

    let index = (addr - a.memory_start) / PAGE_SIZE;
    if index >= a.num_pages {
        log::warn!("page::free: index {} out of bounds", index);
        return;
    }

    let descriptors = unsafe { core::slice::from_raw_parts_mut(a.descriptors, a.num_pages) };
    if descriptors[index].is_free() {
        log::warn!("page::free: double free at {:#x}", addr);
        return;
    }

    let mut i = index;
    loop {
        let last = descriptors[i].is_last();
        descriptors[i].clear();
        if last || i + 1 >= a.num_pages {
            break;
        }
        i += 1;
    }
}

/// Total number of pages the allocator manages (reserved + allocatable).
pub fn total_pages() -> usize {
    allocator().num_pages
}

/// Serializes access to the global allocator state across host tests in
/// this module and in `mm::heap`, which shares the same statics.
#[cfg(test)]
pub(crate) static TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Pages available for allocation (excludes the kernel image and the
/// descriptor array itself).
pub fn allocatable_pages() -> usize {
    let a = allocator();
    a.num_pages - (a.alloc_start - a.memory_start) / PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::alloc::{alloc as std_alloc, Layout};

    fn with_allocator(num_pages: usize, test: impl FnOnce()) {
        let _guard = TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let region_size = num_pages * PAGE_SIZE * 2;
        let layout = Layout::from_size_align(region_size, PAGE_SIZE).unwrap();
        let base = unsafe { std_alloc(layout) } as usize;
        let memory_start = base;
        let memory_end = base + num_pages * PAGE_SIZE;
        let descriptors_base = memory_end;
        unsafe {
            init(memory_start, memory_end, descriptors_base);
        }
        test();
        unsafe {
            READY.store(0, Ordering::Release);
            ALLOCATOR = None;
        }
    }

    #[test]
    fn allocates_and_frees_single_page() {
        with_allocator(16, || {
            let before = allocatable_pages();
            let p = alloc(1).expect("alloc should succeed");
            assert_eq!(allocatable_pages(), before - 1);
            free(p);
            assert_eq!(allocatable_pages(), before);
        });
    }

    #[test]
    fn allocates_contiguous_run() {
        with_allocator(16, || {
            let p0 = alloc(1).unwrap();
            let run = alloc(3).unwrap();
            assert_ne!(p0, run);
            free(run);
            free(p0);
        });
    }

    #[test]
    fn fails_when_exhausted() {
        with_allocator(4, || {
            let allocatable = allocatable_pages();
            let _ = alloc(allocatable).expect("should fit exactly");
            assert!(alloc(1).is_none());
        });
    }

    #[test]
    fn rejects_zero_and_oversized_requests() {
        with_allocator(4, || {
            assert!(alloc(0).is_none());
            assert!(alloc(total_pages() + 1).is_none());
        });
    }

    #[test]
    fn double_free_is_a_noop_warning_not_a_crash() {
        with_allocator(4, || {
            let p = alloc(1).unwrap();
            free(p);
            free(p); // must not panic
        });
    }
}
