//! A K&R-style variable-size heap, layered on [`super::page`].
//!
//! Every block, free or allocated, begins with a [`Header`]. Free blocks
//! form a circular, address-ordered singly-linked list; `alloc` walks it
//! first-fit and `free` re-inserts at the address-sorted position,
//! coalescing with whichever neighbor is adjacent. When the free list can't
//! satisfy a request, [`more_core`] grows the heap by pulling whole pages
//! from the page allocator and feeding them back through `free`.

use core::mem::size_of;
use core::ptr::NonNull;

use super::page;

#[derive(Clone, Copy)]
#[repr(C)]
struct Header {
    next: *mut Header,
    size: usize,
}

const UNIT: usize = size_of::<Header>();

/// The free list's permanently-empty anchor node. `free_ptr` always points
/// somewhere on the cycle that includes `BASE`.
static mut BASE: Header = Header { next: core::ptr::null_mut(), size: 0 };
static mut FREE_PTR: *mut Header = core::ptr::null_mut();

/// Initialize the heap's free list. Must run once, after [`page::init`].
pub fn init() {
    unsafe {
        BASE.next = core::ptr::addr_of_mut!(BASE);
        BASE.size = 0;
        FREE_PTR = core::ptr::addr_of_mut!(BASE);
    }
}

unsafe fn more_core(units: usize) -> *mut Header {
    let npages = (units * UNIT + page::PAGE_SIZE - 1) / page::PAGE_SIZE;
    let npages = npages.max(1);

    let base_addr = match page::alloc(npages) {
        Some(addr) => addr,
        None => return core::ptr::null_mut(),
    };

    let block = base_addr as *mut Header;
    unsafe {
        (*block).size = (npages * page::PAGE_SIZE) / UNIT;
        free(block.add(1) as *mut u8);
    }
    unsafe { FREE_PTR }
}

/// Allocate at least `nbytes` bytes. Returns a null pointer on exhaustion.
pub fn alloc(nbytes: usize) -> *mut u8 {
    if nbytes == 0 {
        return core::ptr::null_mut();
    }
    let nunits = (nbytes + UNIT - 1) / UNIT + 1;

    unsafe {
        let mut prevp = FREE_PTR;
        let mut p = (*prevp).next;
        loop {
            if (*p).size >= nunits {
                if (*p).size == nunits {
                    (*prevp).next = (*p).next;
                } else {
                    (*p).size -= nunits;
                    p = p.add((*p).size);
                    (*p).size = nunits;
                }
                FREE_PTR = prevp;
                return p.add(1) as *mut u8;
            }

            if p == FREE_PTR {
                p = more_core(nunits);
                if p.is_null() {
                    return core::ptr::null_mut();
                }
            }

            prevp = p;
            p = (*p).next;
        }
    }
}

/// Return a block obtained from [`alloc`] to the free list.
///
/// # Safety
/// `ptr` must be a pointer previously returned by `alloc` and not already
/// freed.
pub fn free(ptr: *mut u8) {
    if ptr.is_null() {
        return;
    }
    unsafe {
        let bp = (ptr as *mut Header).sub(1);

        let mut p = FREE_PTR;
        while !(bp > p && bp < (*p).next) {
            if p >= (*p).next && (bp > p || bp < (*p).next) {
                break;
            }
            p = (*p).next;
        }

        if bp.add((*bp).size) == (*p).next {
            (*bp).size += (*(*p).next).size;
            (*bp).next = (*(*p).next).next;
        } else {
            (*bp).next = (*p).next;
        }

        if p.add((*p).size) == bp {
            (*p).size += (*bp).size;
            (*p).next = (*bp).next;
        } else {
            (*p).next = bp;
        }

        FREE_PTR = p;
    }
}

/// Number of free-list nodes and the total free units they hold, for
/// diagnostics and testing.
pub fn free_list_summary() -> (usize, usize) {
    unsafe {
        let mut count = 0;
        let mut units = 0;
        let mut p = (*FREE_PTR).next;
        while p != core::ptr::addr_of_mut!(BASE) {
            count += 1;
            units += (*p).size;
            p = (*p).next;
        }
        (count, units)
    }
}

/// Allocate and zero-initialize `nbytes`.
pub fn zalloc(nbytes: usize) -> NonNull<[u8]> {
    let ptr = alloc(nbytes);
    if !ptr.is_null() {
        unsafe { core::ptr::write_bytes(ptr, 0, nbytes) };
    }
    let slice_ptr = core::ptr::slice_from_raw_parts_mut(ptr, nbytes);
    NonNull::new(slice_ptr).expect("zalloc with non-null ptr")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::alloc::{alloc as std_alloc, Layout};

    fn with_heap(num_pages: usize, test: impl FnOnce()) {
        let _guard = page::TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let region_size = num_pages * page::PAGE_SIZE * 2;
        let layout = Layout::from_size_align(region_size, page::PAGE_SIZE).unwrap();
        let base = unsafe { std_alloc(layout) } as usize;
        let memory_end = base + num_pages * page::PAGE_SIZE;
        unsafe {
            page::init(base, memory_end, memory_end);
        }
        init();
        test();
    }

    #[test]
    fn allocates_and_frees() {
        with_heap(4, || {
            let p = alloc(64);
            assert!(!p.is_null());
            free(p);
        });
    }

    #[test]
    fn coalesces_adjacent_frees() {
        with_heap(4, || {
            let a = alloc(32);
            let b = alloc(32);
            let (_, units_before) = free_list_summary();
            free(a);
            free(b);
            let (count_after, units_after) = free_list_summary();
            assert!(units_after > units_before);
            assert!(count_after >= 1);
        });
    }

    #[test]
    fn zero_size_returns_null() {
        with_heap(4, || {
            assert!(alloc(0).is_null());
        });
    }

    #[test]
    fn grows_heap_via_page_allocator_when_exhausted() {
        with_heap(2, || {
            let big = alloc(page::PAGE_SIZE * 3);
            assert!(!big.is_null());
            free(big);
        });
    }
}
