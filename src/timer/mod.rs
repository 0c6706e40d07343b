//! Software timer wheel multiplexed onto the single hardware comparator.
//!
//! Pending timers live in a singly-linked list sorted by non-decreasing
//! expiry, owned node-by-node: `create` allocates and links a node in,
//! `handle_tick` unlinks the expired head, runs its callback with the lock
//! released, then frees it. When the list empties, a self-renewing
//! heartbeat timer is armed so the scheduler keeps running even with no
//! application timers outstanding.

use alloc::boxed::Box;

use crate::sync::IrqLock;

/// Ticks per logical "timeout unit" passed to [`create`]; approximates one
/// second at the platform's configured timebase frequency.
pub const TIMER_INTERVAL: u64 = 10_000_000;

pub type Callback = fn(usize);

struct TimerNode {
    callback: Callback,
    arg: usize,
    expiry: u64,
    next: Option<Box<TimerNode>>,
}

static TIMERS: IrqLock<Option<Box<TimerNode>>> = IrqLock::new(None);

/// Current value of the monotonic hardware counter.
pub fn now() -> u64 {
    crate::arch::cpu::time_read()
}

/// Fires once per [`TIMER_INTERVAL`] and re-arms itself (see
/// [`handle_tick`]) whenever no other timer is pending — the periodic
/// driver behind preemption. Charges the running task's timeslice rather
/// than rescheduling unconditionally; see [`crate::sched::tick`].
fn heartbeat(_arg: usize) {
    crate::sched::tick();
}

/// Enable the supervisor timer interrupt and arm the comparator for one
/// tick out. Call once at boot, after [`init`].
pub fn start() {
    use crate::arch::cpu;
    cpu::sie_write(cpu::sie_read() | cpu::SIE_STIE);
    cpu::sstatus_sti();
    create(heartbeat, 0, 1);
}

/// Reset the timer list to empty. Idempotent; safe to call once at boot.
pub fn init() {
    let mut head = TIMERS.lock();
    *head = None;
}

/// Register a timer that fires `timeout` units (each [`TIMER_INTERVAL`]
/// ticks) from now, in sorted position. Returns `false` if the heap is
/// exhausted (node allocation failed) — the caller decides whether to
/// retry or treat this as fatal.
pub fn create(callback: Callback, arg: usize, timeout: u32) -> bool {
    let expiry = now() + timeout as u64 * TIMER_INTERVAL;
    let node = match try_box(TimerNode { callback, arg, expiry, next: None }) {
        Some(node) => node,
        None => return false,
    };

    let mut head = TIMERS.lock();
    insert_sorted(&mut head, node);
    let comparator = head.as_ref().expect("just inserted a node").expiry;
    let _ = crate::sbi::time::set_timer(comparator);
    true
}

/// Allocate a `TimerNode` without the infallible-OOM-abort behavior of
/// `Box::new`, since the baseline heap is a fixed page-backed pool and
/// exhaustion must be reported, not panicked on.
fn try_box(node: TimerNode) -> Option<Box<TimerNode>> {
    let layout = core::alloc::Layout::new::<TimerNode>();
    let ptr = unsafe { alloc::alloc::alloc(layout) } as *mut TimerNode;
    if ptr.is_null() {
        return None;
    }
    unsafe {
        ptr.write(node);
        Some(Box::from_raw(ptr))
    }
}

fn insert_sorted(head: &mut Option<Box<TimerNode>>, mut node: Box<TimerNode>) {
    match head {
        Some(h) if h.expiry <= node.expiry => insert_sorted(&mut h.next, node),
        _ => {
            node.next = head.take();
            *head = Some(node);
        }
    }
}

/// Drain every timer whose expiry has passed, firing callbacks with the
/// lock released, then reprogram the comparator for the new head (or arm a
/// one-tick heartbeat if the list is empty).
pub fn handle_tick() {
    loop {
        let expired = {
            let mut head = TIMERS.lock();
            match head.as_ref() {
                Some(h) if h.expiry <= now() => {
                    let mut node = head.take().unwrap();
                    *head = node.next.take();
                    Some(node)
                }
                _ => None,
            }
        };

        match expired {
            Some(node) => (node.callback)(node.arg),
            None => break,
        }
    }

    let next_expiry = TIMERS.lock().as_ref().map(|h| h.expiry);
    match next_expiry {
        Some(expiry) => {
            let _ = crate::sbi::time::set_timer(expiry);
        }
        None => {
            create(heartbeat, 0, 1);
        }
    }
}

/// Cancel the first pending timer whose callback and argument match. There
/// is no opaque cancellation token in the baseline design: a caller cancels
/// by identity of what it registered.
pub fn cancel(callback: Callback, arg: usize) -> bool {
    let mut head = TIMERS.lock();
    remove_matching(&mut head, callback, arg)
}

fn remove_matching(slot: &mut Option<Box<TimerNode>>, callback: Callback, arg: usize) -> bool {
    match slot {
        None => false,
        Some(node) if node.callback == callback && node.arg == arg => {
            let mut removed = slot.take().unwrap();
            *slot = removed.next.take();
            true
        }
        Some(node) => remove_matching(&mut node.next, callback, arg),
    }
}

/// Number of pending timers, for diagnostics and tests.
pub fn pending_count() -> usize {
    let head = TIMERS.lock();
    let mut count = 0;
    let mut cur = head.as_ref();
    while let Some(n) = cur {
        count += 1;
        cur = n.next.as_ref();
    }
    count
}

/// Print the pending timer list to the kernel console.
pub fn print_timers() {
    crate::println_k!("=== Timer List ===");
    crate::println_k!("current tick: {}", now());
    let head = TIMERS.lock();
    let mut cur = head.as_ref();
    let mut i = 0;
    while let Some(n) = cur {
        crate::println_k!("  [{}] expiry={} arg={:#x}", i, n.expiry, n.arg);
        cur = n.next.as_ref();
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    static FIRED: AtomicUsize = AtomicUsize::new(0);
    static LAST_ARG: AtomicUsize = AtomicUsize::new(0);

    fn record(arg: usize) {
        LAST_ARG.store(arg, Ordering::SeqCst);
        FIRED.fetch_add(1, Ordering::SeqCst);
    }

    fn reset() {
        FIRED.store(0, Ordering::SeqCst);
        LAST_ARG.store(0, Ordering::SeqCst);
        init();
    }

    #[test]
    fn insert_sorted_keeps_ties_in_insertion_order() {
        reset();
        let mut head = None;
        insert_sorted(&mut head, Box::new(TimerNode { callback: record, arg: 1, expiry: 5, next: None }));
        insert_sorted(&mut head, Box::new(TimerNode { callback: record, arg: 2, expiry: 5, next: None }));
        insert_sorted(&mut head, Box::new(TimerNode { callback: record, arg: 3, expiry: 1, next: None }));

        let first = head.as_ref().unwrap();
        assert_eq!(first.arg, 3);
        let second = first.next.as_ref().unwrap();
        assert_eq!(second.arg, 1);
        let third = second.next.as_ref().unwrap();
        assert_eq!(third.arg, 2);
    }

    #[test]
    fn cancel_removes_matching_node_only() {
        reset();
        let mut head = None;
        insert_sorted(&mut head, Box::new(TimerNode { callback: record, arg: 10, expiry: 1, next: None }));
        insert_sorted(&mut head, Box::new(TimerNode { callback: record, arg: 20, expiry: 2, next: None }));
        assert!(remove_matching(&mut head, record, 10));
        assert!(!remove_matching(&mut head, record, 10));
        assert_eq!(head.unwrap().arg, 20);
    }
}
