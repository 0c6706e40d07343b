//! Critical-section primitive for kernel-shared state.
//!
//! A single hart ever executes kernel code at a time, so the only
//! concurrency kernel-shared state (the task table, run queues, timer list,
//! heap free list, page descriptors) needs to survive is interrupts
//! preempting whatever held the lock last. [`IrqLock`] therefore masks
//! supervisor interrupts on acquire and restores the prior `sstatus` on
//! release, rather than spinning on an atomic — there is nothing else to
//! spin against.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};

use crate::arch::cpu;

pub struct IrqLock<T> {
    inner: UnsafeCell<T>,
}

unsafe impl<T: Send> Send for IrqLock<T> {}
unsafe impl<T: Send> Sync for IrqLock<T> {}

impl<T> IrqLock<T> {
    pub const fn new(value: T) -> Self {
        IrqLock {
            inner: UnsafeCell::new(value),
        }
    }

    /// Mask supervisor interrupts and return a guard granting exclusive
    /// access. Interrupts are restored to whatever they were before when
    /// the guard drops.
    pub fn lock(&self) -> IrqLockGuard<'_, T> {
        let flags = cpu::sstatus_cli_save();
        IrqLockGuard { lock: self, flags }
    }
}

pub struct IrqLockGuard<'a, T> {
    lock: &'a IrqLock<T>,
    flags: usize,
}

impl<'a, T> Deref for IrqLockGuard<'a, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.lock.inner.get() }
    }
}

impl<'a, T> DerefMut for IrqLockGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.inner.get() }
    }
}

impl<'a, T> Drop for IrqLockGuard<'a, T> {
    fn drop(&mut self) {
        cpu::sstatus_write(self.flags);
    }
}

/// Assert that the caller holds some `IrqLock`, i.e. that interrupts are
/// currently masked. Kernel state accessors that require a lock to be held
/// call this in debug builds per the "assert the lock is held" convention.
#[inline(always)]
pub fn assert_irq_masked() {
    debug_assert!(cpu::is_irq_disabled(), "kernel state accessed without masking interrupts");
}
