//! Hand-off of hardware from thread mode to an ISR.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, Ordering};

/// Protects a `T` with a lock flag so that it can't be accessed concurrently
/// or reentrantly.
///
/// Locking never waits: it either succeeds at once or reports contention. This
/// is how the ISRs hold on to their hardware: thread mode installs it once, and
/// from then on only the ISR takes the lock. An ISR finding the lock held is a
/// bug.
#[derive(Debug)]
pub struct SpinLock<T: ?Sized> {
    locked: AtomicBool,
    contents: UnsafeCell<T>,
}

unsafe impl<T: Send + ?Sized> Sync for SpinLock<T> {}

impl<T> SpinLock<T> {
    pub const fn new(contents: T) -> Self {
        SpinLock {
            locked: AtomicBool::new(false),
            contents: UnsafeCell::new(contents),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SpinLockError {
    Contended,
}

impl<T: ?Sized + Send> SpinLock<T> {
    pub fn try_lock(&self) -> Result<SpinLockGuard<T>, SpinLockError> {
        if self.locked.swap(true, Ordering::Acquire) {
            Err(SpinLockError::Contended)
        } else {
            // We made the false->true transition, so nobody else holds a
            // reference until the guard drops.
            Ok(SpinLockGuard {
                locked: LockBorrow(&self.locked),
                contents: unsafe { &mut *self.contents.get() },
            })
        }
    }
}

impl<T: Send> SpinLock<Option<T>> {
    /// Moves `value` in, returning whatever was there before.
    pub fn install(&self, value: T) -> Result<Option<T>, SpinLockError> {
        let mut guard = self.try_lock()?;
        Ok(guard.replace(value))
    }
}

#[must_use = "if dropped, the spinlock will immediately unlock"]
#[derive(Debug)]
pub struct SpinLockGuard<'a, T: ?Sized> {
    locked: LockBorrow<'a>,
    contents: &'a mut T,
}

/// Releases the lock flag when dropped. Kept apart from `SpinLockGuard` so
/// that `map` can take the guard apart, which `Drop` types don't allow.
#[derive(Debug)]
struct LockBorrow<'a>(&'a AtomicBool);

impl<'a, T: ?Sized> SpinLockGuard<'a, T> {
    /// Narrows a guard of `T` to a guard of part of `T`.
    pub fn map<U: ?Sized>(
        orig: SpinLockGuard<'a, T>,
        f: impl FnOnce(&mut T) -> &mut U,
    ) -> SpinLockGuard<'a, U> {
        let SpinLockGuard { locked, contents } = orig;
        SpinLockGuard {
            locked,
            contents: f(contents),
        }
    }
}

impl<'a, T: ?Sized> core::ops::Deref for SpinLockGuard<'a, T> {
    type Target = T;
    fn deref(&self) -> &T {
        self.contents
    }
}

impl<'a, T: ?Sized> core::ops::DerefMut for SpinLockGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.contents
    }
}

impl<'a> Drop for LockBorrow<'a> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Locks hardware installed for an ISR.
///
/// # Panics
///
/// If the lock is held, which would mean the ISR preempted thread mode while it
/// was still installing the hardware, or if nothing has been installed,
/// implying the interrupt was enabled too early.
pub fn acquire_hw<T: Send>(lock: &SpinLock<Option<T>>) -> SpinLockGuard<T> {
    SpinLockGuard::map(
        lock.try_lock().expect("HW lock held at ISR"),
        |o| o.as_mut().expect("ISR fired without HW available"),
    )
}
