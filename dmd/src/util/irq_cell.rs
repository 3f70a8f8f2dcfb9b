//! Values shared between thread mode and a single interrupt.
//!
//! Thread-mode access masks *only* the interrupt that shares the value, never
//! interrupts globally, so the scan-out timer keeps running while the main
//! loop reads a counter the coin sensor ISR updates.

use core::cell::UnsafeCell;

use crate::hw::IrqGate;
use crate::priority::Thread;

/// A `T` shared between thread mode and the interrupt behind gate `G`.
///
/// Thread-mode accessors mask `G`'s interrupt for the duration of the access
/// and then restore the mask state exactly as they found it, so they nest.
/// Interrupt-side accessors require `G`'s priority token.
///
/// Values are only ever moved in and out, never lent, so code running inside
/// an `update` closure cannot observe an aliased reference.
pub struct IrqCell<T, G> {
    gate: G,
    value: UnsafeCell<T>,
}

// Safety: all access to `value` is either from thread mode with the only other
// user (the ISR behind `gate`) masked, or from that ISR itself, which cannot
// preempt itself.
unsafe impl<T: Copy + Send, G: IrqGate + Sync> Sync for IrqCell<T, G> {}

impl<T, G> IrqCell<T, G> {
    pub const fn new(gate: G, value: T) -> Self {
        IrqCell {
            gate,
            value: UnsafeCell::new(value),
        }
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }
}

impl<T: Copy, G: IrqGate> IrqCell<T, G> {
    /// Runs `body` with the interrupt masked, restoring the previous mask
    /// state afterwards, even on unwind.
    fn masked<R>(&self, body: impl FnOnce() -> R) -> R {
        let was_unmasked = self.gate.mask();
        let _restore = scopeguard::guard((), |_| {
            if was_unmasked {
                self.gate.unmask();
            }
        });
        body()
    }

    pub fn get(&self, _: &Thread) -> T {
        // Safety: ISR masked; see impl Sync.
        self.masked(|| unsafe { *self.value.get() })
    }

    pub fn set(&self, t: &Thread, value: T) {
        self.replace(t, value);
    }

    /// Stores `value` and returns the previous contents as one atomic step
    /// with respect to the interrupt.
    pub fn replace(&self, _: &Thread, value: T) -> T {
        // Safety: ISR masked; see impl Sync.
        self.masked(|| unsafe { core::ptr::replace(self.value.get(), value) })
    }

    /// Replaces the contents with `f(contents)`, returning the new value.
    pub fn update(&self, _: &Thread, f: impl FnOnce(T) -> T) -> T {
        self.masked(|| {
            // Safety: ISR masked; see impl Sync. No reference outlives each
            // access, so a nested access from `f` is harmless.
            let new = f(unsafe { *self.value.get() });
            unsafe { *self.value.get() = new };
            new
        })
    }

    pub fn isr_get(&self, _: &G::Priority) -> T {
        // Safety: we are the ISR; thread mode can't run until we return.
        unsafe { *self.value.get() }
    }

    /// Interrupt-side `update`.
    pub fn isr_update(&self, _: &G::Priority, f: impl FnOnce(T) -> T) -> T {
        // Safety: we are the ISR; thread mode can't run until we return.
        let new = f(unsafe { *self.value.get() });
        unsafe { *self.value.get() = new };
        new
    }
}
