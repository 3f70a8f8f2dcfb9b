//! Type-level representation of execution priorities.
//!
//! All the priority types are zero-sized tokens. Code that must only run in a
//! particular context takes a reference to the matching token, which can only
//! be produced in that context. The interrupt tokens are created by the
//! interrupt entry points; `Thread` is checked at runtime.

use core::marker::PhantomData;

// Marker type used to cause things to stop being Sync/Send.
type NotSyncOrSend = PhantomData<*mut ()>;

/// The periodic timer interrupt that drives scan-out and the timebase. This is
/// the highest priority interrupt in the system.
#[derive(Copy, Clone)]
pub struct Scan(NotSyncOrSend);

/// The edge-triggered input interrupts. All edge lines share one priority, so
/// they cannot preempt each other.
#[derive(Copy, Clone)]
pub struct Edge(NotSyncOrSend);

/// Thread mode execution occurs outside any interrupt handler.
#[derive(Copy, Clone)]
pub struct Thread(NotSyncOrSend);

impl Scan {
    /// # Safety
    ///
    /// Only the scan timer ISR may call this.
    pub unsafe fn new() -> Self {
        Scan(PhantomData)
    }
}

impl Edge {
    /// # Safety
    ///
    /// Only an edge-input ISR may call this.
    pub unsafe fn new() -> Self {
        Edge(PhantomData)
    }
}

impl Thread {
    pub(crate) unsafe fn new() -> Self {
        Thread(PhantomData)
    }
}

#[cfg(target_os = "none")]
impl Thread {
    /// Returns a `Thread` token only if called from thread priority.
    pub fn new_checked() -> Option<Self> {
        // Safety: reads of the ICSR are safe.
        let icsr = unsafe { &(*cortex_m::peripheral::SCB::ptr()).icsr }.read();
        if icsr & 0xFF == 0 {
            Some(unsafe { Self::new() })
        } else {
            None
        }
    }
}

#[cfg(not(target_os = "none"))]
impl Thread {
    /// Returns a `Thread` token. In simulation nothing runs at interrupt
    /// priority, so this always succeeds.
    pub fn new_checked() -> Option<Self> {
        Some(unsafe { Self::new() })
    }
}

/// Indicates that a type represents an interrupt priority level.
pub trait InterruptPriority {}

impl InterruptPriority for Scan {}
impl InterruptPriority for Edge {}
