//! Edge-triggered inputs and their debouncing.
//!
//! An input's ISR latches the event and disarms its own line, so a bouncing
//! contact produces one event. Thread mode consumes the event and re-arms the
//! line once the contact has settled, as judged by one of the debouncers here.
//!
//! Arming is separate from the interrupt mask that thread-mode reads of the
//! latch use. A read that races with the ISR restores the mask on the way out,
//! and must not undo the ISR's disarm by doing so.

use crate::hw::{EdgeSource, IrqGate};
use crate::priority::Thread;
use crate::util::irq_cell::IrqCell;

/// A latched edge event on the line behind gate `G`.
pub struct EdgeInput<G> {
    pending: IrqCell<bool, G>,
}

impl<G> EdgeInput<G> {
    pub const fn new(gate: G) -> Self {
        EdgeInput {
            pending: IrqCell::new(gate, false),
        }
    }
}

impl<G: IrqGate + EdgeSource> EdgeInput<G> {
    /// ISR side: records the edge and disarms the line until `rearm`.
    pub fn on_edge(&self, p: &G::Priority) {
        self.pending.isr_update(p, |_| true);
        self.pending.gate().disarm();
    }

    /// Checks for an unconsumed edge without consuming it.
    pub fn is_pending(&self, t: &Thread) -> bool {
        self.pending.get(t)
    }

    /// Consumes the latched edge, if any.
    pub fn take(&self, t: &Thread) -> bool {
        self.pending.replace(t, false)
    }

    /// Discards edges seen while disarmed and arms the line.
    pub fn rearm(&self, _: &Thread) {
        self.pending.gate().arm();
    }
}

/// Waits out a fixed window after an event, starting from the first poll.
#[derive(Clone, Debug)]
pub struct Holdoff {
    window_ms: u32,
    started: Option<u32>,
}

impl Holdoff {
    pub const fn new(window_ms: u32) -> Self {
        Holdoff {
            window_ms,
            started: None,
        }
    }

    /// Returns `true` once more than the window has passed since the first
    /// poll, and resets for the next event.
    pub fn poll(&mut self, now: u32) -> bool {
        let start = *self.started.get_or_insert(now);
        if now.wrapping_sub(start) > self.window_ms {
            self.started = None;
            true
        } else {
            false
        }
    }
}

/// Confirms that a contact has been released and stayed released.
#[derive(Clone, Debug)]
pub struct ReleaseDebounce {
    window_ms: u32,
    released_at: Option<u32>,
}

impl ReleaseDebounce {
    pub const fn new(window_ms: u32) -> Self {
        ReleaseDebounce {
            window_ms,
            released_at: None,
        }
    }

    /// Feeds one observation. Returns `true` once the contact has read
    /// `released` continuously for more than the window; any pressed reading
    /// starts the window over.
    pub fn poll(&mut self, now: u32, released: bool) -> bool {
        if !released {
            self.released_at = None;
            return false;
        }
        let since = *self.released_at.get_or_insert(now);
        if now.wrapping_sub(since) > self.window_ms {
            self.released_at = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::priority::Edge;
    use crate::sim::SoftGate;
    use core::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn edge_disarms_until_rearmed() {
        let input = EdgeInput::new(SoftGate::<Edge>::new());
        let t = Thread::new_checked().unwrap();
        let p = unsafe { Edge::new() };

        assert!(!input.pending.gate().is_armed());
        input.rearm(&t);
        assert!(input.pending.gate().is_armed());

        assert!(!input.take(&t));
        input.on_edge(&p);
        assert!(!input.pending.gate().is_armed());
        assert!(input.is_pending(&t));
        assert!(input.take(&t));
        assert!(!input.take(&t));
        // Consuming the event doesn't re-arm, and neither does the mask
        // restore at the end of each read.
        assert!(!input.pending.gate().is_armed());
        assert!(!input.pending.gate().is_masked());

        input.rearm(&t);
        assert!(input.pending.gate().is_armed());
        assert_eq!(input.pending.gate().arm_count(), 2);
    }

    /// A gate whose interrupt fires in the middle of `mask`: after the
    /// previous state has been sampled, before the mask takes effect.
    struct LateMaskGate {
        inner: SoftGate<Edge>,
        fire: AtomicBool,
    }

    static LATE: EdgeInput<LateMaskGate> = EdgeInput::new(LateMaskGate {
        inner: SoftGate::new(),
        fire: AtomicBool::new(false),
    });

    impl IrqGate for LateMaskGate {
        type Priority = Edge;

        fn mask(&self) -> bool {
            let was_unmasked = !self.inner.is_masked();
            if self.fire.swap(false, Ordering::Relaxed) {
                LATE.on_edge(&unsafe { Edge::new() });
            }
            self.inner.mask();
            was_unmasked
        }

        fn unmask(&self) {
            self.inner.unmask()
        }
    }

    impl EdgeSource for LateMaskGate {
        fn disarm(&self) {
            self.inner.disarm()
        }

        fn arm(&self) {
            self.inner.arm()
        }
    }

    #[test]
    fn edge_during_critical_section_stays_disarmed() {
        let t = Thread::new_checked().unwrap();
        LATE.rearm(&t);
        LATE.pending.gate().fire.store(true, Ordering::Relaxed);

        assert!(LATE.is_pending(&t));
        let gate = &LATE.pending.gate().inner;
        assert!(!gate.is_masked());
        assert!(!gate.is_armed());

        // Only an explicit rearm lets the next edge in.
        assert!(LATE.take(&t));
        assert!(!gate.is_armed());
        LATE.rearm(&t);
        assert!(gate.is_armed());
    }

    #[test]
    fn holdoff_window() {
        let mut h = Holdoff::new(1000);
        assert!(!h.poll(500));
        assert!(!h.poll(1500));
        assert!(h.poll(1502));
        // Next event starts a fresh window.
        assert!(!h.poll(1600));
        assert!(h.poll(2602));
    }

    #[test]
    fn release_must_be_stable() {
        let mut d = ReleaseDebounce::new(50);
        assert!(!d.poll(0, true));
        assert!(!d.poll(40, true));
        // Bounce restarts the window.
        assert!(!d.poll(42, false));
        assert!(!d.poll(44, true));
        assert!(!d.poll(94, true));
        assert!(d.poll(96, true));
    }
}
