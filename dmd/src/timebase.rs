//! Millisecond timebase, advanced by the scan timer ISR.
//!
//! There is no other clock in the system. Tick values wrap after about 49.7
//! days; every consumer compares them with wrapping subtraction.

use crate::hw::IrqGate;
use crate::priority::Thread;
use crate::util::irq_cell::IrqCell;

/// A tick counter in milliseconds, owned by the interrupt behind `G`.
pub struct Timebase<G> {
    ticks: IrqCell<u32, G>,
    period_ms: u32,
}

impl<G> Timebase<G> {
    /// Creates a timebase that advances `period_ms` per interrupt.
    pub const fn new(gate: G, period_ms: u32) -> Self {
        Timebase {
            ticks: IrqCell::new(gate, 0),
            period_ms,
        }
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }
}

impl<G: IrqGate> Timebase<G> {
    /// Counts one interrupt period. Returns the new tick count.
    pub fn advance(&self, p: &G::Priority) -> u32 {
        let period = self.period_ms;
        self.ticks.isr_update(p, |t| t.wrapping_add(period))
    }

    /// Reads the current tick count.
    pub fn now(&self, t: &Thread) -> u32 {
        self.ticks.get(t)
    }

    /// Milliseconds since tick value `then`.
    pub fn since(&self, t: &Thread, then: u32) -> u32 {
        self.now(t).wrapping_sub(then)
    }

    /// Spins until at least `ms` milliseconds have passed. The scan interrupt
    /// keeps running throughout.
    pub fn delay_ms(&self, t: &Thread, ms: u32) {
        let start = self.now(t);
        while self.since(t, start) < ms {}
    }
}

/// Fires at most once per `period_ms`, measured on the timebase.
#[derive(Copy, Clone, Debug)]
pub struct Every {
    period_ms: u32,
    last: u32,
}

impl Every {
    pub const fn new(period_ms: u32) -> Self {
        Every { period_ms, last: 0 }
    }

    /// Returns `true`, and restarts the period, if more than `period_ms` has
    /// passed since it last did.
    pub fn poll(&mut self, now: u32) -> bool {
        if now.wrapping_sub(self.last) > self.period_ms {
            self.last = now;
            true
        } else {
            false
        }
    }

    /// Starts a new period at `now` without firing.
    pub fn restart(&mut self, now: u32) {
        self.last = now;
    }
}
