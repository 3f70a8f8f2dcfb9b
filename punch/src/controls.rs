//! The coin sensor and start button, seen from thread mode.
//!
//! Both are edge interrupts that disarm themselves when they fire (see
//! `dmd::input::EdgeInput`). The types here decide when to re-arm them.

use embedded_hal::digital::InputPin;

use dmd::hw::{EdgeSource, IrqGate};
use dmd::input::{EdgeInput, Holdoff, ReleaseDebounce};
use dmd::priority::Thread;
use dmd::util::irq_cell::IrqCell;

use crate::config::GameConfig;

/// Credit counter. Incremented by the coin sensor ISR.
pub type Credits<G> = IrqCell<u32, G>;

/// Coin sensor ISR side: counts a credit.
pub fn add_credit<G: IrqGate>(credits: &Credits<G>, p: &G::Priority) {
    credits.isr_update(p, |n| n.wrapping_add(1));
}

pub struct CoinSlot<'a, G> {
    edge: &'a EdgeInput<G>,
    credits: &'a Credits<G>,
    holdoff: Holdoff,
    reported: u32,
}

impl<'a, G: IrqGate + EdgeSource> CoinSlot<'a, G> {
    pub fn new(edge: &'a EdgeInput<G>, credits: &'a Credits<G>, config: &GameConfig) -> Self {
        CoinSlot {
            edge,
            credits,
            holdoff: Holdoff::new(config.coin_holdoff_ms),
            reported: 0,
        }
    }

    /// Re-arms the sensor once the hold-off after a coin has passed, and
    /// returns the credit count if it has changed since the last call.
    pub fn poll(&mut self, t: &Thread, now: u32) -> Option<u32> {
        if self.edge.is_pending(t) && self.holdoff.poll(now) {
            self.edge.take(t);
            self.edge.rearm(t);
        }

        let n = self.credits.get(t);
        if n != self.reported {
            self.reported = n;
            Some(n)
        } else {
            None
        }
    }

    /// Uses up a credit if there is one.
    pub fn try_spend(&mut self, t: &Thread) -> bool {
        let mut spent = false;
        self.credits.update(t, |n| {
            if n > 0 {
                spent = true;
                n - 1
            } else {
                n
            }
        });
        spent
    }
}

pub struct StartButton<'a, G, I> {
    edge: &'a EdgeInput<G>,
    pin: I,
    release: ReleaseDebounce,
    awaiting_release: bool,
}

impl<'a, G: IrqGate + EdgeSource, I: InputPin> StartButton<'a, G, I> {
    /// `pin` reads the button; low is pressed. A pin that can't be read
    /// counts as released.
    pub fn new(edge: &'a EdgeInput<G>, pin: I, config: &GameConfig) -> Self {
        StartButton {
            edge,
            pin,
            release: ReleaseDebounce::new(config.button_release_ms),
            awaiting_release: false,
        }
    }

    /// Returns `true` once per press.
    ///
    /// An edge is only a press if the button still reads pressed; otherwise it
    /// was noise and the line re-arms at once. After a press the line stays
    /// disarmed until the button has been released long enough to stop
    /// bouncing.
    pub fn poll(&mut self, t: &Thread, now: u32) -> bool {
        let mut pressed = false;
        if self.edge.take(t) {
            if self.released() {
                self.edge.rearm(t);
            } else {
                pressed = true;
                self.awaiting_release = true;
            }
        }

        if self.awaiting_release {
            let released = self.released();
            if self.release.poll(now, released) {
                self.awaiting_release = false;
                self.edge.rearm(t);
            }
        }
        pressed
    }

    fn released(&mut self) -> bool {
        self.pin.is_high().unwrap_or(true)
    }
}
