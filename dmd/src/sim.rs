//! Recording stand-ins for the board's hardware, for host tests.
//!
//! Unlike `embedded-hal-mock`, these don't check a script of expected calls.
//! They log what happened in one shared order, so a test can see how bus
//! traffic interleaves with pin changes.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::spi::{self, SpiBus};

use crate::hw::{EdgeSource, IrqGate};
use crate::priority::InterruptPriority;

/// Something observable that happened on the simulated board.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Event {
    Byte(u8),
    Pin(&'static str, bool),
}

/// Shared, ordered log of `Event`s.
#[derive(Clone, Default)]
pub struct Trace(Rc<RefCell<Vec<Event>>>);

impl Trace {
    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Byte(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    /// Pin events only, in order.
    pub fn pins(&self) -> Vec<(&'static str, bool)> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Pin(n, v) => Some((*n, *v)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear()
    }

    fn push(&self, e: Event) {
        self.0.borrow_mut().push(e)
    }
}

/// A bus that logs every byte written to it. Reads shift in zeros.
pub struct SimBus(pub Trace);

impl spi::ErrorType for SimBus {
    type Error = Infallible;
}

impl SpiBus<u8> for SimBus {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Infallible> {
        for w in words {
            *w = 0;
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Infallible> {
        for &w in words {
            self.0.push(Event::Byte(w));
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Infallible> {
        SpiBus::write(self, write)?;
        SpiBus::read(self, read)
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Infallible> {
        SpiBus::write(self, words)?;
        SpiBus::read(self, words)
    }

    fn flush(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

impl embedded_io::ErrorType for SimBus {
    type Error = Infallible;
}

impl embedded_io::Write for SimBus {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Infallible> {
        for &b in buf {
            self.0.push(Event::Byte(b));
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

/// An output pin that logs every write, and can be read back.
pub struct SimPin {
    name: &'static str,
    trace: Trace,
    level: Rc<Cell<bool>>,
}

impl SimPin {
    pub fn new(name: &'static str, trace: &Trace) -> Self {
        SimPin {
            name,
            trace: trace.clone(),
            level: Rc::new(Cell::new(false)),
        }
    }

    pub fn level(&self) -> bool {
        self.level.get()
    }

    fn drive(&mut self, high: bool) {
        self.level.set(high);
        self.trace.push(Event::Pin(self.name, high));
    }
}

impl digital::ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.drive(true);
        Ok(())
    }
}

/// An input pin driven by the test, either to a fixed level or from a queue of
/// levels consumed one per read.
#[derive(Clone, Default)]
pub struct SimInput {
    level: Rc<Cell<bool>>,
    script: Rc<RefCell<VecDeque<bool>>>,
}

impl SimInput {
    pub fn high() -> Self {
        let i = SimInput::default();
        i.drive(true);
        i
    }

    pub fn drive(&self, high: bool) {
        self.level.set(high)
    }

    /// Queues levels to return from the next reads, before falling back to
    /// the driven level.
    pub fn script(&self, levels: impl IntoIterator<Item = bool>) {
        self.script.borrow_mut().extend(levels)
    }
}

impl digital::ErrorType for SimInput {
    type Error = Infallible;
}

impl InputPin for SimInput {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self
            .script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| self.level.get()))
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        self.is_high().map(|high| !high)
    }
}

/// Delay that takes no time but adds up what was asked for.
#[derive(Default)]
pub struct SimDelay {
    total_ns: u64,
}

impl SimDelay {
    /// Total delay requested so far, in whole microseconds.
    pub fn total_us(&self) -> u64 {
        self.total_ns / 1000
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

/// An interrupt mask bit and an edge arming bit, in variables. Lines start
/// unmasked and disarmed.
pub struct SoftGate<P> {
    masked: AtomicBool,
    armed: AtomicBool,
    masks: AtomicUsize,
    arms: AtomicUsize,
    _priority: PhantomData<fn() -> P>,
}

impl<P> SoftGate<P> {
    pub const fn new() -> Self {
        SoftGate {
            masked: AtomicBool::new(false),
            armed: AtomicBool::new(false),
            masks: AtomicUsize::new(0),
            arms: AtomicUsize::new(0),
            _priority: PhantomData,
        }
    }

    pub fn is_masked(&self) -> bool {
        self.masked.load(Ordering::Relaxed)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Relaxed)
    }

    pub fn mask_count(&self) -> usize {
        self.masks.load(Ordering::Relaxed)
    }

    pub fn arm_count(&self) -> usize {
        self.arms.load(Ordering::Relaxed)
    }
}

impl<P: InterruptPriority> IrqGate for SoftGate<P> {
    type Priority = P;

    fn mask(&self) -> bool {
        self.masks.fetch_add(1, Ordering::Relaxed);
        !self.masked.swap(true, Ordering::Relaxed)
    }

    fn unmask(&self) {
        self.masked.store(false, Ordering::Relaxed)
    }
}

impl<P> EdgeSource for SoftGate<P> {
    fn disarm(&self) {
        self.armed.store(false, Ordering::Relaxed)
    }

    fn arm(&self) {
        self.arms.fetch_add(1, Ordering::Relaxed);
        self.armed.store(true, Ordering::Relaxed)
    }
}
