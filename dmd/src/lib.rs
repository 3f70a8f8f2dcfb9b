//! Drivers for a P10 LED dot-matrix display and the punch machine's other
//! peripherals.
//!
//! The drivers are written against the `embedded-hal` traits plus the interrupt
//! traits in `hw`, so that they can be exercised on the host. On the target,
//! `board` implements all of them for the STM32F407 and owns the interrupt
//! entry points.

#![cfg_attr(not(any(test, feature = "sim")), no_std)]

pub mod debug_link;
pub mod hw;
pub mod input;
pub mod lcd;
pub mod loadcell;
pub mod priority;
pub mod scan;
pub mod timebase;
pub mod timing;
pub mod util;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

cfg_if::cfg_if! {
    if #[cfg(target_os = "none")] {
        pub mod board;
    }
}

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiBus;

use crate::hw::IrqGate;
use crate::priority::Scan;
use crate::scan::ScanOut;
use crate::timebase::Timebase;

/// The body of the scan timer interrupt: refreshes one row group, then counts
/// the tick. Returns the new tick count.
///
/// The tick is counted even when the panel bus is claimed or the refresh
/// fails, so time keeps flowing. A failed group is retried on the next tick.
pub fn on_scan_tick<B, O, I, G>(
    scan: &mut ScanOut<B, O, I>,
    timebase: &Timebase<G>,
    p: &Scan,
) -> u32
where
    B: SpiBus<u8>,
    O: OutputPin,
    I: InputPin,
    G: IrqGate<Priority = Scan>,
{
    util::measurement::scan_enter();
    let _ = scan.scan(p);
    let now = timebase.advance(p);
    util::measurement::scan_exit();
    now
}
