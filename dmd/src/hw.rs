//! The hardware contract the drivers are written against.
//!
//! Pins, buses and delays are the `embedded-hal` 1.0 traits, and the debug
//! transmitter is an `embedded-io` writer. This module adds what those don't
//! cover: per-interrupt masking and edge arming.

/// A driver-level hardware failure. Pin and bus errors from the HAL are
/// reduced to which kind of line failed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum HwError {
    /// A GPIO read or write failed.
    Pin,
    /// A serial bus transfer failed.
    Bus,
}

/// Mask control for a single interrupt source, used to build critical
/// sections against its ISR.
///
/// Implementations must make `mask` take effect before it returns: once it
/// returns, the interrupt cannot preempt the caller until `unmask`.
pub trait IrqGate {
    /// The priority token of the interrupt behind this gate.
    type Priority: crate::priority::InterruptPriority;

    /// Masks the interrupt, returning whether it was unmasked before.
    fn mask(&self) -> bool;

    /// Unmasks the interrupt.
    fn unmask(&self);
}

/// Arming control for an edge-triggered line, kept apart from the `IrqGate`
/// mask so that leaving a critical section never arms the line.
pub trait EdgeSource {
    /// Stops the line from raising requests. Called from the line's own ISR.
    fn disarm(&self);

    /// Discards any request latched while disarmed and lets new edges
    /// through.
    fn arm(&self);
}
