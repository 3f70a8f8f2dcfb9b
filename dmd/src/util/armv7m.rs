//! Augmented ARMv7M operations
//!
//! # Interrupt masking
//!
//! `NvicGate` masks and unmasks single interrupts with enhanced guarantees.
//! Plain NVIC writes take effect some time after the store retires: an
//! interrupt can still fire *after* a disable has "returned". The barriers here
//! close that window, as described in the ARM document *ARM Cortex-M
//! Programming Guide to Memory Barrier Instructions*.
//!
//! The gate touches only the set/clear-enable registers, whose writes are
//! atomic per bit, so gates for different interrupts never interfere and no
//! ownership of the NVIC is needed.
//!
//! # Bit-banding
//!
//! `bitband_write` changes a single peripheral register bit with one store to
//! its alias word, so it can't lose a concurrent change to another bit of the
//! same register.

use core::marker::PhantomData;
use core::ptr;

use cortex_m::peripheral::NVIC;

use crate::hw::IrqGate;
use crate::priority::InterruptPriority;

/// Masks one NVIC interrupt line, whose ISR runs at priority `P`.
pub struct NvicGate<P> {
    irq: u8,
    _priority: PhantomData<fn() -> P>,
}

impl<P> NvicGate<P> {
    pub const fn new(irq: u8) -> Self {
        NvicGate {
            irq,
            _priority: PhantomData,
        }
    }

    fn reg_bit(&self) -> (usize, u32) {
        (usize::from(self.irq / 32), 1 << (self.irq % 32))
    }

    /// Discards a pending request for the interrupt.
    pub fn clear_pending(&self) {
        let (reg, bit) = self.reg_bit();
        // Safety: ICPR writes only clear the bits written as 1.
        unsafe { (*NVIC::ptr()).icpr[reg].write(bit) };
        // These barriers are arguably overkill, but *shrug*
        cortex_m::asm::dmb();
        cortex_m::asm::isb();
    }
}

impl<P: InterruptPriority> IrqGate for NvicGate<P> {
    type Priority = P;

    /// Masks the interrupt; starting at the first instruction after this
    /// returns, execution cannot be preempted by it.
    fn mask(&self) -> bool {
        let (reg, bit) = self.reg_bit();
        // Safety: ISER reads have no side effects, and ICER writes only clear
        // the bits written as 1.
        let nvic = unsafe { &*NVIC::ptr() };
        let was_enabled = nvic.iser[reg].read() & bit != 0;
        unsafe { nvic.icer[reg].write(bit) };
        cortex_m::asm::dmb();
        cortex_m::asm::isb();
        was_enabled
    }

    /// Unmasks the interrupt. If it is pending, priority allowing, the ISR
    /// will have run by the time this returns.
    fn unmask(&self) {
        let (reg, bit) = self.reg_bit();
        // Safety: ISER writes only set the bits written as 1.
        unsafe { (*NVIC::ptr()).iser[reg].write(bit) };
        cortex_m::asm::dmb();
        cortex_m::asm::isb();
    }
}

const PERIPH_BASE: usize = 0x4000_0000;
const PERIPH_BITBAND_ALIAS: usize = 0x4200_0000;

/// Sets or clears bit `bit` of the peripheral register at `reg` through the
/// bit-band alias region.
///
/// # Safety
///
/// `reg` must be the address of a peripheral register in the bit-band region
/// (the first megabyte above `0x4000_0000`), and changing the bit must not
/// break any other code's assumptions about the register.
pub unsafe fn bitband_write(reg: usize, bit: u8, value: bool) {
    let alias = PERIPH_BITBAND_ALIAS + (reg - PERIPH_BASE) * 32 + usize::from(bit) * 4;
    ptr::write_volatile(alias as *mut u32, u32::from(value));
}
