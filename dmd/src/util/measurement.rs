//! Interrupt timing measurement using GPIOs, compiled out unless the
//! `measurement` feature is set.
//!
//! This circumvents all hardware ownership; it's a debug facility. Signals:
//!
//! - Scan: C8, high while the scan timer ISR runs.
//! - Edge: C9, high while an edge-input ISR runs.
//!
//! In simulation the signals do nothing.

/// Sets up the measurement pins.
///
/// Note: if the `measurement` feature is enabled, this will power on GPIOC and
/// configure pins 8 and 9 as outputs.
///
/// # Safety
///
/// This is safe *as long as* it's not preempted. If interrupts are enabled, and
/// interrupts attempt to configure either RCC or GPIOC, their updates may be
/// reverted. Call this from early in `main` and you're good.
pub unsafe fn init() {
    #[cfg(all(feature = "measurement", target_os = "none"))]
    {
        use stm32f4::stm32f407 as device;
        let rcc = &*device::RCC::ptr();
        let gpioc = &*device::GPIOC::ptr();

        rcc.ahb1enr.modify(|_, w| w.gpiocen().set_bit());
        gpioc.ospeedr.modify(|_, w| {
            w.ospeedr8().very_high_speed().ospeedr9().very_high_speed()
        });
        gpioc.moder.modify(|_, w| w.moder8().output().moder9().output());
    }
}

cfg_if::cfg_if! {
    if #[cfg(all(target_os = "none", feature = "measurement"))] {
        use stm32f4::stm32f407 as device;

        fn write_gpioc_bsrr<F>(op: F)
        where
            F: FnOnce(&mut device::gpioi::bsrr::W) -> &mut device::gpioi::bsrr::W,
        {
            // Safety: writes to this register are atomic and idempotent.
            unsafe { &*device::GPIOC::ptr() }.bsrr.write(op);
        }
    }
}

/// Marks entry to the scan timer ISR.
pub fn scan_enter() {
    #[cfg(all(target_os = "none", feature = "measurement"))]
    write_gpioc_bsrr(|w| w.bs8().set_bit());
}

/// Marks exit from the scan timer ISR.
pub fn scan_exit() {
    #[cfg(all(target_os = "none", feature = "measurement"))]
    write_gpioc_bsrr(|w| w.br8().set_bit());
}

/// Marks entry to an edge-input ISR.
pub fn edge_enter() {
    #[cfg(all(target_os = "none", feature = "measurement"))]
    write_gpioc_bsrr(|w| w.bs9().set_bit());
}

/// Marks exit from an edge-input ISR.
pub fn edge_exit() {
    #[cfg(all(target_os = "none", feature = "measurement"))]
    write_gpioc_bsrr(|w| w.br9().set_bit());
}
