//! Interrupt-safe sharing and chip support shared by the drivers.

cfg_if::cfg_if! {
    if #[cfg(target_os = "none")] {
        pub mod armv7m;
        pub mod stm32;
    }
}

pub mod irq_cell;
pub mod measurement;
pub mod spin_lock;
