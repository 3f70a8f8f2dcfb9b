//! Clock bring-up for the STM32F4 RCC.

use stm32f4::stm32f407 as device;

use crate::timing::ClockTree;

macro_rules! block_while {
    ($condition:expr) => {
        while $condition {}
    };
}

macro_rules! block_until {
    ($condition:expr) => { block_while!(!$condition) };
}

/// HPRE encoding of an AHB divisor.
fn hpre_bits(div: u16) -> u8 {
    match div {
        1 => 0b0000,
        2 => 0b1000,
        4 => 0b1001,
        8 => 0b1010,
        16 => 0b1011,
        64 => 0b1100,
        128 => 0b1101,
        256 => 0b1110,
        512 => 0b1111,
        _ => panic!("bad AHB divisor {}", div),
    }
}

/// PPRE1/PPRE2 encoding of an APB divisor.
fn ppre_bits(div: u8) -> u8 {
    match div {
        1 => 0b000,
        2 => 0b100,
        4 => 0b101,
        8 => 0b110,
        16 => 0b111,
        _ => panic!("bad APB divisor {}", div),
    }
}

/// PLLP encoding of the system clock divisor.
fn pllp_bits(div: u8) -> u8 {
    match div {
        2 | 4 | 6 | 8 => div / 2 - 1,
        _ => panic!("bad PLLP {}", div),
    }
}

/// Applies `cfg` to `rcc`, adjusting flash wait states to match.
///
/// Runs from the internal oscillator while the PLL is reprogrammed, so it works
/// from any starting configuration.
///
/// # Panics
///
/// If `cfg` names a divisor the RCC cannot produce.
pub fn configure_clocks(
    rcc: &device::RCC,
    flash: &device::FLASH,
    cfg: &ClockTree,
) {
    let hpre = hpre_bits(cfg.ahb_div);
    let ppre1 = ppre_bits(cfg.apb1_div);
    let ppre2 = ppre_bits(cfg.apb2_div);
    let pllp = pllp_bits(cfg.pll_p);

    rcc.cr.modify(|_, w| w.hsion().set_bit());
    block_until! { rcc.cr.read().hsirdy().bit() }
    rcc.cfgr.modify(|_, w| w.sw().variant(device::rcc::cfgr::SWW::HSI));
    block_until! { rcc.cfgr.read().sws() == device::rcc::cfgr::SWSR::HSI }

    rcc.cr.modify(|_, w| w.pllon().clear_bit());
    block_while! { rcc.cr.read().pllrdy().bit() }

    // Bus dividers and wait states go in before the clock goes up.
    rcc.cfgr.modify(|_, w| unsafe {
        w.hpre().bits(hpre).ppre1().bits(ppre1).ppre2().bits(ppre2)
    });
    flash
        .acr
        .modify(|_, w| unsafe { w.latency().bits(cfg.flash_wait_states) });

    rcc.cr.modify(|_, w| w.hseon().set_bit());
    block_until! { rcc.cr.read().hserdy().bit() }

    rcc.pllcfgr.modify(|_, w| {
        unsafe {
            w.pllm().bits(cfg.pll_m);
            w.plln().bits(cfg.pll_n);
            w.pllq().bits(cfg.pll_q);
            w.pllp().bits(pllp);
        }
        w.pllsrc().variant(device::rcc::pllcfgr::PLLSRCW::HSE)
    });

    rcc.cr.modify(|_, w| w.pllon().set_bit());
    block_until! { rcc.cr.read().pllrdy().bit() }

    rcc.cfgr.modify(|_, w| w.sw().variant(device::rcc::cfgr::SWW::PLL));
    block_until! { rcc.cfgr.read().sws() == device::rcc::cfgr::SWSR::PLL }
}
