//! Clock and refresh timing parameters.

/// STM32F4 clock tree running from the external crystal through the main PLL.
///
/// Divisors are plain numbers here; `util::stm32` encodes them for the RCC.
#[derive(Clone, Debug)]
pub struct ClockTree {
    pub crystal_hz: u32,
    /// PLLM: crystal to VCO input.
    pub pll_m: u8,
    /// PLLN: VCO multiplier.
    pub pll_n: u16,
    /// PLLP: VCO to system clock. One of 2, 4, 6 or 8.
    pub pll_p: u8,
    /// PLLQ: VCO to the 48 MHz domain.
    pub pll_q: u8,
    pub ahb_div: u16,
    pub apb1_div: u8,
    pub apb2_div: u8,
    pub flash_wait_states: u8,
}

impl ClockTree {
    pub fn sysclk_hz(&self) -> u32 {
        self.crystal_hz / u32::from(self.pll_m) * u32::from(self.pll_n)
            / u32::from(self.pll_p)
    }

    pub fn ahb_hz(&self) -> u32 {
        self.sysclk_hz() / u32::from(self.ahb_div)
    }

    pub fn apb1_hz(&self) -> u32 {
        self.ahb_hz() / u32::from(self.apb1_div)
    }

    pub fn apb2_hz(&self) -> u32 {
        self.ahb_hz() / u32::from(self.apb2_div)
    }

    /// Timers on APB1 run at twice the bus clock whenever APB1 is divided.
    pub fn apb1_timer_hz(&self) -> u32 {
        if self.apb1_div == 1 {
            self.apb1_hz()
        } else {
            self.apb1_hz() * 2
        }
    }

    pub fn pll48_hz(&self) -> u32 {
        self.crystal_hz / u32::from(self.pll_m) * u32::from(self.pll_n)
            / u32::from(self.pll_q)
    }
}

/// 8 MHz crystal, 84 MHz system clock, APB1 at 42 MHz, APB2 at 84 MHz.
pub static BOARD_CLOCKS: ClockTree = ClockTree {
    crystal_hz: 8_000_000,
    pll_m: 8,   // 1 MHz VCO input
    pll_n: 336, // 336 MHz VCO
    pll_p: 4,
    pll_q: 7,
    ahb_div: 1,
    apb1_div: 2,
    apb2_div: 1,
    // 84 MHz at 3.3V
    flash_wait_states: 2,
};

/// Timing parameters for the scan timer, panel bus and debug UART.
#[derive(Clone, Debug)]
pub struct Timing {
    /// Input clock of the scan timer, in Hz.
    pub timer_clock_hz: u32,
    /// Clock of the peripheral bus the panel SPI sits on, in Hz.
    pub panel_bus_hz: u32,
    /// Clock of the peripheral bus the debug UART sits on, in Hz.
    pub uart_bus_hz: u32,
    /// Interval between scan interrupts, and so the timebase resolution.
    pub tick_ms: u32,
    /// Fastest SCK the panel shift registers are driven at.
    pub max_panel_sck_hz: u32,
    pub uart_baud: u32,
}

impl Timing {
    /// Prescaler and auto-reload values for a timer that counts at 1 MHz and
    /// overflows every `tick_ms`.
    pub fn tick_timer(&self) -> (u16, u32) {
        ((self.timer_clock_hz / 1_000_000 - 1) as u16, self.tick_ms * 1000 - 1)
    }

    /// SPI baud rate control field: the smallest divisor, of the eight powers
    /// of two from 2 to 256, that keeps SCK at or below `max_panel_sck_hz`.
    /// `None` if even the largest is too fast.
    pub fn panel_baud_control(&self) -> Option<u8> {
        (0..8u8).find(|&br| self.panel_bus_hz >> (br + 1) <= self.max_panel_sck_hz)
    }

    /// Value for the UART baud rate register, with 16x oversampling.
    pub fn uart_brr(&self) -> u32 {
        (self.uart_bus_hz + self.uart_baud / 2) / self.uart_baud
    }

    /// Complete panel refreshes per second.
    pub fn refresh_hz(&self) -> u32 {
        1000 / (self.tick_ms * gfx::ROW_GROUPS as u32)
    }
}

/// Scan interrupt period on the board, in milliseconds.
pub const TICK_MS: u32 = 2;

/// STM32F407 at 84 MHz: APB2 at 84 MHz for SPI1, APB1 at 42 MHz for USART2,
/// TIM2 clocked at 84 MHz.
pub static P10_84MHZ: Timing = Timing {
    timer_clock_hz: 84_000_000,
    panel_bus_hz: 84_000_000,
    uart_bus_hz: 42_000_000,
    tick_ms: TICK_MS,
    max_panel_sck_hz: 8_000_000,
    uart_baud: 9600,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_timing() {
        let t = &P10_84MHZ;
        assert_eq!(t.tick_timer(), (83, 1999));
        // 84 MHz / 16 = 5.25 MHz; /8 would be 10.5 MHz.
        assert_eq!(t.panel_baud_control(), Some(3));
        assert_eq!(t.uart_brr(), 4375);
        assert_eq!(t.refresh_hz(), 125);
    }

    #[test]
    fn board_clocks_match_timing() {
        let c = &BOARD_CLOCKS;
        assert_eq!(c.sysclk_hz(), 84_000_000);
        assert_eq!(c.pll48_hz(), 48_000_000);
        assert_eq!(c.apb1_timer_hz(), P10_84MHZ.timer_clock_hz);
        assert_eq!(c.apb2_hz(), P10_84MHZ.panel_bus_hz);
        assert_eq!(c.apb1_hz(), P10_84MHZ.uart_bus_hz);
    }

    #[test]
    fn undivided_apb1_timers() {
        let c = ClockTree {
            apb1_div: 1,
            ..BOARD_CLOCKS.clone()
        };
        assert_eq!(c.apb1_timer_hz(), c.apb1_hz());
    }

    #[test]
    fn slow_bus_uses_smallest_divisor() {
        let t = Timing {
            panel_bus_hz: 16_000_000,
            ..P10_84MHZ.clone()
        };
        assert_eq!(t.panel_baud_control(), Some(0));

        let t = Timing {
            panel_bus_hz: 4_000_000_000,
            max_panel_sck_hz: 1_000_000,
            ..P10_84MHZ.clone()
        };
        assert_eq!(t.panel_baud_control(), None);
    }
}
