//! STM32F407 board support.
//!
//! Pin map:
//!
//! | Signal              | Pin  | Notes                          |
//! |---------------------|------|--------------------------------|
//! | Panel CLK / R       | PA5 / PA7 | SPI1, AF5                 |
//! | Panel OE            | PA8  | high lights the panel          |
//! | Panel latch (SCLK)  | PA9  |                                |
//! | Panel A / B         | PB0 / PB1 | row group address         |
//! | Bus select sense    | PA4  | input, pull-up                 |
//! | Debug TX            | PA2  | USART2, AF7                    |
//! | LCD D4-D7           | PC0-PC3 |                             |
//! | LCD RS / EN         | PC4 / PC5 |                           |
//! | Coin sensor         | PD2  | EXTI2, falling edge, pull-up   |
//! | Start button        | PD3  | EXTI3, falling edge, pull-up   |
//! | Load cell DOUT / SCK | PD4 / PD5 |                          |
//!
//! GPIOC pins 8 and 9 are reserved for the `measurement` feature.

use core::convert::Infallible;
use core::ptr;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::spi::{self, SpiBus};
use stm32f4::stm32f407 as device;

use gfx::FrameReader;

use crate::hw::{EdgeSource, HwError, IrqGate};
use crate::input::EdgeInput;
use crate::priority::{Edge, Scan, Thread};
use crate::scan::{ScanOut, ScanPort};
use crate::timebase::Timebase;
use crate::timing::{BOARD_CLOCKS, P10_84MHZ, TICK_MS};
use crate::util::armv7m::{bitband_write, NvicGate};
use crate::util::spin_lock::{acquire_hw, SpinLock};
use crate::util::stm32::configure_clocks;

/// NVIC line of TIM2, the scan timer.
pub const SCAN_IRQ: u8 = 28;
/// NVIC line of EXTI2, the coin sensor.
pub const COIN_IRQ: u8 = 8;
/// NVIC line of EXTI3, the start button.
pub const BUTTON_IRQ: u8 = 9;

/// Mask and arming control for the coin sensor's edge interrupt.
pub const COIN_GATE: ExtiGate = ExtiGate::new(COIN_IRQ, 2);
/// Mask and arming control for the start button's edge interrupt.
pub const BUTTON_GATE: ExtiGate = ExtiGate::new(BUTTON_IRQ, 3);

/// Milliseconds since the scan timer started.
pub static TICKS: Timebase<NvicGate<Scan>> =
    Timebase::new(NvicGate::new(SCAN_IRQ), TICK_MS);

pub static COIN: EdgeInput<ExtiGate> = EdgeInput::new(COIN_GATE);
pub static BUTTON: EdgeInput<ExtiGate> = EdgeInput::new(BUTTON_GATE);

pub type PanelPort = ScanPort<Spi1, GpioPin, GpioPin>;
pub type PanelScan = ScanOut<'static, Spi1, GpioPin, GpioPin>;

/// The scan engine, loaned to the TIM2 ISR by `start_scan`.
static SCAN_HW: SpinLock<Option<PanelScan>> = SpinLock::new(None);

/// One GPIO line, accessed through the port's set/reset and input data
/// registers, which makes it independent of every other line on the port.
pub struct GpioPin {
    port: usize,
    bit: u8,
}

const GPIO_IDR: usize = 0x10;
const GPIO_BSRR: usize = 0x18;

impl GpioPin {
    /// # Safety
    ///
    /// `port` must be the base address of a GPIO port, and the caller must not
    /// create another `GpioPin` for the same line.
    unsafe fn new(port: usize, bit: u8) -> Self {
        GpioPin { port, bit }
    }
}

impl GpioPin {
    fn drive(&mut self, high: bool) {
        let shift = if high { self.bit } else { self.bit + 16 };
        // Safety: BSRR writes are atomic and touch only the bits written as 1.
        unsafe { ptr::write_volatile((self.port + GPIO_BSRR) as *mut u32, 1 << shift) }
    }

    fn level(&self) -> bool {
        // Safety: IDR reads have no side effects.
        let idr = unsafe { ptr::read_volatile((self.port + GPIO_IDR) as *const u32) };
        idr & (1 << self.bit) != 0
    }
}

impl digital::ErrorType for GpioPin {
    type Error = Infallible;
}

impl OutputPin for GpioPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.drive(true);
        Ok(())
    }
}

impl InputPin for GpioPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.level())
    }
}

/// SPI1 as a master. Every byte is a full exchange, so a call returns only
/// once its last byte is on the wire.
pub struct Spi1(());

impl Spi1 {
    fn exchange(&mut self, byte: u8) -> u8 {
        // Safety: we are the only user of SPI1 once `init` has handed this out.
        let spi = unsafe { &*device::SPI1::ptr() };
        while !spi.sr.read().txe().bit() {}
        spi.dr.write(|w| unsafe { w.bits(u32::from(byte)) });
        while !spi.sr.read().rxne().bit() {}
        spi.dr.read().bits() as u8
    }
}

impl spi::ErrorType for Spi1 {
    type Error = Infallible;
}

impl SpiBus<u8> for Spi1 {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Infallible> {
        for w in words {
            *w = self.exchange(0);
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Infallible> {
        for &w in words {
            self.exchange(w);
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Infallible> {
        for i in 0..read.len().max(write.len()) {
            let byte = self.exchange(write.get(i).cloned().unwrap_or(0));
            if let Some(r) = read.get_mut(i) {
                *r = byte;
            }
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Infallible> {
        for w in words {
            *w = self.exchange(*w);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Infallible> {
        // Safety: SR reads have no side effects.
        let spi = unsafe { &*device::SPI1::ptr() };
        while spi.sr.read().bsy().bit() {}
        Ok(())
    }
}

/// USART2 transmitter.
pub struct Usart2(());

impl embedded_io::ErrorType for Usart2 {
    type Error = Infallible;
}

impl embedded_io::Write for Usart2 {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Infallible> {
        // Safety: we are the only user of USART2 once `init` has handed this
        // out.
        let usart = unsafe { &*device::USART2::ptr() };
        for &b in buf {
            while !usart.sr.read().txe().bit() {}
            usart.dr.write(|w| unsafe { w.bits(u32::from(b)) });
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Infallible> {
        // Safety: SR reads have no side effects.
        let usart = unsafe { &*device::USART2::ptr() };
        while !usart.sr.read().tc().bit() {}
        Ok(())
    }
}

/// Cycle-counting delay. Interrupts stretch it.
#[derive(Copy, Clone)]
pub struct CycleDelay {
    cycles_per_us: u32,
}

impl DelayNs for CycleDelay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = u64::from(ns) * u64::from(self.cycles_per_us) / 1000;
        cortex_m::asm::delay(cycles.max(1) as u32);
    }

    fn delay_us(&mut self, us: u32) {
        cortex_m::asm::delay(us.saturating_mul(self.cycles_per_us));
    }
}

const EXTI_IMR: usize = 0x00;

/// An EXTI line behind its NVIC interrupt.
///
/// The NVIC enable bit is the `IrqGate` mask, for critical sections. Arming
/// is the line's EXTI interrupt mask bit, written through its bit-band alias
/// so that the ISR can disarm its line without racing thread code. Arming
/// discards requests in the EXTI and the NVIC first, so bounces recorded
/// while disarmed don't fire.
pub struct ExtiGate {
    nvic: NvicGate<Edge>,
    line: u8,
}

impl ExtiGate {
    pub const fn new(irq: u8, line: u8) -> Self {
        ExtiGate {
            nvic: NvicGate::new(irq),
            line,
        }
    }

    /// Acknowledges the request in the EXTI. Edge ISRs must do this or the
    /// interrupt fires again as soon as they return.
    pub fn ack(&self) {
        // Safety: PR bits clear when written as 1; other lines are unaffected.
        let exti = unsafe { &*device::EXTI::ptr() };
        exti.pr.write(|w| unsafe { w.bits(1 << self.line) });
    }

    fn set_armed(&self, armed: bool) {
        // Safety: IMR is a bit-band-reachable peripheral register and this
        // gate owns its line's bit.
        unsafe {
            bitband_write(device::EXTI::ptr() as usize + EXTI_IMR, self.line, armed)
        }
    }
}

impl IrqGate for ExtiGate {
    type Priority = Edge;

    fn mask(&self) -> bool {
        self.nvic.mask()
    }

    fn unmask(&self) {
        self.nvic.unmask()
    }
}

impl EdgeSource for ExtiGate {
    fn disarm(&self) {
        self.set_armed(false);
    }

    fn arm(&self) {
        self.ack();
        self.nvic.clear_pending();
        self.set_armed(true);
    }
}

/// The board's peripherals, configured and divided up by driver.
pub struct Board {
    pub panel: PanelPort,
    pub debug: Usart2,
    pub lcd_rs: GpioPin,
    pub lcd_en: GpioPin,
    /// D4 through D7.
    pub lcd_data: [GpioPin; 4],
    pub button: GpioPin,
    pub loadcell_dout: GpioPin,
    pub loadcell_sck: GpioPin,
    pub delay: CycleDelay,
}

/// Brings up clocks and peripherals and returns the drivers' hardware. The
/// scan interrupt is left masked (see `start_scan`), and the edge lines are
/// unmasked but disarmed (see `EdgeInput::rearm`).
pub fn init(cp: &mut device::CorePeripherals, p: device::Peripherals) -> Board {
    configure_clocks(&p.RCC, &p.FLASH, &BOARD_CLOCKS);
    p.FLASH.acr.modify(|_, w| w
                       .dcen().enabled()
                       .icen().enabled()
                       .prften().enabled());

    p.RCC.ahb1enr.modify(|_, w| w
                         .gpioaen().enabled()
                         .gpioben().enabled()
                         .gpiocen().enabled()
                         .gpioden().enabled());
    p.RCC.apb1enr.modify(|_, w| w.tim2en().enabled().usart2en().enabled());
    p.RCC.apb2enr.modify(|_, w| w.spi1en().enabled().syscfgen().enabled());

    // Port A: panel control, SPI1, bus-select sense, debug UART.
    p.GPIOA.pupdr.modify(|_, w| w.pupdr4().pull_up());
    p.GPIOA.ospeedr.modify(|_, w| w
                           .ospeedr5().very_high_speed()
                           .ospeedr7().very_high_speed());
    p.GPIOA.afrl.modify(|_, w| unsafe {
        w.afrl2().bits(7).afrl5().bits(5).afrl7().bits(5)
    });
    p.GPIOA.moder.modify(|_, w| w
                         .moder2().alternate()
                         .moder4().input()
                         .moder5().alternate()
                         .moder7().alternate()
                         .moder8().output()
                         .moder9().output());

    // Port B: row address.
    p.GPIOB.moder.modify(|_, w| w.moder0().output().moder1().output());

    // Port C: LCD.
    p.GPIOC.moder.modify(|_, w| w
                         .moder0().output()
                         .moder1().output()
                         .moder2().output()
                         .moder3().output()
                         .moder4().output()
                         .moder5().output());

    // Port D: coin sensor, button, load cell.
    p.GPIOD.pupdr.modify(|_, w| w.pupdr2().pull_up().pupdr3().pull_up());
    p.GPIOD.moder.modify(|_, w| w
                         .moder2().input()
                         .moder3().input()
                         .moder4().input()
                         .moder5().output());

    let timing = &P10_84MHZ;

    // SPI1: master, mode 0, MSB first, software slave select.
    let br = timing.panel_baud_control().unwrap_or(7);
    p.SPI1.cr1.write(|w| unsafe {
        w.mstr().set_bit()
            .ssm().set_bit()
            .ssi().set_bit()
            .br().bits(br)
    });
    p.SPI1.cr1.modify(|_, w| w.spe().set_bit());

    // USART2: 8N1, transmit only.
    p.USART2.brr.write(|w| unsafe { w.bits(timing.uart_brr()) });
    p.USART2.cr1.write(|w| w.ue().set_bit().te().set_bit());

    // TIM2: update interrupt every tick, not yet counting.
    let (psc, arr) = timing.tick_timer();
    p.TIM2.psc.write(|w| unsafe { w.bits(u32::from(psc)) });
    p.TIM2.arr.write(|w| unsafe { w.bits(arr) });
    p.TIM2.egr.write(|w| w.ug().set_bit());
    p.TIM2.sr.modify(|_, w| w.uif().clear_bit());
    p.TIM2.dier.write(|w| w.uie().set_bit());

    // EXTI2 and EXTI3 from port D, falling edges.
    p.SYSCFG.exticr1.modify(|_, w| unsafe { w.exti2().bits(0b0011).exti3().bits(0b0011) });
    p.EXTI.ftsr.modify(|_, w| w.tr2().set_bit().tr3().set_bit());

    // The scan interrupt must be able to preempt everything else. This is safe
    // because none of these interrupts are enabled yet.
    unsafe {
        cp.NVIC.set_priority(device::Interrupt::TIM2, 0x00);
        cp.NVIC.set_priority(device::Interrupt::EXTI2, 0x10);
        cp.NVIC.set_priority(device::Interrupt::EXTI3, 0x10);
    }
    // Nothing can reach the NVIC from a disarmed EXTI line.
    for gate in &[&COIN_GATE, &BUTTON_GATE] {
        gate.disarm();
        gate.nvic.clear_pending();
        gate.unmask();
    }

    let gpioa = device::GPIOA::ptr() as usize;
    let gpiob = device::GPIOB::ptr() as usize;
    let gpioc = device::GPIOC::ptr() as usize;
    let gpiod = device::GPIOD::ptr() as usize;

    // Safety: each line is handed out exactly once, and we consumed the
    // peripherals so nobody else can reconfigure them.
    unsafe {
        Board {
            panel: ScanPort {
                bus: Spi1(()),
                enable: GpioPin::new(gpioa, 8),
                latch: GpioPin::new(gpioa, 9),
                row_a: GpioPin::new(gpiob, 0),
                row_b: GpioPin::new(gpiob, 1),
                bus_select: GpioPin::new(gpioa, 4),
            },
            debug: Usart2(()),
            lcd_rs: GpioPin::new(gpioc, 4),
            lcd_en: GpioPin::new(gpioc, 5),
            lcd_data: [
                GpioPin::new(gpioc, 0),
                GpioPin::new(gpioc, 1),
                GpioPin::new(gpioc, 2),
                GpioPin::new(gpioc, 3),
            ],
            button: GpioPin::new(gpiod, 3),
            loadcell_dout: GpioPin::new(gpiod, 4),
            loadcell_sck: GpioPin::new(gpiod, 5),
            delay: CycleDelay {
                cycles_per_us: BOARD_CLOCKS.sysclk_hz() / 1_000_000,
            },
        }
    }
}

/// Loans the panel to the scan interrupt and starts the timer. From here on
/// the timebase advances.
pub fn start_scan(
    frame: FrameReader<'static>,
    panel: PanelPort,
    _: &Thread,
) -> Result<(), HwError> {
    let previous = SCAN_HW
        .install(ScanOut::new(frame, panel)?)
        .expect("scan HW lock held");
    debug_assert!(previous.is_none(), "scan started twice");

    // Safety: CEN is only touched here.
    unsafe { &*device::TIM2::ptr() }.cr1.modify(|_, w| w.cen().set_bit());
    TICKS_GATE.unmask();
    Ok(())
}

const TICKS_GATE: NvicGate<Scan> = NvicGate::new(SCAN_IRQ);

/// Body of the TIM2 interrupt.
pub fn scan_isr() {
    // Safety: only the TIM2 ISR calls this.
    let p = unsafe { Scan::new() };
    // Safety: UIF is cleared by writing zero; the ISR is its only writer.
    unsafe { &*device::TIM2::ptr() }.sr.modify(|_, w| w.uif().clear_bit());

    let mut scan = acquire_hw(&SCAN_HW);
    crate::on_scan_tick(&mut *scan, &TICKS, &p);
}

/// Body of the EXTI2 interrupt. Returns the priority token so that the caller
/// can do its own bookkeeping at edge priority.
pub fn coin_isr() -> Edge {
    crate::util::measurement::edge_enter();
    // Safety: only the EXTI2 ISR calls this.
    let p = unsafe { Edge::new() };
    COIN_GATE.ack();
    COIN.on_edge(&p);
    crate::util::measurement::edge_exit();
    p
}

/// Body of the EXTI3 interrupt.
pub fn button_isr() {
    crate::util::measurement::edge_enter();
    // Safety: only the EXTI3 ISR calls this.
    let p = unsafe { Edge::new() };
    BUTTON_GATE.ack();
    BUTTON.on_edge(&p);
    crate::util::measurement::edge_exit();
}
