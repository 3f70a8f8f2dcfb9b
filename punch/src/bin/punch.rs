//! Punch machine firmware: one P10 panel, a coin sensor, a start button, a
//! load cell and a character LCD.

#![no_std]
#![no_main]

#[cfg(feature = "panic-halt")]
extern crate panic_halt;
#[cfg(feature = "panic-itm")]
extern crate panic_itm;

use core::fmt::Write;
use core::sync::atomic::AtomicU8;

use stm32f4::stm32f407 as device;
use stm32f4::stm32f407::interrupt;

use dmd::board::{self, ExtiGate, BUTTON, COIN, COIN_GATE, TICKS};
use dmd::debug_link::DebugLink;
use dmd::lcd::Lcd;
use dmd::loadcell::{Gain, LoadCell};
use dmd::priority::Thread;
use dmd::util::armv7m::NvicGate;
use dmd::util::irq_cell::IrqCell;
use gfx::{Display, PanelGrid, DARK, PANEL_BYTES};

use punch::config::GameConfig;
use punch::controls::{add_credit, CoinSlot, Credits, StartButton};
use punch::game::Game;
use punch::score::hit_threshold;

static CREDITS: Credits<ExtiGate> = IrqCell::new(COIN_GATE, 0);

/// Framebuffer for a single panel.
static FRAME: [AtomicU8; PANEL_BYTES] = [DARK; PANEL_BYTES];

#[cortex_m_rt::entry]
fn main() -> ! {
    let mut cp = device::CorePeripherals::take().unwrap();
    let p = device::Peripherals::take().unwrap();
    // Safety: interrupts are all still disabled.
    unsafe { dmd::util::measurement::init() };
    let hw = board::init(&mut cp, p);
    let t = Thread::new_checked().unwrap();
    let config = GameConfig::default();

    let mut display = Display::new(PanelGrid::new(1, 1), &FRAME);
    board::start_scan(display.reader(), hw.panel, &t).unwrap();

    let mut log = DebugLink::new(hw.debug);
    let mut lcd = Lcd::new(hw.lcd_rs, hw.lcd_en, hw.lcd_data, hw.delay).unwrap();
    let _ = lcd.puts("Insert Coin!");

    let mut cell = LoadCell::new(
        hw.loadcell_dout,
        hw.loadcell_sck,
        hw.delay,
        NvicGate::new(board::SCAN_IRQ),
        Gain::B32,
    )
    .unwrap();
    let tare = cell.tare(config.tare_samples).unwrap();
    TICKS.delay_ms(&t, 200);
    let threshold = hit_threshold(tare, config.tare_reference);
    let _ = writeln!(log, "Tare: {}", tare);
    let _ = writeln!(log, "Hit Value: {}", threshold);

    let mut coins = CoinSlot::new(&COIN, &CREDITS, &config);
    let mut button = StartButton::new(&BUTTON, hw.button, &config);
    let mut game = Game::new(config, threshold);

    COIN.rearm(&t);
    BUTTON.rearm(&t);

    loop {
        let sample = if game.wants_sample() {
            cell.read_raw().ok()
        } else {
            None
        };
        let now = TICKS.now(&t);
        game.poll(&mut display, &mut log, now, sample);

        if let Some(n) = coins.poll(&t, now) {
            let _ = writeln!(log, "Counter: {}", n);
            let _ = lcd
                .goto(0, 1)
                .and_then(|_| lcd.puts("Credit: "))
                .and_then(|_| lcd.put_num(n));
        }

        if game.accepts_start() && button.poll(&t, now) {
            if coins.try_spend(&t) {
                let _ = writeln!(log, "Game Started!");
                game.start(&mut display, &mut log, now);
            } else {
                let _ = writeln!(log, "Insert Coin!");
            }
        }
    }
}

#[interrupt]
fn TIM2() {
    board::scan_isr()
}

#[interrupt]
fn EXTI2() {
    let p = board::coin_isr();
    add_credit(&CREDITS, &p);
}

#[interrupt]
fn EXTI3() {
    board::button_isr()
}
