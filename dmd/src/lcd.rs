//! HD44780-compatible character LCD on a 4-bit bus.

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, PinState};

use crate::hw::HwError;

/// DDRAM address of the first column of each line, for up to four lines.
const LINE_ADDRESS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

const CLEAR: u8 = 0x01;
const ENTRY_INCREMENT: u8 = 0x06;
const DISPLAY_ON: u8 = 0x0C;
const FUNCTION_4BIT_2LINE: u8 = 0x28;
const SET_DDRAM: u8 = 0x80;

pub struct Lcd<O, W> {
    rs: O,
    en: O,
    /// D4 through D7.
    data: [O; 4],
    delay: W,
}

impl<O: OutputPin, W: DelayNs> Lcd<O, W> {
    /// Resets the controller into 4-bit, two-line mode with the display on,
    /// the screen clear and the cursor hidden.
    pub fn new(rs: O, en: O, data: [O; 4], delay: W) -> Result<Self, HwError> {
        let mut lcd = Lcd { rs, en, data, delay };
        lcd.en.set_low().map_err(|_| HwError::Pin)?;

        // The controller may be in 8- or 4-bit mode at power-up; three 8-bit
        // function sets get it to a known state either way.
        lcd.delay.delay_ms(30);
        lcd.send(0x30, false, false)?;
        lcd.delay.delay_ms(8);
        lcd.send(0x30, false, false)?;
        lcd.delay.delay_us(200);
        lcd.send(0x30, false, false)?;
        lcd.send(0x20, false, false)?;

        lcd.command(FUNCTION_4BIT_2LINE)?;
        lcd.command(DISPLAY_ON)?;
        lcd.command(CLEAR)?;
        lcd.command(ENTRY_INCREMENT)?;
        Ok(lcd)
    }

    fn write_nibble(&mut self, nibble: u8) -> Result<(), HwError> {
        for (i, pin) in self.data.iter_mut().enumerate() {
            pin.set_state(PinState::from(nibble & (1 << i) != 0))
                .map_err(|_| HwError::Pin)?;
        }
        self.en.set_high().map_err(|_| HwError::Pin)?;
        self.delay.delay_us(1);
        self.en.set_low().map_err(|_| HwError::Pin)
    }

    /// Sends the high nibble of `byte`, then the low one if `both`.
    fn send(&mut self, byte: u8, is_data: bool, both: bool) -> Result<(), HwError> {
        self.rs.set_state(PinState::from(is_data)).map_err(|_| HwError::Pin)?;
        self.write_nibble(byte >> 4)?;
        if both {
            self.delay.delay_us(1);
            self.write_nibble(byte & 0xF)?;
        }
        self.delay.delay_ms(5);
        Ok(())
    }

    pub fn command(&mut self, cmd: u8) -> Result<(), HwError> {
        self.send(cmd, false, true)
    }

    pub fn put_char(&mut self, c: u8) -> Result<(), HwError> {
        self.send(c, true, true)
    }

    /// Writes `s` at the cursor. A newline moves to the start of line 2.
    pub fn puts(&mut self, s: &str) -> Result<(), HwError> {
        for b in s.bytes() {
            if b == b'\n' {
                self.goto(0, 1)?;
            } else {
                self.put_char(b)?;
            }
        }
        Ok(())
    }

    /// Moves the cursor to column `x` of line `y`. Lines past the fourth go to
    /// the first.
    pub fn goto(&mut self, x: u8, y: u8) -> Result<(), HwError> {
        let line = LINE_ADDRESS.get(usize::from(y)).cloned().unwrap_or(0);
        self.command(SET_DDRAM | line.wrapping_add(x))
    }

    pub fn clear(&mut self) -> Result<(), HwError> {
        self.command(CLEAR)
    }

    /// Writes `n` as exactly three digits, clamped to 999.
    pub fn put_num(&mut self, n: u32) -> Result<(), HwError> {
        let n = n.min(999);
        for &d in &[n / 100, n / 10 % 10, n % 10] {
            self.put_char(b'0' + d as u8)?;
        }
        Ok(())
    }
}

impl<O: OutputPin, W: DelayNs> fmt::Write for Lcd<O, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.puts(s).map_err(|_| fmt::Error)
    }
}
