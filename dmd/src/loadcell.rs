//! Driver for an HX711-style 24-bit load cell amplifier.
//!
//! The converter signals a ready sample by pulling DOUT low, then shifts the
//! sample out MSB first, one bit per SCK pulse. Extra pulses after the 24th
//! select the channel and gain for the *next* conversion. Holding SCK high for
//! more than 60 us powers the part down, so the scan interrupt, which is the
//! only thing that could stretch a pulse that long, is masked while clocking.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::hw::{HwError, IrqGate};

/// Input channel and gain used for the conversion after each read.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Gain {
    A128 = 1,
    B32 = 2,
    A64 = 3,
}

pub struct LoadCell<D, S, W, G> {
    dout: D,
    sck: S,
    delay: W,
    scan_gate: G,
    gain: Gain,
}

impl<D, S, W, G> LoadCell<D, S, W, G>
where
    D: InputPin,
    S: OutputPin,
    W: DelayNs,
    G: IrqGate,
{
    /// Takes over the converter's lines. `scan_gate` masks the interrupt that
    /// must not interrupt a bit.
    pub fn new(
        dout: D,
        mut sck: S,
        delay: W,
        scan_gate: G,
        gain: Gain,
    ) -> Result<Self, HwError> {
        sck.set_low().map_err(|_| HwError::Pin)?;
        Ok(LoadCell {
            dout,
            sck,
            delay,
            scan_gate,
            gain,
        })
    }

    /// Waits for a sample and reads it.
    pub fn read_raw(&mut self) -> Result<i32, HwError> {
        while self.dout.is_high().map_err(|_| HwError::Pin)? {}

        let LoadCell {
            dout,
            sck,
            delay,
            scan_gate,
            gain,
        } = self;

        let was_unmasked = scan_gate.mask();
        let _restore = scopeguard::guard((), |_| {
            if was_unmasked {
                scan_gate.unmask();
            }
        });

        let mut value = 0u32;
        for _ in 0..24 {
            sck.set_high().map_err(|_| HwError::Pin)?;
            delay.delay_us(1);
            value <<= 1;
            sck.set_low().map_err(|_| HwError::Pin)?;
            delay.delay_us(1);
            if dout.is_high().map_err(|_| HwError::Pin)? {
                value |= 1;
            }
        }
        for _ in 0..*gain as u8 {
            sck.set_high().map_err(|_| HwError::Pin)?;
            delay.delay_us(1);
            sck.set_low().map_err(|_| HwError::Pin)?;
            delay.delay_us(1);
        }

        Ok(sign_extend_24(value))
    }

    /// Averages `samples` consecutive readings, 1 ms apart, to find the
    /// unloaded output.
    ///
    /// # Panics
    ///
    /// If `samples` is zero.
    pub fn tare(&mut self, samples: u32) -> Result<i32, HwError> {
        assert!(samples > 0, "tare needs at least one sample");
        let mut sum = 0i64;
        for _ in 0..samples {
            sum += i64::from(self.read_raw()?);
            self.delay.delay_ms(1);
        }
        Ok((sum / i64::from(samples)) as i32)
    }
}

/// Interprets the low 24 bits of `v` as two's complement.
pub fn sign_extend_24(v: u32) -> i32 {
    ((v << 8) as i32) >> 8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::priority::Scan;
    use crate::sim::{SimDelay, SimInput, SimPin, SoftGate, Trace};
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};
    use embedded_hal_mock::eh1::MockError;
    use std::io::ErrorKind;

    fn bits(v: u32) -> impl Iterator<Item = bool> {
        (0..24).rev().map(move |i| v & (1 << i) != 0)
    }

    #[test]
    fn sign_extension() {
        assert_eq!(sign_extend_24(0x00_0001), 1);
        assert_eq!(sign_extend_24(0x7F_FFFF), 8_388_607);
        assert_eq!(sign_extend_24(0x80_0000), -8_388_608);
        assert_eq!(sign_extend_24(0xFF_FFFE), -2);
    }

    #[test]
    fn reads_a_sample() {
        // Not ready twice, then ready, then 0xFF_FFFE MSB first.
        let mut reads = vec![
            Transaction::get(State::High),
            Transaction::get(State::High),
            Transaction::get(State::Low),
        ];
        reads.extend(bits(0xFF_FFFE).map(|b| {
            Transaction::get(if b { State::High } else { State::Low })
        }));
        // Parked low, then 24 data pulses and 2 gain pulses.
        let mut clock = vec![Transaction::set(State::Low)];
        for _ in 0..24 + 2 {
            clock.push(Transaction::set(State::High));
            clock.push(Transaction::set(State::Low));
        }
        let mut dout = PinMock::new(&reads);
        let mut sck = PinMock::new(&clock);

        let mut cell = LoadCell::new(
            dout.clone(),
            sck.clone(),
            NoopDelay,
            SoftGate::<Scan>::new(),
            Gain::B32,
        )
        .unwrap();
        assert_eq!(cell.read_raw(), Ok(-2));
        assert_eq!(cell.scan_gate.mask_count(), 1);
        assert!(!cell.scan_gate.is_masked());

        dout.done();
        sck.done();
    }

    #[test]
    fn failed_read_unmasks_scan() {
        let mut dout = PinMock::new(&[
            Transaction::get(State::Low),
            Transaction::get(State::High).with_error(MockError::Io(ErrorKind::NotConnected)),
        ]);
        let mut sck = PinMock::new(&[
            Transaction::set(State::Low),
            Transaction::set(State::High),
            Transaction::set(State::Low),
        ]);

        let mut cell = LoadCell::new(
            dout.clone(),
            sck.clone(),
            NoopDelay,
            SoftGate::<Scan>::new(),
            Gain::A128,
        )
        .unwrap();
        assert_eq!(cell.read_raw(), Err(HwError::Pin));
        assert_eq!(cell.scan_gate.mask_count(), 1);
        assert!(!cell.scan_gate.is_masked());

        dout.done();
        sck.done();
    }

    #[test]
    fn tare_averages() {
        let trace = Trace::default();
        let dout = SimInput::high();
        for v in &[100u32, 200, 300, 400] {
            dout.script(vec![false]);
            dout.script(bits(*v));
        }
        let mut cell = LoadCell::new(
            dout.clone(),
            SimPin::new("sck", &trace),
            SimDelay::default(),
            SoftGate::<Scan>::new(),
            Gain::A128,
        )
        .unwrap();
        assert_eq!(cell.tare(4), Ok(250));
        assert!(cell.delay.total_us() >= 4000);
    }
}
