//! Row-multiplexed scan-out.
//!
//! P10 panels light one row in four at a time. Each call to `ScanOut::scan`
//! shifts the data for the current row group into the panel shift registers,
//! latches it, points the row decoder at the group, and moves on to the next
//! group. Called every 2 ms this refreshes the whole panel at 125 Hz.
//!
//! Within a refresh, bytes go out in shift-register order: for each byte
//! column, the rows from framebuffer blocks 3, 2, 1 and 0, in that order.

use embedded_hal::digital::{InputPin, OutputPin, PinState};
use embedded_hal::spi::SpiBus;
use gfx::{FrameReader, ROW_GROUPS};

use crate::hw::HwError;
use crate::priority::Scan;

/// The four phases of the row multiplexer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RowGroup {
    /// Rows 1, 5, 9, 13.
    G0,
    /// Rows 2, 6, 10, 14.
    G1,
    /// Rows 3, 7, 11, 15.
    G2,
    /// Rows 4, 8, 12, 16.
    G3,
}

impl RowGroup {
    pub fn next(self) -> Self {
        match self {
            RowGroup::G0 => RowGroup::G1,
            RowGroup::G1 => RowGroup::G2,
            RowGroup::G2 => RowGroup::G3,
            RowGroup::G3 => RowGroup::G0,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Levels of the A and B row address lines that light this group.
    pub fn address(self) -> (bool, bool) {
        let i = self.index();
        (i & 1 != 0, i & 2 != 0)
    }
}

/// Everything on the panel connector.
pub struct ScanPort<B, O, I> {
    /// Carries pixel data and clock.
    pub bus: B,
    /// Output enable. High lights the latched rows.
    pub enable: O,
    /// Rising then falling edge moves shifted data to the outputs.
    pub latch: O,
    pub row_a: O,
    pub row_b: O,
    /// Reads low while some other device has claimed the bus.
    pub bus_select: I,
}

/// The scan-out engine: a framebuffer view, the connector, and the next row
/// group to light. Owned by the scan timer ISR.
pub struct ScanOut<'a, B, O, I> {
    frame: FrameReader<'a>,
    port: ScanPort<B, O, I>,
    group: RowGroup,
}

impl<'a, B, O, I> ScanOut<'a, B, O, I>
where
    B: SpiBus<u8>,
    O: OutputPin,
    I: InputPin,
{
    /// Takes over `port`, driving the panel to a known state: outputs
    /// disabled, latch low, row group 0 addressed.
    pub fn new(frame: FrameReader<'a>, mut port: ScanPort<B, O, I>) -> Result<Self, HwError> {
        port.enable.set_low().map_err(|_| HwError::Pin)?;
        port.latch.set_low().map_err(|_| HwError::Pin)?;
        port.row_a.set_low().map_err(|_| HwError::Pin)?;
        port.row_b.set_low().map_err(|_| HwError::Pin)?;
        Ok(ScanOut {
            frame,
            port,
            group: RowGroup::G0,
        })
    }

    /// The row group the next successful `scan` will light.
    pub fn group(&self) -> RowGroup {
        self.group
    }

    pub fn port(&self) -> &ScanPort<B, O, I> {
        &self.port
    }

    /// Refreshes one row group.
    ///
    /// If the bus is claimed by another device, does nothing and returns
    /// `Ok(false)`; the same group is tried again next time. So is a group
    /// whose refresh failed partway.
    pub fn scan(&mut self, _: &Scan) -> Result<bool, HwError> {
        if !self.port.bus_select.is_high().map_err(|_| HwError::Pin)? {
            return Ok(false);
        }

        let grid = self.frame.grid();
        let stride = grid.row_stride();
        let base = self.group.index() * stride;
        let mut blocks = [0; ROW_GROUPS];
        for (n, b) in blocks.iter_mut().enumerate() {
            *b = grid.group_offset(ROW_GROUPS - 1 - n);
        }

        for i in 0..stride {
            let mut column = [0; ROW_GROUPS];
            for (byte, &block) in column.iter_mut().zip(&blocks) {
                *byte = self.frame.byte(base + i + block);
            }
            self.port.bus.write(&column).map_err(|_| HwError::Bus)?;
        }
        // Everything must be in the shift registers before the latch.
        self.port.bus.flush().map_err(|_| HwError::Bus)?;

        let (a, b) = self.group.address();
        let port = &mut self.port;
        port.enable.set_low().map_err(|_| HwError::Pin)?;
        port.latch.set_high().map_err(|_| HwError::Pin)?;
        port.latch.set_low().map_err(|_| HwError::Pin)?;
        port.row_a.set_state(PinState::from(a)).map_err(|_| HwError::Pin)?;
        port.row_b.set_state(PinState::from(b)).map_err(|_| HwError::Pin)?;
        port.enable.set_high().map_err(|_| HwError::Pin)?;

        self.group = self.group.next();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Event, SimBus, SimInput, SimPin, Trace};
    use core::sync::atomic::AtomicU8;
    use gfx::{Display, Mode, PanelGrid};

    type SimScan<'a> = ScanOut<'a, SimBus, SimPin, SimInput>;

    fn port(trace: &Trace, select: &SimInput) -> ScanPort<SimBus, SimPin, SimInput> {
        ScanPort {
            bus: SimBus(trace.clone()),
            enable: SimPin::new("oe", trace),
            latch: SimPin::new("latch", trace),
            row_a: SimPin::new("a", trace),
            row_b: SimPin::new("b", trace),
            bus_select: select.clone(),
        }
    }

    fn storage(grid: PanelGrid) -> Vec<AtomicU8> {
        (0..grid.bytes()).map(|_| AtomicU8::new(0)).collect()
    }

    #[test]
    fn group_cycle() {
        let mut g = RowGroup::G0;
        let mut seen = vec![];
        for _ in 0..5 {
            seen.push((g, g.address()));
            g = g.next();
        }
        assert_eq!(
            seen,
            [
                (RowGroup::G0, (false, false)),
                (RowGroup::G1, (true, false)),
                (RowGroup::G2, (false, true)),
                (RowGroup::G3, (true, true)),
                (RowGroup::G0, (false, false)),
            ]
        );
    }

    #[test]
    fn starts_dark_and_addressed() {
        let trace = Trace::default();
        let grid = PanelGrid::new(1, 1);
        let cells = storage(grid);
        let display = Display::new(grid, &cells);
        let scan: SimScan = ScanOut::new(display.reader(), port(&trace, &SimInput::high())).unwrap();
        assert_eq!(scan.group(), RowGroup::G0);
        assert!(!scan.port().enable.level());
        assert_eq!(
            trace.pins(),
            [("oe", false), ("latch", false), ("a", false), ("b", false)]
        );
    }

    #[test]
    fn single_pixel_refresh() {
        let trace = Trace::default();
        let grid = PanelGrid::new(1, 1);
        let cells = storage(grid);
        let mut display = Display::new(grid, &cells);
        display.write_pixel(0, 0, Mode::Normal, true);

        let mut scan: SimScan = ScanOut::new(display.reader(), port(&trace, &SimInput::high())).unwrap();
        trace.clear();
        let p = unsafe { Scan::new() };
        assert_eq!(scan.scan(&p), Ok(true));

        // Four byte columns, each sending blocks 3, 2, 1, 0. The lit pixel is
        // in block 0 of the first column.
        let mut expected = vec![0xFF; 16];
        expected[3] = 0x7F;
        assert_eq!(trace.bytes(), expected);

        let events = trace.events();
        assert_eq!(
            &events[16..],
            &[
                Event::Pin("oe", false),
                Event::Pin("latch", true),
                Event::Pin("latch", false),
                Event::Pin("a", false),
                Event::Pin("b", false),
                Event::Pin("oe", true),
            ]
        );
        assert_eq!(scan.group(), RowGroup::G1);
    }

    #[test]
    fn four_scans_cover_frame_once() {
        let trace = Trace::default();
        let grid = PanelGrid::new(2, 1);
        let cells = storage(grid);
        let display = Display::new(grid, &cells);
        // Give every byte a distinct value.
        for (i, c) in cells.iter().enumerate() {
            c.store(i as u8, core::sync::atomic::Ordering::Relaxed);
        }

        let mut scan: SimScan = ScanOut::new(display.reader(), port(&trace, &SimInput::high())).unwrap();
        let p = unsafe { Scan::new() };
        let mut addresses = vec![];
        for _ in 0..4 {
            trace.clear();
            assert_eq!(scan.scan(&p), Ok(true));
            assert_eq!(trace.bytes().len(), grid.row_stride() * ROW_GROUPS);
            addresses.push((scan.port().row_a.level(), scan.port().row_b.level()));
            let mut all = trace.bytes();
            all.sort();
            // Group n sends physical rows n, n+4, n+8, n+12.
            let n = addresses.len() - 1;
            let mut want: Vec<u8> = (0..4)
                .flat_map(|block| {
                    let row = n + 4 * block;
                    (row * 8..row * 8 + 8).map(|b| b as u8)
                })
                .collect();
            want.sort();
            assert_eq!(all, want);
        }
        assert_eq!(
            addresses,
            [(false, false), (true, false), (false, true), (true, true)]
        );
        assert_eq!(scan.group(), RowGroup::G0);
    }

    #[test]
    fn claimed_bus_skips_cycle() {
        let trace = Trace::default();
        let grid = PanelGrid::new(1, 1);
        let cells = storage(grid);
        let display = Display::new(grid, &cells);
        let select = SimInput::high();
        let mut scan: SimScan = ScanOut::new(display.reader(), port(&trace, &select)).unwrap();
        let p = unsafe { Scan::new() };
        trace.clear();

        select.drive(false);
        assert_eq!(scan.scan(&p), Ok(false));
        assert!(trace.events().is_empty());
        assert_eq!(scan.group(), RowGroup::G0);

        select.drive(true);
        assert_eq!(scan.scan(&p), Ok(true));
        assert_eq!(scan.group(), RowGroup::G1);
    }

    #[test]
    fn unreadable_select_is_an_error() {
        use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};
        use embedded_hal_mock::eh1::MockError;
        use std::io::ErrorKind;

        let trace = Trace::default();
        let grid = PanelGrid::new(1, 1);
        let cells = storage(grid);
        let display = Display::new(grid, &cells);
        let mut select = PinMock::new(&[
            Transaction::get(State::High).with_error(MockError::Io(ErrorKind::NotConnected)),
            Transaction::get(State::High),
        ]);
        let port = ScanPort {
            bus: SimBus(trace.clone()),
            enable: SimPin::new("oe", &trace),
            latch: SimPin::new("latch", &trace),
            row_a: SimPin::new("a", &trace),
            row_b: SimPin::new("b", &trace),
            bus_select: select.clone(),
        };
        let mut scan = ScanOut::new(display.reader(), port).unwrap();
        let p = unsafe { Scan::new() };
        trace.clear();

        assert_eq!(scan.scan(&p), Err(HwError::Pin));
        assert!(trace.events().is_empty());
        assert_eq!(scan.group(), RowGroup::G0);

        assert_eq!(scan.scan(&p), Ok(true));
        assert_eq!(scan.group(), RowGroup::G1);
        select.done();
    }
}
