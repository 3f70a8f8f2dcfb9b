//! Bit-packed framebuffer and panel addressing.
//!
//! The buffer layout mirrors what the panel shift registers expect: each panel
//! contributes four bytes to every physical row, panels are laid side by side
//! within a row, and a *cleared* bit is a lit LED.

use core::sync::atomic::{AtomicU8, Ordering};

/// Width of a single panel in pixels.
pub const PANEL_WIDTH: usize = 32;
/// Height of a single panel in pixels.
pub const PANEL_HEIGHT: usize = 16;
/// Framebuffer bytes consumed by each panel.
pub const PANEL_BYTES: usize = PANEL_WIDTH * PANEL_HEIGHT / 8;
/// Number of row groups the panels are multiplexed across.
pub const ROW_GROUPS: usize = 4;

/// A dark framebuffer byte, for initializing storage arrays.
#[allow(clippy::declare_interior_mutable_const)]
pub const DARK: AtomicU8 = AtomicU8::new(0xFF);

/// Arrangement of panels. Fixed for the life of a display.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PanelGrid {
    wide: usize,
    high: usize,
}

impl PanelGrid {
    /// Describes a grid `wide` panels across and `high` panels down.
    ///
    /// # Panics
    ///
    /// If either dimension is zero.
    pub fn new(wide: usize, high: usize) -> Self {
        assert!(wide > 0 && high > 0, "panel grid must be at least 1x1");
        PanelGrid { wide, high }
    }

    pub fn panels_wide(&self) -> usize {
        self.wide
    }

    pub fn panels_high(&self) -> usize {
        self.high
    }

    pub fn total(&self) -> usize {
        self.wide * self.high
    }

    pub fn width_px(&self) -> usize {
        self.wide * PANEL_WIDTH
    }

    pub fn height_px(&self) -> usize {
        self.high * PANEL_HEIGHT
    }

    /// Size of the framebuffer, in bytes.
    pub fn bytes(&self) -> usize {
        self.total() * PANEL_BYTES
    }

    /// Bytes in one physical row across all panels. This is also the number
    /// of bytes shifted out per row group per scan.
    pub fn row_stride(&self) -> usize {
        self.total() * PANEL_WIDTH / 8
    }

    /// Byte offset of the `n`th block of four consecutive physical rows.
    pub fn group_offset(&self, n: usize) -> usize {
        n * ROW_GROUPS * self.row_stride()
    }

    /// Maps a pixel to its byte offset and bit mask, or `None` if the pixel is
    /// off the grid.
    pub fn locate(&self, x: i32, y: i32) -> Option<(usize, u8)> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width_px() || y >= self.height_px() {
            return None;
        }

        let panel = x / PANEL_WIDTH + self.wide * (y / PANEL_HEIGHT);
        let col = x % PANEL_WIDTH + panel * PANEL_WIDTH;
        let row = y % PANEL_HEIGHT;
        Some((col / 8 + row * self.row_stride(), 0x80 >> (col % 8)))
    }
}

/// How a pixel write combines with what is already there.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Mode {
    /// Pixel becomes lit iff the written value is `true`.
    Normal,
    /// Pixel becomes lit iff the written value is `false`.
    Inverse,
    /// Writing `true` flips the pixel; `false` leaves it alone.
    Toggle,
    /// Writing `true` lights the pixel; `false` leaves it alone.
    Or,
    /// Writing `true` lights the pixel only if it is currently dark.
    Nor,
}

/// Write access to framebuffer storage.
///
/// The storage is a slice of atomic bytes so that the scan-out interrupt can
/// read it concurrently through a `FrameReader`. All accesses are `Relaxed`:
/// a refresh may show a partially updated frame, which is accepted.
pub struct Framebuffer<'a> {
    grid: PanelGrid,
    cells: &'a [AtomicU8],
}

impl<'a> Framebuffer<'a> {
    /// Wraps `cells` as a framebuffer for `grid` and blanks it.
    ///
    /// # Panics
    ///
    /// If `cells` is not exactly `grid.bytes()` long.
    pub fn new(grid: PanelGrid, cells: &'a [AtomicU8]) -> Self {
        assert_eq!(
            cells.len(),
            grid.bytes(),
            "framebuffer storage must hold {} bytes per panel",
            PANEL_BYTES
        );
        let mut fb = Framebuffer { grid, cells };
        fb.clear(true);
        fb
    }

    pub fn grid(&self) -> PanelGrid {
        self.grid
    }

    /// Produces a read-only view of the same storage, for scan-out.
    pub fn reader(&self) -> FrameReader<'a> {
        FrameReader {
            grid: self.grid,
            cells: self.cells,
        }
    }

    /// Applies `value` to the pixel at `(x, y)` according to `mode`.
    /// Off-grid coordinates are ignored.
    pub fn write_pixel(&mut self, x: i32, y: i32, mode: Mode, value: bool) {
        let (offset, mask) = match self.grid.locate(x, y) {
            Some(loc) => loc,
            None => return,
        };
        let cell = &self.cells[offset];
        match (mode, value) {
            (Mode::Normal, true) | (Mode::Inverse, false) | (Mode::Or, true) => {
                cell.fetch_and(!mask, Ordering::Relaxed);
            }
            (Mode::Normal, false) | (Mode::Inverse, true) => {
                cell.fetch_or(mask, Ordering::Relaxed);
            }
            (Mode::Toggle, true) => {
                cell.fetch_xor(mask, Ordering::Relaxed);
            }
            (Mode::Nor, true) => {
                if cell.load(Ordering::Relaxed) & mask != 0 {
                    cell.fetch_and(!mask, Ordering::Relaxed);
                }
            }
            (Mode::Toggle, false) | (Mode::Or, false) | (Mode::Nor, false) => (),
        }
    }

    /// Reads back a pixel: `Some(true)` if lit, `None` if off-grid.
    pub fn pixel(&self, x: i32, y: i32) -> Option<bool> {
        let (offset, mask) = self.grid.locate(x, y)?;
        Some(self.cells[offset].load(Ordering::Relaxed) & mask == 0)
    }

    /// Sets every pixel at once: dark if `normal`, lit otherwise.
    pub fn clear(&mut self, normal: bool) {
        let fill = if normal { 0xFF } else { 0x00 };
        for c in self.cells {
            c.store(fill, Ordering::Relaxed);
        }
    }
}

/// Read-only view of framebuffer storage, handed to the scan-out engine.
#[derive(Copy, Clone)]
pub struct FrameReader<'a> {
    grid: PanelGrid,
    cells: &'a [AtomicU8],
}

impl<'a> FrameReader<'a> {
    pub fn grid(&self) -> PanelGrid {
        self.grid
    }

    /// Reads the raw byte at `offset`, in shift-register order.
    ///
    /// # Panics
    ///
    /// If `offset` is outside the framebuffer.
    pub fn byte(&self, offset: usize) -> u8 {
        self.cells[offset].load(Ordering::Relaxed)
    }
}
