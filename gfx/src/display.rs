//! The drawing surface used by application code.

use core::sync::atomic::AtomicU8;

use crate::fb::{FrameReader, Framebuffer, Mode, PanelGrid};
use crate::font::Font;
use crate::marquee::Marquee;
use crate::pattern::{self, TestPattern};
use crate::raster;
use crate::text;

/// A framebuffer plus the text state that goes with it: the selected font and
/// the marquee.
///
/// There is exactly one `Display` per framebuffer and it lives in thread mode.
/// The scan-out interrupt gets a `FrameReader` from `reader` instead.
pub struct Display<'a, 'f> {
    fb: Framebuffer<'a>,
    font: Option<Font<'f>>,
    marquee: Marquee,
}

impl<'a, 'f> Display<'a, 'f> {
    /// Creates a display over `storage`, which is blanked.
    ///
    /// # Panics
    ///
    /// If `storage` is not exactly `grid.bytes()` long.
    pub fn new(grid: PanelGrid, storage: &'a [AtomicU8]) -> Self {
        Display {
            fb: Framebuffer::new(grid, storage),
            font: None,
            marquee: Marquee::default(),
        }
    }

    pub fn grid(&self) -> PanelGrid {
        self.fb.grid()
    }

    pub fn reader(&self) -> FrameReader<'a> {
        self.fb.reader()
    }

    pub fn framebuffer(&mut self) -> &mut Framebuffer<'a> {
        &mut self.fb
    }

    pub fn write_pixel(&mut self, x: i32, y: i32, mode: Mode, value: bool) {
        self.fb.write_pixel(x, y, mode, value)
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<bool> {
        self.fb.pixel(x, y)
    }

    /// Sets every pixel: dark if `normal`, lit otherwise.
    pub fn clear(&mut self, normal: bool) {
        self.fb.clear(normal)
    }

    pub fn select_font(&mut self, font: Font<'f>) {
        self.font = Some(font);
    }

    pub fn font(&self) -> Option<Font<'f>> {
        self.font
    }

    /// Width of `c` in the selected font, or zero if there is none.
    pub fn char_width(&self, c: u8) -> u8 {
        self.font.map(|f| f.char_width(c)).unwrap_or(0)
    }

    /// Draws one character in the selected font. See `text::draw_char` for
    /// the return value. With no font selected nothing is renderable, so this
    /// returns `0`.
    pub fn draw_char(&mut self, x: i32, y: i32, c: u8, mode: Mode) -> i32 {
        match self.font {
            Some(font) => text::draw_char(&mut self.fb, &font, x, y, c, mode),
            None => 0,
        }
    }

    /// Draws a string. Does nothing if no font is selected.
    pub fn draw_string(&mut self, x: i32, y: i32, s: &[u8], mode: Mode) {
        if let Some(font) = self.font {
            text::draw_string(&mut self.fb, &font, x, y, s, mode);
        }
    }

    /// Starts scrolling `s` from `(left, top)` in the selected font. Does
    /// nothing if no font is selected.
    pub fn draw_marquee(&mut self, s: &[u8], left: i32, top: i32) {
        if let Some(font) = self.font {
            self.marquee.start(&mut self.fb, &font, s, left, top);
        }
    }

    /// Advances the marquee; returns `true` if it wrapped around an edge.
    /// Without a font the marquee stays put and this returns `false`.
    pub fn step_marquee(&mut self, dx: i32, dy: i32) -> bool {
        match self.font {
            Some(font) => self.marquee.step(&mut self.fb, &font, dx, dy),
            None => false,
        }
    }

    pub fn marquee_position(&self) -> (i32, i32) {
        self.marquee.position()
    }

    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, mode: Mode) {
        raster::line(&mut self.fb, x0, y0, x1, y1, mode)
    }

    pub fn draw_box(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, mode: Mode) {
        raster::rect(&mut self.fb, x0, y0, x1, y1, mode)
    }

    pub fn draw_filled_box(
        &mut self,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        mode: Mode,
    ) {
        raster::filled_rect(&mut self.fb, x0, y0, x1, y1, mode)
    }

    pub fn draw_circle(&mut self, cx: i32, cy: i32, r: i32, mode: Mode) {
        raster::circle(&mut self.fb, cx, cy, r, mode)
    }

    pub fn draw_test_pattern(&mut self, pattern: TestPattern) {
        pattern::draw(&mut self.fb, pattern)
    }
}
