//! Scrolling text.

use arrayvec::ArrayVec;

use crate::fb::{Framebuffer, Mode};
use crate::font::Font;
use crate::text;

/// Longest marquee text retained; anything past this is dropped.
pub const MARQUEE_CAPACITY: usize = 128;

/// State of the text currently scrolling across the grid.
#[derive(Default)]
pub struct Marquee {
    text: ArrayVec<[u8; MARQUEE_CAPACITY]>,
    width: i32,
    height: i32,
    x: i32,
    y: i32,
}

impl Marquee {
    /// Replaces the marquee text, positions it at `(left, top)` and draws it.
    pub fn start(
        &mut self,
        fb: &mut Framebuffer,
        font: &Font,
        text: &[u8],
        left: i32,
        top: i32,
    ) {
        self.text.clear();
        for &c in text {
            if self.text.try_push(c).is_err() {
                break;
            }
        }
        self.width = text::string_width(font, &self.text);
        self.height = i32::from(font.height());
        self.x = left;
        self.y = top;
        self.redraw(fb, font);
    }

    /// Moves the text by `(dx, dy)` and redraws it. When the text has scrolled
    /// entirely off one edge it reappears at the opposite edge, the screen is
    /// blanked, and this returns `true`.
    pub fn step(
        &mut self,
        fb: &mut Framebuffer,
        font: &Font,
        dx: i32,
        dy: i32,
    ) -> bool {
        let grid = fb.grid();
        let (width_px, height_px) = (grid.width_px() as i32, grid.height_px() as i32);
        let mut wrapped = false;

        self.x = self.x.saturating_add(dx);
        self.y = self.y.saturating_add(dy);

        if self.x < -self.width {
            self.x = width_px;
            wrapped = true;
        } else if self.x > width_px {
            self.x = -self.width;
            wrapped = true;
        }
        if self.y < -self.height {
            self.y = height_px;
            wrapped = true;
        } else if self.y > height_px {
            self.y = -self.height;
            wrapped = true;
        }

        if wrapped {
            fb.clear(true);
        }
        self.redraw(fb, font);
        wrapped
    }

    fn redraw(&self, fb: &mut Framebuffer, font: &Font) {
        text::draw_string(fb, font, self.x, self.y, &self.text, Mode::Normal);
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Total width of the text in pixels, spacing included.
    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn text(&self) -> &[u8] {
        &self.text
    }
}
