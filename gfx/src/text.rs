//! Text rendering.

use crate::fb::{Framebuffer, Mode};
use crate::font::Font;
use crate::raster;

/// Draws `c` with its top-left corner at `(x, y)` and returns the glyph width.
///
/// Returns `-1` without drawing if `(x, y)` is off the right or bottom edge of
/// the grid, and `0` if the font cannot render `c`. Space is drawn as an
/// eraser: a dark rectangle as wide as `'n'` and as tall as the font.
/// Glyphs lying entirely above or left of the grid report their width but
/// touch nothing.
///
/// Set bits in the glyph are written as `true` and clear bits as `false`, so
/// in `Mode::Normal` the glyph's whole cell is replaced.
pub fn draw_char(
    fb: &mut Framebuffer,
    font: &Font,
    x: i32,
    y: i32,
    c: u8,
    mode: Mode,
) -> i32 {
    let grid = fb.grid();
    if x >= grid.width_px() as i32 || y >= grid.height_px() as i32 {
        return -1;
    }

    let height = i32::from(font.height());
    if c == b' ' {
        let width = i32::from(font.char_width(b' '));
        raster::filled_rect(
            fb,
            x,
            y,
            x + width - 1,
            y + height - 1,
            Mode::Inverse,
        );
        return width;
    }

    let glyph = match font.glyph(c) {
        Some(g) => g,
        None => return 0,
    };
    let width = i32::from(glyph.width());
    if x < -width || y < -height {
        return width;
    }

    glyph.for_each_pixel(|col, row, on| {
        fb.write_pixel(x + col as i32, y + row as i32, mode, on);
    });
    width
}

/// Draws `text` starting at `(x, y)`, framing every glyph with one-pixel dark
/// columns so that a string redrawn one pixel over cleans up after itself.
///
/// Stops at the first glyph that reports it is off the grid, and once the pen
/// position passes the right edge. Code points the font cannot render advance
/// nothing.
pub fn draw_string(
    fb: &mut Framebuffer,
    font: &Font,
    x: i32,
    y: i32,
    text: &[u8],
    mode: Mode,
) {
    let grid = fb.grid();
    let (width_px, height_px) = (grid.width_px() as i32, grid.height_px() as i32);
    if x >= width_px || y >= height_px {
        return;
    }
    let height = i32::from(font.height());
    if y + height < 0 {
        return;
    }

    let mut pen = 0;
    let lead = x.saturating_sub(1);
    raster::line(fb, lead, y, lead, y + height, Mode::Inverse);
    for &c in text {
        let width = draw_char(fb, font, x + pen, y, c, mode);
        if width < 0 {
            return;
        }
        if width > 0 {
            pen += width;
            raster::line(fb, x + pen, y, x + pen, y + height, Mode::Inverse);
            pen += 1;
        }
        if x + pen >= width_px {
            return;
        }
    }
}

/// Total width of `text` when drawn with `draw_string`, including the spacing
/// column after every glyph.
pub fn string_width(font: &Font, text: &[u8]) -> i32 {
    text.iter()
        .map(|&c| i32::from(font.char_width(c)) + 1)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fb::PanelGrid;
    use crate::test_util::*;

    #[test]
    fn off_grid_origin_is_rejected() {
        let g = PanelGrid::new(1, 1);
        let cells = storage(g);
        let mut fb = Framebuffer::new(g, &cells);
        let data = fixed_font();
        let font = Font::new(&data);
        assert_eq!(draw_char(&mut fb, &font, 32, 0, b'A', Mode::Normal), -1);
        assert_eq!(draw_char(&mut fb, &font, 0, 16, b'A', Mode::Normal), -1);
        assert!(lit(&fb).is_empty());
    }

    #[test]
    fn unrenderable_draws_nothing() {
        let g = PanelGrid::new(1, 1);
        let cells = storage(g);
        let mut fb = Framebuffer::new(g, &cells);
        fb.clear(false);
        let data = fixed_font();
        let font = Font::new(&data);
        assert_eq!(draw_char(&mut fb, &font, 0, 0, b'x', Mode::Normal), 0);
        assert_eq!(lit(&fb).len(), 32 * 16);
    }

    #[test]
    fn glyph_cell_is_replaced() {
        let g = PanelGrid::new(1, 1);
        let cells = storage(g);
        let mut fb = Framebuffer::new(g, &cells);
        fb.clear(false);
        let data = fixed_font();
        let font = Font::new(&data);
        assert_eq!(draw_char(&mut fb, &font, 4, 2, b'C', Mode::Normal), 3);
        for row in 2..7 {
            assert_eq!(fb.pixel(4, row), Some(false));
            assert_eq!(fb.pixel(5, row), Some(true));
            assert_eq!(fb.pixel(6, row), Some(false));
        }
        // Outside the cell, untouched.
        assert_eq!(fb.pixel(4, 7), Some(true));
        assert_eq!(fb.pixel(7, 2), Some(true));
    }

    #[test]
    fn partially_clipped_glyph() {
        let g = PanelGrid::new(1, 1);
        let cells = storage(g);
        let mut fb = Framebuffer::new(g, &cells);
        let data = fixed_font();
        let font = Font::new(&data);
        assert_eq!(draw_char(&mut fb, &font, -2, -1, b'A', Mode::Normal), 3);
        assert_eq!(lit(&fb), [(0, 0), (0, 1), (0, 2), (0, 3)]);
    }

    #[test]
    fn fully_hidden_glyph_reports_width() {
        let g = PanelGrid::new(1, 1);
        let cells = storage(g);
        let mut fb = Framebuffer::new(g, &cells);
        let data = fixed_font();
        let font = Font::new(&data);
        assert_eq!(draw_char(&mut fb, &font, -10, 0, b'A', Mode::Normal), 3);
        assert_eq!(draw_char(&mut fb, &font, 0, -10, b'A', Mode::Normal), 3);
        assert!(lit(&fb).is_empty());
    }

    #[test]
    fn space_erases() {
        let g = PanelGrid::new(1, 1);
        let cells = storage(g);
        let mut fb = Framebuffer::new(g, &cells);
        fb.clear(false);
        // The system-style font below has an 'n', so space has a width.
        let mut data = vec![0, 0, 2, 3, b'n', 1];
        data.extend_from_slice(&[0x07, 0x07]);
        let font = Font::new(&data);
        assert_eq!(draw_char(&mut fb, &font, 1, 1, b' ', Mode::Normal), 2);
        assert_eq!(lit(&fb).len(), 32 * 16 - 6);
        for &(x, y) in &[(1, 1), (2, 1), (1, 3), (2, 3)] {
            assert_eq!(fb.pixel(x, y), Some(false));
        }
        assert_eq!(fb.pixel(3, 1), Some(true));
        assert_eq!(fb.pixel(1, 4), Some(true));
    }

    #[test]
    fn string_spacing() {
        let g = PanelGrid::new(1, 1);
        let cells = storage(g);
        let mut fb = Framebuffer::new(g, &cells);
        fb.clear(false);
        let data = fixed_font();
        let font = Font::new(&data);
        draw_string(&mut fb, &font, 2, 0, b"AA", Mode::Normal);
        // Leading eraser column, two solid glyphs each followed by an eraser
        // column. Eraser columns run one row past the glyph height.
        for y in 0..6 {
            assert_eq!(fb.pixel(1, y), Some(false), "leading column, row {}", y);
            assert_eq!(fb.pixel(5, y), Some(false), "first gap, row {}", y);
            assert_eq!(fb.pixel(9, y), Some(false), "second gap, row {}", y);
        }
        for y in 0..5 {
            for &x in &[2, 3, 4, 6, 7, 8] {
                assert_eq!(fb.pixel(x, y), Some(true));
            }
        }
        assert_eq!(fb.pixel(10, 0), Some(true));
        assert_eq!(string_width(&font, b"AA"), 8);
    }

    #[test]
    fn zero_width_glyph_advances_nothing() {
        let g = PanelGrid::new(1, 1);
        let cells = storage(g);
        let mut fb = Framebuffer::new(g, &cells);
        let data = fixed_font();
        let font = Font::new(&data);
        draw_string(&mut fb, &font, 0, 0, b"zC", Mode::Normal);
        // 'C' lands at the origin, as if 'z' were not there.
        assert_eq!(fb.pixel(1, 0), Some(true));
    }

    #[test]
    fn string_stops_at_right_edge() {
        let g = PanelGrid::new(1, 1);
        let cells = storage(g);
        let mut fb = Framebuffer::new(g, &cells);
        let data = fixed_font();
        let font = Font::new(&data);
        draw_string(&mut fb, &font, 28, 0, b"AAAA", Mode::Normal);
        // First glyph fits; the pen is then at 32, so drawing stops.
        assert_eq!(lit(&fb).len(), 3 * 5);
    }

    #[test]
    fn string_above_grid_is_skipped() {
        let g = PanelGrid::new(1, 1);
        let cells = storage(g);
        let mut fb = Framebuffer::new(g, &cells);
        fb.clear(false);
        let data = fixed_font();
        let font = Font::new(&data);
        draw_string(&mut fb, &font, 0, -6, b"A", Mode::Normal);
        draw_string(&mut fb, &font, 0, 16, b"A", Mode::Normal);
        assert_eq!(lit(&fb).len(), 32 * 16);
    }

    #[test]
    fn eight_row_fixed_font() {
        let g = PanelGrid::new(1, 1);
        let cells = storage(g);
        let mut fb = Framebuffer::new(g, &cells);
        let mut data = vec![0, 0, 5, 8, b'A', 1];
        data.extend_from_slice(&[0x7E, 0x11, 0x11, 0x11, 0x7E]);
        let font = Font::new(&data);

        assert_eq!(draw_char(&mut fb, &font, 0, 0, b'A', Mode::Normal), 5);
        // Column 0 is 0x7E: rows 1 through 6.
        for y in 0..8 {
            assert_eq!(fb.pixel(0, y), Some((1..=6).contains(&y)));
        }

        let reader = fb.reader();
        let before: Vec<u8> = (0..g.bytes()).map(|i| reader.byte(i)).collect();
        assert_eq!(draw_char(&mut fb, &font, 8, 0, b'B', Mode::Normal), 0);
        let after: Vec<u8> = (0..g.bytes()).map(|i| reader.byte(i)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn string_at_extreme_left_is_clipped() {
        let g = PanelGrid::new(1, 1);
        let cells = storage(g);
        let mut fb = Framebuffer::new(g, &cells);
        let data = fixed_font();
        let font = Font::new(&data);
        draw_string(&mut fb, &font, i32::MIN, 0, b"ABC", Mode::Normal);
        assert!(lit(&fb).is_empty());
    }
}
