//! Decoder for bitmap font resources.
//!
//! A font is an immutable byte blob with a six-byte header:
//!
//! | offset | field |
//! |--------|-------|
//! | 0..2   | total length; zero marks a fixed-width font |
//! | 2      | glyph width, fixed-width fonts only |
//! | 3      | height in pixel rows |
//! | 4      | first code point |
//! | 5      | number of code points |
//!
//! Proportional fonts follow the header with one width byte per code point.
//! Glyph bitmaps come next, stored column by column in `ceil(height / 8)`
//! byte-rows; bit 0 of each byte is its topmost pixel. The last byte-row of a
//! glyph taller than eight pixels is aligned to the bottom of the glyph rather
//! than to a multiple of eight.
//!
//! Truncated or inconsistent resources never cause a panic: glyphs whose data
//! is missing are simply unrenderable.

const HEADER_LEN: usize = 6;

/// A font resource. Cheap to copy; selecting a font never copies the data.
#[derive(Copy, Clone, Debug)]
pub struct Font<'a> {
    data: &'a [u8],
}

impl<'a> Font<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Font { data }
    }

    fn header(&self, i: usize) -> u8 {
        self.data.get(i).cloned().unwrap_or(0)
    }

    pub fn is_fixed_width(&self) -> bool {
        self.header(0) == 0 && self.header(1) == 0
    }

    pub fn height(&self) -> u8 {
        self.header(3)
    }

    pub fn first_char(&self) -> u8 {
        self.header(4)
    }

    pub fn char_count(&self) -> u8 {
        self.header(5)
    }

    fn bytes_per_column(&self) -> usize {
        (usize::from(self.height()) + 7) / 8
    }

    /// Checks whether `c` falls within the font's code point range.
    pub fn covers(&self, c: u8) -> bool {
        let first = usize::from(self.first_char());
        let c = usize::from(c);
        c >= first && c < first + usize::from(self.char_count())
    }

    /// Looks up the glyph for `c`, if it is both in range and present in the
    /// resource.
    pub fn glyph(&self, c: u8) -> Option<Glyph<'a>> {
        if !self.covers(c) {
            return None;
        }
        let index = usize::from(c - self.first_char());
        let per_col = self.bytes_per_column();

        let (width, start) = if self.is_fixed_width() {
            let width = self.header(2);
            (width, HEADER_LEN + index * per_col * usize::from(width))
        } else {
            let count = usize::from(self.char_count());
            let widths = self.data.get(HEADER_LEN..HEADER_LEN + count)?;
            let skipped: usize =
                widths[..index].iter().map(|&w| usize::from(w)).sum();
            (widths[index], HEADER_LEN + count + skipped * per_col)
        };

        let len = usize::from(width) * per_col;
        let data = self.data.get(start..start + len)?;
        Some(Glyph {
            width,
            height: self.height(),
            data,
        })
    }

    /// Width of `c` in pixels, not counting inter-character spacing. Space is
    /// as wide as `'n'`. Unrenderable code points have width zero.
    pub fn char_width(&self, c: u8) -> u8 {
        let c = if c == b' ' { b'n' } else { c };
        self.glyph(c).map(|g| g.width).unwrap_or(0)
    }
}

/// Bitmap data for a single code point.
#[derive(Copy, Clone, Debug)]
pub struct Glyph<'a> {
    width: u8,
    height: u8,
    data: &'a [u8],
}

impl<'a> Glyph<'a> {
    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    /// Calls `f(column, row, lit)` once for every pixel of the glyph, a column
    /// at a time.
    pub fn for_each_pixel(&self, mut f: impl FnMut(usize, usize, bool)) {
        let width = usize::from(self.width);
        let height = usize::from(self.height);
        let byte_rows = (height + 7) / 8;

        for col in 0..width {
            for r in (0..byte_rows).rev() {
                let bits = self.data[col + r * width];
                let origin = if r == byte_rows - 1 && byte_rows > 1 {
                    height - 8
                } else {
                    r * 8
                };
                for k in 0..8 {
                    let row = origin + k;
                    if row >= r * 8 && row < height {
                        f(col, row, bits & (1 << k) != 0);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;

    #[test]
    fn fixed_header() {
        let data = fixed_font();
        let f = Font::new(&data);
        assert!(f.is_fixed_width());
        assert_eq!(f.height(), 5);
        assert_eq!(f.first_char(), b'A');
        assert_eq!(f.char_count(), 3);
        assert_eq!(f.char_width(b'B'), 3);
    }

    #[test]
    fn out_of_range_is_unrenderable() {
        let data = fixed_font();
        let f = Font::new(&data);
        assert!(f.glyph(b'@').is_none());
        assert!(f.glyph(b'D').is_none());
        assert_eq!(f.char_width(b'z'), 0);
        // No 'n' in this font, so no space either.
        assert_eq!(f.char_width(b' '), 0);
    }

    #[test]
    fn fixed_glyph_pixels() {
        let data = fixed_font();
        let f = Font::new(&data);
        let mut lit = vec![];
        f.glyph(b'C').unwrap().for_each_pixel(|c, r, on| {
            if on {
                lit.push((c, r))
            }
        });
        lit.sort();
        assert_eq!(lit, [(1, 0), (1, 1), (1, 2), (1, 3), (1, 4)]);
    }

    #[test]
    fn proportional_widths_and_offsets() {
        let data = tall_font();
        let f = Font::new(&data);
        assert!(!f.is_fixed_width());
        assert_eq!(f.char_width(b'0'), 2);
        assert_eq!(f.char_width(b'1'), 1);

        let one = f.glyph(b'1').unwrap();
        let mut rows = vec![];
        one.for_each_pixel(|_, r, on| {
            assert!(on);
            rows.push(r);
        });
        rows.sort();
        assert_eq!(rows, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn tall_glyph_last_row_is_bottom_aligned() {
        let data = tall_font();
        let f = Font::new(&data);
        let mut lit = vec![];
        f.glyph(b'0').unwrap().for_each_pixel(|c, r, on| {
            if on {
                lit.push((c, r))
            }
        });
        lit.sort();
        assert_eq!(lit, [(0, 0), (0, 11), (1, 0), (1, 11)]);
    }

    #[test]
    fn truncated_resource() {
        let mut data = tall_font();
        data.truncate(data.len() - 1);
        let f = Font::new(&data);
        assert!(f.glyph(b'0').is_some());
        assert!(f.glyph(b'1').is_none());

        let f = Font::new(&[0, 0, 5]);
        assert_eq!(f.char_width(b'A'), 0);
        assert!(f.glyph(0).is_none());
    }
}
