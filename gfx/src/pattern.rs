//! Whole-screen test patterns, for checking panel wiring.

use crate::fb::{Framebuffer, Mode};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TestPattern {
    /// Checkerboard with the top-left pixel dark.
    Alt0,
    /// Checkerboard with the top-left pixel lit.
    Alt1,
    /// Vertical stripes, lit on odd columns.
    Stripe0,
    /// Vertical stripes, lit on even columns.
    Stripe1,
}

/// Overwrites every pixel with `pattern`.
///
/// # Panics
///
/// In debug builds, if the grid width in pixels is not a power of two.
pub fn draw(fb: &mut Framebuffer, pattern: TestPattern) {
    let grid = fb.grid();
    let width = grid.width_px();
    debug_assert!(width.is_power_of_two());

    for i in 0..grid.total() * crate::fb::PANEL_BYTES * 8 {
        let x = (i & (width - 1)) as i32;
        let y = ((i & !(width - 1)) / width) as i32;
        let odd_col = i & 1 != 0;
        let even_row = i & width == 0;
        let value = match pattern {
            TestPattern::Alt0 => odd_col == even_row,
            TestPattern::Alt1 => odd_col != even_row,
            TestPattern::Stripe0 => odd_col,
            TestPattern::Stripe1 => !odd_col,
        };
        fb.write_pixel(x, y, Mode::Normal, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fb::PanelGrid;
    use crate::test_util::*;

    fn render(pattern: TestPattern) -> Vec<(i32, i32)> {
        let g = PanelGrid::new(2, 1);
        let cells = storage(g);
        let mut fb = Framebuffer::new(g, &cells);
        draw(&mut fb, pattern);
        lit(&fb)
    }

    #[test]
    fn checkerboards_are_complementary() {
        let a = render(TestPattern::Alt0);
        let b = render(TestPattern::Alt1);
        assert_eq!(a.len(), 64 * 16 / 2);
        assert_eq!(b.len(), 64 * 16 / 2);
        assert!(!a.contains(&(0, 0)));
        assert!(b.contains(&(0, 0)));
        for &(x, y) in &a {
            assert_eq!((x + y) % 2, 1);
            assert!(!b.contains(&(x, y)));
        }
    }

    #[test]
    fn stripes() {
        let s0 = render(TestPattern::Stripe0);
        assert!(s0.iter().all(|&(x, _)| x % 2 == 1));
        assert_eq!(s0.len(), 32 * 16);

        let s1 = render(TestPattern::Stripe1);
        assert!(s1.iter().all(|&(x, _)| x % 2 == 0));
        assert_eq!(s1.len(), 32 * 16);
    }
}
