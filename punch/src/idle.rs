//! Attract-mode animation shown between rounds.

use gfx::{Display, Mode};

/// A coordinate that moves one step per frame, reversing at the ends of
/// `lo..=hi`.
#[derive(Clone, Debug)]
pub struct Bounce {
    pos: i32,
    dir: i32,
    lo: i32,
    hi: i32,
}

impl Bounce {
    pub const fn new(pos: i32, dir: i32, lo: i32, hi: i32) -> Self {
        Bounce { pos, dir, lo, hi }
    }

    pub fn pos(&self) -> i32 {
        self.pos
    }

    /// Returns the current position, then advances.
    pub fn next(&mut self) -> i32 {
        let here = self.pos;
        self.pos += self.dir;
        if self.pos >= self.hi {
            self.dir = -1;
        }
        if self.pos <= self.lo {
            self.dir = 1;
        }
        here
    }
}

/// `PUNCH` over `GAME`, each sliding back and forth.
#[derive(Clone, Debug)]
pub struct IdleAnimation {
    punch: Bounce,
    game: Bounce,
}

impl Default for IdleAnimation {
    fn default() -> Self {
        IdleAnimation {
            punch: Bounce::new(0, 1, 0, 3),
            game: Bounce::new(10, -1, 0, 9),
        }
    }
}

impl IdleAnimation {
    /// Draws one frame in the selected font, replacing the screen contents.
    pub fn frame(&mut self, display: &mut Display) {
        display.clear(true);
        display.draw_string(self.punch.next(), 0, b"PUNCH", Mode::Normal);
        display.draw_string(self.game.next(), 8, b"GAME", Mode::Normal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::AtomicU8;
    use gfx::PanelGrid;

    #[test]
    fn bounce_path() {
        let mut b = Bounce::new(0, 1, 0, 3);
        let path: Vec<i32> = (0..9).map(|_| b.next()).collect();
        assert_eq!(path, [0, 1, 2, 3, 2, 1, 0, 1, 2]);

        let mut b = Bounce::new(10, -1, 0, 9);
        let path: Vec<i32> = (0..13).map(|_| b.next()).collect();
        assert_eq!(path, [10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0, 1, 2]);
    }

    #[test]
    fn frames_move_the_words() {
        let grid = PanelGrid::new(1, 1);
        let cells: Vec<AtomicU8> = (0..grid.bytes()).map(|_| AtomicU8::new(0)).collect();
        let mut display = Display::new(grid, &cells);
        display.select_font(font_dmd::SYSTEM_5X7);
        let mut idle = IdleAnimation::default();

        idle.frame(&mut display);
        // 'P' has a full-height left column at x = 0.
        assert_eq!(display.pixel(0, 0), Some(true));
        assert_eq!(display.pixel(0, 6), Some(true));

        idle.frame(&mut display);
        // Now drawn from x = 1; the old column was cleared.
        assert_eq!(display.pixel(0, 6), Some(false));
        assert_eq!(display.pixel(1, 6), Some(true));
    }
}
