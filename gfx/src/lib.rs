//! Monochrome graphics for tiled 32x16 LED dot-matrix panels.
//!
//! This crate is architecture-independent and builds with std under test, on
//! the host. It knows nothing about how pixels reach the panels: it maintains
//! the bit-packed framebuffer in the byte order the panels' shift registers
//! expect, and the scan-out driver reads it through a `FrameReader`.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

mod display;
mod fb;
pub mod font;
mod marquee;
mod pattern;
mod raster;
mod text;

pub use display::Display;
pub use fb::{
    FrameReader, Framebuffer, Mode, PanelGrid, DARK, PANEL_BYTES,
    PANEL_HEIGHT, PANEL_WIDTH, ROW_GROUPS,
};
pub use font::{Font, Glyph};
pub use marquee::MARQUEE_CAPACITY;
pub use pattern::TestPattern;
