//! Lines, boxes and circles.
//!
//! Everything here writes through `Framebuffer::write_pixel` with a value of
//! `true`, so clipping is per pixel and the combining mode decides what "draw"
//! means.

use core::convert::TryFrom;

use crate::fb::{Framebuffer, Mode};

/// Draws a line from `(x0, y0)` to `(x1, y1)` inclusive, using Bresenham's
/// algorithm with doubled error terms. The first endpoint is always plotted,
/// so a zero-length line sets one pixel.
///
/// Any `i32` endpoints are accepted. Only the steps that land on the grid's
/// extent along the major axis are visited.
pub fn line(fb: &mut Framebuffer, x0: i32, y0: i32, x1: i32, y1: i32, mode: Mode) {
    let grid = fb.grid();
    let (x0, y0) = (i64::from(x0), i64::from(y0));
    let (dx, dy) = (i64::from(x1) - x0, i64::from(y1) - y0);

    if dx.abs() > dy.abs() {
        walk(x0, dx, y0, dy, grid.width_px() as i64, |x, y| {
            plot(fb, x, y, mode)
        });
    } else {
        walk(y0, dy, x0, dx, grid.height_px() as i64, |y, x| {
            plot(fb, x, y, mode)
        });
    }
}

/// Bresenham walk along the major axis, restricted to major coordinates in
/// `0..extent`. `visit` gets `(major, minor)` for each step in order.
///
/// The walk starts at the first visible step directly: after `j` major steps
/// the minor axis has advanced `(n + 2jm) / 2n` times, and the error term
/// follows from that count.
fn walk(
    major0: i64,
    d_major: i64,
    minor0: i64,
    d_minor: i64,
    extent: i64,
    mut visit: impl FnMut(i64, i64),
) {
    let step_major = if d_major < 0 { -1 } else { 1 };
    let step_minor = if d_minor < 0 { -1 } else { 1 };
    let (n, m) = (d_major.abs(), d_minor.abs());

    let (first, last) = if step_major > 0 {
        ((-major0).max(0), n.min(extent - 1 - major0))
    } else {
        ((major0 - (extent - 1)).max(0), n.min(major0))
    };
    if first > last {
        return;
    }

    let (d, e) = (2 * n, 2 * m);
    let taken = if n == 0 {
        0
    } else {
        (i128::from(n) + i128::from(first) * i128::from(e)) / i128::from(d)
    };
    // Always within [e - d, e).
    let mut error = (i128::from(e - n) + i128::from(first) * i128::from(e)
        - i128::from(d) * taken) as i64;
    let mut minor = minor0 + step_minor * taken as i64;

    visit(major0 + step_major * first, minor);
    for j in first + 1..=last {
        if error >= 0 {
            minor += step_minor;
            error -= d;
        }
        error += e;
        visit(major0 + step_major * j, minor);
    }
}

fn plot(fb: &mut Framebuffer, x: i64, y: i64, mode: Mode) {
    if let (Ok(x), Ok(y)) = (i32::try_from(x), i32::try_from(y)) {
        fb.write_pixel(x, y, mode, true);
    }
}

/// Outlines the rectangle with corners `(x0, y0)` and `(x1, y1)`.
pub fn rect(fb: &mut Framebuffer, x0: i32, y0: i32, x1: i32, y1: i32, mode: Mode) {
    line(fb, x0, y0, x1, y0, mode);
    line(fb, x1, y0, x1, y1, mode);
    line(fb, x1, y1, x0, y1, mode);
    line(fb, x0, y1, x0, y0, mode);
}

/// Fills the rectangle with corners `(x0, y0)` and `(x1, y1)` one column at a
/// time. Nothing is drawn if `x1 < x0`.
pub fn filled_rect(
    fb: &mut Framebuffer,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    mode: Mode,
) {
    let right = x1.min(fb.grid().width_px() as i32 - 1);
    for x in x0.max(0)..=right {
        line(fb, x, y0, x, y1, mode);
    }
}

/// Draws a circle of radius `r` around `(cx, cy)` with the midpoint algorithm.
/// A negative radius draws nothing.
///
/// Rather than stepping the whole octant, this visits only the octant
/// positions whose images can land on the grid and recovers the midpoint
/// algorithm's `y` for each one in closed form. Huge radii cost no more than
/// small ones.
pub fn circle(fb: &mut Framebuffer, cx: i32, cy: i32, r: i32, mode: Mode) {
    if r < 0 {
        return;
    }
    let (cx, cy, r) = (i64::from(cx), i64::from(cy), i64::from(r));
    if r == 0 {
        circle_points(fb, cx, cy, 0, 0, mode);
        return;
    }

    // The decision variable is always x'^2 + y^2 - y - r^2 + bias, where x'
    // is the next x; `bias` comes from rounding the initial (5 - 4r) / 4.
    let bias = (5 - 4 * r) / 4 - 1 + r;
    let octant_y = |x: i64| -> i64 {
        let t = r * r - bias - x * x;
        if t < 1 {
            0
        } else {
            ((isqrt((4 * t - 3) as u64) + 1) / 2) as i64
        }
    };

    let grid = fb.grid();
    let (w, h) = (grid.width_px() as i64, grid.height_px() as i64);
    // Ranges of x that put an image on the grid: horizontally for the
    // (+-x, +-y) images, vertically for the (+-y, +-x) ones.
    let mut windows = [
        (-cx, w - 1 - cx),
        (cx - (w - 1), cx),
        (-cy, h - 1 - cy),
        (cy - (h - 1), cy),
    ];
    for win in windows.iter_mut() {
        *win = (win.0.max(0), win.1.min(r));
    }
    windows.sort_unstable();

    let mut next = 0;
    for &(lo, hi) in &windows {
        for x in lo.max(next)..=hi {
            // The octant ends once x has caught up with y.
            if x > 0 && x - 1 >= octant_y(x - 1) {
                return;
            }
            circle_points(fb, cx, cy, x, octant_y(x), mode);
        }
        next = next.max(hi + 1);
    }
}

/// Plots the symmetric images of octant point `(x, y)`. On the axes and on the
/// diagonal only four of the eight images are distinct.
fn circle_points(fb: &mut Framebuffer, cx: i64, cy: i64, x: i64, y: i64, mode: Mode) {
    let images = [
        (x, y),
        (-x, y),
        (x, -y),
        (-x, -y),
        (y, x),
        (-y, x),
        (y, -x),
        (-y, -x),
    ];
    let distinct: &[usize] = if x == 0 {
        &[0, 2, 4, 5]
    } else if x == y {
        &[0, 1, 2, 3]
    } else if x < y {
        &[0, 1, 2, 3, 4, 5, 6, 7]
    } else {
        &[]
    };
    for &i in distinct {
        let (px, py) = images[i];
        plot(fb, cx + px, cy + py, mode);
    }
}

/// Integer square root, rounded down.
fn isqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = n / 2 + (n & 1);
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}
