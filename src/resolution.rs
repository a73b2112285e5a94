// SPDX-License-Identifier: GPL-3.0-only

//! Pixel resolutions and their display formatting

/// Width and height of a frame, both guaranteed `>= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    width: u32,
    height: u32,
}

impl Resolution {
    /// Build a resolution, clamping `0` to `1` in either dimension.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set_width(&mut self, width: u32) {
        self.width = width.max(1);
    }

    pub fn set_height(&mut self, height: u32) {
        self.height = height.max(1);
    }

    /// `width * height`. Widened to `u64` so a 4K-and-above frame never
    /// overflows when later multiplied by bytes-per-pixel.
    pub fn pixels_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

const SQRT_2: f64 = std::f64::consts::SQRT_2;
const A4_EPSILON: f64 = 0.001;

/// Greatest common divisor, used to reduce a resolution to a small
/// width:height fraction for display.
fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 { a } else { gcd(b, a % b) }
}

/// Render a resolution as `"W x H (aspect)"`.
///
/// `aspect` is a small reduced fraction `n/d` when both terms are `<= 30`
/// after reduction, otherwise a 3-decimal float. Two special cases are
/// recognized ahead of the generic formatting: a ratio within `0.001` of
/// `sqrt(2)` prints as `"A4"`, and its reciprocal (`1/sqrt(2)`) as
/// `"A4 Vertical"`.
pub fn to_string(resolution: Resolution) -> String {
    let width = resolution.width();
    let height = resolution.height();
    let ratio = width as f64 / height as f64;

    let aspect = if (ratio - SQRT_2).abs() < A4_EPSILON {
        "A4".to_string()
    } else if (ratio - 1.0 / SQRT_2).abs() < A4_EPSILON {
        "A4 Vertical".to_string()
    } else {
        let divisor = gcd(u64::from(width), u64::from(height)).max(1);
        let (n, d) = (u64::from(width) / divisor, u64::from(height) / divisor);
        if n <= 30 && d <= 30 {
            format!("{n}/{d}")
        } else {
            format!("{ratio:.3}")
        }
    };

    format!("{width} x {height} ({aspect})")
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", to_string(*self))
    }
}
