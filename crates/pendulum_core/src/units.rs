use anyhow::{bail, Result};

/// Linear mapping between model metres and canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConversions {
    pixels_per_metre: f64,
}

impl UnitConversions {
    /// Fits `view_width` metres across `canvas_width` pixels.
    pub fn new(view_width: f64, canvas_width: f64) -> Result<Self> {
        if !(view_width > 0.0) || !view_width.is_finite() {
            bail!("View width must be positive (got {}).", view_width);
        }
        if !(canvas_width > 0.0) || !canvas_width.is_finite() {
            bail!("Canvas width must be positive (got {}).", canvas_width);
        }
        Ok(Self {
            pixels_per_metre: canvas_width / view_width,
        })
    }

    pub fn pixels_per_metre(&self) -> f64 {
        self.pixels_per_metre
    }

    pub fn px_to_m(&self, px: f64) -> f64 {
        px / self.pixels_per_metre
    }

    pub fn m_to_px(&self, m: f64) -> f64 {
        m * self.pixels_per_metre
    }

    pub fn point_px_to_m(&self, [x, y]: [f64; 2]) -> [f64; 2] {
        [self.px_to_m(x), self.px_to_m(y)]
    }

    pub fn point_m_to_px(&self, [x, y]: [f64; 2]) -> [f64; 2] {
        [self.m_to_px(x), self.m_to_px(y)]
    }
}
