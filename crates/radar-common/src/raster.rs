//! Decoded tile rasters.

/// Alpha channel of a decoded tile, row-major. Alpha 0 means no precipitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaTile {
    pub width: u32,
    pub height: u32,
    pub alpha: Vec<u8>,
}

impl AlphaTile {
    pub fn new(width: u32, height: u32, alpha: Vec<u8>) -> Self {
        debug_assert_eq!(alpha.len(), width as usize * height as usize);
        Self {
            width,
            height,
            alpha,
        }
    }

    /// Alpha at (x, y), or 0 outside the image.
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.alpha[y as usize * self.width as usize + x as usize]
    }

    /// Alpha at a fractional position inside the tile, `fx`/`fy` in `[0, 1)`.
    /// The pixel index is clamped to the image, so 1.0 reads the last column.
    pub fn sample(&self, fx: f64, fy: f64) -> u8 {
        if self.width == 0 || self.height == 0 || !fx.is_finite() || !fy.is_finite() {
            return 0;
        }
        let px = ((fx * self.width as f64).floor().max(0.0) as u32).min(self.width - 1);
        let py = ((fy * self.height as f64).floor().max(0.0) as u32).min(self.height - 1);
        self.alpha_at(px, py)
    }

    /// One row of alpha values.
    pub fn row(&self, y: u32) -> &[u8] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.alpha[start..start + w]
    }

    pub fn is_transparent(&self) -> bool {
        self.alpha.iter().all(|&a| a == 0)
    }

    /// Number of pixels with any precipitation.
    pub fn wet_pixels(&self) -> usize {
        self.alpha.iter().filter(|&&a| a > 0).count()
    }
}
