//! Synthetic radar tile generators.
//!
//! Tiles are encoded as real PNGs so the decode path is exercised exactly as
//! with provider tiles. Only the alpha channel carries meaning.

use std::io::Cursor;

use image::{ImageOutputFormat, Rgba, RgbaImage};
use radar_common::TILE_SIZE;

/// Colour used for wet pixels (the RGB part is irrelevant to extraction).
const RAIN_RGB: [u8; 3] = [0, 140, 255];

/// Encode a `size`×`size` tile whose alpha comes from `alpha(x, y)`.
pub fn tile_png_with<F>(size: u32, alpha: F) -> Vec<u8>
where
    F: Fn(u32, u32) -> u8,
{
    let img = RgbaImage::from_fn(size, size, |x, y| {
        let a = alpha(x, y);
        Rgba([RAIN_RGB[0], RAIN_RGB[1], RAIN_RGB[2], a])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageOutputFormat::Png)
        .expect("in-memory PNG encoding");
    out.into_inner()
}

/// A tile with no precipitation anywhere.
pub fn transparent_tile_png() -> Vec<u8> {
    tile_png_with(TILE_SIZE, |_, _| 0)
}

/// A tile that is wet everywhere.
pub fn opaque_tile_png() -> Vec<u8> {
    tile_png_with(TILE_SIZE, |_, _| 255)
}

/// A tile wet inside the half-open pixel rectangle `[x0, x1) × [y0, y1)`.
pub fn rect_tile_png(x0: u32, y0: u32, x1: u32, y1: u32) -> Vec<u8> {
    tile_png_with(TILE_SIZE, |x, y| {
        if x >= x0 && x < x1 && y >= y0 && y < y1 {
            200
        } else {
            0
        }
    })
}

/// Row-major boolean grid with the half-open rectangle set, for feeding the
/// vector stage directly.
pub fn rect_mask_cells(width: usize, height: usize, x0: usize, y0: usize, x1: usize, y1: usize) -> Vec<bool> {
    let mut cells = vec![false; width * height];
    for y in y0..y1.min(height) {
        for x in x0..x1.min(width) {
            cells[y * width + x] = true;
        }
    }
    cells
}
