//! Stitched precipitation mask.
//!
//! The mask covers a whole [`TileRange`]: `columns * tile_size` by
//! `rows * tile_size` cells, one per source pixel. Tiles that were not
//! fetched leave their region false.

use std::collections::BTreeMap;

use radar_common::{AlphaTile, TileAddress, TileRange};
use rayon::prelude::*;
use tracing::debug;

/// Dense row-major boolean raster; `true` marks rain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl Mask {
    /// An all-false mask.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width * height],
        }
    }

    /// Wrap existing row-major cells. Returns `None` on a size mismatch.
    pub fn from_cells(width: usize, height: usize, cells: Vec<bool>) -> Option<Self> {
        if cells.len() != width * height {
            return None;
        }
        Some(Self {
            width,
            height,
            cells,
        })
    }

    /// Stitch `tiles` into the mask for `range`.
    ///
    /// A pixel with alpha > 0 sets its cell. Tiles outside the range are
    /// ignored. Each row of tiles owns a disjoint band of mask rows, so bands
    /// are filled in parallel without locking.
    pub fn build(range: &TileRange, tile_size: u32, tiles: &[(TileAddress, AlphaTile)]) -> Self {
        let ts = tile_size as usize;
        let width = range.columns() as usize * ts;
        let height = range.rows() as usize * ts;
        let mut mask = Self::new(width, height);
        if width == 0 || height == 0 {
            return mask;
        }

        // Tiles grouped by their band (row offset inside the range).
        let mut bands: BTreeMap<usize, Vec<(usize, &AlphaTile)>> = BTreeMap::new();
        for (addr, tile) in tiles {
            if !range.contains(addr) {
                continue;
            }
            if tile.width != tile_size || tile.height != tile_size {
                debug!(
                    tile = %addr.path(),
                    width = tile.width,
                    height = tile.height,
                    tile_size,
                    "Tile size differs from configured size; stamping the overlap only"
                );
            }
            let (x_off, _) = range.pixel_offset(addr, tile_size);
            bands
                .entry((addr.y - range.y_min) as usize)
                .or_default()
                .push((x_off, tile));
        }

        mask.cells
            .par_chunks_mut(ts * width)
            .enumerate()
            .for_each(|(band, rows)| {
                let Some(band_tiles) = bands.get(&band) else {
                    return;
                };
                for &(x_off, tile) in band_tiles {
                    let tw = (tile.width as usize).min(ts);
                    let th = (tile.height as usize).min(ts);
                    for py in 0..th {
                        let src = &tile.row(py as u32)[..tw];
                        let dst = &mut rows[py * width + x_off..py * width + x_off + tw];
                        for (cell, &a) in dst.iter_mut().zip(src) {
                            if a > 0 {
                                *cell = true;
                            }
                        }
                    }
                }
            });

        debug!(
            width,
            height,
            tiles = tiles.len(),
            filled = mask.filled_count(),
            "Mask built"
        );
        mask
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell value; anything outside the mask reads as false.
    pub fn get(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return false;
        }
        self.cells[y as usize * self.width + x as usize]
    }

    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// True when no cell is set.
    pub fn is_clear(&self) -> bool {
        !self.cells.iter().any(|&c| c)
    }
}
