// Pixel classifier: rendered plane -> ink/background module grid

use crate::color::Color;
use image::{Rgba, RgbaImage};

/// Assumed module count across the canvas. Accurate for small payloads
/// (version 4 symbols are 33 modules wide); larger symbols are sampled
/// with cells that no longer line up with their modules.
pub const MODULE_ESTIMATE: u32 = 33;

/// Cell edge length in pixels for a canvas of `width` pixels
pub fn cell_size(width: u32) -> u32 {
    width / MODULE_ESTIMATE
}

/// Ink/background matrix sampled from a plane. Cells start at pixel
/// offsets `0, cell, 2*cell, ...` below the plane's width and height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleGrid {
    cell_size: u32,
    columns: u32,
    rows: u32,
    cells: Vec<bool>,
}

impl ModuleGrid {
    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn is_ink(&self, column: u32, row: u32) -> bool {
        column < self.columns
            && row < self.rows
            && self.cells[(row * self.columns + column) as usize]
    }

    pub fn ink_count(&self) -> usize {
        self.cells.iter().filter(|&&ink| ink).count()
    }

    /// Top-left pixel coordinates of every ink cell, row-major
    pub fn ink_origins(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let columns = self.columns;
        let cell = self.cell_size;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &ink)| ink)
            .map(move |(idx, _)| {
                let idx = idx as u32;
                ((idx % columns) * cell, (idx / columns) * cell)
            })
    }
}

/// Classify for raster reshaping.
///
/// A cell is ink when its top-left pixel has a red channel of 0, or below
/// 128 while the foreground is not pure white.
pub fn classify(plane: &RgbaImage, foreground: Color) -> ModuleGrid {
    let white_foreground = foreground == Color::WHITE;
    sample_grid(plane, |px| px[0] == 0 || (px[0] < 128 && !white_foreground))
}

/// Classify for vector export: red channel below 128, with no
/// white-foreground exception.
pub fn classify_for_vector(plane: &RgbaImage) -> ModuleGrid {
    sample_grid(plane, |px| px[0] < 128)
}

fn sample_grid<F>(plane: &RgbaImage, is_ink: F) -> ModuleGrid
where
    F: Fn(&Rgba<u8>) -> bool,
{
    let (width, height) = plane.dimensions();
    let cell = cell_size(width);
    if cell == 0 {
        return ModuleGrid {
            cell_size: 0,
            columns: 0,
            rows: 0,
            cells: Vec::new(),
        };
    }

    let columns = width.div_ceil(cell);
    let rows = height.div_ceil(cell);
    let mut cells = Vec::with_capacity((columns * rows) as usize);
    for row in 0..rows {
        for column in 0..columns {
            // One sample per cell, at its top-left corner
            cells.push(is_ink(plane.get_pixel(column * cell, row * cell)));
        }
    }

    ModuleGrid {
        cell_size: cell,
        columns,
        rows,
        cells,
    }
}
