// Vector exporter: rendered plane -> SVG document

use crate::classify::classify_for_vector;
use crate::style::StyleConfig;
use image::RgbaImage;
use std::fmt::Write;

/// Re-walk the plane and emit one `<rect>` per ink cell after a
/// full-canvas background rect.
///
/// Classification is redone here with the plain `red < 128` threshold
/// (see [`classify_for_vector`]); the grid used for reshaping is not reused.
pub fn to_svg(plane: &RgbaImage, style: &StyleConfig) -> String {
    let size = plane.width();
    let grid = classify_for_vector(plane);
    let cell = grid.cell_size();

    let mut svg = String::with_capacity(128 + grid.ink_count() * 64);
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{0}\" height=\"{0}\" \
         viewBox=\"0 0 {0} {0}\">",
        size
    );
    let _ = write!(
        svg,
        "<rect width=\"{0}\" height=\"{0}\" fill=\"{1}\"/>",
        size, style.background
    );
    for (x, y) in grid.ink_origins() {
        let _ = write!(
            svg,
            "<rect x=\"{}\" y=\"{}\" width=\"{2}\" height=\"{2}\" fill=\"{3}\"/>",
            x, y, cell, style.foreground
        );
    }
    svg.push_str("</svg>");
    svg
}
