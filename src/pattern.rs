// Pattern synthesizer: redraw ink cells as dots or rounded squares

use crate::classify::{classify, ModuleGrid};
use crate::color::Color;
use crate::error::{Error, Result};
use crate::style::ModulePattern;
use image::{Rgba, RgbaImage};
use plotters::prelude::*;
use plotters::style::Color as _;

/// Circle radius as a fraction of the cell
const DOT_RADIUS: f64 = 0.4;
/// Corner radius of rounded modules as a fraction of the cell
const CORNER_RADIUS: f64 = 0.3;
/// Line segments per quadratic corner when flattening rounded modules
const CORNER_SEGMENTS: usize = 6;

/// Reshape the ink cells of `plane` into `pattern`.
///
/// `Square` returns an identical copy. Other patterns classify the plane,
/// then draw onto a fresh background-filled canvas, so the returned plane
/// replaces the input wholesale and a half-drawn frame is never visible.
pub fn reshape(
    plane: &RgbaImage,
    pattern: ModulePattern,
    foreground: Color,
    background: Color,
) -> Result<RgbaImage> {
    let shape = match ModuleShape::for_pattern(pattern) {
        Some(shape) => shape,
        None => return Ok(plane.clone()),
    };

    let grid = classify(plane, foreground);
    log::debug!(
        "reshaping {} ink cells of {}px as {}",
        grid.ink_count(),
        grid.cell_size(),
        pattern
    );

    let mut canvas = ModuleCanvas::new(plane.width(), plane.height());
    canvas.draw_cells(&grid, shape, foreground, background)?;
    Ok(canvas.into_plane())
}

/// Shape drawn in place of each ink cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModuleShape {
    Dot,
    Rounded,
}

impl ModuleShape {
    /// `None` for patterns that keep the rendered squares
    fn for_pattern(pattern: ModulePattern) -> Option<Self> {
        match pattern {
            ModulePattern::Square => None,
            ModulePattern::Dots => Some(ModuleShape::Dot),
            ModulePattern::Rounded => Some(ModuleShape::Rounded),
        }
    }
}

/// RGB drawing surface backed by plotters' bitmap backend
struct ModuleCanvas {
    buffer: Vec<u8>,
    width: u32,
    height: u32,
}

impl ModuleCanvas {
    fn new(width: u32, height: u32) -> Self {
        Self {
            buffer: vec![0u8; width as usize * height as usize * 3],
            width,
            height,
        }
    }

    fn draw_cells(
        &mut self,
        grid: &ModuleGrid,
        shape: ModuleShape,
        foreground: Color,
        background: Color,
    ) -> Result<()> {
        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();
        root.fill(&background.to_rgb()).map_err(draw_error)?;

        let ink = foreground.to_rgb().filled();
        let cell = grid.cell_size() as f64;

        for (x, y) in grid.ink_origins() {
            let (x, y) = (x as f64, y as f64);
            match shape {
                ModuleShape::Dot => {
                    let centre = (
                        (x + cell / 2.0).round() as i32,
                        (y + cell / 2.0).round() as i32,
                    );
                    let radius = (cell * DOT_RADIUS).round() as i32;
                    root.draw(&Circle::new(centre, radius, ink)).map_err(draw_error)?;
                }
                ModuleShape::Rounded => {
                    let inset = cell - 2.0;
                    let outline =
                        rounded_rect_outline(x + 1.0, y + 1.0, inset, inset, cell * CORNER_RADIUS);
                    if outline.is_empty() {
                        continue;
                    }
                    root.draw(&Polygon::new(outline, ink)).map_err(draw_error)?;
                }
            }
        }

        root.present().map_err(draw_error)?;
        Ok(())
    }

    fn into_plane(self) -> RgbaImage {
        let width = self.width as usize;
        let buffer = self.buffer;
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let i = (y as usize * width + x as usize) * 3;
            Rgba([buffer[i], buffer[i + 1], buffer[i + 2], 255])
        })
    }
}

fn draw_error<E: std::fmt::Display>(e: E) -> Error {
    Error::Render(e.to_string())
}

/// Outline of a rounded rectangle whose corners are quadratic curves
/// controlled by the rectangle's own corner points.
fn rounded_rect_outline(x: f64, y: f64, width: f64, height: f64, radius: f64) -> Vec<(i32, i32)> {
    if width <= 0.0 || height <= 0.0 {
        return Vec::new();
    }
    let r = radius.min(width / 2.0).min(height / 2.0);
    let (right, bottom) = (x + width, y + height);

    // (start, control, end) for each corner, clockwise from top-right
    let corners = [
        ((right - r, y), (right, y), (right, y + r)),
        ((right, bottom - r), (right, bottom), (right - r, bottom)),
        ((x + r, bottom), (x, bottom), (x, bottom - r)),
        ((x, y + r), (x, y), (x + r, y)),
    ];

    let mut points = Vec::with_capacity(corners.len() * (CORNER_SEGMENTS + 1));
    for (start, control, end) in corners {
        for step in 0..=CORNER_SEGMENTS {
            let t = step as f64 / CORNER_SEGMENTS as f64;
            let (px, py) = quadratic_point(start, control, end, t);
            let point = (px.round() as i32, py.round() as i32);
            if points.last() != Some(&point) {
                points.push(point);
            }
        }
    }
    points
}

fn quadratic_point(p0: (f64, f64), p1: (f64, f64), p2: (f64, f64), t: f64) -> (f64, f64) {
    let u = 1.0 - t;
    (
        u * u * p0.0 + 2.0 * u * t * p1.0 + t * t * p2.0,
        u * u * p0.1 + 2.0 * u * t * p1.1 + t * t * p2.1,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render;
    use crate::style::StyleConfig;

    const FG: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const BG: Rgba<u8> = Rgba([255, 255, 255, 255]);

    /// 330px plane (10px cells) with ink cells at the given grid positions
    fn plane_with_cells(cells: &[(u32, u32)]) -> RgbaImage {
        let mut plane = RgbaImage::from_pixel(330, 330, BG);
        for &(cx, cy) in cells {
            for dy in 0..10 {
                for dx in 0..10 {
                    plane.put_pixel(cx * 10 + dx, cy * 10 + dy, FG);
                }
            }
        }
        plane
    }

    #[test]
    fn test_square_is_identity() {
        let plane = render("https://example.com", &StyleConfig::default()).unwrap();
        let reshaped = reshape(&plane, ModulePattern::Square, Color::BLACK, Color::WHITE).unwrap();
        assert_eq!(reshaped, plane);
    }

    #[test]
    fn test_dots_keep_centres_and_clear_corners() {
        let plane = plane_with_cells(&[(3, 4)]);
        let dots = reshape(&plane, ModulePattern::Dots, Color::BLACK, Color::WHITE).unwrap();
        assert_eq!(dots.dimensions(), plane.dimensions());
        assert_eq!(*dots.get_pixel(35, 45), FG);
        assert_eq!(*dots.get_pixel(30, 40), BG);
        assert_eq!(*dots.get_pixel(39, 49), BG);
        // Untouched background cell
        assert_eq!(*dots.get_pixel(5, 5), BG);
    }

    #[test]
    fn test_rounded_insets_by_one_pixel() {
        let plane = plane_with_cells(&[(1, 1)]);
        let rounded = reshape(&plane, ModulePattern::Rounded, Color::BLACK, Color::WHITE).unwrap();
        assert_eq!(*rounded.get_pixel(15, 15), FG);
        assert_eq!(*rounded.get_pixel(10, 15), BG);
        assert_eq!(*rounded.get_pixel(15, 10), BG);
        // Corners are cut by the 3px radius
        assert_eq!(*rounded.get_pixel(11, 11), BG);
    }

    #[test]
    fn test_reshape_uses_style_colors() {
        let plane = plane_with_cells(&[(0, 0)]);
        let fg = Color::new(0, 40, 200);
        let bg = Color::new(240, 240, 200);
        let dots = reshape(&plane, ModulePattern::Dots, fg, bg).unwrap();
        assert_eq!(*dots.get_pixel(5, 5), fg.to_rgba());
        assert_eq!(*dots.get_pixel(200, 200), bg.to_rgba());
    }

    #[test]
    fn test_only_reshaping_patterns_have_a_shape() {
        assert_eq!(ModuleShape::for_pattern(ModulePattern::Square), None);
        assert_eq!(ModuleShape::for_pattern(ModulePattern::Dots), Some(ModuleShape::Dot));
        assert_eq!(
            ModuleShape::for_pattern(ModulePattern::Rounded),
            Some(ModuleShape::Rounded)
        );
    }

    #[test]
    fn test_rounded_outline_is_closed_ring() {
        let outline = rounded_rect_outline(1.0, 1.0, 10.0, 10.0, 3.0);
        assert!(outline.len() >= 8);
        assert!(outline.iter().all(|&(x, y)| (1..=11).contains(&x) && (1..=11).contains(&y)));
        assert!(rounded_rect_outline(1.0, 1.0, 0.0, 0.0, 0.3).is_empty());
    }
}
