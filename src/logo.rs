// Logo compositor: centre a user image over the symbol

use crate::color::Color;
use crate::error::{Error, Result};
use crate::style::LogoImage;
use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Logo edge length as a fraction of the canvas width
const LOGO_FRACTION: f64 = 0.2;
/// Quiet zone margin around the logo, in pixels
const QUIET_MARGIN: f64 = 10.0;

/// Pixel placement of a logo on a canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogoPlacement {
    pub logo_size: f64,
    pub x: f64,
    pub y: f64,
}

impl LogoPlacement {
    pub fn for_canvas(width: u32, height: u32) -> Self {
        let logo_size = width as f64 * LOGO_FRACTION;
        Self {
            logo_size,
            x: (width as f64 - logo_size) / 2.0,
            y: (height as f64 - logo_size) / 2.0,
        }
    }
}

/// Composite `logo` at the centre of `plane`.
///
/// The logo is decoded first; on failure the plane is left untouched and
/// an asset error is returned. On success a background-colored quiet zone
/// of `logo_size + 20` pixels is painted, then the logo scaled to
/// `logo_size` is alpha-blended on top.
pub fn overlay(plane: &mut RgbaImage, logo: &LogoImage, background: Color) -> Result<()> {
    let decoded = image::load_from_memory(logo.bytes())
        .map_err(|e| Error::Asset(format!("logo failed to load: {}", e)))?
        .to_rgba8();

    let (width, height) = plane.dimensions();
    let placement = LogoPlacement::for_canvas(width, height);
    let side = placement.logo_size.round() as u32;
    if side == 0 {
        return Err(Error::Asset(format!("canvas of {}px is too small for a logo", width)));
    }

    fill_rect(
        plane,
        placement.x - QUIET_MARGIN,
        placement.y - QUIET_MARGIN,
        placement.logo_size + 2.0 * QUIET_MARGIN,
        background,
    );

    let scaled = imageops::resize(&decoded, side, side, FilterType::Triangle);
    imageops::overlay(
        plane,
        &scaled,
        placement.x.round() as i64,
        placement.y.round() as i64,
    );

    log::debug!("composited {}px logo at ({:.1}, {:.1})", side, placement.x, placement.y);
    Ok(())
}

/// Fill a square, clipped to the plane
fn fill_rect(plane: &mut RgbaImage, x: f64, y: f64, side: f64, color: Color) {
    let (width, height) = plane.dimensions();
    let x0 = x.round().max(0.0) as u32;
    let y0 = y.round().max(0.0) as u32;
    let x1 = ((x + side).round().max(0.0) as u32).min(width);
    let y1 = ((y + side).round().max(0.0) as u32).min(height);
    let fill = color.to_rgba();
    for py in y0..y1 {
        for px in x0..x1 {
            plane.put_pixel(px, py, fill);
        }
    }
}
