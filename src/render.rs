// Renderer adapter: payload string -> raster plane

use crate::color::Color;
use crate::error::{Error, Result};
use crate::style::{check_render_size, StyleConfig};
use image::RgbaImage;
use qrcode::{EcLevel, QrCode};

/// Error-correction level used for every symbol
pub const ERROR_CORRECTION: EcLevel = EcLevel::H;

/// Render `payload` as a square plane of `style.render_size` pixels
pub fn render(payload: &str, style: &StyleConfig) -> Result<RgbaImage> {
    style.validate()?;
    render_symbol(payload, style.render_size, style.foreground, style.background)
}

/// Render a symbol onto a `size`×`size` canvas.
///
/// Each module is `floor(size / modules)` pixels wide and the symbol is
/// centred, leaving any remainder as background margin. No extra quiet
/// zone is added.
pub fn render_symbol(
    payload: &str,
    size: u32,
    foreground: Color,
    background: Color,
) -> Result<RgbaImage> {
    check_render_size(size)?;
    let code = QrCode::with_error_correction_level(payload.as_bytes(), ERROR_CORRECTION)
        .map_err(|e| Error::Capacity(e.to_string()))?;

    let modules = code.width() as u32;
    let module_px = size / modules;
    if module_px == 0 {
        return Err(Error::Capacity(format!(
            "symbol needs {} modules but the canvas is only {}px wide",
            modules, size
        )));
    }
    let offset = (size - module_px * modules) / 2;

    log::debug!(
        "rendering {} bytes as {}x{} modules at {}px/module",
        payload.len(),
        modules,
        modules,
        module_px
    );

    let mut plane = RgbaImage::from_pixel(size, size, background.to_rgba());
    let ink = foreground.to_rgba();

    for (idx, color) in code.to_colors().into_iter().enumerate() {
        if color != qrcode::Color::Dark {
            continue;
        }
        let mx = idx as u32 % modules;
        let my = idx as u32 / modules;
        let px = offset + mx * module_px;
        let py = offset + my * module_px;
        for dy in 0..module_px {
            for dx in 0..module_px {
                plane.put_pixel(px + dx, py + dy, ink);
            }
        }
    }

    Ok(plane)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_render_dimensions() {
        let plane = render("https://example.com", &StyleConfig::default()).unwrap();
        assert_eq!(plane.dimensions(), (400, 400));
    }

    #[test]
    fn test_render_uses_style_colors() {
        let style = StyleConfig {
            render_size: 210,
            foreground: Color::new(10, 20, 30),
            background: Color::new(250, 240, 230),
            ..StyleConfig::default()
        };
        let plane = render("hello", &style).unwrap();
        // "hello" at level H is a 21-module symbol: 10px per module, no margin
        assert_eq!(*plane.get_pixel(0, 0), Rgba([10, 20, 30, 255]));
        // Separator row right of the top-left finder pattern is light
        assert_eq!(*plane.get_pixel(75, 5), Rgba([250, 240, 230, 255]));
    }

    #[test]
    fn test_render_centres_symbol() {
        let plane = render_symbol("hello", 45, Color::BLACK, Color::WHITE).unwrap();
        // 21 modules at 2px leave a 3px margin split as 1px before the symbol
        assert_eq!(*plane.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*plane.get_pixel(1, 1), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_render_capacity_exceeded() {
        let payload = "x".repeat(4000);
        let result = render(&payload, &StyleConfig::default());
        assert!(matches!(result, Err(Error::Capacity(_))));
    }

    #[test]
    fn test_render_rejects_oversized_canvas() {
        let result = render_symbol("hello", 40_000, Color::BLACK, Color::WHITE);
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_render_canvas_too_small() {
        let result = render_symbol("hello", 20, Color::BLACK, Color::WHITE);
        assert!(matches!(result, Err(Error::Capacity(_))));
    }
}
