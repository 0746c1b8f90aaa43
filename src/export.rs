// Export of the displayed plane as PNG, SVG or an A4 PDF page

use crate::error::{Error, Result};
use crate::style::StyleConfig;
use crate::vector;
use image::{ImageEncoder, RgbaImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

const MM_TO_PT: f32 = 72.0 / 25.4;
const A4_WIDTH_MM: f32 = 210.0;
const A4_HEIGHT_MM: f32 = 297.0;
/// Printed edge length of the code on the page
const PRINT_SIZE_MM: f32 = 100.0;
/// Distance from the top of the page to the top of the code
const PRINT_TOP_MM: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ExportFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
    #[serde(rename = "pdf")]
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Svg => "svg",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "svg" => Ok(ExportFormat::Svg),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(format!("unknown format '{}' (expected png, svg or pdf)", other)),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A file ready to be written out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Export `plane` in `format` under the default `qrcode.<ext>` name.
///
/// `None` means nothing has been generated yet.
pub fn export(
    plane: Option<&RgbaImage>,
    style: &StyleConfig,
    format: ExportFormat,
) -> Result<Artifact> {
    let plane = plane.ok_or_else(|| Error::Validation("Generate a QR code first".to_string()))?;
    let bytes = match format {
        ExportFormat::Png => to_png(plane)?,
        ExportFormat::Svg => vector::to_svg(plane, style).into_bytes(),
        ExportFormat::Pdf => to_pdf(plane)?,
    };
    Ok(Artifact {
        file_name: format!("qrcode.{}", format.extension()),
        bytes,
    })
}

/// Encode the plane as PNG bytes
pub fn to_png(plane: &RgbaImage) -> Result<Vec<u8>> {
    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(plane.as_raw(), plane.width(), plane.height(), image::ColorType::Rgba8)
            .map_err(|e| Error::Export(format!("Failed to encode PNG: {}", e)))?;
    }
    Ok(png_bytes)
}

/// Place the plane on a portrait A4 page, 100mm square, centred
/// horizontally and 50mm from the top edge.
pub fn to_pdf(plane: &RgbaImage) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let rgb: Vec<u8> = plane.pixels().flat_map(|p| [p[0], p[1], p[2]]).collect();
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => plane.width() as i64,
            "Height" => plane.height() as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8_i64,
        },
        rgb,
    ));

    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! { "Im0" => image_id },
    });

    // PDF space has its origin at the bottom-left corner
    let size = PRINT_SIZE_MM * MM_TO_PT;
    let x = (A4_WIDTH_MM - PRINT_SIZE_MM) / 2.0 * MM_TO_PT;
    let y = (A4_HEIGHT_MM - PRINT_TOP_MM - PRINT_SIZE_MM) * MM_TO_PT;
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    size.into(),
                    0_i64.into(),
                    0_i64.into(),
                    size.into(),
                    x.into(),
                    y.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content
        .encode()
        .map_err(|e| Error::Export(format!("Failed to encode page content: {}", e)))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1_i64,
        "MediaBox" => vec![
            0_i64.into(),
            0_i64.into(),
            (A4_WIDTH_MM * MM_TO_PT).into(),
            (A4_HEIGHT_MM * MM_TO_PT).into(),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| Error::Export(format!("Failed to write PDF: {}", e)))?;
    Ok(bytes)
}
