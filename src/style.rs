// Style configuration shared by rendering, reshaping and history

use crate::color::Color;
use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_RENDER_SIZE: u32 = 400;
/// Largest accepted canvas edge length in pixels
pub const MAX_RENDER_SIZE: u32 = 4096;

/// Check a canvas edge length against `1..=MAX_RENDER_SIZE`
pub fn check_render_size(size: u32) -> Result<()> {
    if size == 0 {
        return Err(Error::Validation("Size must be a positive number of pixels".to_string()));
    }
    if size > MAX_RENDER_SIZE {
        return Err(Error::Validation(format!(
            "Size must be at most {} pixels, got {}",
            MAX_RENDER_SIZE, size
        )));
    }
    Ok(())
}

/// How ink modules are redrawn after rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModulePattern {
    #[default]
    Square,
    Dots,
    Rounded,
}

impl FromStr for ModulePattern {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "square" => Ok(ModulePattern::Square),
            "dots" => Ok(ModulePattern::Dots),
            "rounded" => Ok(ModulePattern::Rounded),
            other => Err(format!("unknown pattern '{}' (expected square, dots or rounded)", other)),
        }
    }
}

impl fmt::Display for ModulePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModulePattern::Square => "square",
            ModulePattern::Dots => "dots",
            ModulePattern::Rounded => "rounded",
        };
        f.write_str(name)
    }
}

/// Encoded logo bytes as supplied by the user. Decoding happens in the
/// compositor.
///
/// Serialized as a `data:` URL.
#[derive(Clone, PartialEq, Eq)]
pub struct LogoImage {
    bytes: Vec<u8>,
}

impl LogoImage {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| Error::Asset(format!("Failed to read logo '{}': {}", path.display(), e)))?;
        Ok(Self { bytes })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn mime_type(&self) -> &'static str {
        match image::guess_format(&self.bytes) {
            Ok(ImageFormat::Png) => "image/png",
            Ok(ImageFormat::Jpeg) => "image/jpeg",
            Ok(ImageFormat::Gif) => "image/gif",
            Ok(ImageFormat::WebP) => "image/webp",
            Ok(ImageFormat::Bmp) => "image/bmp",
            _ => "application/octet-stream",
        }
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), STANDARD.encode(&self.bytes))
    }

    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| Error::Asset("logo is not a data URL".to_string()))?;
        let (_, encoded) = rest
            .split_once(";base64,")
            .ok_or_else(|| Error::Asset("logo data URL is not base64 encoded".to_string()))?;
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::Asset(format!("logo data URL is corrupt: {}", e)))?;
        Ok(Self { bytes })
    }
}

impl fmt::Debug for LogoImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogoImage")
            .field("mime", &self.mime_type())
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Serialize for LogoImage {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_data_url())
    }
}

impl<'de> Deserialize<'de> for LogoImage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        LogoImage::from_data_url(&s).map_err(serde::de::Error::custom)
    }
}

/// Cosmetic parameters of one generation.
///
/// Field names on the wire match the stored history format
/// (`size`, `fgColor`, `bgColor`, `pattern`, `logo`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    #[serde(rename = "size")]
    pub render_size: u32,
    #[serde(rename = "fgColor")]
    pub foreground: Color,
    #[serde(rename = "bgColor")]
    pub background: Color,
    pub pattern: ModulePattern,
    pub logo: Option<LogoImage>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            render_size: DEFAULT_RENDER_SIZE,
            foreground: Color::BLACK,
            background: Color::WHITE,
            pattern: ModulePattern::Square,
            logo: None,
        }
    }
}

impl StyleConfig {
    pub fn validate(&self) -> Result<()> {
        check_render_size(self.render_size)
    }
}
