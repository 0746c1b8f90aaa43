// Color values for foreground/background styling

use image::Rgba;
use nom::{
    branch::alt,
    bytes::complete::take_while_m_n,
    character::complete::char,
    combinator::{all_consuming, map, map_res},
    sequence::{preceded, tuple},
    IResult,
};
use plotters::style::RGBColor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An opaque RGB color. Serialized as a lowercase `#rrggbb` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 255])
    }

    pub fn to_rgb(self) -> RGBColor {
        RGBColor(self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_color(s).ok_or_else(|| {
            format!(
                "invalid color '{}' (expected #RRGGBB, #RGB or a color name)",
                s
            )
        })
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// === Parsing ===

/// Parse a color string, supporting hex (#RRGGBB, #RGB) and a few named colors
pub fn parse_color(color_str: &str) -> Option<Color> {
    let color_str = color_str.trim();

    if color_str.starts_with('#') {
        return all_consuming(hex_color)(color_str).ok().map(|(_, c)| c);
    }

    match color_str.to_lowercase().as_str() {
        "white" => Some(Color::WHITE),
        "black" => Some(Color::BLACK),
        "red" => Some(Color::new(255, 0, 0)),
        "green" => Some(Color::new(0, 128, 0)),
        "blue" => Some(Color::new(0, 0, 255)),
        "navy" => Some(Color::new(0, 0, 128)),
        "orange" => Some(Color::new(255, 165, 0)),
        "purple" => Some(Color::new(128, 0, 128)),
        "gray" | "grey" => Some(Color::new(128, 128, 128)),
        _ => None,
    }
}

fn hex_color(input: &str) -> IResult<&str, Color> {
    preceded(
        char('#'),
        alt((
            map(tuple((hex_byte, hex_byte, hex_byte)), |(r, g, b)| Color::new(r, g, b)),
            map(tuple((hex_nibble, hex_nibble, hex_nibble)), |(r, g, b)| {
                Color::new(r * 17, g * 17, b * 17)
            }),
        )),
    )(input)
}

fn hex_byte(input: &str) -> IResult<&str, u8> {
    map_res(take_while_m_n(2, 2, |c: char| c.is_ascii_hexdigit()), |s| {
        u8::from_str_radix(s, 16)
    })(input)
}

fn hex_nibble(input: &str) -> IResult<&str, u8> {
    map_res(take_while_m_n(1, 1, |c: char| c.is_ascii_hexdigit()), |s| {
        u8::from_str_radix(s, 16)
    })(input)
}
