use std::fmt::Display;

use crate::error::{PixelizeError, Result};

/// Opaque palette color. Channel values in [0, 255].
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// One grid sample with straight (non premultiplied) alpha.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Rgb {
        Rgb { r, g, b }
    }

    pub fn from_hex(string: &str) -> Result<Rgb> {
        let clean_string = string.trim().trim_start_matches('#');
        if clean_string.len() != 6 || !clean_string.is_ascii() {
            return Err(PixelizeError::invalid_argument(format!(
                "expected a #rrggbb color, got {string:?}"
            )));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&clean_string[range], 16).map_err(|_| {
                PixelizeError::invalid_argument(format!("invalid hex color {string:?}"))
            })
        };

        Ok(Rgb {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Fully opaque sample of this color.
    #[inline]
    pub const fn opaque(self) -> Rgba {
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a: u8::MAX,
        }
    }
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Rgba {
        Rgba { r, g, b, a }
    }

    #[inline]
    pub const fn from_u8_array(rgba: &[u8; 4]) -> Rgba {
        Rgba::new(rgba[0], rgba[1], rgba[2], rgba[3])
    }

    #[inline]
    pub const fn to_u8_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    pub const fn rgb(self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }
}

impl From<Rgb> for Rgba {
    fn from(rgb: Rgb) -> Self {
        rgb.opaque()
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
