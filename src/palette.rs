use std::{fs, path::Path};

use itertools::Itertools;

use crate::{
    error::{PixelizeError, Result},
    utils::pixel::Rgb,
};

pub const DEFAULT_PALETTE: [Rgb; 2] = [Rgb::BLACK, Rgb::WHITE];

/// Ordered, non-empty set of opaque colors a grid is quantized to.
///
/// Read-only once built; share it by reference across concurrent runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_PALETTE.to_vec(),
        }
    }
}

impl Palette {
    pub fn new(colors: Vec<Rgb>) -> Result<Self> {
        if colors.is_empty() {
            return Err(PixelizeError::invalid_argument(
                "palette must contain at least one color",
            ));
        }
        Ok(Self { colors })
    }

    /// Parse a palette resource: one `r,g,b` row per color, no header.
    pub fn parse(text: &str) -> Result<Self> {
        let mut colors = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            colors.push(parse_row(idx + 1, line)?);
        }

        if colors.is_empty() {
            return Err(PixelizeError::malformed_palette(0, "no colors found"));
        }
        Ok(Self { colors })
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Serialize back into the resource format read by [Palette::parse].
    pub fn to_csv(&self) -> String {
        self.colors
            .iter()
            .map(|c| format!("{},{},{}\n", c.r, c.g, c.b))
            .collect()
    }

    #[inline]
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false, palettes cannot be built empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl AsRef<[Rgb]> for Palette {
    fn as_ref(&self) -> &[Rgb] {
        &self.colors
    }
}

fn parse_row(line_no: usize, line: &str) -> Result<Rgb> {
    let Some((r, g, b)) = line.split(',').map(str::trim).collect_tuple() else {
        return Err(PixelizeError::malformed_palette(
            line_no,
            format!("expected 3 comma separated fields, got {line:?}"),
        ));
    };

    let channel = |field: &str| {
        let malformed = || {
            PixelizeError::malformed_palette(
                line_no,
                format!("{field:?} is not an integer in [0, 255]"),
            )
        };
        // u8::from_str also takes a leading '+'
        if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        field.parse::<u8>().map_err(|_| malformed())
    };

    Ok(Rgb::new(channel(r)?, channel(g)?, channel(b)?))
}
