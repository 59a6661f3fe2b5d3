use crate::{
    error::Result,
    grid::PixelGrid,
    transform::{Parallelism, fill_rows, traits::GridTransform},
    utils::pixel::{Rgb, Rgba},
};

/// The keyed-out color. Only its green channel takes part in scoring.
pub const KEY_COLOR: Rgb = Rgb::new(0, 255, 0);

/// Pixels scoring at or above this similarity become transparent.
pub const KEY_THRESHOLD: f32 = 145.0;

/// Green-screen removal against [KEY_COLOR].
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromaKey;

impl GridTransform for ChromaKey {
    fn name(&self) -> &'static str {
        "chroma_key"
    }

    fn apply(&mut self, input: PixelGrid) -> Result<PixelGrid> {
        Ok(remove_key(input))
    }
}

/// Similarity of `pixel` to the key, in [0, 255].
///
/// Red and blue score against their own magnitude, green against the key's
/// green. The asymmetry is the calibrated heuristic and must stay as is.
#[inline]
pub fn key_similarity(pixel: Rgba) -> f32 {
    let red = 255 - i32::from(pixel.r);
    let green = 255 - (i32::from(KEY_COLOR.g) - i32::from(pixel.g)).abs();
    let blue = 255 - i32::from(pixel.b);
    (red + green + blue) as f32 / 3.0
}

#[inline]
pub fn is_keyed(pixel: Rgba) -> bool {
    key_similarity(pixel) >= KEY_THRESHOLD
}

/// Replace every pixel resembling [KEY_COLOR] by a fully transparent sample.
///
/// Other pixels are copied unchanged. There is no partial transparency.
pub fn remove_key(grid: PixelGrid) -> PixelGrid {
    let parallelism = Parallelism::auto(grid.shape());
    remove_key_with(grid, parallelism)
}

pub fn remove_key_with(grid: PixelGrid, parallelism: Parallelism) -> PixelGrid {
    fill_rows(grid.width(), grid.height(), parallelism, |y, row| {
        for (dst, src) in row.iter_mut().zip(grid.row(y as u32)) {
            *dst = if is_keyed(*src) {
                Rgba::TRANSPARENT
            } else {
                *src
            };
        }
    })
}
