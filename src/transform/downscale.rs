use std::ops::Range;

use crate::{
    error::Result,
    grid::PixelGrid,
    transform::{Parallelism, check_factor, fill_rows, traits::GridTransform},
    utils::pixel::Rgba,
};

/// Color of an output pixel whose sampling neighborhood lies entirely outside
/// the input grid.
pub const MID_GRAY: Rgba = Rgba::new(128, 128, 128, u8::MAX);

/// Block-mean reduction by an integer factor.
#[derive(Debug, Clone, Copy)]
pub struct Downscale {
    factor: u32,
}

impl Downscale {
    pub fn new(factor: u32) -> Result<Self> {
        check_factor("downscale", factor)?;
        Ok(Self { factor })
    }

    pub fn factor(&self) -> u32 {
        self.factor
    }
}

impl GridTransform for Downscale {
    fn name(&self) -> &'static str {
        "downscale"
    }

    fn apply(&mut self, input: PixelGrid) -> Result<PixelGrid> {
        downscale(input, self.factor)
    }
}

/// Downscaled length of one axis.
///
/// Residual rows/columns are kept: `side / factor + side % factor`.
#[inline]
pub fn downscaled_side(side: u32, factor: u32) -> u32 {
    side / factor + side % factor
}

/// Reduce `grid` by `factor`, averaging a `factor x factor` neighborhood
/// centered on each block anchor.
///
/// Samples outside the grid are left out of the mean. Output alpha is always
/// opaque. A factor of 1 returns the input untouched.
pub fn downscale(grid: PixelGrid, factor: u32) -> Result<PixelGrid> {
    let parallelism = Parallelism::auto(grid.shape());
    downscale_with(grid, factor, parallelism)
}

pub fn downscale_with(grid: PixelGrid, factor: u32, parallelism: Parallelism) -> Result<PixelGrid> {
    check_factor("downscale", factor)?;
    if factor == 1 {
        return Ok(grid);
    }

    let out_width = downscaled_side(grid.width(), factor);
    let out_height = downscaled_side(grid.height(), factor);

    Ok(fill_rows(out_width, out_height, parallelism, |oy, row| {
        for (ox, pixel) in row.iter_mut().enumerate() {
            *pixel = neighborhood_mean(&grid, factor, ox, oy);
        }
    }))
}

/// In-bounds part of the `factor`-wide window centered on `block * factor`.
#[inline]
fn window(block: usize, factor: u32, side: u32) -> Range<usize> {
    let factor = i64::from(factor);
    let start = block as i64 * factor - factor / 2;
    let end = start + factor;
    let start = start.clamp(0, i64::from(side));
    let end = end.clamp(start, i64::from(side));
    start as usize..end as usize
}

fn neighborhood_mean(grid: &PixelGrid, factor: u32, ox: usize, oy: usize) -> Rgba {
    let xs = window(ox, factor, grid.width());
    let ys = window(oy, factor, grid.height());
    if xs.is_empty() || ys.is_empty() {
        return MID_GRAY;
    }

    let mut sum = [0u64; 3];
    for y in ys.clone() {
        for pixel in &grid.row(y as u32)[xs.clone()] {
            sum[0] += u64::from(pixel.r);
            sum[1] += u64::from(pixel.g);
            sum[2] += u64::from(pixel.b);
        }
    }

    let count = (xs.len() * ys.len()) as u64;
    Rgba::new(
        (sum[0] / count) as u8,
        (sum[1] / count) as u8,
        (sum[2] / count) as u8,
        u8::MAX,
    )
}
