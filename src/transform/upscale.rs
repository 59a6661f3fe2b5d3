use crate::{
    error::{PixelizeError, Result},
    grid::PixelGrid,
    transform::{Parallelism, check_factor, fill_rows, traits::GridTransform},
};

/// Nearest-neighbor expansion by an integer factor.
#[derive(Debug, Clone, Copy)]
pub struct Upscale {
    factor: u32,
}

impl Upscale {
    pub fn new(factor: u32) -> Result<Self> {
        check_factor("upscale", factor)?;
        Ok(Self { factor })
    }

    pub fn factor(&self) -> u32 {
        self.factor
    }
}

impl GridTransform for Upscale {
    fn name(&self) -> &'static str {
        "upscale"
    }

    fn apply(&mut self, input: PixelGrid) -> Result<PixelGrid> {
        upscale(input, self.factor)
    }
}

/// Replicate every pixel into a `factor x factor` block. No interpolation.
pub fn upscale(grid: PixelGrid, factor: u32) -> Result<PixelGrid> {
    check_factor("upscale", factor)?;
    let (width, height) = scaled_shape(&grid, factor)?;
    let parallelism = Parallelism::auto((width as usize, height as usize));
    upscale_with(grid, factor, parallelism)
}

pub fn upscale_with(grid: PixelGrid, factor: u32, parallelism: Parallelism) -> Result<PixelGrid> {
    check_factor("upscale", factor)?;
    if factor == 1 {
        return Ok(grid);
    }

    let (width, height) = scaled_shape(&grid, factor)?;
    let factor = factor as usize;
    Ok(fill_rows(width, height, parallelism, |y, row| {
        let source = grid.row((y / factor) as u32);
        for (block, pixel) in row.chunks_exact_mut(factor).zip(source) {
            block.fill(*pixel);
        }
    }))
}

fn scaled_shape(grid: &PixelGrid, factor: u32) -> Result<(u32, u32)> {
    match (
        grid.width().checked_mul(factor),
        grid.height().checked_mul(factor),
    ) {
        (Some(width), Some(height)) => Ok((width, height)),
        _ => Err(PixelizeError::invalid_argument(format!(
            "upscaling {}x{} by {factor} overflows",
            grid.width(),
            grid.height()
        ))),
    }
}
