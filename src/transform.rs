pub mod chroma_key;
pub mod downscale;
pub mod quantize;
pub mod traits;
pub mod upscale;

use rayon::prelude::*;

use crate::{
    error::{PixelizeError, Result},
    grid::{PixelGrid, Shape},
    utils::pixel::Rgba,
};

/// How a stage walks its output rows.
///
/// Both variants produce identical grids, no stage reads the grid it writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parallelism {
    Seq,
    Par,
}

impl Parallelism {
    pub fn auto(shape_hint: Shape) -> Self {
        let (width, height) = shape_hint;
        let count = width * height;

        if rayon::current_num_threads() == 1 || width < 256 || count < 65536 {
            return Parallelism::Seq;
        }
        Parallelism::Par
    }
}

/// Allocate a `width x height` grid and let `fill(y, row)` write every row.
pub(crate) fn fill_rows<F>(width: u32, height: u32, parallelism: Parallelism, fill: F) -> PixelGrid
where
    F: Fn(usize, &mut [Rgba]) + Sync,
{
    let mut buffer = vec![Rgba::TRANSPARENT; width as usize * height as usize];
    // chunks_exact_mut(0) panics
    if !buffer.is_empty() {
        let row_len = width as usize;
        match parallelism {
            Parallelism::Seq => buffer
                .chunks_exact_mut(row_len)
                .enumerate()
                .for_each(|(y, row)| fill(y, row)),
            Parallelism::Par => buffer
                .par_chunks_exact_mut(row_len)
                .enumerate()
                .for_each(|(y, row)| fill(y, row)),
        }
    }
    PixelGrid::from_buffer(width, height, buffer)
}

pub(crate) fn check_factor(stage: &str, factor: u32) -> Result {
    if factor == 0 {
        return Err(PixelizeError::invalid_argument(format!(
            "{stage} factor must be a positive integer, got 0"
        )));
    }
    Ok(())
}

pub mod prelude {
    pub use super::{
        Parallelism,
        chroma_key::{ChromaKey, remove_key, remove_key_with},
        downscale::{Downscale, downscale, downscale_with},
        quantize::{Quantize, QuantizePolicy, quantize, quantize_with},
        traits::GridTransform,
        upscale::{Upscale, upscale, upscale_with},
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_rows_passes_row_index() {
        for parallelism in [Parallelism::Seq, Parallelism::Par] {
            let grid = fill_rows(3, 4, parallelism, |y, row| {
                row.fill(Rgba::new(y as u8, 0, 0, 255));
            });
            assert_eq!(grid.shape(), (3, 4));
            for y in 0..4 {
                assert!(grid.row(y).iter().all(|px| px.r == y as u8));
            }
        }
    }

    #[test]
    fn test_fill_rows_zero_sized() {
        let grid = fill_rows(0, 9, Parallelism::Par, |_, _| unreachable!());
        assert!(grid.is_empty());
        assert_eq!(grid.shape(), (0, 9));
    }

    #[test]
    fn test_auto_small_images_are_sequential() {
        assert_eq!(Parallelism::auto((16, 16)), Parallelism::Seq);
        assert_eq!(Parallelism::auto((4096, 8)), Parallelism::Seq);
    }

    #[test]
    fn test_zero_factor_rejected() {
        assert!(matches!(
            check_factor("upscale", 0),
            Err(PixelizeError::InvalidArgument(_))
        ));
        assert!(check_factor("upscale", 1).is_ok());
    }
}
