use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{grid::PixelGrid, utils::pixel::Rgba};

pub fn rand_rgba(rng: &mut StdRng) -> Rgba {
    Rgba::new(
        rng.random::<u8>(),
        rng.random::<u8>(),
        rng.random::<u8>(),
        rng.random::<u8>(),
    )
}

/// Random grid, reproducible for a given seed.
pub fn gen_random_grid(width: u32, height: u32, seed: u64) -> PixelGrid {
    let mut rng = StdRng::seed_from_u64(seed);
    PixelGrid::from_fn(width, height, |_, _| rand_rgba(&mut rng))
}

pub fn solid_grid(width: u32, height: u32, color: Rgba) -> PixelGrid {
    PixelGrid::filled(width, height, color)
}
