use std::hint::black_box;

use pixelize::{grid::PixelGrid, palette::Palette, utils::pixel::{Rgb, Rgba}};
use rand::{Rng, SeedableRng, rngs::StdRng};

pub const BENCH_IMAGE_SIZES: [u32; 3] = [128, 512, 1024];

/// Noise image, seeded so every bench run sees the same pixels
pub fn bench_grid(size: u32) -> PixelGrid {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    black_box(PixelGrid::from_fn(size, size, |_, _| {
        Rgba::new(rng.random(), rng.random(), rng.random(), 255)
    }))
}

pub fn random_palette(size: usize) -> Palette {
    let mut rng = StdRng::seed_from_u64(size as u64);
    let colors = (0..size)
        .map(|_| Rgb::new(rng.random(), rng.random(), rng.random()))
        .collect();
    // size is never zero in benches
    Palette::new(colors).unwrap()
}
