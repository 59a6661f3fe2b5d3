use std::{fmt::Display, str::FromStr, sync::Arc};

use multiversion::multiversion;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    error::{PixelizeError, Result},
    grid::PixelGrid,
    palette::Palette,
    transform::{Parallelism, fill_rows, traits::GridTransform},
    utils::pixel::{Rgb, Rgba},
};

/// Ordered dithering kicks in when the two leading scores are closer than this.
pub const ORDERED_SCORE_GAP: i32 = 50;
/// Probabilistic dithering kicks in when the two leading scores are closer than this.
pub const PROBABILISTIC_SCORE_GAP: i32 = 100;
/// A random draw above this value picks the runner-up color.
pub const PROBABILISTIC_CUTOFF: i32 = 51;
/// Source pixels with alpha at or below this come out fully transparent.
pub const ALPHA_CUTOFF: u8 = 127;

/// Rule used to turn a pixel's palette scores into one palette index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuantizePolicy {
    /// Best score, first index on ties.
    #[default]
    Flat,
    /// Checkerboard between the two leading colors when they score close.
    Ordered,
    /// Random pick between the two leading colors when they score close.
    Probabilistic,
}

impl QuantizePolicy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            QuantizePolicy::Flat => "flat",
            QuantizePolicy::Ordered => "ordered",
            QuantizePolicy::Probabilistic => "probabilistic",
        }
    }
}

impl Display for QuantizePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuantizePolicy {
    type Err = PixelizeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" | "none" => Ok(QuantizePolicy::Flat),
            "ordered" | "dither" => Ok(QuantizePolicy::Ordered),
            "probabilistic" | "random" => Ok(QuantizePolicy::Probabilistic),
            other => Err(PixelizeError::invalid_argument(format!(
                "unknown quantization policy {other:?} (expected flat, ordered or probabilistic)"
            ))),
        }
    }
}

/// Palette quantization stage.
#[derive(Debug, Clone)]
pub struct Quantize {
    palette: Arc<Palette>,
    policy: QuantizePolicy,
    seed: u64,
}

impl Quantize {
    /// `seed` only affects [QuantizePolicy::Probabilistic].
    pub fn new(palette: Arc<Palette>, policy: QuantizePolicy, seed: u64) -> Self {
        Self {
            palette,
            policy,
            seed,
        }
    }

    pub fn policy(&self) -> QuantizePolicy {
        self.policy
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }
}

impl GridTransform for Quantize {
    fn name(&self) -> &'static str {
        "quantize"
    }

    fn apply(&mut self, input: PixelGrid) -> Result<PixelGrid> {
        Ok(quantize(input, &self.palette, self.policy, self.seed))
    }
}

/// Similarity of one channel pair, 255 for an exact match.
#[inline]
fn channel_score(a: u8, b: u8) -> i32 {
    255 - (i32::from(a) - i32::from(b)).abs()
}

/// Score `pixel` against every palette entry; higher is more similar.
///
/// `scores` must be as long as `palette`.
#[multiversion(targets("x86_64+avx512f", "x86_64+avx2", "x86_64+sse2"))]
pub fn score_palette(pixel: Rgb, palette: &[Rgb], scores: &mut [i32]) {
    debug_assert_eq!(palette.len(), scores.len());
    for (score, color) in scores.iter_mut().zip(palette) {
        *score = channel_score(color.r, pixel.r)
            + channel_score(color.g, pixel.g)
            + channel_score(color.b, pixel.b);
    }
}

/// Index of the highest score, the lowest index wins ties.
pub fn select_flat(scores: &[i32]) -> usize {
    let mut best = 0;
    for idx in 1..scores.len() {
        if scores[idx] > scores[best] {
            best = idx;
        }
    }
    best
}

/// `(current, second)` from one linear scan.
///
/// Whenever a new maximum shows up, the previous maximum becomes `second`.
/// `second` is therefore the runner-up in scan order, not necessarily the
/// second highest score. Both start at index 0.
pub fn leading_pair(scores: &[i32]) -> (usize, usize) {
    let mut current = 0;
    let mut second = 0;
    for idx in 1..scores.len() {
        if scores[idx] > scores[current] {
            second = current;
            current = idx;
        }
    }
    (current, second)
}

/// Checkerboard dither: close pairs take `second` on even `x + y`.
pub fn select_ordered(scores: &[i32], x: usize, y: usize) -> usize {
    let (current, second) = leading_pair(scores);
    if (scores[current] - scores[second]).abs() < ORDERED_SCORE_GAP && (x + y) % 2 == 0 {
        return second;
    }
    current
}

/// Random dither between the leading pair.
///
/// Draws uniformly from `[0, gap]` and takes `second` when the draw exceeds
/// [PROBABILISTIC_CUTOFF]. A gap of 51 or less can never exceed the cutoff,
/// so those pixels always keep `current`.
pub fn select_probabilistic<R: Rng>(scores: &[i32], rng: &mut R) -> usize {
    let (current, second) = leading_pair(scores);
    let gap = (scores[current] - scores[second]).abs();
    if gap < PROBABILISTIC_SCORE_GAP && rng.random_range(0..=gap) > PROBABILISTIC_CUTOFF {
        return second;
    }
    current
}

/// Palette color for opaque-enough sources, transparency otherwise.
#[inline]
pub fn gate_alpha(source: Rgba, color: Rgb) -> Rgba {
    if source.a > ALPHA_CUTOFF {
        color.opaque()
    } else {
        Rgba::TRANSPARENT
    }
}

/// Generator for one output row, derived from the run seed.
///
/// Rows draw independently so the result does not depend on scheduling.
fn row_rng(seed: u64, y: usize) -> StdRng {
    StdRng::seed_from_u64(seed ^ (y as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15))
}

/// Map every pixel of `grid` to a palette color using `policy`.
pub fn quantize(grid: PixelGrid, palette: &Palette, policy: QuantizePolicy, seed: u64) -> PixelGrid {
    let parallelism = Parallelism::auto(grid.shape());
    quantize_with(grid, palette, policy, seed, parallelism)
}

pub fn quantize_with(
    grid: PixelGrid,
    palette: &Palette,
    policy: QuantizePolicy,
    seed: u64,
    parallelism: Parallelism,
) -> PixelGrid {
    let colors = palette.colors();
    fill_rows(grid.width(), grid.height(), parallelism, |y, row| {
        let mut scores = vec![0i32; colors.len()];
        let mut rng = row_rng(seed, y);

        for (x, (dst, src)) in row.iter_mut().zip(grid.row(y as u32)).enumerate() {
            score_palette(src.rgb(), colors, &mut scores);
            let idx = match policy {
                QuantizePolicy::Flat => select_flat(&scores),
                QuantizePolicy::Ordered => select_ordered(&scores, x, y),
                QuantizePolicy::Probabilistic => select_probabilistic(&scores, &mut rng),
            };
            *dst = gate_alpha(*src, colors[idx]);
        }
    })
}
