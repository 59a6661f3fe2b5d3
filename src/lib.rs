use std::sync::Arc;

use crate::{
    config::ProcessConfig, error::Result, grid::PixelGrid, palette::Palette, pipeline::Pipeline,
};

pub mod batch;
pub mod config;
pub mod error;
pub mod grid;
pub mod palette;
pub mod pipeline;
pub mod transform;
pub mod utils;

#[cfg(test)]
mod tests;

/// Run the whole pipeline described by `config` over one image.
pub fn run(config: &ProcessConfig, palette: Arc<Palette>, image: PixelGrid) -> Result<PixelGrid> {
    Pipeline::new(config, palette)?.run(image)
}

pub mod prelude {
    pub use crate::{
        config::{PaletteSource, ProcessConfig},
        error::{PixelizeError, Result},
        grid::PixelGrid,
        palette::Palette,
        pipeline::{Pipeline, SaveStages, StageSink},
        transform::prelude::*,
        utils::prelude::*,
    };
}
