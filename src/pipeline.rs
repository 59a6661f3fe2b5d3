use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{debug, debug_span, warn};

use crate::{
    config::ProcessConfig,
    error::Result,
    grid::PixelGrid,
    palette::Palette,
    transform::{
        chroma_key::ChromaKey, downscale::Downscale, quantize::Quantize, traits::GridTransform,
        upscale::Upscale,
    },
    utils::image::write_image,
};

/// Observer handed every intermediate grid, e.g. a preview window.
///
/// Sinks never alter the grid and their failures never fail the run.
pub trait StageSink {
    fn accept(&mut self, stage: &str, grid: &PixelGrid) -> Result;
}

/// Writes each stage output as `<dir>/<nn>_<stage>.png`.
#[derive(Debug)]
pub struct SaveStages {
    dir: PathBuf,
    count: usize,
}

impl SaveStages {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        std::fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
            count: 0,
        })
    }
}

impl StageSink for SaveStages {
    fn accept(&mut self, stage: &str, grid: &PixelGrid) -> Result {
        let path = self.dir.join(format!("{:02}_{stage}.png", self.count));
        self.count += 1;
        write_image(grid, path)
    }
}

/// One step of the fixed pipeline.
#[derive(Debug, Clone)]
pub enum Stage {
    Downscale(Downscale),
    ChromaKey(ChromaKey),
    Quantize(Quantize),
    Upscale(Upscale),
}

impl GridTransform for Stage {
    fn name(&self) -> &'static str {
        match self {
            Stage::Downscale(t) => t.name(),
            Stage::ChromaKey(t) => t.name(),
            Stage::Quantize(t) => t.name(),
            Stage::Upscale(t) => t.name(),
        }
    }

    fn apply(&mut self, input: PixelGrid) -> Result<PixelGrid> {
        match self {
            Stage::Downscale(t) => t.apply(input),
            Stage::ChromaKey(t) => t.apply(input),
            Stage::Quantize(t) => t.apply(input),
            Stage::Upscale(t) => t.apply(input),
        }
    }
}

/// Downscale -> (chroma key) -> quantize -> (upscale).
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Build the stage list for one run.
    ///
    /// When the config carries no seed one is drawn here and logged, so a
    /// probabilistic run can be replayed.
    pub fn new(config: &ProcessConfig, palette: Arc<Palette>) -> Result<Self> {
        config.validate()?;
        let factor = config.downscale_factor;
        let seed = config.seed.unwrap_or_else(rand::random);
        debug!(
            factor,
            policy = %config.quantization_policy,
            chroma_key = config.enable_chroma_key,
            suppress_upscale = config.suppress_upscale,
            seed,
            "building pipeline"
        );

        let mut stages = vec![Stage::Downscale(Downscale::new(factor)?)];
        if config.enable_chroma_key {
            stages.push(Stage::ChromaKey(ChromaKey));
        }
        stages.push(Stage::Quantize(Quantize::new(
            palette,
            config.quantization_policy,
            seed,
        )));
        if !config.suppress_upscale {
            stages.push(Stage::Upscale(Upscale::new(factor)?));
        }

        Ok(Self { stages })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn run(&mut self, grid: PixelGrid) -> Result<PixelGrid> {
        self.run_with_sink(grid, None)
    }

    /// Thread `grid` through every stage, reporting each output to `sink`.
    pub fn run_with_sink(
        &mut self,
        grid: PixelGrid,
        mut sink: Option<&mut dyn StageSink>,
    ) -> Result<PixelGrid> {
        let _span = debug_span!("pipeline", width = grid.width(), height = grid.height()).entered();

        let mut grid = grid;
        for stage in self.stages.iter_mut() {
            grid = stage.apply(grid)?;
            debug!(
                stage = stage.name(),
                width = grid.width(),
                height = grid.height(),
                "stage done"
            );

            if let Some(sink) = sink.as_deref_mut() {
                if let Err(e) = sink.accept(stage.name(), &grid) {
                    warn!(stage = stage.name(), %e, "stage sink failed");
                }
            }
        }
        Ok(grid)
    }
}

impl GridTransform for Pipeline {
    fn name(&self) -> &'static str {
        "pipeline"
    }

    fn apply(&mut self, input: PixelGrid) -> Result<PixelGrid> {
        self.run(input)
    }
}
