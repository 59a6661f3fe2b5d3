use crate::{error::Result, grid::PixelGrid};

/// Core trait for a pipeline stage.
///
/// A stage takes ownership of its input grid and hands back a new one, so no
/// two stages ever observe the same buffer.
pub trait GridTransform {
    /// Short name used in logs and by stage sinks.
    fn name(&self) -> &'static str;

    /// Apply the transform to `input`.
    fn apply(&mut self, input: PixelGrid) -> Result<PixelGrid>;
}
