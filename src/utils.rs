pub mod image;
pub mod pixel;

pub mod prelude {
    pub use super::pixel::{Rgb, Rgba};
}
