use thiserror::Error;

/// The main error type for the pixelize crate
#[derive(Debug, Error)]
pub enum PixelizeError {
    /// A stage parameter is out of its domain (zero factor, empty palette, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The palette resource could not be parsed
    #[error("Malformed palette (line {line}): {reason}")]
    MalformedPalette { line: usize, reason: String },

    /// A pixel buffer does not match the dimensions it was declared with
    #[error("Invalid geometry: {width}x{height} grid cannot hold {len} samples")]
    InvalidGeometry { width: u32, height: u32, len: usize },

    /// Surfaced from the image decode/encode boundary
    #[error("Codec error: {0}")]
    Codec(#[from] image::ImageError),

    /// Error occurred during I/O operations (file read/write)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The run configuration file could not be interpreted
    #[error("Config error: {0}")]
    Config(String),
}

impl PixelizeError {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        PixelizeError::InvalidArgument(msg.into())
    }

    pub(crate) fn malformed_palette(line: usize, reason: impl Into<String>) -> Self {
        PixelizeError::MalformedPalette {
            line,
            reason: reason.into(),
        }
    }
}

impl From<json::Error> for PixelizeError {
    fn from(err: json::Error) -> Self {
        PixelizeError::Config(err.to_string())
    }
}

// Convenience type alias for Results using PixelizeError
pub type Result<T = ()> = std::result::Result<T, PixelizeError>;
