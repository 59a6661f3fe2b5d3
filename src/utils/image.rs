use std::{
    ffi::OsString,
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};

use image::{DynamicImage, ImageBuffer, ImageFormat, ImageReader, RgbaImage};

use crate::{error::Result, grid::PixelGrid, utils::pixel::Rgba};

/// Decode any format the `image` crate understands into an RGBA grid.
pub fn read_image<P: AsRef<Path>>(path: P) -> Result<PixelGrid> {
    let image = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?
        .to_rgba8();
    Ok(PixelGrid::from(image))
}

/// Encode `grid` with the format implied by the file extension.
///
/// Formats without an alpha channel (JPEG) get the color channels only.
/// The file is only created once encoding succeeded.
pub fn write_image<P: AsRef<Path>>(grid: &PixelGrid, path: P) -> Result {
    let path = path.as_ref();
    let format = ImageFormat::from_path(path)?;

    let image = DynamicImage::ImageRgba8(grid.to_rgba_image());
    let image = if supports_alpha(format) {
        image
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    };

    let mut encoded = Cursor::new(Vec::new());
    image.write_to(&mut encoded, format)?;
    fs::write(path, encoded.into_inner())?;
    Ok(())
}

fn supports_alpha(format: ImageFormat) -> bool {
    !matches!(format, ImageFormat::Jpeg | ImageFormat::Pnm)
}

/// `dir/name.ext` -> `dir/name_pixelized.ext`
pub fn default_output_path(input: &Path) -> PathBuf {
    let mut name = input
        .file_stem()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("image"));
    name.push("_pixelized");
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }
    input.with_file_name(name)
}

impl From<RgbaImage> for PixelGrid {
    fn from(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let buffer = image
            .pixels()
            .map(|pixel| Rgba::from_u8_array(&pixel.0))
            .collect();
        PixelGrid::from_buffer(width, height, buffer)
    }
}

impl PixelGrid {
    pub fn to_rgba_image(&self) -> RgbaImage {
        ImageBuffer::from_fn(self.width(), self.height(), |x, y| {
            image::Rgba(self.pixel(x, y).to_u8_array())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::utils::*;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("shots/cat.png")),
            PathBuf::from("shots/cat_pixelized.png")
        );
        assert_eq!(
            default_output_path(Path::new("noext")),
            PathBuf::from("noext_pixelized")
        );
    }

    #[test]
    fn test_rgba_image_conversion_keeps_alpha() {
        let grid = gen_random_grid(5, 3, 77);
        let image = grid.to_rgba_image();
        assert_eq!(image.dimensions(), (5, 3));
        assert_eq!(image.get_pixel(4, 2).0, grid.pixel(4, 2).to_u8_array());
        assert_eq!(PixelGrid::from(image), grid);
    }

    #[test]
    fn test_png_write_read_keeps_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.png");
        let grid = gen_random_grid(6, 4, 31);

        write_image(&grid, &path).unwrap();
        assert_eq!(read_image(&path).unwrap(), grid);
    }

    #[test]
    fn test_jpeg_write_drops_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.jpg");
        write_image(&solid_grid(8, 8, Rgba::new(200, 10, 10, 0)), &path).unwrap();

        let back = read_image(&path).unwrap();
        assert_eq!(back.shape(), (8, 8));
        assert!(back.as_ref().iter().all(|px| px.a == 255));
    }

    #[test]
    fn test_unknown_extension_is_codec_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_image(&PixelGrid::new(1, 1), dir.path().join("grid.nope")).unwrap_err();
        assert!(matches!(err, crate::error::PixelizeError::Codec(_)));
    }

    #[test]
    fn test_failed_encode_leaves_no_file() {
        // the hdr encoder takes float pixels only
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.hdr");
        let err = write_image(&gen_random_grid(4, 4, 3), &path).unwrap_err();
        assert!(matches!(err, crate::error::PixelizeError::Codec(_)));
        assert!(!path.exists());
    }
}
