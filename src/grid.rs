use crate::{
    error::{PixelizeError, Result},
    utils::pixel::Rgba,
};

/// (width, height) in pixels.
pub type Shape = (usize, usize);

/// Row-major RGBA raster, the unit of data every stage consumes and produces.
///
/// The buffer always holds exactly `width * height` samples, so every row has
/// the same length. Zero-sized grids are valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    buffer: Vec<Rgba>,
}

impl AsRef<[Rgba]> for PixelGrid {
    #[inline]
    fn as_ref(&self) -> &[Rgba] {
        &self.buffer
    }
}

impl PixelGrid {
    /// Fully transparent grid.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Rgba::TRANSPARENT)
    }

    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        Self {
            width,
            height,
            buffer: vec![color; width as usize * height as usize],
        }
    }

    pub fn from_raw(width: u32, height: u32, buffer: Vec<Rgba>) -> Result<Self> {
        if buffer.len() != width as usize * height as usize {
            return Err(PixelizeError::InvalidGeometry {
                width,
                height,
                len: buffer.len(),
            });
        }
        Ok(Self {
            width,
            height,
            buffer,
        })
    }

    /// Caller guarantees `buffer.len() == width * height`.
    pub(crate) fn from_buffer(width: u32, height: u32, buffer: Vec<Rgba>) -> Self {
        debug_assert_eq!(buffer.len(), width as usize * height as usize);
        Self {
            width,
            height,
            buffer,
        }
    }

    /// Build a grid by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Rgba) -> Self {
        let mut buffer = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                buffer.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            buffer,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        (self.width as usize, self.height as usize)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.buffer[y as usize * self.width as usize + x as usize])
    }

    /// # Panics
    /// Panics when `(x, y)` is outside the grid.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        self.get(x, y)
            .unwrap_or_else(|| panic!("pixel ({x}, {y}) outside {}x{}", self.width, self.height))
    }

    #[inline]
    pub fn row(&self, y: u32) -> &[Rgba] {
        let start = y as usize * self.width as usize;
        &self.buffer[start..start + self.width as usize]
    }

    /// Rows top to bottom. Yields nothing for zero-sized grids.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[Rgba]> {
        // chunks(0) panics; an empty buffer yields no chunks for any size
        self.buffer.chunks(self.width.max(1) as usize)
    }

    pub fn into_raw(self) -> Vec<Rgba> {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_rejects_mismatched_buffer() {
        let err = PixelGrid::from_raw(3, 2, vec![Rgba::TRANSPARENT; 5]).unwrap_err();
        assert!(matches!(
            err,
            PixelizeError::InvalidGeometry {
                width: 3,
                height: 2,
                len: 5
            }
        ));
    }

    #[test]
    fn test_from_fn_is_row_major() {
        let grid = PixelGrid::from_fn(3, 2, |x, y| Rgba::new(x as u8, y as u8, 0, 255));
        assert_eq!(grid.pixel(2, 1), Rgba::new(2, 1, 0, 255));
        assert_eq!(grid.row(1)[0], Rgba::new(0, 1, 0, 255));
        assert_eq!(grid.as_ref()[4], Rgba::new(1, 1, 0, 255));
        assert_eq!(grid.get(3, 0), None);
    }

    #[test]
    fn test_zero_sized_grids() {
        for (w, h) in [(0, 0), (0, 5), (5, 0)] {
            let grid = PixelGrid::new(w, h);
            assert!(grid.is_empty());
            assert_eq!(grid.rows().count(), 0);
        }
    }

    #[test]
    fn test_rows_have_equal_length() {
        let grid = PixelGrid::new(7, 3);
        assert_eq!(grid.rows().len(), 3);
        assert!(grid.rows().all(|row| row.len() == 7));
    }
}
