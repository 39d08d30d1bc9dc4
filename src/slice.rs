//! Cutting an atlas image back into square tiles.

use crate::error::{Result, VoxtexError};
use crate::pixel::PixelBuffer;

/// Splits one image into a `columns` x `rows` grid of equal square tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceSplitter {
    columns: u32,
    rows: u32,
}

impl SliceSplitter {
    pub fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of tiles produced.
    pub fn count(&self) -> u32 {
        self.columns * self.rows
    }

    /// Edge lengths of one output tile for `source`.
    ///
    /// Truncating division; the result must be square and non-empty.
    pub fn tile_size(&self, source: &PixelBuffer) -> Result<(u32, u32)> {
        if self.columns == 0 || self.rows == 0 {
            return Err(VoxtexError::SliceTooSmall {
                columns: self.columns,
                rows: self.rows,
                width: source.width(),
                height: source.height(),
            });
        }
        let width = source.width() / self.columns;
        let height = source.height() / self.rows;
        if width != height {
            return Err(VoxtexError::SliceNotSquare { width, height });
        }
        if width == 0 {
            return Err(VoxtexError::SliceTooSmall {
                columns: self.columns,
                rows: self.rows,
                width: source.width(),
                height: source.height(),
            });
        }
        Ok((width, height))
    }

    /// Cut tile `index`, counting row-major from the top left.
    pub fn slice(&self, source: &PixelBuffer, index: u32) -> Result<PixelBuffer> {
        let (width, height) = self.tile_size(source)?;
        let column = index % self.columns;
        let row = index / self.columns;

        let mut tile = PixelBuffer::new();
        tile.copy_region(
            source,
            (column * width) as i32,
            (row * height) as i32,
            width,
            height,
        )?;
        Ok(tile)
    }

    /// Cut every tile, in index order.
    pub fn split(&self, source: &PixelBuffer) -> Result<Vec<PixelBuffer>> {
        self.tile_size(source)?;
        (0..self.count())
            .map(|index| self.slice(source, index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinate_buffer(width: u32, height: u32) -> PixelBuffer {
        let pixels = (0..height)
            .flat_map(|y| (0..width).flat_map(move |x| [x as u8, y as u8, 0, 255]))
            .collect();
        PixelBuffer::from_rgba(width, height, pixels).unwrap()
    }

    #[test]
    fn test_split_row_major() {
        let source = coordinate_buffer(8, 8);
        let tiles = SliceSplitter::new(2, 2).split(&source).unwrap();
        assert_eq!(tiles.len(), 4);
        assert_eq!(tiles[0].pixel(0, 0), Some([0, 0, 0, 255]));
        assert_eq!(tiles[1].pixel(0, 0), Some([4, 0, 0, 255]));
        assert_eq!(tiles[2].pixel(0, 0), Some([0, 4, 0, 255]));
        assert_eq!(tiles[3].pixel(3, 3), Some([7, 7, 0, 255]));
    }

    #[test]
    fn test_rectangular_grid() {
        let source = coordinate_buffer(12, 4);
        let tiles = SliceSplitter::new(3, 1).split(&source).unwrap();
        assert_eq!(tiles.len(), 3);
        assert_eq!(tiles[2].pixel(0, 0), Some([8, 0, 0, 255]));
    }

    #[test]
    fn test_truncates_remainder() {
        let source = coordinate_buffer(9, 9);
        let splitter = SliceSplitter::new(2, 2);
        assert_eq!(splitter.tile_size(&source).unwrap(), (4, 4));
        assert_eq!(splitter.split(&source).unwrap().len(), 4);
    }

    #[test]
    fn test_rejects_non_square_output() {
        let source = PixelBuffer::with_size(100, 50);
        let result = SliceSplitter::new(2, 5).tile_size(&source);
        assert!(matches!(
            result,
            Err(VoxtexError::SliceNotSquare { width: 50, height: 10 })
        ));
    }

    #[test]
    fn test_rejects_grid_larger_than_image() {
        let source = PixelBuffer::with_size(2, 2);
        let result = SliceSplitter::new(4, 4).split(&source);
        assert!(matches!(result, Err(VoxtexError::SliceTooSmall { .. })));
    }
}
