//! Owned RGBA8888 raster with region copy and paste.

use super::ImageKind;
use crate::error::{Result, VoxtexError};
use crate::vtf::{self, VtfFile};
use image::ImageEncoder;
use std::path::Path;

/// An owned, mutable RGBA8888 image.
///
/// Pixels are stored row-major, top to bottom, four bytes per pixel.
/// `pixels.len() == width * height * 4` holds at all times; a default
/// buffer is 0x0 with no storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Create an empty 0x0 buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a zero-filled (transparent black) buffer.
    pub fn with_size(width: u32, height: u32) -> Self {
        let mut buffer = Self::new();
        buffer.init(width, height);
        buffer
    }

    /// Wrap existing RGBA8888 data.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = byte_len(width, height);
        if pixels.len() != expected {
            return Err(VoxtexError::InvalidBuffer(format!(
                "{}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Load a PNG or VTF file, dispatching on the extension.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut buffer = Self::new();
        buffer.load_file(path)?;
        Ok(buffer)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    /// Get the pixel at (x, y), if inside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let mut pixel = [0u8; 4];
        pixel.copy_from_slice(&self.pixels[idx..idx + 4]);
        Some(pixel)
    }

    /// Reallocate as a zero-filled `width` x `height` buffer, discarding
    /// the previous contents.
    pub fn init(&mut self, width: u32, height: u32) {
        self.pixels = vec![0; byte_len(width, height)];
        self.width = width;
        self.height = height;
    }

    /// Replace the contents with the image at `path`.
    ///
    /// On error the buffer contents are unspecified.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        match ImageKind::from_path(path) {
            Some(ImageKind::Png) => {
                let data = std::fs::read(path)?;
                let rgba = image::load_from_memory_with_format(&data, image::ImageFormat::Png)?
                    .to_rgba8();
                let (width, height) = rgba.dimensions();
                self.width = width;
                self.height = height;
                self.pixels = rgba.into_raw();
            }
            Some(ImageKind::Vtf) => {
                let file = VtfFile::load(path)?;
                let pixels = file.to_rgba8888(0)?;
                *self = Self::from_rgba(file.width(), file.height(), pixels)?;
            }
            None => return Err(VoxtexError::UnsupportedImage(path.to_path_buf())),
        }
        tracing::debug!(
            "Loaded {} ({}x{})",
            path.display(),
            self.width,
            self.height
        );
        Ok(())
    }

    /// Replace the contents with the `width` x `height` rectangle of
    /// `source` at (`x`, `y`).
    ///
    /// Fails without touching `self` if the rectangle is not fully inside
    /// `source`.
    pub fn copy_region(
        &mut self,
        source: &PixelBuffer,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) -> Result<()> {
        let (x, y) = (i64::from(x), i64::from(y));
        if x < 0
            || y < 0
            || x + i64::from(width) > i64::from(source.width)
            || y + i64::from(height) > i64::from(source.height)
        {
            return Err(VoxtexError::RegionOutOfBounds {
                x,
                y,
                width,
                height,
                source_width: source.width,
                source_height: source.height,
            });
        }

        let (x, y) = (x as usize, y as usize);
        let row_len = width as usize * 4;
        let source_stride = source.width as usize * 4;
        let mut pixels = Vec::with_capacity(byte_len(width, height));
        for row in y..y + height as usize {
            let start = row * source_stride + x * 4;
            pixels.extend_from_slice(&source.pixels[start..start + row_len]);
        }

        self.width = width;
        self.height = height;
        self.pixels = pixels;
        Ok(())
    }

    /// Paste `source` onto this buffer with its top-left corner at
    /// (`x`, `y`), resampled by `scale` first when it is not 1.
    ///
    /// Pixels are overwritten, not blended. Anything landing outside this
    /// buffer is dropped, so negative offsets and oversized sources are fine.
    pub fn paste_region(&mut self, source: &PixelBuffer, x: i32, y: i32, scale: f64) -> Result<()> {
        let scaled;
        let (src_width, src_height, src_pixels) = if scale == 1.0 {
            (source.width, source.height, source.pixels.as_slice())
        } else {
            let width = (f64::from(source.width) * scale) as u32;
            let height = (f64::from(source.height) * scale) as u32;
            if width == 0 || height == 0 {
                return Ok(());
            }
            scaled = vtf::resize(&source.pixels, source.width, source.height, width, height)?;
            (width, height, scaled.as_slice())
        };

        let (x, y) = (i64::from(x), i64::from(y));
        let left = x.max(0);
        let right = (x + i64::from(src_width)).min(i64::from(self.width));
        let top = y.max(0);
        let bottom = (y + i64::from(src_height)).min(i64::from(self.height));
        if left >= right || top >= bottom {
            return Ok(());
        }

        let row_len = (right - left) as usize * 4;
        let src_stride = src_width as usize * 4;
        let dst_stride = self.width as usize * 4;
        for dst_y in top..bottom {
            let src_y = (dst_y - y) as usize;
            let src_start = src_y * src_stride + (left - x) as usize * 4;
            let dst_start = dst_y as usize * dst_stride + left as usize * 4;
            self.pixels[dst_start..dst_start + row_len]
                .copy_from_slice(&src_pixels[src_start..src_start + row_len]);
        }
        Ok(())
    }

    /// Encode the buffer as PNG bytes.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(std::io::Cursor::new(&mut bytes));
        encoder.write_image(
            &self.pixels,
            self.width,
            self.height,
            image::ExtendedColorType::Rgba8,
        )?;
        Ok(bytes)
    }

    /// Write the buffer to `path` as a PNG.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_png()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Compress the buffer to the container's format and store it as mip
    /// `level`. The buffer must match that level's dimensions.
    pub fn write_texture_data(&self, file: &mut VtfFile, level: u32) -> Result<()> {
        let (width, height) = file.mip_dimensions(level);
        if (width, height) != (self.width, self.height) {
            return Err(VoxtexError::Vtf(format!(
                "mip level {} is {}x{}, buffer is {}x{}",
                level, width, height, self.width, self.height
            )));
        }
        let compressed = vtf::convert_from_rgba8888(&self.pixels, width, height, file.format())?;
        file.set_data(level, compressed)
    }
}

fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vtf::ImageFormat;

    /// A buffer where every pixel encodes its own coordinates.
    fn coordinate_buffer(width: u32, height: u32) -> PixelBuffer {
        let pixels = (0..height)
            .flat_map(|y| (0..width).flat_map(move |x| [x as u8, y as u8, 0, 255]))
            .collect();
        PixelBuffer::from_rgba(width, height, pixels).unwrap()
    }

    fn solid(width: u32, height: u32, color: [u8; 4]) -> PixelBuffer {
        PixelBuffer::from_rgba(width, height, color.repeat((width * height) as usize)).unwrap()
    }

    #[test]
    fn test_init_zero_fills() {
        let mut buffer = solid(2, 2, [9, 9, 9, 9]);
        buffer.init(3, 1);
        assert_eq!(buffer.width(), 3);
        assert_eq!(buffer.height(), 1);
        assert_eq!(buffer.pixels(), &[0u8; 12][..]);
    }

    #[test]
    fn test_default_is_empty() {
        let buffer = PixelBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!((buffer.width(), buffer.height()), (0, 0));
    }

    #[test]
    fn test_from_rgba_validates_length() {
        assert!(PixelBuffer::from_rgba(2, 2, vec![0; 15]).is_err());
        assert!(PixelBuffer::from_rgba(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn test_copy_region() {
        let source = coordinate_buffer(4, 4);
        let mut region = PixelBuffer::new();
        region.copy_region(&source, 1, 2, 2, 2).unwrap();

        assert_eq!((region.width(), region.height()), (2, 2));
        assert_eq!(region.pixel(0, 0), Some([1, 2, 0, 255]));
        assert_eq!(region.pixel(1, 1), Some([2, 3, 0, 255]));
    }

    #[test]
    fn test_copy_region_rejects_out_of_bounds() {
        let source = coordinate_buffer(4, 4);
        let mut region = solid(1, 1, [7, 7, 7, 7]);

        for (x, y, w, h) in [(-1, 0, 2, 2), (0, -1, 2, 2), (3, 0, 2, 2), (0, 3, 2, 2)] {
            let result = region.copy_region(&source, x, y, w, h);
            assert!(matches!(result, Err(VoxtexError::RegionOutOfBounds { .. })));
            assert_eq!(region, solid(1, 1, [7, 7, 7, 7]));
        }

        // Touching the far edge is still inside.
        assert!(region.copy_region(&source, 2, 2, 2, 2).is_ok());
    }

    #[test]
    fn test_paste_region_overwrites() {
        let mut dest = solid(4, 4, [1, 1, 1, 1]);
        let tile = solid(2, 2, [200, 0, 0, 0]);
        dest.paste_region(&tile, 1, 1, 1.0).unwrap();

        assert_eq!(dest.pixel(0, 0), Some([1, 1, 1, 1]));
        // Zero alpha still overwrites: no blending.
        assert_eq!(dest.pixel(1, 1), Some([200, 0, 0, 0]));
        assert_eq!(dest.pixel(2, 2), Some([200, 0, 0, 0]));
        assert_eq!(dest.pixel(3, 3), Some([1, 1, 1, 1]));
    }

    #[test]
    fn test_paste_region_clips_negative_offsets() {
        let mut dest = PixelBuffer::with_size(4, 4);
        let source = coordinate_buffer(4, 4);
        dest.paste_region(&source, -2, -3, 1.0).unwrap();

        assert_eq!(dest.pixel(0, 0), Some([2, 3, 0, 255]));
        assert_eq!(dest.pixel(1, 0), Some([3, 3, 0, 255]));
        assert_eq!(dest.pixel(2, 0), Some([0, 0, 0, 0]));
        assert_eq!(dest.pixel(0, 1), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_paste_region_fully_outside_is_noop() {
        let mut dest = PixelBuffer::with_size(4, 4);
        let source = solid(2, 2, [5, 5, 5, 5]);
        for (x, y) in [(-2, 0), (0, -2), (4, 0), (0, 4), (-100, -100)] {
            dest.paste_region(&source, x, y, 1.0).unwrap();
        }
        assert_eq!(dest, PixelBuffer::with_size(4, 4));
    }

    #[test]
    fn test_paste_region_oversized_source() {
        let mut dest = PixelBuffer::with_size(2, 2);
        let source = coordinate_buffer(8, 8);
        dest.paste_region(&source, -1, -1, 1.0).unwrap();
        assert_eq!(dest.pixel(0, 0), Some([1, 1, 0, 255]));
        assert_eq!(dest.pixel(1, 1), Some([2, 2, 0, 255]));
    }

    #[test]
    fn test_paste_region_scaled() {
        let mut dest = PixelBuffer::with_size(4, 4);
        let source = solid(4, 4, [50, 100, 150, 255]);
        dest.paste_region(&source, 2, 2, 0.5).unwrap();

        assert_eq!(dest.pixel(1, 1), Some([0, 0, 0, 0]));
        assert_eq!(dest.pixel(2, 2), Some([50, 100, 150, 255]));
        assert_eq!(dest.pixel(3, 3), Some([50, 100, 150, 255]));
    }

    #[test]
    fn test_paste_region_scaled_to_nothing() {
        let mut dest = PixelBuffer::with_size(2, 2);
        let source = solid(1, 1, [5, 5, 5, 5]);
        dest.paste_region(&source, 0, 0, 0.25).unwrap();
        assert_eq!(dest, PixelBuffer::with_size(2, 2));
    }

    #[test]
    fn test_write_texture_data_checks_dimensions() {
        let mut file = VtfFile::create(8, 8, ImageFormat::Dxt5, 2).unwrap();
        assert!(PixelBuffer::with_size(8, 8).write_texture_data(&mut file, 0).is_ok());
        assert!(PixelBuffer::with_size(4, 4).write_texture_data(&mut file, 1).is_ok());
        assert!(PixelBuffer::with_size(8, 8).write_texture_data(&mut file, 1).is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let mut buffer = PixelBuffer::new();
        let result = buffer.load_file("tile.bmp");
        assert!(matches!(result, Err(VoxtexError::UnsupportedImage(_))));
    }
}
