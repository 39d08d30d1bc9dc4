//! VTF pixel formats and conversion to and from RGBA8888.

use crate::error::{Result, VoxtexError};
use image::imageops::{self, FilterType};
use image::RgbaImage;
use texpresso::{Algorithm, Format, Params, COLOUR_WEIGHTS_PERCEPTUAL};

/// Pixel formats understood by the VTF container.
///
/// Discriminants are the format ids stored in the VTF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Rgba8888 = 0,
    Abgr8888 = 1,
    Rgb888 = 2,
    Bgr888 = 3,
    I8 = 5,
    Ia88 = 6,
    A8 = 8,
    Bgra8888 = 12,
    Dxt1 = 13,
    Dxt3 = 14,
    Dxt5 = 15,
    Bgrx8888 = 16,
    Dxt1OneBitAlpha = 20,
}

impl ImageFormat {
    /// Look up a format from its header id.
    pub fn from_id(id: i32) -> Option<Self> {
        Some(match id {
            0 => Self::Rgba8888,
            1 => Self::Abgr8888,
            2 => Self::Rgb888,
            3 => Self::Bgr888,
            5 => Self::I8,
            6 => Self::Ia88,
            8 => Self::A8,
            12 => Self::Bgra8888,
            13 => Self::Dxt1,
            14 => Self::Dxt3,
            15 => Self::Dxt5,
            16 => Self::Bgrx8888,
            20 => Self::Dxt1OneBitAlpha,
            _ => return None,
        })
    }

    /// Header id of this format.
    pub fn id(self) -> i32 {
        self as i32
    }

    /// Block compressor backing this format, if it is block compressed.
    fn block_format(self) -> Option<Format> {
        match self {
            Self::Dxt1 | Self::Dxt1OneBitAlpha => Some(Format::Bc1),
            Self::Dxt3 => Some(Format::Bc2),
            Self::Dxt5 => Some(Format::Bc3),
            _ => None,
        }
    }

    pub fn is_compressed(self) -> bool {
        self.block_format().is_some()
    }

    /// Whether the format carries a full 8-bit alpha channel.
    pub fn has_eight_bit_alpha(self) -> bool {
        matches!(
            self,
            Self::Rgba8888
                | Self::Abgr8888
                | Self::Bgra8888
                | Self::Ia88
                | Self::A8
                | Self::Dxt3
                | Self::Dxt5
        )
    }

    fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8888 | Self::Abgr8888 | Self::Bgra8888 | Self::Bgrx8888 => 4,
            Self::Rgb888 | Self::Bgr888 => 3,
            Self::Ia88 => 2,
            Self::I8 | Self::A8 => 1,
            // Block formats are sized per 4x4 block in `bytes_for`.
            Self::Dxt1 | Self::Dxt1OneBitAlpha | Self::Dxt3 | Self::Dxt5 => 0,
        }
    }

    /// Number of bytes one `width` x `height` image occupies in this format.
    ///
    /// Block formats round partial blocks up to a whole 4x4 block.
    pub fn bytes_for(self, width: u32, height: u32) -> usize {
        let (width, height) = (width as usize, height as usize);
        match self.block_format() {
            Some(block) => block.compressed_size(width.max(1), height.max(1)),
            None => width * height * self.bytes_per_pixel(),
        }
    }
}

fn compression_params() -> Params {
    Params {
        algorithm: Algorithm::RangeFit,
        weights: COLOUR_WEIGHTS_PERCEPTUAL,
        weigh_colour_by_alpha: true,
    }
}

/// Convert `data` in `format` to tightly packed RGBA8888.
pub fn convert_to_rgba8888(
    data: &[u8],
    width: u32,
    height: u32,
    format: ImageFormat,
) -> Result<Vec<u8>> {
    let expected = format.bytes_for(width, height);
    if data.len() < expected {
        return Err(VoxtexError::Vtf(format!(
            "{:?} image of {}x{} needs {} bytes, got {}",
            format,
            width,
            height,
            expected,
            data.len()
        )));
    }
    let data = &data[..expected];
    let pixel_count = width as usize * height as usize;

    let mut rgba = Vec::with_capacity(pixel_count * 4);
    match format {
        ImageFormat::Dxt1 | ImageFormat::Dxt1OneBitAlpha | ImageFormat::Dxt3 | ImageFormat::Dxt5 => {
            rgba.resize(pixel_count * 4, 0);
            if let Some(block) = format.block_format() {
                block.decompress(data, width as usize, height as usize, &mut rgba);
            }
        }
        ImageFormat::Rgba8888 => rgba.extend_from_slice(data),
        ImageFormat::Abgr8888 => {
            for p in data.chunks_exact(4) {
                rgba.extend_from_slice(&[p[3], p[2], p[1], p[0]]);
            }
        }
        ImageFormat::Rgb888 => {
            for p in data.chunks_exact(3) {
                rgba.extend_from_slice(&[p[0], p[1], p[2], 255]);
            }
        }
        ImageFormat::Bgr888 => {
            for p in data.chunks_exact(3) {
                rgba.extend_from_slice(&[p[2], p[1], p[0], 255]);
            }
        }
        ImageFormat::Bgra8888 => {
            for p in data.chunks_exact(4) {
                rgba.extend_from_slice(&[p[2], p[1], p[0], p[3]]);
            }
        }
        ImageFormat::Bgrx8888 => {
            for p in data.chunks_exact(4) {
                rgba.extend_from_slice(&[p[2], p[1], p[0], 255]);
            }
        }
        ImageFormat::I8 => {
            for &i in data {
                rgba.extend_from_slice(&[i, i, i, 255]);
            }
        }
        ImageFormat::Ia88 => {
            for p in data.chunks_exact(2) {
                rgba.extend_from_slice(&[p[0], p[0], p[0], p[1]]);
            }
        }
        ImageFormat::A8 => {
            for &a in data {
                rgba.extend_from_slice(&[0, 0, 0, a]);
            }
        }
    }
    Ok(rgba)
}

/// Convert tightly packed RGBA8888 into `format`.
pub fn convert_from_rgba8888(
    rgba: &[u8],
    width: u32,
    height: u32,
    format: ImageFormat,
) -> Result<Vec<u8>> {
    let pixel_count = width as usize * height as usize;
    if rgba.len() != pixel_count * 4 {
        return Err(VoxtexError::InvalidBuffer(format!(
            "expected {} RGBA bytes for {}x{}, got {}",
            pixel_count * 4,
            width,
            height,
            rgba.len()
        )));
    }

    if let Some(block) = format.block_format() {
        let mut compressed = vec![0u8; format.bytes_for(width, height)];
        if pixel_count > 0 {
            block.compress(
                rgba,
                width as usize,
                height as usize,
                compression_params(),
                &mut compressed,
            );
        }
        return Ok(compressed);
    }

    let converted = match format {
        ImageFormat::Rgba8888 => rgba.to_vec(),
        ImageFormat::Bgra8888 => rgba
            .chunks_exact(4)
            .flat_map(|p| [p[2], p[1], p[0], p[3]])
            .collect(),
        ImageFormat::Rgb888 => rgba.chunks_exact(4).flat_map(|p| [p[0], p[1], p[2]]).collect(),
        ImageFormat::Bgr888 => rgba.chunks_exact(4).flat_map(|p| [p[2], p[1], p[0]]).collect(),
        other => {
            return Err(VoxtexError::Vtf(format!(
                "conversion from RGBA8888 to {:?} is not supported",
                other
            )))
        }
    };
    Ok(converted)
}

/// Resample an RGBA8888 image to `new_width` x `new_height`.
pub fn resize(
    rgba: &[u8],
    width: u32,
    height: u32,
    new_width: u32,
    new_height: u32,
) -> Result<Vec<u8>> {
    let image = RgbaImage::from_raw(width, height, rgba.to_vec()).ok_or_else(|| {
        VoxtexError::InvalidBuffer(format!(
            "{} bytes do not hold a {}x{} RGBA image",
            rgba.len(),
            width,
            height
        ))
    })?;
    Ok(imageops::resize(&image, new_width, new_height, FilterType::Triangle).into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ids_round_trip() {
        for format in [
            ImageFormat::Rgba8888,
            ImageFormat::Bgr888,
            ImageFormat::Dxt1,
            ImageFormat::Dxt5,
        ] {
            assert_eq!(ImageFormat::from_id(format.id()), Some(format));
        }
        assert_eq!(ImageFormat::from_id(-1), None);
        assert_eq!(ImageFormat::from_id(24), None);
    }

    #[test]
    fn test_bytes_for() {
        assert_eq!(ImageFormat::Rgba8888.bytes_for(4, 2), 32);
        assert_eq!(ImageFormat::Bgr888.bytes_for(4, 2), 24);
        // DXT5 stores one byte per pixel, rounded up to 4x4 blocks of 16 bytes.
        assert_eq!(ImageFormat::Dxt5.bytes_for(8, 8), 64);
        assert_eq!(ImageFormat::Dxt5.bytes_for(1, 1), 16);
        assert_eq!(ImageFormat::Dxt1.bytes_for(8, 4), 16);
    }

    #[test]
    fn test_bgr_conversion() {
        let bgr = [1, 2, 3, 4, 5, 6];
        let rgba = convert_to_rgba8888(&bgr, 2, 1, ImageFormat::Bgr888).unwrap();
        assert_eq!(rgba, vec![3, 2, 1, 255, 6, 5, 4, 255]);

        let back = convert_from_rgba8888(&rgba, 2, 1, ImageFormat::Bgr888).unwrap();
        assert_eq!(back, bgr.to_vec());
    }

    #[test]
    fn test_dxt5_solid_color() {
        let rgba: Vec<u8> = [255u8, 0, 0, 255].repeat(16);
        let compressed = convert_from_rgba8888(&rgba, 4, 4, ImageFormat::Dxt5).unwrap();
        assert_eq!(compressed.len(), 16);

        let decoded = convert_to_rgba8888(&compressed, 4, 4, ImageFormat::Dxt5).unwrap();
        for pixel in decoded.chunks_exact(4) {
            assert!(pixel[0] > 240);
            assert!(pixel[1] < 16);
            assert!(pixel[2] < 16);
            assert_eq!(pixel[3], 255);
        }
    }

    #[test]
    fn test_truncated_data_rejected() {
        let result = convert_to_rgba8888(&[0u8; 8], 4, 4, ImageFormat::Dxt5);
        assert!(matches!(result, Err(VoxtexError::Vtf(_))));
    }

    #[test]
    fn test_unsupported_target_format() {
        let rgba = [0u8; 4];
        let result = convert_from_rgba8888(&rgba, 1, 1, ImageFormat::Ia88);
        assert!(matches!(result, Err(VoxtexError::Vtf(_))));
    }

    #[test]
    fn test_resize_halves() {
        let rgba: Vec<u8> = [10u8, 20, 30, 255].repeat(16);
        let resized = resize(&rgba, 4, 4, 2, 2).unwrap();
        assert_eq!(resized.len(), 2 * 2 * 4);
        assert_eq!(&resized[0..4], &[10, 20, 30, 255]);
    }
}
