//! In-memory VTF texture container with reading and writing.

use super::format::{convert_from_rgba8888, convert_to_rgba8888, resize, ImageFormat};
use crate::error::{Result, VoxtexError};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read, Write};
use std::path::Path;

const SIGNATURE: &[u8; 4] = b"VTF\0";
const MAJOR_VERSION: u32 = 7;
const WRITE_MINOR_VERSION: u32 = 2;
const MAX_MINOR_VERSION: u32 = 5;
const HEADER_SIZE_7_2: u32 = 80;

const RESOURCE_LOW_RES: [u8; 3] = [0x01, 0x00, 0x00];
const RESOURCE_HIGH_RES: [u8; 3] = [0x30, 0x00, 0x00];

const THUMBNAIL_MAX_SIZE: u32 = 16;
const NO_FORMAT: i32 = -1;

bitflags::bitflags! {
    /// Texture flag bits stored in the VTF header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureFlags: u32 {
        const POINTSAMPLE = 0x0000_0001;
        const TRILINEAR = 0x0000_0002;
        const CLAMPS = 0x0000_0004;
        const CLAMPT = 0x0000_0008;
        const ANISOTROPIC = 0x0000_0010;
        const HINT_DXT5 = 0x0000_0020;
        const SRGB = 0x0000_0040;
        const NORMAL = 0x0000_0080;
        const NOMIP = 0x0000_0100;
        const NOLOD = 0x0000_0200;
        const ALL_MIPS = 0x0000_0400;
        const PROCEDURAL = 0x0000_0800;
        const ONEBITALPHA = 0x0000_1000;
        const EIGHTBITALPHA = 0x0000_2000;
        const ENVMAP = 0x0000_4000;
    }
}

/// Number of mip levels for a `width` x `height` x `depth` image, halving
/// every axis until all reach one.
pub fn compute_mipmap_count(width: u32, height: u32, depth: u32) -> u32 {
    let (mut width, mut height, mut depth) = (width, height, depth);
    let mut count = 1;
    while width > 1 || height > 1 || depth > 1 {
        width = (width / 2).max(1);
        height = (height / 2).max(1);
        depth = (depth / 2).max(1);
        count += 1;
    }
    count
}

/// Dimensions of mip `level` of a `width` x `height` image.
pub fn mip_dimensions(width: u32, height: u32, level: u32) -> (u32, u32) {
    (
        width.checked_shr(level).unwrap_or(0).max(1),
        height.checked_shr(level).unwrap_or(0).max(1),
    )
}

/// The low resolution preview image stored ahead of the mip chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Thumbnail {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// A single VTF texture: header fields plus image data for every mip level.
#[derive(Debug, Clone)]
pub struct VtfFile {
    version: (u32, u32),
    width: u32,
    height: u32,
    depth: u32,
    flags: TextureFlags,
    frames: u32,
    first_frame: u16,
    reflectivity: [f32; 3],
    bumpmap_scale: f32,
    format: ImageFormat,
    /// One buffer per mip level, level 0 first. Each holds every
    /// frame, face and slice of that level in file order.
    mips: Vec<Vec<u8>>,
    thumbnail: Option<Thumbnail>,
}

impl VtfFile {
    /// Create a single-frame 2D texture with `mip_levels` zero-filled levels.
    pub fn create(width: u32, height: u32, format: ImageFormat, mip_levels: u32) -> Result<Self> {
        if width == 0 || height == 0 || width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(VoxtexError::Vtf(format!(
                "texture dimensions {}x{} are outside 1..=65535",
                width, height
            )));
        }
        let max_levels = compute_mipmap_count(width, height, 1);
        if mip_levels == 0 || mip_levels > max_levels {
            return Err(VoxtexError::Vtf(format!(
                "{} mip levels requested, a {}x{} texture holds 1..={}",
                mip_levels, width, height, max_levels
            )));
        }

        let mips = (0..mip_levels)
            .map(|level| {
                let (w, h) = mip_dimensions(width, height, level);
                vec![0u8; format.bytes_for(w, h)]
            })
            .collect();

        let mut flags = TextureFlags::empty();
        flags.set(TextureFlags::EIGHTBITALPHA, format.has_eight_bit_alpha());
        flags.set(TextureFlags::ONEBITALPHA, format == ImageFormat::Dxt1OneBitAlpha);
        flags.set(TextureFlags::NOMIP, mip_levels == 1);
        flags.set(TextureFlags::NOLOD, mip_levels == 1);

        Ok(Self {
            version: (MAJOR_VERSION, WRITE_MINOR_VERSION),
            width,
            height,
            depth: 1,
            flags,
            frames: 1,
            first_frame: 0,
            reflectivity: [0.0; 3],
            bumpmap_scale: 1.0,
            format,
            mips,
            thumbnail: None,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn version(&self) -> (u32, u32) {
        self.version
    }

    pub fn flags(&self) -> TextureFlags {
        self.flags
    }

    pub fn frame_count(&self) -> u32 {
        self.frames
    }

    pub fn mip_count(&self) -> u32 {
        self.mips.len() as u32
    }

    pub fn reflectivity(&self) -> [f32; 3] {
        self.reflectivity
    }

    pub fn thumbnail(&self) -> Option<&Thumbnail> {
        self.thumbnail.as_ref()
    }

    /// Enable or disable a header flag.
    pub fn set_flag(&mut self, flag: TextureFlags, enabled: bool) {
        self.flags.set(flag, enabled);
    }

    /// Dimensions of one mip level.
    pub fn mip_dimensions(&self, level: u32) -> (u32, u32) {
        mip_dimensions(self.width, self.height, level)
    }

    fn face_count(&self) -> u32 {
        if self.flags.contains(TextureFlags::ENVMAP) {
            6
        } else {
            1
        }
    }

    fn slices_at(&self, level: u32) -> u32 {
        self.depth.checked_shr(level).unwrap_or(0).max(1)
    }

    /// Size of a single frame/face/slice image at `level`.
    fn image_size(&self, level: u32) -> usize {
        let (w, h) = self.mip_dimensions(level);
        self.format.bytes_for(w, h)
    }

    /// Size of every image stored at `level`.
    fn level_size(&self, level: u32) -> usize {
        self.image_size(level)
            * self.frames as usize
            * self.face_count() as usize
            * self.slices_at(level) as usize
    }

    /// Raw image data of the first frame, face and slice at `level`.
    pub fn data(&self, level: u32) -> Option<&[u8]> {
        let size = self.image_size(level);
        self.mips
            .get(level as usize)
            .and_then(|data| data.get(..size))
    }

    /// Replace the image data of a single-frame texture at `level`.
    pub fn set_data(&mut self, level: u32, data: Vec<u8>) -> Result<()> {
        let expected = self.level_size(level);
        let mip_count = self.mip_count();
        let slot = self.mips.get_mut(level as usize).ok_or_else(|| {
            VoxtexError::Vtf(format!(
                "mip level {} does not exist, texture has {} levels",
                level, mip_count
            ))
        })?;
        if data.len() != expected {
            return Err(VoxtexError::Vtf(format!(
                "mip level {} expects {} bytes, got {}",
                level,
                expected,
                data.len()
            )));
        }
        *slot = data;
        Ok(())
    }

    /// Decode the first frame, face and slice at `level` to RGBA8888.
    pub fn to_rgba8888(&self, level: u32) -> Result<Vec<u8>> {
        let data = self
            .data(level)
            .ok_or_else(|| VoxtexError::Vtf(format!("mip level {} does not exist", level)))?;
        let (w, h) = self.mip_dimensions(level);
        convert_to_rgba8888(data, w, h, self.format)
    }

    /// Store the average linear colour of `rgba` as the texture reflectivity.
    pub fn compute_reflectivity(&mut self, rgba: &[u8]) {
        let mut sum = [0f64; 3];
        let mut count = 0usize;
        for pixel in rgba.chunks_exact(4) {
            for (total, &channel) in sum.iter_mut().zip(pixel) {
                *total += (f64::from(channel) / 255.0).powf(2.2);
            }
            count += 1;
        }
        if count > 0 {
            self.reflectivity = sum.map(|total| (total / count as f64) as f32);
        }
    }

    /// Build the DXT1 preview image from the full resolution RGBA data.
    pub fn generate_thumbnail(&mut self, rgba: &[u8], width: u32, height: u32) -> Result<()> {
        let (mut thumb_width, mut thumb_height) = (width, height);
        while thumb_width > THUMBNAIL_MAX_SIZE || thumb_height > THUMBNAIL_MAX_SIZE {
            thumb_width = (thumb_width / 2).max(1);
            thumb_height = (thumb_height / 2).max(1);
        }

        let scaled = resize(rgba, width, height, thumb_width, thumb_height)?;
        let data = convert_from_rgba8888(&scaled, thumb_width, thumb_height, ImageFormat::Dxt1)?;
        self.thumbnail = Some(Thumbnail {
            format: ImageFormat::Dxt1,
            width: thumb_width,
            height: thumb_height,
            data,
        });
        Ok(())
    }

    /// Serialize as a VTF 7.2 file.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        let (width, height, depth) = (
            header_u16(self.width, "width")?,
            header_u16(self.height, "height")?,
            header_u16(self.depth, "depth")?,
        );
        let frames = header_u16(self.frames, "frame count")?;
        let mip_count = u8::try_from(self.mips.len())
            .map_err(|_| VoxtexError::Vtf("too many mip levels".to_string()))?;

        out.write_all(SIGNATURE)?;
        out.write_u32::<LittleEndian>(MAJOR_VERSION)?;
        out.write_u32::<LittleEndian>(WRITE_MINOR_VERSION)?;
        out.write_u32::<LittleEndian>(HEADER_SIZE_7_2)?;
        out.write_u16::<LittleEndian>(width)?;
        out.write_u16::<LittleEndian>(height)?;
        out.write_u32::<LittleEndian>(self.flags.bits())?;
        out.write_u16::<LittleEndian>(frames)?;
        out.write_u16::<LittleEndian>(self.first_frame)?;
        out.write_all(&[0; 4])?;
        for value in self.reflectivity {
            out.write_f32::<LittleEndian>(value)?;
        }
        out.write_all(&[0; 4])?;
        out.write_f32::<LittleEndian>(self.bumpmap_scale)?;
        out.write_i32::<LittleEndian>(self.format.id())?;
        out.write_u8(mip_count)?;
        match &self.thumbnail {
            Some(thumbnail) => {
                out.write_i32::<LittleEndian>(thumbnail.format.id())?;
                out.write_u8(header_u8(thumbnail.width, "thumbnail width")?)?;
                out.write_u8(header_u8(thumbnail.height, "thumbnail height")?)?;
            }
            None => {
                out.write_i32::<LittleEndian>(NO_FORMAT)?;
                out.write_u8(0)?;
                out.write_u8(0)?;
            }
        }
        out.write_u16::<LittleEndian>(depth)?;
        // 65 bytes written, pad out to the 80 byte 7.2 header.
        out.write_all(&[0; 15])?;

        if let Some(thumbnail) = &self.thumbnail {
            out.write_all(&thumbnail.data)?;
        }
        for level in self.mips.iter().rev() {
            out.write_all(level)?;
        }
        Ok(())
    }

    /// Write the texture to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Read a texture from `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Parse a VTF 7.0 - 7.5 file.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let header = Header::read(&mut cursor).map_err(|e| match e {
            VoxtexError::Io(io) => VoxtexError::Vtf(format!("truncated header: {}", io)),
            other => other,
        })?;

        let format = ImageFormat::from_id(header.format).ok_or_else(|| {
            VoxtexError::Vtf(format!("unsupported image format id {}", header.format))
        })?;

        let mut file = Self {
            version: header.version,
            width: u32::from(header.width),
            height: u32::from(header.height),
            depth: u32::from(header.depth.max(1)),
            flags: TextureFlags::from_bits_retain(header.flags),
            frames: u32::from(header.frames.max(1)),
            first_frame: header.first_frame,
            reflectivity: header.reflectivity,
            bumpmap_scale: header.bumpmap_scale,
            format,
            mips: Vec::new(),
            thumbnail: None,
        };
        if file.width == 0 || file.height == 0 || header.mip_count == 0 {
            return Err(VoxtexError::Vtf(format!(
                "invalid texture of {}x{} with {} mip levels",
                file.width, file.height, header.mip_count
            )));
        }

        let low_res_size = match ImageFormat::from_id(header.low_res_format) {
            Some(low_format) if header.low_res_width > 0 && header.low_res_height > 0 => {
                let width = u32::from(header.low_res_width);
                let height = u32::from(header.low_res_height);
                let size = low_format.bytes_for(width, height);
                let offset = header.low_res_offset.unwrap_or(header.header_size as usize);
                let data = slice_at(bytes, offset, size, "thumbnail")?;
                file.thumbnail = Some(Thumbnail {
                    format: low_format,
                    width,
                    height,
                    data: data.to_vec(),
                });
                size
            }
            _ => 0,
        };

        // Mip levels are stored smallest first.
        let mut offset = header
            .high_res_offset
            .unwrap_or(header.header_size as usize + low_res_size);
        let mut mips = vec![Vec::new(); usize::from(header.mip_count)];
        for level in (0..u32::from(header.mip_count)).rev() {
            let size = file.level_size(level);
            let data = slice_at(bytes, offset, size, "image data")?;
            mips[level as usize] = data.to_vec();
            offset += size;
        }
        file.mips = mips;

        Ok(file)
    }
}

fn header_u16(value: u32, what: &str) -> Result<u16> {
    u16::try_from(value).map_err(|_| VoxtexError::Vtf(format!("{} {} does not fit the header", what, value)))
}

fn header_u8(value: u32, what: &str) -> Result<u8> {
    u8::try_from(value).map_err(|_| VoxtexError::Vtf(format!("{} {} does not fit the header", what, value)))
}

fn slice_at<'a>(bytes: &'a [u8], offset: usize, size: usize, what: &str) -> Result<&'a [u8]> {
    offset
        .checked_add(size)
        .and_then(|end| bytes.get(offset..end))
        .ok_or_else(|| {
            VoxtexError::Vtf(format!(
                "{} needs {} bytes at offset {}, file is {} bytes",
                what,
                size,
                offset,
                bytes.len()
            ))
        })
}

/// Raw header fields, before validation.
struct Header {
    version: (u32, u32),
    header_size: u32,
    width: u16,
    height: u16,
    flags: u32,
    frames: u16,
    first_frame: u16,
    reflectivity: [f32; 3],
    bumpmap_scale: f32,
    format: i32,
    mip_count: u8,
    low_res_format: i32,
    low_res_width: u8,
    low_res_height: u8,
    depth: u16,
    low_res_offset: Option<usize>,
    high_res_offset: Option<usize>,
}

impl Header {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut signature = [0u8; 4];
        reader.read_exact(&mut signature)?;
        if &signature != SIGNATURE {
            return Err(VoxtexError::Vtf("missing VTF signature".to_string()));
        }

        let major = reader.read_u32::<LittleEndian>()?;
        let minor = reader.read_u32::<LittleEndian>()?;
        if major != MAJOR_VERSION || minor > MAX_MINOR_VERSION {
            return Err(VoxtexError::Vtf(format!("unsupported version {}.{}", major, minor)));
        }

        let header_size = reader.read_u32::<LittleEndian>()?;
        let width = reader.read_u16::<LittleEndian>()?;
        let height = reader.read_u16::<LittleEndian>()?;
        let flags = reader.read_u32::<LittleEndian>()?;
        let frames = reader.read_u16::<LittleEndian>()?;
        let first_frame = reader.read_u16::<LittleEndian>()?;
        skip(reader, 4)?;
        let mut reflectivity = [0f32; 3];
        for value in &mut reflectivity {
            *value = reader.read_f32::<LittleEndian>()?;
        }
        skip(reader, 4)?;
        let bumpmap_scale = reader.read_f32::<LittleEndian>()?;
        let format = reader.read_i32::<LittleEndian>()?;
        let mip_count = reader.read_u8()?;
        let low_res_format = reader.read_i32::<LittleEndian>()?;
        let low_res_width = reader.read_u8()?;
        let low_res_height = reader.read_u8()?;

        let depth = if minor >= 2 {
            reader.read_u16::<LittleEndian>()?
        } else {
            1
        };

        let mut low_res_offset = None;
        let mut high_res_offset = None;
        if minor >= 3 {
            skip(reader, 3)?;
            let resource_count = reader.read_u32::<LittleEndian>()?;
            skip(reader, 8)?;
            for _ in 0..resource_count {
                let mut tag = [0u8; 3];
                reader.read_exact(&mut tag)?;
                let _resource_flags = reader.read_u8()?;
                let data = reader.read_u32::<LittleEndian>()? as usize;
                match tag {
                    RESOURCE_LOW_RES => low_res_offset = Some(data),
                    RESOURCE_HIGH_RES => high_res_offset = Some(data),
                    _ => {}
                }
            }
            if high_res_offset.is_none() {
                return Err(VoxtexError::Vtf("no high resolution image resource".to_string()));
            }
        }

        Ok(Self {
            version: (major, minor),
            header_size,
            width,
            height,
            flags,
            frames,
            first_frame,
            reflectivity,
            bumpmap_scale,
            format,
            mip_count,
            low_res_format,
            low_res_width,
            low_res_height,
            depth,
            low_res_offset,
            high_res_offset,
        })
    }
}

fn skip<R: Read>(reader: &mut R, count: usize) -> Result<()> {
    let mut buffer = [0u8; 16];
    reader.read_exact(&mut buffer[..count])?;
    Ok(())
}
