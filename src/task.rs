//! The `pack` and `slice` tasks.

use crate::atlas::{AtlasComposer, AtlasGeometry};
use crate::error::{Result, VoxtexError};
use crate::pixel::PixelBuffer;
use crate::slice::SliceSplitter;
use crate::tileset::TileSet;
use crate::vtf::{ImageFormat, TextureFlags, VtfFile};
use std::path::{Path, PathBuf};

/// Largest atlas edge the VTF header can describe.
pub const MAX_ATLAS_SIZE: u64 = u16::MAX as u64;

/// Options for packing a tile directory.
#[derive(Debug, Clone, Default)]
pub struct PackOptions {
    /// Skip mipmaps and mark the texture point-sampled.
    pub simple: bool,
    /// Wrap every tile in a border of its own opposite edges.
    pub pad: bool,
    /// Also write the atlas layout as JSON to this path.
    pub manifest: Option<PathBuf>,
}

impl PackOptions {
    pub fn with_simple(mut self, simple: bool) -> Self {
        self.simple = simple;
        self
    }

    pub fn with_padding(mut self, pad: bool) -> Self {
        self.pad = pad;
        self
    }

    pub fn with_manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest = Some(path.into());
        self
    }
}

/// Summary of a finished pack.
#[derive(Debug, Clone)]
pub struct PackReport {
    pub geometry: AtlasGeometry,
    /// Number of tiles loaded (gaps not counted).
    pub tiles_loaded: usize,
    /// Tile size as loaded, before padding.
    pub source_tile_size: u32,
    /// File whose dimensions every other tile had to match.
    pub reference_file: String,
    pub output: PathBuf,
    pub manifest: Option<PathBuf>,
}

/// Summary of a finished slice.
#[derive(Debug, Clone)]
pub struct SliceReport {
    pub tile_width: u32,
    pub tile_height: u32,
    pub count: u32,
    pub output_dir: PathBuf,
}

/// Pack every PNG directly inside `source_dir` into a DXT5 VTF atlas at
/// `dest_file`.
///
/// Input errors are reported before anything is written.
pub fn pack<P, Q>(source_dir: P, dest_file: Q, options: &PackOptions) -> Result<PackReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let source_dir = source_dir.as_ref();
    let dest_file = dest_file.as_ref();
    if !source_dir.is_dir() {
        return Err(VoxtexError::DirectoryNotFound(source_dir.to_path_buf()));
    }

    let tiles = TileSet::from_directory(source_dir)?;
    let tiles_loaded = tiles.len();
    let source_tile_size = tiles.tile_size();
    let reference_file = tiles.reference_name().unwrap_or_default().to_string();

    let composer = AtlasComposer::new(tiles, options.simple, options.pad)?;
    let geometry = *composer.geometry();
    let (width, height) = geometry.pixel_size();
    if width > MAX_ATLAS_SIZE || height > MAX_ATLAS_SIZE {
        return Err(VoxtexError::AtlasTooLarge { width, height });
    }
    tracing::info!(
        "Atlas dimensions are {} x {} tiles / {} x {} pixels.",
        geometry.grid_width,
        geometry.grid_height,
        width,
        height
    );

    let mut texture = VtfFile::create(
        width as u32,
        height as u32,
        ImageFormat::Dxt5,
        geometry.mip_levels,
    )?;
    texture.set_flag(TextureFlags::POINTSAMPLE, options.simple);

    for level in 0..geometry.mip_levels {
        let image = composer.compose_level(level)?;
        if level == 0 {
            texture.compute_reflectivity(image.pixels());
            texture.generate_thumbnail(image.pixels(), image.width(), image.height())?;
        }
        image
            .write_texture_data(&mut texture, level)
            .map_err(|e| VoxtexError::TextureWrite {
                level,
                source: Box::new(e),
            })?;
        tracing::info!("Composed mip level {}.", level);
    }

    texture
        .save(dest_file)
        .map_err(|e| VoxtexError::save(dest_file, e))?;

    if let Some(manifest) = &options.manifest {
        composer
            .layout()
            .save_json(manifest)
            .map_err(|e| VoxtexError::save(manifest, e))?;
    }

    tracing::info!(
        "Packed {} tiles into {} ({}x{}, {} mip levels)",
        tiles_loaded,
        dest_file.display(),
        width,
        height,
        geometry.mip_levels
    );

    Ok(PackReport {
        geometry,
        tiles_loaded,
        source_tile_size,
        reference_file,
        output: dest_file.to_path_buf(),
        manifest: options.manifest.clone(),
    })
}

/// Cut `source_file` (PNG or VTF) into `columns` x `rows` square tiles
/// saved as `0.png`, `1.png`, ... in the existing directory `dest_dir`.
pub fn slice<P, Q>(source_file: P, dest_dir: Q, columns: u32, rows: u32) -> Result<SliceReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let source_file = source_file.as_ref();
    let dest_dir = dest_dir.as_ref();
    if !dest_dir.is_dir() {
        return Err(VoxtexError::DirectoryNotFound(dest_dir.to_path_buf()));
    }

    let image = PixelBuffer::open(source_file).map_err(|e| VoxtexError::load(source_file, e))?;
    let splitter = SliceSplitter::new(columns, rows);
    let (tile_width, tile_height) = splitter.tile_size(&image)?;
    tracing::debug!("Output dimensions: {} x {}", tile_width, tile_height);

    let count = splitter.count();
    for index in 0..count {
        let path = dest_dir.join(format!("{}.png", index));
        splitter
            .slice(&image, index)
            .and_then(|tile| tile.save_png(&path))
            .map_err(|e| VoxtexError::SliceSave {
                index: index + 1,
                total: count,
                path: path.clone(),
                source: Box::new(e),
            })?;
    }

    tracing::info!("Sliced {} into {} tiles", source_file.display(), count);

    Ok(SliceReport {
        tile_width,
        tile_height,
        count,
        output_dir: dest_dir.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_options_builders() {
        let options = PackOptions::default()
            .with_simple(true)
            .with_padding(true)
            .with_manifest("atlas.json");
        assert!(options.simple);
        assert!(options.pad);
        assert_eq!(options.manifest, Some(PathBuf::from("atlas.json")));
    }

    #[test]
    fn test_pack_missing_directory() {
        let result = pack("/no/such/tiles", "/tmp/never-written.vtf", &PackOptions::default());
        assert!(matches!(result, Err(VoxtexError::DirectoryNotFound(_))));
    }

    #[test]
    fn test_slice_missing_output_directory() {
        let result = slice("atlas.png", "/no/such/output/dir", 2, 2);
        assert!(matches!(result, Err(VoxtexError::DirectoryNotFound(_))));
    }
}
