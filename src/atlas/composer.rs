//! Per-mip composition of a tile set into atlas images.

use super::geometry::AtlasGeometry;
use super::layout::AtlasLayout;
use crate::error::{Result, VoxtexError};
use crate::pixel::PixelBuffer;
use crate::tileset::TileSet;

/// Surround a tile with wrapped copies of its own edges.
///
/// An `s` x `s` tile becomes `2s` x `2s`: the tile is laid out 3x3 and the
/// central `2s` window kept, so the original sits at (`s/2`, `s/2`) and each
/// border holds the opposite edge. Odd sizes truncate `s/2`.
pub fn pad_tile(tile: &PixelBuffer) -> Result<PixelBuffer> {
    let size = tile.width();
    let mut padded = PixelBuffer::with_size(size * 2, tile.height() * 2);

    let size = size as i32;
    let offsets = [-size / 2, size / 2, size / 2 + size];
    for y in offsets {
        for x in offsets {
            padded.paste_region(tile, x, y, 1.0)?;
        }
    }
    Ok(padded)
}

/// Builds the atlas image for every mip level from a tile set.
#[derive(Debug)]
pub struct AtlasComposer {
    tiles: TileSet,
    geometry: AtlasGeometry,
    padded: bool,
}

impl AtlasComposer {
    /// Prepare composition, padding every tile first when `pad` is set.
    pub fn new(tiles: TileSet, simple: bool, pad: bool) -> Result<Self> {
        if tiles.is_empty() {
            return Err(VoxtexError::NoTiles);
        }

        let tiles = if pad {
            tiles.map_images(pad_tile)?
        } else {
            tiles
        };
        let geometry = AtlasGeometry::new(tiles.tile_count(), tiles.tile_size(), simple);
        tracing::debug!(
            "Atlas grid {}x{} tiles of {} px, {} mip levels",
            geometry.grid_width,
            geometry.grid_height,
            geometry.tile_size,
            geometry.mip_levels
        );

        Ok(Self {
            tiles,
            geometry,
            padded: pad,
        })
    }

    pub fn geometry(&self) -> &AtlasGeometry {
        &self.geometry
    }

    pub fn tiles(&self) -> &TileSet {
        &self.tiles
    }

    pub fn is_padded(&self) -> bool {
        self.padded
    }

    /// Compose mip `level`; level 0 is full resolution.
    ///
    /// The buffer has the texture's mip dimensions. Slots without a tile,
    /// and any strip left over when the tile size is not a power of two,
    /// stay transparent black.
    pub fn compose_level(&self, level: u32) -> Result<PixelBuffer> {
        let mip_tile = self.geometry.mip_tile_size(level);
        let scale = 0.5f64.powi(level as i32);
        let (width, height) = self.geometry.level_size(level);
        let mut atlas = PixelBuffer::with_size(width as u32, height as u32);

        for (index, tile) in self.tiles.iter() {
            let (column, row) = self.geometry.cell(index);
            atlas.paste_region(
                &tile.image,
                (column * mip_tile) as i32,
                (row * mip_tile) as i32,
                scale,
            )?;
        }

        tracing::debug!(
            "Composed mip level {} ({}x{})",
            level,
            atlas.width(),
            atlas.height()
        );
        Ok(atlas)
    }

    /// Compose every mip level, largest first.
    pub fn compose_all(&self) -> Result<Vec<PixelBuffer>> {
        (0..self.geometry.mip_levels)
            .map(|level| self.compose_level(level))
            .collect()
    }

    /// Describe where each tile landed.
    pub fn layout(&self) -> AtlasLayout {
        AtlasLayout::new(
            &self.geometry,
            self.tiles.iter().map(|(index, _)| index),
            self.padded,
        )
    }
}
