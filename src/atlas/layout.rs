//! Serializable description of where each tile sits in the atlas.

use super::geometry::AtlasGeometry;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A tile's cell and UV rectangle within the atlas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileRegion {
    /// Grid column.
    pub cell_x: u32,
    /// Grid row.
    pub cell_y: u32,
    /// U coordinate of the left edge (0-1).
    pub u_min: f32,
    /// V coordinate of the top edge (0-1).
    pub v_min: f32,
    /// U coordinate of the right edge (0-1).
    pub u_max: f32,
    /// V coordinate of the bottom edge (0-1).
    pub v_max: f32,
}

/// Atlas manifest written next to the texture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtlasLayout {
    /// Width of the atlas in pixels.
    pub width: u64,
    /// Height of the atlas in pixels.
    pub height: u64,
    pub grid_width: u32,
    pub grid_height: u32,
    /// Tile edge length in pixels, including padding.
    pub tile_size: u32,
    pub mip_levels: u32,
    /// Whether tiles carry a wrapped border.
    pub padded: bool,
    /// Regions keyed by tile index. With padding the region covers only the
    /// original tile, not its border.
    pub tiles: BTreeMap<u32, TileRegion>,
}

impl AtlasLayout {
    pub fn new(geometry: &AtlasGeometry, indices: impl IntoIterator<Item = u32>, padded: bool) -> Self {
        let (width, height) = geometry.pixel_size();
        let tile = u64::from(geometry.tile_size);
        let inset = if padded { tile / 4 } else { 0 };

        let tiles = indices
            .into_iter()
            .map(|index| {
                let (cell_x, cell_y) = geometry.cell(index);
                let x = u64::from(cell_x) * tile;
                let y = u64::from(cell_y) * tile;
                let region = TileRegion {
                    cell_x,
                    cell_y,
                    u_min: (x + inset) as f32 / width as f32,
                    v_min: (y + inset) as f32 / height as f32,
                    u_max: (x + tile - inset) as f32 / width as f32,
                    v_max: (y + tile - inset) as f32 / height as f32,
                };
                (index, region)
            })
            .collect();

        Self {
            width,
            height,
            grid_width: geometry.grid_width,
            grid_height: geometry.grid_height,
            tile_size: geometry.tile_size,
            mip_levels: geometry.mip_levels,
            padded,
            tiles,
        }
    }

    /// Get the region for a tile index.
    pub fn get_region(&self, index: u32) -> Option<&TileRegion> {
        self.tiles.get(&index)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the layout as pretty-printed JSON.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
