//! Atlas grid sizing.

use crate::vtf::compute_mipmap_count;

/// Smallest power of two that is at least `n` (1 for `n == 0`).
pub fn next_power_of_two(n: u32) -> u64 {
    u64::from(n.max(1)).next_power_of_two()
}

/// Grid dimensions as `(width, height)` in tiles for `count` tiles.
///
/// The slot count is rounded up to a power of two. Even exponents give a
/// square grid, odd ones a grid twice as wide as it is tall.
pub fn grid_size(count: u32) -> (u32, u32) {
    let slots = next_power_of_two(count);
    let exponent = slots.trailing_zeros();
    let height = 1u32 << (exponent / 2);
    if exponent % 2 == 0 {
        (height, height)
    } else {
        (height * 2, height)
    }
}

/// Layout of the atlas derived from the tile set and pack options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasGeometry {
    /// Grid slots in use: highest tile index plus one.
    pub tile_count: u32,
    /// Grid width in tiles.
    pub grid_width: u32,
    /// Grid height in tiles.
    pub grid_height: u32,
    /// Edge length of one (possibly padded) tile at mip level 0.
    pub tile_size: u32,
    /// Number of composed mip levels.
    pub mip_levels: u32,
}

impl AtlasGeometry {
    /// Compute the geometry for `tile_count` slots of `tile_size` pixels.
    ///
    /// Simple mode composes a single level; otherwise levels continue until
    /// each tile is a single pixel.
    pub fn new(tile_count: u32, tile_size: u32, simple: bool) -> Self {
        let (grid_width, grid_height) = grid_size(tile_count);
        let mip_levels = if simple {
            1
        } else {
            compute_mipmap_count(tile_size, tile_size, 1)
        };
        Self {
            tile_count,
            grid_width,
            grid_height,
            tile_size,
            mip_levels,
        }
    }

    /// Tile edge length at `level`.
    pub fn mip_tile_size(&self, level: u32) -> u32 {
        self.tile_size.checked_shr(level).unwrap_or(0)
    }

    /// Atlas size in pixels at `level`: the level 0 edges halved `level`
    /// times, never below one pixel.
    ///
    /// For tile sizes that are not a power of two this can exceed
    /// `grid * mip_tile_size(level)`; the extra strip stays empty.
    pub fn level_size(&self, level: u32) -> (u64, u64) {
        let (width, height) = self.pixel_size();
        (
            width.checked_shr(level).unwrap_or(0).max(1),
            height.checked_shr(level).unwrap_or(0).max(1),
        )
    }

    /// Atlas size in pixels at level 0.
    pub fn pixel_size(&self) -> (u64, u64) {
        let tile = u64::from(self.tile_size);
        (
            u64::from(self.grid_width) * tile,
            u64::from(self.grid_height) * tile,
        )
    }

    /// Grid cell `(column, row)` of a tile index.
    pub fn cell(&self, index: u32) -> (u32, u32) {
        (index % self.grid_width, index / self.grid_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_power_of_two() {
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(2), 2);
        assert_eq!(next_power_of_two(3), 4);
        assert_eq!(next_power_of_two(5), 8);
        assert_eq!(next_power_of_two(8), 8);
        assert_eq!(next_power_of_two(1000), 1024);
        assert_eq!(next_power_of_two(u32::MAX), 1 << 32);
    }

    #[test]
    fn test_grid_size() {
        assert_eq!(grid_size(1), (1, 1));
        assert_eq!(grid_size(2), (2, 1));
        assert_eq!(grid_size(4), (2, 2));
        // 5 rounds up to 8, which is not a perfect square: 2 rows of 4.
        assert_eq!(grid_size(5), (4, 2));
        assert_eq!(grid_size(16), (4, 4));
        assert_eq!(grid_size(17), (8, 4));
    }

    #[test]
    fn test_grid_always_fits_count() {
        for count in 1..=300 {
            let (width, height) = grid_size(count);
            assert!(u64::from(width * height) >= u64::from(count));
            assert!(width == height || width == height * 2);
        }
    }

    #[test]
    fn test_mip_levels() {
        assert_eq!(AtlasGeometry::new(4, 16, true).mip_levels, 1);
        assert_eq!(AtlasGeometry::new(4, 16, false).mip_levels, 5);
        assert_eq!(AtlasGeometry::new(4, 1, false).mip_levels, 1);
    }

    #[test]
    fn test_level_size_and_cells() {
        let geometry = AtlasGeometry::new(5, 16, false);
        assert_eq!(geometry.pixel_size(), (64, 32));
        assert_eq!(geometry.level_size(2), (16, 8));
        assert_eq!(geometry.mip_tile_size(4), 1);
        assert_eq!(geometry.cell(0), (0, 0));
        assert_eq!(geometry.cell(3), (3, 0));
        assert_eq!(geometry.cell(4), (0, 1));
    }

    #[test]
    fn test_level_size_halves_whole_atlas() {
        // 24 px tiles, 2x1 grid: 48x24 atlas.
        let geometry = AtlasGeometry::new(2, 24, false);
        assert_eq!(geometry.mip_levels, 5);
        assert_eq!(geometry.level_size(3), (6, 3));
        assert_eq!(geometry.mip_tile_size(3), 3);
        // Tiles shrink to 1 px but the atlas edge is 48 >> 4 = 3.
        assert_eq!(geometry.level_size(4), (3, 1));
        assert_eq!(geometry.mip_tile_size(4), 1);
    }
}
