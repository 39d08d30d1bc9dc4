//! Tile collection keyed by numeric tile index.

use crate::error::{Result, VoxtexError};
use crate::pixel::PixelBuffer;
use std::collections::BTreeMap;
use std::path::Path;

/// A loaded source tile and the file it came from.
#[derive(Debug, Clone)]
pub struct Tile {
    /// File name the tile was loaded from.
    pub name: String,
    /// Tile pixels.
    pub image: PixelBuffer,
}

/// Square tiles of one common size, ordered by tile index.
///
/// Indices need not be contiguous; every gap still takes up a slot in the
/// atlas grid.
#[derive(Debug, Clone, Default)]
pub struct TileSet {
    tiles: BTreeMap<u32, Tile>,
    tile_size: u32,
    reference: Option<String>,
}

impl TileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `.png` directly inside `dir`.
    ///
    /// Files are visited in file name order, so the tile that fixes the
    /// expected size is the same on every platform.
    pub fn from_directory<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir)
            .map_err(|_| VoxtexError::DirectoryNotFound(dir.to_path_buf()))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            // Follows symlinks.
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some("png") {
                continue;
            }
            files.push((entry.file_name().to_string_lossy().to_string(), path));
        }
        files.sort();

        let mut set = Self::new();
        for (name, path) in files {
            let index = parse_tile_index(&name)?;
            if let Some(existing) = set.tiles.get(&index) {
                return Err(VoxtexError::DuplicateTileIndex {
                    index,
                    first: existing.name.clone(),
                    second: name,
                });
            }
            let image = PixelBuffer::open(&path).map_err(|e| VoxtexError::load(&path, e))?;
            set.insert(index, name, image)?;
        }

        tracing::debug!(
            "Loaded {} tiles of {}x{} from {}",
            set.len(),
            set.tile_size,
            set.tile_size,
            dir.display()
        );
        Ok(set)
    }

    /// Add a tile, checking it is square and matches the size of the first
    /// tile added.
    pub fn insert(&mut self, index: u32, name: impl Into<String>, image: PixelBuffer) -> Result<()> {
        let name = name.into();
        if !image.is_square() {
            return Err(VoxtexError::NotSquare {
                name,
                width: image.width(),
                height: image.height(),
            });
        }
        if self.reference.is_none() {
            self.tile_size = image.width();
            tracing::info!(
                "Assuming dimensions will match file: {} ( {} x {} )",
                name,
                image.width(),
                image.height()
            );
        } else if image.width() != self.tile_size {
            return Err(VoxtexError::SizeMismatch {
                name,
                width: image.width(),
                height: image.height(),
                expected: self.tile_size,
            });
        }
        if let Some(existing) = self.tiles.get(&index) {
            return Err(VoxtexError::DuplicateTileIndex {
                index,
                first: existing.name.clone(),
                second: name,
            });
        }
        if self.reference.is_none() {
            self.reference = Some(name.clone());
        }
        self.tiles.insert(index, Tile { name, image });
        Ok(())
    }

    /// Edge length shared by every tile, 0 while empty.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Name of the file that established the tile size.
    pub fn reference_name(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    /// Number of grid slots needed: highest index plus one.
    pub fn tile_count(&self) -> u32 {
        self.tiles
            .keys()
            .next_back()
            .map_or(0, |&max| max.saturating_add(1))
    }

    /// Number of tiles actually present.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn get(&self, index: u32) -> Option<&PixelBuffer> {
        self.tiles.get(&index).map(|tile| &tile.image)
    }

    /// Tiles in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Tile)> {
        self.tiles.iter().map(|(&index, tile)| (index, tile))
    }

    /// Replace every tile image with `transform(image)`; the new images
    /// must all share one square size.
    pub fn map_images<F>(self, mut transform: F) -> Result<Self>
    where
        F: FnMut(&PixelBuffer) -> Result<PixelBuffer>,
    {
        let mut mapped = Self::new();
        for (index, tile) in self.tiles {
            let image = transform(&tile.image)?;
            mapped.insert(index, tile.name, image)?;
        }
        Ok(mapped)
    }
}

/// Read the tile index from the leading decimal digits of a file name,
/// so `12.png` and `12_grass.png` both give 12.
pub fn parse_tile_index(name: &str) -> Result<u32> {
    let digits_end = name
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(name.len());
    name[..digits_end]
        .parse()
        .map_err(|_| VoxtexError::InvalidTileIndex(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(size: u32) -> PixelBuffer {
        PixelBuffer::with_size(size, size)
    }

    #[test]
    fn test_parse_tile_index() {
        assert_eq!(parse_tile_index("0.png").unwrap(), 0);
        assert_eq!(parse_tile_index("12.png").unwrap(), 12);
        assert_eq!(parse_tile_index("007_dirt.png").unwrap(), 7);
        assert!(parse_tile_index("grass.png").is_err());
        assert!(parse_tile_index("-3.png").is_err());
        assert!(parse_tile_index("99999999999.png").is_err());
    }

    #[test]
    fn test_first_tile_sets_size() {
        let mut set = TileSet::new();
        set.insert(3, "3.png", tile(16)).unwrap();
        assert_eq!(set.tile_size(), 16);

        let result = set.insert(1, "1.png", tile(8));
        assert!(matches!(
            result,
            Err(VoxtexError::SizeMismatch { expected: 16, width: 8, .. })
        ));
    }

    #[test]
    fn test_rejects_non_square() {
        let mut set = TileSet::new();
        let result = set.insert(0, "0.png", PixelBuffer::with_size(16, 8));
        assert!(matches!(result, Err(VoxtexError::NotSquare { .. })));
    }

    #[test]
    fn test_rejects_duplicate_index() {
        let mut set = TileSet::new();
        set.insert(1, "1.png", tile(4)).unwrap();
        let result = set.insert(1, "01.png", tile(4));
        assert!(matches!(result, Err(VoxtexError::DuplicateTileIndex { index: 1, .. })));
    }

    #[test]
    fn test_tile_count_counts_gaps() {
        let mut set = TileSet::new();
        assert_eq!(set.tile_count(), 0);
        set.insert(0, "0.png", tile(4)).unwrap();
        set.insert(6, "6.png", tile(4)).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.tile_count(), 7);
    }

    #[test]
    fn test_iterates_in_index_order() {
        let mut set = TileSet::new();
        for index in [5, 0, 3] {
            set.insert(index, format!("{}.png", index), tile(2)).unwrap();
        }
        let order: Vec<u32> = set.iter().map(|(index, _)| index).collect();
        assert_eq!(order, vec![0, 3, 5]);
        assert_eq!(set.reference_name(), Some("5.png"));
    }

    #[test]
    fn test_missing_directory() {
        let result = TileSet::from_directory("/definitely/not/a/tile/dir");
        assert!(matches!(result, Err(VoxtexError::DirectoryNotFound(_))));
    }
}
