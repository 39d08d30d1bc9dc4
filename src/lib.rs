//! # voxtex
//!
//! Packs a directory of square PNG tiles into a single VTF texture atlas
//! and slices atlases back into tiles.
//!
//! ## Overview
//!
//! Each tile's file name starts with its index (`0.png`, `1.png`, ...).
//! Tiles are laid out on a power-of-two grid in index order, composed once
//! per mip level, compressed to DXT5 and written as a VTF file. Tiles can
//! optionally be wrapped in a border of their own opposite edges so texture
//! filtering near tile boundaries samples the right neighbour.
//!
//! ## Quick Start
//!
//! ```ignore
//! use voxtex::{pack, slice, PackOptions};
//!
//! // Pack tiles/0.png, tiles/1.png, ... into a mipmapped, padded atlas
//! let report = pack("tiles", "blocks.vtf", &PackOptions::default().with_padding(true))?;
//! println!("{}x{} tiles", report.geometry.grid_width, report.geometry.grid_height);
//!
//! // Cut an 8x8 atlas back into 64 tiles
//! slice("atlas.png", "out", 8, 8)?;
//! ```

pub mod error;
pub mod pixel;
pub mod vtf;
pub mod tileset;
pub mod atlas;
pub mod slice;
pub mod task;

// Re-export main types for convenience
pub use error::{Result, VoxtexError};
pub use pixel::{ImageKind, PixelBuffer};
pub use vtf::{ImageFormat, TextureFlags, VtfFile};
pub use tileset::TileSet;
pub use atlas::{AtlasComposer, AtlasGeometry, AtlasLayout, TileRegion};
pub use slice::SliceSplitter;
pub use task::{pack, slice, PackOptions, PackReport, SliceReport};
