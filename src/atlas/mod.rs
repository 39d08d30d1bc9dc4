//! Texture atlas composition.
//!
//! Tiles are placed on a power-of-two grid by index and composed once per
//! mip level, optionally after wrapping each tile in a border of its own
//! opposite edges.

mod composer;
mod geometry;
mod layout;

pub use composer::{pad_tile, AtlasComposer};
pub use geometry::{grid_size, next_power_of_two, AtlasGeometry};
pub use layout::{AtlasLayout, TileRegion};
