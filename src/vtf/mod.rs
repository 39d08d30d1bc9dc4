//! Valve Texture Format (VTF) container.
//!
//! Textures are written as VTF 7.2 with a DXT1 thumbnail followed by the mip
//! chain, smallest level first. Files from 7.0 through 7.5 can be read back,
//! which lets atlases produced elsewhere be sliced.

mod file;
mod format;

pub use file::{compute_mipmap_count, mip_dimensions, TextureFlags, Thumbnail, VtfFile};
pub use format::{convert_from_rgba8888, convert_to_rgba8888, resize, ImageFormat};
