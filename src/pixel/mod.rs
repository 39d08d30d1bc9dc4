//! RGBA8888 pixel buffers.
//!
//! Every image flowing through the packer lives in a [`PixelBuffer`]: tiles
//! loaded from disk, padded tiles, composed mip levels and cut slices.

mod buffer;
mod kind;

pub use buffer::PixelBuffer;
pub use kind::ImageKind;
