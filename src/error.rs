//! Error types for atlas packing and slicing.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using VoxtexError.
pub type Result<T> = std::result::Result<T, VoxtexError>;

/// Main error type for packing and slicing operations.
#[derive(Error, Debug)]
pub enum VoxtexError {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to decode or encode a PNG.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Failed to serialize the atlas layout.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The file extension is neither `png` nor `vtf`.
    #[error("Unsupported image file: {0}")]
    UnsupportedImage(PathBuf),

    /// A region copy reached outside of its source buffer.
    #[error(
        "Region {width}x{height} at ({x}, {y}) is outside of the {source_width}x{source_height} source"
    )]
    RegionOutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
        source_width: u32,
        source_height: u32,
    },

    /// Pixel storage does not match the buffer dimensions.
    #[error("Invalid pixel buffer: {0}")]
    InvalidBuffer(String),

    /// Malformed or unsupported VTF container data.
    #[error("VTF error: {0}")]
    Vtf(String),

    /// A source tile is not square.
    #[error("Source image not square: {name} ( {width} x {height} )")]
    NotSquare {
        name: String,
        width: u32,
        height: u32,
    },

    /// A source tile differs in size from the first tile.
    #[error("Source image dimensions do not match: {name} ( {width} x {height} ), expected {expected} x {expected}")]
    SizeMismatch {
        name: String,
        width: u32,
        height: u32,
        expected: u32,
    },

    /// The file name does not start with a tile index.
    #[error("Could not read index from source file: {0}")]
    InvalidTileIndex(String),

    /// Two files resolve to the same tile index.
    #[error("Tile index {index} is used by both {first} and {second}")]
    DuplicateTileIndex {
        index: u32,
        first: String,
        second: String,
    },

    /// The source directory holds no PNG tiles.
    #[error("No source images found!")]
    NoTiles,

    /// A directory argument does not exist or cannot be opened.
    #[error("Directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),

    /// The atlas is too large for the texture container.
    #[error("Atlas of {width} x {height} pixels exceeds the texture size limit")]
    AtlasTooLarge { width: u64, height: u64 },

    /// Slicing would produce non-square tiles.
    #[error("Output dimensions must be square! ( {width} x {height} )")]
    SliceNotSquare { width: u32, height: u32 },

    /// The slice grid is larger than the source image.
    #[error("Slice grid {columns} x {rows} is too large for a {width} x {height} image")]
    SliceTooSmall {
        columns: u32,
        rows: u32,
        width: u32,
        height: u32,
    },

    /// Loading an input image failed.
    #[error("Failed to load file: {}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: Box<VoxtexError>,
    },

    /// Compressing a composed mip level failed.
    #[error("Failed to convert mip level {level} to VTF format")]
    TextureWrite {
        level: u32,
        #[source]
        source: Box<VoxtexError>,
    },

    /// Writing an output file failed.
    #[error("Failed to save {}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: Box<VoxtexError>,
    },

    /// Saving one slice failed; remaining slices were skipped.
    #[error("Failed to save image {index} / {total} : {}", path.display())]
    SliceSave {
        index: u32,
        total: u32,
        path: PathBuf,
        #[source]
        source: Box<VoxtexError>,
    },
}

impl VoxtexError {
    /// Wrap an error with the path of the input it was loading.
    pub fn load(path: impl Into<PathBuf>, source: VoxtexError) -> Self {
        Self::Load {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Wrap an error with the path of the output it was writing.
    pub fn save(path: impl Into<PathBuf>, source: VoxtexError) -> Self {
        Self::Save {
            path: path.into(),
            source: Box::new(source),
        }
    }
}
