use std::path::Path;

/// Image file kinds that can be loaded into a [`PixelBuffer`](super::PixelBuffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Vtf,
}

impl ImageKind {
    /// Pick the kind from the path's extension.
    ///
    /// Matching is exact and case-sensitive: `tile.PNG` is not a PNG here.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "png" => Some(Self::Png),
            "vtf" => Some(Self::Vtf),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(ImageKind::from_path(Path::new("tiles/0.png")), Some(ImageKind::Png));
        assert_eq!(ImageKind::from_path(Path::new("atlas.vtf")), Some(ImageKind::Vtf));
        assert_eq!(ImageKind::from_path(Path::new("atlas.PNG")), None);
        assert_eq!(ImageKind::from_path(Path::new("atlas.dds")), None);
        assert_eq!(ImageKind::from_path(Path::new("png")), None);
    }
}
