//! Picture formats and signature detection.

/// Image format of an embedded picture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PictureKind {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Tiff,
    Emf,
    Wmf,
    /// Unrecognized data; also the failure tag for picture lookups
    Unknown,
}

impl PictureKind {
    /// Conventional file extension for the format
    pub fn extension(&self) -> &'static str {
        match self {
            PictureKind::Png => "png",
            PictureKind::Jpeg => "jpg",
            PictureKind::Gif => "gif",
            PictureKind::Bmp => "bmp",
            PictureKind::Tiff => "tif",
            PictureKind::Emf => "emf",
            PictureKind::Wmf => "wmf",
            PictureKind::Unknown => "bin",
        }
    }

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            PictureKind::Png => 0,
            PictureKind::Jpeg => 1,
            PictureKind::Gif => 2,
            PictureKind::Bmp => 3,
            PictureKind::Tiff => 4,
            PictureKind::Emf => 5,
            PictureKind::Wmf => 6,
            PictureKind::Unknown => 0xFF,
        }
    }

    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            0 => PictureKind::Png,
            1 => PictureKind::Jpeg,
            2 => PictureKind::Gif,
            3 => PictureKind::Bmp,
            4 => PictureKind::Tiff,
            5 => PictureKind::Emf,
            6 => PictureKind::Wmf,
            _ => PictureKind::Unknown,
        }
    }
}

/// Detect the image format from leading signature bytes.
pub(crate) fn sniff(data: &[u8]) -> PictureKind {
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        PictureKind::Png
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        PictureKind::Jpeg
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        PictureKind::Gif
    } else if data.starts_with(b"BM") {
        PictureKind::Bmp
    } else if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A]) {
        PictureKind::Tiff
    } else if data.len() >= 44 && data[0..4] == [0x01, 0x00, 0x00, 0x00] && &data[40..44] == b" EMF" {
        PictureKind::Emf
    } else if data.starts_with(&[0xD7, 0xCD, 0xC6, 0x9A]) {
        // Placeable WMF header
        PictureKind::Wmf
    } else {
        PictureKind::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_png() {
        let data = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00];
        assert_eq!(sniff(&data), PictureKind::Png);
    }

    #[test]
    fn test_sniff_jpeg() {
        assert_eq!(sniff(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]), PictureKind::Jpeg);
    }

    #[test]
    fn test_sniff_gif_both_versions() {
        assert_eq!(sniff(b"GIF87a...."), PictureKind::Gif);
        assert_eq!(sniff(b"GIF89a...."), PictureKind::Gif);
    }

    #[test]
    fn test_sniff_bmp() {
        assert_eq!(sniff(b"BM\x00\x00"), PictureKind::Bmp);
    }

    #[test]
    fn test_sniff_tiff_both_orders() {
        assert_eq!(sniff(&[0x49, 0x49, 0x2A, 0x00]), PictureKind::Tiff);
        assert_eq!(sniff(&[0x4D, 0x4D, 0x00, 0x2A]), PictureKind::Tiff);
    }

    #[test]
    fn test_sniff_emf() {
        let mut data = vec![0u8; 64];
        data[0..4].copy_from_slice(&[0x01, 0x00, 0x00, 0x00]);
        data[40..44].copy_from_slice(b" EMF");
        assert_eq!(sniff(&data), PictureKind::Emf);
    }

    #[test]
    fn test_sniff_wmf() {
        assert_eq!(sniff(&[0xD7, 0xCD, 0xC6, 0x9A, 0x00]), PictureKind::Wmf);
    }

    #[test]
    fn test_sniff_unknown() {
        assert_eq!(sniff(b"not an image"), PictureKind::Unknown);
        assert_eq!(sniff(&[]), PictureKind::Unknown);
    }

    #[test]
    fn test_kind_tag_roundtrip() {
        for kind in [
            PictureKind::Png,
            PictureKind::Jpeg,
            PictureKind::Gif,
            PictureKind::Bmp,
            PictureKind::Tiff,
            PictureKind::Emf,
            PictureKind::Wmf,
            PictureKind::Unknown,
        ] {
            assert_eq!(PictureKind::from_u8(kind.as_u8()), kind);
        }
    }
}
