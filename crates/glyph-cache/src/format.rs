/// Pixel layout of a cache texture and of the staging memory behind it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// One coverage byte per pixel.
    Alpha8,
    /// Four bytes per pixel, used for color (emoji) glyphs.
    Rgba8,
}

impl PixelFormat {
    #[inline]
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::Alpha8 => 1,
            Self::Rgba8 => 4,
        }
    }

    /// Short name used in logs and memory dumps.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Alpha8 => "A8",
            Self::Rgba8 => "RGBA",
        }
    }
}

/// Encoding of a rasterized glyph bitmap as handed over by the font pipeline.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MaskFormat {
    /// 1 bit per pixel, rows packed most-significant bit first.
    Bw,
    /// 8 bit coverage.
    A8,
    /// 32 bit color, copied verbatim into an RGBA atlas.
    Argb32,
    /// Subpixel coverage. Produced by some rasterizers but never cached.
    Lcd16,
}

impl MaskFormat {
    /// Atlas format this mask is stored in, or `None` when the cache cannot hold it.
    pub const fn atlas_format(self) -> Option<PixelFormat> {
        match self {
            Self::Bw | Self::A8 => Some(PixelFormat::Alpha8),
            Self::Argb32 => Some(PixelFormat::Rgba8),
            Self::Lcd16 => None,
        }
    }

    /// Minimum number of bytes one source row of `width` pixels occupies.
    pub const fn row_bytes(self, width: u32) -> u32 {
        match self {
            Self::Bw => width.div_ceil(8),
            Self::A8 => width,
            Self::Argb32 => width * 4,
            Self::Lcd16 => width * 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_formats_map_to_atlas_formats() {
        assert_eq!(MaskFormat::A8.atlas_format(), Some(PixelFormat::Alpha8));
        assert_eq!(MaskFormat::Bw.atlas_format(), Some(PixelFormat::Alpha8));
        assert_eq!(MaskFormat::Argb32.atlas_format(), Some(PixelFormat::Rgba8));
        assert_eq!(MaskFormat::Lcd16.atlas_format(), None);
    }

    #[test]
    fn bw_rows_round_up_to_whole_bytes() {
        assert_eq!(MaskFormat::Bw.row_bytes(1), 1);
        assert_eq!(MaskFormat::Bw.row_bytes(8), 1);
        assert_eq!(MaskFormat::Bw.row_bytes(9), 2);
        assert_eq!(MaskFormat::Argb32.row_bytes(3), 12);
    }
}
