use crate::error::{GlyphCacheError, Result};
use crate::format::MaskFormat;

/// Identifies a font (typeface + size + style) known to the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontId(pub u64);

/// Glyph index within a font.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphId(pub u32);

/// A rasterized glyph as produced by the font pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphBitmap {
    pub width: u32,
    pub height: u32,
    /// Bytes between the starts of two source rows.
    pub stride: u32,
    pub format: MaskFormat,
    /// Offset from the pen position to the top-left of the bitmap.
    pub bearing: [i32; 2],
    pub pixels: Vec<u8>,
}

impl GlyphBitmap {
    /// Bitmap with tightly packed rows.
    pub fn new(format: MaskFormat, width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride: format.row_bytes(width),
            format,
            bearing: [0, 0],
            pixels,
        }
    }

    /// Zero-area glyph, e.g. a space.
    pub fn empty(format: MaskFormat) -> Self {
        Self::new(format, 0, 0, Vec::new())
    }

    pub fn with_stride(mut self, stride: u32) -> Self {
        self.stride = stride;
        self
    }

    pub fn with_bearing(mut self, x: i32, y: i32) -> Self {
        self.bearing = [x, y];
        self
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check that `pixels` covers every row at the declared stride.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }

        let row_bytes = self.format.row_bytes(self.width) as usize;
        let stride = self.stride as usize;
        let expected = if stride < row_bytes {
            usize::MAX
        } else {
            (self.height as usize - 1) * stride + row_bytes
        };

        if self.pixels.len() < expected {
            return Err(GlyphCacheError::BitmapTooSmall {
                width: self.width,
                height: self.height,
                expected,
                actual: self.pixels.len(),
            });
        }
        Ok(())
    }

    /// Coverage of pixel (`x`, `y`) in `0..=255`, whatever the mask format.
    ///
    /// Color glyphs report their alpha channel.
    pub fn coverage(&self, x: u32, y: u32) -> u8 {
        let row = y as usize * self.stride as usize;
        match self.format {
            MaskFormat::A8 => self.pixels[row + x as usize],
            MaskFormat::Bw => {
                let byte = self.pixels[row + x as usize / 8];
                if byte & (0x80 >> (x % 8)) != 0 {
                    255
                } else {
                    0
                }
            }
            MaskFormat::Argb32 => self.pixels[row + x as usize * 4 + 3],
            MaskFormat::Lcd16 => 0,
        }
    }
}

/// Produces glyph bitmaps on demand.
pub trait RasterSource {
    /// Rasterize `glyph` of `font`. `None` when the glyph is unknown.
    fn rasterize(&mut self, font: FontId, glyph: GlyphId) -> Option<GlyphBitmap>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accounts_for_stride() {
        let ok = GlyphBitmap::new(MaskFormat::A8, 3, 2, vec![0; 7]).with_stride(4);
        assert!(ok.validate().is_ok());

        let short = GlyphBitmap::new(MaskFormat::A8, 3, 2, vec![0; 6]).with_stride(4);
        assert!(matches!(
            short.validate(),
            Err(GlyphCacheError::BitmapTooSmall { expected: 7, .. })
        ));

        let bad_stride = GlyphBitmap::new(MaskFormat::Argb32, 2, 1, vec![0; 64]).with_stride(4);
        assert!(bad_stride.validate().is_err());

        assert!(GlyphBitmap::empty(MaskFormat::A8).validate().is_ok());
    }

    #[test]
    fn coverage_reads_every_format() {
        let bw = GlyphBitmap::new(MaskFormat::Bw, 9, 1, vec![0b1000_0001, 0b1000_0000]);
        assert_eq!(bw.coverage(0, 0), 255);
        assert_eq!(bw.coverage(1, 0), 0);
        assert_eq!(bw.coverage(7, 0), 255);
        assert_eq!(bw.coverage(8, 0), 255);

        let argb = GlyphBitmap::new(MaskFormat::Argb32, 1, 1, vec![1, 2, 3, 200]);
        assert_eq!(argb.coverage(0, 0), 200);
    }
}
