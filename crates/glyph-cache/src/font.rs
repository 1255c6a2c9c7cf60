use std::collections::HashMap;

use crate::cache_texture::CacheTextureId;
use crate::geometry::{Rect, UvRect};
use crate::packer::AtlasPx;
use crate::raster::GlyphId;

/// Where a glyph lives in the cache and how to draw it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CachedGlyphInfo {
    /// Texture holding the pixels. `None` for zero-area glyphs.
    pub texture: Option<CacheTextureId>,
    /// Top-left pixel of the glyph inside its texture, border excluded.
    pub origin: AtlasPx,
    pub size: [u32; 2],
    pub bearing: [i32; 2],
    pub uv: UvRect,
    /// Cleared when the owning texture is evicted; the glyph is re-cached on next use.
    pub valid: bool,
}

impl CachedGlyphInfo {
    /// A glyph with nothing to draw. Always valid.
    pub fn empty(bearing: [i32; 2]) -> Self {
        Self {
            texture: None,
            origin: AtlasPx::new(0, 0),
            size: [0, 0],
            bearing,
            uv: UvRect::default(),
            valid: true,
        }
    }

    /// A glyph that could not be cached.
    pub fn uncached(size: [u32; 2], bearing: [i32; 2]) -> Self {
        Self {
            size,
            valid: false,
            ..Self::empty(bearing)
        }
    }

    /// Whether the glyph produces a quad.
    #[inline]
    pub fn is_drawable(&self) -> bool {
        self.valid && self.texture.is_some()
    }

    /// Screen rectangle of the glyph drawn with its pen at `pen`.
    pub fn screen_rect(&self, pen: [f32; 2]) -> Rect {
        Rect::from_min_size(
            [pen[0] + self.bearing[0] as f32, pen[1] + self.bearing[1] as f32],
            [self.size[0] as f32, self.size[1] as f32],
        )
    }
}

/// Cached glyphs of one font.
#[derive(Debug, Default)]
pub struct FontGlyphs {
    glyphs: HashMap<GlyphId, CachedGlyphInfo>,
}

impl FontGlyphs {
    #[inline]
    pub fn get(&self, glyph: GlyphId) -> Option<&CachedGlyphInfo> {
        self.glyphs.get(&glyph)
    }

    pub fn insert(&mut self, glyph: GlyphId, info: CachedGlyphInfo) {
        self.glyphs.insert(glyph, info);
    }

    /// Invalidate glyphs stored in `texture`, or every textured glyph when `None`.
    ///
    /// Zero-area glyphs do not depend on any texture and stay valid.
    pub fn invalidate_texture_cache(&mut self, texture: Option<CacheTextureId>) {
        for info in self.glyphs.values_mut() {
            let affected = match (texture, info.texture) {
                (_, None) => false,
                (None, Some(_)) => true,
                (Some(evicted), Some(owner)) => evicted == owner,
            };
            if affected {
                info.valid = false;
            }
        }
    }

    pub fn valid_count(&self) -> usize {
        self.glyphs.values().filter(|info| info.valid).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PixelFormat;

    fn cached(texture: CacheTextureId) -> CachedGlyphInfo {
        CachedGlyphInfo {
            texture: Some(texture),
            valid: true,
            ..CachedGlyphInfo::uncached([4, 4], [0, -4])
        }
    }

    #[test]
    fn invalidation_targets_one_texture() {
        let small = CacheTextureId::new(PixelFormat::Alpha8, 0);
        let large = CacheTextureId::new(PixelFormat::Alpha8, 1);

        let mut font = FontGlyphs::default();
        font.insert(GlyphId(1), cached(small));
        font.insert(GlyphId(2), cached(large));
        font.insert(GlyphId(3), CachedGlyphInfo::empty([0, 0]));

        font.invalidate_texture_cache(Some(large));
        assert!(font.get(GlyphId(1)).unwrap().valid);
        assert!(!font.get(GlyphId(2)).unwrap().valid);
        assert_eq!(font.valid_count(), 2);

        font.invalidate_texture_cache(None);
        assert_eq!(font.valid_count(), 1);
        assert!(font.get(GlyphId(3)).unwrap().valid);
    }

    #[test]
    fn screen_rect_applies_bearing() {
        let info = CachedGlyphInfo::uncached([6, 8], [1, -7]);
        let rect = info.screen_rect([10.0, 20.0]);
        assert_eq!(rect, Rect::new([11.0, 13.0], [17.0, 21.0]));
        assert!(!info.is_drawable());
        assert!(!CachedGlyphInfo::empty([0, 0]).is_drawable());
    }
}
