//! Cache sizing and rasterization parameters.

use std::fmt;

use crate::format::PixelFormat;

/// Blank pixels kept around every glyph in a cache texture.
pub const TEXTURE_BORDER_SIZE: u32 = 1;

/// Quads a single cache texture batches before it must be drawn.
pub const MAX_QUADS_PER_MESH: usize = 2048;

pub const DEFAULT_SMALL_CACHE_WIDTH: u32 = 1024;
pub const DEFAULT_SMALL_CACHE_HEIGHT: u32 = 512;
pub const DEFAULT_LARGE_CACHE_WIDTH: u32 = 2048;
pub const DEFAULT_LARGE_CACHE_HEIGHT: u32 = 512;

/// 256-entry lookup applied to 8 bit coverage when it is copied into the cache.
#[derive(Clone, PartialEq, Eq)]
pub struct GammaTable([u8; 256]);

impl GammaTable {
    pub fn identity() -> Self {
        let mut table = [0u8; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            *entry = i as u8;
        }
        Self(table)
    }

    /// Table computing `(i / 255)^(1 / gamma)`, rounded to the nearest byte.
    pub fn from_gamma(gamma: f32) -> Self {
        if !(gamma.is_finite() && gamma > 0.0) {
            log::warn!("Ignoring invalid text gamma {gamma}, using identity");
            return Self::identity();
        }

        let exponent = 1.0 / gamma;
        let mut table = [0u8; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let v = (i as f32 / 255.0).powf(exponent) * 255.0;
            *entry = (v + 0.5).floor().clamp(0.0, 255.0) as u8;
        }
        Self(table)
    }

    pub const fn from_table(table: [u8; 256]) -> Self {
        Self(table)
    }

    #[inline]
    pub fn apply(&self, value: u8) -> u8 {
        self.0[value as usize]
    }

    pub fn as_bytes(&self) -> &[u8; 256] {
        &self.0
    }
}

impl Default for GammaTable {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for GammaTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GammaTable")
            .field("mid", &self.0[128])
            .finish_non_exhaustive()
    }
}

/// Sizes of every cache texture, per format, in search order.
///
/// The first entry of each list is allocated as soon as the cache is used; the others
/// only once a glyph is placed in them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TierLayout {
    pub alpha: Vec<[u32; 2]>,
    pub rgba: Vec<[u32; 2]>,
}

impl TierLayout {
    /// Layout derived from a small and a large texture size:
    /// alpha = small, large/2, large/2, large and rgba = small, large/2
    /// (halving the height).
    pub fn from_sizes(small: [u32; 2], large: [u32; 2]) -> Self {
        let half = [large[0], large[1] / 2];
        Self {
            alpha: vec![small, half, half, large],
            rgba: vec![small, half],
        }
    }

    pub fn for_format(&self, format: PixelFormat) -> &[[u32; 2]] {
        match format {
            PixelFormat::Alpha8 => &self.alpha,
            PixelFormat::Rgba8 => &self.rgba,
        }
    }

    fn clamped(mut self, max_texture_size: u32) -> Self {
        for size in self.alpha.iter_mut().chain(self.rgba.iter_mut()) {
            size[0] = size[0].clamp(1, max_texture_size.max(1));
            size[1] = size[1].clamp(1, max_texture_size.max(1));
        }
        self
    }
}

/// Configuration of a [`crate::GlyphRenderer`].
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Size of the first, eagerly allocated, texture of each format.
    pub small_cache: [u32; 2],
    /// Size the larger tiers derive from.
    pub large_cache: [u32; 2],
    /// Explicit per-format tier sizes, overriding `small_cache`/`large_cache`.
    pub tiers: Option<TierLayout>,
    /// Applied to A8 glyphs as they are copied. `None` copies coverage verbatim.
    pub gamma_table: Option<GammaTable>,
    /// Stage glyphs in GPU buffers when the backend supports them.
    pub gpu_pixel_buffers: bool,
    /// Always sample cache textures with linear filtering.
    pub linear_filtering: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            small_cache: [DEFAULT_SMALL_CACHE_WIDTH, DEFAULT_SMALL_CACHE_HEIGHT],
            large_cache: [DEFAULT_LARGE_CACHE_WIDTH, DEFAULT_LARGE_CACHE_HEIGHT],
            tiers: None,
            gamma_table: None,
            gpu_pixel_buffers: true,
            linear_filtering: false,
        }
    }
}

impl CacheConfig {
    pub fn with_small_cache(mut self, width: u32, height: u32) -> Self {
        self.small_cache = [width, height];
        self
    }

    pub fn with_large_cache(mut self, width: u32, height: u32) -> Self {
        self.large_cache = [width, height];
        self
    }

    pub fn with_tiers(mut self, tiers: TierLayout) -> Self {
        self.tiers = Some(tiers);
        self
    }

    pub fn with_gamma(mut self, gamma: GammaTable) -> Self {
        self.gamma_table = Some(gamma);
        self
    }

    pub fn with_gpu_pixel_buffers(mut self, enabled: bool) -> Self {
        self.gpu_pixel_buffers = enabled;
        self
    }

    pub fn with_linear_filtering(mut self, enabled: bool) -> Self {
        self.linear_filtering = enabled;
        self
    }

    /// Resolve the tier sizes for a device, clamping every edge to `max_texture_size`.
    pub fn tier_layout(&self, max_texture_size: u32) -> TierLayout {
        let layout = match &self.tiers {
            Some(tiers) if !tiers.alpha.is_empty() && !tiers.rgba.is_empty() => tiers.clone(),
            Some(_) => {
                log::warn!("Tier layout needs at least one texture per format, using defaults");
                self.default_layout(max_texture_size)
            }
            None => self.default_layout(max_texture_size),
        };
        layout.clamped(max_texture_size)
    }

    fn default_layout(&self, max_texture_size: u32) -> TierLayout {
        let clamp = |size: [u32; 2]| [size[0].min(max_texture_size), size[1].min(max_texture_size)];
        TierLayout::from_sizes(clamp(self.small_cache), clamp(self.large_cache))
    }
}
