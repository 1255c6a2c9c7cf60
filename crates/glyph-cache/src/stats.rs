//! Memory accounting for the cache textures.

use std::fmt;

use crate::backend::TextureBackend;
use crate::cache_texture::{CacheTexture, CacheTextureId};
use crate::format::PixelFormat;
use crate::renderer::GlyphRenderer;

/// Staging memory of one allocated cache texture, in bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TextureUsage {
    pub id: CacheTextureId,
    pub used: usize,
    pub total: usize,
}

impl TextureUsage {
    fn of(texture: &CacheTexture) -> Option<Self> {
        if !texture.has_pixel_buffer() {
            return None;
        }
        let total = texture.memory_size();
        Some(Self {
            id: texture.id(),
            used: total - texture.free_memory().min(total),
            total,
        })
    }
}

/// Per-texture memory usage of both formats.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryUsage {
    pub alpha: Vec<TextureUsage>,
    pub rgba: Vec<TextureUsage>,
}

impl MemoryUsage {
    pub fn total(&self) -> usize {
        self.alpha.iter().chain(&self.rgba).map(|usage| usage.total).sum()
    }

    pub fn used(&self) -> usize {
        self.alpha.iter().chain(&self.rgba).map(|usage| usage.used).sum()
    }
}

impl fmt::Display for MemoryUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Font Renderer:")?;
        let formats = [(PixelFormat::Alpha8, &self.alpha), (PixelFormat::Rgba8, &self.rgba)];
        for (format, textures) in formats {
            for usage in textures {
                writeln!(
                    f,
                    "  Glyph cache {} {}: {} / {} bytes ({:.1}%)",
                    format.label(),
                    usage.id.index,
                    usage.used,
                    usage.total,
                    percent(usage.used, usage.total)
                )?;
            }
        }
        write!(
            f,
            "  Total: {} / {} bytes ({:.1}%)",
            self.used(),
            self.total(),
            percent(self.used(), self.total())
        )
    }
}

fn percent(used: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        used as f64 * 100.0 / total as f64
    }
}

impl<B: TextureBackend> GlyphRenderer<B> {
    /// Bytes of staging memory held by textures of `format`.
    pub fn cache_size(&self, format: PixelFormat) -> usize {
        self.cache_textures(format)
            .iter()
            .map(CacheTexture::memory_size)
            .sum()
    }

    /// Bytes of staging memory of `format` not covered by glyphs.
    pub fn free_cache_size(&self, format: PixelFormat) -> usize {
        self.cache_textures(format)
            .iter()
            .map(CacheTexture::free_memory)
            .sum()
    }

    /// Bytes of staging memory held by all textures.
    pub fn total_size(&self) -> usize {
        self.cache_size(PixelFormat::Alpha8) + self.cache_size(PixelFormat::Rgba8)
    }

    pub fn memory_usage(&self) -> MemoryUsage {
        let collect = |format: PixelFormat| -> Vec<TextureUsage> {
            self.cache_textures(format)
                .iter()
                .filter_map(TextureUsage::of)
                .collect()
        };
        MemoryUsage {
            alpha: collect(PixelFormat::Alpha8),
            rgba: collect(PixelFormat::Rgba8),
        }
    }

    /// Log the memory usage report.
    pub fn dump_memory_usage(&self) {
        log::info!("{}", self.memory_usage());
    }
}
