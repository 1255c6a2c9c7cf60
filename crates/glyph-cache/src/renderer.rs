//! Atlas manager and draw dispatcher.
//!
//! Glyphs are cached on first use into the first cache texture of their format that
//! has room for them. When every texture of a format is full the whole cache is
//! evicted (pending quads are drawn first) and the placement is retried once.
//!
//! Quads are batched per cache texture. A batch is drawn when its mesh fills up or
//! when the caller finishes a render pass, always after the dirty parts of every
//! texture were uploaded.

use std::collections::HashMap;

use glam::{Affine2, Mat2};

use crate::backend::TextureBackend;
use crate::cache_texture::{CacheTexture, CacheTextureId};
use crate::config::{CacheConfig, TierLayout, MAX_QUADS_PER_MESH, TEXTURE_BORDER_SIZE};
use crate::copier::copy_glyph;
use crate::error::{GlyphCacheError, Result};
use crate::font::{CachedGlyphInfo, FontGlyphs};
use crate::format::PixelFormat;
use crate::geometry::Rect;
use crate::mesh::GlyphQuad;
use crate::packer::AtlasPx;
use crate::pixel_buffer::BufferKind;
use crate::raster::{FontId, GlyphBitmap, GlyphId, RasterSource};
use crate::submit::{DrawSubmitter, HiddenTextHook, ResolvedGlyph};

/// Glyphs to draw and where their pens go.
#[derive(Copy, Clone, Debug)]
pub struct TextRun<'a> {
    pub glyphs: &'a [GlyphId],
    /// Pen position of each glyph, relative to `origin`.
    pub positions: &'a [[f32; 2]],
    pub origin: [f32; 2],
    /// Per-character advances forwarded to a [`HiddenTextHook`].
    pub char_widths: Option<&'a [i32]>,
}

impl<'a> TextRun<'a> {
    pub fn new(glyphs: &'a [GlyphId], positions: &'a [[f32; 2]]) -> Self {
        Self {
            glyphs,
            positions,
            origin: [0.0, 0.0],
            char_widths: None,
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.origin = [x, y];
        self
    }

    pub fn with_char_widths(mut self, widths: &'a [i32]) -> Self {
        self.char_widths = Some(widths);
        self
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.positions.len() < self.glyphs.len() {
            return Err(GlyphCacheError::PositionCountMismatch {
                glyphs: self.glyphs.len(),
                positions: self.positions.len(),
            });
        }
        Ok(())
    }

    fn pen(&self, index: usize) -> [f32; 2] {
        let p = self.positions[index];
        [self.origin[0] + p[0], self.origin[1] + p[1]]
    }

    fn char_width(&self, index: usize) -> Option<i32> {
        self.char_widths.and_then(|widths| widths.get(index).copied())
    }
}

/// Per-call render settings.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RenderOptions {
    /// Quads completely outside this rectangle are dropped. Ignored for transformed text.
    pub clip: Option<Rect>,
    /// Bounds accumulator, grown by every emitted quad.
    pub bounds: Option<Rect>,
    /// Draw everything batched before returning.
    pub force_finish: bool,
}

impl RenderOptions {
    pub fn with_clip(mut self, clip: Rect) -> Self {
        self.clip = Some(clip);
        self
    }

    /// Start accumulating bounds from nothing.
    pub fn track_bounds(mut self) -> Self {
        self.bounds = Some(Rect::EMPTY_BOUNDS);
        self
    }

    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn finish(mut self) -> Self {
        self.force_finish = true;
        self
    }
}

/// Result of a render call.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderOutcome {
    /// Whether any draw was issued since the render pass started.
    pub drawn: bool,
    /// Accumulated bounds, when requested.
    pub bounds: Option<Rect>,
}

pub struct GlyphRenderer<B: TextureBackend> {
    backend: B,
    config: CacheConfig,
    tiers: TierLayout,

    alpha_textures: Vec<CacheTexture>,
    rgba_textures: Vec<CacheTexture>,
    initialized: bool,

    fonts: HashMap<FontId, FontGlyphs>,
    current_font: Option<FontId>,

    current_texture: Option<CacheTextureId>,
    upload_texture: bool,
    drawn: bool,
    clip: Option<Rect>,
    bounds: Option<Rect>,
    linear_filtering: bool,

    evictions: u64,
}

impl<B: TextureBackend> GlyphRenderer<B> {
    pub fn new(backend: B, config: CacheConfig) -> Self {
        let tiers = config.tier_layout(backend.max_texture_size());
        let linear_filtering = config.linear_filtering;
        Self {
            backend,
            config,
            tiers,
            alpha_textures: Vec::new(),
            rgba_textures: Vec::new(),
            initialized: false,
            fonts: HashMap::new(),
            current_font: None,
            current_texture: None,
            upload_texture: false,
            drawn: false,
            clip: None,
            bounds: None,
            linear_filtering,
            evictions: 0,
        }
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Texture sizes in use, after clamping to the device limit.
    pub fn tier_layout(&self) -> &TierLayout {
        &self.tiers
    }

    /// Number of full-cache evictions so far.
    #[inline]
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    #[inline]
    pub fn linear_filtering(&self) -> bool {
        self.linear_filtering
    }

    pub fn set_linear_filtering(&mut self, enabled: bool) {
        self.linear_filtering = enabled;
    }

    /// Texture the last quad went to.
    #[inline]
    pub fn current_texture(&self) -> Option<CacheTextureId> {
        self.current_texture
    }

    /// Whether cached glyphs are waiting for the upload pass.
    #[inline]
    pub fn upload_pending(&self) -> bool {
        self.upload_texture
    }

    pub fn set_font(&mut self, font: FontId) {
        self.fonts.entry(font).or_default();
        self.current_font = Some(font);
    }

    #[inline]
    pub fn current_font(&self) -> Option<FontId> {
        self.current_font
    }

    /// Forget a font and its glyph table. Its pixels stay in the cache until evicted.
    pub fn remove_font(&mut self, font: FontId) -> bool {
        if self.current_font == Some(font) {
            self.current_font = None;
        }
        self.fonts.remove(&font).is_some()
    }

    pub fn font_glyphs(&self, font: FontId) -> Option<&FontGlyphs> {
        self.fonts.get(&font)
    }

    pub fn glyph(&self, font: FontId, glyph: GlyphId) -> Option<&CachedGlyphInfo> {
        self.fonts.get(&font)?.get(glyph)
    }

    /// Valid glyphs over all fonts.
    pub fn valid_glyph_count(&self) -> usize {
        self.fonts.values().map(FontGlyphs::valid_count).sum()
    }

    /// Cache textures of `format`, in search order. Empty until the cache is used.
    pub fn cache_textures(&self, format: PixelFormat) -> &[CacheTexture] {
        match format {
            PixelFormat::Alpha8 => &self.alpha_textures,
            PixelFormat::Rgba8 => &self.rgba_textures,
        }
    }

    pub fn cache_texture(&self, id: CacheTextureId) -> Option<&CacheTexture> {
        self.cache_textures(id.format).get(id.index)
    }

    fn cache_texture_mut(&mut self, id: CacheTextureId) -> Option<&mut CacheTexture> {
        match id.format {
            PixelFormat::Alpha8 => self.alpha_textures.get_mut(id.index),
            PixelFormat::Rgba8 => self.rgba_textures.get_mut(id.index),
        }
    }

    fn buffer_kind(&self) -> BufferKind {
        if self.config.gpu_pixel_buffers {
            BufferKind::Auto
        } else {
            BufferKind::Cpu
        }
    }

    /// Build the cache textures. Runs once, on first use.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;

        let kind = self.buffer_kind();
        for format in [PixelFormat::Alpha8, PixelFormat::Rgba8] {
            let mut textures: Vec<CacheTexture> = self
                .tiers
                .for_format(format)
                .iter()
                .enumerate()
                .map(|(index, &[width, height])| {
                    CacheTexture::new(
                        CacheTextureId::new(format, index),
                        width,
                        height,
                        TEXTURE_BORDER_SIZE,
                        MAX_QUADS_PER_MESH,
                    )
                })
                .collect();

            if let Some(first) = textures.first_mut() {
                first.allocate_pixel_buffer(&mut self.backend, kind);
                first.allocate_mesh();
            }

            log::debug!(
                "{} glyph cache tiers: {:?}",
                format.label(),
                self.tiers.for_format(format)
            );
            match format {
                PixelFormat::Alpha8 => self.alpha_textures = textures,
                PixelFormat::Rgba8 => self.rgba_textures = textures,
            }
        }

        self.current_texture = Some(CacheTextureId::new(PixelFormat::Alpha8, 0));
        self.upload_texture = false;
    }

    /// First texture of `format` with room for a `width` x `height` glyph, and the
    /// glyph's position in it.
    pub fn place_glyph(
        &mut self,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) -> Option<(CacheTextureId, AtlasPx)> {
        self.initialize();
        let textures = match format {
            PixelFormat::Alpha8 => &mut self.alpha_textures,
            PixelFormat::Rgba8 => &mut self.rgba_textures,
        };
        textures.iter_mut().find_map(|texture| {
            let origin = texture.fit_glyph(width, height)?;
            Some((texture.id(), origin))
        })
    }

    /// Rasterize `glyph` and store it in the cache.
    ///
    /// With `precaching` set a full cache leaves the glyph uncached; otherwise the
    /// cache is evicted once, drawing pending quads through `submitter` first.
    pub fn cache_glyph(
        &mut self,
        source: &mut dyn RasterSource,
        font: FontId,
        glyph: GlyphId,
        precaching: bool,
        submitter: Option<&mut dyn DrawSubmitter<B>>,
    ) -> CachedGlyphInfo {
        self.initialize();
        let info = match source.rasterize(font, glyph) {
            Some(bitmap) => self.cache_bitmap(&bitmap, precaching, submitter),
            None => {
                log::warn!("No bitmap for glyph {glyph:?} of font {font:?}");
                CachedGlyphInfo::uncached([0, 0], [0, 0])
            }
        };
        self.fonts.entry(font).or_default().insert(glyph, info);
        info
    }

    /// Store an already rasterized bitmap in the cache.
    pub fn cache_bitmap(
        &mut self,
        bitmap: &GlyphBitmap,
        precaching: bool,
        submitter: Option<&mut dyn DrawSubmitter<B>>,
    ) -> CachedGlyphInfo {
        self.initialize();
        if bitmap.is_empty() {
            return CachedGlyphInfo::empty(bitmap.bearing);
        }

        let (width, height) = (bitmap.width, bitmap.height);
        let mut info = CachedGlyphInfo::uncached([width, height], bitmap.bearing);

        let Some(format) = bitmap.format.atlas_format() else {
            log::warn!("Glyph mask {:?} is not supported by the cache", bitmap.format);
            return info;
        };
        if let Err(err) = bitmap.validate() {
            log::warn!("Skipping malformed glyph: {err}");
            return info;
        }

        let tallest = self
            .cache_textures(format)
            .iter()
            .map(CacheTexture::height)
            .max()
            .unwrap_or(0);
        if height + 2 * TEXTURE_BORDER_SIZE > tallest {
            log::error!("Glyph too large to fit in cache: {width}x{height}");
            return info;
        }

        let placement = match self.place_glyph(format, width, height) {
            Some(placement) => Some(placement),
            None if precaching => None,
            None => {
                self.flush_all_and_invalidate(submitter);
                self.place_glyph(format, width, height)
            }
        };
        let Some((id, origin)) = placement else {
            log::debug!("No room for {width}x{height} {} glyph", format.label());
            return info;
        };

        let kind = self.buffer_kind();
        let texture = match id.format {
            PixelFormat::Alpha8 => &mut self.alpha_textures[id.index],
            PixelFormat::Rgba8 => &mut self.rgba_textures[id.index],
        };
        texture.allocate_pixel_buffer(&mut self.backend, kind);
        texture.allocate_mesh();

        let border = texture.border();
        let gamma = self.config.gamma_table.as_ref();
        let copied = texture.with_pixels_mut(&mut self.backend, |pixels, stride| {
            copy_glyph(pixels, stride, format, origin, bitmap, border, gamma)
        });
        match copied {
            Some(Ok(())) => {}
            Some(Err(err)) => {
                log::warn!("Failed to copy glyph into {id:?}: {err}");
                texture.unfit_glyph(origin, width, height);
                return info;
            }
            None => {
                log::warn!("Cache texture {id:?} has no staging memory for the glyph");
                texture.unfit_glyph(origin, width, height);
                return info;
            }
        }

        info.texture = Some(id);
        info.origin = origin;
        info.uv = texture.uv_rect(origin, width, height);
        info.valid = true;
        self.upload_texture = true;
        info
    }

    /// Evict everything: draw what is batched, invalidate every glyph and reset every
    /// texture. Large tiers give their memory back.
    pub fn flush_all_and_invalidate(&mut self, submitter: Option<&mut dyn DrawSubmitter<B>>) {
        match submitter {
            Some(submitter) => self.issue_draw_command(submitter),
            None => {
                let pending = self
                    .alpha_textures
                    .iter()
                    .chain(self.rgba_textures.iter())
                    .filter(|texture| texture.can_draw())
                    .map(CacheTexture::quad_count)
                    .sum::<usize>();
                if pending > 0 {
                    log::warn!("Evicting glyph cache without a submitter drops {pending} quads");
                }
            }
        }

        for font in self.fonts.values_mut() {
            font.invalidate_texture_cache(None);
        }
        for texture in self.alpha_textures.iter_mut().chain(self.rgba_textures.iter_mut()) {
            texture.init();
            if texture.id().index > 0 {
                texture.release_pixel_buffer(&mut self.backend);
            }
        }

        self.evictions += 1;
        log::debug!("Glyph cache evicted ({} so far)", self.evictions);
    }

    /// Release the memory of every large tier, invalidating the glyphs stored there.
    pub fn flush_large_caches(&mut self) {
        for texture in self.alpha_textures.iter_mut().chain(self.rgba_textures.iter_mut()) {
            if texture.id().index == 0 || !texture.has_pixel_buffer() {
                continue;
            }

            texture.init();
            let id = texture.id();
            for font in self.fonts.values_mut() {
                font.invalidate_texture_cache(Some(id));
            }
            texture.release_pixel_buffer(&mut self.backend);
            log::debug!("Released {} cache texture {}", id.format.label(), id.index);
        }
    }

    /// Cache glyphs ahead of drawing them. Never evicts.
    pub fn precache(&mut self, source: &mut dyn RasterSource, font: FontId, glyphs: &[GlyphId]) {
        self.initialize();
        for &glyph in glyphs {
            let cached = self.glyph(font, glyph).is_some_and(|info| info.valid);
            if !cached {
                self.cache_glyph(source, font, glyph, true, None);
            }
        }
    }

    /// Upload whatever precaching produced.
    pub fn end_precaching(&mut self) {
        self.check_texture_update();
    }

    /// Upload the dirty part of every texture that has staged pixels.
    ///
    /// A texture is only bound when it differs from the previous one, and the row
    /// length override is reset once at the end if any upload used it.
    pub fn check_texture_update(&mut self) {
        if !self.upload_texture {
            return;
        }

        let mut last_bound = None;
        let mut reset_row_length = false;
        for texture in self.alpha_textures.iter_mut().chain(self.rgba_textures.iter_mut()) {
            if !texture.is_dirty() || !texture.has_pixel_buffer() {
                continue;
            }
            let Some(handle) = texture.texture() else {
                continue;
            };

            if last_bound != Some(handle) {
                self.backend.bind_texture(handle);
                last_bound = Some(handle);
            }
            reset_row_length |= texture.upload(&mut self.backend);
        }

        if reset_row_length {
            self.backend.reset_unpack_row_length();
        }
        self.upload_texture = false;
    }

    /// Draw every batched quad, alpha textures first.
    pub fn issue_draw_command(&mut self, submitter: &mut dyn DrawSubmitter<B>) {
        let mut issued = false;
        for format in [PixelFormat::Alpha8, PixelFormat::Rgba8] {
            if !self.cache_textures(format).iter().any(CacheTexture::can_draw) {
                continue;
            }
            self.check_texture_update();
            self.drawn = true;
            issued = true;

            let textures = match format {
                PixelFormat::Alpha8 => &mut self.alpha_textures,
                PixelFormat::Rgba8 => &mut self.rgba_textures,
            };
            for texture in textures.iter_mut().filter(|texture| texture.can_draw()) {
                submitter.draw(&mut self.backend, texture, self.linear_filtering);
                if !texture.is_extension_managed() {
                    texture.reset_mesh();
                }
            }
        }

        if issued {
            submitter.finish_batch(&mut self.backend);
        }
    }

    /// Add a screen-aligned quad to `texture`'s batch.
    ///
    /// Dropped when it lies outside the clip rectangle. A batch that fills up is drawn
    /// right away.
    pub fn append_mesh_quad(
        &mut self,
        quad: GlyphQuad,
        texture: CacheTextureId,
        submitter: &mut dyn DrawSubmitter<B>,
    ) {
        if self.clip.is_some_and(|clip| quad.is_outside(&clip)) {
            return;
        }
        if !self.push_quad(quad, texture) {
            return;
        }
        if let Some(bounds) = self.bounds.as_mut() {
            bounds.include_rect(&quad.aligned_bounds());
        }
        self.flush_if_full(texture, submitter);
    }

    /// Add an arbitrarily transformed quad to `texture`'s batch. No clipping.
    pub fn append_rotated_mesh_quad(
        &mut self,
        quad: GlyphQuad,
        texture: CacheTextureId,
        submitter: &mut dyn DrawSubmitter<B>,
    ) {
        if !self.push_quad(quad, texture) {
            return;
        }
        if let Some(bounds) = self.bounds.as_mut() {
            bounds.include_rect(&quad.corner_bounds());
        }
        self.flush_if_full(texture, submitter);
    }

    fn push_quad(&mut self, quad: GlyphQuad, id: CacheTextureId) -> bool {
        self.current_texture = Some(id);
        let Some(texture) = self.cache_texture_mut(id) else {
            return false;
        };
        if texture.add_quad(quad) {
            return true;
        }
        log::warn!(
            "Dropping glyph quad: {} cache texture {} has no room in its batch",
            id.format.label(),
            id.index
        );
        false
    }

    fn flush_if_full(&mut self, id: CacheTextureId, submitter: &mut dyn DrawSubmitter<B>) {
        if self.cache_texture(id).is_some_and(CacheTexture::end_of_mesh) {
            self.issue_draw_command(submitter);
        }
    }

    /// Start a render pass.
    pub fn init_render(&mut self, clip: Option<Rect>, bounds: Option<Rect>) {
        self.initialize();
        self.drawn = false;
        self.clip = clip;
        self.bounds = bounds;
    }

    /// Draw everything batched and end the render pass, returning the accumulated bounds.
    pub fn finish_render(&mut self, submitter: &mut dyn DrawSubmitter<B>) -> Option<Rect> {
        self.issue_draw_command(submitter);
        self.clip = None;
        self.bounds.take()
    }

    /// Whether a draw was issued since the render pass started. Eviction does not
    /// reset it.
    #[inline]
    pub fn was_drawn(&self) -> bool {
        self.drawn
    }

    fn end_render(
        &mut self,
        force_finish: bool,
        submitter: &mut dyn DrawSubmitter<B>,
    ) -> RenderOutcome {
        let bounds = if force_finish {
            self.finish_render(submitter)
        } else {
            self.bounds
        };
        RenderOutcome {
            drawn: self.drawn,
            bounds,
        }
    }

    pub(crate) fn selected_font(&self) -> Result<FontId> {
        self.current_font.ok_or_else(|| {
            log::error!("No font set");
            GlyphCacheError::NoFontSelected
        })
    }

    /// Cached entry for `glyph`, caching it first when needed. `None` when there is
    /// nothing to draw.
    fn resolve_glyph(
        &mut self,
        source: &mut dyn RasterSource,
        font: FontId,
        glyph: GlyphId,
        submitter: &mut dyn DrawSubmitter<B>,
    ) -> Option<(CachedGlyphInfo, CacheTextureId)> {
        let info = match self.glyph(font, glyph) {
            Some(info) if info.valid => *info,
            _ => self.cache_glyph(source, font, glyph, false, Some(&mut *submitter)),
        };
        let texture = info.texture.filter(|_| info.is_drawable())?;
        Some((info, texture))
    }

    /// Draw glyphs at explicit positions with the selected font.
    pub fn render_pos_text(
        &mut self,
        source: &mut dyn RasterSource,
        run: TextRun<'_>,
        options: RenderOptions,
        submitter: &mut dyn DrawSubmitter<B>,
    ) -> Result<RenderOutcome> {
        let font = self.selected_font()?;
        run.check()?;

        self.linear_filtering = self.config.linear_filtering || !is_integral(run.origin);
        self.init_render(options.clip, options.bounds);

        for (index, &glyph) in run.glyphs.iter().enumerate() {
            let Some((info, texture)) = self.resolve_glyph(source, font, glyph, submitter) else {
                continue;
            };
            let quad = GlyphQuad::axis_aligned(info.screen_rect(run.pen(index)), info.uv);
            self.append_mesh_quad(quad, texture, submitter);
        }

        Ok(self.end_render(options.force_finish, submitter))
    }

    /// Draw glyphs mapped through `transform` (rotation, scale, skew).
    pub fn render_transformed_text(
        &mut self,
        source: &mut dyn RasterSource,
        run: TextRun<'_>,
        transform: Affine2,
        options: RenderOptions,
        submitter: &mut dyn DrawSubmitter<B>,
    ) -> Result<RenderOutcome> {
        let font = self.selected_font()?;
        run.check()?;

        let pixel_aligned = transform.matrix2 == Mat2::IDENTITY
            && is_integral(run.origin)
            && is_integral(transform.translation.to_array());
        self.linear_filtering = self.config.linear_filtering || !pixel_aligned;
        self.init_render(options.clip, options.bounds);

        for (index, &glyph) in run.glyphs.iter().enumerate() {
            let Some((info, texture)) = self.resolve_glyph(source, font, glyph, submitter) else {
                continue;
            };
            let rect = info.screen_rect(run.pen(index));
            let quad = GlyphQuad::transformed(rect, info.uv, &transform);
            self.append_rotated_mesh_quad(quad, texture, submitter);
        }

        Ok(self.end_render(options.force_finish, submitter))
    }

    /// Draw text whose layout is reported to `hook`.
    ///
    /// Every texture used is marked extension-managed, so its quads survive draws
    /// until [`GlyphRenderer::release_extension_textures`].
    pub fn render_hidden_text(
        &mut self,
        source: &mut dyn RasterSource,
        run: TextRun<'_>,
        options: RenderOptions,
        submitter: &mut dyn DrawSubmitter<B>,
        hook: &mut dyn HiddenTextHook,
    ) -> Result<RenderOutcome> {
        let font = self.selected_font()?;
        run.check()?;

        self.linear_filtering = self.config.linear_filtering || !is_integral(run.origin);
        self.init_render(options.clip, options.bounds);

        for (index, &glyph) in run.glyphs.iter().enumerate() {
            let Some((info, texture)) = self.resolve_glyph(source, font, glyph, submitter) else {
                continue;
            };
            if let Some(cache) = self.cache_texture_mut(texture) {
                cache.set_extension_managed(true);
            }

            let rect = info.screen_rect(run.pen(index));
            hook.glyph_resolved(ResolvedGlyph {
                index,
                glyph,
                position: rect.min,
                char_width: run.char_width(index),
            });
            self.append_mesh_quad(GlyphQuad::axis_aligned(rect, info.uv), texture, submitter);
        }

        Ok(self.end_render(options.force_finish, submitter))
    }

    /// Hand extension-managed textures back to the normal batching cycle.
    pub fn release_extension_textures(&mut self) {
        for texture in self.alpha_textures.iter_mut().chain(self.rgba_textures.iter_mut()) {
            if texture.is_extension_managed() {
                texture.set_extension_managed(false);
                texture.reset_mesh();
            }
        }
    }

    /// Free every texture and staging buffer, forgetting all glyphs. The next use
    /// rebuilds the cache.
    pub fn release(&mut self) {
        for texture in self.alpha_textures.iter_mut().chain(self.rgba_textures.iter_mut()) {
            texture.release_pixel_buffer(&mut self.backend);
        }
        self.alpha_textures.clear();
        self.rgba_textures.clear();
        for font in self.fonts.values_mut() {
            font.invalidate_texture_cache(None);
        }
        self.initialized = false;
        self.current_texture = None;
        self.upload_texture = false;
    }
}

#[inline]
fn is_integral(p: [f32; 2]) -> bool {
    p[0].fract() == 0.0 && p[1].fract() == 0.0
}
