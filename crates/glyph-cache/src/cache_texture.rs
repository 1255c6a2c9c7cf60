//! One cache texture: a GPU texture, the staging memory glyphs are copied into and
//! the quad batch that samples from it.

use crate::backend::{TextureBackend, TextureId};
use crate::format::PixelFormat;
use crate::geometry::UvRect;
use crate::mesh::{GlyphQuad, QuadMesh, TextureVertex};
use crate::packer::{AtlasPx, AtlasRectPx, ShelfPacker};
use crate::pixel_buffer::{BufferKind, PixelBuffer};

/// Position of a cache texture: its format list and index (tier) in that list.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheTextureId {
    pub format: PixelFormat,
    pub index: usize,
}

impl CacheTextureId {
    pub const fn new(format: PixelFormat, index: usize) -> Self {
        Self { format, index }
    }
}

#[derive(Debug)]
pub struct CacheTexture {
    id: CacheTextureId,
    width: u32,
    height: u32,
    max_quads: usize,

    texture: Option<TextureId>,
    pixel_buffer: Option<PixelBuffer>,
    mesh: Option<QuadMesh>,

    packer: ShelfPacker,
    dirty: bool,
    dirty_rect: Option<AtlasRectPx>,
    glyph_count: u32,

    extension_managed: bool,
}

impl CacheTexture {
    pub fn new(id: CacheTextureId, width: u32, height: u32, border: u32, max_quads: usize) -> Self {
        Self {
            id,
            width,
            height,
            max_quads,
            texture: None,
            pixel_buffer: None,
            mesh: None,
            packer: ShelfPacker::new(width, height, border),
            dirty: false,
            dirty_rect: None,
            glyph_count: 0,
            extension_managed: false,
        }
    }

    #[inline]
    pub const fn id(&self) -> CacheTextureId {
        self.id
    }

    #[inline]
    pub const fn format(&self) -> PixelFormat {
        self.id.format
    }

    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub const fn border(&self) -> u32 {
        self.packer.border()
    }

    /// Backend texture, once the backing store has been allocated.
    #[inline]
    pub const fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    pub fn pixel_buffer(&self) -> Option<&PixelBuffer> {
        self.pixel_buffer.as_ref()
    }

    #[inline]
    pub const fn has_pixel_buffer(&self) -> bool {
        self.pixel_buffer.is_some()
    }

    #[inline]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Union of the rectangles written since the last upload.
    #[inline]
    pub const fn dirty_rect(&self) -> Option<AtlasRectPx> {
        self.dirty_rect
    }

    #[inline]
    pub const fn glyph_count(&self) -> u32 {
        self.glyph_count
    }

    /// Whether an external consumer owns the batched quads. Such meshes are not reset
    /// after a draw.
    #[inline]
    pub const fn is_extension_managed(&self) -> bool {
        self.extension_managed
    }

    pub fn set_extension_managed(&mut self, managed: bool) {
        self.extension_managed = managed;
    }

    /// Forget every placed glyph and pending quad. The backing store is kept.
    pub fn init(&mut self) {
        self.packer.clear();
        self.glyph_count = 0;
        self.dirty = false;
        self.dirty_rect = None;
        self.reset_mesh();
    }

    /// Create the texture and its staging buffer if they do not exist yet.
    pub fn allocate_pixel_buffer<B: TextureBackend>(&mut self, backend: &mut B, kind: BufferKind) {
        if self.pixel_buffer.is_some() {
            return;
        }

        let format = self.format();
        let buffer = PixelBuffer::create(backend, format, self.width, self.height, kind);
        self.pixel_buffer = Some(buffer);
        self.texture = Some(backend.create_texture(self.width, self.height, format));
        log::debug!(
            "Allocated {} cache texture {} ({}x{})",
            format.label(),
            self.id.index,
            self.width,
            self.height
        );
    }

    /// Free the texture and its staging buffer.
    pub fn release_pixel_buffer<B: TextureBackend>(&mut self, backend: &mut B) {
        if let Some(buffer) = self.pixel_buffer.take() {
            buffer.release(backend);
        }
        if let Some(texture) = self.texture.take() {
            backend.delete_texture(texture);
        }
        self.dirty = false;
        self.dirty_rect = None;
    }

    pub fn allocate_mesh(&mut self) {
        if self.mesh.is_none() {
            self.mesh = Some(QuadMesh::new(self.max_quads));
        }
    }

    /// Reserve space for a glyph and return the position of its top-left pixel.
    ///
    /// Marks the reserved area dirty. `None` when the texture has no room for it.
    pub fn fit_glyph(&mut self, width: u32, height: u32) -> Option<AtlasPx> {
        let rect = self.packer.fit(width, height)?;
        let border = self.border();

        self.dirty = true;
        self.dirty_rect = Some(match self.dirty_rect {
            Some(dirty) => dirty.union(rect),
            None => rect,
        });
        self.glyph_count += 1;

        Some(AtlasPx::new(rect.min.x + border, rect.min.y + border))
    }

    /// Undo the latest [`CacheTexture::fit_glyph`] when nothing was stored at `origin`.
    ///
    /// The dirty region keeps covering the blank area.
    pub fn unfit_glyph(&mut self, origin: AtlasPx, width: u32, height: u32) {
        let border = self.border();
        let rect = AtlasRectPx::new(
            AtlasPx::new(origin.x - border, origin.y - border),
            [width + 2 * border, height + 2 * border],
        );
        if self.packer.unreserve(rect) {
            self.glyph_count = self.glyph_count.saturating_sub(1);
        }
    }

    /// Normalized texture coordinates of a `width` x `height` glyph at `origin`.
    pub fn uv_rect(&self, origin: AtlasPx, width: u32, height: u32) -> UvRect {
        let inv_w = 1.0 / self.width as f32;
        let inv_h = 1.0 / self.height as f32;
        UvRect::new(
            [origin.x as f32 * inv_w, origin.y as f32 * inv_h],
            [
                (origin.x + width) as f32 * inv_w,
                (origin.y + height) as f32 * inv_h,
            ],
        )
    }

    /// Map the staging memory and run `f` over it with the row stride in bytes.
    pub fn with_pixels_mut<B: TextureBackend, R>(
        &mut self,
        backend: &mut B,
        f: impl FnOnce(&mut [u8], usize) -> R,
    ) -> Option<R> {
        let buffer = self.pixel_buffer.as_mut()?;
        let stride = buffer.stride() as usize;
        Some(buffer.with_mapped(backend, |bytes| f(bytes, stride)))
    }

    /// Push the dirty region to the texture.
    ///
    /// The region is widened to 32 pixel columns and 4 pixel rows. Backends without
    /// row length support get whole rows instead. Returns whether the upload used a
    /// custom row length.
    pub fn upload<B: TextureBackend>(&mut self, backend: &mut B) -> bool {
        let (Some(buffer), Some(texture), Some(dirty)) =
            (self.pixel_buffer.as_mut(), self.texture, self.dirty_rect)
        else {
            self.dirty = false;
            return false;
        };

        let row_length = backend.supports_unpack_row_length();

        let mut x = dirty.min.x & !0x1F;
        let y = dirty.min.y & !0x3;
        let right = ((dirty.max_x() + 0x1F) & !0x1F).min(self.width);
        let bottom = ((dirty.max_y() + 0x3) & !0x3).min(self.height);
        let mut width = right - x;
        if !row_length {
            x = 0;
            width = self.width;
        }

        buffer.upload(backend, texture, x, y, width, bottom - y);

        self.dirty = false;
        self.dirty_rect = None;
        row_length
    }

    /// Append a quad to the batch. `false` when there is no mesh or it is full.
    pub fn add_quad(&mut self, quad: GlyphQuad) -> bool {
        self.mesh.as_mut().is_some_and(|mesh| mesh.push(quad))
    }

    pub fn reset_mesh(&mut self) {
        if let Some(mesh) = self.mesh.as_mut() {
            mesh.clear();
        }
    }

    /// Whether there are batched quads to draw.
    pub fn can_draw(&self) -> bool {
        self.mesh.as_ref().is_some_and(|mesh| !mesh.is_empty())
    }

    /// Whether the batch has reached its capacity.
    pub fn end_of_mesh(&self) -> bool {
        self.mesh.as_ref().is_some_and(QuadMesh::is_full)
    }

    pub fn quad_count(&self) -> usize {
        self.mesh.as_ref().map_or(0, QuadMesh::quad_count)
    }

    pub fn vertices(&self) -> &[TextureVertex] {
        self.mesh.as_ref().map(QuadMesh::vertices).unwrap_or_default()
    }

    /// Bytes of staging memory held, zero when not allocated.
    pub fn memory_size(&self) -> usize {
        self.pixel_buffer.as_ref().map_or(0, PixelBuffer::size)
    }

    /// Bytes of staging memory not covered by placed glyphs.
    pub fn free_memory(&self) -> usize {
        if self.pixel_buffer.is_none() {
            return 0;
        }
        self.packer.free_area() as usize * self.format().bytes_per_pixel() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{BackendCall, RecordingBackend};

    fn alpha_texture(width: u32, height: u32) -> CacheTexture {
        CacheTexture::new(CacheTextureId::new(PixelFormat::Alpha8, 0), width, height, 1, 4)
    }

    #[test]
    fn fit_returns_origin_inside_border() {
        let mut texture = alpha_texture(64, 64);
        assert_eq!(texture.fit_glyph(10, 10), Some(AtlasPx::new(1, 1)));
        assert_eq!(texture.fit_glyph(10, 10), Some(AtlasPx::new(13, 1)));
        assert!(texture.is_dirty());
        assert_eq!(texture.glyph_count(), 2);
        assert_eq!(
            texture.dirty_rect(),
            Some(AtlasRectPx::new(AtlasPx::new(0, 0), [24, 12]))
        );
    }

    #[test]
    fn unfit_returns_space_to_the_texture() {
        let mut texture = alpha_texture(64, 64);
        let first = texture.fit_glyph(10, 10).unwrap();
        let second = texture.fit_glyph(10, 10).unwrap();

        texture.unfit_glyph(second, 10, 10);
        assert_eq!(texture.glyph_count(), 1);
        assert_eq!(texture.fit_glyph(10, 10), Some(second));

        // only the latest placement can be undone
        texture.unfit_glyph(first, 10, 10);
        assert_eq!(texture.glyph_count(), 2);
    }

    #[test]
    fn glyph_taller_than_texture_never_fits() {
        let mut texture = alpha_texture(64, 16);
        assert!(texture.fit_glyph(4, 15).is_none());
        assert!(texture.fit_glyph(4, 14).is_some());
    }

    #[test]
    fn uv_rect_excludes_border() {
        let texture = alpha_texture(64, 32);
        let uv = texture.uv_rect(AtlasPx::new(1, 1), 16, 8);
        assert_eq!(uv.min, [1.0 / 64.0, 1.0 / 32.0]);
        assert_eq!(uv.max, [17.0 / 64.0, 9.0 / 32.0]);
    }

    #[test]
    fn upload_aligns_dirty_rect() {
        let mut backend = RecordingBackend::new();
        let mut texture = alpha_texture(128, 64);
        texture.allocate_pixel_buffer(&mut backend, BufferKind::Cpu);

        texture.fit_glyph(38, 3).unwrap(); // 0..40 x 0..5
        texture.fit_glyph(10, 10).unwrap(); // 0..12 x 5..17

        assert!(texture.upload(&mut backend));
        let upload = backend
            .calls
            .iter()
            .find_map(|call| match call {
                BackendCall::UploadFromMemory { region, .. } => Some(*region),
                _ => None,
            })
            .unwrap();
        assert_eq!((upload.x, upload.y, upload.width, upload.height), (0, 0, 64, 20));
        assert_eq!(upload.bytes_per_row, 128);
        assert!(!texture.is_dirty());
        assert_eq!(texture.dirty_rect(), None);
    }

    #[test]
    fn upload_alignment_rounds_origin_down() {
        let mut backend = RecordingBackend::new();
        let mut texture = alpha_texture(128, 64);
        texture.allocate_pixel_buffer(&mut backend, BufferKind::Cpu);

        // first shelf is 7 rows tall, the second glyph opens a shelf at y = 7
        texture.fit_glyph(40, 5).unwrap();
        texture.fit_glyph(40, 20).unwrap();
        // third glyph lands in the first shelf at x = 42
        texture.fit_glyph(30, 5).unwrap();
        texture.upload(&mut backend);
        backend.calls.clear();

        texture.fit_glyph(30, 5).unwrap(); // x 74..106, y 0..7
        texture.upload(&mut backend);
        let region = match backend.calls.last() {
            Some(BackendCall::UploadFromMemory { region, .. }) => *region,
            other => panic!("unexpected call {other:?}"),
        };
        assert_eq!((region.x, region.y), (64, 0));
        assert_eq!((region.width, region.height), (64, 8));
    }

    #[test]
    fn upload_without_row_length_sends_whole_rows() {
        let mut backend = RecordingBackend::new().without_unpack_row_length();
        let mut texture = alpha_texture(128, 64);
        texture.allocate_pixel_buffer(&mut backend, BufferKind::Cpu);
        texture.fit_glyph(40, 5).unwrap();
        texture.fit_glyph(40, 20).unwrap();

        assert!(!texture.upload(&mut backend));
        let region = match backend.calls.last() {
            Some(BackendCall::UploadFromMemory { region, .. }) => *region,
            other => panic!("unexpected call {other:?}"),
        };
        assert_eq!((region.x, region.width), (0, 128));
        assert_eq!((region.y, region.height), (0, 32));
    }

    #[test]
    fn init_resets_placement_and_mesh() {
        let mut backend = RecordingBackend::new();
        let mut texture = alpha_texture(32, 32);
        texture.allocate_pixel_buffer(&mut backend, BufferKind::Cpu);
        texture.allocate_mesh();
        texture.fit_glyph(30, 30).unwrap();
        assert!(texture.add_quad(GlyphQuad::axis_aligned(
            crate::geometry::Rect::new([0.0, 0.0], [1.0, 1.0]),
            UvRect::default()
        )));

        texture.init();
        assert!(!texture.can_draw());
        assert!(!texture.is_dirty());
        assert_eq!(texture.glyph_count(), 0);
        assert!(texture.fit_glyph(30, 30).is_some());
        assert!(texture.has_pixel_buffer());
    }

    #[test]
    fn release_frees_texture_and_buffer() {
        let mut backend = RecordingBackend::new().with_gpu_buffers(4);
        let mut texture = alpha_texture(32, 32);
        texture.allocate_pixel_buffer(&mut backend, BufferKind::Auto);
        assert_eq!(texture.memory_size(), 32 * 32);
        assert_eq!(backend.live_textures(), 1);

        texture.release_pixel_buffer(&mut backend);
        assert!(texture.texture().is_none());
        assert_eq!(texture.memory_size(), 0);
        assert_eq!(texture.free_memory(), 0);
        assert_eq!(backend.live_textures(), 0);
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn quads_need_a_mesh() {
        let quad = GlyphQuad::axis_aligned(
            crate::geometry::Rect::new([0.0, 0.0], [1.0, 1.0]),
            UvRect::default(),
        );
        let mut texture = alpha_texture(32, 32);
        assert!(!texture.add_quad(quad));

        texture.allocate_mesh();
        for _ in 0..4 {
            assert!(texture.add_quad(quad));
        }
        assert!(texture.end_of_mesh());
        assert!(!texture.add_quad(quad));
        assert_eq!(texture.vertices().len(), 16);
    }

    #[test]
    fn free_memory_tracks_placements() {
        let mut backend = RecordingBackend::new();
        let mut texture =
            CacheTexture::new(CacheTextureId::new(PixelFormat::Rgba8, 1), 32, 32, 1, 4);
        texture.allocate_pixel_buffer(&mut backend, BufferKind::Cpu);
        assert_eq!(texture.free_memory(), 32 * 32 * 4);
        texture.fit_glyph(6, 6).unwrap();
        assert_eq!(texture.free_memory(), (32 * 32 - 64) * 4);
    }
}
