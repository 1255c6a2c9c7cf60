//! In-memory backend and collaborators for unit tests.

use std::collections::HashMap;

use crate::backend::{AccessMode, BufferId, TextureBackend, TextureId, UploadRegion};
use crate::cache_texture::{CacheTexture, CacheTextureId};
use crate::error::BackendError;
use crate::format::{MaskFormat, PixelFormat};
use crate::mesh::TextureVertex;
use crate::raster::{FontId, GlyphBitmap, GlyphId, RasterSource};
use crate::submit::{DrawSubmitter, HiddenTextHook, ResolvedGlyph};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BackendCall {
    CreateTexture {
        id: TextureId,
        width: u32,
        height: u32,
        format: PixelFormat,
    },
    DeleteTexture(TextureId),
    BindTexture(TextureId),
    UploadFromMemory {
        texture: TextureId,
        region: UploadRegion,
    },
    UploadFromBuffer {
        buffer: BufferId,
        texture: TextureId,
        region: UploadRegion,
        offset: usize,
    },
    CreateBuffer {
        id: BufferId,
        size: usize,
    },
    DeleteBuffer(BufferId),
    MapBuffer(BufferId, AccessMode),
    UnmapBuffer(BufferId),
    ResetUnpackRowLength,
}

struct Texture {
    width: u32,
    format: PixelFormat,
    pixels: Vec<u8>,
}

impl Texture {
    fn write(&mut self, region: UploadRegion, data: &[u8]) {
        let bpp = self.format.bytes_per_pixel() as usize;
        let row_bytes = region.width as usize * bpp;
        for row in 0..region.height as usize {
            let src = row * region.bytes_per_row as usize;
            let dst = ((region.y as usize + row) * self.width as usize + region.x as usize) * bpp;
            self.pixels[dst..dst + row_bytes].copy_from_slice(&data[src..src + row_bytes]);
        }
    }
}

struct Buffer {
    data: Vec<u8>,
    mapped: bool,
}

/// Backend keeping textures and buffers in memory and logging every call.
pub(crate) struct RecordingBackend {
    pub calls: Vec<BackendCall>,
    pub fail_maps: bool,
    pub fail_allocations: bool,
    pub corrupt_unmaps: bool,
    /// Mapped buffers hand out no memory, as a lost wgpu mapping does.
    pub empty_mappings: bool,

    max_texture_size: u32,
    gpu_buffers: bool,
    row_alignment: u32,
    unpack_row_length: bool,

    textures: HashMap<TextureId, Texture>,
    buffers: HashMap<BufferId, Buffer>,
    next_id: u32,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            fail_maps: false,
            fail_allocations: false,
            corrupt_unmaps: false,
            empty_mappings: false,
            max_texture_size: 4096,
            gpu_buffers: false,
            row_alignment: 1,
            unpack_row_length: true,
            textures: HashMap::new(),
            buffers: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn with_gpu_buffers(mut self, row_alignment: u32) -> Self {
        self.gpu_buffers = true;
        self.row_alignment = row_alignment;
        self
    }

    pub fn without_unpack_row_length(mut self) -> Self {
        self.unpack_row_length = false;
        self
    }

    pub fn with_max_texture_size(mut self, size: u32) -> Self {
        self.max_texture_size = size;
        self
    }

    pub fn count(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls.iter().filter(|call| pred(call)).count()
    }

    /// First byte of pixel (`x`, `y`) of `texture`.
    pub fn texture_pixel(&self, texture: TextureId, x: u32, y: u32) -> u8 {
        let texture = &self.textures[&texture];
        let bpp = texture.format.bytes_per_pixel() as usize;
        texture.pixels[(y as usize * texture.width as usize + x as usize) * bpp]
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl TextureBackend for RecordingBackend {
    fn max_texture_size(&self) -> u32 {
        self.max_texture_size
    }

    fn gpu_pixel_buffers_supported(&self) -> bool {
        self.gpu_buffers
    }

    fn pixel_buffer_row_alignment(&self) -> u32 {
        self.row_alignment
    }

    fn supports_unpack_row_length(&self) -> bool {
        self.unpack_row_length
    }

    fn create_texture(&mut self, width: u32, height: u32, format: PixelFormat) -> TextureId {
        let id = TextureId(self.next_id());
        let size = (width * height * format.bytes_per_pixel()) as usize;
        self.textures.insert(
            id,
            Texture {
                width,
                format,
                pixels: vec![0; size],
            },
        );
        self.calls.push(BackendCall::CreateTexture {
            id,
            width,
            height,
            format,
        });
        id
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
        self.calls.push(BackendCall::DeleteTexture(texture));
    }

    fn bind_texture(&mut self, texture: TextureId) {
        self.calls.push(BackendCall::BindTexture(texture));
    }

    fn upload_from_memory(&mut self, texture: TextureId, region: UploadRegion, data: &[u8]) {
        if let Some(target) = self.textures.get_mut(&texture) {
            target.write(region, data);
        }
        self.calls.push(BackendCall::UploadFromMemory { texture, region });
    }

    fn create_pixel_buffer(&mut self, size: usize) -> Result<BufferId, BackendError> {
        if self.fail_allocations {
            return Err(BackendError::AllocationFailed(size));
        }
        let id = BufferId(self.next_id());
        self.buffers.insert(
            id,
            Buffer {
                data: vec![0; size],
                mapped: false,
            },
        );
        self.calls.push(BackendCall::CreateBuffer { id, size });
        Ok(id)
    }

    fn delete_pixel_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(&buffer);
        self.calls.push(BackendCall::DeleteBuffer(buffer));
    }

    fn map_pixel_buffer(&mut self, buffer: BufferId, mode: AccessMode) -> Result<(), BackendError> {
        if self.fail_maps {
            return Err(BackendError::MapFailed {
                buffer,
                reason: "device lost".to_string(),
            });
        }
        let entry = self
            .buffers
            .get_mut(&buffer)
            .ok_or(BackendError::UnknownBuffer(buffer))?;
        entry.mapped = true;
        self.calls.push(BackendCall::MapBuffer(buffer, mode));
        Ok(())
    }

    fn unmap_pixel_buffer(&mut self, buffer: BufferId) -> Result<(), BackendError> {
        let entry = self
            .buffers
            .get_mut(&buffer)
            .ok_or(BackendError::UnknownBuffer(buffer))?;
        entry.mapped = false;
        self.calls.push(BackendCall::UnmapBuffer(buffer));
        if self.corrupt_unmaps {
            return Err(BackendError::Corrupted(buffer));
        }
        Ok(())
    }

    fn with_mapped_pixel_buffer<R>(
        &mut self,
        buffer: BufferId,
        f: impl FnOnce(&mut [u8]) -> R,
    ) -> R {
        let entry = self.buffers.get_mut(&buffer).expect("unknown pixel buffer");
        assert!(entry.mapped, "pixel buffer {buffer:?} accessed while unmapped");
        if self.empty_mappings {
            return f(&mut []);
        }
        f(entry.data.as_mut_slice())
    }

    fn upload_from_pixel_buffer(
        &mut self,
        buffer: BufferId,
        texture: TextureId,
        region: UploadRegion,
        offset: usize,
    ) {
        if let (Some(source), Some(target)) =
            (self.buffers.get(&buffer), self.textures.get_mut(&texture))
        {
            target.write(region, &source.data[offset..]);
        }
        self.calls.push(BackendCall::UploadFromBuffer {
            buffer,
            texture,
            region,
            offset,
        });
    }

    fn reset_unpack_row_length(&mut self) {
        self.calls.push(BackendCall::ResetUnpackRowLength);
    }
}

pub(crate) struct DrawRecord {
    pub texture: CacheTextureId,
    pub quads: usize,
    pub linear_filtering: bool,
    pub vertices: Vec<TextureVertex>,
    /// Backend calls made before this draw.
    pub calls_before: usize,
}

#[derive(Default)]
pub(crate) struct RecordingSubmitter {
    pub draws: Vec<DrawRecord>,
    pub batches: usize,
}

impl DrawSubmitter<RecordingBackend> for RecordingSubmitter {
    fn draw(
        &mut self,
        backend: &mut RecordingBackend,
        texture: &CacheTexture,
        linear_filtering: bool,
    ) {
        self.draws.push(DrawRecord {
            texture: texture.id(),
            quads: texture.quad_count(),
            linear_filtering,
            vertices: texture.vertices().to_vec(),
            calls_before: backend.calls.len(),
        });
    }

    fn finish_batch(&mut self, _backend: &mut RecordingBackend) {
        self.batches += 1;
    }
}

#[derive(Default)]
pub(crate) struct RecordingHook {
    pub glyphs: Vec<ResolvedGlyph>,
}

impl HiddenTextHook for RecordingHook {
    fn glyph_resolved(&mut self, glyph: ResolvedGlyph) {
        self.glyphs.push(glyph);
    }
}

/// Serves fixed bitmaps for any font.
#[derive(Default)]
pub(crate) struct TestSource {
    glyphs: HashMap<GlyphId, GlyphBitmap>,
    pub rasterized: usize,
}

impl TestSource {
    pub fn insert(&mut self, glyph: u32, bitmap: GlyphBitmap) {
        self.glyphs.insert(GlyphId(glyph), bitmap);
    }
}

impl RasterSource for TestSource {
    fn rasterize(&mut self, _font: FontId, glyph: GlyphId) -> Option<GlyphBitmap> {
        self.rasterized += 1;
        self.glyphs.get(&glyph).cloned()
    }
}

/// A8 glyph with a non-uniform pattern and no bearing.
pub(crate) fn a8_glyph(width: u32, height: u32) -> GlyphBitmap {
    let pixels = (0..width * height).map(|i| (i * 37 + 11) as u8).collect();
    GlyphBitmap::new(MaskFormat::A8, width, height, pixels)
}

pub(crate) fn argb_glyph(width: u32, height: u32) -> GlyphBitmap {
    let pixels = (0..width * height * 4).map(|i| (i * 13 + 5) as u8).collect();
    GlyphBitmap::new(MaskFormat::Argb32, width, height, pixels)
}
