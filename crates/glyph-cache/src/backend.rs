//! Boundary to the graphics API.
//!
//! The cache never talks to a GPU directly. Everything it needs (textures, staging
//! buffers, uploads) goes through [`TextureBackend`], which keeps the core testable
//! without a device and lets one cache run on top of different APIs.

use crate::error::BackendError;
use crate::format::PixelFormat;

/// Handle of a texture owned by the backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Handle of a GPU-side staging buffer owned by the backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u32);

/// How a pixel buffer is currently mapped.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum AccessMode {
    #[default]
    None,
    Read,
    Write,
    ReadWrite,
}

impl AccessMode {
    #[inline]
    pub const fn is_mapped(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Destination rectangle of a texture upload plus the row pitch of the source data.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UploadRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub bytes_per_row: u32,
}

/// Texture and staging buffer operations the glyph cache relies on.
pub trait TextureBackend {
    /// Largest texture edge the device accepts.
    fn max_texture_size(&self) -> u32;

    /// Whether GPU-side staging buffers are usable. When false every pixel buffer
    /// lives in CPU memory.
    fn gpu_pixel_buffers_supported(&self) -> bool;

    /// Row pitch alignment, in bytes, required when copying from a GPU pixel buffer.
    fn pixel_buffer_row_alignment(&self) -> u32 {
        1
    }

    /// Whether uploads may use a source row pitch wider than the uploaded rectangle.
    /// Without it, partial uploads fall back to whole texture rows.
    fn supports_unpack_row_length(&self) -> bool {
        true
    }

    fn create_texture(&mut self, width: u32, height: u32, format: PixelFormat) -> TextureId;

    fn delete_texture(&mut self, texture: TextureId);

    fn bind_texture(&mut self, texture: TextureId);

    /// Copy `region` into `texture`. `data` starts at the first byte of the region and
    /// rows are `region.bytes_per_row` apart.
    fn upload_from_memory(&mut self, texture: TextureId, region: UploadRegion, data: &[u8]);

    fn create_pixel_buffer(&mut self, size: usize) -> Result<BufferId, BackendError>;

    fn delete_pixel_buffer(&mut self, buffer: BufferId);

    fn map_pixel_buffer(&mut self, buffer: BufferId, mode: AccessMode) -> Result<(), BackendError>;

    fn unmap_pixel_buffer(&mut self, buffer: BufferId) -> Result<(), BackendError>;

    /// Run `f` over the bytes of a mapped buffer.
    fn with_mapped_pixel_buffer<R>(&mut self, buffer: BufferId, f: impl FnOnce(&mut [u8]) -> R)
        -> R;

    /// Copy `region` into `texture` from `buffer`, starting `offset` bytes into it.
    fn upload_from_pixel_buffer(
        &mut self,
        buffer: BufferId,
        texture: TextureId,
        region: UploadRegion,
        offset: usize,
    );

    /// Restore the default source row pitch after a pass of partial uploads.
    fn reset_unpack_row_length(&mut self) {}
}
