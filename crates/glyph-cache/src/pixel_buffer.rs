//! Staging memory a cache texture is rasterized into before upload.
//!
//! Two backing stores share one API:
//! - CPU: a plain byte vector, uploaded straight from memory.
//! - GPU: a backend buffer that must be mapped to be written and unmapped before
//!   the texture copy reads from it.
//!
//! Which one a texture gets is decided once, at creation, from [`BufferKind`] and
//! what the backend supports.

use crate::backend::{AccessMode, BufferId, TextureBackend, TextureId, UploadRegion};
use crate::format::PixelFormat;

/// Requested backing store for a [`PixelBuffer`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BufferKind {
    /// GPU buffer when the backend supports one, CPU memory otherwise.
    #[default]
    Auto,
    /// Always CPU memory.
    Cpu,
}

#[derive(Debug)]
enum Storage {
    Cpu(Vec<u8>),
    Gpu(BufferId),
}

#[derive(Debug)]
pub struct PixelBuffer {
    format: PixelFormat,
    width: u32,
    height: u32,
    stride: u32,
    access: AccessMode,
    storage: Storage,
}

impl PixelBuffer {
    pub fn create<B: TextureBackend>(
        backend: &mut B,
        format: PixelFormat,
        width: u32,
        height: u32,
        kind: BufferKind,
    ) -> Self {
        let row_bytes = width * format.bytes_per_pixel();

        if kind == BufferKind::Auto && backend.gpu_pixel_buffers_supported() {
            let stride = align_up(row_bytes, backend.pixel_buffer_row_alignment());
            match backend.create_pixel_buffer(stride as usize * height as usize) {
                Ok(buffer) => {
                    return Self {
                        format,
                        width,
                        height,
                        stride,
                        access: AccessMode::None,
                        storage: Storage::Gpu(buffer),
                    };
                }
                Err(err) => {
                    log::warn!("GPU pixel buffer unavailable ({err}), staging glyphs in memory");
                }
            }
        }

        Self {
            format,
            width,
            height,
            stride: row_bytes,
            access: AccessMode::None,
            storage: Storage::Cpu(vec![0; row_bytes as usize * height as usize]),
        }
    }

    #[inline]
    pub const fn format(&self) -> PixelFormat {
        self.format
    }

    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Bytes between the starts of two rows.
    #[inline]
    pub const fn stride(&self) -> u32 {
        self.stride
    }

    /// Total size of the backing store in bytes.
    #[inline]
    pub const fn size(&self) -> usize {
        self.stride as usize * self.height as usize
    }

    #[inline]
    pub const fn access_mode(&self) -> AccessMode {
        self.access
    }

    #[inline]
    pub const fn is_mapped(&self) -> bool {
        self.access.is_mapped()
    }

    pub const fn is_gpu_backed(&self) -> bool {
        matches!(self.storage, Storage::Gpu(_))
    }

    /// Byte offset of pixel (`x`, `y`).
    #[inline]
    pub const fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.stride as usize + x as usize * self.format.bytes_per_pixel() as usize
    }

    /// Staged bytes of a CPU buffer. `None` for GPU buffers.
    pub fn cpu_bytes(&self) -> Option<&[u8]> {
        match &self.storage {
            Storage::Cpu(data) => Some(data.as_slice()),
            Storage::Gpu(_) => None,
        }
    }

    /// Make the contents writable.
    ///
    /// Mapping an already mapped buffer keeps the original access mode. Failing to map
    /// a GPU buffer leaves the cache unable to make progress and aborts.
    pub fn map<B: TextureBackend>(&mut self, backend: &mut B, mode: AccessMode) {
        if self.access.is_mapped() || !mode.is_mapped() {
            return;
        }

        if let Storage::Gpu(buffer) = self.storage {
            if let Err(err) = backend.map_pixel_buffer(buffer, mode) {
                log::error!("Failed to map GPU pixel buffer {buffer:?}: {err}");
                panic!("unable to map glyph cache pixel buffer {buffer:?}: {err}");
            }
        }
        self.access = mode;
    }

    /// Map for read/write if needed and run `f` over the whole buffer.
    pub fn with_mapped<B: TextureBackend, R>(
        &mut self,
        backend: &mut B,
        f: impl FnOnce(&mut [u8]) -> R,
    ) -> R {
        self.map(backend, AccessMode::ReadWrite);
        match &mut self.storage {
            Storage::Cpu(data) => f(data.as_mut_slice()),
            Storage::Gpu(buffer) => backend.with_mapped_pixel_buffer(*buffer, f),
        }
    }

    pub fn unmap<B: TextureBackend>(&mut self, backend: &mut B) {
        if !self.access.is_mapped() {
            return;
        }

        if let Storage::Gpu(buffer) = self.storage {
            if let Err(err) = backend.unmap_pixel_buffer(buffer) {
                log::error!("Corrupted GPU pixel buffer {buffer:?}: {err}");
            }
        }
        self.access = AccessMode::None;
    }

    /// Copy the `width` x `height` region at (`x`, `y`) into the same region of `texture`.
    pub fn upload<B: TextureBackend>(
        &mut self,
        backend: &mut B,
        texture: TextureId,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) {
        self.unmap(backend);

        let offset = self.offset(x, y);
        let region = UploadRegion {
            x,
            y,
            width,
            height,
            bytes_per_row: self.stride,
        };

        match &self.storage {
            Storage::Cpu(data) => backend.upload_from_memory(texture, region, &data[offset..]),
            Storage::Gpu(buffer) => {
                backend.upload_from_pixel_buffer(*buffer, texture, region, offset);
            }
        }
    }

    /// Give the backing store back to the backend.
    pub fn release<B: TextureBackend>(mut self, backend: &mut B) {
        self.unmap(backend);
        if let Storage::Gpu(buffer) = self.storage {
            backend.delete_pixel_buffer(buffer);
        }
    }
}

#[inline]
fn align_up(value: u32, alignment: u32) -> u32 {
    let alignment = alignment.max(1);
    value.div_ceil(alignment) * alignment
}
