use std::collections::HashMap;
use std::sync::mpsc;

use glyph_cache::{
    AccessMode, BackendError, BufferId, PixelFormat, TextureBackend, TextureId, UploadRegion,
};

/// wgpu format of a cache texture.
pub const fn texture_format(format: PixelFormat) -> wgpu::TextureFormat {
    match format {
        PixelFormat::Alpha8 => wgpu::TextureFormat::R8Unorm,
        PixelFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
    }
}

/// Buffer sizes must be a multiple of [`wgpu::COPY_BUFFER_ALIGNMENT`] to be mapped.
fn mappable_size(size: usize) -> u64 {
    (size as u64).div_ceil(wgpu::COPY_BUFFER_ALIGNMENT) * wgpu::COPY_BUFFER_ALIGNMENT
}

struct CacheTextureGpu {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct StagingBuffer {
    buffer: wgpu::Buffer,
    mapped: bool,
}

/// Cache textures and staging buffers living on a wgpu device.
///
/// GPU pixel buffers are `MAP_WRITE | COPY_SRC` buffers mapped synchronously and
/// copied into their texture with a buffer to texture copy.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    gpu_pixel_buffers: bool,

    textures: HashMap<TextureId, CacheTextureGpu>,
    buffers: HashMap<BufferId, StagingBuffer>,
    next_id: u32,
}

impl WgpuBackend {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            gpu_pixel_buffers: true,
            textures: HashMap::new(),
            buffers: HashMap::new(),
            next_id: 1,
        }
    }

    /// Stage glyphs in CPU memory and upload with `Queue::write_texture` instead.
    pub fn with_gpu_pixel_buffers(mut self, enabled: bool) -> Self {
        self.gpu_pixel_buffers = enabled;
        self
    }

    #[inline]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn texture_view(&self, texture: TextureId) -> Option<&wgpu::TextureView> {
        self.textures.get(&texture).map(|t| &t.view)
    }

    pub fn contains_texture(&self, texture: TextureId) -> bool {
        self.textures.contains_key(&texture)
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn copy_extent(region: UploadRegion) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: region.width,
            height: region.height,
            depth_or_array_layers: 1,
        }
    }
}

impl TextureBackend for WgpuBackend {
    fn max_texture_size(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    fn gpu_pixel_buffers_supported(&self) -> bool {
        self.gpu_pixel_buffers
    }

    fn pixel_buffer_row_alignment(&self) -> u32 {
        wgpu::COPY_BYTES_PER_ROW_ALIGNMENT
    }

    fn create_texture(&mut self, width: u32, height: u32, format: PixelFormat) -> TextureId {
        let id = TextureId(self.next_id());
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Glyph Cache Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: texture_format(format),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.textures.insert(
            id,
            CacheTextureGpu { texture, view },
        );
        id
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if let Some(gpu) = self.textures.remove(&texture) {
            gpu.texture.destroy();
        }
    }

    // Copies name their destination texture, so there is no binding state.
    fn bind_texture(&mut self, _texture: TextureId) {}

    fn upload_from_memory(&mut self, texture: TextureId, region: UploadRegion, data: &[u8]) {
        let Some(gpu) = self.textures.get(&texture) else {
            log::warn!("Upload to unknown cache texture {texture:?}");
            return;
        };

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &gpu.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: region.x,
                    y: region.y,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(region.bytes_per_row),
                rows_per_image: Some(region.height),
            },
            Self::copy_extent(region),
        );
    }

    fn create_pixel_buffer(&mut self, size: usize) -> Result<BufferId, BackendError> {
        let padded = mappable_size(size);
        if size == 0 || padded > self.device.limits().max_buffer_size {
            return Err(BackendError::AllocationFailed(size));
        }

        let id = BufferId(self.next_id());
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Glyph Cache Pixel Buffer"),
            size: padded,
            usage: wgpu::BufferUsages::MAP_WRITE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        self.buffers.insert(
            id,
            StagingBuffer {
                buffer,
                mapped: false,
            },
        );
        Ok(id)
    }

    fn delete_pixel_buffer(&mut self, buffer: BufferId) {
        if let Some(staging) = self.buffers.remove(&buffer) {
            staging.buffer.destroy();
        }
    }

    /// Staging buffers are write-only on the GPU side, every mode maps for writing.
    fn map_pixel_buffer(
        &mut self,
        buffer: BufferId,
        _mode: AccessMode,
    ) -> Result<(), BackendError> {
        let staging = self
            .buffers
            .get_mut(&buffer)
            .ok_or(BackendError::UnknownBuffer(buffer))?;
        if staging.mapped {
            return Ok(());
        }

        let (tx, rx) = mpsc::channel();
        staging
            .buffer
            .slice(..)
            .map_async(wgpu::MapMode::Write, move |result| {
                let _ = tx.send(result);
            });
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .map_err(|err| BackendError::MapFailed {
                buffer,
                reason: err.to_string(),
            })?;

        match rx.recv() {
            Ok(Ok(())) => {
                staging.mapped = true;
                Ok(())
            }
            Ok(Err(err)) => Err(BackendError::MapFailed {
                buffer,
                reason: err.to_string(),
            }),
            Err(_) => Err(BackendError::MapFailed {
                buffer,
                reason: "map callback never ran".to_string(),
            }),
        }
    }

    fn unmap_pixel_buffer(&mut self, buffer: BufferId) -> Result<(), BackendError> {
        let staging = self
            .buffers
            .get_mut(&buffer)
            .ok_or(BackendError::UnknownBuffer(buffer))?;
        if staging.mapped {
            staging.buffer.unmap();
            staging.mapped = false;
        }
        Ok(())
    }

    fn with_mapped_pixel_buffer<R>(
        &mut self,
        buffer: BufferId,
        f: impl FnOnce(&mut [u8]) -> R,
    ) -> R {
        match self.buffers.get(&buffer) {
            Some(staging) if staging.mapped => {
                let mut view = staging.buffer.slice(..).get_mapped_range_mut();
                f(&mut view)
            }
            _ => {
                log::error!("Pixel buffer {buffer:?} is not mapped");
                f(&mut [])
            }
        }
    }

    fn upload_from_pixel_buffer(
        &mut self,
        buffer: BufferId,
        texture: TextureId,
        region: UploadRegion,
        offset: usize,
    ) {
        let (Some(staging), Some(gpu)) = (self.buffers.get(&buffer), self.textures.get(&texture))
        else {
            log::warn!("Upload from {buffer:?} to {texture:?} references a released resource");
            return;
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Glyph Cache Upload Encoder"),
            });
        encoder.copy_buffer_to_texture(
            wgpu::TexelCopyBufferInfo {
                buffer: &staging.buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: offset as u64,
                    bytes_per_row: Some(region.bytes_per_row),
                    rows_per_image: Some(region.height),
                },
            },
            wgpu::TexelCopyTextureInfo {
                texture: &gpu.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: region.x,
                    y: region.y,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            Self::copy_extent(region),
        );
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_formats_map_to_unorm_textures() {
        assert_eq!(
            texture_format(PixelFormat::Alpha8),
            wgpu::TextureFormat::R8Unorm
        );
        assert_eq!(
            texture_format(PixelFormat::Rgba8),
            wgpu::TextureFormat::Rgba8Unorm
        );
    }

    #[test]
    fn staging_sizes_are_copy_aligned() {
        assert_eq!(mappable_size(1), 4);
        assert_eq!(mappable_size(256 * 3), 768);
        assert_eq!(mappable_size(1027), 1028);
    }
}
