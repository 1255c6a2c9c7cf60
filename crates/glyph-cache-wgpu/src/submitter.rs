use std::collections::HashMap;

use glyph_cache::{
    quad_indices, CacheTexture, DrawSubmitter, PixelFormat, TextureId, TextureVertex,
    MAX_QUADS_PER_MESH,
};

use crate::backend::WgpuBackend;
use crate::vertex::{texture_vertex_desc, TextGlobals};

const INITIAL_VERTEX_CAPACITY: usize = 4 * MAX_QUADS_PER_MESH;

/// Quads of one cache texture within a batch.
#[derive(Clone, Copy, Debug)]
struct TextureDraw {
    texture: TextureId,
    format: PixelFormat,
    linear: bool,
    base_vertex: i32,
    quads: u32,
}

/// Renders the glyph quads of a flush into a color target.
///
/// Draws are collected until [`DrawSubmitter::finish_batch`], then recorded into a
/// single render pass and submitted.
pub struct WgpuTextSubmitter {
    alpha_pipeline: wgpu::RenderPipeline,
    color_pipeline: wgpu::RenderPipeline,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    nearest_sampler: wgpu::Sampler,
    linear_sampler: wgpu::Sampler,

    vertex_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    index_buffer: wgpu::Buffer,

    bind_groups: HashMap<(TextureId, bool), wgpu::BindGroup>,
    vertices: Vec<TextureVertex>,
    draws: Vec<TextureDraw>,

    target: wgpu::TextureView,
    target_size: [u32; 2],
    clear: Option<wgpu::Color>,
    color: [f32; 4],
    passes: u64,
}

impl WgpuTextSubmitter {
    pub fn new(
        device: &wgpu::Device,
        target: wgpu::TextureView,
        target_format: wgpu::TextureFormat,
        target_size: [u32; 2],
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Glyph Cache Text Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/text.wgsl").into()),
        });

        let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Glyph Cache Globals Buffer"),
            size: std::mem::size_of::<TextGlobals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let globals_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Glyph Cache Globals Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Glyph Cache Globals Bind Group"),
            layout: &globals_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Glyph Cache Texture Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let sampler = |label, filter| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some(label),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: filter,
                min_filter: filter,
                mipmap_filter: wgpu::FilterMode::Nearest,
                ..Default::default()
            })
        };
        let nearest_sampler = sampler("Glyph Cache Nearest Sampler", wgpu::FilterMode::Nearest);
        let linear_sampler = sampler("Glyph Cache Linear Sampler", wgpu::FilterMode::Linear);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Glyph Cache Text Pipeline Layout"),
            bind_group_layouts: &[&globals_bind_group_layout, &texture_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = |label, fragment_entry| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[texture_vertex_desc()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(fragment_entry),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: target_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };
        let alpha_pipeline = pipeline("Glyph Cache Alpha Pipeline", "fs_alpha");
        let color_pipeline = pipeline("Glyph Cache Color Pipeline", "fs_color");

        let vertex_buffer = Self::create_vertex_buffer(device, INITIAL_VERTEX_CAPACITY);

        // Every mesh shares one index pattern, drawn with a per-texture base vertex.
        let indices = quad_indices(MAX_QUADS_PER_MESH);
        let index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Glyph Cache Index Buffer"),
            size: (indices.len() * std::mem::size_of::<u32>()) as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: true,
        });
        index_buffer
            .slice(..)
            .get_mapped_range_mut()
            .copy_from_slice(bytemuck::cast_slice(&indices));
        index_buffer.unmap();

        Self {
            alpha_pipeline,
            color_pipeline,
            globals_buffer,
            globals_bind_group,
            texture_bind_group_layout,
            nearest_sampler,
            linear_sampler,
            vertex_buffer,
            vertex_capacity: INITIAL_VERTEX_CAPACITY,
            index_buffer,
            bind_groups: HashMap::new(),
            vertices: Vec::with_capacity(INITIAL_VERTEX_CAPACITY),
            draws: Vec::new(),
            target,
            target_size,
            clear: None,
            color: [1.0, 1.0, 1.0, 1.0],
            passes: 0,
        }
    }

    fn create_vertex_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Glyph Cache Vertex Buffer"),
            size: (capacity * std::mem::size_of::<TextureVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Render into a different target from the next batch on.
    pub fn set_target(&mut self, target: wgpu::TextureView, size: [u32; 2]) {
        self.target = target;
        self.target_size = size;
    }

    /// Clear the target before the next batch. Later batches load it.
    pub fn clear_next_pass(&mut self, color: wgpu::Color) {
        self.clear = Some(color);
    }

    /// Tint of alpha glyphs.
    pub fn set_color(&mut self, color: [f32; 4]) {
        self.color = color;
    }

    /// Render passes submitted so far.
    #[inline]
    pub fn passes(&self) -> u64 {
        self.passes
    }

    fn bind_group(
        &mut self,
        backend: &WgpuBackend,
        texture: TextureId,
        linear: bool,
    ) -> Option<&wgpu::BindGroup> {
        if !self.bind_groups.contains_key(&(texture, linear)) {
            let view = backend.texture_view(texture)?;
            let sampler = if linear {
                &self.linear_sampler
            } else {
                &self.nearest_sampler
            };
            let bind_group = backend
                .device()
                .create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Glyph Cache Texture Bind Group"),
                    layout: &self.texture_bind_group_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(sampler),
                        },
                    ],
                });
            self.bind_groups.insert((texture, linear), bind_group);
        }
        self.bind_groups.get(&(texture, linear))
    }
}

impl DrawSubmitter<WgpuBackend> for WgpuTextSubmitter {
    fn draw(
        &mut self,
        _backend: &mut WgpuBackend,
        texture: &CacheTexture,
        linear_filtering: bool,
    ) {
        let Some(handle) = texture.texture() else {
            return;
        };
        let vertices = texture.vertices();
        if vertices.is_empty() {
            return;
        }

        self.draws.push(TextureDraw {
            texture: handle,
            format: texture.format(),
            linear: linear_filtering,
            base_vertex: self.vertices.len() as i32,
            quads: (vertices.len() / 4) as u32,
        });
        self.vertices.extend_from_slice(vertices);
    }

    fn finish_batch(&mut self, backend: &mut WgpuBackend) {
        if self.draws.is_empty() {
            return;
        }

        // Textures released since their bind group was built.
        self.bind_groups
            .retain(|(texture, _), _| backend.contains_texture(*texture));
        let draws = std::mem::take(&mut self.draws);
        for draw in &draws {
            self.bind_group(backend, draw.texture, draw.linear);
        }

        let device = backend.device();
        let queue = backend.queue();

        if self.vertices.len() > self.vertex_capacity {
            self.vertex_capacity = (self.vertices.len() * 2).next_power_of_two();
            self.vertex_buffer = Self::create_vertex_buffer(device, self.vertex_capacity);
        }
        queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&self.vertices));

        let globals = TextGlobals::new(
            [self.target_size[0] as f32, self.target_size[1] as f32],
            self.color,
        );
        queue.write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Glyph Cache Draw Encoder"),
        });
        {
            let load = match self.clear.take() {
                Some(color) => wgpu::LoadOp::Clear(color),
                None => wgpu::LoadOp::Load,
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Glyph Cache Text Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.globals_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

            let mut current_format = None;
            let mut current_binding = None;
            for draw in &draws {
                let Some(bind_group) = self.bind_groups.get(&(draw.texture, draw.linear)) else {
                    log::warn!("Skipping glyph draw for released texture {:?}", draw.texture);
                    continue;
                };
                if current_format != Some(draw.format) {
                    render_pass.set_pipeline(match draw.format {
                        PixelFormat::Alpha8 => &self.alpha_pipeline,
                        PixelFormat::Rgba8 => &self.color_pipeline,
                    });
                    current_format = Some(draw.format);
                }
                if current_binding != Some((draw.texture, draw.linear)) {
                    render_pass.set_bind_group(1, bind_group, &[]);
                    current_binding = Some((draw.texture, draw.linear));
                }
                render_pass.draw_indexed(0..draw.quads * 6, draw.base_vertex, 0..1);
            }
        }
        queue.submit(std::iter::once(encoder.finish()));

        self.passes += 1;
        log::trace!(
            "Submitted glyph pass {} ({} draws, {} vertices)",
            self.passes,
            draws.len(),
            self.vertices.len()
        );
        self.vertices.clear();
    }
}
