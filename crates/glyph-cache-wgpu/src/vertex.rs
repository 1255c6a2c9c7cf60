use bytemuck::{Pod, Zeroable};
use glyph_cache::TextureVertex;

/// Vertex buffer layout of [`TextureVertex`].
pub const fn texture_vertex_desc() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: &[wgpu::VertexAttribute] = &[
        // pos
        wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x2,
        },
        // uv
        wgpu::VertexAttribute {
            offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x2,
        },
    ];

    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<TextureVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: ATTRIBUTES,
    }
}

/// Uniforms shared by every glyph draw.
///
/// Color is linear RGBA in `[0, 1]` and tints alpha glyphs only.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct TextGlobals {
    pub screen_size: [f32; 2],
    pub _pad: [f32; 2],
    pub color: [f32; 4],
}

impl TextGlobals {
    pub const fn new(screen_size: [f32; 2], color: [f32; 4]) -> Self {
        Self {
            screen_size,
            _pad: [0.0; 2],
            color,
        }
    }
}
