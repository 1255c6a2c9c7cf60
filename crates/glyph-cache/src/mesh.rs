use bytemuck::{Pod, Zeroable};
use glam::{Affine2, Vec2};

use crate::geometry::{Rect, UvRect};

/// Vertex format for glyph quads.
///
/// Positions are in screen-space pixels, UVs are normalized coordinates into the
/// cache texture the quad samples from.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TextureVertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
}

impl TextureVertex {
    pub const fn new(pos: [f32; 2], uv: [f32; 2]) -> Self {
        Self { pos, uv }
    }
}

/// Four vertices of one glyph, ordered bottom-left, bottom-right, top-right, top-left.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GlyphQuad {
    pub vertices: [TextureVertex; 4],
}

impl GlyphQuad {
    /// Screen-aligned quad covering `rect`.
    pub fn axis_aligned(rect: Rect, uv: UvRect) -> Self {
        Self {
            vertices: [
                TextureVertex::new([rect.left(), rect.bottom()], [uv.min[0], uv.max[1]]),
                TextureVertex::new([rect.right(), rect.bottom()], [uv.max[0], uv.max[1]]),
                TextureVertex::new([rect.right(), rect.top()], [uv.max[0], uv.min[1]]),
                TextureVertex::new([rect.left(), rect.top()], [uv.min[0], uv.min[1]]),
            ],
        }
    }

    /// Quad covering `rect` after mapping each corner through `transform`.
    pub fn transformed(rect: Rect, uv: UvRect, transform: &Affine2) -> Self {
        let mut quad = Self::axis_aligned(rect, uv);
        for vertex in &mut quad.vertices {
            vertex.pos = transform.transform_point2(Vec2::from(vertex.pos)).to_array();
        }
        quad
    }

    /// Bounds of a screen-aligned quad: left and bottom from the bottom-left vertex,
    /// right and top from the top-right one.
    pub fn aligned_bounds(&self) -> Rect {
        let [bl, _, tr, _] = self.vertices;
        Rect::new([bl.pos[0], tr.pos[1]], [tr.pos[0], bl.pos[1]])
    }

    /// Bounds over all four corners.
    pub fn corner_bounds(&self) -> Rect {
        let mut bounds = Rect::EMPTY_BOUNDS;
        for vertex in &self.vertices {
            bounds.include_point(vertex.pos);
        }
        bounds
    }

    /// Whether an axis-aligned quad lies completely outside `clip`.
    pub fn is_outside(&self, clip: &Rect) -> bool {
        let quad = self.aligned_bounds();
        quad.left() > clip.right()
            || quad.bottom() < clip.top()
            || quad.right() < clip.left()
            || quad.top() > clip.bottom()
    }
}

/// Fixed-capacity vertex batch for one cache texture.
#[derive(Clone, Debug)]
pub struct QuadMesh {
    vertices: Vec<TextureVertex>,
    max_quads: usize,
}

impl QuadMesh {
    pub fn new(max_quads: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(max_quads * 4),
            max_quads,
        }
    }

    /// Append a quad. Returns `false` and leaves the mesh untouched when it is full.
    pub fn push(&mut self, quad: GlyphQuad) -> bool {
        if self.is_full() {
            return false;
        }
        self.vertices.extend_from_slice(&quad.vertices);
        true
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.quad_count() >= self.max_quads
    }

    #[inline]
    pub const fn max_quads(&self) -> usize {
        self.max_quads
    }

    pub fn vertices(&self) -> &[TextureVertex] {
        &self.vertices
    }
}

/// Triangle-list indices for `quad_count` quads laid out as [`GlyphQuad`] vertices.
pub fn quad_indices(quad_count: usize) -> Vec<u32> {
    let mut indices = Vec::with_capacity(quad_count * 6);
    for quad in 0..quad_count as u32 {
        let base = quad * 4;
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn unit_uv() -> UvRect {
        UvRect::new([0.0, 0.0], [1.0, 1.0])
    }

    #[test]
    fn vertices_are_bl_br_tr_tl() {
        let quad = GlyphQuad::axis_aligned(Rect::new([10.0, 20.0], [14.0, 30.0]), unit_uv());
        let pos: Vec<_> = quad.vertices.iter().map(|v| v.pos).collect();
        assert_eq!(pos, vec![[10.0, 30.0], [14.0, 30.0], [14.0, 20.0], [10.0, 20.0]]);
        assert_eq!(quad.vertices[0].uv, [0.0, 1.0]);
        assert_eq!(quad.vertices[2].uv, [1.0, 0.0]);
        assert_eq!(quad.aligned_bounds(), Rect::new([10.0, 20.0], [14.0, 30.0]));
    }

    #[test]
    fn clip_rejects_only_disjoint_quads() {
        let clip = Rect::new([0.0, 0.0], [100.0, 50.0]);
        let inside = GlyphQuad::axis_aligned(Rect::new([10.0, 10.0], [20.0, 20.0]), unit_uv());
        let straddling =
            GlyphQuad::axis_aligned(Rect::new([95.0, 45.0], [105.0, 55.0]), unit_uv());
        let right = GlyphQuad::axis_aligned(Rect::new([101.0, 10.0], [110.0, 20.0]), unit_uv());
        let above = GlyphQuad::axis_aligned(Rect::new([10.0, -20.0], [20.0, -1.0]), unit_uv());

        assert!(!inside.is_outside(&clip));
        assert!(!straddling.is_outside(&clip));
        assert!(right.is_outside(&clip));
        assert!(above.is_outside(&clip));
    }

    #[test]
    fn rotated_bounds_cover_every_corner() {
        let rect = Rect::new([0.0, 0.0], [4.0, 2.0]);
        let quad = GlyphQuad::transformed(rect, unit_uv(), &Affine2::from_angle(FRAC_PI_2));
        let bounds = quad.corner_bounds();

        assert!((bounds.left() + 2.0).abs() < 1e-5);
        assert!((bounds.right() - 0.0).abs() < 1e-5);
        assert!((bounds.top() - 0.0).abs() < 1e-5);
        assert!((bounds.bottom() - 4.0).abs() < 1e-5);
    }

    #[test]
    fn mesh_refuses_quads_past_capacity() {
        let quad = GlyphQuad::axis_aligned(Rect::new([0.0, 0.0], [1.0, 1.0]), unit_uv());
        let mut mesh = QuadMesh::new(2);

        assert!(mesh.push(quad));
        assert!(!mesh.is_full());
        assert!(mesh.push(quad));
        assert!(mesh.is_full());
        assert!(!mesh.push(quad));
        assert_eq!(mesh.quad_count(), 2);

        mesh.clear();
        assert!(mesh.is_empty());
    }

    #[test]
    fn indices_form_two_triangles_per_quad() {
        assert_eq!(quad_indices(2), vec![0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7]);
    }
}
