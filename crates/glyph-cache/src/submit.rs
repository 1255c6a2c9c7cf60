//! Collaborators the renderer hands work to.

use crate::backend::TextureBackend;
use crate::cache_texture::CacheTexture;
use crate::raster::GlyphId;

/// Turns the quads batched for one cache texture into a draw.
///
/// The texture's mesh is only borrowed for the duration of [`DrawSubmitter::draw`];
/// implementations copy what they need out of it.
pub trait DrawSubmitter<B: TextureBackend> {
    fn draw(&mut self, backend: &mut B, texture: &CacheTexture, linear_filtering: bool);

    /// Called once after every texture of a flush has been drawn.
    fn finish_batch(&mut self, _backend: &mut B) {}
}

/// A glyph of hidden text, resolved to its screen position.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ResolvedGlyph {
    /// Index of the glyph in its text run.
    pub index: usize,
    pub glyph: GlyphId,
    /// Left/top of the glyph quad in screen space.
    pub position: [f32; 2],
    /// Advance reported by the host for this character, if any.
    pub char_width: Option<i32>,
}

/// Receives the layout of hidden text. Purely a notification: nothing returns to the
/// cache.
pub trait HiddenTextHook {
    fn glyph_resolved(&mut self, glyph: ResolvedGlyph);
}
