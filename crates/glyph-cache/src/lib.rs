//! # glyph-cache
//!
//! Graphics backend agnostic glyph texture cache.
//!
//! Rasterized glyphs are packed into a small set of cache textures per pixel
//! format, staged in CPU or GPU memory and uploaded lazily. Text is drawn as
//! batches of textured quads, one batch per cache texture. The graphics API is
//! reached through [`TextureBackend`] and [`DrawSubmitter`]; `glyph-cache-wgpu`
//! implements both for wgpu.

mod backend;
mod cache_texture;
mod config;
mod copier;
mod error;
mod font;
mod format;
mod geometry;
mod mesh;
mod packer;
mod pixel_buffer;
mod raster;
mod renderer;
mod shadow;
mod stats;
mod submit;

#[cfg(test)]
pub(crate) mod test_support;

pub use backend::*;
pub use cache_texture::*;
pub use config::*;
pub use copier::*;
pub use error::*;
pub use font::*;
pub use format::*;
pub use geometry::*;
pub use mesh::*;
pub use packer::*;
pub use pixel_buffer::*;
pub use raster::*;
pub use renderer::*;
pub use shadow::*;
pub use stats::*;
pub use submit::*;
