//! # glyph-cache-wgpu
//!
//! WGPU backend for glyph-cache: cache textures and staging buffers on a wgpu
//! device, plus a draw submitter that renders the batched glyph quads.

mod backend;
mod submitter;
mod vertex;

pub use backend::*;
pub use submitter::*;
pub use vertex::*;
