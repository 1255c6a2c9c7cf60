use thiserror::Error;

use crate::backend::BufferId;
use crate::format::{MaskFormat, PixelFormat};

/// Errors reported to callers of the glyph cache.
///
/// Running out of atlas space is not an error: it is handled inside the cache by
/// eviction and surfaces as a glyph that is not cached.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GlyphCacheError {
    #[error("No font selected")]
    NoFontSelected,

    #[error("Text run has {glyphs} glyphs but {positions} positions")]
    PositionCountMismatch { glyphs: usize, positions: usize },

    #[error("Glyph mask {mask:?} cannot be stored in a {atlas:?} texture")]
    UnsupportedMaskFormat {
        mask: MaskFormat,
        atlas: PixelFormat,
    },

    #[error("Glyph bitmap {width}x{height} holds {actual} bytes, needs {expected}")]
    BitmapTooSmall {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Glyph at ({x}, {y}) sized {width}x{height} does not fit its destination")]
    DestinationOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
}

/// Failures reported by a [`crate::TextureBackend`] implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Pixel buffer allocation of {0} bytes failed")]
    AllocationFailed(usize),

    #[error("Unknown pixel buffer {0:?}")]
    UnknownBuffer(BufferId),

    #[error("Mapping pixel buffer {buffer:?} failed: {reason}")]
    MapFailed { buffer: BufferId, reason: String },

    #[error("Pixel buffer {0:?} contents were lost while mapped")]
    Corrupted(BufferId),
}

pub type Result<T> = std::result::Result<T, GlyphCacheError>;
