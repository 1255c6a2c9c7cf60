//! Format conversion from rasterized glyphs into cache texture staging memory.
//!
//! Every copy also clears `border` pixels on all four sides of the glyph, so a
//! texture region that previously held another glyph never leaks into the
//! neighbourhood of the new one under linear filtering.

use crate::config::GammaTable;
use crate::error::{GlyphCacheError, Result};
use crate::format::{MaskFormat, PixelFormat};
use crate::packer::AtlasPx;
use crate::raster::GlyphBitmap;

#[derive(Clone, Copy)]
enum RowCopy<'a> {
    Alpha(Option<&'a GammaTable>),
    Mono,
    Color,
}

/// Copy `bitmap` into `dst` with its top-left pixel at `origin`.
///
/// `dst` holds rows of `dst_stride` bytes in `atlas` format. The border ring around
/// the glyph is zeroed.
pub fn copy_glyph(
    dst: &mut [u8],
    dst_stride: usize,
    atlas: PixelFormat,
    origin: AtlasPx,
    bitmap: &GlyphBitmap,
    border: u32,
    gamma: Option<&GammaTable>,
) -> Result<()> {
    let copy = match (bitmap.format, atlas) {
        (MaskFormat::A8, PixelFormat::Alpha8) => RowCopy::Alpha(gamma),
        (MaskFormat::Bw, PixelFormat::Alpha8) => RowCopy::Mono,
        (MaskFormat::Argb32, PixelFormat::Rgba8) => RowCopy::Color,
        (mask, atlas) => return Err(GlyphCacheError::UnsupportedMaskFormat { mask, atlas }),
    };
    bitmap.validate()?;

    let bpp = atlas.bytes_per_pixel() as usize;
    let (w, h) = (bitmap.width as usize, bitmap.height as usize);
    let (x0, y0) = (origin.x as usize, origin.y as usize);
    let b = border as usize;

    let padded_row = (w + 2 * b) * bpp;
    let out_of_bounds = x0 < b
        || y0 < b
        || (x0 - b) * bpp + padded_row > dst_stride
        || (y0 + h + b) * dst_stride > dst.len();
    if out_of_bounds {
        return Err(GlyphCacheError::DestinationOutOfBounds {
            x: origin.x,
            y: origin.y,
            width: bitmap.width,
            height: bitmap.height,
        });
    }

    let left = (x0 - b) * bpp;
    let row_range = |y: usize| y * dst_stride + left..y * dst_stride + left + padded_row;

    for y in (y0 - b)..y0 {
        dst[row_range(y)].fill(0);
    }

    let src_stride = bitmap.stride as usize;
    for row in 0..h {
        let src = &bitmap.pixels[row * src_stride..];
        let line = &mut dst[row_range(y0 + row)];
        let (lead, rest) = line.split_at_mut(b * bpp);
        let (glyph, trail) = rest.split_at_mut(w * bpp);
        lead.fill(0);
        trail.fill(0);

        match copy {
            RowCopy::Alpha(None) => glyph.copy_from_slice(&src[..w]),
            RowCopy::Alpha(Some(table)) => {
                for (d, s) in glyph.iter_mut().zip(&src[..w]) {
                    *d = table.apply(*s);
                }
            }
            RowCopy::Mono => {
                for (x, d) in glyph.iter_mut().enumerate() {
                    let bit = src[x / 8] & (0x80 >> (x % 8));
                    *d = if bit != 0 { 0xFF } else { 0 };
                }
            }
            RowCopy::Color => glyph.copy_from_slice(&src[..w * 4]),
        }
    }

    for y in (y0 + h)..(y0 + h + b) {
        dst[row_range(y)].fill(0);
    }

    Ok(())
}
