//! Tiny built-in bitmap font for the demo.
//!
//! Monospaced segment glyphs drawn procedurally at an integer scale. Fonts can
//! emit 8 bit coverage or 1 bit masks, and glyph ids from [`COLOR_GLYPH_BASE`] on
//! are solid ARGB swatches standing in for emoji.

use glyph_cache::{FontId, GlyphBitmap, GlyphId, MaskFormat, RasterSource};

/// Base cell of one glyph at scale 1.
const CELL_WIDTH: u32 = 8;
const CELL_HEIGHT: u32 = 12;
const BASELINE_FROM_TOP: u32 = 9;

/// First glyph id rendered as a color swatch.
pub const COLOR_GLYPH_BASE: u32 = 0xF000;

const MONO_FLAG: u64 = 1 << 32;

// Segments, seven-segment style plus a center stroke.
const TOP: u8 = 1 << 0;
const MID: u8 = 1 << 1;
const BOT: u8 = 1 << 2;
const UPPER_LEFT: u8 = 1 << 3;
const LOWER_LEFT: u8 = 1 << 4;
const UPPER_RIGHT: u8 = 1 << 5;
const LOWER_RIGHT: u8 = 1 << 6;
const CENTER: u8 = 1 << 7;

const LEFT: u8 = UPPER_LEFT | LOWER_LEFT;
const RIGHT: u8 = UPPER_RIGHT | LOWER_RIGHT;
const BOX: u8 = TOP | BOT | LEFT | RIGHT;

fn segments(ch: char) -> u8 {
    match ch.to_ascii_uppercase() {
        '0' | 'O' | 'D' => BOX,
        '1' => RIGHT,
        '2' => TOP | MID | BOT | UPPER_RIGHT | LOWER_LEFT,
        '3' => TOP | MID | BOT | RIGHT,
        '4' => MID | UPPER_LEFT | RIGHT,
        '5' | 'S' => TOP | MID | BOT | UPPER_LEFT | LOWER_RIGHT,
        '6' => TOP | MID | BOT | LEFT | LOWER_RIGHT,
        '7' => TOP | RIGHT,
        '8' | 'B' => BOX | MID,
        '9' => TOP | MID | BOT | UPPER_LEFT | RIGHT,
        'A' => TOP | MID | LEFT | RIGHT,
        'C' => TOP | BOT | LEFT,
        'E' => TOP | MID | BOT | LEFT,
        'F' => TOP | MID | LEFT,
        'G' => TOP | BOT | LEFT | LOWER_RIGHT,
        'H' => MID | LEFT | RIGHT,
        'I' => TOP | BOT | CENTER,
        'J' => BOT | RIGHT | LOWER_LEFT,
        'L' => BOT | LEFT,
        'M' | 'N' | 'W' => LEFT | RIGHT | CENTER,
        'P' => TOP | MID | LEFT | UPPER_RIGHT,
        'R' => TOP | MID | LEFT | UPPER_RIGHT | LOWER_RIGHT,
        'T' => TOP | CENTER,
        'U' | 'V' => BOT | LEFT | RIGHT,
        'Y' => MID | UPPER_LEFT | RIGHT | BOT,
        'Z' => TOP | MID | BOT | UPPER_RIGHT | LOWER_LEFT,
        '-' => MID,
        '_' => BOT,
        '=' => MID | BOT,
        '+' => MID | CENTER,
        '|' | '!' => CENTER,
        _ => BOX | MID | CENTER,
    }
}

/// Procedural monospace font.
#[derive(Clone, Debug, Default)]
pub struct DebugFont {
    rasterized: usize,
}

impl DebugFont {
    pub fn new() -> Self {
        Self::default()
    }

    /// Font id for glyphs drawn at `scale` times the base cell, as coverage or 1 bit masks.
    pub const fn font(scale: u32, mono: bool) -> FontId {
        let scale = (if scale == 0 { 1 } else { scale }) as u64;
        FontId(if mono { scale | MONO_FLAG } else { scale })
    }

    pub const fn advance(scale: u32) -> u32 {
        CELL_WIDTH * if scale == 0 { 1 } else { scale }
    }

    /// Glyphs laid out along a baseline starting at the run origin.
    pub fn layout(text: &str, scale: u32) -> (Vec<GlyphId>, Vec<[f32; 2]>, Vec<i32>) {
        let advance = Self::advance(scale);
        let glyphs = text.chars().map(|ch| GlyphId(ch as u32)).collect::<Vec<_>>();
        let positions = (0..glyphs.len())
            .map(|i| [(i as u32 * advance) as f32, 0.0])
            .collect();
        let widths = vec![advance as i32; glyphs.len()];
        (glyphs, positions, widths)
    }

    /// Glyphs rasterized so far.
    pub fn rasterized(&self) -> usize {
        self.rasterized
    }

    fn coverage_mask(ch: char, scale: u32) -> (u32, u32, Vec<u8>) {
        let w = CELL_WIDTH * scale;
        let h = CELL_HEIGHT * scale;
        let mut pixels = vec![0u8; (w * h) as usize];

        let t = scale;
        let x0 = scale;
        let x1 = w - scale;
        let y0 = 2 * scale;
        let y1 = h - 2 * scale;
        let mid_y = (y0 + y1) / 2;
        let mid_x = (x0 + x1) / 2;

        let mut fill = |left: u32, top: u32, right: u32, bottom: u32| {
            for y in top..bottom.min(h) {
                for x in left..right.min(w) {
                    pixels[(y * w + x) as usize] = 255;
                }
            }
        };

        let mask = segments(ch);
        if mask & TOP != 0 {
            fill(x0, y0, x1, y0 + t);
        }
        if mask & MID != 0 {
            fill(x0, mid_y, x1, mid_y + t);
        }
        if mask & BOT != 0 {
            fill(x0, y1 - t, x1, y1);
        }
        if mask & UPPER_LEFT != 0 {
            fill(x0, y0, x0 + t, mid_y + t);
        }
        if mask & LOWER_LEFT != 0 {
            fill(x0, mid_y, x0 + t, y1);
        }
        if mask & UPPER_RIGHT != 0 {
            fill(x1 - t, y0, x1, mid_y + t);
        }
        if mask & LOWER_RIGHT != 0 {
            fill(x1 - t, mid_y, x1, y1);
        }
        if mask & CENTER != 0 {
            fill(mid_x, y0, mid_x + t, y1);
        }

        (w, h, pixels)
    }

    fn pack_bits(width: u32, height: u32, coverage: &[u8]) -> Vec<u8> {
        let row_bytes = MaskFormat::Bw.row_bytes(width) as usize;
        let mut bits = vec![0u8; row_bytes * height as usize];
        for y in 0..height as usize {
            for x in 0..width as usize {
                if coverage[y * width as usize + x] >= 128 {
                    bits[y * row_bytes + x / 8] |= 0x80 >> (x % 8);
                }
            }
        }
        bits
    }

    fn swatch(index: u32, scale: u32) -> GlyphBitmap {
        let w = CELL_WIDTH * scale;
        let h = CELL_HEIGHT * scale;
        let hue = index.wrapping_mul(0x9E37_79B9);
        let color = [(hue >> 8) as u8, (hue >> 16) as u8, (hue >> 24) as u8, 255];
        let pixels = color.repeat((w * h) as usize);
        GlyphBitmap::new(MaskFormat::Argb32, w, h, pixels)
    }
}

impl RasterSource for DebugFont {
    fn rasterize(&mut self, font: FontId, glyph: GlyphId) -> Option<GlyphBitmap> {
        let scale = (font.0 & u32::MAX as u64).max(1) as u32;
        let mono = font.0 & MONO_FLAG != 0;
        let bearing_y = -((BASELINE_FROM_TOP * scale) as i32);

        let bitmap = if glyph.0 >= COLOR_GLYPH_BASE {
            Self::swatch(glyph.0 - COLOR_GLYPH_BASE, scale)
        } else {
            let ch = char::from_u32(glyph.0)?;
            if ch.is_whitespace() {
                GlyphBitmap::empty(MaskFormat::A8)
            } else if ch.is_control() {
                return None;
            } else {
                let (w, h, coverage) = Self::coverage_mask(ch, scale);
                if mono {
                    GlyphBitmap::new(MaskFormat::Bw, w, h, Self::pack_bits(w, h, &coverage))
                } else {
                    GlyphBitmap::new(MaskFormat::A8, w, h, coverage)
                }
            }
        };

        self.rasterized += 1;
        Some(bitmap.with_bearing(0, bearing_y))
    }
}
