//! Blurred coverage images for text drop shadows.
//!
//! The shadow is painted straight from the raster source into a standalone alpha
//! image; it never touches the cache textures.

use crate::backend::TextureBackend;
use crate::error::Result;
use crate::raster::{GlyphBitmap, RasterSource};
use crate::renderer::{GlyphRenderer, TextRun};

/// Blurs a single channel image in place.
pub trait Blur {
    fn blur(&mut self, image: &mut [u8], width: u32, height: u32, radius: f32);
}

/// Separable gaussian blur.
#[derive(Debug, Default)]
pub struct GaussianBlur {
    scratch: Vec<f32>,
}

impl GaussianBlur {
    fn kernel(radius: f32) -> Vec<f32> {
        let sigma = 0.3 * radius + 0.6;
        let reach = radius.ceil() as i32;
        let denom = 2.0 * sigma * sigma;
        let mut weights: Vec<f32> = (-reach..=reach)
            .map(|x| (-((x * x) as f32) / denom).exp())
            .collect();
        let sum: f32 = weights.iter().sum();
        for w in &mut weights {
            *w /= sum;
        }
        weights
    }
}

impl Blur for GaussianBlur {
    fn blur(&mut self, image: &mut [u8], width: u32, height: u32, radius: f32) {
        if radius <= 0.0 || width == 0 || height == 0 {
            return;
        }

        let kernel = Self::kernel(radius);
        let reach = (kernel.len() / 2) as isize;
        let (w, h) = (width as isize, height as isize);

        self.scratch.clear();
        self.scratch.resize(image.len(), 0.0);

        for y in 0..h {
            for x in 0..w {
                let mut acc = 0.0;
                for (k, weight) in kernel.iter().enumerate() {
                    let sx = x + k as isize - reach;
                    if (0..w).contains(&sx) {
                        acc += weight * f32::from(image[(y * w + sx) as usize]);
                    }
                }
                self.scratch[(y * w + x) as usize] = acc;
            }
        }

        for y in 0..h {
            for x in 0..w {
                let mut acc = 0.0;
                for (k, weight) in kernel.iter().enumerate() {
                    let sy = y + k as isize - reach;
                    if (0..h).contains(&sy) {
                        acc += weight * self.scratch[(sy * w + x) as usize];
                    }
                }
                image[(y * w + x) as usize] = acc.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

/// Alpha image of a blurred text run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DropShadow {
    pub width: u32,
    pub height: u32,
    /// Where the run's origin falls inside the image.
    pub pen: [i32; 2],
    pub image: Vec<u8>,
}

impl<B: TextureBackend> GlyphRenderer<B> {
    /// Paint `run` with the selected font into an alpha image padded by `radius` and
    /// blur it.
    ///
    /// `Ok(None)` when the run has no visible glyph or the image would exceed the
    /// device texture limit.
    pub fn render_drop_shadow(
        &mut self,
        source: &mut dyn RasterSource,
        run: TextRun<'_>,
        radius: f32,
        blur: &mut dyn Blur,
    ) -> Result<Option<DropShadow>> {
        let font = self.selected_font()?;
        run.check()?;

        // Bounds are kept in i64 so extreme positions and radii cannot overflow.
        let mut glyphs: Vec<([i64; 2], GlyphBitmap)> = Vec::with_capacity(run.glyphs.len());
        let mut bounds: Option<[i64; 4]> = None;
        for (&glyph, position) in run.glyphs.iter().zip(run.positions) {
            let Some(bitmap) = source.rasterize(font, glyph) else {
                continue;
            };
            if bitmap.is_empty() {
                continue;
            }
            if let Err(err) = bitmap.validate() {
                log::warn!("Skipping malformed shadow glyph: {err}");
                continue;
            }

            let left = position[0].floor() as i64 + i64::from(bitmap.bearing[0]);
            let top = position[1].floor() as i64 + i64::from(bitmap.bearing[1]);
            let right = left + i64::from(bitmap.width);
            let bottom = top + i64::from(bitmap.height);
            bounds = Some(match bounds {
                Some([l, t, r, b]) => [l.min(left), t.min(top), r.max(right), b.max(bottom)],
                None => [left, top, right, bottom],
            });
            glyphs.push(([left, top], bitmap));
        }

        let Some([left, top, right, bottom]) = bounds else {
            return Ok(None);
        };

        let pad = radius.max(0.0).ceil().min(u32::MAX as f32) as i64;
        let width = right - left + 2 * pad;
        let height = bottom - top + 2 * pad;
        let max = i64::from(self.backend().max_texture_size());
        let pen = (i32::try_from(pad - left), i32::try_from(pad - top));
        let (Ok(pen_x), Ok(pen_y)) = pen else {
            log::warn!("Drop shadow of {width}x{height} exceeds texture limit {max}");
            return Ok(None);
        };
        if width > max || height > max {
            log::warn!("Drop shadow of {width}x{height} exceeds texture limit {max}");
            return Ok(None);
        }
        let (width, height) = (width as u32, height as u32);

        let mut image = vec![0u8; width as usize * height as usize];
        for ([gx, gy], bitmap) in &glyphs {
            let x0 = (gx - left + pad) as usize;
            let y0 = (gy - top + pad) as usize;
            for y in 0..bitmap.height {
                let row = (y0 + y as usize) * width as usize + x0;
                for x in 0..bitmap.width {
                    let dst = &mut image[row + x as usize];
                    *dst = (*dst).max(bitmap.coverage(x, y));
                }
            }
        }

        blur.blur(&mut image, width, height, radius);

        Ok(Some(DropShadow {
            width,
            height,
            pen: [pen_x, pen_y],
            image,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::format::MaskFormat;
    use crate::raster::{FontId, GlyphId};
    use crate::test_support::{RecordingBackend, TestSource};
    use crate::GlyphCacheError;

    struct NoBlur;

    impl Blur for NoBlur {
        fn blur(&mut self, _image: &mut [u8], _width: u32, _height: u32, _radius: f32) {}
    }

    fn renderer(max_texture_size: u32) -> GlyphRenderer<RecordingBackend> {
        let backend = RecordingBackend::new().with_max_texture_size(max_texture_size);
        let mut renderer = GlyphRenderer::new(backend, CacheConfig::default());
        renderer.set_font(FontId(1));
        renderer
    }

    fn square(size: u32, value: u8) -> GlyphBitmap {
        GlyphBitmap::new(MaskFormat::A8, size, size, vec![value; (size * size) as usize])
            .with_bearing(0, -(size as i32))
    }

    #[test]
    fn glyphs_are_painted_with_padding() {
        let mut renderer = renderer(4096);
        let mut source = TestSource::default();
        source.insert(1, square(2, 200));

        let shadow = renderer
            .render_drop_shadow(
                &mut source,
                TextRun::new(&[GlyphId(1)], &[[3.0, 10.0]]),
                1.5,
                &mut NoBlur,
            )
            .unwrap()
            .unwrap();

        assert_eq!((shadow.width, shadow.height), (6, 6));
        // glyph spans x 3..5, y 8..10 in text space
        assert_eq!(shadow.pen, [2 - 3, 2 - 8]);
        assert_eq!(shadow.image[2 * 6 + 2], 200);
        assert_eq!(shadow.image[3 * 6 + 3], 200);
        assert_eq!(shadow.image[6 + 1], 0);
        assert_eq!(shadow.image.iter().filter(|&&v| v != 0).count(), 4);
        // nothing cached
        assert_eq!(renderer.valid_glyph_count(), 0);
    }

    #[test]
    fn overlapping_glyphs_keep_max_coverage() {
        let mut renderer = renderer(4096);
        let mut source = TestSource::default();
        source.insert(1, square(3, 100));
        source.insert(2, square(3, 180));

        let shadow = renderer
            .render_drop_shadow(
                &mut source,
                TextRun::new(&[GlyphId(2), GlyphId(1)], &[[0.0, 0.0], [1.0, 0.0]]),
                0.0,
                &mut NoBlur,
            )
            .unwrap()
            .unwrap();

        assert_eq!(shadow.width, 4);
        assert_eq!(&shadow.image[..4], &[180, 180, 180, 100]);
    }

    #[test]
    fn blur_spreads_coverage() {
        let mut renderer = renderer(4096);
        let mut source = TestSource::default();
        source.insert(1, square(1, 255));

        let shadow = renderer
            .render_drop_shadow(
                &mut source,
                TextRun::new(&[GlyphId(1)], &[[0.0, 0.0]]),
                2.0,
                &mut GaussianBlur::default(),
            )
            .unwrap()
            .unwrap();

        assert_eq!((shadow.width, shadow.height), (5, 5));
        let center = shadow.image[2 * 5 + 2];
        assert!(center < 255 && center > shadow.image[2 * 5 + 1]);
        assert!(shadow.image[2 * 5 + 1] > shadow.image[2 * 5]);
        assert_eq!(shadow.image[2 * 5 + 1], shadow.image[2 * 5 + 3]);
    }

    #[test]
    fn oversized_shadow_is_skipped() {
        let mut renderer = renderer(16);
        let mut source = TestSource::default();
        source.insert(1, square(12, 255));

        let shadow = renderer
            .render_drop_shadow(
                &mut source,
                TextRun::new(&[GlyphId(1)], &[[0.0, 0.0]]),
                4.0,
                &mut NoBlur,
            )
            .unwrap();
        assert_eq!(shadow, None);
    }

    #[test]
    fn huge_radius_is_declined() {
        let mut renderer = renderer(4096);
        let mut source = TestSource::default();
        source.insert(1, square(2, 255));

        let shadow = renderer
            .render_drop_shadow(
                &mut source,
                TextRun::new(&[GlyphId(1)], &[[0.0, 0.0]]),
                2.0e9,
                &mut GaussianBlur::default(),
            )
            .unwrap();
        assert_eq!(shadow, None);

        let shadow = renderer
            .render_drop_shadow(
                &mut source,
                TextRun::new(&[GlyphId(1)], &[[0.0, 0.0]]),
                f32::INFINITY,
                &mut NoBlur,
            )
            .unwrap();
        assert_eq!(shadow, None);
    }

    #[test]
    fn empty_run_has_no_shadow() {
        let mut renderer = renderer(4096);
        let mut source = TestSource::default();
        source.insert(1, GlyphBitmap::empty(MaskFormat::A8));
        let run = TextRun::new(&[GlyphId(1)], &[[0.0, 0.0]]);
        let shadow = renderer
            .render_drop_shadow(&mut source, run, 2.0, &mut NoBlur)
            .unwrap();
        assert_eq!(shadow, None);
    }

    #[test]
    fn shadow_requires_a_font() {
        let mut renderer = GlyphRenderer::new(RecordingBackend::new(), CacheConfig::default());
        let mut source = TestSource::default();
        let result = renderer.render_drop_shadow(
            &mut source,
            TextRun::new(&[GlyphId(1)], &[[0.0, 0.0]]),
            2.0,
            &mut NoBlur,
        );
        assert_eq!(result, Err(GlyphCacheError::NoFontSelected));
    }
}
