//! Glyph cache demo
//!
//! Renders text with a procedural bitmap font into an offscreen wgpu target and
//! reports what the cache did: textures, uploads, evictions and memory use.

mod config;
mod debug_font;

use anyhow::Context;
use config::DemoConfig;
use debug_font::{DebugFont, COLOR_GLYPH_BASE};
use glam::{Affine2, Vec2};
use glyph_cache::{
    GaussianBlur, GlyphId, GlyphRenderer, HiddenTextHook, Rect, RenderOptions, ResolvedGlyph,
    TextRun,
};
use glyph_cache_wgpu::{WgpuBackend, WgpuTextSubmitter};

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Collects the layout reported for hidden text.
#[derive(Default)]
struct LayoutRecorder {
    glyphs: Vec<ResolvedGlyph>,
}

impl HiddenTextHook for LayoutRecorder {
    fn glyph_resolved(&mut self, glyph: ResolvedGlyph) {
        self.glyphs.push(glyph);
    }
}

struct Demo {
    device: wgpu::Device,
    queue: wgpu::Queue,
    target: wgpu::Texture,
    renderer: GlyphRenderer<WgpuBackend>,
    submitter: WgpuTextSubmitter,
    font: DebugFont,
    config: DemoConfig,
}

impl Demo {
    async fn new(config: DemoConfig) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("no GPU adapter available")?;

        log::info!("✓ Using GPU: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create device")?;

        let [width, height] = config.target_size;
        let target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Demo Target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = target.create_view(&wgpu::TextureViewDescriptor::default());

        let backend = WgpuBackend::new(device.clone(), queue.clone())
            .with_gpu_pixel_buffers(config.cache.gpu_pixel_buffers);
        let renderer = GlyphRenderer::new(backend, config.cache.clone());
        let mut submitter = WgpuTextSubmitter::new(&device, view, TARGET_FORMAT, [width, height]);
        submitter.clear_next_pass(wgpu::Color::BLACK);

        log::info!("✓ Glyph cache ready ({:?})", renderer.tier_layout());

        Ok(Self {
            device,
            queue,
            target,
            renderer,
            submitter,
            font: DebugFont::new(),
            config,
        })
    }

    fn draw_text(
        &mut self,
        text: &str,
        scale: u32,
        mono: bool,
        at: [f32; 2],
    ) -> anyhow::Result<()> {
        let (glyphs, positions, _) = DebugFont::layout(text, scale);
        self.renderer.set_font(DebugFont::font(scale, mono));

        let outcome = self.renderer.render_pos_text(
            &mut self.font,
            TextRun::new(&glyphs, &positions).at(at[0], at[1]),
            RenderOptions::default().track_bounds(),
            &mut self.submitter,
        )?;
        if let Some(bounds) = outcome.bounds.filter(Rect::is_valid) {
            log::debug!("{text:?} covers {:?}..{:?}", bounds.min, bounds.max);
        }
        Ok(())
    }

    fn draw_color_glyphs(&mut self, count: u32, at: [f32; 2]) -> anyhow::Result<()> {
        let scale = 2;
        let advance = DebugFont::advance(scale) as f32 + 4.0;
        let glyphs = (0..count)
            .map(|i| GlyphId(COLOR_GLYPH_BASE + i))
            .collect::<Vec<_>>();
        let positions = (0..count)
            .map(|i| [i as f32 * advance, 0.0])
            .collect::<Vec<_>>();

        self.renderer.set_font(DebugFont::font(scale, false));
        self.renderer.render_pos_text(
            &mut self.font,
            TextRun::new(&glyphs, &positions).at(at[0], at[1]),
            RenderOptions::default(),
            &mut self.submitter,
        )?;
        Ok(())
    }

    fn draw_rotated(&mut self, text: &str, angle: f32, at: [f32; 2]) -> anyhow::Result<()> {
        let scale = 3;
        let (glyphs, positions, _) = DebugFont::layout(text, scale);
        self.renderer.set_font(DebugFont::font(scale, false));

        let transform = Affine2::from_angle_translation(angle, Vec2::from(at));
        let outcome = self.renderer.render_transformed_text(
            &mut self.font,
            TextRun::new(&glyphs, &positions),
            transform,
            RenderOptions::default().track_bounds(),
            &mut self.submitter,
        )?;
        if let Some(bounds) = outcome.bounds {
            log::info!(
                "Rotated text spans {:.0}x{:.0} px",
                bounds.width(),
                bounds.height()
            );
        }
        Ok(())
    }

    fn draw_hidden(&mut self, text: &str, at: [f32; 2]) -> anyhow::Result<()> {
        let scale = 2;
        let (glyphs, positions, widths) = DebugFont::layout(text, scale);
        self.renderer.set_font(DebugFont::font(scale, false));

        let mut layout = LayoutRecorder::default();
        self.renderer.render_hidden_text(
            &mut self.font,
            TextRun::new(&glyphs, &positions)
                .at(at[0], at[1])
                .with_char_widths(&widths),
            RenderOptions::default().finish(),
            &mut self.submitter,
            &mut layout,
        )?;
        self.renderer.release_extension_textures();

        log::info!("Hidden text resolved {} glyphs", layout.glyphs.len());
        if let (Some(first), Some(last)) = (layout.glyphs.first(), layout.glyphs.last()) {
            log::debug!("  first at {:?}, last at {:?}", first.position, last.position);
        }
        Ok(())
    }

    fn draw_shadow(&mut self, text: &str) -> anyhow::Result<()> {
        let scale = 2;
        let (glyphs, positions, _) = DebugFont::layout(text, scale);
        self.renderer.set_font(DebugFont::font(scale, false));

        let mut blur = GaussianBlur::default();
        let shadow = self.renderer.render_drop_shadow(
            &mut self.font,
            TextRun::new(&glyphs, &positions),
            self.config.shadow_radius,
            &mut blur,
        )?;
        match shadow {
            Some(shadow) => {
                let lit = shadow.image.iter().filter(|&&a| a > 0).count();
                log::info!(
                    "Drop shadow {}x{} (pen {:?}), {} lit pixels",
                    shadow.width,
                    shadow.height,
                    shadow.pen,
                    lit
                );
            }
            None => log::info!("Drop shadow skipped: nothing visible"),
        }
        Ok(())
    }

    /// Fill the caches with ever larger glyphs until they have to be flushed.
    fn stress(&mut self, max_scale: u32) -> anyhow::Result<()> {
        let alphabet = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
        let before = self.renderer.evictions();
        for scale in 4..=max_scale {
            let y = (self.config.target_size[1] as f32 * 0.9).floor();
            self.draw_text(alphabet, scale, scale % 2 == 0, [10.0, y])?;
        }
        log::info!(
            "Stress pass caused {} eviction(s)",
            self.renderer.evictions() - before
        );
        Ok(())
    }

    /// Count target pixels any glyph was drawn into.
    fn lit_pixels(&self) -> anyhow::Result<usize> {
        let [width, height] = self.config.target_size;
        let unpadded = width * 4;
        let padded = unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Demo Readback Buffer"),
            size: (padded * height) as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Demo Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            self.target.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let (tx, rx) = std::sync::mpsc::channel();
        readback
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| {
                let _ = tx.send(result);
            });
        self.device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        })?;
        rx.recv().context("readback callback never ran")??;

        let lit = {
            let data = readback.slice(..).get_mapped_range();
            data.chunks_exact(padded as usize)
                .flat_map(|row| row[..unpadded as usize].chunks_exact(4))
                .filter(|px| px[..3].iter().any(|&c| c > 0))
                .count()
        };
        readback.unmap();
        Ok(lit)
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let ascii = (0x21u32..0x7F).map(GlyphId).collect::<Vec<_>>();
        let precache_font = DebugFont::font(2, false);
        self.renderer.precache(&mut self.font, precache_font, &ascii);
        self.renderer.end_precaching();
        log::info!(
            "Precached {} glyphs",
            self.renderer
                .font_glyphs(precache_font)
                .map_or(0, |glyphs| glyphs.valid_count())
        );

        self.draw_text("HELLO GLYPH CACHE", 2, false, [20.0, 60.0])?;
        self.draw_text("1 BIT MASKS 0123", 2, true, [20.0, 100.0])?;
        self.draw_color_glyphs(12, [20.0, 140.0])?;
        self.draw_rotated("ROTATED", 0.35, [420.0, 180.0])?;
        self.renderer.finish_render(&mut self.submitter);

        self.draw_hidden("HIDDEN LAYOUT", [20.0, 220.0])?;
        self.draw_shadow("SHADOW")?;

        self.submitter.set_color([1.0, 0.8, 0.2, 1.0]);
        self.stress(16)?;
        self.renderer.finish_render(&mut self.submitter);

        self.renderer.dump_memory_usage();
        log::info!(
            "✓ {} passes, {} evictions, {} glyphs rasterized, {} valid",
            self.submitter.passes(),
            self.renderer.evictions(),
            self.font.rasterized(),
            self.renderer.valid_glyph_count()
        );
        log::info!("✓ {} target pixels lit", self.lit_pixels()?);

        self.renderer.release();
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logger (RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting glyph cache demo...");

    let config = DemoConfig::from_env();
    let mut demo = pollster::block_on(Demo::new(config))?;
    demo.run()
}
