use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::blur::{blur_rgba8_premul, dim_rgba8_premul_in_place};
use crate::assets::decode::PreparedImage;
use crate::assets::store::{TextBrushRgba8, TextLayoutEngine};
use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{LyrividError, LyrividResult};
use crate::render::backend::{FrameRGBA, Renderer};
use crate::state::visual::{LineSlot, VisualState};
use crate::style::config::RenderConfig;
use kurbo::Affine;

/// Background softening radius in pixels.
const BG_BLUR_RADIUS: u32 = 6;
/// Background blur sigma.
const BG_BLUR_SIGMA: f32 = 3.0;
/// Background dim amount (30% toward black).
const BG_DIM: f32 = 0.3;

#[derive(Clone, PartialEq, Eq, Hash)]
struct LayoutKey {
    text: String,
    size_bits: u32,
}

/// CPU rasterizer: draws a [`VisualState`] with `vello_cpu`.
///
/// Construction precomputes the blurred/dimmed background; per-frame work
/// is paint setup plus glyph runs. The render context and shaped layouts
/// are reused across frames, so a full export touches the layout engine
/// only once per distinct (text, size) pair.
pub struct FrameRasterizer {
    canvas: Canvas,
    font_size: f32,
    font_weight: u16,
    stroke_color: Rgba8,
    stroke_width: f32,

    ctx: Option<vello_cpu::RenderContext>,
    font: vello_cpu::peniko::FontData,
    font_bytes: Vec<u8>,
    text_engine: TextLayoutEngine,

    background: vello_cpu::Image,
    artwork: vello_cpu::Image,
    artwork_w: u32,
    artwork_h: u32,

    layout_cache: HashMap<LayoutKey, Arc<parley::Layout<TextBrushRgba8>>>,
}

impl FrameRasterizer {
    /// Build a rasterizer for `cfg` from the decoded artwork and the
    /// configured family's font bytes.
    pub fn new(
        cfg: &RenderConfig,
        artwork: &PreparedImage,
        font_bytes: &[u8],
    ) -> LyrividResult<Self> {
        cfg.validate()?;
        let canvas = cfg.resolution.canvas();

        let artwork_paint =
            rgba_premul_to_image(&artwork.rgba8_premul, artwork.width, artwork.height)?;
        let background = prepare_background(canvas, &artwork_paint, artwork.width, artwork.height)?;

        let font = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font_bytes.to_vec()),
            0,
        );

        Ok(Self {
            canvas,
            font_size: cfg.font_size,
            font_weight: cfg.font_weight.value(),
            stroke_color: cfg.stroke_color,
            stroke_width: cfg.stroke_width,
            ctx: None,
            font,
            font_bytes: font_bytes.to_vec(),
            text_engine: TextLayoutEngine::new(),
            background,
            artwork: artwork_paint,
            artwork_w: artwork.width,
            artwork_h: artwork.height,
            layout_cache: HashMap::new(),
        })
    }

    fn layout_for(
        &mut self,
        text: &str,
        size_px: f32,
    ) -> LyrividResult<Arc<parley::Layout<TextBrushRgba8>>> {
        let key = LayoutKey {
            text: text.to_owned(),
            size_bits: size_px.to_bits(),
        };
        if let Some(layout) = self.layout_cache.get(&key) {
            return Ok(layout.clone());
        }
        let layout = Arc::new(self.text_engine.layout_line(
            text,
            &self.font_bytes,
            size_px,
            self.font_weight,
        )?);
        self.layout_cache.insert(key, layout.clone());
        Ok(layout)
    }

    fn with_ctx_mut<R>(
        &mut self,
        f: impl FnOnce(&mut Self, &mut vello_cpu::RenderContext) -> LyrividResult<R>,
    ) -> LyrividResult<R> {
        let (w, h) = canvas_u16(self.canvas)?;
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == w && ctx.height() == h => ctx,
            _ => vello_cpu::RenderContext::new(w, h),
        };
        ctx.reset();
        let out = f(self, &mut ctx)?;
        self.ctx = Some(ctx);
        Ok(out)
    }

    fn draw_slot(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        slot: &LineSlot,
    ) -> LyrividResult<()> {
        let size_px = self.font_size * slot.scale;
        let layout = self.layout_for(&slot.text, size_px)?;
        let text_w = f64::from(layout.width());
        let text_h = f64::from(layout.height());
        let origin_x = (f64::from(self.canvas.width) - text_w) / 2.0;
        let origin_y = f64::from(self.canvas.height) / 2.0 + f64::from(slot.y_offset) - text_h / 2.0;

        if slot.opacity < 1.0 {
            ctx.push_opacity_layer(slot.opacity);
        }

        if self.stroke_width > 0.0 {
            let d = f64::from(self.stroke_width);
            let color = self.stroke_color;
            // Offset passes in the eight compass directions approximate a
            // text outline of the configured width.
            for (dx, dy) in [
                (d, d),
                (d, -d),
                (-d, d),
                (-d, -d),
                (0.0, d),
                (0.0, -d),
                (d, 0.0),
                (-d, 0.0),
            ] {
                ctx.set_transform(affine_to_cpu(Affine::translate((
                    origin_x + dx,
                    origin_y + dy,
                ))));
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    color.r, color.g, color.b, color.a,
                ));
                draw_layout_glyphs(ctx, &self.font, &layout);
            }
        }

        ctx.set_transform(affine_to_cpu(Affine::translate((origin_x, origin_y))));
        if let Some(sweep) = &slot.sweep {
            let w = text_w.ceil().max(1.0) as u32;
            let h = text_h.ceil().max(1.0) as u32;
            let paint = sweep_gradient_image(sweep.progress, sweep.lit, sweep.unlit, w, h)?;
            ctx.set_paint(paint);
        } else {
            let c = slot.color;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
        }
        draw_layout_glyphs(ctx, &self.font, &layout);

        if slot.opacity < 1.0 {
            ctx.pop_layer();
        }
        Ok(())
    }

    fn draw_overlay_line(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        text: &str,
        size_px: f32,
        origin: kurbo::Point,
        color: Rgba8,
    ) -> LyrividResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        let layout = self.layout_for(text, size_px)?;
        ctx.set_transform(affine_to_cpu(Affine::translate((origin.x, origin.y))));
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color.r, color.g, color.b, color.a,
        ));
        draw_layout_glyphs(ctx, &self.font, &layout);
        Ok(())
    }
}

impl Renderer for FrameRasterizer {
    fn render(&mut self, state: &VisualState) -> LyrividResult<FrameRGBA> {
        if state.canvas != self.canvas {
            return Err(LyrividError::validation(format!(
                "visual state canvas {}x{} does not match rasterizer {}x{}",
                state.canvas.width, state.canvas.height, self.canvas.width, self.canvas.height
            )));
        }
        let canvas = self.canvas;

        self.with_ctx_mut(|this, ctx| {
            // Background, pre-blurred and dimmed at construction.
            ctx.set_transform(affine_to_cpu(Affine::IDENTITY));
            ctx.set_paint(this.background.clone());
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(canvas.width),
                f64::from(canvas.height),
            ));

            if let Some(rect) = state.album_art {
                let sx = rect.width() / f64::from(this.artwork_w);
                let sy = rect.height() / f64::from(this.artwork_h);
                ctx.set_transform(affine_to_cpu(
                    Affine::translate((rect.x0, rect.y0)) * Affine::scale_non_uniform(sx, sy),
                ));
                ctx.set_paint(this.artwork.clone());
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    0.0,
                    0.0,
                    f64::from(this.artwork_w),
                    f64::from(this.artwork_h),
                ));
            }

            for slot in &state.slots {
                if slot.text.is_empty() || slot.opacity <= 0.0 {
                    continue;
                }
                this.draw_slot(ctx, slot)?;
            }

            this.draw_overlay_line(
                ctx,
                &state.overlay.title,
                state.overlay.title_size,
                state.overlay.title_origin,
                state.overlay.title_color,
            )?;
            this.draw_overlay_line(
                ctx,
                &state.overlay.artist,
                state.overlay.artist_size,
                state.overlay.artist_origin,
                state.overlay.artist_color,
            )?;

            let (w, h) = canvas_u16(canvas)?;
            let mut pixmap = vello_cpu::Pixmap::new(w, h);
            ctx.flush();
            ctx.render_to_pixmap(&mut pixmap);

            Ok(FrameRGBA {
                width: canvas.width,
                height: canvas.height,
                data: pixmap.data_as_u8_slice().to_vec(),
                premultiplied: true,
            })
        })
    }
}

fn canvas_u16(canvas: Canvas) -> LyrividResult<(u16, u16)> {
    let w: u16 = canvas
        .width
        .try_into()
        .map_err(|_| LyrividError::validation("canvas width exceeds u16"))?;
    let h: u16 = canvas
        .height
        .try_into()
        .map_err(|_| LyrividError::validation("canvas height exceeds u16"))?;
    Ok((w, h))
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn draw_layout_glyphs(
    ctx: &mut vello_cpu::RenderContext,
    font: &vello_cpu::peniko::FontData,
    layout: &parley::Layout<TextBrushRgba8>,
) {
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

/// Stretch the artwork over the canvas, then blur and dim it once.
fn prepare_background(
    canvas: Canvas,
    artwork: &vello_cpu::Image,
    art_w: u32,
    art_h: u32,
) -> LyrividResult<vello_cpu::Image> {
    let (w, h) = canvas_u16(canvas)?;
    let mut ctx = vello_cpu::RenderContext::new(w, h);
    ctx.set_transform(affine_to_cpu(Affine::scale_non_uniform(
        f64::from(canvas.width) / f64::from(art_w.max(1)),
        f64::from(canvas.height) / f64::from(art_h.max(1)),
    )));
    ctx.set_paint(artwork.clone());
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(art_w),
        f64::from(art_h),
    ));

    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);

    let mut bytes = blur_rgba8_premul(
        pixmap.data_as_u8_slice(),
        canvas.width,
        canvas.height,
        BG_BLUR_RADIUS,
        BG_BLUR_SIGMA,
    )?;
    dim_rgba8_premul_in_place(&mut bytes, BG_DIM);
    rgba_premul_to_image(&bytes, canvas.width, canvas.height)
}

/// Horizontal two-color gradient with a hard stop at `progress` of the
/// width, used as the paint under the current line's glyphs (the text acts
/// as the mask).
fn sweep_gradient_image(
    progress: f64,
    lit: Rgba8,
    unlit: Rgba8,
    width: u32,
    height: u32,
) -> LyrividResult<vello_cpu::Image> {
    let boundary = ((progress.clamp(0.0, 1.0)) * f64::from(width)).round() as u32;
    let lit_px = lit.to_premul_bytes(1.0);
    let unlit_px = unlit.to_premul_bytes(1.0);

    let mut row = Vec::with_capacity(width as usize * 4);
    for x in 0..width {
        row.extend_from_slice(if x < boundary { &lit_px } else { &unlit_px });
    }
    let mut bytes = Vec::with_capacity(row.len() * height as usize);
    for _ in 0..height {
        bytes.extend_from_slice(&row);
    }
    rgba_premul_to_image(&bytes, width, height)
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> LyrividResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| LyrividError::validation("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| LyrividError::validation("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(LyrividError::validation("pixmap byte len mismatch"));
    }
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

fn rgba_premul_to_image(
    bytes_premul: &[u8],
    width: u32,
    height: u32,
) -> LyrividResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(bytes_premul, width, height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}
