use crate::foundation::core::{Canvas, Rgba8};
use crate::style::config::{ArtPosition, RenderConfig, TrackMeta};
use crate::timeline::lyrics::{CENTER_SLOT, LyricTimeline, WINDOW_SPAN};
use crate::timeline::progress::highlight_progress;
use kurbo::{Point, Rect};

/// Overlay anchor inside the frame, in pixels from the top-left corner.
const OVERLAY_ORIGIN: Point = Point::new(40.0, 50.0);

/// Vertical gap between the title baseline block and the artist line.
const OVERLAY_LINE_GAP: f64 = 10.0;

/// Style classification of a window slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotTier {
    /// The active line (offset 0).
    Current,
    /// Immediate neighbors (offsets ±1).
    Near,
    /// Outer neighbors (offsets ±2).
    Far,
}

/// Karaoke sweep of the current line: a left-to-right text-clipped gradient
/// with a hard boundary at `progress × 100%` of the text width.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HighlightSweep {
    /// Fraction of the line already sung, in `[0, 1]`.
    pub progress: f64,
    /// Color left of the boundary.
    pub lit: Rgba8,
    /// Color right of the boundary.
    pub unlit: Rgba8,
}

/// Fully resolved drawing facts for one window slot.
#[derive(Clone, Debug, PartialEq)]
pub struct LineSlot {
    /// Line text; empty for sentinels (drawn with zero opacity).
    pub text: String,
    /// Tier the slot belongs to.
    pub tier: SlotTier,
    /// Flat text color (ignored for the current slot when `sweep` is set).
    pub color: Rgba8,
    /// Slot opacity in `[0, 1]`.
    pub opacity: f32,
    /// Font-size multiplier relative to the configured base size.
    pub scale: f32,
    /// Vertical offset of the slot's center from the frame center, px.
    pub y_offset: f32,
    /// Sweep descriptor; present only on a non-blank current slot.
    pub sweep: Option<HighlightSweep>,
}

/// Fixed-position title/artist overlay.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayText {
    /// Song title.
    pub title: String,
    /// Artist name.
    pub artist: String,
    /// Title font size (`font_size × 0.6`).
    pub title_size: f32,
    /// Artist font size (`font_size × 0.45`).
    pub artist_size: f32,
    /// Title anchor.
    pub title_origin: Point,
    /// Artist anchor, one title line plus a gap below.
    pub artist_origin: Point,
    /// Title color (theme `info`).
    pub title_color: Rgba8,
    /// Artist color (theme `sub_info`).
    pub artist_color: Rgba8,
}

/// Everything needed to draw one instant.
///
/// A pure function of `(time, timeline, config, meta)`: identical inputs
/// yield an identical value, which is the contract that keeps the live
/// preview and the offline exporter visually in lockstep. Values are
/// ephemeral and recomputed per sampled time.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualState {
    /// Output pixel dimensions.
    pub canvas: Canvas,
    /// The five window slots, top to bottom.
    pub slots: [LineSlot; WINDOW_SPAN],
    /// Title/artist overlay.
    pub overlay: OverlayText,
    /// Album-art placement rect, when enabled.
    pub album_art: Option<Rect>,
}

impl VisualState {
    /// Resolve the visual state at `time`.
    pub fn compute(
        time: f64,
        timeline: &LyricTimeline,
        cfg: &RenderConfig,
        meta: &TrackMeta,
    ) -> Self {
        let canvas = cfg.resolution.canvas();
        let palette = cfg.theme.palette();
        let window = timeline.resolve_window(time);
        let font_size = cfg.font_size;

        let slots = std::array::from_fn(|i| {
            let line = window[i];
            // offset −2..=+2 relative to the current line
            let offset = i as i32 - CENTER_SLOT as i32;
            let (tier, mut opacity, scale, color) = match offset {
                -2 => (SlotTier::Far, 0.2, 0.90, palette.inactive2),
                -1 => (SlotTier::Near, 0.5, 0.95, palette.inactive2),
                0 => (SlotTier::Current, 1.0, 1.00, palette.active),
                1 => (SlotTier::Near, 0.8, 0.95, palette.inactive1),
                _ => (SlotTier::Far, 0.4, 0.90, palette.inactive1),
            };
            if line.is_blank() {
                opacity = 0.0;
            }
            let sweep = (offset == 0 && !line.is_blank()).then(|| HighlightSweep {
                progress: highlight_progress(line, time),
                lit: palette.active,
                unlit: palette.inactive1,
            });
            LineSlot {
                text: line.text.clone(),
                tier,
                color,
                opacity,
                scale,
                y_offset: offset as f32 * 1.5 * font_size,
                sweep,
            }
        });

        let title_size = font_size * 0.6;
        let artist_size = font_size * 0.45;
        let overlay = OverlayText {
            title: meta.title.clone(),
            artist: meta.artist.clone(),
            title_size,
            artist_size,
            title_origin: OVERLAY_ORIGIN,
            artist_origin: Point::new(
                OVERLAY_ORIGIN.x,
                OVERLAY_ORIGIN.y + f64::from(title_size) + OVERLAY_LINE_GAP,
            ),
            title_color: palette.info,
            artist_color: palette.sub_info,
        };

        let album_art = cfg.album_art.as_ref().map(|art| {
            let size = f64::from(canvas.height) * f64::from(art.size_pct) / 100.0;
            let margin = size * 0.1;
            let x = match art.position {
                ArtPosition::Left => margin,
                ArtPosition::Right => f64::from(canvas.width) - size - margin,
            };
            let y = (f64::from(canvas.height) - size) / 2.0;
            Rect::new(x, y, x + size, y + size)
        });

        Self {
            canvas,
            slots,
            overlay,
            album_art,
        }
    }

    /// The current-line slot.
    pub fn current_slot(&self) -> &LineSlot {
        &self.slots[CENTER_SLOT]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::config::AlbumArt;
    use crate::timeline::lyrics::LyricLine;

    fn hello_world() -> LyricTimeline {
        LyricTimeline::new(vec![
            LyricLine::new("Hello", 0.0, 2.0),
            LyricLine::new("World", 2.0, 4.0),
        ])
    }

    fn meta() -> TrackMeta {
        TrackMeta::new("Song", "Artist")
    }

    #[test]
    fn mid_line_state_matches_reference_scenario() {
        let state = VisualState::compute(1.0, &hello_world(), &RenderConfig::default(), &meta());
        let current = state.current_slot();
        assert_eq!(current.text, "Hello");
        assert_eq!(current.tier, SlotTier::Current);
        assert_eq!(current.sweep.unwrap().progress, 0.5);
        assert_eq!(state.slots[CENTER_SLOT + 1].text, "World");
    }

    #[test]
    fn line_boundary_belongs_to_the_next_line() {
        let state = VisualState::compute(2.0, &hello_world(), &RenderConfig::default(), &meta());
        let current = state.current_slot();
        assert_eq!(current.text, "World");
        assert_eq!(current.sweep.unwrap().progress, 0.0);
    }

    #[test]
    fn compute_is_idempotent() {
        let tl = hello_world();
        let cfg = RenderConfig::default();
        let a = VisualState::compute(1.25, &tl, &cfg, &meta());
        let b = VisualState::compute(1.25, &tl, &cfg, &meta());
        assert_eq!(a, b);
    }

    #[test]
    fn sentinel_slots_are_invisible_and_unswept() {
        let state = VisualState::compute(-1.0, &hello_world(), &RenderConfig::default(), &meta());
        let current = state.current_slot();
        assert!(current.text.is_empty());
        assert_eq!(current.opacity, 0.0);
        assert!(current.sweep.is_none());
    }

    #[test]
    fn slot_styling_follows_the_tier_table() {
        let state = VisualState::compute(3.0, &hello_world(), &RenderConfig::default(), &meta());
        let fs = RenderConfig::default().font_size;
        assert_eq!(state.slots[0].scale, 0.90);
        assert_eq!(state.slots[0].y_offset, -3.0 * fs);
        assert_eq!(state.slots[1].opacity, 0.5);
        assert_eq!(state.slots[3].opacity, 0.0); // sentinel below last line
        assert_eq!(state.slots[4].y_offset, 3.0 * fs);
    }

    #[test]
    fn overlay_sizes_derive_from_font_size() {
        let cfg = RenderConfig::default();
        let state = VisualState::compute(0.0, &hello_world(), &cfg, &meta());
        assert_eq!(state.overlay.title_size, cfg.font_size * 0.6);
        assert_eq!(state.overlay.artist_size, cfg.font_size * 0.45);
        assert!(state.overlay.artist_origin.y > state.overlay.title_origin.y);
    }

    #[test]
    fn album_art_rect_mirrors_left_right() {
        let mut cfg = RenderConfig::default();
        cfg.album_art = Some(AlbumArt {
            size_pct: 50.0,
            position: ArtPosition::Left,
        });
        let left = VisualState::compute(0.0, &hello_world(), &cfg, &meta())
            .album_art
            .unwrap();
        let size = 720.0 * 0.5;
        assert_eq!(left.width(), size);
        assert_eq!(left.x0, size * 0.1);
        assert_eq!(left.y0, (720.0 - size) / 2.0);

        cfg.album_art = Some(AlbumArt {
            size_pct: 50.0,
            position: ArtPosition::Right,
        });
        let right = VisualState::compute(0.0, &hello_world(), &cfg, &meta())
            .album_art
            .unwrap();
        assert_eq!(right.x1, 1280.0 - size * 0.1);
    }

    #[test]
    fn disabled_album_art_yields_no_rect() {
        let mut cfg = RenderConfig::default();
        cfg.album_art = None;
        let state = VisualState::compute(0.0, &hello_world(), &cfg, &meta());
        assert!(state.album_art.is_none());
    }
}
