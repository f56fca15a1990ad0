//! Lyrivid turns a song (audio track, artwork, and a time-stamped lyric
//! sheet) into a karaoke-style lyric video.
//!
//! The API is built around one invariant: [`VisualState::compute`] is a pure
//! function from a sampled time to the complete visual state of one instant,
//! and both rendering paths are thin consumers of it:
//!
//! - [`PreviewDriver`] samples a live media clock on a cooperative per-frame
//!   callback and feeds an interactive surface.
//! - [`ExportPipeline`] iterates synthetic timestamps at a fixed frame rate,
//!   rasterizes each instant with [`FrameRasterizer`], and hands the ordered
//!   frame sequence to a [`VideoEncoder`].
//!
//! Because neither path observes wall-clock time inside the state
//! computation, preview and export agree by construction.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Asset preparation (image decode, blur, fonts).
pub mod assets;
/// Encoder collaborator contract and ffmpeg implementation.
pub mod encode;
/// Offline export pipeline.
pub mod export;
/// Live preview driver.
pub mod preview;
/// Frame rasterization.
pub mod render;
/// Shared visual state computation.
pub mod state;
/// Render configuration snapshot.
pub mod style;
/// Lyric timeline and highlight progress.
pub mod timeline;

pub use crate::foundation::core::{Canvas, Fps, Rgba8};
pub use crate::foundation::error::{LyrividError, LyrividResult};

pub use crate::encode::ffmpeg::{FfmpegEncoder, FfmpegEncoderOpts};
pub use crate::encode::{CollectEncoder, EncodeJob, VideoEncoder};
pub use crate::export::cancel::CancelFlag;
pub use crate::export::pipeline::{ExportJob, ExportPhase, ExportPipeline, ProgressUpdate};
pub use crate::preview::driver::{
    AudioTransport, PlaybackPhase, PreviewDriver, PreviewSurface, TransportFactory,
};
pub use crate::render::backend::{FrameRGBA, Renderer};
pub use crate::render::raster::FrameRasterizer;
pub use crate::state::visual::VisualState;
pub use crate::style::config::{
    AlbumArt, ArtPosition, FontFamily, FontWeight, RenderConfig, Resolution, TrackMeta,
};
pub use crate::style::theme::{ColorTheme, ThemePalette};
pub use crate::timeline::lyrics::{LyricLine, LyricTimeline};
