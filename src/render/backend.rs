use crate::foundation::error::LyrividResult;
use crate::state::visual::VisualState;

/// A rendered frame as RGBA8 pixels.
///
/// Frames are **premultiplied alpha** by default; the `premultiplied` flag
/// makes this explicit at API boundaries (the encoder flattens to opaque
/// RGBA before handing bytes to ffmpeg).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

/// Capability of turning one computed [`VisualState`] into pixels.
///
/// The export pipeline and the CLI `frame` command both consume this trait;
/// a live preview surface draws the same `VisualState` through its own
/// scene primitives instead. Keeping state computation out of renderers is
/// what guarantees the two paths cannot drift.
pub trait Renderer {
    /// Rasterize one instant.
    fn render(&mut self, state: &VisualState) -> LyrividResult<FrameRGBA>;
}
