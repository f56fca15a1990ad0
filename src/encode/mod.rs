//! Encoder collaborator contract and the ffmpeg implementation.

/// MP4 encoding via the system `ffmpeg`.
pub mod ffmpeg;

use std::path::{Path, PathBuf};

use crate::export::cancel::CancelFlag;
use crate::foundation::core::Fps;
use crate::foundation::error::LyrividResult;
use crate::render::backend::FrameRGBA;

/// One encoding request: the complete ordered frame sequence plus the audio
/// reference and trim duration.
///
/// `trim_secs` is the exact clip duration; the frame count is a ceiling and
/// may slightly overshoot the audio, so encoders hard-trim their output to
/// it.
pub struct EncodeJob<'a> {
    /// Frames in timeline order at a fixed frame rate.
    pub frames: &'a [FrameRGBA],
    /// Frame rate of the sequence.
    pub fps: Fps,
    /// Audio asset muxed alongside the frames.
    pub audio_path: &'a Path,
    /// Exact output duration in seconds.
    pub trim_secs: f64,
    /// Output container path.
    pub out_path: &'a Path,
}

/// External video encoder/muxer.
///
/// The core only guarantees frame ordering, frame-rate consistency, and
/// correct duration metadata; the container format is the encoder's
/// business. Implementations observe `cancel` between frame writes and
/// release any acquired resources before returning
/// [`LyrividError::Cancelled`](crate::foundation::error::LyrividError::Cancelled).
pub trait VideoEncoder {
    /// Encode one job, reporting progress as a ratio in `[0, 1]`.
    fn encode(
        &mut self,
        job: EncodeJob<'_>,
        cancel: &CancelFlag,
        on_progress: &mut dyn FnMut(f64),
    ) -> LyrividResult<()>;
}

/// Summary of a job consumed by [`CollectEncoder`].
#[derive(Clone, Debug, PartialEq)]
pub struct CollectedJob {
    /// Number of frames received.
    pub frame_count: usize,
    /// Frame rate received.
    pub fps: Fps,
    /// Trim duration received.
    pub trim_secs: f64,
    /// Output path received.
    pub out_path: PathBuf,
}

/// In-memory encoder double for tests and debugging.
#[derive(Debug, Default)]
pub struct CollectEncoder {
    /// Jobs consumed so far.
    pub jobs: Vec<CollectedJob>,
}

impl CollectEncoder {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }
}

impl VideoEncoder for CollectEncoder {
    fn encode(
        &mut self,
        job: EncodeJob<'_>,
        _cancel: &CancelFlag,
        on_progress: &mut dyn FnMut(f64),
    ) -> LyrividResult<()> {
        self.jobs.push(CollectedJob {
            frame_count: job.frames.len(),
            fps: job.fps,
            trim_secs: job.trim_secs,
            out_path: job.out_path.to_path_buf(),
        });
        on_progress(1.0);
        Ok(())
    }
}
