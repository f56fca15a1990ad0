use std::path::PathBuf;

use crate::assets::store::SongAssets;
use crate::encode::{EncodeJob, VideoEncoder};
use crate::export::cancel::CancelFlag;
use crate::foundation::core::Fps;
use crate::foundation::error::{LyrividError, LyrividResult};
use crate::render::backend::{FrameRGBA, Renderer};
use crate::render::raster::FrameRasterizer;
use crate::state::visual::VisualState;
use crate::style::config::{RenderConfig, TrackMeta};
use crate::timeline::lyrics::LyricTimeline;

/// Portion of overall progress reserved for asset loading.
const ASSET_PROGRESS_END: f64 = 5.0;
/// Portion of overall progress at which frame generation ends.
const FRAME_PROGRESS_END: f64 = 80.0;

/// Export phase for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportPhase {
    /// Decoding the image and font, verifying the audio asset.
    LoadingAssets,
    /// Deterministic frame rasterization.
    RenderingFrames,
    /// External encoder running.
    Encoding,
    /// Export finished successfully.
    Complete,
    /// Export unwound after a cancel request.
    Cancelled,
    /// Export unwound after a failure.
    Failed,
}

/// One progress emission.
///
/// `percent` is monotonically non-decreasing in `[0, 100]` across the
/// non-terminal phases; the terminal `Cancelled`/`Failed` updates clear it
/// back to zero.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressUpdate {
    /// Overall progress in `[0, 100]`.
    pub percent: f64,
    /// Phase label.
    pub phase: ExportPhase,
    /// Optional human-readable detail (e.g. `"12 / 300"`).
    pub detail: Option<String>,
}

impl ProgressUpdate {
    fn new(percent: f64, phase: ExportPhase, detail: Option<String>) -> Self {
        Self {
            percent,
            phase,
            detail,
        }
    }
}

/// Everything an export run needs besides the session snapshot.
#[derive(Clone, Debug)]
pub struct ExportJob {
    /// Root directory for bundled assets (fonts).
    pub assets_root: PathBuf,
    /// Audio track handed to the encoder.
    pub audio_path: PathBuf,
    /// Background/album artwork image.
    pub image_path: PathBuf,
    /// Output MP4 path.
    pub out_path: PathBuf,
    /// Exact clip duration in seconds; also the encoder trim.
    pub total_duration: f64,
    /// Output frame rate.
    pub fps: Fps,
}

/// Offline exporter: iterates synthetic timestamps at a fixed frame rate
/// and rasterizes the shared [`VisualState`] into an ordered frame
/// sequence for the encoder.
///
/// Sequential and cooperative: frame `i` is sampled at exactly `i / fps`,
/// so frame content depends only on `i`, never on how long rasterization
/// took. Not run concurrently with a live preview of the same audio; the
/// surrounding system serializes the two modes.
pub struct ExportPipeline {
    timeline: LyricTimeline,
    cfg: RenderConfig,
    meta: TrackMeta,
}

impl ExportPipeline {
    /// Create an exporter over one session snapshot.
    pub fn new(
        timeline: LyricTimeline,
        cfg: RenderConfig,
        meta: TrackMeta,
    ) -> LyrividResult<Self> {
        cfg.validate()?;
        Ok(Self {
            timeline,
            cfg,
            meta,
        })
    }

    /// Run a full export: load assets, rasterize, encode.
    ///
    /// Emits a terminal `Cancelled`/`Failed` update (progress cleared)
    /// before returning the corresponding error; nothing is retried.
    #[tracing::instrument(skip_all, fields(out = %job.out_path.display()))]
    pub fn export(
        &self,
        job: &ExportJob,
        encoder: &mut dyn VideoEncoder,
        cancel: &CancelFlag,
        on_progress: &mut dyn FnMut(ProgressUpdate),
    ) -> LyrividResult<()> {
        let result = self.export_inner(job, encoder, cancel, on_progress);
        match &result {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => {
                tracing::info!("export cancelled");
                on_progress(ProgressUpdate::new(0.0, ExportPhase::Cancelled, None));
            }
            Err(e) => {
                tracing::error!(error = %e, "export failed");
                on_progress(ProgressUpdate::new(
                    0.0,
                    ExportPhase::Failed,
                    Some(e.to_string()),
                ));
            }
        }
        result
    }

    fn export_inner(
        &self,
        job: &ExportJob,
        encoder: &mut dyn VideoEncoder,
        cancel: &CancelFlag,
        on_progress: &mut dyn FnMut(ProgressUpdate),
    ) -> LyrividResult<()> {
        validate_job(job)?;

        on_progress(ProgressUpdate::new(0.0, ExportPhase::LoadingAssets, None));
        let assets = SongAssets::load(
            &job.assets_root,
            &job.audio_path,
            &job.image_path,
            self.cfg.font_family,
        )?;
        let mut renderer = FrameRasterizer::new(&self.cfg, &assets.artwork, &assets.font_bytes)?;
        self.encode_with(job, &mut renderer, encoder, cancel, on_progress)
    }

    /// Rasterize and encode with an already-built renderer.
    ///
    /// Split out from [`ExportPipeline::export`] so the frame loop and the
    /// encoder hand-off can run against any [`Renderer`].
    pub fn encode_with(
        &self,
        job: &ExportJob,
        renderer: &mut dyn Renderer,
        encoder: &mut dyn VideoEncoder,
        cancel: &CancelFlag,
        on_progress: &mut dyn FnMut(ProgressUpdate),
    ) -> LyrividResult<()> {
        validate_job(job)?;
        let frame_count = job.fps.frame_count(job.total_duration)?;
        on_progress(ProgressUpdate::new(
            ASSET_PROGRESS_END,
            ExportPhase::RenderingFrames,
            Some(format!("0 / {frame_count}")),
        ));

        let frames = self.render_frames(renderer, frame_count, job.fps, cancel, on_progress)?;

        // A cancel landing after the last frame must still win over the
        // encoder invocation.
        if cancel.is_cancelled() {
            return Err(LyrividError::Cancelled);
        }

        on_progress(ProgressUpdate::new(
            FRAME_PROGRESS_END,
            ExportPhase::Encoding,
            None,
        ));
        encoder.encode(
            EncodeJob {
                frames: &frames,
                fps: job.fps,
                audio_path: &job.audio_path,
                trim_secs: job.total_duration,
                out_path: &job.out_path,
            },
            cancel,
            &mut |ratio| {
                on_progress(ProgressUpdate::new(
                    FRAME_PROGRESS_END + ratio.clamp(0.0, 1.0) * (100.0 - FRAME_PROGRESS_END),
                    ExportPhase::Encoding,
                    Some(format!("{:.0}%", ratio * 100.0)),
                ));
            },
        )?;

        on_progress(ProgressUpdate::new(100.0, ExportPhase::Complete, None));
        Ok(())
    }

    /// Produce the ordered frame sequence, checking the cancellation flag
    /// at the top of every iteration.
    fn render_frames(
        &self,
        renderer: &mut dyn Renderer,
        frame_count: u64,
        fps: Fps,
        cancel: &CancelFlag,
        on_progress: &mut dyn FnMut(ProgressUpdate),
    ) -> LyrividResult<Vec<FrameRGBA>> {
        let mut frames = Vec::with_capacity(frame_count as usize);
        for i in 0..frame_count {
            if cancel.is_cancelled() {
                return Err(LyrividError::Cancelled);
            }
            let time = fps.frame_time_secs(i);
            let state = VisualState::compute(time, &self.timeline, &self.cfg, &self.meta);
            frames.push(renderer.render(&state)?);

            let done = (i + 1) as f64 / frame_count as f64;
            on_progress(ProgressUpdate::new(
                ASSET_PROGRESS_END + done * (FRAME_PROGRESS_END - ASSET_PROGRESS_END),
                ExportPhase::RenderingFrames,
                Some(format!("{} / {frame_count}", i + 1)),
            ));
        }
        Ok(frames)
    }
}

fn validate_job(job: &ExportJob) -> LyrividResult<()> {
    if job.fps.num == 0 || job.fps.den == 0 {
        return Err(LyrividError::validation("export fps must be non-zero"));
    }
    if !job.total_duration.is_finite() || job.total_duration <= 0.0 {
        return Err(LyrividError::validation(
            "export total_duration must be finite and > 0",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::CollectEncoder;
    use crate::foundation::core::Canvas;
    use crate::timeline::lyrics::LyricLine;

    /// Renderer double emitting 2x2 frames tagged with the call index.
    #[derive(Default)]
    struct StubRenderer {
        calls: u32,
    }

    impl Renderer for StubRenderer {
        fn render(&mut self, state: &VisualState) -> LyrividResult<FrameRGBA> {
            assert_eq!(
                state.canvas,
                Canvas {
                    width: 1280,
                    height: 720
                }
            );
            self.calls += 1;
            Ok(FrameRGBA {
                width: 2,
                height: 2,
                data: vec![self.calls as u8; 16],
                premultiplied: true,
            })
        }
    }

    fn pipeline() -> ExportPipeline {
        ExportPipeline::new(
            LyricTimeline::new(vec![
                LyricLine::new("Hello", 0.0, 2.0),
                LyricLine::new("World", 2.0, 4.0),
            ]),
            RenderConfig::default(),
            TrackMeta::new("Song", "Artist"),
        )
        .unwrap()
    }

    fn job(duration: f64, fps: u32) -> ExportJob {
        ExportJob {
            assets_root: PathBuf::from("."),
            audio_path: PathBuf::from("audio.mp3"),
            image_path: PathBuf::from("cover.jpg"),
            out_path: PathBuf::from("out/Song - Artist (Lyrics).mp4"),
            total_duration: duration,
            fps: Fps::whole(fps).unwrap(),
        }
    }

    #[test]
    fn frame_count_and_encoder_handoff_are_exact() {
        let p = pipeline();
        let mut renderer = StubRenderer::default();
        let mut encoder = CollectEncoder::new();
        let cancel = CancelFlag::new();
        let mut updates = Vec::new();

        p.encode_with(&job(10.033, 30), &mut renderer, &mut encoder, &cancel, &mut |u| {
            updates.push(u)
        })
        .unwrap();

        assert_eq!(encoder.jobs.len(), 1);
        let consumed = &encoder.jobs[0];
        assert_eq!(consumed.frame_count, 301); // ceil(10.033 * 30)
        assert_eq!(consumed.trim_secs, 10.033);
        assert_eq!(consumed.fps, Fps::whole(30).unwrap());
        assert_eq!(updates.last().unwrap().phase, ExportPhase::Complete);
    }

    #[test]
    fn progress_is_monotonic_and_spans_the_phases() {
        let p = pipeline();
        let mut renderer = StubRenderer::default();
        let mut encoder = CollectEncoder::new();
        let cancel = CancelFlag::new();
        let mut updates = Vec::new();

        p.encode_with(&job(1.0, 10), &mut renderer, &mut encoder, &cancel, &mut |u| {
            updates.push(u)
        })
        .unwrap();

        let mut last = -1.0;
        for u in &updates {
            assert!(u.percent >= last, "progress rewound at {u:?}");
            assert!((0.0..=100.0).contains(&u.percent));
            last = u.percent;
        }
        assert!(updates.iter().any(|u| u.phase == ExportPhase::RenderingFrames));
        assert!(updates.iter().any(|u| u.phase == ExportPhase::Encoding));
        assert_eq!(updates.last().unwrap().percent, 100.0);
    }

    #[test]
    fn cancel_mid_loop_halts_before_the_encoder() {
        let p = pipeline();
        let mut renderer = StubRenderer::default();
        let mut encoder = CollectEncoder::new();
        let cancel = CancelFlag::new();
        let cancel_at_10 = cancel.clone();
        let mut frames_seen = 0u32;

        let err = p
            .encode_with(
                &job(10.0, 30), // 300 frames
                &mut renderer,
                &mut encoder,
                &cancel,
                &mut |u| {
                    if u.phase == ExportPhase::RenderingFrames && u.detail.is_some() {
                        frames_seen += 1;
                        if frames_seen == 10 {
                            cancel_at_10.cancel();
                        }
                    }
                },
            )
            .unwrap_err();

        assert!(err.is_cancelled(), "expected Cancelled, got {err}");
        assert!(encoder.jobs.is_empty(), "encoder must not be invoked");
        assert!(renderer.calls <= 11, "loop must halt within one iteration");
    }

    #[test]
    fn invalid_duration_or_fps_fast_fails() {
        let p = pipeline();
        let mut renderer = StubRenderer::default();
        let mut encoder = CollectEncoder::new();
        let cancel = CancelFlag::new();

        for bad in [job(0.0, 30), job(-2.0, 30), job(f64::NAN, 30)] {
            let err = p
                .encode_with(&bad, &mut renderer, &mut encoder, &cancel, &mut |_| {})
                .unwrap_err();
            assert!(matches!(err, LyrividError::Validation(_)));
        }

        let mut bad_fps = job(1.0, 30);
        bad_fps.fps = Fps { num: 0, den: 1 };
        let err = p
            .encode_with(&bad_fps, &mut renderer, &mut encoder, &cancel, &mut |_| {})
            .unwrap_err();
        assert!(matches!(err, LyrividError::Validation(_)));
        assert!(encoder.jobs.is_empty());
    }

    #[test]
    fn frames_are_sampled_at_synthetic_timestamps() {
        // Two lines over 4 seconds at 1 fps: frame i samples t = i exactly,
        // so the stub sees Hello, Hello, World, World.
        struct TextProbe {
            texts: Vec<String>,
        }
        impl Renderer for TextProbe {
            fn render(&mut self, state: &VisualState) -> LyrividResult<FrameRGBA> {
                self.texts.push(state.current_slot().text.clone());
                Ok(FrameRGBA {
                    width: 2,
                    height: 2,
                    data: vec![0; 16],
                    premultiplied: true,
                })
            }
        }

        let p = pipeline();
        let mut probe = TextProbe { texts: Vec::new() };
        let mut encoder = CollectEncoder::new();
        p.encode_with(
            &job(4.0, 1),
            &mut probe,
            &mut encoder,
            &CancelFlag::new(),
            &mut |_| {},
        )
        .unwrap();
        assert_eq!(probe.texts, ["Hello", "Hello", "World", "World"]);
    }

    #[test]
    fn export_emits_terminal_failed_update_on_missing_assets() {
        let p = pipeline();
        let mut encoder = CollectEncoder::new();
        let cancel = CancelFlag::new();
        let mut updates = Vec::new();

        let mut bad = job(1.0, 30);
        bad.audio_path = PathBuf::from("/nonexistent/audio.mp3");
        bad.image_path = PathBuf::from("/nonexistent/cover.jpg");

        let err = p
            .export(&bad, &mut encoder, &cancel, &mut |u| updates.push(u))
            .unwrap_err();
        assert!(matches!(err, LyrividError::AssetLoad(_)));
        assert!(encoder.jobs.is_empty(), "no partial output before frames");
        let last = updates.last().unwrap();
        assert_eq!(last.phase, ExportPhase::Failed);
        assert_eq!(last.percent, 0.0);
    }
}
