//! Pipeline-level tests over the public API, using in-memory doubles for
//! the renderer and encoder.

use std::path::PathBuf;

use lyrivid::{
    AudioTransport, CancelFlag, CollectEncoder, ExportJob, ExportPhase, ExportPipeline, Fps,
    FrameRGBA, LyricLine, LyricTimeline, LyrividError, LyrividResult, PreviewDriver,
    PreviewSurface, RenderConfig, Renderer, TrackMeta, VisualState,
};

struct SolidRenderer;

impl Renderer for SolidRenderer {
    fn render(&mut self, _state: &VisualState) -> LyrividResult<FrameRGBA> {
        Ok(FrameRGBA {
            width: 2,
            height: 2,
            data: vec![0u8; 16],
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
        out_path: PathBuf::from("Song - Artist (Lyrics).mp4"),
        total_duration: duration,
        fps: Fps::whole(fps).unwrap(),
    }
}

#[test]
fn full_run_hands_exact_metadata_to_the_encoder() {
    let p = pipeline();
    let mut encoder = CollectEncoder::new();
    let mut updates = Vec::new();

    p.encode_with(
        &job(4.0, 30),
        &mut SolidRenderer,
        &mut encoder,
        &CancelFlag::new(),
        &mut |u| updates.push(u),
    )
    .unwrap();

    let consumed = &encoder.jobs[0];
    assert_eq!(consumed.frame_count, 120);
    assert_eq!(consumed.trim_secs, 4.0);
    assert_eq!(
        consumed.out_path,
        PathBuf::from("Song - Artist (Lyrics).mp4")
    );
    assert_eq!(updates.last().unwrap().phase, ExportPhase::Complete);
    assert_eq!(updates.last().unwrap().percent, 100.0);
}

#[test]
fn cancellation_mid_export_never_reaches_the_encoder() {
    let p = pipeline();
    let mut encoder = CollectEncoder::new();
    let cancel = CancelFlag::new();
    let trigger = cancel.clone();
    let mut rendered = 0u32;

    let err = p
        .encode_with(
            &job(10.0, 30),
            &mut SolidRenderer,
            &mut encoder,
            &cancel,
            &mut |u| {
                if u.phase == ExportPhase::RenderingFrames && u.detail.is_some() {
                    rendered += 1;
                    if rendered == 10 {
                        trigger.cancel();
                    }
                }
            },
        )
        .unwrap_err();

    assert!(matches!(err, LyrividError::Cancelled));
    assert!(encoder.jobs.is_empty());
}

#[test]
fn preview_and_export_agree_on_the_same_instant() {
    let timeline = LyricTimeline::new(vec![
        LyricLine::new("Hello", 0.0, 2.0),
        LyricLine::new("World", 2.0, 4.0),
    ]);
    let cfg = RenderConfig::default();
    let meta = TrackMeta::new("Song", "Artist");

    // Export samples frame 45 at 30 fps => t = 1.5 exactly.
    let t = Fps::whole(30).unwrap().frame_time_secs(45);
    let exported = VisualState::compute(t, &timeline, &cfg, &meta);

    // Preview seeks to the same instant.
    struct NullTransport;
    impl AudioTransport for NullTransport {
        fn play(&mut self) -> LyrividResult<()> {
            Ok(())
        }
        fn pause(&mut self) {}
        fn seek(&mut self, _secs: f64) {}
        fn position(&self) -> f64 {
            0.0
        }
        fn duration(&self) -> f64 {
            4.0
        }
    }

    let mut driver = PreviewDriver::new(
        timeline,
        cfg,
        meta,
        Box::new(|| Ok(Box::new(NullTransport) as Box<dyn AudioTransport>)),
    )
    .unwrap();
    driver.seek(t);

    struct Keep(Option<VisualState>);
    impl PreviewSurface for Keep {
        fn present(&mut self, state: &VisualState) -> LyrividResult<()> {
            self.0 = Some(state.clone());
            Ok(())
        }
    }
    let mut surface = Keep(None);
    driver.tick(&mut surface).unwrap();

    assert_eq!(surface.0.unwrap(), exported);
}

#[test]
fn frame_count_follows_the_ceiling_rule() {
    let fps = Fps::whole(30).unwrap();
    assert_eq!(fps.frame_count(10.033).unwrap(), 301);
    assert_eq!(fps.frame_count(10.05).unwrap(), 302);
    assert_eq!(fps.frame_count(10.0).unwrap(), 300);
}
