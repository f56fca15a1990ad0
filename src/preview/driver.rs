use crate::foundation::error::LyrividResult;
use crate::state::visual::VisualState;
use crate::style::config::{RenderConfig, TrackMeta};
use crate::timeline::lyrics::LyricTimeline;

/// Host-owned audio playback and clock.
///
/// Implementations wrap whatever the host audio API provides. The driver
/// creates the transport lazily on first play through a factory and caches
/// it for the whole session, since host audio APIs disallow re-creating the
/// routing context per play.
pub trait AudioTransport {
    /// Begin or resume playback.
    fn play(&mut self) -> LyrividResult<()>;
    /// Pause playback, keeping the position.
    fn pause(&mut self);
    /// Jump to an absolute position in seconds.
    fn seek(&mut self, secs: f64);
    /// Current playback position in seconds.
    fn position(&self) -> f64;
    /// Total clip duration in seconds.
    fn duration(&self) -> f64;
}

/// Interactive surface fed by the driver on every tick.
pub trait PreviewSurface {
    /// Present one computed instant.
    fn present(&mut self, state: &VisualState) -> LyrividResult<()>;
}

/// Builds the session's audio transport on first play.
pub type TransportFactory = Box<dyn FnMut() -> LyrividResult<Box<dyn AudioTransport>>>;

/// Playback phase of the preview session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackPhase {
    /// Not advancing; seeks update the sampled time immediately.
    Paused,
    /// Advancing with the transport clock.
    Playing,
    /// The clip finished; terminal until an explicit restart or seek.
    Ended,
}

/// Drives the live preview on a cooperative per-frame callback.
///
/// The host calls [`PreviewDriver::tick`] at its natural presentation
/// cadence; each tick samples the transport, applies end-of-clip handling,
/// computes the [`VisualState`] and presents it. Nothing blocks between
/// ticks. All playback state lives here as explicit values; there is no
/// ambient shared mutability.
pub struct PreviewDriver {
    timeline: LyricTimeline,
    cfg: RenderConfig,
    meta: TrackMeta,

    factory: TransportFactory,
    transport: Option<Box<dyn AudioTransport>>,

    phase: PlaybackPhase,
    position: f64,
    has_started: bool,
}

impl PreviewDriver {
    /// Create a driver for one session.
    ///
    /// The transport is not created here; the factory runs on first play.
    /// The cached transport is released when the driver is dropped, on
    /// every exit path.
    pub fn new(
        timeline: LyricTimeline,
        cfg: RenderConfig,
        meta: TrackMeta,
        factory: TransportFactory,
    ) -> LyrividResult<Self> {
        cfg.validate()?;
        Ok(Self {
            timeline,
            cfg,
            meta,
            factory,
            transport: None,
            phase: PlaybackPhase::Paused,
            position: 0.0,
            has_started: false,
        })
    }

    /// Current playback phase.
    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    /// Most recently sampled playback position in seconds.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// `true` once playback has been started at least once (drives the
    /// initial play overlay in the surrounding UI).
    pub fn has_started(&self) -> bool {
        self.has_started
    }

    /// Start or resume playback.
    ///
    /// Creates the audio transport on the first call. While ended, play
    /// restarts from the beginning. Failures are logged and leave the
    /// state machine unchanged.
    pub fn play(&mut self) {
        if self.phase == PlaybackPhase::Playing {
            return;
        }
        if self.transport.is_none() {
            match (self.factory)() {
                Ok(t) => self.transport = Some(t),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to create audio transport");
                    return;
                }
            }
        }
        let Some(transport) = self.transport.as_mut() else {
            return;
        };

        if self.phase == PlaybackPhase::Ended {
            transport.seek(0.0);
            self.position = 0.0;
        }
        match transport.play() {
            Ok(()) => {
                self.phase = PlaybackPhase::Playing;
                self.has_started = true;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to start playback");
            }
        }
    }

    /// Pause playback, sampling the position one last time.
    ///
    /// A no-op while ended: the ended state resumes only through an
    /// explicit restart or seek.
    pub fn pause(&mut self) {
        if self.phase != PlaybackPhase::Playing {
            return;
        }
        if let Some(transport) = self.transport.as_mut() {
            transport.pause();
            self.position = transport.position();
        }
        self.phase = PlaybackPhase::Paused;
    }

    /// Jump to `secs`, updating the sampled time immediately.
    ///
    /// Works while paused without an active scheduling loop; seeking while
    /// ended clears the ended flag.
    pub fn seek(&mut self, secs: f64) {
        let clamped = match self.transport.as_ref() {
            Some(t) if t.duration() > 0.0 => secs.clamp(0.0, t.duration()),
            _ => secs.max(0.0),
        };
        if let Some(transport) = self.transport.as_mut() {
            transport.seek(clamped);
        }
        self.position = clamped;
        if self.phase == PlaybackPhase::Ended {
            self.phase = PlaybackPhase::Paused;
        }
    }

    /// One cooperative frame callback: sample, transition, compute, present.
    pub fn tick(&mut self, surface: &mut dyn PreviewSurface) -> LyrividResult<()> {
        if self.phase == PlaybackPhase::Playing
            && let Some(transport) = self.transport.as_mut()
        {
            let duration = transport.duration();
            let sampled = transport.position();
            if duration > 0.0 && sampled >= duration {
                // Terminal: clamp to the clip end and require an explicit
                // restart to resume.
                self.position = duration;
                self.phase = PlaybackPhase::Ended;
            } else {
                self.position = sampled;
            }
        }
        let state = self.visual_state();
        surface.present(&state)
    }

    /// Compute the visual state at the current sampled position.
    pub fn visual_state(&self) -> VisualState {
        VisualState::compute(self.position, &self.timeline, &self.cfg, &self.meta)
    }
}

/// Format seconds as `m:ss` for the transport readout.
pub fn format_timestamp(secs: f64) -> String {
    if !secs.is_finite() || secs < 0.0 {
        return "0:00".to_owned();
    }
    let total = secs.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
