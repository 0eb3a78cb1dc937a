//! Generation timeline: a linear phase machine realized as a pure
//! frame-to-plan mapping.
//!
//! `Intro -> (Entrance -> Hold) x N -> Outro`, with no branching back-edges.
//! The orchestrator walks frames `0..total_frames()` in order; timing is
//! carried by the sink's fixed nominal frame rate, not by wall-clock pacing.

use crate::catalog::VideoConfig;
use crate::foundation::core::{Fps, FrameIndex, FrameRange};
use crate::foundation::error::{VitrineError, VitrineResult};

/// Fixed rendering/encoding rate of the generated video.
pub const NOMINAL_FPS: Fps = Fps { num: 60, den: 1 };

/// Static intro card dwell time.
pub const INTRO_DWELL_SECS: f64 = 2.5;

/// Static outro card dwell time.
pub const OUTRO_DWELL_SECS: f64 = 3.0;

/// Entrance animation length in frames (1.5 s at the nominal rate).
pub const ENTRANCE_FRAMES: u64 = 90;

/// Where a frame falls in the generation timeline.
///
/// `Idle` exists only as an orchestrator status, never as a frame phase;
/// `Done` marks frames at or past the end of the timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Intro,
    Entrance { item: usize },
    Hold { item: usize },
    Outro,
    Done,
}

/// Plan for rendering one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FramePlan {
    pub phase: Phase,
    /// Normalized animation progress. During `Entrance` this advances from 0
    /// toward 1; `Hold` and the static cards sit at exactly 1.
    pub progress: f64,
}

/// Precomputed frame counts for one generation run.
#[derive(Clone, Copy, Debug)]
pub struct Timeline {
    fps: Fps,
    item_count: u64,
    intro_frames: u64,
    entrance_frames: u64,
    item_frames: u64,
    outro_frames: u64,
}

impl Timeline {
    pub fn new(config: &VideoConfig, item_count: usize) -> VitrineResult<Self> {
        if item_count == 0 {
            return Err(VitrineError::validation(
                "timeline requires at least one item",
            ));
        }
        let fps = NOMINAL_FPS;
        let item_frames = fps.secs_to_frames_round(config.item_hold_secs);
        // The entrance is part of the configured hold, never additional to it.
        let entrance_frames = ENTRANCE_FRAMES.min(item_frames);
        Ok(Self {
            fps,
            item_count: item_count as u64,
            intro_frames: fps.secs_to_frames_round(INTRO_DWELL_SECS),
            entrance_frames,
            item_frames,
            outro_frames: fps.secs_to_frames_round(OUTRO_DWELL_SECS),
        })
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Total frames across intro, all items, and outro.
    pub fn total_frames(&self) -> u64 {
        self.intro_frames + self.item_count * self.item_frames + self.outro_frames
    }

    /// The whole timeline as a half-open frame range.
    pub fn frame_range(&self) -> FrameRange {
        FrameRange {
            start: FrameIndex(0),
            end: FrameIndex(self.total_frames()),
        }
    }

    /// Nominal duration: `intro + N x hold + outro` seconds.
    pub fn duration_secs(&self) -> f64 {
        self.fps.frames_to_secs(self.total_frames())
    }

    /// Map an absolute frame index to its phase and animation progress.
    pub fn plan(&self, frame: FrameIndex) -> FramePlan {
        let mut rem = frame.0;

        if rem < self.intro_frames {
            return FramePlan {
                phase: Phase::Intro,
                progress: 1.0,
            };
        }
        rem -= self.intro_frames;

        let items_total = self.item_count * self.item_frames;
        if rem < items_total {
            let item = (rem / self.item_frames) as usize;
            let local = rem % self.item_frames;
            if local < self.entrance_frames {
                return FramePlan {
                    phase: Phase::Entrance { item },
                    progress: local as f64 / self.entrance_frames as f64,
                };
            }
            return FramePlan {
                phase: Phase::Hold { item },
                progress: 1.0,
            };
        }
        rem -= items_total;

        if rem < self.outro_frames {
            return FramePlan {
                phase: Phase::Outro,
                progress: 1.0,
            };
        }
        FramePlan {
            phase: Phase::Done,
            progress: 1.0,
        }
    }
}
