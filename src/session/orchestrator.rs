//! Generation orchestrator: the engine's public entry point.
//!
//! Sequence per run: preconditions (connectivity, non-empty selection), image
//! acquisition fan-out (progress 0-30%), codec negotiation, encode session
//! start, timeline-driven rendering (30-95%), session finish, artifact
//! assembly (100%). Any fatal error transitions the session to `Error` with
//! the causing message and leaves no partial artifact.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::animation::timeline::{Phase, Timeline};
use crate::assets::acquire::ImageAcquirer;
use crate::catalog::{
    CatalogItem, GeneratedVideo, IntroOutroTexts, VideoConfig, select_items,
};
use crate::encode::ffmpeg::FfmpegSession;
use crate::encode::negotiate::{
    CodecChoice, EncoderCapability, FfmpegCapability, PREFERRED_CODECS, negotiate,
};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Canvas, FrameIndex};
use crate::foundation::error::{VitrineError, VitrineResult};
use crate::render::slide::{SLIDE_CANVAS, SlideRenderer};
use crate::render::surface::{ImagePaint, SlideSurface};
use crate::session::connectivity::{AlwaysOnline, ConnectivityProbe};
use crate::session::progress::{CancelToken, MonotonicReporter, ProgressSink};

/// Options fixed at generator construction.
#[derive(Clone, Debug)]
pub struct GeneratorOpts {
    /// Root directory relative image references resolve against.
    pub assets_root: PathBuf,
    /// TrueType/OpenType font used for all rendered text.
    pub font_path: PathBuf,
    /// Output canvas; both dimensions must be even.
    pub canvas: Canvas,
    /// Timeout applied to image fetches and probes.
    pub http_timeout: Duration,
}

impl GeneratorOpts {
    pub fn new(assets_root: impl Into<PathBuf>, font_path: impl Into<PathBuf>) -> Self {
        Self {
            assets_root: assets_root.into(),
            font_path: font_path.into(),
            canvas: SLIDE_CANVAS,
            http_timeout: Duration::from_secs(10),
        }
    }
}

/// Lifecycle of the orchestrator's current (or most recent) run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationStatus {
    Idle,
    Generating,
    Success,
    Error,
}

/// Mutable per-run state, owned exclusively by the orchestrator.
#[derive(Clone, Debug)]
pub struct GenerationSession {
    pub status: GenerationStatus,
    pub percent: u8,
    pub message: String,
}

impl GenerationSession {
    fn idle() -> Self {
        Self {
            status: GenerationStatus::Idle,
            percent: 0,
            message: String::new(),
        }
    }
}

/// Wires acquisition, negotiation, rendering, and encoding into one run.
pub struct Generator {
    opts: GeneratorOpts,
    font: Arc<Vec<u8>>,
    capability: Box<dyn EncoderCapability>,
    connectivity: Box<dyn ConnectivityProbe>,
    session: GenerationSession,
}

impl Generator {
    /// Build a generator with the production collaborators (ffmpeg
    /// capability probe, always-online connectivity).
    pub fn new(opts: GeneratorOpts) -> VitrineResult<Self> {
        let font = std::fs::read(&opts.font_path).map_err(|e| {
            VitrineError::validation(format!(
                "failed to read font '{}': {e}",
                opts.font_path.display()
            ))
        })?;
        Ok(Self {
            opts,
            font: Arc::new(font),
            capability: Box::new(FfmpegCapability::probe()),
            connectivity: Box::new(AlwaysOnline),
            session: GenerationSession::idle(),
        })
    }

    /// Replace the encoder capability collaborator (tests, platforms).
    pub fn with_capability(mut self, capability: Box<dyn EncoderCapability>) -> Self {
        self.capability = capability;
        self
    }

    /// Replace the connectivity collaborator.
    pub fn with_connectivity(mut self, connectivity: Box<dyn ConnectivityProbe>) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Current run state.
    pub fn session(&self) -> &GenerationSession {
        &self.session
    }

    /// Run a full generation through the ffmpeg encode session.
    #[tracing::instrument(skip_all, fields(items = items.len()))]
    pub fn generate(
        &mut self,
        items: &[CatalogItem],
        config: &VideoConfig,
        texts: &IntroOutroTexts,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> VitrineResult<GeneratedVideo> {
        let choice = negotiate(self.capability.as_ref(), &PREFERRED_CODECS);
        let mut sink = FfmpegSession::new(choice.clone());
        self.run(items, config, texts, progress, cancel, &mut sink, choice)
    }

    /// Run a full generation into a caller-provided sink.
    pub fn generate_into(
        &mut self,
        items: &[CatalogItem],
        config: &VideoConfig,
        texts: &IntroOutroTexts,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
        sink: &mut dyn FrameSink,
    ) -> VitrineResult<GeneratedVideo> {
        let choice = negotiate(self.capability.as_ref(), &PREFERRED_CODECS);
        self.run(items, config, texts, progress, cancel, sink, choice)
    }

    #[allow(clippy::too_many_arguments)]
    fn run(
        &mut self,
        items: &[CatalogItem],
        config: &VideoConfig,
        texts: &IntroOutroTexts,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
        sink: &mut dyn FrameSink,
        choice: CodecChoice,
    ) -> VitrineResult<GeneratedVideo> {
        if self.session.status == GenerationStatus::Generating {
            // Reject without touching the in-flight session state.
            return Err(VitrineError::precondition(
                "a generation run is already in progress",
            ));
        }
        self.session = GenerationSession {
            status: GenerationStatus::Generating,
            percent: 0,
            message: "starting generation".to_string(),
        };

        let result = self.run_inner(items, config, texts, progress, cancel, sink, choice);
        match &result {
            Ok(_) => {
                self.session.status = GenerationStatus::Success;
                self.session.percent = 100;
                self.session.message = "generation complete".to_string();
            }
            Err(err) => {
                self.session.status = GenerationStatus::Error;
                self.session.message = err.to_string();
                tracing::warn!(error = %err, "generation failed");
            }
        }
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn run_inner(
        &mut self,
        items: &[CatalogItem],
        config: &VideoConfig,
        texts: &IntroOutroTexts,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
        sink: &mut dyn FrameSink,
        choice: CodecChoice,
    ) -> VitrineResult<GeneratedVideo> {
        config.validate()?;
        self.connectivity.check()?;

        let selected = select_items(items, config)?;
        if selected.is_empty() {
            return Err(VitrineError::precondition(
                "no items match the configured selection",
            ));
        }

        let reporter = MonotonicReporter::new(progress);
        reporter.report(0, "starting generation");

        let acquirer = ImageAcquirer::new(
            &self.opts.assets_root,
            self.font.clone(),
            self.opts.http_timeout,
        )?;
        let images = acquirer.acquire_all(&selected, &|done, total| {
            let percent = (done * 30 / total.max(1)) as u8;
            reporter.report(percent, &format!("loaded {done}/{total} product images"));
        })?;
        let paints = images
            .iter()
            .map(ImagePaint::from_prepared)
            .collect::<VitrineResult<Vec<_>>>()?;
        self.session.percent = reporter.last_percent();

        let timeline = Timeline::new(config, selected.len())?;
        let mut renderer = SlideRenderer::new(self.opts.canvas, self.font.clone())?;
        let mut surface = SlideSurface::new(self.opts.canvas)?;

        reporter.report(30, "starting encode session");
        sink.begin(SinkConfig {
            width: self.opts.canvas.width,
            height: self.opts.canvas.height,
            fps: timeline.fps(),
        })?;

        let range = timeline.frame_range();
        let total_frames = range.len_frames();
        let mut last_percent = 30u8;
        for f in range.start.0..range.end.0 {
            if cancel.is_cancelled() {
                return Err(VitrineError::precondition("generation cancelled"));
            }

            let plan = timeline.plan(FrameIndex(f));
            match plan.phase {
                Phase::Intro => renderer.render_intro_slide(&mut surface, texts)?,
                Phase::Entrance { item } | Phase::Hold { item } => {
                    let params = config.animation.visual_params(plan.progress);
                    renderer.render_product_slide(
                        &mut surface,
                        &selected[item],
                        &paints[item],
                        params,
                        config,
                    )?;
                }
                Phase::Outro => renderer.render_outro_slide(&mut surface, texts)?,
                Phase::Done => break,
            }

            let frame = surface.finish_frame();
            sink.push_frame(FrameIndex(f), &frame)?;

            let percent = 30 + ((f + 1) * 65 / total_frames) as u8;
            if percent != last_percent {
                reporter.report(percent, "rendering slides");
                self.session.percent = percent;
                last_percent = percent;
            }
        }

        reporter.report(95, "finalizing video");
        let bytes = sink.finish()?;

        let video = GeneratedVideo {
            byte_size: bytes.len(),
            id: artifact_id(&selected),
            mime_type: choice.mime,
            duration_secs: timeline.duration_secs(),
            items: selected,
            config: config.clone(),
            bytes,
        };
        reporter.report(100, "generation complete");
        tracing::debug!(
            id = %video.id,
            bytes = video.byte_size,
            duration_secs = video.duration_secs,
            "generated video"
        );
        Ok(video)
    }
}

/// Stable artifact id derived from generation time and item ids.
fn artifact_id(items: &[CatalogItem]) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let mut buf = nanos.to_le_bytes().to_vec();
    for item in items {
        buf.extend_from_slice(item.id.as_bytes());
    }
    format!("reel-{:016x}", xxhash_rust::xxh3::xxh3_64(&buf))
}
