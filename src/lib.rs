//! Vitrine is a slideshow video synthesis engine for catalog storefronts.
//!
//! Given a curated list of catalog items and a style configuration, the engine
//! procedurally renders a sequence of animated product slides on a CPU raster
//! surface and streams the frames into an encoder session, producing a
//! playable video artifact (bytes + metadata).
//!
//! The pipeline is offline and frame-accurate: frames are rendered as fast as
//! possible and tagged with their frame index; timing is carried by the
//! sink's fixed nominal frame rate, so played-back timing always matches the
//! configured durations.
#![forbid(unsafe_code)]

pub mod animation;
pub mod artifact;
pub mod assets;
pub mod catalog;
pub mod encode;
pub mod foundation;
pub mod render;
pub mod session;
pub mod text;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex, FrameRange, Rgba8Premul};
pub use crate::foundation::error::{VitrineError, VitrineResult};

pub use crate::animation::ease::Ease;
pub use crate::animation::params::{AnimationKind, VisualParams};
pub use crate::animation::timeline::{FramePlan, Phase, Timeline};
pub use crate::catalog::{
    CatalogItem, CatalogSource, GeneratedVideo, IntroOutroTexts, SelectionMode, VideoConfig,
};
pub use crate::encode::ffmpeg::FfmpegSession;
pub use crate::encode::negotiate::{CodecCandidate, CodecChoice, EncoderCapability, negotiate};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::render::surface::FrameRgba;
pub use crate::session::connectivity::{AlwaysOnline, ConnectivityProbe, HttpProbe};
pub use crate::session::orchestrator::{
    GenerationSession, GenerationStatus, Generator, GeneratorOpts,
};
pub use crate::session::progress::{CancelToken, NullProgress, Progress, ProgressSink};
