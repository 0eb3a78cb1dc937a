use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::VitrineResult;
use crate::render::surface::FrameRgba;

/// Configuration provided to a [`FrameSink`] at the start of a run.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Nominal input frames-per-second; carries the artifact's timing.
    pub fps: Fps,
}

/// Sink contract for consuming rendered frames in timeline order.
///
/// `begin` is called strictly before the first frame is pushed and `finish`
/// only after the final frame, so no frames are lost on either edge.
/// `push_frame` is called in strictly increasing `FrameIndex` order.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> VitrineResult<()>;
    /// Push one frame in strictly increasing timeline order.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRgba) -> VitrineResult<()>;
    /// Finalize the stream and return the encoded payload bytes.
    fn finish(&mut self) -> VitrineResult<Vec<u8>>;
}

/// In-memory sink for tests and debugging.
///
/// `finish` concatenates the raw frame bytes as a payload stand-in.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRgba)>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg.clone()
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(FrameIndex, FrameRgba)] {
        &self.frames
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> VitrineResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRgba) -> VitrineResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn finish(&mut self) -> VitrineResult<Vec<u8>> {
        let mut out = Vec::new();
        for (_, frame) in &self.frames {
            out.extend_from_slice(&frame.data);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_sink_captures_frames_and_payload() {
        let mut sink = InMemorySink::new();
        sink.begin(SinkConfig {
            width: 2,
            height: 1,
            fps: Fps { num: 60, den: 1 },
        })
        .unwrap();
        let frame = FrameRgba {
            width: 2,
            height: 1,
            data: vec![1, 2, 3, 4, 5, 6, 7, 8],
        };
        sink.push_frame(FrameIndex(0), &frame).unwrap();
        sink.push_frame(FrameIndex(1), &frame).unwrap();
        assert_eq!(sink.frames().len(), 2);
        let payload = sink.finish().unwrap();
        assert_eq!(payload.len(), 16);
        assert!(sink.config().is_some());
    }

    #[test]
    fn begin_resets_previously_captured_frames() {
        let mut sink = InMemorySink::new();
        let cfg = SinkConfig {
            width: 1,
            height: 1,
            fps: Fps { num: 30, den: 1 },
        };
        sink.begin(cfg.clone()).unwrap();
        sink.push_frame(
            FrameIndex(0),
            &FrameRgba {
                width: 1,
                height: 1,
                data: vec![0; 4],
            },
        )
        .unwrap();
        sink.begin(cfg).unwrap();
        assert!(sink.frames().is_empty());
    }
}
