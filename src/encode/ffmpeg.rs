//! Capture/encode session backed by the system `ffmpeg`.
//!
//! Raw RGBA frames are streamed to the child's stdin at the nominal frame
//! rate; encoded container bytes are drained from stdout in arrival order
//! and concatenated when the session finishes. Both pipes are drained on
//! helper threads so neither side can deadlock.

use std::io::Read;
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::encode::negotiate::CodecChoice;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{VitrineError, VitrineResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::surface::FrameRgba;

/// Live encode session for one generation run.
pub struct FfmpegSession {
    choice: CodecChoice,
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    bg_rgba: [u8; 4],

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<Vec<u8>>>>>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSession {
    pub fn new(choice: CodecChoice) -> Self {
        Self {
            choice,
            bg_rgba: [0, 0, 0, 255],
            child: None,
            stdin: None,
            stdout_drain: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }
}

impl FrameSink for FfmpegSession {
    fn begin(&mut self, cfg: SinkConfig) -> VitrineResult<()> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(VitrineError::validation("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(VitrineError::validation(
                "encode session width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(VitrineError::validation(
                "encode session width/height must be even (required for yuv420p output)",
            ));
        }

        if !is_ffmpeg_on_path() {
            return Err(VitrineError::encoding(
                "ffmpeg is required for video encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Input: raw premultiplied RGBA8 frames, flattened over the
        // background before writing (push_frame).
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0", "-an", "-c:v", &self.choice.encoder]);
        cmd.args(["-pix_fmt", "yuv420p"]);
        match self.choice.container.as_str() {
            // mp4 cannot be written to a pipe without fragmenting the moov.
            "mp4" => {
                cmd.args(["-movflags", "frag_keyframe+empty_moov", "-f", "mp4"]);
            }
            other => {
                cmd.args(["-f", other]);
            }
        }
        cmd.arg("pipe:1");

        let mut child = cmd.spawn().map_err(|e| {
            VitrineError::encoding(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| VitrineError::encoding("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| VitrineError::encoding("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| VitrineError::encoding("failed to open ffmpeg stderr (unexpected)"))?;

        // Accumulate encoded chunks in arrival order; finish() concatenates.
        let stdout_drain = std::thread::spawn(move || {
            let mut chunks: Vec<Vec<u8>> = Vec::new();
            let mut buf = [0u8; 64 * 1024];
            loop {
                let n = stdout.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                chunks.push(buf[..n].to_vec());
            }
            Ok(chunks)
        });
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.scratch = vec![0u8; (cfg.width * cfg.height * 4) as usize];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stdout_drain = Some(stdout_drain);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRgba) -> VitrineResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| VitrineError::encoding("encode session not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(VitrineError::encoding(
                "encode session received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(VitrineError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(VitrineError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }

        // Flatten premultiplied RGBA8 over the configured background.
        flatten_premul_over_bg_to_opaque_rgba8(&mut self.scratch, &frame.data, self.bg_rgba)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(VitrineError::encoding("encode session is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            VitrineError::encoding(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn finish(&mut self) -> VitrineResult<Vec<u8>> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| VitrineError::encoding("encode session not started"))?;

        let status = child.wait().map_err(|e| {
            VitrineError::encoding(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;

        let chunks = match self.stdout_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| VitrineError::encoding("ffmpeg stdout drain thread panicked"))?
                .map_err(|e| VitrineError::encoding(format!("ffmpeg stdout read failed: {e}")))?,
            None => Vec::new(),
        };
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| VitrineError::encoding("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| VitrineError::encoding(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(VitrineError::encoding(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        let total: usize = chunks.iter().map(Vec::len).sum();
        if total == 0 {
            return Err(VitrineError::encoding(
                "encode session produced no data",
            ));
        }
        let mut payload = Vec::with_capacity(total);
        for chunk in chunks {
            payload.extend_from_slice(&chunk);
        }

        self.cfg = None;
        Ok(payload)
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // For rawvideo input, `-r` before `-i` specifies the input framerate.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> VitrineResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(VitrineError::validation(
            "flatten_premul_over_bg_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = bg_rgba[0] as u16;
    let bg_g = bg_rgba[1] as u16;
    let bg_b = bg_rgba[2] as u16;

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = s[3] as u16;
        if a == 255 {
            d.copy_from_slice(s);
            d[3] = 255;
            continue;
        }

        let inv = 255u16 - a;
        let r = s[0] as u16 + mul_div255_u16(bg_r, inv);
        let g = s[1] as u16 + mul_div255_u16(bg_g, inv);
        let b = s[2] as u16 + mul_div255_u16(bg_b, inv);

        d[0] = r.min(255) as u8;
        d[1] = g.min(255) as u8;
        d[2] = b.min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_premul_alpha_0_returns_bg() {
        let src = vec![0u8, 0, 0, 0];
        let mut dst = vec![0u8; 4];
        flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
        assert_eq!(dst, vec![10, 20, 30, 255]);
    }

    #[test]
    fn flatten_premul_alpha_255_is_identity() {
        let src = vec![1u8, 2, 3, 255];
        let mut dst = vec![0u8; 4];
        flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn push_before_begin_is_an_encoding_error() {
        let mut session = FfmpegSession::new(crate::encode::negotiate::CodecChoice {
            container: "mp4".to_string(),
            encoder: "libx264".to_string(),
            mime: "video/mp4".to_string(),
            extension: "mp4".to_string(),
        });
        let frame = FrameRgba {
            width: 2,
            height: 2,
            data: vec![0; 16],
        };
        let err = session.push_frame(FrameIndex(0), &frame).unwrap_err();
        assert!(matches!(err, VitrineError::Encoding(_)));
    }
}
