//! Codec negotiation: pick the first supported container/encoder pair from
//! an ordered preference list.

use std::collections::HashSet;

/// One container/encoder pair the engine knows how to drive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodecCandidate {
    /// Container/mux format name as ffmpeg knows it.
    pub container: &'static str,
    /// ffmpeg video encoder name.
    pub encoder: &'static str,
    /// MIME string attached to the finished artifact.
    pub mime: &'static str,
    /// Conventional file extension for downloads.
    pub extension: &'static str,
}

/// Preference order: the modern, broadly-playable pair first, then the
/// alternative family's candidates, then the loose legacy fallback.
pub const PREFERRED_CODECS: [CodecCandidate; 4] = [
    CodecCandidate {
        container: "mp4",
        encoder: "libx264",
        mime: "video/mp4",
        extension: "mp4",
    },
    CodecCandidate {
        container: "webm",
        encoder: "libvpx-vp9",
        mime: "video/webm;codecs=vp9",
        extension: "webm",
    },
    CodecCandidate {
        container: "webm",
        encoder: "libvpx",
        mime: "video/webm;codecs=vp8",
        extension: "webm",
    },
    CodecCandidate {
        container: "mp4",
        encoder: "mpeg4",
        mime: "video/mp4",
        extension: "mp4",
    },
];

/// The negotiated output encoding for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodecChoice {
    pub container: String,
    pub encoder: String,
    pub mime: String,
    pub extension: String,
}

impl From<CodecCandidate> for CodecChoice {
    fn from(c: CodecCandidate) -> Self {
        Self {
            container: c.container.to_string(),
            encoder: c.encoder.to_string(),
            mime: c.mime.to_string(),
            extension: c.extension.to_string(),
        }
    }
}

/// Capability query against the underlying encoder platform.
pub trait EncoderCapability {
    fn supports(&self, encoder: &str) -> bool;
}

/// Walk `preferred` in order and return the first supported candidate.
///
/// When nothing is supported (platform exposes no encoder at all) the first
/// candidate is returned as a best-guess default; the encode session's own
/// error path reports the real failure. Deterministic and idempotent for a
/// fixed capability implementation.
pub fn negotiate(caps: &dyn EncoderCapability, preferred: &[CodecCandidate]) -> CodecChoice {
    for candidate in preferred {
        if caps.supports(candidate.encoder) {
            return (*candidate).into();
        }
    }
    let fallback = preferred.first().copied().unwrap_or(PREFERRED_CODECS[0]);
    tracing::warn!(
        encoder = fallback.encoder,
        "no preferred encoder supported, defaulting"
    );
    fallback.into()
}

/// Capability set probed from `ffmpeg -encoders`.
pub struct FfmpegCapability {
    encoders: HashSet<String>,
}

impl FfmpegCapability {
    /// Probe the local ffmpeg once. A missing or failing ffmpeg yields an
    /// empty capability set, which makes negotiation fall back to the
    /// default candidate.
    pub fn probe() -> Self {
        let out = std::process::Command::new("ffmpeg")
            .args(["-hide_banner", "-encoders"])
            .output();
        let encoders = match out {
            Ok(out) if out.status.success() => {
                parse_encoder_list(&String::from_utf8_lossy(&out.stdout))
            }
            _ => HashSet::new(),
        };
        Self { encoders }
    }
}

impl EncoderCapability for FfmpegCapability {
    fn supports(&self, encoder: &str) -> bool {
        self.encoders.contains(encoder)
    }
}

/// Parse `ffmpeg -encoders` output into the set of video encoder names.
///
/// Lines before the `------` separator are header text; after it each line is
/// `<flags> <name> <description>` where a leading `V` marks a video encoder.
fn parse_encoder_list(text: &str) -> HashSet<String> {
    text.lines()
        .skip_while(|line| !line.trim_start().starts_with("------"))
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let flags = parts.next()?;
            let name = parts.next()?;
            flags.starts_with('V').then(|| name.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubCaps(HashSet<String>);

    impl StubCaps {
        fn of(names: &[&str]) -> Self {
            Self(names.iter().map(|s| s.to_string()).collect())
        }
    }

    impl EncoderCapability for StubCaps {
        fn supports(&self, encoder: &str) -> bool {
            self.0.contains(encoder)
        }
    }

    #[test]
    fn first_supported_candidate_wins() {
        let caps = StubCaps::of(&["libx264", "libvpx-vp9"]);
        let choice = negotiate(&caps, &PREFERRED_CODECS);
        assert_eq!(choice.encoder, "libx264");
        assert_eq!(choice.mime, "video/mp4");
    }

    #[test]
    fn falls_back_to_alternative_family_in_order() {
        let caps = StubCaps::of(&["libvpx", "libvpx-vp9"]);
        let choice = negotiate(&caps, &PREFERRED_CODECS);
        assert_eq!(choice.encoder, "libvpx-vp9");
        assert_eq!(choice.container, "webm");
    }

    #[test]
    fn empty_capability_set_yields_best_guess_default() {
        let caps = StubCaps::of(&[]);
        let choice = negotiate(&caps, &PREFERRED_CODECS);
        assert_eq!(choice.encoder, "libx264");
    }

    #[test]
    fn negotiation_is_idempotent_for_fixed_caps() {
        let caps = StubCaps::of(&["mpeg4"]);
        let a = negotiate(&caps, &PREFERRED_CODECS);
        let b = negotiate(&caps, &PREFERRED_CODECS);
        assert_eq!(a, b);
        assert_eq!(a.encoder, "mpeg4");
    }

    #[test]
    fn encoder_list_parsing_keeps_video_encoders_only() {
        let sample = "Encoders:\n V..... = Video\n A..... = Audio\n ------\n \
                      V....D libx264              H.264\n \
                      A....D aac                  AAC\n \
                      V....D libvpx-vp9           VP9\n";
        let set = parse_encoder_list(sample);
        assert!(set.contains("libx264"));
        assert!(set.contains("libvpx-vp9"));
        assert!(!set.contains("aac"));
    }
}
