use crate::animation::ease::Ease;

/// Entrance animation applied to every product slide in a run.
///
/// Selected once per run; each kind is a pure function of normalized
/// progress, never re-branched per frame on string config.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationKind {
    Fade,
    Zoom,
    Slide,
    Rotate,
}

/// Derived visual parameters for one rendered frame.
///
/// All fields are pure functions of `(AnimationKind, progress)`. At
/// `progress = 1` every kind converges exactly to the steady state:
/// scale 1, opacity 1, rotation 0, offsets 0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisualParams {
    /// Uniform scale applied to the product image.
    pub scale: f64,
    /// Product image opacity in `[0, 1]`.
    pub opacity: f64,
    /// Product image rotation in radians.
    pub rotation_rad: f64,
    /// Vertical image offset as a fraction of the canvas height.
    pub y_offset_frac: f64,
    /// Text block opacity in `[0, 1]`.
    pub text_opacity: f64,
    /// Vertical text offset in pixels.
    pub text_y_offset_px: f64,
}

impl VisualParams {
    /// The fully-arrived state every kind converges to at `progress = 1`.
    pub fn steady() -> Self {
        Self {
            scale: 1.0,
            opacity: 1.0,
            rotation_rad: 0.0,
            y_offset_frac: 0.0,
            text_opacity: 1.0,
            text_y_offset_px: 0.0,
        }
    }
}

impl AnimationKind {
    /// Evaluate the per-kind animation table at normalized `progress`.
    pub fn visual_params(self, progress: f64) -> VisualParams {
        let e = Ease::InOutCubic.apply(progress);
        match self {
            Self::Fade => VisualParams {
                scale: 1.0,
                opacity: e,
                rotation_rad: 0.0,
                y_offset_frac: 0.0,
                text_opacity: e,
                text_y_offset_px: 0.0,
            },
            Self::Zoom => VisualParams {
                scale: 0.3 + 0.7 * e,
                opacity: e,
                rotation_rad: 0.0,
                y_offset_frac: 0.0,
                text_opacity: ((e - 0.3) / 0.7).clamp(0.0, 1.0),
                text_y_offset_px: 0.0,
            },
            Self::Slide => VisualParams {
                scale: 1.0,
                opacity: e,
                rotation_rad: 0.0,
                y_offset_frac: (1.0 - e) * 0.5,
                text_opacity: e,
                text_y_offset_px: (1.0 - e) * 100.0,
            },
            Self::Rotate => VisualParams {
                scale: 0.5 + 0.5 * e,
                opacity: e,
                rotation_rad: (1.0 - Ease::OutElastic.apply(progress)) * std::f64::consts::TAU,
                y_offset_frac: 0.0,
                text_opacity: ((e - 0.4) / 0.6).clamp(0.0, 1.0),
                text_y_offset_px: 0.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [AnimationKind; 4] = [
        AnimationKind::Fade,
        AnimationKind::Zoom,
        AnimationKind::Slide,
        AnimationKind::Rotate,
    ];

    #[test]
    fn progress_one_converges_to_steady_state_exactly() {
        for kind in ALL {
            assert_eq!(kind.visual_params(1.0), VisualParams::steady(), "{kind:?}");
        }
    }

    #[test]
    fn progress_zero_is_not_yet_arrived() {
        for kind in ALL {
            let p = kind.visual_params(0.0);
            let arrived = p.opacity >= 1.0
                && p.scale >= 1.0
                && p.y_offset_frac == 0.0
                && p.rotation_rad == 0.0;
            assert!(!arrived, "{kind:?} must start visually absent: {p:?}");
        }
    }

    #[test]
    fn fade_tracks_eased_progress() {
        let p = AnimationKind::Fade.visual_params(0.5);
        assert!((p.opacity - 0.5).abs() < 1e-12);
        assert_eq!(p.scale, 1.0);
        assert_eq!(p.text_y_offset_px, 0.0);
    }

    #[test]
    fn zoom_starts_small_and_delays_text() {
        let p = AnimationKind::Zoom.visual_params(0.0);
        assert!((p.scale - 0.3).abs() < 1e-12);
        assert_eq!(p.text_opacity, 0.0);
        let late = AnimationKind::Zoom.visual_params(0.9);
        assert!(late.text_opacity > 0.5);
    }

    #[test]
    fn slide_offsets_decay_to_zero() {
        let start = AnimationKind::Slide.visual_params(0.0);
        assert!((start.y_offset_frac - 0.5).abs() < 1e-12);
        assert!((start.text_y_offset_px - 100.0).abs() < 1e-12);
        let end = AnimationKind::Slide.visual_params(1.0);
        assert_eq!(end.y_offset_frac, 0.0);
        assert_eq!(end.text_y_offset_px, 0.0);
    }

    #[test]
    fn rotate_spins_a_full_turn_and_lands_flat() {
        let start = AnimationKind::Rotate.visual_params(0.0);
        assert!((start.rotation_rad - std::f64::consts::TAU).abs() < 1e-12);
        let end = AnimationKind::Rotate.visual_params(1.0);
        assert_eq!(end.rotation_rad, 0.0);
    }

    #[test]
    fn kind_serde_uses_lowercase_names() {
        assert_eq!(
            serde_json::to_string(&AnimationKind::Rotate).unwrap(),
            "\"rotate\""
        );
        let kind: AnimationKind = serde_json::from_str("\"slide\"").unwrap();
        assert_eq!(kind, AnimationKind::Slide);
    }
}
