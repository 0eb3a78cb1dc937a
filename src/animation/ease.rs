/// Easing functions used to map normalized animation progress.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    /// Linear interpolation.
    Linear,
    /// Cubic ease-out.
    OutCubic,
    /// Cubic ease-in/out.
    InOutCubic,
    /// Damped-oscillation ease-out with a slight overshoot-and-settle.
    OutElastic,
}

impl Ease {
    /// Apply this easing function to normalized progress `t` in `[0, 1]`.
    ///
    /// Endpoints are exact for every variant: `apply(0) == 0` and
    /// `apply(1) == 1`.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
            Self::OutElastic => {
                if t == 0.0 {
                    0.0
                } else if t == 1.0 {
                    1.0
                } else {
                    let c4 = std::f64::consts::TAU / 3.0;
                    (2.0f64).powf(-10.0 * t) * ((10.0 * t - 0.75) * c4).sin() + 1.0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Ease; 4] = [Ease::Linear, Ease::OutCubic, Ease::InOutCubic, Ease::OutElastic];

    #[test]
    fn endpoints_are_exact() {
        for ease in ALL {
            assert_eq!(ease.apply(0.0), 0.0, "{ease:?} at 0");
            assert_eq!(ease.apply(1.0), 1.0, "{ease:?} at 1");
        }
    }

    #[test]
    fn out_of_range_progress_is_clamped() {
        for ease in ALL {
            assert_eq!(ease.apply(-3.0), 0.0);
            assert_eq!(ease.apply(7.0), 1.0);
        }
    }

    #[test]
    fn in_out_cubic_is_symmetric_around_midpoint() {
        let e = Ease::InOutCubic;
        assert!((e.apply(0.5) - 0.5).abs() < 1e-12);
        for i in 1..10 {
            let t = f64::from(i) / 10.0;
            let a = e.apply(t);
            let b = e.apply(1.0 - t);
            assert!((a + b - 1.0).abs() < 1e-12, "asymmetric at t={t}");
        }
    }

    #[test]
    fn out_elastic_overshoots_then_settles() {
        let e = Ease::OutElastic;
        let overshoot = (1..100)
            .map(|i| e.apply(f64::from(i) / 100.0))
            .fold(f64::MIN, f64::max);
        assert!(overshoot > 1.0, "elastic should overshoot past 1");
        assert!((e.apply(0.999) - 1.0).abs() < 0.01, "should settle near 1");
    }
}
