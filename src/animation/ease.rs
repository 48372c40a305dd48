/// Easing functions used to map normalized animation progress.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    /// Linear interpolation.
    Linear,
    /// Quadratic ease-out.
    OutQuad,
    /// Quadratic ease-in/out.
    InOutQuad,
    /// Cubic ease-out.
    OutCubic,
    /// Cubic ease-in/out.
    InOutCubic,
    /// `t²(3 − 2t)`: zero velocity at both ends.
    Smoothstep,
    /// Damped sine that overshoots the target before settling.
    OutElastic {
        /// Overshoot amplitude (values below 1 are treated as 1).
        amplitude: f64,
        /// Oscillation period in normalized time.
        period: f64,
    },
}

impl Ease {
    /// The spring-back ease used for text returning to rest.
    pub const SPRING: Ease = Ease::OutElastic {
        amplitude: 1.0,
        period: 0.4,
    };

    /// Apply this easing function to normalized progress `t` in `[0, 1]`.
    ///
    /// Endpoints are exact: `apply(0) == 0` and `apply(1) == 1` for every curve.
    pub fn apply(self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        if t == 0.0 || t == 1.0 {
            return t;
        }
        match self {
            Self::Linear => t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
            Self::Smoothstep => t * t * (3.0 - 2.0 * t),
            Self::OutElastic { amplitude, period } => {
                use std::f64::consts::TAU;
                let amp = amplitude.max(1.0);
                let period = if period > 0.0 { period } else { 0.3 };
                let phase = period / TAU * (1.0 / amp).asin();
                amp * 2f64.powf(-10.0 * t) * ((t - phase) * TAU / period).sin() + 1.0
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
