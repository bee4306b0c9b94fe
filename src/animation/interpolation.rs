/// Easing curves for property animations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EasingFunction {
    Linear,
    EaseInQuad,
    /// Default for Center, ZoomLevel and Heading animations.
    #[default]
    EaseOutQuad,
    EaseInOutQuad,
    EaseOutCubic,
}

impl EasingFunction {
    /// Apply the easing function to a normalized time value (0.0 to 1.0)
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            EasingFunction::Linear => t,
            EasingFunction::EaseInQuad => t * t,
            EasingFunction::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            EasingFunction::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            EasingFunction::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
        }
    }
}

/// Angle helpers
pub struct Interpolation;

impl Interpolation {
    /// Wraps an angle into `[0, 360)`.
    pub fn normalize_heading(heading: f64) -> f64 {
        let heading = heading.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360 for tiny negative inputs
        if heading >= 360.0 {
            0.0
        } else {
            heading
        }
    }

    /// Signed delta in `[-180, 180)` that turns `from` into `to` along the
    /// shorter arc.
    pub fn shortest_angle_delta(from: f64, to: f64) -> f64 {
        (to - from + 180.0).rem_euclid(360.0) - 180.0
    }
}
