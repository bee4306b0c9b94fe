use super::interpolation::EasingFunction;
use crate::traits::Lerp;
use instant::Instant;
use std::time::Duration;

/// A running interpolation of one property from `from` to `to`.
///
/// The animation holds no reference to the property; the owner samples it on
/// every tick and writes the value back.
#[derive(Debug, Clone)]
pub struct PropertyAnimation<T> {
    from: T,
    to: T,
    start: Instant,
    duration: Duration,
    easing: EasingFunction,
}

impl<T: Lerp + Clone> PropertyAnimation<T> {
    pub fn new(from: T, to: T, start: Instant, duration: Duration, easing: EasingFunction) -> Self {
        Self {
            from,
            to,
            start,
            duration,
            easing,
        }
    }

    pub fn from(&self) -> &T {
        &self.from
    }

    pub fn to(&self) -> &T {
        &self.to
    }

    /// Linear progress in `[0, 1]`.
    pub fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }

    /// Value at `now`. Exactly `to` once finished.
    pub fn sample(&self, now: Instant) -> T {
        let t = self.progress(now);
        if t >= 1.0 {
            self.to.clone()
        } else {
            self.from.lerp(&self.to, self.easing.apply(t))
        }
    }
}
