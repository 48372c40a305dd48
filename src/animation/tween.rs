use crate::{animation::ease::Ease, foundation::core::Vec2};

/// Interpolation contract for tweened value types.
pub trait Lerp: Sized {
    /// Interpolate from `a` to `b` with factor `t` (may leave `[0, 1]` for overshooting eases).
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Vec2 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Vec2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

/// Time-based interpolation of one value, with an optional start delay.
///
/// A tween is cancelled by dropping it; it never calls back into its owner.
#[derive(Clone, Debug)]
pub struct Tween<T> {
    from: T,
    to: T,
    delay: f64,
    duration: f64,
    ease: Ease,
    elapsed: f64,
}

impl<T> Tween<T>
where
    T: Lerp + Clone,
{
    /// Create a tween over `duration` seconds.
    pub fn new(from: T, to: T, duration: f64, ease: Ease) -> Self {
        Self {
            from,
            to,
            delay: 0.0,
            duration: duration.max(0.0),
            ease,
            elapsed: 0.0,
        }
    }

    /// Delay the start by `delay` seconds.
    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    /// Advance by `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }
    }

    /// `true` once the delay has elapsed.
    pub fn has_started(&self) -> bool {
        self.elapsed >= self.delay
    }

    /// `true` once the tween reached its end value.
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.delay + self.duration
    }

    /// Normalized, un-eased progress.
    pub fn progress(&self) -> f64 {
        if self.duration <= 0.0 {
            return if self.has_started() { 1.0 } else { 0.0 };
        }
        ((self.elapsed - self.delay) / self.duration).clamp(0.0, 1.0)
    }

    /// Current value. Exactly `to` once finished.
    pub fn value(&self) -> T {
        if self.is_finished() {
            return self.to.clone();
        }
        T::lerp(&self.from, &self.to, self.ease.apply(self.progress()))
    }
}

/// A set of keyed tweens advanced together, typically staggered.
#[derive(Clone, Debug)]
pub struct Timeline<K, T> {
    tracks: Vec<(K, Tween<T>)>,
}

impl<K, T> Timeline<K, T>
where
    K: Copy,
    T: Lerp + Clone,
{
    /// Build a timeline where the i-th key starts `i * stagger` seconds after the first.
    pub fn staggered(
        keys: impl IntoIterator<Item = K>,
        stagger: f64,
        duration: f64,
        ease: Ease,
        mut endpoints: impl FnMut(K) -> (T, T),
    ) -> Self {
        let tracks = keys
            .into_iter()
            .enumerate()
            .map(|(i, k)| {
                let (from, to) = endpoints(k);
                let tween = Tween::new(from, to, duration, ease).with_delay(i as f64 * stagger);
                (k, tween)
            })
            .collect();
        Self { tracks }
    }

    /// Advance all tracks and report the value of every started track.
    pub fn advance(&mut self, dt: f64, mut apply: impl FnMut(K, T)) {
        for (k, tween) in &mut self.tracks {
            tween.advance(dt);
            if tween.has_started() {
                apply(*k, tween.value());
            }
        }
    }

    /// `true` when every track finished.
    pub fn is_finished(&self) -> bool {
        self.tracks.iter().all(|(_, t)| t.is_finished())
    }

    /// Number of tracks.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// `true` when the timeline has no tracks.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/tween.rs"]
mod tests;
