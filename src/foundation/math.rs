use crate::foundation::core::DVec3;

pub(crate) fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

pub(crate) fn clamp01(t: f64) -> f64 {
    if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) }
}

/// `t²(3 − 2t)` on clamped `t`.
pub(crate) fn smoothstep(t: f64) -> f64 {
    let t = clamp01(t);
    t * t * (3.0 - 2.0 * t)
}

/// Height of a half-sine arc at eased progress `t`.
pub(crate) fn arc(t: f64, amplitude: f64) -> f64 {
    (t * std::f64::consts::PI).sin() * amplitude
}

/// Move `current` a fixed fraction of the way toward `target`.
pub(crate) fn approach(current: f64, target: f64, factor: f64) -> f64 {
    lerp(current, target, factor)
}

pub(crate) fn approach_vec(current: DVec3, target: DVec3, factor: f64) -> DVec3 {
    current.lerp(target, factor)
}

/// Axis-aligned box in world space.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct Aabb {
    pub center: DVec3,
    pub half_extents: DVec3,
}

impl Aabb {
    pub fn new(center: DVec3, half_extents: DVec3) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
        }
    }

    pub fn min(&self) -> DVec3 {
        self.center - self.half_extents
    }

    pub fn max(&self) -> DVec3 {
        self.center + self.half_extents
    }

    /// Strict overlap; touching faces do not count.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let d = (self.center - other.center).abs();
        let reach = self.half_extents + other.half_extents;
        d.x < reach.x && d.y < reach.y && d.z < reach.z
    }

    pub fn contains(&self, p: DVec3) -> bool {
        let d = (p - self.center).abs();
        d.x < self.half_extents.x && d.y < self.half_extents.y && d.z < self.half_extents.z
    }

    /// Distance along the unit ray `origin + t·dir` to the first face it
    /// enters, within `reach`. Rays starting inside the box report no hit.
    pub fn ray_entry(&self, origin: DVec3, dir: DVec3, reach: f64) -> Option<f64> {
        let (lo, hi) = (self.min(), self.max());
        let mut t_near = f64::NEG_INFINITY;
        let mut t_far = f64::INFINITY;
        for axis in 0..3 {
            let (o, d) = (origin[axis], dir[axis]);
            if d.abs() < 1e-12 {
                if o < lo[axis] || o > hi[axis] {
                    return None;
                }
                continue;
            }
            let (a, b) = ((lo[axis] - o) / d, (hi[axis] - o) / d);
            t_near = t_near.max(a.min(b));
            t_far = t_far.min(a.max(b));
        }
        (t_near <= t_far && t_near >= 0.0 && t_near <= reach).then_some(t_near)
    }
}

/// SplitMix64 generator; deterministic per seed.
#[derive(Clone, Debug)]
pub struct Rng64 {
    state: u64,
}

impl Rng64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    pub fn next_f64_01(&mut self) -> f64 {
        // 53 bits of precision.
        let v = self.next_u64() >> 11;
        (v as f64) * (1.0 / ((1u64 << 53) as f64))
    }

    /// Uniform in `[lo, hi)`.
    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64_01()
    }

    /// Uniform in `[-half, half)`.
    pub fn symmetric(&mut self, half: f64) -> f64 {
        self.range(-half, half)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
