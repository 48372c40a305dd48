//! Physics letters spelling the destination section, spawned at the peak of
//! each forward swing and knocked loose by the figure.

use crate::{
    bus::{ChoreoEvent, EventBus, EventKind, Inbox},
    config::LetterConfig,
    foundation::{
        core::{DVec3, LetterId, SectionId},
        math::{Aabb, Rng64},
    },
    state::CharacterWorld,
};

/// One rigid letter. Unit mass; rotation is Euler angles in radians.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct LetterBody {
    pub id: LetterId,
    pub glyph: char,
    /// Section whose label the letter belongs to.
    pub section: SectionId,
    pub position: DVec3,
    pub rotation: DVec3,
    pub linear_velocity: DVec3,
    pub angular_velocity: DVec3,
    pub gravity_scale: f64,
    pub damping: f64,
    /// Seconds since spawn.
    pub age: f64,
    pub opacity: f64,
    /// Knocked by a collider.
    pub hit: bool,
    fading: bool,
}

impl LetterBody {
    /// `true` once the letter is fading out.
    pub fn is_fading(&self) -> bool {
        self.fading
    }
}

#[derive(Debug)]
pub struct LetterLayer {
    cfg: LetterConfig,
    bus: EventBus,
    inbox: Inbox,
    rng: Rng64,
    next_id: u64,
    bodies: Vec<LetterBody>,
}

impl LetterLayer {
    pub fn new(cfg: LetterConfig, bus: &EventBus) -> Self {
        Self {
            rng: Rng64::new(cfg.seed),
            cfg,
            bus: bus.clone(),
            inbox: bus.inbox(&[EventKind::SectionTransitionMidpoint]),
            next_id: 0,
            bodies: Vec::new(),
        }
    }

    pub fn bodies(&self) -> &[LetterBody] {
        &self.bodies
    }

    /// Collider of the figure standing at `world`.
    pub fn figure_box(&self, world: &CharacterWorld) -> Aabb {
        let half = self.cfg.figure_half_extents;
        Aabb::new(world.position + DVec3::new(0.0, half.y, 0.0), half)
    }

    /// Spawn pending labels, then step every body by `dt`.
    ///
    /// `obstacles` are tracked colliders in addition to the figure.
    pub fn update(&mut self, dt: f64, world: &CharacterWorld, obstacles: &[Aabb]) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        for ev in self.inbox.drain() {
            if let ChoreoEvent::SectionTransitionMidpoint { to, start, end } = ev {
                self.spawn(to, start, end);
            }
        }
        if self.bodies.is_empty() {
            return;
        }

        let figure = self.figure_box(world);
        let mut retired = Vec::new();
        for i in 0..self.bodies.len() {
            let bounds = Aabb::new(self.bodies[i].position, self.cfg.half_extents);
            let touched = !self.bodies[i].hit
                && (bounds.overlaps(&figure) || obstacles.iter().any(|o| bounds.overlaps(o)));
            if touched {
                self.knock(i);
            }

            let cfg = &self.cfg;
            let body = &mut self.bodies[i];
            body.age += dt;
            if !body.fading && body.age > cfg.auto_fade_secs {
                body.fading = true;
            }
            integrate(body, cfg.gravity, dt);
            if body.fading {
                body.opacity = (body.opacity - dt * cfg.fade_per_sec).max(0.0);
                if body.opacity <= 0.0 {
                    retired.push(body.id);
                }
            }
        }

        if !retired.is_empty() {
            self.bodies.retain(|b| !retired.contains(&b.id));
            for id in retired {
                self.bus.publish(ChoreoEvent::LetterRetired { id });
            }
        }
    }

    fn spawn(&mut self, to: SectionId, start: DVec3, end: DVec3) {
        let Some(label) = self.cfg.labels.get(&to) else {
            tracing::trace!(section = %to, "no label for section");
            return;
        };
        let chars: Vec<char> = label.chars().collect();
        let peak = (start + end) * 0.5 + DVec3::new(0.0, self.cfg.peak_lift, 0.0);
        let left = peak.x - chars.len() as f64 * self.cfg.spacing / 2.0;

        let mut spawned = Vec::with_capacity(chars.len());
        for (i, glyph) in chars.into_iter().enumerate() {
            if glyph.is_whitespace() {
                continue;
            }
            let id = LetterId(self.next_id);
            self.next_id += 1;
            self.bodies.push(LetterBody {
                id,
                glyph,
                section: to,
                position: DVec3::new(left + i as f64 * self.cfg.spacing, peak.y, peak.z),
                rotation: DVec3::ZERO,
                linear_velocity: DVec3::ZERO,
                angular_velocity: DVec3::ZERO,
                gravity_scale: 0.0,
                damping: self.cfg.idle_damping,
                age: 0.0,
                opacity: 1.0,
                hit: false,
                fading: false,
            });
            spawned.push((id, glyph));
        }
        tracing::debug!(section = %to, count = spawned.len(), "letters spawned");
        for (id, glyph) in spawned {
            self.bus.publish(ChoreoEvent::LetterSpawned { id, glyph });
        }
    }

    fn knock(&mut self, i: usize) {
        let impulse = DVec3::new(
            self.rng.symmetric(2.0),
            self.rng.range(2.0, 5.0),
            self.rng.symmetric(1.5),
        );
        let torque = DVec3::new(
            self.rng.symmetric(2.5),
            self.rng.symmetric(2.5),
            self.rng.symmetric(2.5),
        );
        let body = &mut self.bodies[i];
        body.hit = true;
        body.fading = true;
        body.gravity_scale = 1.0;
        body.damping = self.cfg.hit_damping;
        body.linear_velocity += impulse;
        body.angular_velocity += torque;
    }

    /// Stop spawning and remove every body without publishing retirements.
    pub fn teardown(&mut self) {
        self.inbox.close();
        self.bodies.clear();
    }
}

/// Semi-implicit Euler step with velocity damping `v / (1 + dt·c)`.
fn integrate(body: &mut LetterBody, gravity: f64, dt: f64) {
    body.linear_velocity.y += gravity * body.gravity_scale * dt;
    let keep = 1.0 / (1.0 + dt * body.damping);
    body.linear_velocity *= keep;
    body.angular_velocity *= keep;
    body.position += body.linear_velocity * dt;
    body.rotation += body.angular_velocity * dt;
}

#[cfg(test)]
#[path = "../tests/unit/letters.rs"]
mod tests;
