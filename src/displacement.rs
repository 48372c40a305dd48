//! Per-glyph text deformation driven by the figure's projected screen position.
//!
//! Two layers are composed onto every glyph: a transient proximity push that
//! springs back after a hang time, and a scatter pose tweened in when the
//! figure lands on the container's section and tweened out when it leaves.

use std::collections::BTreeMap;

use crate::{
    animation::tween::{Lerp, Timeline, Tween},
    bus::{ChoreoEvent, EventBus, EventKind, Inbox},
    config::DisplacementConfig,
    foundation::core::{GlyphId, Point, Rect, SectionId, Vec2},
    state::CharacterScreen,
};

/// Visual state written to one glyph.
///
/// Only transform, opacity and filter-like values; never layout.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct GlyphStyle {
    /// Offset from the glyph's rest position, in pixels.
    pub translate: Vec2,
    /// In-plane rotation, degrees.
    pub rotation_deg: f64,
    /// Tilt around the horizontal axis, degrees.
    pub tilt_x_deg: f64,
    /// Tilt around the vertical axis, degrees.
    pub tilt_y_deg: f64,
    pub scale: f64,
    pub opacity: f64,
    pub glow_radius_px: f64,
    pub glow_alpha: f64,
    /// Accent tint applied when the figure is touching the glyph.
    pub touched: bool,
}

impl GlyphStyle {
    /// Untouched glyph.
    pub const REST: GlyphStyle = GlyphStyle {
        translate: Vec2::ZERO,
        rotation_deg: 0.0,
        tilt_x_deg: 0.0,
        tilt_y_deg: 0.0,
        scale: 1.0,
        opacity: 1.0,
        glow_radius_px: 0.0,
        glow_alpha: 0.0,
        touched: false,
    };

    pub fn is_rest(&self) -> bool {
        *self == Self::REST
    }
}

impl Default for GlyphStyle {
    fn default() -> Self {
        Self::REST
    }
}

impl Lerp for GlyphStyle {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        let f = |x: f64, y: f64| x + (y - x) * t;
        Self {
            translate: <Vec2 as Lerp>::lerp(&a.translate, &b.translate, t),
            rotation_deg: f(a.rotation_deg, b.rotation_deg),
            tilt_x_deg: f(a.tilt_x_deg, b.tilt_x_deg),
            tilt_y_deg: f(a.tilt_y_deg, b.tilt_y_deg),
            scale: f(a.scale, b.scale),
            opacity: f(a.opacity, b.opacity),
            glow_radius_px: f(a.glow_radius_px, b.glow_radius_px).max(0.0),
            glow_alpha: f(a.glow_alpha, b.glow_alpha).clamp(0.0, 1.0),
            touched: if t < 1.0 { a.touched } else { b.touched },
        }
    }
}

/// Host text container whose glyphs are individually styleable.
pub trait GlyphSurface {
    /// Container rectangle in viewport pixels.
    fn container_rect(&self) -> Option<Rect>;
    /// Glyphs currently rendered, in reading order.
    fn glyphs(&self) -> Vec<GlyphId>;
    /// Rendered rectangle of `glyph`, including any applied translation.
    fn glyph_rect(&self, glyph: GlyphId) -> Option<Rect>;
    /// Write `style` to `glyph`.
    fn apply_style(&mut self, glyph: GlyphId, style: &GlyphStyle);
}

/// Proximity-push bookkeeping for one glyph, created on its first hit.
#[derive(Clone, Debug)]
pub struct LetterDisplacementState {
    /// Displaced and not yet fully restored.
    pub hit: bool,
    /// Engine clock at the most recent hit, milliseconds.
    pub hit_time_ms: f64,
    /// A spring-back tween is running.
    pub springing: bool,
    style: GlyphStyle,
    spring: Option<Tween<GlyphStyle>>,
}

/// Scatter layer pose of one glyph.
#[derive(Clone, Copy, Debug, PartialEq)]
struct ScatterPose {
    offset: Vec2,
    rotation_deg: f64,
    opacity: f64,
}

impl ScatterPose {
    const REST: ScatterPose = ScatterPose {
        offset: Vec2::ZERO,
        rotation_deg: 0.0,
        opacity: 1.0,
    };
}

impl Lerp for ScatterPose {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            offset: <Vec2 as Lerp>::lerp(&a.offset, &b.offset, t),
            rotation_deg: a.rotation_deg + (b.rotation_deg - a.rotation_deg) * t,
            opacity: (a.opacity + (b.opacity - a.opacity) * t).clamp(0.0, 1.0),
        }
    }
}

fn compose(push: &GlyphStyle, scatter: &ScatterPose) -> GlyphStyle {
    GlyphStyle {
        translate: push.translate + scatter.offset,
        rotation_deg: push.rotation_deg + scatter.rotation_deg,
        opacity: push.opacity * scatter.opacity,
        ..*push
    }
}

/// Displacement engine for one text container.
pub struct TextDisplacement {
    section: SectionId,
    cfg: DisplacementConfig,
    surface: Box<dyn GlyphSurface>,
    inbox: Inbox,
    now_ms: f64,
    letters: BTreeMap<GlyphId, LetterDisplacementState>,
    scatter: BTreeMap<GlyphId, ScatterPose>,
    timeline: Option<Timeline<GlyphId, ScatterPose>>,
    /// Translation last written to each glyph.
    written: BTreeMap<GlyphId, Vec2>,
}

impl std::fmt::Debug for TextDisplacement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextDisplacement")
            .field("section", &self.section)
            .field("displaced", &self.letters.len())
            .field("timeline", &self.timeline.is_some())
            .finish_non_exhaustive()
    }
}

impl TextDisplacement {
    pub fn new(
        section: SectionId,
        surface: Box<dyn GlyphSurface>,
        cfg: DisplacementConfig,
        bus: &EventBus,
    ) -> Self {
        Self {
            section,
            cfg,
            surface,
            inbox: bus.inbox(&[EventKind::LandedOnSection, EventKind::PickedUpFromSection]),
            now_ms: 0.0,
            letters: BTreeMap::new(),
            scatter: BTreeMap::new(),
            timeline: None,
            written: BTreeMap::new(),
        }
    }

    pub fn section(&self) -> SectionId {
        self.section
    }

    /// Push bookkeeping of `glyph`, if it is currently displaced.
    pub fn letter_state(&self, glyph: GlyphId) -> Option<&LetterDisplacementState> {
        self.letters.get(&glyph)
    }

    /// `true` while a scatter or regroup timeline is running.
    pub fn has_timeline(&self) -> bool {
        self.timeline.is_some()
    }

    pub fn update(&mut self, dt: f64, screen: CharacterScreen) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.now_ms += dt * 1000.0;
        let mut dirty: Vec<GlyphId> = Vec::new();

        for ev in self.inbox.drain() {
            match ev {
                ChoreoEvent::LandedOnSection { section } if section == self.section => {
                    self.start_scatter();
                }
                ChoreoEvent::PickedUpFromSection { section } if section == self.section => {
                    self.start_regroup();
                }
                _ => {}
            }
        }

        if let Some(timeline) = self.timeline.as_mut() {
            let scatter = &mut self.scatter;
            timeline.advance(dt, |glyph, pose| {
                scatter.insert(glyph, pose);
                dirty.push(glyph);
            });
            if timeline.is_finished() {
                self.timeline = None;
                self.scatter.retain(|_, pose| *pose != ScatterPose::REST);
            }
        }

        self.advance_springs(dt, &mut dirty);
        if let Some(point) = screen.active_point() {
            self.push_from(point, &mut dirty);
        }
        self.start_springs(&mut dirty);

        dirty.sort_unstable();
        dirty.dedup();
        for glyph in dirty {
            self.emit(glyph);
        }
    }

    fn emit(&mut self, glyph: GlyphId) {
        let push = self
            .letters
            .get(&glyph)
            .map_or(GlyphStyle::REST, |s| s.style);
        let scatter = self
            .scatter
            .get(&glyph)
            .copied()
            .unwrap_or(ScatterPose::REST);
        let style = compose(&push, &scatter);
        if style.translate == Vec2::ZERO {
            self.written.remove(&glyph);
        } else {
            self.written.insert(glyph, style.translate);
        }
        self.surface.apply_style(glyph, &style);
    }

    fn applied_offset(&self, glyph: GlyphId) -> Vec2 {
        self.written.get(&glyph).copied().unwrap_or(Vec2::ZERO)
    }

    fn push_from(&mut self, point: Point, dirty: &mut Vec<GlyphId>) {
        let Some(container) = self.surface.container_rect() else {
            return;
        };
        let radius = self.cfg.radius_px;
        if !container.inflate(radius, radius).contains(point) {
            return;
        }

        for glyph in self.surface.glyphs() {
            let Some(rect) = self.surface.glyph_rect(glyph) else {
                continue;
            };
            let rest = rect.center() - self.applied_offset(glyph);
            let delta = rest - point;
            let dist = delta.hypot();
            if !(dist > 0.1 && dist < radius) {
                continue;
            }

            let force = (1.0 - dist / radius).powi(2);
            let n = delta / dist;
            let cfg = &self.cfg;
            let style = GlyphStyle {
                translate: n * (force * cfg.max_push_px),
                rotation_deg: if delta.x > 0.0 { 1.0 } else { -1.0 } * force * cfg.max_rotation_deg,
                tilt_x_deg: -n.y * force * cfg.tilt_x_deg,
                tilt_y_deg: n.x * force * cfg.tilt_y_deg,
                scale: 1.0 + force * cfg.scale_pop,
                opacity: cfg.min_opacity + (1.0 - cfg.min_opacity) * (1.0 - force),
                glow_radius_px: force * cfg.glow_radius_px,
                glow_alpha: force * cfg.glow_alpha,
                touched: force > cfg.touch_threshold,
            };

            let now = self.now_ms;
            let state = self
                .letters
                .entry(glyph)
                .or_insert_with(|| LetterDisplacementState {
                    hit: false,
                    hit_time_ms: now,
                    springing: false,
                    style: GlyphStyle::REST,
                    spring: None,
                });
            state.spring = None;
            state.springing = false;
            state.style = style;
            state.hit = true;
            state.hit_time_ms = now;
            dirty.push(glyph);
        }
    }

    fn start_springs(&mut self, dirty: &mut Vec<GlyphId>) {
        let now = self.now_ms;
        for (glyph, state) in &mut self.letters {
            if state.hit && !state.springing && now - state.hit_time_ms > self.cfg.hang_ms {
                state.springing = true;
                state.spring = Some(Tween::new(
                    state.style,
                    GlyphStyle::REST,
                    self.cfg.spring_secs,
                    self.cfg.spring_ease,
                ));
                dirty.push(*glyph);
            }
        }
    }

    fn advance_springs(&mut self, dt: f64, dirty: &mut Vec<GlyphId>) {
        let mut settled = Vec::new();
        for (glyph, state) in &mut self.letters {
            let Some(spring) = state.spring.as_mut() else {
                continue;
            };
            spring.advance(dt);
            state.style = spring.value();
            dirty.push(*glyph);
            if spring.is_finished() {
                settled.push(*glyph);
            }
        }
        for glyph in settled {
            self.letters.remove(&glyph);
        }
    }

    fn ordered_by_distance(&self) -> Vec<(GlyphId, f64, f64)> {
        let centers: Vec<(GlyphId, Point)> = self
            .surface
            .glyphs()
            .into_iter()
            .filter_map(|g| {
                let rect = self.surface.glyph_rect(g)?;
                Some((g, rect.center() - self.applied_offset(g)))
            })
            .collect();
        let origin = match self.surface.container_rect() {
            Some(r) => r.center(),
            None if !centers.is_empty() => {
                let sum = centers
                    .iter()
                    .fold(Vec2::ZERO, |acc, (_, p)| acc + p.to_vec2());
                (sum / centers.len() as f64).to_point()
            }
            None => Point::ZERO,
        };
        let mut out: Vec<(GlyphId, f64, f64)> = centers
            .into_iter()
            .map(|(g, p)| (g, (p - origin).hypot(), p.x - origin.x))
            .collect();
        out.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        out
    }

    /// Drop glyphs into the landed pose, nearest to the center first.
    fn start_scatter(&mut self) {
        let order = self.ordered_by_distance();
        let sc = self.cfg.scatter;
        let targets: BTreeMap<GlyphId, ScatterPose> = order
            .iter()
            .enumerate()
            .map(|(i, &(g, _, dx))| {
                let ring = (i % 3) as f64;
                let side = if dx < 0.0 { -1.0 } else { 1.0 };
                let pose = ScatterPose {
                    offset: Vec2::new(0.0, sc.drop_px + ring * sc.drop_jitter_px),
                    rotation_deg: side * sc.rotation_deg,
                    opacity: sc.opacity,
                };
                (g, pose)
            })
            .collect();
        let current = &self.scatter;
        tracing::trace!(section = %self.section, glyphs = order.len(), "scatter");
        self.timeline = Some(Timeline::staggered(
            order.iter().map(|&(g, _, _)| g),
            sc.stagger_secs,
            sc.duration_secs,
            sc.ease,
            |g| {
                let from = current.get(&g).copied().unwrap_or(ScatterPose::REST);
                let to = targets.get(&g).copied().unwrap_or(ScatterPose::REST);
                (from, to)
            },
        ));
    }

    /// Spring glyphs back to rest, outer edges first.
    fn start_regroup(&mut self) {
        let mut order = self.ordered_by_distance();
        order.reverse();
        let sc = self.cfg.scatter;
        let current = &self.scatter;
        tracing::trace!(section = %self.section, glyphs = order.len(), "regroup");
        self.timeline = Some(Timeline::staggered(
            order.iter().map(|&(g, _, _)| g),
            sc.regroup_stagger_secs,
            sc.regroup_secs,
            sc.regroup_ease,
            |g| {
                let from = current.get(&g).copied().unwrap_or(ScatterPose::REST);
                (from, ScatterPose::REST)
            },
        ));
    }

    /// Kill every tween and restore every glyph to rest.
    pub fn teardown(&mut self) {
        self.timeline = None;
        self.letters.clear();
        self.scatter.clear();
        self.written.clear();
        for glyph in self.surface.glyphs() {
            self.surface.apply_style(glyph, &GlyphStyle::REST);
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/displacement.rs"]
mod tests;
