use std::rc::Rc;

use crate::{clips::catalog::ClipCatalog, foundation::core::DVec3};

/// How an action behaves when its local time reaches the clip end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    /// Play once and hold the last frame.
    Once,
    /// Loop; `None` repeats indefinitely.
    Repeat { repetitions: Option<u32> },
}

/// Root transform of the figure for one frame.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct Placement {
    pub position: DVec3,
    pub rotation_y: f64,
    pub scale: f64,
}

/// One weighted clip sample sent to the rig.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PoseLayer {
    pub clip: String,
    /// Local clip time in seconds.
    pub time: f64,
    /// Effective blend weight in `[0, 1]`.
    pub weight: f64,
}

/// Host renderer handle for the skinned figure.
pub trait Rig {
    /// Set the figure's root transform.
    fn place(&mut self, placement: &Placement);
    /// Pose the skeleton from blended clip layers.
    fn pose(&mut self, layers: &[PoseLayer]);
    /// Remove residual horizontal and depth translation from the model root.
    fn zero_root_drift(&mut self);
}

/// Rig that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRig;

impl Rig for NullRig {
    fn place(&mut self, _placement: &Placement) {}
    fn pose(&mut self, _layers: &[PoseLayer]) {}
    fn zero_root_drift(&mut self) {}
}

#[derive(Clone, Copy, Debug)]
struct Fade {
    from: f64,
    to: f64,
    duration: f64,
    elapsed: f64,
}

impl Fade {
    fn value(&self) -> f64 {
        if self.duration <= 0.0 {
            return self.to;
        }
        let t = (self.elapsed / self.duration).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * t
    }

    fn is_done(&self) -> bool {
        self.elapsed >= self.duration
    }
}

#[derive(Clone, Debug)]
struct Action {
    name: String,
    duration: f64,
    time: f64,
    time_scale: f64,
    weight: f64,
    envelope: f64,
    fade: Option<Fade>,
    fading_out: bool,
    loop_mode: LoopMode,
    loops_done: u32,
    finished: bool,
    enabled: bool,
}

impl Action {
    fn new(name: String, duration: f64) -> Self {
        Self {
            name,
            duration,
            time: 0.0,
            time_scale: 1.0,
            weight: 1.0,
            envelope: 0.0,
            fade: None,
            fading_out: false,
            loop_mode: LoopMode::Repeat { repetitions: None },
            loops_done: 0,
            finished: false,
            enabled: false,
        }
    }

    fn reset(&mut self) {
        self.time = 0.0;
        self.loops_done = 0;
        self.finished = false;
        self.fading_out = false;
        self.fade = None;
        self.enabled = true;
    }

    fn effective_weight(&self) -> f64 {
        if self.enabled {
            self.weight * self.envelope
        } else {
            0.0
        }
    }

    fn fade_to(&mut self, to: f64, duration: f64) {
        let fade = Fade {
            from: self.envelope,
            to,
            duration: duration.max(0.0),
            elapsed: 0.0,
        };
        self.envelope = fade.value();
        self.fade = (!fade.is_done()).then_some(fade);
        if self.fade.is_none() && to <= 0.0 {
            self.enabled = false;
        }
    }

    fn step_fade(&mut self, dt: f64) {
        let Some(fade) = self.fade.as_mut() else {
            return;
        };
        fade.elapsed += dt;
        self.envelope = fade.value();
        if fade.is_done() {
            self.fade = None;
            if self.fading_out {
                self.enabled = false;
            }
        }
    }

    /// Advance local time; returns `true` when the action just finished.
    fn step_time(&mut self, dt: f64) -> bool {
        if self.finished {
            return false;
        }
        self.time += dt * self.time_scale.max(0.0);
        if self.time < self.duration {
            return false;
        }
        match self.loop_mode {
            LoopMode::Once => {
                self.time = self.duration;
                self.finished = true;
                true
            }
            LoopMode::Repeat { repetitions } => {
                let wraps = (self.time / self.duration).floor() as u32;
                self.loops_done = self.loops_done.saturating_add(wraps);
                match repetitions {
                    Some(n) if self.loops_done >= n => {
                        self.time = self.duration;
                        self.finished = true;
                        true
                    }
                    _ => {
                        self.time %= self.duration;
                        false
                    }
                }
            }
        }
    }
}

/// Blends catalog clips onto a [`Rig`]: one action per clip, at most one active.
#[derive(Debug)]
pub struct SkeletalPlayer {
    catalog: Rc<ClipCatalog>,
    actions: Vec<Action>,
    active: Option<usize>,
}

impl SkeletalPlayer {
    pub fn new(catalog: Rc<ClipCatalog>) -> Self {
        let actions = catalog
            .names()
            .filter_map(|name| {
                let data = catalog.get(name)?;
                Some(Action::new(name.to_owned(), data.duration))
            })
            .collect();
        Self {
            catalog,
            actions,
            active: None,
        }
    }

    pub fn catalog(&self) -> &ClipCatalog {
        &self.catalog
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.actions.iter().position(|a| a.name == name)
    }

    /// Name of the active clip.
    pub fn active_clip(&self) -> Option<&str> {
        self.active.map(|i| self.actions[i].name.as_str())
    }

    /// Play `name` immediately at full weight, replacing whatever was playing.
    pub fn start(&mut self, name: &str) -> bool {
        let Some(idx) = self.index_of(name) else {
            tracing::trace!(clip = name, "start: unknown clip");
            return false;
        };
        for a in &mut self.actions {
            a.enabled = false;
            a.fade = None;
            a.envelope = 0.0;
        }
        let a = &mut self.actions[idx];
        a.reset();
        a.time_scale = 1.0;
        a.weight = 1.0;
        a.envelope = 1.0;
        self.active = Some(idx);
        true
    }

    /// Fade from the active clip to `name` over `duration` seconds.
    ///
    /// Unknown targets and an idle player are silent no-ops; returns whether anything changed.
    pub fn cross_fade_to(&mut self, name: &str, duration: f64) -> bool {
        let Some(idx) = self.index_of(name) else {
            tracing::trace!(clip = name, "crossfade: unknown clip");
            return false;
        };
        let Some(prev) = self.active else {
            tracing::trace!(clip = name, "crossfade: nothing active");
            return false;
        };

        let target = &mut self.actions[idx];
        target.reset();
        target.time_scale = 1.0;
        target.weight = 1.0;
        if prev == idx {
            target.envelope = 1.0;
            return true;
        }
        target.envelope = 0.0;
        target.fade_to(1.0, duration);

        let previous = &mut self.actions[prev];
        previous.fading_out = true;
        previous.fade_to(0.0, duration);

        self.active = Some(idx);
        true
    }

    /// Set the loop mode of `name`, if known.
    pub fn set_loop_mode(&mut self, name: &str, mode: LoopMode) -> bool {
        let Some(idx) = self.index_of(name) else {
            tracing::trace!(clip = name, "set_loop_mode: unknown clip");
            return false;
        };
        self.actions[idx].loop_mode = mode;
        true
    }

    /// Time scale of the active action; 0 when nothing is active.
    pub fn time_scale(&self) -> f64 {
        self.active.map_or(0.0, |i| self.actions[i].time_scale)
    }

    /// Set the time scale of the active action.
    pub fn set_time_scale(&mut self, scale: f64) {
        if !scale.is_finite() {
            return;
        }
        if let Some(i) = self.active {
            self.actions[i].time_scale = scale;
        }
    }

    /// Local time of `name`, if it is playing.
    pub fn clip_time(&self, name: &str) -> Option<f64> {
        self.index_of(name)
            .map(|i| &self.actions[i])
            .filter(|a| a.enabled)
            .map(|a| a.time)
    }

    /// Effective blend weight of `name`.
    pub fn clip_weight(&self, name: &str) -> f64 {
        self.index_of(name)
            .map_or(0.0, |i| self.actions[i].effective_weight())
    }

    /// Step every enabled action by `dt` seconds and pose `rig`.
    ///
    /// Returns the clips that finished during this step. Actions that are fading
    /// out never report.
    pub fn advance(&mut self, dt: f64, rig: &mut dyn Rig) -> Vec<String> {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let mut finished = Vec::new();
        for action in self.actions.iter_mut().filter(|a| a.enabled) {
            let fading_out = action.fading_out;
            action.step_fade(dt);
            if action.step_time(dt) && !fading_out {
                finished.push(action.name.clone());
            }
        }

        let layers: Vec<PoseLayer> = self
            .actions
            .iter()
            .filter(|a| a.effective_weight() > 0.0)
            .map(|a| PoseLayer {
                clip: a.name.clone(),
                time: a.time,
                weight: a.effective_weight(),
            })
            .collect();
        rig.pose(&layers);
        rig.zero_root_drift();
        finished
    }

    /// Stop and disable every action.
    pub fn stop_all(&mut self) {
        for a in &mut self.actions {
            a.enabled = false;
            a.fade = None;
            a.envelope = 0.0;
            a.finished = false;
        }
        self.active = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/clips/player.rs"]
mod tests;
