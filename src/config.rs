//! Tunable constants for every component, loadable from JSON.
//!
//! Every field has a default matching the shipped site, so a config file only needs
//! to list the values it overrides.

use std::{collections::BTreeMap, path::Path};

use crate::{
    animation::ease::Ease,
    foundation::{
        core::{DVec3, SectionId},
        error::{ChoreoError, ChoreoResult},
    },
};

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Complete engine configuration.
pub struct ChoreoConfig {
    /// Camera used for projection and unprojection.
    pub camera: CameraConfig,
    /// Figure dimensions and scales.
    pub figure: FigureConfig,
    /// Clip names used by each phase.
    pub clips: ClipNames,
    /// Phase-machine placement and timing.
    pub choreography: ChoreographyConfig,
    /// Built-in load sequencer.
    pub loader: LoaderConfig,
    /// Text displacement effects.
    pub displacement: DisplacementConfig,
    /// Proxy collision layer.
    pub proxies: ProxyConfig,
    /// Physics letter scatter.
    pub letters: LetterConfig,
}

impl ChoreoConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(s: &str) -> ChoreoResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON file.
    #[tracing::instrument]
    pub fn from_path(path: &Path) -> ChoreoResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ChoreoError::config(format!("cannot read '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Check static invariants.
    pub fn validate(&self) -> ChoreoResult<()> {
        let cam = &self.camera;
        finite_vec("camera.position", cam.position)?;
        if !(cam.fov_deg.is_finite() && cam.fov_deg > 0.0 && cam.fov_deg < 180.0) {
            return Err(ChoreoError::validation("camera.fov_deg must be in (0, 180)"));
        }

        let fig = &self.figure;
        positive("figure.scale", fig.scale)?;
        positive("figure.embedded_scale", fig.embedded_scale)?;
        positive("figure.model_height", fig.model_height)?;
        positive("figure.caption_height_ratio", fig.caption_height_ratio)?;
        unit("figure.seat_fraction", fig.seat_fraction)?;

        non_negative("clips.crossfade_secs", self.clips.crossfade_secs)?;
        non_negative("clips.idle_crossfade_secs", self.clips.idle_crossfade_secs)?;

        let ch = &self.choreography;
        for section in SectionId::ALL {
            let anchor = ch.sections.get(&section).ok_or_else(|| {
                ChoreoError::validation(format!("choreography.sections is missing '{section}'"))
            })?;
            finite_vec("choreography.sections.position", anchor.position)?;
        }
        positive("choreography.sitting_fallback_secs", ch.sitting_fallback_secs)?;
        positive("choreography.jump_speed", ch.jump_speed)?;
        positive("choreography.swing_speed", ch.swing_speed)?;
        positive("choreography.max_load_time_scale", ch.max_load_time_scale)?;
        positive("choreography.climb_speed_divisor", ch.climb_speed_divisor)?;
        if !(ch.loading_x_range[0].is_finite() && ch.loading_x_range[1].is_finite()) {
            return Err(ChoreoError::validation(
                "choreography.loading_x_range must be finite",
            ));
        }
        for (name, f) in [
            ("entrance_approach", ch.entrance_approach),
            ("idle_approach", ch.idle_approach),
            ("scale_restore", ch.scale_restore),
            ("swing_turn", ch.swing_turn),
            ("ride_follow", ch.ride_follow),
            ("ride_turn", ch.ride_turn),
            ("climb_decay", ch.climb_decay),
        ] {
            unit(&format!("choreography.{name}"), f)?;
        }

        let ld = &self.loader;
        positive("loader.duration_secs", ld.duration_secs)?;
        positive("loader.ready_fallback_secs", ld.ready_fallback_secs)?;
        non_negative("loader.jump_ack_fallback_secs", ld.jump_ack_fallback_secs)?;
        non_negative("loader.exit_delay_secs", ld.exit_delay_secs)?;

        let d = &self.displacement;
        positive("displacement.radius_px", d.radius_px)?;
        non_negative("displacement.max_push_px", d.max_push_px)?;
        non_negative("displacement.hang_ms", d.hang_ms)?;
        positive("displacement.spring_secs", d.spring_secs)?;
        unit("displacement.min_opacity", d.min_opacity)?;
        unit("displacement.scatter.opacity", d.scatter.opacity)?;
        positive("displacement.scatter.duration_secs", d.scatter.duration_secs)?;
        positive("displacement.scatter.regroup_secs", d.scatter.regroup_secs)?;
        for (name, e) in [
            ("spring_ease", d.spring_ease),
            ("scatter.ease", d.scatter.ease),
            ("scatter.regroup_ease", d.scatter.regroup_ease),
        ] {
            ease(&format!("displacement.{name}"), e)?;
        }

        let p = &self.proxies;
        non_negative("proxies.settle_secs", p.settle_secs)?;
        positive("proxies.ray_reach", p.ray_reach)?;
        non_negative("proxies.padding", p.padding)?;
        if (p.plane_z - cam.position.z).abs() < 1e-9 {
            return Err(ChoreoError::validation(
                "proxies.plane_z must differ from the camera depth",
            ));
        }

        let l = &self.letters;
        positive("letters.spacing", l.spacing)?;
        positive("letters.fade_per_sec", l.fade_per_sec)?;
        positive("letters.auto_fade_secs", l.auto_fade_secs)?;
        finite_vec("letters.half_extents", l.half_extents)?;
        finite_vec("letters.figure_half_extents", l.figure_half_extents)?;
        Ok(())
    }

    /// Anchor configured for `section`.
    ///
    /// Falls back to the hero anchor, then to the origin, so per-frame code never fails.
    pub fn anchor(&self, section: SectionId) -> Anchor {
        self.choreography
            .sections
            .get(&section)
            .or_else(|| self.choreography.sections.get(&SectionId::Hero))
            .copied()
            .unwrap_or_default()
    }
}

fn positive(field: &str, v: f64) -> ChoreoResult<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(ChoreoError::validation(format!(
            "{field} must be finite and > 0"
        )))
    }
}

fn non_negative(field: &str, v: f64) -> ChoreoResult<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(ChoreoError::validation(format!(
            "{field} must be finite and >= 0"
        )))
    }
}

fn unit(field: &str, v: f64) -> ChoreoResult<()> {
    if v.is_finite() && (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(ChoreoError::validation(format!("{field} must be in [0, 1]")))
    }
}

fn ease(field: &str, e: Ease) -> ChoreoResult<()> {
    match e {
        Ease::OutElastic { amplitude, period } if !(amplitude.is_finite() && period.is_finite() && period > 0.0) => {
            Err(ChoreoError::validation(format!(
                "{field} needs a finite amplitude and a period > 0"
            )))
        }
        _ => Ok(()),
    }
}

fn finite_vec(field: &str, v: DVec3) -> ChoreoResult<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(ChoreoError::validation(format!("{field} must be finite")))
    }
}

/// World placement target: position plus heading.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Anchor {
    /// World position.
    pub position: DVec3,
    /// Heading around the vertical axis, radians.
    #[serde(default)]
    pub rotation_y: f64,
}

impl Anchor {
    /// Build an anchor from components.
    pub const fn new(x: f64, y: f64, z: f64, rotation_y: f64) -> Self {
        Self {
            position: DVec3::new(x, y, z),
            rotation_y,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Perspective camera parameters.
pub struct CameraConfig {
    /// Camera position; the camera looks down -z.
    pub position: DVec3,
    /// Vertical field of view in degrees.
    pub fov_deg: f64,
    /// Near clip distance.
    pub near: f64,
    /// Far clip distance.
    pub far: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: DVec3::new(0.0, 0.0, 6.0),
            fov_deg: 50.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Figure dimensions.
pub struct FigureConfig {
    /// Normal uniform scale.
    pub scale: f64,
    /// Scale while embedded in the experience section.
    pub embedded_scale: f64,
    /// Unscaled model height in model units.
    pub model_height: f64,
    /// Seat height as a fraction of the figure height.
    pub seat_fraction: f64,
    /// Figure height relative to the loading caption's text height.
    pub caption_height_ratio: f64,
    /// World-space distance per frame above which the figure counts as moving.
    pub moving_epsilon: f64,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            scale: 0.012,
            embedded_scale: 0.006,
            model_height: 180.0,
            seat_fraction: 0.45,
            caption_height_ratio: 1.6,
            moving_epsilon: 1e-4,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Clip assigned to each choreography beat.
pub struct ClipNames {
    /// Seated loading-screen clip (keeps its root translation).
    pub seated: String,
    /// Traversal clip for the jump onto the loading bar.
    pub jump: String,
    /// Loading-bar run.
    pub run: String,
    /// Hero entrance.
    pub entrance: String,
    /// Landing after an entrance or forward swing.
    pub landing: String,
    /// Idle loop.
    pub idle: String,
    /// Forward section transition.
    pub forward: String,
    /// Backward section transition.
    pub backward: String,
    /// Climb into the experience section.
    pub experience_entry: String,
    /// Held grip pose while riding the experience section.
    pub experience_ride: String,
    /// Default crossfade duration.
    pub crossfade_secs: f64,
    /// Crossfade duration into the idle loop.
    pub idle_crossfade_secs: f64,
}

impl Default for ClipNames {
    fn default() -> Self {
        Self {
            seated: "sittingLaughing".to_owned(),
            jump: "jumpToFreehang".to_owned(),
            run: "running".to_owned(),
            entrance: "kneelingPointing".to_owned(),
            landing: "crouchToStand".to_owned(),
            idle: "lookOverShoulder".to_owned(),
            forward: "swinging".to_owned(),
            backward: "changeDirection".to_owned(),
            experience_entry: "jumpToFreehang".to_owned(),
            experience_ride: "ropeClimb".to_owned(),
            crossfade_secs: 0.4,
            idle_crossfade_secs: 0.5,
        }
    }
}

impl ClipNames {
    /// Every configured clip name, deduplicated.
    pub fn all(&self) -> Vec<&str> {
        let mut names = vec![
            self.seated.as_str(),
            self.jump.as_str(),
            self.run.as_str(),
            self.entrance.as_str(),
            self.landing.as_str(),
            self.idle.as_str(),
            self.forward.as_str(),
            self.backward.as_str(),
            self.experience_entry.as_str(),
            self.experience_ride.as_str(),
        ];
        names.sort_unstable();
        names.dedup();
        names
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Placement and timing of every phase.
pub struct ChoreographyConfig {
    /// Per-section idle anchors.
    pub sections: BTreeMap<SectionId, Anchor>,
    /// Seated anchor during the loading screen.
    pub seated: Anchor,
    /// Seconds after which sitting ends even without readiness signals.
    pub sitting_fallback_secs: f64,
    /// Landing point of the jump onto the loading bar.
    pub jump_end: DVec3,
    /// Jump parameter advance per second.
    pub jump_speed: f64,
    /// Jump arc height.
    pub jump_arc: f64,
    /// Heading at the end of the jump and while running.
    pub run_heading: f64,
    /// World x at 0% and 100% load.
    pub loading_x_range: [f64; 2],
    /// Loading lane height when no progress bar is laid out.
    pub loading_y: f64,
    /// Loading lane depth.
    pub loading_z: f64,
    /// Upper bound of the loading run's clip time scale.
    pub max_load_time_scale: f64,
    /// Entrance mark approached during the hero entrance.
    pub entrance_mark: Anchor,
    /// Per-frame approach factor during the hero entrance and landing.
    pub entrance_approach: f64,
    /// Per-frame approach factor while idle.
    pub idle_approach: f64,
    /// Per-frame approach factor restoring the normal scale.
    pub scale_restore: f64,
    /// Swing parameter advance per second.
    pub swing_speed: f64,
    /// Forward swing arc height.
    pub swing_arc: f64,
    /// Heading magnitude while swinging.
    pub swing_heading: f64,
    /// Per-frame heading approach while swinging or entering the experience section.
    pub swing_turn: f64,
    /// Rope-ride height at the top of the experience section.
    pub ride_top_y: f64,
    /// Rope-ride height at the bottom of the experience section.
    pub ride_bottom_y: f64,
    /// Rope-ride x.
    pub ride_x: f64,
    /// Rope-ride depth.
    pub ride_z: f64,
    /// Per-frame approach of the ride height.
    pub ride_follow: f64,
    /// Per-frame heading approach while riding.
    pub ride_turn: f64,
    /// Upward scroll speed (px/event) above which the climb clip plays.
    pub climb_velocity_threshold: f64,
    /// Scroll speed divisor for the climb clip time scale.
    pub climb_speed_divisor: f64,
    /// Maximum climb clip time scale.
    pub climb_max_rate: f64,
    /// Per-frame decay of the climb clip time scale.
    pub climb_decay: f64,
    /// Idle bob amplitude.
    pub bob_amplitude: f64,
    /// Idle bob angular frequency.
    pub bob_frequency: f64,
}

impl Default for ChoreographyConfig {
    fn default() -> Self {
        let sections = BTreeMap::from([
            (SectionId::Hero, Anchor::new(1.5, -1.6, 0.5, -0.3)),
            (SectionId::About, Anchor::new(-1.5, -1.6, 0.5, 0.4)),
            (SectionId::Experience, Anchor::new(0.0, -0.35, 0.5, 0.0)),
            (SectionId::Projects, Anchor::new(1.5, -1.6, 0.0, -0.5)),
            (SectionId::Contact, Anchor::new(0.0, -1.4, 1.0, 0.0)),
        ]);
        Self {
            sections,
            seated: Anchor::new(0.0, -0.3, 1.0, 0.0),
            sitting_fallback_secs: 6.0,
            jump_end: DVec3::new(-3.5, -2.0, 1.0),
            jump_speed: 1.2,
            jump_arc: 1.2,
            run_heading: std::f64::consts::FRAC_PI_2,
            loading_x_range: [-3.5, 3.5],
            loading_y: -2.0,
            loading_z: 1.0,
            max_load_time_scale: 3.0,
            entrance_mark: Anchor::new(3.0, -1.6, 0.5, -0.8),
            entrance_approach: 0.03,
            idle_approach: 0.025,
            scale_restore: 0.05,
            swing_speed: 0.7,
            swing_arc: 1.5,
            swing_heading: 0.5,
            swing_turn: 0.06,
            ride_top_y: 0.5,
            ride_bottom_y: -1.5,
            ride_x: 0.0,
            ride_z: 0.5,
            ride_follow: 0.08,
            ride_turn: 0.05,
            climb_velocity_threshold: 2.0,
            climb_speed_divisor: 10.0,
            climb_max_rate: 2.0,
            climb_decay: 0.1,
            bob_amplitude: 0.005,
            bob_frequency: 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Built-in load sequencer.
pub struct LoaderConfig {
    /// Drive load progress and site readiness from the engine.
    pub enabled: bool,
    /// Seconds for the counter to go from 0 to 100.
    pub duration_secs: f64,
    /// Seconds to wait for the figure-ready signal before arming anyway.
    pub ready_fallback_secs: f64,
    /// Seconds to wait for the jump to land once armed.
    pub jump_ack_fallback_secs: f64,
    /// Seconds between reaching 100 and publishing site ready.
    pub exit_delay_secs: f64,
}

impl LoaderConfig {
    /// Nominal fill rate in percent per second.
    pub fn nominal_fill_rate(&self) -> f64 {
        100.0 / self.duration_secs.max(1e-3)
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_secs: 2.5,
            ready_fallback_secs: 6.0,
            jump_ack_fallback_secs: 2.0,
            exit_delay_secs: 1.1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Proximity push and scatter/regroup parameters.
pub struct DisplacementConfig {
    /// Influence radius in pixels.
    pub radius_px: f64,
    /// Push at zero distance, in pixels.
    pub max_push_px: f64,
    /// Hang time before a displaced glyph springs back.
    pub hang_ms: f64,
    /// Spring-back duration.
    pub spring_secs: f64,
    /// Spring-back curve.
    pub spring_ease: Ease,
    /// In-plane rotation at full force, degrees.
    pub max_rotation_deg: f64,
    /// Tilt around x at full force, degrees.
    pub tilt_x_deg: f64,
    /// Tilt around y at full force, degrees.
    pub tilt_y_deg: f64,
    /// Extra scale at full force.
    pub scale_pop: f64,
    /// Opacity at full force.
    pub min_opacity: f64,
    /// Glow radius at full force, pixels.
    pub glow_radius_px: f64,
    /// Glow alpha at full force.
    pub glow_alpha: f64,
    /// Force above which glyphs take the touch tint.
    pub touch_threshold: f64,
    /// Landing scatter and pickup regroup.
    pub scatter: ScatterConfig,
}

impl Default for DisplacementConfig {
    fn default() -> Self {
        Self {
            radius_px: 150.0,
            max_push_px: 80.0,
            hang_ms: 500.0,
            spring_secs: 0.9,
            spring_ease: Ease::SPRING,
            max_rotation_deg: 25.0,
            tilt_x_deg: 15.0,
            tilt_y_deg: 20.0,
            scale_pop: 0.15,
            min_opacity: 0.3,
            glow_radius_px: 25.0,
            glow_alpha: 0.8,
            touch_threshold: 0.5,
            scatter: ScatterConfig::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Scattered pose and timing for landing/pickup effects.
pub struct ScatterConfig {
    /// Downward drop in pixels.
    pub drop_px: f64,
    /// Extra drop per ring of distance from the center, pixels.
    pub drop_jitter_px: f64,
    /// Rotation magnitude, degrees.
    pub rotation_deg: f64,
    /// Opacity of the scattered pose.
    pub opacity: f64,
    /// Scatter tween duration.
    pub duration_secs: f64,
    /// Scatter curve.
    pub ease: Ease,
    /// Delay between consecutive glyphs when scattering.
    pub stagger_secs: f64,
    /// Regroup tween duration.
    pub regroup_secs: f64,
    /// Regroup curve.
    pub regroup_ease: Ease,
    /// Delay between consecutive glyphs when regrouping.
    pub regroup_stagger_secs: f64,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            drop_px: 28.0,
            drop_jitter_px: 6.0,
            rotation_deg: 8.0,
            opacity: 0.35,
            duration_secs: 0.5,
            ease: Ease::OutQuad,
            stagger_secs: 0.025,
            regroup_secs: 0.9,
            regroup_ease: Ease::SPRING,
            regroup_stagger_secs: 0.02,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Proxy collision layer parameters.
pub struct ProxyConfig {
    /// Delay before text elements are collected.
    pub settle_secs: f64,
    /// Selectors queried once after settling.
    pub selectors: Vec<String>,
    /// Depth plane proxies live on.
    pub plane_z: f64,
    /// Padding added to proxy boxes for the overlap test.
    pub padding: f64,
    /// Maximum |z - plane_z| for an overlap.
    pub depth_threshold: f64,
    /// Depth of proxy boxes for raycasts.
    pub proxy_depth: f64,
    /// Ray reach.
    pub ray_reach: f64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            settle_secs: 2.0,
            selectors: [
                "#hero h1",
                "#about h2",
                "#about p",
                "#experience h2",
                "#projects h2",
                "#contact h1",
                "#contact h2",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
            plane_z: 0.5,
            padding: 0.3,
            depth_threshold: 1.0,
            proxy_depth: 0.3,
            ray_reach: 2.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Physics letter scatter parameters.
pub struct LetterConfig {
    /// Label spawned per destination section; sections without a label spawn nothing.
    pub labels: BTreeMap<SectionId, String>,
    /// Horizontal distance between letters.
    pub spacing: f64,
    /// Height of the arc peak above the chord midpoint.
    pub peak_lift: f64,
    /// Letter collider half-extents.
    pub half_extents: DVec3,
    /// Half-extents of the figure's collider.
    pub figure_half_extents: DVec3,
    /// Damping before a hit.
    pub idle_damping: f64,
    /// Damping after a hit.
    pub hit_damping: f64,
    /// Gravity acceleration along y.
    pub gravity: f64,
    /// Opacity lost per second once hit.
    pub fade_per_sec: f64,
    /// Seconds before an untouched letter starts fading.
    pub auto_fade_secs: f64,
    /// Seed for scatter impulses.
    pub seed: u64,
}

impl Default for LetterConfig {
    fn default() -> Self {
        Self {
            labels: BTreeMap::from([
                (SectionId::Hero, "HOME".to_owned()),
                (SectionId::About, "ABOUT".to_owned()),
                (SectionId::Projects, "PROJECTS".to_owned()),
                (SectionId::Contact, "CONTACT".to_owned()),
            ]),
            spacing: 0.28,
            peak_lift: 1.5,
            half_extents: DVec3::new(0.175, 0.175, 0.04),
            figure_half_extents: DVec3::new(0.3, 0.9, 0.3),
            idle_damping: 10.0,
            hit_damping: 0.5,
            gravity: -9.81,
            fade_per_sec: 0.5,
            auto_fade_secs: 3.0,
            seed: 0x5EED,
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
