use crate::foundation::core::{DVec3, Point, SectionId};

/// Narrative phase of the figure. Exactly one is active at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Seated on the loading caption.
    Sitting,
    /// Jumping from the caption down onto the loading bar.
    Jumping,
    /// Running along the loading bar.
    Loading,
    /// Entrance clip toward the hero mark.
    HeroEntrance,
    /// Landing into the hero anchor.
    HeroLanding,
    /// Idling at the current section's anchor.
    Idle,
    /// Travelling between two sections (includes the landing sub-phase).
    Swinging,
    /// Climbing into the experience section.
    ExperienceEntry,
    /// Riding the rope through the experience section.
    ExperienceRiding,
}

impl Phase {
    /// Every phase.
    pub const ALL: [Phase; 9] = [
        Self::Sitting,
        Self::Jumping,
        Self::Loading,
        Self::HeroEntrance,
        Self::HeroLanding,
        Self::Idle,
        Self::Swinging,
        Self::ExperienceEntry,
        Self::ExperienceRiding,
    ];

    /// Whether the documented transition table contains `self -> to`.
    pub fn can_transition_to(self, to: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, to),
            (Sitting, Jumping)
                | (Jumping, Loading)
                | (Loading, HeroEntrance)
                | (HeroEntrance, HeroLanding)
                | (HeroLanding, Idle)
                | (Idle, Swinging)
                | (Idle, ExperienceEntry)
                | (Swinging, Idle)
                | (ExperienceEntry, ExperienceRiding)
                | (ExperienceRiding, Swinging)
        )
    }
}

/// Phase-machine state shared with the player, renderer and text effects.
#[derive(Clone, Debug, serde::Serialize)]
pub struct AnimationState {
    /// Current phase.
    pub phase: Phase,
    /// Clip currently driving the skeleton, if any.
    pub active_clip: Option<String>,
    /// Loader progress in `[0, 100]`; never decreases.
    pub load_progress: f64,
    /// Section the current or last transition is heading to.
    pub target_section: SectionId,
    /// Section the figure lands on after the current transition.
    pub landing_section: Option<SectionId>,
    /// Guard: a transition is in flight.
    pub is_swinging: bool,
    /// Figure scale fitted to the loading caption.
    ///
    /// Written once during `Sitting`, used through `Jumping` and `Loading`, and
    /// ignored once the hero landing completes.
    pub loading_scale: Option<f64>,
    /// The figure model finished loading.
    pub figure_ready: bool,
    /// The loading sequence completed.
    pub site_ready: bool,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            phase: Phase::Sitting,
            active_clip: None,
            load_progress: 0.0,
            target_section: SectionId::Hero,
            landing_section: None,
            is_swinging: false,
            loading_scale: None,
            figure_ready: false,
            site_ready: false,
        }
    }
}

impl AnimationState {
    /// Record a loader value, keeping progress monotonic and within `[0, 100]`.
    pub fn record_load_progress(&mut self, percent: f64) {
        if !percent.is_finite() {
            return;
        }
        self.load_progress = self.load_progress.max(percent.clamp(0.0, 100.0));
    }
}

/// The figure projected onto the screen, written once per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct CharacterScreen {
    /// Screen position in CSS pixels; `None` until the first projection.
    pub point: Option<Point>,
    /// The figure is travelling this frame.
    pub moving: bool,
}

impl CharacterScreen {
    /// Screen position when the figure is both projected and moving.
    pub fn active_point(&self) -> Option<Point> {
        self.point.filter(|_| self.moving)
    }
}

/// The figure's placement in world space, written once per frame.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct CharacterWorld {
    /// World position of the figure's root.
    pub position: DVec3,
    /// Heading around the vertical axis, radians.
    pub rotation_y: f64,
    /// Uniform scale.
    pub scale: f64,
}

impl Default for CharacterWorld {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            rotation_y: 0.0,
            scale: 1.0,
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/state.rs"]
mod tests;
