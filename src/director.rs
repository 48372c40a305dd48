//! The figure's phase machine: narrative transitions plus per-frame placement.

use std::rc::Rc;

use crate::{
    bus::{ChoreoEvent, EventBus, EventKind, Inbox},
    clips::player::{LoopMode, Placement, Rig, SkeletalPlayer},
    config::{Anchor, ChoreoConfig},
    foundation::{
        core::{DVec3, Direction, Point, Rect, SectionId, Viewport},
        math::{approach, approach_vec, arc, lerp, smoothstep},
    },
    projection::Camera,
    state::{AnimationState, CharacterScreen, CharacterWorld, Phase},
    tracking::scroll::ScrollState,
};

/// Host geometry of the loading screen.
pub trait LoadingLayout {
    /// Rectangle of the caption the figure sits on, in CSS pixels.
    fn caption_rect(&self) -> Option<Rect>;
    /// Rectangle of the loading progress bar, in CSS pixels.
    fn progress_bar_rect(&self) -> Option<Rect>;
}

/// Per-frame inputs of [`Director::step`].
pub struct FrameInput<'a> {
    /// Seconds since the previous frame.
    pub dt: f64,
    /// Seconds since the stage started.
    pub elapsed: f64,
    pub scroll: ScrollState,
    pub viewport: Viewport,
    pub loading_layout: Option<&'a dyn LoadingLayout>,
}

/// Mutable collaborators the director drives during a step.
pub struct Cast<'a> {
    pub state: &'a mut AnimationState,
    pub player: &'a mut SkeletalPlayer,
    pub camera: &'a Camera,
    pub rig: &'a mut dyn Rig,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Swing {
    to: SectionId,
    direction: Direction,
    start: DVec3,
    end: DVec3,
    t: f64,
    travelling: bool,
    midpoint_sent: bool,
    /// The forward clip finished; the landing clip is playing.
    landing: bool,
    /// The travel clip never started; travel end stands in for its finish.
    clip_skipped: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum PhaseState {
    Sitting { elapsed: f64 },
    Jumping { t: f64, start: DVec3, start_rotation: f64 },
    Loading,
    HeroEntrance,
    HeroLanding,
    Idle,
    Swinging(Swing),
    ExperienceEntry {
        t: f64,
        start: DVec3,
        end: DVec3,
        travelling: bool,
        clip_skipped: bool,
    },
    ExperienceRiding,
}

impl PhaseState {
    fn phase(&self) -> Phase {
        match self {
            Self::Sitting { .. } => Phase::Sitting,
            Self::Jumping { .. } => Phase::Jumping,
            Self::Loading => Phase::Loading,
            Self::HeroEntrance => Phase::HeroEntrance,
            Self::HeroLanding => Phase::HeroLanding,
            Self::Idle => Phase::Idle,
            Self::Swinging(_) => Phase::Swinging,
            Self::ExperienceEntry { .. } => Phase::ExperienceEntry,
            Self::ExperienceRiding => Phase::ExperienceRiding,
        }
    }

    /// Travel phases never bob and always count as moving.
    fn is_travelling(&self) -> bool {
        match self {
            Self::Jumping { .. } => true,
            Self::Swinging(swing) => swing.travelling,
            Self::ExperienceEntry { travelling, .. } => *travelling,
            _ => false,
        }
    }

    fn bobs(&self) -> bool {
        !self.is_travelling()
            && !matches!(
                self,
                Self::Sitting { .. }
                    | Self::Jumping { .. }
                    | Self::ExperienceEntry { .. }
                    | Self::ExperienceRiding
            )
    }
}

/// Drives the figure through its narrative.
///
/// Signals arrive through a bus inbox and are applied at the start of [`Director::step`];
/// clip completions arrive through [`Director::on_clip_finished`].
pub struct Director {
    cfg: Rc<ChoreoConfig>,
    bus: EventBus,
    inbox: Inbox,
    state: PhaseState,
    prev_section: SectionId,
    seated_done: bool,
    pending_site_ready: bool,
    prev_load_progress: f64,
    position: DVec3,
    rotation_y: f64,
    scale: f64,
    world: CharacterWorld,
    screen: CharacterScreen,
    placed_once: bool,
}

impl std::fmt::Debug for Director {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Director")
            .field("state", &self.state)
            .field("prev_section", &self.prev_section)
            .field("world", &self.world)
            .finish_non_exhaustive()
    }
}

impl Director {
    pub fn new(cfg: Rc<ChoreoConfig>, bus: &EventBus) -> Self {
        let seated = cfg.choreography.seated;
        let scale = cfg.figure.scale;
        Self {
            cfg,
            bus: bus.clone(),
            inbox: bus.inbox(&[
                EventKind::FigureReady,
                EventKind::LoadProgress,
                EventKind::SiteReady,
            ]),
            state: PhaseState::Sitting { elapsed: 0.0 },
            prev_section: SectionId::Hero,
            seated_done: false,
            pending_site_ready: false,
            prev_load_progress: 0.0,
            position: seated.position,
            rotation_y: seated.rotation_y,
            scale,
            world: CharacterWorld {
                position: seated.position,
                rotation_y: seated.rotation_y,
                scale,
            },
            screen: CharacterScreen::default(),
            placed_once: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Placement written by the last step.
    pub fn world(&self) -> CharacterWorld {
        self.world
    }

    /// Projection written by the last step.
    pub fn screen(&self) -> CharacterScreen {
        self.screen
    }

    fn enter(&mut self, next: PhaseState, state: &mut AnimationState) {
        let from = self.state.phase();
        let to = next.phase();
        self.state = next;
        if from == to {
            return;
        }
        debug_assert!(from.can_transition_to(to), "{from:?} -> {to:?}");
        state.phase = to;
        tracing::debug!(?from, ?to, "phase transition");
        self.bus.publish(ChoreoEvent::PhaseChanged { from, to });
    }

    fn play(
        &self,
        clip: &str,
        mode: LoopMode,
        fade: f64,
        state: &mut AnimationState,
        player: &mut SkeletalPlayer,
    ) -> bool {
        player.set_loop_mode(clip, mode);
        let started = player.cross_fade_to(clip, fade);
        state.active_clip = player.active_clip().map(str::to_owned);
        started
    }

    /// Crossfade to a one-shot clip; returns whether it is playing.
    fn play_once(
        &self,
        clip: &str,
        state: &mut AnimationState,
        player: &mut SkeletalPlayer,
    ) -> bool {
        self.play(
            clip,
            LoopMode::Once,
            self.cfg.clips.crossfade_secs,
            state,
            player,
        )
    }

    fn play_idle(&self, state: &mut AnimationState, player: &mut SkeletalPlayer) {
        self.play(
            &self.cfg.clips.idle,
            LoopMode::Repeat { repetitions: None },
            self.cfg.clips.idle_crossfade_secs,
            state,
            player,
        );
    }

    /// Route a one-shot clip that could not start as if it had already finished,
    /// so a missing clip or an absent figure never stalls the narrative.
    fn skip_clip(&mut self, clip: &str, state: &mut AnimationState, player: &mut SkeletalPlayer) {
        tracing::trace!(clip, phase = ?self.phase(), "clip did not start; advancing");
        self.on_clip_finished(clip, state, player);
    }

    /// React to a one-shot clip reaching its end.
    pub fn on_clip_finished(
        &mut self,
        clip: &str,
        state: &mut AnimationState,
        player: &mut SkeletalPlayer,
    ) {
        let cfg = Rc::clone(&self.cfg);
        let names = &cfg.clips;
        match self.state {
            PhaseState::Sitting { .. } if clip == names.seated => {
                self.seated_done = true;
                self.bus.publish(ChoreoEvent::SeatedClipFinished);
            }
            PhaseState::HeroEntrance if clip == names.entrance => {
                let played = self.play_once(&names.landing, state, player);
                state.landing_section = Some(SectionId::Hero);
                self.enter(PhaseState::HeroLanding, state);
                if !played {
                    self.skip_clip(&names.landing, state, player);
                }
            }
            PhaseState::HeroLanding if clip == names.landing => {
                state.is_swinging = false;
                self.play_idle(state, player);
                self.enter(PhaseState::Idle, state);
            }
            PhaseState::Swinging(mut swing) => {
                let forward = swing.direction == Direction::Forward;
                if forward && !swing.landing && clip == names.forward {
                    swing.travelling = false;
                    swing.landing = true;
                    self.position = swing.end;
                    let played = self.play_once(&names.landing, state, player);
                    self.state = PhaseState::Swinging(swing);
                    self.bus
                        .publish(ChoreoEvent::LandedOnSection { section: swing.to });
                    if !played {
                        self.skip_clip(&names.landing, state, player);
                    }
                } else if forward && swing.landing && clip == names.landing {
                    state.is_swinging = false;
                    self.bus
                        .publish(ChoreoEvent::PickedUpFromSection { section: swing.to });
                    self.play_idle(state, player);
                    self.enter(PhaseState::Idle, state);
                } else if !forward && clip == names.backward {
                    self.position = swing.end;
                    state.is_swinging = false;
                    self.play_idle(state, player);
                    self.enter(PhaseState::Idle, state);
                } else {
                    tracing::trace!(clip, "unrouted clip finish while swinging");
                }
            }
            PhaseState::ExperienceEntry { .. } if clip == names.experience_entry => {
                self.play(
                    &names.experience_ride,
                    LoopMode::Repeat { repetitions: None },
                    names.crossfade_secs,
                    state,
                    player,
                );
                player.set_time_scale(0.0);
                state.is_swinging = false;
                self.enter(PhaseState::ExperienceRiding, state);
            }
            _ => tracing::trace!(clip, phase = ?self.phase(), "unrouted clip finish"),
        }
    }

    /// Stop listening for readiness and load signals.
    pub fn teardown(&mut self) {
        self.inbox.close();
    }

    /// Start the clip the current phase expects once the figure's clips exist.
    ///
    /// A figure that arrives after the sitting fallback joins the narrative where it
    /// stands instead of replaying the seated pose.
    pub fn on_figure_ready(&mut self, state: &mut AnimationState, player: &mut SkeletalPlayer) {
        let cfg = Rc::clone(&self.cfg);
        let names = &cfg.clips;
        let repeat = LoopMode::Repeat { repetitions: None };
        let (clip, mode) = match self.state {
            PhaseState::Sitting { .. } => (&names.seated, LoopMode::Once),
            PhaseState::Jumping { .. } => (&names.jump, LoopMode::Once),
            PhaseState::Loading => (&names.run, repeat),
            PhaseState::HeroEntrance => (&names.entrance, LoopMode::Once),
            PhaseState::HeroLanding => (&names.landing, LoopMode::Once),
            PhaseState::Idle => (&names.idle, repeat),
            PhaseState::Swinging(swing) if swing.landing => (&names.landing, LoopMode::Once),
            PhaseState::Swinging(swing) => match swing.direction {
                Direction::Forward => (&names.forward, LoopMode::Once),
                Direction::Backward => (&names.backward, LoopMode::Once),
            },
            PhaseState::ExperienceEntry { .. } => (&names.experience_entry, LoopMode::Once),
            PhaseState::ExperienceRiding => (&names.experience_ride, repeat),
        };
        player.set_loop_mode(clip, mode);
        if !player.start(clip) {
            tracing::trace!(clip = clip.as_str(), "figure ready without its phase clip");
            state.active_clip = player.active_clip().map(str::to_owned);
            return;
        }
        match &mut self.state {
            PhaseState::Swinging(swing) => swing.clip_skipped = false,
            PhaseState::ExperienceEntry { clip_skipped, .. } => *clip_skipped = false,
            PhaseState::ExperienceRiding => player.set_time_scale(0.0),
            _ => {}
        }
        state.active_clip = player.active_clip().map(str::to_owned);
        tracing::debug!(clip = clip.as_str(), phase = ?self.phase(), "figure ready");
    }

    /// Apply signals, detect section changes, advance the current phase and place the figure.
    pub fn step(&mut self, input: &FrameInput<'_>, cast: &mut Cast<'_>) {
        let dt = if input.dt.is_finite() {
            input.dt.max(0.0)
        } else {
            0.0
        };
        self.apply_signals(cast.state, cast.player);
        self.detect_section_change(input.scroll.section, cast.state, cast.player);

        let before = self.position;
        self.advance_phase(dt, input, cast);
        self.write_outputs(before, input, cast);
    }

    fn apply_signals(&mut self, state: &mut AnimationState, player: &mut SkeletalPlayer) {
        for ev in self.inbox.drain() {
            match ev {
                ChoreoEvent::FigureReady => state.figure_ready = true,
                ChoreoEvent::LoadProgress { percent } => {
                    state.record_load_progress(f64::from(percent));
                }
                ChoreoEvent::SiteReady => {
                    if state.site_ready {
                        continue;
                    }
                    state.site_ready = true;
                    match self.state {
                        PhaseState::Loading => self.begin_hero_entrance(state, player),
                        PhaseState::Sitting { .. } | PhaseState::Jumping { .. } => {
                            tracing::debug!("site ready before loading; latched");
                            self.pending_site_ready = true;
                        }
                        _ => tracing::trace!("late site ready ignored"),
                    }
                }
                _ => {}
            }
        }
    }

    fn begin_hero_entrance(&mut self, state: &mut AnimationState, player: &mut SkeletalPlayer) {
        self.pending_site_ready = false;
        player.set_time_scale(1.0);
        let cfg = Rc::clone(&self.cfg);
        let played = self.play_once(&cfg.clips.entrance, state, player);
        self.enter(PhaseState::HeroEntrance, state);
        if !played {
            self.skip_clip(&cfg.clips.entrance, state, player);
        }
    }

    fn detect_section_change(
        &mut self,
        section: SectionId,
        state: &mut AnimationState,
        player: &mut SkeletalPlayer,
    ) {
        if section == self.prev_section || state.is_swinging {
            return;
        }
        let from = self.prev_section;
        match self.state {
            PhaseState::Idle if section == SectionId::Experience => {
                self.prev_section = section;
                self.begin_experience_entry(state, player);
            }
            PhaseState::Idle | PhaseState::ExperienceRiding => {
                self.prev_section = section;
                self.begin_swing(section, from.direction_to(section), state, player);
            }
            _ => {}
        }
    }

    fn begin_swing(
        &mut self,
        to: SectionId,
        direction: Direction,
        state: &mut AnimationState,
        player: &mut SkeletalPlayer,
    ) {
        state.is_swinging = true;
        state.landing_section = Some(to);
        state.target_section = to;
        let cfg = Rc::clone(&self.cfg);
        let clip = match direction {
            Direction::Forward => &cfg.clips.forward,
            Direction::Backward => &cfg.clips.backward,
        };
        let played = self.play_once(clip, state, player);
        let swing = Swing {
            to,
            direction,
            start: self.position,
            end: self.cfg.anchor(to).position,
            t: 0.0,
            travelling: true,
            midpoint_sent: false,
            landing: false,
            clip_skipped: !played,
        };
        self.enter(PhaseState::Swinging(swing), state);
    }

    fn begin_experience_entry(&mut self, state: &mut AnimationState, player: &mut SkeletalPlayer) {
        state.is_swinging = true;
        state.target_section = SectionId::Experience;
        let cfg = Rc::clone(&self.cfg);
        let played = self.play_once(&cfg.clips.experience_entry, state, player);
        let next = PhaseState::ExperienceEntry {
            t: 0.0,
            start: self.position,
            end: self.cfg.anchor(SectionId::Experience).position,
            travelling: true,
            clip_skipped: !played,
        };
        self.enter(next, state);
    }

    fn advance_phase(&mut self, dt: f64, input: &FrameInput<'_>, cast: &mut Cast<'_>) {
        let cfg = Rc::clone(&self.cfg);
        let ch = &cfg.choreography;
        let normal = cfg.figure.scale;
        match self.state {
            PhaseState::Sitting { elapsed } => {
                self.place_seated(input, cast);
                let elapsed = elapsed + dt;
                let ready = cast.state.figure_ready && self.seated_done;
                if ready || elapsed >= ch.sitting_fallback_secs {
                    if !ready {
                        tracing::debug!(elapsed, "sitting fallback elapsed");
                    }
                    self.play_once(&cfg.clips.jump, cast.state, cast.player);
                    let next = PhaseState::Jumping {
                        t: 0.0,
                        start: self.position,
                        start_rotation: self.rotation_y,
                    };
                    self.enter(next, cast.state);
                } else {
                    self.state = PhaseState::Sitting { elapsed };
                }
            }
            PhaseState::Jumping {
                t,
                start,
                start_rotation,
            } => {
                let t = t + dt * ch.jump_speed;
                let clamped = t.min(1.0);
                let eased = smoothstep(clamped);
                let end = self.jump_end(input, cast.camera);
                self.position = start.lerp(end, eased) + DVec3::Y * arc(eased, ch.jump_arc);
                self.rotation_y = lerp(start_rotation, ch.run_heading, eased);
                self.scale = cast.state.loading_scale.unwrap_or(normal);
                if clamped >= 1.0 {
                    self.position = end;
                    self.play(
                        &cfg.clips.run,
                        LoopMode::Repeat { repetitions: None },
                        cfg.clips.crossfade_secs,
                        cast.state,
                        cast.player,
                    );
                    self.prev_load_progress = 0.0;
                    self.enter(PhaseState::Loading, cast.state);
                    self.bus.publish(ChoreoEvent::JumpComplete);
                    if self.pending_site_ready {
                        self.begin_hero_entrance(cast.state, cast.player);
                    }
                } else {
                    self.state = PhaseState::Jumping {
                        t,
                        start,
                        start_rotation,
                    };
                }
            }
            PhaseState::Loading => {
                let [x0, x1] = ch.loading_x_range;
                let progress = cast.state.load_progress;
                self.position = DVec3::new(
                    lerp(x0, x1, progress / 100.0),
                    self.lane_y(input, cast.camera),
                    ch.loading_z,
                );
                self.rotation_y = ch.run_heading;
                self.scale = cast.state.loading_scale.unwrap_or(normal);

                let dp = progress - self.prev_load_progress;
                self.prev_load_progress = progress;
                let nominal = cfg.loader.nominal_fill_rate();
                let time_scale = if dp > 0.0 {
                    (dp / (dt.max(0.001) * nominal)).min(ch.max_load_time_scale)
                } else {
                    0.0
                };
                cast.player.set_time_scale(time_scale);
            }
            PhaseState::HeroEntrance => {
                let mark = ch.entrance_mark;
                self.approach_anchor(mark, ch.entrance_approach);
                self.scale = approach(self.scale, normal, ch.entrance_approach);
            }
            PhaseState::HeroLanding => {
                let hero = cfg.anchor(SectionId::Hero);
                self.approach_anchor(hero, ch.entrance_approach);
                self.scale = approach(self.scale, normal, ch.entrance_approach);
            }
            PhaseState::Idle => {
                let anchor = cfg.anchor(input.scroll.section);
                self.approach_anchor(anchor, ch.idle_approach);
                self.restore_scale();
            }
            PhaseState::Swinging(mut swing) => {
                if swing.travelling {
                    self.advance_swing(&mut swing, dt);
                }
                let arrived_unplayed = swing.clip_skipped && !swing.travelling && !swing.landing;
                if arrived_unplayed {
                    swing.clip_skipped = false;
                }
                self.state = PhaseState::Swinging(swing);
                if arrived_unplayed {
                    let clip = match swing.direction {
                        Direction::Forward => &cfg.clips.forward,
                        Direction::Backward => &cfg.clips.backward,
                    };
                    self.skip_clip(clip, cast.state, cast.player);
                }
            }
            PhaseState::ExperienceEntry {
                t,
                start,
                end,
                travelling,
                clip_skipped,
            } => {
                let t = if travelling { t + dt * ch.swing_speed } else { t };
                let clamped = t.min(1.0);
                let eased = smoothstep(clamped);
                self.position = start.lerp(end, eased) + DVec3::Y * arc(eased, ch.swing_arc);
                self.scale = lerp(normal, cfg.figure.embedded_scale, eased);
                self.rotation_y = approach(self.rotation_y, 0.0, ch.swing_turn);
                let travelling = clamped < 1.0;
                if !travelling {
                    self.position = end;
                    self.scale = cfg.figure.embedded_scale;
                }
                let arrived_unplayed = clip_skipped && !travelling;
                self.state = PhaseState::ExperienceEntry {
                    t,
                    start,
                    end,
                    travelling,
                    clip_skipped: clip_skipped && !arrived_unplayed,
                };
                if arrived_unplayed {
                    self.skip_clip(&cfg.clips.experience_entry, cast.state, cast.player);
                }
            }
            PhaseState::ExperienceRiding => {
                let target_y = lerp(ch.ride_top_y, ch.ride_bottom_y, input.scroll.section_progress);
                self.position = DVec3::new(
                    ch.ride_x,
                    approach(self.position.y, target_y, ch.ride_follow),
                    ch.ride_z,
                );
                self.scale = cfg.figure.embedded_scale;
                self.rotation_y = approach(self.rotation_y, 0.0, ch.ride_turn);

                let velocity = input.scroll.velocity;
                let time_scale = if velocity < -ch.climb_velocity_threshold {
                    (velocity.abs() / ch.climb_speed_divisor).min(ch.climb_max_rate)
                } else {
                    approach(cast.player.time_scale(), 0.0, ch.climb_decay)
                };
                cast.player.set_time_scale(time_scale);
            }
        }
    }

    fn advance_swing(&mut self, swing: &mut Swing, dt: f64) {
        let cfg = Rc::clone(&self.cfg);
        let ch = &cfg.choreography;
        let prev_t = swing.t;
        swing.t += dt * ch.swing_speed;
        let clamped = swing.t.min(1.0);
        let eased = smoothstep(clamped);

        let mut pos = swing.start.lerp(swing.end, eased);
        if swing.direction == Direction::Forward {
            pos.y += arc(eased, ch.swing_arc);
        }
        self.position = pos;

        if prev_t < 0.5 && clamped >= 0.5 && !swing.midpoint_sent {
            swing.midpoint_sent = true;
            self.bus.publish(ChoreoEvent::SectionTransitionMidpoint {
                to: swing.to,
                start: swing.start,
                end: swing.end,
            });
        }

        let heading = if swing.end.x - swing.start.x >= 0.0 {
            ch.swing_heading
        } else {
            -ch.swing_heading
        };
        self.rotation_y = approach(self.rotation_y, heading, ch.swing_turn);
        self.restore_scale();

        if clamped >= 1.0 {
            swing.travelling = false;
            self.position = swing.end;
        }
    }

    fn approach_anchor(&mut self, anchor: Anchor, factor: f64) {
        self.position = approach_vec(self.position, anchor.position, factor);
        self.rotation_y = approach(self.rotation_y, anchor.rotation_y, factor);
    }

    fn restore_scale(&mut self) {
        let normal = self.cfg.figure.scale;
        if (self.scale - normal).abs() > 1e-4 {
            self.scale = approach(self.scale, normal, self.cfg.choreography.scale_restore);
        } else {
            self.scale = normal;
        }
    }

    /// Pin to the seated anchor, or fit onto the loading caption when one is laid out.
    fn place_seated(&mut self, input: &FrameInput<'_>, cast: &mut Cast<'_>) {
        let seated = self.cfg.choreography.seated;
        self.position = seated.position;
        self.rotation_y = seated.rotation_y;
        self.scale = cast.state.loading_scale.unwrap_or(self.cfg.figure.scale);

        let Some(caption) = input.loading_layout.and_then(|l| l.caption_rect()) else {
            return;
        };
        if caption.height() <= 0.0 {
            tracing::trace!("caption has no height; keeping seated anchor");
            return;
        }
        let z = seated.position.z;
        let Some(per_pixel) = cast.camera.world_per_pixel(input.viewport, z) else {
            return;
        };
        let Some(baseline) = cast.camera.unproject_to_plane(
            Point::new(caption.center().x, caption.y1),
            input.viewport,
            z,
        ) else {
            return;
        };

        let fig = &self.cfg.figure;
        let height = caption.height() * fig.caption_height_ratio * per_pixel;
        let scale = *cast
            .state
            .loading_scale
            .get_or_insert(height / fig.model_height);
        let seat = fig.seat_fraction * fig.model_height * scale;
        self.position = DVec3::new(baseline.x, baseline.y - seat, z);
        self.scale = scale;
    }

    /// Height of the loading lane: on top of the progress bar when laid out.
    fn lane_y(&self, input: &FrameInput<'_>, camera: &Camera) -> f64 {
        let ch = &self.cfg.choreography;
        input
            .loading_layout
            .and_then(|l| l.progress_bar_rect())
            .and_then(|bar| {
                camera.unproject_to_plane(
                    Point::new(bar.center().x, bar.y0),
                    input.viewport,
                    ch.loading_z,
                )
            })
            .map_or(ch.loading_y, |p| p.y)
    }

    fn jump_end(&self, input: &FrameInput<'_>, camera: &Camera) -> DVec3 {
        let end = self.cfg.choreography.jump_end;
        if input
            .loading_layout
            .and_then(|l| l.progress_bar_rect())
            .is_some()
        {
            DVec3::new(end.x, self.lane_y(input, camera), end.z)
        } else {
            end
        }
    }

    fn write_outputs(&mut self, before: DVec3, input: &FrameInput<'_>, cast: &mut Cast<'_>) {
        let ch = &self.cfg.choreography;
        let mut position = self.position;
        if self.state.bobs() {
            position.y += (input.elapsed * ch.bob_frequency).sin() * ch.bob_amplitude;
        }
        self.world = CharacterWorld {
            position,
            rotation_y: self.rotation_y,
            scale: self.scale,
        };

        if let Some(point) = cast.camera.project(position, input.viewport) {
            self.screen.point = Some(point);
        }
        let drifted = self.placed_once
            && (self.position - before).length() > self.cfg.figure.moving_epsilon;
        self.screen.moving = self.state.is_travelling() || drifted;
        self.placed_once = true;

        cast.rig.place(&Placement {
            position,
            rotation_y: self.rotation_y,
            scale: self.scale,
        });
    }
}

#[cfg(test)]
#[path = "../tests/unit/director.rs"]
mod tests;
