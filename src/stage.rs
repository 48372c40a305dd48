//! The per-instance world: owns every component and sequences one frame.

use std::{collections::VecDeque, rc::Rc};

use crate::{
    bus::{ChoreoEvent, EventBus},
    clips::{
        catalog::ClipCatalog,
        player::{Rig, SkeletalPlayer},
    },
    config::ChoreoConfig,
    director::{Cast, Director, FrameInput, LoadingLayout},
    displacement::{GlyphSurface, TextDisplacement},
    foundation::{
        core::{Point, SectionId, Viewport},
        error::ChoreoResult,
        math::Aabb,
    },
    letters::LetterLayer,
    loader::LoadSequencer,
    projection::Camera,
    proxies::{ElementSource, ProxyLayer},
    state::{AnimationState, CharacterScreen, CharacterWorld, Phase},
    tracking::{
        pointer::{PointerState, PointerTracker},
        scroll::{PageLayout, ScrollSample, ScrollState, ScrollTracker},
    },
};

/// Host signal queued for the next frame.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Input {
    Scroll(ScrollSample),
    Pointer { x: f64, y: f64 },
    Resize { width: f64, height: f64 },
    /// The figure's model and clips finished loading.
    AssetReady,
    /// External site-ready signal, for hosts running their own loader.
    SiteReady,
    /// External load progress, for hosts running their own loader.
    LoadProgress { percent: u8 },
}

/// Host adapters owned by the stage.
pub struct StageHosts {
    pub rig: Box<dyn Rig>,
    pub page: Box<dyn PageLayout>,
    pub loading: Option<Box<dyn LoadingLayout>>,
    pub elements: Box<dyn ElementSource>,
}

pub struct Stage {
    cfg: Rc<ChoreoConfig>,
    bus: EventBus,
    state: AnimationState,
    scroll: ScrollTracker,
    pointer: PointerTracker,
    camera: Camera,
    player: SkeletalPlayer,
    director: Director,
    loader: LoadSequencer,
    texts: Vec<TextDisplacement>,
    proxies: ProxyLayer,
    letters: LetterLayer,
    hosts: StageHosts,
    queue: VecDeque<Input>,
    viewport: Viewport,
    elapsed: f64,
    figure_loaded: bool,
    torn_down: bool,
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("phase", &self.state.phase)
            .field("elapsed", &self.elapsed)
            .field("viewport", &self.viewport)
            .field("texts", &self.texts.len())
            .field("queued", &self.queue.len())
            .finish_non_exhaustive()
    }
}

impl Stage {
    /// Build a stage. Fails when `cfg` does not validate.
    #[tracing::instrument(skip_all, fields(clips = catalog.len()))]
    pub fn new(
        cfg: ChoreoConfig,
        catalog: ClipCatalog,
        viewport: Viewport,
        hosts: StageHosts,
    ) -> ChoreoResult<Self> {
        cfg.validate()?;
        let missing: Vec<&str> = cfg
            .clips
            .all()
            .into_iter()
            .filter(|name| !catalog.contains(name))
            .collect();
        if !missing.is_empty() {
            tracing::warn!(?missing, "clip catalog lacks configured clips; those transitions will not animate");
        }

        let cfg = Rc::new(cfg);
        let bus = EventBus::new();
        Ok(Self {
            state: AnimationState::default(),
            scroll: ScrollTracker::new(),
            pointer: PointerTracker::new(),
            camera: Camera::from_config(&cfg.camera),
            player: SkeletalPlayer::new(Rc::new(catalog)),
            director: Director::new(Rc::clone(&cfg), &bus),
            loader: LoadSequencer::new(cfg.loader, &bus),
            texts: Vec::new(),
            proxies: ProxyLayer::new(cfg.proxies.clone(), &bus),
            letters: LetterLayer::new(cfg.letters.clone(), &bus),
            hosts,
            queue: VecDeque::new(),
            viewport,
            elapsed: 0.0,
            figure_loaded: false,
            torn_down: false,
            bus,
            cfg,
        })
    }

    /// Register a displaceable text container belonging to `section`.
    pub fn add_text(&mut self, section: SectionId, surface: Box<dyn GlyphSurface>) {
        self.texts.push(TextDisplacement::new(
            section,
            surface,
            self.cfg.displacement,
            &self.bus,
        ));
    }

    /// Queue a host signal; it is applied at the start of the next frame.
    pub fn queue(&mut self, input: Input) {
        self.queue.push_back(input);
    }

    /// Run one frame of `dt` seconds.
    pub fn frame(&mut self, dt: f64) {
        if self.torn_down {
            return;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.elapsed += dt;

        self.drain_inputs();
        self.loader.tick(dt);

        let finished = self.player.advance(dt, self.hosts.rig.as_mut());
        for clip in finished {
            self.director
                .on_clip_finished(&clip, &mut self.state, &mut self.player);
        }

        let input = FrameInput {
            dt,
            elapsed: self.elapsed,
            scroll: self.scroll.state(),
            viewport: self.viewport,
            loading_layout: self.hosts.loading.as_deref(),
        };
        let mut cast = Cast {
            state: &mut self.state,
            player: &mut self.player,
            camera: &self.camera,
            rig: self.hosts.rig.as_mut(),
        };
        self.director.step(&input, &mut cast);

        let world = self.director.world();
        let screen = self.director.screen();
        for text in &mut self.texts {
            text.update(dt, screen);
        }
        self.proxies.update(
            dt,
            self.hosts.elements.as_ref(),
            &self.camera,
            self.viewport,
            &world,
            &screen,
        );
        let obstacles: Vec<Aabb> = self.proxies.colliders().collect();
        self.letters.update(dt, &world, &obstacles);
    }

    fn drain_inputs(&mut self) {
        while let Some(input) = self.queue.pop_front() {
            match input {
                Input::Scroll(sample) => self.scroll.sample(sample, self.hosts.page.as_ref()),
                Input::Pointer { x, y } => self.pointer.sample(Point::new(x, y), self.viewport),
                Input::Resize { width, height } => {
                    self.viewport = Viewport::new(width, height);
                    self.scroll.invalidate_layout();
                }
                Input::AssetReady => self.on_asset_ready(),
                Input::SiteReady => self.bus.publish(ChoreoEvent::SiteReady),
                Input::LoadProgress { percent } => self.bus.publish(ChoreoEvent::LoadProgress {
                    percent: percent.min(100),
                }),
            }
        }
    }

    fn on_asset_ready(&mut self) {
        if self.figure_loaded {
            tracing::trace!("duplicate asset-ready signal");
            return;
        }
        self.figure_loaded = true;
        self.director
            .on_figure_ready(&mut self.state, &mut self.player);
        self.bus.publish(ChoreoEvent::FigureReady);
    }

    /// Stop every clip, kill every tween, restore glyphs and drop every component's
    /// bus subscription. Host subscriptions made through [`Stage::bus`] are left alone.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.player.stop_all();
        for text in &mut self.texts {
            text.teardown();
        }
        self.texts.clear();
        self.director.teardown();
        self.loader.teardown();
        self.proxies.teardown();
        self.letters.teardown();
        self.queue.clear();
        tracing::debug!(elapsed = self.elapsed, "stage torn down");
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn config(&self) -> &ChoreoConfig {
        &self.cfg
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.director.phase()
    }

    pub fn world(&self) -> CharacterWorld {
        self.director.world()
    }

    pub fn screen(&self) -> CharacterScreen {
        self.director.screen()
    }

    pub fn scroll(&self) -> ScrollState {
        self.scroll.state()
    }

    pub fn pointer(&self) -> PointerState {
        self.pointer.state()
    }

    pub fn player(&self) -> &SkeletalPlayer {
        &self.player
    }

    pub fn texts(&self) -> &[TextDisplacement] {
        &self.texts
    }

    pub fn proxies(&self) -> &ProxyLayer {
        &self.proxies
    }

    pub fn letters(&self) -> &LetterLayer {
        &self.letters
    }

    pub fn loader_done(&self) -> bool {
        self.loader.is_done()
    }

    /// Seconds simulated so far.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

impl Drop for Stage {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
#[path = "../tests/unit/stage.rs"]
mod tests;
