use std::{cell::RefCell, rc::Rc};

use super::*;
use crate::{
    bus::{EventKind, Subscription},
    clips::player::NullRig,
    displacement::GlyphStyle,
    foundation::core::{ElementRef, GlyphId, Rect},
    tracking::scroll::SectionBounds,
};

struct NoPage;

impl PageLayout for NoPage {
    fn section_bounds(&self, _section: SectionId) -> Option<SectionBounds> {
        None
    }
}

struct NoElements;

impl ElementSource for NoElements {
    fn query(&self, _selector: &str) -> Vec<ElementRef> {
        Vec::new()
    }

    fn element_rect(&self, _element: ElementRef) -> Option<Rect> {
        None
    }
}

#[derive(Clone, Default)]
struct Glyphs(Rc<RefCell<Vec<(GlyphId, GlyphStyle)>>>);

impl GlyphSurface for Glyphs {
    fn container_rect(&self) -> Option<Rect> {
        Some(Rect::new(0.0, 0.0, 40.0, 10.0))
    }

    fn glyphs(&self) -> Vec<GlyphId> {
        vec![GlyphId(0), GlyphId(1)]
    }

    fn glyph_rect(&self, glyph: GlyphId) -> Option<Rect> {
        let x = glyph.0 as f64 * 20.0;
        Some(Rect::new(x, 0.0, x + 10.0, 10.0))
    }

    fn apply_style(&mut self, glyph: GlyphId, style: &GlyphStyle) {
        self.0.borrow_mut().push((glyph, *style));
    }
}

fn hosts() -> StageHosts {
    StageHosts {
        rig: Box::new(NullRig),
        page: Box::new(NoPage),
        loading: None,
        elements: Box::new(NoElements),
    }
}

fn stage_with(cfg: ChoreoConfig) -> Stage {
    Stage::new(
        cfg,
        ClipCatalog::builtin(),
        Viewport::new(1280.0, 720.0),
        hosts(),
    )
    .unwrap()
}

fn record(bus: &EventBus, kind: EventKind) -> (Rc<RefCell<Vec<ChoreoEvent>>>, Subscription) {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    let sub = bus.subscribe(kind, move |e| sink.borrow_mut().push(e.clone()));
    (events, sub)
}

#[test]
fn invalid_config_is_rejected() {
    let mut cfg = ChoreoConfig::default();
    cfg.loader.duration_secs = 0.0;
    let err = Stage::new(cfg, ClipCatalog::builtin(), Viewport::new(800.0, 600.0), hosts());
    assert!(err.is_err());
}

#[test]
fn asset_ready_starts_the_seated_clip_once() {
    let mut stage = stage_with(ChoreoConfig::default());
    let (events, _sub) = record(stage.bus(), EventKind::FigureReady);

    stage.queue(Input::AssetReady);
    assert!(events.borrow().is_empty());
    stage.frame(1.0 / 60.0);
    assert_eq!(events.borrow().len(), 1);
    assert!(stage.state().figure_ready);
    assert_eq!(stage.state().active_clip.as_deref(), Some("sittingLaughing"));

    stage.queue(Input::AssetReady);
    stage.frame(1.0 / 60.0);
    assert_eq!(events.borrow().len(), 1);
}

#[test]
fn inputs_apply_in_queue_order() {
    let mut stage = stage_with(ChoreoConfig::default());
    stage.queue(Input::Resize {
        width: 200.0,
        height: 100.0,
    });
    stage.queue(Input::Pointer { x: 50.0, y: 25.0 });
    stage.frame(0.0);
    let p = stage.pointer();
    assert_eq!((p.x, p.y), (-0.5, 0.5));
}

#[test]
fn external_load_progress_is_clamped() {
    let mut cfg = ChoreoConfig::default();
    cfg.loader.enabled = false;
    let mut stage = stage_with(cfg);
    let (events, _sub) = record(stage.bus(), EventKind::LoadProgress);
    stage.queue(Input::LoadProgress { percent: 140 });
    stage.frame(0.0);
    assert_eq!(*events.borrow(), vec![ChoreoEvent::LoadProgress { percent: 100 }]);
    assert_eq!(stage.state().load_progress, 100.0);
    assert!(stage.loader_done());
}

#[test]
fn input_parses_from_tagged_json() {
    let inputs: Vec<Input> = serde_json::from_str(
        r#"[
            { "type": "scroll", "scroll_y": 10, "viewport_height": 720, "scroll_height": 4000 },
            { "type": "asset_ready" },
            { "type": "load_progress", "percent": 12 }
        ]"#,
    )
    .unwrap();
    assert_eq!(inputs[1], Input::AssetReady);
    assert_eq!(inputs[2], Input::LoadProgress { percent: 12 });
}

#[test]
fn teardown_restores_glyphs_and_stops_the_frame_loop() {
    let glyphs = Glyphs::default();
    let mut stage = stage_with(ChoreoConfig::default());
    stage.add_text(SectionId::Hero, Box::new(glyphs.clone()));
    stage.queue(Input::AssetReady);
    stage.frame(0.1);

    stage.teardown();
    assert!(stage.is_torn_down());
    assert!(stage.player().active_clip().is_none());
    assert!(stage.texts().is_empty());
    let writes = glyphs.0.borrow().clone();
    assert_eq!(writes.len(), 2);
    assert!(writes.iter().all(|(_, s)| s.is_rest()));

    let elapsed = stage.elapsed();
    stage.frame(0.1);
    assert_eq!(stage.elapsed(), elapsed);
}

#[test]
fn dropping_the_stage_tears_it_down() {
    let glyphs = Glyphs::default();
    let bus;
    {
        let mut stage = stage_with(ChoreoConfig::default());
        stage.add_text(SectionId::About, Box::new(glyphs.clone()));
        bus = stage.bus().clone();
        assert!(bus.subscriber_count(EventKind::LandedOnSection) > 0);
    }
    assert_eq!(glyphs.0.borrow().len(), 2);
    assert_eq!(bus.subscriber_count(EventKind::LandedOnSection), 0);
}

#[test]
fn late_asset_plays_the_loading_run_not_the_seated_pose() {
    let mut stage = stage_with(ChoreoConfig::default());
    let (ready, _sub) = record(stage.bus(), EventKind::FigureReady);
    for _ in 0..600 {
        if stage.phase() == Phase::Loading {
            break;
        }
        stage.frame(1.0 / 60.0);
    }
    assert_eq!(stage.phase(), Phase::Loading);
    assert!(stage.player().active_clip().is_none());

    stage.queue(Input::AssetReady);
    for _ in 0..30 {
        stage.frame(1.0 / 60.0);
    }
    assert_eq!(stage.phase(), Phase::Loading);
    assert_eq!(ready.borrow().len(), 1);
    assert_eq!(stage.state().active_clip.as_deref(), Some("running"));
    assert_eq!(stage.player().clip_weight("sittingLaughing"), 0.0);
    assert_eq!(stage.player().clip_weight("running"), 1.0);
}

#[test]
fn teardown_releases_component_subscriptions() {
    let mut stage = stage_with(ChoreoConfig::default());
    stage.add_text(SectionId::About, Box::new(Glyphs::default()));
    let bus = stage.bus().clone();
    let kinds = [
        EventKind::FigureReady,
        EventKind::LoadProgress,
        EventKind::SiteReady,
        EventKind::JumpComplete,
        EventKind::SectionTransitionMidpoint,
        EventKind::LandedOnSection,
        EventKind::PickedUpFromSection,
    ];
    assert!(kinds.iter().all(|&k| bus.subscriber_count(k) > 0));

    stage.teardown();
    for kind in kinds {
        assert_eq!(bus.subscriber_count(kind), 0, "{kind:?}");
    }
    assert!(stage.loader_done());
}
