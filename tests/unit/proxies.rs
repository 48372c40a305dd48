use std::{cell::RefCell, rc::Rc};

use super::*;
use crate::bus::{EventKind, Subscription};

#[derive(Default)]
struct Page {
    elements: Vec<(String, ElementRef, Rect)>,
}

impl ElementSource for Page {
    fn query(&self, selector: &str) -> Vec<ElementRef> {
        self.elements
            .iter()
            .filter(|(s, _, _)| s == selector)
            .map(|(_, e, _)| *e)
            .collect()
    }

    fn element_rect(&self, element: ElementRef) -> Option<Rect> {
        self.elements
            .iter()
            .find(|(_, e, _)| *e == element)
            .map(|(_, _, r)| *r)
    }
}

fn vp() -> Viewport {
    Viewport::new(1280.0, 720.0)
}

/// 100×40 px heading centered on the world origin of the proxy plane.
fn heading_page() -> Page {
    let center = Camera::default()
        .project(DVec3::new(0.0, 0.0, 0.5), vp())
        .unwrap();
    Page {
        elements: vec![(
            "#hero h1".to_owned(),
            ElementRef(7),
            Rect::from_center_size(center, (100.0, 40.0)),
        )],
    }
}

fn record(bus: &EventBus, kinds: &[EventKind]) -> (Rc<RefCell<Vec<ChoreoEvent>>>, Vec<Subscription>) {
    let events = Rc::new(RefCell::new(Vec::new()));
    let subs = kinds
        .iter()
        .map(|&k| {
            let events = Rc::clone(&events);
            bus.subscribe(k, move |e| events.borrow_mut().push(e.clone()))
        })
        .collect();
    (events, subs)
}

fn at(x: f64, y: f64) -> CharacterWorld {
    CharacterWorld {
        position: DVec3::new(x, y, 0.5),
        rotation_y: 0.0,
        scale: 1.0,
    }
}

const MOVING: CharacterScreen = CharacterScreen {
    point: Some(Point::new(0.0, 0.0)),
    moving: true,
};

#[test]
fn discovery_waits_for_the_settle_delay() {
    let bus = EventBus::new();
    let page = Page {
        elements: vec![
            ("#hero h1".to_owned(), ElementRef(1), Rect::new(0.0, 0.0, 10.0, 10.0)),
            ("#about h2".to_owned(), ElementRef(2), Rect::new(0.0, 0.0, 10.0, 10.0)),
            ("#about p".to_owned(), ElementRef(3), Rect::new(0.0, 0.0, 10.0, 10.0)),
            ("#about p".to_owned(), ElementRef(4), Rect::new(0.0, 0.0, 10.0, 10.0)),
        ],
    };
    let mut layer = ProxyLayer::new(ProxyConfig::default(), &bus);
    let cam = Camera::default();
    layer.update(1.5, &page, &cam, vp(), &at(0.0, 0.0), &MOVING);
    assert!(!layer.is_discovered());
    layer.update(0.5, &page, &cam, vp(), &at(0.0, 0.0), &MOVING);
    assert!(layer.is_discovered());
    let ids: Vec<_> = layer.proxies().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["#hero h1-0", "#about h2-1", "#about p-2", "#about p-3"]);
}

#[test]
fn proxy_box_matches_the_element_on_the_plane() {
    let bus = EventBus::new();
    let page = heading_page();
    let cam = Camera::default();
    let mut layer = ProxyLayer::new(ProxyConfig::default(), &bus);
    layer.update(2.0, &page, &cam, vp(), &at(5.0, 5.0), &CharacterScreen::default());

    let b = layer.proxies()[0].bounds.unwrap();
    let wpp = cam.world_per_pixel(vp(), 0.5).unwrap();
    assert!((b.center - DVec3::new(0.0, 0.0, 0.5)).length() < 1e-6, "{b:?}");
    assert!((b.half_extents.x - 50.0 * wpp).abs() < 1e-6);
    assert!((b.half_extents.y - 20.0 * wpp).abs() < 1e-6);
    assert!((b.half_extents.z - 0.15).abs() < 1e-12);
}

#[test]
fn crossing_a_proxy_fires_one_enter_and_one_exit() {
    let bus = EventBus::new();
    let (events, _subs) = record(&bus, &[EventKind::ProxyCollision]);
    let page = heading_page();
    let cam = Camera::default();
    let mut layer = ProxyLayer::new(ProxyConfig::default(), &bus);
    layer.update(2.0, &page, &cam, vp(), &at(-3.0, 0.0), &MOVING);

    for i in 0..=60 {
        let x = -3.0 + 0.1 * i as f64;
        layer.update(1.0 / 60.0, &page, &cam, vp(), &at(x, 0.0), &MOVING);
    }
    let edges: Vec<_> = events
        .borrow()
        .iter()
        .filter_map(|e| match e {
            ChoreoEvent::ProxyCollision { edge, proxy_id, element } => {
                assert_eq!(proxy_id, "#hero h1-0");
                assert_eq!(*element, ElementRef(7));
                Some(*edge)
            }
            _ => None,
        })
        .collect();
    assert_eq!(edges, [CollisionEdge::Enter, CollisionEdge::Exit]);
}

#[test]
fn stationary_figure_never_collides() {
    let bus = EventBus::new();
    let (events, _subs) = record(&bus, &[EventKind::ProxyCollision, EventKind::ProxyNear]);
    let page = heading_page();
    let cam = Camera::default();
    let mut layer = ProxyLayer::new(ProxyConfig::default(), &bus);
    for _ in 0..10 {
        layer.update(0.5, &page, &cam, vp(), &at(0.0, 0.0), &CharacterScreen::default());
    }
    assert!(events.borrow().is_empty());
    assert!(!layer.proxies()[0].colliding);
}

#[test]
fn nearest_ray_hit_reports_proximity() {
    let bus = EventBus::new();
    let (events, _subs) = record(&bus, &[EventKind::ProxyNear, EventKind::ProxyCollision]);
    let page = heading_page();
    let cam = Camera::default();
    let mut layer = ProxyLayer::new(ProxyConfig::default(), &bus);
    layer.update(2.0, &page, &cam, vp(), &at(-2.0, 0.0), &MOVING);

    let b = layer.proxies()[0].bounds.unwrap();
    let expected = 1.0 - (b.min().x + 2.0) / 2.5;
    let events = events.borrow();
    assert_eq!(events.len(), 1, "{events:?}");
    match &events[0] {
        ChoreoEvent::ProxyNear { proximity, proxy_id, .. } => {
            assert_eq!(proxy_id, "#hero h1-0");
            assert!((proximity - expected).abs() < 1e-9);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn out_of_reach_and_degenerate_frames_are_quiet() {
    let bus = EventBus::new();
    let (events, _subs) = record(&bus, &[EventKind::ProxyNear, EventKind::ProxyCollision]);
    let mut page = heading_page();
    let cam = Camera::default();
    let mut layer = ProxyLayer::new(ProxyConfig::default(), &bus);
    layer.update(2.0, &page, &cam, vp(), &at(-3.0, 0.0), &MOVING);
    layer.update(0.1, &page, &cam, Viewport::new(0.0, 720.0), &at(0.0, 0.0), &MOVING);
    assert!(events.borrow().is_empty());

    page.elements[0].2 = Rect::new(10.0, 10.0, 10.0, 30.0);
    let mut fresh = ProxyLayer::new(ProxyConfig::default(), &bus);
    fresh.update(2.0, &page, &cam, vp(), &at(0.0, 0.0), &MOVING);
    assert!(fresh.proxies()[0].bounds.is_none());
    assert!(events.borrow().is_empty());
}
