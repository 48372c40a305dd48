//! Invisible world-space boxes that mirror on-screen text elements.
//!
//! Each frame the element rectangles are unprojected onto a fixed depth plane
//! and tested against the figure: an overlap latch publishes enter/exit edges,
//! and four axis rays report how close the figure is to the nearest box.

use crate::{
    bus::{ChoreoEvent, CollisionEdge, EventBus},
    config::ProxyConfig,
    foundation::{
        core::{DVec3, ElementRef, Point, Rect, Viewport},
        math::Aabb,
    },
    projection::Camera,
    state::{CharacterScreen, CharacterWorld},
};

/// Host access to page elements by selector.
pub trait ElementSource {
    /// Elements matching `selector`, in document order.
    fn query(&self, selector: &str) -> Vec<ElementRef>;
    /// Current viewport rectangle of `element`, in CSS pixels.
    fn element_rect(&self, element: ElementRef) -> Option<Rect>;
}

/// Proxy box tracking one element.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ProxyCollider {
    /// `"{selector}-{n}"`, where `n` counts every element discovered before it.
    pub id: String,
    pub element: ElementRef,
    /// World-space box; `None` until the element first had a non-empty rect.
    pub bounds: Option<Aabb>,
    /// The figure is inside the padded box.
    pub colliding: bool,
}

const RAYS: [DVec3; 4] = [DVec3::X, DVec3::NEG_X, DVec3::Y, DVec3::NEG_Y];

#[derive(Debug)]
pub struct ProxyLayer {
    cfg: ProxyConfig,
    bus: EventBus,
    elapsed: f64,
    discovered: bool,
    proxies: Vec<ProxyCollider>,
}

impl ProxyLayer {
    pub fn new(cfg: ProxyConfig, bus: &EventBus) -> Self {
        Self {
            cfg,
            bus: bus.clone(),
            elapsed: 0.0,
            discovered: false,
            proxies: Vec::new(),
        }
    }

    pub fn proxies(&self) -> &[ProxyCollider] {
        &self.proxies
    }

    /// `true` once the element query ran.
    pub fn is_discovered(&self) -> bool {
        self.discovered
    }

    /// Current unpadded proxy boxes.
    pub fn colliders(&self) -> impl Iterator<Item = Aabb> + '_ {
        self.proxies.iter().filter_map(|p| p.bounds)
    }

    pub fn update(
        &mut self,
        dt: f64,
        source: &dyn ElementSource,
        camera: &Camera,
        viewport: Viewport,
        world: &CharacterWorld,
        screen: &CharacterScreen,
    ) {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }
        if !self.discovered {
            if self.elapsed < self.cfg.settle_secs {
                return;
            }
            self.discover(source);
        }
        if self.proxies.is_empty() || viewport.is_degenerate() {
            return;
        }

        let active = screen.moving;
        let figure = world.position;
        for i in 0..self.proxies.len() {
            let element = self.proxies[i].element;
            let Some(rect) = source.element_rect(element) else {
                continue;
            };
            let Some(bounds) = self.mirror(rect, camera, viewport) else {
                continue;
            };
            self.proxies[i].bounds = Some(bounds);
            if active {
                self.update_latch(i, &bounds, figure);
            }
        }

        if active {
            self.cast_rays(figure);
        }
    }

    fn discover(&mut self, source: &dyn ElementSource) {
        let mut proxies = Vec::new();
        for selector in &self.cfg.selectors {
            for element in source.query(selector) {
                let id = format!("{selector}-{}", proxies.len());
                proxies.push(ProxyCollider {
                    id,
                    element,
                    bounds: None,
                    colliding: false,
                });
            }
        }
        tracing::debug!(count = proxies.len(), "proxy elements discovered");
        self.proxies = proxies;
        self.discovered = true;
    }

    /// World box on the proxy plane covering `rect`.
    fn mirror(&self, rect: Rect, camera: &Camera, viewport: Viewport) -> Option<Aabb> {
        if rect.width() == 0.0 || rect.height() == 0.0 {
            return None;
        }
        let z = self.cfg.plane_z;
        let center = camera.unproject_to_plane(rect.center(), viewport, z)?;
        let tl = camera.unproject_to_plane(Point::new(rect.x0, rect.y0), viewport, z)?;
        let br = camera.unproject_to_plane(Point::new(rect.x1, rect.y1), viewport, z)?;
        let size = DVec3::new(
            (br.x - tl.x).abs(),
            (tl.y - br.y).abs(),
            self.cfg.proxy_depth,
        );
        Some(Aabb::new(center, size * 0.5))
    }

    fn update_latch(&mut self, i: usize, bounds: &Aabb, figure: DVec3) {
        let cfg = &self.cfg;
        let latch = Aabb::new(
            DVec3::new(bounds.center.x, bounds.center.y, cfg.plane_z),
            DVec3::new(
                bounds.half_extents.x + cfg.padding,
                bounds.half_extents.y + cfg.padding,
                cfg.depth_threshold,
            ),
        );
        let overlapping = latch.contains(figure);

        let proxy = &mut self.proxies[i];
        let edge = match (overlapping, proxy.colliding) {
            (true, false) => CollisionEdge::Enter,
            (false, true) => CollisionEdge::Exit,
            _ => return,
        };
        proxy.colliding = overlapping;
        let event = ChoreoEvent::ProxyCollision {
            element: proxy.element,
            proxy_id: proxy.id.clone(),
            edge,
        };
        self.bus.publish(event);
    }

    fn cast_rays(&self, origin: DVec3) {
        let reach = self.cfg.ray_reach;
        for dir in RAYS {
            let nearest = self
                .proxies
                .iter()
                .filter_map(|p| Some((p, p.bounds?.ray_entry(origin, dir, reach)?)))
                .min_by(|a, b| a.1.total_cmp(&b.1));
            if let Some((proxy, dist)) = nearest {
                self.bus.publish(ChoreoEvent::ProxyNear {
                    element: proxy.element,
                    proxy_id: proxy.id.clone(),
                    proximity: 1.0 - dist / reach,
                });
            }
        }
    }

    /// Forget every proxy; discovery does not run again.
    pub fn teardown(&mut self) {
        self.proxies.clear();
    }
}

#[cfg(test)]
#[path = "../tests/unit/proxies.rs"]
mod tests;
