//! Perspective camera used to move between world space and CSS pixels.

use glam::{DMat4, DVec4};

use crate::{
    config::CameraConfig,
    foundation::core::{DVec3, Point, Viewport},
};

/// Fixed perspective camera looking down `-z`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    position: DVec3,
    fov_y: f64,
    near: f64,
    far: f64,
}

impl Camera {
    pub fn from_config(cfg: &CameraConfig) -> Self {
        Self {
            position: cfg.position,
            fov_y: cfg.fov_deg.to_radians(),
            near: cfg.near.max(1e-4),
            far: cfg.far.max(cfg.near + 1e-3),
        }
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    fn view_projection(&self, viewport: Viewport) -> DMat4 {
        let aspect = viewport.width / viewport.height;
        DMat4::perspective_rh(self.fov_y, aspect, self.near, self.far)
            * DMat4::look_to_rh(self.position, DVec3::NEG_Z, DVec3::Y)
    }

    /// Screen position of `world`, or `None` when it is behind the camera or the
    /// viewport is degenerate.
    pub fn project(&self, world: DVec3, viewport: Viewport) -> Option<Point> {
        if viewport.is_degenerate() {
            return None;
        }
        let clip = self.view_projection(viewport) * DVec4::new(world.x, world.y, world.z, 1.0);
        if clip.w <= f64::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Point::new(
            (ndc.x + 1.0) * 0.5 * viewport.width,
            (1.0 - ndc.y) * 0.5 * viewport.height,
        ))
    }

    /// Intersection of the pixel ray through `screen` with the plane `z = plane_z`.
    pub fn unproject_to_plane(
        &self,
        screen: Point,
        viewport: Viewport,
        plane_z: f64,
    ) -> Option<DVec3> {
        if viewport.is_degenerate() {
            return None;
        }
        let inverse = self.view_projection(viewport).inverse();
        let ndc_x = screen.x / viewport.width * 2.0 - 1.0;
        let ndc_y = 1.0 - screen.y / viewport.height * 2.0;
        let near = inverse.project_point3(DVec3::new(ndc_x, ndc_y, 0.0));
        let far = inverse.project_point3(DVec3::new(ndc_x, ndc_y, 1.0));
        let dir = far - near;
        if dir.z.abs() < f64::EPSILON {
            return None;
        }
        let t = (plane_z - near.z) / dir.z;
        let hit = near + dir * t;
        hit.is_finite().then_some(hit)
    }

    /// World units covered by one vertical pixel on the plane `z = plane_z`.
    pub fn world_per_pixel(&self, viewport: Viewport, plane_z: f64) -> Option<f64> {
        if viewport.is_degenerate() {
            return None;
        }
        let distance = self.position.z - plane_z;
        if distance <= 0.0 {
            return None;
        }
        let visible_height = 2.0 * distance * (self.fov_y * 0.5).tan();
        Some(visible_height / viewport.height)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

#[cfg(test)]
#[path = "../tests/unit/projection.rs"]
mod tests;
