use super::*;

fn vp() -> Viewport {
    Viewport::new(1280.0, 720.0)
}

#[test]
fn origin_projects_to_viewport_center() {
    let cam = Camera::default();
    let p = cam.project(DVec3::ZERO, vp()).unwrap();
    assert!((p.x - 640.0).abs() < 1e-9);
    assert!((p.y - 360.0).abs() < 1e-9);
}

#[test]
fn positive_y_is_up_on_screen() {
    let cam = Camera::default();
    let p = cam.project(DVec3::new(1.0, 1.0, 0.0), vp()).unwrap();
    assert!(p.x > 640.0);
    assert!(p.y < 360.0);
}

#[test]
fn unproject_inverts_project_on_the_plane() {
    let cam = Camera::default();
    let world = DVec3::new(-1.25, 0.7, 0.5);
    let screen = cam.project(world, vp()).unwrap();
    let back = cam.unproject_to_plane(screen, vp(), 0.5).unwrap();
    assert!((back - world).length() < 1e-6, "{back:?}");
}

#[test]
fn world_per_pixel_matches_projection() {
    let cam = Camera::default();
    let wpp = cam.world_per_pixel(vp(), 0.0).unwrap();
    let a = cam.project(DVec3::ZERO, vp()).unwrap();
    let b = cam.project(DVec3::new(0.0, 1.0, 0.0), vp()).unwrap();
    assert!(((a.y - b.y) * wpp - 1.0).abs() < 1e-9);
}

#[test]
fn degenerate_inputs_yield_none() {
    let cam = Camera::default();
    assert!(cam.project(DVec3::ZERO, Viewport::new(0.0, 720.0)).is_none());
    assert!(cam.project(DVec3::new(0.0, 0.0, 10.0), vp()).is_none());
    assert!(
        cam.unproject_to_plane(Point::new(1.0, 1.0), Viewport::default(), 0.5)
            .is_none()
    );
}
