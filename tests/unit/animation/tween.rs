use super::*;

#[test]
fn tween_waits_for_delay_then_lands_exactly() {
    let mut t = Tween::new(10.0, 0.0, 1.0, Ease::SPRING).with_delay(0.5);
    t.advance(0.25);
    assert!(!t.has_started());
    assert_eq!(t.value(), 10.0);
    t.advance(0.5);
    assert!(t.has_started());
    assert!(!t.is_finished());
    t.advance(5.0);
    assert!(t.is_finished());
    assert_eq!(t.value(), 0.0);
}

#[test]
fn tween_ignores_bad_deltas() {
    let mut t = Tween::new(0.0, 1.0, 1.0, Ease::Linear);
    t.advance(f64::NAN);
    t.advance(-1.0);
    assert_eq!(t.progress(), 0.0);
}

#[test]
fn zero_duration_tween_snaps() {
    let mut t = Tween::new(Vec2::new(1.0, 1.0), Vec2::ZERO, 0.0, Ease::Linear);
    t.advance(0.001);
    assert!(t.is_finished());
    assert_eq!(t.value(), Vec2::ZERO);
}

#[test]
fn staggered_timeline_starts_tracks_in_order() {
    let mut tl = Timeline::staggered([0u32, 1, 2], 0.1, 0.2, Ease::Linear, |_| (0.0, 1.0));
    let mut seen = Vec::new();
    tl.advance(0.15, |k, _| seen.push(k));
    assert_eq!(seen, vec![0, 1]);
    assert!(!tl.is_finished());
    tl.advance(1.0, |_, v| assert_eq!(v, 1.0));
    assert!(tl.is_finished());
    assert_eq!(tl.len(), 3);
}
