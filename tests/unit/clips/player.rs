use super::*;
use crate::clips::catalog::ClipData;

#[derive(Default)]
struct RecordingRig {
    layers: Vec<PoseLayer>,
    drift_resets: u32,
}

impl Rig for RecordingRig {
    fn place(&mut self, _placement: &Placement) {}
    fn pose(&mut self, layers: &[PoseLayer]) {
        self.layers = layers.to_vec();
    }
    fn zero_root_drift(&mut self) {
        self.drift_resets += 1;
    }
}

fn player() -> SkeletalPlayer {
    let catalog = ClipCatalog::from_clips(
        [
            ("idle".to_owned(), ClipData::timing_only(2.0)),
            ("wave".to_owned(), ClipData::timing_only(1.0)),
            ("run".to_owned(), ClipData::timing_only(0.5)),
        ],
        "",
    )
    .unwrap();
    SkeletalPlayer::new(Rc::new(catalog))
}

#[test]
fn crossfade_with_nothing_active_is_a_noop() {
    let mut p = player();
    assert!(!p.cross_fade_to("wave", 0.4));
    assert_eq!(p.active_clip(), None);
}

#[test]
fn crossfade_to_unknown_clip_is_a_noop() {
    let mut p = player();
    p.start("idle");
    assert!(!p.cross_fade_to("moonwalk", 0.4));
    assert_eq!(p.active_clip(), Some("idle"));
    assert_eq!(p.clip_weight("idle"), 1.0);
}

#[test]
fn crossfade_blends_weights_over_duration() {
    let mut p = player();
    let mut rig = RecordingRig::default();
    p.start("idle");
    p.set_loop_mode("wave", LoopMode::Once);
    assert!(p.cross_fade_to("wave", 0.4));
    assert_eq!(p.active_clip(), Some("wave"));

    p.advance(0.2, &mut rig);
    assert!((p.clip_weight("wave") - 0.5).abs() < 1e-9);
    assert!((p.clip_weight("idle") - 0.5).abs() < 1e-9);
    assert_eq!(rig.layers.len(), 2);
    assert_eq!(rig.drift_resets, 1);

    p.advance(0.2, &mut rig);
    assert_eq!(p.clip_weight("wave"), 1.0);
    assert_eq!(p.clip_weight("idle"), 0.0);
    assert_eq!(p.clip_time("idle"), None);
    assert_eq!(rig.layers.len(), 1);
}

#[test]
fn one_shot_finishes_exactly_once_and_holds() {
    let mut p = player();
    let mut rig = NullRig;
    p.start("idle");
    p.set_loop_mode("wave", LoopMode::Once);
    p.cross_fade_to("wave", 0.0);

    assert!(p.advance(0.6, &mut rig).is_empty());
    assert_eq!(p.advance(0.6, &mut rig), vec!["wave".to_owned()]);
    assert!(p.advance(0.6, &mut rig).is_empty());
    assert_eq!(p.clip_time("wave"), Some(1.0));
}

#[test]
fn looping_clips_never_finish() {
    let mut p = player();
    let mut rig = NullRig;
    p.start("run");
    for _ in 0..20 {
        assert!(p.advance(0.3, &mut rig).is_empty());
    }
    assert!(p.clip_time("run").unwrap() < 0.5);
}

#[test]
fn bounded_repeat_finishes_after_repetitions() {
    let mut p = player();
    let mut rig = NullRig;
    p.set_loop_mode("run", LoopMode::Repeat { repetitions: Some(2) });
    p.start("run");
    assert!(p.advance(0.6, &mut rig).is_empty());
    assert_eq!(p.advance(0.6, &mut rig), vec!["run".to_owned()]);
}

#[test]
fn fading_out_actions_do_not_report_finish() {
    let mut p = player();
    let mut rig = NullRig;
    p.set_loop_mode("wave", LoopMode::Once);
    p.start("wave");
    p.advance(0.9, &mut rig);
    p.cross_fade_to("idle", 0.4);
    assert!(p.advance(0.3, &mut rig).is_empty());
}

#[test]
fn crossfade_to_active_restarts_without_fade() {
    let mut p = player();
    let mut rig = NullRig;
    p.start("idle");
    p.advance(1.0, &mut rig);
    p.set_time_scale(0.0);
    assert!(p.cross_fade_to("idle", 0.4));
    assert_eq!(p.clip_time("idle"), Some(0.0));
    assert_eq!(p.clip_weight("idle"), 1.0);
    assert_eq!(p.time_scale(), 1.0);
}

#[test]
fn time_scale_applies_to_active_action() {
    let mut p = player();
    let mut rig = NullRig;
    p.start("idle");
    p.set_time_scale(0.0);
    p.advance(1.0, &mut rig);
    assert_eq!(p.clip_time("idle"), Some(0.0));
    p.set_time_scale(2.0);
    p.advance(0.25, &mut rig);
    assert_eq!(p.clip_time("idle"), Some(0.5));
}

#[test]
fn stop_all_clears_everything() {
    let mut p = player();
    let mut rig = RecordingRig::default();
    p.start("idle");
    p.stop_all();
    assert_eq!(p.active_clip(), None);
    p.advance(0.1, &mut rig);
    assert!(rig.layers.is_empty());
}
