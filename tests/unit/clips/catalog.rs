use super::*;

fn track(target: &str) -> Track {
    Track {
        target: target.to_owned(),
        times: vec![0.0, 1.0],
        values: vec![0.0, 0.0, 0.0, 2.0, 4.0, 6.0],
    }
}

fn clip() -> ClipData {
    ClipData {
        duration: 1.0,
        tracks: vec![track("Hips.position"), track("Hips.scale")],
    }
}

#[test]
fn root_translation_is_stripped_except_for_seated_clip() {
    let cat = ClipCatalog::from_clips(
        [
            ("running".to_owned(), clip()),
            ("sittingLaughing".to_owned(), clip()),
        ],
        "sittingLaughing",
    )
    .unwrap();
    assert_eq!(cat.get("running").unwrap().tracks.len(), 1);
    assert_eq!(cat.get("running").unwrap().tracks[0].target, "Hips.scale");
    assert_eq!(cat.get("sittingLaughing").unwrap().tracks.len(), 2);
}

#[test]
fn track_sampling_interpolates_and_holds() {
    let t = track("Hips.position");
    assert_eq!(t.stride(), 3);
    assert_eq!(t.sample(0.5), vec![1.0, 2.0, 3.0]);
    assert_eq!(t.sample(-1.0), vec![0.0, 0.0, 0.0]);
    assert_eq!(t.sample(5.0), vec![2.0, 4.0, 6.0]);
}

#[test]
fn manifest_parses_and_validates() {
    let cat = ClipCatalog::from_manifest_str(
        r#"{ "clips": [
            { "name": "running", "duration": 0.7 },
            { "name": "swinging", "duration": 1.9,
              "tracks": [{ "target": "Hips.position", "times": [0], "values": [1, 2, 3] }] }
        ] }"#,
        "sittingLaughing",
    )
    .unwrap();
    assert_eq!(cat.len(), 2);
    assert!(cat.get("swinging").unwrap().tracks.is_empty());

    let err = ClipCatalog::from_manifest_str(
        r#"{ "clips": [{ "name": "bad", "duration": 0 }] }"#,
        "sittingLaughing",
    )
    .unwrap_err();
    assert!(matches!(err, ChoreoError::Animation(_)));

    let err = ClipCatalog::from_manifest_str(
        r#"{ "clips": [{ "name": "a", "duration": 1 }, { "name": "a", "duration": 1 }] }"#,
        "sittingLaughing",
    )
    .unwrap_err();
    assert!(err.to_string().contains("duplicate"));
}

#[test]
fn malformed_tracks_are_rejected() {
    let mut bad = clip();
    bad.tracks[0].values.pop();
    assert!(ClipCatalog::from_clips([("x".to_owned(), bad)], "").is_err());

    let mut unsorted = clip();
    unsorted.tracks[1].times = vec![1.0, 0.0];
    assert!(ClipCatalog::from_clips([("x".to_owned(), unsorted)], "").is_err());
}

#[test]
fn builtin_has_every_default_clip() {
    let cat = ClipCatalog::builtin();
    let names = crate::config::ClipNames::default();
    for n in [
        &names.seated,
        &names.jump,
        &names.run,
        &names.entrance,
        &names.landing,
        &names.idle,
        &names.forward,
        &names.backward,
        &names.experience_entry,
        &names.experience_ride,
    ] {
        assert!(cat.contains(n), "{n}");
    }
}
