use super::*;

const ALL: [Ease; 7] = [
    Ease::Linear,
    Ease::OutQuad,
    Ease::InOutQuad,
    Ease::OutCubic,
    Ease::InOutCubic,
    Ease::Smoothstep,
    Ease::SPRING,
];

#[test]
fn endpoints_are_exact() {
    for e in ALL {
        assert_eq!(e.apply(0.0), 0.0, "{e:?}");
        assert_eq!(e.apply(1.0), 1.0, "{e:?}");
        assert_eq!(e.apply(-1.0), 0.0, "{e:?}");
        assert_eq!(e.apply(2.0), 1.0, "{e:?}");
    }
}

#[test]
fn elastic_overshoots_before_settling() {
    let peak = (1..100)
        .map(|i| Ease::SPRING.apply(f64::from(i) / 100.0))
        .fold(f64::MIN, f64::max);
    assert!(peak > 1.0);
    assert!((Ease::SPRING.apply(0.99) - 1.0).abs() < 0.01);
}

#[test]
fn smoothstep_matches_polynomial() {
    let t: f64 = 0.3;
    assert!((Ease::Smoothstep.apply(t) - t * t * (3.0 - 2.0 * t)).abs() < 1e-12);
}
