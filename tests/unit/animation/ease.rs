use super::*;

const ALL: [Ease; 13] = [
    Ease::Linear,
    Ease::InQuad,
    Ease::OutQuad,
    Ease::InOutQuad,
    Ease::InCubic,
    Ease::OutCubic,
    Ease::InOutCubic,
    Ease::InSine,
    Ease::OutSine,
    Ease::InOutSine,
    Ease::InExpo,
    Ease::OutExpo,
    Ease::InOutExpo,
];

#[test]
fn endpoints_are_fixed_for_every_ease() {
    for ease in ALL {
        assert!(ease.apply(0.0).abs() < 1e-12, "{ease:?}");
        assert!((ease.apply(1.0) - 1.0).abs() < 1e-12, "{ease:?}");
    }
}

#[test]
fn eases_are_monotonic() {
    for ease in ALL {
        let mut prev = ease.apply(0.0);
        for i in 1..=100 {
            let v = ease.apply(f64::from(i) / 100.0);
            assert!(v + 1e-12 >= prev, "{ease:?} at {i}");
            prev = v;
        }
    }
}

#[test]
fn in_out_is_symmetric_around_midpoint() {
    for ease in [Ease::InOutQuad, Ease::InOutCubic, Ease::InOutSine, Ease::InOutExpo] {
        assert!((ease.apply(0.5) - 0.5).abs() < 1e-12, "{ease:?}");
        let a = ease.apply(0.2);
        let b = ease.apply(0.8);
        assert!((a + b - 1.0).abs() < 1e-12, "{ease:?}");
    }
}

#[test]
fn quad_matches_closed_form() {
    assert!((Ease::InQuad.apply(0.3) - 0.09).abs() < 1e-12);
    assert!((Ease::OutQuad.apply(0.3) - 0.51).abs() < 1e-12);
    assert!((Ease::InOutCubic.apply(0.25) - 0.0625).abs() < 1e-12);
}

#[test]
fn input_is_clamped() {
    assert_eq!(Ease::InQuad.apply(-3.0), 0.0);
    assert_eq!(Ease::OutCubic.apply(7.0), 1.0);
}

#[test]
fn deserializes_snake_case() {
    let e: Ease = serde_json::from_str("\"in_out_cubic\"").unwrap();
    assert_eq!(e, Ease::InOutCubic);
    let e: Ease = serde_json::from_str("\"out_expo\"").unwrap();
    assert_eq!(e, Ease::OutExpo);
}
