use super::*;

const ALL: [Ease; 10] = [
    Ease::Linear,
    Ease::InQuad,
    Ease::OutQuad,
    Ease::InOutQuad,
    Ease::InCubic,
    Ease::OutCubic,
    Ease::InOutCubic,
    Ease::OutQuart,
    Ease::OutSine,
    Ease::InOutSine,
];

#[test]
fn endpoints_are_fixed() {
    for ease in ALL {
        assert!(ease.apply(0.0).abs() < 1e-12, "{ease:?} at 0");
        assert!((ease.apply(1.0) - 1.0).abs() < 1e-12, "{ease:?} at 1");
    }
}

#[test]
fn input_is_clamped() {
    for ease in ALL {
        assert_eq!(ease.apply(-3.0), ease.apply(0.0));
        assert_eq!(ease.apply(7.0), ease.apply(1.0));
    }
}

#[test]
fn curves_are_monotonic() {
    for ease in ALL {
        let mut prev = ease.apply(0.0);
        for i in 1..=100 {
            let v = ease.apply(i as f64 / 100.0);
            assert!(v + 1e-12 >= prev, "{ease:?} decreases at {i}");
            prev = v;
        }
    }
}

#[test]
fn out_curves_lead_linear() {
    assert!(Ease::OutQuad.apply(0.5) > 0.5);
    assert!(Ease::OutCubic.apply(0.5) > Ease::OutQuad.apply(0.5));
    assert!(Ease::OutQuart.apply(0.5) > Ease::OutCubic.apply(0.5));
    assert!((Ease::InOutSine.apply(0.5) - 0.5).abs() < 1e-12);
}
