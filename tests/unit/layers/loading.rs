use super::*;

fn vp() -> Viewport {
    Viewport::new(800.0, 400.0, 1.0)
}

#[test]
fn sparks_sit_on_the_anchor_grid() {
    let decor = LoadingDecorLayer::new(LoadingDecorConfig::default(), 3);
    assert_eq!(decor.sparks().len(), 14);
    let last = &decor.sparks()[13];
    assert_eq!(last.anchor, Point::new(88.0, 30.0));
    assert_eq!(decor.sparks()[6].anchor, Point::new(46.0, 20.0));
}

#[test]
fn ring_turns_once_per_spin() {
    let mut decor = LoadingDecorLayer::new(LoadingDecorConfig::default(), 3);
    assert_eq!(decor.ring_angle(1.0), 0.0);
    decor.mount(3.0);
    assert!((decor.ring_angle(3.6) - TAU / 4.0).abs() < 1e-9);
    assert!((decor.ring_angle(3.0 + 2.4 * 2.5) - TAU / 2.0).abs() < 1e-9);
}

#[test]
fn sparks_rise_and_stay_in_their_ranges() {
    let mut decor = LoadingDecorLayer::new(LoadingDecorConfig::default(), 11);
    decor.mount(0.0);
    let at_rest = decor.spark_states(vp(), 0.0);
    assert!(at_rest.iter().all(|s| (s.alpha - SPARK_REST_ALPHA).abs() < 1e-9));
    assert_eq!(at_rest[0].center, Point::new(80.0, 80.0));

    for t in [0.7, 1.9, 3.3, 8.0] {
        for (spark, st) in decor.sparks().iter().zip(decor.spark_states(vp(), t)) {
            let rest = Point::new(spark.anchor.x * 8.0, spark.anchor.y * 4.0);
            let d = st.center - rest;
            assert!(d.y <= 1e-9 && d.y >= -46.0);
            assert!(d.x.abs() <= 14.0);
            assert!((SPARK_REST_ALPHA - 1e-9..0.7).contains(&st.alpha));
        }
    }
}

#[test]
fn paints_ring_arc_and_sparks_only_while_mounted() {
    let mut decor = LoadingDecorLayer::new(LoadingDecorConfig::default(), 3);
    let mut list = DisplayList::new();
    decor.paint(vp(), &mut list);
    assert!(list.is_empty());

    decor.mount(3.0);
    decor.tick(3.4);
    decor.paint(vp(), &mut list);
    let ops = list.in_paint_order();
    assert_eq!(ops.len(), 2 + 14);
    assert!(ops.iter().all(|i| i.z == 30));
    assert_eq!(
        ops.iter()
            .filter(|i| matches!(i.op, DrawOp::StrokePath { .. }))
            .count(),
        2
    );

    decor.teardown();
    let mut after = DisplayList::new();
    decor.paint(vp(), &mut after);
    assert!(after.is_empty());
    decor.teardown();
}

#[test]
fn disabled_decor_never_mounts_and_holds_nothing() {
    let config = LoadingDecorConfig {
        enabled: false,
        ..LoadingDecorConfig::default()
    };
    assert_eq!(config.hold(), 0.0);
    let mut decor = LoadingDecorLayer::new(config, 3);
    decor.mount(1.0);
    assert!(!decor.is_mounted());
    assert!((LoadingDecorConfig::default().hold() - 0.6).abs() < 1e-12);
}
