use super::*;

fn vp() -> Viewport {
    Viewport::new(1000.0, 500.0, 1.0)
}

#[test]
fn rays_fan_from_the_configured_origin() {
    let rays = SunRaysLayer::new(SunRaysConfig::default(), 7);
    assert_eq!(rays.rays().len(), 14);
    let origin = RayOrigin::TopLeft.point();
    for ray in rays.rays() {
        assert!(((ray.from - origin).hypot() - 18.0).abs() < 1e-9);
        assert!(((ray.to - origin).hypot() - 120.0).abs() < 1e-9);
        assert!((0.8..2.2).contains(&ray.width));
        assert!((0.18..0.55).contains(&ray.opacity));
    }
    let first = rays.rays()[0];
    let angle = (first.to - first.from).atan2().to_degrees();
    assert!((angle - (18.0 - 32.5)).abs() < 1e-9);

    let centered = SunRaysLayer::new(
        SunRaysConfig {
            origin: RayOrigin::TopCenter,
            rays: 1,
            ..SunRaysConfig::default()
        },
        7,
    );
    let only = centered.rays()[0];
    assert!((only.from.x - 50.0).abs() < 1e-9);
    assert!((only.from.y - 26.0).abs() < 1e-9);
}

#[test]
fn rays_draw_in_with_stagger() {
    let mut rays = SunRaysLayer::new(SunRaysConfig::default(), 1);
    assert_eq!(rays.drawn_fraction(0, 5.0), 0.0);
    rays.mount(2.0);
    assert_eq!(rays.drawn_fraction(0, 2.0), 0.0);
    assert!(rays.drawn_fraction(0, 2.5) > rays.drawn_fraction(13, 2.5));
    assert!(!rays.is_drawn(3.0));
    let end = 2.0 + 1.6 + 13.0 * 0.06;
    assert!(rays.is_drawn(end + 1e-6));
    assert_eq!(rays.drawn_fraction(13, end + 1e-6), 1.0);
}

#[test]
fn rays_breathe_and_sway() {
    let mut rays = SunRaysLayer::new(SunRaysConfig::default(), 1);
    rays.mount(0.0);
    assert!((rays.group_opacity(0.0) - 0.08).abs() < 1e-12);
    assert!((rays.group_opacity(3.6) - 0.22).abs() < 1e-12);
    assert!((rays.group_opacity(7.2) - 0.08).abs() < 1e-12);
    assert_eq!(rays.group_transform(0.0), Affine::IDENTITY);
    let origin = RayOrigin::TopLeft.point();
    let pinned = rays.group_transform(5.0) * origin;
    assert!((pinned - origin).hypot() < 1e-9);
}

#[test]
fn disabled_rays_never_mount() {
    let mut rays = SunRaysLayer::new(
        SunRaysConfig {
            enabled: false,
            ..SunRaysConfig::default()
        },
        1,
    );
    rays.mount(0.0);
    assert!(!rays.is_mounted());
    let mut list = DisplayList::new();
    rays.paint(vp(), &mut list);
    assert!(list.is_empty());
}

#[test]
fn rays_paint_wash_then_visible_segments() {
    let mut rays = SunRaysLayer::new(SunRaysConfig::default(), 3);
    rays.mount(0.0);
    rays.tick(0.0);
    let mut list = DisplayList::new();
    rays.paint(vp(), &mut list);
    assert_eq!(list.len(), 1);

    rays.tick(30.0);
    let mut list = DisplayList::new();
    rays.paint(vp(), &mut list);
    // The last segment sits at the transparent end of the gradient.
    assert!(list.len() > 14 * (RAY_SEGMENTS - 1));

    rays.teardown();
    let mut list = DisplayList::new();
    rays.paint(vp(), &mut list);
    assert!(list.is_empty());
}

#[test]
fn dust_layout_is_within_bounds_and_seeded() {
    let a = SparkleDustLayer::new(SparkleDustConfig::default(), 11);
    let b = SparkleDustLayer::new(SparkleDustConfig::default(), 11);
    assert_eq!(a.motes().len(), 42);
    for (m, n) in a.motes().iter().zip(b.motes()) {
        assert_eq!(m.center, n.center);
        assert!((8.0..92.0).contains(&m.center.x));
        assert!((10.0..90.0).contains(&m.center.y));
        assert!((0.5..1.8).contains(&m.radius));
        assert!((0.12..0.42).contains(&m.rest_alpha));
    }
}

#[test]
fn dust_reveals_with_stagger_then_twinkles() {
    let mut dust = SparkleDustLayer::new(SparkleDustConfig::default(), 5);
    assert!(dust.states(1.0).is_empty());
    dust.mount(1.0);

    let start = dust.states(1.0);
    assert!(start.iter().all(|s| s.alpha == 0.0));

    let revealed = dust.states(1.0 + 0.8 + 0.02 * 41.0 - 1e-6);
    let last = dust.motes().len() - 1;
    assert!(revealed[0].alpha > 0.0);
    assert!(revealed[last].alpha > 0.0);

    let idx = 3;
    let rest_at = 1.0 + 0.8 + 0.02 * idx as f64;
    let settled = dust.states(rest_at)[idx];
    assert!((settled.alpha - dust.motes()[idx].rest_alpha).abs() < 1e-9);

    for t in [10.0, 25.0, 60.0] {
        for s in dust.states(t) {
            assert!((0.0..=0.55).contains(&s.alpha));
            assert!(s.radius > 0.0);
        }
    }
}

#[test]
fn dust_drift_stays_in_range() {
    let mut dust = SparkleDustLayer::new(SparkleDustConfig::default(), 9);
    dust.mount(0.0);
    for t in [0.0, 3.0, 7.5, 40.0] {
        for (s, m) in dust.states(t).iter().zip(dust.motes()) {
            let d = s.center - m.center;
            assert!((-8.0..=10.0).contains(&d.x));
            assert!((-10.0..=8.0).contains(&d.y));
        }
    }
}

#[test]
fn cloud_bands_alternate_drift() {
    let mut clouds = CloudBandsLayer::new(CloudBandsConfig::default());
    let bands = clouds.bands();
    assert_eq!(bands.len(), 4);
    assert!((bands[0].opacity - 0.22).abs() < 1e-12);
    assert!((bands[3].opacity - 0.13).abs() < 1e-12);
    assert!((bands[0].offset(22.0) - 9.6).abs() < 1e-9);
    assert!((bands[1].offset(28.0) + 9.6).abs() < 1e-9);
    assert!(bands[2].offset(34.0 * 2.0).abs() < 1e-9);

    clouds.mount(0.0);
    clouds.tick(5.0);
    let mut list = DisplayList::new();
    clouds.paint(vp(), &mut list);
    assert_eq!(list.len(), 4 * CLOUD_SLICES);
}

#[test]
fn halo_breathes_between_bounds() {
    let mut halo = SunHaloLayer::new(SunHaloConfig::default());
    assert!(halo.breath(0.0).is_none());
    halo.mount(1.0);
    assert_eq!(halo.breath(1.0), Some((0.96, 0.18)));
    let (s, o) = halo.breath(5.5).unwrap();
    assert!((s - 1.04).abs() < 1e-12);
    assert!((o - 0.32).abs() < 1e-12);
    for t in [2.0, 7.3, 100.0] {
        let (s, o) = halo.breath(t).unwrap();
        assert!((0.96..=1.04).contains(&s));
        assert!((0.18..=0.32).contains(&o));
    }
    halo.teardown();
    assert!(!halo.is_mounted());
}
