use super::*;

#[test]
fn fps_frames_secs_roundtrip_floor() {
    let fps = Fps::new(30, 1).unwrap();
    let secs = fps.frames_to_secs(123);
    assert_eq!(secs, 4.1);
    assert_eq!(fps.secs_to_frames_floor(secs), 123);
}

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
}

#[test]
fn premul_rounds_half_up() {
    let c = Rgba8Premul::from_straight_rgba(255, 128, 0, 128);
    assert_eq!(c.to_array(), [128, 64, 0, 128]);
}

#[test]
fn default_props_are_identity() {
    let center = Point::new(40.0, 30.0);
    let t = VisualProps::default().to_affine(center, Vec2::new(80.0, 60.0));
    assert_eq!(t * Point::new(3.0, 7.0), Point::new(3.0, 7.0));
}

#[test]
fn props_scale_around_center_and_offset_by_own_size() {
    let center = Point::new(50.0, 50.0);
    let props = VisualProps {
        scale: 2.0,
        x_percent: 10.0,
        ..VisualProps::default()
    };
    let t = props.to_affine(center, Vec2::new(100.0, 100.0));
    let p = t * center;
    assert!((p.x - 60.0).abs() < 1e-9);
    assert!((p.y - 50.0).abs() < 1e-9);
    let q = t * Point::new(60.0, 50.0);
    assert!((q.x - 80.0).abs() < 1e-9);
}

#[test]
fn percent_space_maps_corners() {
    let vp = Viewport::new(200.0, 50.0, 1.0);
    assert_eq!(vp.percent_space() * Point::new(100.0, 100.0), Point::new(200.0, 50.0));
}
