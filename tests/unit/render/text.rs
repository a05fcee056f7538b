use super::*;

fn font_bytes() -> Vec<u8> {
    std::fs::read(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/data/fonts/DejaVuSans.ttf"
    ))
    .unwrap()
}

#[test]
fn registers_the_font_family() {
    let engine = TextEngine::from_font_bytes(&font_bytes()).unwrap();
    assert_eq!(engine.family(), "DejaVu Sans");
}

#[test]
fn garbage_bytes_are_rejected() {
    let err = TextEngine::from_font_bytes(b"not a font").unwrap_err();
    assert!(matches!(err, StageError::Validation(_)));
}

#[test]
fn shapes_one_glyph_per_visible_char() {
    let mut engine = TextEngine::from_font_bytes(&font_bytes()).unwrap();
    let shaped = engine.shape("Sheep", 20.0, None).unwrap();
    assert_eq!(shaped.glyph_count(), 5);
    assert!(shaped.width > 20.0);
    assert!(shaped.height >= 20.0);
    assert!(shaped.runs.iter().all(|r| r.font_size == 20.0));
}

#[test]
fn glyphs_advance_left_to_right() {
    let mut engine = TextEngine::from_font_bytes(&font_bytes()).unwrap();
    let shaped = engine.shape("abc", 16.0, None).unwrap();
    let xs: Vec<f32> = shaped.runs[0].glyphs.iter().map(|g| g.x).collect();
    assert!(xs.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn max_width_wraps_onto_more_lines() {
    let mut engine = TextEngine::from_font_bytes(&font_bytes()).unwrap();
    let one = engine.shape("Failed to load SVG: not found", 14.0, None).unwrap();
    let wrapped = engine
        .shape("Failed to load SVG: not found", 14.0, Some(80.0))
        .unwrap();
    assert!(wrapped.height > one.height * 1.5);
    assert!(wrapped.width <= 80.0 + 1e-3);
}

#[test]
fn non_positive_size_is_rejected() {
    let mut engine = TextEngine::from_font_bytes(&font_bytes()).unwrap();
    assert!(engine.shape("x", 0.0, None).is_err());
    assert!(engine.shape("x", f32::NAN, None).is_err());
}
