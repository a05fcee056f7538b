use std::time::Duration;

use super::*;
use crate::{
    assets::InlineAssetSource,
    foundation::error::AssetError,
};

const ART: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 200 100">
  <path d="M10 10 L110 10" stroke="white" fill="none"/>
  <path d="M10 30 H60 V80 H10 Z" fill="white"/>
  <path d="M120 20 L180 80" stroke="white" fill="none"/>
</svg>"#;

const T: Duration = Duration::from_secs(5);

struct StatusSource(u16, &'static str);

impl AssetSource for StatusSource {
    fn fetch_bytes(&self, _location: &str, _timeout: Duration) -> Result<Vec<u8>, AssetError> {
        Err(AssetError::Status {
            code: self.0,
            reason: self.1.to_owned(),
        })
    }
}

struct SlowSource;

impl AssetSource for SlowSource {
    fn fetch_bytes(&self, _location: &str, timeout: Duration) -> Result<Vec<u8>, AssetError> {
        Err(AssetError::Timeout(timeout))
    }
}

fn loaded(targets: EffectTargets) -> RevealLayer {
    let src = InlineAssetSource::new().with("mem_mai.svg", ART).unwrap();
    let mut layer = RevealLayer::new(RevealConfig::default(), targets);
    layer.load(&src, "/mem_mai.svg", T);
    layer
}

fn assert_final(layer: &RevealLayer, now: f64) {
    for i in 0..3 {
        let s = layer.path_style(i, now).unwrap();
        assert!(s.dash_offset.abs() < 1e-9, "dash {i}: {}", s.dash_offset);
        assert!((s.fill_opacity - 1.0).abs() < 1e-9);
        assert!(s.stroke_opacity.abs() < 1e-9);
    }
    assert!((layer.group_scale(now) - 1.0).abs() < 1e-9);
}

#[test]
fn idle_paths_are_hidden() {
    let layer = loaded(EffectTargets::none());
    assert_eq!(layer.phase(), RevealPhase::Idle);
    let s = layer.path_style(0, 0.0).unwrap();
    assert!((s.dash_offset - 100.0).abs() < 1e-3);
    assert_eq!(s.fill_opacity, 0.0);
    assert_eq!(s.stroke_opacity, 1.0);
    assert_eq!(layer.group_scale(0.0), 1.25);
}

#[test]
fn phases_progress_and_complete_fires_once() {
    let mut layer = loaded(EffectTargets::all());
    assert_eq!(layer.start(10.0), None);
    assert_eq!(layer.phase(), RevealPhase::StrokeIn);

    // 3 paths: fill stagger ends at 1.2 + 0.16 + 1.2, background starts 0.2 later and the
    // bloom reveal (2.2 s) is the last tween.
    let end = 2.56 + 0.2 + 2.2;
    assert!((layer.reveal_duration() - end).abs() < 1e-9);

    assert_eq!(layer.tick(10.5), None);
    assert_eq!(layer.phase(), RevealPhase::StrokeIn);
    assert_eq!(layer.tick(11.5), None);
    assert_eq!(layer.phase(), RevealPhase::FillSwap);
    assert_eq!(layer.tick(13.0), None);
    assert_eq!(layer.phase(), RevealPhase::BackgroundReveal);

    assert_eq!(layer.tick(10.0 + end + 1e-6), Some(RevealEvent::DrawComplete));
    assert_eq!(layer.phase(), RevealPhase::Complete);
    assert_eq!(layer.tick(20.0), None);
    assert_eq!(layer.phase(), RevealPhase::Looping);
    assert_final(&layer, 20.0);
}

#[test]
fn stroke_draws_in_monotonically() {
    let mut layer = loaded(EffectTargets::none());
    layer.start(0.0);
    let mut prev = f64::INFINITY;
    for i in 0..=24 {
        let now = f64::from(i) * 0.1;
        let d = layer.path_style(0, now).unwrap().dash_offset;
        assert!(d <= prev + 1e-12);
        prev = d;
    }
    assert!(prev.abs() < 1e-9);
    // Later paths start after earlier ones.
    let a = layer.path_style(0, 0.5).unwrap().dash_offset / 100.0;
    let c = layer.path_style(2, 0.5).unwrap().dash_offset / (60.0f64 * 2.0f64.sqrt());
    assert!(a < c);
}

#[test]
fn restart_after_completion_snaps_without_replaying() {
    let mut layer = loaded(EffectTargets::all());
    layer.start(0.0);
    let end = layer.reveal_duration();
    assert_eq!(layer.tick(end), Some(RevealEvent::DrawComplete));

    assert_eq!(layer.start(30.0), None);
    assert_eq!(layer.phase(), RevealPhase::Looping);
    assert_final(&layer, 30.0);
    assert_eq!(layer.tick(30.1), None);
    assert_final(&layer, 30.1);

    let bg = layer.target_props(EffectTarget::Background, 30.0).unwrap();
    assert_eq!(bg.opacity, 1.0);
    assert_eq!(bg.scale, 1.0);
    assert_eq!(bg.blur_px, 0.0);
}

#[test]
fn restart_mid_draw_snaps_and_completes_once() {
    let mut layer = loaded(EffectTargets::none());
    layer.start(0.0);
    layer.tick(0.8);
    assert_eq!(layer.start(0.9), Some(RevealEvent::DrawComplete));
    assert_final(&layer, 0.9);
    assert_eq!(layer.tick(50.0), None);
    assert_eq!(layer.start(51.0), None);
}

#[test]
fn backdrop_follows_the_reveal_then_loops() {
    let mut layer = loaded(EffectTargets::all());
    layer.start(0.0);
    let bg_start = 2.56 + 0.2;

    let before = layer.target_props(EffectTarget::Background, 1.0).unwrap();
    assert_eq!(before.opacity, 0.0);
    assert_eq!(before.scale, 1.12);
    assert_eq!(before.blur_px, 12.0);
    assert_eq!(before.position_y_pct, 50.0);

    let haze = layer.target_props(EffectTarget::Haze, bg_start + 1.2).unwrap();
    assert!((haze.opacity - 0.65).abs() < 1e-9);
    assert_eq!(haze.x_percent, -2.0);

    let end = layer.reveal_duration();
    layer.tick(end);
    let bloom = layer.target_props(EffectTarget::Bloom, end + 3.8).unwrap();
    assert!((bloom.opacity - 0.55).abs() < 1e-9);
    let light = layer.target_props(EffectTarget::Light, end + 10.5).unwrap();
    assert!((light.x_percent - 18.0).abs() < 1e-9);
    assert!((light.rotate_deg - 6.0).abs() < 1e-9);
    let bg = layer.target_props(EffectTarget::Background, end + 18.0).unwrap();
    assert!((bg.position_y_pct - 52.0).abs() < 1e-9);
    assert!((layer.float_offset(end + 1.6) + 32.0).abs() < 1e-9);
    assert!((layer.glow_intensity(end + 3.6) - 1.0).abs() < 1e-9);
}

#[test]
fn absent_targets_are_skipped_silently() {
    let mut layer = loaded(EffectTargets {
        bloom: true,
        ..EffectTargets::none()
    });
    assert!(layer.target_props(EffectTarget::Background, 0.0).is_none());
    assert!(layer.target_props(EffectTarget::Light, 0.0).is_none());
    assert!(layer.target_props(EffectTarget::Bloom, 0.0).is_some());
    layer.start(0.0);
    // Without a background the bloom reveal starts with the stroke/fill swap.
    assert!((layer.reveal_duration() - (1.2 + 2.2)).abs() < 1e-9);
}

#[test]
fn animate_bg_off_drops_the_background_target() {
    let cfg = RevealConfig {
        animate_bg: false,
        ..RevealConfig::default()
    };
    let layer = RevealLayer::new(cfg, EffectTargets::all());
    assert!(!layer.targets().background);
    assert!(layer.targets().haze);
}

#[test]
fn not_found_status_renders_error_view_and_never_animates() {
    let mut layer = RevealLayer::new(RevealConfig::default(), EffectTargets::all());
    layer.load(&StatusSource(404, "Not Found"), "/mem_mai.svg", T);
    assert_eq!(
        layer.error_message(),
        Some("Failed to load SVG: Fetch failed: 404 Not Found")
    );
    assert_eq!(layer.start(0.0), None);
    assert_eq!(layer.tick(100.0), None);
    assert_eq!(layer.phase(), RevealPhase::Idle);
    assert!(!layer.is_drawn());
    assert!(layer.path_style(0, 1.0).is_none());
    assert!(layer.target_props(EffectTarget::Background, 1.0).is_none());

    let mut list = DisplayList::new();
    layer.paint(Viewport::default(), &mut list);
    assert!(!list.is_empty());
    assert!(list.in_paint_order().iter().all(|i| i.z == 20));
    assert!(
        list.in_paint_order()
            .iter()
            .any(|i| matches!(i.op, DrawOp::FillRect { .. }))
    );
}

fn font() -> TextEngine {
    let bytes = std::fs::read(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/data/fonts/DejaVuSans.ttf"
    ))
    .unwrap();
    TextEngine::from_font_bytes(&bytes).unwrap()
}

#[test]
fn error_view_draws_the_shaped_message() {
    let vp = Viewport::new(480.0, 270.0, 1.0);
    let mut layer = RevealLayer::new(RevealConfig::default(), EffectTargets::all());
    layer.load(&StatusSource(404, "Not Found"), "/mem_mai.svg", T);
    layer.shape_error(&mut font(), vp);
    let label = layer.error_label().unwrap();
    let visible = "Failed to load SVG: Fetch failed: 404 Not Found"
        .chars()
        .filter(|c| !c.is_whitespace())
        .count();
    assert!(label.glyph_count() >= visible);
    assert!(label.width <= vp.width * ERROR_WIDTH);

    let mut list = DisplayList::new();
    layer.paint(vp, &mut list);
    let text = list
        .in_paint_order()
        .iter()
        .filter_map(|i| match &i.op {
            DrawOp::Text { origin, text, .. } => Some((*origin, text.glyph_count())),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(text.len(), 1);
    let (origin, glyphs) = text[0];
    assert_eq!(glyphs, label.glyph_count());
    assert!(origin.x > 0.0 && origin.x < vp.width * 0.5);
    assert!(origin.y > 0.0 && origin.y < vp.height);
}

#[test]
fn error_frame_differs_from_an_empty_artwork_frame() {
    use crate::render::cpu::CpuRenderer;

    let vp = Viewport::new(240.0, 135.0, 1.0);
    let render = |layer: &RevealLayer| {
        let mut list = DisplayList::new();
        layer.paint(vp, &mut list);
        CpuRenderer::new().render(&list, 240, 135, 1.0, None).unwrap()
    };

    let empty_src = InlineAssetSource::new()
        .with("e.svg", r#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"/>"#)
        .unwrap();
    let mut empty = RevealLayer::new(RevealConfig::default(), EffectTargets::all());
    empty.load(&empty_src, "e.svg", T);
    empty.start(0.0);
    let blank = render(&empty);
    assert!(blank.is_transparent());

    let mut failed = RevealLayer::new(RevealConfig::default(), EffectTargets::all());
    failed.load(&StatusSource(404, "Not Found"), "e.svg", T);
    let without_label = render(&failed);
    assert_ne!(without_label, blank);

    failed.shape_error(&mut font(), vp);
    let with_label = render(&failed);
    assert_ne!(with_label, without_label);
}

#[test]
fn successful_load_clears_a_previous_error_label() {
    let vp = Viewport::new(480.0, 270.0, 1.0);
    let mut layer = RevealLayer::new(RevealConfig::default(), EffectTargets::none());
    layer.load(&SlowSource, "a.svg", T);
    layer.shape_error(&mut font(), vp);
    assert!(layer.error_label().is_some());

    let src = InlineAssetSource::new().with("mem_mai.svg", ART).unwrap();
    layer.load(&src, "mem_mai.svg", T);
    assert!(layer.error_message().is_none());
    assert!(layer.error_label().is_none());
    layer.shape_error(&mut font(), vp);
    assert!(layer.error_label().is_none());
}

#[test]
fn timeout_and_bad_markup_become_error_views() {
    let mut layer = RevealLayer::new(RevealConfig::default(), EffectTargets::none());
    layer.load(&SlowSource, "a.svg", Duration::from_millis(12_000));
    assert_eq!(
        layer.error_message(),
        Some("Failed to load SVG: timed out after 12s")
    );

    let src = InlineAssetSource::new().with("bad.svg", "<svg").unwrap();
    layer.load(&src, "bad.svg", T);
    assert!(
        layer
            .error_message()
            .is_some_and(|m| m.starts_with("Failed to load SVG: parse error"))
    );
}

#[test]
fn svg_without_paths_never_starts() {
    let src = InlineAssetSource::new()
        .with("e.svg", r#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"/>"#)
        .unwrap();
    let mut layer = RevealLayer::new(RevealConfig::default(), EffectTargets::all());
    layer.load(&src, "e.svg", T);
    assert!(layer.error_message().is_none());
    assert_eq!(layer.start(0.0), None);
    assert!(!layer.is_drawn());
}

#[test]
fn teardown_allows_a_fresh_draw_on_the_next_mount() {
    let mut layer = loaded(EffectTargets::none());
    layer.start(0.0);
    layer.tick(layer.reveal_duration());
    Layer::teardown(&mut layer);
    assert_eq!(layer.phase(), RevealPhase::Idle);
    assert_eq!(layer.start(100.0), None);
    assert_eq!(layer.phase(), RevealPhase::StrokeIn);
    assert_eq!(
        layer.tick(100.0 + layer.reveal_duration() + 1e-6),
        Some(RevealEvent::DrawComplete)
    );
}

#[test]
fn paint_emits_strokes_while_drawing_and_fills_when_done() {
    let vp = Viewport::new(800.0, 600.0, 1.0);
    let mut layer = loaded(EffectTargets::none());
    layer.start(0.0);
    Layer::tick(&mut layer, 0.6);
    let mut list = DisplayList::new();
    layer.paint(vp, &mut list);
    let strokes = list
        .in_paint_order()
        .iter()
        .filter(|i| matches!(i.op, DrawOp::StrokePath { .. }))
        .count();
    assert_eq!(strokes, 3);

    Layer::tick(&mut layer, 10.0);
    let mut list = DisplayList::new();
    layer.paint(vp, &mut list);
    let ops = list.in_paint_order();
    assert!(ops.iter().all(|i| !matches!(i.op, DrawOp::StrokePath { .. })));
    assert_eq!(
        ops.iter()
            .filter(|i| matches!(i.op, DrawOp::FillPath { .. }))
            .count(),
        3
    );
}

#[test]
fn dashed_keeps_the_visible_prefix() {
    let mut line = BezPath::new();
    line.move_to((0.0, 0.0));
    line.line_to((100.0, 0.0));
    assert!(dashed(&line, 100.0, 100.0).is_none());
    assert_eq!(dashed(&line, 100.0, 0.0), Some(line.clone()));
    let part = dashed(&line, 100.0, 40.0).unwrap();
    let len = kurbo::Shape::perimeter(&part, 0.1);
    assert!((len - 60.0).abs() < 1e-6);
}

#[test]
fn trait_tick_records_completion_in_layer_state() {
    let mut layer = loaded(EffectTargets::none());
    layer.start(0.0);
    let t = layer.reveal_duration() + 1e-6;
    Layer::tick(&mut layer, t);
    assert_eq!(layer.phase(), RevealPhase::Complete);
    assert_eq!(layer.tick(layer.reveal_duration() + 1.0), None);
    assert_eq!(layer.phase(), RevealPhase::Looping);
}
