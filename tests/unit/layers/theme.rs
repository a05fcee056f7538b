use std::time::Duration;

use super::*;
use crate::assets::InlineAssetSource;

fn switcher(config: ThemeSwitcherConfig, theme: Option<Theme>) -> (ThemeSwitcher, Rc<ThemeCell>) {
    let cell = Rc::new(ThemeCell::new(theme));
    let sw = ThemeSwitcher::new(config, Rc::clone(&cell)).unwrap();
    (sw, cell)
}

fn mount(sw: &mut ThemeSwitcher, now: f64) -> Vec<PreloadOutcome> {
    let source = InlineAssetSource::new();
    let preloader = Preloader::new(&source, Duration::from_millis(50));
    sw.mount(now, &preloader)
}

fn run(sw: &mut ThemeSwitcher, until: f64, step: f64) -> Vec<SwitcherEvent> {
    let mut out = Vec::new();
    let mut now = 0.0;
    while now <= until {
        out.extend(sw.tick(now));
        now += step;
    }
    out
}

#[test]
fn rejects_swap_after_cover() {
    let config = ThemeSwitcherConfig {
        swap_at_ms: 1200,
        ..ThemeSwitcherConfig::default()
    };
    assert!(ThemeSwitcher::new(config, Rc::new(ThemeCell::default())).is_err());
    let zero = ThemeSwitcherConfig {
        interval_ms: 0,
        ..ThemeSwitcherConfig::default()
    };
    assert!(zero.validate().is_err());
}

#[test]
fn mount_forces_light_after_preload_even_when_images_fail() {
    let (mut sw, cell) = switcher(ThemeSwitcherConfig::default(), None);
    let outcomes = mount(&mut sw, 0.0);
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| !o.is_loaded()));
    assert_eq!(cell.get(), Some(Theme::Light));
    assert!(sw.is_mounted());
}

#[test]
fn mount_keeps_an_existing_theme() {
    let (mut sw, cell) = switcher(ThemeSwitcherConfig::default(), Some(Theme::Dark));
    mount(&mut sw, 0.0);
    assert_eq!(cell.get(), Some(Theme::Dark));
}

#[test]
fn one_cycle_follows_the_cover_schedule() {
    let (mut sw, cell) = switcher(ThemeSwitcherConfig::default(), None);
    mount(&mut sw, 0.0);
    assert!(sw.tick(9.99).is_empty());

    let ev = sw.tick(10.0);
    assert_eq!(ev, vec![SwitcherEvent::CoverStarted { at: 10.0 }]);
    assert!(sw.is_busy());
    assert!(sw.cover_on());
    assert_eq!(cell.get(), Some(Theme::Light));

    let ev = sw.tick(10.6);
    assert!(matches!(
        ev.as_slice(),
        [SwitcherEvent::ThemeSwapped { theme: Theme::Dark, .. }]
    ));
    assert_eq!(cell.get(), Some(Theme::Dark));
    assert_eq!(sw.state(), SwitcherState::Swapping);

    let ev = sw.tick(11.25);
    assert!(matches!(ev.as_slice(), [SwitcherEvent::UncoverStarted { .. }]));
    assert!(!sw.cover_on());
    assert!(sw.is_busy());

    let ev = sw.tick(11.6);
    assert!(matches!(ev.as_slice(), [SwitcherEvent::Released { .. }]));
    assert!(!sw.is_busy());
    assert_eq!(sw.state(), SwitcherState::Idle);
}

#[test]
fn cover_opacity_fades_in_holds_and_fades_out() {
    let (mut sw, _) = switcher(ThemeSwitcherConfig::default(), None);
    mount(&mut sw, 0.0);
    assert_eq!(sw.cover_opacity(5.0), 0.0);
    sw.tick(10.0);
    assert_eq!(sw.cover_opacity(10.0), 0.0);
    assert!((sw.cover_opacity(10.15) - 0.5).abs() < 1e-9);
    assert_eq!(sw.cover_opacity(10.9), 1.0);
    assert!((sw.cover_opacity(11.35) - 0.5).abs() < 1e-9);
    sw.tick(11.5);
    assert_eq!(sw.cover_opacity(11.5), 0.0);
}

#[test]
fn cycles_never_overlap() {
    let timings = [
        (10_000, 1200, 520, 300),
        (1000, 1200, 520, 300),
        (500, 900, 100, 600),
        (1500, 1200, 1199, 0),
        (300, 250, 50, 50),
    ];
    for (interval_ms, cover_ms, swap_at_ms, fade_ms) in timings {
        let config = ThemeSwitcherConfig {
            interval_ms,
            cover_ms,
            swap_at_ms,
            fade_ms,
            ..ThemeSwitcherConfig::default()
        };
        for step in [1.0 / 60.0, 0.25, 3.0] {
            let (mut sw, _) = switcher(config.clone(), None);
            mount(&mut sw, 0.0);
            let events = run(&mut sw, 40.0, step);

            let mut open: Option<f64> = None;
            let mut cycles = 0;
            let mut last_at = f64::NEG_INFINITY;
            for ev in &events {
                let at = match *ev {
                    SwitcherEvent::CoverStarted { at } => {
                        assert!(open.is_none(), "cover started while busy: {config:?}");
                        open = Some(at);
                        cycles += 1;
                        at
                    }
                    SwitcherEvent::ThemeSwapped { at, .. } | SwitcherEvent::UncoverStarted { at } => {
                        assert!(open.is_some());
                        at
                    }
                    SwitcherEvent::Released { at } => {
                        let start = open.take().unwrap();
                        let expected = (cover_ms + fade_ms) as f64 / 1000.0;
                        assert!((at - start - expected).abs() < 1e-9);
                        at
                    }
                };
                assert!(at >= last_at, "events out of order");
                last_at = at;
            }
            assert!(cycles > 0);
        }
    }
}

#[test]
fn every_swap_toggles() {
    let config = ThemeSwitcherConfig {
        interval_ms: 2000,
        ..ThemeSwitcherConfig::default()
    };
    let (mut sw, _) = switcher(config, None);
    mount(&mut sw, 0.0);
    let themes: Vec<Theme> = run(&mut sw, 20.0, 0.1)
        .into_iter()
        .filter_map(|e| match e {
            SwitcherEvent::ThemeSwapped { theme, .. } => Some(theme),
            _ => None,
        })
        .collect();
    assert!(themes.len() >= 8);
    for pair in themes.windows(2) {
        assert_eq!(pair[1], pair[0].toggled());
    }
}

#[test]
fn teardown_cancels_everything() {
    let (mut sw, cell) = switcher(ThemeSwitcherConfig::default(), None);
    mount(&mut sw, 0.0);
    sw.tick(10.0);
    assert!(sw.pending_timers() > 1);
    sw.teardown();
    assert_eq!(sw.pending_timers(), 0);
    assert!(!sw.is_mounted());
    assert!(sw.tick(100.0).is_empty());
    assert_eq!(cell.get(), Some(Theme::Light));
    sw.teardown();
}

#[test]
fn paints_cover_only_while_visible() {
    let (mut sw, _) = switcher(ThemeSwitcherConfig::default(), None);
    mount(&mut sw, 0.0);
    let vp = Viewport::new(400.0, 300.0, 1.0);
    let mut list = DisplayList::new();
    Layer::paint(&sw, vp, &mut list);
    assert!(list.is_empty());
    Layer::tick(&mut sw, 10.0);
    Layer::tick(&mut sw, 10.5);
    Layer::paint(&sw, vp, &mut list);
    assert_eq!(list.len(), 2);
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
fn compact_viewports_get_a_bigger_centerpiece_and_smaller_caption() {
    let config = ThemeSwitcherConfig::default();
    let wide = Viewport::new(1280.0, 720.0, 1.0);
    let narrow = Viewport::new(390.0, 844.0, 3.0);
    assert!(!config.is_compact(wide));
    assert!(config.is_compact(narrow));
    assert!(config.is_compact(Viewport::new(768.0, 1024.0, 1.0)));
    assert!((config.centerpiece_size(wide) - 144.0).abs() < 1e-9);
    assert!((config.centerpiece_size(narrow) - 156.0).abs() < 1e-9);
    assert!(config.caption_size(narrow) < config.caption_size(wide));

    let bad = ThemeSwitcherConfig {
        compact_caption_px: 0.0,
        ..ThemeSwitcherConfig::default()
    };
    assert!(bad.validate().is_err());
}

#[test]
fn cover_shows_the_caption_under_the_centerpiece() {
    let (mut sw, _) = switcher(ThemeSwitcherConfig::default(), None);
    mount(&mut sw, 0.0);
    let vp = Viewport::new(1280.0, 720.0, 1.0);
    sw.shape_caption(&mut font(), vp);
    let wide_caption = sw.caption().unwrap().clone();
    assert!(wide_caption.glyph_count() >= "Switchingvibe…".chars().count());
    assert!(wide_caption.runs.iter().all(|r| r.font_size == 16.0));

    Layer::tick(&mut sw, 10.0);
    Layer::tick(&mut sw, 10.5);
    let mut list = DisplayList::new();
    Layer::paint(&sw, vp, &mut list);
    let ops = list.in_paint_order();
    assert_eq!(ops.len(), 3);
    let Some(DrawOp::Text { origin, color, .. }) = ops.iter().map(|i| &i.op).last() else {
        panic!("caption missing");
    };
    assert!((origin.x + wide_caption.width * 0.5 - 640.0).abs() < 1e-6);
    assert!((origin.y - (360.0 + 72.0 + CAPTION_GAP)).abs() < 1e-6);
    assert!(color.a > 0.0);

    let phone = Viewport::new(390.0, 844.0, 3.0);
    sw.shape_caption(&mut font(), phone);
    let compact = sw.caption().unwrap();
    assert!(compact.runs.iter().all(|r| r.font_size == 13.0));
    assert!(compact.width < wide_caption.width);
}

#[test]
fn trait_tick_still_runs_the_cycle() {
    let (mut sw, _) = switcher(ThemeSwitcherConfig::default(), None);
    mount(&mut sw, 0.0);
    Layer::tick(&mut sw, 10.0);
    assert!(sw.is_busy());
    Layer::tick(&mut sw, 12.0);
    assert!(!sw.is_busy());
}
