//! Hand-drawn reveal of a vector illustration.
//!
//! One pass per mount: stroke draw-in, stroke/fill swap, backdrop reveal, a single completion
//! event, then infinite ambient loops. Starting again on the same mount snaps to the final state.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use crate::{
    animation::{ease::Ease, timeline::Timeline, tween::Tween},
    assets::{AssetSource, svg::RevealArtwork},
    foundation::{
        color::Color,
        core::{Affine, BezPath, Point, Rect, Vec2, Viewport, VisualProps},
        math::lerp,
    },
    layers::Layer,
    render::{
        display::{DisplayList, DrawOp},
        text::{ShapedText, TextEngine},
    },
};

const INK: Color = Color::rgba(245.0 / 255.0, 245.0 / 255.0, 245.0 / 255.0, 0.95);
const GLOW_TINT: Color = Color::rgba(1.0, 220.0 / 255.0, 160.0 / 255.0, 1.0);
const STROKE_WIDTH: f64 = 1.5;
/// Fraction of the viewport the illustration may occupy.
const FIT_BOX: Vec2 = Vec2::new(0.8, 0.6);

const FILL_AT: f64 = 1.2;

const ERROR_PANEL: Color = Color::rgba(12.0 / 255.0, 14.0 / 255.0, 24.0 / 255.0, 0.55);
const ERROR_MARK: Color = Color::rgba(1.0, 200.0 / 255.0, 120.0 / 255.0, 0.9);
const ERROR_TEXT_PX: f32 = 15.0;
const ERROR_PAD: f64 = 14.0;
/// Width of the error panel as a fraction of the viewport.
const ERROR_WIDTH: f64 = 0.7;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    pub z_index: i32,
    pub bg_opacity: f64,
    pub bg_scale: f64,
    pub bg_blur_px: f64,
    pub bg_duration: f64,
    pub bg_delay: f64,

    pub glow: bool,
    pub glow_duration: f64,

    pub parallax: bool,
    pub parallax_duration: f64,
    /// Background vertical position at rest, percent.
    pub parallax_from: f64,
    pub parallax_to: f64,

    pub haze: bool,
    pub haze_duration: f64,
    pub haze_x_percent: f64,
    pub haze_opacity: f64,

    pub bloom: bool,
    pub bloom_reveal_duration: f64,
    pub bloom_breath_duration: f64,
    pub bloom_opacity: f64,

    pub light: bool,
    pub light_reveal_duration: f64,
    pub light_opacity: f64,
    pub light_duration: f64,

    pub float_text: bool,
    pub float_distance_px: f64,
    pub float_duration: f64,

    pub fetch_timeout_ms: u64,
    pub animate_bg: bool,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            z_index: 20,
            bg_opacity: 1.0,
            bg_scale: 1.0,
            bg_blur_px: 0.0,
            bg_duration: 1.6,
            bg_delay: 0.2,
            glow: true,
            glow_duration: 3.6,
            parallax: true,
            parallax_duration: 18.0,
            parallax_from: 50.0,
            parallax_to: 52.0,
            haze: true,
            haze_duration: 14.0,
            haze_x_percent: 2.0,
            haze_opacity: 0.65,
            bloom: true,
            bloom_reveal_duration: 2.2,
            bloom_breath_duration: 3.8,
            bloom_opacity: 0.55,
            light: true,
            light_reveal_duration: 1.8,
            light_opacity: 0.55,
            light_duration: 10.5,
            float_text: true,
            float_distance_px: 32.0,
            float_duration: 1.6,
            fetch_timeout_ms: 12_000,
            animate_bg: true,
        }
    }
}

impl RevealConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

/// Backdrop elements the reveal may animate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EffectTarget {
    Background,
    Haze,
    Bloom,
    Light,
}

/// Which backdrop elements the composer hands to the reveal. Missing ones are skipped silently.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EffectTargets {
    pub background: bool,
    pub haze: bool,
    pub bloom: bool,
    pub light: bool,
}

impl EffectTargets {
    pub fn all() -> Self {
        Self {
            background: true,
            haze: true,
            bloom: true,
            light: true,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn has(&self, target: EffectTarget) -> bool {
        match target {
            EffectTarget::Background => self.background,
            EffectTarget::Haze => self.haze,
            EffectTarget::Bloom => self.bloom,
            EffectTarget::Light => self.light,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TargetProp {
    Opacity,
    Scale,
    Blur,
    XPercent,
    YPercent,
    Rotate,
    PositionY,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Track {
    GroupScale,
    Dash(usize),
    Fill(usize),
    Stroke(usize),
    Target(EffectTarget, TargetProp),
    Glow,
    Float,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealPhase {
    Idle,
    StrokeIn,
    FillSwap,
    BackgroundReveal,
    Complete,
    Looping,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealEvent {
    DrawComplete,
}

/// What the layer currently shows.
#[derive(Clone, Debug)]
pub enum RevealView {
    /// Nothing loaded yet.
    Pending,
    Artwork(RevealArtwork),
    /// Literal message shown instead of the illustration.
    Error(String),
}

/// Per-path draw state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathStyle {
    pub dash_offset: f64,
    pub fill_opacity: f64,
    pub stroke_opacity: f64,
}

#[derive(Debug)]
pub struct RevealLayer {
    config: RevealConfig,
    targets: EffectTargets,
    view: RevealView,
    error_label: Option<Arc<ShapedText>>,
    timeline: Timeline<Track>,
    initial: BTreeMap<Track, f64>,
    settled: BTreeMap<Track, f64>,
    loops: BTreeMap<Track, Tween<f64>>,
    bg_start: Option<f64>,
    started_at: Option<f64>,
    loops_from: Option<f64>,
    drawn: bool,
    snapped: bool,
    completed: bool,
    phase: RevealPhase,
    now: f64,
}

impl RevealLayer {
    pub fn new(config: RevealConfig, targets: EffectTargets) -> Self {
        let targets = EffectTargets {
            background: targets.background && config.animate_bg,
            ..targets
        };
        Self {
            config,
            targets,
            view: RevealView::Pending,
            error_label: None,
            timeline: Timeline::new(),
            initial: BTreeMap::new(),
            settled: BTreeMap::new(),
            loops: BTreeMap::new(),
            bg_start: None,
            started_at: None,
            loops_from: None,
            drawn: false,
            snapped: false,
            completed: false,
            phase: RevealPhase::Idle,
            now: 0.0,
        }
    }

    pub fn config(&self) -> &RevealConfig {
        &self.config
    }

    pub fn targets(&self) -> EffectTargets {
        self.targets
    }

    /// Fetch and parse the illustration. Failures become the error view; nothing propagates.
    #[tracing::instrument(skip(self, source), fields(location = %location))]
    pub fn load(&mut self, source: &dyn AssetSource, location: &str, timeout: Duration) {
        let parsed = source
            .fetch_text(location, timeout)
            .and_then(|text| RevealArtwork::parse(&text));
        match parsed {
            Ok(art) => {
                tracing::debug!(paths = art.paths.len(), "reveal artwork loaded");
                self.set_artwork(art);
            }
            Err(err) => {
                tracing::warn!(error = %err, "reveal artwork failed to load");
                self.view = RevealView::Error(format!("Failed to load SVG: {err}"));
                self.error_label = None;
                self.timeline = Timeline::new();
            }
        }
    }

    pub fn set_artwork(&mut self, art: RevealArtwork) {
        self.build(&art);
        self.view = RevealView::Artwork(art);
        self.error_label = None;
    }

    /// Lay out the error message for `viewport`. Without a label the error view still draws its
    /// panel and warning mark.
    pub fn shape_error(&mut self, engine: &mut TextEngine, viewport: Viewport) {
        let RevealView::Error(msg) = &self.view else {
            return;
        };
        let max_width = (viewport.width * ERROR_WIDTH - 2.0 * ERROR_PAD).max(1.0) as f32;
        match engine.shape(msg, ERROR_TEXT_PX, Some(max_width)) {
            Ok(label) => self.error_label = Some(label),
            Err(err) => tracing::warn!(error = %err, "reveal error label not shaped"),
        }
    }

    pub fn error_label(&self) -> Option<&ShapedText> {
        self.error_label.as_deref()
    }

    pub fn view(&self) -> &RevealView {
        &self.view
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.view {
            RevealView::Error(msg) => Some(msg),
            _ => None,
        }
    }

    fn artwork(&self) -> Option<&RevealArtwork> {
        match &self.view {
            RevealView::Artwork(art) if !art.is_empty() => Some(art),
            _ => None,
        }
    }

    fn build(&mut self, art: &RevealArtwork) {
        let c = &self.config;
        let t = self.targets;
        let mut tl = Timeline::new();
        let mut initial = BTreeMap::new();
        let mut settled = BTreeMap::new();
        let mut loops = BTreeMap::new();

        let n = art.paths.len();
        initial.insert(Track::GroupScale, 1.25);
        settled.insert(Track::GroupScale, 1.0);
        tl.to(
            Track::GroupScale,
            Tween::new(1.25, 1.0, 2.4, Ease::OutQuart),
            0.0,
        );
        for (i, p) in art.paths.iter().enumerate() {
            initial.insert(Track::Dash(i), p.length);
            initial.insert(Track::Fill(i), 0.0);
            initial.insert(Track::Stroke(i), 1.0);
            settled.insert(Track::Dash(i), 0.0);
            settled.insert(Track::Fill(i), 1.0);
            settled.insert(Track::Stroke(i), 0.0);
        }
        tl.stagger((0..n).map(Track::Dash), 0.0, 0.12, |i, _| {
            Tween::new(art.paths[i].length, 0.0, 2.2, Ease::OutCubic)
        });
        tl.stagger((0..n).map(Track::Fill), FILL_AT, 0.08, |_, _| {
            Tween::new(0.0, 1.0, 1.2, Ease::OutCubic)
        });
        tl.stagger((0..n).map(Track::Stroke), FILL_AT, 0.08, |_, _| {
            Tween::new(1.0, 0.0, 1.2, Ease::OutCubic)
        });

        use EffectTarget::*;
        use TargetProp::*;
        let key = Track::Target;

        let mut bg_start = None;
        if t.background {
            let at = tl.natural_duration() + c.bg_delay;
            bg_start = Some(at);
            for (prop, from, to) in [
                (Opacity, 0.0, c.bg_opacity),
                (Scale, 1.12, c.bg_scale),
                (Blur, 12.0, c.bg_blur_px),
            ] {
                initial.insert(key(Background, prop), from);
                settled.insert(key(Background, prop), to);
                tl.to(
                    key(Background, prop),
                    Tween::new(from, to, c.bg_duration, Ease::OutQuart),
                    at,
                );
            }
            if c.parallax {
                initial.insert(key(Background, PositionY), c.parallax_from);
                settled.insert(key(Background, PositionY), c.parallax_from);
            }
        }
        // Later backdrop tweens start together with the previous one.
        let with_bg = tl.last_start();

        if t.haze {
            initial.insert(key(Haze, Opacity), 0.0);
            initial.insert(key(Haze, XPercent), -c.haze_x_percent);
            settled.insert(key(Haze, Opacity), c.haze_opacity);
            settled.insert(key(Haze, XPercent), -c.haze_x_percent);
            if c.haze {
                tl.to(
                    key(Haze, Opacity),
                    Tween::new(0.0, c.haze_opacity, 1.2, Ease::OutCubic),
                    with_bg,
                );
            }
        }
        if t.bloom {
            initial.insert(key(Bloom, Opacity), 0.0);
            initial.insert(key(Bloom, Scale), 1.03);
            settled.insert(key(Bloom, Opacity), 1.0);
            settled.insert(key(Bloom, Scale), 1.03);
            if c.bloom {
                tl.to(
                    key(Bloom, Opacity),
                    Tween::new(0.0, 1.0, c.bloom_reveal_duration, Ease::OutCubic),
                    with_bg,
                );
            }
        }
        if t.light {
            for (prop, v) in [
                (Opacity, 0.0),
                (XPercent, -18.0),
                (YPercent, 6.0),
                (Rotate, -8.0),
                (Scale, 1.05),
            ] {
                initial.insert(key(Light, prop), v);
                settled.insert(key(Light, prop), v);
            }
            settled.insert(key(Light, Opacity), c.light_opacity);
            if c.light {
                tl.to(
                    key(Light, Opacity),
                    Tween::new(0.0, c.light_opacity, c.light_reveal_duration, Ease::OutCubic),
                    with_bg,
                );
            }
        }

        initial.insert(Track::Glow, 0.0);
        settled.insert(Track::Glow, if c.glow { 1.0 } else { 0.0 });
        initial.insert(Track::Float, 0.0);
        settled.insert(Track::Float, 0.0);

        let sine = |from: f64, to: f64, d: f64| Tween::yoyo_loop(from, to, d, Ease::InOutSine);
        if t.background && c.parallax {
            loops.insert(
                key(Background, PositionY),
                sine(c.parallax_from, c.parallax_to, c.parallax_duration),
            );
        }
        if t.haze && c.haze {
            loops.insert(
                key(Haze, XPercent),
                sine(-c.haze_x_percent, c.haze_x_percent, c.haze_duration),
            );
        }
        if t.bloom && c.bloom {
            loops.insert(
                key(Bloom, Opacity),
                sine(1.0, c.bloom_opacity, c.bloom_breath_duration),
            );
        }
        if t.light && c.light {
            loops.insert(key(Light, XPercent), sine(-18.0, 18.0, c.light_duration));
            loops.insert(key(Light, YPercent), sine(6.0, -6.0, c.light_duration));
            loops.insert(key(Light, Rotate), sine(-8.0, 6.0, c.light_duration));
            loops.insert(
                key(Light, Scale),
                sine(1.05, 1.12, c.light_duration * 0.72),
            );
        }
        if c.glow {
            loops.insert(Track::Glow, sine(0.0, 1.0, c.glow_duration));
        }
        if c.float_text {
            loops.insert(
                Track::Float,
                sine(0.0, -c.float_distance_px, c.float_duration),
            );
        }

        self.timeline = tl;
        self.initial = initial;
        self.settled = settled;
        self.loops = loops;
        self.bg_start = bg_start;
    }

    /// Length of the one-shot reveal.
    pub fn reveal_duration(&self) -> f64 {
        self.timeline.total_duration()
    }

    /// Begin the reveal. A second start on the same mount snaps to the final state instead of
    /// drawing again. Does nothing without a drawable illustration.
    pub fn start(&mut self, now: f64) -> Option<RevealEvent> {
        self.artwork()?;
        self.now = now;
        if self.drawn {
            tracing::debug!(now, "reveal already drawn, snapping to final state");
            self.snapped = true;
            self.loops_from = Some(now);
            self.phase = RevealPhase::Looping;
            return self.complete();
        }
        self.drawn = true;
        self.started_at = Some(now);
        self.phase = RevealPhase::StrokeIn;
        None
    }

    fn complete(&mut self) -> Option<RevealEvent> {
        if self.completed {
            return None;
        }
        self.completed = true;
        tracing::info!(at = self.now, "reveal draw complete");
        Some(RevealEvent::DrawComplete)
    }

    pub fn tick(&mut self, now: f64) -> Option<RevealEvent> {
        self.now = now;
        let start = self.started_at?;
        if self.snapped {
            return None;
        }
        let local = now - start;
        let end = self.reveal_duration();
        if local >= end {
            if self.loops_from.is_none() {
                self.loops_from = Some(start + end);
                self.phase = RevealPhase::Complete;
                return self.complete();
            }
            self.phase = RevealPhase::Looping;
            return None;
        }
        self.phase = if local < FILL_AT {
            RevealPhase::StrokeIn
        } else if self.bg_start.is_some_and(|bg| local >= bg) {
            RevealPhase::BackgroundReveal
        } else {
            RevealPhase::FillSwap
        };
        None
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    pub fn is_drawn(&self) -> bool {
        self.drawn
    }

    fn value(&self, track: Track, now: f64) -> Option<f64> {
        if let Some(from) = self.loops_from
            && now >= from
            && let Some(tw) = self.loops.get(&track)
        {
            return Some(tw.sample(now - from));
        }
        if self.snapped {
            return self.settled.get(&track).copied();
        }
        if let Some(start) = self.started_at
            && let Some(v) = self.timeline.sample(track, (now - start).max(0.0))
        {
            return Some(v);
        }
        self.initial.get(&track).copied()
    }

    pub fn path_style(&self, index: usize, now: f64) -> Option<PathStyle> {
        let art = self.artwork()?;
        art.paths.get(index)?;
        Some(PathStyle {
            dash_offset: self.value(Track::Dash(index), now)?,
            fill_opacity: self.value(Track::Fill(index), now)?,
            stroke_opacity: self.value(Track::Stroke(index), now)?,
        })
    }

    pub fn group_scale(&self, now: f64) -> f64 {
        self.value(Track::GroupScale, now).unwrap_or(1.0)
    }

    /// Glow strength in `0..1` (drop shadow from soft to full).
    pub fn glow_intensity(&self, now: f64) -> f64 {
        self.value(Track::Glow, now).unwrap_or(0.0)
    }

    pub fn float_offset(&self, now: f64) -> f64 {
        self.value(Track::Float, now).unwrap_or(0.0)
    }

    /// Animated properties of a backdrop element, `None` when it was not handed to this layer or
    /// nothing has been loaded.
    pub fn target_props(&self, target: EffectTarget, now: f64) -> Option<VisualProps> {
        if !self.targets.has(target) || self.artwork().is_none() {
            return None;
        }
        let get = |prop: TargetProp, fallback: f64| {
            self.value(Track::Target(target, prop), now)
                .unwrap_or(fallback)
        };
        let d = VisualProps::default();
        Some(VisualProps {
            opacity: get(TargetProp::Opacity, d.opacity),
            scale: get(TargetProp::Scale, d.scale),
            blur_px: get(TargetProp::Blur, d.blur_px),
            x_percent: get(TargetProp::XPercent, d.x_percent),
            y_percent: get(TargetProp::YPercent, d.y_percent),
            rotate_deg: get(TargetProp::Rotate, d.rotate_deg),
            position_y_pct: get(TargetProp::PositionY, d.position_y_pct),
        })
    }

    /// Illustration-space to screen transform at `now`.
    pub fn artwork_transform(&self, viewport: Viewport, now: f64) -> Option<Affine> {
        let art = self.artwork()?;
        let center = viewport.center();
        let fit = art.fit_into(
            center,
            Vec2::new(viewport.width * FIT_BOX.x, viewport.height * FIT_BOX.y),
        );
        let group = Affine::translate((0.0, self.float_offset(now)))
            * Affine::scale_about(self.group_scale(now), center);
        Some(group * fit)
    }

    /// Panel with a warning mark and the shaped message, centered on the viewport.
    fn paint_error(&self, viewport: Viewport, list: &mut DisplayList) {
        let z = self.config.z_index;
        let center = viewport.center();
        let mark = ERROR_TEXT_PX as f64;
        let (label_w, label_h) = self
            .error_label
            .as_ref()
            .map_or((0.0, 0.0), |l| (l.width, l.height));
        let width = (viewport.width * ERROR_WIDTH).max(label_w + 2.0 * ERROR_PAD);
        let height = mark + label_h + 3.0 * ERROR_PAD;
        let panel = Rect::from_center_size(center, (width, height));
        list.push(
            z,
            DrawOp::FillRect {
                rect: panel,
                color: ERROR_PANEL,
            },
        );

        let mark_top = panel.y0 + ERROR_PAD;
        let mut triangle = BezPath::new();
        triangle.move_to((center.x, mark_top));
        triangle.line_to((center.x + mark * 0.6, mark_top + mark));
        triangle.line_to((center.x - mark * 0.6, mark_top + mark));
        triangle.close_path();
        list.push(
            z,
            DrawOp::StrokePath {
                path: triangle,
                width: STROKE_WIDTH,
                color: ERROR_MARK,
            },
        );
        let mut bar = BezPath::new();
        bar.move_to((center.x, mark_top + mark * 0.35));
        bar.line_to((center.x, mark_top + mark * 0.7));
        list.push(
            z,
            DrawOp::StrokePath {
                path: bar,
                width: STROKE_WIDTH,
                color: ERROR_MARK,
            },
        );

        if let Some(label) = &self.error_label {
            list.push(
                z,
                DrawOp::Text {
                    origin: Point::new(center.x - label.width * 0.5, mark_top + mark + ERROR_PAD),
                    text: Arc::clone(label),
                    color: INK.fade(0.9),
                },
            );
        }
    }

    fn paint_at(&self, viewport: Viewport, now: f64, list: &mut DisplayList) {
        if let RevealView::Error(_) = self.view {
            self.paint_error(viewport, list);
            return;
        }
        if self.started_at.is_none() {
            return;
        }
        let (Some(art), Some(xf)) = (self.artwork(), self.artwork_transform(viewport, now)) else {
            return;
        };
        let z = self.config.z_index;

        let glow = self.glow_intensity(now);
        if self.config.glow {
            let extent = xf.as_coeffs()[0].abs() * art.size.length() * 0.5;
            list.push(
                z,
                DrawOp::Glow {
                    center: xf * Point::new(art.size.x * 0.5, art.size.y * 0.5),
                    radius: extent.max(1.0),
                    color: GLOW_TINT.with_alpha(lerp(0.22, 0.45, glow) * 0.5),
                    stops: vec![(0.0, 1.0), (0.6, 0.4), (1.0, 0.0)],
                },
            );
        }

        for (i, p) in art.paths.iter().enumerate() {
            let Some(style) = self.path_style(i, now) else {
                continue;
            };
            if style.fill_opacity > 0.0 {
                list.push_transformed(
                    z,
                    xf,
                    DrawOp::FillPath {
                        path: p.path.clone(),
                        color: INK.fade(style.fill_opacity),
                    },
                );
            }
            if style.stroke_opacity > 0.0
                && let Some(visible) = dashed(&p.path, p.length, style.dash_offset)
            {
                list.push_transformed(
                    z,
                    xf,
                    DrawOp::StrokePath {
                        path: visible,
                        width: STROKE_WIDTH,
                        color: INK.fade(style.stroke_opacity),
                    },
                );
            }
        }
    }
}

/// Visible part of a `[len, len]` dash pattern shifted by `offset`.
fn dashed(path: &BezPath, length: f64, offset: f64) -> Option<BezPath> {
    if length <= 1e-6 || offset >= length {
        return None;
    }
    if offset <= 1e-9 {
        return Some(path.clone());
    }
    let pattern = [length, length];
    let out: BezPath = kurbo::dash(path.elements().iter().copied(), offset, &pattern).collect();
    (!out.elements().is_empty()).then_some(out)
}

impl Layer for RevealLayer {
    fn name(&self) -> &'static str {
        "reveal"
    }

    fn z_index(&self) -> i32 {
        self.config.z_index
    }

    /// Drives the layer without a consumer. The stage calls the inherent `tick` and routes the
    /// returned event itself.
    fn tick(&mut self, now: f64) {
        let _ = RevealLayer::tick(self, now);
    }

    fn paint(&self, viewport: Viewport, list: &mut DisplayList) {
        self.paint_at(viewport, self.now, list);
    }

    /// Ends the mount: loops stop and the next mount draws again.
    fn teardown(&mut self) {
        self.started_at = None;
        self.loops_from = None;
        self.drawn = false;
        self.snapped = false;
        self.completed = false;
        self.phase = RevealPhase::Idle;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/reveal.rs"]
mod tests;
