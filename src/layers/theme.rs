use std::{rc::Rc, sync::Arc};

use crate::{
    animation::timer::{TimerId, TimerQueue},
    assets::preload::{PreloadOutcome, Preloader},
    foundation::{
        color::Color,
        core::{Point, Viewport},
        error::{StageError, StageResult},
        math::clamp01,
    },
    layers::Layer,
    render::{
        display::{DisplayList, DrawOp},
        text::{ShapedText, TextEngine},
    },
    theme::{Theme, ThemeCell},
};

const SHADE: Color = Color::rgba(8.0 / 255.0, 10.0 / 255.0, 20.0 / 255.0, 0.92);
const CAPTION_INK: Color = Color::rgba(1.0, 1.0, 1.0, 0.85);
const CAPTION_GAP: f64 = 12.0;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ThemeSwitcherConfig {
    pub interval_ms: u64,
    /// How long the cover stays up, from the start of its fade-in to the start of its fade-out.
    pub cover_ms: u64,
    /// When the theme flips, relative to the cycle start. Must be below `cover_ms`.
    pub swap_at_ms: u64,
    /// Cover fade duration, in and out.
    pub fade_ms: u64,
    pub preload_images: Vec<String>,
    pub z_index: i32,
    pub caption: String,
    pub caption_px: f32,
    pub compact_caption_px: f32,
    /// Viewports at most this wide use the compact cover layout.
    pub compact_max_width: f64,
}

impl Default for ThemeSwitcherConfig {
    fn default() -> Self {
        Self {
            interval_ms: 10_000,
            cover_ms: 1200,
            swap_at_ms: 520,
            fade_ms: 300,
            preload_images: vec!["bg-mem-mai.png".to_owned(), "bg-mem-mai-dark.png".to_owned()],
            z_index: 60,
            caption: "Switching vibe…".to_owned(),
            caption_px: 16.0,
            compact_caption_px: 13.0,
            compact_max_width: 768.0,
        }
    }
}

impl ThemeSwitcherConfig {
    pub fn validate(&self) -> StageResult<()> {
        if self.interval_ms == 0 {
            return Err(StageError::validation("theme switch interval_ms must be > 0"));
        }
        if self.swap_at_ms >= self.cover_ms {
            return Err(StageError::validation(format!(
                "theme swap_at_ms ({}) must be below cover_ms ({})",
                self.swap_at_ms, self.cover_ms
            )));
        }
        if !(self.caption_px > 0.0 && self.compact_caption_px > 0.0) {
            return Err(StageError::validation("theme caption sizes must be > 0"));
        }
        Ok(())
    }

    pub fn is_compact(&self, viewport: Viewport) -> bool {
        viewport.width <= self.compact_max_width
    }

    /// Side of the box the cover centerpiece fits in: a fifth of the viewport, two fifths when
    /// compact.
    pub fn centerpiece_size(&self, viewport: Viewport) -> f64 {
        let share = if self.is_compact(viewport) { 0.4 } else { 0.2 };
        (viewport.width * share).min(viewport.height * share)
    }

    pub fn caption_size(&self, viewport: Viewport) -> f32 {
        if self.is_compact(viewport) {
            self.compact_caption_px
        } else {
            self.caption_px
        }
    }
}

fn secs(ms: u64) -> f64 {
    ms as f64 / 1000.0
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitcherState {
    Idle,
    Covering,
    Swapping,
    Uncovering,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SwitcherEvent {
    CoverStarted { at: f64 },
    ThemeSwapped { at: f64, theme: Theme },
    UncoverStarted { at: f64 },
    /// The uncover fade finished and the switcher accepts a new cycle.
    Released { at: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Cycle,
    Swap,
    Uncover,
    Release,
}

/// Periodically covers the stage, flips the theme mid-cover and uncovers.
#[derive(Debug)]
pub struct ThemeSwitcher {
    config: ThemeSwitcherConfig,
    theme: Rc<ThemeCell>,
    timers: TimerQueue<Step>,
    interval: Option<TimerId>,
    state: SwitcherState,
    busy: bool,
    cycle_started: Option<f64>,
    caption: Option<Arc<ShapedText>>,
    now: f64,
}

impl ThemeSwitcher {
    pub fn new(config: ThemeSwitcherConfig, theme: Rc<ThemeCell>) -> StageResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            theme,
            timers: TimerQueue::new(),
            interval: None,
            state: SwitcherState::Idle,
            busy: false,
            cycle_started: None,
            caption: None,
            now: 0.0,
        })
    }

    pub fn config(&self) -> &ThemeSwitcherConfig {
        &self.config
    }

    /// Warm the preload set, settle the initial theme, then start the interval.
    ///
    /// Every image counts as done whether it loaded or not.
    pub fn mount(&mut self, now: f64, preloader: &Preloader<'_>) -> Vec<PreloadOutcome> {
        self.teardown();
        let outcomes = preloader.preload(self.config.preload_images.as_slice());
        tracing::debug!(
            loaded = outcomes.iter().filter(|o| o.is_loaded()).count(),
            total = outcomes.len(),
            "theme switcher assets ready"
        );
        if self.theme.get().is_none() {
            self.theme.set(Theme::Light);
        }
        self.now = now;
        self.interval = Some(
            self.timers
                .every(now, secs(self.config.interval_ms), Step::Cycle),
        );
        outcomes
    }

    /// Lay out the cover caption for `viewport`. Reshape after a resize.
    pub fn shape_caption(&mut self, engine: &mut TextEngine, viewport: Viewport) {
        if self.config.caption.is_empty() {
            self.caption = None;
            return;
        }
        let size = self.config.caption_size(viewport);
        match engine.shape(&self.config.caption, size, Some(viewport.width as f32)) {
            Ok(caption) => self.caption = Some(caption),
            Err(err) => tracing::warn!(error = %err, "theme cover caption not shaped"),
        }
    }

    pub fn caption(&self) -> Option<&ShapedText> {
        self.caption.as_deref()
    }

    pub fn is_mounted(&self) -> bool {
        self.interval.is_some()
    }

    pub fn state(&self) -> SwitcherState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Start a cover cycle now unless one is in flight.
    pub fn trigger(&mut self, now: f64) -> Option<SwitcherEvent> {
        if self.busy {
            tracing::debug!(now, "theme switch skipped, cycle in flight");
            return None;
        }
        self.busy = true;
        self.state = SwitcherState::Covering;
        self.cycle_started = Some(now);
        let c = &self.config;
        self.timers.after(now, secs(c.swap_at_ms), Step::Swap);
        self.timers.after(now, secs(c.cover_ms), Step::Uncover);
        self.timers
            .after(now, secs(c.cover_ms + c.fade_ms), Step::Release);
        Some(SwitcherEvent::CoverStarted { at: now })
    }

    pub fn tick(&mut self, now: f64) -> Vec<SwitcherEvent> {
        self.now = now;
        let mut events = Vec::new();
        while let Some(fired) = self.timers.pop_due(now) {
            let at = fired.due;
            match fired.event {
                Step::Cycle => events.extend(self.trigger(at)),
                Step::Swap => {
                    let next = self.theme.resolved().toggled();
                    self.theme.set(next);
                    self.state = SwitcherState::Swapping;
                    tracing::info!(theme = next.as_str(), at, "theme swapped");
                    events.push(SwitcherEvent::ThemeSwapped { at, theme: next });
                }
                Step::Uncover => {
                    self.state = SwitcherState::Uncovering;
                    events.push(SwitcherEvent::UncoverStarted { at });
                }
                Step::Release => {
                    self.state = SwitcherState::Idle;
                    self.busy = false;
                    self.cycle_started = None;
                    events.push(SwitcherEvent::Released { at });
                }
            }
        }
        events
    }

    /// Cover opacity: fades in from the cycle start, out from `cover_ms`.
    pub fn cover_opacity(&self, now: f64) -> f64 {
        let Some(start) = self.cycle_started else {
            return 0.0;
        };
        let t = now - start;
        let cover = secs(self.config.cover_ms);
        let fade = secs(self.config.fade_ms);
        let ramp = |x: f64| if fade > 0.0 { clamp01(x / fade) } else { 1.0 };
        if t < cover {
            ramp(t.max(0.0))
        } else {
            1.0 - ramp(t - cover)
        }
    }

    /// The cover is (at least partly) visible.
    pub fn cover_on(&self) -> bool {
        matches!(
            self.state,
            SwitcherState::Covering | SwitcherState::Swapping
        )
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Stop the interval and any cycle in flight.
    pub fn teardown(&mut self) {
        if let Some(id) = self.interval.take() {
            self.timers.cancel(id);
        }
        self.timers.clear();
        self.busy = false;
        self.state = SwitcherState::Idle;
        self.cycle_started = None;
    }
}

impl Layer for ThemeSwitcher {
    fn name(&self) -> &'static str {
        "theme-switcher"
    }

    fn z_index(&self) -> i32 {
        self.config.z_index
    }

    /// Drives the switcher without a consumer. The stage calls the inherent `tick` and applies
    /// the returned events itself.
    fn tick(&mut self, now: f64) {
        let _ = ThemeSwitcher::tick(self, now);
    }

    fn paint(&self, viewport: Viewport, list: &mut DisplayList) {
        let a = self.cover_opacity(self.now);
        if a <= 0.0 {
            return;
        }
        let z = self.config.z_index;
        list.push(
            z,
            DrawOp::FillRect {
                rect: viewport.rect(),
                color: SHADE.fade(a),
            },
        );
        let center = viewport.center();
        let piece = self.config.centerpiece_size(viewport);
        list.push(
            z,
            DrawOp::Glow {
                center,
                radius: piece,
                color: Color::rgba(1.0, 0.93, 0.8, 0.18 * a),
                stops: vec![(0.0, 1.0), (1.0, 0.0)],
            },
        );
        if let Some(caption) = &self.caption {
            list.push(
                z,
                DrawOp::Text {
                    origin: Point::new(
                        center.x - caption.width * 0.5,
                        center.y + piece * 0.5 + CAPTION_GAP,
                    ),
                    text: Arc::clone(caption),
                    color: CAPTION_INK.fade(a),
                },
            );
        }
    }

    fn teardown(&mut self) {
        ThemeSwitcher::teardown(self);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/theme.rs"]
mod tests;
