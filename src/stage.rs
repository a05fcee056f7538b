//! The stage: one clock, the flags derived from layer events, and every layer mounted or
//! unmounted by those flags and the current theme.

use std::{path::Path, rc::Rc};

use anyhow::Context as _;

use crate::{
    animation::clock::FrameClock,
    assets::{AssetSource, preload::Preloader},
    foundation::{
        color::Color,
        core::{Affine, Fps, Point, Rect, Vec2, Viewport, VisualProps},
        error::{StageError, StageResult},
        math::{Rng64, lerp},
    },
    layers::{
        Layer,
        ambient::{
            CloudBandsConfig, CloudBandsLayer, SparkleDustConfig, SparkleDustLayer, SunHaloConfig,
            SunHaloLayer, SunRaysConfig, SunRaysLayer,
        },
        fireworks::{FireworksConfig, FireworksLayer},
        intro::{IntroConfig, IntroEvent, IntroLayer},
        loading::{LoadingDecorConfig, LoadingDecorLayer},
        reveal::{EffectTarget, EffectTargets, RevealConfig, RevealEvent, RevealLayer},
        theme::{SwitcherEvent, ThemeSwitcher, ThemeSwitcherConfig},
    },
    render::{
        cpu::{CpuRenderer, FrameRGBA},
        display::{DisplayList, DrawOp},
        surface::CanvasSurface,
        text::TextEngine,
    },
    theme::{Theme, ThemeCell, ThemeStore},
};

const BACKDROP_Z: i32 = 0;
const BACKGROUND_Z: i32 = 1;
const HAZE_Z: i32 = 2;
const BLOOM_Z: i32 = 3;
const LIGHT_Z: i32 = 4;
const SKY_SLICES: usize = 8;
/// Slack when comparing frame times against scheduled instants.
const TIME_EPS: f64 = 1e-9;

/// Everything needed to build a [`Stage`]. Every field has a default.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub viewport: Viewport,
    pub fps: u32,
    pub seed: u64,
    /// Initial theme when no preference is stored. `None` leaves it to the theme switcher.
    pub theme: Option<Theme>,
    /// Location of the reveal illustration inside the asset source.
    pub artwork: String,
    /// Location of a TTF/OTF font for stage captions. Without one, text is skipped.
    pub font: Option<String>,
    pub targets: EffectTargets,
    /// Device pixel ratio cap for the stage canvas.
    pub max_dpr: f64,
    pub intro: IntroConfig,
    pub loading: LoadingDecorConfig,
    pub reveal: RevealConfig,
    pub fireworks: FireworksConfig,
    pub sun_rays: SunRaysConfig,
    pub sparkle_dust: SparkleDustConfig,
    pub cloud_bands: CloudBandsConfig,
    pub sun_halo: SunHaloConfig,
    pub switcher: ThemeSwitcherConfig,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            fps: 60,
            seed: 0x5EED,
            theme: None,
            artwork: "mem-mai.svg".to_owned(),
            font: None,
            targets: EffectTargets::all(),
            max_dpr: 2.0,
            intro: IntroConfig::default(),
            loading: LoadingDecorConfig::default(),
            reveal: RevealConfig::default(),
            fireworks: FireworksConfig::default(),
            sun_rays: SunRaysConfig::default(),
            sparkle_dust: SparkleDustConfig::default(),
            cloud_bands: CloudBandsConfig::default(),
            sun_halo: SunHaloConfig::default(),
            switcher: ThemeSwitcherConfig::default(),
        }
    }
}

impl StageConfig {
    pub fn from_json(json: &str) -> StageResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| StageError::serde(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> StageResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read stage config '{}'", path.display()))?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> StageResult<()> {
        let vp = self.viewport;
        if !(vp.width.is_finite() && vp.height.is_finite()) || vp.width <= 0.0 || vp.height <= 0.0
        {
            return Err(StageError::validation("viewport width/height must be > 0"));
        }
        if self.fps == 0 {
            return Err(StageError::validation("fps must be > 0"));
        }
        if self.artwork.trim().is_empty() {
            return Err(StageError::validation("artwork location must be non-empty"));
        }
        if self.font.as_deref().is_some_and(|f| f.trim().is_empty()) {
            return Err(StageError::validation("font location must be non-empty"));
        }
        self.intro.validate()?;
        self.switcher.validate()?;
        Ok(())
    }

    pub fn fps(&self) -> StageResult<Fps> {
        Fps::new(self.fps, 1)
    }
}

/// Stage-level switches, flipped only by layer events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct StageFlags {
    pub intro_done: bool,
    pub draw_done: bool,
    pub bg_on: bool,
    pub cover_on: bool,
}

/// What happened during one stage tick.
#[derive(Clone, Debug, PartialEq)]
pub enum StageEvent {
    IntroCompleted,
    RevealFailed(String),
    DrawComplete,
    CoverChanged(bool),
    ThemeChanged(Theme),
}

/// Owns the clock and every layer, and routes completion events into mounts.
pub struct Stage {
    config: StageConfig,
    source: Box<dyn AssetSource>,
    store: Option<Box<dyn ThemeStore>>,
    theme: Rc<ThemeCell>,
    clock: FrameClock,
    flags: StageFlags,
    started: bool,
    intro_mounted: bool,
    /// When the reveal takes over from the loading decor.
    reveal_due: Option<f64>,
    text: Option<TextEngine>,

    intro: IntroLayer,
    loading: LoadingDecorLayer,
    reveal: RevealLayer,
    fireworks: FireworksLayer,
    sun_rays: SunRaysLayer,
    sparkle_dust: SparkleDustLayer,
    cloud_bands: CloudBandsLayer,
    sun_halo: SunHaloLayer,
    switcher: ThemeSwitcher,

    surface: CanvasSurface,
    renderer: CpuRenderer,
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("now", &self.clock.now())
            .field("flags", &self.flags)
            .field("theme", &self.theme.get())
            .finish_non_exhaustive()
    }
}

impl Stage {
    pub fn new(config: StageConfig, source: Box<dyn AssetSource>) -> StageResult<Self> {
        let theme = ThemeCell::new(config.theme);
        Self::build(config, source, None, theme)
    }

    /// Like [`Stage::new`], with the initial theme read from `store` and every swap saved back.
    pub fn with_store(
        config: StageConfig,
        source: Box<dyn AssetSource>,
        store: Box<dyn ThemeStore>,
    ) -> StageResult<Self> {
        let mut theme = ThemeCell::from_store(store.as_ref());
        if theme.get().is_none() {
            theme = ThemeCell::new(config.theme);
        }
        Self::build(config, source, Some(store), theme)
    }

    fn build(
        config: StageConfig,
        source: Box<dyn AssetSource>,
        store: Option<Box<dyn ThemeStore>>,
        theme: ThemeCell,
    ) -> StageResult<Self> {
        config.validate()?;
        let theme = Rc::new(theme);
        let mut rng = Rng64::new(config.seed);

        let intro = IntroLayer::new(config.intro.clone(), rng.next_u64())?;
        let reveal = RevealLayer::new(config.reveal.clone(), config.targets);
        let fireworks = FireworksLayer::new(config.fireworks.clone(), rng.next_u64());
        let sun_rays = SunRaysLayer::new(config.sun_rays.clone(), rng.next_u64());
        let sparkle_dust = SparkleDustLayer::new(config.sparkle_dust.clone(), rng.next_u64());
        let cloud_bands = CloudBandsLayer::new(config.cloud_bands.clone());
        let sun_halo = SunHaloLayer::new(config.sun_halo.clone());
        let switcher = ThemeSwitcher::new(config.switcher.clone(), Rc::clone(&theme))?;
        let loading = LoadingDecorLayer::new(config.loading.clone(), rng.next_u64());

        Ok(Self {
            clock: FrameClock::new(config.fps()?),
            surface: CanvasSurface::new(config.viewport, config.max_dpr),
            config,
            source,
            store,
            theme,
            flags: StageFlags::default(),
            started: false,
            intro_mounted: false,
            reveal_due: None,
            text: None,
            intro,
            loading,
            reveal,
            fireworks,
            sun_rays,
            sparkle_dust,
            cloud_bands,
            sun_halo,
            switcher,
            renderer: CpuRenderer::new(),
        })
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn flags(&self) -> StageFlags {
        self.flags
    }

    /// Current theme, if one was settled.
    pub fn theme(&self) -> Option<Theme> {
        self.theme.get()
    }

    pub fn intro(&self) -> &IntroLayer {
        &self.intro
    }

    pub fn loading(&self) -> &LoadingDecorLayer {
        &self.loading
    }

    /// Caption font, once [`Stage::start`] loaded it.
    pub fn text_engine(&self) -> Option<&TextEngine> {
        self.text.as_ref()
    }

    pub fn reveal(&self) -> &RevealLayer {
        &self.reveal
    }

    pub fn fireworks(&self) -> &FireworksLayer {
        &self.fireworks
    }

    pub fn sun_rays(&self) -> &SunRaysLayer {
        &self.sun_rays
    }

    pub fn sparkle_dust(&self) -> &SparkleDustLayer {
        &self.sparkle_dust
    }

    pub fn cloud_bands(&self) -> &CloudBandsLayer {
        &self.cloud_bands
    }

    pub fn sun_halo(&self) -> &SunHaloLayer {
        &self.sun_halo
    }

    pub fn switcher(&self) -> &ThemeSwitcher {
        &self.switcher
    }

    pub fn surface(&self) -> &CanvasSurface {
        &self.surface
    }

    /// Fetch the font and the reveal artwork, then mount the intro at the current clock time.
    ///
    /// Every blocking fetch happens here, before the first frame. Later calls are no-ops.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.prepare_assets();
        let now = self.clock.now();
        self.intro.mount(now);
        self.intro_mounted = true;
        tracing::info!(now, theme = ?self.theme.get(), "stage started");
    }

    fn prepare_assets(&mut self) {
        let timeout = self.config.reveal.fetch_timeout();
        self.text = self.load_text_engine(timeout);
        self.reveal
            .load(&*self.source, &self.config.artwork, timeout);
        self.shape_text();
    }

    fn load_text_engine(&self, timeout: std::time::Duration) -> Option<TextEngine> {
        let location = self.config.font.as_deref()?;
        let engine = self
            .source
            .fetch_bytes(location, timeout)
            .map_err(StageError::from)
            .and_then(|bytes| TextEngine::from_font_bytes(&bytes));
        match engine {
            Ok(engine) => {
                tracing::debug!(family = engine.family(), "stage font loaded");
                Some(engine)
            }
            Err(err) => {
                tracing::warn!(error = %err, location, "stage font unavailable, captions skipped");
                None
            }
        }
    }

    /// Lay out every caption for the current viewport.
    fn shape_text(&mut self) {
        let Some(engine) = self.text.as_mut() else {
            return;
        };
        let vp = self.config.viewport;
        self.switcher.shape_caption(engine, vp);
        self.reveal.shape_error(engine, vp);
    }

    /// Step the clock one frame and update every layer. Starts the stage on first use.
    #[tracing::instrument(skip(self), fields(frame = self.clock.frame() + 1))]
    pub fn tick(&mut self) -> Vec<StageEvent> {
        if !self.started {
            self.start();
        }
        let now = self.clock.tick();
        self.update(now)
    }

    /// Tick until the clock reaches `secs`.
    pub fn run_until(&mut self, secs: f64) -> Vec<StageEvent> {
        if !self.started {
            self.start();
        }
        let mut events = Vec::new();
        while self.clock.now() < secs {
            events.extend(self.tick());
        }
        events
    }

    fn update(&mut self, now: f64) -> Vec<StageEvent> {
        let mut events = Vec::new();

        if self.intro_mounted {
            if let Some(IntroEvent::Completed) = self.intro.tick(now) {
                self.flags.intro_done = true;
                self.flags.bg_on = true;
                events.push(StageEvent::IntroCompleted);
                self.begin_loading(now, &mut events);
            }
            if self.intro.is_faded_out(now) {
                self.intro.teardown();
                self.intro_mounted = false;
                tracing::debug!(now, "intro unmounted");
            }
        }

        self.mount_reveal_when_due(now, &mut events);
        if self.loading.is_mounted() {
            self.loading.tick(now);
        }

        if self.flags.intro_done
            && let Some(RevealEvent::DrawComplete) = self.reveal.tick(now)
        {
            self.on_draw_complete(now, &mut events);
        }

        if self.switcher.is_mounted() {
            for ev in self.switcher.tick(now) {
                match ev {
                    SwitcherEvent::CoverStarted { .. } => {
                        self.flags.cover_on = true;
                        events.push(StageEvent::CoverChanged(true));
                    }
                    SwitcherEvent::ThemeSwapped { at, theme } => {
                        self.apply_theme(at, theme);
                        self.persist_theme(theme);
                        events.push(StageEvent::ThemeChanged(theme));
                    }
                    SwitcherEvent::UncoverStarted { .. } => {
                        self.flags.cover_on = false;
                        events.push(StageEvent::CoverChanged(false));
                    }
                    SwitcherEvent::Released { .. } => {}
                }
            }
        }

        self.fireworks.tick(now);
        self.sun_rays.tick(now);
        self.sparkle_dust.tick(now);
        self.cloud_bands.tick(now);
        self.sun_halo.tick(now);
        events
    }

    /// Hold the loading decor for its configured time, then hand over to the reveal.
    fn begin_loading(&mut self, now: f64, events: &mut Vec<StageEvent>) {
        let hold = self.config.loading.hold();
        if hold > 0.0 {
            self.loading.mount(now);
        }
        self.reveal_due = Some(now + hold);
        self.mount_reveal_when_due(now, events);
    }

    fn mount_reveal_when_due(&mut self, now: f64, events: &mut Vec<StageEvent>) {
        let Some(due) = self.reveal_due else {
            return;
        };
        if now + TIME_EPS < due {
            return;
        }
        self.reveal_due = None;
        if self.loading.is_mounted() {
            self.loading.teardown();
            tracing::debug!(now, "loading decor unmounted");
        }
        if let Some(msg) = self.reveal.error_message() {
            events.push(StageEvent::RevealFailed(msg.to_owned()));
            return;
        }
        if let Some(RevealEvent::DrawComplete) = self.reveal.start(due) {
            self.on_draw_complete(now, events);
        }
    }

    fn on_draw_complete(&mut self, now: f64, events: &mut Vec<StageEvent>) {
        self.flags.draw_done = true;
        events.push(StageEvent::DrawComplete);

        let preloader = Preloader::new(&*self.source, self.config.reveal.fetch_timeout());
        self.switcher.mount(now, &preloader);

        self.sparkle_dust.mount(now);
        self.apply_theme(now, self.theme.resolved());
    }

    /// Light mounts rays, halo and clouds; dark mounts fireworks.
    fn apply_theme(&mut self, now: f64, theme: Theme) {
        if !self.flags.draw_done {
            return;
        }
        match theme {
            Theme::Light => {
                self.fireworks.teardown();
                if !self.sun_rays.is_mounted() {
                    self.sun_rays.mount(now);
                }
                if !self.sun_halo.is_mounted() {
                    self.sun_halo.mount(now);
                }
                if !self.cloud_bands.is_mounted() {
                    self.cloud_bands.mount(now);
                }
            }
            Theme::Dark => {
                self.sun_rays.teardown();
                self.sun_halo.teardown();
                self.cloud_bands.teardown();
                if !self.fireworks.is_mounted() {
                    self.fireworks.mount(now, self.config.viewport);
                }
            }
        }
        tracing::debug!(theme = theme.as_str(), now, "ambient layers follow theme");
    }

    fn persist_theme(&mut self, theme: Theme) {
        if let Some(store) = self.store.as_mut()
            && let Err(err) = store.save(theme)
        {
            tracing::warn!(error = %err, "theme preference not saved");
        }
    }

    /// Layers currently on stage, in paint order.
    pub fn mounted_layers(&self) -> Vec<&dyn Layer> {
        let mut out: Vec<&dyn Layer> = Vec::new();
        if self.intro_mounted {
            out.push(&self.intro);
        }
        if self.loading.is_mounted() {
            out.push(&self.loading);
        }
        if self.flags.intro_done && self.reveal_due.is_none() {
            out.push(&self.reveal);
        }
        if self.fireworks.is_mounted() {
            out.push(&self.fireworks);
        }
        if self.sun_rays.is_mounted() {
            out.push(&self.sun_rays);
        }
        if self.sparkle_dust.is_mounted() {
            out.push(&self.sparkle_dust);
        }
        if self.cloud_bands.is_mounted() {
            out.push(&self.cloud_bands);
        }
        if self.sun_halo.is_mounted() {
            out.push(&self.sun_halo);
        }
        if self.switcher.is_mounted() {
            out.push(&self.switcher);
        }
        out.sort_by_key(|l| l.z_index());
        out
    }

    pub fn mounted_layer_names(&self) -> Vec<&'static str> {
        self.mounted_layers().iter().map(|l| l.name()).collect()
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.config.viewport = viewport;
        self.surface.resize(viewport, self.config.max_dpr);
        self.fireworks.resize(viewport);
        self.shape_text();
    }

    /// Every draw op for the current instant: backdrop first, then the mounted layers.
    pub fn display_list(&self) -> DisplayList {
        let vp = self.config.viewport;
        let mut list = DisplayList::new();
        paint_backdrop(
            self.theme.resolved(),
            self.flags,
            &self.reveal,
            vp,
            self.clock.now(),
            &mut list,
        );
        for layer in self.mounted_layers() {
            layer.paint(vp, &mut list);
        }
        list
    }

    /// Rasterize the current instant onto the stage canvas.
    pub fn render_frame(&mut self) -> StageResult<FrameRGBA> {
        let list = self.display_list();
        let (w, h) = self.surface.pixel_size();
        let frame = self
            .renderer
            .render(&list, w, h, self.surface.pixel_ratio(), None)?;
        self.surface.present(frame.clone());
        Ok(frame)
    }

    /// Unmount everything. Idempotent.
    pub fn teardown(&mut self) {
        self.intro.teardown();
        self.intro_mounted = false;
        self.loading.teardown();
        self.reveal_due = None;
        Layer::teardown(&mut self.reveal);
        self.fireworks.teardown();
        self.sun_rays.teardown();
        self.sparkle_dust.teardown();
        self.cloud_bands.teardown();
        self.sun_halo.teardown();
        self.switcher.teardown();
        self.surface.clear();
    }
}

struct Sky {
    top: Color,
    bottom: Color,
    base: Color,
}

fn sky(theme: Theme) -> Sky {
    match theme {
        Theme::Light => Sky {
            top: Color::rgba8(250, 236, 214, 1.0),
            bottom: Color::rgba8(244, 206, 170, 1.0),
            base: Color::rgba8(246, 240, 230, 1.0),
        },
        Theme::Dark => Sky {
            top: Color::rgba8(16, 20, 44, 1.0),
            bottom: Color::rgba8(40, 30, 70, 1.0),
            base: Color::rgba8(10, 12, 24, 1.0),
        },
    }
}

/// Page background plus the backdrop elements the reveal animates.
///
/// Elements not handed to the reveal show at rest once `bg_on` is set.
fn paint_backdrop(
    theme: Theme,
    flags: StageFlags,
    reveal: &RevealLayer,
    vp: Viewport,
    now: f64,
    list: &mut DisplayList,
) {
    let colors = sky(theme);
    list.push(
        BACKDROP_Z,
        DrawOp::FillRect {
            rect: vp.rect(),
            color: colors.base,
        },
    );
    if !flags.bg_on {
        return;
    }

    let props = |target: EffectTarget| {
        if reveal.targets().has(target) {
            reveal.target_props(target, now)
        } else {
            Some(VisualProps::default())
        }
    };
    let center = vp.center();
    let size = Vec2::new(vp.width, vp.height);

    if let Some(bg) = props(EffectTarget::Background) {
        let shift = (bg.position_y_pct - 50.0) / 100.0 * vp.height;
        let xf = Affine::translate((0.0, -shift)) * bg.to_affine(center, size);
        let band = vp.height / SKY_SLICES as f64;
        for i in 0..SKY_SLICES {
            let t = (i as f64 + 0.5) / SKY_SLICES as f64;
            let color = Color::rgba(
                lerp(colors.top.r, colors.bottom.r, t),
                lerp(colors.top.g, colors.bottom.g, t),
                lerp(colors.top.b, colors.bottom.b, t),
                bg.opacity,
            );
            let y0 = band * i as f64;
            list.push_transformed(
                BACKGROUND_Z,
                xf,
                DrawOp::FillRect {
                    rect: Rect::new(0.0, y0, vp.width, y0 + band),
                    color,
                },
            );
        }
    }

    if let Some(haze) = props(EffectTarget::Haze) {
        list.push_transformed(
            HAZE_Z,
            haze.to_affine(center, size),
            DrawOp::FillRect {
                rect: vp.rect(),
                color: Color::rgba(1.0, 1.0, 1.0, 0.18 * haze.opacity),
            },
        );
    }

    if let Some(bloom) = props(EffectTarget::Bloom) {
        list.push_transformed(
            BLOOM_Z,
            bloom.to_affine(center, size),
            DrawOp::Glow {
                center,
                radius: vp.width.max(vp.height) * 0.45,
                color: Color::rgba8(255, 236, 200, 0.5 * bloom.opacity),
                stops: vec![(0.0, 1.0), (0.5, 0.4), (1.0, 0.0)],
            },
        );
    }

    if let Some(light) = props(EffectTarget::Light) {
        let at = Point::new(vp.width * 0.3, vp.height * 0.2);
        list.push_transformed(
            LIGHT_Z,
            light.to_affine(at, size * 0.6),
            DrawOp::Glow {
                center: at,
                radius: vp.width.min(vp.height) * 0.5,
                color: Color::rgba8(255, 244, 214, 0.6 * light.opacity),
                stops: vec![(0.0, 1.0), (0.4, 0.5), (1.0, 0.0)],
            },
        );
    }
}

#[cfg(test)]
#[path = "../tests/unit/stage.rs"]
mod tests;
