//! Ambient light layers: sun rays, sparkle dust, cloud bands and the sun halo.
//!
//! All four are infinite yoyo loops evaluated as pure functions of the time elapsed since mount.
//! Geometry lives in a `0..100` view box stretched over the viewport.

use crate::{
    animation::{ease::Ease, timeline::Timeline, tween::Tween},
    foundation::{
        color::Color,
        core::{Affine, BezPath, Point, Rect, Vec2, Viewport},
        math::Rng64,
    },
    layers::Layer,
    render::{
        cpu::stop_alpha,
        display::{DisplayList, DrawOp},
    },
};

const RAY_TINT: Color = Color::rgba(1.0, 240.0 / 255.0, 202.0 / 255.0, 1.0);
const WASH_TINT: Color = Color::rgba(1.0, 250.0 / 255.0, 235.0 / 255.0, 1.0);
const DUST_TINT: Color = WASH_TINT;
const CLOUD_TINT: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
const HALO_TINT: Color = Color::rgba(1.0, 240.0 / 255.0, 200.0 / 255.0, 1.0);

/// Segments used to shade a ray along its gradient.
const RAY_SEGMENTS: usize = 6;
/// Vertical slices used to shade a cloud band along its gradient.
const CLOUD_SLICES: usize = 12;

/// Mount bookkeeping shared by the ambient layers.
#[derive(Clone, Copy, Debug, Default)]
struct Mount {
    at: Option<f64>,
    now: f64,
}

impl Mount {
    fn local(&self) -> Option<f64> {
        self.at.map(|at| (self.now - at).max(0.0))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RayOrigin {
    #[default]
    TopLeft,
    TopCenter,
}

impl RayOrigin {
    /// Fan origin in view-box units.
    pub fn point(self) -> Point {
        match self {
            Self::TopLeft => Point::new(10.0, 12.0),
            Self::TopCenter => Point::new(50.0, 8.0),
        }
    }

    /// `(base angle, spread)` in degrees.
    fn fan(self) -> (f64, f64) {
        match self {
            Self::TopLeft => (18.0, 65.0),
            Self::TopCenter => (90.0, 70.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SunRaysConfig {
    pub enabled: bool,
    pub z_index: i32,
    pub origin: RayOrigin,
    pub rays: usize,
    pub draw_duration: f64,
    pub draw_stagger: f64,
    pub breathe_opacity_from: f64,
    pub breathe_opacity_to: f64,
    pub breathe_duration: f64,
    pub drift_rotate_deg: f64,
    pub drift_duration: f64,
}

impl Default for SunRaysConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            z_index: 12,
            origin: RayOrigin::TopLeft,
            rays: 14,
            draw_duration: 1.6,
            draw_stagger: 0.06,
            breathe_opacity_from: 0.08,
            breathe_opacity_to: 0.22,
            breathe_duration: 3.6,
            drift_rotate_deg: 1.2,
            drift_duration: 10.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub from: Point,
    pub to: Point,
    /// Stroke width in view-box units.
    pub width: f64,
    pub opacity: f64,
}

const RAY_START_R: f64 = 18.0;
const RAY_END_R: f64 = 120.0;

/// Fan of light rays that draw in once, then breathe and sway forever.
#[derive(Clone, Debug)]
pub struct SunRaysLayer {
    config: SunRaysConfig,
    rays: Vec<Ray>,
    /// Hidden fraction of each ray, keyed by ray index.
    draw: Timeline<usize>,
    breathe: Tween<f64>,
    sway: Tween<f64>,
    swell: Tween<f64>,
    mount: Mount,
}

impl SunRaysLayer {
    pub fn new(config: SunRaysConfig, seed: u64) -> Self {
        let mut rng = Rng64::new(seed);
        let origin = config.origin.point();
        let (base, spread) = config.origin.fan();
        let n = config.rays;
        let rays = (0..n)
            .map(|i| {
                let t = if n <= 1 {
                    0.5
                } else {
                    i as f64 / (n - 1) as f64
                };
                let a = (base - spread / 2.0 + spread * t).to_radians();
                let dir = Vec2::new(a.cos(), a.sin());
                Ray {
                    from: origin + dir * RAY_START_R,
                    to: origin + dir * RAY_END_R,
                    width: rng.range(0.8, 2.2),
                    opacity: rng.range(0.18, 0.55),
                }
            })
            .collect();

        let mut draw = Timeline::new();
        draw.stagger(0..n, 0.0, config.draw_stagger, |_, _| {
            Tween::new(1.0, 0.0, config.draw_duration, Ease::OutCubic)
        });

        let breathe = Tween::yoyo_loop(
            config.breathe_opacity_from,
            config.breathe_opacity_to,
            config.breathe_duration,
            Ease::InOutSine,
        );
        let sway = Tween::yoyo_loop(
            0.0,
            config.drift_rotate_deg,
            config.drift_duration,
            Ease::InOutSine,
        );
        let swell = Tween::yoyo_loop(1.0, 1.02, config.drift_duration * 0.8, Ease::InOutSine);

        Self {
            config,
            rays,
            draw,
            breathe,
            sway,
            swell,
            mount: Mount::default(),
        }
    }

    pub fn config(&self) -> &SunRaysConfig {
        &self.config
    }

    pub fn rays(&self) -> &[Ray] {
        &self.rays
    }

    pub fn mount(&mut self, now: f64) {
        if !self.config.enabled {
            return;
        }
        self.mount = Mount { at: Some(now), now };
    }

    pub fn is_mounted(&self) -> bool {
        self.mount.at.is_some()
    }

    /// Drawn fraction of ray `i` in `0..=1`.
    pub fn drawn_fraction(&self, i: usize, now: f64) -> f64 {
        let Some(at) = self.mount.at else {
            return 0.0;
        };
        1.0 - self.draw.sample_or(i, now - at, 1.0)
    }

    pub fn is_drawn(&self, now: f64) -> bool {
        self.mount
            .at
            .is_some_and(|at| self.draw.is_complete(now - at))
    }

    pub fn group_opacity(&self, now: f64) -> f64 {
        match self.mount.at {
            Some(at) => self.breathe.sample(now - at),
            None => 0.0,
        }
    }

    /// Group transform in view-box units: sway and swell around the fan origin.
    pub fn group_transform(&self, now: f64) -> Affine {
        let Some(at) = self.mount.at else {
            return Affine::IDENTITY;
        };
        let local = now - at;
        let o = self.config.origin.point().to_vec2();
        Affine::translate(o)
            * Affine::rotate(self.sway.sample(local).to_radians())
            * Affine::scale(self.swell.sample(local))
            * Affine::translate(-o)
    }
}

impl Layer for SunRaysLayer {
    fn name(&self) -> &'static str {
        "sun-rays"
    }

    fn z_index(&self) -> i32 {
        self.config.z_index
    }

    fn tick(&mut self, now: f64) {
        self.mount.now = now;
    }

    fn paint(&self, viewport: Viewport, list: &mut DisplayList) {
        if self.mount.local().is_none() {
            return;
        }
        let now = self.mount.now;
        let z = self.config.z_index;
        let space = viewport.percent_space();

        list.push_transformed(
            z,
            space,
            DrawOp::Glow {
                center: self.config.origin.point(),
                radius: 70.0,
                color: WASH_TINT,
                stops: vec![(0.0, 0.10), (0.6, 0.02), (1.0, 0.0)],
            },
        );

        let group = space * self.group_transform(now);
        let opacity = self.group_opacity(now);
        let unit = viewport.width.min(viewport.height) / 100.0;
        let stops = [(0.0, 0.85), (0.5, 0.35), (1.0, 0.0)];
        for (i, ray) in self.rays.iter().enumerate() {
            let drawn = self.drawn_fraction(i, now);
            if drawn <= 0.0 {
                continue;
            }
            for s in 0..RAY_SEGMENTS {
                let t0 = s as f64 / RAY_SEGMENTS as f64;
                if t0 >= drawn {
                    break;
                }
                let t1 = ((s + 1) as f64 / RAY_SEGMENTS as f64).min(drawn);
                let alpha = stop_alpha(&stops, (t0 + t1) * 0.5) * ray.opacity * opacity;
                if alpha <= 0.0 {
                    continue;
                }
                let mut path = BezPath::new();
                path.move_to(ray.from.lerp(ray.to, t0));
                path.line_to(ray.from.lerp(ray.to, t1));
                list.push_transformed(
                    z,
                    group,
                    DrawOp::StrokePath {
                        path,
                        width: ray.width * unit,
                        color: RAY_TINT.with_alpha(alpha),
                    },
                );
            }
        }
    }

    fn teardown(&mut self) {
        self.mount.at = None;
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SparkleDustConfig {
    pub enabled: bool,
    pub z_index: i32,
    pub count: usize,
    /// Twinkle half-period range, seconds.
    pub twinkle_duration: (f64, f64),
    /// Drift half-period range, seconds.
    pub drift_duration: (f64, f64),
}

impl Default for SparkleDustConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            z_index: 13,
            count: 42,
            twinkle_duration: (1.6, 3.2),
            drift_duration: (6.0, 14.0),
        }
    }
}

const DUST_REVEAL: f64 = 0.8;
const DUST_REVEAL_STAGGER: f64 = 0.02;
const DUST_REST_SCALE: f64 = 0.6;

#[derive(Clone, Debug)]
pub struct Mote {
    pub center: Point,
    pub radius: f64,
    pub rest_alpha: f64,
    reveal: Tween<f64>,
    twinkle_alpha: Tween<f64>,
    twinkle_scale: Tween<f64>,
    drift: Tween<Vec2>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoteState {
    pub center: Point,
    pub radius: f64,
    pub alpha: f64,
}

impl Mote {
    fn random(rng: &mut Rng64, index: usize, config: &SparkleDustConfig) -> Self {
        let center = Point::new(rng.range(8.0, 92.0), rng.range(10.0, 90.0));
        let radius = rng.range(0.5, 1.8);
        let rest_alpha = rng.range(0.12, 0.42);

        let (t0, t1) = config.twinkle_duration;
        let (d0, d1) = config.drift_duration;
        let peak_alpha = rng.range(0.12, 0.55);
        let peak_scale = rng.range(0.9, 1.35);
        let twinkle = rng.range(t0, t1);
        let twinkle_delay = rng.range(0.0, 1.2);
        let drift_to = Vec2::new(rng.range(-8.0, 10.0), rng.range(-10.0, 8.0));
        let drift = rng.range(d0, d1);
        let drift_delay = rng.range(0.0, 1.5);

        Self {
            center,
            radius,
            rest_alpha,
            reveal: Tween::new(0.0, rest_alpha, DUST_REVEAL, Ease::OutSine)
                .delay(DUST_REVEAL_STAGGER * index as f64),
            twinkle_alpha: Tween::yoyo_loop(rest_alpha, peak_alpha, twinkle, Ease::InOutSine)
                .delay(twinkle_delay),
            twinkle_scale: Tween::yoyo_loop(DUST_REST_SCALE, peak_scale, twinkle, Ease::InOutSine)
                .delay(twinkle_delay),
            drift: Tween::yoyo_loop(Vec2::ZERO, drift_to, drift, Ease::InOutSine)
                .delay(drift_delay),
        }
    }

    /// State `local` seconds after mount. The staggered reveal owns opacity until it ends,
    /// then the twinkle takes over from the resting alpha.
    pub fn state(&self, local: f64) -> MoteState {
        let reveal_end = self.reveal.total_duration();
        let alpha = if local < reveal_end {
            self.reveal.sample(local)
        } else {
            self.twinkle_alpha.sample(local - reveal_end)
        };
        MoteState {
            center: self.center + self.drift.sample(local),
            radius: self.radius * self.twinkle_scale.sample(local),
            alpha,
        }
    }
}

/// Twinkling, drifting specks of light.
#[derive(Clone, Debug)]
pub struct SparkleDustLayer {
    config: SparkleDustConfig,
    motes: Vec<Mote>,
    mount: Mount,
}

impl SparkleDustLayer {
    pub fn new(config: SparkleDustConfig, seed: u64) -> Self {
        let mut rng = Rng64::new(seed);
        let motes = (0..config.count)
            .map(|i| Mote::random(&mut rng, i, &config))
            .collect();
        Self {
            config,
            motes,
            mount: Mount::default(),
        }
    }

    pub fn config(&self) -> &SparkleDustConfig {
        &self.config
    }

    pub fn motes(&self) -> &[Mote] {
        &self.motes
    }

    pub fn mount(&mut self, now: f64) {
        if !self.config.enabled {
            return;
        }
        self.mount = Mount { at: Some(now), now };
    }

    pub fn is_mounted(&self) -> bool {
        self.mount.at.is_some()
    }

    pub fn states(&self, now: f64) -> Vec<MoteState> {
        let Some(at) = self.mount.at else {
            return Vec::new();
        };
        self.motes.iter().map(|m| m.state(now - at)).collect()
    }
}

impl Layer for SparkleDustLayer {
    fn name(&self) -> &'static str {
        "sparkle-dust"
    }

    fn z_index(&self) -> i32 {
        self.config.z_index
    }

    fn tick(&mut self, now: f64) {
        self.mount.now = now;
    }

    fn paint(&self, viewport: Viewport, list: &mut DisplayList) {
        let z = self.config.z_index;
        let space = viewport.percent_space();
        for st in self.states(self.mount.now) {
            if st.alpha <= 0.0 {
                continue;
            }
            list.push_transformed(
                z,
                space,
                DrawOp::Glow {
                    center: st.center,
                    radius: st.radius,
                    color: DUST_TINT.with_alpha(st.alpha),
                    stops: vec![(0.0, 0.95), (0.7, 0.25), (1.0, 0.0)],
                },
            );
        }
    }

    fn teardown(&mut self) {
        self.mount.at = None;
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CloudBandsConfig {
    pub enabled: bool,
    pub z_index: i32,
}

impl Default for CloudBandsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            z_index: 14,
        }
    }
}

const BAND_ROWS: [f64; 4] = [22.0, 38.0, 56.0, 72.0];
const BAND_X: f64 = -10.0;
const BAND_WIDTH: f64 = 120.0;
const BAND_HEIGHT: f64 = 6.0;
const BAND_DRIFT_PCT: f64 = 8.0;

#[derive(Clone, Debug)]
pub struct CloudBand {
    pub rect: Rect,
    pub opacity: f64,
    drift: Tween<f64>,
}

impl CloudBand {
    /// Horizontal offset in view-box units, `local` seconds after mount.
    pub fn offset(&self, local: f64) -> f64 {
        self.drift.sample(local) / 100.0 * self.rect.width()
    }
}

/// Soft horizontal bands sliding back and forth, alternating direction.
#[derive(Clone, Debug)]
pub struct CloudBandsLayer {
    config: CloudBandsConfig,
    bands: Vec<CloudBand>,
    mount: Mount,
}

impl CloudBandsLayer {
    pub fn new(config: CloudBandsConfig) -> Self {
        let bands = BAND_ROWS
            .iter()
            .enumerate()
            .map(|(i, &y)| {
                let to = if i % 2 == 0 {
                    BAND_DRIFT_PCT
                } else {
                    -BAND_DRIFT_PCT
                };
                CloudBand {
                    rect: Rect::new(BAND_X, y, BAND_X + BAND_WIDTH, y + BAND_HEIGHT),
                    opacity: 0.22 - i as f64 * 0.03,
                    drift: Tween::yoyo_loop(0.0, to, 22.0 + i as f64 * 6.0, Ease::InOutSine),
                }
            })
            .collect();
        Self {
            config,
            bands,
            mount: Mount::default(),
        }
    }

    pub fn bands(&self) -> &[CloudBand] {
        &self.bands
    }

    pub fn mount(&mut self, now: f64) {
        if !self.config.enabled {
            return;
        }
        self.mount = Mount { at: Some(now), now };
    }

    pub fn is_mounted(&self) -> bool {
        self.mount.at.is_some()
    }
}

impl Layer for CloudBandsLayer {
    fn name(&self) -> &'static str {
        "cloud-bands"
    }

    fn z_index(&self) -> i32 {
        self.config.z_index
    }

    fn tick(&mut self, now: f64) {
        self.mount.now = now;
    }

    fn paint(&self, viewport: Viewport, list: &mut DisplayList) {
        let Some(local) = self.mount.local() else {
            return;
        };
        let z = self.config.z_index;
        let space = viewport.percent_space();
        let stops = [(0.0, 0.0), (0.5, 0.25), (1.0, 0.0)];
        for band in &self.bands {
            let dx = band.offset(local);
            let slice = band.rect.width() / CLOUD_SLICES as f64;
            for s in 0..CLOUD_SLICES {
                let mid = (s as f64 + 0.5) / CLOUD_SLICES as f64;
                let alpha = stop_alpha(&stops, mid) * band.opacity;
                let x0 = band.rect.x0 + dx + slice * s as f64;
                list.push_transformed(
                    z,
                    space,
                    DrawOp::FillRect {
                        rect: Rect::new(x0, band.rect.y0, x0 + slice, band.rect.y1),
                        color: CLOUD_TINT.with_alpha(alpha),
                    },
                );
            }
        }
    }

    fn teardown(&mut self) {
        self.mount.at = None;
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SunHaloConfig {
    pub enabled: bool,
    pub z_index: i32,
}

impl Default for SunHaloConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            z_index: 11,
        }
    }
}

/// Halo ellipse radii in CSS pixels.
const HALO_RADII: Vec2 = Vec2::new(600.0, 360.0);
/// Halo center as a fraction of the viewport.
const HALO_AT: Vec2 = Vec2::new(0.5, 0.22);

/// Warm elliptical glow near the top of the stage, breathing slowly.
#[derive(Clone, Debug)]
pub struct SunHaloLayer {
    config: SunHaloConfig,
    scale: Tween<f64>,
    opacity: Tween<f64>,
    mount: Mount,
}

impl SunHaloLayer {
    pub fn new(config: SunHaloConfig) -> Self {
        Self {
            config,
            scale: Tween::yoyo_loop(0.96, 1.04, 4.5, Ease::InOutSine),
            opacity: Tween::yoyo_loop(0.18, 0.32, 4.5, Ease::InOutSine),
            mount: Mount::default(),
        }
    }

    pub fn mount(&mut self, now: f64) {
        if !self.config.enabled {
            return;
        }
        self.mount = Mount { at: Some(now), now };
    }

    pub fn is_mounted(&self) -> bool {
        self.mount.at.is_some()
    }

    /// `(scale, opacity)` at `now`, `None` when unmounted.
    pub fn breath(&self, now: f64) -> Option<(f64, f64)> {
        let at = self.mount.at?;
        let local = now - at;
        Some((self.scale.sample(local), self.opacity.sample(local)))
    }
}

impl Layer for SunHaloLayer {
    fn name(&self) -> &'static str {
        "sun-halo"
    }

    fn z_index(&self) -> i32 {
        self.config.z_index
    }

    fn tick(&mut self, now: f64) {
        self.mount.now = now;
    }

    fn paint(&self, viewport: Viewport, list: &mut DisplayList) {
        let Some((scale, opacity)) = self.breath(self.mount.now) else {
            return;
        };
        let anchor = Point::new(viewport.width * HALO_AT.x, viewport.height * HALO_AT.y);
        let xf = Affine::scale_about(scale, viewport.center())
            * Affine::translate(anchor.to_vec2())
            * Affine::scale_non_uniform(1.0, HALO_RADII.y / HALO_RADII.x);
        list.push_transformed(
            self.config.z_index,
            xf,
            DrawOp::Glow {
                center: Point::ORIGIN,
                radius: HALO_RADII.x,
                color: HALO_TINT.with_alpha(opacity),
                stops: vec![(0.0, 0.35), (0.35, 0.12), (0.7, 0.0), (1.0, 0.0)],
            },
        );
    }

    fn teardown(&mut self) {
        self.mount.at = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/ambient.rs"]
mod tests;
