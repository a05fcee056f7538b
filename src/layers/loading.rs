//! Soft loading decor: a spinning ring and rising sparks held on stage while the reveal artwork
//! is being readied.

use std::f64::consts::{FRAC_PI_2, TAU};

use kurbo::Shape;

use crate::{
    animation::{ease::Ease, tween::Tween},
    foundation::{
        color::Color,
        core::{Point, Vec2, Viewport},
        math::Rng64,
    },
    layers::Layer,
    render::display::{DisplayList, DrawOp},
};

const TRACK_TINT: Color = Color::rgba(1.0, 1.0, 1.0, 0.18);
const ARC_TINT: Color = Color::rgba(1.0, 220.0 / 255.0, 160.0 / 255.0, 0.75);
const SPARK_TINT: Color = Color::rgba(1.0, 250.0 / 255.0, 235.0 / 255.0, 1.0);
const SPARK_REST_ALPHA: f64 = 0.15;
const SPARK_RADIUS: f64 = 3.0;
const SPARK_STAGGER: f64 = 0.08;
const CURVE_TOLERANCE: f64 = 0.1;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoadingDecorConfig {
    pub enabled: bool,
    pub z_index: i32,
    /// How long the decor stays up after the intro before the reveal takes over.
    pub hold_ms: u64,
    pub ring_radius: f64,
    pub ring_width: f64,
    /// Seconds per ring revolution.
    pub spin_duration: f64,
    pub sparks: usize,
}

impl Default for LoadingDecorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            z_index: 30,
            hold_ms: 600,
            ring_radius: 30.0,
            ring_width: 6.0,
            spin_duration: 2.4,
            sparks: 14,
        }
    }
}

impl LoadingDecorConfig {
    /// Hold in seconds; zero when the decor is disabled.
    pub fn hold(&self) -> f64 {
        if self.enabled {
            self.hold_ms as f64 / 1000.0
        } else {
            0.0
        }
    }
}

#[derive(Clone, Debug)]
pub struct Spark {
    /// Resting position, percent of the viewport.
    pub anchor: Point,
    rise: Tween<Vec2>,
    glow: Tween<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SparkState {
    pub center: Point,
    pub alpha: f64,
}

impl Spark {
    fn random(rng: &mut Rng64, index: usize) -> Self {
        let anchor = Point::new(10.0 + index as f64 * 6.0, 20.0 + (index % 6) as f64 * 10.0);
        let to = Vec2::new(rng.range(-14.0, 14.0), -rng.range(18.0, 46.0));
        let peak = rng.range(0.25, 0.7);
        let duration = rng.range(2.2, 4.2);
        let delay = SPARK_STAGGER * index as f64;
        Self {
            anchor,
            rise: Tween::yoyo_loop(Vec2::ZERO, to, duration, Ease::InOutSine).delay(delay),
            glow: Tween::yoyo_loop(SPARK_REST_ALPHA, peak, duration, Ease::InOutSine)
                .delay(delay),
        }
    }

    /// Pixel position and alpha `local` seconds after mount.
    pub fn state(&self, viewport: Viewport, local: f64) -> SparkState {
        let rest = Point::new(
            self.anchor.x / 100.0 * viewport.width,
            self.anchor.y / 100.0 * viewport.height,
        );
        SparkState {
            center: rest + self.rise.sample(local),
            alpha: self.glow.sample(local),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LoadingDecorLayer {
    config: LoadingDecorConfig,
    sparks: Vec<Spark>,
    mounted_at: Option<f64>,
    now: f64,
}

impl LoadingDecorLayer {
    pub fn new(config: LoadingDecorConfig, seed: u64) -> Self {
        let mut rng = Rng64::new(seed);
        let sparks = (0..config.sparks)
            .map(|i| Spark::random(&mut rng, i))
            .collect();
        Self {
            config,
            sparks,
            mounted_at: None,
            now: 0.0,
        }
    }

    pub fn config(&self) -> &LoadingDecorConfig {
        &self.config
    }

    pub fn sparks(&self) -> &[Spark] {
        &self.sparks
    }

    pub fn mount(&mut self, now: f64) {
        if !self.config.enabled {
            return;
        }
        self.mounted_at = Some(now);
        self.now = now;
        tracing::debug!(now, "loading decor mounted");
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted_at.is_some()
    }

    /// Ring rotation in radians, one linear turn per `spin_duration`.
    pub fn ring_angle(&self, now: f64) -> f64 {
        let (Some(at), spin) = (self.mounted_at, self.config.spin_duration) else {
            return 0.0;
        };
        if spin <= 0.0 {
            return 0.0;
        }
        ((now - at).max(0.0) / spin).fract() * TAU
    }

    pub fn spark_states(&self, viewport: Viewport, now: f64) -> Vec<SparkState> {
        let Some(at) = self.mounted_at else {
            return Vec::new();
        };
        let local = (now - at).max(0.0);
        self.sparks
            .iter()
            .map(|s| s.state(viewport, local))
            .collect()
    }
}

impl Layer for LoadingDecorLayer {
    fn name(&self) -> &'static str {
        "loading"
    }

    fn z_index(&self) -> i32 {
        self.config.z_index
    }

    fn tick(&mut self, now: f64) {
        self.now = now;
    }

    fn paint(&self, viewport: Viewport, list: &mut DisplayList) {
        if !self.is_mounted() {
            return;
        }
        let z = self.config.z_index;
        let center = viewport.center();
        let r = self.config.ring_radius;

        list.push(
            z,
            DrawOp::StrokePath {
                path: kurbo::Circle::new(center, r).to_path(CURVE_TOLERANCE),
                width: self.config.ring_width,
                color: TRACK_TINT,
            },
        );
        // Quarter arc from twelve o'clock, clockwise.
        let arc = kurbo::Arc::new(
            center,
            Vec2::new(r, r),
            self.ring_angle(self.now) - FRAC_PI_2,
            FRAC_PI_2,
            0.0,
        );
        list.push(
            z,
            DrawOp::StrokePath {
                path: arc.to_path(CURVE_TOLERANCE),
                width: self.config.ring_width,
                color: ARC_TINT,
            },
        );

        for spark in self.spark_states(viewport, self.now) {
            list.push(
                z,
                DrawOp::Glow {
                    center: spark.center,
                    radius: SPARK_RADIUS,
                    color: SPARK_TINT.with_alpha(spark.alpha),
                    stops: vec![(0.0, 1.0), (0.6, 0.35), (1.0, 0.0)],
                },
            );
        }
    }

    fn teardown(&mut self) {
        self.mounted_at = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/loading.rs"]
mod tests;
