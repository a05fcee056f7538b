//! Actor flight intro, rescaled to an exact total duration.

use kurbo::Shape;

use crate::{
    animation::{
        ease::Ease,
        timeline::Timeline,
        tween::{Repeat, Tween},
    },
    foundation::{
        color::Color,
        core::{Affine, BezPath, Point, Vec2, Viewport},
        error::{StageError, StageResult},
        math::{Rng64, clamp01},
    },
    layers::Layer,
    render::display::{DisplayList, DrawOp},
};

/// Actor artwork box in its own units; rendered at `scale` CSS px per unit.
const ACTOR_SIZE: Vec2 = Vec2::new(240.0, 160.0);
/// Horizontal travel in percent of the actor's own width, each side.
const TRAVEL_PCT: f64 = 140.0;
const TOLERANCE: f64 = 0.1;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct IntroConfig {
    pub duration_ms: u64,
    pub count: usize,
    /// Layer fade-out after completion, seconds.
    pub fade_out: f64,
    pub z_index: i32,
}

impl Default for IntroConfig {
    fn default() -> Self {
        Self {
            duration_ms: 3000,
            count: 5,
            fade_out: 0.35,
            z_index: 40,
        }
    }
}

impl IntroConfig {
    pub fn validate(&self) -> StageResult<()> {
        if self.duration_ms == 0 {
            return Err(StageError::validation("intro duration_ms must be > 0"));
        }
        if !self.fade_out.is_finite() || self.fade_out < 0.0 {
            return Err(StageError::validation(
                "intro fade_out must be finite and >= 0",
            ));
        }
        Ok(())
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_ms as f64 / 1000.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    LeftToRight,
    RightToLeft,
}

impl Direction {
    fn sign(self) -> f64 {
        match self {
            Self::LeftToRight => 1.0,
            Self::RightToLeft => -1.0,
        }
    }
}

/// Per-actor layout, fixed for the lifetime of one mount.
#[derive(Clone, Debug, PartialEq)]
pub struct ActorConfig {
    /// Vertical lane, percent of viewport height.
    pub lane_pct: f64,
    pub scale: f64,
    pub blur: f64,
    pub opacity: f64,
    pub direction: Direction,
    /// Time to cross the screen, seconds.
    pub flight: f64,
    pub delay: f64,
    /// Vertical bob amplitude, px.
    pub bob: f64,
    pub tilt_deg: f64,
}

impl ActorConfig {
    pub fn random(rng: &mut Rng64) -> Self {
        Self {
            lane_pct: rng.range(18.0, 72.0),
            scale: rng.range(0.55, 1.05),
            blur: rng.range(0.0, 0.8),
            opacity: rng.range(0.75, 1.0),
            direction: if rng.coin() {
                Direction::LeftToRight
            } else {
                Direction::RightToLeft
            },
            flight: rng.range(1.6, 2.6),
            delay: rng.range(0.0, 0.7),
            bob: rng.range(10.0, 28.0),
            tilt_deg: rng.range(-6.0, 6.0),
        }
    }

    /// This actor's own flight: fade in, cross, bob with a tilt, fade out.
    fn flight_timeline(&self, index: usize) -> Timeline<ActorKey> {
        let sign = self.direction.sign();
        let half = self.flight / 2.0;
        let bob = |from: f64, to: f64| {
            Tween::new(from, to, half, Ease::InOutSine)
                .repeat(Repeat::Times(1))
                .yoyo(true)
        };

        let mut tl = Timeline::new();
        tl.to(
            (index, ActorProp::Opacity),
            Tween::new(0.0, 1.0, 0.2, Ease::InOutSine),
            0.0,
        )
        .to(
            (index, ActorProp::X),
            Tween::new(-sign * TRAVEL_PCT, sign * TRAVEL_PCT, self.flight, Ease::InOutQuad),
            0.0,
        )
        .to((index, ActorProp::Y), bob(0.0, -self.bob), 0.0)
        .to((index, ActorProp::Rotate), bob(0.0, self.tilt_deg), 0.0)
        .to(
            (index, ActorProp::Opacity),
            Tween::new(1.0, 0.0, 0.25, Ease::InOutSine),
            (self.flight - 0.2).max(0.0),
        );
        tl
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActorProp {
    Opacity,
    X,
    Y,
    Rotate,
}

type ActorKey = (usize, ActorProp);

/// Animated state of one actor at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActorPose {
    pub x_pct: f64,
    pub y_px: f64,
    pub rotate_deg: f64,
    pub opacity: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntroEvent {
    Completed,
}

#[derive(Clone, Debug)]
pub struct IntroLayer {
    config: IntroConfig,
    actors: Vec<ActorConfig>,
    master: Timeline<ActorKey>,
    started_at: Option<f64>,
    now: f64,
    completed: bool,
}

impl IntroLayer {
    pub fn new(config: IntroConfig, seed: u64) -> StageResult<Self> {
        let mut rng = Rng64::new(seed);
        let actors = (0..config.count)
            .map(|_| ActorConfig::random(&mut rng))
            .collect();
        Self::with_actors(config, actors)
    }

    /// Build from explicit actor layouts.
    pub fn with_actors(config: IntroConfig, actors: Vec<ActorConfig>) -> StageResult<Self> {
        config.validate()?;
        let mut master = Timeline::new();
        for (i, actor) in actors.iter().enumerate() {
            master.insert(actor.delay, actor.flight_timeline(i));
        }
        let natural = master.natural_duration();
        master.set_total_duration(config.duration_secs())?;
        tracing::debug!(
            actors = actors.len(),
            natural,
            target = config.duration_secs(),
            "intro timeline built"
        );
        Ok(Self {
            config,
            actors,
            master,
            started_at: None,
            now: 0.0,
            completed: false,
        })
    }

    pub fn actors(&self) -> &[ActorConfig] {
        &self.actors
    }

    /// Length of the (rescaled) master timeline; always the configured duration.
    pub fn total_duration(&self) -> f64 {
        self.master.total_duration()
    }

    /// Natural length of the actor flights before rescaling.
    pub fn natural_duration(&self) -> f64 {
        self.master.natural_duration()
    }

    pub fn mount(&mut self, now: f64) {
        self.started_at = Some(now);
        self.now = now;
        self.completed = false;
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some() && !self.completed
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    fn local(&self, now: f64) -> Option<f64> {
        self.started_at.map(|s| (now - s).max(0.0))
    }

    /// Advance to `now`; yields [`IntroEvent::Completed`] once, when the target duration is reached.
    pub fn tick(&mut self, now: f64) -> Option<IntroEvent> {
        self.now = now;
        let local = self.local(now)?;
        if !self.completed && self.master.is_complete(local) {
            self.completed = true;
            tracing::info!(at = now, "intro completed");
            return Some(IntroEvent::Completed);
        }
        None
    }

    /// Whole-layer opacity: `1` while playing, then fades out over `fade_out`.
    pub fn layer_opacity(&self, now: f64) -> f64 {
        let Some(local) = self.local(now) else {
            return 0.0;
        };
        let over = local - self.total_duration();
        if over <= 0.0 {
            return 1.0;
        }
        if self.config.fade_out <= 0.0 {
            return 0.0;
        }
        1.0 - Ease::OutCubic.apply(clamp01(over / self.config.fade_out))
    }

    /// The layer is invisible for good.
    pub fn is_faded_out(&self, now: f64) -> bool {
        self.completed && self.layer_opacity(now) <= 0.0
    }

    pub fn pose(&self, index: usize, now: f64) -> Option<ActorPose> {
        let actor = self.actors.get(index)?;
        let local = self.local(now)?;
        let m = &self.master;
        Some(ActorPose {
            x_pct: m.sample_or((index, ActorProp::X), local, -actor.direction.sign() * TRAVEL_PCT),
            y_px: m.sample_or((index, ActorProp::Y), local, 0.0),
            rotate_deg: m.sample_or((index, ActorProp::Rotate), local, 0.0),
            opacity: m.sample_or((index, ActorProp::Opacity), local, 0.0),
        })
    }

    /// Screen-space center of an actor for a pose.
    pub fn actor_center(actor: &ActorConfig, pose: &ActorPose, viewport: Viewport) -> Point {
        let half_w = viewport.width * 0.5;
        let actor_w = ACTOR_SIZE.x * actor.scale;
        Point::new(
            half_w + pose.x_pct / TRAVEL_PCT * (half_w + actor_w),
            viewport.height * actor.lane_pct / 100.0 + pose.y_px,
        )
    }
}

fn ellipse(cx: f64, cy: f64, rx: f64, ry: f64) -> BezPath {
    kurbo::Ellipse::new((cx, cy), (rx, ry), 0.0).to_path(TOLERANCE)
}

/// Actor artwork in its own `240 x 160` box.
fn actor_ops(alpha: f64, scale: f64) -> Vec<DrawOp> {
    let wool = Color::rgba8(255, 255, 255, alpha);
    let face = Color::rgba8(0x2b, 0x2a, 0x3a, alpha);
    let eye = Color::rgba8(0x11, 0x11, 0x11, alpha);
    let fill = |path: BezPath, color: Color| DrawOp::FillPath { path, color };

    let mut ops = vec![
        fill(ellipse(120.0, 92.0, 68.0, 44.0), wool),
        fill(ellipse(70.0, 92.0, 30.0, 32.0), wool),
        fill(ellipse(170.0, 92.0, 30.0, 32.0), wool),
        fill(ellipse(120.0, 120.0, 48.0, 22.0), wool),
        fill(ellipse(185.0, 88.0, 26.0, 22.0), face),
    ];
    for (cx, r, c) in [
        (178.0, 3.2, wool),
        (192.0, 3.2, wool),
        (178.0, 1.4, eye),
        (192.0, 1.4, eye),
    ] {
        ops.push(DrawOp::Circle {
            center: Point::new(cx, 84.0),
            radius: r,
            color: c,
        });
    }
    let mut smile = BezPath::new();
    smile.move_to((178.0, 96.0));
    smile.quad_to((185.0, 102.0), (192.0, 96.0));
    ops.push(DrawOp::StrokePath {
        path: smile,
        width: 2.5 * scale,
        color: wool,
    });
    ops.push(fill(ellipse(162.0, 86.0, 10.0, 14.0), face));
    ops.push(fill(ellipse(208.0, 86.0, 10.0, 14.0), face));
    for (x, y0, y1) in [
        (90.0, 130.0, 148.0),
        (115.0, 132.0, 150.0),
        (140.0, 132.0, 150.0),
        (165.0, 130.0, 148.0),
    ] {
        let mut leg = BezPath::new();
        leg.move_to((x, y0));
        leg.line_to((x, y1));
        ops.push(DrawOp::StrokePath {
            path: leg,
            width: 7.0 * scale,
            color: face,
        });
    }
    ops
}

impl Layer for IntroLayer {
    fn name(&self) -> &'static str {
        "intro"
    }

    fn z_index(&self) -> i32 {
        self.config.z_index
    }

    /// Drives the intro without a consumer. The stage calls the inherent `tick` and routes the
    /// completion event itself.
    fn tick(&mut self, now: f64) {
        let _ = IntroLayer::tick(self, now);
    }

    fn paint(&self, viewport: Viewport, list: &mut DisplayList) {
        let now = self.now;
        let layer_alpha = self.layer_opacity(now);
        if layer_alpha <= 0.0 {
            return;
        }
        for (i, actor) in self.actors.iter().enumerate() {
            let Some(pose) = self.pose(i, now) else {
                continue;
            };
            let alpha = pose.opacity * actor.opacity * layer_alpha;
            if alpha <= 0.0 {
                continue;
            }
            let center = Self::actor_center(actor, &pose, viewport);
            let xf = Affine::translate(center.to_vec2())
                * Affine::rotate(pose.rotate_deg.to_radians())
                * Affine::scale(actor.scale)
                * Affine::translate(-ACTOR_SIZE * 0.5);
            for op in actor_ops(alpha, actor.scale) {
                list.push_transformed(self.config.z_index, xf, op);
            }
        }
    }

    fn teardown(&mut self) {
        self.started_at = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/intro.rs"]
mod tests;
