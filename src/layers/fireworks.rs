use std::collections::VecDeque;

use slotmap::{SlotMap, new_key_type};

use crate::{
    animation::{
        ease::Ease,
        timer::{TimerId, TimerQueue},
    },
    foundation::{
        color::Color,
        core::{Point, Vec2, Viewport},
        error::StageResult,
        math::{Rng64, clamp01, lerp},
    },
    layers::Layer,
    render::{
        cpu::CpuRenderer,
        display::{DisplayList, DrawOp},
        surface::CanvasSurface,
    },
};

/// Maximum trail samples kept per rocket.
pub const TRAIL_LEN: usize = 20;

#[derive(Clone, Copy, Debug)]
struct Palette {
    hue: (f64, f64),
    sat: (f64, f64),
    light: (f64, f64),
}

const PALETTES: [Palette; 6] = [
    Palette {
        hue: (10.0, 30.0),
        sat: (85.0, 100.0),
        light: (55.0, 75.0),
    },
    Palette {
        hue: (40.0, 60.0),
        sat: (90.0, 100.0),
        light: (60.0, 80.0),
    },
    Palette {
        hue: (320.0, 340.0),
        sat: (80.0, 95.0),
        light: (60.0, 75.0),
    },
    Palette {
        hue: (270.0, 290.0),
        sat: (70.0, 90.0),
        light: (55.0, 70.0),
    },
    Palette {
        hue: (180.0, 200.0),
        sat: (75.0, 95.0),
        light: (50.0, 70.0),
    },
    Palette {
        hue: (0.0, 15.0),
        sat: (95.0, 100.0),
        light: (55.0, 70.0),
    },
];

fn palette_for_hue(hue: f64) -> Palette {
    PALETTES
        .iter()
        .copied()
        .find(|p| hue >= p.hue.0 && hue <= p.hue.1)
        .unwrap_or(PALETTES[0])
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FireworksConfig {
    pub enabled: bool,
    pub z_index: i32,
    /// Rocket launch interval in milliseconds.
    pub rate_ms: u64,
    /// Particles per explosion.
    pub particles: usize,
    /// Upper clamp for the device pixel ratio of the backing surface.
    pub max_dpr: f64,
}

impl Default for FireworksConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            z_index: 15,
            rate_ms: 900,
            particles: 60,
            max_dpr: 2.0,
        }
    }
}

new_key_type! {
    pub struct ParticleId;
    pub struct RocketId;
}

/// One burst particle. Motion is closed-form in the particle's animated time `t`.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub origin: Point,
    pub velocity: Vec2,
    pub gravity: f64,
    pub life: f64,
    pub born_at: f64,
    pub radius: f64,
    pub hue: f64,
    pub sat: f64,
    pub light: f64,
}

/// Evaluated particle state at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleState {
    /// Animated time in `[0, life]`.
    pub t: f64,
    pub pos: Point,
    pub alpha: f64,
}

impl Particle {
    /// Animated time for a wall-clock `elapsed`: `life * ease_out(elapsed / life)`.
    pub fn animated_time(&self, elapsed: f64) -> f64 {
        if self.life <= 0.0 {
            return 0.0;
        }
        self.life * Ease::OutQuad.apply(clamp01(elapsed / self.life))
    }

    pub fn state_at_t(&self, t: f64) -> ParticleState {
        let pos = Point::new(
            self.origin.x + self.velocity.x * t,
            self.origin.y + self.velocity.y * t + 0.5 * self.gravity * t * t,
        );
        let alpha = if self.life > 0.0 {
            (1.0 - t / self.life).clamp(0.0, 1.0)
        } else {
            0.0
        };
        ParticleState { t, pos, alpha }
    }

    pub fn state(&self, now: f64) -> ParticleState {
        self.state_at_t(self.animated_time(now - self.born_at))
    }

    pub fn is_expired(&self, now: f64) -> bool {
        now - self.born_at >= self.life
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailSample {
    pub pos: Point,
    pub alpha: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Rocket {
    pub x: f64,
    pub start_y: f64,
    pub target_y: f64,
    pub hue: f64,
    pub launched_at: f64,
    pub duration: f64,
    trail: VecDeque<Point>,
}

impl Rocket {
    pub fn position(&self, now: f64) -> Point {
        let p = if self.duration > 0.0 {
            clamp01((now - self.launched_at) / self.duration)
        } else {
            1.0
        };
        Point::new(
            self.x,
            lerp(self.start_y, self.target_y, Ease::OutCubic.apply(p)),
        )
    }

    pub fn arrives_at(&self) -> f64 {
        self.launched_at + self.duration
    }

    fn record(&mut self, pos: Point) {
        self.trail.push_front(pos);
        self.trail.truncate(TRAIL_LEN);
    }

    /// Trail samples, newest first, alpha decaying linearly with age.
    pub fn trail(&self) -> Vec<TrailSample> {
        let n = self.trail.len() as f64;
        self.trail
            .iter()
            .enumerate()
            .map(|(i, &pos)| TrailSample {
                pos,
                alpha: 1.0 - i as f64 / n,
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FireEvent {
    Shoot,
}

const HALO_STOPS: [(f64, f64); 3] = [(0.0, 1.0), (0.4, 0.5), (1.0, 0.0)];
const TRAIL_STOPS: [(f64, f64); 3] = [(0.0, 1.0), (0.5, 0.5), (1.0, 0.0)];
const HEAD_OUTER_STOPS: [(f64, f64); 4] = [(0.0, 1.0), (0.3, 0.667), (0.6, 0.333), (1.0, 0.0)];
const HEAD_INNER_STOPS: [(f64, f64); 3] = [(0.0, 1.0), (0.5, 0.9), (1.0, 0.5)];

/// Rockets and particle bursts on a full-viewport canvas.
#[derive(Debug)]
pub struct FireworksLayer {
    config: FireworksConfig,
    rng: Rng64,
    timers: TimerQueue<FireEvent>,
    interval: Option<TimerId>,
    particles: SlotMap<ParticleId, Particle>,
    rockets: SlotMap<RocketId, Rocket>,
    surface: CanvasSurface,
    viewport: Viewport,
    now: f64,
    mounted: bool,
}

impl FireworksLayer {
    pub fn new(config: FireworksConfig, seed: u64) -> Self {
        Self {
            config,
            rng: Rng64::new(seed),
            timers: TimerQueue::new(),
            interval: None,
            particles: SlotMap::with_key(),
            rockets: SlotMap::with_key(),
            surface: CanvasSurface::default(),
            viewport: Viewport::default(),
            now: 0.0,
            mounted: false,
        }
    }

    pub fn config(&self) -> &FireworksConfig {
        &self.config
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Size the surface, fire the first rocket and start the launch interval.
    pub fn mount(&mut self, now: f64, viewport: Viewport) {
        if self.mounted {
            self.teardown();
        }
        self.surface.resize(viewport, self.config.max_dpr);
        self.viewport = viewport;
        self.now = now;
        if !self.config.enabled {
            self.surface.clear();
            return;
        }
        self.mounted = true;
        self.shoot(now);
        let period = self.config.rate_ms as f64 / 1000.0;
        self.interval = Some(self.timers.every(now, period, FireEvent::Shoot));
        tracing::debug!(now, period, "fireworks mounted");
    }

    /// Follow a viewport change. Particle and rocket state are untouched.
    pub fn resize(&mut self, viewport: Viewport) {
        if !self.config.enabled {
            return;
        }
        self.viewport = viewport;
        self.surface.resize(viewport, self.config.max_dpr);
    }

    pub fn tick(&mut self, now: f64) {
        if !self.mounted {
            return;
        }
        for fired in self.timers.advance(now) {
            match fired.event {
                FireEvent::Shoot => {
                    self.shoot(fired.due);
                }
            }
        }

        let mut arrived = Vec::new();
        for (id, rocket) in self.rockets.iter_mut() {
            if now >= rocket.arrives_at() {
                arrived.push(id);
            } else {
                let pos = rocket.position(now);
                rocket.record(pos);
            }
        }
        for id in arrived {
            if let Some(rocket) = self.rockets.remove(id) {
                let at = rocket.arrives_at();
                self.spawn_explosion(at, Point::new(rocket.x, rocket.target_y), rocket.hue);
            }
        }

        self.particles.retain(|_, p| !p.is_expired(now));
        self.now = now;
    }

    /// Burst `config.particles` particles at `center`, colored from the palette of `rocket_hue`.
    pub fn spawn_explosion(&mut self, now: f64, center: Point, rocket_hue: f64) {
        if !self.mounted {
            return;
        }
        let palette = palette_for_hue(rocket_hue);
        let rng = &mut self.rng;
        for _ in 0..self.config.particles {
            let angle = rng.range(0.0, std::f64::consts::TAU);
            let speed = rng.range(220.0, 700.0);
            let gravity = rng.range(250.0, 650.0);
            let kick = rng.range(100.0, 300.0);
            let particle = Particle {
                origin: center,
                velocity: Vec2::new(angle.cos() * speed, angle.sin() * speed - kick),
                gravity,
                life: rng.range(1.4, 3.2),
                born_at: now,
                radius: rng.range(1.8, 3.8),
                hue: rng.range(palette.hue.0, palette.hue.1),
                sat: rng.range(palette.sat.0, palette.sat.1),
                light: rng.range(palette.light.0, palette.light.1),
            };
            self.particles.insert(particle);
        }
    }

    pub fn launch_rocket(&mut self, now: f64, start: Point, target_y: f64) -> Option<RocketId> {
        if !self.mounted {
            return None;
        }
        let palette = PALETTES[self.rng.index(PALETTES.len())];
        let hue = self.rng.range(palette.hue.0, palette.hue.1);
        let duration = self.rng.range(0.7, 1.1);
        Some(self.rockets.insert(Rocket {
            x: start.x,
            start_y: start.y,
            target_y,
            hue,
            launched_at: now,
            duration,
            trail: VecDeque::with_capacity(TRAIL_LEN),
        }))
    }

    /// Launch one rocket from a random spot along the bottom edge.
    pub fn shoot(&mut self, now: f64) -> Option<RocketId> {
        let (w, h) = (self.viewport.width, self.viewport.height);
        let x = self.rng.range(w * 0.25, w * 0.75);
        let target_y = self.rng.range(h * 0.15, h * 0.35);
        self.launch_rocket(now, Point::new(x, h), target_y)
    }

    /// Draw ops for the state at the last tick, in CSS pixels.
    pub fn display_list(&self) -> DisplayList {
        let mut list = DisplayList::new();
        let z = self.config.z_index;
        let now = self.now;

        for rocket in self.rockets.values() {
            let trail = rocket.trail();
            let n = trail.len() as f64;
            for (j, s) in trail.iter().enumerate() {
                let size = 2.5 - (j as f64 / n) * 1.8;
                let a = s.alpha * 0.85;
                list.push(
                    z,
                    DrawOp::Glow {
                        center: s.pos,
                        radius: size * 2.0,
                        color: Color::hsla(rocket.hue, 95.0, 75.0, a),
                        stops: TRAIL_STOPS.to_vec(),
                    },
                );
                list.push(
                    z,
                    DrawOp::Circle {
                        center: s.pos,
                        radius: size,
                        color: Color::hsla(rocket.hue, 100.0, 85.0, a),
                    },
                );
            }
            let head = rocket.position(now);
            list.push(
                z,
                DrawOp::Glow {
                    center: head,
                    radius: 12.0,
                    color: Color::hsla(rocket.hue, 100.0, 95.0, 0.9),
                    stops: HEAD_OUTER_STOPS.to_vec(),
                },
            );
            list.push(
                z,
                DrawOp::Glow {
                    center: head,
                    radius: 5.0,
                    color: Color::hsla(rocket.hue, 100.0, 98.0, 1.0),
                    stops: HEAD_INNER_STOPS.to_vec(),
                },
            );
        }

        for p in self.particles.values() {
            let st = p.state(now);
            if st.alpha <= 0.0 {
                continue;
            }
            list.push(
                z,
                DrawOp::Glow {
                    center: st.pos,
                    radius: p.radius * 3.0,
                    color: Color::hsla(p.hue, p.sat, p.light, st.alpha),
                    stops: HALO_STOPS.to_vec(),
                },
            );
            list.push(
                z,
                DrawOp::Circle {
                    center: st.pos,
                    radius: p.radius,
                    color: Color::hsla(p.hue, p.sat, (p.light + 20.0).min(95.0), st.alpha),
                },
            );
        }
        list
    }

    /// Rasterize the current state onto the layer's own surface.
    pub fn draw(&mut self, renderer: &mut CpuRenderer) -> StageResult<()> {
        if !self.mounted {
            return Ok(());
        }
        let (w, h) = self.surface.pixel_size();
        let frame = renderer.render(
            &self.display_list(),
            w,
            h,
            self.surface.pixel_ratio(),
            None,
        )?;
        self.surface.present(frame);
        Ok(())
    }

    /// Timers plus live rocket and particle handles.
    pub fn pending_handles(&self) -> usize {
        self.timers.len() + self.rockets.len() + self.particles.len()
    }

    pub fn live_particles(&self) -> impl Iterator<Item = (ParticleId, &Particle)> + '_ {
        self.particles.iter()
    }

    pub fn live_rockets(&self) -> impl Iterator<Item = (RocketId, &Rocket)> + '_ {
        self.rockets.iter()
    }

    pub fn surface(&self) -> &CanvasSurface {
        &self.surface
    }

    /// Cancel the interval, drop every rocket and particle and clear the surface.
    pub fn teardown(&mut self) {
        if let Some(id) = self.interval.take() {
            self.timers.cancel(id);
        }
        self.timers.clear();
        self.particles.clear();
        self.rockets.clear();
        self.surface.clear();
        if self.mounted {
            tracing::debug!("fireworks torn down");
        }
        self.mounted = false;
    }
}

impl Layer for FireworksLayer {
    fn name(&self) -> &'static str {
        "fireworks"
    }

    fn z_index(&self) -> i32 {
        self.config.z_index
    }

    fn tick(&mut self, now: f64) {
        FireworksLayer::tick(self, now);
    }

    fn paint(&self, _viewport: Viewport, list: &mut DisplayList) {
        if self.mounted {
            list.extend(self.display_list());
        }
    }

    fn teardown(&mut self) {
        FireworksLayer::teardown(self);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/fireworks.rs"]
mod tests;
