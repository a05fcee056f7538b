use crate::{
    animation::ease::Ease,
    foundation::core::{Point, Vec2},
};

/// Interpolation contract for tweened value types.
pub trait Lerp: Sized {
    /// Interpolate from `a` to `b` with normalized factor `t` in `[0, 1]`.
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Vec2 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Vec2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

impl Lerp for Point {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a.lerp(*b, t)
    }
}

/// How many extra times a tween plays after its first pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Repeat {
    #[default]
    Once,
    Times(u32),
    Forever,
}

impl Repeat {
    fn extra(self) -> Option<u32> {
        match self {
            Self::Once => Some(0),
            Self::Times(n) => Some(n),
            Self::Forever => None,
        }
    }
}

/// One property change from `from` to `to`, with optional delay, repeat and yoyo.
///
/// Sampling is a pure function of local time, so a tween can be evaluated at any instant without
/// stepping through the frames before it.
#[derive(Clone, Debug, PartialEq)]
pub struct Tween<T> {
    pub from: T,
    pub to: T,
    pub duration: f64,
    pub ease: Ease,
    pub delay: f64,
    pub repeat: Repeat,
    pub yoyo: bool,
}

impl<T> Tween<T>
where
    T: Lerp + Clone,
{
    pub fn new(from: T, to: T, duration: f64, ease: Ease) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            ease,
            delay: 0.0,
            repeat: Repeat::Once,
            yoyo: false,
        }
    }

    /// Infinite back-and-forth between `from` and `to`.
    pub fn yoyo_loop(from: T, to: T, duration: f64, ease: Ease) -> Self {
        Self::new(from, to, duration, ease)
            .repeat(Repeat::Forever)
            .yoyo(true)
    }

    pub fn delay(mut self, delay: f64) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    pub fn repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn yoyo(mut self, yoyo: bool) -> Self {
        self.yoyo = yoyo;
        self
    }

    /// Stretch every time quantity by `factor` (`> 1` is slower).
    pub fn stretched(mut self, factor: f64) -> Self {
        self.duration *= factor;
        self.delay *= factor;
        self
    }

    /// Delay plus every pass; infinite for [`Repeat::Forever`].
    pub fn total_duration(&self) -> f64 {
        match self.repeat.extra() {
            Some(n) => self.delay + self.duration * f64::from(n + 1),
            None => f64::INFINITY,
        }
    }

    pub fn is_finished(&self, local: f64) -> bool {
        local >= self.total_duration()
    }

    /// Sample at `local` seconds since the tween was placed.
    pub fn sample(&self, local: f64) -> T {
        let t = local - self.delay;
        if t <= 0.0 {
            return self.from.clone();
        }
        if self.duration <= 0.0 {
            return self.final_value();
        }

        let pass = (t / self.duration).floor();
        if let Some(extra) = self.repeat.extra()
            && pass > f64::from(extra)
        {
            return self.final_value();
        }

        let frac = t / self.duration - pass;
        let backwards = self.yoyo && (pass as u64) % 2 == 1;
        let p = if backwards { 1.0 - frac } else { frac };
        T::lerp(&self.from, &self.to, self.ease.apply(p))
    }

    fn final_value(&self) -> T {
        match self.repeat.extra() {
            Some(extra) if self.yoyo && extra % 2 == 1 => self.from.clone(),
            _ => self.to.clone(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/tween.rs"]
mod tests;
