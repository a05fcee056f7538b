use crate::foundation::error::{StageError, StageResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32, // must be > 0
}

impl Fps {
    pub fn new(num: u32, den: u32) -> StageResult<Self> {
        if den == 0 {
            return Err(StageError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(StageError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * f64::from(self.den) / f64::from(self.num)
    }

    pub fn secs_to_frames_floor(self, secs: f64) -> u64 {
        // Absorbs representation error so whole-frame times map back to their own frame.
        (secs * self.as_f64() + 1e-9).floor().max(0.0) as u64
    }
}

/// Client-area size in CSS pixels plus the reported device pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub device_pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    pub fn center(self) -> Point {
        Point::new(self.width * 0.5, self.height * 0.5)
    }

    pub fn rect(self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Maps a `0..100` view box onto the full client area (`preserveAspectRatio="none"`).
    pub fn percent_space(self) -> Affine {
        Affine::scale_non_uniform(self.width / 100.0, self.height / 100.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0, 1.0)
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8Premul {
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Animated visual properties of one element (a backdrop sub-layer, an actor, a group).
///
/// Percent offsets are relative to the element's own size, rotation is in degrees.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VisualProps {
    pub opacity: f64,
    pub scale: f64,
    pub blur_px: f64,
    pub x_percent: f64,
    pub y_percent: f64,
    pub rotate_deg: f64,
    /// Vertical background position in percent (`50` is centered).
    pub position_y_pct: f64,
}

impl Default for VisualProps {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            scale: 1.0,
            blur_px: 0.0,
            x_percent: 0.0,
            y_percent: 0.0,
            rotate_deg: 0.0,
            position_y_pct: 50.0,
        }
    }
}

impl VisualProps {
    /// Transform for an element of `size` whose transform origin is its center at `center`.
    pub fn to_affine(self, center: Point, size: Vec2) -> Affine {
        let offset = Vec2::new(
            size.x * self.x_percent / 100.0,
            size.y * self.y_percent / 100.0,
        );
        Affine::translate(center.to_vec2() + offset)
            * Affine::rotate(self.rotate_deg.to_radians())
            * Affine::scale(self.scale)
            * Affine::translate(-center.to_vec2())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
