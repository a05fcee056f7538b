use crate::{foundation::core::Viewport, render::cpu::FrameRGBA};

/// Backing surface of one canvas-style layer.
///
/// Holds the client (CSS) size, the clamped device pixel ratio and the last presented frame.
#[derive(Clone, Debug)]
pub struct CanvasSurface {
    css_width: f64,
    css_height: f64,
    pixel_ratio: f64,
    frame: FrameRGBA,
}

impl Default for CanvasSurface {
    fn default() -> Self {
        Self {
            css_width: 0.0,
            css_height: 0.0,
            pixel_ratio: 1.0,
            frame: FrameRGBA::transparent(0, 0),
        }
    }
}

/// `clamp(dpr, 1, max_dpr)`; non-finite ratios count as `1`.
pub fn effective_dpr(dpr: f64, max_dpr: f64) -> f64 {
    let dpr = if dpr.is_finite() { dpr } else { 1.0 };
    let max = if max_dpr.is_finite() { max_dpr.max(1.0) } else { 1.0 };
    dpr.clamp(1.0, max)
}

/// Backing pixel count for one axis: `round(client * clamp(dpr, 1, max_dpr))`.
pub fn backing_pixels(client: f64, dpr: f64, max_dpr: f64) -> u32 {
    let px = (client.max(0.0) * effective_dpr(dpr, max_dpr)).round();
    if px >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        px as u32
    }
}

impl CanvasSurface {
    pub fn new(viewport: Viewport, max_dpr: f64) -> Self {
        let mut s = Self::default();
        s.resize(viewport, max_dpr);
        s
    }

    /// Recompute the backing resolution. The frame is reallocated (and thus cleared) only when
    /// the pixel size actually changes.
    pub fn resize(&mut self, viewport: Viewport, max_dpr: f64) {
        self.css_width = viewport.width.max(0.0);
        self.css_height = viewport.height.max(0.0);
        self.pixel_ratio = effective_dpr(viewport.device_pixel_ratio, max_dpr);
        let w = backing_pixels(viewport.width, viewport.device_pixel_ratio, max_dpr);
        let h = backing_pixels(viewport.height, viewport.device_pixel_ratio, max_dpr);
        if w != self.frame.width || h != self.frame.height {
            tracing::debug!(w, h, dpr = self.pixel_ratio, "canvas surface resized");
            self.frame = FrameRGBA::transparent(w, h);
        }
    }

    pub fn css_size(&self) -> (f64, f64) {
        (self.css_width, self.css_height)
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        (self.frame.width, self.frame.height)
    }

    pub fn frame(&self) -> &FrameRGBA {
        &self.frame
    }

    /// Replace the surface contents. Frames of another size are rejected.
    pub fn present(&mut self, frame: FrameRGBA) -> bool {
        if frame.width != self.frame.width || frame.height != self.frame.height {
            tracing::warn!(
                got_w = frame.width,
                got_h = frame.height,
                want_w = self.frame.width,
                want_h = self.frame.height,
                "dropping frame with stale size"
            );
            return false;
        }
        self.frame = frame;
        true
    }

    pub fn clear(&mut self) {
        self.frame.data.fill(0);
    }

    pub fn is_clear(&self) -> bool {
        self.frame.is_transparent()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
