use kurbo::{PathEl, Shape};

use crate::{
    foundation::{
        color::Color,
        core::{Affine, BezPath, Point, Rgba8Premul},
        error::{StageError, StageResult},
    },
    render::display::{DisplayList, DrawOp},
};

/// Rings used to approximate a radial gradient with stacked discs.
const GLOW_RINGS: usize = 10;
const CURVE_TOLERANCE: f64 = 0.1;

/// A rendered frame as RGBA8 pixels (premultiplied alpha).
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
}

impl FrameRGBA {
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.data.iter().all(|&b| b == 0)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.data.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Straight-alpha copy, for PNG encoders.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            if a == 0 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }
}

/// CPU rasterizer for [`DisplayList`]s, powered by `vello_cpu`.
///
/// The target pixmap is kept between frames and reallocated only when the size changes.
#[derive(Default)]
pub struct CpuRenderer {
    pixmap: Option<vello_cpu::Pixmap>,
}

impl std::fmt::Debug for CpuRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuRenderer")
            .field("has_pixmap", &self.pixmap.is_some())
            .finish()
    }
}

impl CpuRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn take_pixmap(&mut self, width: u16, height: u16) -> vello_cpu::Pixmap {
        match self.pixmap.take() {
            Some(mut p) if p.width() == width && p.height() == height => {
                clear_pixmap(&mut p);
                p
            }
            _ => vello_cpu::Pixmap::new(width, height),
        }
    }

    /// Rasterize `list` into a `width x height` frame. Ops are in CSS pixels and get scaled by
    /// `pixel_scale` (the effective device pixel ratio).
    #[tracing::instrument(skip(self, list), fields(items = list.len()))]
    pub fn render(
        &mut self,
        list: &DisplayList,
        width: u32,
        height: u32,
        pixel_scale: f64,
        clear: Option<Rgba8Premul>,
    ) -> StageResult<FrameRGBA> {
        let w: u16 = width
            .try_into()
            .map_err(|_| StageError::render("frame width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| StageError::render("frame height exceeds u16"))?;
        if w == 0 || h == 0 {
            return Ok(FrameRGBA::transparent(width, height));
        }

        let base = Affine::scale(pixel_scale);
        let mut pixmap = self.take_pixmap(w, h);
        let mut ctx = vello_cpu::RenderContext::new(w, h);
        for item in list.in_paint_order() {
            let xf = base * item.transform;
            match &item.op {
                DrawOp::Circle {
                    center,
                    radius,
                    color,
                } => {
                    fill_disc(&mut ctx, xf, *center, *radius, *color);
                }
                DrawOp::Glow {
                    center,
                    radius,
                    color,
                    stops,
                } => {
                    for (r, c) in glow_rings(*radius, *color, stops) {
                        fill_disc(&mut ctx, xf, *center, r, c);
                    }
                }
                DrawOp::FillRect { rect, color } => {
                    ctx.set_transform(affine_to_cpu(xf));
                    ctx.set_paint(color_to_cpu(*color));
                    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                        rect.x0, rect.y0, rect.x1, rect.y1,
                    ));
                }
                DrawOp::FillPath { path, color } => {
                    ctx.set_transform(affine_to_cpu(xf));
                    ctx.set_paint(color_to_cpu(*color));
                    ctx.fill_path(&bezpath_to_cpu(path));
                }
                DrawOp::StrokePath { path, width, color } => {
                    // Non-scaling stroke: geometry goes through the transform, the pen does not.
                    let mut device_path = path.clone();
                    device_path.apply_affine(xf);
                    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
                    ctx.set_stroke(
                        vello_cpu::kurbo::Stroke::new(width * pixel_scale)
                            .with_caps(vello_cpu::kurbo::Cap::Round),
                    );
                    ctx.set_paint(color_to_cpu(*color));
                    ctx.stroke_path(&bezpath_to_cpu(&device_path));
                }
                DrawOp::Text {
                    origin,
                    text,
                    color,
                } => {
                    if color.a <= 0.0 {
                        continue;
                    }
                    ctx.set_transform(affine_to_cpu(xf * Affine::translate(origin.to_vec2())));
                    ctx.set_paint(color_to_cpu(*color));
                    for run in &text.runs {
                        ctx.glyph_run(&run.font)
                            .font_size(run.font_size)
                            .fill_glyphs(run.glyphs.iter().map(|g| vello_cpu::Glyph {
                                id: g.id,
                                x: g.x,
                                y: g.y,
                            }));
                    }
                }
            }
        }
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);

        let mut data = pixmap.data_as_u8_slice().to_vec();
        self.pixmap = Some(pixmap);
        if let Some(bg) = clear {
            under_in_place(&mut data, bg.to_array());
        }
        Ok(FrameRGBA {
            width,
            height,
            data,
        })
    }
}

fn fill_disc(
    ctx: &mut vello_cpu::RenderContext,
    xf: Affine,
    center: Point,
    radius: f64,
    color: Color,
) {
    if radius <= 0.0 || color.a <= 0.0 {
        return;
    }
    let path = kurbo::Circle::new(center, radius).to_path(CURVE_TOLERANCE);
    ctx.set_transform(affine_to_cpu(xf));
    ctx.set_paint(color_to_cpu(color));
    ctx.fill_path(&bezpath_to_cpu(&path));
}

/// Alpha of a radial falloff at normalized distance `x`.
pub(crate) fn stop_alpha(stops: &[(f64, f64)], x: f64) -> f64 {
    let Some(first) = stops.first() else {
        return 0.0;
    };
    if x <= first.0 {
        return first.1;
    }
    for w in stops.windows(2) {
        let (a, b) = (w[0], w[1]);
        if x <= b.0 {
            let span = (b.0 - a.0).max(1e-9);
            return a.1 + (b.1 - a.1) * ((x - a.0) / span);
        }
    }
    stops.last().map(|s| s.1).unwrap_or(0.0)
}

/// Discs (outermost first) whose stacked "over" compositing approximates the gradient.
pub(crate) fn glow_rings(radius: f64, color: Color, stops: &[(f64, f64)]) -> Vec<(f64, Color)> {
    let mut out = Vec::with_capacity(GLOW_RINGS);
    let mut covered = 0.0_f64;
    for k in 0..GLOW_RINGS {
        let outer = 1.0 - k as f64 / GLOW_RINGS as f64;
        let inner = 1.0 - (k + 1) as f64 / GLOW_RINGS as f64;
        let target = (stop_alpha(stops, (outer + inner) * 0.5) * color.a).clamp(0.0, 1.0);
        if target <= covered || covered >= 1.0 {
            continue;
        }
        let a = 1.0 - (1.0 - target) / (1.0 - covered);
        covered = target;
        out.push((radius * outer, color.with_alpha(a)));
    }
    out
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap) {
    pixmap.data_as_u8_slice_mut().fill(0);
}

/// Composite `bg` underneath premultiplied `data`.
fn under_in_place(data: &mut [u8], bg: [u8; 4]) {
    for px in data.chunks_exact_mut(4) {
        let inv = 255 - u16::from(px[3]);
        for c in 0..4 {
            let add = (u16::from(bg[c]) * inv + 127) / 255;
            px[c] = (u16::from(px[c]) + add).min(255) as u8;
        }
    }
}

fn color_to_cpu(c: Color) -> vello_cpu::peniko::Color {
    let [r, g, b, a] = c.to_straight_rgba8();
    vello_cpu::peniko::Color::from_rgba8(r, g, b, a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
