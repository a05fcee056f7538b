use std::sync::Arc;

use crate::{
    foundation::{
        color::Color,
        core::{Affine, BezPath, Point, Rect},
    },
    render::text::ShapedText,
};

/// Radial falloff stops as `(offset in 0..1, alpha multiplier)`, center first.
pub type GlowStops = Vec<(f64, f64)>;

/// One primitive in CSS-pixel space.
#[derive(Clone, Debug)]
pub enum DrawOp {
    /// Solid disc.
    Circle {
        center: Point,
        radius: f64,
        color: Color,
    },
    /// Radial gradient disc (soft halo).
    Glow {
        center: Point,
        radius: f64,
        color: Color,
        stops: GlowStops,
    },
    FillRect {
        rect: Rect,
        color: Color,
    },
    FillPath {
        path: BezPath,
        color: Color,
    },
    /// Stroked path; `width` is in device-independent pixels after `transform`.
    StrokePath {
        path: BezPath,
        width: f64,
        color: Color,
    },
    /// Shaped text whose layout box starts at `origin`.
    Text {
        origin: Point,
        text: Arc<ShapedText>,
        color: Color,
    },
}

#[derive(Clone, Debug)]
pub struct DisplayItem {
    pub z: i32,
    pub transform: Affine,
    pub op: DrawOp,
}

/// Draw ops collected from every mounted layer for one frame.
#[derive(Clone, Debug, Default)]
pub struct DisplayList {
    items: Vec<DisplayItem>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, z: i32, op: DrawOp) {
        self.push_transformed(z, Affine::IDENTITY, op);
    }

    pub fn push_transformed(&mut self, z: i32, transform: Affine, op: DrawOp) {
        self.items.push(DisplayItem { z, transform, op });
    }

    pub fn extend(&mut self, other: DisplayList) {
        self.items.extend(other.items);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Items in paint order: ascending `z`, insertion order within a layer.
    pub fn in_paint_order(&self) -> Vec<&DisplayItem> {
        let mut out: Vec<&DisplayItem> = self.items.iter().collect();
        out.sort_by_key(|item| item.z);
        out
    }
}
