use kurbo::Shape;

use crate::foundation::{
    core::{Affine, BezPath, Point, Vec2},
    error::AssetError,
};

/// Arc-length accuracy used for dash lengths.
const LENGTH_ACCURACY: f64 = 0.1;

/// One drawable path of a reveal illustration, in SVG user space.
#[derive(Clone, Debug)]
pub struct ArtPath {
    pub path: BezPath,
    /// Total arc length, the dash length used for the draw-in.
    pub length: f64,
}

/// A parsed illustration: its intrinsic size and every drawable path in document order.
#[derive(Clone, Debug)]
pub struct RevealArtwork {
    pub size: Vec2,
    pub paths: Vec<ArtPath>,
}

impl RevealArtwork {
    pub fn parse(markup: &str) -> Result<Self, AssetError> {
        let opts = usvg::Options::default();
        let tree = usvg::Tree::from_str(markup, &opts)
            .map_err(|e| AssetError::Parse(format!("parse svg tree: {e}")))?;

        let mut paths = Vec::new();
        collect_paths(tree.root(), &mut paths);
        let size = tree.size();
        Ok(Self {
            size: Vec2::new(f64::from(size.width()), f64::from(size.height())),
            paths,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Affine fitting the artwork into `target` size, centered, aspect preserved (`meet`).
    pub fn fit_into(&self, center: Point, target: Vec2) -> Affine {
        if self.size.x <= 0.0 || self.size.y <= 0.0 {
            return Affine::translate(center.to_vec2());
        }
        let s = (target.x / self.size.x).min(target.y / self.size.y);
        Affine::translate(center.to_vec2()) * Affine::scale(s) * Affine::translate(-self.size * 0.5)
    }
}

fn collect_paths(group: &usvg::Group, out: &mut Vec<ArtPath>) {
    for node in group.children() {
        match node {
            usvg::Node::Group(g) => collect_paths(g, out),
            usvg::Node::Path(p) => {
                let mut path = convert_path(p.data());
                path.apply_affine(transform_to_affine(p.abs_transform()));
                if path.elements().len() < 2 {
                    continue;
                }
                let length = path.perimeter(LENGTH_ACCURACY);
                out.push(ArtPath { path, length });
            }
            _ => {}
        }
    }
}

fn convert_path(data: &usvg::tiny_skia_path::Path) -> BezPath {
    use usvg::tiny_skia_path::PathSegment;

    let pt = |p: usvg::tiny_skia_path::Point| Point::new(f64::from(p.x), f64::from(p.y));
    let mut out = BezPath::new();
    for seg in data.segments() {
        match seg {
            PathSegment::MoveTo(p) => out.move_to(pt(p)),
            PathSegment::LineTo(p) => out.line_to(pt(p)),
            PathSegment::QuadTo(p1, p2) => out.quad_to(pt(p1), pt(p2)),
            PathSegment::CubicTo(p1, p2, p3) => out.curve_to(pt(p1), pt(p2), pt(p3)),
            PathSegment::Close => out.close_path(),
        }
    }
    out
}

fn transform_to_affine(t: usvg::Transform) -> Affine {
    Affine::new([
        f64::from(t.sx),
        f64::from(t.ky),
        f64::from(t.kx),
        f64::from(t.sy),
        f64::from(t.tx),
        f64::from(t.ty),
    ])
}

#[cfg(test)]
#[path = "../../tests/unit/assets/svg.rs"]
mod tests;
