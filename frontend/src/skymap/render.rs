// frontend/src/skymap/render.rs

use super::config::OverlayStyle;
use super::overlay::Feature;
use super::quadtree::{Point, QuadTree, distance};

/// Screen projection supplied by the map renderer.
pub trait Projection {
    /// Current map size in pixels.
    fn metrics(&self) -> (f64, f64);
    /// Whether a `[lon, lat]` point is on the visible hemisphere/viewport.
    fn clip(&self, lonlat: [f64; 2]) -> bool;
    fn project(&self, lonlat: [f64; 2]) -> Option<Point>;
}

/// Plain lon/lat -> x/y mapping, used when no real renderer is attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equirectangular {
    pub width: f64,
    pub height: f64,
}

impl Projection for Equirectangular {
    fn metrics(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn clip(&self, [lon, lat]: [f64; 2]) -> bool {
        (-180.0..=180.0).contains(&lon) && (-90.0..=90.0).contains(&lat)
    }

    fn project(&self, [lon, lat]: [f64; 2]) -> Option<Point> {
        if !self.clip([lon, lat]) {
            return None;
        }
        let x = (lon + 180.0) / 360.0 * self.width;
        let y = (90.0 - lat) / 180.0 * self.height;
        Some((x, y))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Circle {
        x: f64,
        y: f64,
        r: f64,
        stroke: String,
        fill: String,
    },
    Label {
        x: f64,
        y: f64,
        text: String,
        fill: String,
        font: String,
    },
}

pub fn radius(dim: i64, style: &OverlayStyle) -> f64 {
    (dim as f64 * style.radius_scale).powf(style.radius_exponent)
}

/// One frame: a circle per visible feature, plus a label unless an earlier
/// label of this frame sits within `proximity_limit`. Features are visited in
/// order, so earlier features win.
pub fn redraw(features: &[Feature], proj: &dyn Projection, style: &OverlayStyle) -> Vec<DrawOp> {
    let (w, h) = proj.metrics();
    let mut placed = QuadTree::for_viewport(w, h);
    let mut ops = Vec::with_capacity(features.len() * 2);

    for f in features {
        let Some(lonlat) = f.point() else { continue };
        if !proj.clip(lonlat) {
            continue;
        }
        let Some(pt) = proj.project(lonlat) else { continue };
        let Some(dim) = f.dim_int() else {
            tracing::debug!("[SKY] {} has no usable size, skipped", f.properties.name);
            continue;
        };
        let r = radius(dim, style);
        if !r.is_finite() {
            continue;
        }

        ops.push(DrawOp::Circle {
            x: pt.0,
            y: pt.1,
            r,
            stroke: style.point_stroke.clone(),
            fill: style.point_fill.clone(),
        });

        let crowded = placed
            .find(pt)
            .is_some_and(|near| distance(near, pt) <= style.proximity_limit);
        if !crowded {
            placed.add(pt);
            ops.push(DrawOp::Label {
                x: pt.0 + r + style.label_offset,
                y: pt.1 + r + style.label_offset,
                text: f.properties.name.clone(),
                fill: style.text_fill.clone(),
                font: style.text_font.clone(),
            });
        }
    }

    tracing::trace!("[SKY] redraw produced {} ops", ops.len());
    ops
}
