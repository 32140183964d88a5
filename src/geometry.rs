//! Geometry engine: axis-aligned bounding boxes for every shape kind.
//!
//! Pure functions of their input. Total: malformed or empty geometry yields
//! `None` instead of panicking, and callers treat `None` as "nothing to act
//! on".

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use crate::consts::TEXT_DEFAULT_WIDTH;
use crate::doc::{BoardObject, Point, Shape};

/// Axis-aligned bounding box in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Bounding box of a board object, or `None` when the shape has no usable
/// extent (e.g. a pen stroke with fewer than two points).
#[must_use]
pub fn bounding_box(object: &BoardObject) -> Option<Bounds> {
    shape_bounds(&object.shape)
}

/// Bounding box of a bare shape. See [`bounding_box`].
#[must_use]
pub fn shape_bounds(shape: &Shape) -> Option<Bounds> {
    match shape {
        Shape::Pen { points, .. } | Shape::Arrow { points, .. } => point_list_bounds(points),
        Shape::Rectangle { x, y, width, height, .. } => {
            // Normalize a drag-to-create in any direction: the box always
            // spans min↔max corners with non-negative extents.
            let (left, w) = normalize_extent(*x, *width);
            let (top, h) = normalize_extent(*y, *height);
            Some(Bounds { x: left, y: top, width: w, height: h })
        }
        Shape::Circle { x, y, radius, .. } => {
            let r = radius.abs();
            Some(Bounds { x: x - r, y: y - r, width: 2.0 * r, height: 2.0 * r })
        }
        Shape::Text { x, y, font_size, width, height, .. } => Some(Bounds {
            x: *x,
            y: *y,
            width: width.unwrap_or(TEXT_DEFAULT_WIDTH),
            // No real text measurement on the client; one line of glyphs at
            // the font size is the declared approximation.
            height: height.unwrap_or(*font_size),
        }),
    }
}

fn normalize_extent(origin: f64, extent: f64) -> (f64, f64) {
    if extent < 0.0 {
        (origin + extent, -extent)
    } else {
        (origin, extent)
    }
}

fn point_list_bounds(points: &[Point]) -> Option<Bounds> {
    if points.len() < 2 {
        return None;
    }
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(Bounds { x: min_x, y: min_y, width: max_x - min_x, height: max_y - min_y })
}
