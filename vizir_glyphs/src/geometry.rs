// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer geometries delivered to hit tests, and the exact tests glyphs run on candidates.

extern crate alloc;

use alloc::vec::Vec;

use kurbo::{Point, Rect};

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;

/// An axis of the plot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// The horizontal axis.
    X,
    /// The vertical axis.
    Y,
}

/// A pointer geometry in canvas pixels.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// A single point (tap, hover).
    Point(Point),
    /// An infinite line across the plot: `Span { dim: X, at }` is the vertical line `x = at`.
    Span {
        /// The axis the position is measured along.
        dim: Dimension,
        /// The position in pixels.
        at: f64,
    },
    /// An axis-aligned rectangle (box select).
    Rect(Rect),
    /// A closed polygon (lasso, polygon select).
    Poly(Vec<Point>),
}

impl Geometry {
    /// The region a candidate record must intersect, in canvas pixels.
    ///
    /// Spans are unbounded along the other axis.
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Self::Point(p) => Some(Rect::from_points(*p, *p)),
            Self::Span { dim: Dimension::X, at } => {
                Some(Rect::new(*at, f64::NEG_INFINITY, *at, f64::INFINITY))
            }
            Self::Span { dim: Dimension::Y, at } => {
                Some(Rect::new(f64::NEG_INFINITY, *at, f64::INFINITY, *at))
            }
            Self::Rect(r) => Some(r.abs()),
            Self::Poly(points) => {
                let first = points.first()?;
                Some(
                    points
                        .iter()
                        .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p)),
                )
            }
        }
    }
}

/// Returns `true` if `p` lies inside `poly` (even-odd rule).
pub fn point_in_poly(p: Point, poly: &[Point]) -> bool {
    let mut inside = false;
    let n = poly.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (poly[i], poly[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Squared distance from `p` to the segment `a..b`.
pub fn dist_to_segment_squared(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len2 = ab.hypot2();
    if len2 == 0.0 {
        return (p - a).hypot2();
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).hypot2()
}

/// Distance from `p` to the segment `a..b`.
pub fn dist_to_segment(p: Point, a: Point, b: Point) -> f64 {
    dist_to_segment_squared(p, a, b).sqrt()
}

/// Returns `true` if the segment `a..b` touches the vertical or horizontal line of a span.
pub(crate) fn segment_crosses_span(a: Point, b: Point, dim: Dimension, at: f64) -> bool {
    let (lo, hi) = match dim {
        Dimension::X => (a.x.min(b.x), a.x.max(b.x)),
        Dimension::Y => (a.y.min(b.y), a.y.max(b.y)),
    };
    lo <= at && at <= hi
}

/// Returns `true` if the segments `a0..a1` and `b0..b1` intersect.
pub(crate) fn segments_intersect(a0: Point, a1: Point, b0: Point, b1: Point) -> bool {
    fn orient(p: Point, q: Point, r: Point) -> f64 {
        (q - p).cross(r - p)
    }
    fn on_segment(p: Point, q: Point, r: Point) -> bool {
        r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
    }
    let d1 = orient(b0, b1, a0);
    let d2 = orient(b0, b1, a1);
    let d3 = orient(a0, a1, b0);
    let d4 = orient(a0, a1, b1);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    (d1 == 0.0 && on_segment(b0, b1, a0))
        || (d2 == 0.0 && on_segment(b0, b1, a1))
        || (d3 == 0.0 && on_segment(a0, a1, b0))
        || (d4 == 0.0 && on_segment(a0, a1, b1))
}

/// Returns `true` if the segment `a..b` touches the rectangle.
pub(crate) fn segment_hits_rect(a: Point, b: Point, r: Rect) -> bool {
    if r.contains(a) || r.contains(b) {
        return true;
    }
    let corners = [
        Point::new(r.x0, r.y0),
        Point::new(r.x1, r.y0),
        Point::new(r.x1, r.y1),
        Point::new(r.x0, r.y1),
    ];
    (0..4).any(|i| segments_intersect(a, b, corners[i], corners[(i + 1) % 4]))
}

/// Angle of canvas point `p` around `c`, in `0..2π`, counter-clockwise as seen on screen.
pub(crate) fn angle_of(c: Point, p: Point) -> f64 {
    (c.y - p.y)
        .atan2(p.x - c.x)
        .rem_euclid(2.0 * core::f64::consts::PI)
}

/// Returns `true` if `angle` lies on the arc swept from `start` to `end`.
///
/// The arc runs towards increasing angles, or decreasing ones when `reversed`.
pub(crate) fn angle_between(angle: f64, start: f64, end: f64, reversed: bool) -> bool {
    let tau = 2.0 * core::f64::consts::PI;
    if (end - start).abs() >= tau {
        return true;
    }
    let (from, to) = if reversed { (end, start) } else { (start, end) };
    let sweep = (to - from).rem_euclid(tau);
    (angle - from).rem_euclid(tau) <= sweep
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;

    #[test]
    fn polygon_containment() {
        let square = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert!(point_in_poly(Point::new(5.0, 5.0), &square));
        assert!(!point_in_poly(Point::new(15.0, 5.0), &square));
        assert!(!point_in_poly(Point::new(5.0, 5.0), &square[..2]));
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(dist_to_segment(Point::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(dist_to_segment(Point::new(13.0, 4.0), a, b), 5.0);
        assert_eq!(dist_to_segment(Point::new(1.0, 1.0), a, a), 2.0_f64.sqrt());
    }

    #[test]
    fn segments_and_rects() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(segment_hits_rect(Point::new(-5.0, 5.0), Point::new(15.0, 5.0), r));
        assert!(!segment_hits_rect(Point::new(-5.0, -5.0), Point::new(-1.0, 20.0), r));
    }

    #[test]
    fn angles_are_counter_clockwise_on_screen() {
        let c = Point::new(10.0, 10.0);
        assert_eq!(angle_of(c, Point::new(20.0, 10.0)), 0.0);
        let up = angle_of(c, Point::new(10.0, 0.0));
        assert!((up - core::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn arcs_wrap_around_zero() {
        let pi = core::f64::consts::PI;
        assert!(angle_between(0.1, 1.5 * pi, 0.5 * pi, false));
        assert!(!angle_between(pi, 1.5 * pi, 0.5 * pi, false));
        assert!(angle_between(pi, 1.5 * pi, 0.5 * pi, true));
    }
}
