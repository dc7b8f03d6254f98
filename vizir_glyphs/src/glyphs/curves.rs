// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Open curves between two end points: straight segments, quadratic and cubic Béziers.

extern crate alloc;

use alloc::vec::Vec;

use kurbo::{BezPath, CubicBez, ParamCurveExtrema, Point, QuadBez, Rect, Shape};
use smallvec::SmallVec;
use vizir_core::{DataSource, Selection, Shared, Uniform};

use crate::context::Context2d;
use crate::geometry::{
    Dimension, Geometry, dist_to_segment, point_in_poly, segment_crosses_span, segment_hits_rect,
};
use crate::mapper::CoordinateMapper;
use crate::props::{Spatial, SpecError};
use crate::spatial::{SpatialIndex, SpatialIndexBuilder};
use crate::visuals::Visuals;

use super::{GlyphImpl, candidates, inherit_or, line_legend, map_coord, resolve_spatial};

type Points<'a> = SmallVec<[(&'a Spatial, &'a Spatial); 4]>;

/// Curves given by a fixed number of control points per record.
trait Curve {
    /// Screen array names per control point, `(x, y)`.
    const NAMES: &'static [(&'static str, &'static str)];

    fn points(&self) -> Points<'_>;

    /// Path through the screen-space control points, in [`Self::NAMES`] order.
    fn path(points: &[Point]) -> BezPath;

    /// Data-space bounding box, in [`Self::NAMES`] order.
    fn bbox(points: &[Point]) -> Rect {
        Self::path(points).bounding_box()
    }

    fn hit(
        &self,
        data: &CurveData,
        index: &SpatialIndex,
        mapper: &CoordinateMapper,
        visuals: &Visuals,
        geometry: &Geometry,
    ) -> Option<Selection> {
        let _ = (data, index, mapper, visuals, geometry);
        None
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct CurveData {
    xs: Vec<Uniform<f64>>,
    ys: Vec<Uniform<f64>>,
    sxs: Vec<Shared<f64>>,
    sys: Vec<Shared<f64>>,
}

impl CurveData {
    fn len(&self) -> usize {
        self.xs.first().map_or(0, Uniform::len)
    }

    fn raw(&self, i: usize) -> SmallVec<[Point; 4]> {
        self.xs
            .iter()
            .zip(&self.ys)
            .map(|(x, y)| Point::new(*x.get(i), *y.get(i)))
            .collect()
    }

    fn screen_points(&self, i: usize) -> Option<SmallVec<[Point; 4]>> {
        let points: SmallVec<[Point; 4]> = self
            .sxs
            .iter()
            .zip(&self.sys)
            .map(|(x, y)| Point::new(x[i], y[i]))
            .collect();
        points.iter().all(|p| p.is_finite()).then_some(points)
    }
}

fn curve_set_data<G: Curve>(
    glyph: &G,
    source: &dyn DataSource,
    base: Option<(&G, &CurveData)>,
) -> Result<CurveData, SpecError> {
    let points = glyph.points();
    let base_points = base.map(|(g, d)| (g.points(), d));
    let mut data = CurveData::default();
    for (k, ((x, y), &(xname, yname))) in points.iter().zip(G::NAMES).enumerate() {
        let b = base_points.as_ref().map(|(p, d)| (p[k], d));
        // Drop the leading `s` of the screen name to get the property name.
        data.xs
            .push(resolve_spatial(x, &xname[1..], source, b.map(|(p, d)| (p.0, &d.xs[k])))?);
        data.ys
            .push(resolve_spatial(y, &yname[1..], source, b.map(|(p, d)| (p.1, &d.ys[k])))?);
    }
    Ok(data)
}

fn curve_index<G: Curve>(data: &CurveData) -> SpatialIndex {
    let n = data.len();
    let mut index = SpatialIndexBuilder::new(n);
    for i in 0..n {
        let points = data.raw(i);
        if points.iter().all(|p| p.is_finite()) {
            let b = G::bbox(&points);
            index.add_rect(b.x0, b.y0, b.x1, b.y1);
        } else {
            index.add_empty();
        }
    }
    index.finish()
}

fn curve_map<G: Curve>(
    glyph: &G,
    data: &mut CurveData,
    mapper: &CoordinateMapper,
    base: Option<(&G, &CurveData)>,
) {
    let points = glyph.points();
    let base_points = base.map(|(g, d)| (g.points(), d));
    data.sxs.clear();
    data.sys.clear();
    for (k, (x, y)) in points.iter().enumerate() {
        let b = base_points.as_ref().map(|(p, d)| (p[k], d));
        let sx = inherit_or(*x, b.map(|(p, d)| (p.0, &d.sxs[k])), || {
            map_coord(mapper, Dimension::X, x, &data.xs[k])
        });
        let sy = inherit_or(*y, b.map(|(p, d)| (p.1, &d.sys[k])), || {
            map_coord(mapper, Dimension::Y, y, &data.ys[k])
        });
        data.sxs.push(sx);
        data.sys.push(sy);
    }
}

fn curve_paint<G: Curve>(
    ctx: &mut dyn Context2d,
    data: &CurveData,
    visuals: &Visuals,
    indices: &[usize],
) {
    for &i in indices {
        let Some(points) = data.screen_points(i) else {
            continue;
        };
        ctx.set_record(i);
        visuals.paint_line(ctx, &G::path(&points), i);
    }
}

fn curve_screen<'a, G: Curve>(data: &'a CurveData, field: &str) -> Option<&'a Shared<f64>> {
    G::NAMES.iter().enumerate().find_map(|(k, (x, y))| {
        if *x == field {
            data.sxs.get(k)
        } else if *y == field {
            data.sys.get(k)
        } else {
            None
        }
    })
}

fn curve_screen_mut<'a, G: Curve>(
    data: &'a mut CurveData,
    field: &str,
) -> Option<&'a mut Shared<f64>> {
    let (k, is_x) = G::NAMES.iter().enumerate().find_map(|(k, (x, y))| {
        if *x == field {
            Some((k, true))
        } else if *y == field {
            Some((k, false))
        } else {
            None
        }
    })?;
    if is_x {
        data.sxs.get_mut(k)
    } else {
        data.sys.get_mut(k)
    }
}

macro_rules! curve_glyph {
    ($ty:ty) => {
        impl GlyphImpl for $ty {
            type Data = CurveData;

            fn len(data: &CurveData) -> usize {
                data.len()
            }

            fn set_data(
                &self,
                source: &dyn DataSource,
                base: Option<(&Self, &CurveData)>,
            ) -> Result<CurveData, SpecError> {
                curve_set_data(self, source, base)
            }

            fn index_data(&self, data: &CurveData) -> SpatialIndex {
                curve_index::<Self>(data)
            }

            fn map_data(
                &self,
                data: &mut CurveData,
                mapper: &CoordinateMapper,
                base: Option<(&Self, &CurveData)>,
            ) {
                curve_map(self, data, mapper, base);
            }

            fn paint(
                &self,
                ctx: &mut dyn Context2d,
                data: &CurveData,
                visuals: &Visuals,
                indices: &[usize],
            ) {
                curve_paint::<Self>(ctx, data, visuals, indices);
            }

            fn hit_test(
                &self,
                data: &CurveData,
                index: &SpatialIndex,
                mapper: &CoordinateMapper,
                visuals: &Visuals,
                geometry: &Geometry,
            ) -> Option<Selection> {
                Curve::hit(self, data, index, mapper, visuals, geometry)
            }

            fn screen<'a>(data: &'a CurveData, field: &str) -> Option<&'a Shared<f64>> {
                curve_screen::<Self>(data, field)
            }

            fn screen_mut<'a>(data: &'a mut CurveData, field: &str) -> Option<&'a mut Shared<f64>> {
                curve_screen_mut::<Self>(data, field)
            }

            fn legend(&self, ctx: &mut dyn Context2d, visuals: &Visuals, rect: Rect, i: usize) {
                line_legend(ctx, visuals, rect, i);
            }
        }
    };
}

/// Straight segments from `(x0, y0)` to `(x1, y1)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    /// Start x.
    pub x0: Spatial,
    /// Start y.
    pub y0: Spatial,
    /// End x.
    pub x1: Spatial,
    /// End y.
    pub y1: Spatial,
}

impl Segment {
    /// Creates a segment glyph.
    pub fn new(
        x0: impl Into<Spatial>,
        y0: impl Into<Spatial>,
        x1: impl Into<Spatial>,
        y1: impl Into<Spatial>,
    ) -> Self {
        Self {
            x0: x0.into(),
            y0: y0.into(),
            x1: x1.into(),
            y1: y1.into(),
        }
    }
}

impl Curve for Segment {
    const NAMES: &'static [(&'static str, &'static str)] = &[("sx0", "sy0"), ("sx1", "sy1")];

    fn points(&self) -> Points<'_> {
        SmallVec::from_slice(&[(&self.x0, &self.y0), (&self.x1, &self.y1)])
    }

    fn path(points: &[Point]) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(points[0]);
        path.line_to(points[1]);
        path
    }

    fn hit(
        &self,
        data: &CurveData,
        index: &SpatialIndex,
        mapper: &CoordinateMapper,
        visuals: &Visuals,
        geometry: &Geometry,
    ) -> Option<Selection> {
        // Thin strokes still get a couple of pixels of slack.
        let near = |i: usize| (visuals.line.width(i) / 2.0).max(2.0);
        let pad = match geometry {
            Geometry::Point(_) => (0..data.len()).map(near).fold(2.0, f64::max),
            _ => 0.0,
        };
        let units = (self.x0.units, self.y0.units);
        let found = candidates(index, mapper, units, geometry.bounds()?, (pad, pad));
        let hits = found.into_iter().filter(|&i| {
            let Some(p) = data.screen_points(i) else {
                return false;
            };
            let (a, b) = (p[0], p[1]);
            match geometry {
                Geometry::Point(q) => dist_to_segment(*q, a, b) <= near(i),
                Geometry::Span { dim, at } => segment_crosses_span(a, b, *dim, *at),
                Geometry::Rect(r) => segment_hits_rect(a, b, r.abs()),
                Geometry::Poly(poly) => point_in_poly(a, poly) && point_in_poly(b, poly),
            }
        });
        Some(Selection::from_indices(hits))
    }
}

curve_glyph!(Segment);

/// Quadratic Bézier curves from `(x0, y0)` to `(x1, y1)` with control point `(cx, cy)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Quadratic {
    /// Start x.
    pub x0: Spatial,
    /// Start y.
    pub y0: Spatial,
    /// End x.
    pub x1: Spatial,
    /// End y.
    pub y1: Spatial,
    /// Control point x.
    pub cx: Spatial,
    /// Control point y.
    pub cy: Spatial,
}

impl Quadratic {
    /// Creates a quadratic curve glyph.
    pub fn new(
        (x0, y0): (impl Into<Spatial>, impl Into<Spatial>),
        (x1, y1): (impl Into<Spatial>, impl Into<Spatial>),
        (cx, cy): (impl Into<Spatial>, impl Into<Spatial>),
    ) -> Self {
        Self {
            x0: x0.into(),
            y0: y0.into(),
            x1: x1.into(),
            y1: y1.into(),
            cx: cx.into(),
            cy: cy.into(),
        }
    }
}

impl Curve for Quadratic {
    const NAMES: &'static [(&'static str, &'static str)] =
        &[("sx0", "sy0"), ("sx1", "sy1"), ("scx", "scy")];

    fn points(&self) -> Points<'_> {
        SmallVec::from_slice(&[
            (&self.x0, &self.y0),
            (&self.x1, &self.y1),
            (&self.cx, &self.cy),
        ])
    }

    fn path(points: &[Point]) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(points[0]);
        path.quad_to(points[2], points[1]);
        path
    }

    fn bbox(points: &[Point]) -> Rect {
        ParamCurveExtrema::bounding_box(&QuadBez::new(points[0], points[2], points[1]))
    }
}

curve_glyph!(Quadratic);

/// Cubic Bézier curves from `(x0, y0)` to `(x1, y1)` with control points `(cx0, cy0)` and
/// `(cx1, cy1)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Bezier {
    /// Start x.
    pub x0: Spatial,
    /// Start y.
    pub y0: Spatial,
    /// End x.
    pub x1: Spatial,
    /// End y.
    pub y1: Spatial,
    /// First control point x.
    pub cx0: Spatial,
    /// First control point y.
    pub cy0: Spatial,
    /// Second control point x.
    pub cx1: Spatial,
    /// Second control point y.
    pub cy1: Spatial,
}

impl Bezier {
    /// Creates a cubic curve glyph.
    pub fn new(
        (x0, y0): (impl Into<Spatial>, impl Into<Spatial>),
        (x1, y1): (impl Into<Spatial>, impl Into<Spatial>),
        (cx0, cy0): (impl Into<Spatial>, impl Into<Spatial>),
        (cx1, cy1): (impl Into<Spatial>, impl Into<Spatial>),
    ) -> Self {
        Self {
            x0: x0.into(),
            y0: y0.into(),
            x1: x1.into(),
            y1: y1.into(),
            cx0: cx0.into(),
            cy0: cy0.into(),
            cx1: cx1.into(),
            cy1: cy1.into(),
        }
    }
}

impl Curve for Bezier {
    const NAMES: &'static [(&'static str, &'static str)] = &[
        ("sx0", "sy0"),
        ("sx1", "sy1"),
        ("scx0", "scy0"),
        ("scx1", "scy1"),
    ];

    fn points(&self) -> Points<'_> {
        SmallVec::from_slice(&[
            (&self.x0, &self.y0),
            (&self.x1, &self.y1),
            (&self.cx0, &self.cy0),
            (&self.cx1, &self.cy1),
        ])
    }

    fn path(points: &[Point]) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(points[0]);
        path.curve_to(points[2], points[3], points[1]);
        path
    }

    fn bbox(points: &[Point]) -> Rect {
        ParamCurveExtrema::bounding_box(&CubicBez::new(points[0], points[2], points[3], points[1]))
    }
}

curve_glyph!(Bezier);

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use vizir_core::ColumnDataSource;

    use super::*;
    use crate::context::{DrawCall, RecordingContext};
    use crate::scale::ScaleLinear;
    use crate::visuals::{LineProps, VisualProps};

    fn mapper() -> CoordinateMapper {
        CoordinateMapper::new(
            ScaleLinear::new((0.0, 10.0), (0.0, 100.0)),
            ScaleLinear::new((0.0, 10.0), (100.0, 0.0)),
        )
    }

    #[test]
    fn segments_hit_within_half_the_stroke_width() {
        let glyph = Segment::new("x0", 2.0, "x1", 2.0);
        let src = ColumnDataSource::new()
            .with_column("x0", vec![1.0, 5.0])
            .unwrap()
            .with_column("x1", vec![4.0, f64::NAN])
            .unwrap();
        let mut data = glyph.set_data(&src, None).unwrap();
        glyph.map_data(&mut data, &mapper(), None);
        let index = glyph.index_data(&data);
        let visuals = VisualProps::default()
            .with_line(LineProps::default().with_width(10.0))
            .resolve(&src)
            .unwrap();
        let hit = |g: Geometry| {
            glyph
                .hit_test(&data, &index, &mapper(), &visuals, &g)
                .unwrap()
                .indices()
                .to_vec()
        };
        assert_eq!(hit(Geometry::Point(Point::new(20.0, 84.0))), [0]);
        assert!(hit(Geometry::Point(Point::new(20.0, 74.0))).is_empty());
        assert_eq!(hit(Geometry::Span { dim: Dimension::X, at: 35.0 }), [0]);
        assert!(hit(Geometry::Span { dim: Dimension::X, at: 50.0 }).is_empty());
    }

    #[test]
    fn curves_are_indexed_by_their_extent_and_paint_one_stroke() {
        let glyph = Quadratic::new((0.0, 0.0), (4.0, 0.0), (2.0, 4.0));
        let src = ColumnDataSource::new().with_column("v", vec![0.0]).unwrap();
        let mut data = glyph.set_data(&src, None).unwrap();
        glyph.map_data(&mut data, &mapper(), None);
        let bbox = glyph.index_data(&data).bbox().unwrap();
        // The curve peaks halfway towards its control point.
        assert!((bbox.y1 - 2.0).abs() < 1e-9);

        let visuals = VisualProps::default().resolve(&src).unwrap();
        let mut ctx = RecordingContext::new();
        glyph.paint(&mut ctx, &data, &visuals, &[0]);
        assert_eq!(ctx.calls.len(), 1);
        assert!(matches!(ctx.calls[0], DrawCall::Stroke { record: Some(0), .. }));
        assert!(
            glyph
                .hit_test(
                    &data,
                    &glyph.index_data(&data),
                    &mapper(),
                    &visuals,
                    &Geometry::Point(Point::new(20.0, 100.0)),
                )
                .is_none()
        );
        assert!(<Quadratic as GlyphImpl>::screen(&data, "scy").is_some());
    }
}
