// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Polyline and polygon glyphs.
//!
//! [`Line`] draws one polyline through all records. [`MultiLine`] and [`Patches`] read a
//! number list per record and draw one polyline or polygon each. Non-finite coordinates split
//! a path into separate runs.

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use kurbo::{BezPath, Point, Rect};
use vizir_core::{DataSource, Selection, Shared, Uniform};

use crate::context::Context2d;
use crate::geometry::{Dimension, Geometry, dist_to_segment, point_in_poly, segment_crosses_span};
use crate::mapper::{CoordinateMapper, Units};
use crate::props::{Spatial, SpecError, VectorSpec};
use crate::spatial::{SpatialIndex, SpatialIndexBuilder};
use crate::visuals::Visuals;

use super::{GlyphImpl, candidates, inherit_or, line_legend, map_coord, resolve, resolve_spatial};

/// Pixels of slack around thin strokes.
const MIN_SLACK: f64 = 2.0;

fn slack(visuals: &Visuals, i: usize) -> f64 {
    (visuals.line.width(i) / 2.0).max(MIN_SLACK)
}

/// Maximal runs of finite points.
fn runs(xs: &[f64], ys: &[f64]) -> Vec<Vec<Point>> {
    let mut out = Vec::new();
    let mut run = Vec::new();
    for (x, y) in xs.iter().zip(ys) {
        if x.is_finite() && y.is_finite() {
            run.push(Point::new(*x, *y));
        } else if !run.is_empty() {
            out.push(core::mem::take(&mut run));
        }
    }
    if !run.is_empty() {
        out.push(run);
    }
    out
}

fn runs_path(runs: &[Vec<Point>], closed: bool) -> BezPath {
    let mut path = BezPath::new();
    for run in runs {
        let Some((first, rest)) = run.split_first() else {
            continue;
        };
        path.move_to(*first);
        for p in rest {
            path.line_to(*p);
        }
        if closed {
            path.close_path();
        }
    }
    path
}

fn bbox_of(points: impl IntoIterator<Item = Point>) -> Option<Rect> {
    let mut points = points.into_iter();
    let first = points.next()?;
    Some(points.fold(Rect::from_points(first, first), |r, p| r.union_pt(p)))
}

fn segment_hit(a: Point, b: Point, geometry: &Geometry, slack: f64) -> bool {
    match geometry {
        Geometry::Point(p) => dist_to_segment(*p, a, b) <= slack,
        Geometry::Span { dim, at } => segment_crosses_span(a, b, *dim, *at),
        Geometry::Rect(_) | Geometry::Poly(_) => false,
    }
}

/// One polyline through `(x, y)` of every record, in record order.
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    /// Vertex x.
    pub x: Spatial,
    /// Vertex y.
    pub y: Spatial,
}

impl Line {
    /// Creates a line glyph.
    pub fn new(x: impl Into<Spatial>, y: impl Into<Spatial>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct LineData {
    x: Uniform<f64>,
    y: Uniform<f64>,
    sx: Shared<f64>,
    sy: Shared<f64>,
}

impl LineData {
    fn screen_point(&self, i: usize) -> Option<Point> {
        let p = Point::new(self.sx[i], self.sy[i]);
        p.is_finite().then_some(p)
    }
}

impl GlyphImpl for Line {
    type Data = LineData;

    fn len(data: &LineData) -> usize {
        data.x.len()
    }

    fn set_data(
        &self,
        source: &dyn DataSource,
        base: Option<(&Self, &LineData)>,
    ) -> Result<LineData, SpecError> {
        Ok(LineData {
            x: resolve_spatial(&self.x, "x", source, base.map(|(g, d)| (&g.x, &d.x)))?,
            y: resolve_spatial(&self.y, "y", source, base.map(|(g, d)| (&g.y, &d.y)))?,
            ..LineData::default()
        })
    }

    fn index_data(&self, data: &LineData) -> SpatialIndex {
        let mut index = SpatialIndexBuilder::new(data.x.len());
        for (x, y) in data.x.iter().zip(data.y.iter()) {
            index.add_point(*x, *y);
        }
        index.finish()
    }

    fn map_data(
        &self,
        data: &mut LineData,
        mapper: &CoordinateMapper,
        base: Option<(&Self, &LineData)>,
    ) {
        data.sx = inherit_or(&self.x, base.map(|(g, d)| (&g.x, &d.sx)), || {
            map_coord(mapper, Dimension::X, &self.x, &data.x)
        });
        data.sy = inherit_or(&self.y, base.map(|(g, d)| (&g.y, &d.sy)), || {
            map_coord(mapper, Dimension::Y, &self.y, &data.y)
        });
    }

    /// Draws the requested records as one stroke. A gap in `indices` or a non-finite vertex
    /// starts a new run.
    fn paint(&self, ctx: &mut dyn Context2d, data: &LineData, visuals: &Visuals, indices: &[usize]) {
        let Some(&first) = indices.first() else {
            return;
        };
        let mut path = BezPath::new();
        let mut prev: Option<usize> = None;
        for &i in indices {
            match data.screen_point(i) {
                Some(p) if prev.is_some_and(|j| j + 1 == i) => path.line_to(p),
                Some(p) => path.move_to(p),
                None => {
                    prev = None;
                    continue;
                }
            }
            prev = Some(i);
        }
        ctx.set_record(first);
        visuals.paint_line(ctx, &path, first);
    }

    fn hit_test(
        &self,
        data: &LineData,
        _index: &SpatialIndex,
        _mapper: &CoordinateMapper,
        visuals: &Visuals,
        geometry: &Geometry,
    ) -> Option<Selection> {
        if matches!(geometry, Geometry::Rect(_) | Geometry::Poly(_)) {
            return None;
        }
        let slack = slack(visuals, 0);
        let n = data.x.len();
        let hits = (0..n.saturating_sub(1)).filter(|&i| {
            match (data.screen_point(i), data.screen_point(i + 1)) {
                (Some(a), Some(b)) => segment_hit(a, b, geometry, slack),
                _ => false,
            }
        });
        Some(Selection::from_line_indices(hits))
    }

    fn screen<'a>(data: &'a LineData, field: &str) -> Option<&'a Shared<f64>> {
        match field {
            "sx" => Some(&data.sx),
            "sy" => Some(&data.sy),
            _ => None,
        }
    }

    fn screen_mut<'a>(data: &'a mut LineData, field: &str) -> Option<&'a mut Shared<f64>> {
        match field {
            "sx" => Some(&mut data.sx),
            "sy" => Some(&mut data.sy),
            _ => None,
        }
    }

    fn legend(&self, ctx: &mut dyn Context2d, visuals: &Visuals, rect: Rect, i: usize) {
        line_legend(ctx, visuals, rect, i);
    }
}

/// Per-record number lists mapped into canvas pixels.
#[derive(Clone, Debug, Default)]
pub(crate) struct ListData {
    xs: Uniform<Vec<f64>>,
    ys: Uniform<Vec<f64>>,
    sxs: Shared<Vec<f64>>,
    sys: Shared<Vec<f64>>,
}

impl ListData {
    fn runs(&self, i: usize) -> Vec<Vec<Point>> {
        runs(&self.sxs[i], &self.sys[i])
    }
}

fn list_set_data(
    (xs, ys): (&VectorSpec<Vec<f64>>, &VectorSpec<Vec<f64>>),
    source: &dyn DataSource,
    base: Option<((&VectorSpec<Vec<f64>>, &VectorSpec<Vec<f64>>), &ListData)>,
) -> Result<ListData, SpecError> {
    Ok(ListData {
        xs: resolve(xs, "xs", source, &Vec::new(), base.map(|((x, _), d)| (x, &d.xs)))?,
        ys: resolve(ys, "ys", source, &Vec::new(), base.map(|((_, y), d)| (y, &d.ys)))?,
        ..ListData::default()
    })
}

fn list_index(data: &ListData) -> SpatialIndex {
    let mut index = SpatialIndexBuilder::new(data.xs.len());
    for (xs, ys) in data.xs.iter().zip(data.ys.iter()) {
        let points = xs
            .iter()
            .zip(ys)
            .map(|(x, y)| Point::new(*x, *y))
            .filter(|p| p.is_finite());
        match bbox_of(points) {
            Some(b) => index.add_rect(b.x0, b.y0, b.x1, b.y1),
            None => index.add_empty(),
        }
    }
    index.finish()
}

fn list_map(
    (xs, ys): (&VectorSpec<Vec<f64>>, &VectorSpec<Vec<f64>>),
    data: &mut ListData,
    mapper: &CoordinateMapper,
    base: Option<((&VectorSpec<Vec<f64>>, &VectorSpec<Vec<f64>>), &ListData)>,
) {
    let x_scale = mapper.x_scale(Units::Data);
    let y_scale = mapper.y_scale(Units::Data);
    data.sxs = inherit_or(xs, base.map(|((x, _), d)| (x, &d.sxs)), || {
        data.xs.iter().map(|v| x_scale.v_compute(v)).collect()
    });
    data.sys = inherit_or(ys, base.map(|((_, y), d)| (y, &d.sys)), || {
        data.ys.iter().map(|v| y_scale.v_compute(v)).collect()
    });
}

/// Candidate records for a query, padded by the widest stroke slack.
fn list_candidates(
    data: &ListData,
    index: &SpatialIndex,
    mapper: &CoordinateMapper,
    visuals: &Visuals,
    geometry: &Geometry,
) -> Option<Vec<usize>> {
    let pad = (0..data.xs.len())
        .map(|i| slack(visuals, i))
        .fold(MIN_SLACK, f64::max);
    let units = (Units::Data, Units::Data);
    Some(candidates(index, mapper, units, geometry.bounds()?, (pad, pad)))
}

/// One polyline per record through the points of the `xs` and `ys` lists.
#[derive(Clone, Debug, PartialEq)]
pub struct MultiLine {
    /// Vertex x lists.
    pub xs: VectorSpec<Vec<f64>>,
    /// Vertex y lists.
    pub ys: VectorSpec<Vec<f64>>,
}

impl MultiLine {
    /// Creates a multi-line glyph reading the `xs` and `ys` number-list columns.
    pub fn new(xs: &str, ys: &str) -> Self {
        Self {
            xs: VectorSpec::field(xs),
            ys: VectorSpec::field(ys),
        }
    }

    fn lists(&self) -> (&VectorSpec<Vec<f64>>, &VectorSpec<Vec<f64>>) {
        (&self.xs, &self.ys)
    }
}

impl GlyphImpl for MultiLine {
    type Data = ListData;

    fn len(data: &ListData) -> usize {
        data.xs.len()
    }

    fn set_data(
        &self,
        source: &dyn DataSource,
        base: Option<(&Self, &ListData)>,
    ) -> Result<ListData, SpecError> {
        list_set_data(self.lists(), source, base.map(|(g, d)| (g.lists(), d)))
    }

    fn index_data(&self, data: &ListData) -> SpatialIndex {
        list_index(data)
    }

    fn map_data(
        &self,
        data: &mut ListData,
        mapper: &CoordinateMapper,
        base: Option<(&Self, &ListData)>,
    ) {
        list_map(self.lists(), data, mapper, base.map(|(g, d)| (g.lists(), d)));
    }

    fn paint(&self, ctx: &mut dyn Context2d, data: &ListData, visuals: &Visuals, indices: &[usize]) {
        for &i in indices {
            let runs = data.runs(i);
            if runs.is_empty() {
                continue;
            }
            ctx.set_record(i);
            visuals.paint_line(ctx, &runs_path(&runs, false), i);
        }
    }

    fn hit_test(
        &self,
        data: &ListData,
        index: &SpatialIndex,
        mapper: &CoordinateMapper,
        visuals: &Visuals,
        geometry: &Geometry,
    ) -> Option<Selection> {
        if matches!(geometry, Geometry::Rect(_) | Geometry::Poly(_)) {
            return None;
        }
        let mut hits = BTreeMap::new();
        for i in list_candidates(data, index, mapper, visuals, geometry)? {
            let (xs, ys) = (&data.sxs[i], &data.sys[i]);
            let slack = slack(visuals, i);
            let segments: Vec<usize> = (0..xs.len().min(ys.len()).saturating_sub(1))
                .filter(|&j| {
                    let a = Point::new(xs[j], ys[j]);
                    let b = Point::new(xs[j + 1], ys[j + 1]);
                    a.is_finite() && b.is_finite() && segment_hit(a, b, geometry, slack)
                })
                .collect();
            if !segments.is_empty() {
                hits.insert(i, segments);
            }
        }
        Some(Selection::from_multiline_indices(hits))
    }

    fn legend(&self, ctx: &mut dyn Context2d, visuals: &Visuals, rect: Rect, i: usize) {
        line_legend(ctx, visuals, rect, i);
    }
}

/// One filled polygon per record. Non-finite entries in the lists separate the rings of a
/// record; rings combine under the even-odd rule, so inner rings become holes.
#[derive(Clone, Debug, PartialEq)]
pub struct Patches {
    /// Vertex x lists.
    pub xs: VectorSpec<Vec<f64>>,
    /// Vertex y lists.
    pub ys: VectorSpec<Vec<f64>>,
}

impl Patches {
    /// Creates a patches glyph reading the `xs` and `ys` number-list columns.
    pub fn new(xs: &str, ys: &str) -> Self {
        Self {
            xs: VectorSpec::field(xs),
            ys: VectorSpec::field(ys),
        }
    }

    fn lists(&self) -> (&VectorSpec<Vec<f64>>, &VectorSpec<Vec<f64>>) {
        (&self.xs, &self.ys)
    }
}

impl GlyphImpl for Patches {
    type Data = ListData;

    fn len(data: &ListData) -> usize {
        data.xs.len()
    }

    fn set_data(
        &self,
        source: &dyn DataSource,
        base: Option<(&Self, &ListData)>,
    ) -> Result<ListData, SpecError> {
        list_set_data(self.lists(), source, base.map(|(g, d)| (g.lists(), d)))
    }

    fn index_data(&self, data: &ListData) -> SpatialIndex {
        list_index(data)
    }

    fn map_data(
        &self,
        data: &mut ListData,
        mapper: &CoordinateMapper,
        base: Option<(&Self, &ListData)>,
    ) {
        list_map(self.lists(), data, mapper, base.map(|(g, d)| (g.lists(), d)));
    }

    fn paint(&self, ctx: &mut dyn Context2d, data: &ListData, visuals: &Visuals, indices: &[usize]) {
        for &i in indices {
            let runs = data.runs(i);
            if runs.is_empty() {
                continue;
            }
            ctx.set_record(i);
            visuals.paint_area(ctx, &runs_path(&runs, true), i);
        }
    }

    fn hit_test(
        &self,
        data: &ListData,
        index: &SpatialIndex,
        mapper: &CoordinateMapper,
        visuals: &Visuals,
        geometry: &Geometry,
    ) -> Option<Selection> {
        let found = list_candidates(data, index, mapper, visuals, geometry)?;
        let hits = found.into_iter().filter(|&i| {
            let rings = data.runs(i);
            match geometry {
                Geometry::Point(p) => {
                    rings.iter().filter(|ring| point_in_poly(*p, ring)).count() % 2 == 1
                }
                Geometry::Span { dim, at } => bbox_of(rings.iter().flatten().copied())
                    .is_some_and(|b| match dim {
                        Dimension::X => b.x0 <= *at && *at <= b.x1,
                        Dimension::Y => b.y0 <= *at && *at <= b.y1,
                    }),
                Geometry::Rect(r) => {
                    let r = r.abs();
                    !rings.is_empty() && rings.iter().flatten().all(|p| r.contains(*p))
                }
                Geometry::Poly(poly) => {
                    !rings.is_empty() && rings.iter().flatten().all(|p| point_in_poly(*p, poly))
                }
            }
        });
        Some(Selection::from_indices(hits))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use vizir_core::ColumnDataSource;

    use super::*;
    use crate::context::{DrawCall, RecordingContext};
    use crate::scale::ScaleLinear;
    use crate::visuals::VisualProps;

    fn mapper() -> CoordinateMapper {
        CoordinateMapper::new(
            ScaleLinear::new((0.0, 10.0), (0.0, 100.0)),
            ScaleLinear::new((0.0, 10.0), (100.0, 0.0)),
        )
    }

    fn subpaths(call: &DrawCall) -> usize {
        let DrawCall::Stroke { path, .. } = call else {
            panic!("expected a stroke");
        };
        path.elements()
            .iter()
            .filter(|el| matches!(el, kurbo::PathEl::MoveTo(_)))
            .count()
    }

    #[test]
    fn lines_break_at_gaps_and_missing_values() {
        let glyph = Line::new("x", "y");
        let src = ColumnDataSource::new()
            .with_column("x", vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0])
            .unwrap()
            .with_column("y", vec![0.0, 1.0, f64::NAN, 3.0, 4.0, 5.0])
            .unwrap();
        let mut data = glyph.set_data(&src, None).unwrap();
        glyph.map_data(&mut data, &mapper(), None);
        let visuals = VisualProps::default().resolve(&src).unwrap();

        let mut ctx = RecordingContext::new();
        glyph.paint(&mut ctx, &data, &visuals, &[0, 1, 2, 3, 4, 5]);
        assert_eq!(ctx.calls.len(), 1);
        assert_eq!(subpaths(&ctx.calls[0]), 2);

        ctx.clear();
        glyph.paint(&mut ctx, &data, &visuals, &[0, 1, 4, 5]);
        assert_eq!(subpaths(&ctx.calls[0]), 2);
    }

    #[test]
    fn line_hits_report_segment_starts() {
        let glyph = Line::new("x", "y");
        let src = ColumnDataSource::new()
            .with_column("x", vec![0.0, 2.0, 4.0, 6.0])
            .unwrap()
            .with_column("y", vec![0.0, 0.0, 0.0, f64::NAN])
            .unwrap();
        let mut data = glyph.set_data(&src, None).unwrap();
        glyph.map_data(&mut data, &mapper(), None);
        let index = glyph.index_data(&data);
        let visuals = VisualProps::default().resolve(&src).unwrap();
        let query = |g: Geometry| glyph.hit_test(&data, &index, &mapper(), &visuals, &g);

        let hit = query(Geometry::Point(Point::new(30.0, 101.0))).unwrap();
        assert_eq!(hit.line_indices(), [1]);
        let span = query(Geometry::Span {
            dim: Dimension::X,
            at: 20.0,
        })
        .unwrap();
        assert_eq!(span.line_indices(), [0, 1]);
        assert!(query(Geometry::Rect(Rect::new(0.0, 0.0, 10.0, 10.0))).is_none());
    }

    #[test]
    fn multi_line_hits_group_segments_by_record() {
        let glyph = MultiLine::new("xs", "ys");
        let src = ColumnDataSource::new()
            .with_column("xs", vec![vec![0.0, 5.0, 10.0], vec![0.0, 10.0]])
            .unwrap()
            .with_column("ys", vec![vec![1.0, 1.0, 1.0], vec![8.0, 8.0]])
            .unwrap();
        let mut data = glyph.set_data(&src, None).unwrap();
        glyph.map_data(&mut data, &mapper(), None);
        let index = glyph.index_data(&data);
        let visuals = VisualProps::default().resolve(&src).unwrap();
        let hit = glyph
            .hit_test(
                &data,
                &index,
                &mapper(),
                &visuals,
                &Geometry::Point(Point::new(70.0, 91.0)),
            )
            .unwrap();
        assert_eq!(hit.indices(), [0]);
        assert_eq!(hit.multiline_indices().get(&0), Some(&vec![1]));
    }

    #[test]
    fn patches_treat_inner_rings_as_holes() {
        let glyph = Patches::new("xs", "ys");
        let nan = f64::NAN;
        let src = ColumnDataSource::new()
            .with_column(
                "xs",
                vec![vec![0.0, 10.0, 10.0, 0.0, nan, 4.0, 6.0, 6.0, 4.0]],
            )
            .unwrap()
            .with_column(
                "ys",
                vec![vec![0.0, 0.0, 10.0, 10.0, nan, 4.0, 4.0, 6.0, 6.0]],
            )
            .unwrap();
        let mut data = glyph.set_data(&src, None).unwrap();
        glyph.map_data(&mut data, &mapper(), None);
        let index = glyph.index_data(&data);
        let visuals = VisualProps::default().resolve(&src).unwrap();
        let hit = |x: f64, y: f64| {
            glyph
                .hit_test(&data, &index, &mapper(), &visuals, &Geometry::Point(Point::new(x, y)))
                .unwrap()
                .contains(0)
        };
        assert!(hit(20.0, 80.0));
        assert!(!hit(50.0, 50.0));

        let mut ctx = RecordingContext::new();
        glyph.paint(&mut ctx, &data, &visuals, &[0]);
        let DrawCall::Fill { path, .. } = &ctx.calls[0] else {
            panic!("expected a fill");
        };
        let closes = path
            .elements()
            .iter()
            .filter(|el| matches!(el, kurbo::PathEl::ClosePath))
            .count();
        assert_eq!(closes, 2);
    }
}
