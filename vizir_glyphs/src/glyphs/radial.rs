// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Radial glyphs: wedges, annular wedges and annuli.
//!
//! Angles are in radians, measured counter-clockwise on screen from the positive x axis.

extern crate alloc;

use kurbo::{BezPath, Circle, Point, Shape};
use vizir_core::{DataSource, Selection, Shared, Uniform};

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;

use crate::context::Context2d;
use crate::geometry::{Dimension, Geometry, angle_between, angle_of};
use crate::mapper::{Anchor, CoordinateMapper, Units};
use crate::props::{Spatial, SpecError, VectorSpec};
use crate::spatial::{SpatialIndex, SpatialIndexBuilder};
use crate::visuals::Visuals;

use super::markers::{resolve_distance, screen_lengths};
use super::{
    GlyphImpl, candidates, inherit_or, map_coord, max_finite, resolve, resolve_spatial,
};

const TAU: f64 = core::f64::consts::TAU;

/// The direction an arc is swept in, from its start angle to its end angle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Counter-clockwise.
    #[default]
    Anticlock,
    /// Clockwise.
    Clock,
}

struct RadialProps<'a> {
    x: &'a Spatial,
    y: &'a Spatial,
    inner: Option<&'a Spatial>,
    outer: &'a Spatial,
    start: Option<&'a VectorSpec<f64>>,
    end: Option<&'a VectorSpec<f64>>,
}

trait Radial {
    const OUTER: &'static str;

    fn props(&self) -> RadialProps<'_>;
}

#[derive(Clone, Debug, Default)]
pub(crate) struct RadialData {
    x: Uniform<f64>,
    y: Uniform<f64>,
    inner: Uniform<f64>,
    outer: Uniform<f64>,
    start: Uniform<f64>,
    end: Uniform<f64>,
    sx: Shared<f64>,
    sy: Shared<f64>,
    sinner: Shared<f64>,
    souter: Shared<f64>,
}

impl RadialData {
    /// Center, inner radius, outer radius, start and end angle of record `i`.
    fn ring(&self, i: usize) -> Option<(Point, f64, f64, f64, f64)> {
        let v = [
            self.sx[i],
            self.sy[i],
            self.sinner[i],
            self.souter[i],
            *self.start.get(i),
            *self.end.get(i),
        ];
        v.iter()
            .all(|v| v.is_finite())
            .then(|| (Point::new(v[0], v[1]), v[2], v[3], v[4], v[5]))
    }
}

fn radial_set_data<G: Radial>(
    glyph: &G,
    source: &dyn DataSource,
    base: Option<(&G, &RadialData)>,
) -> Result<RadialData, SpecError> {
    let p = glyph.props();
    let b = base.map(|(g, d)| (g.props(), d));
    let n = source.len();
    let inner = match p.inner {
        Some(inner) => resolve_distance(
            inner,
            "inner_radius",
            source,
            b.as_ref()
                .and_then(|(g, d)| g.inner.map(|s| (s, &d.inner))),
        )?,
        None => Uniform::scalar(0.0, n),
    };
    let angle = |spec: Option<&VectorSpec<f64>>,
                 property: &'static str,
                 base: Option<(&VectorSpec<f64>, &Uniform<f64>)>|
     -> Result<Uniform<f64>, SpecError> {
        match spec {
            Some(spec) => resolve(spec, property, source, &0.0, base),
            None => Ok(Uniform::scalar(0.0, n)),
        }
    };
    Ok(RadialData {
        x: resolve_spatial(p.x, "x", source, b.as_ref().map(|(g, d)| (g.x, &d.x)))?,
        y: resolve_spatial(p.y, "y", source, b.as_ref().map(|(g, d)| (g.y, &d.y)))?,
        inner,
        outer: resolve_distance(
            p.outer,
            G::OUTER,
            source,
            b.as_ref().map(|(g, d)| (g.outer, &d.outer)),
        )?,
        start: angle(
            p.start,
            "start_angle",
            b.as_ref().and_then(|(g, d)| g.start.map(|s| (s, &d.start))),
        )?,
        end: angle(
            p.end,
            "end_angle",
            b.as_ref().and_then(|(g, d)| g.end.map(|s| (s, &d.end))),
        )?,
        ..RadialData::default()
    })
}

fn radial_index(data: &RadialData) -> SpatialIndex {
    let mut index = SpatialIndexBuilder::new(data.x.len());
    for (x, y) in data.x.iter().zip(data.y.iter()) {
        index.add_point(*x, *y);
    }
    index.finish()
}

fn radial_map<G: Radial>(
    glyph: &G,
    data: &mut RadialData,
    mapper: &CoordinateMapper,
    base: Option<(&G, &RadialData)>,
) {
    let p = glyph.props();
    let b = base.map(|(g, d)| (g.props(), d));
    data.sx = inherit_or(p.x, b.as_ref().map(|(g, d)| (g.x, &d.sx)), || {
        map_coord(mapper, Dimension::X, p.x, &data.x)
    });
    data.sy = inherit_or(p.y, b.as_ref().map(|(g, d)| (g.y, &d.sy)), || {
        map_coord(mapper, Dimension::Y, p.y, &data.y)
    });
    data.souter = inherit_or(
        (p.x, p.outer),
        b.as_ref().map(|(g, d)| ((g.x, g.outer), &d.souter)),
        || screen_lengths(mapper, Dimension::X, &data.x, p.outer, &data.outer, Anchor::Edge),
    );
    data.sinner = match p.inner {
        Some(inner) => inherit_or(
            (p.x, Some(inner)),
            b.as_ref().map(|(g, d)| ((g.x, g.inner), &d.sinner)),
            || screen_lengths(mapper, Dimension::X, &data.x, inner, &data.inner, Anchor::Edge),
        ),
        None => Shared::owned(alloc::vec![0.0; data.x.len()]),
    };
}

/// Outline of a ring slice swept from `start` to `end` in `direction`.
fn slice_path(
    center: Point,
    inner: f64,
    outer: f64,
    start: f64,
    end: f64,
    direction: Direction,
) -> BezPath {
    let full = (end - start).abs() >= TAU;
    // Screen angles grow clockwise in kurbo, the opposite of ours.
    let sweep = match direction {
        Direction::Anticlock if full => -TAU,
        Direction::Clock if full => TAU,
        Direction::Anticlock => -(end - start).rem_euclid(TAU),
        Direction::Clock => (start - end).rem_euclid(TAU),
    };
    Circle::new(center, outer)
        .segment(inner, -start, sweep)
        .to_path(0.1)
}

fn radial_hit(
    data: &RadialData,
    index: &SpatialIndex,
    mapper: &CoordinateMapper,
    units: (Units, Units),
    geometry: &Geometry,
    direction: Option<Direction>,
) -> Option<Selection> {
    let Geometry::Point(p) = geometry else {
        return None;
    };
    let pad = max_finite(&data.souter);
    let found = candidates(index, mapper, units, geometry.bounds()?, (pad, pad));
    let hits = found.into_iter().filter(|&i| {
        let Some((c, inner, outer, start, end)) = data.ring(i) else {
            return false;
        };
        let d = (*p - c).hypot();
        if d < inner || d > outer {
            return false;
        }
        match direction {
            Some(direction) => {
                angle_between(angle_of(c, *p), start, end, direction == Direction::Clock)
            }
            None => true,
        }
    });
    Some(Selection::from_indices(hits))
}

fn radial_screen<'a>(data: &'a RadialData, field: &str) -> Option<&'a Shared<f64>> {
    match field {
        "sx" => Some(&data.sx),
        "sy" => Some(&data.sy),
        "sinner_radius" => Some(&data.sinner),
        "souter_radius" | "sradius" => Some(&data.souter),
        _ => None,
    }
}

fn radial_screen_mut<'a>(data: &'a mut RadialData, field: &str) -> Option<&'a mut Shared<f64>> {
    match field {
        "sx" => Some(&mut data.sx),
        "sy" => Some(&mut data.sy),
        "sinner_radius" => Some(&mut data.sinner),
        "souter_radius" | "sradius" => Some(&mut data.souter),
        _ => None,
    }
}

macro_rules! radial_glyph {
    ($ty:ty, |$glyph:ident, $data:ident, $i:ident| $path:expr, $direction:expr) => {
        impl GlyphImpl for $ty {
            type Data = RadialData;

            fn len(data: &RadialData) -> usize {
                data.x.len()
            }

            fn set_data(
                &self,
                source: &dyn DataSource,
                base: Option<(&Self, &RadialData)>,
            ) -> Result<RadialData, SpecError> {
                radial_set_data(self, source, base)
            }

            fn index_data(&self, data: &RadialData) -> SpatialIndex {
                radial_index(data)
            }

            fn map_data(
                &self,
                data: &mut RadialData,
                mapper: &CoordinateMapper,
                base: Option<(&Self, &RadialData)>,
            ) {
                radial_map(self, data, mapper, base);
            }

            fn paint(
                &self,
                ctx: &mut dyn Context2d,
                data: &RadialData,
                visuals: &Visuals,
                indices: &[usize],
            ) {
                let $glyph = self;
                for &$i in indices {
                    let Some($data) = data.ring($i) else {
                        continue;
                    };
                    let path: BezPath = $path;
                    ctx.set_record($i);
                    visuals.paint_area(ctx, &path, $i);
                }
            }

            fn hit_test(
                &self,
                data: &RadialData,
                index: &SpatialIndex,
                mapper: &CoordinateMapper,
                _visuals: &Visuals,
                geometry: &Geometry,
            ) -> Option<Selection> {
                let $glyph = self;
                let units = ($glyph.x.units, $glyph.y.units);
                radial_hit(data, index, mapper, units, geometry, $direction)
            }

            fn screen<'a>(data: &'a RadialData, field: &str) -> Option<&'a Shared<f64>> {
                radial_screen(data, field)
            }

            fn screen_mut<'a>(
                data: &'a mut RadialData,
                field: &str,
            ) -> Option<&'a mut Shared<f64>> {
                radial_screen_mut(data, field)
            }
        }
    };
}

/// Pie slices of `radius` around `(x, y)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Wedge {
    /// Center x.
    pub x: Spatial,
    /// Center y.
    pub y: Spatial,
    /// Radius, in data units unless stated otherwise.
    pub radius: Spatial,
    /// Start angle.
    pub start_angle: VectorSpec<f64>,
    /// End angle.
    pub end_angle: VectorSpec<f64>,
    /// Sweep direction.
    pub direction: Direction,
}

impl Wedge {
    /// Creates a wedge glyph.
    pub fn new(
        x: impl Into<Spatial>,
        y: impl Into<Spatial>,
        radius: impl Into<Spatial>,
        start_angle: impl Into<VectorSpec<f64>>,
        end_angle: impl Into<VectorSpec<f64>>,
    ) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            radius: radius.into(),
            start_angle: start_angle.into(),
            end_angle: end_angle.into(),
            direction: Direction::Anticlock,
        }
    }

    /// Sets the sweep direction.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }
}

impl Radial for Wedge {
    const OUTER: &'static str = "radius";

    fn props(&self) -> RadialProps<'_> {
        RadialProps {
            x: &self.x,
            y: &self.y,
            inner: None,
            outer: &self.radius,
            start: Some(&self.start_angle),
            end: Some(&self.end_angle),
        }
    }
}

radial_glyph!(
    Wedge,
    |glyph, ring, i| {
        let (c, _, outer, start, end) = ring;
        slice_path(c, 0.0, outer, start, end, glyph.direction)
    },
    Some(glyph.direction)
);

/// Ring slices between `inner_radius` and `outer_radius` around `(x, y)`.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnularWedge {
    /// Center x.
    pub x: Spatial,
    /// Center y.
    pub y: Spatial,
    /// Inner radius.
    pub inner_radius: Spatial,
    /// Outer radius.
    pub outer_radius: Spatial,
    /// Start angle.
    pub start_angle: VectorSpec<f64>,
    /// End angle.
    pub end_angle: VectorSpec<f64>,
    /// Sweep direction.
    pub direction: Direction,
}

impl AnnularWedge {
    /// Creates an annular wedge glyph.
    pub fn new(
        x: impl Into<Spatial>,
        y: impl Into<Spatial>,
        inner_radius: impl Into<Spatial>,
        outer_radius: impl Into<Spatial>,
        start_angle: impl Into<VectorSpec<f64>>,
        end_angle: impl Into<VectorSpec<f64>>,
    ) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            inner_radius: inner_radius.into(),
            outer_radius: outer_radius.into(),
            start_angle: start_angle.into(),
            end_angle: end_angle.into(),
            direction: Direction::Anticlock,
        }
    }

    /// Sets the sweep direction.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }
}

impl Radial for AnnularWedge {
    const OUTER: &'static str = "outer_radius";

    fn props(&self) -> RadialProps<'_> {
        RadialProps {
            x: &self.x,
            y: &self.y,
            inner: Some(&self.inner_radius),
            outer: &self.outer_radius,
            start: Some(&self.start_angle),
            end: Some(&self.end_angle),
        }
    }
}

radial_glyph!(
    AnnularWedge,
    |glyph, ring, i| {
        let (c, inner, outer, start, end) = ring;
        slice_path(c, inner, outer, start, end, glyph.direction)
    },
    Some(glyph.direction)
);

/// Rings between `inner_radius` and `outer_radius` around `(x, y)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Annulus {
    /// Center x.
    pub x: Spatial,
    /// Center y.
    pub y: Spatial,
    /// Inner radius.
    pub inner_radius: Spatial,
    /// Outer radius.
    pub outer_radius: Spatial,
}

impl Annulus {
    /// Creates an annulus glyph.
    pub fn new(
        x: impl Into<Spatial>,
        y: impl Into<Spatial>,
        inner_radius: impl Into<Spatial>,
        outer_radius: impl Into<Spatial>,
    ) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            inner_radius: inner_radius.into(),
            outer_radius: outer_radius.into(),
        }
    }
}

impl Radial for Annulus {
    const OUTER: &'static str = "outer_radius";

    fn props(&self) -> RadialProps<'_> {
        RadialProps {
            x: &self.x,
            y: &self.y,
            inner: Some(&self.inner_radius),
            outer: &self.outer_radius,
            start: None,
            end: None,
        }
    }
}

radial_glyph!(
    Annulus,
    |glyph, ring, i| {
        let _ = glyph;
        let (c, inner, outer, _, _) = ring;
        let mut path = Circle::new(c, outer).to_path(0.1);
        // The hole winds the other way so it stays empty under the nonzero rule.
        path.extend(Circle::new(c, inner).to_path(0.1).reverse_subpaths());
        path
    },
    None
);

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use vizir_core::ColumnDataSource;

    use super::*;
    use crate::context::RecordingContext;
    use crate::scale::ScaleLinear;
    use crate::visuals::VisualProps;

    const PI: f64 = core::f64::consts::PI;

    fn mapper() -> CoordinateMapper {
        CoordinateMapper::new(
            ScaleLinear::new((0.0, 10.0), (0.0, 100.0)),
            ScaleLinear::new((0.0, 10.0), (100.0, 0.0)),
        )
    }

    fn mapped<G: GlyphImpl>(glyph: &G, src: &ColumnDataSource) -> G::Data {
        let mut data = glyph.set_data(src, None).unwrap();
        glyph.map_data(&mut data, &mapper(), None);
        data
    }

    fn point(g: &impl GlyphImpl<Data = RadialData>, data: &RadialData, p: (f64, f64)) -> bool {
        let src = ColumnDataSource::new().with_column("v", vec![0.0]).unwrap();
        let visuals = VisualProps::default().resolve(&src).unwrap();
        let index = g.index_data(data);
        g.hit_test(data, &index, &mapper(), &visuals, &Geometry::Point(p.into()))
            .unwrap()
            .contains(0)
    }

    #[test]
    fn wedges_open_counter_clockwise_on_screen() {
        let src = ColumnDataSource::new().with_column("v", vec![0.0]).unwrap();
        let glyph = Wedge::new(5.0, 5.0, Spatial::screen(20.0), 0.0, PI / 2.0);
        let data = mapped(&glyph, &src);
        // Up and to the right of the center.
        assert!(point(&glyph, &data, (55.0, 45.0)));
        assert!(!point(&glyph, &data, (55.0, 55.0)));
        assert!(!point(&glyph, &data, (75.0, 45.0)));

        let clock = glyph.clone().with_direction(Direction::Clock);
        let data = mapped(&clock, &src);
        assert!(!point(&clock, &data, (55.0, 45.0)));
        assert!(point(&clock, &data, (55.0, 55.0)));
    }

    #[test]
    fn wedge_outline_covers_its_quadrant() {
        let src = ColumnDataSource::new().with_column("v", vec![0.0]).unwrap();
        let glyph = Wedge::new(5.0, 5.0, Spatial::screen(20.0), 0.0, PI / 2.0);
        let data = mapped(&glyph, &src);
        let visuals = VisualProps::default().resolve(&src).unwrap();
        let mut ctx = RecordingContext::new();
        glyph.paint(&mut ctx, &data, &visuals, &[0]);
        let crate::context::DrawCall::Fill { path, .. } = &ctx.calls[0] else {
            panic!("expected a fill");
        };
        let bbox = path.bounding_box();
        assert!((bbox.x0 - 50.0).abs() < 1e-6 && (bbox.x1 - 70.0).abs() < 1e-3);
        assert!((bbox.y0 - 30.0).abs() < 1e-3 && (bbox.y1 - 50.0).abs() < 1e-6);
    }

    #[test]
    fn annuli_hit_the_ring_only() {
        let src = ColumnDataSource::new().with_column("v", vec![0.0]).unwrap();
        let glyph = Annulus::new(5.0, 5.0, 1.0, 2.0);
        let data = mapped(&glyph, &src);
        assert!(!point(&glyph, &data, (50.0, 50.0)));
        assert!(point(&glyph, &data, (65.0, 50.0)));
        assert!(!point(&glyph, &data, (75.0, 50.0)));
        let span = Geometry::Span {
            dim: Dimension::X,
            at: 50.0,
        };
        let visuals = VisualProps::default().resolve(&src).unwrap();
        let index = glyph.index_data(&data);
        assert!(glyph.hit_test(&data, &index, &mapper(), &visuals, &span).is_none());
    }

    #[test]
    fn annular_wedges_need_both_radius_and_angle() {
        let src = ColumnDataSource::new().with_column("v", vec![0.0]).unwrap();
        let glyph = AnnularWedge::new(
            5.0,
            5.0,
            Spatial::screen(10.0),
            Spatial::screen(20.0),
            PI,
            1.5 * PI,
        );
        let data = mapped(&glyph, &src);
        // Down and to the left of the center.
        assert!(point(&glyph, &data, (40.0, 60.0)));
        assert!(!point(&glyph, &data, (47.0, 53.0)));
        assert!(!point(&glyph, &data, (60.0, 40.0)));
    }
}
