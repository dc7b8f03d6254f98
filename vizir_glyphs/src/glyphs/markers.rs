// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Point-like glyphs: circles and scatter markers.

extern crate alloc;

use alloc::vec::Vec;

use kurbo::{Affine, BezPath, Circle as KurboCircle, Point, Shape};
use vizir_core::{DataSource, Selection, Shared, Uniform};

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;

use crate::context::Context2d;
use crate::geometry::{Dimension, Geometry};
use crate::mapper::{Anchor, CoordinateMapper, Units, sdist};
use crate::props::{Spatial, SpecError, VectorSpec};
use crate::spatial::{SpatialIndex, SpatialIndexBuilder};
use crate::visuals::Visuals;
use crate::webgl::{GpuGeometry, GpuMarkers};

use super::{
    GlyphImpl, candidates, hit_discs, inherit_or, map_coord, max_finite, resolve,
    resolve_spatial,
};

const TOLERANCE: f64 = 0.1;

/// Which scale a data-space circle radius is measured along.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RadiusDimension {
    /// The x scale.
    #[default]
    X,
    /// The y scale.
    Y,
    /// The larger of the two.
    Max,
    /// The smaller of the two.
    Min,
}

/// Circles centered on `(x, y)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Circle {
    /// Center x.
    pub x: Spatial,
    /// Center y.
    pub y: Spatial,
    /// Radius, in data units unless stated otherwise.
    pub radius: Spatial,
    /// Scale used for data-space radii.
    pub radius_dimension: RadiusDimension,
}

impl Circle {
    /// Creates a circle glyph.
    pub fn new(x: impl Into<Spatial>, y: impl Into<Spatial>, radius: impl Into<Spatial>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            radius: radius.into(),
            radius_dimension: RadiusDimension::X,
        }
    }

    /// Sets the scale used for data-space radii.
    pub fn with_radius_dimension(mut self, dimension: RadiusDimension) -> Self {
        self.radius_dimension = dimension;
        self
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct CircleData {
    x: Uniform<f64>,
    y: Uniform<f64>,
    radius: Uniform<f64>,
    sx: Shared<f64>,
    sy: Shared<f64>,
    sradius: Shared<f64>,
}

/// Resolves a distance property, rejecting negative scalars.
pub(crate) fn resolve_distance(
    spec: &Spatial,
    property: &'static str,
    source: &dyn DataSource,
    base: Option<(&Spatial, &Uniform<f64>)>,
) -> Result<Uniform<f64>, SpecError> {
    if let Some(v) = spec.spec.value()
        && *v < 0.0
    {
        return Err(SpecError::InvalidValue {
            property,
            value: *v,
        });
    }
    resolve_spatial(spec, property, source, base)
}

/// Screen lengths of distances anchored at `pts`; screen-space distances pass through.
pub(crate) fn screen_lengths(
    mapper: &CoordinateMapper,
    dim: Dimension,
    pts: &Uniform<f64>,
    spec: &Spatial,
    spans: &Uniform<f64>,
    anchor: Anchor,
) -> Vec<f64> {
    match spec.units {
        Units::Data => {
            let scale = match dim {
                Dimension::X => mapper.x_scale(Units::Data),
                Dimension::Y => mapper.y_scale(Units::Data),
            };
            sdist(&scale, pts, spans, anchor, false)
        }
        Units::Screen | Units::Canvas => spans.iter().copied().collect(),
    }
}

impl GlyphImpl for Circle {
    type Data = CircleData;

    fn len(data: &CircleData) -> usize {
        data.x.len()
    }

    fn set_data(
        &self,
        source: &dyn DataSource,
        base: Option<(&Self, &CircleData)>,
    ) -> Result<CircleData, SpecError> {
        Ok(CircleData {
            x: resolve_spatial(&self.x, "x", source, base.map(|(g, d)| (&g.x, &d.x)))?,
            y: resolve_spatial(&self.y, "y", source, base.map(|(g, d)| (&g.y, &d.y)))?,
            radius: resolve_distance(
                &self.radius,
                "radius",
                source,
                base.map(|(g, d)| (&g.radius, &d.radius)),
            )?,
            ..CircleData::default()
        })
    }

    fn index_data(&self, data: &CircleData) -> SpatialIndex {
        let mut index = SpatialIndexBuilder::new(data.x.len());
        for (x, y) in data.x.iter().zip(data.y.iter()) {
            index.add_point(*x, *y);
        }
        index.finish()
    }

    fn map_data(
        &self,
        data: &mut CircleData,
        mapper: &CoordinateMapper,
        base: Option<(&Self, &CircleData)>,
    ) {
        data.sx = inherit_or(&self.x, base.map(|(g, d)| (&g.x, &d.sx)), || {
            map_coord(mapper, Dimension::X, &self.x, &data.x)
        });
        data.sy = inherit_or(&self.y, base.map(|(g, d)| (&g.y, &d.sy)), || {
            map_coord(mapper, Dimension::Y, &self.y, &data.y)
        });
        let key = (&self.x, &self.y, &self.radius, self.radius_dimension);
        let base_key = base.map(|(g, d)| {
            ((&g.x, &g.y, &g.radius, g.radius_dimension), &d.sradius)
        });
        data.sradius = inherit_or(key, base_key, || {
            let along = |dim: Dimension, pts: &Uniform<f64>| {
                screen_lengths(mapper, dim, pts, &self.radius, &data.radius, Anchor::Edge)
            };
            match self.radius_dimension {
                RadiusDimension::X => along(Dimension::X, &data.x),
                RadiusDimension::Y => along(Dimension::Y, &data.y),
                RadiusDimension::Max | RadiusDimension::Min => {
                    let rx = along(Dimension::X, &data.x);
                    let ry = along(Dimension::Y, &data.y);
                    let pick = if self.radius_dimension == RadiusDimension::Max {
                        f64::max
                    } else {
                        f64::min
                    };
                    rx.into_iter().zip(ry).map(|(a, b)| pick(a, b)).collect()
                }
            }
        });
    }

    fn paint(&self, ctx: &mut dyn Context2d, data: &CircleData, visuals: &Visuals, indices: &[usize]) {
        for &i in indices {
            let (sx, sy, r) = (data.sx[i], data.sy[i], data.sradius[i]);
            if !(sx.is_finite() && sy.is_finite() && r.is_finite()) {
                continue;
            }
            let path = KurboCircle::new((sx, sy), r).to_path(TOLERANCE);
            ctx.set_record(i);
            visuals.paint_area(ctx, &path, i);
        }
    }

    fn hit_test(
        &self,
        data: &CircleData,
        index: &SpatialIndex,
        mapper: &CoordinateMapper,
        _visuals: &Visuals,
        geometry: &Geometry,
    ) -> Option<Selection> {
        let pad = max_finite(&data.sradius);
        let units = (self.x.units, self.y.units);
        let found = candidates(index, mapper, units, geometry.bounds()?, (pad, pad));
        Some(hit_discs(&data.sx, &data.sy, |i| data.sradius[i], &found, geometry))
    }

    fn screen<'a>(data: &'a CircleData, field: &str) -> Option<&'a Shared<f64>> {
        match field {
            "sx" => Some(&data.sx),
            "sy" => Some(&data.sy),
            "sradius" => Some(&data.sradius),
            _ => None,
        }
    }

    fn screen_mut<'a>(data: &'a mut CircleData, field: &str) -> Option<&'a mut Shared<f64>> {
        match field {
            "sx" => Some(&mut data.sx),
            "sy" => Some(&mut data.sy),
            "sradius" => Some(&mut data.sradius),
            _ => None,
        }
    }

    fn gpu<'a>(&'a self, data: &'a CircleData) -> Option<GpuGeometry<'a>> {
        Some(GpuGeometry::Markers(GpuMarkers {
            marker: MarkerType::Circle,
            x: &data.x,
            y: &data.y,
            units: (self.x.units, self.y.units),
            size: &data.sradius,
            size_factor: 2.0,
            size_tracks_scale: self.radius.units == Units::Data,
            angle: None,
        }))
    }
}

/// Marker shapes for [`Scatter`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[allow(missing_docs, reason = "the variant names are the shapes")]
pub enum MarkerType {
    Asterisk,
    #[default]
    Circle,
    CircleCross,
    CircleX,
    Cross,
    Dash,
    Diamond,
    DiamondCross,
    Dot,
    Hex,
    InvertedTriangle,
    Plus,
    Square,
    SquareCross,
    SquarePin,
    SquareX,
    Star,
    Triangle,
    TrianglePin,
    X,
    Y,
}

impl MarkerType {
    /// All marker types.
    pub const ALL: [Self; 21] = [
        Self::Asterisk,
        Self::Circle,
        Self::CircleCross,
        Self::CircleX,
        Self::Cross,
        Self::Dash,
        Self::Diamond,
        Self::DiamondCross,
        Self::Dot,
        Self::Hex,
        Self::InvertedTriangle,
        Self::Plus,
        Self::Square,
        Self::SquareCross,
        Self::SquarePin,
        Self::SquareX,
        Self::Star,
        Self::Triangle,
        Self::TrianglePin,
        Self::X,
        Self::Y,
    ];

    /// Returns `true` for markers drawn with strokes only.
    pub fn is_line_only(self) -> bool {
        matches!(
            self,
            Self::Asterisk | Self::Cross | Self::Dash | Self::X | Self::Y
        )
    }
}

/// Outline of a marker: a closed area (filled, hatched and stroked) and extra strokes.
#[derive(Clone, Debug, Default)]
pub(crate) struct MarkerPath {
    pub(crate) area: Option<BezPath>,
    pub(crate) lines: BezPath,
}

fn polygon(points: &[(f64, f64)]) -> BezPath {
    let mut path = BezPath::new();
    for (k, p) in points.iter().enumerate() {
        if k == 0 {
            path.move_to(*p);
        } else {
            path.line_to(*p);
        }
    }
    path.close_path();
    path
}

/// Closed polygon whose edges bow towards the origin by `pinch` (0 gives straight edges).
fn pinned(points: &[(f64, f64)], pinch: f64) -> BezPath {
    let mut path = BezPath::new();
    let n = points.len();
    for k in 0..n {
        let a = Point::from(points[k]);
        let b = Point::from(points[(k + 1) % n]);
        if k == 0 {
            path.move_to(a);
        }
        let ctrl = a.midpoint(b).to_vec2() * (1.0 - pinch);
        path.quad_to(ctrl.to_point(), b);
    }
    path.close_path();
    path
}

fn segments(lines: &[((f64, f64), (f64, f64))]) -> BezPath {
    let mut path = BezPath::new();
    for (a, b) in lines {
        path.move_to(*a);
        path.line_to(*b);
    }
    path
}

/// Builds a marker of diameter `size` centered at `center`, rotated counter-clockwise by
/// `angle` radians.
pub(crate) fn marker_path(marker: MarkerType, center: Point, size: f64, angle: f64) -> MarkerPath {
    let r = size / 2.0;
    let d = r * core::f64::consts::FRAC_1_SQRT_2;
    let h = r * 3.0_f64.sqrt();
    let a = h / 3.0;
    let cross = [((0.0, -r), (0.0, r)), ((-r, 0.0), (r, 0.0))];
    let x_lines = [((-d, -d), (d, d)), ((-d, d), (d, -d))];
    let x_corner = [((-r, -r), (r, r)), ((-r, r), (r, -r))];
    let square = [(-r, -r), (r, -r), (r, r), (-r, r)];
    let diamond = [(0.0, -r), (r / 1.5, 0.0), (0.0, r), (-r / 1.5, 0.0)];
    let circle = || KurboCircle::new((0.0, 0.0), r).to_path(TOLERANCE);

    let (area, lines) = match marker {
        MarkerType::Asterisk => {
            let mut lines = segments(&cross);
            lines.extend(segments(&x_lines));
            (None, lines)
        }
        MarkerType::Circle => (Some(circle()), BezPath::new()),
        MarkerType::CircleCross => (Some(circle()), segments(&cross)),
        MarkerType::CircleX => (Some(circle()), segments(&x_lines)),
        MarkerType::Cross => (None, segments(&cross)),
        MarkerType::Dash => (None, segments(&cross[1..])),
        MarkerType::Diamond => (Some(polygon(&diamond)), BezPath::new()),
        MarkerType::DiamondCross => (
            Some(polygon(&diamond)),
            segments(&[((0.0, -r), (0.0, r)), ((-r / 1.5, 0.0), (r / 1.5, 0.0))]),
        ),
        MarkerType::Dot => (
            Some(KurboCircle::new((0.0, 0.0), r / 4.0).to_path(TOLERANCE)),
            BezPath::new(),
        ),
        MarkerType::Hex => {
            let (half, k) = (r / 2.0, h / 2.0);
            (
                Some(polygon(&[
                    (r, 0.0),
                    (half, -k),
                    (-half, -k),
                    (-r, 0.0),
                    (-half, k),
                    (half, k),
                ])),
                BezPath::new(),
            )
        }
        MarkerType::InvertedTriangle => (
            Some(polygon(&[(-r, -a), (r, -a), (0.0, h - a)])),
            BezPath::new(),
        ),
        MarkerType::Plus => {
            let t = 3.0 * r / 8.0;
            (
                Some(polygon(&[
                    (t, -r),
                    (t, -t),
                    (r, -t),
                    (r, t),
                    (t, t),
                    (t, r),
                    (-t, r),
                    (-t, t),
                    (-r, t),
                    (-r, -t),
                    (-t, -t),
                    (-t, -r),
                ])),
                BezPath::new(),
            )
        }
        MarkerType::Square => (Some(polygon(&square)), BezPath::new()),
        MarkerType::SquareCross => (Some(polygon(&square)), segments(&cross)),
        MarkerType::SquarePin => (Some(pinned(&square, 3.0 / 8.0)), BezPath::new()),
        MarkerType::SquareX => (Some(polygon(&square)), segments(&x_corner)),
        MarkerType::Star => {
            let inner = r * 0.381_966;
            let points: Vec<(f64, f64)> = (0..10)
                .map(|k| {
                    let radius = if k % 2 == 0 { r } else { inner };
                    let theta = core::f64::consts::PI / 5.0 * f64::from(k);
                    (radius * theta.sin(), -radius * theta.cos())
                })
                .collect();
            (Some(polygon(&points)), BezPath::new())
        }
        MarkerType::Triangle => (
            Some(polygon(&[(-r, a), (r, a), (0.0, a - h)])),
            BezPath::new(),
        ),
        MarkerType::TrianglePin => (
            Some(pinned(&[(-r, a), (r, a), (0.0, a - h)], 0.25)),
            BezPath::new(),
        ),
        MarkerType::X => (None, segments(&x_lines)),
        MarkerType::Y => {
            let k = r * 3.0_f64.sqrt() / 2.0;
            (
                None,
                segments(&[
                    ((0.0, 0.0), (0.0, r)),
                    ((0.0, 0.0), (-k, -r / 2.0)),
                    ((0.0, 0.0), (k, -r / 2.0)),
                ]),
            )
        }
    };

    let transform = Affine::translate(center.to_vec2()) * Affine::rotate(-angle);
    MarkerPath {
        area: area.map(|p| transform * p),
        lines: transform * lines,
    }
}

/// Markers of a fixed screen size centered on `(x, y)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Scatter {
    /// Center x.
    pub x: Spatial,
    /// Center y.
    pub y: Spatial,
    /// Marker diameter, in screen pixels unless stated otherwise.
    pub size: Spatial,
    /// Rotation in radians, counter-clockwise.
    pub angle: VectorSpec<f64>,
    /// Marker shape.
    pub marker: MarkerType,
}

impl Scatter {
    /// Creates a scatter glyph of circles 4 pixels wide.
    pub fn new(x: impl Into<Spatial>, y: impl Into<Spatial>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            size: Spatial::screen(4.0),
            angle: VectorSpec::Value(0.0),
            marker: MarkerType::Circle,
        }
    }

    /// Sets the marker diameter.
    pub fn with_size(mut self, size: impl Into<Spatial>) -> Self {
        self.size = size.into();
        self
    }

    /// Sets the rotation.
    pub fn with_angle(mut self, angle: impl Into<VectorSpec<f64>>) -> Self {
        self.angle = angle.into();
        self
    }

    /// Sets the marker shape.
    pub fn with_marker(mut self, marker: MarkerType) -> Self {
        self.marker = marker;
        self
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct ScatterData {
    x: Uniform<f64>,
    y: Uniform<f64>,
    size: Uniform<f64>,
    angle: Uniform<f64>,
    sx: Shared<f64>,
    sy: Shared<f64>,
    ssize: Shared<f64>,
}

impl GlyphImpl for Scatter {
    type Data = ScatterData;

    fn len(data: &ScatterData) -> usize {
        data.x.len()
    }

    fn set_data(
        &self,
        source: &dyn DataSource,
        base: Option<(&Self, &ScatterData)>,
    ) -> Result<ScatterData, SpecError> {
        Ok(ScatterData {
            x: resolve_spatial(&self.x, "x", source, base.map(|(g, d)| (&g.x, &d.x)))?,
            y: resolve_spatial(&self.y, "y", source, base.map(|(g, d)| (&g.y, &d.y)))?,
            size: resolve_distance(
                &self.size,
                "size",
                source,
                base.map(|(g, d)| (&g.size, &d.size)),
            )?,
            angle: resolve(
                &self.angle,
                "angle",
                source,
                &0.0,
                base.map(|(g, d)| (&g.angle, &d.angle)),
            )?,
            ..ScatterData::default()
        })
    }

    fn index_data(&self, data: &ScatterData) -> SpatialIndex {
        let mut index = SpatialIndexBuilder::new(data.x.len());
        for (x, y) in data.x.iter().zip(data.y.iter()) {
            index.add_point(*x, *y);
        }
        index.finish()
    }

    fn map_data(
        &self,
        data: &mut ScatterData,
        mapper: &CoordinateMapper,
        base: Option<(&Self, &ScatterData)>,
    ) {
        data.sx = inherit_or(&self.x, base.map(|(g, d)| (&g.x, &d.sx)), || {
            map_coord(mapper, Dimension::X, &self.x, &data.x)
        });
        data.sy = inherit_or(&self.y, base.map(|(g, d)| (&g.y, &d.sy)), || {
            map_coord(mapper, Dimension::Y, &self.y, &data.y)
        });
        data.ssize = inherit_or(
            (&self.x, &self.size),
            base.map(|(g, d)| ((&g.x, &g.size), &d.ssize)),
            || screen_lengths(mapper, Dimension::X, &data.x, &self.size, &data.size, Anchor::Center),
        );
    }

    fn paint(&self, ctx: &mut dyn Context2d, data: &ScatterData, visuals: &Visuals, indices: &[usize]) {
        for &i in indices {
            let (sx, sy, size, angle) = (data.sx[i], data.sy[i], data.ssize[i], *data.angle.get(i));
            if !(sx.is_finite() && sy.is_finite() && size.is_finite() && angle.is_finite()) {
                continue;
            }
            let shape = marker_path(self.marker, Point::new(sx, sy), size, angle);
            ctx.set_record(i);
            if self.marker == MarkerType::Dot {
                // Dots take the line color.
                if let (Some(area), Some(brush)) = (&shape.area, visuals.line.brush(i)) {
                    ctx.fill(area, &brush);
                }
                continue;
            }
            if let Some(area) = &shape.area {
                visuals.paint_area(ctx, area, i);
            }
            if !shape.lines.elements().is_empty() {
                visuals.paint_line(ctx, &shape.lines, i);
            }
        }
    }

    fn hit_test(
        &self,
        data: &ScatterData,
        index: &SpatialIndex,
        mapper: &CoordinateMapper,
        _visuals: &Visuals,
        geometry: &Geometry,
    ) -> Option<Selection> {
        let pad = max_finite(&data.ssize) / 2.0;
        let units = (self.x.units, self.y.units);
        let found = candidates(index, mapper, units, geometry.bounds()?, (pad, pad));
        Some(hit_discs(&data.sx, &data.sy, |i| data.ssize[i] / 2.0, &found, geometry))
    }

    fn screen<'a>(data: &'a ScatterData, field: &str) -> Option<&'a Shared<f64>> {
        match field {
            "sx" => Some(&data.sx),
            "sy" => Some(&data.sy),
            "ssize" => Some(&data.ssize),
            _ => None,
        }
    }

    fn screen_mut<'a>(data: &'a mut ScatterData, field: &str) -> Option<&'a mut Shared<f64>> {
        match field {
            "sx" => Some(&mut data.sx),
            "sy" => Some(&mut data.sy),
            "ssize" => Some(&mut data.ssize),
            _ => None,
        }
    }

    fn legend(&self, ctx: &mut dyn Context2d, visuals: &Visuals, rect: kurbo::Rect, i: usize) {
        let rect = rect.abs();
        let size = 0.4 * rect.width().min(rect.height());
        let shape = marker_path(self.marker, rect.center(), size, 0.0);
        ctx.set_record(i);
        if let Some(area) = &shape.area {
            visuals.paint_area(ctx, area, i);
        }
        if !shape.lines.elements().is_empty() {
            visuals.paint_line(ctx, &shape.lines, i);
        }
    }

    fn gpu<'a>(&'a self, data: &'a ScatterData) -> Option<GpuGeometry<'a>> {
        Some(GpuGeometry::Markers(GpuMarkers {
            marker: self.marker,
            x: &data.x,
            y: &data.y,
            units: (self.x.units, self.y.units),
            size: &data.ssize,
            size_factor: 1.0,
            size_tracks_scale: self.size.units == Units::Data,
            angle: Some(&data.angle),
        }))
    }
}
