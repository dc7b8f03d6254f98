// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Box-like glyphs.
//!
//! [`Quad`], [`VBar`], [`HBar`] and [`Block`] reduce to screen-space left/right/top/bottom edges
//! and share mapping, painting and hit testing. [`Rect`] is center-based and may be rotated.
//! All of them draw through the same rounded-box helper.

extern crate alloc;

use alloc::vec::Vec;

use kurbo::{Affine, BezPath, Rect as KurboRect, RoundedRect, RoundedRectRadii, Shape};
use vizir_core::{DataSource, Selection, Shared, Uniform};

use crate::context::Context2d;
use crate::geometry::{Dimension, Geometry};
use crate::mapper::{Anchor, CoordinateMapper, Units};
use crate::props::{Spatial, SpecError, VectorSpec};
use crate::spatial::{SpatialIndex, SpatialIndexBuilder};
use crate::visuals::Visuals;

use super::centered::{self, Centered, CenteredData, CenteredProps};
use super::markers::{resolve_distance, screen_lengths};
use super::{
    GlyphImpl, candidates, finite_box, hit_boxes, map_coord, max_finite, resolve_spatial,
};

const TOLERANCE: f64 = 0.1;

/// Per-corner rounding radii in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BorderRadius {
    /// Top-left corner.
    pub top_left: f64,
    /// Top-right corner.
    pub top_right: f64,
    /// Bottom-right corner.
    pub bottom_right: f64,
    /// Bottom-left corner.
    pub bottom_left: f64,
}

impl BorderRadius {
    /// The same radius on every corner.
    pub fn uniform(radius: f64) -> Self {
        Self {
            top_left: radius,
            top_right: radius,
            bottom_right: radius,
            bottom_left: radius,
        }
    }

    fn is_zero(&self) -> bool {
        self.top_left <= 0.0
            && self.top_right <= 0.0
            && self.bottom_right <= 0.0
            && self.bottom_left <= 0.0
    }
}

/// Path of `rect` with its corners rounded, radii clamped to half the shorter side.
pub(crate) fn rounded_box(rect: KurboRect, radius: &BorderRadius) -> BezPath {
    let rect = rect.abs();
    if radius.is_zero() {
        return rect.to_path(TOLERANCE);
    }
    let limit = rect.width().min(rect.height()) / 2.0;
    let clamp = |r: f64| r.clamp(0.0, limit);
    let radii = RoundedRectRadii::new(
        clamp(radius.top_left),
        clamp(radius.top_right),
        clamp(radius.bottom_right),
        clamp(radius.bottom_left),
    );
    RoundedRect::from_rect(rect, radii).to_path(TOLERANCE)
}

/// Raw inputs and screen edges of a box glyph.
#[derive(Clone, Debug, Default)]
pub(crate) struct BoxData {
    raw: [Uniform<f64>; 4],
    sleft: Shared<f64>,
    sright: Shared<f64>,
    stop: Shared<f64>,
    sbottom: Shared<f64>,
}

impl BoxData {
    fn edges(&self, i: usize) -> Option<KurboRect> {
        finite_box(self.sleft[i], self.stop[i], self.sright[i], self.sbottom[i])
    }
}

/// The glyph-specific part of an edge-based box glyph.
trait Edges {
    /// Property names of the four raw inputs.
    const NAMES: [&'static str; 4];

    /// The four raw inputs.
    fn inputs(&self) -> [&Spatial; 4];

    /// Indexes of inputs that are distances rather than coordinates.
    fn distances(&self) -> &'static [usize] {
        &[]
    }

    fn border_radius(&self) -> &BorderRadius;

    /// Units of the inputs that drive the x and y scales.
    fn axes(&self) -> (Units, Units);

    /// Data-space box `[x0, y0, x1, y1]` of one record; the center when extents are not in data
    /// units.
    fn data_box(&self, v: [f64; 4]) -> [f64; 4];

    /// Screen `left, right, top, bottom` for every record.
    fn screen_edges(&self, raw: &[Uniform<f64>; 4], mapper: &CoordinateMapper) -> [Vec<f64>; 4];
}

fn box_set_data<G: Edges>(
    glyph: &G,
    source: &dyn DataSource,
    base: Option<(&G, &BoxData)>,
) -> Result<BoxData, SpecError> {
    let inputs = glyph.inputs();
    let mut raw: [Uniform<f64>; 4] = Default::default();
    for k in 0..4 {
        let base = base.map(|(g, d)| (g.inputs()[k], &d.raw[k]));
        raw[k] = if glyph.distances().contains(&k) {
            resolve_distance(inputs[k], G::NAMES[k], source, base)?
        } else {
            resolve_spatial(inputs[k], G::NAMES[k], source, base)?
        };
    }
    Ok(BoxData {
        raw,
        ..BoxData::default()
    })
}

fn box_index<G: Edges>(glyph: &G, data: &BoxData) -> SpatialIndex {
    let n = data.raw[0].len();
    let mut index = SpatialIndexBuilder::new(n);
    for i in 0..n {
        let v = [
            *data.raw[0].get(i),
            *data.raw[1].get(i),
            *data.raw[2].get(i),
            *data.raw[3].get(i),
        ];
        let [x0, y0, x1, y1] = glyph.data_box(v);
        index.add_rect(x0, y0, x1, y1);
    }
    index.finish()
}

fn box_map<G: Edges>(
    glyph: &G,
    data: &mut BoxData,
    mapper: &CoordinateMapper,
    base: Option<(&G, &BoxData)>,
) {
    if let Some((g, d)) = base
        && g.inputs() == glyph.inputs()
    {
        data.sleft = d.sleft.inherit();
        data.sright = d.sright.inherit();
        data.stop = d.stop.inherit();
        data.sbottom = d.sbottom.inherit();
        return;
    }
    let [l, r, t, b] = glyph.screen_edges(&data.raw, mapper);
    data.sleft = Shared::owned(l);
    data.sright = Shared::owned(r);
    data.stop = Shared::owned(t);
    data.sbottom = Shared::owned(b);
}

fn box_paint<G: Edges>(
    glyph: &G,
    ctx: &mut dyn Context2d,
    data: &BoxData,
    visuals: &Visuals,
    indices: &[usize],
) {
    for &i in indices {
        let Some(rect) = data.edges(i) else {
            continue;
        };
        let path = rounded_box(rect, glyph.border_radius());
        ctx.set_record(i);
        visuals.paint_area(ctx, &path, i);
    }
}

fn box_hit<G: Edges>(
    glyph: &G,
    data: &BoxData,
    index: &SpatialIndex,
    mapper: &CoordinateMapper,
    geometry: &Geometry,
) -> Option<Selection> {
    let inputs = glyph.inputs();
    let pad = if inputs.iter().all(|s| s.units == Units::Data) {
        (0.0, 0.0)
    } else {
        let widths: Vec<f64> = data
            .sleft
            .iter()
            .zip(data.sright.iter())
            .map(|(l, r)| (r - l).abs())
            .collect();
        let heights: Vec<f64> = data
            .stop
            .iter()
            .zip(data.sbottom.iter())
            .map(|(t, b)| (b - t).abs())
            .collect();
        (max_finite(&widths), max_finite(&heights))
    };
    let found = candidates(index, mapper, glyph.axes(), geometry.bounds()?, pad);
    Some(hit_boxes(|i| data.edges(i), &found, geometry))
}

fn box_screen<'a>(data: &'a BoxData, field: &str) -> Option<&'a Shared<f64>> {
    match field {
        "sleft" => Some(&data.sleft),
        "sright" => Some(&data.sright),
        "stop" => Some(&data.stop),
        "sbottom" => Some(&data.sbottom),
        _ => None,
    }
}

fn box_screen_mut<'a>(data: &'a mut BoxData, field: &str) -> Option<&'a mut Shared<f64>> {
    match field {
        "sleft" => Some(&mut data.sleft),
        "sright" => Some(&mut data.sright),
        "stop" => Some(&mut data.stop),
        "sbottom" => Some(&mut data.sbottom),
        _ => None,
    }
}

macro_rules! box_glyph {
    ($($ty:ty),*) => {$(
        impl GlyphImpl for $ty {
            type Data = BoxData;

            fn len(data: &BoxData) -> usize {
                data.raw[0].len()
            }

            fn set_data(
                &self,
                source: &dyn DataSource,
                base: Option<(&Self, &BoxData)>,
            ) -> Result<BoxData, SpecError> {
                box_set_data(self, source, base)
            }

            fn index_data(&self, data: &BoxData) -> SpatialIndex {
                box_index(self, data)
            }

            fn map_data(
                &self,
                data: &mut BoxData,
                mapper: &CoordinateMapper,
                base: Option<(&Self, &BoxData)>,
            ) {
                box_map(self, data, mapper, base);
            }

            fn paint(
                &self,
                ctx: &mut dyn Context2d,
                data: &BoxData,
                visuals: &Visuals,
                indices: &[usize],
            ) {
                box_paint(self, ctx, data, visuals, indices);
            }

            fn hit_test(
                &self,
                data: &BoxData,
                index: &SpatialIndex,
                mapper: &CoordinateMapper,
                _visuals: &Visuals,
                geometry: &Geometry,
            ) -> Option<Selection> {
                box_hit(self, data, index, mapper, geometry)
            }

            fn screen<'a>(data: &'a BoxData, field: &str) -> Option<&'a Shared<f64>> {
                box_screen(data, field)
            }

            fn screen_mut<'a>(data: &'a mut BoxData, field: &str) -> Option<&'a mut Shared<f64>> {
                box_screen_mut(data, field)
            }
        }
    )*};
}

box_glyph!(Quad, VBar, HBar, Block);

fn half_extent(lo: f64, hi: f64, spec: &Spatial) -> (f64, f64) {
    if spec.units == Units::Data {
        (lo, hi)
    } else {
        let mid = (lo + hi) / 2.0;
        (mid, mid)
    }
}

/// Axis-aligned boxes given by their four edges.
#[derive(Clone, Debug, PartialEq)]
pub struct Quad {
    /// Left edge.
    pub left: Spatial,
    /// Right edge.
    pub right: Spatial,
    /// Top edge.
    pub top: Spatial,
    /// Bottom edge.
    pub bottom: Spatial,
    /// Corner rounding.
    pub border_radius: BorderRadius,
}

impl Quad {
    /// Creates a quad glyph.
    pub fn new(
        left: impl Into<Spatial>,
        right: impl Into<Spatial>,
        top: impl Into<Spatial>,
        bottom: impl Into<Spatial>,
    ) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
            top: top.into(),
            bottom: bottom.into(),
            border_radius: BorderRadius::default(),
        }
    }

    /// Rounds the corners.
    pub fn with_border_radius(mut self, radius: BorderRadius) -> Self {
        self.border_radius = radius;
        self
    }
}

impl Edges for Quad {
    const NAMES: [&'static str; 4] = ["left", "top", "right", "bottom"];

    fn inputs(&self) -> [&Spatial; 4] {
        [&self.left, &self.top, &self.right, &self.bottom]
    }

    fn border_radius(&self) -> &BorderRadius {
        &self.border_radius
    }

    fn axes(&self) -> (Units, Units) {
        (self.left.units, self.top.units)
    }

    fn data_box(&self, [l, t, r, b]: [f64; 4]) -> [f64; 4] {
        [l, b, r, t]
    }

    fn screen_edges(&self, raw: &[Uniform<f64>; 4], mapper: &CoordinateMapper) -> [Vec<f64>; 4] {
        [
            map_coord(mapper, Dimension::X, &self.left, &raw[0]),
            map_coord(mapper, Dimension::X, &self.right, &raw[2]),
            map_coord(mapper, Dimension::Y, &self.top, &raw[1]),
            map_coord(mapper, Dimension::Y, &self.bottom, &raw[3]),
        ]
    }
}

/// Vertical bars centered on `x`, spanning `bottom..top`.
#[derive(Clone, Debug, PartialEq)]
pub struct VBar {
    /// Bar center.
    pub x: Spatial,
    /// Bar width.
    pub width: Spatial,
    /// Top edge.
    pub top: Spatial,
    /// Bottom edge.
    pub bottom: Spatial,
    /// Corner rounding.
    pub border_radius: BorderRadius,
}

impl VBar {
    /// Creates a bar glyph with its bottom at zero.
    pub fn new(x: impl Into<Spatial>, width: impl Into<Spatial>, top: impl Into<Spatial>) -> Self {
        Self {
            x: x.into(),
            width: width.into(),
            top: top.into(),
            bottom: Spatial::data(0.0),
            border_radius: BorderRadius::default(),
        }
    }

    /// Sets the bottom edge.
    pub fn with_bottom(mut self, bottom: impl Into<Spatial>) -> Self {
        self.bottom = bottom.into();
        self
    }

    /// Rounds the corners.
    pub fn with_border_radius(mut self, radius: BorderRadius) -> Self {
        self.border_radius = radius;
        self
    }
}

impl Edges for VBar {
    const NAMES: [&'static str; 4] = ["x", "width", "top", "bottom"];

    fn inputs(&self) -> [&Spatial; 4] {
        [&self.x, &self.width, &self.top, &self.bottom]
    }

    fn distances(&self) -> &'static [usize] {
        &[1]
    }

    fn border_radius(&self) -> &BorderRadius {
        &self.border_radius
    }

    fn axes(&self) -> (Units, Units) {
        (self.x.units, self.top.units)
    }

    fn data_box(&self, [x, w, t, b]: [f64; 4]) -> [f64; 4] {
        let (x0, x1) = half_extent(x - w / 2.0, x + w / 2.0, &self.width);
        [x0, b, x1, t]
    }

    fn screen_edges(&self, raw: &[Uniform<f64>; 4], mapper: &CoordinateMapper) -> [Vec<f64>; 4] {
        let sx = map_coord(mapper, Dimension::X, &self.x, &raw[0]);
        let sw = screen_lengths(mapper, Dimension::X, &raw[0], &self.width, &raw[1], Anchor::Center);
        [
            sx.iter().zip(&sw).map(|(x, w)| x - w / 2.0).collect(),
            sx.iter().zip(&sw).map(|(x, w)| x + w / 2.0).collect(),
            map_coord(mapper, Dimension::Y, &self.top, &raw[2]),
            map_coord(mapper, Dimension::Y, &self.bottom, &raw[3]),
        ]
    }
}

/// Horizontal bars centered on `y`, spanning `left..right`.
#[derive(Clone, Debug, PartialEq)]
pub struct HBar {
    /// Bar center.
    pub y: Spatial,
    /// Bar height.
    pub height: Spatial,
    /// Left edge.
    pub left: Spatial,
    /// Right edge.
    pub right: Spatial,
    /// Corner rounding.
    pub border_radius: BorderRadius,
}

impl HBar {
    /// Creates a bar glyph with its left edge at zero.
    pub fn new(y: impl Into<Spatial>, height: impl Into<Spatial>, right: impl Into<Spatial>) -> Self {
        Self {
            y: y.into(),
            height: height.into(),
            left: Spatial::data(0.0),
            right: right.into(),
            border_radius: BorderRadius::default(),
        }
    }

    /// Sets the left edge.
    pub fn with_left(mut self, left: impl Into<Spatial>) -> Self {
        self.left = left.into();
        self
    }

    /// Rounds the corners.
    pub fn with_border_radius(mut self, radius: BorderRadius) -> Self {
        self.border_radius = radius;
        self
    }
}

impl Edges for HBar {
    const NAMES: [&'static str; 4] = ["left", "y", "right", "height"];

    fn inputs(&self) -> [&Spatial; 4] {
        [&self.left, &self.y, &self.right, &self.height]
    }

    fn distances(&self) -> &'static [usize] {
        &[3]
    }

    fn border_radius(&self) -> &BorderRadius {
        &self.border_radius
    }

    fn axes(&self) -> (Units, Units) {
        (self.left.units, self.y.units)
    }

    fn data_box(&self, [l, y, r, h]: [f64; 4]) -> [f64; 4] {
        let (y0, y1) = half_extent(y - h / 2.0, y + h / 2.0, &self.height);
        [l, y0, r, y1]
    }

    fn screen_edges(&self, raw: &[Uniform<f64>; 4], mapper: &CoordinateMapper) -> [Vec<f64>; 4] {
        let sy = map_coord(mapper, Dimension::Y, &self.y, &raw[1]);
        let sh = screen_lengths(mapper, Dimension::Y, &raw[1], &self.height, &raw[3], Anchor::Center);
        [
            map_coord(mapper, Dimension::X, &self.left, &raw[0]),
            map_coord(mapper, Dimension::X, &self.right, &raw[2]),
            sy.iter().zip(&sh).map(|(y, h)| y - h / 2.0).collect(),
            sy.iter().zip(&sh).map(|(y, h)| y + h / 2.0).collect(),
        ]
    }
}

/// Boxes anchored at their bottom-left corner `(x, y)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    /// Left edge.
    pub x: Spatial,
    /// Bottom edge.
    pub y: Spatial,
    /// Width.
    pub width: Spatial,
    /// Height.
    pub height: Spatial,
    /// Corner rounding.
    pub border_radius: BorderRadius,
}

impl Block {
    /// Creates a block glyph.
    pub fn new(
        x: impl Into<Spatial>,
        y: impl Into<Spatial>,
        width: impl Into<Spatial>,
        height: impl Into<Spatial>,
    ) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            width: width.into(),
            height: height.into(),
            border_radius: BorderRadius::default(),
        }
    }

    /// Rounds the corners.
    pub fn with_border_radius(mut self, radius: BorderRadius) -> Self {
        self.border_radius = radius;
        self
    }
}

impl Edges for Block {
    const NAMES: [&'static str; 4] = ["x", "y", "width", "height"];

    fn inputs(&self) -> [&Spatial; 4] {
        [&self.x, &self.y, &self.width, &self.height]
    }

    fn distances(&self) -> &'static [usize] {
        &[2, 3]
    }

    fn border_radius(&self) -> &BorderRadius {
        &self.border_radius
    }

    fn axes(&self) -> (Units, Units) {
        (self.x.units, self.y.units)
    }

    fn data_box(&self, [x, y, w, h]: [f64; 4]) -> [f64; 4] {
        let x1 = if self.width.units == Units::Data { x + w } else { x };
        let y1 = if self.height.units == Units::Data { y + h } else { y };
        [x, y, x1, y1]
    }

    fn screen_edges(&self, raw: &[Uniform<f64>; 4], mapper: &CoordinateMapper) -> [Vec<f64>; 4] {
        let sx = map_coord(mapper, Dimension::X, &self.x, &raw[0]);
        let sy = map_coord(mapper, Dimension::Y, &self.y, &raw[1]);
        let sw = screen_lengths(mapper, Dimension::X, &raw[0], &self.width, &raw[2], Anchor::Edge);
        let sh = screen_lengths(mapper, Dimension::Y, &raw[1], &self.height, &raw[3], Anchor::Edge);
        [
            sx.clone(),
            sx.iter().zip(&sw).map(|(x, w)| x + w).collect(),
            sy.iter().zip(&sh).map(|(y, h)| y - h).collect(),
            sy,
        ]
    }
}

/// Rectangles centered on `(x, y)`, rotated counter-clockwise by `angle`.
#[derive(Clone, Debug, PartialEq)]
pub struct Rect {
    /// Center x.
    pub x: Spatial,
    /// Center y.
    pub y: Spatial,
    /// Width.
    pub width: Spatial,
    /// Height.
    pub height: Spatial,
    /// Rotation in radians.
    pub angle: VectorSpec<f64>,
    /// Round widths and heights up to whole pixels.
    pub dilate: bool,
    /// Corner rounding.
    pub border_radius: BorderRadius,
}

impl Rect {
    /// Creates a rect glyph.
    pub fn new(
        x: impl Into<Spatial>,
        y: impl Into<Spatial>,
        width: impl Into<Spatial>,
        height: impl Into<Spatial>,
    ) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            width: width.into(),
            height: height.into(),
            angle: VectorSpec::Value(0.0),
            dilate: false,
            border_radius: BorderRadius::default(),
        }
    }

    /// Sets the rotation.
    pub fn with_angle(mut self, angle: impl Into<VectorSpec<f64>>) -> Self {
        self.angle = angle.into();
        self
    }

    /// Rounds widths and heights up to whole pixels.
    pub fn with_dilate(mut self, dilate: bool) -> Self {
        self.dilate = dilate;
        self
    }

    /// Rounds the corners.
    pub fn with_border_radius(mut self, radius: BorderRadius) -> Self {
        self.border_radius = radius;
        self
    }
}

impl Centered for Rect {
    fn props(&self) -> CenteredProps<'_> {
        CenteredProps {
            x: &self.x,
            y: &self.y,
            width: &self.width,
            height: &self.height,
            angle: &self.angle,
            dilate: self.dilate,
        }
    }
}

impl GlyphImpl for Rect {
    type Data = CenteredData;

    fn len(data: &CenteredData) -> usize {
        data.len()
    }

    fn set_data(
        &self,
        source: &dyn DataSource,
        base: Option<(&Self, &CenteredData)>,
    ) -> Result<CenteredData, SpecError> {
        centered::set_data(self, source, base)
    }

    fn index_data(&self, data: &CenteredData) -> SpatialIndex {
        centered::index_data(self, data)
    }

    fn map_data(
        &self,
        data: &mut CenteredData,
        mapper: &CoordinateMapper,
        base: Option<(&Self, &CenteredData)>,
    ) {
        centered::map_data(self, data, mapper, base);
    }

    fn paint(
        &self,
        ctx: &mut dyn Context2d,
        data: &CenteredData,
        visuals: &Visuals,
        indices: &[usize],
    ) {
        for &i in indices {
            let Some((c, half, angle)) = data.frame(i) else {
                continue;
            };
            let local = KurboRect::from_points((-half).to_point(), half.to_point());
            let path = rounded_box(local, &self.border_radius);
            let path = Affine::translate(c.to_vec2()) * Affine::rotate(-angle) * path;
            ctx.set_record(i);
            visuals.paint_area(ctx, &path, i);
        }
    }

    fn hit_test(
        &self,
        data: &CenteredData,
        index: &SpatialIndex,
        mapper: &CoordinateMapper,
        _visuals: &Visuals,
        geometry: &Geometry,
    ) -> Option<Selection> {
        centered::hit_test(self, data, index, mapper, geometry, |p, half| {
            p.x.abs() <= half.x && p.y.abs() <= half.y
        })
    }

    fn screen<'a>(data: &'a CenteredData, field: &str) -> Option<&'a Shared<f64>> {
        data.screen(field)
    }

    fn screen_mut<'a>(data: &'a mut CenteredData, field: &str) -> Option<&'a mut Shared<f64>> {
        data.screen_mut(field)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use kurbo::Point;
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

    fn source() -> ColumnDataSource {
        ColumnDataSource::new()
            .with_column("x", vec![1.0, 3.0, f64::NAN])
            .unwrap()
            .with_column("top", vec![4.0, 6.0, 2.0])
            .unwrap()
    }

    fn visuals(src: &ColumnDataSource) -> Visuals {
        VisualProps::default()
            .with_line(LineProps::none())
            .resolve(src)
            .unwrap()
    }

    #[test]
    fn vbars_map_to_screen_edges() {
        let glyph = VBar::new("x", 1.0, "top");
        let src = source();
        let mut data = glyph.set_data(&src, None).unwrap();
        glyph.map_data(&mut data, &mapper(), None);
        assert_eq!(data.edges(0), Some(KurboRect::new(5.0, 60.0, 15.0, 100.0)));
        assert_eq!(data.edges(2), None);

        let mut ctx = RecordingContext::new();
        glyph.paint(&mut ctx, &data, &visuals(&src), &[2, 1, 0]);
        assert_eq!(ctx.records(), [1, 0]);
    }

    #[test]
    fn vbars_hit_by_span_and_point() {
        let glyph = VBar::new("x", 1.0, "top");
        let src = source();
        let mut data = glyph.set_data(&src, None).unwrap();
        glyph.map_data(&mut data, &mapper(), None);
        let index = glyph.index_data(&data);
        let v = visuals(&src);
        let span = Geometry::Span {
            dim: Dimension::X,
            at: 32.0,
        };
        let hit = glyph.hit_test(&data, &index, &mapper(), &v, &span).unwrap();
        assert_eq!(hit.indices(), [1]);
        let point = Geometry::Point(Point::new(10.0, 70.0));
        let hit = glyph.hit_test(&data, &index, &mapper(), &v, &point).unwrap();
        assert_eq!(hit.indices(), [0]);
    }

    #[test]
    fn rounded_boxes_clamp_their_radii() {
        let path = rounded_box(KurboRect::new(0.0, 0.0, 10.0, 4.0), &BorderRadius::uniform(50.0));
        let bbox = path.bounding_box();
        assert!((bbox.width() - 10.0).abs() < 1e-6);
        assert!((bbox.height() - 4.0).abs() < 1e-6);
    }

    #[test]
    fn blocks_grow_up_and_right() {
        let glyph = Block::new(1.0, 1.0, 2.0, 3.0);
        let src = ColumnDataSource::new().with_column("v", vec![0.0]).unwrap();
        let mut data = glyph.set_data(&src, None).unwrap();
        glyph.map_data(&mut data, &mapper(), None);
        assert_eq!(data.edges(0), Some(KurboRect::new(10.0, 60.0, 30.0, 90.0)));
        assert_eq!(glyph.index_data(&data).bbox(), Some(KurboRect::new(1.0, 1.0, 3.0, 4.0)));
    }

    #[test]
    fn rotated_rects_hit_in_their_own_frame() {
        let glyph = Rect::new(5.0, 5.0, Spatial::screen(20.0), Spatial::screen(4.0))
            .with_angle(core::f64::consts::FRAC_PI_2);
        let src = ColumnDataSource::new().with_column("v", vec![0.0]).unwrap();
        let mut data = glyph.set_data(&src, None).unwrap();
        glyph.map_data(&mut data, &mapper(), None);
        let index = glyph.index_data(&data);
        let v = visuals(&src);
        // Rotated a quarter turn, the long side runs vertically.
        let along = Geometry::Point(Point::new(50.0, 58.0));
        let across = Geometry::Point(Point::new(58.0, 50.0));
        assert_eq!(glyph.hit_test(&data, &index, &mapper(), &v, &along).unwrap().indices(), [0]);
        assert!(glyph.hit_test(&data, &index, &mapper(), &v, &across).unwrap().is_empty());

        let mut ctx = RecordingContext::new();
        glyph.paint(&mut ctx, &data, &v, &[0]);
        let DrawCall::Fill { path, .. } = &ctx.calls[0] else {
            panic!("expected a fill");
        };
        let bbox = path.bounding_box();
        assert!((bbox.height() - 20.0).abs() < 1e-6);
    }
}
