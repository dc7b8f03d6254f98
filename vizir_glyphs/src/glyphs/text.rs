// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text labels.

extern crate alloc;

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Affine, Point, Rect, Vec2};
use vizir_core::{DataSource, Selection, Shared, Uniform};

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;

use crate::context::Context2d;
use crate::geometry::{Dimension, Geometry, point_in_poly};
use crate::mapper::CoordinateMapper;
use crate::measure::{HeuristicTextMeasurer, TextMeasurer, text_box};
use crate::props::{Spatial, SpecError, VectorSpec};
use crate::spatial::{SpatialIndex, SpatialIndexBuilder};
use crate::visuals::Visuals;

use super::{GlyphImpl, candidates, inherit_or, map_coord, max_finite, resolve, resolve_spatial};

/// Single-line text labels anchored at `(x, y)`.
///
/// The label is rotated counter-clockwise by `angle` around its anchor and shifted by the
/// pixel offsets after mapping.
#[derive(Clone)]
pub struct Text {
    /// Anchor x.
    pub x: Spatial,
    /// Anchor y.
    pub y: Spatial,
    /// Label text.
    pub text: VectorSpec<String>,
    /// Rotation in radians.
    pub angle: VectorSpec<f64>,
    /// Horizontal pixel offset.
    pub x_offset: VectorSpec<f64>,
    /// Vertical pixel offset, positive downward.
    pub y_offset: VectorSpec<f64>,
    /// Extent source for bounds and hit tests.
    pub measurer: Arc<dyn TextMeasurer>,
}

impl Text {
    /// Creates a text glyph with the heuristic measurer.
    pub fn new(
        x: impl Into<Spatial>,
        y: impl Into<Spatial>,
        text: impl Into<VectorSpec<String>>,
    ) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            text: text.into(),
            angle: VectorSpec::Value(0.0),
            x_offset: VectorSpec::Value(0.0),
            y_offset: VectorSpec::Value(0.0),
            measurer: Arc::new(HeuristicTextMeasurer),
        }
    }

    /// Sets the rotation.
    pub fn with_angle(mut self, angle: impl Into<VectorSpec<f64>>) -> Self {
        self.angle = angle.into();
        self
    }

    /// Sets the pixel offsets.
    pub fn with_offset(
        mut self,
        x_offset: impl Into<VectorSpec<f64>>,
        y_offset: impl Into<VectorSpec<f64>>,
    ) -> Self {
        self.x_offset = x_offset.into();
        self.y_offset = y_offset.into();
        self
    }

    /// Sets the text measurer.
    pub fn with_measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.measurer = measurer;
        self
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Text")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("text", &self.text)
            .field("angle", &self.angle)
            .field("x_offset", &self.x_offset)
            .field("y_offset", &self.y_offset)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Text {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x
            && self.y == other.y
            && self.text == other.text
            && self.angle == other.angle
            && self.x_offset == other.x_offset
            && self.y_offset == other.y_offset
            && Arc::ptr_eq(&self.measurer, &other.measurer)
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct TextData {
    x: Uniform<f64>,
    y: Uniform<f64>,
    text: Uniform<String>,
    angle: Uniform<f64>,
    x_offset: Uniform<f64>,
    y_offset: Uniform<f64>,
    sx: Shared<f64>,
    sy: Shared<f64>,
}

impl TextData {
    /// Anchor point and rotation of record `i`, after offsets.
    fn anchor(&self, i: usize) -> Option<(Point, f64)> {
        let p = Point::new(
            self.sx[i] + *self.x_offset.get(i),
            self.sy[i] + *self.y_offset.get(i),
        );
        let angle = *self.angle.get(i);
        (p.is_finite() && angle.is_finite()).then_some((p, angle))
    }

    /// Unrotated text box of record `i`, relative to its anchor.
    fn local_box(&self, glyph: &Text, visuals: &Visuals, i: usize) -> Rect {
        let font_size = visuals.text.font_size(i);
        let size = glyph.measurer.measure(self.text.get(i), font_size);
        let (align, baseline) = visuals.text.anchor();
        text_box(0.0, 0.0, size, align, baseline)
    }

    /// The rotated text box of record `i` as a quadrilateral in canvas pixels.
    fn outline(&self, glyph: &Text, visuals: &Visuals, i: usize) -> Option<[Point; 4]> {
        let (at, angle) = self.anchor(i)?;
        let b = self.local_box(glyph, visuals, i);
        let to_screen = Affine::translate(at.to_vec2()) * Affine::rotate(-angle);
        Some([
            to_screen * Point::new(b.x0, b.y0),
            to_screen * Point::new(b.x1, b.y0),
            to_screen * Point::new(b.x1, b.y1),
            to_screen * Point::new(b.x0, b.y1),
        ])
    }
}

impl GlyphImpl for Text {
    type Data = TextData;

    fn len(data: &TextData) -> usize {
        data.x.len()
    }

    fn set_data(
        &self,
        source: &dyn DataSource,
        base: Option<(&Self, &TextData)>,
    ) -> Result<TextData, SpecError> {
        let zero = |spec: &VectorSpec<f64>,
                    property: &'static str,
                    base: Option<(&VectorSpec<f64>, &Uniform<f64>)>| {
            resolve(spec, property, source, &0.0, base)
        };
        Ok(TextData {
            x: resolve_spatial(&self.x, "x", source, base.map(|(g, d)| (&g.x, &d.x)))?,
            y: resolve_spatial(&self.y, "y", source, base.map(|(g, d)| (&g.y, &d.y)))?,
            text: resolve(
                &self.text,
                "text",
                source,
                &String::new(),
                base.map(|(g, d)| (&g.text, &d.text)),
            )?,
            angle: zero(&self.angle, "angle", base.map(|(g, d)| (&g.angle, &d.angle)))?,
            x_offset: zero(
                &self.x_offset,
                "x_offset",
                base.map(|(g, d)| (&g.x_offset, &d.x_offset)),
            )?,
            y_offset: zero(
                &self.y_offset,
                "y_offset",
                base.map(|(g, d)| (&g.y_offset, &d.y_offset)),
            )?,
            ..TextData::default()
        })
    }

    fn index_data(&self, data: &TextData) -> SpatialIndex {
        let mut index = SpatialIndexBuilder::new(data.x.len());
        for (x, y) in data.x.iter().zip(data.y.iter()) {
            index.add_point(*x, *y);
        }
        index.finish()
    }

    fn map_data(
        &self,
        data: &mut TextData,
        mapper: &CoordinateMapper,
        base: Option<(&Self, &TextData)>,
    ) {
        data.sx = inherit_or(&self.x, base.map(|(g, d)| (&g.x, &d.sx)), || {
            map_coord(mapper, Dimension::X, &self.x, &data.x)
        });
        data.sy = inherit_or(&self.y, base.map(|(g, d)| (&g.y, &d.sy)), || {
            map_coord(mapper, Dimension::Y, &self.y, &data.y)
        });
    }

    fn paint(&self, ctx: &mut dyn Context2d, data: &TextData, visuals: &Visuals, indices: &[usize]) {
        if !visuals.text.doit() {
            return;
        }
        for &i in indices {
            let Some((at, angle)) = data.anchor(i) else {
                continue;
            };
            let text = data.text.get(i);
            if text.is_empty() {
                continue;
            }
            let Some(style) = visuals.text.style(i, angle) else {
                continue;
            };
            ctx.set_record(i);
            ctx.text(text, at, &style);
        }
    }

    fn hit_test(
        &self,
        data: &TextData,
        index: &SpatialIndex,
        mapper: &CoordinateMapper,
        visuals: &Visuals,
        geometry: &Geometry,
    ) -> Option<Selection> {
        let n = data.x.len();
        let reach: Vec<f64> = (0..n)
            .map(|i| {
                let b = data.local_box(self, visuals, i);
                let offset = Vec2::new(*data.x_offset.get(i), *data.y_offset.get(i));
                [b.x0, b.x1]
                    .iter()
                    .flat_map(|x| [b.y0, b.y1].map(|y| x.hypot(y)))
                    .fold(0.0, f64::max)
                    + offset.hypot()
            })
            .collect();
        let pad = max_finite(&reach);
        let units = (self.x.units, self.y.units);
        let found = candidates(index, mapper, units, geometry.bounds()?, (pad, pad));
        let hits = found.into_iter().filter(|&i| {
            let Some(quad) = data.outline(self, visuals, i) else {
                return false;
            };
            match geometry {
                Geometry::Point(p) => point_in_poly(*p, &quad),
                Geometry::Span { dim, at } => {
                    let along = |p: &Point| match dim {
                        Dimension::X => p.x,
                        Dimension::Y => p.y,
                    };
                    let lo = quad.iter().map(along).fold(f64::INFINITY, f64::min);
                    let hi = quad.iter().map(along).fold(f64::NEG_INFINITY, f64::max);
                    lo <= *at && *at <= hi
                }
                Geometry::Rect(r) => data.anchor(i).is_some_and(|(a, _)| r.abs().contains(a)),
                Geometry::Poly(poly) => {
                    data.anchor(i).is_some_and(|(a, _)| point_in_poly(a, poly))
                }
            }
        });
        Some(Selection::from_indices(hits))
    }

    fn screen<'a>(data: &'a TextData, field: &str) -> Option<&'a Shared<f64>> {
        match field {
            "sx" => Some(&data.sx),
            "sy" => Some(&data.sy),
            _ => None,
        }
    }

    fn screen_mut<'a>(data: &'a mut TextData, field: &str) -> Option<&'a mut Shared<f64>> {
        match field {
            "sx" => Some(&mut data.sx),
            "sy" => Some(&mut data.sy),
            _ => None,
        }
    }

    fn legend(&self, ctx: &mut dyn Context2d, visuals: &Visuals, rect: Rect, i: usize) {
        let Some(style) = visuals.text.style(i, 0.0) else {
            return;
        };
        ctx.set_record(i);
        ctx.text("text", rect.abs().center(), &style);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use vizir_core::ColumnDataSource;

    use super::*;
    use crate::context::{DrawCall, RecordingContext, TextAlign, TextBaseline};
    use crate::scale::ScaleLinear;
    use crate::visuals::{TextProps, VisualProps};

    fn mapper() -> CoordinateMapper {
        CoordinateMapper::new(
            ScaleLinear::new((0.0, 10.0), (0.0, 100.0)),
            ScaleLinear::new((0.0, 10.0), (100.0, 0.0)),
        )
    }

    fn source() -> ColumnDataSource {
        ColumnDataSource::new()
            .with_column("x", vec![2.0, 8.0, f64::NAN])
            .unwrap()
            .with_column("label", vec!["abcd", "", "zz"])
            .unwrap()
    }

    #[test]
    fn labels_skip_empty_and_unplaced_records() {
        let glyph = Text::new("x", 5.0, VectorSpec::field("label"));
        let src = source();
        let mut data = glyph.set_data(&src, None).unwrap();
        glyph.map_data(&mut data, &mapper(), None);
        let visuals = VisualProps::default().resolve(&src).unwrap();
        let mut ctx = RecordingContext::new();
        glyph.paint(&mut ctx, &data, &visuals, &[0, 1, 2]);
        assert_eq!(ctx.calls.len(), 1);
        let DrawCall::Text { record, text, at } = &ctx.calls[0] else {
            panic!("expected text");
        };
        assert_eq!((*record, text.as_str(), *at), (Some(0), "abcd", Point::new(20.0, 50.0)));
    }

    #[test]
    fn hits_use_the_measured_box() {
        let glyph = Text::new("x", 5.0, VectorSpec::field("label"));
        let src = source();
        let mut data = glyph.set_data(&src, None).unwrap();
        glyph.map_data(&mut data, &mapper(), None);
        let index = glyph.index_data(&data);
        let visuals = VisualProps::default()
            .with_text(
                TextProps::default()
                    .with_font_size(10.0)
                    .with_anchor(TextAlign::Left, TextBaseline::Bottom),
            )
            .resolve(&src)
            .unwrap();
        let hit = |x: f64, y: f64| {
            glyph
                .hit_test(&data, &index, &mapper(), &visuals, &Geometry::Point(Point::new(x, y)))
                .unwrap()
                .indices()
                .to_vec()
        };
        // "abcd" at 10px spans 24x10 pixels up and to the right of (20, 50).
        assert_eq!(hit(40.0, 45.0), [0]);
        assert!(hit(40.0, 55.0).is_empty());
        assert!(hit(50.0, 45.0).is_empty());

        let rotated = glyph.clone().with_angle(core::f64::consts::FRAC_PI_2);
        let mut data = rotated.set_data(&src, None).unwrap();
        rotated.map_data(&mut data, &mapper(), None);
        let index = rotated.index_data(&data);
        let hit = |x: f64, y: f64| {
            rotated
                .hit_test(&data, &index, &mapper(), &visuals, &Geometry::Point(Point::new(x, y)))
                .unwrap()
                .indices()
                .to_vec()
        };
        // Rotated a quarter turn, the label runs upward from its anchor.
        assert_eq!(hit(15.0, 30.0), [0]);
        assert!(hit(40.0, 45.0).is_empty());
    }

    #[test]
    fn measurers_take_part_in_equality() {
        let a = Text::new(0.0, 0.0, String::from("a"));
        let b = a.clone();
        assert_eq!(a, b);
        let c = a.clone().with_measurer(Arc::new(HeuristicTextMeasurer));
        assert_ne!(a, c);
    }
}
