// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The glyph catalog.
//!
//! Every glyph kind is a small spec struct plus a private data struct holding the per-record
//! values read from the data source and the screen arrays derived from them. Kinds implement
//! [`GlyphImpl`]; the closed [`Glyph`] enum dispatches to them.

extern crate alloc;

use alloc::vec::Vec;

use kurbo::{BezPath, Line, Point, Rect, Shape};
use vizir_core::{DataSource, Selection, Shared, Uniform};

use crate::context::Context2d;
use crate::geometry::{Dimension, Geometry, point_in_poly};
use crate::image::ImageLoader;
use crate::mapper::{CoordinateMapper, Units};
use crate::props::{ColumnValue, Spatial, SpecError, VectorSpec};
use crate::scale::Scale;
use crate::spatial::SpatialIndex;
use crate::visuals::Visuals;
use crate::webgl::GpuGeometry;

mod boxes;
mod centered;
mod curves;
mod ellipse;
mod hex_tile;
mod image_url;
mod lines;
mod markers;
mod radial;
mod text;

pub use boxes::{Block, BorderRadius, HBar, Quad, Rect as RectGlyph, VBar};
pub use curves::{Bezier, Quadratic, Segment};
pub use ellipse::Ellipse;
pub use hex_tile::{HexOrientation, HexTile};
pub use image_url::{ImageAnchor, ImageUrl};
pub use lines::{Line as LineGlyph, MultiLine, Patches};
pub use markers::{Circle, MarkerType, RadiusDimension, Scatter};
pub use radial::{AnnularWedge, Annulus, Direction, Wedge};
pub use text::Text;

/// Behavior shared by all glyph kinds.
pub(crate) trait GlyphImpl: Clone + core::fmt::Debug + PartialEq {
    /// Per-record values and screen arrays.
    type Data: Clone + core::fmt::Debug + Default;

    /// Number of records in `data`.
    fn len(data: &Self::Data) -> usize;

    /// Reads per-record values from `source`, reusing the base glyph's values where the
    /// properties are identical.
    fn set_data(
        &self,
        source: &dyn DataSource,
        base: Option<(&Self, &Self::Data)>,
    ) -> Result<Self::Data, SpecError>;

    /// Builds the spatial index over the records, in the units of the coordinate properties.
    fn index_data(&self, data: &Self::Data) -> SpatialIndex;

    /// Computes screen arrays, inheriting the base glyph's arrays where the inputs match.
    fn map_data(
        &self,
        data: &mut Self::Data,
        mapper: &CoordinateMapper,
        base: Option<(&Self, &Self::Data)>,
    );

    /// Paints `indices` in order, skipping records with non-finite screen geometry.
    fn paint(&self, ctx: &mut dyn Context2d, data: &Self::Data, visuals: &Visuals, indices: &[usize]);

    /// Exact hit test. `None` means the glyph does not support this geometry.
    fn hit_test(
        &self,
        data: &Self::Data,
        index: &SpatialIndex,
        mapper: &CoordinateMapper,
        visuals: &Visuals,
        geometry: &Geometry,
    ) -> Option<Selection> {
        let _ = (data, index, mapper, visuals, geometry);
        None
    }

    /// A named screen array.
    fn screen<'a>(data: &'a Self::Data, field: &str) -> Option<&'a Shared<f64>> {
        let _ = (data, field);
        None
    }

    /// A named screen array, for writing.
    fn screen_mut<'a>(data: &'a mut Self::Data, field: &str) -> Option<&'a mut Shared<f64>> {
        let _ = (data, field);
        None
    }

    /// Paints a representative glyph for record `i` into a legend rectangle.
    fn legend(&self, ctx: &mut dyn Context2d, visuals: &Visuals, rect: Rect, i: usize) {
        area_legend(ctx, visuals, rect, i);
    }

    /// Geometry for the instanced GPU path, if the kind supports it.
    fn gpu<'a>(&'a self, data: &'a Self::Data) -> Option<GpuGeometry<'a>> {
        let _ = data;
        None
    }

    /// The image loader of image glyphs.
    fn images(data: &Self::Data) -> Option<&ImageLoader> {
        let _ = data;
        None
    }

    /// The image loader of image glyphs, for writing.
    fn images_mut(data: &mut Self::Data) -> Option<&mut ImageLoader> {
        let _ = data;
        None
    }
}

/// A glyph spec together with its computed data.
#[derive(Clone, Debug)]
pub(crate) struct Slot<G: GlyphImpl> {
    pub(crate) glyph: G,
    pub(crate) data: G::Data,
}

impl<G: GlyphImpl> Slot<G> {
    fn new(glyph: G) -> Self {
        Self {
            glyph,
            data: G::Data::default(),
        }
    }

    fn set_data(&mut self, source: &dyn DataSource, base: Option<&Self>) -> Result<(), SpecError> {
        let mut data = self
            .glyph
            .set_data(source, base.map(|b| (&b.glyph, &b.data)))?;
        if let (Some(previous), Some(loader)) = (G::images(&self.data), G::images_mut(&mut data)) {
            loader.follow(previous);
        }
        self.data = data;
        Ok(())
    }

    fn map_data(&mut self, mapper: &CoordinateMapper, base: Option<&Self>) {
        self.glyph
            .map_data(&mut self.data, mapper, base.map(|b| (&b.glyph, &b.data)));
    }
}

macro_rules! glyph_kinds {
    ($($(#[$doc:meta])* $variant:ident($ty:ty),)*) => {
        /// A glyph specification: one of the supported glyph kinds.
        #[derive(Clone, Debug, PartialEq)]
        pub enum Glyph {
            $($(#[$doc])* $variant($ty),)*
        }

        $(impl From<$ty> for Glyph {
            fn from(value: $ty) -> Self {
                Self::$variant(value)
            }
        })*

        #[derive(Clone, Debug)]
        pub(crate) enum GlyphKind {
            $($variant(Slot<$ty>),)*
        }

        impl GlyphKind {
            pub(crate) fn new(glyph: Glyph) -> Self {
                match glyph {
                    $(Glyph::$variant(g) => Self::$variant(Slot::new(g)),)*
                }
            }

            pub(crate) fn spec(&self) -> Glyph {
                match self {
                    $(Self::$variant(s) => Glyph::$variant(s.glyph.clone()),)*
                }
            }

            pub(crate) fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => stringify!($variant),)*
                }
            }

            pub(crate) fn len(&self) -> usize {
                match self {
                    $(Self::$variant(s) => <$ty as GlyphImpl>::len(&s.data),)*
                }
            }

            pub(crate) fn set_data(
                &mut self,
                source: &dyn DataSource,
                base: Option<&Self>,
            ) -> Result<(), SpecError> {
                match self {
                    $(Self::$variant(s) => {
                        let base = match base {
                            Some(Self::$variant(b)) => Some(b),
                            _ => None,
                        };
                        s.set_data(source, base)
                    })*
                }
            }

            pub(crate) fn index_data(&self) -> SpatialIndex {
                match self {
                    $(Self::$variant(s) => s.glyph.index_data(&s.data),)*
                }
            }

            pub(crate) fn map_data(&mut self, mapper: &CoordinateMapper, base: Option<&Self>) {
                match self {
                    $(Self::$variant(s) => {
                        let base = match base {
                            Some(Self::$variant(b)) => Some(b),
                            _ => None,
                        };
                        s.map_data(mapper, base);
                    })*
                }
            }

            pub(crate) fn paint(
                &self,
                ctx: &mut dyn Context2d,
                visuals: &Visuals,
                indices: &[usize],
            ) {
                match self {
                    $(Self::$variant(s) => s.glyph.paint(ctx, &s.data, visuals, indices),)*
                }
            }

            pub(crate) fn hit_test(
                &self,
                index: &SpatialIndex,
                mapper: &CoordinateMapper,
                visuals: &Visuals,
                geometry: &Geometry,
            ) -> Option<Selection> {
                match self {
                    $(Self::$variant(s) => {
                        s.glyph.hit_test(&s.data, index, mapper, visuals, geometry)
                    })*
                }
            }

            pub(crate) fn screen(&self, field: &str) -> Option<&Shared<f64>> {
                match self {
                    $(Self::$variant(s) => <$ty as GlyphImpl>::screen(&s.data, field),)*
                }
            }

            pub(crate) fn screen_mut(&mut self, field: &str) -> Option<&mut Shared<f64>> {
                match self {
                    $(Self::$variant(s) => <$ty as GlyphImpl>::screen_mut(&mut s.data, field),)*
                }
            }

            pub(crate) fn legend(
                &self,
                ctx: &mut dyn Context2d,
                visuals: &Visuals,
                rect: Rect,
                i: usize,
            ) {
                match self {
                    $(Self::$variant(s) => s.glyph.legend(ctx, visuals, rect, i),)*
                }
            }

            pub(crate) fn gpu(&self) -> Option<GpuGeometry<'_>> {
                match self {
                    $(Self::$variant(s) => s.glyph.gpu(&s.data),)*
                }
            }

            pub(crate) fn images(&self) -> Option<&ImageLoader> {
                match self {
                    $(Self::$variant(s) => <$ty as GlyphImpl>::images(&s.data),)*
                }
            }

            pub(crate) fn images_mut(&mut self) -> Option<&mut ImageLoader> {
                match self {
                    $(Self::$variant(s) => <$ty as GlyphImpl>::images_mut(&mut s.data),)*
                }
            }
        }
    };
}

glyph_kinds! {
    /// Circles with a radius in data or screen units.
    Circle(Circle),
    /// Markers of a fixed screen size.
    Scatter(Scatter),
    /// Rotatable rectangles given by center and size.
    Rect(RectGlyph),
    /// Axis-aligned boxes given by their four edges.
    Quad(Quad),
    /// Vertical bars.
    VBar(VBar),
    /// Horizontal bars.
    HBar(HBar),
    /// Boxes given by a corner and a size.
    Block(Block),
    /// Rotatable ellipses.
    Ellipse(Ellipse),
    /// Pie slices.
    Wedge(Wedge),
    /// Ring slices.
    AnnularWedge(AnnularWedge),
    /// Rings.
    Annulus(Annulus),
    /// Hexagonal tiles in axial coordinates.
    HexTile(HexTile),
    /// Straight segments.
    Segment(Segment),
    /// A single polyline through all records.
    Line(LineGlyph),
    /// One polyline per record.
    MultiLine(MultiLine),
    /// One polygon per record.
    Patches(Patches),
    /// Cubic curves.
    Bezier(Bezier),
    /// Quadratic curves.
    Quadratic(Quadratic),
    /// Text labels.
    Text(Text),
    /// Images loaded from URLs.
    ImageUrl(ImageUrl),
}

/// Resolves a property, reusing the base glyph's values when the specs are identical.
pub(crate) fn resolve<T: ColumnValue>(
    spec: &VectorSpec<T>,
    property: &'static str,
    source: &dyn DataSource,
    fallback: &T,
    base: Option<(&VectorSpec<T>, &Uniform<T>)>,
) -> Result<Uniform<T>, SpecError> {
    if let Some((base_spec, values)) = base
        && base_spec == spec
    {
        return Ok(values.inherit());
    }
    spec.resolve(property, source, fallback)
}

/// Resolves a coordinate or distance property; missing fields become `NaN`.
pub(crate) fn resolve_spatial(
    spec: &Spatial,
    property: &'static str,
    source: &dyn DataSource,
    base: Option<(&Spatial, &Uniform<f64>)>,
) -> Result<Uniform<f64>, SpecError> {
    resolve(
        &spec.spec,
        property,
        source,
        &f64::NAN,
        base.map(|(s, v)| (&s.spec, v)),
    )
}

/// Reuses the base glyph's screen array when `key` (the inputs it was derived from) matches.
pub(crate) fn inherit_or<K: PartialEq, T: Clone>(
    key: K,
    base: Option<(K, &Shared<T>)>,
    compute: impl FnOnce() -> Vec<T>,
) -> Shared<T> {
    match base {
        Some((base_key, values)) if base_key == key => values.inherit(),
        _ => Shared::owned(compute()),
    }
}

/// Maps every record's value through `scale`.
pub(crate) fn map_values(scale: &Scale, raw: &Uniform<f64>) -> Vec<f64> {
    match raw.as_scalar() {
        Some(v) => alloc::vec![scale.compute(*v); raw.len()],
        None => raw.iter().map(|v| scale.compute(*v)).collect(),
    }
}

/// Maps a coordinate property into canvas pixels.
pub(crate) fn map_coord(
    mapper: &CoordinateMapper,
    dim: Dimension,
    spec: &Spatial,
    raw: &Uniform<f64>,
) -> Vec<f64> {
    let scale = match dim {
        Dimension::X => mapper.x_scale(spec.units),
        Dimension::Y => mapper.y_scale(spec.units),
    };
    map_values(&scale, raw)
}

/// Largest finite value of a screen array.
pub(crate) fn max_finite(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0, f64::max)
}

/// Candidate records near a canvas-space region.
///
/// `screen` is grown by `pad` pixels (for extents that live in screen units and are therefore
/// missing from the index), converted into the units of the glyph's coordinates and queried.
pub(crate) fn candidates(
    index: &SpatialIndex,
    mapper: &CoordinateMapper,
    units: (Units, Units),
    screen: Rect,
    pad: (f64, f64),
) -> Vec<usize> {
    let invert = |scale: Scale, s0: f64, s1: f64| -> (f64, f64) {
        let (lo, hi) = scale.r_invert(s0, s1);
        (
            if s0.is_finite() { lo } else { f64::NEG_INFINITY },
            if s1.is_finite() { hi } else { f64::INFINITY },
        )
    };
    let (x0, x1) = invert(mapper.x_scale(units.0), screen.x0 - pad.0, screen.x1 + pad.0);
    let (y0, y1) = invert(mapper.y_scale(units.1), screen.y0 - pad.1, screen.y1 + pad.1);
    let mut out: Vec<usize> = index.indices(Rect::new(x0, y0, x1, y1)).collect();
    out.sort_unstable();
    out
}

/// Hit test for glyphs that behave like discs of screen radius `radius(i)` around `(sx, sy)`.
pub(crate) fn hit_discs(
    sx: &[f64],
    sy: &[f64],
    radius: impl Fn(usize) -> f64,
    candidates: &[usize],
    geometry: &Geometry,
) -> Selection {
    let hits = candidates.iter().copied().filter(|&i| {
        let (x, y, r) = (sx[i], sy[i], radius(i));
        if !(x.is_finite() && y.is_finite() && r.is_finite()) {
            return false;
        }
        match geometry {
            Geometry::Point(p) => (Point::new(x, y) - *p).hypot2() <= r * r,
            Geometry::Span {
                dim: Dimension::X,
                at,
            } => (x - at).abs() <= r,
            Geometry::Span {
                dim: Dimension::Y,
                at,
            } => (y - at).abs() <= r,
            Geometry::Rect(rect) => {
                let rect = rect.abs();
                rect.x0 <= x && x <= rect.x1 && rect.y0 <= y && y <= rect.y1
            }
            Geometry::Poly(poly) => point_in_poly(Point::new(x, y), poly),
        }
    });
    Selection::from_indices(hits)
}

/// Hit test for glyphs occupying the axis-aligned boxes returned by `bounds(i)`.
pub(crate) fn hit_boxes(
    bounds: impl Fn(usize) -> Option<Rect>,
    candidates: &[usize],
    geometry: &Geometry,
) -> Selection {
    let hits = candidates.iter().copied().filter(|&i| {
        let Some(b) = bounds(i) else {
            return false;
        };
        match geometry {
            Geometry::Point(p) => b.x0 <= p.x && p.x <= b.x1 && b.y0 <= p.y && p.y <= b.y1,
            Geometry::Span {
                dim: Dimension::X,
                at,
            } => b.x0 <= *at && *at <= b.x1,
            Geometry::Span {
                dim: Dimension::Y,
                at,
            } => b.y0 <= *at && *at <= b.y1,
            Geometry::Rect(rect) => rect.abs().overlaps(b),
            Geometry::Poly(poly) => point_in_poly(b.center(), poly),
        }
    });
    Selection::from_indices(hits)
}

/// Box of `l, t, r, b`, or `None` if any edge is non-finite.
pub(crate) fn finite_box(l: f64, t: f64, r: f64, b: f64) -> Option<Rect> {
    (l.is_finite() && t.is_finite() && r.is_finite() && b.is_finite())
        .then(|| Rect::new(l, t, r, b).abs())
}

/// Legend swatch for area glyphs: a rectangle inset into the legend box.
pub(crate) fn area_legend(ctx: &mut dyn Context2d, visuals: &Visuals, rect: Rect, i: usize) {
    let w = rect.width().abs();
    let h = rect.height().abs();
    let inset = 0.1 * w.min(h);
    let path = rect.abs().inset(-inset).to_path(0.1);
    ctx.set_record(i);
    visuals.paint_area(ctx, &path, i);
}

/// Legend swatch for line glyphs: a horizontal line through the legend box.
pub(crate) fn line_legend(ctx: &mut dyn Context2d, visuals: &Visuals, rect: Rect, i: usize) {
    let rect = rect.abs();
    let y = rect.center().y;
    let path: BezPath = Line::new((rect.x0, y), (rect.x1, y)).path_elements(0.1).collect();
    ctx.set_record(i);
    visuals.paint_line(ctx, &path, i);
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;
    use crate::spatial::SpatialIndexBuilder;

    #[test]
    fn inherit_or_shares_when_keys_match() {
        let base = Shared::owned(vec![1.0, 2.0]);
        let shared = inherit_or(1, Some((1, &base)), || vec![9.0, 9.0]);
        assert!(shared.is_inherited());
        assert!(shared.ptr_eq(&base));
        let fresh = inherit_or(2, Some((1, &base)), || vec![9.0, 9.0]);
        assert!(!fresh.is_inherited());
        assert_eq!(fresh.as_slice(), &[9.0, 9.0]);
    }

    #[test]
    fn candidates_are_padded_in_screen_space() {
        let mapper = CoordinateMapper::new(
            crate::scale::ScaleLinear::new((0.0, 10.0), (0.0, 100.0)),
            crate::scale::ScaleLinear::new((0.0, 10.0), (100.0, 0.0)),
        );
        let mut builder = SpatialIndexBuilder::new(2);
        builder.add_point(1.0, 1.0);
        builder.add_point(5.0, 5.0);
        let index = builder.finish();
        let cursor = Rect::new(12.0, 88.0, 12.0, 88.0);
        let units = (Units::Data, Units::Data);
        assert!(candidates(&index, &mapper, units, cursor, (0.0, 0.0)).is_empty());
        assert_eq!(candidates(&index, &mapper, units, cursor, (3.0, 3.0)), [0]);
    }

    #[test]
    fn span_candidates_are_unbounded() {
        let mapper = CoordinateMapper::new(
            crate::scale::ScaleLinear::new((0.0, 10.0), (0.0, 100.0)),
            crate::scale::ScaleLinear::new((0.0, 10.0), (100.0, 0.0)),
        );
        let mut builder = SpatialIndexBuilder::new(2);
        builder.add_point(1.0, -1000.0);
        builder.add_point(5.0, 5.0);
        let index = builder.finish();
        let span = Geometry::Span {
            dim: Dimension::X,
            at: 10.0,
        };
        let bounds = span.bounds().unwrap();
        let units = (Units::Data, Units::Data);
        assert_eq!(candidates(&index, &mapper, units, bounds, (0.0, 0.0)), [0]);
    }
}
