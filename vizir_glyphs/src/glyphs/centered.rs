// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared mapping and hit testing for rotatable glyphs given by center, width and height.

extern crate alloc;

use alloc::vec::Vec;

use kurbo::{Affine, Point, Rect, Vec2};
use vizir_core::{DataSource, Selection, Shared, Uniform};

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;

use crate::geometry::{Dimension, Geometry, point_in_poly};
use crate::mapper::{Anchor, CoordinateMapper, Units};
use crate::props::{Spatial, SpecError, VectorSpec};
use crate::spatial::{SpatialIndex, SpatialIndexBuilder};

use super::markers::{resolve_distance, screen_lengths};
use super::{candidates, hit_boxes, inherit_or, map_coord, max_finite, resolve, resolve_spatial};

/// The properties of a center-based glyph.
pub(crate) struct CenteredProps<'a> {
    pub(crate) x: &'a Spatial,
    pub(crate) y: &'a Spatial,
    pub(crate) width: &'a Spatial,
    pub(crate) height: &'a Spatial,
    pub(crate) angle: &'a VectorSpec<f64>,
    pub(crate) dilate: bool,
}

/// Glyphs described by [`CenteredProps`].
pub(crate) trait Centered {
    fn props(&self) -> CenteredProps<'_>;
}

#[derive(Clone, Debug, Default)]
pub(crate) struct CenteredData {
    x: Uniform<f64>,
    y: Uniform<f64>,
    width: Uniform<f64>,
    height: Uniform<f64>,
    angle: Uniform<f64>,
    pub(crate) sx: Shared<f64>,
    pub(crate) sy: Shared<f64>,
    pub(crate) sw: Shared<f64>,
    pub(crate) sh: Shared<f64>,
}

impl CenteredData {
    pub(crate) fn len(&self) -> usize {
        self.x.len()
    }

    /// Center, half extents and rotation of record `i`.
    pub(crate) fn frame(&self, i: usize) -> Option<(Point, Vec2, f64)> {
        let (x, y, w, h, a) = (
            self.sx[i],
            self.sy[i],
            self.sw[i],
            self.sh[i],
            *self.angle.get(i),
        );
        [x, y, w, h, a]
            .iter()
            .all(|v| v.is_finite())
            .then(|| (Point::new(x, y), Vec2::new(w / 2.0, h / 2.0), a))
    }

    /// Screen-space bounding box of record `i`'s rotated rectangle.
    pub(crate) fn bounds(&self, i: usize) -> Option<Rect> {
        let (c, half, a) = self.frame(i)?;
        let (sin, cos) = (a.sin().abs(), a.cos().abs());
        let ext = Vec2::new(half.x * cos + half.y * sin, half.x * sin + half.y * cos);
        Some(Rect::from_points(c - ext, c + ext))
    }

    pub(crate) fn screen(&self, field: &str) -> Option<&Shared<f64>> {
        match field {
            "sx" => Some(&self.sx),
            "sy" => Some(&self.sy),
            "sw" => Some(&self.sw),
            "sh" => Some(&self.sh),
            _ => None,
        }
    }

    pub(crate) fn screen_mut(&mut self, field: &str) -> Option<&mut Shared<f64>> {
        match field {
            "sx" => Some(&mut self.sx),
            "sy" => Some(&mut self.sy),
            "sw" => Some(&mut self.sw),
            "sh" => Some(&mut self.sh),
            _ => None,
        }
    }
}

pub(crate) fn set_data<G: Centered>(
    glyph: &G,
    source: &dyn DataSource,
    base: Option<(&G, &CenteredData)>,
) -> Result<CenteredData, SpecError> {
    let p = glyph.props();
    let b = base.map(|(g, d)| (g.props(), d));
    Ok(CenteredData {
        x: resolve_spatial(p.x, "x", source, b.as_ref().map(|(g, d)| (g.x, &d.x)))?,
        y: resolve_spatial(p.y, "y", source, b.as_ref().map(|(g, d)| (g.y, &d.y)))?,
        width: resolve_distance(
            p.width,
            "width",
            source,
            b.as_ref().map(|(g, d)| (g.width, &d.width)),
        )?,
        height: resolve_distance(
            p.height,
            "height",
            source,
            b.as_ref().map(|(g, d)| (g.height, &d.height)),
        )?,
        angle: resolve(
            p.angle,
            "angle",
            source,
            &0.0,
            b.as_ref().map(|(g, d)| (g.angle, &d.angle)),
        )?,
        ..CenteredData::default()
    })
}

pub(crate) fn index_data<G: Centered>(glyph: &G, data: &CenteredData) -> SpatialIndex {
    let p = glyph.props();
    let n = data.len();
    let mut index = SpatialIndexBuilder::new(n);
    let axis_aligned = p.width.units == Units::Data
        && p.height.units == Units::Data
        && data.angle.as_scalar() == Some(&0.0);
    for i in 0..n {
        let (x, y) = (*data.x.get(i), *data.y.get(i));
        if axis_aligned {
            let (w, h) = (*data.width.get(i) / 2.0, *data.height.get(i) / 2.0);
            index.add_rect(x - w, y - h, x + w, y + h);
        } else {
            // Rotated or screen-sized extents are covered by the hit-test padding.
            index.add_point(x, y);
        }
    }
    index.finish()
}

pub(crate) fn map_data<G: Centered>(
    glyph: &G,
    data: &mut CenteredData,
    mapper: &CoordinateMapper,
    base: Option<(&G, &CenteredData)>,
) {
    let p = glyph.props();
    let b = base.map(|(g, d)| (g.props(), d));
    data.sx = inherit_or(p.x, b.as_ref().map(|(g, d)| (g.x, &d.sx)), || {
        map_coord(mapper, Dimension::X, p.x, &data.x)
    });
    data.sy = inherit_or(p.y, b.as_ref().map(|(g, d)| (g.y, &d.sy)), || {
        map_coord(mapper, Dimension::Y, p.y, &data.y)
    });
    let dilate = |v: Vec<f64>| -> Vec<f64> {
        if p.dilate {
            v.into_iter().map(|w| w.ceil()).collect()
        } else {
            v
        }
    };
    data.sw = inherit_or(
        (p.x, p.width, p.dilate),
        b.as_ref().map(|(g, d)| ((g.x, g.width, g.dilate), &d.sw)),
        || {
            dilate(screen_lengths(
                mapper,
                Dimension::X,
                &data.x,
                p.width,
                &data.width,
                Anchor::Center,
            ))
        },
    );
    data.sh = inherit_or(
        (p.y, p.height, p.dilate),
        b.as_ref().map(|(g, d)| ((g.y, g.height, g.dilate), &d.sh)),
        || {
            dilate(screen_lengths(
                mapper,
                Dimension::Y,
                &data.y,
                p.height,
                &data.height,
                Anchor::Center,
            ))
        },
    );
}

/// Hit test where `inside(local, half)` decides whether a point in the record's unrotated frame
/// lies in the shape. Rectangles and polygons select by center.
pub(crate) fn hit_test<G: Centered>(
    glyph: &G,
    data: &CenteredData,
    index: &SpatialIndex,
    mapper: &CoordinateMapper,
    geometry: &Geometry,
    inside: impl Fn(Point, Vec2) -> bool,
) -> Option<Selection> {
    let p = glyph.props();
    let diagonal: Vec<f64> = data
        .sw
        .iter()
        .zip(data.sh.iter())
        .map(|(w, h)| w.hypot(*h) / 2.0)
        .collect();
    let pad = max_finite(&diagonal);
    let units = (p.x.units, p.y.units);
    let found = candidates(index, mapper, units, geometry.bounds()?, (pad, pad));
    if matches!(geometry, Geometry::Span { .. }) {
        return Some(hit_boxes(|i| data.bounds(i), &found, geometry));
    }
    let hits = found.into_iter().filter(|&i| {
        let Some((c, half, angle)) = data.frame(i) else {
            return false;
        };
        match geometry {
            Geometry::Point(q) => inside(Affine::rotate(angle) * (*q - c).to_point(), half),
            Geometry::Rect(r) => r.abs().contains(c),
            Geometry::Poly(poly) => point_in_poly(c, poly),
            Geometry::Span { .. } => false,
        }
    });
    Some(Selection::from_indices(hits))
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use vizir_core::ColumnDataSource;

    use super::*;
    use crate::scale::ScaleLinear;

    struct Tile {
        x: Spatial,
        y: Spatial,
        width: Spatial,
        height: Spatial,
        angle: VectorSpec<f64>,
        dilate: bool,
    }

    impl Centered for Tile {
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

    fn mapper() -> CoordinateMapper {
        CoordinateMapper::new(
            ScaleLinear::new((0.0, 10.0), (0.0, 100.0)),
            ScaleLinear::new((0.0, 10.0), (100.0, 0.0)),
        )
    }

    fn source() -> ColumnDataSource {
        ColumnDataSource::new()
            .with_column("x", vec![1.0, 5.0, f64::NAN])
            .unwrap()
            .with_column("y", vec![1.0, 5.0, 5.0])
            .unwrap()
            .with_column("a", vec![0.0, core::f64::consts::FRAC_PI_2, 0.0])
            .unwrap()
    }

    /// 20 by 10 pixel tiles, the second one turned a quarter.
    fn turned() -> Tile {
        Tile {
            x: "x".into(),
            y: "y".into(),
            width: Spatial::screen(20.0),
            height: Spatial::screen(10.0),
            angle: VectorSpec::field("a"),
            dilate: false,
        }
    }

    fn mapped(tile: &Tile) -> (CenteredData, SpatialIndex) {
        let mut data = set_data(tile, &source(), None).unwrap();
        map_data(tile, &mut data, &mapper(), None);
        let index = index_data(tile, &data);
        (data, index)
    }

    #[test]
    fn turned_frames_bound_their_rotated_extent() {
        let (data, _) = mapped(&turned());
        let (center, half, angle) = data.frame(0).unwrap();
        assert!((center - Point::new(10.0, 90.0)).hypot() < 1e-9);
        assert_eq!(half, Vec2::new(10.0, 5.0));
        assert_eq!(angle, 0.0);

        let b = data.bounds(1).unwrap();
        assert!((b.width() - 10.0).abs() < 1e-9);
        assert!((b.height() - 20.0).abs() < 1e-9);
        assert!((b.center() - Point::new(50.0, 50.0)).hypot() < 1e-9);

        assert_eq!(data.frame(2), None);
        assert_eq!(data.bounds(2), None);
    }

    #[test]
    fn data_sized_frames_are_indexed_by_extent_and_dilated() {
        let tile = Tile {
            width: Spatial::data(1.55),
            height: Spatial::data(1.25),
            angle: VectorSpec::Value(0.0),
            dilate: true,
            ..turned()
        };
        let (data, index) = mapped(&tile);
        assert_eq!(data.sw[0], 16.0);
        assert_eq!(data.sh[0], 13.0);
        let hits: Vec<usize> = index.indices(Rect::new(1.7, 0.0, 1.75, 10.0)).collect();
        assert_eq!(hits, [0]);
        assert_eq!(index.indices(Rect::new(0.0, 0.0, 10.0, 10.0)).count(), 2);
    }

    #[test]
    fn points_are_tested_in_the_unrotated_frame() {
        let tile = turned();
        let (data, index) = mapped(&tile);
        let hit = |geometry: Geometry| {
            hit_test(&tile, &data, &index, &mapper(), &geometry, |p, half| {
                p.x.abs() <= half.x && p.y.abs() <= half.y
            })
            .unwrap()
            .indices()
            .to_vec()
        };
        assert_eq!(hit(Geometry::Point(Point::new(50.0, 58.0))), [1]);
        assert!(hit(Geometry::Point(Point::new(58.0, 50.0))).is_empty());
        assert_eq!(hit(Geometry::Rect(Rect::new(40.0, 40.0, 60.0, 60.0))), [1]);
        assert_eq!(
            hit(Geometry::Span {
                dim: Dimension::X,
                at: 46.0
            }),
            [1]
        );
        assert_eq!(
            hit(Geometry::Span {
                dim: Dimension::Y,
                at: 50.0
            }),
            [1]
        );
        assert_eq!(
            hit(Geometry::Span {
                dim: Dimension::X,
                at: 18.0
            }),
            [0]
        );
    }
}
