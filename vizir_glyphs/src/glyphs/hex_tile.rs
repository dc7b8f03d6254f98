// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hexagonal tiles addressed by axial coordinates.

extern crate alloc;

use alloc::vec::Vec;

use kurbo::{BezPath, Point, Rect};
use smallvec::SmallVec;
use vizir_core::{DataSource, Selection, Shared, Uniform};

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;

use crate::context::Context2d;
use crate::geometry::{Geometry, point_in_poly};
use crate::mapper::{CoordinateMapper, Units};
use crate::props::{SpecError, VectorSpec};
use crate::spatial::{SpatialIndex, SpatialIndexBuilder};
use crate::visuals::Visuals;

use super::{GlyphImpl, candidates, hit_boxes, inherit_or, resolve};

const SQRT3: f64 = 1.732_050_807_568_877_2;

/// Which way the hexagons point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HexOrientation {
    /// A vertex at the top; rows are offset horizontally.
    #[default]
    PointyTop,
    /// An edge at the top; columns are offset vertically.
    FlatTop,
}

/// Hexagonal tiles at axial coordinates `(q, r)`.
#[derive(Clone, Debug, PartialEq)]
pub struct HexTile {
    /// Axial column.
    pub q: VectorSpec<f64>,
    /// Axial row.
    pub r: VectorSpec<f64>,
    /// Center-to-vertex distance, in data units.
    pub size: f64,
    /// Stretch of the tiling along y relative to x.
    pub aspect_scale: f64,
    /// Tile orientation.
    pub orientation: HexOrientation,
    /// Per-record shrink factor applied to each tile around its center.
    pub scale: VectorSpec<f64>,
}

impl HexTile {
    /// Creates a pointy-top tiling of unit size.
    pub fn new(q: impl Into<VectorSpec<f64>>, r: impl Into<VectorSpec<f64>>) -> Self {
        Self {
            q: q.into(),
            r: r.into(),
            size: 1.0,
            aspect_scale: 1.0,
            orientation: HexOrientation::PointyTop,
            scale: VectorSpec::Value(1.0),
        }
    }

    /// Sets the tile size.
    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    /// Sets the aspect scale.
    pub fn with_aspect_scale(mut self, aspect_scale: f64) -> Self {
        self.aspect_scale = aspect_scale;
        self
    }

    /// Sets the orientation.
    pub fn with_orientation(mut self, orientation: HexOrientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Sets the per-record scale.
    pub fn with_scale(mut self, scale: impl Into<VectorSpec<f64>>) -> Self {
        self.scale = scale.into();
        self
    }

    /// Data-space center of tile `(q, r)`.
    fn center(&self, q: f64, r: f64) -> (f64, f64) {
        let size = self.size;
        match self.orientation {
            HexOrientation::PointyTop => (
                size * SQRT3 * (q + r / 2.0) / self.aspect_scale,
                -1.5 * size * r,
            ),
            HexOrientation::FlatTop => (
                1.5 * size * q,
                -size * SQRT3 * (r + q / 2.0) * self.aspect_scale,
            ),
        }
    }

    /// Data-space vertex radii along x and y.
    fn radii(&self) -> (f64, f64) {
        match self.orientation {
            HexOrientation::PointyTop => (self.size / self.aspect_scale, self.size),
            HexOrientation::FlatTop => (self.size, self.size * self.aspect_scale),
        }
    }

    /// The unit-radius vertex directions, counter-clockwise in data space.
    fn corners(&self) -> [(f64, f64); 6] {
        let offset = match self.orientation {
            HexOrientation::PointyTop => core::f64::consts::FRAC_PI_6,
            HexOrientation::FlatTop => 0.0,
        };
        let mut out = [(0.0, 0.0); 6];
        for (k, c) in out.iter_mut().enumerate() {
            let a = offset + k as f64 * core::f64::consts::FRAC_PI_3;
            *c = (a.cos(), a.sin());
        }
        out
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct HexTileData {
    q: Uniform<f64>,
    r: Uniform<f64>,
    scale: Uniform<f64>,
    x: Vec<f64>,
    y: Vec<f64>,
    sx: Shared<f64>,
    sy: Shared<f64>,
    /// Screen vertex radii along x and y, before the per-record scale.
    srx: f64,
    sry: f64,
}

impl HexTileData {
    fn hexagon(&self, glyph: &HexTile, i: usize) -> Option<SmallVec<[Point; 6]>> {
        let (x, y, s) = (self.sx[i], self.sy[i], *self.scale.get(i));
        if !(x.is_finite() && y.is_finite() && s.is_finite()) {
            return None;
        }
        let (rx, ry) = (self.srx * s, self.sry * s);
        // Screen y grows downward, so data-space counter-clockwise flips.
        Some(
            glyph
                .corners()
                .iter()
                .map(|(cx, cy)| Point::new(x + cx * rx, y - cy * ry))
                .collect(),
        )
    }

    fn bounds(&self, glyph: &HexTile, i: usize) -> Option<Rect> {
        let hex = self.hexagon(glyph, i)?;
        let first = *hex.first()?;
        Some(
            hex.iter()
                .fold(Rect::from_points(first, first), |r, p| r.union_pt(*p)),
        )
    }
}

impl GlyphImpl for HexTile {
    type Data = HexTileData;

    fn len(data: &HexTileData) -> usize {
        data.q.len()
    }

    fn set_data(
        &self,
        source: &dyn DataSource,
        base: Option<(&Self, &HexTileData)>,
    ) -> Result<HexTileData, SpecError> {
        if !(self.size.is_finite() && self.size > 0.0) {
            return Err(SpecError::InvalidValue {
                property: "size",
                value: self.size,
            });
        }
        let q = resolve(&self.q, "q", source, &f64::NAN, base.map(|(g, d)| (&g.q, &d.q)))?;
        let r = resolve(&self.r, "r", source, &f64::NAN, base.map(|(g, d)| (&g.r, &d.r)))?;
        let scale = resolve(
            &self.scale,
            "scale",
            source,
            &1.0,
            base.map(|(g, d)| (&g.scale, &d.scale)),
        )?;
        let (x, y) = q
            .iter()
            .zip(r.iter())
            .map(|(q, r)| self.center(*q, *r))
            .unzip();
        Ok(HexTileData {
            q,
            r,
            scale,
            x,
            y,
            ..HexTileData::default()
        })
    }

    fn index_data(&self, data: &HexTileData) -> SpatialIndex {
        let (rx, ry) = self.radii();
        let mut index = SpatialIndexBuilder::new(data.x.len());
        for (i, (x, y)) in data.x.iter().zip(&data.y).enumerate() {
            let s = data.scale.get(i).abs();
            index.add_rect(x - rx * s, y - ry * s, x + rx * s, y + ry * s);
        }
        index.finish()
    }

    fn map_data(
        &self,
        data: &mut HexTileData,
        mapper: &CoordinateMapper,
        base: Option<(&Self, &HexTileData)>,
    ) {
        let key = |g: &Self| (g.q.clone(), g.r.clone(), g.size, g.aspect_scale, g.orientation);
        let x_scale = mapper.x_scale(Units::Data);
        let y_scale = mapper.y_scale(Units::Data);
        data.sx = inherit_or(key(self), base.map(|(g, d)| (key(g), &d.sx)), || {
            x_scale.v_compute(&data.x)
        });
        data.sy = inherit_or(key(self), base.map(|(g, d)| (key(g), &d.sy)), || {
            y_scale.v_compute(&data.y)
        });
        let (rx, ry) = self.radii();
        data.srx = (x_scale.compute(rx) - x_scale.compute(0.0)).abs();
        data.sry = (y_scale.compute(ry) - y_scale.compute(0.0)).abs();
    }

    fn paint(&self, ctx: &mut dyn Context2d, data: &HexTileData, visuals: &Visuals, indices: &[usize]) {
        for &i in indices {
            let Some(hex) = data.hexagon(self, i) else {
                continue;
            };
            let mut path = BezPath::new();
            path.move_to(hex[0]);
            for p in &hex[1..] {
                path.line_to(*p);
            }
            path.close_path();
            ctx.set_record(i);
            visuals.paint_area(ctx, &path, i);
        }
    }

    fn hit_test(
        &self,
        data: &HexTileData,
        index: &SpatialIndex,
        mapper: &CoordinateMapper,
        _visuals: &Visuals,
        geometry: &Geometry,
    ) -> Option<Selection> {
        let units = (Units::Data, Units::Data);
        let found = candidates(index, mapper, units, geometry.bounds()?, (0.0, 0.0));
        let hits = match geometry {
            Geometry::Point(p) => Selection::from_indices(found.into_iter().filter(|&i| {
                data.hexagon(self, i)
                    .is_some_and(|hex| point_in_poly(*p, &hex))
            })),
            Geometry::Span { .. } => hit_boxes(|i| data.bounds(self, i), &found, geometry),
            Geometry::Rect(rect) => {
                let rect = rect.abs();
                Selection::from_indices(found.into_iter().filter(|&i| {
                    let c = Point::new(data.sx[i], data.sy[i]);
                    rect.contains(c)
                }))
            }
            Geometry::Poly(poly) => Selection::from_indices(
                found
                    .into_iter()
                    .filter(|&i| point_in_poly(Point::new(data.sx[i], data.sy[i]), poly)),
            ),
        };
        Some(hits)
    }

    fn screen<'a>(data: &'a HexTileData, field: &str) -> Option<&'a Shared<f64>> {
        match field {
            "sx" => Some(&data.sx),
            "sy" => Some(&data.sy),
            _ => None,
        }
    }

    fn screen_mut<'a>(data: &'a mut HexTileData, field: &str) -> Option<&'a mut Shared<f64>> {
        match field {
            "sx" => Some(&mut data.sx),
            "sy" => Some(&mut data.sy),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use vizir_core::ColumnDataSource;

    use super::*;
    use crate::scale::ScaleLinear;
    use crate::visuals::VisualProps;

    fn mapper() -> CoordinateMapper {
        CoordinateMapper::new(
            ScaleLinear::new((-10.0, 10.0), (0.0, 200.0)),
            ScaleLinear::new((-10.0, 10.0), (200.0, 0.0)),
        )
    }

    #[test]
    fn axial_coordinates_tile_without_overlap() {
        let glyph = HexTile::new(VectorSpec::field("q"), VectorSpec::field("r"));
        let src = ColumnDataSource::new()
            .with_column("q", vec![0.0, 1.0, 0.0])
            .unwrap()
            .with_column("r", vec![0.0, 0.0, 1.0])
            .unwrap();
        let mut data = glyph.set_data(&src, None).unwrap();
        glyph.map_data(&mut data, &mapper(), None);
        assert!((data.x[1] - SQRT3).abs() < 1e-12);
        assert!((data.y[2] + 1.5).abs() < 1e-12);
        // Neighbors sit one inradius apart on each side of the shared edge.
        assert!((data.sx[1] - data.sx[0] - 10.0 * SQRT3).abs() < 1e-9);

        let index = glyph.index_data(&data);
        let visuals = VisualProps::default().resolve(&src).unwrap();
        let hit = |x: f64, y: f64| {
            glyph
                .hit_test(&data, &index, &mapper(), &visuals, &Geometry::Point(Point::new(x, y)))
                .unwrap()
                .indices()
                .to_vec()
        };
        assert_eq!(hit(100.0, 100.0), [0]);
        assert_eq!(hit(100.0 + 10.0 * SQRT3, 100.0), [1]);
        // Just past the top vertex of tile 0.
        assert!(hit(100.0, 89.0).is_empty());
    }

    #[test]
    fn non_positive_sizes_are_rejected() {
        let src = ColumnDataSource::new().with_column("q", vec![0.0]).unwrap();
        let glyph = HexTile::new(VectorSpec::field("q"), 0.0).with_size(0.0);
        assert!(matches!(
            glyph.set_data(&src, None),
            Err(SpecError::InvalidValue { property: "size", .. })
        ));
    }

    #[test]
    fn flat_top_tiles_paint_six_sided_outlines() {
        let glyph = HexTile::new(0.0, 0.0).with_orientation(HexOrientation::FlatTop);
        let src = ColumnDataSource::new().with_column("v", vec![0.0]).unwrap();
        let mut data = glyph.set_data(&src, None).unwrap();
        glyph.map_data(&mut data, &mapper(), None);
        let hex = data.hexagon(&glyph, 0).unwrap();
        assert!((hex[0] - Point::new(110.0, 100.0)).hypot() < 1e-9);
        assert!((hex[3] - Point::new(90.0, 100.0)).hypot() < 1e-9);
        let bounds = data.bounds(&glyph, 0).unwrap();
        assert!((bounds.width() - 20.0).abs() < 1e-9);
        assert!((bounds.height() - 10.0 * SQRT3).abs() < 1e-9);
    }
}
