// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rotatable ellipses.

use kurbo::{Ellipse as KurboEllipse, Shape};
use vizir_core::{DataSource, Selection, Shared};

use crate::context::Context2d;
use crate::geometry::Geometry;
use crate::mapper::CoordinateMapper;
use crate::props::{Spatial, SpecError, VectorSpec};
use crate::spatial::SpatialIndex;
use crate::visuals::Visuals;

use super::GlyphImpl;
use super::centered::{self, Centered, CenteredData, CenteredProps};

/// Ellipses centered on `(x, y)` with axes `width` and `height`, rotated counter-clockwise by
/// `angle`.
#[derive(Clone, Debug, PartialEq)]
pub struct Ellipse {
    /// Center x.
    pub x: Spatial,
    /// Center y.
    pub y: Spatial,
    /// Extent along the unrotated x axis.
    pub width: Spatial,
    /// Extent along the unrotated y axis.
    pub height: Spatial,
    /// Rotation in radians.
    pub angle: VectorSpec<f64>,
}

impl Ellipse {
    /// Creates an ellipse glyph.
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
        }
    }

    /// Sets the rotation.
    pub fn with_angle(mut self, angle: impl Into<VectorSpec<f64>>) -> Self {
        self.angle = angle.into();
        self
    }
}

impl Centered for Ellipse {
    fn props(&self) -> CenteredProps<'_> {
        CenteredProps {
            x: &self.x,
            y: &self.y,
            width: &self.width,
            height: &self.height,
            angle: &self.angle,
            dilate: false,
        }
    }
}

impl GlyphImpl for Ellipse {
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
            let path = KurboEllipse::new(c, half, -angle).to_path(0.1);
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
            if half.x <= 0.0 || half.y <= 0.0 {
                return false;
            }
            let (u, v) = (p.x / half.x, p.y / half.y);
            u * u + v * v <= 1.0
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
    use crate::scale::ScaleLinear;
    use crate::visuals::VisualProps;

    #[test]
    fn ellipses_hit_inside_their_outline_only() {
        let mapper = CoordinateMapper::new(
            ScaleLinear::new((0.0, 10.0), (0.0, 100.0)),
            ScaleLinear::new((0.0, 10.0), (100.0, 0.0)),
        );
        let glyph = Ellipse::new("x", 5.0, 4.0, 2.0);
        let src = ColumnDataSource::new()
            .with_column("x", vec![5.0, f64::NAN])
            .unwrap();
        let mut data = glyph.set_data(&src, None).unwrap();
        glyph.map_data(&mut data, &mapper, None);
        let index = glyph.index_data(&data);
        let visuals = VisualProps::default().resolve(&src).unwrap();
        let hit = |p: Point| {
            glyph
                .hit_test(&data, &index, &mapper, &visuals, &Geometry::Point(p))
                .unwrap()
        };
        assert_eq!(hit(Point::new(68.0, 50.0)).indices(), [0]);
        assert!(hit(Point::new(50.0, 62.0)).is_empty());
        // Inside the bounding box but outside the curve.
        assert!(hit(Point::new(68.0, 58.0)).is_empty());
    }
}
