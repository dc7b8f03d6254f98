// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coordinate mapping from glyph coordinates to canvas pixels.

extern crate alloc;

use alloc::vec::Vec;

use kurbo::Rect;
use vizir_core::Uniform;

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;

use crate::scale::{Scale, ScaleLinear};

/// The coordinate system a glyph property is expressed in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Units {
    /// Data values, mapped through the plot's data scales.
    #[default]
    Data,
    /// Pixels relative to the plot frame's top-left corner.
    Screen,
    /// Absolute canvas pixels.
    Canvas,
}

/// Where a distance is measured from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// The distance spans half on each side of the point.
    #[default]
    Center,
    /// The distance starts at the point.
    Edge,
}

/// Composes the x and y scales of a plot frame.
///
/// Data scales target canvas pixels directly. Screen units are offset by the frame origin and
/// canvas units pass through unchanged, so every resolved scale produces canvas pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct CoordinateMapper {
    x: Scale,
    y: Scale,
    frame: Rect,
}

impl CoordinateMapper {
    /// Creates a mapper from two data scales that already target canvas pixels.
    ///
    /// The frame defaults to the extent spanned by the scales' target ranges.
    pub fn new(x: impl Into<Scale>, y: impl Into<Scale>) -> Self {
        let x = x.into();
        let y = y.into();
        let (x0, x1) = x.target_range();
        let (y0, y1) = y.target_range();
        Self {
            x,
            y,
            frame: Rect::new(x0, y0, x1, y1).abs(),
        }
    }

    /// Places the plot in `frame`, retargeting the data scales onto it.
    ///
    /// The x scale spans left to right and the y scale bottom to top.
    pub fn with_frame(mut self, frame: Rect) -> Self {
        let frame = frame.abs();
        self.x = self.x.with_target((frame.x0, frame.x1));
        self.y = self.y.with_target((frame.y1, frame.y0));
        self.frame = frame;
        self
    }

    /// The plot frame in canvas pixels.
    pub fn frame(&self) -> Rect {
        self.frame
    }

    /// The x scale appropriate for coordinates in `units`.
    pub fn x_scale(&self, units: Units) -> Scale {
        match units {
            Units::Data => self.x.clone(),
            Units::Screen => offset_identity(self.frame.x0),
            Units::Canvas => offset_identity(0.0),
        }
    }

    /// The y scale appropriate for coordinates in `units`.
    pub fn y_scale(&self, units: Units) -> Scale {
        match units {
            Units::Data => self.y.clone(),
            Units::Screen => offset_identity(self.frame.y0),
            Units::Canvas => offset_identity(0.0),
        }
    }

    /// Maps paired coordinates to canvas pixels.
    pub fn map_to_screen(
        &self,
        xs: &[f64],
        x_units: Units,
        ys: &[f64],
        y_units: Units,
    ) -> (Vec<f64>, Vec<f64>) {
        (
            self.x_scale(x_units).v_compute(xs),
            self.y_scale(y_units).v_compute(ys),
        )
    }

    /// Maps a canvas point back to data space.
    pub fn invert(&self, sx: f64, sy: f64) -> (f64, f64) {
        (self.x.invert(sx), self.y.invert(sy))
    }
}

fn offset_identity(offset: f64) -> Scale {
    Scale::Linear(ScaleLinear::new((0.0, 1.0), (offset, offset + 1.0)))
}

/// Maps per-record distances to absolute pixel lengths.
///
/// With [`Anchor::Center`] the distance spans `pt - span / 2 ..= pt + span / 2`, otherwise
/// `pt ..= pt + span`. With `dilate` each length is rounded up to a whole pixel.
pub fn sdist(
    scale: &Scale,
    pts: &Uniform<f64>,
    spans: &Uniform<f64>,
    anchor: Anchor,
    dilate: bool,
) -> Vec<f64> {
    let n = pts.len();
    (0..n)
        .map(|i| {
            let pt = *pts.get(i);
            let span = *spans.get(i);
            let (a, b) = match anchor {
                Anchor::Center => (pt - span / 2.0, pt + span / 2.0),
                Anchor::Edge => (pt, pt + span),
            };
            let d = (scale.compute(b) - scale.compute(a)).abs();
            if dilate { d.ceil() } else { d }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;

    fn mapper() -> CoordinateMapper {
        CoordinateMapper::new(
            ScaleLinear::new((0.0, 10.0), (0.0, 1.0)),
            ScaleLinear::new((0.0, 10.0), (0.0, 1.0)),
        )
        .with_frame(Rect::new(50.0, 20.0, 150.0, 120.0))
    }

    #[test]
    fn data_units_use_the_frame() {
        let m = mapper();
        let (sx, sy) = m.map_to_screen(&[0.0, 10.0], Units::Data, &[0.0, 10.0], Units::Data);
        assert_eq!(sx, [50.0, 150.0]);
        assert_eq!(sy, [120.0, 20.0]);
    }

    #[test]
    fn screen_units_are_frame_relative() {
        let m = mapper();
        assert_eq!(m.x_scale(Units::Screen).compute(5.0), 55.0);
        assert_eq!(m.y_scale(Units::Screen).compute(5.0), 25.0);
        assert_eq!(m.x_scale(Units::Canvas).compute(5.0), 5.0);
    }

    #[test]
    fn sdist_supports_anchors_and_dilation() {
        let m = mapper();
        let x = m.x_scale(Units::Data);
        let pts = Uniform::vector(vec![1.0, 5.0]);
        let spans = Uniform::scalar(1.05, 2);
        let centered = sdist(&x, &pts, &spans, Anchor::Center, false);
        assert!((centered[0] - 10.5).abs() < 1e-9);
        let dilated = sdist(&x, &pts, &spans, Anchor::Edge, true);
        assert_eq!(dilated, [11.0, 11.0]);
    }
}
