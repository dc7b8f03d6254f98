// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Images fetched from URLs.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{Point, Rect};
use vizir_core::{DataSource, Shared, Uniform};

use crate::context::Context2d;
use crate::geometry::Dimension;
use crate::image::{ImageLoader, RetryPolicy};
use crate::mapper::{Anchor, CoordinateMapper};
use crate::props::{Spatial, SpecError, VectorSpec};
use crate::spatial::{SpatialIndex, SpatialIndexBuilder};
use crate::visuals::Visuals;

use super::markers::{resolve_distance, screen_lengths};
use super::{GlyphImpl, inherit_or, map_coord, resolve, resolve_spatial};

/// Which point of the image sits at `(x, y)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ImageAnchor {
    /// Top left corner.
    #[default]
    TopLeft,
    /// Middle of the top edge.
    TopCenter,
    /// Top right corner.
    TopRight,
    /// Middle of the left edge.
    CenterLeft,
    /// Center.
    Center,
    /// Middle of the right edge.
    CenterRight,
    /// Bottom left corner.
    BottomLeft,
    /// Middle of the bottom edge.
    BottomCenter,
    /// Bottom right corner.
    BottomRight,
}

impl ImageAnchor {
    /// Fractions of the width and height between the image's top left corner and the anchor.
    fn fractions(self) -> (f64, f64) {
        match self {
            Self::TopLeft => (0.0, 0.0),
            Self::TopCenter => (0.5, 0.0),
            Self::TopRight => (1.0, 0.0),
            Self::CenterLeft => (0.0, 0.5),
            Self::Center => (0.5, 0.5),
            Self::CenterRight => (1.0, 0.5),
            Self::BottomLeft => (0.0, 1.0),
            Self::BottomCenter => (0.5, 1.0),
            Self::BottomRight => (1.0, 1.0),
        }
    }
}

/// Images loaded from `url` and drawn at `(x, y)`.
///
/// Without `w` or `h` the image is drawn at its natural pixel size along that axis. Loads are
/// performed by the host; see [`crate::ImageLoader`].
#[derive(Clone, Debug, PartialEq)]
pub struct ImageUrl {
    /// Image location.
    pub url: VectorSpec<String>,
    /// Anchor x.
    pub x: Spatial,
    /// Anchor y.
    pub y: Spatial,
    /// Drawn width.
    pub w: Option<Spatial>,
    /// Drawn height.
    pub h: Option<Spatial>,
    /// Rotation in radians, counter-clockwise around the anchor.
    pub angle: VectorSpec<f64>,
    /// Opacity.
    pub global_alpha: VectorSpec<f64>,
    /// Which point of the image sits at the anchor.
    pub anchor: ImageAnchor,
    /// Retries after a failed attempt.
    pub retry_attempts: u32,
    /// Per-attempt timeout in milliseconds; zero for no limit.
    pub retry_timeout_ms: u64,
    /// Delay before each retry, in milliseconds.
    pub retry_delay_ms: u64,
}

impl ImageUrl {
    /// Creates an image glyph without retries.
    pub fn new(
        url: impl Into<VectorSpec<String>>,
        x: impl Into<Spatial>,
        y: impl Into<Spatial>,
    ) -> Self {
        Self {
            url: url.into(),
            x: x.into(),
            y: y.into(),
            w: None,
            h: None,
            angle: VectorSpec::Value(0.0),
            global_alpha: VectorSpec::Value(1.0),
            anchor: ImageAnchor::TopLeft,
            retry_attempts: 0,
            retry_timeout_ms: 0,
            retry_delay_ms: 0,
        }
    }

    /// Sets the drawn size.
    pub fn with_size(mut self, w: impl Into<Spatial>, h: impl Into<Spatial>) -> Self {
        self.w = Some(w.into());
        self.h = Some(h.into());
        self
    }

    /// Sets the anchor.
    pub fn with_anchor(mut self, anchor: ImageAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Sets the rotation.
    pub fn with_angle(mut self, angle: impl Into<VectorSpec<f64>>) -> Self {
        self.angle = angle.into();
        self
    }

    /// Sets the opacity.
    pub fn with_global_alpha(mut self, alpha: impl Into<VectorSpec<f64>>) -> Self {
        self.global_alpha = alpha.into();
        self
    }

    /// Sets the retry budget and timing.
    pub fn with_retry(mut self, attempts: u32, timeout_ms: u64, delay_ms: u64) -> Self {
        self.retry_attempts = attempts;
        self.retry_timeout_ms = timeout_ms;
        self.retry_delay_ms = delay_ms;
        self
    }

    fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.retry_attempts,
            delay_ms: self.retry_delay_ms,
            timeout_ms: self.retry_timeout_ms,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct ImageUrlData {
    url: Uniform<String>,
    x: Uniform<f64>,
    y: Uniform<f64>,
    w: Uniform<f64>,
    h: Uniform<f64>,
    angle: Uniform<f64>,
    alpha: Uniform<f64>,
    sx: Shared<f64>,
    sy: Shared<f64>,
    sw: Shared<f64>,
    sh: Shared<f64>,
    loader: ImageLoader,
}

impl GlyphImpl for ImageUrl {
    type Data = ImageUrlData;

    fn len(data: &ImageUrlData) -> usize {
        data.x.len()
    }

    /// Resolves the properties and starts loading. Decorations whose URLs match the base glyph
    /// share its load state instead of fetching again.
    fn set_data(
        &self,
        source: &dyn DataSource,
        base: Option<(&Self, &ImageUrlData)>,
    ) -> Result<ImageUrlData, SpecError> {
        let n = source.len();
        let extent = |spec: Option<&Spatial>,
                      property: &'static str,
                      base: Option<(Option<&Spatial>, &Uniform<f64>)>|
         -> Result<Uniform<f64>, SpecError> {
            match spec {
                Some(spec) => resolve_distance(
                    spec,
                    property,
                    source,
                    base.and_then(|(s, v)| s.map(|s| (s, v))),
                ),
                None => Ok(Uniform::scalar(f64::NAN, n)),
            }
        };
        let url = resolve(
            &self.url,
            "url",
            source,
            &String::new(),
            base.map(|(g, d)| (&g.url, &d.url)),
        )?;
        let mut loader = ImageLoader::new(self.policy());
        match base {
            Some((g, d)) if g.url == self.url => loader.mirror(&d.loader),
            _ => loader.load(url.iter().cloned().collect()),
        }
        Ok(ImageUrlData {
            x: resolve_spatial(&self.x, "x", source, base.map(|(g, d)| (&g.x, &d.x)))?,
            y: resolve_spatial(&self.y, "y", source, base.map(|(g, d)| (&g.y, &d.y)))?,
            w: extent(self.w.as_ref(), "w", base.map(|(g, d)| (g.w.as_ref(), &d.w)))?,
            h: extent(self.h.as_ref(), "h", base.map(|(g, d)| (g.h.as_ref(), &d.h)))?,
            angle: resolve(
                &self.angle,
                "angle",
                source,
                &0.0,
                base.map(|(g, d)| (&g.angle, &d.angle)),
            )?,
            alpha: resolve(
                &self.global_alpha,
                "global_alpha",
                source,
                &1.0,
                base.map(|(g, d)| (&g.global_alpha, &d.alpha)),
            )?,
            url,
            loader,
            ..ImageUrlData::default()
        })
    }

    /// Images are sized on screen once loaded, so only their anchors are indexed.
    fn index_data(&self, data: &ImageUrlData) -> SpatialIndex {
        let mut index = SpatialIndexBuilder::new(data.x.len());
        for (x, y) in data.x.iter().zip(data.y.iter()) {
            index.add_point(*x, *y);
        }
        index.finish()
    }

    fn map_data(
        &self,
        data: &mut ImageUrlData,
        mapper: &CoordinateMapper,
        base: Option<(&Self, &ImageUrlData)>,
    ) {
        data.sx = inherit_or(&self.x, base.map(|(g, d)| (&g.x, &d.sx)), || {
            map_coord(mapper, Dimension::X, &self.x, &data.x)
        });
        data.sy = inherit_or(&self.y, base.map(|(g, d)| (&g.y, &d.sy)), || {
            map_coord(mapper, Dimension::Y, &self.y, &data.y)
        });
        let n = data.x.len();
        let extent = |dim: Dimension,
                      pts: &Uniform<f64>,
                      spec: Option<&Spatial>,
                      raw: &Uniform<f64>|
         -> Vec<f64> {
            match spec {
                Some(spec) => screen_lengths(mapper, dim, pts, spec, raw, Anchor::Edge),
                None => alloc::vec![f64::NAN; n],
            }
        };
        data.sw = inherit_or(
            (&self.x, self.w.as_ref()),
            base.map(|(g, d)| ((&g.x, g.w.as_ref()), &d.sw)),
            || extent(Dimension::X, &data.x, self.w.as_ref(), &data.w),
        );
        data.sh = inherit_or(
            (&self.y, self.h.as_ref()),
            base.map(|(g, d)| ((&g.y, g.h.as_ref()), &d.sh)),
            || extent(Dimension::Y, &data.y, self.h.as_ref(), &data.h),
        );
    }

    /// Draws loaded images; pending and failed records are skipped.
    fn paint(
        &self,
        ctx: &mut dyn Context2d,
        data: &ImageUrlData,
        _visuals: &Visuals,
        indices: &[usize],
    ) {
        let (fx, fy) = self.anchor.fractions();
        for &i in indices {
            let Some(image) = data.loader.image(i) else {
                continue;
            };
            let (x, y) = (data.sx[i], data.sy[i]);
            let (angle, alpha) = (*data.angle.get(i), *data.alpha.get(i));
            if !(x.is_finite() && y.is_finite() && angle.is_finite()) {
                continue;
            }
            let natural = |v: f64, n: u32| if v.is_finite() { v } else { f64::from(n) };
            let w = natural(data.sw[i], image.width);
            let h = natural(data.sh[i], image.height);
            let origin = Point::new(x - fx * w, y - fy * h);
            ctx.set_record(i);
            ctx.image(&image, Rect::from_origin_size(origin, (w, h)), angle, alpha);
        }
    }

    fn screen<'a>(data: &'a ImageUrlData, field: &str) -> Option<&'a Shared<f64>> {
        match field {
            "sx" => Some(&data.sx),
            "sy" => Some(&data.sy),
            "sw" => Some(&data.sw),
            "sh" => Some(&data.sh),
            _ => None,
        }
    }

    fn screen_mut<'a>(data: &'a mut ImageUrlData, field: &str) -> Option<&'a mut Shared<f64>> {
        match field {
            "sx" => Some(&mut data.sx),
            "sy" => Some(&mut data.sy),
            "sw" => Some(&mut data.sw),
            "sh" => Some(&mut data.sh),
            _ => None,
        }
    }

    fn images(data: &ImageUrlData) -> Option<&ImageLoader> {
        Some(&data.loader)
    }

    fn images_mut(data: &mut ImageUrlData) -> Option<&mut ImageLoader> {
        Some(&mut data.loader)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use vizir_core::ColumnDataSource;

    use super::*;
    use crate::context::{DrawCall, RecordingContext};
    use crate::image::{ImageData, ImageLoadError, ImageStatus};
    use crate::scale::ScaleLinear;
    use crate::visuals::VisualProps;

    fn mapper() -> CoordinateMapper {
        CoordinateMapper::new(
            ScaleLinear::new((0.0, 10.0), (0.0, 100.0)),
            ScaleLinear::new((0.0, 10.0), (100.0, 0.0)),
        )
    }

    #[test]
    fn images_draw_once_loaded_at_their_anchor() {
        let glyph = ImageUrl::new(VectorSpec::field("url"), "x", 5.0)
            .with_anchor(ImageAnchor::Center);
        let src = ColumnDataSource::new()
            .with_column("url", vec!["a.png", "b.png"])
            .unwrap()
            .with_column("x", vec![2.0, 6.0])
            .unwrap();
        let mut data = glyph.set_data(&src, None).unwrap();
        glyph.map_data(&mut data, &mapper(), None);
        let requests = data.loader.take_requests();
        assert_eq!(requests.len(), 2);

        let image = ImageData {
            width: 10,
            height: 6,
            handle: 7,
        };
        let status = data.loader.resolve(requests[1].token, Ok(image));
        assert_eq!(status, Some(ImageStatus::Loaded(image)));

        let visuals = VisualProps::default().resolve(&src).unwrap();
        let mut ctx = RecordingContext::new();
        glyph.paint(&mut ctx, &data, &visuals, &[0, 1]);
        assert_eq!(
            ctx.calls,
            [DrawCall::Image {
                record: Some(1),
                handle: 7,
                rect: Rect::new(55.0, 47.0, 65.0, 53.0),
            }]
        );
    }

    #[test]
    fn decorations_share_the_base_load_state() {
        let glyph = ImageUrl::new(VectorSpec::field("url"), 0.0, 0.0).with_retry(1, 500, 0);
        let src = ColumnDataSource::new()
            .with_column("url", vec!["a.png"])
            .unwrap();
        let mut base = glyph.set_data(&src, None).unwrap();
        let token = base.loader.take_requests()[0].token;
        base.loader
            .resolve(token, Err(ImageLoadError::Timeout))
            .unwrap();
        let retry = base.loader.take_requests();
        assert_eq!((retry[0].attempt, retry[0].timeout_ms), (1, 500));

        let mut decoration = glyph.set_data(&src, Some((&glyph, &base))).unwrap();
        assert!(decoration.loader.take_requests().is_empty());
        assert_eq!(decoration.loader.generation(), base.loader.generation());
        assert!(!decoration.loader.has_finished());
    }
}
