// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyph rendering and coordinate mapping for `vizir_core` data sources.
//!
//! This crate turns columns of a [`vizir_core::DataSource`] into pixels:
//! - **Scales** ([`Scale`]) map data values into screen coordinates, and a
//!   [`CoordinateMapper`] pairs an x and y scale with the canvas frame.
//! - **Glyphs** ([`Glyph`]) describe how a record is drawn: markers, boxes, wedges,
//!   lines, text and images. Each one is resolved from the source, mapped through the
//!   scales, and painted into a [`Context2d`].
//! - A [`GlyphView`] holds one glyph's per-record state and a [`SpatialIndex`] over its
//!   data-space bounds for hit testing and viewport culling.
//! - A [`GlyphRenderer`] owns the base view plus selection, hover and muted decorations,
//!   and decides which records each one paints.
//! - When the scales are affine, marker glyphs can be handed to a [`GpuDevice`] as
//!   instanced draws through [`WebGlGlyph`], which only re-uploads buffers whose inputs
//!   changed.
//!
//! Image glyphs load asynchronously: the host drains requests with
//! [`GlyphRenderer::take_image_requests`] and feeds results back with
//! [`GlyphRenderer::resolve_image`].
//!
//! ```
//! use vizir_core::ColumnDataSource;
//! use vizir_glyphs::{
//!     Circle, CoordinateMapper, GlyphRenderer, RecordingContext, Scale, ScaleLinear,
//!     VisualProps,
//! };
//!
//! let mut source = ColumnDataSource::new();
//! source.set_column("x", vec![0.0, 1.0, 2.0]).unwrap();
//! source.set_column("y", vec![0.0, 1.0, 4.0]).unwrap();
//!
//! let mapper = CoordinateMapper::new(
//!     Scale::Linear(ScaleLinear::new((0.0, 2.0), (0.0, 200.0))),
//!     Scale::Linear(ScaleLinear::new((0.0, 4.0), (200.0, 0.0))),
//! );
//!
//! let mut renderer = GlyphRenderer::new(Circle::new("x", "y", 5.0), VisualProps::default());
//! renderer.update(&source, &mapper).unwrap();
//!
//! let mut ctx = RecordingContext::new();
//! renderer.paint(&mut ctx);
//! assert_eq!(ctx.records(), vec![0, 1, 2]);
//! ```

#![no_std]

extern crate alloc;

mod context;
#[cfg(not(feature = "std"))]
mod float;
mod geometry;
mod glyphs;
mod image;
mod mapper;
mod measure;
mod props;
mod range;
mod renderer;
#[cfg(test)]
mod renderer_tests;
mod scale;
mod spatial;
mod view;
mod visuals;
mod webgl;

pub use context::{
    Context2d, DrawCall, Hatch, HatchPattern, RecordingContext, TextAlign, TextBaseline,
    TextStyle,
};
pub use geometry::{Dimension, Geometry, dist_to_segment, dist_to_segment_squared, point_in_poly};
pub use glyphs::{
    AnnularWedge, Annulus, Bezier, Block, BorderRadius, Circle, Direction, Ellipse, Glyph, HBar,
    HexOrientation, HexTile, ImageAnchor, ImageUrl, LineGlyph, MarkerType, MultiLine, Patches,
    Quad, Quadratic, RadiusDimension, RectGlyph, Scatter, Segment, Text, VBar, Wedge,
};
pub use image::{
    ImageData, ImageLoadError, ImageLoader, ImageRequest, ImageStatus, LoadToken, RetryPolicy,
};
pub use mapper::{Anchor, CoordinateMapper, Units, sdist};
pub use measure::{HeuristicTextMeasurer, TextMeasurer};
pub use props::{ColumnValue, Spatial, SpecError, VectorSpec};
pub use range::{Factor, FactorRange, Range1d};
pub use renderer::{
    AUTO_FADE, DECIMATED_ALPHA, Decoration, DecorationSpec, GlyphRenderer, RendererOptions,
};
pub use scale::{Scale, ScaleCategorical, ScaleLinear, ScaleLog};
pub use spatial::{Indices as IndexHits, SpatialIndex, SpatialIndexBuilder};
pub use view::{GlyphState, GlyphView};
pub use visuals::{
    FillProps, FillVisuals, HatchProps, HatchVisuals, LineProps, LineVisuals, TextProps,
    TextVisuals, VisualProps, Visuals,
};
pub use webgl::{
    AFFINE_TOLERANCE, BufferId, BufferKind, GpuDevice, GpuHandle, InstancePosition,
    InstanceStyle, MarkerBuffers, MarkerDraw, RecordingDevice, Upload, WebGlGlyph, WebGlOptions,
    affine_transform, is_affine,
};
