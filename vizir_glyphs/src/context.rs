// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The immediate-mode drawing surface glyphs paint into.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{BezPath, Circle, Line, Point, Rect, Shape, Stroke};
use peniko::Brush;

use crate::image::ImageData;

/// Horizontal text anchoring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextAlign {
    /// Text starts at the anchor.
    #[default]
    Left,
    /// Text is centered on the anchor.
    Center,
    /// Text ends at the anchor.
    Right,
}

/// Vertical text anchoring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextBaseline {
    /// The anchor is at the top of the text box.
    Top,
    /// The anchor is at the vertical center of the text box.
    Middle,
    /// The anchor is at the bottom of the text box.
    #[default]
    Bottom,
    /// The anchor is on the alphabetic baseline.
    Alphabetic,
}

/// Resolved text style for one record.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    /// Text paint.
    pub brush: Brush,
    /// Font family.
    pub font: String,
    /// Font size in pixels.
    pub font_size: f64,
    /// Horizontal anchoring.
    pub align: TextAlign,
    /// Vertical anchoring.
    pub baseline: TextBaseline,
    /// Rotation around the anchor, in radians.
    pub angle: f64,
}

/// Hatch pattern shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HatchPattern {
    /// A dot in the middle of each tile.
    Dot,
    /// A ring in the middle of each tile.
    Ring,
    /// A horizontal line through each tile.
    HorizontalLine,
    /// A vertical line through each tile.
    VerticalLine,
    /// Horizontal and vertical lines.
    Cross,
    /// A short horizontal dash.
    HorizontalDash,
    /// A short vertical dash.
    VerticalDash,
    /// Lines rising to the right.
    RightDiagonalLine,
    /// Lines rising to the left.
    LeftDiagonalLine,
    /// Both diagonals.
    DiagonalCross,
}

/// A resolved hatch: a pattern tile repeated over the painted shape.
#[derive(Clone, Debug, PartialEq)]
pub struct Hatch {
    /// The pattern shape.
    pub pattern: HatchPattern,
    /// Tile size in pixels.
    pub scale: f64,
    /// Line width of the pattern strokes.
    pub weight: f64,
    /// Pattern paint.
    pub brush: Brush,
}

impl Hatch {
    /// Returns the pattern geometry for one `scale x scale` tile at the origin.
    ///
    /// Dots are meant to be filled; everything else is meant to be stroked with `weight`.
    pub fn tile(&self) -> BezPath {
        let s = self.scale;
        let h = s / 2.0;
        let mut path = BezPath::new();
        let mut line = |a: (f64, f64), b: (f64, f64)| {
            path.extend(Line::new(a, b).path_elements(0.1));
        };
        match self.pattern {
            HatchPattern::Dot => {
                return Circle::new((h, h), self.weight.max(0.5)).to_path(0.1);
            }
            HatchPattern::Ring => {
                return Circle::new((h, h), s / 4.0).to_path(0.1);
            }
            HatchPattern::HorizontalLine => line((0.0, h), (s, h)),
            HatchPattern::VerticalLine => line((h, 0.0), (h, s)),
            HatchPattern::Cross => {
                line((0.0, h), (s, h));
                line((h, 0.0), (h, s));
            }
            HatchPattern::HorizontalDash => line((s / 4.0, h), (3.0 * s / 4.0, h)),
            HatchPattern::VerticalDash => line((h, s / 4.0), (h, 3.0 * s / 4.0)),
            HatchPattern::RightDiagonalLine => line((0.0, s), (s, 0.0)),
            HatchPattern::LeftDiagonalLine => line((0.0, 0.0), (s, s)),
            HatchPattern::DiagonalCross => {
                line((0.0, s), (s, 0.0));
                line((0.0, 0.0), (s, s));
            }
        }
        path
    }

    /// Returns `true` if the tile is filled rather than stroked.
    pub fn is_filled(&self) -> bool {
        self.pattern == HatchPattern::Dot
    }
}

/// A 2D drawing surface.
///
/// Glyph views call these methods in record order; within a record fills come before hatches
/// and hatches before strokes.
pub trait Context2d {
    /// Announces the record whose geometry the following calls draw.
    fn set_record(&mut self, index: usize) {
        let _ = index;
    }

    /// Fills a path.
    fn fill(&mut self, path: &BezPath, brush: &Brush);

    /// Strokes a path.
    fn stroke(&mut self, path: &BezPath, style: &Stroke, brush: &Brush);

    /// Fills a path with a repeated hatch tile.
    fn hatch(&mut self, path: &BezPath, hatch: &Hatch);

    /// Draws a single line of text anchored at `at`.
    fn text(&mut self, text: &str, at: Point, style: &TextStyle);

    /// Draws a decoded image into `rect`, rotated by `angle` around the rect's anchor corner.
    fn image(&mut self, image: &ImageData, rect: Rect, angle: f64, alpha: f64);
}

/// One recorded drawing call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCall {
    /// A [`Context2d::fill`] call.
    Fill {
        /// The record being drawn.
        record: Option<usize>,
        /// The filled path.
        path: BezPath,
        /// The fill paint.
        brush: Brush,
    },
    /// A [`Context2d::stroke`] call.
    Stroke {
        /// The record being drawn.
        record: Option<usize>,
        /// The stroked path.
        path: BezPath,
        /// The stroke width.
        width: f64,
        /// The stroke paint.
        brush: Brush,
    },
    /// A [`Context2d::hatch`] call.
    Hatch {
        /// The record being drawn.
        record: Option<usize>,
        /// The hatched path.
        path: BezPath,
        /// The hatch pattern.
        pattern: HatchPattern,
    },
    /// A [`Context2d::text`] call.
    Text {
        /// The record being drawn.
        record: Option<usize>,
        /// The text.
        text: String,
        /// The anchor point.
        at: Point,
    },
    /// A [`Context2d::image`] call.
    Image {
        /// The record being drawn.
        record: Option<usize>,
        /// The image handle.
        handle: u64,
        /// The destination rectangle.
        rect: Rect,
    },
}

impl DrawCall {
    /// The record this call belongs to.
    pub fn record(&self) -> Option<usize> {
        match self {
            Self::Fill { record, .. }
            | Self::Stroke { record, .. }
            | Self::Hatch { record, .. }
            | Self::Text { record, .. }
            | Self::Image { record, .. } => *record,
        }
    }

    /// The paint of fill and stroke calls.
    pub fn brush(&self) -> Option<&Brush> {
        match self {
            Self::Fill { brush, .. } | Self::Stroke { brush, .. } => Some(brush),
            _ => None,
        }
    }
}

/// A [`Context2d`] that records every call, for tests and debugging.
#[derive(Clone, Debug, Default)]
pub struct RecordingContext {
    current: Option<usize>,
    /// Calls in the order they were made.
    pub calls: Vec<DrawCall>,
}

impl RecordingContext {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records of consecutive calls, with repeats of the same record collapsed.
    pub fn records(&self) -> Vec<usize> {
        let mut out: Vec<usize> = Vec::new();
        for call in &self.calls {
            if let Some(r) = call.record()
                && out.last() != Some(&r)
            {
                out.push(r);
            }
        }
        out
    }

    /// Number of fill calls.
    pub fn fill_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DrawCall::Fill { .. }))
            .count()
    }

    /// Forgets all recorded calls.
    pub fn clear(&mut self) {
        self.calls.clear();
        self.current = None;
    }
}

impl Context2d for RecordingContext {
    fn set_record(&mut self, index: usize) {
        self.current = Some(index);
    }

    fn fill(&mut self, path: &BezPath, brush: &Brush) {
        self.calls.push(DrawCall::Fill {
            record: self.current,
            path: path.clone(),
            brush: brush.clone(),
        });
    }

    fn stroke(&mut self, path: &BezPath, style: &Stroke, brush: &Brush) {
        self.calls.push(DrawCall::Stroke {
            record: self.current,
            path: path.clone(),
            width: style.width,
            brush: brush.clone(),
        });
    }

    fn hatch(&mut self, path: &BezPath, hatch: &Hatch) {
        self.calls.push(DrawCall::Hatch {
            record: self.current,
            path: path.clone(),
            pattern: hatch.pattern,
        });
    }

    fn text(&mut self, text: &str, at: Point, _style: &TextStyle) {
        self.calls.push(DrawCall::Text {
            record: self.current,
            text: text.into(),
            at,
        });
    }

    fn image(&mut self, image: &ImageData, rect: Rect, _angle: f64, _alpha: f64) {
        self.calls.push(DrawCall::Image {
            record: self.current,
            handle: image.handle,
            rect,
        });
    }
}
