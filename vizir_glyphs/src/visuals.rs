// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line, fill, hatch and text styles.
//!
//! `*Props` types are the authored configuration (scalars or fields). Resolving them against a
//! data source yields `*Visuals`, which answer per-record brushes and strokes at paint time.

extern crate alloc;

use alloc::string::String;

use kurbo::{BezPath, Cap, Join, Stroke};
use peniko::color::palette::css;
use peniko::{Brush, Color};
use smallvec::SmallVec;
use vizir_core::{DataSource, Uniform};

use crate::context::{Context2d, Hatch, HatchPattern, TextAlign, TextBaseline, TextStyle};
use crate::props::{SpecError, VectorSpec};

fn brush_for(color: Option<Color>, alpha: f64, alpha_scale: f64) -> Option<Brush> {
    let color = color?;
    let alpha = (alpha * alpha_scale).clamp(0.0, 1.0);
    if alpha.is_nan() || alpha <= 0.0 {
        return None;
    }
    #[allow(
        clippy::cast_possible_truncation,
        reason = "alpha is clamped to 0..=1, f32 precision is enough for color"
    )]
    let alpha = alpha as f32;
    Some(Brush::Solid(color.multiply_alpha(alpha)))
}

fn is_positive(v: f64) -> bool {
    v > 0.0
}

fn scalar_is_off(color: &Uniform<Option<Color>>, alpha: &Uniform<f64>, alpha_scale: f64) -> bool {
    matches!(color.as_scalar(), Some(None))
        || alpha.as_scalar().is_some_and(|a| !is_positive(*a))
        || !is_positive(alpha_scale)
}

/// Authored stroke configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct LineProps {
    /// Stroke color; `None` disables the stroke.
    pub color: VectorSpec<Option<Color>>,
    /// Stroke opacity.
    pub alpha: VectorSpec<f64>,
    /// Stroke width in pixels.
    pub width: VectorSpec<f64>,
    /// Join style.
    pub join: Join,
    /// Cap style.
    pub cap: Cap,
    /// Dash pattern; empty for solid lines.
    pub dash: SmallVec<[f64; 4]>,
    /// Offset into the dash pattern.
    pub dash_offset: f64,
    /// Multiplier applied on top of `alpha`.
    pub alpha_scale: f64,
}

impl Default for LineProps {
    fn default() -> Self {
        Self {
            color: VectorSpec::Value(Some(css::BLACK)),
            alpha: VectorSpec::Value(1.0),
            width: VectorSpec::Value(1.0),
            join: Join::Bevel,
            cap: Cap::Butt,
            dash: SmallVec::new(),
            dash_offset: 0.0,
            alpha_scale: 1.0,
        }
    }
}

impl LineProps {
    /// A stroke that never paints.
    pub fn none() -> Self {
        Self {
            color: VectorSpec::Value(None),
            ..Self::default()
        }
    }

    /// Sets a constant stroke color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = VectorSpec::Value(Some(color));
        self
    }

    /// Reads stroke colors from a column.
    pub fn with_color_field(mut self, field: impl Into<String>) -> Self {
        self.color = VectorSpec::field(field);
        self
    }

    /// Sets the stroke opacity.
    pub fn with_alpha(mut self, alpha: impl Into<VectorSpec<f64>>) -> Self {
        self.alpha = alpha.into();
        self
    }

    /// Sets the stroke width.
    pub fn with_width(mut self, width: impl Into<VectorSpec<f64>>) -> Self {
        self.width = width.into();
        self
    }

    /// Sets the join style.
    pub fn with_join(mut self, join: Join) -> Self {
        self.join = join;
        self
    }

    /// Sets the cap style.
    pub fn with_cap(mut self, cap: Cap) -> Self {
        self.cap = cap;
        self
    }

    /// Sets a dash pattern.
    pub fn with_dash(mut self, dash: impl IntoIterator<Item = f64>, offset: f64) -> Self {
        self.dash = dash.into_iter().collect();
        self.dash_offset = offset;
        self
    }

    /// Resolves per-record values.
    pub fn resolve(&self, source: &dyn DataSource) -> Result<LineVisuals, SpecError> {
        Ok(LineVisuals {
            color: self.color.resolve("line_color", source, &None)?,
            alpha: self.alpha.resolve("line_alpha", source, &1.0)?,
            width: self.width.resolve_non_negative("line_width", source, 1.0)?,
            join: self.join,
            cap: self.cap,
            dash: self.dash.clone(),
            dash_offset: self.dash_offset,
            alpha_scale: self.alpha_scale,
        })
    }
}

/// Resolved stroke style.
#[derive(Clone, Debug)]
pub struct LineVisuals {
    color: Uniform<Option<Color>>,
    alpha: Uniform<f64>,
    width: Uniform<f64>,
    join: Join,
    cap: Cap,
    dash: SmallVec<[f64; 4]>,
    dash_offset: f64,
    alpha_scale: f64,
}

impl LineVisuals {
    /// Returns `false` if no record can ever paint a stroke.
    pub fn doit(&self) -> bool {
        !(scalar_is_off(&self.color, &self.alpha, self.alpha_scale)
            || self.width.as_scalar().is_some_and(|w| !is_positive(*w)))
    }

    /// Stroke paint for record `i`, or `None` if the record has no visible stroke.
    pub fn brush(&self, i: usize) -> Option<Brush> {
        if !is_positive(*self.width.get(i)) {
            return None;
        }
        brush_for(*self.color.get(i), *self.alpha.get(i), self.alpha_scale)
    }

    /// Stroke geometry for record `i`.
    pub fn stroke(&self, i: usize) -> Stroke {
        let mut stroke = Stroke::new(*self.width.get(i))
            .with_join(self.join)
            .with_caps(self.cap);
        if !self.dash.is_empty() {
            stroke = stroke.with_dashes(self.dash_offset, self.dash.iter().copied());
        }
        stroke
    }

    /// Stroke width for record `i`.
    pub fn width(&self, i: usize) -> f64 {
        *self.width.get(i)
    }

    /// Per-record colors.
    pub fn colors(&self) -> &Uniform<Option<Color>> {
        &self.color
    }

    /// Dash pattern.
    pub fn dash(&self) -> &[f64] {
        &self.dash
    }

    /// Strokes `path` with record `i`'s style.
    pub fn apply(&self, ctx: &mut dyn Context2d, path: &BezPath, i: usize) {
        if let Some(brush) = self.brush(i) {
            ctx.stroke(path, &self.stroke(i), &brush);
        }
    }
}

/// Authored fill configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct FillProps {
    /// Fill color; `None` disables the fill.
    pub color: VectorSpec<Option<Color>>,
    /// Fill opacity.
    pub alpha: VectorSpec<f64>,
    /// Multiplier applied on top of `alpha`.
    pub alpha_scale: f64,
}

impl Default for FillProps {
    fn default() -> Self {
        Self {
            color: VectorSpec::Value(Some(css::GRAY)),
            alpha: VectorSpec::Value(1.0),
            alpha_scale: 1.0,
        }
    }
}

impl FillProps {
    /// A fill that never paints.
    pub fn none() -> Self {
        Self {
            color: VectorSpec::Value(None),
            ..Self::default()
        }
    }

    /// Sets a constant fill color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = VectorSpec::Value(Some(color));
        self
    }

    /// Reads fill colors from a column.
    pub fn with_color_field(mut self, field: impl Into<String>) -> Self {
        self.color = VectorSpec::field(field);
        self
    }

    /// Sets the fill opacity.
    pub fn with_alpha(mut self, alpha: impl Into<VectorSpec<f64>>) -> Self {
        self.alpha = alpha.into();
        self
    }

    /// Resolves per-record values.
    pub fn resolve(&self, source: &dyn DataSource) -> Result<FillVisuals, SpecError> {
        Ok(FillVisuals {
            color: self.color.resolve("fill_color", source, &None)?,
            alpha: self.alpha.resolve("fill_alpha", source, &1.0)?,
            alpha_scale: self.alpha_scale,
        })
    }
}

/// Resolved fill style.
#[derive(Clone, Debug)]
pub struct FillVisuals {
    color: Uniform<Option<Color>>,
    alpha: Uniform<f64>,
    alpha_scale: f64,
}

impl FillVisuals {
    /// Returns `false` if no record can ever paint a fill.
    pub fn doit(&self) -> bool {
        !scalar_is_off(&self.color, &self.alpha, self.alpha_scale)
    }

    /// Fill paint for record `i`, or `None` if the record has no visible fill.
    pub fn brush(&self, i: usize) -> Option<Brush> {
        brush_for(*self.color.get(i), *self.alpha.get(i), self.alpha_scale)
    }

    /// Per-record colors.
    pub fn colors(&self) -> &Uniform<Option<Color>> {
        &self.color
    }

    /// Fills `path` with record `i`'s paint.
    pub fn apply(&self, ctx: &mut dyn Context2d, path: &BezPath, i: usize) {
        if let Some(brush) = self.brush(i) {
            ctx.fill(path, &brush);
        }
    }
}

/// Authored hatch configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct HatchProps {
    /// Pattern shape; `None` disables hatching.
    pub pattern: Option<HatchPattern>,
    /// Tile size in pixels.
    pub scale: f64,
    /// Pattern line width.
    pub weight: f64,
    /// Pattern color.
    pub color: VectorSpec<Option<Color>>,
    /// Pattern opacity.
    pub alpha: VectorSpec<f64>,
    /// Multiplier applied on top of `alpha`.
    pub alpha_scale: f64,
}

impl Default for HatchProps {
    fn default() -> Self {
        Self {
            pattern: None,
            scale: 12.0,
            weight: 1.0,
            color: VectorSpec::Value(Some(css::BLACK)),
            alpha: VectorSpec::Value(1.0),
            alpha_scale: 1.0,
        }
    }
}

impl HatchProps {
    /// A hatch with the given pattern and default styling.
    pub fn new(pattern: HatchPattern) -> Self {
        Self {
            pattern: Some(pattern),
            ..Self::default()
        }
    }

    /// Sets the tile size.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the pattern line width.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Sets a constant pattern color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = VectorSpec::Value(Some(color));
        self
    }

    /// Resolves per-record values.
    pub fn resolve(&self, source: &dyn DataSource) -> Result<HatchVisuals, SpecError> {
        if !is_positive(self.scale) {
            return Err(SpecError::InvalidValue {
                property: "hatch_scale",
                value: self.scale,
            });
        }
        Ok(HatchVisuals {
            pattern: self.pattern,
            scale: self.scale,
            weight: self.weight,
            color: self.color.resolve("hatch_color", source, &None)?,
            alpha: self.alpha.resolve("hatch_alpha", source, &1.0)?,
            alpha_scale: self.alpha_scale,
        })
    }
}

/// Resolved hatch style.
#[derive(Clone, Debug)]
pub struct HatchVisuals {
    pattern: Option<HatchPattern>,
    scale: f64,
    weight: f64,
    color: Uniform<Option<Color>>,
    alpha: Uniform<f64>,
    alpha_scale: f64,
}

impl HatchVisuals {
    /// Returns `false` if no record can ever paint a hatch.
    pub fn doit(&self) -> bool {
        self.pattern.is_some() && !scalar_is_off(&self.color, &self.alpha, self.alpha_scale)
    }

    /// Hatch for record `i`, or `None` if the record has no visible hatch.
    pub fn hatch(&self, i: usize) -> Option<Hatch> {
        let pattern = self.pattern?;
        let brush = brush_for(*self.color.get(i), *self.alpha.get(i), self.alpha_scale)?;
        Some(Hatch {
            pattern,
            scale: self.scale,
            weight: self.weight,
            brush,
        })
    }

    /// Hatches `path` with record `i`'s pattern.
    pub fn apply(&self, ctx: &mut dyn Context2d, path: &BezPath, i: usize) {
        if let Some(hatch) = self.hatch(i) {
            ctx.hatch(path, &hatch);
        }
    }
}

/// Authored text configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct TextProps {
    /// Text color; `None` disables text.
    pub color: VectorSpec<Option<Color>>,
    /// Text opacity.
    pub alpha: VectorSpec<f64>,
    /// Font family.
    pub font: String,
    /// Font size in pixels.
    pub font_size: VectorSpec<f64>,
    /// Horizontal anchoring.
    pub align: TextAlign,
    /// Vertical anchoring.
    pub baseline: TextBaseline,
    /// Multiplier applied on top of `alpha`.
    pub alpha_scale: f64,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            color: VectorSpec::Value(Some(Color::from_rgb8(0x44, 0x44, 0x44))),
            alpha: VectorSpec::Value(1.0),
            font: "helvetica".into(),
            font_size: VectorSpec::Value(16.0),
            align: TextAlign::Left,
            baseline: TextBaseline::Bottom,
            alpha_scale: 1.0,
        }
    }
}

impl TextProps {
    /// Sets a constant text color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = VectorSpec::Value(Some(color));
        self
    }

    /// Sets the font size.
    pub fn with_font_size(mut self, size: impl Into<VectorSpec<f64>>) -> Self {
        self.font_size = size.into();
        self
    }

    /// Sets the anchoring.
    pub fn with_anchor(mut self, align: TextAlign, baseline: TextBaseline) -> Self {
        self.align = align;
        self.baseline = baseline;
        self
    }

    /// Resolves per-record values.
    pub fn resolve(&self, source: &dyn DataSource) -> Result<TextVisuals, SpecError> {
        Ok(TextVisuals {
            color: self.color.resolve("text_color", source, &None)?,
            alpha: self.alpha.resolve("text_alpha", source, &1.0)?,
            font: self.font.clone(),
            font_size: self.font_size.resolve_non_negative("text_font_size", source, 16.0)?,
            align: self.align,
            baseline: self.baseline,
            alpha_scale: self.alpha_scale,
        })
    }
}

/// Resolved text style.
#[derive(Clone, Debug)]
pub struct TextVisuals {
    color: Uniform<Option<Color>>,
    alpha: Uniform<f64>,
    font: String,
    font_size: Uniform<f64>,
    align: TextAlign,
    baseline: TextBaseline,
    alpha_scale: f64,
}

impl TextVisuals {
    /// Returns `false` if no record can ever paint text.
    pub fn doit(&self) -> bool {
        !scalar_is_off(&self.color, &self.alpha, self.alpha_scale)
    }

    /// Font size for record `i`.
    pub fn font_size(&self, i: usize) -> f64 {
        *self.font_size.get(i)
    }

    /// Horizontal and vertical anchoring.
    pub fn anchor(&self) -> (TextAlign, TextBaseline) {
        (self.align, self.baseline)
    }

    /// Text style for record `i`, or `None` if the record has no visible text.
    pub fn style(&self, i: usize, angle: f64) -> Option<TextStyle> {
        let brush = brush_for(*self.color.get(i), *self.alpha.get(i), self.alpha_scale)?;
        Some(TextStyle {
            brush,
            font: self.font.clone(),
            font_size: self.font_size(i),
            align: self.align,
            baseline: self.baseline,
            angle,
        })
    }
}

/// The authored visual channels of one glyph.
///
/// Channels a glyph kind does not use are ignored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VisualProps {
    /// Stroke channel.
    pub line: LineProps,
    /// Fill channel.
    pub fill: FillProps,
    /// Hatch channel.
    pub hatch: HatchProps,
    /// Text channel.
    pub text: TextProps,
}

impl VisualProps {
    /// Sets the stroke channel.
    pub fn with_line(mut self, line: LineProps) -> Self {
        self.line = line;
        self
    }

    /// Sets the fill channel.
    pub fn with_fill(mut self, fill: FillProps) -> Self {
        self.fill = fill;
        self
    }

    /// Sets the hatch channel.
    pub fn with_hatch(mut self, hatch: HatchProps) -> Self {
        self.hatch = hatch;
        self
    }

    /// Sets the text channel.
    pub fn with_text(mut self, text: TextProps) -> Self {
        self.text = text;
        self
    }

    /// Returns a copy with every channel's opacity multiplied by `factor`.
    #[must_use]
    pub fn faded(&self, factor: f64) -> Self {
        let mut out = self.clone();
        out.line.alpha_scale *= factor;
        out.fill.alpha_scale *= factor;
        out.hatch.alpha_scale *= factor;
        out.text.alpha_scale *= factor;
        out
    }

    /// Returns a copy with constant line and fill colors.
    #[must_use]
    pub fn recolored(&self, color: Color) -> Self {
        let mut out = self.clone();
        if !matches!(out.line.color, VectorSpec::Value(None)) {
            out.line.color = VectorSpec::Value(Some(color));
        }
        if !matches!(out.fill.color, VectorSpec::Value(None)) {
            out.fill.color = VectorSpec::Value(Some(color));
        }
        out
    }

    /// Resolves every channel against `source`.
    pub fn resolve(&self, source: &dyn DataSource) -> Result<Visuals, SpecError> {
        Ok(Visuals {
            line: self.line.resolve(source)?,
            fill: self.fill.resolve(source)?,
            hatch: self.hatch.resolve(source)?,
            text: self.text.resolve(source)?,
        })
    }
}

/// The resolved visual channels of one glyph.
#[derive(Clone, Debug)]
pub struct Visuals {
    /// Stroke channel.
    pub line: LineVisuals,
    /// Fill channel.
    pub fill: FillVisuals,
    /// Hatch channel.
    pub hatch: HatchVisuals,
    /// Text channel.
    pub text: TextVisuals,
}

impl Visuals {
    /// Paints a closed area: fill, then hatch, then stroke.
    pub fn paint_area(&self, ctx: &mut dyn Context2d, path: &BezPath, i: usize) {
        if self.fill.doit() {
            self.fill.apply(ctx, path, i);
        }
        if self.hatch.doit() {
            self.hatch.apply(ctx, path, i);
        }
        if self.line.doit() {
            self.line.apply(ctx, path, i);
        }
    }

    /// Paints an open path with the stroke channel only.
    pub fn paint_line(&self, ctx: &mut dyn Context2d, path: &BezPath, i: usize) {
        if self.line.doit() {
            self.line.apply(ctx, path, i);
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use kurbo::{Rect, Shape};
    use vizir_core::ColumnDataSource;

    use super::*;
    use crate::context::{DrawCall, RecordingContext};

    #[test]
    fn area_paint_order_is_fill_hatch_stroke() {
        let source = ColumnDataSource::new()
            .with_column("x", vec![0.0])
            .unwrap();
        let visuals = VisualProps::default()
            .with_hatch(HatchProps::new(HatchPattern::Cross))
            .resolve(&source)
            .unwrap();
        let mut ctx = RecordingContext::new();
        visuals.paint_area(&mut ctx, &Rect::new(0.0, 0.0, 1.0, 1.0).to_path(0.1), 0);
        assert!(matches!(ctx.calls[0], DrawCall::Fill { .. }));
        assert!(matches!(ctx.calls[1], DrawCall::Hatch { .. }));
        assert!(matches!(ctx.calls[2], DrawCall::Stroke { .. }));
    }

    #[test]
    fn disabled_channels_do_not_paint() {
        let source = ColumnDataSource::new()
            .with_column("x", vec![0.0])
            .unwrap();
        let visuals = VisualProps::default()
            .with_line(LineProps::none())
            .with_fill(FillProps::default().with_alpha(0.0))
            .resolve(&source)
            .unwrap();
        assert!(!visuals.line.doit());
        assert!(!visuals.fill.doit());
        assert!(!visuals.hatch.doit());
    }

    #[test]
    fn per_record_colors_and_fading() {
        let source = ColumnDataSource::new()
            .with_column("c", vec![css::RED, css::BLUE])
            .unwrap();
        let props = VisualProps::default().with_fill(FillProps::default().with_color_field("c"));
        let faded = props.faded(0.2).resolve(&source).unwrap();
        let Some(Brush::Solid(c)) = faded.fill.brush(1) else {
            panic!("expected a solid brush");
        };
        assert!((c.components[3] - 0.2).abs() < 1e-6);
        assert_eq!(c.components[2], 1.0);
    }
}
