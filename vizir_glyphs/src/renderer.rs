// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyph renderers: a base glyph plus its interaction decorations.
//!
//! A [`GlyphRenderer`] owns the base [`GlyphView`] and up to four decoration views. Every frame
//! it splits the records by interaction state and paints the subsets in a fixed order:
//!
//! 1. Without a selection, the base glyph paints every record that is not muted. With a
//!    selection, the nonselection glyph paints the unselected records, then the selection
//!    glyph paints the selected ones.
//! 2. The hover glyph paints the hovered records on top.
//! 3. The muted glyph paints the muted records last.
//!
//! Muted records are excluded from the earlier passes, so muting overrides selection and
//! hover. Decorations inherit the base view's per-record values and screen arrays wherever
//! their properties match.

extern crate alloc;

use alloc::vec::Vec;

use kurbo::Rect;
use peniko::color::palette::css;
use vizir_core::{DataSource, Indices, Selection};

use crate::context::Context2d;
use crate::geometry::Geometry;
use crate::glyphs::Glyph;
use crate::image::{ImageData, ImageLoadError, ImageRequest, ImageStatus, LoadToken};
use crate::mapper::CoordinateMapper;
use crate::props::SpecError;
use crate::view::GlyphView;
use crate::visuals::VisualProps;
use crate::webgl::{GpuHandle, WebGlGlyph, WebGlOptions};

/// Opacity factor of automatic nonselection and muted decorations.
pub const AUTO_FADE: f64 = 0.2;

/// Opacity of the glyph painting decimated records.
pub const DECIMATED_ALPHA: f64 = 0.3;

/// How one decoration slot is configured.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DecorationSpec {
    /// Derive the decoration from the base glyph.
    ///
    /// Nonselection and muted decorations fade the base visuals by [`AUTO_FADE`]. Selection
    /// and hover decorations paint like the base glyph.
    #[default]
    Auto,
    /// No decoration: the slot falls back to the base glyph where one is needed, and muted
    /// records are not painted at all.
    None,
    /// An explicit decoration.
    Custom {
        /// Glyph to paint with; `None` reuses the base glyph spec.
        glyph: Option<Glyph>,
        /// Visuals of the decoration.
        visuals: VisualProps,
    },
}

impl DecorationSpec {
    /// The base glyph with different visuals.
    pub fn visuals(visuals: VisualProps) -> Self {
        Self::Custom {
            glyph: None,
            visuals,
        }
    }

    /// A different glyph with its own visuals.
    pub fn custom(glyph: impl Into<Glyph>, visuals: VisualProps) -> Self {
        Self::Custom {
            glyph: Some(glyph.into()),
            visuals,
        }
    }
}

/// Level-of-detail and interaction tunables.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RendererOptions {
    /// Record count above which interactive frames are decimated.
    pub lod_threshold: usize,
    /// Every `lod_factor`-th record is painted in decimated frames.
    pub lod_factor: usize,
    /// Whether the plot is being interacted with (panned, zoomed).
    pub interactive: bool,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            lod_threshold: 2000,
            lod_factor: 10,
            interactive: false,
        }
    }
}

impl RendererOptions {
    /// Sets the decimation threshold and factor.
    pub fn with_lod(mut self, threshold: usize, factor: usize) -> Self {
        self.lod_threshold = threshold;
        self.lod_factor = factor;
        self
    }

    /// Marks frames as interactive.
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }
}

/// The decoration slots, in paint order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Decoration {
    /// Unselected records while a selection exists.
    Nonselection,
    /// Selected records.
    Selection,
    /// Hovered records.
    Hover,
    /// Muted records.
    Muted,
}

impl Decoration {
    const ALL: [Self; 4] = [Self::Nonselection, Self::Selection, Self::Hover, Self::Muted];

    fn slot(self) -> usize {
        match self {
            Self::Nonselection => 0,
            Self::Selection => 1,
            Self::Hover => 2,
            Self::Muted => 3,
        }
    }

    fn auto(self, base: &VisualProps) -> Option<VisualProps> {
        match self {
            Self::Nonselection | Self::Muted => Some(base.faded(AUTO_FADE)),
            Self::Selection | Self::Hover => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Nonselection => "nonselection",
            Self::Selection => "selection",
            Self::Hover => "hover",
            Self::Muted => "muted",
        }
    }
}

const BASE_LAYER: u8 = 0;
const DECIMATED_LAYER: u8 = 5;

fn layer_id(decoration: Decoration) -> u8 {
    match decoration {
        Decoration::Nonselection => 1,
        Decoration::Selection => 2,
        Decoration::Hover => 3,
        Decoration::Muted => 4,
    }
}

/// A view plus its optional instanced renderer.
#[derive(Debug)]
struct Layer {
    view: GlyphView,
    gl: Option<WebGlGlyph>,
}

impl Layer {
    fn new(view: GlyphView) -> Self {
        Self { view, gl: None }
    }

    /// Paints `indices`, through the GPU when possible.
    fn paint(&mut self, ctx: &mut dyn Context2d, indices: &[usize], pass: &str) {
        if indices.is_empty() {
            return;
        }
        if let Some(gl) = self.gl.as_mut()
            && gl.render(&self.view, indices)
        {
            self.view.mark_painted();
            log::trace!("{pass} pass: {} records on the GPU", indices.len());
            return;
        }
        log::trace!("{pass} pass: {} records", indices.len());
        self.view.paint(ctx, indices);
    }
}

/// A glyph with selection, nonselection, hover and muted decorations.
#[derive(Debug)]
pub struct GlyphRenderer {
    base: Layer,
    decorations: [Option<Layer>; 4],
    decimated: Layer,
    options: RendererOptions,
    gpu: Option<(GpuHandle, WebGlOptions)>,
    muted: bool,
    selected: Selection,
    hovered: Selection,
    muted_records: Indices,
}

impl GlyphRenderer {
    /// Creates a renderer with automatic decorations.
    pub fn new(glyph: impl Into<Glyph>, visuals: VisualProps) -> Self {
        let base = GlyphView::new(glyph, visuals);
        let decimated = GlyphView::new(
            base.glyph(),
            base.visual_props()
                .recolored(css::GRAY)
                .faded(DECIMATED_ALPHA),
        );
        let mut out = Self {
            base: Layer::new(base),
            decorations: [None, None, None, None],
            decimated: Layer::new(decimated),
            options: RendererOptions::default(),
            gpu: None,
            muted: false,
            selected: Selection::empty(),
            hovered: Selection::empty(),
            muted_records: Indices::new(0),
        };
        for decoration in Decoration::ALL {
            out.set_decoration(decoration, DecorationSpec::Auto);
        }
        out
    }

    fn set_decoration(&mut self, decoration: Decoration, spec: DecorationSpec) {
        let base = &self.base.view;
        let view = match spec {
            DecorationSpec::Auto => decoration
                .auto(base.visual_props())
                .map(|visuals| GlyphView::new(base.glyph(), visuals)),
            DecorationSpec::None => None,
            DecorationSpec::Custom { glyph, visuals } => Some(GlyphView::new(
                glyph.unwrap_or_else(|| base.glyph()),
                visuals,
            )),
        };
        self.decorations[decoration.slot()] = view.map(|view| Layer {
            view,
            gl: self
                .gpu
                .as_ref()
                .map(|(device, options)| WebGlGlyph::new(device.clone(), *options)),
        });
    }

    /// Configures the glyph painting selected records.
    pub fn with_selection_glyph(mut self, spec: DecorationSpec) -> Self {
        self.set_decoration(Decoration::Selection, spec);
        self
    }

    /// Configures the glyph painting unselected records while a selection exists.
    pub fn with_nonselection_glyph(mut self, spec: DecorationSpec) -> Self {
        self.set_decoration(Decoration::Nonselection, spec);
        self
    }

    /// Configures the glyph painting hovered records.
    pub fn with_hover_glyph(mut self, spec: DecorationSpec) -> Self {
        self.set_decoration(Decoration::Hover, spec);
        self
    }

    /// Configures the glyph painting muted records.
    pub fn with_muted_glyph(mut self, spec: DecorationSpec) -> Self {
        self.set_decoration(Decoration::Muted, spec);
        self
    }

    /// Sets level-of-detail options.
    pub fn with_options(mut self, options: RendererOptions) -> Self {
        self.options = options;
        self
    }

    /// Renders through `device` where the glyph kind and the current transform allow it.
    ///
    /// Each layer except the decimated one gets its own instance buffers.
    pub fn with_webgl(mut self, device: GpuHandle, options: WebGlOptions) -> Self {
        self.base.gl = Some(WebGlGlyph::new(device.clone(), options));
        for layer in self.decorations.iter_mut().flatten() {
            layer.gl = Some(WebGlGlyph::new(device.clone(), options));
        }
        self.gpu = Some((device, options));
        self
    }

    /// The level-of-detail options.
    pub fn options(&self) -> RendererOptions {
        self.options
    }

    /// Marks frames as interactive or not.
    pub fn set_interactive(&mut self, interactive: bool) {
        self.options.interactive = interactive;
    }

    /// Mutes or unmutes the whole renderer.
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Whether the whole renderer is muted.
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// The base view.
    pub fn view(&self) -> &GlyphView {
        &self.base.view
    }

    /// A decoration view, if the slot has one.
    pub fn decoration(&self, decoration: Decoration) -> Option<&GlyphView> {
        self.decorations[decoration.slot()]
            .as_ref()
            .map(|layer| &layer.view)
    }

    /// A decoration view, for writing.
    pub fn decoration_mut(&mut self, decoration: Decoration) -> Option<&mut GlyphView> {
        self.decorations[decoration.slot()]
            .as_mut()
            .map(|layer| &mut layer.view)
    }

    /// Brings every view up to date with `source` and `mapper`.
    ///
    /// Data is only re-read when the source version changed, and screen arrays are only
    /// recomputed when the data or the mapper changed. The selection, hover and muted state
    /// of `source` is captured for the next paint.
    pub fn update(
        &mut self,
        source: &dyn DataSource,
        mapper: &CoordinateMapper,
    ) -> Result<(), SpecError> {
        let base = &mut self.base.view;
        base.set_data(source, None)?;
        base.map_data(mapper, None);
        let base = &self.base.view;
        for layer in self.decorations.iter_mut().flatten() {
            layer.view.set_data(source, Some(base))?;
            layer.view.map_data(mapper, Some(base));
        }
        self.decimated.view.set_data(source, Some(base))?;
        self.decimated.view.map_data(mapper, Some(base));
        self.selected = source.selected().clone();
        self.hovered = source.inspected().clone();
        self.muted_records = source.muted().clone();
        Ok(())
    }

    fn decimate(&self, n: usize) -> bool {
        self.options.interactive
            && self.base.gl.is_none()
            && self.options.lod_factor > 1
            && n > self.options.lod_threshold
    }

    /// Paints one frame.
    pub fn paint(&mut self, ctx: &mut dyn Context2d) {
        let n = self.base.view.len();
        let all: Vec<usize> = (0..n).collect();
        if self.muted {
            if let Some(layer) = self.decorations[Decoration::Muted.slot()].as_mut() {
                layer.paint(ctx, &all, Decoration::Muted.name());
            }
            return;
        }

        // Interactive frames paint every `lod_factor`-th record, selected or not.
        let decimated = self.decimate(n);
        let candidates: Vec<usize> = if decimated {
            let step = self.options.lod_factor;
            (0..n / step).map(|i| i * step).collect()
        } else {
            all.clone()
        };
        let shown = |i: &usize| *i < n && !self.muted_records.contains(*i);
        let visible: Vec<usize> = candidates.into_iter().filter(shown).collect();
        let (selected, rest): (Vec<usize>, Vec<usize>) = visible
            .iter()
            .copied()
            .partition(|i| self.selected.contains(*i));
        let hovered: Vec<usize> = self.hovered.indices().iter().copied().filter(shown).collect();
        let muted: Vec<usize> = all.iter().copied().filter(|i| !shown(i)).collect();

        if selected.is_empty() {
            if decimated {
                self.decimated.paint(ctx, &visible, "decimated");
            } else {
                self.base.paint(ctx, &visible, "base");
            }
        } else {
            if decimated {
                self.decimated.paint(ctx, &rest, "decimated");
            } else {
                self.paint_decoration(ctx, Decoration::Nonselection, &rest, true);
            }
            self.paint_decoration(ctx, Decoration::Selection, &selected, true);
        }
        self.paint_decoration(ctx, Decoration::Hover, &hovered, false);
        self.paint_decoration(ctx, Decoration::Muted, &muted, false);
    }

    /// Paints `indices` with a decoration, or with the base glyph if the slot is empty and
    /// `fall_back` is set.
    fn paint_decoration(
        &mut self,
        ctx: &mut dyn Context2d,
        decoration: Decoration,
        indices: &[usize],
        fall_back: bool,
    ) {
        match self.decorations[decoration.slot()].as_mut() {
            Some(layer) => {
                layer.paint(ctx, indices, decoration.name());
            }
            None if fall_back => {
                self.base.paint(ctx, indices, decoration.name());
            }
            None => {}
        }
    }

    /// Hit-tests the base glyph. `geometry` is in canvas pixels.
    pub fn hit_test(&self, geometry: &Geometry) -> Option<Selection> {
        self.base.view.hit_test(geometry)
    }

    /// Data-space bounds of the base glyph's finite records.
    pub fn bounds(&self) -> Option<Rect> {
        self.base.view.bounds()
    }

    fn layers(&self) -> impl Iterator<Item = (u8, &Layer)> + '_ {
        core::iter::once((BASE_LAYER, &self.base))
            .chain(
                Decoration::ALL
                    .into_iter()
                    .filter_map(move |d| Some((layer_id(d), self.decorations[d.slot()].as_ref()?))),
            )
            .chain(core::iter::once((DECIMATED_LAYER, &self.decimated)))
    }

    fn layer_mut(&mut self, id: u8) -> Option<&mut Layer> {
        match id {
            BASE_LAYER => Some(&mut self.base),
            DECIMATED_LAYER => Some(&mut self.decimated),
            _ => Decoration::ALL
                .into_iter()
                .find(|d| layer_id(*d) == id)
                .and_then(|d| self.decorations[d.slot()].as_mut()),
        }
    }

    /// Returns `false` while any image of any layer is still loading.
    pub fn has_finished(&self) -> bool {
        self.layers().all(|(_, layer)| layer.view.has_finished())
    }

    /// Removes and returns the image fetches the host should perform.
    pub fn take_image_requests(&mut self) -> Vec<ImageRequest> {
        let mut out = Vec::new();
        let ids: Vec<u8> = self.layers().map(|(id, _)| id).collect();
        for id in ids {
            let Some(loader) = self.layer_mut(id).and_then(|l| l.view.images_mut()) else {
                continue;
            };
            for mut request in loader.take_requests() {
                request.token.layer = id;
                out.push(request);
            }
        }
        out
    }

    /// Reports the outcome of an image fetch.
    ///
    /// Returns the record's new status, or `None` for stale or unknown tokens. Decorations that
    /// share the base glyph's images pick up the new state immediately.
    pub fn resolve_image(
        &mut self,
        token: LoadToken,
        result: Result<ImageData, ImageLoadError>,
    ) -> Option<ImageStatus> {
        let status = self
            .layer_mut(token.layer)?
            .view
            .images_mut()?
            .resolve(token, result)?;
        if token.layer == BASE_LAYER
            && let Some(base) = self.base.view.images()
        {
            let followers = self
                .decorations
                .iter_mut()
                .flatten()
                .chain(core::iter::once(&mut self.decimated));
            for layer in followers {
                if let Some(loader) = layer.view.images_mut()
                    && loader.is_mirror()
                {
                    loader.mirror(base);
                }
            }
        }
        Some(status)
    }

    /// Paints a legend swatch for record `index` with the base glyph.
    pub fn draw_legend(&self, ctx: &mut dyn Context2d, rect: Rect, index: usize) {
        self.base.view.draw_legend(ctx, rect, index);
    }
}
