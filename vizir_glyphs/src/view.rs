// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyph views: one glyph spec bound to data, a mapper and resolved visuals.
//!
//! A view moves through [`GlyphState`]: reading the data source (`set_data`) yields per-record
//! values and the spatial index, mapping (`map_data`) yields screen arrays, and painting draws
//! them. Panning or zooming only re-enters the mapping phase; a new data source version
//! re-enters the data phase. Repeating a phase with unchanged inputs is a no-op.

extern crate alloc;

use alloc::vec::Vec;

use kurbo::Rect;
use vizir_core::{DataSource, Selection, Shared, Version};

use crate::context::Context2d;
use crate::geometry::Geometry;
use crate::glyphs::{Glyph, GlyphKind};
use crate::image::ImageLoader;
use crate::mapper::CoordinateMapper;
use crate::props::SpecError;
use crate::spatial::SpatialIndex;
use crate::visuals::{VisualProps, Visuals};
use crate::webgl::GpuGeometry;

/// Lifecycle phase of a [`GlyphView`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GlyphState {
    /// No data has been read yet.
    #[default]
    Unset,
    /// Per-record values are current; screen arrays are not.
    DataSet,
    /// Screen arrays are current.
    Mapped,
    /// The current screen arrays have been painted at least once.
    Painted,
}

/// Counters bumped whenever a phase recomputes its outputs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub(crate) struct Generations {
    pub(crate) data: u64,
    pub(crate) mapped: u64,
    pub(crate) visuals: u64,
}

impl Generations {
    pub(crate) fn data_only(self) -> Self {
        Self {
            data: self.data,
            ..Self::default()
        }
    }

    pub(crate) fn mapped_only(self) -> Self {
        Self {
            mapped: self.mapped,
            ..Self::default()
        }
    }

    pub(crate) fn visuals_only(self) -> Self {
        Self {
            visuals: self.visuals,
            ..Self::default()
        }
    }
}

/// A glyph bound to a data source and a coordinate mapper.
#[derive(Clone, Debug)]
pub struct GlyphView {
    kind: GlyphKind,
    props: VisualProps,
    visuals: Option<Visuals>,
    index: Option<SpatialIndex>,
    mapper: Option<CoordinateMapper>,
    version: Option<Version>,
    state: GlyphState,
    generations: Generations,
}

impl GlyphView {
    /// Creates an unset view.
    pub fn new(glyph: impl Into<Glyph>, visuals: VisualProps) -> Self {
        Self {
            kind: GlyphKind::new(glyph.into()),
            props: visuals,
            visuals: None,
            index: None,
            mapper: None,
            version: None,
            state: GlyphState::Unset,
            generations: Generations::default(),
        }
    }

    /// The glyph spec.
    pub fn glyph(&self) -> Glyph {
        self.kind.spec()
    }

    /// Name of the glyph kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    /// The authored visuals.
    pub fn visual_props(&self) -> &VisualProps {
        &self.props
    }

    /// The visuals resolved by the last `set_data`.
    pub fn visuals(&self) -> Option<&Visuals> {
        self.visuals.as_ref()
    }

    /// The mapper of the last `map_data`.
    pub fn mapper(&self) -> Option<&CoordinateMapper> {
        self.mapper.as_ref()
    }

    /// Current lifecycle phase.
    pub fn state(&self) -> GlyphState {
        self.state
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.kind.len()
    }

    /// Returns `true` if the view has no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads per-record values from `source`.
    ///
    /// Does nothing if `source` has not changed since the last call. `base` is the view this one
    /// decorates: identical properties reuse its values, and decorations build no spatial
    /// index of their own.
    pub fn set_data(
        &mut self,
        source: &dyn DataSource,
        base: Option<&Self>,
    ) -> Result<(), SpecError> {
        let version = source.version();
        if self.state != GlyphState::Unset && self.version == Some(version) {
            log::trace!("{}: data version {version} unchanged", self.kind.name());
            return Ok(());
        }
        let visuals = self.props.resolve(source)?;
        self.kind.set_data(source, base.map(|b| &b.kind))?;
        self.index = base.is_none().then(|| self.kind.index_data());
        self.visuals = Some(visuals);
        self.version = Some(version);
        self.generations.data += 1;
        self.generations.visuals += 1;
        self.state = GlyphState::DataSet;
        log::debug!(
            "{}: read {} records at version {version}",
            self.kind.name(),
            self.kind.len()
        );
        Ok(())
    }

    /// Replaces the visuals, re-resolving them against `source` without touching the data.
    pub fn set_visuals(
        &mut self,
        source: &dyn DataSource,
        visuals: VisualProps,
    ) -> Result<(), SpecError> {
        self.visuals = Some(visuals.resolve(source)?);
        self.props = visuals;
        self.generations.visuals += 1;
        Ok(())
    }

    /// Computes screen arrays through `mapper`.
    ///
    /// Does nothing if the view is already mapped through an equal mapper. `base` must have
    /// been mapped through the same mapper first.
    pub fn map_data(&mut self, mapper: &CoordinateMapper, base: Option<&Self>) {
        debug_assert!(
            self.state != GlyphState::Unset,
            "map_data called before set_data"
        );
        match self.state {
            GlyphState::Unset => {
                log::debug!("{}: map_data before set_data ignored", self.kind.name());
                return;
            }
            GlyphState::Mapped | GlyphState::Painted if self.mapper.as_ref() == Some(mapper) => {
                return;
            }
            _ => {}
        }
        self.kind.map_data(mapper, base.map(|b| &b.kind));
        self.mapper = Some(mapper.clone());
        self.generations.mapped += 1;
        self.state = GlyphState::Mapped;
    }

    /// Paints the records in `indices`, in order.
    ///
    /// Records with non-finite screen geometry are skipped.
    pub fn paint(&mut self, ctx: &mut dyn Context2d, indices: &[usize]) {
        debug_assert!(
            self.state >= GlyphState::Mapped,
            "paint called before map_data"
        );
        let n = self.len();
        let in_range = indices.iter().all(|i| *i < n);
        debug_assert!(in_range, "paint indices exceed the {n} records");
        let Some(visuals) = self.visuals.as_ref() else {
            log::debug!("{}: paint before set_data ignored", self.kind.name());
            return;
        };
        if self.state < GlyphState::Mapped || !in_range {
            log::debug!("{}: paint of unmapped records ignored", self.kind.name());
            return;
        }
        self.kind.paint(ctx, visuals, indices);
        self.state = GlyphState::Painted;
    }

    pub(crate) fn mark_painted(&mut self) {
        if self.state == GlyphState::Mapped {
            self.state = GlyphState::Painted;
        }
    }

    /// Records under `geometry`, given in canvas pixels.
    ///
    /// `None` if the glyph kind cannot test this geometry, or the view is not mapped yet.
    pub fn hit_test(&self, geometry: &Geometry) -> Option<Selection> {
        if self.state < GlyphState::Mapped {
            return None;
        }
        self.kind.hit_test(
            self.index.as_ref()?,
            self.mapper.as_ref()?,
            self.visuals.as_ref()?,
            geometry,
        )
    }

    /// Bounding box of the indexed records in the units of the glyph's coordinates, skipping
    /// records with non-finite geometry.
    pub fn bounds(&self) -> Option<Rect> {
        self.index.as_ref()?.bbox()
    }

    /// Returns `false` while any image of the view is still loading.
    pub fn has_finished(&self) -> bool {
        self.kind.images().is_none_or(ImageLoader::has_finished)
    }

    /// Paints a legend swatch for record `index` into `rect`.
    pub fn draw_legend(&self, ctx: &mut dyn Context2d, rect: Rect, index: usize) {
        let Some(visuals) = self.visuals.as_ref() else {
            return;
        };
        if index >= self.len() {
            log::debug!("{}: legend for missing record {index}", self.kind.name());
            return;
        }
        self.kind.legend(ctx, visuals, rect, index);
    }

    pub(crate) fn gpu(&self) -> Option<GpuGeometry<'_>> {
        self.kind.gpu()
    }

    pub(crate) fn generations(&self) -> Generations {
        self.generations
    }

    pub(crate) fn images(&self) -> Option<&ImageLoader> {
        self.kind.images()
    }

    pub(crate) fn images_mut(&mut self) -> Option<&mut ImageLoader> {
        self.kind.images_mut()
    }

    /// A named screen array, such as `sx` or `sradius`.
    pub fn screen(&self, field: &str) -> Option<&[f64]> {
        self.kind.screen(field).map(Shared::as_slice)
    }

    /// A named screen array, for writing.
    ///
    /// Arrays shared with the base view are copied first, so writes never reach the base.
    /// The next mapping pass overwrites the array.
    pub fn screen_mut(&mut self, field: &str) -> Option<&mut Vec<f64>> {
        self.kind.screen_mut(field).map(Shared::to_mut)
    }

    #[cfg(test)]
    pub(crate) fn shared_screen(&self, field: &str) -> Option<&Shared<f64>> {
        self.kind.screen(field)
    }
}
