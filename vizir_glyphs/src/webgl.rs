// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Instanced GPU rendering for marker glyphs.
//!
//! A [`WebGlGlyph`] mirrors one [`GlyphView`] into per-instance buffers on a [`GpuDevice`] and
//! issues a single instanced draw per frame. The device is passed in explicitly as a
//! [`GpuHandle`]; its lifetime is that of the canvas that owns it.
//!
//! Instanced drawing applies one affine transform to every instance, so each render first
//! samples the current screen transform. When that check fails, or the device is unavailable,
//! [`WebGlGlyph::render`] returns `false` and the caller paints through [`Context2d`] instead.
//!
//! Buffers are uploaded lazily. Positions, sizes, angles and styles each track the view
//! generation they were built from, so a style change never re-uploads positions and a data
//! change in screen-unit sizes never re-uploads styles.
//!
//! [`Context2d`]: crate::Context2d

extern crate alloc;

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use bytemuck::{Pod, Zeroable};
use peniko::Brush;
use vizir_core::Uniform;

use crate::glyphs::MarkerType;
use crate::mapper::{CoordinateMapper, Units};
use crate::scale::Scale;
use crate::view::{Generations, GlyphView};
use crate::visuals::Visuals;

/// Default tolerance of the affine check.
pub const AFFINE_TOLERANCE: f64 = 1e-6;

/// Fraction of the source range at which the inner affine sample sits.
const SAMPLE_SPLIT: f64 = 0.375;

/// Geometry a glyph kind hands to the instanced path.
#[derive(Clone, Copy, Debug)]
pub(crate) enum GpuGeometry<'a> {
    /// Markers centered on `(x, y)`.
    Markers(GpuMarkers<'a>),
}

/// Per-record inputs of an instanced marker draw.
#[derive(Clone, Copy, Debug)]
pub(crate) struct GpuMarkers<'a> {
    pub(crate) marker: MarkerType,
    pub(crate) x: &'a Uniform<f64>,
    pub(crate) y: &'a Uniform<f64>,
    pub(crate) units: (Units, Units),
    /// Screen sizes, multiplied by `size_factor` to get the marker's full extent.
    pub(crate) size: &'a [f64],
    pub(crate) size_factor: f64,
    /// Whether sizes change whenever the glyph is remapped.
    pub(crate) size_tracks_scale: bool,
    pub(crate) angle: Option<&'a Uniform<f64>>,
}

/// Identifies a buffer allocated on a [`GpuDevice`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(pub u64);

/// What a buffer holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// [`InstancePosition`] per record, relative to the draw's baked offset.
    Positions,
    /// One `f32` marker extent per record, in pixels.
    Sizes,
    /// One `f32` angle per record, in radians.
    Angles,
    /// [`InstanceStyle`] per record.
    Styles,
    /// `u32` record indices to draw.
    Indices,
}

/// Position of one instance.
#[repr(C)]
#[allow(unsafe_code, reason = "the Pod derive emits unsafe impls")]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct InstancePosition {
    /// X offset from the baked origin, in the units of the glyph's x coordinate.
    pub x: f32,
    /// Y offset from the baked origin, in the units of the glyph's y coordinate.
    pub y: f32,
}

/// Paint of one instance. Colors are linear RGBA components.
#[repr(C)]
#[allow(unsafe_code, reason = "the Pod derive emits unsafe impls")]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct InstanceStyle {
    /// Fill color; fully transparent when the record has no fill.
    pub fill: [f32; 4],
    /// Stroke color; fully transparent when the record has no stroke.
    pub line: [f32; 4],
    /// Stroke width in pixels.
    pub line_width: f32,
    padding: [f32; 3],
}

/// One instanced marker draw.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerDraw {
    /// Marker shape.
    pub marker: MarkerType,
    /// Number of records in the instance buffers.
    pub instances: u32,
    /// Number of entries to read from `indices`, when drawing a subset.
    pub indexed: Option<u32>,
    /// Per-axis `(scale, offset)` mapping uploaded positions to canvas pixels.
    pub transform: [[f32; 2]; 2],
    /// The instance buffers.
    pub buffers: MarkerBuffers,
}

/// The buffers backing one [`WebGlGlyph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MarkerBuffers {
    /// [`BufferKind::Positions`].
    pub positions: BufferId,
    /// [`BufferKind::Sizes`].
    pub sizes: BufferId,
    /// [`BufferKind::Angles`].
    pub angles: BufferId,
    /// [`BufferKind::Styles`].
    pub styles: BufferId,
    /// [`BufferKind::Indices`].
    pub indices: BufferId,
}

/// A GPU capable of instanced marker draws.
pub trait GpuDevice: fmt::Debug {
    /// Returns `false` if the device cannot draw at all (for example, no WebGL context).
    fn is_available(&self) -> bool;

    /// Allocates an empty buffer.
    fn create_buffer(&mut self, kind: BufferKind) -> BufferId;

    /// Replaces the contents of a buffer.
    fn upload(&mut self, buffer: BufferId, bytes: &[u8]);

    /// Issues an instanced draw.
    fn draw(&mut self, draw: &MarkerDraw);

    /// Frees a buffer.
    fn release(&mut self, buffer: BufferId) {
        let _ = buffer;
    }
}

/// Shared handle to the GPU device of one canvas.
pub type GpuHandle = Rc<RefCell<dyn GpuDevice>>;

/// A recorded buffer upload.
#[derive(Clone, Debug, PartialEq)]
pub struct Upload {
    /// Target buffer.
    pub buffer: BufferId,
    /// What the buffer holds.
    pub kind: BufferKind,
    /// The uploaded bytes.
    pub bytes: Vec<u8>,
}

/// A [`GpuDevice`] that records uploads and draws.
#[derive(Clone, Debug)]
pub struct RecordingDevice {
    /// Whether the device reports itself as available.
    pub available: bool,
    /// Uploads, in order.
    pub uploads: Vec<Upload>,
    /// Draws, in order.
    pub draws: Vec<MarkerDraw>,
    kinds: Vec<BufferKind>,
    live: usize,
}

impl RecordingDevice {
    /// Creates an available device.
    pub fn new() -> Self {
        Self {
            available: true,
            uploads: Vec::new(),
            draws: Vec::new(),
            kinds: Vec::new(),
            live: 0,
        }
    }

    /// Creates a device that refuses to draw.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Wraps the device in a [`GpuHandle`], keeping a typed handle for inspection.
    pub fn into_handle(self) -> (Rc<RefCell<Self>>, GpuHandle) {
        let device = Rc::new(RefCell::new(self));
        let handle: GpuHandle = device.clone();
        (device, handle)
    }

    /// Number of uploads into buffers of `kind`.
    pub fn upload_count(&self, kind: BufferKind) -> usize {
        self.uploads.iter().filter(|u| u.kind == kind).count()
    }

    /// Number of buffers allocated and not yet released.
    pub fn live_buffers(&self) -> usize {
        self.live
    }

    /// Forgets recorded uploads and draws.
    pub fn clear(&mut self) {
        self.uploads.clear();
        self.draws.clear();
    }
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuDevice for RecordingDevice {
    fn is_available(&self) -> bool {
        self.available
    }

    fn create_buffer(&mut self, kind: BufferKind) -> BufferId {
        self.kinds.push(kind);
        self.live += 1;
        BufferId(self.kinds.len() as u64 - 1)
    }

    fn upload(&mut self, buffer: BufferId, bytes: &[u8]) {
        let kind = usize::try_from(buffer.0)
            .ok()
            .and_then(|i| self.kinds.get(i).copied());
        if let Some(kind) = kind {
            self.uploads.push(Upload {
                buffer,
                kind,
                bytes: bytes.to_vec(),
            });
        }
    }

    fn draw(&mut self, draw: &MarkerDraw) {
        self.draws.push(draw.clone());
    }

    fn release(&mut self, buffer: BufferId) {
        let _ = buffer;
        self.live = self.live.saturating_sub(1);
    }
}

/// Tunables of the instanced path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WebGlOptions {
    /// Largest relative difference between consecutive sampled slopes that still counts as
    /// affine.
    pub affine_tolerance: f64,
}

impl Default for WebGlOptions {
    fn default() -> Self {
        Self {
            affine_tolerance: AFFINE_TOLERANCE,
        }
    }
}

impl WebGlOptions {
    /// Sets the affine check tolerance.
    pub fn with_affine_tolerance(mut self, tolerance: f64) -> Self {
        self.affine_tolerance = tolerance;
        self
    }
}

/// Samples `scale` at three collinear points of its source range.
///
/// Returns `(factor, offset)` with `scale(x) == factor * x + offset` if the outputs are
/// distinct and the slopes on either side of the inner point agree within `tolerance`
/// (relative to the larger slope, or absolute below one pixel per span). The inner sample is
/// off center so that mappings symmetric about the midpoint are not mistaken for affine ones.
/// Categorical scales with gaps between groups are never affine.
pub fn affine_transform(scale: &Scale, tolerance: f64) -> Option<(f64, f64)> {
    if let Scale::Categorical(c) = scale
        && c.has_group_gaps()
    {
        return None;
    }
    let (x0, x2) = scale.source_range();
    if !(x0.is_finite() && x2.is_finite()) || x0 == x2 {
        return None;
    }
    let x1 = x0 + (x2 - x0) * SAMPLE_SPLIT;
    let s0 = scale.compute(x0);
    let s1 = scale.compute(x1);
    let s2 = scale.compute(x2);
    if !(s0.is_finite() && s1.is_finite() && s2.is_finite()) || s0 == s2 {
        return None;
    }
    // Both deltas scaled to the whole span.
    let d0 = (s1 - s0) / SAMPLE_SPLIT;
    let d1 = (s2 - s1) / (1.0 - SAMPLE_SPLIT);
    if (d1 - d0).abs() > tolerance * d0.abs().max(d1.abs()).max(1.0) {
        return None;
    }
    let factor = (s2 - s0) / (x2 - x0);
    Some((factor, s0 - factor * x0))
}

/// Returns `true` if both scales map three collinear sample points affinely.
pub fn is_affine(x: &Scale, y: &Scale, tolerance: f64) -> bool {
    affine_transform(x, tolerance).is_some() && affine_transform(y, tolerance).is_some()
}

/// The screen transform of a marker glyph, if it is affine.
fn screen_transform(
    mapper: &CoordinateMapper,
    units: (Units, Units),
    tolerance: f64,
) -> Option<[(f64, f64); 2]> {
    Some([
        affine_transform(&mapper.x_scale(units.0), tolerance)?,
        affine_transform(&mapper.y_scale(units.1), tolerance)?,
    ])
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "instance attributes are single precision on the GPU"
)]
fn to_f32(v: f64) -> f32 {
    v as f32
}

fn color_of(brush: Option<Brush>) -> [f32; 4] {
    match brush {
        Some(Brush::Solid(color)) => color.components,
        _ => [0.0; 4],
    }
}

/// Why the instanced path declined a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Fallback {
    Unsupported,
    Unavailable,
    NotMapped,
    NonAffine,
    Styled,
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unsupported => "glyph kind has no instanced path",
            Self::Unavailable => "GPU device unavailable",
            Self::NotMapped => "glyph is not mapped",
            Self::NonAffine => "screen transform is not affine",
            Self::Styled => "hatch patterns and dashed outlines have no instanced path",
        })
    }
}

/// Instanced renderer of one glyph view.
pub struct WebGlGlyph {
    device: GpuHandle,
    options: WebGlOptions,
    buffers: MarkerBuffers,
    positions: Option<Generations>,
    sizes: Option<Generations>,
    angles: Option<Generations>,
    styles: Option<Generations>,
    indices: Option<Vec<u32>>,
    origin: (f64, f64),
    warned: bool,
}

impl fmt::Debug for WebGlGlyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebGlGlyph")
            .field("options", &self.options)
            .field("buffers", &self.buffers)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl WebGlGlyph {
    /// Allocates the instance buffers on `device`.
    pub fn new(device: GpuHandle, options: WebGlOptions) -> Self {
        let buffers = {
            let mut gpu = device.borrow_mut();
            MarkerBuffers {
                positions: gpu.create_buffer(BufferKind::Positions),
                sizes: gpu.create_buffer(BufferKind::Sizes),
                angles: gpu.create_buffer(BufferKind::Angles),
                styles: gpu.create_buffer(BufferKind::Styles),
                indices: gpu.create_buffer(BufferKind::Indices),
            }
        };
        Self {
            device,
            options,
            buffers,
            positions: None,
            sizes: None,
            angles: None,
            styles: None,
            indices: None,
            origin: (0.0, 0.0),
            warned: false,
        }
    }

    /// The affine tolerance and other tunables.
    pub fn options(&self) -> WebGlOptions {
        self.options
    }

    /// Forces every buffer to be re-uploaded on the next render.
    pub fn invalidate(&mut self) {
        self.positions = None;
        self.sizes = None;
        self.angles = None;
        self.styles = None;
        self.indices = None;
    }

    fn decline(&mut self, reason: Fallback) -> bool {
        if self.warned {
            log::trace!("instanced path declined: {reason}");
        } else {
            log::warn!("falling back to canvas rendering: {reason}");
            self.warned = true;
        }
        false
    }

    /// Draws `indices` of `view` with one instanced draw.
    ///
    /// Returns `false`, leaving the device untouched, if the view's glyph kind has no instanced
    /// path, the device is unavailable, the visuals use a hatch pattern or a dashed outline,
    /// or the current screen transform is not affine. The
    /// first fallback is logged as a warning, later ones only at trace level.
    pub fn render(&mut self, view: &GlyphView, indices: &[usize]) -> bool {
        let Some(GpuGeometry::Markers(markers)) = view.gpu() else {
            return self.decline(Fallback::Unsupported);
        };
        let available = self
            .device
            .try_borrow()
            .is_ok_and(|device| device.is_available());
        if !available {
            return self.decline(Fallback::Unavailable);
        }
        let (Some(mapper), Some(visuals)) = (view.mapper(), view.visuals()) else {
            return self.decline(Fallback::NotMapped);
        };
        if visuals.hatch.doit() || (visuals.line.doit() && !visuals.line.dash().is_empty()) {
            return self.decline(Fallback::Styled);
        }
        let Some([(ax, bx), (ay, by)]) =
            screen_transform(mapper, markers.units, self.options.affine_tolerance)
        else {
            return self.decline(Fallback::NonAffine);
        };
        let generations = view.generations();
        let n = markers.x.len();
        let Ok(mut device) = self.device.try_borrow_mut() else {
            return self.decline(Fallback::Unavailable);
        };

        if self.positions != Some(generations.data_only()) {
            self.origin = first_finite(markers.x, markers.y);
            let (ox, oy) = self.origin;
            let positions: Vec<InstancePosition> = (0..n)
                .map(|i| InstancePosition {
                    x: to_f32(*markers.x.get(i) - ox),
                    y: to_f32(*markers.y.get(i) - oy),
                })
                .collect();
            device.upload(self.buffers.positions, bytemuck::cast_slice(&positions));
            self.positions = Some(generations.data_only());
        }

        let size_key = if markers.size_tracks_scale {
            generations.mapped_only()
        } else {
            generations.data_only()
        };
        if self.sizes != Some(size_key) {
            let sizes: Vec<f32> = (0..n)
                .map(|i| {
                    let s = markers.size.get(i).copied().unwrap_or(f64::NAN);
                    to_f32(s * markers.size_factor)
                })
                .collect();
            device.upload(self.buffers.sizes, bytemuck::cast_slice(&sizes));
            self.sizes = Some(size_key);
        }

        if self.angles != Some(generations.data_only()) {
            let angles: Vec<f32> = (0..n)
                .map(|i| markers.angle.map_or(0.0, |a| to_f32(*a.get(i))))
                .collect();
            device.upload(self.buffers.angles, bytemuck::cast_slice(&angles));
            self.angles = Some(generations.data_only());
        }

        if self.styles != Some(generations.visuals_only()) {
            let styles = styles(visuals, n);
            device.upload(self.buffers.styles, bytemuck::cast_slice(&styles));
            self.styles = Some(generations.visuals_only());
        }

        let all = indices.len() == n && indices.iter().enumerate().all(|(k, i)| k == *i);
        let indexed = if all {
            None
        } else {
            let subset: Vec<u32> = indices
                .iter()
                .filter_map(|i| u32::try_from(*i).ok())
                .collect();
            if self.indices.as_ref() != Some(&subset) {
                device.upload(self.buffers.indices, bytemuck::cast_slice(&subset));
            }
            let count = u32::try_from(subset.len()).unwrap_or(u32::MAX);
            self.indices = Some(subset);
            Some(count)
        };

        let (ox, oy) = self.origin;
        let draw = MarkerDraw {
            marker: markers.marker,
            instances: u32::try_from(n).unwrap_or(u32::MAX),
            indexed,
            transform: [
                [to_f32(ax), to_f32(ax * ox + bx)],
                [to_f32(ay), to_f32(ay * oy + by)],
            ],
            buffers: self.buffers,
        };
        log::trace!(
            "instanced draw: {} of {} {:?} markers",
            indexed.unwrap_or(draw.instances),
            draw.instances,
            draw.marker
        );
        device.draw(&draw);
        true
    }
}

impl Drop for WebGlGlyph {
    fn drop(&mut self) {
        if let Ok(mut device) = self.device.try_borrow_mut() {
            let b = self.buffers;
            for buffer in [b.positions, b.sizes, b.angles, b.styles, b.indices] {
                device.release(buffer);
            }
        }
    }
}

/// Origin that positions are uploaded relative to, keeping large coordinates precise in `f32`.
fn first_finite(x: &Uniform<f64>, y: &Uniform<f64>) -> (f64, f64) {
    (0..x.len().min(y.len()))
        .map(|i| (*x.get(i), *y.get(i)))
        .find(|(x, y)| x.is_finite() && y.is_finite())
        .unwrap_or((0.0, 0.0))
}

fn styles(visuals: &Visuals, n: usize) -> Vec<InstanceStyle> {
    let fill = visuals.fill.doit();
    let line = visuals.line.doit();
    (0..n)
        .map(|i| InstanceStyle {
            fill: if fill {
                color_of(visuals.fill.brush(i))
            } else {
                [0.0; 4]
            },
            line: if line {
                color_of(visuals.line.brush(i))
            } else {
                [0.0; 4]
            },
            line_width: if line {
                to_f32(visuals.line.width(i))
            } else {
                0.0
            },
            padding: [0.0; 3],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use kurbo::Rect;
    use peniko::color::palette::css;
    use vizir_core::ColumnDataSource;

    use super::*;
    use crate::glyphs::{Circle, Scatter};
    use crate::range::FactorRange;
    use crate::scale::{ScaleCategorical, ScaleLinear, ScaleLog};
    use crate::context::HatchPattern;
    use crate::visuals::{FillProps, HatchProps, LineProps, VisualProps};

    fn source() -> ColumnDataSource {
        ColumnDataSource::new()
            .with_column("x", vec![1.0e7, 1.0e7 + 1.0, 1.0e7 + 2.0])
            .unwrap()
            .with_column("y", vec![0.0, 1.0, 2.0])
            .unwrap()
    }

    fn mapper() -> CoordinateMapper {
        CoordinateMapper::new(
            ScaleLinear::new((1.0e7, 1.0e7 + 2.0), (0.0, 200.0)),
            ScaleLinear::new((0.0, 2.0), (200.0, 0.0)),
        )
    }

    fn view(source: &ColumnDataSource) -> GlyphView {
        let mut view = GlyphView::new(Scatter::new("x", "y"), VisualProps::default());
        view.set_data(source, None).unwrap();
        view.map_data(&mapper(), None);
        view
    }

    #[test]
    fn linear_scales_are_affine_and_others_are_not() {
        let linear: Scale = ScaleLinear::new((0.0, 10.0), (0.0, 500.0)).into();
        assert_eq!(affine_transform(&linear, AFFINE_TOLERANCE), Some((50.0, 0.0)));
        let log: Scale = ScaleLog::new((1.0, 1000.0), (0.0, 300.0)).into();
        assert!(!is_affine(&log, &linear, AFFINE_TOLERANCE));
        let factors = FactorRange::new([("a", "1"), ("a", "2"), ("b", "1"), ("b", "2")])
            .with_group_padding(0.5);
        let categorical: Scale = ScaleCategorical::new(&factors, (0.0, 450.0)).into();
        assert!(!is_affine(&categorical, &linear, AFFINE_TOLERANCE));
        let flat: Scale = ScaleLinear::new((0.0, 10.0), (5.0, 5.0)).into();
        assert!(!is_affine(&flat, &linear, AFFINE_TOLERANCE));
    }

    #[test]
    fn evenly_padded_category_groups_are_not_affine() {
        let linear: Scale = ScaleLinear::new((0.0, 10.0), (0.0, 500.0)).into();
        let factors = FactorRange::new([
            ("a", "1"),
            ("a", "2"),
            ("b", "1"),
            ("b", "2"),
            ("c", "1"),
            ("c", "2"),
        ])
        .with_group_padding(0.5);
        let grouped: Scale = ScaleCategorical::new(&factors, (0.0, 700.0)).into();
        assert_eq!(affine_transform(&grouped, AFFINE_TOLERANCE), None);
        assert!(!is_affine(&grouped, &linear, AFFINE_TOLERANCE));

        let unpadded = FactorRange::new([("a", "1"), ("a", "2"), ("b", "1"), ("b", "2")])
            .with_group_padding(0.0);
        let unpadded: Scale = ScaleCategorical::new(&unpadded, (0.0, 400.0)).into();
        assert!(affine_transform(&unpadded, AFFINE_TOLERANCE).is_some());
    }

    #[test]
    fn hatched_or_dashed_markers_fall_back_to_the_canvas() {
        let source = source();
        let mut view = view(&source);
        let (recorder, handle) = RecordingDevice::new().into_handle();
        let mut gl = WebGlGlyph::new(handle, WebGlOptions::default());
        assert!(gl.render(&view, &[0, 1, 2]));
        recorder.borrow_mut().clear();

        view.set_visuals(
            &source,
            VisualProps::default().with_hatch(HatchProps::new(HatchPattern::Cross)),
        )
        .unwrap();
        assert!(!gl.render(&view, &[0, 1, 2]));

        view.set_visuals(
            &source,
            VisualProps::default().with_line(LineProps::default().with_dash([4.0, 2.0], 0.0)),
        )
        .unwrap();
        assert!(!gl.render(&view, &[0, 1, 2]));
        assert!(recorder.borrow().uploads.is_empty());
        assert!(recorder.borrow().draws.is_empty());

        view.set_visuals(&source, VisualProps::default()).unwrap();
        assert!(gl.render(&view, &[0, 1, 2]));
    }

    #[test]
    fn positions_are_baked_relative_to_the_first_record() {
        let (recorder, handle) = RecordingDevice::new().into_handle();
        let source = source();
        let view = view(&source);
        let mut gl = WebGlGlyph::new(handle, WebGlOptions::default());
        assert!(gl.render(&view, &[0, 1, 2]));
        let device = recorder.borrow();
        let positions = device
            .uploads
            .iter()
            .find(|u| u.kind == BufferKind::Positions)
            .unwrap();
        let positions: &[InstancePosition] = bytemuck::cast_slice(&positions.bytes);
        assert_eq!(positions[2], InstancePosition { x: 2.0, y: 2.0 });
        let draw = &device.draws[0];
        assert_eq!(draw.indexed, None);
        let [[sx, tx], _] = draw.transform;
        assert_eq!(sx * positions[1].x + tx, 100.0);
    }

    #[test]
    fn style_changes_do_not_reupload_positions() {
        let (recorder, handle) = RecordingDevice::new().into_handle();
        let source = source();
        let mut view = view(&source);
        let mut gl = WebGlGlyph::new(handle, WebGlOptions::default());
        assert!(gl.render(&view, &[0, 1, 2]));
        recorder.borrow_mut().clear();

        assert!(gl.render(&view, &[0, 1, 2]));
        assert!(recorder.borrow().uploads.is_empty());

        view.set_visuals(
            &source,
            VisualProps::default().with_fill(FillProps::default().with_color(css::RED)),
        )
        .unwrap();
        assert!(gl.render(&view, &[0, 2]));
        let device = recorder.borrow();
        assert_eq!(device.upload_count(BufferKind::Positions), 0);
        assert_eq!(device.upload_count(BufferKind::Styles), 1);
        assert_eq!(device.upload_count(BufferKind::Indices), 1);
        assert_eq!(device.draws[1].indexed, Some(2));
    }

    #[test]
    fn data_unit_sizes_follow_the_mapper() {
        let (recorder, handle) = RecordingDevice::new().into_handle();
        let source = source();
        let mut view = GlyphView::new(Circle::new("x", "y", 0.5), VisualProps::default());
        view.set_data(&source, None).unwrap();
        view.map_data(&mapper(), None);
        let mut gl = WebGlGlyph::new(handle, WebGlOptions::default());
        assert!(gl.render(&view, &[0, 1, 2]));
        recorder.borrow_mut().clear();

        view.map_data(&mapper().with_frame(Rect::new(0.0, 0.0, 400.0, 400.0)), None);
        assert!(gl.render(&view, &[0, 1, 2]));
        let device = recorder.borrow();
        assert_eq!(device.upload_count(BufferKind::Sizes), 1);
        assert_eq!(device.upload_count(BufferKind::Positions), 0);
        let sizes: &[f32] = bytemuck::cast_slice(&device.uploads[0].bytes);
        assert_eq!(sizes[0], 200.0);
    }

    #[test]
    fn fallback_is_reported_without_touching_the_device() {
        let (recorder, handle) = RecordingDevice::unavailable().into_handle();
        let source = source();
        let view = view(&source);
        let mut gl = WebGlGlyph::new(handle, WebGlOptions::default());
        assert!(!gl.render(&view, &[0, 1, 2]));
        assert!(!gl.render(&view, &[0, 1, 2]));
        assert!(recorder.borrow().uploads.is_empty());
        drop(gl);
        assert_eq!(recorder.borrow().live_buffers(), 0);
    }
}
