// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

extern crate std;

use alloc::string::ToString;
use alloc::vec;
use alloc::vec::Vec;

use kurbo::Rect;
use peniko::color::palette::css;
use peniko::{Brush, Color};
use vizir_core::{ColumnDataSource, Selection};

use crate::context::{DrawCall, RecordingContext};
use crate::geometry::{Dimension, Geometry};
use crate::glyphs::{Circle, ImageUrl, Scatter};
use crate::image::{ImageData, ImageLoadError, ImageStatus};
use crate::mapper::CoordinateMapper;
use crate::props::VectorSpec;
use crate::range::FactorRange;
use crate::renderer::{Decoration, DecorationSpec, GlyphRenderer, RendererOptions};
use crate::scale::{ScaleCategorical, ScaleLinear};
use crate::visuals::{FillProps, LineProps, VisualProps};
use crate::webgl::{RecordingDevice, WebGlOptions};

fn mapper() -> CoordinateMapper {
    CoordinateMapper::new(
        ScaleLinear::new((0.0, 10.0), (0.0, 100.0)),
        ScaleLinear::new((0.0, 10.0), (100.0, 0.0)),
    )
}

fn filled(color: Color) -> VisualProps {
    VisualProps::default()
        .with_line(LineProps::none())
        .with_fill(FillProps::default().with_color(color))
}

fn points(n: usize) -> ColumnDataSource {
    let xs: Vec<f64> = (0..n).map(|i| i as f64).collect();
    ColumnDataSource::new()
        .with_column("x", xs.clone())
        .unwrap()
        .with_column("y", xs)
        .unwrap()
}

/// `(record, fill color)` of every fill call.
fn fills(ctx: &RecordingContext) -> Vec<(usize, Brush)> {
    ctx.calls
        .iter()
        .filter_map(|call| match call {
            DrawCall::Fill { record, brush, .. } => Some(((*record)?, brush.clone())),
            _ => None,
        })
        .collect()
}

fn decorated() -> GlyphRenderer {
    GlyphRenderer::new(Circle::new("x", "y", 0.1), filled(css::GRAY))
        .with_nonselection_glyph(DecorationSpec::visuals(filled(css::RED)))
        .with_selection_glyph(DecorationSpec::visuals(filled(css::BLUE)))
        .with_hover_glyph(DecorationSpec::visuals(filled(css::GREEN)))
        .with_muted_glyph(DecorationSpec::visuals(filled(css::BLACK)))
}

#[test]
fn selection_then_hover_then_muted() {
    let mut source = points(5);
    source.set_selected(Selection::from_indices([1, 2, 3]));
    source.set_inspected(Selection::from_indices([2, 3, 4]));
    let mut renderer = decorated();
    renderer.update(&source, &mapper()).unwrap();
    let mut ctx = RecordingContext::new();
    renderer.paint(&mut ctx);

    let red = Brush::Solid(css::RED);
    let blue = Brush::Solid(css::BLUE);
    let green = Brush::Solid(css::GREEN);
    assert_eq!(
        fills(&ctx),
        [
            (0, red.clone()),
            (4, red),
            (1, blue.clone()),
            (2, blue.clone()),
            (3, blue),
            (2, green.clone()),
            (3, green.clone()),
            (4, green),
        ]
    );
}

#[test]
fn muted_records_leave_every_other_pass() {
    let mut source = points(5);
    source.set_selected(Selection::from_indices([1, 2, 3]));
    source.set_inspected(Selection::from_indices([2, 3, 4]));
    source.set_muted(3, true);
    let mut renderer = decorated();
    renderer.update(&source, &mapper()).unwrap();
    let mut ctx = RecordingContext::new();
    renderer.paint(&mut ctx);
    assert_eq!(ctx.records(), [0, 4, 1, 2, 4, 3]);
    let (last, brush) = fills(&ctx).pop().unwrap();
    assert_eq!((last, brush), (3, Brush::Solid(css::BLACK)));
}

#[test]
fn without_selection_the_base_glyph_paints() {
    let mut source = points(3);
    source.set_inspected(Selection::from_indices([1]));
    let mut renderer = decorated();
    renderer.update(&source, &mapper()).unwrap();
    let mut ctx = RecordingContext::new();
    renderer.paint(&mut ctx);
    let gray = Brush::Solid(css::GRAY);
    assert_eq!(
        fills(&ctx),
        [
            (0, gray.clone()),
            (1, gray.clone()),
            (2, gray),
            (1, Brush::Solid(css::GREEN)),
        ]
    );
}

#[test]
fn missing_decorations_fall_back_to_the_base_glyph() {
    let mut source = points(3);
    source.set_selected(Selection::from_indices([0]));
    source.set_muted(2, true);
    let mut renderer = GlyphRenderer::new(Circle::new("x", "y", 0.1), filled(css::GRAY))
        .with_nonselection_glyph(DecorationSpec::None)
        .with_muted_glyph(DecorationSpec::None);
    renderer.update(&source, &mapper()).unwrap();
    let mut ctx = RecordingContext::new();
    renderer.paint(&mut ctx);
    assert_eq!(ctx.records(), [1, 0]);
}

#[test]
fn auto_decorations_fade_the_base_visuals() {
    let mut source = points(2);
    source.set_selected(Selection::from_indices([1]));
    let mut renderer = GlyphRenderer::new(Circle::new("x", "y", 0.1), filled(css::GRAY));
    renderer.update(&source, &mapper()).unwrap();
    let mut ctx = RecordingContext::new();
    renderer.paint(&mut ctx);
    assert_eq!(
        fills(&ctx),
        [
            (0, Brush::Solid(css::GRAY.multiply_alpha(0.2))),
            (1, Brush::Solid(css::GRAY)),
        ]
    );

    renderer.set_muted(true);
    ctx.clear();
    renderer.paint(&mut ctx);
    assert_eq!(ctx.fill_count(), 2);
    assert!(
        fills(&ctx)
            .iter()
            .all(|(_, b)| *b == Brush::Solid(css::GRAY.multiply_alpha(0.2)))
    );
}

#[test]
fn non_finite_records_are_skipped_and_excluded_from_bounds() {
    let source = ColumnDataSource::new()
        .with_column("x", vec![0.0, 1.0, 2.0, f64::NAN, 4.0])
        .unwrap()
        .with_column("y", vec![0.0, 1.0, 2.0, 3.0, 4.0])
        .unwrap();
    let mut renderer = GlyphRenderer::new(Circle::new("x", "y", 5.0), filled(css::GRAY));
    renderer.update(&source, &mapper()).unwrap();
    let mut ctx = RecordingContext::new();
    renderer.paint(&mut ctx);
    assert_eq!(ctx.calls.len(), 4);
    assert_eq!(ctx.records(), [0, 1, 2, 4]);
    assert_eq!(renderer.bounds(), Some(Rect::new(0.0, 0.0, 4.0, 4.0)));
    let everything = Geometry::Rect(Rect::new(-1000.0, -1000.0, 1000.0, 1000.0));
    let hits = renderer.hit_test(&everything).unwrap();
    assert_eq!(hits.indices(), [0, 1, 2, 4]);
}

#[test]
fn images_finish_once_every_record_settles() {
    let source = ColumnDataSource::new()
        .with_column("url", vec!["a.png", "b.png"])
        .unwrap()
        .with_column("x", vec![1.0, 2.0])
        .unwrap()
        .with_column("y", vec![1.0, 2.0])
        .unwrap();
    let glyph = ImageUrl::new(VectorSpec::field("url"), "x", "y").with_retry(3, 1000, 10);
    let mut renderer = GlyphRenderer::new(glyph, VisualProps::default());
    renderer.update(&source, &mapper()).unwrap();
    assert!(!renderer.has_finished());

    let requests = renderer.take_image_requests();
    assert_eq!(requests.len(), 2);
    let image = ImageData {
        width: 8,
        height: 8,
        handle: 7,
    };
    assert_eq!(
        renderer.resolve_image(requests[0].token, Ok(image)),
        Some(ImageStatus::Loaded(image))
    );
    let nonselection = renderer.decoration(Decoration::Nonselection).unwrap();
    assert!(!nonselection.has_finished());

    let mut failing = requests[1].clone();
    for retry in 1..=3 {
        let status = renderer.resolve_image(failing.token, Err(ImageLoadError::Timeout));
        assert_eq!(status, Some(ImageStatus::Pending));
        assert!(!renderer.has_finished());
        let next = renderer.take_image_requests();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].attempt, retry);
        assert_eq!(next[0].delay_ms, 10);
        assert_eq!(next[0].url, "b.png".to_string());
        failing = next[0].clone();
    }
    let status = renderer.resolve_image(
        failing.token,
        Err(ImageLoadError::Network("404".to_string())),
    );
    assert_eq!(status, Some(ImageStatus::Failed));
    assert!(renderer.has_finished());
    assert!(renderer.take_image_requests().is_empty());

    let mut ctx = RecordingContext::new();
    renderer.paint(&mut ctx);
    assert_eq!(ctx.records(), [0]);
    assert!(matches!(ctx.calls[0], DrawCall::Image { handle: 7, .. }));
}

#[test]
fn stale_image_results_are_ignored_after_a_data_change() {
    let mut source = ColumnDataSource::new()
        .with_column("url", vec!["a.png"])
        .unwrap()
        .with_column("x", vec![1.0])
        .unwrap()
        .with_column("y", vec![1.0])
        .unwrap();
    let glyph = ImageUrl::new(VectorSpec::field("url"), "x", "y");
    let mut renderer = GlyphRenderer::new(glyph, VisualProps::default());
    renderer.update(&source, &mapper()).unwrap();
    let stale = renderer.take_image_requests();

    source.set_column("url", vec!["b.png"]).unwrap();
    renderer.update(&source, &mapper()).unwrap();
    let image = ImageData {
        width: 1,
        height: 1,
        handle: 1,
    };
    assert_eq!(renderer.resolve_image(stale[0].token, Ok(image)), None);
    let fresh = renderer.take_image_requests();
    assert_eq!(fresh[0].url, "b.png".to_string());
    assert!(renderer.resolve_image(fresh[0].token, Ok(image)).is_some());
    assert!(renderer.has_finished());
}

#[test]
fn categorical_scales_fall_back_to_the_canvas() {
    let source = ColumnDataSource::new()
        .with_column("x", vec![0.5, 1.5, 2.5, 3.5])
        .unwrap()
        .with_column("y", vec![1.0, 2.0, 3.0, 4.0])
        .unwrap();
    let factors =
        FactorRange::new([("a", "1"), ("a", "2"), ("b", "1"), ("b", "2")]).with_group_padding(0.5);
    let categorical = CoordinateMapper::new(
        ScaleCategorical::new(&factors, (0.0, 450.0)),
        ScaleLinear::new((0.0, 5.0), (100.0, 0.0)),
    );

    let (device, handle) = RecordingDevice::new().into_handle();
    let mut renderer = GlyphRenderer::new(Scatter::new("x", "y"), filled(css::GRAY))
        .with_webgl(handle, WebGlOptions::default());

    renderer.update(&source, &categorical).unwrap();
    let mut ctx = RecordingContext::new();
    renderer.paint(&mut ctx);
    assert!(device.borrow().draws.is_empty());
    assert_eq!(ctx.records(), [0, 1, 2, 3]);

    renderer.update(&source, &mapper()).unwrap();
    ctx.clear();
    renderer.paint(&mut ctx);
    assert_eq!(device.borrow().draws.len(), 1);
    assert!(ctx.calls.is_empty());
}

#[test]
fn decoration_writes_never_reach_the_base() {
    let source = points(4);
    let mut renderer = GlyphRenderer::new(Circle::new("x", "y", 0.1), filled(css::GRAY))
        .with_hover_glyph(DecorationSpec::visuals(filled(css::GREEN)));
    renderer.update(&source, &mapper()).unwrap();

    let base = renderer.view().shared_screen("sx").unwrap().clone();
    let hover = renderer.decoration(Decoration::Hover).unwrap();
    assert!(hover.shared_screen("sx").unwrap().ptr_eq(&base));
    let snapshot = base.as_slice().to_vec();

    let hover = renderer.decoration_mut(Decoration::Hover).unwrap();
    hover.screen_mut("sx").unwrap()[0] = 999.0;
    assert_eq!(hover.screen("sx").unwrap()[0], 999.0);
    assert!(!hover.shared_screen("sx").unwrap().ptr_eq(&base));
    assert_eq!(renderer.view().screen("sx").unwrap(), snapshot.as_slice());
}

#[test]
fn interactive_frames_decimate_large_glyphs() {
    let source = points(30);
    let mut renderer = GlyphRenderer::new(Circle::new("x", "y", 0.1), filled(css::GRAY))
        .with_options(RendererOptions::default().with_lod(10, 5));
    renderer.update(&source, &mapper()).unwrap();

    let mut ctx = RecordingContext::new();
    renderer.paint(&mut ctx);
    assert_eq!(ctx.fill_count(), 30);

    renderer.set_interactive(true);
    ctx.clear();
    renderer.paint(&mut ctx);
    assert_eq!(ctx.records(), [0, 5, 10, 15, 20, 25]);
    let grey = Brush::Solid(css::GRAY.multiply_alpha(0.3));
    assert!(fills(&ctx).iter().all(|(_, b)| *b == grey));
}

#[test]
fn interactive_frames_decimate_around_a_selection() {
    let mut source = points(30);
    source.set_selected(Selection::from_indices([3, 5, 10, 12]));
    source.set_muted(15, true);
    let mut renderer = decorated().with_options(
        RendererOptions::default()
            .with_lod(10, 5)
            .with_interactive(true),
    );
    renderer.update(&source, &mapper()).unwrap();
    let mut ctx = RecordingContext::new();
    renderer.paint(&mut ctx);

    let grey = Brush::Solid(css::GRAY.multiply_alpha(0.3));
    let blue = Brush::Solid(css::BLUE);
    let black = Brush::Solid(css::BLACK);
    assert_eq!(
        fills(&ctx),
        [
            (0, grey.clone()),
            (20, grey.clone()),
            (25, grey),
            (5, blue.clone()),
            (10, blue),
            (15, black),
        ]
    );
}

#[test]
fn span_hits_use_the_base_glyph() {
    let source = points(5);
    let mut renderer = decorated();
    renderer.update(&source, &mapper()).unwrap();
    let hits = renderer
        .hit_test(&Geometry::Span {
            dim: Dimension::X,
            at: 20.0,
        })
        .unwrap();
    assert_eq!(hits.indices(), [2]);
}
