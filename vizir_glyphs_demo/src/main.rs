// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyph renderer demos for `vizir_glyphs`, written out as SVG files.
mod svg;

use kurbo::Rect;
use log::{info, warn};
use peniko::color::palette::css;
use vizir_core::{ColumnDataSource, Selection};
use vizir_glyphs::{
    CoordinateMapper, DecorationSpec, FillProps, GlyphRenderer, HatchPattern, HatchProps,
    ImageData, ImageLoadError, ImageUrl, LineProps, MarkerType, RecordingDevice, RendererOptions,
    Scale, ScaleLinear, Scatter, Text, TextProps, VBar, VectorSpec, VisualProps, WebGlOptions,
    Wedge,
};

const WIDTH: f64 = 480.0;
const HEIGHT: f64 = 320.0;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let demos: [(&str, fn() -> String); 5] = [
        ("scatter", scatter_demo),
        ("bars", bars_demo),
        ("wedges", wedges_demo),
        ("images", images_demo),
        ("webgl", webgl_demo),
    ];
    for (name, demo) in demos {
        let path = format!("vizir_glyphs_{name}.svg");
        match std::fs::write(&path, demo()) {
            Ok(()) => info!("wrote {path}"),
            Err(err) => warn!("could not write {path}: {err}"),
        }
    }
}

fn mapper(x: (f64, f64), y: (f64, f64)) -> CoordinateMapper {
    CoordinateMapper::new(
        Scale::Linear(ScaleLinear::new(x, (0.0, 1.0))),
        Scale::Linear(ScaleLinear::new(y, (0.0, 1.0))),
    )
    .with_frame(Rect::new(40.0, 20.0, WIDTH - 20.0, HEIGHT - 40.0))
}

fn wave(n: usize) -> ColumnDataSource {
    let xs: Vec<f64> = (0..n).map(|i| i as f64 / 4.0).collect();
    let ys: Vec<f64> = xs.iter().map(|x| x.sin()).collect();
    let mut source = ColumnDataSource::new();
    if let Err(err) = source
        .set_column("x", xs)
        .and_then(|()| source.set_column("y", ys))
    {
        warn!("bad demo columns: {err}");
    }
    source
}

fn render(
    renderer: &mut GlyphRenderer,
    source: &ColumnDataSource,
    mapper: &CoordinateMapper,
) -> String {
    let mut ctx = svg::SvgContext::new(WIDTH, HEIGHT);
    match renderer.update(source, mapper) {
        Ok(()) => renderer.paint(&mut ctx),
        Err(err) => warn!("glyph update failed: {err}"),
    }
    ctx.to_svg_string()
}

/// Markers with a selection, a hovered record and one muted record.
fn scatter_demo() -> String {
    let mut source = wave(40);
    source.set_selected(Selection::from_indices(10..16));
    source.set_inspected(Selection::from_indices([20]));
    source.set_muted(30, true);

    let glyph = Scatter::new("x", "y")
        .with_size(12.0)
        .with_marker(MarkerType::Diamond);
    let base = VisualProps::default().with_fill(FillProps::default().with_color(css::STEEL_BLUE));
    let mut renderer = GlyphRenderer::new(glyph, base)
        .with_selection_glyph(DecorationSpec::visuals(
            VisualProps::default().with_fill(FillProps::default().with_color(css::CRIMSON)),
        ))
        .with_hover_glyph(DecorationSpec::custom(
            Scatter::new("x", "y")
                .with_size(20.0)
                .with_marker(MarkerType::Star),
            VisualProps::default().with_fill(FillProps::default().with_color(css::GOLD)),
        ));
    render(&mut renderer, &source, &mapper((0.0, 10.0), (-1.2, 1.2)))
}

/// Hatched bars with value labels.
fn bars_demo() -> String {
    let mut source = ColumnDataSource::new();
    let tops = vec![3.0, 5.0, 2.0, 6.0, 4.0];
    let labels: Vec<String> = tops.iter().map(|t| format!("{t}")).collect();
    let columns = source
        .set_column("x", vec![1.0, 2.0, 3.0, 4.0, 5.0])
        .and_then(|()| source.set_column("top", tops))
        .and_then(|()| source.set_column("label", labels));
    if let Err(err) = columns {
        warn!("bad demo columns: {err}");
    }
    let mapper = mapper((0.0, 6.0), (0.0, 7.0));

    let visuals = VisualProps::default()
        .with_fill(FillProps::default().with_color(css::LIGHT_GRAY))
        .with_hatch(
            HatchProps::new(HatchPattern::RightDiagonalLine).with_color(css::DARK_SLATE_GRAY),
        );
    let mut bars = GlyphRenderer::new(VBar::new("x", 0.7, "top"), visuals);
    let mut svg = render(&mut bars, &source, &mapper);

    let label_visuals = VisualProps::default()
        .with_line(LineProps::none())
        .with_fill(FillProps::none())
        .with_text(TextProps::default().with_color(css::BLACK));
    let mut labels = GlyphRenderer::new(
        Text::new("x", "top", VectorSpec::field("label")).with_offset(0.0, -4.0),
        label_visuals,
    );
    let text_layer = render(&mut labels, &source, &mapper);
    splice(&mut svg, &text_layer);
    svg
}

/// A pie built from wedges sharing one center.
fn wedges_demo() -> String {
    let shares = [0.4, 0.25, 0.2, 0.15];
    let mut starts = Vec::new();
    let mut ends = Vec::new();
    let mut acc = 0.0;
    for s in shares {
        starts.push(acc * core::f64::consts::TAU);
        acc += s;
        ends.push(acc * core::f64::consts::TAU);
    }
    let n = shares.len();
    let mut source = ColumnDataSource::new();
    let columns = source
        .set_column("x", vec![0.0; n])
        .and_then(|()| source.set_column("y", vec![0.0; n]))
        .and_then(|()| source.set_column("start", starts))
        .and_then(|()| source.set_column("end", ends))
        .and_then(|()| {
            source.set_column(
                "color",
                vec![css::TOMATO, css::GOLD, css::MEDIUM_SEA_GREEN, css::ROYAL_BLUE],
            )
        });
    if let Err(err) = columns {
        warn!("bad demo columns: {err}");
    }
    let glyph = Wedge::new(
        "x",
        "y",
        1.0,
        VectorSpec::field("start"),
        VectorSpec::field("end"),
    );
    let visuals = VisualProps::default()
        .with_line(LineProps::default().with_color(css::WHITE).with_width(2.0))
        .with_fill(FillProps::default().with_color_field("color"));
    let mut renderer = GlyphRenderer::new(glyph, visuals);
    render(&mut renderer, &source, &mapper((-1.5, 1.5), (-1.1, 1.1)))
}

/// Image glyphs resolved by a pretend host that fails the first fetch of each URL.
fn images_demo() -> String {
    let mut source = ColumnDataSource::new();
    let columns = source
        .set_column("url", vec!["sun.png", "moon.png"])
        .and_then(|()| source.set_column("x", vec![1.0, 3.0]))
        .and_then(|()| source.set_column("y", vec![2.0, 2.0]));
    if let Err(err) = columns {
        warn!("bad demo columns: {err}");
    }
    let mapper = mapper((0.0, 5.0), (0.0, 3.0));
    let glyph = ImageUrl::new(VectorSpec::field("url"), "x", "y")
        .with_size(1.0, 1.0)
        .with_retry(2, 1_000, 50);
    let mut renderer = GlyphRenderer::new(glyph, VisualProps::default());
    if let Err(err) = renderer.update(&source, &mapper) {
        warn!("glyph update failed: {err}");
    }

    let mut handle = 0;
    while !renderer.has_finished() {
        let requests = renderer.take_image_requests();
        if requests.is_empty() {
            break;
        }
        for request in requests {
            let result = if request.attempt == 0 {
                Err(ImageLoadError::Network(format!("{} unreachable", request.url)))
            } else {
                handle += 1;
                Ok(ImageData {
                    width: 64,
                    height: 64,
                    handle,
                })
            };
            let status = renderer.resolve_image(request.token, result);
            info!("{} attempt {}: {status:?}", request.url, request.attempt);
        }
    }

    let mut ctx = svg::SvgContext::new(WIDTH, HEIGHT);
    renderer.paint(&mut ctx);
    ctx.to_svg_string()
}

/// Markers drawn through a recording GPU device; the SVG shows the canvas fallback.
fn webgl_demo() -> String {
    let source = wave(5_000);
    let mapper = mapper((0.0, 1_250.0), (-1.2, 1.2));
    let (device, handle) = RecordingDevice::new().into_handle();
    let glyph = Scatter::new("x", "y").with_size(3.0);
    let visuals = VisualProps::default().with_fill(FillProps::default().with_color(css::TEAL));

    let mut gpu =
        GlyphRenderer::new(glyph.clone(), visuals.clone()).with_webgl(handle, WebGlOptions::default());
    let mut ctx = svg::SvgContext::new(WIDTH, HEIGHT);
    for frame in 0..3 {
        if let Err(err) = gpu.update(&source, &mapper) {
            warn!("glyph update failed: {err}");
        }
        gpu.paint(&mut ctx);
        let device = device.borrow();
        info!(
            "frame {frame}: {} draws, {} buffer uploads",
            device.draws.len(),
            device.uploads.len()
        );
    }

    let mut canvas = GlyphRenderer::new(glyph, visuals).with_options(
        RendererOptions::default()
            .with_lod(2_000, 10)
            .with_interactive(true),
    );
    render(&mut canvas, &source, &mapper)
}

/// Moves the body of `layer` to the end of `svg`.
fn splice(svg: &mut String, layer: &str) {
    let body = layer
        .split_once('\n')
        .map(|(_, rest)| rest.trim_end_matches("</svg>\n"))
        .unwrap_or_default();
    if let Some(end) = svg.rfind("</svg>") {
        svg.insert_str(end, body);
    }
}
