// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A [`Context2d`] that writes SVG elements.

use kurbo::{BezPath, Point, Rect, Stroke};
use peniko::Brush;
use vizir_glyphs::{Context2d, Hatch, ImageData, TextAlign, TextBaseline, TextStyle};

#[derive(Debug)]
pub(crate) struct SvgContext {
    width: f64,
    height: f64,
    body: String,
    patterns: Vec<String>,
}

impl SvgContext {
    pub(crate) fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            body: String::new(),
            patterns: Vec::new(),
        }
    }

    pub(crate) fn to_svg_string(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}">"#,
            w = self.width,
            h = self.height,
        ));
        out.push('\n');
        if !self.patterns.is_empty() {
            out.push_str("<defs>\n");
            for p in &self.patterns {
                out.push_str(p);
            }
            out.push_str("</defs>\n");
        }
        out.push_str(&self.body);
        out.push_str("</svg>\n");
        out
    }
}

impl Context2d for SvgContext {
    fn fill(&mut self, path: &BezPath, brush: &Brush) {
        self.body.push_str(&format!(r#"<path d="{}""#, path.to_svg()));
        write_paint_attr(&mut self.body, "fill", brush);
        self.body.push_str("/>\n");
    }

    fn stroke(&mut self, path: &BezPath, style: &Stroke, brush: &Brush) {
        self.body
            .push_str(&format!(r#"<path d="{}" fill="none""#, path.to_svg()));
        write_paint_attr(&mut self.body, "stroke", brush);
        self.body
            .push_str(&format!(r#" stroke-width="{}""#, style.width));
        if !style.dash_pattern.is_empty() {
            let dash: Vec<String> = style.dash_pattern.iter().map(|d| d.to_string()).collect();
            self.body.push_str(&format!(
                r#" stroke-dasharray="{}" stroke-dashoffset="{}""#,
                dash.join(" "),
                style.dash_offset
            ));
        }
        self.body.push_str("/>\n");
    }

    fn hatch(&mut self, path: &BezPath, hatch: &Hatch) {
        let id = format!("hatch{}", self.patterns.len());
        let mut tile = format!(
            r#"<pattern id="{id}" width="{s}" height="{s}" patternUnits="userSpaceOnUse"><path d="{d}""#,
            s = hatch.scale,
            d = hatch.tile().to_svg(),
        );
        if hatch.is_filled() {
            write_paint_attr(&mut tile, "fill", &hatch.brush);
        } else {
            tile.push_str(r#" fill="none""#);
            write_paint_attr(&mut tile, "stroke", &hatch.brush);
            tile.push_str(&format!(r#" stroke-width="{}""#, hatch.weight));
        }
        tile.push_str("/></pattern>\n");
        self.patterns.push(tile);
        self.body.push_str(&format!(
            r#"<path d="{}" fill="url(#{id})"/>"#,
            path.to_svg()
        ));
        self.body.push('\n');
    }

    fn text(&mut self, text: &str, at: Point, style: &TextStyle) {
        let anchor = match style.align {
            TextAlign::Left => "start",
            TextAlign::Center => "middle",
            TextAlign::Right => "end",
        };
        let baseline = match style.baseline {
            TextBaseline::Top => "hanging",
            TextBaseline::Middle => "middle",
            TextBaseline::Bottom => "text-after-edge",
            TextBaseline::Alphabetic => "alphabetic",
        };
        self.body.push_str(&format!(
            r#"<text x="{}" y="{}" font-family="{}" font-size="{}" text-anchor="{anchor}" dominant-baseline="{baseline}""#,
            at.x,
            at.y,
            escape_xml(&style.font),
            style.font_size,
        ));
        if style.angle != 0.0 {
            self.body.push_str(&format!(
                r#" transform="rotate({} {} {})""#,
                style.angle.to_degrees(),
                at.x,
                at.y
            ));
        }
        write_paint_attr(&mut self.body, "fill", &style.brush);
        self.body.push('>');
        self.body.push_str(&escape_xml(text));
        self.body.push_str("</text>\n");
    }

    fn image(&mut self, image: &ImageData, rect: Rect, angle: f64, alpha: f64) {
        // Images are host handles; draw a placeholder frame labelled with the handle.
        self.body.push_str(&format!(
            r##"<rect x="{}" y="{}" width="{}" height="{}" fill="#dddddd" fill-opacity="{alpha}" stroke="#888888""##,
            rect.x0,
            rect.y0,
            rect.width(),
            rect.height(),
        ));
        if angle != 0.0 {
            self.body.push_str(&format!(
                r#" transform="rotate({} {} {})""#,
                angle.to_degrees(),
                rect.x0,
                rect.y0
            ));
        }
        self.body.push_str(&format!(
            "><title>image {} ({}x{})</title></rect>\n",
            image.handle, image.width, image.height
        ));
    }
}

fn svg_paint(brush: &Brush) -> (String, Option<f64>) {
    match brush {
        Brush::Solid(color) => {
            let rgba = color.to_rgba8();
            let fill = format!("#{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b);
            let opacity = if rgba.a == 255 {
                None
            } else {
                Some(f64::from(rgba.a) / 255.0)
            };
            (fill, opacity)
        }
        _ => ("none".to_string(), None),
    }
}

fn write_paint_attr(out: &mut String, name: &str, brush: &Brush) {
    let (value, opacity) = svg_paint(brush);
    out.push_str(&format!(r#" {name}="{value}""#));
    if let Some(o) = opacity {
        out.push_str(&format!(r#" {name}-opacity="{o}""#));
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
