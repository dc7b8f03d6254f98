// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text measurement hooks for text glyphs.
//!
//! Shaping lives downstream of the glyph layer, so text glyphs only need rough extents to
//! build their spatial index and answer hit tests. Hosts with a real shaping backend can plug
//! it in through [`TextMeasurer`].

use kurbo::Rect;

use crate::context::{TextAlign, TextBaseline};

/// Measures single lines of text.
pub trait TextMeasurer {
    /// Returns `(width, height)` in pixels.
    fn measure(&self, text: &str, font_size: f64) -> (f64, f64);
}

/// A heuristic measurer assuming glyphs ~0.6em wide and 1em high.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicTextMeasurer;

impl TextMeasurer for HeuristicTextMeasurer {
    fn measure(&self, text: &str, font_size: f64) -> (f64, f64) {
        let width = 0.6 * font_size * text.chars().count() as f64;
        (width, font_size)
    }
}

/// Axis-aligned box of a `width x height` text block anchored at `(x, y)`.
pub(crate) fn text_box(
    x: f64,
    y: f64,
    (width, height): (f64, f64),
    align: TextAlign,
    baseline: TextBaseline,
) -> Rect {
    let x0 = match align {
        TextAlign::Left => x,
        TextAlign::Center => x - width / 2.0,
        TextAlign::Right => x - width,
    };
    let y0 = match baseline {
        TextBaseline::Top => y,
        TextBaseline::Middle => y - height / 2.0,
        TextBaseline::Bottom => y - height,
        // Roughly 80% of the em box sits above the baseline.
        TextBaseline::Alphabetic => y - 0.8 * height,
    };
    Rect::new(x0, y0, x0 + width, y0 + height)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn boxes_follow_the_anchor() {
        let (w, h) = HeuristicTextMeasurer.measure("abcd", 10.0);
        assert!((w - 24.0).abs() < 1e-9 && h == 10.0, "got {w}x{h}");
        let size = (24.0, 10.0);
        let b = text_box(100.0, 50.0, size, TextAlign::Center, TextBaseline::Middle);
        assert_eq!(b, Rect::new(88.0, 45.0, 112.0, 55.0));
        let b = text_box(100.0, 50.0, size, TextAlign::Right, TextBaseline::Top);
        assert_eq!(b, Rect::new(76.0, 50.0, 100.0, 60.0));
    }
}
