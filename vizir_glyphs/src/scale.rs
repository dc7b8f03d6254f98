// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One-dimensional scales between data space and screen space.
//!
//! Scales are plain values: a configured source range (domain) and target range (screen
//! extent) with pure mapping functions. A degenerate domain never produces non-finite output;
//! every value maps to the start of the target range instead.

extern crate alloc;

use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;

use crate::range::{FactorRange, Range1d};

/// A scale from data values to screen pixels.
#[derive(Clone, Debug, PartialEq)]
pub enum Scale {
    /// Affine mapping.
    Linear(ScaleLinear),
    /// Logarithmic mapping of a positive domain.
    Log(ScaleLog),
    /// Mapping of factor ordinals, with gaps between factor groups.
    Categorical(ScaleCategorical),
}

impl From<ScaleLinear> for Scale {
    fn from(value: ScaleLinear) -> Self {
        Self::Linear(value)
    }
}

impl From<ScaleLog> for Scale {
    fn from(value: ScaleLog) -> Self {
        Self::Log(value)
    }
}

impl From<ScaleCategorical> for Scale {
    fn from(value: ScaleCategorical) -> Self {
        Self::Categorical(value)
    }
}

impl Scale {
    /// Maps a data value to screen space.
    pub fn compute(&self, x: f64) -> f64 {
        match self {
            Self::Linear(s) => s.compute(x),
            Self::Log(s) => s.compute(x),
            Self::Categorical(s) => s.compute(x),
        }
    }

    /// Maps a screen value back to data space.
    pub fn invert(&self, sx: f64) -> f64 {
        match self {
            Self::Linear(s) => s.invert(sx),
            Self::Log(s) => s.invert(sx),
            Self::Categorical(s) => s.invert(sx),
        }
    }

    /// Maps a batch of data values. Each value is mapped independently.
    pub fn v_compute(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|x| self.compute(*x)).collect()
    }

    /// Maps a batch of screen values back to data space.
    pub fn v_invert(&self, sxs: &[f64]) -> Vec<f64> {
        sxs.iter().map(|sx| self.invert(*sx)).collect()
    }

    /// Maps both ends of a data interval.
    pub fn r_compute(&self, x0: f64, x1: f64) -> (f64, f64) {
        (self.compute(x0), self.compute(x1))
    }

    /// Maps a screen interval back to data space, returned with `x0 <= x1`.
    pub fn r_invert(&self, sx0: f64, sx1: f64) -> (f64, f64) {
        let a = self.invert(sx0);
        let b = self.invert(sx1);
        if b < a { (b, a) } else { (a, b) }
    }

    /// The configured data interval, as `(start, end)`.
    pub fn source_range(&self) -> (f64, f64) {
        match self {
            Self::Linear(s) => s.domain,
            Self::Log(s) => s.domain,
            Self::Categorical(s) => (0.0, s.count as f64),
        }
    }

    /// The configured screen interval, as `(start, end)`.
    pub fn target_range(&self) -> (f64, f64) {
        match self {
            Self::Linear(s) => s.range,
            Self::Log(s) => s.range,
            Self::Categorical(s) => s.inner.range,
        }
    }

    /// Returns a copy of this scale targeting a different screen interval.
    #[must_use]
    pub fn with_target(&self, range: (f64, f64)) -> Self {
        let mut out = self.clone();
        match &mut out {
            Self::Linear(s) => s.range = range,
            Self::Log(s) => s.range = range,
            Self::Categorical(s) => s.inner.range = range,
        }
        out
    }

    /// Returns a copy of this scale with every output shifted by `offset`.
    #[must_use]
    pub fn offset(&self, offset: f64) -> Self {
        let (r0, r1) = self.target_range();
        self.with_target((r0 + offset, r1 + offset))
    }

    /// Screen pixels per data unit when the scale is linear.
    pub fn linear_factor(&self) -> Option<f64> {
        match self {
            Self::Linear(s) => Some(s.factor()),
            _ => None,
        }
    }
}

/// A linear mapping from a continuous domain to a screen interval.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleLinear {
    domain: (f64, f64),
    range: (f64, f64),
}

impl ScaleLinear {
    /// Creates a new scale mapping `domain` values to `range` values.
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Creates a scale from a data range.
    pub fn from_range(range: Range1d, target: (f64, f64)) -> Self {
        Self::new((range.start, range.end), target)
    }

    /// The identity scale.
    pub fn identity() -> Self {
        Self::new((0.0, 1.0), (0.0, 1.0))
    }

    fn factor(&self) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let denom = d1 - d0;
        if denom == 0.0 { 0.0 } else { (r1 - r0) / denom }
    }

    /// Maps a value from domain space into range space.
    pub fn compute(&self, x: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let denom = d1 - d0;
        if denom == 0.0 || !denom.is_finite() {
            return r0;
        }
        let t = (x - d0) / denom;
        r0 + t * (r1 - r0)
    }

    /// Maps a value from range space into domain space.
    pub fn invert(&self, sx: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let denom = r1 - r0;
        if denom == 0.0 || !denom.is_finite() {
            return d0;
        }
        let t = (sx - r0) / denom;
        d0 + t * (d1 - d0)
    }
}

/// A log mapping from a positive domain to a screen interval.
///
/// Non-positive inputs have no image and map to `NaN`, which glyphs treat as a missing record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleLog {
    domain: (f64, f64),
    range: (f64, f64),
}

impl ScaleLog {
    /// Creates a new log scale.
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Creates a scale from a data range.
    pub fn from_range(range: Range1d, target: (f64, f64)) -> Self {
        Self::new((range.start, range.end), target)
    }

    fn log_domain(&self) -> Option<(f64, f64)> {
        let (d0, d1) = self.domain;
        if d0 <= 0.0 || d1 <= 0.0 {
            return None;
        }
        let (l0, l1) = (d0.ln(), d1.ln());
        (l1 != l0 && l0.is_finite() && l1.is_finite()).then_some((l0, l1))
    }

    /// Maps a value from domain space into range space.
    pub fn compute(&self, x: f64) -> f64 {
        let (r0, r1) = self.range;
        let Some((l0, l1)) = self.log_domain() else {
            return r0;
        };
        if x <= 0.0 {
            return f64::NAN;
        }
        let t = (x.ln() - l0) / (l1 - l0);
        r0 + t * (r1 - r0)
    }

    /// Maps a value from range space into domain space.
    pub fn invert(&self, sx: f64) -> f64 {
        let (r0, r1) = self.range;
        let Some((l0, l1)) = self.log_domain() else {
            return self.domain.0;
        };
        let denom = r1 - r0;
        if denom == 0.0 {
            return self.domain.0;
        }
        let t = (sx - r0) / denom;
        (l0 + t * (l1 - l0)).exp()
    }
}

/// A scale over factor ordinals.
///
/// Ordinals are first placed on a synthetic axis where each group after the first is shifted
/// right by `group_padding`; the synthetic axis is then mapped linearly to the screen. With a
/// single group the scale is affine in ordinal space.
#[derive(Clone, Debug, PartialEq)]
pub struct ScaleCategorical {
    count: usize,
    group_starts: Vec<usize>,
    group_padding: f64,
    inner: ScaleLinear,
}

impl ScaleCategorical {
    /// Creates a scale mapping the whole factor range onto `target`.
    pub fn new(factors: &FactorRange, target: (f64, f64)) -> Self {
        Self {
            count: factors.len(),
            group_starts: factors.group_starts(),
            group_padding: factors.group_padding,
            inner: ScaleLinear::new((0.0, factors.synthetic_len()), target),
        }
    }

    /// Number of groups.
    pub fn group_count(&self) -> usize {
        if self.count == 0 {
            0
        } else {
            self.group_starts.len() + 1
        }
    }

    /// Returns `true` if groups are separated by padding, making the mapping piecewise.
    pub fn has_group_gaps(&self) -> bool {
        self.group_count() > 1 && self.group_padding > 0.0
    }

    /// Number of group boundaries before factor `k`.
    fn gaps_before(&self, k: usize) -> usize {
        self.group_starts.partition_point(|start| *start <= k)
    }

    fn to_synthetic(&self, ordinal: f64) -> f64 {
        if !ordinal.is_finite() || self.count == 0 {
            return ordinal;
        }
        let last = (self.count - 1) as f64;
        let k = ordinal.floor().clamp(0.0, last);
        #[allow(
            clippy::cast_possible_truncation,
            reason = "clamped to the factor index range above"
        )]
        let gaps = self.gaps_before(k as usize);
        ordinal + self.group_padding * gaps as f64
    }

    fn from_synthetic(&self, synthetic: f64) -> f64 {
        if !synthetic.is_finite() {
            return synthetic;
        }
        // Walk groups from the right: the first group whose shifted start lies left of the
        // value owns it. Values inside a gap snap to the end of the previous group.
        for (g, start) in self.group_starts.iter().enumerate().rev() {
            let shift = self.group_padding * (g + 1) as f64;
            let shifted_start = *start as f64 + shift;
            if synthetic >= shifted_start {
                return synthetic - shift;
            }
            let prev_shift = self.group_padding * g as f64;
            if synthetic >= *start as f64 + prev_shift {
                return *start as f64;
            }
        }
        synthetic
    }

    /// Maps a factor ordinal to screen space.
    pub fn compute(&self, ordinal: f64) -> f64 {
        self.inner.compute(self.to_synthetic(ordinal))
    }

    /// Maps a screen value back to an ordinal.
    pub fn invert(&self, sx: f64) -> f64 {
        self.from_synthetic(self.inner.invert(sx))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    struct XorShift(u64);

    impl XorShift {
        fn next_f64(&mut self) -> f64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            (self.0 >> 11) as f64 / (1_u64 << 53) as f64
        }
    }

    fn assert_round_trips(scale: &Scale, xs: impl Iterator<Item = f64>) {
        for x in xs {
            let back = scale.invert(scale.compute(x));
            assert!(
                (back - x).abs() <= 1e-9 * x.abs().max(1.0),
                "{x} came back as {back} through {scale:?}"
            );
        }
    }

    #[test]
    fn linear_round_trips_including_extrapolation() {
        let mut rng = XorShift(7);
        let scale = Scale::from(ScaleLinear::new((-10.0, 30.0), (400.0, 0.0)));
        assert_round_trips(&scale, (0..200).map(|_| rng.next_f64() * 200.0 - 100.0));
    }

    #[test]
    fn log_round_trips_positive_values() {
        let mut rng = XorShift(11);
        let scale = Scale::from(ScaleLog::new((1.0, 1000.0), (0.0, 300.0)));
        assert_round_trips(&scale, (0..200).map(|_| 0.1 + rng.next_f64() * 5000.0));
        assert!(scale.compute(0.0).is_nan());
        assert!(scale.compute(-1.0).is_nan());
    }

    #[test]
    fn categorical_round_trips_inside_factors() {
        let factors = FactorRange::new([("a", "1"), ("a", "2"), ("b", "1"), ("c", "1")])
            .with_group_padding(0.5);
        let scale = Scale::from(ScaleCategorical::new(&factors, (0.0, 500.0)));
        let mut rng = XorShift(13);
        assert_round_trips(&scale, (0..200).map(|_| rng.next_f64() * 3.999));
    }

    #[test]
    fn degenerate_domains_map_to_target_start() {
        let linear = Scale::from(ScaleLinear::new((5.0, 5.0), (10.0, 20.0)));
        assert_eq!(linear.compute(5.0), 10.0);
        assert_eq!(linear.compute(123.0), 10.0);
        let log = Scale::from(ScaleLog::new((2.0, 2.0), (10.0, 20.0)));
        assert_eq!(log.compute(3.0), 10.0);
        let no_factors = FactorRange::new(Vec::<&str>::new());
        let empty = Scale::from(ScaleCategorical::new(&no_factors, (10.0, 20.0)));
        assert_eq!(empty.compute(0.5), 10.0);
    }

    #[test]
    fn r_invert_orders_its_output() {
        let flipped = Scale::from(ScaleLinear::new((0.0, 10.0), (100.0, 0.0)));
        let (x0, x1) = flipped.r_invert(10.0, 90.0);
        assert!(x0 <= x1);
        assert!((x0 - 1.0).abs() < 1e-12);
        assert!((x1 - 9.0).abs() < 1e-12);
    }

    #[test]
    fn group_gaps_shift_later_groups() {
        let factors =
            FactorRange::new([("a", "1"), ("a", "2"), ("b", "1")]).with_group_padding(1.0);
        let scale = ScaleCategorical::new(&factors, (0.0, 4.0));
        assert_eq!(scale.group_count(), 2);
        assert_eq!(scale.compute(0.5), 0.5);
        assert_eq!(scale.compute(1.5), 1.5);
        assert_eq!(scale.compute(2.5), 3.5);
        // A screen position inside the gap snaps to the group boundary.
        assert_eq!(scale.invert(2.5), 2.0);
    }

    #[test]
    fn v_compute_maps_each_value() {
        let scale = Scale::from(ScaleLinear::new((0.0, 1.0), (0.0, 10.0)));
        assert_eq!(scale.v_compute(&[0.0, 0.5, 1.0]), [0.0, 5.0, 10.0]);
        assert_eq!(scale.v_invert(&[0.0, 5.0]), [0.0, 0.5]);
        assert_eq!(scale.r_compute(0.0, 1.0), (0.0, 10.0));
        assert_eq!(scale.offset(3.0).compute(1.0), 13.0);
    }
}
