// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Data ranges that scales are built from.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

/// A continuous data range.
///
/// `start` may be larger than `end`, which flips the axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Range1d {
    /// Data value mapped to the start of the screen extent.
    pub start: f64,
    /// Data value mapped to the end of the screen extent.
    pub end: f64,
}

impl Range1d {
    /// Creates a new range.
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Smallest of `start` and `end`.
    pub fn min(&self) -> f64 {
        self.start.min(self.end)
    }

    /// Largest of `start` and `end`.
    pub fn max(&self) -> f64 {
        self.start.max(self.end)
    }

    /// Signed extent `end - start`.
    pub fn span(&self) -> f64 {
        self.end - self.start
    }
}

/// One categorical factor, optionally nested in a group.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Factor {
    /// A top-level factor.
    Flat(String),
    /// A `(group, factor)` pair.
    Nested(String, String),
}

impl From<&str> for Factor {
    fn from(value: &str) -> Self {
        Self::Flat(value.into())
    }
}

impl From<(&str, &str)> for Factor {
    fn from((group, factor): (&str, &str)) -> Self {
        Self::Nested(group.into(), factor.into())
    }
}

impl Factor {
    fn group(&self) -> Option<&str> {
        match self {
            Self::Flat(_) => None,
            Self::Nested(g, _) => Some(g),
        }
    }
}

/// An ordered list of categorical factors.
///
/// Coordinates on a factor range are *ordinals*: factor `k` covers `[k, k + 1)` and its
/// center is `k + 0.5`. Consecutive nested factors with the same group form a group; a gap of
/// `group_padding` factor widths separates groups on screen, which makes grouped ranges
/// non-affine in ordinal space.
#[derive(Clone, Debug, PartialEq)]
pub struct FactorRange {
    /// The factors, in display order.
    pub factors: Vec<Factor>,
    /// Gap between groups, in factor widths.
    pub group_padding: f64,
}

impl FactorRange {
    /// Creates a range over `factors` with a group padding of `1.4`.
    pub fn new(factors: impl IntoIterator<Item = impl Into<Factor>>) -> Self {
        Self {
            factors: factors.into_iter().map(Into::into).collect(),
            group_padding: 1.4,
        }
    }

    /// Sets the gap between groups.
    pub fn with_group_padding(mut self, padding: f64) -> Self {
        self.group_padding = if padding.is_finite() {
            padding.max(0.0)
        } else {
            0.0
        };
        self
    }

    /// Number of factors.
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    /// Returns `true` if there are no factors.
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Center ordinal of `factor`, or `None` if it is not part of the range.
    pub fn ordinal(&self, factor: impl Into<Factor>) -> Option<f64> {
        let factor = factor.into();
        self.factors
            .iter()
            .position(|f| *f == factor)
            .map(|k| k as f64 + 0.5)
    }

    /// Converts factor names into center ordinals; unknown names become `NaN`.
    pub fn ordinals<'a>(&self, factors: impl IntoIterator<Item = &'a str>) -> Vec<f64> {
        factors
            .into_iter()
            .map(|f| self.ordinal(f).unwrap_or(f64::NAN))
            .collect()
    }

    /// Ordinal index at which each group after the first starts.
    pub fn group_starts(&self) -> Vec<usize> {
        let mut out = Vec::new();
        for (k, pair) in self.factors.windows(2).enumerate() {
            if pair[0].group() != pair[1].group() {
                out.push(k + 1);
            }
        }
        out
    }

    /// Extent of the range on the synthetic axis, gaps included.
    pub fn synthetic_len(&self) -> f64 {
        self.len() as f64 + self.group_padding * self.group_starts().len() as f64
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn ordinals_are_factor_centers() {
        let r = FactorRange::new(["a", "b", "c"]);
        assert_eq!(r.ordinal("b"), Some(1.5));
        assert_eq!(r.ordinal("z"), None);
        let o = r.ordinals(["c", "z"]);
        assert_eq!(o[0], 2.5);
        assert!(o[1].is_nan());
    }

    #[test]
    fn groups_start_where_the_group_changes() {
        let r = FactorRange::new([("x", "1"), ("x", "2"), ("y", "1"), ("z", "1")])
            .with_group_padding(0.5);
        assert_eq!(r.group_starts(), [2, 3]);
        assert_eq!(r.synthetic_len(), 5.0);
        assert_eq!(r.ordinal(("y", "1")), Some(2.5));
    }
}
