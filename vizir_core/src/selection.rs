// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable hit-test results.

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::Indices;

/// How a new selection combines with an existing one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SelectionMode {
    /// The new selection replaces the old one.
    #[default]
    Replace,
    /// Union of both selections.
    Append,
    /// Records present in both selections.
    Intersect,
    /// Records of the old selection that are not in the new one.
    Subtract,
}

/// A set of selected records, plus optional sub-geometry indices.
///
/// Selections are values: every constructor returns a complete selection and there are no
/// mutating methods. Record indices are kept sorted and deduplicated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    indices: Vec<usize>,
    line_indices: Vec<usize>,
    multiline_indices: BTreeMap<usize, Vec<usize>>,
}

impl Selection {
    /// The empty selection.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A selection of whole records.
    pub fn from_indices(indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            indices: sorted_unique(indices),
            ..Self::default()
        }
    }

    /// A selection of vertices along a single polyline.
    ///
    /// `line_indices` are the segment start vertices that were hit; the records are the same
    /// vertices.
    pub fn from_line_indices(line_indices: impl IntoIterator<Item = usize>) -> Self {
        let line_indices = sorted_unique(line_indices);
        Self {
            indices: line_indices.clone(),
            line_indices,
            multiline_indices: BTreeMap::new(),
        }
    }

    /// A selection of sub-lines: each key is a record, each value the hit segment starts.
    pub fn from_multiline_indices(multiline: BTreeMap<usize, Vec<usize>>) -> Self {
        let multiline_indices: BTreeMap<usize, Vec<usize>> = multiline
            .into_iter()
            .map(|(k, v)| (k, sorted_unique(v)))
            .collect();
        Self {
            indices: multiline_indices.keys().copied().collect(),
            line_indices: Vec::new(),
            multiline_indices,
        }
    }

    /// Selected records, sorted ascending.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Hit segment starts for single-line glyphs.
    pub fn line_indices(&self) -> &[usize] {
        &self.line_indices
    }

    /// Hit segment starts per record for multi-line glyphs.
    pub fn multiline_indices(&self) -> &BTreeMap<usize, Vec<usize>> {
        &self.multiline_indices
    }

    /// Returns `true` if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty() && self.line_indices.is_empty() && self.multiline_indices.is_empty()
    }

    /// Returns `true` if record `i` is selected.
    pub fn contains(&self, i: usize) -> bool {
        self.indices.binary_search(&i).is_ok()
    }

    /// Converts the record indices into a bitset over `size` records.
    pub fn to_indices(&self, size: usize) -> Indices {
        Indices::from_indices(size, self.indices.iter().copied())
    }

    /// Combines `self` (the existing selection) with `new` according to `mode`.
    #[must_use]
    pub fn update(&self, new: &Self, mode: SelectionMode) -> Self {
        match mode {
            SelectionMode::Replace => new.clone(),
            SelectionMode::Append => {
                let mut multiline = self.multiline_indices.clone();
                for (k, v) in &new.multiline_indices {
                    multiline.entry(*k).or_default().extend(v.iter().copied());
                }
                Self {
                    indices: sorted_unique(
                        self.indices.iter().chain(new.indices.iter()).copied(),
                    ),
                    line_indices: sorted_unique(
                        self.line_indices.iter().chain(new.line_indices.iter()).copied(),
                    ),
                    multiline_indices: multiline
                        .into_iter()
                        .map(|(k, v)| (k, sorted_unique(v)))
                        .collect(),
                }
            }
            SelectionMode::Intersect => Self {
                indices: retain(&self.indices, |i| new.contains(i)),
                line_indices: retain(&self.line_indices, |i| {
                    new.line_indices.binary_search(&i).is_ok()
                }),
                multiline_indices: self
                    .multiline_indices
                    .iter()
                    .filter(|(k, _)| new.multiline_indices.contains_key(k))
                    .map(|(k, v)| (*k, v.clone()))
                    .collect(),
            },
            SelectionMode::Subtract => Self {
                indices: retain(&self.indices, |i| !new.contains(i)),
                line_indices: retain(&self.line_indices, |i| {
                    new.line_indices.binary_search(&i).is_err()
                }),
                multiline_indices: self
                    .multiline_indices
                    .iter()
                    .filter(|(k, _)| !new.multiline_indices.contains_key(k))
                    .map(|(k, v)| (*k, v.clone()))
                    .collect(),
            },
        }
    }
}

fn sorted_unique(indices: impl IntoIterator<Item = usize>) -> Vec<usize> {
    let mut out: Vec<usize> = indices.into_iter().collect();
    out.sort_unstable();
    out.dedup();
    out
}

fn retain(indices: &[usize], keep: impl Fn(usize) -> bool) -> Vec<usize> {
    indices.iter().copied().filter(|i| keep(*i)).collect()
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;

    #[test]
    fn indices_are_sorted_and_unique() {
        let s = Selection::from_indices([3, 1, 3, 2]);
        assert_eq!(s.indices(), &[1, 2, 3]);
        assert!(s.contains(2));
        assert!(!s.contains(0));
    }

    #[test]
    fn modes_combine_selections() {
        let old = Selection::from_indices([1, 2, 3]);
        let new = Selection::from_indices([3, 4]);
        assert_eq!(old.update(&new, SelectionMode::Replace).indices(), &[3, 4]);
        assert_eq!(old.update(&new, SelectionMode::Append).indices(), &[1, 2, 3, 4]);
        assert_eq!(old.update(&new, SelectionMode::Intersect).indices(), &[3]);
        assert_eq!(old.update(&new, SelectionMode::Subtract).indices(), &[1, 2]);
    }

    #[test]
    fn multiline_keys_become_indices() {
        let mut m = BTreeMap::new();
        m.insert(4, vec![2, 0, 2]);
        m.insert(1, vec![7]);
        let s = Selection::from_multiline_indices(m);
        assert_eq!(s.indices(), &[1, 4]);
        assert_eq!(s.multiline_indices()[&4], vec![0, 2]);
    }
}
