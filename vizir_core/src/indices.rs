// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A fixed-size bitset over record indices.

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;

const WORD: usize = 32;

/// A fixed-size set of record indices in `0..size`, stored as bits.
///
/// Used for per-record masks (muted records, decimation) and for the set arithmetic the
/// renderer performs when splitting records between decoration passes.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Indices {
    size: usize,
    words: Vec<u32>,
}

impl Indices {
    /// Creates an empty set over `size` records.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            words: vec![0; size.div_ceil(WORD)],
        }
    }

    /// Creates a set containing every record in `0..size`.
    pub fn all(size: usize) -> Self {
        let mut out = Self::new(size);
        for w in &mut out.words {
            *w = u32::MAX;
        }
        out.clear_tail();
        out
    }

    /// Creates a set from record indices; indices `>= size` are ignored.
    pub fn from_indices(size: usize, indices: impl IntoIterator<Item = usize>) -> Self {
        let mut out = Self::new(size);
        for i in indices {
            out.insert(i);
        }
        out
    }

    /// Creates a set from a boolean mask.
    pub fn from_mask(mask: &[bool]) -> Self {
        Self::from_indices(
            mask.len(),
            mask.iter().enumerate().filter(|(_, m)| **m).map(|(i, _)| i),
        )
    }

    /// Number of records this set ranges over.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of records in the set.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns `true` if no record is set.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Adds record `i`. Out-of-range indices are ignored.
    pub fn insert(&mut self, i: usize) {
        if i < self.size {
            self.words[i / WORD] |= 1 << (i % WORD);
        }
    }

    /// Removes record `i`.
    pub fn remove(&mut self, i: usize) {
        if i < self.size {
            self.words[i / WORD] &= !(1 << (i % WORD));
        }
    }

    /// Returns `true` if record `i` is in the set.
    pub fn contains(&self, i: usize) -> bool {
        i < self.size && self.words[i / WORD] & (1 << (i % WORD)) != 0
    }

    /// Returns the records not in this set.
    #[must_use]
    pub fn complement(&self) -> Self {
        let mut out = self.clone();
        for w in &mut out.words {
            *w = !*w;
        }
        out.clear_tail();
        out
    }

    /// Returns the records in both sets. Sizes are taken from `self`.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        let mut out = self.clone();
        for (i, w) in out.words.iter_mut().enumerate() {
            *w &= other.words.get(i).copied().unwrap_or(0);
        }
        out
    }

    /// Returns the records in `self` but not in `other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        let mut out = self.clone();
        for (i, w) in out.words.iter_mut().enumerate() {
            *w &= !other.words.get(i).copied().unwrap_or(0);
        }
        out
    }

    /// Iterates over the set records in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &word)| {
            let mut bits = word;
            core::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let tz = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some(wi * WORD + tz)
            })
        })
    }

    /// Collects the set records into a vector.
    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }

    fn clear_tail(&mut self) {
        let rem = self.size % WORD;
        if rem != 0
            && let Some(last) = self.words.last_mut()
        {
            *last &= (1_u32 << rem) - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn complement_respects_size() {
        let set = Indices::from_indices(40, [1, 2, 39]);
        let inv = set.complement();
        assert_eq!(inv.count(), 37);
        assert!(!inv.contains(39));
        assert!(inv.contains(0));
        assert!(!inv.contains(40));
    }

    #[test]
    fn set_arithmetic() {
        let a = Indices::from_indices(8, [0, 1, 2, 3]);
        let b = Indices::from_indices(8, [2, 3, 4]);
        assert_eq!(a.intersection(&b).to_vec(), alloc::vec![2, 3]);
        assert_eq!(a.difference(&b).to_vec(), alloc::vec![0, 1]);
        assert_eq!(Indices::all(5).to_vec(), alloc::vec![0, 1, 2, 3, 4]);
    }
}
