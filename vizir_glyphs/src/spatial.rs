// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A packed Hilbert R-tree over per-record bounding boxes.
//!
//! Every glyph view builds one index from its data-space geometry right after reading its
//! columns. Queries are conservative: they return every record whose box intersects the query
//! rectangle and possibly a few more, so callers always finish with an exact geometric test.

extern crate alloc;

use alloc::vec::Vec;

use kurbo::Rect;
use smallvec::SmallVec;

/// Maximum number of children per tree node.
const NODE_SIZE: usize = 16;

/// A box that never intersects anything and never grows a union.
const EMPTY: [f64; 4] = [f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY];

/// Collects one bounding box per record, in record order.
#[derive(Clone, Debug)]
pub struct SpatialIndexBuilder {
    boxes: Vec<[f64; 4]>,
}

impl SpatialIndexBuilder {
    /// Creates a builder expecting roughly `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            boxes: Vec::with_capacity(capacity),
        }
    }

    /// Appends the box of the next record.
    ///
    /// Corners may be given in any order. A box with any non-finite coordinate is stored as
    /// empty so the record never matches a query.
    pub fn add_rect(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) {
        if x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite() {
            self.boxes
                .push([x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)]);
        } else {
            self.boxes.push(EMPTY);
        }
    }

    /// Appends a zero-area box for a point-like record.
    pub fn add_point(&mut self, x: f64, y: f64) {
        self.add_rect(x, y, x, y);
    }

    /// Appends a record that keeps its slot but never matches a query.
    pub fn add_empty(&mut self) {
        self.boxes.push(EMPTY);
    }

    /// Number of records added so far.
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Returns `true` if no record was added.
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Freezes the index.
    pub fn finish(self) -> SpatialIndex {
        SpatialIndex::build(self.boxes)
    }
}

/// An immutable spatial index over `n` records.
#[derive(Clone, Debug, Default)]
pub struct SpatialIndex {
    num_items: usize,
    /// Item boxes (sorted along the Hilbert curve) followed by node boxes, level by level.
    boxes: Vec<[f64; 4]>,
    /// Record index for item slots, first child slot for node slots.
    slots: Vec<usize>,
    /// Exclusive end slot of each level, leaves first.
    level_bounds: SmallVec<[usize; 8]>,
    bbox: Option<Rect>,
}

impl SpatialIndex {
    fn build(items: Vec<[f64; 4]>) -> Self {
        let num_items = items.len();
        if num_items == 0 {
            return Self::default();
        }

        let mut bbox = EMPTY;
        for b in &items {
            bbox = union(bbox, *b);
        }
        let bbox_rect = is_valid(bbox).then(|| Rect::new(bbox[0], bbox[1], bbox[2], bbox[3]));

        // Sort items along a Hilbert curve through their centers. Empty boxes go last.
        let width = bbox[2] - bbox[0];
        let height = bbox[3] - bbox[1];
        let hilbert_max = f64::from(u16::MAX);
        let mut order: Vec<(u32, usize)> = items
            .iter()
            .enumerate()
            .map(|(i, b)| {
                if !is_valid(*b) {
                    return (u32::MAX, i);
                }
                let cx = 0.5 * (b[0] + b[2]);
                let cy = 0.5 * (b[1] + b[3]);
                let hx = if width > 0.0 {
                    hilbert_max * (cx - bbox[0]) / width
                } else {
                    0.0
                };
                let hy = if height > 0.0 {
                    hilbert_max * (cy - bbox[1]) / height
                } else {
                    0.0
                };
                (hilbert(quantize(hx), quantize(hy)), i)
            })
            .collect();
        order.sort_unstable();

        let mut level_bounds: SmallVec<[usize; 8]> = SmallVec::new();
        let mut n = num_items;
        let mut num_nodes = n;
        level_bounds.push(num_nodes);
        loop {
            n = n.div_ceil(NODE_SIZE);
            num_nodes += n;
            level_bounds.push(num_nodes);
            if n == 1 {
                break;
            }
        }

        let mut boxes = Vec::with_capacity(num_nodes);
        let mut slots = Vec::with_capacity(num_nodes);
        for &(_, i) in &order {
            boxes.push(items[i]);
            slots.push(i);
        }

        let mut pos = 0;
        for &end in &level_bounds[..level_bounds.len() - 1] {
            while pos < end {
                let first = pos;
                let mut node = EMPTY;
                for _ in 0..NODE_SIZE {
                    if pos >= end {
                        break;
                    }
                    node = union(node, boxes[pos]);
                    pos += 1;
                }
                boxes.push(node);
                slots.push(first);
            }
        }

        Self {
            num_items,
            boxes,
            slots,
            level_bounds,
            bbox: bbox_rect,
        }
    }

    /// Number of records in the index.
    pub fn len(&self) -> usize {
        self.num_items
    }

    /// Returns `true` if the index holds no records.
    pub fn is_empty(&self) -> bool {
        self.num_items == 0
    }

    /// Bounding box of all records with finite geometry, if any.
    pub fn bbox(&self) -> Option<Rect> {
        self.bbox
    }

    /// Returns the candidate records whose boxes intersect `rect`.
    ///
    /// The sequence is lazy and may contain false positives but never misses an intersecting
    /// record. Records with non-finite geometry are never returned.
    pub fn indices(&self, rect: Rect) -> Indices<'_> {
        let query = [
            rect.x0.min(rect.x1),
            rect.y0.min(rect.y1),
            rect.x0.max(rect.x1),
            rect.y0.max(rect.y1),
        ];
        let mut out = Indices {
            index: self,
            query,
            pos: 0,
            end: 0,
            queue: SmallVec::new(),
        };
        if self.num_items > 0 && !query.iter().any(|v| v.is_nan()) {
            let root = self.boxes.len() - 1;
            out.pos = root;
            out.end = root + 1;
        }
        out
    }

    fn upper_bound(&self, slot: usize) -> usize {
        self.level_bounds
            .iter()
            .copied()
            .find(|&b| b > slot)
            .unwrap_or(self.boxes.len())
    }
}

/// Lazy iterator over the candidates of a [`SpatialIndex::indices`] query.
#[derive(Clone, Debug)]
pub struct Indices<'a> {
    index: &'a SpatialIndex,
    query: [f64; 4],
    pos: usize,
    end: usize,
    queue: SmallVec<[usize; 32]>,
}

impl Iterator for Indices<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            while self.pos < self.end {
                let slot = self.pos;
                self.pos += 1;
                if !intersects(self.index.boxes[slot], self.query) {
                    continue;
                }
                let target = self.index.slots[slot];
                if slot < self.index.num_items {
                    return Some(target);
                }
                self.queue.push(target);
            }
            let node = self.queue.pop()?;
            self.pos = node;
            self.end = (node + NODE_SIZE).min(self.index.upper_bound(node));
        }
    }
}

fn is_valid(b: [f64; 4]) -> bool {
    b[0] <= b[2] && b[1] <= b[3]
}

fn union(a: [f64; 4], b: [f64; 4]) -> [f64; 4] {
    [a[0].min(b[0]), a[1].min(b[1]), a[2].max(b[2]), a[3].max(b[3])]
}

/// Empty boxes never intersect, even a query reaching to infinity.
fn intersects(b: [f64; 4], q: [f64; 4]) -> bool {
    is_valid(b) && b[0] <= q[2] && b[1] <= q[3] && b[2] >= q[0] && b[3] >= q[1]
}

fn quantize(v: f64) -> u32 {
    let v = v.clamp(0.0, f64::from(u16::MAX));
    #[allow(
        clippy::cast_possible_truncation,
        reason = "clamped to the u16 range above"
    )]
    {
        v as u32
    }
}

/// Position of `(x, y)` along a 16-bit Hilbert curve.
fn hilbert(x: u32, y: u32) -> u32 {
    let mut a = x ^ y;
    let mut b = 0xFFFF ^ a;
    let mut c = 0xFFFF ^ (x | y);
    let mut d = x & (y ^ 0xFFFF);

    let mut aa = a | (b >> 1);
    let mut bb = (a >> 1) ^ a;
    let mut cc = ((c >> 1) ^ (b & (d >> 1))) ^ c;
    let mut dd = ((a & (c >> 1)) ^ (d >> 1)) ^ d;

    a = aa;
    b = bb;
    c = cc;
    d = dd;
    aa = (a & (a >> 2)) ^ (b & (b >> 2));
    bb = (a & (b >> 2)) ^ (b & ((a ^ b) >> 2));
    cc ^= (a & (c >> 2)) ^ (b & (d >> 2));
    dd ^= (b & (c >> 2)) ^ ((a ^ b) & (d >> 2));

    a = aa;
    b = bb;
    c = cc;
    d = dd;
    aa = (a & (a >> 4)) ^ (b & (b >> 4));
    bb = (a & (b >> 4)) ^ (b & ((a ^ b) >> 4));
    cc ^= (a & (c >> 4)) ^ (b & (d >> 4));
    dd ^= (b & (c >> 4)) ^ ((a ^ b) & (d >> 4));

    a = aa;
    b = bb;
    c = cc;
    d = dd;
    cc ^= (a & (c >> 8)) ^ (b & (d >> 8));
    dd ^= (b & (c >> 8)) ^ ((a ^ b) & (d >> 8));

    a = cc ^ (cc >> 1);
    b = dd ^ (dd >> 1);

    let mut i0 = x ^ y;
    let mut i1 = b | (0xFFFF ^ (i0 | a));

    i0 = (i0 | (i0 << 8)) & 0x00FF_00FF;
    i0 = (i0 | (i0 << 4)) & 0x0F0F_0F0F;
    i0 = (i0 | (i0 << 2)) & 0x3333_3333;
    i0 = (i0 | (i0 << 1)) & 0x5555_5555;

    i1 = (i1 | (i1 << 8)) & 0x00FF_00FF;
    i1 = (i1 | (i1 << 4)) & 0x0F0F_0F0F;
    i1 = (i1 | (i1 << 2)) & 0x3333_3333;
    i1 = (i1 | (i1 << 1)) & 0x5555_5555;

    (i1 << 1) | i0
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec::Vec;

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

    fn brute_force(boxes: &[[f64; 4]], q: Rect) -> Vec<usize> {
        boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b[0] <= q.x1 && b[2] >= q.x0 && b[1] <= q.y1 && b[3] >= q.y0)
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn queries_are_a_superset_of_brute_force() {
        let mut rng = XorShift(0x2545_F491_4F6C_DD1D);
        for n in [0_usize, 1, 7, 16, 17, 100, 1000] {
            let mut boxes = Vec::new();
            let mut builder = SpatialIndexBuilder::new(n);
            for _ in 0..n {
                let x = rng.next_f64() * 100.0;
                let y = rng.next_f64() * 100.0;
                let w = rng.next_f64() * 5.0;
                let h = rng.next_f64() * 5.0;
                boxes.push([x, y, x + w, y + h]);
                builder.add_rect(x, y, x + w, y + h);
            }
            let index = builder.finish();
            assert_eq!(index.len(), n);
            for _ in 0..50 {
                let x0 = rng.next_f64() * 100.0;
                let y0 = rng.next_f64() * 100.0;
                let q = Rect::new(x0, y0, x0 + rng.next_f64() * 30.0, y0 + rng.next_f64() * 30.0);
                let mut got: Vec<usize> = index.indices(q).collect();
                got.sort_unstable();
                for expected in brute_force(&boxes, q) {
                    assert!(
                        got.binary_search(&expected).is_ok(),
                        "record {expected} missing from query {q:?} over {n} records"
                    );
                }
            }
        }
    }

    #[test]
    fn non_finite_records_never_match() {
        let mut builder = SpatialIndexBuilder::new(4);
        builder.add_point(0.0, 0.0);
        builder.add_point(f64::NAN, 1.0);
        builder.add_rect(0.0, 0.0, f64::INFINITY, 1.0);
        builder.add_empty();
        let index = builder.finish();
        let everything = Rect::new(
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
            f64::INFINITY,
            f64::INFINITY,
        );
        let got: Vec<usize> = index.indices(everything).collect();
        assert_eq!(got, [0]);
        assert_eq!(index.bbox(), Some(Rect::new(0.0, 0.0, 0.0, 0.0)));
    }

    #[test]
    fn unbounded_queries_skip_empty_subtrees() {
        let mut builder = SpatialIndexBuilder::new(40);
        for _ in 0..32 {
            builder.add_empty();
        }
        for i in 0..8 {
            builder.add_point(f64::from(i), f64::NAN);
        }
        let index = builder.finish();
        let half_plane = Rect::new(0.0, f64::NEG_INFINITY, f64::INFINITY, f64::INFINITY);
        assert_eq!(index.indices(half_plane).count(), 0);
        assert_eq!(index.bbox(), None);
    }

    #[test]
    fn bbox_ignores_non_finite_records() {
        let mut builder = SpatialIndexBuilder::new(5);
        for (x, y) in [(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (f64::NAN, 3.0), (4.0, 4.0)] {
            builder.add_point(x, y);
        }
        let index = builder.finish();
        assert_eq!(index.bbox(), Some(Rect::new(0.0, 0.0, 4.0, 4.0)));
    }

    #[test]
    fn nan_query_matches_nothing() {
        let mut builder = SpatialIndexBuilder::new(1);
        builder.add_point(0.0, 0.0);
        let index = builder.finish();
        assert_eq!(index.indices(Rect::new(f64::NAN, 0.0, 1.0, 1.0)).count(), 0);
    }
}
