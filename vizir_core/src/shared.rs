// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-record arrays that can be shared between a glyph and its decorations.

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::ops::Deref;

/// A per-record array that is either owned by its holder or inherited from a peer.
///
/// Decoration glyphs (selected, hovered, muted, ...) reuse the arrays of their base glyph when
/// the inputs that produced them are identical. Inheriting clones the `Arc`, never the values.
///
/// Writes always go through [`Shared::to_mut`], which materializes a private copy first when the
/// array is inherited or still referenced by a peer, so a holder can never change values another
/// glyph is reading.
#[derive(Clone, Debug)]
pub enum Shared<T> {
    /// Computed by the holder.
    Owned(Arc<Vec<T>>),
    /// Borrowed read-only from a peer.
    Inherited(Arc<Vec<T>>),
}

impl<T> Shared<T> {
    /// Wraps freshly computed values.
    pub fn owned(values: Vec<T>) -> Self {
        Self::Owned(Arc::new(values))
    }

    /// Returns a read-only handle to the same values, marked as inherited.
    pub fn inherit(&self) -> Self {
        Self::Inherited(Arc::clone(self.arc()))
    }

    /// Returns `true` if the values were borrowed from a peer.
    pub fn is_inherited(&self) -> bool {
        matches!(self, Self::Inherited(_))
    }

    /// Returns `true` if both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(self.arc(), other.arc())
    }

    /// Returns the values as a slice.
    pub fn as_slice(&self) -> &[T] {
        self.arc().as_slice()
    }

    fn arc(&self) -> &Arc<Vec<T>> {
        match self {
            Self::Owned(a) | Self::Inherited(a) => a,
        }
    }
}

impl<T: Clone> Shared<T> {
    /// Returns a mutable view of the values, copying them first if they are shared.
    ///
    /// After this call the array is always [`Shared::Owned`].
    pub fn to_mut(&mut self) -> &mut Vec<T> {
        if let Self::Inherited(a) = self {
            let copy = Vec::clone(a);
            *self = Self::Owned(Arc::new(copy));
        }
        match self {
            Self::Owned(a) | Self::Inherited(a) => Arc::make_mut(a),
        }
    }
}

impl<T> Default for Shared<T> {
    fn default() -> Self {
        Self::owned(Vec::new())
    }
}

impl<T> Deref for Shared<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> From<Vec<T>> for Shared<T> {
    fn from(values: Vec<T>) -> Self {
        Self::owned(values)
    }
}

/// A per-record value accessor that is either a broadcast scalar or a vector.
///
/// A scalar uniform answers [`Uniform::get`] for every index in `0..len` in O(1) without ever
/// materializing an array.
#[derive(Clone, Debug)]
pub enum Uniform<T> {
    /// The same value for every record.
    Scalar {
        /// The broadcast value.
        value: T,
        /// Number of records.
        len: usize,
    },
    /// One value per record.
    Vector(Shared<T>),
}

impl<T> Uniform<T> {
    /// Creates a scalar uniform over `len` records.
    pub fn scalar(value: T, len: usize) -> Self {
        Self::Scalar { value, len }
    }

    /// Creates a vector uniform from owned values.
    pub fn vector(values: Vec<T>) -> Self {
        Self::Vector(Shared::owned(values))
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        match self {
            Self::Scalar { len, .. } => *len,
            Self::Vector(v) => v.len(),
        }
    }

    /// Returns `true` if there are no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the value for record `i`.
    ///
    /// Scalars answer any index; vectors panic on out-of-range indices like slices do.
    pub fn get(&self, i: usize) -> &T {
        match self {
            Self::Scalar { value, .. } => value,
            Self::Vector(v) => &v[i],
        }
    }

    /// Returns the broadcast value if this is a scalar.
    pub fn as_scalar(&self) -> Option<&T> {
        match self {
            Self::Scalar { value, .. } => Some(value),
            Self::Vector(_) => None,
        }
    }

    /// Returns `true` if this is a scalar.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar { .. })
    }

    /// Returns `true` if the backing array was inherited from a peer.
    pub fn is_inherited(&self) -> bool {
        match self {
            Self::Scalar { .. } => false,
            Self::Vector(v) => v.is_inherited(),
        }
    }

    /// Iterates over all `len` values.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    /// Maps every value, keeping scalars scalar.
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> Uniform<U> {
        match self {
            Self::Scalar { value, len } => Uniform::Scalar {
                value: f(value),
                len: *len,
            },
            Self::Vector(v) => Uniform::vector(v.iter().map(f).collect()),
        }
    }
}

impl<T: Default> Default for Uniform<T> {
    fn default() -> Self {
        Self::scalar(T::default(), 0)
    }
}

impl<T: Clone> Uniform<T> {
    /// Returns a handle that shares vector storage with `self`, marked as inherited.
    pub fn inherit(&self) -> Self {
        match self {
            Self::Scalar { value, len } => Self::Scalar {
                value: value.clone(),
                len: *len,
            },
            Self::Vector(v) => Self::Vector(v.inherit()),
        }
    }
}

impl Uniform<f64> {
    /// Largest finite value, or `None` if there is none.
    pub fn max_finite(&self) -> Option<f64> {
        match self {
            Self::Scalar { value, len } => (*len > 0 && value.is_finite()).then_some(*value),
            Self::Vector(v) => v
                .iter()
                .copied()
                .filter(|x| x.is_finite())
                .fold(None, |acc: Option<f64>, x| Some(acc.map_or(x, |a| a.max(x)))),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;

    #[test]
    fn inherited_arrays_share_storage_until_written() {
        let base = Shared::owned(vec![1.0, 2.0, 3.0]);
        let mut deco = base.inherit();
        assert!(deco.is_inherited());
        assert!(deco.ptr_eq(&base));

        deco.to_mut()[0] = 10.0;
        assert!(!deco.is_inherited());
        assert!(!deco.ptr_eq(&base));
        assert_eq!(base.as_slice(), &[1.0, 2.0, 3.0]);
        assert_eq!(deco.as_slice(), &[10.0, 2.0, 3.0]);
    }

    #[test]
    fn owned_array_lent_to_a_peer_is_copied_on_write() {
        let mut base = Shared::owned(vec![1.0, 2.0]);
        let deco = base.inherit();
        base.to_mut()[1] = 5.0;
        assert_eq!(deco.as_slice(), &[1.0, 2.0]);
        assert_eq!(base.as_slice(), &[1.0, 5.0]);
    }

    #[test]
    fn scalar_uniform_answers_every_index() {
        let u = Uniform::scalar(5.0, 3);
        assert_eq!(u.len(), 3);
        assert_eq!(*u.get(0), 5.0);
        assert_eq!(*u.get(2), 5.0);
        assert!(u.is_scalar());
        let doubled = u.map(|x| x * 2.0);
        assert_eq!(doubled.as_scalar(), Some(&10.0));
    }

    #[test]
    fn max_finite_skips_nan() {
        let u = Uniform::vector(vec![1.0, f64::NAN, 4.0, f64::INFINITY]);
        assert_eq!(u.max_finite(), Some(4.0));
        assert_eq!(Uniform::<f64>::scalar(f64::NAN, 2).max_finite(), None);
    }
}
