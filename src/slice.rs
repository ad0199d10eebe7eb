// Copyright 2025 ndlazy developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use std::fmt;
use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use num_integer::Integer;

use crate::error::{from_kind, ErrorKind, Result};

/// A slice (range with step size).
///
/// Negative `start` or `end` indexes are counted from the back of the axis.
/// If `end` is `None`, the slice extends to the boundary of the axis in the
/// direction of `step`.
///
/// ## Examples
///
/// `Slice::new(0, None, 1)` is the full range of an axis. It can also be
/// created with `Slice::from(..)`.
///
/// `Slice::new(a, Some(b), 2)` is every second element from `a` until `b`.
/// It can also be created with `Slice::from(a..b).step_by(2)`.
///
/// `Slice::new(-1, None, -1)` is every element, in reverse order. Note that
/// `start` names a position, so the reversed axis starts at `-1` (the last
/// element), not at `0`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Slice {
    pub start: isize,
    pub end: Option<isize>,
    pub step: isize,
}

impl Slice {
    /// Create a new `Slice` with the given extents.
    ///
    /// See also the `From` impls, converting from ranges; for example
    /// `Slice::from(i..)` or `Slice::from(j..k)`.
    ///
    /// `step` must be nonzero.
    /// (This method checks with a debug assertion that `step` is not zero.)
    pub fn new(start: isize, end: Option<isize>, step: isize) -> Slice {
        debug_assert_ne!(step, 0, "Slice::new: step must be nonzero");
        Slice { start, end, step }
    }

    /// The full range of an axis, `Slice::new(0, None, 1)`.
    #[inline]
    pub fn full() -> Slice {
        Slice { start: 0, end: None, step: 1 }
    }

    /// Returns `true` if this is the full range of an axis.
    #[inline]
    pub fn is_full(&self) -> bool {
        *self == Slice::full()
    }

    /// Create a new `Slice` with the given step size (multiplied with the
    /// previous step size).
    ///
    /// This is a constructor convenience; it is not a composition of two
    /// slices (see `slice_slice` for that).
    ///
    /// `step` must be nonzero.
    /// (This method checks with a debug assertion that `step` is not zero.)
    #[inline]
    pub fn step_by(self, step: isize) -> Self {
        debug_assert_ne!(step, 0, "Slice::step_by: step must be nonzero");
        Slice { step: self.step * step, ..self }
    }

    /// Resolve against an axis of extent `size`, returning `(start, stop,
    /// step)` with negative positions normalized and both bounds clamped.
    ///
    /// The resolved triple never indexes out of bounds: iterating from
    /// `start` by `step` while short of `stop` visits only valid positions.
    pub fn indices(&self, size: usize) -> (isize, isize, isize) {
        let n = size as isize;
        let step = self.step;
        debug_assert_ne!(step, 0, "Slice::indices: step must be nonzero");
        let (lower, upper) = if step > 0 { (0, n) } else { (-1, n - 1) };

        let clamp = |mut i: isize| {
            if i < 0 {
                i += n;
                if i < lower {
                    i = lower;
                }
            } else if i > upper {
                i = upper;
            }
            i
        };

        let start = clamp(self.start);
        let stop = match self.end {
            Some(end) => clamp(end),
            None => if step > 0 { upper } else { lower },
        };
        (start, stop, step)
    }

    /// Number of positions selected from an axis of extent `size`.
    pub fn len(&self, size: usize) -> usize {
        let (start, stop, step) = self.indices(size);
        if step > 0 && stop > start {
            Integer::div_ceil(&(stop - start), &step) as usize
        } else if step < 0 && stop < start {
            Integer::div_ceil(&(start - stop), &-step) as usize
        } else {
            0
        }
    }

    /// The sequence of positions selected from an axis of extent `size`.
    pub fn positions(&self, size: usize) -> Vec<isize> {
        let (start, stop, step) = self.indices(size);
        let mut out = Vec::with_capacity(self.len(size));
        let mut i = start;
        while (step > 0 && i < stop) || (step < 0 && i > stop) {
            out.push(i);
            i += step;
        }
        out
    }
}

macro_rules! impl_slice_from_index_type {
    ($index:ty) => {
        impl From<Range<$index>> for Slice {
            #[inline]
            fn from(r: Range<$index>) -> Slice {
                Slice {
                    start: r.start as isize,
                    end: Some(r.end as isize),
                    step: 1,
                }
            }
        }

        impl From<RangeFrom<$index>> for Slice {
            #[inline]
            fn from(r: RangeFrom<$index>) -> Slice {
                Slice {
                    start: r.start as isize,
                    end: None,
                    step: 1,
                }
            }
        }

        impl From<RangeTo<$index>> for Slice {
            #[inline]
            fn from(r: RangeTo<$index>) -> Slice {
                Slice {
                    start: 0,
                    end: Some(r.end as isize),
                    step: 1,
                }
            }
        }
    };
}

impl_slice_from_index_type!(isize);
impl_slice_from_index_type!(usize);
impl_slice_from_index_type!(i32);

impl From<RangeFull> for Slice {
    #[inline]
    fn from(_: RangeFull) -> Slice {
        Slice::full()
    }
}

/// A single-dimension indexer: the whole axis, a slice, a scalar position,
/// an array of positions, or a boolean mask.
///
/// `Index(i)` selects position `i` and *removes* the dimension from the
/// result shape; all other variants keep it. `BoolMask` entries are lowered
/// to `IntArray` during canonicalization and never reach a backend.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Indexer {
    /// The entire axis, equivalent to `Slice::full()`.
    Full,
    /// A range with step size.
    Slice(Slice),
    /// A single position; collapses the dimension.
    Index(isize),
    /// Ordered, not necessarily unique positions.
    IntArray(Vec<isize>),
    /// One flag per axis position; selects the `true` positions.
    BoolMask(Vec<bool>),
}

impl Indexer {
    /// Returns `true` if `self` is a `Slice` or `Full` value.
    pub fn is_slice(&self) -> bool {
        matches!(self, Indexer::Full | Indexer::Slice(_))
    }

    /// Returns `true` if `self` is an `Index` value.
    pub fn is_index(&self) -> bool {
        matches!(self, Indexer::Index(_))
    }

    /// Returns `true` if `self` selects the entire axis.
    pub fn is_full(&self) -> bool {
        match self {
            Indexer::Full => true,
            Indexer::Slice(s) => s.is_full(),
            _ => false,
        }
    }

    /// Returns `true` if `self` is an `IntArray` or `BoolMask` value.
    pub fn is_array(&self) -> bool {
        matches!(self, Indexer::IntArray(_) | Indexer::BoolMask(_))
    }
}

impl fmt::Display for Indexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Indexer::Full => write!(f, ".."),
            Indexer::Index(index) => write!(f, "{}", index),
            Indexer::Slice(Slice { start, end, step }) => {
                if start != 0 {
                    write!(f, "{}", start)?;
                }
                write!(f, "..")?;
                if let Some(i) = end {
                    write!(f, "{}", i)?;
                }
                if step != 1 {
                    write!(f, ";{}", step)?;
                }
                Ok(())
            }
            Indexer::IntArray(ref values) => write!(f, "{:?}", values),
            Indexer::BoolMask(ref values) => write!(f, "{:?}", values),
        }
    }
}

impl From<Slice> for Indexer {
    #[inline]
    fn from(s: Slice) -> Indexer {
        Indexer::Slice(s)
    }
}

macro_rules! impl_indexer_from_index_type {
    ($index:ty) => {
        impl From<$index> for Indexer {
            #[inline]
            fn from(i: $index) -> Indexer {
                Indexer::Index(i as isize)
            }
        }

        impl From<Range<$index>> for Indexer {
            #[inline]
            fn from(r: Range<$index>) -> Indexer {
                Indexer::Slice(Slice::from(r))
            }
        }

        impl From<RangeFrom<$index>> for Indexer {
            #[inline]
            fn from(r: RangeFrom<$index>) -> Indexer {
                Indexer::Slice(Slice::from(r))
            }
        }

        impl From<RangeTo<$index>> for Indexer {
            #[inline]
            fn from(r: RangeTo<$index>) -> Indexer {
                Indexer::Slice(Slice::from(r))
            }
        }
    };
}

impl_indexer_from_index_type!(isize);
impl_indexer_from_index_type!(usize);
impl_indexer_from_index_type!(i32);

impl From<RangeFull> for Indexer {
    #[inline]
    fn from(_: RangeFull) -> Indexer {
        Indexer::Full
    }
}

impl From<Vec<isize>> for Indexer {
    #[inline]
    fn from(values: Vec<isize>) -> Indexer {
        Indexer::IntArray(values)
    }
}

impl<'a> From<&'a [isize]> for Indexer {
    #[inline]
    fn from(values: &'a [isize]) -> Indexer {
        Indexer::IntArray(values.to_vec())
    }
}

impl From<Vec<usize>> for Indexer {
    #[inline]
    fn from(values: Vec<usize>) -> Indexer {
        Indexer::IntArray(values.into_iter().map(|v| v as isize).collect())
    }
}

impl From<Vec<bool>> for Indexer {
    #[inline]
    fn from(values: Vec<bool>) -> Indexer {
        Indexer::BoolMask(values)
    }
}

impl<'a> From<&'a [bool]> for Indexer {
    #[inline]
    fn from(values: &'a [bool]) -> Indexer {
        Indexer::BoolMask(values.to_vec())
    }
}

/// Marker for the `...` position in a raw key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Ellipsis;

/// One entry of a raw key: either the `Ellipsis` marker or an indexer.
#[derive(Clone, Debug, PartialEq)]
pub enum KeyElem {
    Ellipsis,
    Indexer(Indexer),
}

impl From<Ellipsis> for KeyElem {
    #[inline]
    fn from(_: Ellipsis) -> KeyElem {
        KeyElem::Ellipsis
    }
}

macro_rules! impl_keyelem_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for KeyElem {
                #[inline]
                fn from(value: $t) -> KeyElem {
                    KeyElem::Indexer(Indexer::from(value))
                }
            }
        )*
    };
}

impl_keyelem_from! {
    Indexer, Slice, RangeFull,
    isize, Range<isize>, RangeFrom<isize>, RangeTo<isize>,
    usize, Range<usize>, RangeFrom<usize>, RangeTo<usize>,
    i32, Range<i32>, RangeFrom<i32>, RangeTo<i32>,
    Vec<isize>, Vec<usize>, Vec<bool>
}

/// A raw, possibly partial key, as supplied by calling code.
///
/// A `Key` may contain at most one `Ellipsis` marker and may have fewer
/// entries than the array has dimensions; `expand` turns it into a
/// fixed-length [`ExpandedKey`](crate::ExpandedKey). Keys are most
/// conveniently built with the [`key!`] macro.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Key {
    elems: Vec<KeyElem>,
}

impl Key {
    /// An empty key; expands to all-full slices.
    pub fn new() -> Key {
        Key { elems: Vec::new() }
    }

    pub fn from_elems(elems: Vec<KeyElem>) -> Key {
        Key { elems }
    }

    /// Build a key of plain indexers, without an `Ellipsis` marker.
    pub fn from_indexers<I>(indexers: I) -> Key
    where I: IntoIterator<Item = Indexer> {
        Key {
            elems: indexers.into_iter().map(KeyElem::Indexer).collect(),
        }
    }

    pub fn as_elems(&self) -> &[KeyElem] {
        &self.elems
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }
}

impl<T: Into<KeyElem>> FromIterator<T> for Key {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Key {
        Key {
            elems: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Resolve a possibly negative position against an axis of extent `len`.
pub(crate) fn resolve_index(i: isize, len: usize) -> Result<usize> {
    let n = len as isize;
    let j = if i < 0 { i + n } else { i };
    if j < 0 || j >= n {
        Err(from_kind(ErrorKind::OutOfBounds))
    } else {
        Ok(j as usize)
    }
}

/// Key argument constructor.
///
/// `key![]` takes a list of indexers separated by commas and converts it
/// into a [`Key`]. Entries may be anything convertible into a
/// [`KeyElem`]: indices, ranges, `..`, [`Slice`] values (use
/// `Slice::from(a..b).step_by(s)` for stepped slices), position vectors,
/// boolean mask vectors, and [`Ellipsis`].
///
/// ```
/// use ndlazy::{key, Ellipsis, Slice};
///
/// let k = key![0, Ellipsis, Slice::from(1..9).step_by(2), vec![0isize, 2]];
/// assert_eq!(k.len(), 4);
/// ```
#[macro_export]
macro_rules! key {
    ($($elem:expr),* $(,)?) => {
        $crate::Key::from_elems(vec![$($crate::KeyElem::from($elem)),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_indices_clamp() {
        assert_eq!(Slice::from(..).indices(5), (0, 5, 1));
        assert_eq!(Slice::new(-2, None, 1).indices(5), (3, 5, 1));
        assert_eq!(Slice::new(0, Some(99), 1).indices(5), (0, 5, 1));
        assert_eq!(Slice::new(-99, Some(-99), 1).indices(5), (0, 0, 1));
        assert_eq!(Slice::new(-1, None, -1).indices(5), (4, -1, -1));
        assert_eq!(Slice::new(99, Some(1), -2).indices(5), (4, 1, -2));
    }

    #[test]
    fn slice_positions() {
        assert_eq!(Slice::from(1..9).step_by(2).positions(10), vec![1, 3, 5, 7]);
        assert_eq!(Slice::new(-1, None, -2).positions(5), vec![4, 2, 0]);
        assert_eq!(Slice::from(3..3).positions(5), Vec::<isize>::new());
        assert_eq!(Slice::from(..).positions(0), Vec::<isize>::new());
    }

    #[test]
    fn slice_len_matches_positions() {
        for &(start, end, step) in &[
            (0, None, 1),
            (1, Some(9), 2),
            (-1, None, -1),
            (4, Some(-6), -3),
            (2, Some(2), 1),
            (-3, Some(99), 2),
        ] {
            let s = Slice::new(start, end, step);
            assert_eq!(s.len(7), s.positions(7).len(), "slice {:?}", s);
        }
    }

    #[test]
    fn indexer_display() {
        assert_eq!(format!("{}", Indexer::from(3usize)), "3");
        assert_eq!(format!("{}", Indexer::from(1..5)), "1..5");
        assert_eq!(format!("{}", Indexer::Slice(Slice::from(2..).step_by(-1))), "2..;-1");
        assert_eq!(format!("{}", Indexer::Full), "..");
    }

    #[test]
    fn key_macro() {
        let k = key![.., 3, Ellipsis, vec![0isize, 2]];
        assert_eq!(k.as_elems()[0], KeyElem::Indexer(Indexer::Full));
        assert_eq!(k.as_elems()[1], KeyElem::Indexer(Indexer::Index(3)));
        assert_eq!(k.as_elems()[2], KeyElem::Ellipsis);
        assert_eq!(k.as_elems()[3], KeyElem::Indexer(Indexer::IntArray(vec![0, 2])));
    }

    #[test]
    fn resolve_index_bounds() {
        assert_eq!(resolve_index(-1, 4).unwrap(), 3);
        assert_eq!(resolve_index(0, 4).unwrap(), 0);
        assert_eq!(resolve_index(4, 4).unwrap_err().kind(), ErrorKind::OutOfBounds);
        assert_eq!(resolve_index(-5, 4).unwrap_err().kind(), ErrorKind::OutOfBounds);
    }
}
