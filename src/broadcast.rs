// Copyright 2025 ndlazy developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Conversion between broadcast-style (zipped fancy) keys and orthogonal
//! keys, plus compaction of position arrays back into slices.

use crate::dense::DenseArray;
use crate::error::{from_kind, ErrorKind, Result};
use crate::normalize::ExpandedKey;
use crate::slice::{Indexer, Slice};

/// One entry of a broadcast-style key. Unlike [`Indexer`], array entries may
/// be n-dimensional: an upstream broadcast-indexing layer shapes them for
/// mutual broadcasting.
#[derive(Clone, Debug, PartialEq)]
pub enum BroadcastIndexer {
    /// A single position; collapses the dimension.
    Index(isize),
    /// A range with step size.
    Slice(Slice),
    /// A position array, shaped for broadcasting against its peers.
    Array(DenseArray<isize>),
}

/// A broadcast-style key: array entries are broadcast together and zipped.
#[derive(Clone, Debug, PartialEq)]
pub struct BroadcastKey {
    elems: Vec<BroadcastIndexer>,
}

impl BroadcastKey {
    pub fn new(elems: Vec<BroadcastIndexer>) -> BroadcastKey {
        BroadcastKey { elems }
    }

    pub fn as_elems(&self) -> &[BroadcastIndexer] {
        &self.elems
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }
}

/// Convert a broadcast-style key into an equivalent orthogonal key, if one
/// exists.
///
/// A key of scalars and slices is already orthogonal. An array entry is
/// accepted only if, at its position `i_dim` among the array entries, its
/// entire size is concentrated on axis `i_dim` — the shape `numpy.ix_`-style
/// construction produces. Such an array selects positions independently of
/// its peers and can be raveled to 1-d. Anything else (in particular two
/// 1-d arrays zipped across different axes) has no orthogonal equivalent
/// and fails with [`ErrorKind::CannotOrthogonalize`].
pub fn unbroadcast(key: &BroadcastKey, shape: &[usize]) -> Result<ExpandedKey> {
    if key.len() > shape.len() {
        return Err(from_kind(ErrorKind::TooManyIndices));
    }

    let mut out = Vec::with_capacity(shape.len());
    let mut i_dim = 0;
    for k in key.as_elems() {
        match k {
            BroadcastIndexer::Index(i) => out.push(Indexer::Index(*i)),
            BroadcastIndexer::Slice(s) => out.push(Indexer::Slice(*s)),
            BroadcastIndexer::Array(a) if a.ndim() == 0 => {
                let i = *a.first().ok_or(from_kind(ErrorKind::InvalidIndexer))?;
                out.push(Indexer::Index(i));
            }
            BroadcastIndexer::Array(a) => {
                if i_dim >= a.ndim() || a.shape()[i_dim] != a.len() {
                    return Err(from_kind(ErrorKind::CannotOrthogonalize));
                }
                i_dim += 1;
                out.push(Indexer::IntArray(a.as_slice().to_vec()));
            }
        }
    }
    out.resize(shape.len(), Indexer::Slice(Slice::full()));
    Ok(ExpandedKey::from_vec(out))
}

/// Convert a position array into an equivalent slice, if possible.
///
/// Slices are cheaper than position arrays for every backend, and chunked
/// backends may reject or badly optimize fancy indices altogether, so
/// arrays that happen to be arithmetic progressions are compacted before
/// delegation. Positions must lie within `[-size, size)`; negative
/// positions are normalized. Arrays that are not constant-step progressions
/// (including repeated values) are returned unchanged.
pub fn maybe_convert_to_slice(values: &[isize], size: usize) -> Result<Indexer> {
    if values.is_empty() {
        return Ok(Indexer::Slice(Slice::new(0, Some(0), 1)));
    }

    let n = size as isize;
    let mut normalized = Vec::with_capacity(values.len());
    for &i in values {
        if i < -n || i >= n {
            return Err(from_kind(ErrorKind::OutOfBounds));
        }
        normalized.push(if i < 0 { i + n } else { i });
    }

    let start = normalized[0];
    if normalized.len() == 1 {
        return Ok(Indexer::Slice(Slice::new(start, Some(start + 1), 1)));
    }

    let step = normalized[1] - start;
    if step == 0 {
        // repeated positions cannot be a slice
        return Ok(Indexer::IntArray(normalized));
    }
    let stop = start + step * normalized.len() as isize;
    // A stop that runs off the front of the axis can only be expressed as
    // an open end.
    let end = if stop < 0 { None } else { Some(stop) };
    let guess = Slice::new(start, end, step);
    if guess.positions(size) == normalized {
        Ok(Indexer::Slice(guess))
    } else {
        Ok(Indexer::IntArray(normalized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arr(values: Vec<isize>) -> BroadcastIndexer {
        BroadcastIndexer::Array(DenseArray::from_vec(values))
    }

    #[test]
    fn unbroadcast_basic_key_unchanged() {
        let key = BroadcastKey::new(vec![
            BroadcastIndexer::Index(2),
            BroadcastIndexer::Slice(Slice::from(1..3)),
        ]);
        let out = unbroadcast(&key, &[4, 4]).unwrap();
        assert_eq!(
            out.as_slice(),
            &[Indexer::Index(2), Indexer::Slice(Slice::from(1..3))]
        );
    }

    #[test]
    fn unbroadcast_single_array() {
        let key = BroadcastKey::new(vec![arr(vec![0, 2])]);
        let out = unbroadcast(&key, &[4, 4]).unwrap();
        assert_eq!(
            out.as_slice(),
            &[Indexer::IntArray(vec![0, 2]), Indexer::Slice(Slice::full())]
        );
    }

    #[test]
    fn unbroadcast_ix_style_arrays() {
        let rows = DenseArray::from_shape_vec(vec![2, 1], vec![0, 2]).unwrap();
        let cols = DenseArray::from_shape_vec(vec![1, 3], vec![1, 2, 3]).unwrap();
        let key = BroadcastKey::new(vec![
            BroadcastIndexer::Array(rows),
            BroadcastIndexer::Array(cols),
        ]);
        let out = unbroadcast(&key, &[4, 4]).unwrap();
        assert_eq!(
            out.as_slice(),
            &[
                Indexer::IntArray(vec![0, 2]),
                Indexer::IntArray(vec![1, 2, 3]),
            ]
        );
    }

    #[test]
    fn unbroadcast_zipped_fails() {
        let key = BroadcastKey::new(vec![arr(vec![0, 1]), arr(vec![2, 3])]);
        let err = unbroadcast(&key, &[4, 4]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CannotOrthogonalize);
    }

    #[test]
    fn unbroadcast_zero_dim_array_is_scalar() {
        let key = BroadcastKey::new(vec![BroadcastIndexer::Array(DenseArray::from_elem(3))]);
        let out = unbroadcast(&key, &[4]).unwrap();
        assert_eq!(out.as_slice(), &[Indexer::Index(3)]);
    }

    #[test]
    fn convert_progressions() {
        assert_eq!(
            maybe_convert_to_slice(&[2, 4, 6, 8], 10).unwrap(),
            Indexer::Slice(Slice::new(2, Some(10), 2))
        );
        assert_eq!(
            maybe_convert_to_slice(&[3], 10).unwrap(),
            Indexer::Slice(Slice::new(3, Some(4), 1))
        );
        assert_eq!(
            maybe_convert_to_slice(&[], 10).unwrap(),
            Indexer::Slice(Slice::new(0, Some(0), 1))
        );
    }

    #[test]
    fn convert_descending_to_zero() {
        // stop underflows; the equivalent slice needs an open end
        assert_eq!(
            maybe_convert_to_slice(&[2, 1, 0], 3).unwrap(),
            Indexer::Slice(Slice::new(2, None, -1))
        );
    }

    #[test]
    fn convert_normalizes_negative() {
        assert_eq!(
            maybe_convert_to_slice(&[-2, -1], 5).unwrap(),
            Indexer::Slice(Slice::new(3, Some(5), 1))
        );
    }

    #[test]
    fn convert_rejects_out_of_bounds() {
        let err = maybe_convert_to_slice(&[0, 10], 10).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfBounds);
    }

    #[test]
    fn convert_leaves_non_progressions() {
        assert_eq!(
            maybe_convert_to_slice(&[0, 1, 3], 5).unwrap(),
            Indexer::IntArray(vec![0, 1, 3])
        );
        assert_eq!(
            maybe_convert_to_slice(&[3, 3], 5).unwrap(),
            Indexer::IntArray(vec![3, 3])
        );
    }
}
