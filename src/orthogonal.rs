// Copyright 2025 ndlazy developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Translation of canonical keys into keys a backend can consume in the
//! outer (orthogonal) indexing style.

use crate::adapters::IndexingCapability;
use crate::error::{from_kind, ErrorKind, Result};
use crate::normalize::{result_shape, ExpandedKey};
use crate::slice::{resolve_index, Indexer, Slice};

/// A key vetted for delegation to a backend in the outer indexing style.
///
/// Entries are limited to `Slice`, `Index` and `IntArray`; array-valued axes
/// combine by outer product, never by zipping. Array positions have been
/// bounds-checked against the base shape.
#[derive(Clone, Debug, PartialEq)]
pub struct OuterKey {
    elems: Vec<Indexer>,
}

impl OuterKey {
    pub fn ndim(&self) -> usize {
        self.elems.len()
    }

    pub fn as_slice(&self) -> &[Indexer] {
        &self.elems
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Indexer> {
        self.elems.iter()
    }

    /// Shape of the selection this key makes from an array of shape
    /// `base_shape`.
    pub fn result_shape(&self, base_shape: &[usize]) -> Vec<usize> {
        result_shape(&self.elems, base_shape)
    }

    /// The identity key for an array of `ndim` dimensions.
    pub fn all_full(ndim: usize) -> OuterKey {
        OuterKey {
            elems: vec![Indexer::Slice(Slice::full()); ndim],
        }
    }

    pub(crate) fn from_vec(elems: Vec<Indexer>) -> OuterKey {
        OuterKey { elems }
    }
}

fn is_full_slice(k: &Indexer) -> bool {
    k.is_full()
}

/// Bounds-check the scalar and array entries of `key` against `shape`.
fn check_bounds(key: &[Indexer], shape: &[usize]) -> Result<()> {
    for (k, &size) in key.iter().zip(shape) {
        match k {
            Indexer::Index(i) => {
                resolve_index(*i, size)?;
            }
            Indexer::IntArray(v) => {
                for &i in v {
                    resolve_index(i, size)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Convert a canonical key into a key usable for outer indexing against a
/// backend of the given capability.
///
/// `Index` entries are untouched under any style, and a key with no array
/// axes is already orthogonal and passes through unchanged. For `Outer`
/// (and stronger) backends a key carrying array axes is rewritten the way a
/// broadcast-native consumer needs it: every non-scalar axis is
/// materialized to a position array, except that contiguous runs of full
/// slices at the start or end of the key are kept as slices. Slices are much cheaper for downstream
/// backends, and chunked backends in particular degrade badly on
/// materialized fancy indices, so the outermost runs are preserved; only
/// the outermost runs can be — interior slices caught between array axes
/// must be expanded.
///
/// For `OuterOneVector` backends the key is left as slices plus at most one
/// array axis; a second array axis fails with
/// [`ErrorKind::CapabilityMismatch`], as does any array axis for a `Basic`
/// backend.
pub fn orthogonal_key(
    key: &ExpandedKey,
    shape: &[usize],
    capability: IndexingCapability,
) -> Result<OuterKey> {
    if key.ndim() != shape.len() {
        return Err(from_kind(ErrorKind::InvalidIndexer));
    }
    check_bounds(key.as_slice(), shape)?;

    let elems = key.as_slice();
    if elems.iter().any(|k| matches!(k, Indexer::BoolMask(_))) {
        // canonicalize() lowers masks; a mask here means the caller skipped
        // normalization
        return Err(from_kind(ErrorKind::InvalidIndexer));
    }

    let n_arrays = elems.iter().filter(|k| k.is_array()).count();
    match capability {
        IndexingCapability::Basic => {
            if n_arrays > 0 {
                return Err(from_kind(ErrorKind::CapabilityMismatch));
            }
            return Ok(OuterKey::from_vec(elems.to_vec()));
        }
        IndexingCapability::OuterOneVector => {
            if n_arrays > 1 {
                return Err(from_kind(ErrorKind::CapabilityMismatch));
            }
            return Ok(OuterKey::from_vec(elems.to_vec()));
        }
        IndexingCapability::Outer | IndexingCapability::Vectorized => {}
    }

    if n_arrays == 0 {
        // scalars and slices are orthogonal under any style
        return Ok(OuterKey::from_vec(elems.to_vec()));
    }

    // Axes that are candidates for materialization: everything that is not
    // a collapsing scalar.
    let non_index: Vec<usize> = elems
        .iter()
        .enumerate()
        .filter(|(_, k)| !k.is_index())
        .map(|(n, _)| n)
        .collect();

    // Strip the outermost contiguous full-slice runs from the candidate
    // list. A candidate leaves the list only while the entire prefix (or
    // suffix) of the key up to it consists of full slices.
    let mut list = &non_index[..];
    loop {
        match list {
            [] => break,
            [first, rest @ ..] if (0..=*first).all(|n| is_full_slice(&elems[n])) => {
                list = rest;
            }
            [rest @ .., last] if (*last..elems.len()).all(|n| is_full_slice(&elems[n])) => {
                list = rest;
            }
            _ => break,
        }
    }

    let mut out = elems.to_vec();
    for &n in list {
        let materialized = match &elems[n] {
            Indexer::Full => Indexer::IntArray((0..shape[n] as isize).collect()),
            Indexer::Slice(s) => Indexer::IntArray(s.positions(shape[n])),
            other => other.clone(),
        };
        out[n] = materialized;
    }
    Ok(OuterKey::from_vec(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key;
    use crate::normalize::canonicalize;

    fn ortho(key: &crate::Key, shape: &[usize], cap: IndexingCapability) -> Result<OuterKey> {
        let ck = canonicalize(key, shape.len())?;
        orthogonal_key(&ck, shape, cap)
    }

    #[test]
    fn scalars_untouched() {
        let k = ortho(&key![2, vec![0isize, 1]], &[4, 4], IndexingCapability::Outer).unwrap();
        assert_eq!(
            k.as_slice(),
            &[Indexer::Index(2), Indexer::IntArray(vec![0, 1])]
        );
    }

    #[test]
    fn edge_full_runs_stay_slices() {
        let k = ortho(
            &key![.., vec![1isize, 3], ..],
            &[3, 5, 4],
            IndexingCapability::Outer,
        )
        .unwrap();
        assert_eq!(
            k.as_slice(),
            &[
                Indexer::Slice(Slice::full()),
                Indexer::IntArray(vec![1, 3]),
                Indexer::Slice(Slice::full()),
            ]
        );
    }

    #[test]
    fn interior_slices_materialize() {
        // a full slice caught between two array axes must be expanded
        let k = ortho(
            &key![vec![0isize, 2], .., vec![1isize]],
            &[3, 4, 4],
            IndexingCapability::Outer,
        )
        .unwrap();
        assert_eq!(
            k.as_slice(),
            &[
                Indexer::IntArray(vec![0, 2]),
                Indexer::IntArray(vec![0, 1, 2, 3]),
                Indexer::IntArray(vec![1]),
            ]
        );
    }

    #[test]
    fn non_full_slice_materializes_alongside_array() {
        let k = ortho(
            &key![2..5, vec![1isize, 2]],
            &[6, 4],
            IndexingCapability::Outer,
        )
        .unwrap();
        assert_eq!(
            k.as_slice(),
            &[
                Indexer::IntArray(vec![2, 3, 4]),
                Indexer::IntArray(vec![1, 2]),
            ]
        );
    }

    #[test]
    fn pure_slice_key_untouched() {
        let k = ortho(&key![1..3, 0], &[4, 4], IndexingCapability::Outer).unwrap();
        assert_eq!(
            k.as_slice(),
            &[Indexer::Slice(Slice::from(1..3)), Indexer::Index(0)]
        );
    }

    #[test]
    fn one_vector_capability() {
        let ok = ortho(
            &key![2..5, vec![1isize, 2]],
            &[6, 4],
            IndexingCapability::OuterOneVector,
        )
        .unwrap();
        // slices stay slices for a backend that accepts them natively
        assert_eq!(
            ok.as_slice(),
            &[
                Indexer::Slice(Slice::from(2..5)),
                Indexer::IntArray(vec![1, 2]),
            ]
        );

        let err = ortho(
            &key![vec![0isize], vec![1isize]],
            &[4, 4],
            IndexingCapability::OuterOneVector,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapabilityMismatch);
    }

    #[test]
    fn basic_capability_rejects_arrays() {
        let err = ortho(&key![vec![0isize]], &[4], IndexingCapability::Basic).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapabilityMismatch);
        let ok = ortho(&key![1..2], &[4], IndexingCapability::Basic).unwrap();
        assert_eq!(ok.as_slice(), &[Indexer::Slice(Slice::from(1..2))]);
    }

    #[test]
    fn out_of_bounds_detected_early() {
        let err = ortho(&key![vec![4isize]], &[4], IndexingCapability::Outer).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfBounds);
        let err = ortho(&key![-5], &[4], IndexingCapability::Outer).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfBounds);
    }
}
