// Copyright 2025 ndlazy developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Composition of indexers: folding an indexer applied on top of the result
//! of another into the single equivalent indexer, so lazy views accumulate
//! one key instead of chaining wrappers.

use crate::error::{from_kind, ErrorKind, Result};
use crate::normalize::ExpandedKey;
use crate::slice::{resolve_index, Indexer, Slice};

/// Index a slice with another slice, returning the single slice equivalent
/// to applying both in sequence against an axis of extent `size`.
///
/// The composed step is the product of the two steps, but the composed start
/// and stop cannot be derived arithmetically from the inputs once clamping
/// and negative steps are involved. They are reconstructed from the actual
/// position sequence: materialize `old`, take `applied`'s window of it, and
/// read the bounds off the result.
pub fn slice_slice(old: &Slice, applied: &Slice, size: usize) -> Slice {
    let step = old.step * applied.step;

    let positions = old.positions(size);
    let window = applied.positions(positions.len());
    if window.is_empty() {
        return Slice::new(0, Some(0), step);
    }

    let items: Vec<isize> = window.iter().map(|&i| positions[i as usize]).collect();
    let start = items[0];
    let stop = items[items.len() - 1] + step;
    // A computed stop below zero means the sequence runs off the front of
    // the axis; only an open end can express that.
    let end = if stop < 0 { None } else { Some(stop) };
    Slice::new(start, end, step)
}

/// Compose an indexer already applied to an axis of extent `size` with a new
/// indexer applied to the *result* of the first.
///
/// Positions in `new` are relative to the selection `old` made; the returned
/// indexer is relative to the original axis. `old` must be canonical (no
/// `BoolMask`); `Index` axes are handled by [`compose`], not here.
pub fn compose_1d(old: &Indexer, new: &Indexer, size: usize) -> Result<Indexer> {
    // Most dimensions are not re-indexed on each call; take the no-op
    // fast path before anything else.
    if new.is_full() {
        return Ok(old.clone());
    }
    if old.is_full() {
        return Ok(new.clone());
    }

    match (old, new) {
        (Indexer::Slice(s), Indexer::Slice(t)) => Ok(Indexer::Slice(slice_slice(s, t, size))),
        (Indexer::Slice(s), Indexer::Index(i)) => {
            let positions = s.positions(size);
            let j = resolve_index(*i, positions.len())?;
            Ok(Indexer::Index(positions[j]))
        }
        (Indexer::Slice(s), Indexer::IntArray(v)) => {
            let positions = s.positions(size);
            let composed = v
                .iter()
                .map(|&i| resolve_index(i, positions.len()).map(|j| positions[j]))
                .collect::<Result<Vec<_>>>()?;
            Ok(Indexer::IntArray(composed))
        }
        (Indexer::IntArray(w), Indexer::Slice(t)) => {
            let window = t.positions(w.len());
            Ok(Indexer::IntArray(
                window.iter().map(|&i| w[i as usize]).collect(),
            ))
        }
        (Indexer::IntArray(w), Indexer::Index(i)) => {
            let j = resolve_index(*i, w.len())?;
            Ok(Indexer::Index(w[j]))
        }
        (Indexer::IntArray(w), Indexer::IntArray(v)) => {
            let composed = v
                .iter()
                .map(|&i| resolve_index(i, w.len()).map(|j| w[j]))
                .collect::<Result<Vec<_>>>()?;
            Ok(Indexer::IntArray(composed))
        }
        // BoolMask is lowered during canonicalization and Index axes are
        // skipped by the caller.
        _ => Err(from_kind(ErrorKind::InvalidIndexer)),
    }
}

/// Fold `new` into `old`, where `old` indexes an array of shape
/// `base_shape` and `new` indexes the *result* of `old`.
///
/// Axes that `old` collapsed with `Index` no longer exist in the logical
/// shape `new` was written against, so `new`'s entries are consumed only by
/// the surviving axes.
pub fn compose(old: &ExpandedKey, new: &ExpandedKey, base_shape: &[usize]) -> Result<ExpandedKey> {
    debug_assert_eq!(old.ndim(), base_shape.len());
    let mut applied = new.iter();
    let mut composed = Vec::with_capacity(old.ndim());
    for (k, &size) in old.iter().zip(base_shape) {
        match k {
            Indexer::Index(_) => composed.push(k.clone()),
            _ => {
                let n = applied.next().ok_or(from_kind(ErrorKind::InvalidIndexer))?;
                composed.push(compose_1d(k, n, size)?);
            }
        }
    }
    if applied.next().is_some() {
        return Err(from_kind(ErrorKind::InvalidIndexer));
    }
    Ok(ExpandedKey::from_vec(composed))
}
