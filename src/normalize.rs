// Copyright 2025 ndlazy developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Normalization of raw keys into full-length canonical keys.

use std::fmt;

use crate::error::{from_kind, ErrorKind, Result};
use crate::slice::{Indexer, Key, KeyElem, Slice};

/// A full-length key: exactly one [`Indexer`] per dimension of the array
/// being indexed.
///
/// Values of this type are only ever produced by [`expand`] and
/// [`canonicalize`]; calling code cannot assemble one from raw indexers, so
/// every key that reaches composition or a backend has been through
/// normalization.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpandedKey {
    elems: Vec<Indexer>,
}

impl ExpandedKey {
    pub(crate) fn from_vec(elems: Vec<Indexer>) -> ExpandedKey {
        ExpandedKey { elems }
    }

    /// Number of dimensions this key indexes.
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
    /// `base_shape`: `Index` axes vanish, every other axis contributes its
    /// selected length. Derived purely from the key, without touching data.
    pub fn result_shape(&self, base_shape: &[usize]) -> Vec<usize> {
        result_shape(&self.elems, base_shape)
    }
}

impl fmt::Display for ExpandedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (n, k) in self.elems.iter().enumerate() {
            if n > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", k)?;
        }
        write!(f, "]")
    }
}

pub(crate) fn result_shape(key: &[Indexer], base_shape: &[usize]) -> Vec<usize> {
    debug_assert_eq!(key.len(), base_shape.len());
    let mut shape = Vec::with_capacity(base_shape.len());
    for (k, &size) in key.iter().zip(base_shape) {
        match *k {
            Indexer::Index(_) => {}
            Indexer::Full => shape.push(size),
            Indexer::Slice(ref s) => shape.push(s.len(size)),
            Indexer::IntArray(ref v) => shape.push(v.len()),
            Indexer::BoolMask(ref m) => shape.push(m.iter().filter(|&&b| b).count()),
        }
    }
    shape
}

/// Given a raw key for indexing an array of `ndim` dimensions, return an
/// equivalent key with exactly one entry per dimension.
///
/// The expansion replaces an `Ellipsis` marker with the right number of full
/// slices and then right-pads with full slices up to `ndim`. A key with more
/// non-`Ellipsis` entries than `ndim` fails with
/// [`ErrorKind::TooManyIndices`]. A second `Ellipsis` degrades to a single
/// full slice.
pub fn expand(key: &Key, ndim: usize) -> Result<ExpandedKey> {
    let elems = key.as_elems();
    let mut new_key = Vec::with_capacity(ndim);
    let mut found_ellipsis = false;
    for elem in elems {
        match elem {
            KeyElem::Ellipsis => {
                if !found_ellipsis {
                    let fill = (ndim + 1).saturating_sub(elems.len());
                    new_key.extend(std::iter::repeat(Indexer::Full).take(fill));
                    found_ellipsis = true;
                } else {
                    new_key.push(Indexer::Full);
                }
            }
            KeyElem::Indexer(ix) => new_key.push(ix.clone()),
        }
    }
    if new_key.len() > ndim {
        return Err(from_kind(ErrorKind::TooManyIndices));
    }
    new_key.resize(ndim, Indexer::Full);
    Ok(ExpandedKey::from_vec(new_key))
}

/// Expand `key` and lower every entry to a canonical form: `Full` becomes
/// the full slice and `BoolMask` becomes the `IntArray` of its `true`
/// positions. The result contains only `Slice`, `Index` and `IntArray`
/// entries.
pub fn canonicalize(key: &Key, ndim: usize) -> Result<ExpandedKey> {
    let expanded = expand(key, ndim)?;
    Ok(canonicalize_expanded(expanded))
}

pub(crate) fn canonicalize_expanded(key: ExpandedKey) -> ExpandedKey {
    let elems = key
        .elems
        .into_iter()
        .map(|k| match k {
            Indexer::Full => Indexer::Slice(Slice::full()),
            Indexer::BoolMask(mask) => Indexer::IntArray(nonzero(&mask)),
            other => other,
        })
        .collect();
    ExpandedKey::from_vec(elems)
}

/// Positions of the `true` entries of a mask.
pub(crate) fn nonzero(mask: &[bool]) -> Vec<isize> {
    mask.iter()
        .enumerate()
        .filter(|&(_, &b)| b)
        .map(|(i, _)| i as isize)
        .collect()
}
