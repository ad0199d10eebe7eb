// Copyright 2025 ndlazy developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The `ndlazy` crate is the indexing core of a labeled, n-dimensional
//! array library: it translates multi-dimensional index requests —
//! integers, slices, boolean and integer arrays, possibly fewer entries
//! than the array has dimensions — into primitive operations on
//! heterogeneous storage backends, without reading any data until a result
//! is explicitly requested.
//!
//! ## Highlights
//!
//! - Raw keys ([`Key`], built with the [`key!`] macro) are normalized into
//!   full-length canonical keys ([`ExpandedKey`]) with [`expand`] and
//!   [`canonicalize`].
//! - Repeated indexing of a [`LazilyIndexedArray`] folds every request into
//!   one composed key ([`compose`]); the backend sees a single `get`.
//! - Backends declare an [`IndexingCapability`]; [`orthogonal_key`] and
//!   [`unbroadcast`] translate keys down to whatever style a backend
//!   accepts, and [`maybe_convert_to_slice`] compacts position arrays back
//!   into slices where backends prefer them.
//! - [`CopyOnWriteArray`] shares storage until the first write;
//!   [`MemoryCachedArray`] concretizes once and serves reads from the
//!   cache.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use ndlazy::{key, DenseAdapter, DenseArray, LazilyIndexedArray, Slice};
//!
//! let base = Arc::new(DenseAdapter::new(DenseArray::from_vec(
//!     (0..10).collect::<Vec<i64>>(),
//! )));
//! let view = LazilyIndexedArray::new(base)
//!     .index(&key![Slice::from(1..9).step_by(2)])? // [1, 3, 5, 7]
//!     .index(&key![1..])?; // [3, 5, 7]
//!
//! // both selections fused into one slice; the base is read exactly once
//! assert_eq!(view.materialize()?.as_slice(), &[3, 5, 7]);
//! # Ok::<(), ndlazy::IndexingError>(())
//! ```
//!
//! ## Crate feature flags
//!
//! - `rayon`: gather scattered rows of a [`ChunkedArray`] on the rayon
//!   thread pool.
//! - `serde`: serialization for key and capability types.

mod adapters;
mod broadcast;
mod chunked;
mod compose;
mod dense;
mod error;
mod label;
mod lazy;
mod locks;
mod normalize;
mod orthogonal;
mod slice;

pub use crate::adapters::{
    explicit_indexing_adapter, DenseAdapter, IndexableArray, IndexingCapability,
    OrthogonalArrayAdapter, OuterBackend,
};
pub use crate::broadcast::{maybe_convert_to_slice, unbroadcast, BroadcastIndexer, BroadcastKey};
pub use crate::chunked::ChunkedArray;
pub use crate::compose::{compose, compose_1d, slice_slice};
pub use crate::dense::DenseArray;
pub use crate::error::{ErrorKind, IndexingError, Result};
pub use crate::label::{LabelDtype, LabelIndex, LabelIndexAdapter, LabelValue};
pub use crate::lazy::{CopyOnWriteArray, LazilyIndexedArray, MemoryCachedArray};
pub use crate::locks::{combine_locks, ensure_lock, ResourceGuard, ResourceLock};
pub use crate::normalize::{canonicalize, expand, ExpandedKey};
pub use crate::orthogonal::{orthogonal_key, OuterKey};
pub use crate::slice::{Ellipsis, Indexer, Key, KeyElem, Slice};
