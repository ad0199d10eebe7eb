// Copyright 2025 ndlazy developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The uniform, capability-tagged indexing interface over storage backends,
//! and the adapters for in-memory and outer-indexed (file-backed) storage.

use std::sync::{PoisonError, RwLock};

use crate::broadcast::BroadcastKey;
use crate::dense::DenseArray;
use crate::error::{from_kind, ErrorKind, Result};
use crate::locks::ResourceLock;
use crate::normalize::canonicalize;
use crate::orthogonal::{orthogonal_key, OuterKey};
use crate::slice::Key;

/// The strongest indexing style a backend natively accepts.
///
/// Styles are ordered from weakest to strongest; a backend that accepts a
/// style always accepts every weaker one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexingCapability {
    /// Slices and scalars only.
    Basic,
    /// At most one axis may carry a position array, combined with slices
    /// and scalars on the rest.
    OuterOneVector,
    /// Any number of array axes, combined by outer product.
    Outer,
    /// Zipped/broadcast fancy indexing across axes.
    Vectorized,
}

/// A storage backend viewed through the uniform indexing interface.
///
/// `get` and `set` take outer-style keys that have already been through
/// normalization and capability-aware translation; an adapter never sees a
/// raw key. Writable adapters use interior locking so a base shared between
/// several views can be written through; read-only backends return
/// [`ErrorKind::ReadOnly`] from `set`.
pub trait IndexableArray<A> {
    /// The strongest indexing style this backend accepts.
    fn capability(&self) -> IndexingCapability;

    fn shape(&self) -> &[usize];

    fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Read the selection `key` makes, producing a concrete array.
    fn get(&self, key: &OuterKey) -> Result<DenseArray<A>>;

    /// Assign `value` to the selection `key` makes.
    fn set(&self, key: &OuterKey, value: &DenseArray<A>) -> Result<()>;
}

/// Adapter presenting an owned in-memory [`DenseArray`] as a backend.
///
/// Dense storage accepts every indexing style; broadcast keys are served by
/// [`DenseAdapter::get_broadcast`] in addition to the outer-style trait
/// surface.
#[derive(Debug)]
pub struct DenseAdapter<A> {
    dim: Vec<usize>,
    data: RwLock<DenseArray<A>>,
}

impl<A> DenseAdapter<A> {
    pub fn new(array: DenseArray<A>) -> DenseAdapter<A> {
        DenseAdapter {
            dim: array.shape().to_vec(),
            data: RwLock::new(array),
        }
    }

    pub fn into_inner(self) -> DenseArray<A> {
        self.data.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<A: Clone> DenseAdapter<A> {
    /// A copy of the current contents.
    pub fn snapshot(&self) -> DenseArray<A> {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Serve a broadcast-style (zipped) key directly.
    pub fn get_broadcast(&self, key: &BroadcastKey) -> Result<DenseArray<A>> {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get_broadcast(key)
    }
}

impl<A: Clone> IndexableArray<A> for DenseAdapter<A> {
    fn capability(&self) -> IndexingCapability {
        IndexingCapability::Vectorized
    }

    fn shape(&self) -> &[usize] {
        &self.dim
    }

    fn get(&self, key: &OuterKey) -> Result<DenseArray<A>> {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get_outer(key)
    }

    fn set(&self, key: &OuterKey, value: &DenseArray<A>) -> Result<()> {
        self.data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set_outer(key, value)
    }
}

/// Raw storage that only understands per-axis outer keys — the shape of a
/// file-format variable (NetCDF-style), which selects along each axis
/// independently and knows nothing of broadcasting.
///
/// `write` defaults to read-only; file formats opened for reading stay
/// read-only without any adapter involvement.
pub trait OuterBackend<A> {
    fn shape(&self) -> &[usize];

    fn read(&self, key: &OuterKey) -> Result<DenseArray<A>>;

    fn write(&self, _key: &OuterKey, _value: &DenseArray<A>) -> Result<()> {
        Err(from_kind(ErrorKind::ReadOnly))
    }
}

/// Adapter for [`OuterBackend`] storage, declaring the `Outer` capability
/// and serializing access through a caller-supplied [`ResourceLock`].
///
/// Backends sharing one file handle hand every adapter the same lock, so
/// concurrent readers serialize correctly; the adapter only threads the
/// lock through, it does not own the locking policy.
pub struct OrthogonalArrayAdapter<B> {
    backend: B,
    lock: ResourceLock,
}

impl<B> OrthogonalArrayAdapter<B> {
    pub fn new(backend: B, lock: ResourceLock) -> OrthogonalArrayAdapter<B> {
        OrthogonalArrayAdapter { backend, lock }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<A, B: OuterBackend<A>> IndexableArray<A> for OrthogonalArrayAdapter<B> {
    fn capability(&self) -> IndexingCapability {
        IndexingCapability::Outer
    }

    fn shape(&self) -> &[usize] {
        self.backend.shape()
    }

    fn get(&self, key: &OuterKey) -> Result<DenseArray<A>> {
        let _guard = self.lock.acquire();
        self.backend.read(key)
    }

    fn set(&self, key: &OuterKey, value: &DenseArray<A>) -> Result<()> {
        let _guard = self.lock.acquire();
        self.backend.write(key, value)
    }
}

/// Entry point for external backends: run a raw key through normalization
/// and capability-aware orthogonal translation, then hand the result to the
/// backend-native `get_fn`.
///
/// ```
/// use ndlazy::{explicit_indexing_adapter, key, DenseArray, IndexingCapability};
///
/// let a = DenseArray::from_shape_vec(vec![2, 3], vec![0, 1, 2, 10, 11, 12]).unwrap();
/// let out = explicit_indexing_adapter(
///     &key![1, vec![0isize, 2]],
///     &[2, 3],
///     IndexingCapability::Outer,
///     |k| a.get_outer(k),
/// )
/// .unwrap();
/// assert_eq!(out.as_slice(), &[10, 12]);
/// ```
pub fn explicit_indexing_adapter<A, F>(
    key: &Key,
    shape: &[usize],
    capability: IndexingCapability,
    get_fn: F,
) -> Result<DenseArray<A>>
where
    F: FnOnce(&OuterKey) -> Result<DenseArray<A>>,
{
    let canonical = canonicalize(key, shape.len())?;
    let outer = orthogonal_key(&canonical, shape, capability)?;
    get_fn(&outer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key;
    use crate::slice::Indexer;

    #[test]
    fn capability_ordering() {
        assert!(IndexingCapability::Basic < IndexingCapability::OuterOneVector);
        assert!(IndexingCapability::OuterOneVector < IndexingCapability::Outer);
        assert!(IndexingCapability::Outer < IndexingCapability::Vectorized);
    }

    #[test]
    fn dense_adapter_get_set() {
        let adapter = DenseAdapter::new(DenseArray::from_vec(vec![0, 1, 2, 3]));
        let out = explicit_indexing_adapter(
            &key![vec![1isize, 3]],
            &[4],
            adapter.capability(),
            |k| adapter.get(k),
        )
        .unwrap();
        assert_eq!(out.as_slice(), &[1, 3]);

        let canonical = canonicalize(&key![0], 1).unwrap();
        let outer = orthogonal_key(&canonical, &[4], IndexingCapability::Vectorized).unwrap();
        adapter.set(&outer, &DenseArray::from_elem(9)).unwrap();
        assert_eq!(adapter.snapshot().as_slice(), &[9, 1, 2, 3]);
    }

    struct FakeFileVar {
        data: DenseArray<f64>,
    }

    impl OuterBackend<f64> for FakeFileVar {
        fn shape(&self) -> &[usize] {
            self.data.shape()
        }

        fn read(&self, key: &OuterKey) -> Result<DenseArray<f64>> {
            self.data.get_outer(key)
        }
    }

    #[test]
    fn orthogonal_adapter_reads_under_lock() {
        let var = FakeFileVar {
            data: DenseArray::from_shape_vec(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap(),
        };
        let adapter = OrthogonalArrayAdapter::new(var, ResourceLock::new());
        assert_eq!(adapter.capability(), IndexingCapability::Outer);

        let canonical = canonicalize(&key![.., 1], 2).unwrap();
        let outer = orthogonal_key(&canonical, &[2, 2], adapter.capability()).unwrap();
        let out = adapter.get(&outer).unwrap();
        assert_eq!(out.as_slice(), &[2.0, 4.0]);

        let err = adapter.set(&outer, &DenseArray::from_elem(0.0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReadOnly);
    }

    #[test]
    fn entry_point_respects_capability() {
        let err = explicit_indexing_adapter::<i32, _>(
            &key![vec![0isize], vec![1isize]],
            &[4, 4],
            IndexingCapability::OuterOneVector,
            |_| unreachable!("translation must fail before the backend is called"),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapabilityMismatch);
    }

    #[test]
    fn entry_point_normalizes_masks() {
        let a = DenseArray::from_vec(vec![0, 1, 2, 3]);
        let out = explicit_indexing_adapter(
            &key![vec![true, false, true, false]],
            &[4],
            IndexingCapability::Outer,
            |k| {
                assert_eq!(k.as_slice(), &[Indexer::IntArray(vec![0, 2])]);
                a.get_outer(k)
            },
        )
        .unwrap();
        assert_eq!(out.as_slice(), &[0, 2]);
    }
}
