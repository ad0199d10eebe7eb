// Copyright 2025 ndlazy developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Lazy wrappers over backend arrays: composed-key views that defer every
//! read, copy-on-write sharing, and a materialize-once cache.

use std::sync::{Arc, PoisonError, RwLock};

use crate::adapters::{DenseAdapter, IndexableArray, IndexingCapability};
use crate::broadcast::{unbroadcast, BroadcastKey};
use crate::compose::compose;
use crate::dense::DenseArray;
use crate::error::Result;
use crate::normalize::{canonicalize, canonicalize_expanded, ExpandedKey};
use crate::orthogonal::{orthogonal_key, OuterKey};
use crate::slice::{Indexer, Key, Slice};

/// A view over a backend array that records pending index operations
/// without reading any data.
///
/// The view holds a shared reference to its base plus one composed key
/// relative to the base; indexing the view again folds the new key into the
/// existing one, so wrapper depth never grows and the base is touched
/// exactly once, at [`materialize`](LazilyIndexedArray::materialize).
#[derive(Clone)]
pub struct LazilyIndexedArray<A> {
    base: Arc<dyn IndexableArray<A>>,
    key: ExpandedKey,
    dim: Vec<usize>,
}

impl<A: Clone + 'static> LazilyIndexedArray<A> {
    /// The identity view of `base`.
    pub fn new(base: Arc<dyn IndexableArray<A>>) -> LazilyIndexedArray<A> {
        let key = ExpandedKey::from_vec(vec![
            Indexer::Slice(Slice::full());
            base.ndim()
        ]);
        let dim = base.shape().to_vec();
        LazilyIndexedArray { base, key, dim }
    }

    /// A view of `base` through a raw key.
    pub fn with_key(base: Arc<dyn IndexableArray<A>>, key: &Key) -> Result<LazilyIndexedArray<A>> {
        LazilyIndexedArray::new(base).index(key)
    }

    /// Logical shape of the view, derived purely from the composed key.
    pub fn shape(&self) -> &[usize] {
        &self.dim
    }

    pub fn ndim(&self) -> usize {
        self.dim.len()
    }

    /// The composed key, relative to the base array.
    pub fn key(&self) -> &ExpandedKey {
        &self.key
    }

    fn compose_new(&self, new: ExpandedKey) -> Result<LazilyIndexedArray<A>> {
        let composed = compose(&self.key, &new, self.base.shape())?;
        let dim = composed.result_shape(self.base.shape());
        Ok(LazilyIndexedArray {
            base: Arc::clone(&self.base),
            key: composed,
            dim,
        })
    }

    /// Lazily select with an orthogonal-style key addressed to the current
    /// logical shape.
    pub fn index(&self, key: &Key) -> Result<LazilyIndexedArray<A>> {
        let new = canonicalize(key, self.ndim())?;
        self.compose_new(new)
    }

    /// Lazily select with a broadcast-style key, which must have an
    /// orthogonal representation (see
    /// [`unbroadcast`](crate::broadcast::unbroadcast)).
    pub fn index_broadcast(&self, key: &BroadcastKey) -> Result<LazilyIndexedArray<A>> {
        let new = canonicalize_expanded(unbroadcast(key, self.shape())?);
        self.compose_new(new)
    }

    /// Translate the fully composed key for the base's capability and read
    /// the selection in a single `get`.
    pub fn materialize(&self) -> Result<DenseArray<A>> {
        let outer = orthogonal_key(&self.key, self.base.shape(), self.base.capability())?;
        self.base.get(&outer)
    }

    /// Compose `key` onto the view and write `value` through to the base
    /// in a single `set`.
    pub fn set(&self, key: &Key, value: &DenseArray<A>) -> Result<()> {
        let target = self.index(key)?;
        let outer = orthogonal_key(&target.key, self.base.shape(), self.base.capability())?;
        self.base.set(&outer, value)
    }

    /// Broadcast-style counterpart of [`set`](LazilyIndexedArray::set).
    pub fn set_broadcast(&self, key: &BroadcastKey, value: &DenseArray<A>) -> Result<()> {
        let target = self.index_broadcast(key)?;
        let outer = orthogonal_key(&target.key, self.base.shape(), self.base.capability())?;
        self.base.set(&outer, value)
    }
}

impl<A: Clone + 'static> IndexableArray<A> for LazilyIndexedArray<A> {
    fn capability(&self) -> IndexingCapability {
        IndexingCapability::Outer
    }

    fn shape(&self) -> &[usize] {
        &self.dim
    }

    fn get(&self, key: &OuterKey) -> Result<DenseArray<A>> {
        let new = Key::from_indexers(key.iter().cloned());
        self.index(&new)?.materialize()
    }

    fn set(&self, key: &OuterKey, value: &DenseArray<A>) -> Result<()> {
        let new = Key::from_indexers(key.iter().cloned());
        LazilyIndexedArray::set(self, &new, value)
    }
}

/// A wrapper that shares its base until the first write.
///
/// Reads delegate to the shared base; the first write materializes the full
/// base into owned storage, and every later read and write uses the copy.
/// Any number of `CopyOnWriteArray`s may share one base, because none of
/// them mutates it.
pub struct CopyOnWriteArray<A> {
    base: Arc<dyn IndexableArray<A>>,
    dim: Vec<usize>,
    copied: RwLock<Option<DenseArray<A>>>,
}

impl<A: Clone + 'static> CopyOnWriteArray<A> {
    pub fn new(base: Arc<dyn IndexableArray<A>>) -> CopyOnWriteArray<A> {
        let dim = base.shape().to_vec();
        CopyOnWriteArray {
            base,
            dim,
            copied: RwLock::new(None),
        }
    }

    /// Whether the copy trigger has fired.
    pub fn is_copied(&self) -> bool {
        self.copied
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn ensure_copied(&self) -> Result<()> {
        let mut copied = self.copied.write().unwrap_or_else(PoisonError::into_inner);
        if copied.is_none() {
            *copied = Some(self.base.get(&OuterKey::all_full(self.dim.len()))?);
        }
        Ok(())
    }

    /// Lazily narrow the view; the result shares the same base until either
    /// instance writes.
    pub fn index(&self, key: &Key) -> Result<CopyOnWriteArray<A>> {
        let copied = self.copied.read().unwrap_or_else(PoisonError::into_inner);
        let narrowed: Arc<dyn IndexableArray<A>> = match &*copied {
            Some(owned) => {
                let lazy = LazilyIndexedArray::new(Arc::new(DenseAdapter::new(owned.clone())));
                Arc::new(lazy.index(key)?)
            }
            None => Arc::new(LazilyIndexedArray::with_key(Arc::clone(&self.base), key)?),
        };
        Ok(CopyOnWriteArray::new(narrowed))
    }

    /// Read the whole view.
    pub fn materialize(&self) -> Result<DenseArray<A>> {
        self.get(&OuterKey::all_full(self.dim.len()))
    }
}

impl<A: Clone + 'static> IndexableArray<A> for CopyOnWriteArray<A> {
    fn capability(&self) -> IndexingCapability {
        if self.is_copied() {
            IndexingCapability::Vectorized
        } else {
            self.base.capability()
        }
    }

    fn shape(&self) -> &[usize] {
        &self.dim
    }

    fn get(&self, key: &OuterKey) -> Result<DenseArray<A>> {
        let copied = self.copied.read().unwrap_or_else(PoisonError::into_inner);
        match &*copied {
            Some(owned) => owned.get_outer(key),
            None => self.base.get(key),
        }
    }

    fn set(&self, key: &OuterKey, value: &DenseArray<A>) -> Result<()> {
        self.ensure_copied()?;
        let mut copied = self.copied.write().unwrap_or_else(PoisonError::into_inner);
        match copied.as_mut() {
            Some(owned) => owned.set_outer(key, value),
            // ensure_copied just filled it
            None => unreachable!("copy-on-write storage missing after copy trigger"),
        }
    }
}

/// A wrapper that materializes its base once and serves every later read
/// from the cached concrete array.
///
/// Indexing before the first materialization stays lazy; writes go through
/// to the underlying storage and do not invalidate the cache.
pub struct MemoryCachedArray<A> {
    base: LazilyIndexedArray<A>,
    cache: RwLock<Option<DenseArray<A>>>,
}

impl<A: Clone + 'static> MemoryCachedArray<A> {
    pub fn new(base: Arc<dyn IndexableArray<A>>) -> MemoryCachedArray<A> {
        MemoryCachedArray::from_lazy(LazilyIndexedArray::new(base))
    }

    pub fn from_lazy(base: LazilyIndexedArray<A>) -> MemoryCachedArray<A> {
        MemoryCachedArray {
            base,
            cache: RwLock::new(None),
        }
    }

    pub fn is_cached(&self) -> bool {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn ensure_cached(&self) -> Result<()> {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if cache.is_none() {
            *cache = Some(self.base.materialize()?);
        }
        Ok(())
    }

    /// Read the whole view, concretizing and caching it on first call.
    pub fn materialize(&self) -> Result<DenseArray<A>> {
        self.ensure_cached()?;
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        match &*cache {
            Some(cached) => Ok(cached.clone()),
            None => unreachable!("cache missing after ensure_cached"),
        }
    }

    /// Narrow the view. Before the first materialization this stays lazy
    /// and does not force the cache; afterwards it selects from the cache.
    pub fn index(&self, key: &Key) -> Result<MemoryCachedArray<A>> {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        match &*cache {
            Some(cached) => {
                let canonical = canonicalize(key, cached.ndim())?;
                let outer = orthogonal_key(
                    &canonical,
                    cached.shape(),
                    IndexingCapability::Vectorized,
                )?;
                let narrowed = cached.get_outer(&outer)?;
                Ok(MemoryCachedArray::new(Arc::new(DenseAdapter::new(narrowed))))
            }
            None => Ok(MemoryCachedArray::from_lazy(self.base.index(key)?)),
        }
    }
}

impl<A: Clone + 'static> IndexableArray<A> for MemoryCachedArray<A> {
    fn capability(&self) -> IndexingCapability {
        IndexingCapability::Outer
    }

    fn shape(&self) -> &[usize] {
        self.base.shape()
    }

    fn get(&self, key: &OuterKey) -> Result<DenseArray<A>> {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        match &*cache {
            Some(cached) => cached.get_outer(key),
            None => self.base.get(key),
        }
    }

    fn set(&self, key: &OuterKey, value: &DenseArray<A>) -> Result<()> {
        IndexableArray::set(&self.base, key, value)
    }
}
