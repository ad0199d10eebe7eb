// Copyright 2025 ndlazy developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A chunked, read-only backend: storage split into blocks along axis 0,
//! the way lazily loaded stacks of records arrive from disk. Reads gather
//! from the chunks that intersect the selection; with the `rayon` feature
//! the per-row gather fans out across worker threads.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::adapters::{IndexableArray, IndexingCapability};
use crate::broadcast::maybe_convert_to_slice;
use crate::dense::{concat_axis0, stack_new_axis0, DenseArray};
use crate::error::{from_kind, ErrorKind, Result};
use crate::orthogonal::OuterKey;
use crate::slice::{resolve_index, Indexer, Slice};

/// An array stored as a sequence of blocks along axis 0.
///
/// Chunked storage is far more efficient with slices than with position
/// arrays, so `get` first compacts every array axis back into a slice where
/// possible (`maybe_convert_to_slice`); contiguous selections are then
/// served chunk by chunk, and only genuinely scattered positions fall back
/// to a row-at-a-time gather.
///
/// The backend is read-only: consumers must materialize into a
/// [`DenseArray`] before mutating.
#[derive(Debug)]
pub struct ChunkedArray<A> {
    dim: Vec<usize>,
    chunks: Vec<DenseArray<A>>,
    // start of each chunk along axis 0
    offsets: Vec<usize>,
}

impl<A> ChunkedArray<A> {
    /// Assemble from blocks whose shapes agree on every axis but the first.
    pub fn from_chunks(chunks: Vec<DenseArray<A>>) -> Result<ChunkedArray<A>> {
        let first = chunks.first().ok_or(from_kind(ErrorKind::IncompatibleShapes))?;
        if first.ndim() == 0 {
            return Err(from_kind(ErrorKind::IncompatibleShapes));
        }
        let rest_shape = first.shape()[1..].to_vec();
        let mut offsets = Vec::with_capacity(chunks.len());
        let mut axis_len = 0;
        for chunk in &chunks {
            if chunk.ndim() != first.ndim() || chunk.shape()[1..] != rest_shape {
                return Err(from_kind(ErrorKind::IncompatibleShapes));
            }
            offsets.push(axis_len);
            axis_len += chunk.shape()[0];
        }
        let mut dim = vec![axis_len];
        dim.extend_from_slice(&rest_shape);
        Ok(ChunkedArray { dim, chunks, offsets })
    }

    pub fn n_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// The chunk holding global row `pos`, and the row's offset within it.
    fn locate(&self, pos: usize) -> (usize, usize) {
        let c = match self.offsets.binary_search(&pos) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        (c, pos - self.offsets[c])
    }
}

impl<A: Clone + Send + Sync> ChunkedArray<A> {
    /// Compact position arrays back into slices wherever possible.
    fn compact_key(&self, key: &OuterKey) -> Result<Vec<Indexer>> {
        key.iter()
            .zip(&self.dim)
            .map(|(k, &size)| match k {
                Indexer::IntArray(v) => maybe_convert_to_slice(v, size),
                other => Ok(other.clone()),
            })
            .collect()
    }

    /// Serve a contiguous (unit-step) axis-0 range chunk by chunk.
    fn gather_contiguous(&self, start: usize, stop: usize, rest: &[Indexer]) -> Result<DenseArray<A>> {
        let mut parts = Vec::new();
        for (chunk, &offset) in self.chunks.iter().zip(&self.offsets) {
            let chunk_len = chunk.shape()[0];
            let lo = start.max(offset);
            let hi = stop.min(offset + chunk_len);
            if lo >= hi {
                continue;
            }
            let mut local = vec![Indexer::Slice(Slice::new(
                (lo - offset) as isize,
                Some((hi - offset) as isize),
                1,
            ))];
            local.extend_from_slice(rest);
            parts.push(chunk.get_outer(&OuterKey::from_vec(local))?);
        }
        if parts.is_empty() {
            // empty selection; derive the shape without reading anything
            let mut shape = vec![0];
            shape.extend(crate::normalize::result_shape(rest, &self.dim[1..]));
            return DenseArray::from_shape_vec(shape, Vec::new());
        }
        concat_axis0(&parts)
    }

    /// Gather arbitrary axis-0 positions row by row.
    fn gather_rows(&self, positions: &[usize], rest: &[Indexer]) -> Result<DenseArray<A>> {
        let fetch = |&pos: &usize| -> Result<DenseArray<A>> {
            let (c, local) = self.locate(pos);
            let mut local_key = vec![Indexer::Index(local as isize)];
            local_key.extend_from_slice(rest);
            self.chunks[c].get_outer(&OuterKey::from_vec(local_key))
        };

        #[cfg(feature = "rayon")]
        let rows = positions.par_iter().map(fetch).collect::<Result<Vec<_>>>()?;
        #[cfg(not(feature = "rayon"))]
        let rows = positions.iter().map(fetch).collect::<Result<Vec<_>>>()?;

        let row_shape = crate::normalize::result_shape(rest, &self.dim[1..]);
        stack_new_axis0(&rows, &row_shape)
    }
}

impl<A: Clone + Send + Sync> IndexableArray<A> for ChunkedArray<A> {
    fn capability(&self) -> IndexingCapability {
        IndexingCapability::Vectorized
    }

    fn shape(&self) -> &[usize] {
        &self.dim
    }

    fn get(&self, key: &OuterKey) -> Result<DenseArray<A>> {
        if key.ndim() != self.ndim() {
            return Err(from_kind(ErrorKind::InvalidIndexer));
        }
        let compact = self.compact_key(key)?;
        let (head, rest) = compact.split_first().expect("chunked arrays have ndim >= 1");

        match head {
            Indexer::Index(i) => {
                let (c, local) = self.locate(resolve_index(*i, self.dim[0])?);
                let mut local_key = vec![Indexer::Index(local as isize)];
                local_key.extend_from_slice(rest);
                self.chunks[c].get_outer(&OuterKey::from_vec(local_key))
            }
            Indexer::Full => self.gather_contiguous(0, self.dim[0], rest),
            Indexer::Slice(s) => {
                let (start, stop, step) = s.indices(self.dim[0]);
                if step == 1 {
                    self.gather_contiguous(start as usize, stop.max(start) as usize, rest)
                } else {
                    let positions: Vec<usize> =
                        s.positions(self.dim[0]).into_iter().map(|p| p as usize).collect();
                    self.gather_rows(&positions, rest)
                }
            }
            Indexer::IntArray(v) => {
                let positions = v
                    .iter()
                    .map(|&i| resolve_index(i, self.dim[0]))
                    .collect::<Result<Vec<_>>>()?;
                self.gather_rows(&positions, rest)
            }
            Indexer::BoolMask(_) => Err(from_kind(ErrorKind::InvalidIndexer)),
        }
    }

    fn set(&self, _key: &OuterKey, _value: &DenseArray<A>) -> Result<()> {
        Err(from_kind(ErrorKind::ReadOnly))
    }
}
