// Copyright 2025 ndlazy developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A dense, row-major, owned n-dimensional array. This is the concrete type
//! every materialization produces and the native storage of the in-memory
//! backend.

use itertools::Itertools;
use num_traits::Zero;

use crate::broadcast::{BroadcastIndexer, BroadcastKey};
use crate::error::{from_kind, ErrorKind, Result};
use crate::orthogonal::OuterKey;
use crate::slice::{resolve_index, Indexer};

/// An owned n-dimensional array in row-major layout.
///
/// A `DenseArray` with an empty shape is a 0-d array holding exactly one
/// element; scalar extraction always produces one of these, never a bare
/// element.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseArray<A> {
    dim: Vec<usize>,
    data: Vec<A>,
}

fn size_of_shape(shape: &[usize]) -> usize {
    shape.iter().product()
}

impl<A> DenseArray<A> {
    /// Create an array with the given shape from a flat, row-major vector.
    ///
    /// Fails with [`ErrorKind::IncompatibleShapes`] if the vector length
    /// does not match the shape's element count.
    pub fn from_shape_vec(shape: Vec<usize>, data: Vec<A>) -> Result<DenseArray<A>> {
        if size_of_shape(&shape) != data.len() {
            return Err(from_kind(ErrorKind::IncompatibleShapes));
        }
        Ok(DenseArray { dim: shape, data })
    }

    /// Create a one-dimensional array from a vector.
    pub fn from_vec(data: Vec<A>) -> DenseArray<A> {
        DenseArray { dim: vec![data.len()], data }
    }

    /// Create a 0-d array holding a single element.
    pub fn from_elem(elem: A) -> DenseArray<A> {
        DenseArray { dim: vec![], data: vec![elem] }
    }

    pub fn shape(&self) -> &[usize] {
        &self.dim
    }

    pub fn ndim(&self) -> usize {
        self.dim.len()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major strides (in elements) for this shape.
    pub fn strides(&self) -> Vec<usize> {
        let mut strides = vec![1; self.dim.len()];
        for i in (0..self.dim.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * self.dim[i + 1];
        }
        strides
    }

    /// Flat, row-major view of the elements.
    pub fn as_slice(&self) -> &[A] {
        &self.data
    }

    /// The single element of a 0-d (or one-element) array.
    pub fn first(&self) -> Option<&A> {
        self.data.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, A> {
        self.data.iter()
    }

    fn flat_offset(&self, index: &[usize], strides: &[usize]) -> usize {
        index.iter().zip(strides).map(|(i, s)| i * s).sum()
    }
}

impl<A: Clone + Zero> DenseArray<A> {
    /// Create an array of the given shape, filled with zeros.
    pub fn zeros(shape: Vec<usize>) -> DenseArray<A> {
        let len = size_of_shape(&shape);
        DenseArray { dim: shape, data: vec![A::zero(); len] }
    }
}

/// Resolved positions per input axis, plus the axis's contribution to the
/// output shape (`None` for a collapsing scalar).
fn axis_positions(k: &Indexer, size: usize) -> Result<(Vec<usize>, Option<usize>)> {
    match k {
        Indexer::Index(i) => Ok((vec![resolve_index(*i, size)?], None)),
        Indexer::Full => Ok(((0..size).collect(), Some(size))),
        Indexer::Slice(s) => {
            let positions: Vec<usize> = s.positions(size).into_iter().map(|p| p as usize).collect();
            let len = positions.len();
            Ok((positions, Some(len)))
        }
        Indexer::IntArray(v) => {
            let positions = v
                .iter()
                .map(|&i| resolve_index(i, size))
                .collect::<Result<Vec<_>>>()?;
            let len = positions.len();
            Ok((positions, Some(len)))
        }
        Indexer::BoolMask(_) => Err(from_kind(ErrorKind::InvalidIndexer)),
    }
}

impl<A: Clone> DenseArray<A> {
    /// Select with an outer-style key: array axes combine by cross product.
    ///
    /// `Index` entries collapse their dimension; the result of an all-`Index`
    /// key is a 0-d array.
    pub fn get_outer(&self, key: &OuterKey) -> Result<DenseArray<A>> {
        if key.ndim() != self.ndim() {
            return Err(from_kind(ErrorKind::InvalidIndexer));
        }
        let mut per_axis = Vec::with_capacity(self.ndim());
        let mut out_shape = Vec::new();
        for (k, &size) in key.iter().zip(&self.dim) {
            let (positions, out_len) = axis_positions(k, size)?;
            if let Some(len) = out_len {
                out_shape.push(len);
            }
            per_axis.push(positions);
        }

        let strides = self.strides();
        let mut out = Vec::with_capacity(size_of_shape(&out_shape));
        if per_axis.is_empty() {
            // 0-d array; the only valid key is the empty one
            out.push(self.data[0].clone());
        } else {
            for combo in per_axis
                .iter()
                .map(|p| p.iter().copied())
                .multi_cartesian_product()
            {
                out.push(self.data[self.flat_offset(&combo, &strides)].clone());
            }
        }
        DenseArray::from_shape_vec(out_shape, out)
    }

    /// Assign `value` to the selection an outer-style key makes.
    ///
    /// `value` must either match the selection's shape exactly or be a 0-d
    /// array, which is broadcast to every selected element.
    pub fn set_outer(&mut self, key: &OuterKey, value: &DenseArray<A>) -> Result<()> {
        if key.ndim() != self.ndim() {
            return Err(from_kind(ErrorKind::InvalidIndexer));
        }
        let mut per_axis = Vec::with_capacity(self.ndim());
        let mut out_shape = Vec::new();
        for (k, &size) in key.iter().zip(&self.dim) {
            let (positions, out_len) = axis_positions(k, size)?;
            if let Some(len) = out_len {
                out_shape.push(len);
            }
            per_axis.push(positions);
        }

        let scalar = value.ndim() == 0;
        if !scalar && value.shape() != out_shape.as_slice() {
            return Err(from_kind(ErrorKind::IncompatibleShapes));
        }

        let strides = self.strides();
        if per_axis.is_empty() {
            self.data[0] = value.data[0].clone();
            return Ok(());
        }
        for (n, combo) in per_axis
            .iter()
            .map(|p| p.iter().copied())
            .multi_cartesian_product()
            .enumerate()
        {
            let offset = self.flat_offset(&combo, &strides);
            let elem = if scalar { &value.data[0] } else { &value.data[n] };
            self.data[offset] = elem.clone();
        }
        Ok(())
    }

    /// Select with a broadcast-style key: array axes are broadcast together
    /// and corresponding elements are zipped.
    ///
    /// The broadcast block of axes lands at the position of the first array
    /// entry; slices keep their own axes and scalars collapse theirs. With a
    /// single 1-d array entry this coincides with [`get_outer`].
    pub fn get_broadcast(&self, key: &BroadcastKey) -> Result<DenseArray<A>> {
        let elems = key.as_elems();
        if elems.len() > self.ndim() {
            return Err(from_kind(ErrorKind::TooManyIndices));
        }

        // Broadcast all array entries to a common shape.
        let array_shapes: Vec<&[usize]> = elems
            .iter()
            .filter_map(|k| match k {
                BroadcastIndexer::Array(a) if a.ndim() > 0 => Some(a.shape()),
                _ => None,
            })
            .collect();
        let bshape = broadcast_shapes(&array_shapes)?;

        // Per input axis, how a full input index is produced from an output
        // index.
        enum Source {
            Fixed(usize),
            Axis(Vec<usize>, usize),        // positions, output axis
            Zipped(Vec<usize>, Vec<usize>), // raveled resolved positions, original shape
        }

        let full = BroadcastIndexer::Slice(crate::slice::Slice::full());
        let mut sources = Vec::with_capacity(self.ndim());
        let mut out_shape = Vec::new();
        let mut block_start = None;
        for (axis, &size) in self.dim.iter().enumerate() {
            let k = elems.get(axis).unwrap_or(&full);
            match k {
                BroadcastIndexer::Index(i) => {
                    sources.push(Source::Fixed(resolve_index(*i, size)?));
                }
                BroadcastIndexer::Slice(s) => {
                    let positions: Vec<usize> =
                        s.positions(size).into_iter().map(|p| p as usize).collect();
                    out_shape.push(positions.len());
                    sources.push(Source::Axis(positions, out_shape.len() - 1));
                }
                BroadcastIndexer::Array(a) if a.ndim() == 0 => {
                    let i = *a.first().ok_or(from_kind(ErrorKind::InvalidIndexer))?;
                    sources.push(Source::Fixed(resolve_index(i, size)?));
                }
                BroadcastIndexer::Array(a) => {
                    if block_start.is_none() {
                        block_start = Some(out_shape.len());
                        out_shape.extend_from_slice(&bshape);
                    }
                    let resolved = a
                        .as_slice()
                        .iter()
                        .map(|&i| resolve_index(i, size))
                        .collect::<Result<Vec<_>>>()?;
                    sources.push(Source::Zipped(resolved, a.shape().to_vec()));
                }
            }
        }

        let strides = self.strides();
        let total = size_of_shape(&out_shape);
        let mut out = Vec::with_capacity(total);
        let mut out_index = vec![0usize; out_shape.len()];
        for _ in 0..total {
            let mut offset = 0;
            for (source, stride) in sources.iter().zip(&strides) {
                let pos = match source {
                    Source::Fixed(p) => *p,
                    Source::Axis(positions, out_axis) => positions[out_index[*out_axis]],
                    Source::Zipped(positions, shape) => {
                        let start = block_start.unwrap_or(0);
                        let bcoord = &out_index[start..start + bshape.len()];
                        broadcast_value(positions, shape, bcoord, &bshape)
                    }
                };
                offset += pos * stride;
            }
            out.push(self.data[offset].clone());
            increment_index(&mut out_index, &out_shape);
        }
        DenseArray::from_shape_vec(out_shape, out)
    }
}

/// Standard right-aligned broadcasting of a set of shapes.
fn broadcast_shapes(shapes: &[&[usize]]) -> Result<Vec<usize>> {
    let ndim = shapes.iter().map(|s| s.len()).max().unwrap_or(0);
    let mut out = vec![1usize; ndim];
    for shape in shapes {
        let offset = ndim - shape.len();
        for (i, &d) in shape.iter().enumerate() {
            let o = &mut out[offset + i];
            if *o == 1 {
                *o = d;
            } else if d != 1 && d != *o {
                return Err(from_kind(ErrorKind::IncompatibleShapes));
            }
        }
    }
    Ok(out)
}

/// Value of a (right-aligned) broadcast participant at a broadcast-shape
/// coordinate.
fn broadcast_value(values: &[usize], shape: &[usize], bcoord: &[usize], bshape: &[usize]) -> usize {
    let offset = bshape.len() - shape.len();
    let mut flat = 0;
    let mut stride = 1;
    for ax in (0..shape.len()).rev() {
        let i = if shape[ax] == 1 { 0 } else { bcoord[offset + ax] };
        flat += i * stride;
        stride *= shape[ax];
    }
    values[flat]
}

/// Advance a row-major multi-index by one within `shape`.
fn increment_index(index: &mut [usize], shape: &[usize]) {
    for ax in (0..shape.len()).rev() {
        index[ax] += 1;
        if index[ax] < shape[ax] {
            return;
        }
        index[ax] = 0;
    }
}

/// Concatenate arrays of identical trailing shape along axis 0.
pub(crate) fn concat_axis0<A: Clone>(parts: &[DenseArray<A>]) -> Result<DenseArray<A>> {
    let first = parts.first().ok_or(from_kind(ErrorKind::IncompatibleShapes))?;
    if first.ndim() == 0 {
        return Err(from_kind(ErrorKind::IncompatibleShapes));
    }
    let rest_shape = &first.shape()[1..];
    let mut axis_len = 0;
    for part in parts {
        if part.ndim() != first.ndim() || &part.shape()[1..] != rest_shape {
            return Err(from_kind(ErrorKind::IncompatibleShapes));
        }
        axis_len += part.shape()[0];
    }
    let mut shape = vec![axis_len];
    shape.extend_from_slice(rest_shape);
    let mut data = Vec::with_capacity(size_of_shape(&shape));
    for part in parts {
        data.extend(part.data.iter().cloned());
    }
    DenseArray::from_shape_vec(shape, data)
}

/// Stack equally shaped arrays along a new axis 0.
pub(crate) fn stack_new_axis0<A: Clone>(
    parts: &[DenseArray<A>],
    part_shape: &[usize],
) -> Result<DenseArray<A>> {
    let mut shape = vec![parts.len()];
    shape.extend_from_slice(part_shape);
    let mut data = Vec::with_capacity(size_of_shape(&shape));
    for part in parts {
        if part.shape() != part_shape {
            return Err(from_kind(ErrorKind::IncompatibleShapes));
        }
        data.extend(part.data.iter().cloned());
    }
    DenseArray::from_shape_vec(shape, data)
}
