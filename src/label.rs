// Copyright 2025 ndlazy developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A one-dimensional label index and its indexing adapter.
//!
//! Label-to-position translation (`get_loc`/`get_indexer`) happens upstream
//! of the indexing core; the adapter here only ever sees position-based
//! keys. Its own specialization is element fidelity: scalar extraction
//! yields a 0-d array, missing timestamps stay the canonical not-a-time
//! value, and exotic label families degrade to an opaque element type
//! instead of failing.

use std::sync::{PoisonError, RwLock};

use crate::adapters::{IndexableArray, IndexingCapability};
use crate::dense::DenseArray;
use crate::error::{from_kind, ErrorKind, Result};
use crate::orthogonal::OuterKey;
use crate::slice::{resolve_index, Indexer};

/// An element of a label index.
///
/// `Timestamp(None)` is the canonical missing-timestamp ("not a time")
/// value; every missing timestamp entering the index is normalized to it.
/// Label families without a native element type here (periods, categories)
/// are carried as `Opaque` rendered text rather than rejected.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LabelValue {
    Int(i64),
    Float(f64),
    Str(String),
    /// Nanoseconds since the epoch, or `None` for not-a-time.
    Timestamp(Option<i64>),
    /// Rendered form of a label family with no native element type.
    Opaque(String),
}

impl LabelValue {
    pub fn dtype(&self) -> LabelDtype {
        match self {
            LabelValue::Int(_) => LabelDtype::Int,
            LabelValue::Float(_) => LabelDtype::Float,
            LabelValue::Str(_) => LabelDtype::Str,
            LabelValue::Timestamp(_) => LabelDtype::Timestamp,
            LabelValue::Opaque(_) => LabelDtype::Opaque,
        }
    }

    /// Whether this is the canonical missing-timestamp value.
    pub fn is_nat(&self) -> bool {
        matches!(self, LabelValue::Timestamp(None))
    }
}

/// Element type of a label index.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LabelDtype {
    Int,
    Float,
    Str,
    Timestamp,
    Opaque,
}

/// A 1-d index of labels with position lookup.
///
/// This is the seam to the label-index collaborator: `get_loc` and
/// `get_indexer` produce the positional keys the indexing core consumes.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelIndex {
    values: Vec<LabelValue>,
    dtype: LabelDtype,
}

impl LabelIndex {
    pub fn new(values: Vec<LabelValue>, dtype: LabelDtype) -> LabelIndex {
        LabelIndex { values, dtype }
    }

    pub fn from_ints(values: Vec<i64>) -> LabelIndex {
        LabelIndex {
            values: values.into_iter().map(LabelValue::Int).collect(),
            dtype: LabelDtype::Int,
        }
    }

    pub fn from_strs<S: Into<String>>(values: Vec<S>) -> LabelIndex {
        LabelIndex {
            values: values.into_iter().map(|s| LabelValue::Str(s.into())).collect(),
            dtype: LabelDtype::Str,
        }
    }

    /// Build a timestamp index; `None` entries become the canonical
    /// not-a-time value.
    pub fn from_timestamps(values: Vec<Option<i64>>) -> LabelIndex {
        LabelIndex {
            values: values.into_iter().map(LabelValue::Timestamp).collect(),
            dtype: LabelDtype::Timestamp,
        }
    }

    /// Build from period-like labels, which degrade to the opaque element
    /// type.
    pub fn from_periods<S: Into<String>>(values: Vec<S>) -> LabelIndex {
        LabelIndex {
            values: values.into_iter().map(|s| LabelValue::Opaque(s.into())).collect(),
            dtype: LabelDtype::Opaque,
        }
    }

    /// Build from categorical labels, which degrade to the opaque element
    /// type.
    pub fn from_categories<S: Into<String>>(values: Vec<S>) -> LabelIndex {
        LabelIndex {
            values: values.into_iter().map(|s| LabelValue::Opaque(s.into())).collect(),
            dtype: LabelDtype::Opaque,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dtype(&self) -> LabelDtype {
        self.dtype
    }

    pub fn values(&self) -> &[LabelValue] {
        &self.values
    }

    /// Position of the first occurrence of `label`.
    pub fn get_loc(&self, label: &LabelValue) -> Option<usize> {
        self.values.iter().position(|v| v == label)
    }

    /// Positions of `labels`, with `-1` marking labels not in the index.
    pub fn get_indexer(&self, labels: &[LabelValue]) -> Vec<isize> {
        labels
            .iter()
            .map(|label| self.get_loc(label).map_or(-1, |p| p as isize))
            .collect()
    }
}

/// Adapter presenting a [`LabelIndex`] as a 1-d backend of
/// [`LabelValue`] elements.
pub struct LabelIndexAdapter {
    dim: Vec<usize>,
    dtype: LabelDtype,
    index: RwLock<Vec<LabelValue>>,
}

impl LabelIndexAdapter {
    pub fn new(index: LabelIndex) -> LabelIndexAdapter {
        LabelIndexAdapter {
            dim: vec![index.len()],
            dtype: index.dtype,
            index: RwLock::new(index.values),
        }
    }

    pub fn dtype(&self) -> LabelDtype {
        self.dtype
    }
}

impl IndexableArray<LabelValue> for LabelIndexAdapter {
    fn capability(&self) -> IndexingCapability {
        IndexingCapability::Vectorized
    }

    fn shape(&self) -> &[usize] {
        &self.dim
    }

    fn get(&self, key: &OuterKey) -> Result<DenseArray<LabelValue>> {
        if key.ndim() != 1 {
            return Err(from_kind(ErrorKind::InvalidIndexer));
        }
        let values = self.index.read().unwrap_or_else(PoisonError::into_inner);
        let size = values.len();
        match &key.as_slice()[0] {
            // a scalar extraction is still a (0-d) array, never a bare value
            Indexer::Index(i) => Ok(DenseArray::from_elem(
                values[resolve_index(*i, size)?].clone(),
            )),
            Indexer::Full => Ok(DenseArray::from_vec(values.clone())),
            Indexer::Slice(s) => Ok(DenseArray::from_vec(
                s.positions(size)
                    .into_iter()
                    .map(|p| values[p as usize].clone())
                    .collect(),
            )),
            Indexer::IntArray(v) => Ok(DenseArray::from_vec(
                v.iter()
                    .map(|&i| resolve_index(i, size).map(|p| values[p].clone()))
                    .collect::<Result<Vec<_>>>()?,
            )),
            Indexer::BoolMask(_) => Err(from_kind(ErrorKind::InvalidIndexer)),
        }
    }

    fn set(&self, key: &OuterKey, value: &DenseArray<LabelValue>) -> Result<()> {
        // dtype fidelity: a mismatched element can never enter the index
        for elem in value.iter() {
            if elem.dtype() != self.dtype {
                return Err(from_kind(ErrorKind::IncompatibleValue));
            }
        }
        if key.ndim() != 1 {
            return Err(from_kind(ErrorKind::InvalidIndexer));
        }
        let mut values = self.index.write().unwrap_or_else(PoisonError::into_inner);
        let size = values.len();
        let positions: Vec<usize> = match &key.as_slice()[0] {
            Indexer::Index(i) => vec![resolve_index(*i, size)?],
            Indexer::Full => (0..size).collect(),
            Indexer::Slice(s) => s.positions(size).into_iter().map(|p| p as usize).collect(),
            Indexer::IntArray(v) => v
                .iter()
                .map(|&i| resolve_index(i, size))
                .collect::<Result<Vec<_>>>()?,
            Indexer::BoolMask(_) => return Err(from_kind(ErrorKind::InvalidIndexer)),
        };
        let scalar = value.ndim() == 0;
        if !scalar && value.len() != positions.len() {
            return Err(from_kind(ErrorKind::IncompatibleShapes));
        }
        for (n, p) in positions.into_iter().enumerate() {
            let elem = if scalar {
                value.first()
            } else {
                value.as_slice().get(n)
            };
            if let Some(elem) = elem {
                values[p] = elem.clone();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::explicit_indexing_adapter;
    use crate::key;

    #[test]
    fn scalar_extraction_is_zero_dim() {
        let adapter = LabelIndexAdapter::new(LabelIndex::from_ints(vec![10, 20, 30]));
        let out = explicit_indexing_adapter(&key![1], &[3], adapter.capability(), |k| {
            adapter.get(k)
        })
        .unwrap();
        assert_eq!(out.shape(), &[] as &[usize]);
        assert_eq!(out.first(), Some(&LabelValue::Int(20)));
    }

    #[test]
    fn missing_timestamps_are_canonical_nat() {
        let adapter =
            LabelIndexAdapter::new(LabelIndex::from_timestamps(vec![Some(1), None, Some(3)]));
        let out = explicit_indexing_adapter(&key![1], &[3], adapter.capability(), |k| {
            adapter.get(k)
        })
        .unwrap();
        assert!(out.first().unwrap().is_nat());
    }

    #[test]
    fn period_labels_degrade_to_opaque() {
        let index = LabelIndex::from_periods(vec!["2000Q1", "2000Q2"]);
        assert_eq!(index.dtype(), LabelDtype::Opaque);
        let adapter = LabelIndexAdapter::new(index);
        let out = explicit_indexing_adapter(&key![0], &[2], adapter.capability(), |k| {
            adapter.get(k)
        })
        .unwrap();
        assert_eq!(out.first(), Some(&LabelValue::Opaque("2000Q1".into())));
    }

    #[test]
    fn position_lookup_seam() {
        let index = LabelIndex::from_strs(vec!["a", "b", "c"]);
        assert_eq!(index.get_loc(&LabelValue::Str("b".into())), Some(1));
        assert_eq!(index.get_loc(&LabelValue::Str("z".into())), None);
        assert_eq!(
            index.get_indexer(&[
                LabelValue::Str("c".into()),
                LabelValue::Str("z".into()),
                LabelValue::Str("a".into()),
            ]),
            vec![2, -1, 0]
        );
    }

    #[test]
    fn lookup_feeds_positional_indexing() {
        let index = LabelIndex::from_strs(vec!["x", "y", "z"]);
        let wanted = [LabelValue::Str("z".into()), LabelValue::Str("x".into())];
        let positions = index.get_indexer(&wanted);
        let adapter = LabelIndexAdapter::new(index);
        let out = explicit_indexing_adapter(&key![positions], &[3], adapter.capability(), |k| {
            adapter.get(k)
        })
        .unwrap();
        assert_eq!(out.as_slice(), &wanted);
    }

    #[test]
    fn mismatched_assignment_rejected() {
        let adapter = LabelIndexAdapter::new(LabelIndex::from_ints(vec![1, 2, 3]));
        let err = adapter
            .set(
                &OuterKey::all_full(1),
                &DenseArray::from_elem(LabelValue::Str("oops".into())),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncompatibleValue);

        adapter
            .set(&OuterKey::all_full(1), &DenseArray::from_elem(LabelValue::Int(9)))
            .unwrap();
        let out = adapter.get(&OuterKey::all_full(1)).unwrap();
        assert_eq!(
            out.as_slice(),
            &[LabelValue::Int(9), LabelValue::Int(9), LabelValue::Int(9)]
        );
    }
}
