use std::error::Error;
use std::fmt;

/// An error related to index translation or application.
#[derive(Clone, Debug)]
pub struct IndexingError {
    // we want to be able to change this representation later
    repr: ErrorKind,
}

impl IndexingError {
    /// Return the `ErrorKind` of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.repr
    }

    /// Create a new `IndexingError` with the given kind. External backends
    /// use this to surface errors through the adapter interface.
    pub fn from_kind(kind: ErrorKind) -> IndexingError {
        from_kind(kind)
    }
}

/// Error code for an error related to index translation or application.
///
/// This enumeration is not exhaustive. The representation of the enum
/// is not guaranteed.
#[derive(Copy, Clone, Debug)]
#[repr(u64)]
pub enum ErrorKind {
    /// key has more entries than the array has dimensions
    TooManyIndices,
    /// position outside the bounds of the axis it indexes
    OutOfBounds,
    /// broadcast key has no orthogonal representation
    CannotOrthogonalize,
    /// array indexer is malformed (wrong rank or inconsistent lengths)
    InvalidIndexer,
    /// key requires more array axes than the backend capability admits
    CapabilityMismatch,
    /// shape of a value or buffer does not match its destination
    IncompatibleShapes,
    /// write attempted against a read-only backend
    ReadOnly,
    /// assigned value is incompatible with the storage element type
    IncompatibleValue,
    #[doc(hidden)]
    __Incomplete,
}

#[inline(always)]
pub fn from_kind(k: ErrorKind) -> IndexingError {
    IndexingError { repr: k }
}

impl PartialEq for ErrorKind {
    #[inline(always)]
    fn eq(&self, rhs: &Self) -> bool {
        *self as u64 == *rhs as u64
    }
}

impl PartialEq for IndexingError {
    #[inline(always)]
    fn eq(&self, rhs: &Self) -> bool {
        self.repr == rhs.repr
    }
}

impl Error for IndexingError {}

impl fmt::Display for IndexingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self.kind() {
            ErrorKind::TooManyIndices => "too many indices for array",
            ErrorKind::OutOfBounds => "index out of bounds for axis",
            ErrorKind::CannotOrthogonalize => "indexer cannot be orthogonalized",
            ErrorKind::InvalidIndexer => "invalid array indexer",
            ErrorKind::CapabilityMismatch => "key exceeds the backend indexing capability",
            ErrorKind::IncompatibleShapes => "incompatible shapes",
            ErrorKind::ReadOnly => "backend does not support item assignment",
            ErrorKind::IncompatibleValue => "value is incompatible with the storage element type",
            ErrorKind::__Incomplete => "this error variant is not in use",
        };
        write!(f, "{}", description)
    }
}

/// Convenience alias for indexing results.
pub type Result<T> = std::result::Result<T, IndexingError>;
