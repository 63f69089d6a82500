//! Error type shared by the store and the map.

use core::fmt;

/// Failure outcome of a store or map operation.
///
/// `IndexOutOfRange` and `InvariantViolation` coming out of a `HashIndex`
/// indicate a bookkeeping defect; they are reported rather than panicking so
/// the caller decides how to react.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// A positional index fell outside the valid range for the operation.
    IndexOutOfRange { index: usize, len: usize },
    /// A full linear-probe cycle found neither the key nor an empty slot.
    NoSpace { capacity: usize },
    /// A structural invariant (AVL balance, cached height/size, entry count)
    /// does not hold.
    InvariantViolation(&'static str),
    /// The requested size exceeds the configured maximum.
    InputTooLarge { requested: usize, max: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for length {len}")
            }
            Error::NoSpace { capacity } => {
                write!(f, "no free slot found after probing all {capacity} slots")
            }
            Error::InvariantViolation(what) => write!(f, "invariant violated: {what}"),
            Error::InputTooLarge { requested, max } => {
                write!(f, "requested size {requested} exceeds maximum {max}")
            }
        }
    }
}

impl std::error::Error for Error {}
