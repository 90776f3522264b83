//! Error types for glimpse.

use thiserror::Error;

/// Errors that can occur while configuring algorithms or using an index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Invalid parameter value (raised at construction time).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Hash produced by a different algorithm than the one the index was built with.
    #[error("incompatible hash: index uses algorithm {expected:#010x}, hash has {actual:#010x}")]
    IncompatibleHash { expected: u32, actual: u32 },

    /// Bit length of a hash does not match the index depth (or the other hash).
    #[error("length mismatch: expected {expected} bits, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Index is empty (nothing has been inserted yet).
    #[error("index is empty")]
    EmptyIndex,
}

pub type Result<T> = std::result::Result<T, Error>;
