//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// `add` found a live entry for the key
    #[error("Key already exists: {0}")]
    AlreadyExists(String),

    /// `replace` found no live entry for the key
    #[error("Key not found: {0}")]
    NotFound(String),

    /// A stored value could not be written to a snapshot
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// A snapshot stream was malformed, truncated or unsupported
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// The underlying sink, source or file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
