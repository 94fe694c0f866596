//! Error types for the built-in modinfo reader.

use std::collections::TryReserveError;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while opening, iterating, or searching modules.builtin.modinfo.
#[derive(Debug, Error)]
pub enum BuiltinError {
    /// `<dirname>/modules.builtin.modinfo` does not fit in PATH_MAX.
    #[error("path too long: {path_len} bytes (limit {limit})")]
    PathTooLong { path_len: usize, limit: usize },

    #[error("IO error opening {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("out of memory: {0}")]
    OutOfMemory(#[from] TryReserveError),

    /// A record has no `.` separating module name from key.
    #[error("malformed record at offset {offset}: missing '.' after module name")]
    Malformed { offset: usize },

    /// A group bounded by a previous `advance` no longer parses. Indicates a
    /// mismatched advance/extract pairing rather than bad input.
    #[error("inconsistent group at offset {offset}: missing '.' inside advanced range")]
    Inconsistent { offset: usize },

    #[error("extract called without a pending group")]
    NoPendingGroup,

    #[error("module not found: {0}")]
    NotFound(String),
}

impl BuiltinError {
    /// True for [`BuiltinError::NotFound`], which callers usually treat as benign.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, BuiltinError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, BuiltinError>;
