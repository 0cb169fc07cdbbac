//! Error types for the bin2c-core library.
//!
//! Every failure is terminal for the current conversion. Variants carry enough
//! context (path, element offset, bound) for the caller to produce a useful
//! diagnostic without additional bookkeeping.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for bin2c operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all bin2c operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A path (plus terminator) does not fit the length ceiling
    #[error("path is {len} characters long, the limit is {max} including the terminator")]
    PathTooLong {
        /// Length of the offending path, without terminator
        len: usize,
        /// Ceiling, terminator included
        max: usize,
    },

    /// A macro identifier (plus terminator) does not fit the length ceiling
    #[error("macro name would be {len} characters long, the limit is {max} including the terminator")]
    NameTooLong {
        /// Combined length of all fragments, without terminator
        len: usize,
        /// Ceiling, terminator included
        max: usize,
    },

    /// An OS path could not be scanned because it is not valid Unicode
    #[error("path '{}' is not valid Unicode", path.display())]
    NonUnicodePath {
        /// The offending path
        path: PathBuf,
    },

    /// Failed to create an output file
    #[error("failed to create file '{path}': {source}")]
    FileCreate {
        /// Path to the file that failed to open
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the declaration text around the array body
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        /// Path to the file that failed to write
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Flushing or closing an output file failed after all writes went through
    #[error("failed to flush and close file '{path}': {source}")]
    FileClose {
        /// Path to the file that failed to close
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Reading the binary source failed
    #[error("failed to read input after {offset} bytes: {source}")]
    StreamRead {
        /// Number of bytes successfully encoded before the failure
        offset: u64,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Writing to the output stream failed
    #[error("failed to write output after {offset} array elements: {source}")]
    StreamWrite {
        /// Number of elements completely written before the failure
        offset: u64,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The element count would leave the range of the target's `long`
    #[error("input exceeds the maximum of {limit} array elements")]
    CountOverflow {
        /// Largest representable element count
        limit: u64,
    },
}

impl Error {
    /// Creates a new file creation error
    pub fn file_create(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileCreate {
            path: path.into(),
            source,
        }
    }

    /// Creates a new file write error
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a new file close error
    pub fn file_close(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileClose {
            path: path.into(),
            source,
        }
    }

    /// Attaches the output path to a stream write error
    pub(crate) fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Self::StreamWrite { source, .. } => Self::file_write(path, source),
            other => other,
        }
    }
}
