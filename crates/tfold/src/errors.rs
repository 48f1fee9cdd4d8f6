//! # Error Types

use std::path::PathBuf;

/// Errors from tfold operations.
#[derive(Debug, thiserror::Error)]
pub enum TfoldError {
    /// An input file could not be opened or read.
    #[error("input not readable: {}", path.display())]
    InputNotReadable {
        /// The path that failed to open or read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An operation was given the wrong number of input sources.
    #[error("expected {expected} input sources, got {got}")]
    SourceCount {
        /// The number of sources the operation requires.
        expected: usize,
        /// The number of sources it was given.
        got: usize,
    },

    /// The input exceeds the engine's addressable symbol count.
    #[error("input of {symbols} symbols exceeds the supported maximum")]
    InputTooLarge {
        /// The symbol count that was requested.
        symbols: u64,
    },

    /// Allocation of engine working memory failed.
    #[error("allocation failure: {0}")]
    Allocation(#[from] std::collections::TryReserveError),

    /// An internal invariant of the token graph was violated.
    ///
    /// These are bugs, not user errors; the message names the broken
    /// invariant and a diagnostic is logged at debug level.
    #[error("internal consistency violation: {0}")]
    Consistency(&'static str),

    /// I/O error from an output device.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for tfold operations.
pub type TfResult<T> = std::result::Result<T, TfoldError>;
