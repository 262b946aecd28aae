use thiserror::Error;

use crate::matches::{Address, AddressPair};

macro_rules! inconsistent_error {
    // Single format string version
    ($msg:expr) => {
        crate::Error::InconsistentState {
            message: format!($msg),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::InconsistentState {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers all possible error conditions that can occur while mutating the match
/// model, keeping the diff views synchronized, and persisting match results. Each variant
/// provides specific context about the failure mode to enable appropriate error handling.
///
/// # Error Categories
///
/// ## Caller Errors
/// - [`Error::DuplicateMatch`] - A correspondence already exists on one of the two sides
/// - [`Error::UnknownAddress`] - An address is not present in the model being queried
///
/// ## Defensive Errors
/// - [`Error::InconsistentState`] - An internal invariant was violated; a programming-error
///   signal that is fatal in debug builds and logged-and-recovered in release builds
/// - [`Error::GraphError`] - A structural graph operation failed
///
/// ## Persistence and I/O Errors
/// - [`Error::StorageError`] - SQLite errors from the match database
/// - [`Error::CorruptDatabase`] - A loaded database failed its integrity cross-checks
/// - [`Error::FileError`] - Filesystem I/O errors
#[derive(Error, Debug)]
pub enum Error {
    /// A match already exists for one side of the given address pair.
    ///
    /// The match model is bipartite: every primary address and every secondary address
    /// can participate in at most one correspondence at each granularity. Attempting to
    /// add a match that would violate this is a caller error and leaves the model
    /// untouched.
    #[error("A match already exists for {0}")]
    DuplicateMatch(AddressPair),

    /// The given address is not present in the model being queried or mutated.
    #[error("Address {0} is not present")]
    UnknownAddress(Address),

    /// An internal invariant was violated.
    ///
    /// This indicates a programming error, such as a combined node with both sides
    /// absent or counters that no longer match the true cardinalities. The in-progress
    /// mutation is reverted before this is returned. The error includes the source
    /// location where the violation was detected.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of the violated invariant
    /// * `file` - Source file in which the violation was detected
    /// * `line` - Source line in which the violation was detected
    #[error("Inconsistent state - {file}:{line}: {message}")]
    InconsistentState {
        /// The message to be printed for the invariant violation
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A structural graph operation failed.
    ///
    /// Covers failures in the arena graph layer, such as adding an edge whose
    /// endpoints are not present.
    #[error("{0}")]
    GraphError(String),

    /// SQLite error from the match database.
    ///
    /// Wraps any failure from the persistence layer. A failed save leaves the
    /// in-memory match model untouched.
    #[error("{0}")]
    StorageError(#[from] rusqlite::Error),

    /// A loaded match database failed its integrity cross-checks.
    ///
    /// The persisted counter columns are compared against recomputed sums when a
    /// database is loaded; a mismatch means the file was written by a different
    /// producer version or corrupted on disk, and is reported to the caller instead
    /// of being trusted.
    #[error("Corrupt match database: {0}")]
    CorruptDatabase(String),

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),
}
