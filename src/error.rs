//! Error types for the decoder's input edges.
//!
//! The decoding pipeline itself is total over arbitrary bit streams: bad
//! blocks, bad fields, and sync loss are all represented inside the records
//! it emits, never as errors. `Error` only covers the places where the crate
//! touches the environment: parsing hex-format input lines and loading the
//! TMC event catalog.

use thiserror::Error;

/// Result type for fmrds operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur at the crate boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// A hex-format input line did not contain four block words.
    #[error("malformed hex group line: {0:?}")]
    MalformedHexLine(String),

    /// I/O failure reading input or a catalog file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A TMC catalog row could not be parsed.
    #[error("bad catalog row at line {line}: {reason}")]
    BadCatalogRow { line: usize, reason: String },
}
