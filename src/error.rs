//! Error types for the posting engine.

use crate::validation::ValidationError;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, PostingError>;

/// Errors that abort an operation.
///
/// Business rejections (unknown card, overlimit, ...) are not errors; they are
/// collected as [`RejectRecord`](crate::RejectRecord)s by the engine.
#[derive(Error, Debug)]
pub enum PostingError {
    /// Failed to open or read an input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed input to a decimal conversion
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Text that is not a DB2 timestamp
    #[error("Invalid timestamp '{0}', expected YYYY-MM-DD-HH.MM.SS.NNNNNN")]
    InvalidTimestamp(String),

    /// Unparseable or unsupported PIC clause
    #[error("Invalid PIC clause '{clause}': {message}")]
    InvalidPicClause { clause: String, message: String },

    /// Field failed its format check
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Invalid input record
    #[error("Invalid record at row {row}: {message}")]
    InvalidRecord { row: usize, message: String },

    /// Account is already held for update by another caller
    #[error("Account {0} is already locked for update")]
    AccountLocked(String),

    /// Posting was requested for a card with no cross-reference
    #[error("No cross-reference for card {0}")]
    UnknownCard(String),

    /// Posting was requested for an account that is not loaded
    #[error("Account {0} not found")]
    UnknownAccount(String),

    /// A reject record was requested without a preceding failed validation
    #[error("No validation failure recorded for transaction {0}")]
    NoRejectionPending(String),

    /// Missing input file arguments
    #[error("Missing input file argument. Usage: carddemo-posting <accounts.csv> <xref.csv> <daily.csv> [rejects.txt] [accounts-out.csv]")]
    MissingArgument,
}
