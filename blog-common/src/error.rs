//! Common error types for the blog workspace

use thiserror::Error;

/// Common result type for storage and infrastructure operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the blog crates
///
/// Domain rejections (invalid input, state conflicts) never use this type;
/// it carries only failures of the environment the domain runs in.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A stored value could not be decoded (bad UUID text, out-of-range timestamp)
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for a UNIQUE violation whose message names `column`
    ///
    /// SQLite reports these as "UNIQUE constraint failed: table.column".
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db_err)) => {
                db_err.is_unique_violation() && db_err.message().contains(column)
            }
            _ => false,
        }
    }
}
