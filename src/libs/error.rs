//! Error taxonomy for the interval storage engine.
//!
//! Every fallible engine operation returns [`AppResult`]. Commands convert
//! these into `anyhow::Error` at the command boundary, where they are
//! reported through the messaging macros.
//!
//! ## Categories
//!
//! - **Validation**: the caller passed inconsistent arguments (unknown id,
//!   malformed range). Nothing was changed.
//! - **NotFound**: a delete or modify target is not stored verbatim. This is a
//!   stale read or a programming error and is always fatal to the operation.
//! - **Parse**: a malformed data file line or journal block. The record is
//!   never skipped or repaired.
//! - **Io / AtomicsDisabled**: file system failures. Staged temporary files
//!   are left in place and the target file is untouched.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Datafile {file} does not contain '{line}'")]
    NotFound { file: String, line: String },

    #[error("Unrecognizable line '{line}': {reason}")]
    Parse { line: String, reason: String },

    #[error("Journal error: {0}")]
    Journal(String),

    #[error("Trying to decrement non-existent tag '{0}'")]
    UnknownTag(String),

    #[error("Unable to update database.")]
    AtomicsDisabled,

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl AppError {
    pub fn parse(line: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            line: line.into(),
            reason: reason.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

pub type AppResult<T> = Result<T, AppError>;
