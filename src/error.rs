use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::validate::ValidationError;

/// Error type for column definition analysis.
#[derive(Error, Debug)]
pub enum ColdefError {
    /// The input could not be opened or read.
    #[error("Failed to open '{}': {source}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// IO error while streaming a source that has no path.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The source yielded no header record.
    #[error("No rows found in file")]
    EmptySource,

    /// One or more fields failed the structural checks.
    #[error("{} malformed fields detected", .0.len())]
    StructuralViolation(Vec<ValidationError>),

    /// The generated text could not be written.
    #[error("Failed to write output to '{}': {source}", .path.display())]
    DestinationWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The generated text could not be written to stdout.
    #[error("Failed to write output to stdout: {0}")]
    StdoutWrite(#[source] io::Error),

    /// Field parsing error.
    #[error("Field parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ColdefError {
    /// Process exit code for this failure class.
    ///
    /// Codes are stable so calling tooling can branch on them:
    /// 1 empty source, 2 unreadable source, 3 output write failure,
    /// 5 structural violation, 6 field parse failure, 7 invalid configuration.
    pub fn exit_code(&self) -> u8 {
        match self {
            ColdefError::EmptySource => 1,
            ColdefError::SourceUnavailable { .. } | ColdefError::Io(_) => 2,
            ColdefError::DestinationWrite { .. } | ColdefError::StdoutWrite(_) => 3,
            ColdefError::StructuralViolation(_) => 5,
            ColdefError::Csv(_) => 6,
            ColdefError::InvalidConfig(_) => 7,
        }
    }
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, ColdefError>;
