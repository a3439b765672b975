//! Timestamped reports of structural violations.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Local};

use crate::error::{ColdefError, Result};
use crate::validate::ValidationError;

/// A consolidated report of every violation found in one scan.
#[derive(Debug, Clone)]
pub struct ErrorReport<'a> {
    errors: &'a [ValidationError],
    timestamp: DateTime<Local>,
}

impl<'a> ErrorReport<'a> {
    /// Create a report stamped with the current local time.
    pub fn new(errors: &'a [ValidationError]) -> Self {
        Self::at(errors, Local::now())
    }

    /// Create a report with an explicit timestamp.
    pub fn at(errors: &'a [ValidationError], timestamp: DateTime<Local>) -> Self {
        Self { errors, timestamp }
    }

    /// Render the report text.
    pub fn render(&self) -> String {
        let mut out = format!(
            "{} - {} errors detected\n",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.errors.len()
        );
        out.push_str("Error: malformed lines detected:\n");
        for err in self.errors {
            out.push_str(&err.to_string());
            out.push('\n');
        }
        out
    }

    /// Write the report to `destination`, or to stderr when `None`.
    pub fn write(&self, destination: Option<&Path>) -> Result<()> {
        let text = self.render();
        match destination {
            Some(path) => fs::write(path, text).map_err(|source| ColdefError::DestinationWrite {
                path: path.to_path_buf(),
                source,
            }),
            None => {
                let mut stderr = io::stderr().lock();
                stderr.write_all(text.as_bytes())?;
                stderr.flush()?;
                Ok(())
            }
        }
    }
}
