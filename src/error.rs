use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of one decode step or one record write.
///
/// Every variant ends the decode stream it appears in.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("operation cancelled")]
    Cancelled,

    #[error("record ({line}) was not in the correct format")]
    Format { line: String },

    #[error("record ({line}) had a non-numeric ID")]
    NonNumericId { line: String },

    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),
}

impl RecordError {
    pub fn format(line: impl Into<String>) -> Self {
        Self::Format { line: line.into() }
    }

    pub fn non_numeric_id(line: impl Into<String>) -> Self {
        Self::NonNumericId { line: line.into() }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Errors of the two-field CSV pipeline.
#[derive(Error, Debug)]
pub enum CsvError {
    #[error("entry at line {line} was invalid: data format is incorrect (expected 2 fields, got {fields})")]
    InvalidRecord { line: usize, fields: usize },

    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),

    #[error("CSV failure: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for field '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
