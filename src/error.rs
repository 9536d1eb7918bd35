use std::path::PathBuf;

use thiserror::Error;

/// Problems with a single student record, independent of storage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("cannot convert {field}: {message}")]
    Conversion { field: String, message: String },

    #[error("unknown field: {0}")]
    UnknownField(String),
}

impl RecordError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        RecordError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn conversion(field: &str, message: impl Into<String>) -> Self {
        RecordError::Conversion {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum RosterError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("student with id {0} already exists")]
    DuplicateId(String),

    #[error("student not found: {0}")]
    NotFound(String),

    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("bad record #{index} in {}: {reason}", .path.display())]
    Corrupt {
        path: PathBuf,
        index: usize,
        reason: String,
    },
}

impl RosterError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RosterError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for failures against the backing file rather than the data itself.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            RosterError::Io { .. } | RosterError::Json { .. } | RosterError::Corrupt { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, RosterError>;
