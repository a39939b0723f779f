use std::fmt::{Display, Formatter};

use thiserror::Error;

/// What a failed lookup was looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundKind {
    Account(String),
    Doctor(String),
    /// 1-based position inside the owner's reservation queue
    Reservation(usize),
}

impl Display for NotFoundKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NotFoundKind::Account(id) => write!(f, "User '{}' not found", id),
            NotFoundKind::Doctor(id) => write!(f, "Doctor '{}' not found in system", id),
            NotFoundKind::Reservation(pos) => write!(f, "Reservation #{} not found", pos),
        }
    }
}

/// Failures reported by the core structures and the clinic service.
///
/// Every operation that returns one of these has left the directory, the trie
/// and all reservation queues exactly as they were before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClinicError {
    #[error("Username '{0}' already exists")]
    DuplicateIdentifier(String),

    #[error("{0}")]
    NotFound(NotFoundKind),

    #[error("Doctor '{0}' is currently unavailable")]
    Unavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Report capacity of {0} reservations exceeded")]
    CapacityExceeded(usize),

    #[error("Several doctors match: {}", .0.join(", "))]
    AmbiguousDoctor(Vec<String>),
}

impl ClinicError {
    pub fn account_not_found(id: impl Into<String>) -> Self {
        ClinicError::NotFound(NotFoundKind::Account(id.into()))
    }

    pub fn doctor_not_found(id: impl Into<String>) -> Self {
        ClinicError::NotFound(NotFoundKind::Doctor(id.into()))
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        ClinicError::InvalidInput(msg.into())
    }
}

/// Failures of the CSV persistence layer.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed record in {file} at line {line}: {reason}")]
    Malformed {
        file: String,
        line: u64,
        reason: String,
    },
}
