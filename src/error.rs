//! Error type shared by the library and the `ice` binary.
//!
//! Every error carries an [`ErrorKind`] so callers can tell validation
//! problems apart from mid-run scoring failures, and the binary can map each
//! kind to a stable process exit code.

use thiserror::Error;

/// Broad classification of what went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad run parameters; raised before any lock is taken or task dispatched.
    InvalidParameter,
    /// The model's scoring capability failed for a grid point.
    ScoringFailure,
    /// Prediction output did not match the regression / binomial contract.
    UnsupportedModelShape,
    /// An exclusive lock is held by another owner.
    Locked,
    /// File, CSV, or JSON problems.
    Io,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::InvalidParameter => 2,
            ErrorKind::Io => 3,
            ErrorKind::ScoringFailure => 4,
            ErrorKind::UnsupportedModelShape => 5,
            ErrorKind::Locked => 6,
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParameter, message)
    }

    pub fn scoring(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ScoringFailure, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_per_kind() {
        let kinds = [
            ErrorKind::InvalidParameter,
            ErrorKind::ScoringFailure,
            ErrorKind::UnsupportedModelShape,
            ErrorKind::Locked,
            ErrorKind::Io,
        ];
        let mut codes: Vec<u8> = kinds.iter().map(|k| k.exit_code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn display_is_the_message() {
        let err = AppError::invalid("nbins must be >= 2.");
        assert_eq!(err.to_string(), "nbins must be >= 2.");
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }
}
