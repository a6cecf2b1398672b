//! Platform error taxonomy.
//!
//! Every domain, validation, conflict or not-found failure in the system is a
//! [`PlatformError`] carrying a stable `code` string. The codes are part of
//! the external contract: they appear in HTTP error bodies, in metric labels
//! and as the non-retriable `error_type` of workflow failures. Adding codes is
//! backward compatible; renaming is not.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Classifies errors so they can be mapped to HTTP statuses and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Operation invalid given the entity's current state.
    Domain,
    /// Malformed input.
    Validation,
    /// Id collision.
    Conflict,
    /// Referenced entity missing.
    NotFound,
    /// Infrastructure failure.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain => write!(f, "domain"),
            Self::Validation => write!(f, "validation"),
            Self::Conflict => write!(f, "conflict"),
            Self::NotFound => write!(f, "not_found"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Error enriched with a [`ErrorKind`] and a stable code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PlatformError {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
}

pub type PlatformResult<T> = Result<T, PlatformError>;

impl PlatformError {
    fn new(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn domain(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Domain, code, message)
    }

    pub fn validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, code, message)
    }

    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, code, message)
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, code, message)
    }

    pub fn internal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, code, message)
    }

    pub fn is_kind(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    /// Stable code string, `unknown_error` if empty.
    pub fn code(&self) -> &str {
        if self.code.is_empty() {
            "unknown_error"
        } else {
            &self.code
        }
    }
}
