//! Unified error handling for the control daemon.
//!
//! A single error type is shared across the HAL, profile engine, metrics
//! store, and RPC surface, built with `thiserror` for ergonomic `Display`
//! and `std::error::Error` impls.

use std::io;
use std::path::PathBuf;

/// Result type alias using [`UccError`].
pub type Result<T> = std::result::Result<T, UccError>;

/// Unified error taxonomy for all daemon operations.
///
/// The RPC layer maps every variant onto one of the seven wire error
/// classes (`Unsupported`, `HwIo`, `InvalidArgument`, `AuthDenied`,
/// `NotFound`, `Conflict`, `Transient`) via [`UccError::class`].
#[derive(thiserror::Error, Debug)]
pub enum UccError {
    // ------------------------------------------------------------------
    // Unsupported: device identity does not match a known capability record
    // ------------------------------------------------------------------
    #[error("device not supported: {0}")]
    Unsupported(String),

    // ------------------------------------------------------------------
    // HwIo: sysfs / hwmon / EC read or write failed
    // ------------------------------------------------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to read {path}: {reason}")]
    HwRead { path: PathBuf, reason: String },

    #[error("failed to write {path}: {reason}")]
    HwWrite { path: PathBuf, reason: String },

    #[error("EC transport error: {0}")]
    EcTransport(String),

    #[error("hardware not found: {0}")]
    HardwareNotFound(String),

    #[error("GPU error: {0}")]
    Gpu(String),

    // ------------------------------------------------------------------
    // InvalidArgument
    // ------------------------------------------------------------------
    #[error("invalid path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid curve: {0}")]
    InvalidCurve(String),

    #[error("failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ------------------------------------------------------------------
    // AuthDenied
    // ------------------------------------------------------------------
    #[error("operation not authorized: {0}")]
    AuthDenied(String),

    // ------------------------------------------------------------------
    // NotFound
    // ------------------------------------------------------------------
    #[error("not found: {0}")]
    NotFound(String),

    // ------------------------------------------------------------------
    // Conflict
    // ------------------------------------------------------------------
    #[error("conflict: {0}")]
    Conflict(String),

    // ------------------------------------------------------------------
    // Transient: e.g. EC busy, retried once internally before surfacing
    // ------------------------------------------------------------------
    #[error("transient failure: {0}")]
    Transient(String),

    // ------------------------------------------------------------------
    // Generic / ambient
    // ------------------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Generic(String),
}

/// Wire-level error class, per §7 of the error handling design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorClass {
    Unsupported,
    HwIo,
    InvalidArgument,
    AuthDenied,
    NotFound,
    Conflict,
    Transient,
}

impl UccError {
    pub fn class(&self) -> ErrorClass {
        match self {
            UccError::Unsupported(_) => ErrorClass::Unsupported,
            UccError::Io(_)
            | UccError::HwRead { .. }
            | UccError::HwWrite { .. }
            | UccError::EcTransport(_)
            | UccError::HardwareNotFound(_)
            | UccError::Gpu(_) => ErrorClass::HwIo,
            UccError::InvalidPath { .. }
            | UccError::InvalidArgument(_)
            | UccError::InvalidCurve(_)
            | UccError::JsonParse(_) => ErrorClass::InvalidArgument,
            UccError::AuthDenied(_) => ErrorClass::AuthDenied,
            UccError::NotFound(_) => ErrorClass::NotFound,
            UccError::Conflict(_) => ErrorClass::Conflict,
            UccError::Transient(_) => ErrorClass::Transient,
            UccError::Config(_) | UccError::Generic(_) => ErrorClass::InvalidArgument,
        }
    }

    pub fn invalid_path(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidPath { path: path.into(), reason: reason.into() }
    }

    pub fn hw_read(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::HwRead { path: path.into(), reason: reason.into() }
    }

    pub fn hw_write(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::HwWrite { path: path.into(), reason: reason.into() }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic(msg.into())
    }
}

impl From<String> for UccError {
    fn from(s: String) -> Self {
        Self::Generic(s)
    }
}

impl From<&str> for UccError {
    fn from(s: &str) -> Self {
        Self::Generic(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_unsupported() {
        assert_eq!(UccError::Unsupported("x".into()).class(), ErrorClass::Unsupported);
    }

    #[test]
    fn classifies_hw_io() {
        assert_eq!(UccError::EcTransport("busy".into()).class(), ErrorClass::HwIo);
    }

    #[test]
    fn classifies_auth_denied() {
        assert_eq!(UccError::AuthDenied("no".into()).class(), ErrorClass::AuthDenied);
    }
}
