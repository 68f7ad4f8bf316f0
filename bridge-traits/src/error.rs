//! Uniform failure descriptor returned by every native bridge port.
//!
//! Host adapters never panic or leak platform error types across the bridge.
//! Every failure (hardware absent, permission denied, cancellation that the
//! host cannot tell apart from failure) is encoded as a [`BridgeError`]
//! carrying a stable machine-readable [`ErrorCode`] and a human message.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// Stable, machine-readable failure code.
///
/// The predefined codes cover the failures every host can produce. Adapters
/// may define additional codes with [`ErrorCode::custom`]; those should use
/// their own dot-segmented prefix (for example `ios.biometryLockout`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(Cow<'static, str>);

impl ErrorCode {
    /// The capability is not implemented or the hardware is missing.
    pub const NOT_AVAILABLE: ErrorCode = ErrorCode(Cow::Borrowed("bridge.notAvailable"));
    /// The user or the OS refused access to the capability.
    pub const PERMISSION_DENIED: ErrorCode = ErrorCode(Cow::Borrowed("bridge.permissionDenied"));
    /// The operation was aborted before producing a result.
    pub const CANCELLED: ErrorCode = ErrorCode(Cow::Borrowed("bridge.cancelled"));
    /// The requested item (scan result, translation key) does not exist.
    pub const NOT_FOUND: ErrorCode = ErrorCode(Cow::Borrowed("bridge.notFound"));
    /// The caller passed arguments the host rejected.
    pub const INVALID_INPUT: ErrorCode = ErrorCode(Cow::Borrowed("bridge.invalidInput"));
    /// Catch-all for host-level failures.
    pub const OPERATION_FAILED: ErrorCode = ErrorCode(Cow::Borrowed("bridge.operationFailed"));

    /// Creates a host-defined code.
    pub fn custom(code: impl Into<Cow<'static, str>>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Failure half of every bridge [`Result`].
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message} [{code}]")]
pub struct BridgeError {
    pub code: ErrorCode,
    pub message: String,
}

impl BridgeError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_available(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NOT_AVAILABLE, message)
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PERMISSION_DENIED, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CANCELLED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NOT_FOUND, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::INVALID_INPUT, message)
    }

    pub fn operation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::OPERATION_FAILED, message)
    }

    /// Returns `true` if this error carries `code`.
    pub fn is(&self, code: &ErrorCode) -> bool {
        &self.code == code
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(err.to_string()),
            _ => Self::operation_failed(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
