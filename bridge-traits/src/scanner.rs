//! Camera based code scanning.

use async_trait::async_trait;

use crate::error::Result;

/// Scans a code (typically a QR code) and returns its decoded payload.
///
/// Fails with `bridge.notFound` when no code was recognized and with
/// `bridge.notAvailable` / `bridge.permissionDenied` when the camera cannot be
/// used.
#[async_trait]
pub trait Scanner: Send + Sync {
    async fn scan(&self) -> Result<String>;
}
